use crate::plugin::AssessmentPlugin;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Resource name → bound assessment plugin.
///
/// Populated through `&mut self` during discovery, then shared behind an
/// `Arc`, after which it is read-only.
#[derive(Default, Clone)]
pub struct AssessmentRegistry {
    plugins: HashMap<String, Arc<dyn AssessmentPlugin>>,
}

impl AssessmentRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `plugin` to `resource_name`, returning any plugin it replaces
    pub fn register(
        &mut self,
        resource_name: impl Into<String>,
        plugin: Arc<dyn AssessmentPlugin>,
    ) -> Option<Arc<dyn AssessmentPlugin>> {
        let resource_name = resource_name.into();
        debug!("Registering assessment plugin for {}", resource_name);
        self.plugins.insert(resource_name, plugin)
    }

    /// Plugin bound to `resource_name`, if any
    pub fn lookup(&self, resource_name: &str) -> Option<&Arc<dyn AssessmentPlugin>> {
        self.plugins.get(resource_name)
    }

    /// Every registered plugin, in no particular order
    pub fn all(&self) -> impl Iterator<Item = &Arc<dyn AssessmentPlugin>> {
        self.plugins.values()
    }

    /// Resource names with a bound plugin, in no particular order
    pub fn resource_names(&self) -> impl Iterator<Item = &str> {
        self.plugins.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl fmt::Debug for AssessmentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.resource_names().collect();
        names.sort_unstable();
        f.debug_struct("AssessmentRegistry")
            .field("plugins", &names)
            .finish()
    }
}
