//! Plugin discovery: binds manifest entries to plugin factories and builds
//! the registry the scheduler reads from.

use crate::error::{Result, SchedulerError};
use crate::plugin::AssessmentPlugin;
use crate::plugins::DeviceCountPlugin;
use crate::registry::AssessmentRegistry;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One discovery candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSpec {
    /// Factory kind to bind (e.g. `device-count`)
    pub kind: String,
    /// Factory-specific options
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl PluginSpec {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            options: BTreeMap::new(),
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

/// Discovery manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Candidates, bound in order; a later plugin for the same resource wins
    #[serde(default)]
    pub plugins: Vec<PluginSpec>,
}

impl DiscoveryConfig {
    /// Parse a YAML manifest
    pub fn from_yaml_str(data: &str) -> Result<Self> {
        serde_yaml::from_str(data).map_err(|e| {
            SchedulerError::invalid_config(
                format!("Failed to parse discovery manifest: {}", e),
                "Expected a `plugins:` list of entries with `kind` and optional `options`",
            )
        })
    }

    /// Read and parse a YAML manifest from disk
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            SchedulerError::invalid_config(
                format!("Failed to read {}: {}", path.display(), e),
                "Check that the manifest path exists and is readable",
            )
        })?;
        Self::from_yaml_str(&data)
    }
}

/// Builds plugin instances of one kind
pub trait PluginFactory: Send + Sync {
    /// Kind name matched against [`PluginSpec::kind`]
    fn kind(&self) -> &str;

    /// Create a plugin for the given candidate
    fn create(&self, spec: &PluginSpec) -> Result<Box<dyn AssessmentPlugin>>;
}

/// Factory for [`DeviceCountPlugin`]; requires the `resource` option
pub struct DeviceCountFactory;

impl PluginFactory for DeviceCountFactory {
    fn kind(&self) -> &str {
        "device-count"
    }

    fn create(&self, spec: &PluginSpec) -> Result<Box<dyn AssessmentPlugin>> {
        let resource = spec
            .options
            .get("resource")
            .filter(|r| !r.is_empty())
            .ok_or_else(|| SchedulerError::plugin_bind(&spec.kind, "missing option 'resource'"))?;

        Ok(Box::new(DeviceCountPlugin::new(resource.clone())))
    }
}

/// Set of plugin factories available for discovery
#[derive(Default)]
pub struct PluginCatalog {
    factories: HashMap<String, Box<dyn PluginFactory>>,
}

impl PluginCatalog {
    /// Catalog with no factories
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the built-in factories
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.add_factory(Box::new(DeviceCountFactory));
        catalog
    }

    /// Add a factory, replacing any factory of the same kind
    pub fn add_factory(&mut self, factory: Box<dyn PluginFactory>) {
        self.factories.insert(factory.kind().to_string(), factory);
    }

    /// Bind every candidate in `config` and build a registry.
    ///
    /// A candidate that fails to bind is logged and skipped. Bound plugins are
    /// initialized once and registered under their own `name()`.
    pub fn discover(&self, config: &DiscoveryConfig) -> AssessmentRegistry {
        let mut registry = AssessmentRegistry::new();

        for spec in &config.plugins {
            match self.bind(spec) {
                Ok(plugin) => {
                    let name = plugin.name().to_string();
                    debug!("Bound {} plugin for {}", spec.kind, name);
                    if registry.register(name.clone(), plugin).is_some() {
                        warn!("Plugin for {} replaced an earlier binding", name);
                    }
                }
                Err(e) => {
                    warn!("Giving up plugin candidate {}: {}", spec.kind, e);
                }
            }
        }

        info!(
            "Discovered {} assessment plugins from {} candidates",
            registry.len(),
            config.plugins.len()
        );

        registry
    }

    fn bind(&self, spec: &PluginSpec) -> Result<Arc<dyn AssessmentPlugin>> {
        let factory = self.factories.get(&spec.kind).ok_or_else(|| {
            SchedulerError::plugin_bind(&spec.kind, "no factory registered for this kind")
        })?;

        let plugin: Arc<dyn AssessmentPlugin> = Arc::from(factory.create(spec)?);

        catch_unwind(AssertUnwindSafe(|| plugin.initialize())).map_err(|_| {
            SchedulerError::plugin_bind(&spec.kind, "panicked during initialize")
        })?;

        Ok(plugin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubPlugin;
    use std::io::Write;

    struct StubFactory;

    impl PluginFactory for StubFactory {
        fn kind(&self) -> &str {
            "stub"
        }

        fn create(&self, spec: &PluginSpec) -> Result<Box<dyn AssessmentPlugin>> {
            let name = spec.options.get("name").cloned().unwrap_or_default();
            let plugin = match spec.options.get("mode").map(String::as_str) {
                Some("panic") => StubPlugin::panicking(&name),
                Some("fail") => return Err(SchedulerError::plugin_bind("stub", "asked to fail")),
                _ => StubPlugin::new(&name, 1, &[]),
            };
            Ok(Box::new(plugin))
        }
    }

    fn catalog() -> PluginCatalog {
        let mut catalog = PluginCatalog::builtin();
        catalog.add_factory(Box::new(StubFactory));
        catalog
    }

    #[test]
    fn test_discover_builtin() {
        let config = DiscoveryConfig {
            plugins: vec![
                PluginSpec::new("device-count").with_option("resource", "nvidia.com/gpu")
            ],
        };

        let registry = catalog().discover(&config);

        assert_eq!(registry.len(), 1);
        assert!(registry.lookup("nvidia.com/gpu").is_some());
    }

    #[test]
    fn test_bind_failures_are_skipped() {
        let config = DiscoveryConfig {
            plugins: vec![
                PluginSpec::new("unknown-kind"),
                PluginSpec::new("device-count"),
                PluginSpec::new("stub").with_option("name", "a").with_option("mode", "fail"),
                PluginSpec::new("stub").with_option("name", "b").with_option("mode", "panic"),
                PluginSpec::new("stub").with_option("name", "c"),
            ],
        };

        let registry = catalog().discover(&config);

        let names: Vec<_> = registry.resource_names().collect();
        assert_eq!(names, vec!["c"]);
    }

    #[test]
    fn test_initialize_panic_is_a_bind_failure() {
        let spec = PluginSpec::new("stub").with_option("name", "b").with_option("mode", "panic");

        let err = catalog().bind(&spec).err().unwrap();

        assert!(matches!(
            err,
            SchedulerError::PluginBind { ref plugin, ref reason }
                if plugin == "stub" && reason.contains("initialize")
        ));
    }

    #[test]
    fn test_bound_plugins_are_initialized_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct Counted(Arc<AtomicUsize>);

        impl AssessmentPlugin for Counted {
            fn name(&self) -> &str {
                "counted"
            }

            fn initialize(&self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }

            fn assess(&self, _node_name: &str, _requested_units: u64) -> crate::Assessment {
                crate::Assessment::score(0)
            }
        }

        struct CountedFactory(Arc<AtomicUsize>);

        impl PluginFactory for CountedFactory {
            fn kind(&self) -> &str {
                "counted"
            }

            fn create(&self, _spec: &PluginSpec) -> Result<Box<dyn AssessmentPlugin>> {
                Ok(Box::new(Counted(self.0.clone())))
            }
        }

        let inits = Arc::new(AtomicUsize::new(0));
        let mut catalog = PluginCatalog::new();
        catalog.add_factory(Box::new(CountedFactory(inits.clone())));

        let registry = catalog.discover(&DiscoveryConfig {
            plugins: vec![PluginSpec::new("counted")],
        });

        assert_eq!(registry.len(), 1);
        assert_eq!(inits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_later_candidate_wins() {
        let config = DiscoveryConfig {
            plugins: vec![
                PluginSpec::new("stub").with_option("name", "nvidia.com/gpu"),
                PluginSpec::new("device-count").with_option("resource", "nvidia.com/gpu"),
            ],
        };

        let registry = catalog().discover(&config);

        assert_eq!(registry.len(), 1);
        // DeviceCountPlugin knows no nodes yet, so it reports infeasible
        assert_eq!(registry.lookup("nvidia.com/gpu").unwrap().assess("node1", 1).score, -1);
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
plugins:
  - kind: device-count
    options:
      resource: nvidia.com/gpu
  - kind: device-count
    options:
      resource: example.com/fpga
"#;

        let config = DiscoveryConfig::from_yaml_str(yaml).unwrap();

        assert_eq!(config.plugins.len(), 2);
        assert_eq!(
            config.plugins[1],
            PluginSpec::new("device-count").with_option("resource", "example.com/fpga")
        );
        assert_eq!(DiscoveryConfig::from_yaml_str("{}").unwrap(), DiscoveryConfig::default());
    }

    #[test]
    fn test_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "plugins:\n  - kind: device-count\n    options:\n      resource: nvidia.com/gpu"
        )
        .unwrap();

        let config = DiscoveryConfig::from_file(file.path()).unwrap();
        assert_eq!(config.plugins.len(), 1);

        let err = DiscoveryConfig::from_file(Path::new("/nonexistent/plexus.yaml")).unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidConfig { .. }));

        let err = DiscoveryConfig::from_yaml_str("plugins: 3").unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidConfig { .. }));
    }
}
