use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Labels or annotations handed to plugins (same shape as `ObjectMeta::annotations`)
pub type Labels = BTreeMap<String, String>;

/// Score meaning "this node cannot satisfy the demand"
pub const INFEASIBLE_SCORE: i64 = -1;

/// One plugin's verdict for one resource dimension
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    /// Score, negative when infeasible
    pub score: i64,
    /// Descriptive annotations to attach to the placement
    pub annotations: Labels,
}

impl Assessment {
    /// Create a scored assessment
    pub fn new(score: i64, annotations: Labels) -> Self {
        Self { score, annotations }
    }

    /// Create an assessment with no annotations
    pub fn score(score: i64) -> Self {
        Self::new(score, Labels::new())
    }

    /// Create an infeasible assessment
    pub fn infeasible() -> Self {
        Self::score(INFEASIBLE_SCORE)
    }
}

/// Aggregated extended-resource verdict for a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAssessment {
    /// Node name
    pub node_name: String,
    /// Total score, exactly [`INFEASIBLE_SCORE`] if any dimension failed
    pub score: i64,
    /// Merged annotations, empty when infeasible
    pub annotations: Labels,
}

impl NodeAssessment {
    /// Whether every assessed dimension can be satisfied
    pub fn is_feasible(&self) -> bool {
        self.score >= 0
    }
}
