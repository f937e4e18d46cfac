use crate::registry::AssessmentRegistry;
use crate::types::{Labels, NodeAssessment, INFEASIBLE_SCORE};
use plexus_core::ResourceVector;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Combines per-resource plugin assessments into one node score.
///
/// A negative score from any plugin is absorbing: the node's total becomes
/// [`INFEASIBLE_SCORE`] and its annotations are dropped, whatever the other
/// plugins report and in whatever order the demand is walked.
#[derive(Debug, Clone)]
pub struct ScoreAggregator {
    registry: Arc<AssessmentRegistry>,
}

impl ScoreAggregator {
    /// Create an aggregator over a populated registry
    pub fn new(registry: Arc<AssessmentRegistry>) -> Self {
        Self { registry }
    }

    /// Score `node_name` against a demand of resource name → quantity.
    ///
    /// Dimensions without a registered plugin are skipped.
    pub fn assess(&self, node_name: &str, demand: &HashMap<String, f64>) -> NodeAssessment {
        self.assess_iter(
            node_name,
            demand.iter().map(|(name, quantity)| (name.as_str(), *quantity)),
        )
    }

    /// Score `node_name` against the extended devices of a request vector
    pub fn assess_vector(&self, node_name: &str, request: &ResourceVector) -> NodeAssessment {
        self.assess(node_name, &request.extended_devices)
    }

    fn assess_iter<'a>(
        &self,
        node_name: &str,
        demand: impl Iterator<Item = (&'a str, f64)>,
    ) -> NodeAssessment {
        let mut score: i64 = 0;
        let mut annotations = Labels::new();

        for (resource_name, quantity) in demand {
            let Some(plugin) = self.registry.lookup(resource_name) else {
                debug!(
                    "No assessment plugin for {} on node {}, skipping",
                    resource_name, node_name
                );
                continue;
            };

            let requested_units = requested_units(quantity);
            let assessment = plugin.assess(node_name, requested_units);

            debug!(
                "Node {} {} x{} scored {}",
                node_name, resource_name, requested_units, assessment.score
            );

            if assessment.score < 0 || score < 0 {
                score = INFEASIBLE_SCORE;
                annotations.clear();
            } else {
                score = score.saturating_add(assessment.score);
                annotations.extend(assessment.annotations);
            }
        }

        NodeAssessment {
            node_name: node_name.to_string(),
            score,
            annotations,
        }
    }
}

/// Whole units to request: truncated toward zero, never negative
fn requested_units(quantity: f64) -> u64 {
    // `as` saturates: negatives and NaN become 0
    quantity.trunc() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::AssessmentPlugin;
    use crate::testing::{labels, StubPlugin};

    fn aggregator(plugins: Vec<Arc<StubPlugin>>) -> ScoreAggregator {
        let mut registry = AssessmentRegistry::new();
        for plugin in plugins {
            let name = plugin.name().to_string();
            registry.register(name, plugin);
        }
        ScoreAggregator::new(Arc::new(registry))
    }

    fn demand(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_unregistered_dimension_is_skipped() {
        let gpu = Arc::new(StubPlugin::new("gpu", 5, &[("gpu-type", "A100")]));
        let scorer = aggregator(vec![gpu.clone()]);

        let result = scorer.assess("node1", &demand(&[("gpu", 2.0), ("widget.io/fpga", 1.0)]));

        assert_eq!(result.node_name, "node1");
        assert_eq!(result.score, 5);
        assert_eq!(result.annotations, labels(&[("gpu-type", "A100")]));
        assert_eq!(gpu.calls(), vec!["assess:node1:2"]);
    }

    #[test]
    fn test_infeasible_dimension_wins_in_any_order() {
        // Run enough times that both HashMap iteration orders are likely hit;
        // the outcome must not depend on which one we get.
        for _ in 0..16 {
            let scorer = aggregator(vec![
                Arc::new(StubPlugin::new("gpu", 5, &[("gpu-type", "A100")])),
                Arc::new(StubPlugin::new("x", -1, &[("x-reason", "full")])),
            ]);

            let result = scorer.assess("node1", &demand(&[("gpu", 2.0), ("x", 1.0)]));

            assert_eq!(result.score, INFEASIBLE_SCORE);
            assert!(result.annotations.is_empty());
            assert!(!result.is_feasible());
        }
    }

    #[test]
    fn test_large_positive_scores_do_not_offset_failure() {
        let scorer = aggregator(vec![
            Arc::new(StubPlugin::new("a", i64::MAX, &[])),
            Arc::new(StubPlugin::new("b", -50, &[])),
            Arc::new(StubPlugin::new("c", i64::MAX, &[])),
        ]);

        let result = scorer.assess("node1", &demand(&[("a", 1.0), ("b", 1.0), ("c", 1.0)]));

        assert_eq!(result.score, INFEASIBLE_SCORE);
    }

    #[test]
    fn test_scores_sum_and_annotations_merge() {
        let scorer = aggregator(vec![
            Arc::new(StubPlugin::new("gpu", 5, &[("gpu-type", "A100")])),
            Arc::new(StubPlugin::new("fpga", 3, &[("fpga-slot", "2")])),
        ]);

        let result = scorer.assess("node1", &demand(&[("gpu", 1.0), ("fpga", 1.0)]));

        assert_eq!(result.score, 8);
        assert_eq!(
            result.annotations,
            labels(&[("gpu-type", "A100"), ("fpga-slot", "2")])
        );
    }

    #[test]
    fn test_annotation_collision_keeps_one_value() {
        let scorer = aggregator(vec![
            Arc::new(StubPlugin::new("gpu", 1, &[("zone", "a")])),
            Arc::new(StubPlugin::new("fpga", 1, &[("zone", "b")])),
        ]);

        let result = scorer.assess("node1", &demand(&[("gpu", 1.0), ("fpga", 1.0)]));

        assert_eq!(result.score, 2);
        assert_eq!(result.annotations.len(), 1);
        let zone = result.annotations.get("zone").unwrap();
        assert!(zone == "a" || zone == "b");
    }

    #[test]
    fn test_requested_units_truncate() {
        let gpu = Arc::new(StubPlugin::new("gpu", 0, &[]));
        let scorer = aggregator(vec![gpu.clone()]);

        scorer.assess("node1", &demand(&[("gpu", 2.9)]));
        scorer.assess("node1", &demand(&[("gpu", -3.0)]));

        assert_eq!(gpu.calls(), vec!["assess:node1:2", "assess:node1:0"]);
    }

    #[test]
    fn test_empty_demand() {
        let scorer = aggregator(vec![]);
        let result = scorer.assess("node1", &HashMap::new());
        assert_eq!(result.score, 0);
        assert!(result.is_feasible());
    }

    #[test]
    fn test_assess_vector_uses_extended_devices() {
        let gpu = Arc::new(StubPlugin::new("nvidia.com/gpu", 4, &[]));
        let scorer = aggregator(vec![gpu.clone()]);

        let request = ResourceVector::from_quantities([
            ("cpu", plexus_core::ResourceQuantity::from(2.0)),
            ("nvidia.com/gpu", plexus_core::ResourceQuantity::from(2.0)),
        ]);
        let result = scorer.assess_vector("node1", &request);

        assert_eq!(result.score, 4);
        assert_eq!(gpu.calls(), vec!["assess:node1:2"]);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_any_negative_is_sticky(
                scores in proptest::collection::vec(-1000i64..1000, 1..8),
                failing in 0usize..8,
                failing_score in i64::MIN..0,
            ) {
                let mut scores = scores;
                let idx = failing % scores.len();
                scores[idx] = failing_score;

                let plugins: Vec<_> = scores
                    .iter()
                    .enumerate()
                    .map(|(i, s)| Arc::new(StubPlugin::new(&format!("r{i}"), *s, &[("k", "v")])))
                    .collect();
                let wants: HashMap<String, f64> =
                    (0..scores.len()).map(|i| (format!("r{i}"), 1.0)).collect();

                let result = aggregator(plugins).assess("node1", &wants);

                prop_assert_eq!(result.score, INFEASIBLE_SCORE);
                prop_assert!(result.annotations.is_empty());
            }

            #[test]
            fn prop_non_negative_scores_sum(
                scores in proptest::collection::vec(0i64..1000, 0..8),
            ) {
                let plugins: Vec<_> = scores
                    .iter()
                    .enumerate()
                    .map(|(i, s)| Arc::new(StubPlugin::new(&format!("r{i}"), *s, &[])))
                    .collect();
                let mut wants: HashMap<String, f64> =
                    (0..scores.len()).map(|i| (format!("r{i}"), 1.0)).collect();
                wants.insert("unregistered".to_string(), 3.0);

                let result = aggregator(plugins).assess("node1", &wants);

                prop_assert_eq!(result.score, scores.iter().sum::<i64>());
            }
        }
    }
}
