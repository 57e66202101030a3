use super::action::{serialize_optional_trials, ActionKind, Engine};
use super::target::TargetSelection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Body of a `POST /{action}` call.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ActionRequest {
    pub hardware: TargetSelection,
    pub engine: Engine,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_optional_trials"
    )]
    pub num_trials: Option<f64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_optional_trials"
    )]
    pub runs_per_trial: Option<f64>,
}

/// Requests per selected action kind; unselected kinds have no key.
pub type DerivedActionSet = BTreeMap<ActionKind, Vec<ActionRequest>>;

/// One call of a submission batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub kind: ActionKind,
    pub request: ActionRequest,
}

/// Number of runs each selected instance will get.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunCountTable {
    counts: BTreeMap<String, usize>,
}

impl RunCountTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, instance: impl Into<String>, runs: usize) {
        self.counts.insert(instance.into(), runs);
    }

    pub fn get(&self, instance: &str) -> Option<usize> {
        self.counts.get(instance).copied()
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }
}

impl<S: Into<String>> FromIterator<(S, usize)> for RunCountTable {
    fn from_iter<T: IntoIterator<Item = (S, usize)>>(iter: T) -> Self {
        let mut table = Self::new();
        for (instance, runs) in iter {
            table.set(instance, runs);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::action::EngineType;
    use serde_json::json;

    #[test]
    fn test_benchmark_request_body() {
        let request = ActionRequest {
            hardware: TargetSelection {
                provider: Some("AWS".to_string()),
                instance: Some("m4.large".to_string()),
                cpu: Some(2),
                memory: Some(8.0),
            },
            engine: Engine::Plain(EngineType::Onnx),
            num_trials: Some(2.0),
            runs_per_trial: Some(5.0),
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "hardware": {
                    "provider": "AWS",
                    "instance": "m4.large",
                    "cpu": 2,
                    "memory": 8.0
                },
                "engine": "ONNX!",
                "num_trials": 2,
                "runs_per_trial": 5
            })
        );
    }

    #[test]
    fn test_accelerate_request_omits_trial_fields() {
        let request = ActionRequest {
            hardware: TargetSelection {
                provider: Some("GCP".to_string()),
                instance: Some("n1-standard-4".to_string()),
                cpu: Some(4),
                memory: Some(15.0),
            },
            engine: Engine::tvm(100.0),
            num_trials: None,
            runs_per_trial: None,
        };

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["engine"], json!({"TVM": {"kernel_trials": 100}}));
        assert!(body.get("num_trials").is_none());
        assert!(body.get("runs_per_trial").is_none());
    }

    #[test]
    fn test_fractional_trials_keep_their_value() {
        let request = ActionRequest {
            hardware: TargetSelection::default(),
            engine: Engine::Plain(EngineType::Tvm),
            num_trials: Some(2.5),
            runs_per_trial: Some(-3.0),
        };

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["num_trials"], json!(2.5));
        assert_eq!(body["runs_per_trial"], json!(-3));
    }

    #[test]
    fn test_run_count_total() {
        let table: RunCountTable = vec![("m1", 2), ("m2", 1)].into_iter().collect();
        assert_eq!(table.total(), 3);
        assert_eq!(table.get("m1"), Some(2));
        assert_eq!(table.get("m3"), None);
        assert_eq!(RunCountTable::new().total(), 0);
    }
}
