use serde::{Deserialize, Serialize};

/// A single hardware row as the user has filled it in so far.
///
/// Also the `hardware` field of every submitted action request.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct TargetSelection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<f64>,
}

impl TargetSelection {
    pub fn is_resolved(&self) -> bool {
        self.instance.is_some()
    }

    pub fn display_cpu(&self) -> u32 {
        self.cpu.unwrap_or_default()
    }

    pub fn display_memory(&self) -> f64 {
        self.memory.unwrap_or_default()
    }
}
