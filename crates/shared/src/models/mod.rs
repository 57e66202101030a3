pub mod action;
pub mod hardware;
pub mod request;
pub mod target;

pub use action::{ActionConfig, ActionConfigs, ActionKind, Engine, EngineType, TrialField};
pub use hardware::{CatalogLoad, HardwareCatalog, HardwareOption, HardwareSpecs};
pub use request::{ActionRequest, DerivedActionSet, RunCountTable, Submission};
pub use target::TargetSelection;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {what}: '{value}'")]
pub struct ParseEnumError {
    what: &'static str,
    value: String,
}

impl ParseEnumError {
    pub(crate) fn new(what: &'static str, value: &str) -> Self {
        Self {
            what,
            value: value.to_string(),
        }
    }
}
