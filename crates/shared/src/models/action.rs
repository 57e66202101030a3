use super::ParseEnumError;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Benchmark,
    Accelerate,
}

impl ActionKind {
    pub const ALL: [ActionKind; 2] = [ActionKind::Benchmark, ActionKind::Accelerate];

    /// Route segment and payload key of the action.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Benchmark => "benchmark",
            ActionKind::Accelerate => "accelerate",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "benchmark" => Ok(ActionKind::Benchmark),
            "accelerate" => Ok(ActionKind::Accelerate),
            _ => Err(ParseEnumError::new("action kind", s)),
        }
    }
}

/// Backend toolchain an action runs with.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash, Default)]
pub enum EngineType {
    // The service expects the trailing bang.
    #[default]
    #[serde(rename = "ONNX!")]
    Onnx,
    #[serde(rename = "TVM")]
    Tvm,
}

impl fmt::Display for EngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineType::Onnx => f.write_str("ONNX"),
            EngineType::Tvm => f.write_str("TVM"),
        }
    }
}

impl FromStr for EngineType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ONNX" | "ONNX!" => Ok(EngineType::Onnx),
            "TVM" => Ok(EngineType::Tvm),
            _ => Err(ParseEnumError::new("engine", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Default)]
pub struct TvmParams {
    #[serde(serialize_with = "serialize_trials")]
    pub kernel_trials: f64,
}

/// Engine field of an action request.
///
/// Serializes either as the bare engine tag (`"ONNX!"`, `"TVM"`) or, for an
/// accelerate run on TVM, as `{"TVM": {"kernel_trials": n}}`.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Engine {
    Plain(EngineType),
    Tuned {
        #[serde(rename = "TVM")]
        tvm: TvmParams,
    },
}

impl Engine {
    pub const fn tvm(kernel_trials: f64) -> Self {
        Engine::Tuned {
            tvm: TvmParams { kernel_trials },
        }
    }

    pub const fn kernel_trials(&self) -> Option<f64> {
        match self {
            Engine::Tuned { tvm } => Some(tvm.kernel_trials),
            Engine::Plain(_) => None,
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::Plain(EngineType::Onnx)
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::Plain(engine_type) => write!(f, "{engine_type}"),
            Engine::Tuned { tvm } => write!(f, "TVM (kernel_trials={})", tvm.kernel_trials),
        }
    }
}

/// Numeric input fields of the action forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialField {
    NumTrials,
    RunsPerTrial,
    KernelTrials,
}

impl FromStr for TrialField {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "num_trials" => Ok(TrialField::NumTrials),
            "runs_per_trial" => Ok(TrialField::RunsPerTrial),
            "kernel_trials" => Ok(TrialField::KernelTrials),
            _ => Err(ParseEnumError::new("trial field", s)),
        }
    }
}

/// Parses a raw trials input. Blank input counts as zero; anything that is
/// not a finite number is rejected.
pub fn parse_trials(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(0.0);
    }
    raw.parse::<f64>().ok().filter(|value| value.is_finite())
}

// Whole values go out as JSON integers (`3`, not `3.0`).
pub(crate) fn serialize_trials<S: Serializer>(
    value: &f64,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

pub(crate) fn serialize_optional_trials<S: Serializer>(
    value: &Option<f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(value) => serialize_trials(value, serializer),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionConfig {
    pub selected: bool,
    pub engine_type: EngineType,
    pub engine: Engine,
    pub num_trials: Option<f64>,
    pub runs_per_trial: Option<f64>,
}

impl ActionConfig {
    pub fn benchmark() -> Self {
        Self {
            selected: false,
            engine_type: EngineType::Onnx,
            engine: Engine::Plain(EngineType::Onnx),
            num_trials: Some(0.0),
            runs_per_trial: Some(0.0),
        }
    }

    pub fn accelerate() -> Self {
        Self {
            selected: false,
            engine_type: EngineType::Onnx,
            engine: Engine::Plain(EngineType::Onnx),
            num_trials: None,
            runs_per_trial: None,
        }
    }
}

/// Configuration of both action kinds.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionConfigs {
    pub benchmark: ActionConfig,
    pub accelerate: ActionConfig,
}

impl Default for ActionConfigs {
    fn default() -> Self {
        Self {
            benchmark: ActionConfig::benchmark(),
            accelerate: ActionConfig::accelerate(),
        }
    }
}

impl ActionConfigs {
    pub fn get(&self, kind: ActionKind) -> &ActionConfig {
        match kind {
            ActionKind::Benchmark => &self.benchmark,
            ActionKind::Accelerate => &self.accelerate,
        }
    }

    fn get_mut(&mut self, kind: ActionKind) -> &mut ActionConfig {
        match kind {
            ActionKind::Benchmark => &mut self.benchmark,
            ActionKind::Accelerate => &mut self.accelerate,
        }
    }

    /// Action kinds currently switched on, in submission order.
    pub fn selected_kinds(&self) -> impl Iterator<Item = ActionKind> + '_ {
        ActionKind::ALL
            .into_iter()
            .filter(|kind| self.get(*kind).selected)
    }

    pub fn set_selected(&mut self, kind: ActionKind, selected: bool) {
        self.get_mut(kind).selected = selected;
    }

    /// Switches the engine of an action.
    ///
    /// Benchmark always carries the plain tag. Accelerate on TVM gets a
    /// fresh `kernel_trials: 0` record, discarding any earlier value.
    pub fn set_engine(&mut self, kind: ActionKind, engine_type: EngineType) {
        let config = self.get_mut(kind);
        config.engine_type = engine_type;
        config.engine = match (kind, engine_type) {
            (ActionKind::Accelerate, EngineType::Tvm) => Engine::tvm(0.0),
            _ => Engine::Plain(engine_type),
        };
    }

    /// Applies a raw numeric input. Returns `false` and leaves the config
    /// untouched when `raw` is not a number.
    ///
    /// Any field written on accelerate lands in the TVM kernel trials.
    pub fn set_trials(&mut self, kind: ActionKind, field: TrialField, raw: &str) -> bool {
        let Some(value) = parse_trials(raw) else {
            return false;
        };

        let config = self.get_mut(kind);
        match kind {
            ActionKind::Benchmark => match field {
                TrialField::NumTrials => config.num_trials = Some(value),
                TrialField::RunsPerTrial => config.runs_per_trial = Some(value),
                TrialField::KernelTrials => {}
            },
            ActionKind::Accelerate => config.engine = Engine::tvm(value),
        }
        true
    }

    /// Kernel trials shown in the accelerate form; zero unless TVM is chosen.
    pub fn kernel_trials(&self) -> f64 {
        if self.accelerate.engine_type != EngineType::Tvm {
            return 0.0;
        }
        self.accelerate.engine.kernel_trials().unwrap_or_default()
    }
}
