//! Run plans: a TOML description of the hardware rows and actions to fill
//! into the form.
//!
//! ```toml
//! [[targets]]
//! provider = "AWS"
//! instance = "m4.large"
//!
//! [benchmark]
//! engine = "ONNX"
//! num_trials = 2
//! runs_per_trial = 5
//!
//! [accelerate]
//! engine = "TVM"
//! kernel_trials = 100
//! ```

use log::warn;
use serde::Deserialize;
use shared::form::{CatalogStatus, FormEvent, FormState, MAX_TARGET_ROWS};
use shared::models::action::parse_trials;
use shared::models::{ActionKind, EngineType, TrialField};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("failed to read plan {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse plan: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("plan lists {0} targets, at most {max} are allowed", max = MAX_TARGET_ROWS)]
    TooManyTargets(usize),
    #[error("plan does not list any hardware target")]
    NoTargets,
    #[error("invalid engine '{0}', expected ONNX or TVM")]
    InvalidEngine(String),
    #[error("invalid {field} value '{value}', expected a number")]
    InvalidTrials { field: &'static str, value: String },
    #[error("hardware catalog is not loaded")]
    CatalogUnavailable,
    #[error("unknown hardware target {provider}/{instance}")]
    UnknownTarget { provider: String, instance: String },
}

/// A trials value written either as a number (integer or float) or as a
/// string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TrialsValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for TrialsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrialsValue::Number(n) => write!(f, "{n}"),
            TrialsValue::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlanTarget {
    pub provider: String,
    pub instance: String,
}

fn enabled() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BenchmarkPlan {
    #[serde(default = "enabled")]
    pub enabled: bool,
    pub engine: Option<String>,
    pub num_trials: Option<TrialsValue>,
    pub runs_per_trial: Option<TrialsValue>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AcceleratePlan {
    #[serde(default = "enabled")]
    pub enabled: bool,
    pub engine: Option<String>,
    pub kernel_trials: Option<TrialsValue>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub targets: Vec<PlanTarget>,
    pub benchmark: Option<BenchmarkPlan>,
    pub accelerate: Option<AcceleratePlan>,
}

fn engine_event(kind: ActionKind, engine: &Option<String>) -> Result<Option<FormEvent>, PlanError> {
    let Some(engine) = engine else {
        return Ok(None);
    };
    let engine_type: EngineType = engine
        .parse()
        .map_err(|_| PlanError::InvalidEngine(engine.clone()))?;
    Ok(Some(FormEvent::SetEngine { kind, engine_type }))
}

fn trials_event(
    kind: ActionKind,
    field: TrialField,
    name: &'static str,
    value: &Option<TrialsValue>,
) -> Result<Option<FormEvent>, PlanError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let raw = value.to_string();
    if parse_trials(&raw).is_none() {
        return Err(PlanError::InvalidTrials { field: name, value: raw });
    }
    Ok(Some(FormEvent::SetTrials { kind, field, raw }))
}

impl Plan {
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let content = std::fs::read_to_string(path).map_err(|source| PlanError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        content.parse()
    }

    /// Form events that fill the plan in, in the order a user would.
    pub fn events(&self) -> Result<Vec<FormEvent>, PlanError> {
        if self.targets.is_empty() {
            return Err(PlanError::NoTargets);
        }
        if self.targets.len() > MAX_TARGET_ROWS {
            return Err(PlanError::TooManyTargets(self.targets.len()));
        }

        let mut events = Vec::new();
        for (index, target) in self.targets.iter().enumerate() {
            if index > 0 {
                events.push(FormEvent::AddRow);
            }
            events.push(FormEvent::SetProvider {
                index,
                provider: target.provider.clone(),
            });
            events.push(FormEvent::SetInstance {
                index,
                instance: target.instance.clone(),
            });
        }

        if let Some(benchmark) = &self.benchmark {
            let kind = ActionKind::Benchmark;
            events.push(FormEvent::ToggleAction {
                kind,
                selected: benchmark.enabled,
            });
            events.extend(engine_event(kind, &benchmark.engine)?);
            events.extend(trials_event(
                kind,
                TrialField::NumTrials,
                "num_trials",
                &benchmark.num_trials,
            )?);
            events.extend(trials_event(
                kind,
                TrialField::RunsPerTrial,
                "runs_per_trial",
                &benchmark.runs_per_trial,
            )?);
        }

        if let Some(accelerate) = &self.accelerate {
            let kind = ActionKind::Accelerate;
            events.push(FormEvent::ToggleAction {
                kind,
                selected: accelerate.enabled,
            });
            events.extend(engine_event(kind, &accelerate.engine)?);
            events.extend(trials_event(
                kind,
                TrialField::KernelTrials,
                "kernel_trials",
                &accelerate.kernel_trials,
            )?);
        }

        Ok(events)
    }

    /// Replays the plan onto a form whose catalog has loaded and checks every
    /// target against that catalog.
    pub fn apply(&self, form: &FormState) -> Result<FormState, PlanError> {
        let CatalogStatus::Loaded(catalog) = form.catalog() else {
            return Err(PlanError::CatalogUnavailable);
        };

        for target in &self.targets {
            if catalog.specs(&target.provider, &target.instance).is_none() {
                return Err(PlanError::UnknownTarget {
                    provider: target.provider.clone(),
                    instance: target.instance.clone(),
                });
            }
        }

        let state = form.apply_all(self.events()?);

        let resolved = state
            .targets()
            .selections()
            .iter()
            .filter(|selection| selection.is_resolved())
            .count();
        if resolved < self.targets.len() {
            warn!(
                "{} duplicate hardware target(s) in plan were merged",
                self.targets.len() - resolved
            );
        }

        Ok(state)
    }
}

impl std::str::FromStr for Plan {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}
