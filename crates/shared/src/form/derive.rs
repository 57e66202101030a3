//! Pure derivations from the current hardware rows and action settings.
//!
//! Nothing here is cached; callers recompute on every change.

use crate::models::{
    ActionConfigs, ActionKind, ActionRequest, DerivedActionSet, RunCountTable, Submission,
    TargetSelection,
};

fn request_for(
    kind: ActionKind,
    hardware: &TargetSelection,
    actions: &ActionConfigs,
) -> ActionRequest {
    let config = actions.get(kind);
    let (num_trials, runs_per_trial) = match kind {
        ActionKind::Benchmark => (config.num_trials, config.runs_per_trial),
        ActionKind::Accelerate => (None, None),
    };

    ActionRequest {
        hardware: hardware.clone(),
        engine: config.engine,
        num_trials,
        runs_per_trial,
    }
}

/// Builds one request per hardware row for every selected action kind.
///
/// Rows that have no instance yet are included; dropping them is up to the
/// consumer.
pub fn derive_actions(
    selections: &[TargetSelection],
    actions: &ActionConfigs,
) -> DerivedActionSet {
    if selections.is_empty() {
        return DerivedActionSet::new();
    }

    actions
        .selected_kinds()
        .map(|kind| {
            let requests = selections
                .iter()
                .map(|hardware| request_for(kind, hardware, actions))
                .collect();
            (kind, requests)
        })
        .collect()
}

/// Runs per resolved instance: one for each selected action kind.
pub fn compute_run_counts(
    selections: &[TargetSelection],
    actions: &ActionConfigs,
) -> RunCountTable {
    let derived = derive_actions(selections, actions);
    let runs = derived.len();

    derived
        .values()
        .flatten()
        .filter_map(|request| request.hardware.instance.as_deref())
        .map(|instance| (instance, runs))
        .collect()
}

/// Every call a submission has to make, in action then row order. Rows
/// without an instance are skipped.
pub fn build_submission_payload(
    selections: &[TargetSelection],
    actions: &ActionConfigs,
) -> Vec<Submission> {
    derive_actions(selections, actions)
        .into_iter()
        .flat_map(|(kind, requests)| {
            requests
                .into_iter()
                .filter(|request| request.hardware.is_resolved())
                .map(move |request| Submission { kind, request })
        })
        .collect()
}
