pub mod derive;
pub mod targets;

pub use derive::{build_submission_payload, compute_run_counts, derive_actions};
pub use targets::{TargetSelectionStore, MAX_TARGET_ROWS};

use crate::errors::error_message;
use crate::models::{
    ActionConfigs, ActionKind, CatalogLoad, DerivedActionSet, EngineType, HardwareCatalog,
    RunCountTable, Submission, TrialField,
};
use log::{debug, warn};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum CatalogStatus {
    #[default]
    Pending,
    Loaded(Arc<HardwareCatalog>),
    Failed(String),
}

/// Error banner state after a failed submission. `status` is the HTTP code
/// of the failing call, when there was a response at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionStatus {
    pub status: Option<u16>,
}

/// User input and load completions the form reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum FormEvent {
    CatalogLoaded(CatalogLoad),
    AddRow,
    RemoveRow(usize),
    SetProvider { index: usize, provider: String },
    SetInstance { index: usize, instance: String },
    ToggleAction { kind: ActionKind, selected: bool },
    SetEngine { kind: ActionKind, engine_type: EngineType },
    SetTrials { kind: ActionKind, field: TrialField, raw: String },
    SubmissionStarted,
    SubmissionFailed(Option<u16>),
    DismissError,
}

/// Complete state of the configuration form.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormState {
    catalog: CatalogStatus,
    targets: TargetSelectionStore,
    actions: ActionConfigs,
    status: Option<SubmissionStatus>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the state that follows `event`; `self` is left untouched.
    pub fn apply(&self, event: FormEvent) -> FormState {
        let mut next = self.clone();
        match event {
            FormEvent::CatalogLoaded(load) => {
                if next.catalog != CatalogStatus::Pending {
                    warn!("Hardware catalog already settled, ignoring late load");
                    return next;
                }
                next.catalog = match load {
                    CatalogLoad::Loaded(catalog) => {
                        debug!("Hardware catalog loaded with {} targets", catalog.len());
                        let catalog = Arc::new(catalog);
                        next.targets = TargetSelectionStore::seed(Arc::clone(&catalog));
                        CatalogStatus::Loaded(catalog)
                    }
                    CatalogLoad::Failed(reason) => CatalogStatus::Failed(reason),
                };
            }
            FormEvent::AddRow => next.targets.add_row(),
            FormEvent::RemoveRow(index) => next.targets.remove_row(index),
            FormEvent::SetProvider { index, provider } => {
                next.targets.set_provider(index, provider)
            }
            FormEvent::SetInstance { index, instance } => {
                next.targets.set_instance(index, instance)
            }
            FormEvent::ToggleAction { kind, selected } => {
                next.actions.set_selected(kind, selected)
            }
            FormEvent::SetEngine { kind, engine_type } => {
                next.actions.set_engine(kind, engine_type)
            }
            FormEvent::SetTrials { kind, field, raw } => {
                if !next.actions.set_trials(kind, field, &raw) {
                    debug!("Ignoring non-numeric {kind} trials input '{raw}'");
                }
            }
            FormEvent::SubmissionStarted | FormEvent::DismissError => next.status = None,
            FormEvent::SubmissionFailed(status) => {
                next.status = Some(SubmissionStatus { status })
            }
        }
        next
    }

    /// Folds a sequence of events over `self`.
    pub fn apply_all<I>(&self, events: I) -> FormState
    where
        I: IntoIterator<Item = FormEvent>,
    {
        events
            .into_iter()
            .fold(self.clone(), |state, event| state.apply(event))
    }

    pub fn catalog(&self) -> &CatalogStatus {
        &self.catalog
    }

    pub fn targets(&self) -> &TargetSelectionStore {
        &self.targets
    }

    pub fn actions(&self) -> &ActionConfigs {
        &self.actions
    }

    pub fn status(&self) -> Option<SubmissionStatus> {
        self.status
    }

    pub fn derived_actions(&self) -> DerivedActionSet {
        derive_actions(self.targets.selections(), &self.actions)
    }

    pub fn run_counts(&self) -> RunCountTable {
        compute_run_counts(self.targets.selections(), &self.actions)
    }

    pub fn total_runs(&self) -> usize {
        self.run_counts().total()
    }

    pub fn submissions(&self) -> Vec<Submission> {
        build_submission_payload(self.targets.selections(), &self.actions)
    }

    /// Submitting needs an instance on the first row and at least one
    /// action switched on.
    pub fn can_submit(&self) -> bool {
        let first_resolved = self
            .targets
            .selection(0)
            .is_some_and(|selection| selection.is_resolved());
        first_resolved && self.actions.selected_kinds().next().is_some()
    }

    /// Banner text for the current error, if the status code is known.
    pub fn error_message(&self) -> Option<&'static str> {
        self.status?.status.and_then(error_message)
    }
}
