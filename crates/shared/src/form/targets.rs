use crate::models::{HardwareCatalog, TargetSelection};
use log::debug;
use std::collections::HashSet;
use std::sync::Arc;

pub const MAX_TARGET_ROWS: usize = 3;

/// Hardware rows of the form.
///
/// Every row owns a handle to the catalog it picks from; the selections are
/// kept in a parallel list that may be shorter than the row list (a row the
/// user never touched has no selection yet).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TargetSelectionStore {
    rows: Vec<Arc<HardwareCatalog>>,
    selections: Vec<TargetSelection>,
}

impl TargetSelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the form with a single row picking from `catalog`.
    pub fn seed(catalog: Arc<HardwareCatalog>) -> Self {
        Self {
            rows: vec![catalog],
            selections: Vec::new(),
        }
    }

    pub fn rows(&self) -> &[Arc<HardwareCatalog>] {
        &self.rows
    }

    pub fn selections(&self) -> &[TargetSelection] {
        &self.selections
    }

    pub fn selection(&self, index: usize) -> Option<&TargetSelection> {
        self.selections.get(index)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn can_add(&self) -> bool {
        !self.rows.is_empty() && self.rows.len() < MAX_TARGET_ROWS
    }

    /// Row 0 can only be cleared, and only once it has an instance.
    pub fn can_remove(&self, index: usize) -> bool {
        match index {
            0 => self
                .selections
                .first()
                .is_some_and(TargetSelection::is_resolved),
            _ => index < self.rows.len(),
        }
    }

    /// Appends another row picking from the same catalog as row 0.
    pub fn add_row(&mut self) {
        if !self.can_add() {
            debug!("Ignoring add row: {} rows present", self.rows.len());
            return;
        }
        let catalog = Arc::clone(&self.rows[0]);
        self.rows.push(catalog);
    }

    /// Removes row `index`. Row 0 stays in place and only loses its
    /// selection.
    pub fn remove_row(&mut self, index: usize) {
        if !self.can_remove(index) {
            debug!("Ignoring remove of row {index}");
            return;
        }
        if index == 0 {
            if let Some(first) = self.selections.first_mut() {
                *first = TargetSelection::default();
            }
            return;
        }

        self.rows.remove(index);
        if index < self.selections.len() {
            self.selections.remove(index);
        }
    }

    /// Picks a provider for row `index`, clearing the instance and its specs.
    pub fn set_provider(&mut self, index: usize, provider: impl Into<String>) {
        let Some(selection) = self.selection_mut(index) else {
            return;
        };
        selection.provider = Some(provider.into());
        selection.instance = None;
        selection.cpu = None;
        selection.memory = None;
        self.dedup_by_instance();
    }

    /// Picks an instance for row `index` and resolves its cpu and memory
    /// against the provider already chosen on that row.
    pub fn set_instance(&mut self, index: usize, instance: impl Into<String>) {
        let instance = instance.into();
        let Some(catalog) = self.rows.get(index).cloned() else {
            return;
        };
        let Some(selection) = self.selection_mut(index) else {
            return;
        };

        let specs = selection
            .provider
            .as_deref()
            .and_then(|provider| catalog.specs(provider, &instance))
            .copied();
        selection.cpu = specs.map(|s| s.cpu);
        selection.memory = specs.map(|s| s.memory);
        selection.instance = Some(instance);
        self.dedup_by_instance();
    }

    fn selection_mut(&mut self, index: usize) -> Option<&mut TargetSelection> {
        if index >= self.rows.len() {
            debug!("Ignoring update for missing hardware row {index}");
            return None;
        }
        if self.selections.len() <= index {
            self.selections.resize_with(index + 1, TargetSelection::default);
        }
        self.selections.get_mut(index)
    }

    /// Drops every selection whose instance already appears on an earlier
    /// row. Selections without an instance are kept.
    fn dedup_by_instance(&mut self) {
        let mut seen = HashSet::new();
        self.selections.retain(|selection| match &selection.instance {
            Some(instance) => seen.insert(instance.clone()),
            None => true,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HardwareOption;

    fn catalog() -> Arc<HardwareCatalog> {
        Arc::new(HardwareCatalog::from_options(vec![
            HardwareOption {
                provider: "AWS".to_string(),
                instance: "m4.large".to_string(),
                cpu: 2,
                memory: 8.0,
            },
            HardwareOption {
                provider: "AWS".to_string(),
                instance: "c5.xlarge".to_string(),
                cpu: 4,
                memory: 8.0,
            },
            HardwareOption {
                provider: "GCP".to_string(),
                instance: "n1-standard-8".to_string(),
                cpu: 8,
                memory: 30.0,
            },
        ]))
    }

    fn store_with_rows(rows: usize) -> TargetSelectionStore {
        let mut store = TargetSelectionStore::seed(catalog());
        for _ in 1..rows {
            store.add_row();
        }
        store
    }

    #[test]
    fn test_add_row_stops_at_three() {
        let mut store = store_with_rows(1);
        assert!(store.can_add());
        store.add_row();
        store.add_row();
        assert_eq!(store.row_count(), 3);
        assert!(!store.can_add());

        store.add_row();
        assert_eq!(store.row_count(), 3);
        assert!(store.selections().is_empty());
    }

    #[test]
    fn test_add_row_without_catalog_is_ignored() {
        let mut store = TargetSelectionStore::new();
        store.add_row();
        assert_eq!(store.row_count(), 0);
    }

    #[test]
    fn test_added_rows_share_first_catalog() {
        let store = store_with_rows(2);
        assert!(Arc::ptr_eq(&store.rows()[0], &store.rows()[1]));
    }

    #[test]
    fn test_provider_change_clears_instance() {
        let mut store = store_with_rows(1);
        store.set_provider(0, "AWS");
        store.set_instance(0, "m4.large");
        assert_eq!(store.selection(0).and_then(|s| s.cpu), Some(2));

        store.set_provider(0, "GCP");
        let selection = store.selection(0).unwrap();
        assert_eq!(selection.provider.as_deref(), Some("GCP"));
        assert_eq!(selection.instance, None);
        assert_eq!(selection.cpu, None);
        assert_eq!(selection.memory, None);
    }

    #[test]
    fn test_instance_resolves_against_own_provider() {
        let mut store = store_with_rows(2);
        store.set_provider(0, "GCP");
        store.set_provider(1, "AWS");

        // Row 0 is on GCP, so an AWS instance name does not resolve.
        store.set_instance(0, "m4.large");
        let first = store.selection(0).unwrap();
        assert_eq!(first.instance.as_deref(), Some("m4.large"));
        assert_eq!(first.cpu, None);
        assert_eq!(first.display_cpu(), 0);
        assert_eq!(first.display_memory(), 0.0);

        store.set_instance(1, "c5.xlarge");
        let second = store.selection(1).unwrap();
        assert_eq!(second.cpu, Some(4));
        assert_eq!(second.memory, Some(8.0));
    }

    #[test]
    fn test_instance_without_provider_does_not_resolve() {
        let mut store = store_with_rows(1);
        store.set_instance(0, "m4.large");
        assert_eq!(store.selection(0).and_then(|s| s.cpu), None);
    }

    #[test]
    fn test_duplicate_instance_collapses_into_earlier_row() {
        let mut store = store_with_rows(3);
        store.set_provider(0, "AWS");
        store.set_instance(0, "m4.large");
        store.set_provider(1, "AWS");
        store.set_provider(2, "AWS");
        store.set_instance(2, "c5.xlarge");
        assert_eq!(store.selections().len(), 3);

        store.set_instance(1, "m4.large");
        let instances: Vec<_> = store
            .selections()
            .iter()
            .map(|s| s.instance.as_deref())
            .collect();
        assert_eq!(instances, vec![Some("m4.large"), Some("c5.xlarge")]);
        // The row list itself is left alone.
        assert_eq!(store.row_count(), 3);
    }

    #[test]
    fn test_rows_without_instance_do_not_collapse() {
        let mut store = store_with_rows(2);
        store.set_provider(0, "AWS");
        store.set_provider(1, "GCP");
        assert_eq!(store.selections().len(), 2);
    }

    #[test]
    fn test_updating_later_row_pads_selections() {
        let mut store = store_with_rows(3);
        store.set_provider(2, "GCP");
        assert_eq!(store.selections().len(), 3);
        assert_eq!(store.selection(0), Some(&TargetSelection::default()));
        assert_eq!(
            store.selection(2).and_then(|s| s.provider.as_deref()),
            Some("GCP")
        );
    }

    #[test]
    fn test_update_on_missing_row_is_ignored() {
        let mut store = store_with_rows(1);
        store.set_provider(1, "AWS");
        store.set_instance(5, "m4.large");
        assert!(store.selections().is_empty());
    }

    #[test]
    fn test_remove_non_zero_row() {
        let mut store = store_with_rows(3);
        store.set_provider(0, "AWS");
        store.set_instance(0, "m4.large");
        store.set_provider(1, "AWS");
        store.set_instance(1, "c5.xlarge");
        store.set_provider(2, "GCP");
        store.set_instance(2, "n1-standard-8");

        store.remove_row(1);
        assert_eq!(store.row_count(), 2);
        let instances: Vec<_> = store
            .selections()
            .iter()
            .filter_map(|s| s.instance.as_deref())
            .collect();
        assert_eq!(instances, vec!["m4.large", "n1-standard-8"]);
    }

    #[test]
    fn test_remove_row_zero_only_clears_selection() {
        let mut store = store_with_rows(2);
        assert!(!store.can_remove(0));
        assert!(store.can_remove(1));

        store.set_provider(0, "AWS");
        store.set_instance(0, "m4.large");
        assert!(store.can_remove(0));

        store.remove_row(0);
        assert_eq!(store.row_count(), 2);
        assert_eq!(store.selection(0), Some(&TargetSelection::default()));
        assert!(!store.can_remove(0));
    }

    #[test]
    fn test_remove_unresolved_row_zero_is_ignored() {
        let mut store = store_with_rows(1);
        store.set_provider(0, "AWS");
        store.remove_row(0);
        assert_eq!(
            store.selection(0).and_then(|s| s.provider.as_deref()),
            Some("AWS")
        );

        store.remove_row(4);
        assert_eq!(store.row_count(), 1);
    }
}
