//! Row selection.
//!
//! Selection is keyed by [`RowId`], produced by the caller's row-key
//! function, so it stays stable across refetches and page changes. The
//! table only relays selection events to the caller through
//! [`SelectionConfig`]; callers that want to keep the set locally can use
//! [`SelectionSet`].

use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

/// Stable identity of a row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    Int(i64),
    Str(String),
}

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{}", id),
            Self::Str(id) => write!(f, "{}", id),
        }
    }
}

impl From<i64> for RowId {
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

impl From<u32> for RowId {
    fn from(id: u32) -> Self {
        Self::Int(i64::from(id))
    }
}

impl From<i32> for RowId {
    fn from(id: i32) -> Self {
        Self::Int(i64::from(id))
    }
}

impl From<String> for RowId {
    fn from(id: String) -> Self {
        Self::Str(id)
    }
}

impl From<&str> for RowId {
    fn from(id: &str) -> Self {
        Self::Str(id.to_string())
    }
}

/// Ordered set of selected row IDs.
///
/// Insertion order is kept so that callers can report selections in the
/// order the user made them. Membership checks are O(1).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    order: Vec<RowId>,
    members: HashSet<RowId>,
}

impl SelectionSet {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a selection from IDs, dropping duplicates (first one wins).
    pub fn from_ids<I>(ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<RowId>,
    {
        let mut set = Self::new();
        for id in ids {
            set.insert(id.into());
        }
        set
    }

    /// Check if an ID is selected.
    pub fn contains(&self, id: &RowId) -> bool {
        self.members.contains(id)
    }

    /// Number of selected IDs.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Selected IDs in insertion order.
    pub fn ids(&self) -> &[RowId] {
        &self.order
    }

    /// Toggle selection of an ID.
    ///
    /// Returns `true` if the ID is selected afterwards.
    pub fn toggle(&mut self, id: RowId) -> bool {
        if self.members.remove(&id) {
            self.order.retain(|existing| existing != &id);
            false
        } else {
            self.insert(id);
            true
        }
    }

    /// Select every ID in `visible`. Returns the newly selected IDs.
    pub fn select_all_visible(&mut self, visible: &[RowId]) -> Vec<RowId> {
        visible
            .iter()
            .filter(|id| self.insert((*id).clone()))
            .cloned()
            .collect()
    }

    /// Clear all selection. Returns the IDs that were deselected.
    pub fn clear_all(&mut self) -> Vec<RowId> {
        self.members.clear();
        std::mem::take(&mut self.order)
    }

    fn insert(&mut self, id: RowId) -> bool {
        if self.members.insert(id.clone()) {
            self.order.push(id);
            true
        } else {
            false
        }
    }
}

/// State of the select-all toggle in the selection column header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectAllState {
    Unchecked,
    Indeterminate,
    Checked,
}

/// Callback invoked when the select-all toggle is clicked.
pub type SelectAllFn = Arc<dyn Fn() + Send + Sync>;

/// Callback invoked when a row toggle is clicked.
pub type ToggleSelectFn = Arc<dyn Fn(RowId) + Send + Sync>;

/// Caller-owned selection.
///
/// The caller stores the selected IDs and decides what a select-all click
/// means (select everything or clear everything) from `all_selected`. The
/// table renders the indicators and relays clicks.
#[derive(Clone)]
pub struct SelectionConfig {
    selected: SelectionSet,
    all_selected: bool,
    on_select_all: SelectAllFn,
    on_toggle_select: ToggleSelectFn,
}

impl SelectionConfig {
    /// Create a selection config with the caller's handlers.
    pub fn new<A, B>(on_select_all: A, on_toggle_select: B) -> Self
    where
        A: Fn() + Send + Sync + 'static,
        B: Fn(RowId) + Send + Sync + 'static,
    {
        Self {
            selected: SelectionSet::new(),
            all_selected: false,
            on_select_all: Arc::new(on_select_all),
            on_toggle_select: Arc::new(on_toggle_select),
        }
    }

    /// Set the currently selected IDs. Duplicates are dropped.
    pub fn selected_ids<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<RowId>,
    {
        self.selected = SelectionSet::from_ids(ids);
        self
    }

    /// Set whether the caller considers everything selected.
    pub fn all_selected(mut self, all_selected: bool) -> Self {
        self.all_selected = all_selected;
        self
    }

    /// The selected IDs.
    pub fn selection(&self) -> &SelectionSet {
        &self.selected
    }

    /// Whether the caller considers everything selected.
    pub fn is_all_selected(&self) -> bool {
        self.all_selected
    }

    /// Check if a row is selected.
    pub fn is_selected(&self, id: &RowId) -> bool {
        self.selected.contains(id)
    }

    /// Header toggle state for the given visible rows.
    pub fn select_all_state(&self, visible: &[RowId]) -> SelectAllState {
        if self.all_selected {
            return SelectAllState::Checked;
        }
        if visible.iter().any(|id| self.selected.contains(id)) {
            SelectAllState::Indeterminate
        } else {
            SelectAllState::Unchecked
        }
    }

    pub(crate) fn select_all_handler(&self) -> SelectAllFn {
        Arc::clone(&self.on_select_all)
    }

    pub(crate) fn toggle_handler(&self) -> ToggleSelectFn {
        Arc::clone(&self.on_toggle_select)
    }
}

impl std::fmt::Debug for SelectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionConfig")
            .field("selected", &self.selected)
            .field("all_selected", &self.all_selected)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[i64]) -> Vec<RowId> {
        raw.iter().copied().map(RowId::from).collect()
    }

    #[test]
    fn test_toggle_is_its_own_inverse() {
        let mut set = SelectionSet::from_ids([1i64, 2]);
        let before = set.clone();
        assert!(set.toggle(RowId::from(3i64)));
        assert!(!set.toggle(RowId::from(3i64)));
        assert_eq!(set, before);

        assert!(!set.toggle(RowId::from(1i64)));
        assert!(set.toggle(RowId::from(1i64)));
        assert_eq!(set.len(), 2);
        assert!(set.contains(&RowId::from(1i64)));
    }

    #[test]
    fn test_from_ids_drops_duplicates() {
        let set = SelectionSet::from_ids(["a", "b", "a"]);
        assert_eq!(set.ids(), &[RowId::from("a"), RowId::from("b")]);
    }

    #[test]
    fn test_select_all_visible_and_clear() {
        let mut set = SelectionSet::from_ids([2i64]);
        let added = set.select_all_visible(&ids(&[1, 2, 3]));
        assert_eq!(added, ids(&[1, 3]));
        assert_eq!(set.len(), 3);

        let removed = set.clear_all();
        assert_eq!(removed, ids(&[2, 1, 3]));
        assert!(set.is_empty());
    }

    #[test]
    fn test_select_all_state() {
        let config = SelectionConfig::new(|| {}, |_| {}).selected_ids([1i64]);
        assert_eq!(config.select_all_state(&ids(&[1, 2])), SelectAllState::Indeterminate);
        assert_eq!(config.select_all_state(&ids(&[5, 6])), SelectAllState::Unchecked);

        let config = config.all_selected(true);
        assert_eq!(config.select_all_state(&ids(&[5, 6])), SelectAllState::Checked);
    }

    #[test]
    fn test_row_id_display_and_serde() {
        assert_eq!(RowId::from(42i64).to_string(), "42");
        assert_eq!(RowId::from("u-1").to_string(), "u-1");
        let parsed: Vec<RowId> = serde_json::from_str(r#"[7, "x"]"#).unwrap();
        assert_eq!(parsed, vec![RowId::Int(7), RowId::Str("x".into())]);
    }
}
