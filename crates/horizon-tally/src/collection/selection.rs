//! Id-keyed row selection.
//!
//! [`toggle_selection`] is the pure click rule shared by list and table
//! views. [`SelectionModel`] keeps a selection across renders, applies the
//! rule according to its [`SelectionMode`], and reports every change
//! through its `selection_changed` signal.
//!
//! # Example
//!
//! ```
//! use horizon_tally::collection::{SelectionMode, SelectionModel};
//!
//! let mut selection = SelectionModel::new();
//! selection.set_selection_mode(SelectionMode::MultiSelection);
//!
//! selection.selection_changed.connect(|(selected, deselected)| {
//!     println!("Selection changed: +{} -{}", selected.len(), deselected.len());
//! });
//!
//! selection.toggle("file-1");
//! selection.toggle("file-2");
//! assert_eq!(selection.selected_ids(), vec!["file-1", "file-2"]);
//! ```

use std::collections::HashSet;

use horizon_tally_core::logging::targets;
use horizon_tally_core::{Identified, Signal};
use indexmap::IndexSet;

use super::view::DerivedView;

/// Applies one click to a selection.
///
/// With `multi` false, clicking the only selected id clears the selection
/// and clicking anything else selects just that id. With `multi` true the
/// id is added if absent and removed if present.
pub fn toggle_selection(selection: &HashSet<String>, id: &str, multi: bool) -> HashSet<String> {
    let current: IndexSet<String> = selection.iter().cloned().collect();
    toggled(&current, id, multi).into_iter().collect()
}

/// The click rule on an ordered selection. A newly added id goes last.
fn toggled(selection: &IndexSet<String>, id: &str, multi: bool) -> IndexSet<String> {
    if multi {
        let mut next = selection.clone();
        if !next.shift_remove(id) {
            next.insert(id.to_owned());
        }
        next
    } else if selection.len() == 1 && selection.contains(id) {
        IndexSet::new()
    } else {
        IndexSet::from([id.to_owned()])
    }
}

/// Selection behavior mode for views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// No items can be selected.
    NoSelection,
    /// At most one item is selected at a time (default).
    #[default]
    SingleSelection,
    /// Any number of items can be selected; clicks toggle.
    MultiSelection,
}

/// Manages the selected ids of one list or table.
///
/// Ids are kept in the order they were selected. The model does not know
/// which ids exist; call [`retain`](Self::retain) after a reset or removal
/// to drop ids that are gone.
pub struct SelectionModel {
    mode: SelectionMode,
    selected: IndexSet<String>,

    /// Emitted when selection changes. Args: (selected, deselected)
    pub selection_changed: Signal<(Vec<String>, Vec<String>)>,
}

impl Default for SelectionModel {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SelectionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionModel")
            .field("mode", &self.mode)
            .field("selected", &self.selected)
            .finish_non_exhaustive()
    }
}

impl SelectionModel {
    /// Creates an empty single-selection model.
    pub fn new() -> Self {
        Self {
            mode: SelectionMode::default(),
            selected: IndexSet::new(),
            selection_changed: Signal::new(),
        }
    }

    /// Creates an empty model with the given mode.
    pub fn with_mode(mode: SelectionMode) -> Self {
        let mut model = Self::new();
        model.mode = mode;
        model
    }

    // =========================================================================
    // Selection Mode
    // =========================================================================

    /// Gets the current selection mode.
    pub fn selection_mode(&self) -> SelectionMode {
        self.mode
    }

    /// Sets the selection mode.
    ///
    /// Switching to `NoSelection` clears the selection; switching to
    /// `SingleSelection` keeps only the most recently selected id.
    pub fn set_selection_mode(&mut self, mode: SelectionMode) {
        self.mode = mode;
        let next = match mode {
            SelectionMode::NoSelection => IndexSet::new(),
            SelectionMode::SingleSelection => self.selected.last().cloned().into_iter().collect(),
            SelectionMode::MultiSelection => return,
        };
        self.replace(next);
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Returns true if `id` is selected.
    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    /// Returns true if anything is selected.
    pub fn has_selection(&self) -> bool {
        !self.selected.is_empty()
    }

    /// Number of selected ids.
    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Selected ids in selection order.
    pub fn selected_ids(&self) -> Vec<&str> {
        self.selected.iter().map(String::as_str).collect()
    }

    /// The selection as an unordered set.
    pub fn to_set(&self) -> HashSet<String> {
        self.selected.iter().cloned().collect()
    }

    /// Returns true if `ids` is non-empty and every id in it is selected.
    ///
    /// Drives the checked state of a table's header checkbox.
    pub fn is_all_selected<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> bool {
        let mut any = false;
        for id in ids {
            if !self.selected.contains(id) {
                return false;
            }
            any = true;
        }
        any
    }

    /// Returns true if some, but not all, of `ids` are selected.
    ///
    /// Drives the indeterminate state of a table's header checkbox.
    pub fn is_some_selected<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> bool {
        let (mut hit, mut miss) = (false, false);
        for id in ids {
            if self.selected.contains(id) {
                hit = true;
            } else {
                miss = true;
            }
        }
        hit && miss
    }

    /// Selected items of a view, in view order.
    pub fn selected_in<'a, T: Identified>(&self, view: &DerivedView<'a, T>) -> Vec<&'a T> {
        view.iter()
            .filter(|item| self.selected.contains(item.id()))
            .collect()
    }

    // =========================================================================
    // Selection Operations
    // =========================================================================

    /// Applies a click on `id` according to the selection mode.
    ///
    /// See [`toggle_selection`].
    pub fn toggle(&mut self, id: &str) {
        let next = match self.mode {
            SelectionMode::NoSelection => return,
            SelectionMode::SingleSelection => toggled(&self.selected, id, false),
            SelectionMode::MultiSelection => toggled(&self.selected, id, true),
        };
        self.replace(next);
    }

    /// Selects `id`. In single-selection mode this replaces the selection.
    pub fn select(&mut self, id: &str) {
        let next = match self.mode {
            SelectionMode::NoSelection => return,
            SelectionMode::SingleSelection => IndexSet::from([id.to_owned()]),
            SelectionMode::MultiSelection => {
                let mut next = self.selected.clone();
                next.insert(id.to_owned());
                next
            }
        };
        self.replace(next);
    }

    /// Deselects `id` if it is selected.
    pub fn deselect(&mut self, id: &str) {
        if !self.selected.contains(id) {
            return;
        }
        let mut next = self.selected.clone();
        next.shift_remove(id);
        self.replace(next);
    }

    /// Selects every id in `ids`. Multi-selection mode only.
    pub fn select_all<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        if self.mode != SelectionMode::MultiSelection {
            return;
        }
        let mut next = self.selected.clone();
        next.extend(ids.into_iter().map(str::to_owned));
        self.replace(next);
    }

    /// Header-checkbox click: deselects `ids` if all of them are selected,
    /// otherwise selects all of them. Multi-selection mode only.
    pub fn toggle_all<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        if self.mode != SelectionMode::MultiSelection {
            return;
        }
        let ids: Vec<&str> = ids.into_iter().collect();
        if self.is_all_selected(ids.iter().copied()) {
            let mut next = self.selected.clone();
            for id in ids {
                next.shift_remove(id);
            }
            self.replace(next);
        } else {
            self.select_all(ids);
        }
    }

    /// Clears all selection.
    pub fn clear(&mut self) {
        self.replace(IndexSet::new());
    }

    /// Keeps only the ids for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        let next = self
            .selected
            .iter()
            .filter(|id| keep(id))
            .cloned()
            .collect();
        self.replace(next);
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    fn replace(&mut self, next: IndexSet<String>) {
        let selected: Vec<String> = next.difference(&self.selected).cloned().collect();
        let deselected: Vec<String> = self.selected.difference(&next).cloned().collect();
        self.selected = next;

        if !selected.is_empty() || !deselected.is_empty() {
            tracing::debug!(
                target: targets::SELECTION,
                selected = selected.len(),
                deselected = deselected.len(),
                total = self.selected.len(),
                "selection changed"
            );
            self.selection_changed.emit((selected, deselected));
        }
    }
}
