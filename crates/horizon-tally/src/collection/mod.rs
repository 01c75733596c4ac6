//! Paged collections and their derived views.
//!
//! This module provides:
//!
//! - [`PagedCollection`]: drives cursor-paged retrieval from a
//!   [`PageSource`](horizon_tally_core::PageSource), deduplicating by id and
//!   keeping at most one request in flight
//! - [`CollectionState`]: the pure state machine behind it
//! - [`derive_view`]: local filtering and stable multi-key sorting
//! - [`SelectionModel`] and [`toggle_selection`]: id-keyed row selection
//! - [`CollectionRegistry`]: collections owned by a scope and keyed by
//!   name and parameters
//!
//! # Typical flow
//!
//! A list view creates a collection and calls
//! [`fetch_next`](PagedCollection::fetch_next) on mount and whenever the
//! user scrolls near the end. A debounced search box calls
//! [`set_filter_query`](PagedCollection::set_filter_query) followed by
//! `fetch_next`. The view renders
//! [`snapshot().derive_view(..)`](CollectionSnapshot::derive_view) and
//! re-renders on [`state_changed`](PagedCollection::state_changed).

mod controller;
mod registry;
mod selection;
mod state;
mod view;

pub use controller::{CollectionEvent, LoadAll, PagedCollection, DEFAULT_MAX_PAGES_PER_LOAD_ALL};
pub use registry::{CollectionKey, CollectionRegistry};
pub use selection::{toggle_selection, SelectionMode, SelectionModel};
pub use state::{
    CollectionSnapshot, CollectionState, FetchOutcome, FetchSkipped, FetchStart, FetchStatus,
    FetchTicket, MergeStats,
};
pub use view::{
    derive_view, CompareFn, DerivedView, LocalFilter, PredicateFn, SortDirection, SortKey,
    SortSpec,
};
