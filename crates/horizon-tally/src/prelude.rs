//! Prelude module for Horizon Tally.
//!
//! ```
//! use horizon_tally::prelude::*;
//! ```
//!
//! This provides access to:
//! - Paging contracts (`Identified`, `Page`, `PageSource`)
//! - Errors (`FetchError`, `FetchErrorKind`, `SortError`)
//! - The collection controller and its events
//! - Derived views and selection

// ============================================================================
// Paging and Errors
// ============================================================================

pub use crate::{
    FetchError, FetchErrorKind, FetchResult, FnPageSource, Identified, Page, PageSource,
    SortError,
};

// ============================================================================
// Signal/Slot
// ============================================================================

pub use crate::{ConnectionId, Signal};

// ============================================================================
// Collections
// ============================================================================

pub use crate::collection::{
    CollectionEvent, CollectionKey, CollectionRegistry, CollectionSnapshot, FetchOutcome,
    FetchStatus, PagedCollection,
};

// ============================================================================
// Views and Selection
// ============================================================================

pub use crate::collection::{
    derive_view, toggle_selection, DerivedView, LocalFilter, SelectionMode, SelectionModel,
    SortDirection, SortKey, SortSpec,
};

// ============================================================================
// Configuration
// ============================================================================

pub use crate::config::TallyConfig;

// ============================================================================
// Networking
// ============================================================================

#[cfg(feature = "networking")]
pub use crate::net::{GraphQLClient, GraphQLPageSource, ListQuery, Mutation};
