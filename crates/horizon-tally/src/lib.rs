//! Horizon Tally - cursor-paged, filterable, selectable collections.
//!
//! This is the main crate. It re-exports the core primitives and adds the
//! collection controller, derived views, selection, the typed backend
//! records and configuration.
//!
//! # Example
//!
//! ```
//! use horizon_tally::prelude::*;
//!
//! #[derive(Clone)]
//! struct Row {
//!     id: String,
//!     score: u32,
//! }
//!
//! impl Identified for Row {
//!     fn id(&self) -> &str {
//!         &self.id
//!     }
//! }
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let source = FnPageSource::new(|_cursor: Option<String>, _query: String| async move {
//!     Ok::<_, FetchError>(Page::last(vec![
//!         Row { id: "a".into(), score: 2 },
//!         Row { id: "b".into(), score: 1 },
//!     ]))
//! });
//!
//! let collection = PagedCollection::new(source);
//! collection.fetch_next().await?;
//!
//! let snapshot = collection.snapshot();
//! let by_score = SortSpec::from(SortKey::by_ord("score", |r: &Row| r.score));
//! let view = snapshot.derive_view(Some(&by_score), None)?;
//! assert_eq!(view.ids(), vec!["b", "a"]);
//! # Ok(())
//! # }
//! ```
//!
//! With the `networking` feature, [`net`] provides a GraphQL
//! [`PageSource`] for the labelling backend.

pub use horizon_tally_core::*;

pub mod collection;
pub mod config;
pub mod prelude;
pub mod records;

/// GraphQL transport and page sources.
#[cfg(feature = "networking")]
pub mod net {
    pub use horizon_tally_net::*;
}
