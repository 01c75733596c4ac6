//! Core primitives for Horizon Tally.
//!
//! This crate provides the pieces every other Horizon Tally crate builds on:
//!
//! - **Paging contracts**: [`Identified`] items, [`Page`]s and the
//!   [`PageSource`] trait that remote collections implement
//! - **Errors**: [`FetchError`] with its [`FetchErrorKind`] taxonomy and
//!   [`SortError`] for derived views
//! - **Signal/Slot System**: change notification for views
//! - **Image options**: thumbnail size and format for file listings
//! - **Logging**: `tracing` targets and span names
//!
//! # Paging Example
//!
//! ```
//! use horizon_tally_core::{FnPageSource, Page, PageSource};
//!
//! # async fn demo() -> Result<(), horizon_tally_core::FetchError> {
//! let source = FnPageSource::new(|cursor: Option<String>, _query: String| async move {
//!     Ok::<_, horizon_tally_core::FetchError>(match cursor {
//!         None => Page::new(vec!["a", "b"], "c1"),
//!         Some(_) => Page::last(vec!["c"]),
//!     })
//! });
//!
//! let first = source.get_page(None, "").await?;
//! let second = source.get_page(first.next_cursor.as_deref(), "").await?;
//! assert!(second.is_last());
//! # Ok(())
//! # }
//! ```
//!
//! # Signal/Slot Example
//!
//! ```
//! use horizon_tally_core::Signal;
//!
//! let changed = Signal::<String>::new();
//! let conn_id = changed.connect(|id| println!("item {} changed", id));
//! changed.emit("file-1".to_string());
//! changed.disconnect(conn_id);
//! ```

mod error;
pub mod image;
pub mod logging;
pub mod paging;
pub mod signal;

pub use error::{FetchError, FetchErrorKind, FetchResult, SortError};
pub use image::{ImageFormat, ImageOptions};
pub use paging::{FnPageSource, Identified, Page, PageSource};
pub use signal::{ConnectionGuard, ConnectionId, Signal};
