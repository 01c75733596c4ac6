//! Cursor-based paging contracts.
//!
//! A [`PageSource`] hands out items one [`Page`] at a time. Each page carries
//! an opaque cursor for the next request; `None` marks the last page. Cursors
//! are issued and consumed by the source only and are never inspected here.
//!
//! Items are identified by a stable string id through [`Identified`]. Sources
//! are not required to return sorted or deduplicated pages; merging pages by
//! id is the collection's job.

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::FetchResult;

/// An item with a stable, unique identity.
///
/// Two items with equal ids are the same logical record; the later one
/// replaces the earlier when pages overlap.
pub trait Identified {
    /// Returns the item's unique id.
    fn id(&self) -> &str;
}

impl<T: Identified + ?Sized> Identified for Arc<T> {
    fn id(&self) -> &str {
        (**self).id()
    }
}

/// One batch of items plus the cursor for the next batch.
///
/// The wire shape is the backend's `{ items, nextToken }` list response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items in this batch, in source order.
    pub items: Vec<T>,
    /// Cursor for the following page, or `None` if this is the last page.
    #[serde(default, rename = "nextToken", alias = "nextCursor")]
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// Creates a page that has a successor.
    pub fn new(items: Vec<T>, next_cursor: impl Into<String>) -> Self {
        Self {
            items,
            next_cursor: Some(next_cursor.into()),
        }
    }

    /// Creates the final page of a sequence.
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_cursor: None,
        }
    }

    /// Returns true if no page follows this one.
    pub fn is_last(&self) -> bool {
        self.next_cursor.is_none()
    }

    /// Maps every item to another type, keeping the cursor.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
        }
    }
}

/// A remote collection that can be read page by page.
///
/// `cursor` is `None` for the first page and otherwise the `next_cursor` of
/// the previous page. `query` is the collection's filter query, passed
/// through verbatim. Timeouts are the source's responsibility.
///
/// A source may return an empty page with a cursor (the caller keeps
/// paging) or a non-empty page without one (the last page).
pub trait PageSource<T>: Send + Sync {
    /// Fetches the page starting at `cursor`.
    fn get_page(
        &self,
        cursor: Option<&str>,
        query: &str,
    ) -> impl Future<Output = FetchResult<Page<T>>> + Send;
}

impl<T, S: PageSource<T>> PageSource<T> for Arc<S> {
    fn get_page(
        &self,
        cursor: Option<&str>,
        query: &str,
    ) -> impl Future<Output = FetchResult<Page<T>>> + Send {
        (**self).get_page(cursor, query)
    }
}

/// A [`PageSource`] backed by a closure.
///
/// The closure receives owned copies of the cursor and query so the returned
/// future does not borrow from the caller.
///
/// # Example
///
/// ```
/// use horizon_tally_core::paging::{FnPageSource, Page};
/// use horizon_tally_core::FetchResult;
///
/// let source = FnPageSource::new(|cursor: Option<String>, _query: String| async move {
///     let page: FetchResult<Page<u32>> = match cursor.as_deref() {
///         None => Ok(Page::new(vec![1, 2], "c1")),
///         Some(_) => Ok(Page::last(vec![3])),
///     };
///     page
/// });
/// # let _ = source;
/// ```
pub struct FnPageSource<F> {
    fetch: F,
}

impl<F> FnPageSource<F> {
    /// Wraps a fetch closure.
    pub fn new(fetch: F) -> Self {
        Self { fetch }
    }
}

impl<T, F, Fut> PageSource<T> for FnPageSource<F>
where
    F: Fn(Option<String>, String) -> Fut + Send + Sync,
    Fut: Future<Output = FetchResult<Page<T>>> + Send,
{
    fn get_page(
        &self,
        cursor: Option<&str>,
        query: &str,
    ) -> impl Future<Output = FetchResult<Page<T>>> + Send {
        (self.fetch)(cursor.map(str::to_owned), query.to_owned())
    }
}

impl<F> std::fmt::Debug for FnPageSource<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnPageSource").finish_non_exhaustive()
    }
}
