//! The paged collection controller.

use std::fmt;

use chrono::{DateTime, Utc};
use horizon_tally_core::logging::{span_names, targets};
use horizon_tally_core::{FetchError, FetchResult, Identified, PageSource, Signal};
use parking_lot::Mutex;
use tracing::Instrument;

use super::state::{
    CollectionSnapshot, CollectionState, FetchOutcome, FetchStart, FetchStatus, FetchTicket,
};

/// Default guard for [`PagedCollection::fetch_all`].
pub const DEFAULT_MAX_PAGES_PER_LOAD_ALL: usize = 1000;

/// A state change reported through [`PagedCollection::state_changed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionEvent {
    /// Items were discarded by a filter change or an invalidation.
    Reset,
    /// A request was issued.
    FetchStarted {
        /// `Loading` for a first page, `LoadingMore` otherwise.
        status: FetchStatus,
    },
    /// A page was merged.
    PageMerged {
        inserted: usize,
        updated: usize,
        exhausted: bool,
    },
    /// The request failed; items and cursor are unchanged.
    Failed(FetchError),
    /// An item was removed locally.
    ItemRemoved(String),
    /// An item was edited or upserted locally.
    ItemUpdated(String),
}

/// Result of [`PagedCollection::fetch_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadAll {
    /// Pages merged by this call.
    pub pages: usize,
    /// True if the collection is exhausted.
    pub exhausted: bool,
}

/// Drives paged retrieval from a [`PageSource`] into a deduplicated,
/// insertion-ordered [`CollectionState`].
///
/// All methods take `&self`; share the collection behind an `Arc` between
/// the view that renders it and the task that fetches. The state lock is
/// never held across the request, and signal slots run after it has been
/// released, so a slot may read the collection.
///
/// # Example
///
/// ```
/// use horizon_tally::collection::PagedCollection;
/// use horizon_tally::{FnPageSource, Identified, Page};
///
/// #[derive(Clone)]
/// struct Row(String);
///
/// impl Identified for Row {
///     fn id(&self) -> &str {
///         &self.0
///     }
/// }
///
/// # async fn demo() -> Result<(), horizon_tally::FetchError> {
/// let source = FnPageSource::new(|cursor: Option<String>, _query: String| async move {
///     Ok::<_, horizon_tally::FetchError>(match cursor {
///         None => Page::new(vec![Row("1".into()), Row("2".into())], "c1"),
///         Some(_) => Page::last(vec![Row("2".into()), Row("3".into())]),
///     })
/// });
///
/// let collection = PagedCollection::new(source).with_label("rows");
/// collection.fetch_next().await?;
/// collection.fetch_next().await?;
/// assert_eq!(collection.snapshot().ids(), vec!["1", "2", "3"]);
/// assert!(collection.is_exhausted());
/// # Ok(())
/// # }
/// ```
pub struct PagedCollection<T, S> {
    label: String,
    source: S,
    state: Mutex<CollectionState<T>>,
    max_pages_per_load_all: usize,

    /// Emitted after every state transition.
    pub state_changed: Signal<CollectionEvent>,
}

impl<T, S> fmt::Debug for PagedCollection<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("PagedCollection")
            .field("label", &self.label)
            .field("len", &state.len())
            .field("status", &state.status())
            .field("epoch", &state.epoch())
            .field("exhausted", &state.is_exhausted())
            .finish_non_exhaustive()
    }
}

impl<T, S> PagedCollection<T, S> {
    /// Creates an idle, empty collection over `source`.
    pub fn new(source: S) -> Self {
        Self {
            label: String::from("collection"),
            source,
            state: Mutex::new(CollectionState::new()),
            max_pages_per_load_all: DEFAULT_MAX_PAGES_PER_LOAD_ALL,
            state_changed: Signal::new(),
        }
    }

    /// Sets the label used in log output.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the initial filter query.
    pub fn with_query(self, query: impl Into<String>) -> Self {
        *self.state.lock() = CollectionState::with_query(query);
        self
    }

    /// Sets the page guard for [`fetch_all`](Self::fetch_all).
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages_per_load_all = max_pages.max(1);
        self
    }

    /// The collection's label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The page source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The page guard for [`fetch_all`](Self::fetch_all).
    pub fn max_pages_per_load_all(&self) -> usize {
        self.max_pages_per_load_all
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Runs `f` against the current state under the state lock.
    ///
    /// Keep `f` short; fetches that complete meanwhile wait for it.
    pub fn read<R>(&self, f: impl FnOnce(&CollectionState<T>) -> R) -> R {
        f(&self.state.lock())
    }

    /// Copies the current state.
    pub fn snapshot(&self) -> CollectionSnapshot<T>
    where
        T: Clone,
    {
        self.state.lock().snapshot()
    }

    /// Number of accumulated items.
    pub fn len(&self) -> usize {
        self.state.lock().len()
    }

    /// Returns true if nothing has been accumulated.
    pub fn is_empty(&self) -> bool {
        self.state.lock().is_empty()
    }

    /// Current fetch status.
    pub fn status(&self) -> FetchStatus {
        self.state.lock().status()
    }

    /// Returns true while the status is `Loading` or `LoadingMore`.
    pub fn is_loading(&self) -> bool {
        self.state.lock().status().is_loading()
    }

    /// Returns true while another fetch could yield items.
    pub fn has_more(&self) -> bool {
        self.state.lock().has_more()
    }

    /// Returns true once the source has reported the last page.
    pub fn is_exhausted(&self) -> bool {
        self.state.lock().is_exhausted()
    }

    /// Cursor for the next request.
    pub fn cursor(&self) -> Option<String> {
        self.state.lock().cursor().map(str::to_owned)
    }

    /// Error of the last failed fetch.
    pub fn last_error(&self) -> Option<FetchError> {
        self.state.lock().last_error().cloned()
    }

    /// The filter query passed to the source.
    pub fn filter_query(&self) -> String {
        self.state.lock().filter_query().to_owned()
    }

    /// The current reset epoch.
    pub fn epoch(&self) -> u64 {
        self.state.lock().epoch()
    }

    /// Time of the last successful merge.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.state.lock().last_updated()
    }

    // =========================================================================
    // Resets and local edits
    // =========================================================================

    /// Switches to a new filter query.
    ///
    /// Returns false if the query is unchanged. Otherwise the items are
    /// cleared, the status becomes `Loading` and any in-flight response
    /// will be dropped; call [`fetch_next`](Self::fetch_next) to load the
    /// first page.
    pub fn set_filter_query(&self, query: &str) -> bool {
        let (changed, epoch) = {
            let mut state = self.state.lock();
            (state.set_filter_query(query), state.epoch())
        };
        if changed {
            tracing::debug!(
                target: targets::COLLECTION,
                collection = %self.label,
                query,
                epoch,
                "filter query changed, collection reset"
            );
            self.state_changed.emit(CollectionEvent::Reset);
        }
        changed
    }

    /// Discards accumulated items and restarts from the first page.
    ///
    /// Used after a mutation whose effect on the list cannot be applied
    /// locally.
    pub fn invalidate(&self) {
        let epoch = {
            let mut state = self.state.lock();
            state.invalidate();
            state.epoch()
        };
        tracing::debug!(
            target: targets::COLLECTION,
            collection = %self.label,
            epoch,
            "collection invalidated"
        );
        self.state_changed.emit(CollectionEvent::Reset);
    }

    /// Removes an item without refetching.
    pub fn remove_item(&self, id: &str) -> Option<T> {
        let removed = self.state.lock().remove(id);
        if removed.is_some() {
            self.state_changed
                .emit(CollectionEvent::ItemRemoved(id.to_owned()));
        }
        removed
    }

    /// Edits an item in place. Returns false if the id is unknown.
    pub fn update_item(&self, id: &str, f: impl FnOnce(&mut T)) -> bool {
        let updated = self.state.lock().update(id, f);
        if updated {
            self.state_changed
                .emit(CollectionEvent::ItemUpdated(id.to_owned()));
        }
        updated
    }

    /// Overwrites the item with the same id in place, or appends it.
    ///
    /// Returns true if the item was new.
    pub fn upsert_item(&self, item: T) -> bool
    where
        T: Identified,
    {
        let id = item.id().to_owned();
        let inserted = self.state.lock().upsert(item);
        self.state_changed.emit(CollectionEvent::ItemUpdated(id));
        inserted
    }
}

impl<T, S> PagedCollection<T, S>
where
    T: Identified + Send,
    S: PageSource<T>,
{
    /// Fetches and merges the next page.
    ///
    /// Returns without touching the source if a fetch is already in flight
    /// ([`FetchOutcome::InFlight`]) or the collection is exhausted
    /// ([`FetchOutcome::Exhausted`]). A response that arrives after a
    /// filter change or invalidation is dropped ([`FetchOutcome::Stale`]).
    ///
    /// # Errors
    ///
    /// Returns the source's error. It is also recorded as
    /// [`last_error`](Self::last_error); items and cursor are unchanged, so
    /// calling `fetch_next` again retries the same page.
    ///
    /// Dropping the returned future before it completes releases the
    /// in-flight guard.
    pub async fn fetch_next(&self) -> FetchResult<FetchOutcome> {
        let start = self.state.lock().begin_fetch();
        let ticket = match start {
            FetchStart::Ready(ticket) => ticket,
            FetchStart::Skipped(skipped) => {
                tracing::debug!(
                    target: targets::COLLECTION,
                    collection = %self.label,
                    reason = ?skipped,
                    "fetch ignored"
                );
                return Ok(skipped.into());
            }
        };

        let span = tracing::debug_span!(
            target: targets::COLLECTION,
            span_names::FETCH,
            collection = %self.label,
            epoch = ticket.epoch()
        );
        self.run_fetch(ticket).instrument(span).await
    }

    async fn run_fetch(&self, ticket: FetchTicket) -> FetchResult<FetchOutcome> {
        tracing::debug!(
            target: targets::COLLECTION,
            cursor = ticket.cursor(),
            query = ticket.query(),
            status = ?ticket.status(),
            "fetching page"
        );
        self.state_changed.emit(CollectionEvent::FetchStarted {
            status: ticket.status(),
        });

        let mut guard = InFlightGuard {
            state: &self.state,
            ticket,
            armed: true,
        };
        let result = self
            .source
            .get_page(guard.ticket.cursor(), guard.ticket.query())
            .await;
        guard.armed = false;

        let outcome = self.state.lock().complete_fetch(&guard.ticket, result);
        match &outcome {
            Ok(FetchOutcome::Merged {
                inserted,
                updated,
                exhausted,
            }) => {
                tracing::debug!(
                    target: targets::COLLECTION,
                    inserted,
                    updated,
                    exhausted,
                    "page merged"
                );
                self.state_changed.emit(CollectionEvent::PageMerged {
                    inserted: *inserted,
                    updated: *updated,
                    exhausted: *exhausted,
                });
            }
            Ok(FetchOutcome::Stale) => {
                tracing::debug!(
                    target: targets::COLLECTION,
                    "dropping response from a previous epoch"
                );
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(
                    target: targets::COLLECTION,
                    kind = %err.kind,
                    error = %err.message,
                    "page fetch failed"
                );
                self.state_changed.emit(CollectionEvent::Failed(err.clone()));
            }
        }
        outcome
    }

    /// Fetches pages until the collection is exhausted.
    ///
    /// Stops early, without error, if another fetch is in flight or the
    /// collection is reset meanwhile, and after
    /// [`max_pages_per_load_all`](Self::max_pages_per_load_all) pages.
    ///
    /// # Errors
    ///
    /// Returns the first fetch error. Pages merged before it are kept.
    pub async fn fetch_all(&self) -> FetchResult<LoadAll> {
        let span = tracing::debug_span!(
            target: targets::COLLECTION,
            span_names::FETCH_ALL,
            collection = %self.label
        );
        self.load_all().instrument(span).await
    }

    async fn load_all(&self) -> FetchResult<LoadAll> {
        let epoch = self.epoch();
        let mut pages = 0;

        while pages < self.max_pages_per_load_all {
            match self.fetch_next().await? {
                FetchOutcome::Merged { exhausted, .. } => {
                    pages += 1;
                    if exhausted {
                        return Ok(LoadAll {
                            pages,
                            exhausted: true,
                        });
                    }
                }
                FetchOutcome::Exhausted => {
                    return Ok(LoadAll {
                        pages,
                        exhausted: true,
                    });
                }
                FetchOutcome::InFlight | FetchOutcome::Stale => break,
            }
            if self.epoch() != epoch {
                break;
            }
        }

        if pages >= self.max_pages_per_load_all {
            tracing::warn!(
                target: targets::COLLECTION,
                pages,
                "stopped loading after the page limit"
            );
        }
        Ok(LoadAll {
            pages,
            exhausted: self.is_exhausted(),
        })
    }
}

/// Releases the in-flight flag if a fetch future is dropped mid-request.
struct InFlightGuard<'a, T> {
    state: &'a Mutex<CollectionState<T>>,
    ticket: FetchTicket,
    armed: bool,
}

impl<T> Drop for InFlightGuard<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            tracing::debug!(
                target: targets::COLLECTION,
                epoch = self.ticket.epoch(),
                "fetch cancelled before completion"
            );
            self.state.lock().abandon_fetch(&self.ticket);
        }
    }
}
