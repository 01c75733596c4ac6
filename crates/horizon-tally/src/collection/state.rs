//! Accumulated state of a paged collection.
//!
//! [`CollectionState`] is the pure state machine behind
//! [`PagedCollection`](super::PagedCollection). It never performs I/O: a fetch
//! is split into [`begin_fetch`](CollectionState::begin_fetch), which hands out
//! a [`FetchTicket`] describing the request to make, and
//! [`complete_fetch`](CollectionState::complete_fetch), which applies the
//! response. The split keeps at most one request in flight and lets stale
//! responses be recognized by their epoch.
//!
//! ```text
//!            begin_fetch              complete_fetch(Ok)
//!   Idle ───────────────> Loading ─────────────────────> Idle
//!     │                  LoadingMore                      │
//!     │                      │   complete_fetch(Err)      │
//!     │                      └──────────────────> Error ──┘ (retry: begin_fetch)
//!     └── set_filter_query / invalidate: items cleared, status Loading, epoch + 1
//! ```

use chrono::{DateTime, Utc};
use horizon_tally_core::{FetchError, FetchResult, Identified, Page, SortError};
use indexmap::IndexMap;

use super::view::{derive_view, DerivedView, LocalFilter, SortSpec};

/// Fetch status of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchStatus {
    /// No request in flight.
    #[default]
    Idle,
    /// The first page of a fresh query is being fetched (or is about to be,
    /// right after a reset).
    Loading,
    /// A follow-up page is being fetched.
    LoadingMore,
    /// The last fetch failed; see [`CollectionState::last_error`].
    Error,
}

impl FetchStatus {
    /// Returns true for `Loading` and `LoadingMore`.
    pub fn is_loading(self) -> bool {
        matches!(self, Self::Loading | Self::LoadingMore)
    }
}

/// Position of the collection in the remote sequence.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum CursorState {
    /// Nothing fetched yet for the current query.
    #[default]
    Start,
    /// More pages follow; the next request uses this token.
    Next(String),
    /// The source reported the last page.
    End,
}

/// Why a fetch request did not reach the page source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSkipped {
    /// Another fetch for this collection is still in flight.
    InFlight,
    /// The source has no more pages for the current query.
    Exhausted,
}

/// Result of a `begin_fetch` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStart {
    /// The caller must now request the described page.
    Ready(FetchTicket),
    /// Nothing to fetch; the state is unchanged.
    Skipped(FetchSkipped),
}

/// A single in-flight page request.
///
/// Produced by [`CollectionState::begin_fetch`] and consumed by
/// [`CollectionState::complete_fetch`] or
/// [`CollectionState::abandon_fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    epoch: u64,
    cursor: Option<String>,
    query: String,
    status: FetchStatus,
    previous_status: FetchStatus,
}

impl FetchTicket {
    /// The epoch the request was issued in.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Cursor to pass to the source; `None` requests the first page.
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// Filter query to pass to the source.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// `Loading` for a first page, `LoadingMore` otherwise.
    pub fn status(&self) -> FetchStatus {
        self.status
    }
}

/// What a completed or skipped fetch did to the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A page was merged.
    Merged {
        /// Ids seen for the first time.
        inserted: usize,
        /// Ids that replaced an existing item in place.
        updated: usize,
        /// True if the merged page was the last one.
        exhausted: bool,
    },
    /// Ignored because another fetch is in flight.
    InFlight,
    /// Ignored because the collection is exhausted.
    Exhausted,
    /// The response arrived after a reset and was dropped.
    Stale,
}

impl From<FetchSkipped> for FetchOutcome {
    fn from(skipped: FetchSkipped) -> Self {
        match skipped {
            FetchSkipped::InFlight => Self::InFlight,
            FetchSkipped::Exhausted => Self::Exhausted,
        }
    }
}

/// Counts produced by merging a batch of items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeStats {
    /// Ids seen for the first time.
    pub inserted: usize,
    /// Ids that replaced an existing item in place.
    pub updated: usize,
}

/// Items fetched so far for one query, plus paging bookkeeping.
///
/// Items are keyed by id and kept in first-seen order; re-fetching an id
/// overwrites the item in place.
#[derive(Debug, Clone)]
pub struct CollectionState<T> {
    items: IndexMap<String, T>,
    cursor: CursorState,
    status: FetchStatus,
    last_error: Option<FetchError>,
    filter_query: String,
    epoch: u64,
    in_flight: bool,
    last_updated: Option<DateTime<Utc>>,
}

impl<T> Default for CollectionState<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CollectionState<T> {
    /// Creates an empty, idle state with an empty filter query.
    pub fn new() -> Self {
        Self::with_query("")
    }

    /// Creates an empty, idle state for the given filter query.
    pub fn with_query(query: impl Into<String>) -> Self {
        Self {
            items: IndexMap::new(),
            cursor: CursorState::Start,
            status: FetchStatus::Idle,
            last_error: None,
            filter_query: query.into(),
            epoch: 0,
            in_flight: false,
            last_updated: None,
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Items in first-seen order.
    pub fn items(&self) -> impl ExactSizeIterator<Item = &T> + '_ {
        self.items.values()
    }

    /// Item ids in first-seen order.
    pub fn ids(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.items.keys().map(String::as_str)
    }

    /// Looks up an item by id.
    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.get(id)
    }

    /// Returns true if an item with this id has been fetched.
    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// Number of distinct items fetched so far.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if no items have been fetched.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Cursor for the next request.
    ///
    /// `None` both before the first fetch and after the last page; use
    /// [`is_exhausted`](Self::is_exhausted) to tell the two apart.
    pub fn cursor(&self) -> Option<&str> {
        match &self.cursor {
            CursorState::Next(token) => Some(token),
            CursorState::Start | CursorState::End => None,
        }
    }

    /// Returns true once the source has reported the last page.
    pub fn is_exhausted(&self) -> bool {
        self.cursor == CursorState::End
    }

    /// Returns true while another fetch could yield items.
    pub fn has_more(&self) -> bool {
        !self.is_exhausted()
    }

    /// Current fetch status.
    pub fn status(&self) -> FetchStatus {
        self.status
    }

    /// Returns true while a request is outstanding.
    pub fn is_fetching(&self) -> bool {
        self.in_flight
    }

    /// Error of the last failed fetch, cleared by the next success or reset.
    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    /// The filter query passed to the source.
    pub fn filter_query(&self) -> &str {
        &self.filter_query
    }

    /// Reset counter; responses issued under an older epoch are dropped.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Time of the last successful merge.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// Derives a filtered, sorted view over the accumulated items.
    ///
    /// See [`derive_view`].
    pub fn derive_view<'a>(
        &'a self,
        sort: Option<&SortSpec<T>>,
        filter: Option<&LocalFilter<T>>,
    ) -> Result<DerivedView<'a, T>, SortError> {
        derive_view(self.items.values(), sort, filter)
    }

    // =========================================================================
    // Fetch state machine
    // =========================================================================

    /// Starts a fetch if none is in flight and more pages exist.
    ///
    /// On `Ready`, the status becomes `Loading` when nothing has been
    /// accumulated yet and `LoadingMore` otherwise. A retry after an error
    /// resumes from the unchanged cursor.
    pub fn begin_fetch(&mut self) -> FetchStart {
        if self.in_flight {
            return FetchStart::Skipped(FetchSkipped::InFlight);
        }
        if self.is_exhausted() {
            return FetchStart::Skipped(FetchSkipped::Exhausted);
        }

        let status = if self.items.is_empty() {
            FetchStatus::Loading
        } else {
            FetchStatus::LoadingMore
        };
        let previous_status = std::mem::replace(&mut self.status, status);
        self.in_flight = true;

        FetchStart::Ready(FetchTicket {
            epoch: self.epoch,
            cursor: self.cursor().map(str::to_owned),
            query: self.filter_query.clone(),
            status,
            previous_status,
        })
    }

    /// Applies the response for `ticket`.
    ///
    /// A response from an older epoch is dropped (`Ok(Stale)`), whether it
    /// succeeded or failed. On success the page is merged and the cursor
    /// advanced. On failure the status becomes `Error`, the error is
    /// recorded, and items and cursor are left untouched.
    pub fn complete_fetch(
        &mut self,
        ticket: &FetchTicket,
        result: FetchResult<Page<T>>,
    ) -> FetchResult<FetchOutcome>
    where
        T: Identified,
    {
        if ticket.epoch != self.epoch {
            return Ok(FetchOutcome::Stale);
        }
        self.in_flight = false;

        match result {
            Ok(page) => {
                let exhausted = page.next_cursor.is_none();
                let stats = self.merge(page.items);
                self.cursor = match page.next_cursor {
                    Some(token) => CursorState::Next(token),
                    None => CursorState::End,
                };
                self.status = FetchStatus::Idle;
                self.last_error = None;
                self.last_updated = Some(Utc::now());
                Ok(FetchOutcome::Merged {
                    inserted: stats.inserted,
                    updated: stats.updated,
                    exhausted,
                })
            }
            Err(err) => {
                self.status = FetchStatus::Error;
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Releases a ticket whose request was cancelled before completing.
    ///
    /// Restores the status the collection had before `begin_fetch`. Does
    /// nothing for tickets from an older epoch.
    pub fn abandon_fetch(&mut self, ticket: &FetchTicket) {
        if ticket.epoch == self.epoch && self.in_flight {
            self.in_flight = false;
            self.status = ticket.previous_status;
        }
    }

    /// Merges items by id: existing ids are overwritten in place, new ids
    /// are appended in the order given.
    pub fn merge(&mut self, items: impl IntoIterator<Item = T>) -> MergeStats
    where
        T: Identified,
    {
        let mut stats = MergeStats::default();
        for item in items {
            let id = item.id().to_owned();
            if self.items.insert(id, item).is_some() {
                stats.updated += 1;
            } else {
                stats.inserted += 1;
            }
        }
        stats
    }

    // =========================================================================
    // Resets
    // =========================================================================

    /// Switches to a new filter query.
    ///
    /// Returns false (and changes nothing) if `query` equals the current
    /// query. Otherwise clears the items, rewinds the cursor to the start,
    /// sets the status to `Loading` and bumps the epoch. The caller is
    /// expected to follow up with a fetch.
    pub fn set_filter_query(&mut self, query: &str) -> bool {
        if query == self.filter_query {
            return false;
        }
        self.filter_query = query.to_owned();
        self.reset();
        true
    }

    /// Discards everything fetched for the current query and starts over.
    pub fn invalidate(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        self.items.clear();
        self.cursor = CursorState::Start;
        self.status = FetchStatus::Loading;
        self.last_error = None;
        self.in_flight = false;
        self.last_updated = None;
        self.epoch += 1;
    }

    // =========================================================================
    // Local edits
    // =========================================================================

    /// Removes an item, keeping the order of the rest.
    pub fn remove(&mut self, id: &str) -> Option<T> {
        self.items.shift_remove(id)
    }

    /// Edits an item in place. Returns false if the id is unknown.
    pub fn update(&mut self, id: &str, f: impl FnOnce(&mut T)) -> bool {
        match self.items.get_mut(id) {
            Some(item) => {
                f(item);
                true
            }
            None => false,
        }
    }

    /// Overwrites the item with the same id in place, or appends it.
    ///
    /// Returns true if the item was new.
    pub fn upsert(&mut self, item: T) -> bool
    where
        T: Identified,
    {
        self.merge(std::iter::once(item)).inserted == 1
    }

    /// Copies the current state into an immutable snapshot.
    pub fn snapshot(&self) -> CollectionSnapshot<T>
    where
        T: Clone,
    {
        CollectionSnapshot {
            items: self.items.values().cloned().collect(),
            cursor: self.cursor().map(str::to_owned),
            exhausted: self.is_exhausted(),
            status: self.status,
            last_error: self.last_error.clone(),
            filter_query: self.filter_query.clone(),
            epoch: self.epoch,
            last_updated: self.last_updated,
        }
    }
}

/// An owned, read-only copy of a collection's state.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSnapshot<T> {
    /// Items in first-seen order.
    pub items: Vec<T>,
    /// Cursor for the next request.
    pub cursor: Option<String>,
    /// True once the last page has been merged.
    pub exhausted: bool,
    /// Fetch status at the time of the snapshot.
    pub status: FetchStatus,
    /// Error of the last failed fetch.
    pub last_error: Option<FetchError>,
    /// Filter query in effect.
    pub filter_query: String,
    /// Epoch at the time of the snapshot.
    pub epoch: u64,
    /// Time of the last successful merge.
    pub last_updated: Option<DateTime<Utc>>,
}

impl<T> CollectionSnapshot<T> {
    /// Derives a filtered, sorted view over the snapshot's items.
    pub fn derive_view<'a>(
        &'a self,
        sort: Option<&SortSpec<T>>,
        filter: Option<&LocalFilter<T>>,
    ) -> Result<DerivedView<'a, T>, SortError> {
        derive_view(&self.items, sort, filter)
    }

    /// Item ids in first-seen order.
    pub fn ids(&self) -> Vec<&str>
    where
        T: Identified,
    {
        self.items.iter().map(Identified::id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: String,
        value: u32,
    }

    fn row(id: &str, value: u32) -> Row {
        Row {
            id: id.into(),
            value,
        }
    }

    impl Identified for Row {
        fn id(&self) -> &str {
            &self.id
        }
    }

    fn ready(state: &mut CollectionState<Row>) -> FetchTicket {
        match state.begin_fetch() {
            FetchStart::Ready(ticket) => ticket,
            FetchStart::Skipped(reason) => panic!("fetch skipped: {:?}", reason),
        }
    }

    #[test]
    fn test_initial_state() {
        let state = CollectionState::<Row>::new();
        assert!(state.is_empty());
        assert_eq!(state.cursor(), None);
        assert_eq!(state.status(), FetchStatus::Idle);
        assert!(state.has_more());
        assert!(state.last_error().is_none());
    }

    #[test]
    fn test_merge_overwrites_in_place() {
        let mut state = CollectionState::new();
        state.merge(vec![row("a", 1), row("b", 1)]);
        let stats = state.merge(vec![row("b", 2), row("c", 2)]);

        assert_eq!(stats, MergeStats { inserted: 1, updated: 1 });
        assert_eq!(state.ids().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(state.get("a").unwrap().value, 1);
        assert_eq!(state.get("b").unwrap().value, 2);
    }

    #[test]
    fn test_duplicate_ids_within_one_page() {
        let mut state = CollectionState::new();
        let stats = state.merge(vec![row("a", 1), row("a", 2)]);
        assert_eq!(stats.inserted, 1);
        assert_eq!(stats.updated, 1);
        assert_eq!(state.len(), 1);
        assert_eq!(state.get("a").unwrap().value, 2);
    }

    #[test]
    fn test_begin_fetch_statuses() {
        let mut state = CollectionState::new();
        let ticket = ready(&mut state);
        assert_eq!(ticket.status(), FetchStatus::Loading);
        assert_eq!(ticket.cursor(), None);
        assert_eq!(state.status(), FetchStatus::Loading);

        state
            .complete_fetch(&ticket, Ok(Page::new(vec![row("a", 1)], "c1")))
            .unwrap();
        assert_eq!(state.status(), FetchStatus::Idle);

        let ticket = ready(&mut state);
        assert_eq!(ticket.status(), FetchStatus::LoadingMore);
        assert_eq!(ticket.cursor(), Some("c1"));
    }

    #[test]
    fn test_second_begin_is_skipped_while_in_flight() {
        let mut state = CollectionState::<Row>::new();
        let _ticket = ready(&mut state);
        assert_eq!(
            state.begin_fetch(),
            FetchStart::Skipped(FetchSkipped::InFlight)
        );
    }

    #[test]
    fn test_exhaustion_is_stable() {
        let mut state = CollectionState::new();
        let ticket = ready(&mut state);
        let outcome = state
            .complete_fetch(&ticket, Ok(Page::last(vec![row("a", 1)])))
            .unwrap();
        assert_eq!(
            outcome,
            FetchOutcome::Merged {
                inserted: 1,
                updated: 0,
                exhausted: true
            }
        );
        assert!(state.is_exhausted());
        assert_eq!(state.cursor(), None);

        for _ in 0..3 {
            assert_eq!(
                state.begin_fetch(),
                FetchStart::Skipped(FetchSkipped::Exhausted)
            );
        }
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_empty_page_with_cursor_keeps_paging() {
        let mut state = CollectionState::<Row>::new();
        let ticket = ready(&mut state);
        state
            .complete_fetch(&ticket, Ok(Page::new(Vec::new(), "c1")))
            .unwrap();
        assert!(state.has_more());

        let ticket = ready(&mut state);
        // Still nothing accumulated, so this is a first-page load.
        assert_eq!(ticket.status(), FetchStatus::Loading);
        assert_eq!(ticket.cursor(), Some("c1"));
    }

    #[test]
    fn test_failure_keeps_items_and_cursor() {
        let mut state = CollectionState::new();
        let ticket = ready(&mut state);
        state
            .complete_fetch(&ticket, Ok(Page::new(vec![row("a", 1)], "c1")))
            .unwrap();

        let ticket = ready(&mut state);
        let err = state
            .complete_fetch(&ticket, Err(FetchError::network("offline")))
            .unwrap_err();
        assert_eq!(err, FetchError::network("offline"));
        assert_eq!(state.status(), FetchStatus::Error);
        assert_eq!(state.last_error(), Some(&err));
        assert_eq!(state.len(), 1);
        assert_eq!(state.cursor(), Some("c1"));

        // Retry resumes from the same cursor and clears the error on success.
        let retry = ready(&mut state);
        assert_eq!(retry.cursor(), Some("c1"));
        state
            .complete_fetch(&retry, Ok(Page::last(vec![row("b", 1)])))
            .unwrap();
        assert_eq!(state.status(), FetchStatus::Idle);
        assert!(state.last_error().is_none());
    }

    #[test]
    fn test_filter_reset() {
        let mut state = CollectionState::new();
        let ticket = ready(&mut state);
        state
            .complete_fetch(&ticket, Ok(Page::new(vec![row("a", 1)], "c1")))
            .unwrap();

        assert!(state.set_filter_query("x"));
        assert!(state.set_filter_query("y"));
        assert!(state.is_empty());
        assert_eq!(state.cursor(), None);
        assert!(!state.is_exhausted());
        assert_eq!(state.status(), FetchStatus::Loading);
        assert_eq!(state.filter_query(), "y");

        // Same query again is a no-op.
        let epoch = state.epoch();
        assert!(!state.set_filter_query("y"));
        assert_eq!(state.epoch(), epoch);

        // The reset state can fetch right away, as a first-page load.
        let ticket = ready(&mut state);
        assert_eq!(ticket.status(), FetchStatus::Loading);
        assert_eq!(ticket.query(), "y");
    }

    #[test]
    fn test_stale_response_is_dropped() {
        let mut state = CollectionState::new();
        let old = ready(&mut state);
        state.set_filter_query("new");
        let fresh = ready(&mut state);

        let outcome = state
            .complete_fetch(&old, Ok(Page::last(vec![row("stale", 1)])))
            .unwrap();
        assert_eq!(outcome, FetchOutcome::Stale);
        assert!(state.is_empty());
        assert!(state.is_fetching());

        // Stale failures are dropped too.
        let outcome = state
            .complete_fetch(&old, Err(FetchError::server("late")))
            .unwrap();
        assert_eq!(outcome, FetchOutcome::Stale);
        assert!(state.last_error().is_none());

        state
            .complete_fetch(&fresh, Ok(Page::last(vec![row("fresh", 1)])))
            .unwrap();
        assert_eq!(state.ids().collect::<Vec<_>>(), vec!["fresh"]);
    }

    #[test]
    fn test_abandon_restores_status() {
        let mut state = CollectionState::<Row>::new();
        let ticket = ready(&mut state);
        state.abandon_fetch(&ticket);
        assert_eq!(state.status(), FetchStatus::Idle);
        assert!(!state.is_fetching());
        assert!(matches!(state.begin_fetch(), FetchStart::Ready(_)));
    }

    #[test]
    fn test_local_edits() {
        let mut state = CollectionState::new();
        state.merge(vec![row("a", 1), row("b", 2), row("c", 3)]);

        assert_eq!(state.remove("b"), Some(row("b", 2)));
        assert_eq!(state.ids().collect::<Vec<_>>(), vec!["a", "c"]);

        assert!(state.update("a", |r| r.value = 10));
        assert!(!state.update("missing", |r| r.value = 0));
        assert_eq!(state.get("a").unwrap().value, 10);

        assert!(!state.upsert(row("c", 30)));
        assert!(state.upsert(row("d", 4)));
        assert_eq!(state.ids().collect::<Vec<_>>(), vec!["a", "c", "d"]);
    }

    #[test]
    fn test_snapshot() {
        let mut state = CollectionState::with_query("cats");
        let ticket = ready(&mut state);
        state
            .complete_fetch(&ticket, Ok(Page::new(vec![row("a", 1)], "c1")))
            .unwrap();

        let snapshot = state.snapshot();
        assert_eq!(snapshot.ids(), vec!["a"]);
        assert_eq!(snapshot.cursor.as_deref(), Some("c1"));
        assert_eq!(snapshot.filter_query, "cats");
        assert!(!snapshot.exhausted);
        assert!(snapshot.last_updated.is_some());
    }
}
