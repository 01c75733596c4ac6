//! Local sorting and filtering over accumulated items.
//!
//! A [`DerivedView`] is recomputed on demand from a collection's items and
//! never mutates them. Filtering runs first, then a stable multi-key sort:
//! items whose keys compare equal keep their first-seen order.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use horizon_tally_core::{Identified, SortError};

/// Type alias for a partial comparator.
///
/// Returns `None` when the two items cannot be ordered.
pub type CompareFn<T> = Arc<dyn Fn(&T, &T) -> Option<Ordering> + Send + Sync>;

/// Type alias for a filter predicate.
///
/// Returns `true` if the item should be included.
pub type PredicateFn<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Direction of a sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// Returns the opposite direction.
    pub fn reversed(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// One column of a sort specification.
pub struct SortKey<T> {
    id: String,
    direction: SortDirection,
    compare: CompareFn<T>,
}

impl<T> Clone for SortKey<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            direction: self.direction,
            compare: Arc::clone(&self.compare),
        }
    }
}

impl<T> fmt::Debug for SortKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortKey")
            .field("id", &self.id)
            .field("direction", &self.direction)
            .finish_non_exhaustive()
    }
}

impl<T> SortKey<T> {
    /// Creates an ascending key from a partial comparator.
    pub fn new<F>(id: impl Into<String>, compare: F) -> Self
    where
        F: Fn(&T, &T) -> Option<Ordering> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            direction: SortDirection::Ascending,
            compare: Arc::new(compare),
        }
    }

    /// Sorts by a `PartialOrd` value, such as a float confidence.
    ///
    /// Values that do not compare (NaN) make the view fail with
    /// [`SortError::InvalidSortSpec`].
    pub fn by<K, F>(id: impl Into<String>, key: F) -> Self
    where
        K: PartialOrd,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self::new(id, move |a, b| key(a).partial_cmp(&key(b)))
    }

    /// Sorts by an `Ord` value. Always a total order.
    pub fn by_ord<K, F>(id: impl Into<String>, key: F) -> Self
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self::new(id, move |a, b| Some(key(a).cmp(&key(b))))
    }

    /// Sets the direction.
    pub fn with_direction(mut self, direction: SortDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Shorthand for `with_direction(SortDirection::Descending)`.
    pub fn descending(self) -> Self {
        self.with_direction(SortDirection::Descending)
    }

    /// The key's column id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The key's direction.
    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    fn compare(&self, a: &T, b: &T) -> Option<Ordering> {
        let ordering = (self.compare)(a, b)?;
        Some(match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        })
    }
}

/// An ordered list of sort keys; the first key is primary.
pub struct SortSpec<T> {
    keys: Vec<SortKey<T>>,
}

impl<T> Clone for SortSpec<T> {
    fn clone(&self) -> Self {
        Self {
            keys: self.keys.clone(),
        }
    }
}

impl<T> fmt::Debug for SortSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.keys).finish()
    }
}

impl<T> Default for SortSpec<T> {
    fn default() -> Self {
        Self { keys: Vec::new() }
    }
}

impl<T> From<SortKey<T>> for SortSpec<T> {
    fn from(key: SortKey<T>) -> Self {
        Self { keys: vec![key] }
    }
}

impl<T> SortSpec<T> {
    /// Creates an empty spec. An empty spec keeps first-seen order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a lower-priority key.
    pub fn then(mut self, key: SortKey<T>) -> Self {
        self.keys.push(key);
        self
    }

    /// The keys, primary first.
    pub fn keys(&self) -> &[SortKey<T>] {
        &self.keys
    }

    /// Returns true if the spec has no keys.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Compares two items key by key. `Err` names the first key that could
    /// not order them.
    fn compare<'k>(&'k self, a: &T, b: &T) -> Result<Ordering, &'k str> {
        for key in &self.keys {
            match key.compare(a, b) {
                Some(Ordering::Equal) => continue,
                Some(ordering) => return Ok(ordering),
                None => return Err(&key.id),
            }
        }
        Ok(Ordering::Equal)
    }

    fn validate(&self, items: &[&T]) -> Result<(), SortError> {
        for key in &self.keys {
            if items.iter().any(|item| key.compare(item, item).is_none()) {
                return Err(SortError::InvalidSortSpec {
                    key: key.id.clone(),
                });
            }
        }
        Ok(())
    }
}

/// A predicate applied to items before sorting.
pub struct LocalFilter<T> {
    predicate: PredicateFn<T>,
}

impl<T> Clone for LocalFilter<T> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<T> fmt::Debug for LocalFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalFilter").finish_non_exhaustive()
    }
}

impl<T> LocalFilter<T> {
    /// Returns true if the item passes the filter.
    pub fn matches(&self, item: &T) -> bool {
        (self.predicate)(item)
    }
}

impl<T: 'static> LocalFilter<T> {
    /// Wraps a predicate.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    /// Case-insensitive substring match on a text column.
    ///
    /// An empty needle matches every item.
    pub fn contains<F, S>(text: F, needle: &str) -> Self
    where
        F: Fn(&T) -> S + Send + Sync + 'static,
        S: AsRef<str>,
    {
        let needle = needle.to_lowercase();
        Self::new(move |item| {
            needle.is_empty() || text(item).as_ref().to_lowercase().contains(&needle)
        })
    }

    /// Keeps items accepted by both filters.
    pub fn and(self, other: LocalFilter<T>) -> Self {
        Self::new(move |item| self.matches(item) && other.matches(item))
    }
}

/// A filtered, sorted, read-only projection over accumulated items.
///
/// The view borrows the items it was derived from and can be iterated any
/// number of times.
#[derive(Debug)]
pub struct DerivedView<'a, T> {
    rows: Vec<&'a T>,
}

impl<T> Clone for DerivedView<'_, T> {
    fn clone(&self) -> Self {
        Self {
            rows: self.rows.clone(),
        }
    }
}

impl<'a, T> DerivedView<'a, T> {
    /// Iterates the visible items in view order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &'a T> + '_ {
        self.rows.iter().copied()
    }

    /// Number of visible items.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if no item passed the filter.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The item at a view position.
    pub fn get(&self, index: usize) -> Option<&'a T> {
        self.rows.get(index).copied()
    }

    /// Ids of the visible items in view order.
    pub fn ids(&self) -> Vec<&'a str>
    where
        T: Identified,
    {
        self.rows.iter().copied().map(T::id).collect()
    }

    /// Clones the visible items.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.rows.iter().map(|item| (*item).clone()).collect()
    }
}

impl<'s, 'a, T> IntoIterator for &'s DerivedView<'a, T> {
    type Item = &'a T;
    type IntoIter = std::iter::Copied<std::slice::Iter<'s, &'a T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter().copied()
    }
}

/// Applies `filter`, then `sort`, to `items`.
///
/// Without a sort the view keeps the input order. The sort is stable, so
/// ties keep the input order in both directions.
///
/// # Errors
///
/// Returns [`SortError::InvalidSortSpec`] if a sort key cannot order an
/// item against itself, or cannot order two items the sort compares. No
/// partial result is produced.
pub fn derive_view<'a, T: 'a>(
    items: impl IntoIterator<Item = &'a T>,
    sort: Option<&SortSpec<T>>,
    filter: Option<&LocalFilter<T>>,
) -> Result<DerivedView<'a, T>, SortError> {
    let mut rows: Vec<&'a T> = match filter {
        Some(filter) => items.into_iter().filter(|item| filter.matches(item)).collect(),
        None => items.into_iter().collect(),
    };

    if let Some(spec) = sort.filter(|spec| !spec.is_empty()) {
        spec.validate(&rows)?;

        merge_sort(&mut rows, spec).map_err(|key| SortError::InvalidSortSpec {
            key: key.to_owned(),
        })?;
    }

    Ok(DerivedView { rows })
}

/// Bottom-up stable merge sort that stops at the first pair `spec` cannot
/// order.
///
/// A right-hand row moves ahead only when it compares strictly less, so
/// equal rows keep their input order.
fn merge_sort<'a, 'k, T>(rows: &mut Vec<&'a T>, spec: &'k SortSpec<T>) -> Result<(), &'k str> {
    let len = rows.len();
    let mut merged: Vec<&'a T> = Vec::with_capacity(len);
    let mut width = 1;
    while width < len {
        merged.clear();
        for start in (0..len).step_by(2 * width) {
            let mid = (start + width).min(len);
            let end = (start + 2 * width).min(len);
            let (mut left, mut right) = (start, mid);
            while left < mid && right < end {
                if spec.compare(rows[right], rows[left])? == Ordering::Less {
                    merged.push(rows[right]);
                    right += 1;
                } else {
                    merged.push(rows[left]);
                    left += 1;
                }
            }
            merged.extend_from_slice(&rows[left..mid]);
            merged.extend_from_slice(&rows[right..end]);
        }
        std::mem::swap(rows, &mut merged);
        width *= 2;
    }
    Ok(())
}
