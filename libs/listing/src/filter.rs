//! Filter predicate.
//!
//! A record is kept when the lower-cased search text is empty or is a
//! substring of at least one of its lower-cased searchable fields, and every
//! categorical criterion admits it. Filtering never reorders records.

/// Records that take part in free-text search.
pub trait Searchable {
    /// Text fields consulted by the search box, in no particular order.
    /// Absent optional fields should be reported as `""`.
    fn search_fields(&self) -> Vec<&str>;
}

/// Categorical part of a filter state for records of type `R`.
pub trait Criteria<R: ?Sized> {
    fn admits(&self, record: &R) -> bool;
}

/// Criteria for record kinds without categorical filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoCriteria;

impl<R: ?Sized> Criteria<R> for NoCriteria {
    fn admits(&self, _record: &R) -> bool {
        true
    }
}

/// Search text plus categorical selections for one list screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState<C> {
    pub search: String,
    pub criteria: C,
}

impl<C> FilterState<C> {
    pub fn new(search: impl Into<String>, criteria: C) -> Self {
        Self {
            search: search.into(),
            criteria,
        }
    }

    fn needle(&self) -> String {
        self.search.to_lowercase()
    }
}

/// Free-text half of the predicate. `needle` must already be lower-cased.
pub fn matches_text<R: Searchable + ?Sized>(record: &R, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    record
        .search_fields()
        .into_iter()
        .any(|field| field.to_lowercase().contains(needle))
}

/// Full predicate: text match AND every categorical selection.
pub fn matches<R, C>(record: &R, state: &FilterState<C>) -> bool
where
    R: Searchable + ?Sized,
    C: Criteria<R>,
{
    matches_text(record, &state.needle()) && state.criteria.admits(record)
}

/// Apply the predicate to a collection, preserving source order.
pub fn filter<'a, R, C>(records: &'a [R], state: &FilterState<C>) -> Vec<&'a R>
where
    R: Searchable,
    C: Criteria<R>,
{
    let needle = state.needle();
    records
        .iter()
        .filter(|record| matches_text(*record, &needle) && state.criteria.admits(record))
        .collect()
}
