//! Filter and page state owned by one list screen.

use std::num::NonZeroUsize;

use crate::compact::{page_items, PageItem};
use crate::filter::{filter, Criteria, FilterState, Searchable};
use crate::paginate::{paginate, should_render, total_pages};

/// Everything a list screen draws for the current state.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage<'a, R> {
    pub rows: Vec<&'a R>,
    pub current_page: usize,
    pub total_pages: usize,
    /// Number of records left after filtering.
    pub total_items: usize,
    pub first_index: usize,
    pub last_index: usize,
    /// Empty when there is only one page.
    pub buttons: Vec<PageItem>,
}

/// Records of one kind plus the filter and page state applied to them.
///
/// The current page always stays within `[1, total_pages]`: changing the
/// filter resets it to 1, and changing the records or the page size clamps it.
#[derive(Debug, Clone)]
pub struct ListView<R, C> {
    records: Vec<R>,
    filter: FilterState<C>,
    current_page: usize,
    page_size: NonZeroUsize,
}

impl<R, C> ListView<R, C>
where
    R: Searchable,
    C: Criteria<R>,
{
    pub fn new(records: Vec<R>, filter: FilterState<C>, page_size: NonZeroUsize) -> Self {
        Self {
            records,
            filter,
            current_page: 1,
            page_size,
        }
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn filter_state(&self) -> &FilterState<C> {
        &self.filter
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> NonZeroUsize {
        self.page_size
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.filter.search = search.into();
        self.current_page = 1;
    }

    pub fn set_criteria(&mut self, criteria: C) {
        self.filter.criteria = criteria;
        self.current_page = 1;
    }

    pub fn set_filter(&mut self, filter: FilterState<C>) {
        self.filter = filter;
        self.current_page = 1;
    }

    pub fn set_page_size(&mut self, page_size: NonZeroUsize) {
        self.page_size = page_size;
        self.clamp();
    }

    /// Replace the records, e.g. after a reload following a restore.
    pub fn set_records(&mut self, records: Vec<R>) {
        self.records = records;
        self.clamp();
    }

    /// Move to `page`, clamped to the valid range. Returns the page selected.
    pub fn go_to(&mut self, page: usize) -> usize {
        self.current_page = page.clamp(1, self.total_pages());
        self.current_page
    }

    pub fn next_page(&mut self) -> usize {
        self.go_to(self.current_page.saturating_add(1))
    }

    pub fn previous_page(&mut self) -> usize {
        self.go_to(self.current_page.saturating_sub(1))
    }

    pub fn filtered(&self) -> Vec<&R> {
        filter(&self.records, &self.filter)
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.filtered().len(), self.page_size)
    }

    pub fn page(&self) -> ListPage<'_, R> {
        let filtered = self.filtered();
        let window = paginate(&filtered, self.current_page, self.page_size);
        let buttons = if should_render(window.total_pages) {
            page_items(self.current_page, window.total_pages)
        } else {
            Vec::new()
        };

        ListPage {
            rows: window.items.to_vec(),
            current_page: window.number,
            total_pages: window.total_pages,
            total_items: window.total_items,
            first_index: window.first_index(),
            last_index: window.last_index(),
            buttons,
        }
    }

    fn clamp(&mut self) {
        let total = self.total_pages();
        self.current_page = self.current_page.clamp(1, total);
    }
}
