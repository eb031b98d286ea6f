//! Page window over a filtered sequence.

use std::num::NonZeroUsize;

/// Page size used by every list screen unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: NonZeroUsize = match NonZeroUsize::new(10) {
    Some(size) => size,
    None => unreachable!(),
};

/// One page of a filtered collection plus the metadata needed to render it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a, T> {
    /// Records on this page; empty when `number` is out of range.
    pub items: &'a [T],
    /// Requested 1-based page number, unchanged.
    pub number: usize,
    pub page_size: usize,
    /// `max(1, ceil(total_items / page_size))`
    pub total_pages: usize,
    pub total_items: usize,
}

impl<T> Page<'_, T> {
    /// 1-based index of the first item on the page, 0 when the page is empty.
    pub fn first_index(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            (self.number - 1) * self.page_size + 1
        }
    }

    /// 1-based index of the last item on the page, 0 when the page is empty.
    pub fn last_index(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            self.first_index() + self.items.len() - 1
        }
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1 && self.number <= self.total_pages
    }

    pub fn has_next(&self) -> bool {
        self.number >= 1 && self.number < self.total_pages
    }
}

/// `max(1, ceil(total_items / page_size))`
pub fn total_pages(total_items: usize, page_size: NonZeroUsize) -> usize {
    total_items.div_ceil(page_size.get()).max(1)
}

/// Whether a pagination control should be drawn at all.
pub fn should_render(total_pages: usize) -> bool {
    total_pages > 1
}

/// Slice `items` to the 1-based page `number`.
///
/// Page 0 and pages past the end yield an empty slice instead of failing.
pub fn paginate<T>(items: &[T], number: usize, page_size: NonZeroUsize) -> Page<'_, T> {
    let size = page_size.get();
    let slice = number
        .checked_sub(1)
        .and_then(|index| index.checked_mul(size))
        .filter(|start| *start < items.len())
        .map(|start| {
            let end = start.saturating_add(size).min(items.len());
            &items[start..end]
        })
        .unwrap_or(&[]);

    Page {
        items: slice,
        number,
        page_size: size,
        total_pages: total_pages(items.len(), page_size),
        total_items: items.len(),
    }
}
