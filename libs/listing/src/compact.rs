//! Page-number compaction for pagination controls.

/// Page counts up to this value are shown in full.
pub const COMPACT_THRESHOLD: usize = 7;

/// One button in a pagination control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", content = "page", rename_all = "lowercase"))]
pub enum PageItem {
    /// Clickable page number.
    Number(usize),
    /// Gap marker; carries no page and is not clickable.
    Ellipsis,
}

impl PageItem {
    pub fn page(&self) -> Option<usize> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Ellipsis => None,
        }
    }
}

/// Bounded list of page buttons for `total_pages`, centred on `current_page`.
///
/// Up to [`COMPACT_THRESHOLD`] pages every number is listed. Beyond that the
/// first and last pages are always present, the neighbours of the current
/// page are listed, and gaps are marked with [`PageItem::Ellipsis`].
pub fn page_items(current_page: usize, total_pages: usize) -> Vec<PageItem> {
    if total_pages <= COMPACT_THRESHOLD {
        return (1..=total_pages).map(PageItem::Number).collect();
    }

    let mut items = Vec::with_capacity(COMPACT_THRESHOLD);
    items.push(PageItem::Number(1));

    if current_page > 3 {
        items.push(PageItem::Ellipsis);
    }

    let start = current_page.saturating_sub(1).max(2);
    let end = current_page.saturating_add(1).min(total_pages - 1);
    items.extend((start..=end).map(PageItem::Number));

    if current_page < total_pages - 2 {
        items.push(PageItem::Ellipsis);
    }

    items.push(PageItem::Number(total_pages));
    items
}
