//! List-view contract shared by every casedesk list screen.
//!
//! A list screen turns an in-memory collection into what the operator sees
//! in three linear stages:
//!
//! 1. [`filter`] keeps records matching the free-text search and the
//!    categorical selections, preserving source order.
//! 2. [`paginate`] slices the filtered sequence into a fixed-size page.
//! 3. [`page_items`] compacts the page range into a bounded list of page
//!    buttons with ellipsis gaps.
//!
//! [`ListView`] owns the filter and page state for one screen and keeps the
//! current page inside the valid range whenever either changes.
//!
//! # Example
//!
//! ```rust
//! use casedesk_listing::{page_items, paginate, PageItem};
//! use std::num::NonZeroUsize;
//!
//! let rows: Vec<u32> = (1..=23).collect();
//! let size = NonZeroUsize::new(10).unwrap();
//! let page = paginate(&rows, 3, size);
//! assert_eq!(page.items, &[21, 22, 23]);
//! assert_eq!(page.total_pages, 3);
//! assert_eq!(
//!     page_items(3, page.total_pages),
//!     vec![PageItem::Number(1), PageItem::Number(2), PageItem::Number(3)]
//! );
//! ```

#![forbid(unsafe_code)]

mod compact;
mod error;
mod filter;
mod paginate;
mod selection;
mod view;

pub use compact::{page_items, PageItem, COMPACT_THRESHOLD};
pub use error::{ParseSelectionError, Result};
pub use filter::{filter, matches, matches_text, Criteria, FilterState, NoCriteria, Searchable};
pub use paginate::{paginate, should_render, total_pages, Page, DEFAULT_PAGE_SIZE};
pub use selection::{Categorical, Selection};
pub use view::{ListPage, ListView};
