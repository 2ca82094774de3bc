//! Pagination footer model.

use serde::Serialize;

use crate::pagination::PageWindow;

/// Above this many pages, distant page buttons collapse into ellipses.
const MAX_UNCOLLAPSED_PAGES: u32 = 7;

/// Pages of context kept on each side of the current page.
const NEIGHBORS: u32 = 2;

/// One button in the page list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageItem {
    Page(u32),
    Ellipsis,
}

/// Page buttons for `current` out of `total_pages`.
///
/// All pages are listed up to seven; beyond that the first page, the last
/// page and the pages within two of `current` are kept, and each run of
/// omitted pages becomes a single ellipsis.
pub fn page_items(current: u32, total_pages: u32) -> Vec<PageItem> {
    if total_pages <= MAX_UNCOLLAPSED_PAGES {
        return (1..=total_pages).map(PageItem::Page).collect();
    }

    let mut items = Vec::new();
    let mut collapsed = false;
    for page in 1..=total_pages {
        let visible = page == 1 || page == total_pages || page.abs_diff(current) <= NEIGHBORS;
        if visible {
            items.push(PageItem::Page(page));
            collapsed = false;
        } else if !collapsed {
            items.push(PageItem::Ellipsis);
            collapsed = true;
        }
    }
    items
}

/// Everything a view needs to draw the pagination footer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FooterModel {
    /// Current page, 1-indexed.
    pub page: u32,
    /// Rows per page.
    pub page_size: u32,
    /// Total rows.
    pub total: u64,
    /// `ceil(total / page_size)`.
    pub total_pages: u32,
    /// Page buttons.
    pub items: Vec<PageItem>,
    /// Selectable page sizes.
    pub page_size_options: Vec<u32>,
    /// 1-indexed inclusive range shown on this page.
    pub range: Option<(u64, u64)>,
}

impl FooterModel {
    /// Build the footer for a resolved window.
    pub fn new(window: &PageWindow, page_size_options: &[u32]) -> Self {
        let total_pages = window.total_pages();
        let mut options = page_size_options.to_vec();
        if !options.contains(&window.page_size) {
            options.push(window.page_size);
            options.sort_unstable();
        }
        Self {
            page: window.page,
            page_size: window.page_size,
            total: window.total,
            total_pages,
            items: page_items(window.page, total_pages),
            page_size_options: options,
            range: window.item_range(),
        }
    }

    /// Whether a previous page exists.
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Whether a next page exists.
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Page numbers present as buttons.
    pub fn pages(&self) -> Vec<u32> {
        self.items
            .iter()
            .filter_map(|item| match item {
                PageItem::Page(page) => Some(*page),
                PageItem::Ellipsis => None,
            })
            .collect()
    }
}
