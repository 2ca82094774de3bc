//! Pagination mode resolution and page windows.
//!
//! [`resolve_mode`] decides, from the configuration shape alone, who owns
//! the page boundary:
//!
//! 1. A managed fetch always paginates at the source ([`PaginationMode::ServerDelegated`]).
//! 2. Disabled pagination shows everything ([`PaginationMode::Off`]).
//! 3. An explicit [`ModeHint`] is honored literally.
//! 4. A page-change callback means the caller refetches externally.
//! 5. Otherwise the table slices in memory ([`PaginationMode::ClientSlice`]).
//!
//! The result is recomputed on every render and passed around as a value.

use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigError;

/// Page size used when the caller supplies none.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Who decides which rows belong to the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaginationMode {
    /// No pagination: every row is shown.
    Off,
    /// Rows are fully loaded and sliced in memory.
    ClientSlice,
    /// Rows already are the current page; the source owns the boundary.
    ServerDelegated,
}

impl PaginationMode {
    /// Whether a footer is shown in this mode.
    pub fn is_paginated(&self) -> bool {
        !matches!(self, Self::Off)
    }
}

/// Explicit pagination hint supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeHint {
    Client,
    Server,
}

/// Callback receiving a page number or page size.
pub type PageFn = Arc<dyn Fn(u32) + Send + Sync>;

/// Caller pagination configuration.
#[derive(Clone)]
pub struct PaginationConfig {
    enabled: bool,
    page_size: Option<u32>,
    current_page: Option<u32>,
    total_items: Option<u64>,
    on_page_change: Option<PageFn>,
    on_page_size_change: Option<PageFn>,
    mode: Option<ModeHint>,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            page_size: None,
            current_page: None,
            total_items: None,
            on_page_change: None,
            on_page_size_change: None,
            mode: None,
        }
    }
}

impl PaginationConfig {
    /// Enabled pagination with no hints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pagination switched off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Set the page size (default for internal state, or the current
    /// size for server-delegated external data).
    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Set the current page for server-delegated external data.
    pub fn current_page(mut self, page: u32) -> Self {
        self.current_page = Some(page);
        self
    }

    /// Set the total item count for server-delegated external data.
    pub fn total_items(mut self, total: u64) -> Self {
        self.total_items = Some(total);
        self
    }

    /// Set the page-change callback.
    pub fn on_page_change<F>(mut self, f: F) -> Self
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        self.on_page_change = Some(Arc::new(f));
        self
    }

    /// Set the page-size-change callback.
    pub fn on_page_size_change<F>(mut self, f: F) -> Self
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        self.on_page_size_change = Some(Arc::new(f));
        self
    }

    /// Force a pagination mode.
    pub fn mode(mut self, mode: ModeHint) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Whether pagination is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The explicit mode hint, if any.
    pub fn mode_hint(&self) -> Option<ModeHint> {
        self.mode
    }

    /// Whether a page-change callback is present.
    pub fn has_page_change_handler(&self) -> bool {
        self.on_page_change.is_some()
    }

    /// The configured page size, if any.
    pub fn configured_page_size(&self) -> Option<u32> {
        self.page_size
    }

    /// The configured current page, if any.
    pub fn configured_page(&self) -> Option<u32> {
        self.current_page
    }

    /// The configured total, if any.
    pub fn configured_total(&self) -> Option<u64> {
        self.total_items
    }

    pub(crate) fn page_change_handler(&self) -> Option<PageFn> {
        self.on_page_change.clone()
    }

    pub(crate) fn page_size_change_handler(&self) -> Option<PageFn> {
        self.on_page_size_change.clone()
    }

    /// Check the 1-indexed invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == Some(0) {
            return Err(ConfigError::ZeroPageSize);
        }
        if self.current_page == Some(0) {
            return Err(ConfigError::ZeroPage);
        }
        Ok(())
    }
}

impl std::fmt::Debug for PaginationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginationConfig")
            .field("enabled", &self.enabled)
            .field("page_size", &self.page_size)
            .field("current_page", &self.current_page)
            .field("total_items", &self.total_items)
            .field("on_page_change", &self.on_page_change.is_some())
            .field("on_page_size_change", &self.on_page_size_change.is_some())
            .field("mode", &self.mode)
            .finish()
    }
}

/// Resolve the pagination mode. Pure: depends only on its arguments.
pub fn resolve_mode(is_managed_fetch: bool, config: &PaginationConfig) -> PaginationMode {
    if is_managed_fetch {
        return PaginationMode::ServerDelegated;
    }
    if !config.enabled {
        return PaginationMode::Off;
    }
    match config.mode {
        Some(ModeHint::Client) => PaginationMode::ClientSlice,
        Some(ModeHint::Server) => PaginationMode::ServerDelegated,
        None if config.on_page_change.is_some() => PaginationMode::ServerDelegated,
        None => PaginationMode::ClientSlice,
    }
}

/// The effective page, page size and total for one render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageWindow {
    /// Current page, 1-indexed.
    pub page: u32,
    /// Rows per page.
    pub page_size: u32,
    /// Total rows across all pages.
    pub total: u64,
}

impl PageWindow {
    /// Create a window.
    pub fn new(page: u32, page_size: u32, total: u64) -> Self {
        Self {
            page,
            page_size,
            total,
        }
    }

    /// Number of pages, `ceil(total / page_size)`.
    pub fn total_pages(&self) -> u32 {
        total_pages(self.total, self.page_size)
    }

    /// Offset of the first row of the current page.
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize).saturating_mul(self.page_size as usize)
    }

    /// 1-indexed inclusive range of rows on this page, or `None` when the
    /// page is past the end.
    pub fn item_range(&self) -> Option<(u64, u64)> {
        let start = self.offset() as u64;
        if start >= self.total {
            return None;
        }
        let end = (start + u64::from(self.page_size)).min(self.total);
        Some((start + 1, end))
    }
}

/// Number of pages needed for `total` rows.
pub fn total_pages(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = total.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Rows of `data` on the page described by `window`.
///
/// `data[(p-1)*s .. (p-1)*s + s]`, clamped; empty past the end.
pub fn slice_page<'a, T>(data: &'a [T], window: &PageWindow) -> &'a [T] {
    let start = window.offset().min(data.len());
    let end = start.saturating_add(window.page_size as usize).min(data.len());
    &data[start..end]
}
