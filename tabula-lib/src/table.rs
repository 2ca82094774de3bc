//! The table engine.
//!
//! [`DataTable`] owns the state of one table instance: the rows it shows,
//! the internal page and page size, and the managed-fetch lifecycle. It is
//! cheap to clone (`Arc` internally); clones share the same state, which
//! lets a fetch future outlive the call that started it.
//!
//! State changes happen in short critical sections that never span an
//! await or a caller callback. Each fetch is stamped with a generation so
//! that a response arriving after a newer request was issued is dropped.
//!
//! # Example
//!
//! ```
//! use tabula_lib::prelude::*;
//!
//! # async fn demo() {
//! let table = DataTable::builder()
//!     .columns(vec![Column::accessor("n", "N", |n: &u32| *n)])
//!     .row_key(|n: &u32, _| RowId::from(*n))
//!     .fetch(FetchConfig::new(fetcher_fn(|params| async move {
//!         let first = (params.page - 1) * params.page_size;
//!         Ok(FetchResult::new((first..first + params.page_size).collect(), 95))
//!     })))
//!     .build()
//!     .unwrap();
//!
//! table.mount().await;
//! assert_eq!(table.render().rows().len(), 10);
//!
//! table.change_page(10);
//! table.sync().await;
//! assert_eq!(table.data(), (90..100).collect::<Vec<_>>());
//! # }
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use log::{debug, trace, warn};
use serde_json::Map;
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::column::Column;
use crate::error::ConfigError;
use crate::error::FetchError;
use crate::fetch::FetchConfig;
use crate::fetch::FetchDeps;
use crate::fetch::FetchParams;
use crate::fetch::FetchResult;
use crate::fetch::Fetcher;
use crate::fetch::RefreshKey;
use crate::footer::FooterModel;
use crate::pagination::{PageWindow, PaginationConfig, PaginationMode, resolve_mode, slice_page};
use crate::render::{Body, RenderInput, RenderedTable, RowKeyFn, render_table, row_keys};
use crate::selection::RowId;
use crate::selection::SelectionConfig;
use crate::settings::TableSettings;
use crate::status::{InternalStatus, StatusFlags, TableStatus, resolve_status};

/// Unique identifier for a table instance, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableId(usize);

impl TableId {
    fn new() -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        Self(COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

impl std::fmt::Display for TableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "__table_{}", self.0)
    }
}

/// Callback notified after each successful managed fetch.
pub type DataChangeFn<T> = Arc<dyn Fn(&[T], u64) + Send + Sync>;

/// Caller-supplied retry action.
pub type RetryFn = Arc<dyn Fn() + Send + Sync>;

/// Where rows come from.
enum Source<T> {
    /// Rows supplied by the caller.
    Rows(Vec<T>),
    /// Rows fetched by the table.
    Managed(FetchConfig<T>),
}

/// State owned and mutated by the engine.
struct EngineState<T> {
    data: Vec<T>,
    total: u64,
    loading: bool,
    error: Option<FetchError>,
    page: u32,
    page_size: u32,
    /// Generation of the most recently issued request.
    generation: u64,
    first_load_done: bool,
    mounted: bool,
    last_issued: Option<FetchDeps>,
    last_params: Option<FetchParams>,
}

impl<T> EngineState<T> {
    /// Orphan any in-flight request and forget fetched rows and history.
    fn reset_fetch(&mut self) {
        self.generation += 1;
        self.data = Vec::new();
        self.total = 0;
        self.loading = false;
        self.error = None;
        self.first_load_done = false;
        self.last_issued = None;
        self.last_params = None;
    }
}

/// Owned copy of what rendering reads, so row keys and cell renderers run
/// without the lock held.
struct RenderSnapshot<T> {
    columns: Vec<Column<T>>,
    rows: Vec<T>,
    row_key: RowKeyFn<T>,
    selection: Option<SelectionConfig>,
    status: TableStatus,
    footer: Option<FooterModel>,
    settings: TableSettings,
}

struct TableInner<T> {
    columns: Vec<Column<T>>,
    source: Source<T>,
    pagination: PaginationConfig,
    selection: Option<SelectionConfig>,
    row_key: RowKeyFn<T>,
    flags: StatusFlags,
    on_retry: Option<RetryFn>,
    on_data_change: Option<DataChangeFn<T>>,
    settings: TableSettings,
    state: EngineState<T>,
}

impl<T> TableInner<T> {
    fn is_managed(&self) -> bool {
        matches!(self.source, Source::Managed(_))
    }

    fn mode(&self) -> PaginationMode {
        resolve_mode(self.is_managed(), &self.pagination)
    }

    /// All rows held by the table: supplied rows, or the last fetched page.
    fn rows(&self) -> &[T] {
        match &self.source {
            Source::Rows(rows) => rows,
            Source::Managed(_) => &self.state.data,
        }
    }

    fn window(&self, mode: PaginationMode) -> PageWindow {
        let state = &self.state;
        match (mode, &self.source) {
            (PaginationMode::Off, _) => {
                let len = self.rows().len();
                PageWindow::new(1, u32::try_from(len).unwrap_or(u32::MAX).max(1), len as u64)
            }
            (PaginationMode::ServerDelegated, Source::Managed(_)) => {
                PageWindow::new(state.page, state.page_size, state.total)
            }
            (PaginationMode::ServerDelegated, Source::Rows(rows)) => PageWindow::new(
                self.pagination.configured_page().unwrap_or(1),
                self.pagination
                    .configured_page_size()
                    .unwrap_or(self.settings.default_page_size),
                self.pagination.configured_total().unwrap_or(rows.len() as u64),
            ),
            (PaginationMode::ClientSlice, _) => {
                PageWindow::new(state.page, state.page_size, self.rows().len() as u64)
            }
        }
    }

    fn visible_rows(&self, mode: PaginationMode, window: &PageWindow) -> &[T] {
        match mode {
            PaginationMode::ClientSlice => slice_page(self.rows(), window),
            PaginationMode::Off | PaginationMode::ServerDelegated => self.rows(),
        }
    }

    fn status(&self, display_rows: usize) -> TableStatus {
        let first_load_done = match &self.source {
            Source::Managed(_) => self.state.first_load_done,
            Source::Rows(rows) => !rows.is_empty(),
        };
        let internal = InternalStatus {
            loading: self.state.loading,
            first_load_done,
            error: self.state.error.as_ref().map(FetchError::kind),
        };
        resolve_status(&self.flags, &internal, display_rows)
    }

    fn current_deps(&self) -> Option<FetchDeps> {
        match &self.source {
            Source::Managed(config) => Some(FetchDeps {
                page: self.state.page,
                page_size: self.state.page_size,
                extra: config.extra_params.clone(),
                refresh_key: config.refresh_key,
            }),
            Source::Rows(_) => None,
        }
    }

    fn fetch_pending(&self) -> bool {
        match &self.source {
            Source::Managed(config) if config.auto_fetch && self.state.mounted => {
                self.state.last_issued != self.current_deps()
            }
            _ => false,
        }
    }
}

/// Where a page or page-size change was routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageChange {
    /// Internal state was updated. In managed mode a refetch is now pending.
    Internal,
    /// The caller's handler was invoked.
    Delegated,
    /// Nothing happened (page 0, pagination off, or no handler).
    Ignored,
}

/// A fetch about to be issued.
struct PendingFetch<T> {
    fetcher: Arc<dyn Fetcher<T>>,
    params: FetchParams,
    generation: u64,
}

/// Generic table engine. See the module documentation for an overview.
pub struct DataTable<T> {
    id: TableId,
    inner: Arc<RwLock<TableInner<T>>>,
    /// Set whenever the render output may have changed.
    dirty: Arc<AtomicBool>,
}

impl<T> Clone for DataTable<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            inner: Arc::clone(&self.inner),
            dirty: Arc::clone(&self.dirty),
        }
    }
}

impl<T> std::fmt::Debug for DataTable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataTable").field("id", &self.id).finish_non_exhaustive()
    }
}

impl<T> DataTable<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a new builder.
    pub fn builder() -> DataTableBuilder<T, Missing> {
        DataTableBuilder::new()
    }

    /// Get the unique ID.
    pub fn id(&self) -> TableId {
        self.id
    }

    /// Returns and clears the dirty flag.
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::SeqCst)
    }

    fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::SeqCst);
    }

    // -------------------------------------------------------------------------
    // Resolution
    // -------------------------------------------------------------------------

    /// Whether the table fetches its own rows.
    pub fn is_managed(&self) -> bool {
        self.inner.read().map(|g| g.is_managed()).unwrap_or(false)
    }

    /// Resolve the pagination mode from the current configuration.
    pub fn mode(&self) -> PaginationMode {
        self.inner
            .read()
            .map(|g| g.mode())
            .unwrap_or(PaginationMode::Off)
    }

    /// Resolve the effective page window.
    pub fn window(&self) -> PageWindow {
        self.inner
            .read()
            .map(|g| g.window(g.mode()))
            .unwrap_or(PageWindow::new(1, 1, 0))
    }

    /// Rows visible in the current window.
    pub fn visible_rows(&self) -> Vec<T> {
        self.inner
            .read()
            .map(|g| {
                let mode = g.mode();
                let window = g.window(mode);
                g.visible_rows(mode, &window).to_vec()
            })
            .unwrap_or_default()
    }

    /// Identities of the visible rows.
    pub fn visible_keys(&self) -> Vec<RowId> {
        let Ok((rows, row_key)) = self.inner.read().map(|g| {
            let mode = g.mode();
            let window = g.window(mode);
            (g.visible_rows(mode, &window).to_vec(), Arc::clone(&g.row_key))
        }) else {
            return Vec::new();
        };
        row_keys(&rows, &row_key)
    }

    /// Resolve the view status.
    pub fn status(&self) -> TableStatus {
        self.inner
            .read()
            .map(|g| {
                let mode = g.mode();
                let window = g.window(mode);
                g.status(g.visible_rows(mode, &window).len())
            })
            .unwrap_or(TableStatus::Empty)
    }

    /// Render the table.
    pub fn render(&self) -> RenderedTable {
        let Some(snapshot) = self.render_snapshot() else {
            return RenderedTable {
                status: TableStatus::Empty,
                header: Vec::new(),
                body: Body::Empty {
                    message: String::new(),
                    colspan: 0,
                },
                footer: None,
            };
        };
        render_table(RenderInput {
            columns: &snapshot.columns,
            rows: &snapshot.rows,
            row_key: &snapshot.row_key,
            selection: snapshot.selection.as_ref(),
            status: snapshot.status,
            footer: snapshot.footer,
            settings: &snapshot.settings,
        })
    }

    fn render_snapshot(&self) -> Option<RenderSnapshot<T>> {
        let guard = self.inner.read().ok()?;
        let mode = guard.mode();
        let window = guard.window(mode);
        let rows = guard.visible_rows(mode, &window);
        let status = guard.status(rows.len());
        trace!("{}: render mode={:?} window={:?} status={:?}", self.id, mode, window, status);

        let footer = mode
            .is_paginated()
            .then(|| FooterModel::new(&window, &guard.settings.page_size_options));

        Some(RenderSnapshot {
            columns: guard.columns.clone(),
            rows: rows.to_vec(),
            row_key: Arc::clone(&guard.row_key),
            selection: guard.selection.clone(),
            status,
            footer,
            settings: guard.settings.clone(),
        })
    }

    // -------------------------------------------------------------------------
    // Engine state
    // -------------------------------------------------------------------------

    /// Rows held by the table (supplied rows, or the last fetched page).
    pub fn data(&self) -> Vec<T> {
        self.inner
            .read()
            .map(|g| g.rows().to_vec())
            .unwrap_or_default()
    }

    /// Total from the last successful fetch.
    pub fn total(&self) -> u64 {
        self.inner.read().map(|g| g.state.total).unwrap_or(0)
    }

    /// Internal page.
    pub fn page(&self) -> u32 {
        self.inner.read().map(|g| g.state.page).unwrap_or(1)
    }

    /// Internal page size.
    pub fn page_size(&self) -> u32 {
        self.inner.read().map(|g| g.state.page_size).unwrap_or(1)
    }

    /// Whether a managed fetch is in flight.
    pub fn is_loading(&self) -> bool {
        self.inner.read().map(|g| g.state.loading).unwrap_or(false)
    }

    /// The stored fetch error.
    pub fn error(&self) -> Option<FetchError> {
        self.inner.read().ok().and_then(|g| g.state.error.clone())
    }

    /// Whether the first managed fetch has settled.
    pub fn is_first_load_done(&self) -> bool {
        self.inner
            .read()
            .map(|g| g.state.first_load_done)
            .unwrap_or(false)
    }

    /// Parameters of the most recently issued request.
    pub fn last_params(&self) -> Option<FetchParams> {
        self.inner.read().ok().and_then(|g| g.state.last_params.clone())
    }

    // -------------------------------------------------------------------------
    // Caller configuration
    // -------------------------------------------------------------------------

    /// Replace the supplied rows. Switches the table to supplied-rows mode.
    ///
    /// A fetch still in flight is orphaned and its response dropped.
    pub fn set_rows(&self, rows: Vec<T>) {
        if let Ok(mut guard) = self.inner.write() {
            guard.source = Source::Rows(rows);
            guard.state.reset_fetch();
            self.mark_dirty();
        }
    }

    /// Replace the fetch configuration. Switches the table to managed mode.
    ///
    /// Previously fetched rows are discarded and a fetch still in flight is
    /// orphaned. The next sync fetches with the new configuration.
    pub fn set_fetch(&self, config: FetchConfig<T>) {
        if let Ok(mut guard) = self.inner.write() {
            guard.source = Source::Managed(config);
            guard.state.reset_fetch();
            self.mark_dirty();
        }
    }

    /// Replace the columns.
    pub fn set_columns(&self, columns: Vec<Column<T>>) {
        if let Ok(mut guard) = self.inner.write() {
            guard.columns = columns;
            self.mark_dirty();
        }
    }

    /// Replace the pagination configuration.
    pub fn set_pagination(&self, pagination: PaginationConfig) -> Result<(), ConfigError> {
        pagination.validate()?;
        if let Ok(mut guard) = self.inner.write() {
            guard.pagination = pagination;
            self.mark_dirty();
        }
        Ok(())
    }

    /// Replace or remove the selection configuration.
    pub fn set_selection(&self, selection: Option<SelectionConfig>) {
        if let Ok(mut guard) = self.inner.write() {
            guard.selection = selection;
            self.mark_dirty();
        }
    }

    /// Replace the caller's loading and error flags.
    pub fn set_status_flags(&self, flags: StatusFlags) {
        if let Ok(mut guard) = self.inner.write() {
            guard.flags = flags;
            self.mark_dirty();
        }
    }

    /// Replace the extra fetch parameters.
    ///
    /// Compared by value: setting equal parameters does not trigger a
    /// refetch. Returns whether a refetch is pending.
    pub fn set_extra_params(&self, params: Map<String, Value>) -> bool {
        let Ok(mut guard) = self.inner.write() else {
            return false;
        };
        if let Source::Managed(config) = &mut guard.source {
            config.extra_params = params;
        }
        guard.fetch_pending()
    }

    /// Replace the refresh key. Returns whether a refetch is pending.
    pub fn set_refresh_key(&self, key: RefreshKey) -> bool {
        let Ok(mut guard) = self.inner.write() else {
            return false;
        };
        if let Source::Managed(config) = &mut guard.source {
            config.refresh_key = Some(key);
        }
        guard.fetch_pending()
    }

    /// Bump the refresh key, forcing a refetch on the next sync.
    pub fn refresh(&self) -> bool {
        let Ok(mut guard) = self.inner.write() else {
            return false;
        };
        if let Source::Managed(config) = &mut guard.source {
            config.refresh_key = Some(config.refresh_key.unwrap_or_default().bump());
        }
        guard.fetch_pending()
    }

    /// Turn automatic fetching on or off.
    pub fn set_auto_fetch(&self, auto_fetch: bool) {
        if let Ok(mut guard) = self.inner.write()
            && let Source::Managed(config) = &mut guard.source
        {
            config.auto_fetch = auto_fetch;
        }
    }

    // -------------------------------------------------------------------------
    // Pagination events
    // -------------------------------------------------------------------------

    /// Handle a page change from the footer.
    ///
    /// Updates internal state in managed and client-slice modes, or calls
    /// the caller's `on_page_change` for server-delegated supplied rows.
    /// Never both.
    pub fn change_page(&self, page: u32) -> PageChange {
        if page == 0 {
            return PageChange::Ignored;
        }
        let handler = {
            let Ok(mut guard) = self.inner.write() else {
                return PageChange::Ignored;
            };
            match (guard.mode(), guard.is_managed()) {
                (PaginationMode::Off, _) => return PageChange::Ignored,
                (PaginationMode::ServerDelegated, false) => guard.pagination.page_change_handler(),
                _ => {
                    debug!("{}: page {} -> {}", self.id, guard.state.page, page);
                    guard.state.page = page;
                    self.mark_dirty();
                    return PageChange::Internal;
                }
            }
        };

        match handler {
            Some(handler) => {
                handler(page);
                PageChange::Delegated
            }
            None => PageChange::Ignored,
        }
    }

    /// Handle a page size change from the footer. Always returns to page 1.
    ///
    /// For server-delegated supplied rows the caller's
    /// `on_page_size_change` is called, followed by `on_page_change(1)` when
    /// the caller is not already on page 1.
    pub fn change_page_size(&self, page_size: u32) -> PageChange {
        if page_size == 0 {
            return PageChange::Ignored;
        }
        let (size_handler, page_handler) = {
            let Ok(mut guard) = self.inner.write() else {
                return PageChange::Ignored;
            };
            match (guard.mode(), guard.is_managed()) {
                (PaginationMode::Off, _) => return PageChange::Ignored,
                (PaginationMode::ServerDelegated, false) => {
                    let page_handler = guard
                        .pagination
                        .page_change_handler()
                        .filter(|_| guard.pagination.configured_page().unwrap_or(1) != 1);
                    (guard.pagination.page_size_change_handler(), page_handler)
                }
                _ => {
                    debug!("{}: page size {} -> {}", self.id, guard.state.page_size, page_size);
                    guard.state.page_size = page_size;
                    guard.state.page = 1;
                    self.mark_dirty();
                    return PageChange::Internal;
                }
            }
        };

        let mut outcome = PageChange::Ignored;
        if let Some(handler) = size_handler {
            handler(page_size);
            outcome = PageChange::Delegated;
        }
        if let Some(handler) = page_handler {
            handler(1);
            outcome = PageChange::Delegated;
        }
        outcome
    }

    // -------------------------------------------------------------------------
    // Selection events
    // -------------------------------------------------------------------------

    /// Relay a row toggle to the caller. Returns `false` without selection.
    pub fn toggle_row(&self, id: RowId) -> bool {
        let handler = self
            .inner
            .read()
            .ok()
            .and_then(|g| g.selection.as_ref().map(SelectionConfig::toggle_handler));
        match handler {
            Some(handler) => {
                handler(id);
                true
            }
            None => false,
        }
    }

    /// Relay a select-all click to the caller. Returns `false` without selection.
    pub fn toggle_all(&self) -> bool {
        let handler = self
            .inner
            .read()
            .ok()
            .and_then(|g| g.selection.as_ref().map(SelectionConfig::select_all_handler));
        match handler {
            Some(handler) => {
                handler();
                true
            }
            None => false,
        }
    }

    // -------------------------------------------------------------------------
    // Fetch lifecycle
    // -------------------------------------------------------------------------

    /// Whether a dependency changed since the last issued request.
    pub fn needs_fetch(&self) -> bool {
        self.inner.read().map(|g| g.fetch_pending()).unwrap_or(false)
    }

    /// Issue a fetch with the current parameters.
    ///
    /// Loading state, the generation stamp and the request parameters are
    /// set when this is called, not when the future is first polled. The
    /// returned future applies the response; a newer request or an unmount
    /// makes it a no-op. Does nothing outside managed mode.
    pub fn run(&self) -> impl Future<Output = ()> + Send + use<T> {
        self.start(false)
    }

    /// Fetch if a dependency changed since the last issued request.
    pub fn sync(&self) -> impl Future<Output = ()> + Send + use<T> {
        self.start(true)
    }

    /// Perform the initial fetch, if automatic fetching is on.
    pub fn mount(&self) -> impl Future<Output = ()> + Send + use<T> {
        debug!("{}: mount", self.id);
        self.start(true)
    }

    /// Spawn [`sync`](Self::sync) on the current tokio runtime.
    pub fn spawn_sync(&self) -> JoinHandle<()> {
        tokio::spawn(self.start(true))
    }

    /// Stop applying fetch results. Late responses are dropped.
    pub fn unmount(&self) {
        if let Ok(mut guard) = self.inner.write() {
            debug!("{}: unmount", self.id);
            guard.state.mounted = false;
        }
    }

    /// Retry after an error.
    ///
    /// Calls the caller's retry handler if one was given, otherwise
    /// re-issues the fetch with the current parameters.
    pub async fn retry(&self) {
        let handler = self.inner.read().ok().and_then(|g| g.on_retry.clone());
        match handler {
            Some(handler) => handler(),
            None => self.run().await,
        }
    }

    fn start(&self, only_if_pending: bool) -> impl Future<Output = ()> + Send + use<T> {
        let pending = self.begin_fetch(only_if_pending);
        let table = self.clone();
        async move {
            let Some(pending) = pending else { return };
            let result = pending.fetcher.fetch(pending.params).await;
            table.finish_fetch(pending.generation, result);
        }
    }

    fn begin_fetch(&self, only_if_pending: bool) -> Option<PendingFetch<T>> {
        let mut guard = self.inner.write().ok()?;
        if !guard.state.mounted || (only_if_pending && !guard.fetch_pending()) {
            return None;
        }
        let deps = guard.current_deps()?;
        let Source::Managed(config) = &guard.source else {
            return None;
        };
        let fetcher = Arc::clone(&config.fetcher);

        let params = FetchParams {
            page: deps.page,
            page_size: deps.page_size,
            extra: deps.extra.clone(),
        };
        let state = &mut guard.state;
        state.generation += 1;
        state.loading = true;
        state.error = None;
        state.last_issued = Some(deps);
        state.last_params = Some(params.clone());
        debug!(
            "{}: fetch #{} page={} page_size={}",
            self.id, state.generation, params.page, params.page_size
        );
        let generation = state.generation;
        drop(guard);
        self.mark_dirty();

        Some(PendingFetch {
            fetcher,
            params,
            generation,
        })
    }

    fn finish_fetch(&self, generation: u64, result: Result<FetchResult<T>, FetchError>) {
        let notify = {
            let Ok(mut guard) = self.inner.write() else {
                return;
            };
            if !guard.state.mounted {
                debug!("{}: dropping fetch #{} after unmount", self.id, generation);
                return;
            }
            if generation != guard.state.generation {
                warn!(
                    "{}: discarding stale fetch #{} (latest is #{})",
                    self.id, generation, guard.state.generation
                );
                return;
            }

            guard.state.loading = false;
            guard.state.first_load_done = true;
            match result {
                Ok(FetchResult { data, total }) => {
                    debug!("{}: fetch #{} returned {} rows of {}", self.id, generation, data.len(), total);
                    guard.state.data = data;
                    guard.state.total = total;
                    guard
                        .on_data_change
                        .clone()
                        .map(|handler| (handler, guard.state.data.clone(), total))
                }
                Err(err) => {
                    warn!("{}: fetch #{} failed ({}): {}", self.id, generation, err.kind(), err);
                    guard.state.error = Some(err);
                    None
                }
            }
        };
        self.mark_dirty();

        if let Some((handler, data, total)) = notify {
            handler(&data, total);
        }
    }
}

// =============================================================================
// Typestate Builder
// =============================================================================

/// Marker type for missing required builder fields.
pub struct Missing;

/// Marker type for set builder fields.
pub struct Set<T>(T);

/// Builder for [`DataTable`].
///
/// The row-key function is required and enforced at compile time.
///
/// # Example
///
/// ```
/// use tabula_lib::prelude::*;
///
/// let table = DataTable::builder()
///     .columns(vec![Column::accessor("name", "Name", |s: &String| s.clone())])
///     .row_key(|s: &String, _| RowId::from(s.as_str()))
///     .rows(vec!["a".to_string(), "b".to_string()])
///     .pagination(PaginationConfig::new().page_size(1))
///     .build()
///     .unwrap();
/// assert_eq!(table.visible_rows(), vec!["a".to_string()]);
/// ```
pub struct DataTableBuilder<T, Key> {
    row_key: Key,
    columns: Vec<Column<T>>,
    source: Source<T>,
    pagination: PaginationConfig,
    selection: Option<SelectionConfig>,
    flags: StatusFlags,
    on_retry: Option<RetryFn>,
    on_data_change: Option<DataChangeFn<T>>,
    settings: TableSettings,
}

impl<T> DataTableBuilder<T, Missing> {
    /// Creates a new builder with no rows and default settings.
    pub fn new() -> Self {
        Self {
            row_key: Missing,
            columns: Vec::new(),
            source: Source::Rows(Vec::new()),
            pagination: PaginationConfig::default(),
            selection: None,
            flags: StatusFlags::default(),
            on_retry: None,
            on_data_change: None,
            settings: TableSettings::default(),
        }
    }

    /// Sets the row-key function.
    ///
    /// Keys must be stable for the same logical record across refetches.
    /// The index argument is the row's position in the visible window.
    pub fn row_key<F>(self, row_key: F) -> DataTableBuilder<T, Set<RowKeyFn<T>>>
    where
        F: Fn(&T, usize) -> RowId + Send + Sync + 'static,
    {
        DataTableBuilder {
            row_key: Set(Arc::new(row_key) as RowKeyFn<T>),
            columns: self.columns,
            source: self.source,
            pagination: self.pagination,
            selection: self.selection,
            flags: self.flags,
            on_retry: self.on_retry,
            on_data_change: self.on_data_change,
            settings: self.settings,
        }
    }
}

impl<T> Default for DataTableBuilder<T, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, K> DataTableBuilder<T, K> {
    /// Sets the columns.
    pub fn columns(mut self, columns: Vec<Column<T>>) -> Self {
        self.columns = columns;
        self
    }

    /// Supplies the rows up front.
    pub fn rows(mut self, rows: Vec<T>) -> Self {
        self.source = Source::Rows(rows);
        self
    }

    /// Lets the table fetch its own rows.
    pub fn fetch(mut self, config: FetchConfig<T>) -> Self {
        self.source = Source::Managed(config);
        self
    }

    /// Sets the pagination configuration.
    pub fn pagination(mut self, pagination: PaginationConfig) -> Self {
        self.pagination = pagination;
        self
    }

    /// Enables row selection.
    pub fn selection(mut self, selection: SelectionConfig) -> Self {
        self.selection = Some(selection);
        self
    }

    /// Sets the caller's loading and error flags.
    pub fn status_flags(mut self, flags: StatusFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Sets a caller retry action, replacing the default refetch.
    pub fn on_retry<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(f));
        self
    }

    /// Sets the data-change observer for managed fetches.
    pub fn on_data_change<F>(mut self, f: F) -> Self
    where
        F: Fn(&[T], u64) + Send + Sync + 'static,
    {
        self.on_data_change = Some(Arc::new(f));
        self
    }

    /// Sets engine defaults and labels.
    pub fn settings(mut self, settings: TableSettings) -> Self {
        self.settings = settings;
        self
    }
}

impl<T> DataTableBuilder<T, Set<RowKeyFn<T>>> {
    /// Builds the [`DataTable`].
    ///
    /// Fails if the pagination or settings break the 1-indexed invariants.
    pub fn build(self) -> Result<DataTable<T>, ConfigError> {
        self.pagination.validate()?;
        self.settings.validate()?;

        let page_size = self
            .pagination
            .configured_page_size()
            .unwrap_or(self.settings.default_page_size);
        let id = TableId::new();
        debug!("{}: created (page_size={})", id, page_size);

        Ok(DataTable {
            id,
            inner: Arc::new(RwLock::new(TableInner {
                columns: self.columns,
                source: self.source,
                pagination: self.pagination,
                selection: self.selection,
                row_key: self.row_key.0,
                flags: self.flags,
                on_retry: self.on_retry,
                on_data_change: self.on_data_change,
                settings: self.settings,
                state: EngineState {
                    data: Vec::new(),
                    total: 0,
                    loading: false,
                    error: None,
                    page: 1,
                    page_size,
                    generation: 0,
                    first_load_done: false,
                    mounted: true,
                    last_issued: None,
                    last_params: None,
                },
            })),
            dirty: Arc::new(AtomicBool::new(true)),
        })
    }
}
