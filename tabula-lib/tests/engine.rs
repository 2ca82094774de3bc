use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use serde_json::{Map, json};
use tokio::sync::oneshot;

use tabula_lib::prelude::*;

#[derive(Debug, Clone, PartialEq)]
struct Row {
    id: i64,
    name: String,
}

fn make_rows(ids: std::ops::Range<i64>) -> Vec<Row> {
    ids.map(|id| Row {
        id,
        name: format!("user-{}", id),
    })
    .collect()
}

fn columns() -> Vec<Column<Row>> {
    vec![
        Column::accessor("id", "ID", |r: &Row| r.id).align(Alignment::Right),
        Column::accessor("name", "Name", |r: &Row| r.name.clone()),
    ]
}

type Reply = Result<FetchResult<Row>, FetchError>;

/// Fetcher serving `total` synthetic rows, with per-page gates and
/// queued failures for steering individual calls.
#[derive(Clone)]
struct Controlled {
    total: u64,
    calls: Arc<Mutex<Vec<FetchParams>>>,
    gates: Arc<Mutex<HashMap<u32, oneshot::Receiver<Reply>>>>,
    failures: Arc<Mutex<VecDeque<FetchError>>>,
}

impl Controlled {
    fn new(total: u64) -> Self {
        Self {
            total,
            calls: Arc::default(),
            gates: Arc::default(),
            failures: Arc::default(),
        }
    }

    /// Hold the next request for `page` until the returned sender fires.
    fn hold(&self, page: u32) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(page, rx);
        tx
    }

    fn fail_next(&self, err: FetchError) {
        self.failures.lock().unwrap().push_back(err);
    }

    fn calls(&self) -> Vec<FetchParams> {
        self.calls.lock().unwrap().clone()
    }

    fn page(&self, page: u32, page_size: u32) -> FetchResult<Row> {
        let start = i64::from((page - 1) * page_size);
        let end = (start + i64::from(page_size)).min(self.total as i64);
        FetchResult::new(make_rows(start..end.max(start)), self.total)
    }
}

#[async_trait]
impl Fetcher<Row> for Controlled {
    async fn fetch(&self, params: FetchParams) -> Reply {
        self.calls.lock().unwrap().push(params.clone());
        if let Some(err) = self.failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        let gate = self.gates.lock().unwrap().remove(&params.page);
        match gate {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(FetchError::other("gate dropped"))),
            None => Ok(self.page(params.page, params.page_size)),
        }
    }
}

fn managed(fetcher: Controlled) -> DataTable<Row> {
    DataTable::builder()
        .columns(columns())
        .row_key(|r: &Row, _| RowId::from(r.id))
        .fetch(FetchConfig::new(fetcher))
        .build()
        .unwrap()
}

fn supplied(rows: Vec<Row>, pagination: PaginationConfig) -> DataTable<Row> {
    DataTable::builder()
        .columns(columns())
        .row_key(|r: &Row, _| RowId::from(r.id))
        .rows(rows)
        .pagination(pagination)
        .build()
        .unwrap()
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_managed_fetch_first_page() {
    let table = DataTable::builder()
        .columns(columns())
        .row_key(|r: &Row, _| RowId::from(r.id))
        .fetch(FetchConfig::new(fetcher_fn(|_params| async move {
            Ok(FetchResult::new(make_rows(0..5), 37))
        })))
        .build()
        .unwrap();

    table.mount().await;

    let rendered = table.render();
    assert_eq!(rendered.status, TableStatus::Populated);
    assert_eq!(rendered.rows().len(), 5);
    let footer = rendered.footer.unwrap();
    assert_eq!(footer.pages(), vec![1, 2, 3, 4]);
    assert_eq!(footer.total, 37);
    assert_eq!(table.last_params(), Some(FetchParams::new(1, 10)));
    assert_eq!(table.mode(), PaginationMode::ServerDelegated);
}

#[tokio::test]
async fn test_fetch_error_shows_panel_and_retry_reissues_request() {
    let fetcher = Controlled::new(5);
    let table = managed(fetcher.clone());
    table.mount().await;
    assert_eq!(table.render().rows().len(), 5);

    fetcher.fail_next(FetchError::network("connection refused"));
    assert!(table.refresh());
    table.sync().await;

    let rendered = table.render();
    assert_eq!(rendered.status, TableStatus::Error { kind: ErrorKind::Network });
    assert!(rendered.rows().is_empty());
    assert_eq!(rendered.error_panel().unwrap().title, "Network error");
    // Rows are kept in state, only hidden behind the panel.
    assert_eq!(table.data().len(), 5);

    table.retry().await;
    let calls = fetcher.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[2], calls[1]);
    assert_eq!(table.status(), TableStatus::Populated);
    assert!(table.error().is_none());
}

#[tokio::test]
async fn test_select_all_relays_once() {
    let select_all = Arc::new(AtomicUsize::new(0));
    let toggles = Arc::new(AtomicUsize::new(0));
    let selection = {
        let select_all = Arc::clone(&select_all);
        let toggles = Arc::clone(&toggles);
        SelectionConfig::new(
            move || {
                select_all.fetch_add(1, Ordering::SeqCst);
            },
            move |_| {
                toggles.fetch_add(1, Ordering::SeqCst);
            },
        )
        .selected_ids([1i64, 4, 7])
        .all_selected(false)
    };
    let table = DataTable::builder()
        .columns(columns())
        .row_key(|r: &Row, _| RowId::from(r.id))
        .rows(make_rows(0..10))
        .selection(selection)
        .build()
        .unwrap();

    assert!(table.toggle_all());
    assert_eq!(select_all.load(Ordering::SeqCst), 1);
    assert_eq!(toggles.load(Ordering::SeqCst), 0);

    let rendered = table.render();
    assert!(matches!(
        rendered.header[0],
        HeaderCell::SelectAll { state: SelectAllState::Indeterminate, .. }
    ));
    let selected: Vec<_> = rendered
        .rows()
        .iter()
        .filter(|r| r.selected == Some(true))
        .map(|r| r.key.clone())
        .collect();
    assert_eq!(selected, vec![RowId::from(1i64), RowId::from(4i64), RowId::from(7i64)]);

    assert!(table.toggle_row(RowId::from(2i64)));
    assert_eq!(toggles.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_out_of_order_responses_keep_latest_request() {
    let fetcher = Controlled::new(100);
    let release_first = fetcher.hold(1);
    let release_second = fetcher.hold(2);
    let notified = Arc::new(Mutex::new(Vec::new()));
    let table = {
        let notified = Arc::clone(&notified);
        DataTable::builder()
            .columns(columns())
            .row_key(|r: &Row, _| RowId::from(r.id))
            .fetch(FetchConfig::new(fetcher.clone()))
            .on_data_change(move |data: &[Row], _total| {
                notified.lock().unwrap().push(data[0].id);
            })
            .build()
            .unwrap()
    };

    let first = table.mount();
    assert_eq!(table.change_page(2), PageChange::Internal);
    let second = table.sync();

    let page_one = fetcher.page(1, 10);
    let page_two = fetcher.page(2, 10);
    tokio::join!(first, second, async move {
        release_second.send(Ok(page_two)).unwrap();
        tokio::task::yield_now().await;
        release_first.send(Ok(page_one)).unwrap();
    });

    assert_eq!(table.data(), make_rows(10..20));
    assert_eq!(table.page(), 2);
    assert!(!table.is_loading());
    assert_eq!(*notified.lock().unwrap(), vec![10]);
}

#[tokio::test]
async fn test_stale_failure_does_not_clear_loading() {
    let fetcher = Controlled::new(100);
    let release_first = fetcher.hold(1);
    let release_second = fetcher.hold(2);
    let table = managed(fetcher.clone());

    let first = table.mount();
    table.change_page(2);
    let second = table.sync();

    release_first
        .send(Err(FetchError::http(500, "old request")))
        .unwrap();
    first.await;
    assert!(table.is_loading());
    assert!(table.error().is_none());

    release_second.send(Ok(fetcher.page(2, 10))).unwrap();
    second.await;
    assert!(!table.is_loading());
    assert_eq!(table.status(), TableStatus::Populated);
}

#[tokio::test]
async fn test_unmount_drops_late_response() {
    let fetcher = Controlled::new(30);
    let release = fetcher.hold(1);
    let changes = Arc::new(AtomicUsize::new(0));
    let table = {
        let changes = Arc::clone(&changes);
        DataTable::builder()
            .columns(columns())
            .row_key(|r: &Row, _| RowId::from(r.id))
            .fetch(FetchConfig::new(fetcher.clone()))
            .on_data_change(move |_: &[Row], _| {
                changes.fetch_add(1, Ordering::SeqCst);
            })
            .build()
            .unwrap()
    };

    let pending = table.mount();
    table.unmount();
    release.send(Ok(fetcher.page(1, 10))).unwrap();
    pending.await;

    assert!(table.data().is_empty());
    assert_eq!(changes.load(Ordering::SeqCst), 0);

    // Nothing new is issued after unmount.
    table.run().await;
    assert_eq!(fetcher.calls().len(), 1);
}

#[tokio::test]
async fn test_switching_to_rows_drops_inflight_fetch() {
    let fetcher = Controlled::new(30);
    let release = fetcher.hold(1);
    let table = managed(fetcher.clone());

    let pending = table.mount();
    assert!(table.is_loading());

    table.set_rows(make_rows(100..103));
    assert!(!table.is_loading());
    assert_eq!(table.status(), TableStatus::Populated);

    release.send(Err(FetchError::http(500, "old source"))).unwrap();
    pending.await;

    assert!(table.error().is_none());
    assert_eq!(table.data(), make_rows(100..103));
    assert_eq!(table.status(), TableStatus::Populated);
    assert!(table.last_params().is_none());
}

#[tokio::test]
async fn test_replacing_fetcher_drops_inflight_fetch() {
    let old = Controlled::new(30);
    let release = old.hold(1);
    let table = managed(old.clone());
    let pending = table.mount();

    let replacement = Controlled::new(5);
    table.set_fetch(FetchConfig::new(replacement.clone()));
    assert!(!table.is_loading());
    assert!(!table.is_first_load_done());
    assert!(table.data().is_empty());
    assert!(table.needs_fetch());

    release.send(Ok(old.page(1, 10))).unwrap();
    pending.await;
    assert!(table.data().is_empty());

    table.sync().await;
    assert_eq!(table.data(), make_rows(0..5));
    assert_eq!(table.total(), 5);
    assert_eq!(replacement.calls().len(), 1);
}

// ============================================================================
// Fetch triggers
// ============================================================================

#[tokio::test]
async fn test_page_size_change_resets_page_managed() {
    let fetcher = Controlled::new(100);
    let table = managed(fetcher.clone());
    table.mount().await;

    table.change_page(3);
    assert!(table.needs_fetch());
    table.sync().await;
    assert_eq!(table.last_params().unwrap().page, 3);

    assert_eq!(table.change_page_size(20), PageChange::Internal);
    assert_eq!(table.page(), 1);
    table.sync().await;
    assert_eq!(table.last_params(), Some(FetchParams::new(1, 20)));
    assert_eq!(table.window(), PageWindow::new(1, 20, 100));
}

#[tokio::test]
async fn test_sync_without_changes_does_not_refetch() {
    let fetcher = Controlled::new(15);
    let table = managed(fetcher.clone());
    table.mount().await;
    table.sync().await;
    table.change_page(1);
    table.sync().await;
    assert_eq!(fetcher.calls().len(), 1);
}

#[tokio::test]
async fn test_extra_params_compared_by_value() {
    let fetcher = Controlled::new(50);
    let table = DataTable::builder()
        .columns(columns())
        .row_key(|r: &Row, _| RowId::from(r.id))
        .fetch(FetchConfig::new(fetcher.clone()).extra_param("status", "active"))
        .build()
        .unwrap();
    table.mount().await;

    let mut same = Map::new();
    same.insert("status".into(), json!("active"));
    assert!(!table.set_extra_params(same));

    let mut changed = Map::new();
    changed.insert("status".into(), json!("archived"));
    assert!(table.set_extra_params(changed));
    table.sync().await;

    let calls = fetcher.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].extra.get("status"), Some(&json!("archived")));
}

#[tokio::test]
async fn test_refresh_key_forces_refetch_of_same_page() {
    let fetcher = Controlled::new(50);
    let table = managed(fetcher.clone());
    table.mount().await;

    assert!(table.set_refresh_key(RefreshKey::new(7)));
    table.sync().await;
    assert!(!table.set_refresh_key(RefreshKey::new(7)));
    assert!(table.set_refresh_key(RefreshKey::new(8)));
    table.sync().await;

    let calls = fetcher.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls.iter().all(|c| *c == FetchParams::new(1, 10)));
}

#[tokio::test]
async fn test_manual_fetch_lifecycle() {
    let fetcher = Controlled::new(12);
    let table = DataTable::builder()
        .columns(columns())
        .row_key(|r: &Row, _| RowId::from(r.id))
        .fetch(FetchConfig::new(fetcher.clone()).auto_fetch(false))
        .build()
        .unwrap();

    table.mount().await;
    table.change_page(2);
    assert!(!table.needs_fetch());
    table.sync().await;
    assert!(fetcher.calls().is_empty());

    table.run().await;
    assert_eq!(fetcher.calls(), vec![FetchParams::new(2, 10)]);
    assert_eq!(table.data(), make_rows(10..12));
}

#[tokio::test]
async fn test_spawned_sync() {
    let fetcher = Controlled::new(3);
    let table = managed(fetcher.clone());
    table.spawn_sync().await.unwrap();
    assert_eq!(table.data().len(), 3);
    assert!(table.take_dirty());
    assert!(!table.take_dirty());
}

#[tokio::test]
async fn test_data_change_fires_on_success_only() {
    let fetcher = Controlled::new(25);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let table = {
        let seen = Arc::clone(&seen);
        DataTable::builder()
            .columns(columns())
            .row_key(|r: &Row, _| RowId::from(r.id))
            .fetch(FetchConfig::new(fetcher.clone()))
            .on_data_change(move |data: &[Row], total| {
                seen.lock().unwrap().push((data.len(), total));
            })
            .build()
            .unwrap()
    };

    table.mount().await;
    fetcher.fail_next(FetchError::business(500, "denied"));
    table.change_page(2);
    table.sync().await;
    assert_eq!(table.status(), TableStatus::Error { kind: ErrorKind::Api });

    table.change_page(3);
    table.sync().await;
    assert_eq!(*seen.lock().unwrap(), vec![(10, 25), (5, 25)]);
}

#[tokio::test]
async fn test_skeleton_only_on_first_load() {
    let fetcher = Controlled::new(40);
    let release_first = fetcher.hold(1);
    let release_second = fetcher.hold(2);
    let table = managed(fetcher.clone());

    let first = table.mount();
    assert_eq!(table.status(), TableStatus::Loading { initial: true });
    assert!(matches!(table.render().body, Body::Skeleton { rows: 5, colspan: 2, .. }));
    release_first.send(Ok(fetcher.page(1, 10))).unwrap();
    first.await;
    assert!(table.is_first_load_done());

    table.change_page(2);
    let second = table.sync();
    assert_eq!(table.status(), TableStatus::Loading { initial: false });
    assert!(matches!(table.render().body, Body::Refreshing { ref rows } if rows.len() == 10));
    release_second.send(Ok(fetcher.page(2, 10))).unwrap();
    second.await;
    assert_eq!(table.data(), make_rows(10..20));
}

// ============================================================================
// Supplied rows
// ============================================================================

#[test]
fn test_client_slice() {
    let table = supplied(make_rows(0..25), PaginationConfig::new());
    assert_eq!(table.mode(), PaginationMode::ClientSlice);
    assert_eq!(table.visible_rows(), make_rows(0..10));

    assert_eq!(table.change_page(3), PageChange::Internal);
    assert_eq!(table.visible_rows(), make_rows(20..25));
    assert_eq!(table.render().footer.unwrap().range, Some((21, 25)));

    assert_eq!(table.change_page_size(5), PageChange::Internal);
    assert_eq!(table.page(), 1);
    assert_eq!(table.visible_rows(), make_rows(0..5));
    assert_eq!(table.change_page(0), PageChange::Ignored);
}

#[test]
fn test_server_delegated_supplied_rows() {
    let pages = Arc::new(Mutex::new(Vec::new()));
    let sizes = Arc::new(Mutex::new(Vec::new()));
    let pagination = {
        let pages = Arc::clone(&pages);
        let sizes = Arc::clone(&sizes);
        PaginationConfig::new()
            .current_page(3)
            .page_size(10)
            .total_items(120)
            .on_page_change(move |p| pages.lock().unwrap().push(p))
            .on_page_size_change(move |s| sizes.lock().unwrap().push(s))
    };
    // The caller already sliced page 3.
    let table = supplied(make_rows(20..30), pagination);
    assert_eq!(table.mode(), PaginationMode::ServerDelegated);
    assert_eq!(table.window(), PageWindow::new(3, 10, 120));
    assert_eq!(table.visible_rows().len(), 10);

    assert_eq!(table.change_page(4), PageChange::Delegated);
    assert_eq!(*pages.lock().unwrap(), vec![4]);
    assert_eq!(table.page(), 1);

    assert_eq!(table.change_page_size(50), PageChange::Delegated);
    assert_eq!(*sizes.lock().unwrap(), vec![50]);
    assert_eq!(*pages.lock().unwrap(), vec![4, 1]);
}

#[test]
fn test_server_hint_without_handler_ignores_page_changes() {
    let table = supplied(make_rows(0..10), PaginationConfig::new().mode(ModeHint::Server));
    assert_eq!(table.change_page(2), PageChange::Ignored);
}

#[test]
fn test_pagination_off() {
    let table = supplied(make_rows(0..30), PaginationConfig::disabled());
    assert_eq!(table.mode(), PaginationMode::Off);
    let rendered = table.render();
    assert_eq!(rendered.rows().len(), 30);
    assert!(rendered.footer.is_none());
    assert_eq!(table.change_page(2), PageChange::Ignored);
}

#[test]
fn test_caller_status_flags() {
    let table = supplied(Vec::new(), PaginationConfig::new());
    assert_eq!(table.status(), TableStatus::Empty);

    table.set_status_flags(StatusFlags {
        has_error: true,
        error_kind: Some(ErrorKind::Api),
        ..Default::default()
    });
    assert_eq!(table.status(), TableStatus::Error { kind: ErrorKind::Api });

    table.set_status_flags(StatusFlags {
        loading: true,
        has_error: true,
        error_kind: None,
    });
    assert!(table.status().is_loading());
}

#[tokio::test]
async fn test_caller_retry_replaces_refetch() {
    let fetcher = Controlled::new(5);
    let retries = Arc::new(AtomicUsize::new(0));
    let table = {
        let retries = Arc::clone(&retries);
        DataTable::builder()
            .columns(columns())
            .row_key(|r: &Row, _| RowId::from(r.id))
            .fetch(FetchConfig::new(fetcher.clone()))
            .on_retry(move || {
                retries.fetch_add(1, Ordering::SeqCst);
            })
            .build()
            .unwrap()
    };
    table.mount().await;
    table.retry().await;
    assert_eq!(retries.load(Ordering::SeqCst), 1);
    assert_eq!(fetcher.calls().len(), 1);
}

#[test]
fn test_invalid_pagination_is_rejected() {
    let result = DataTable::builder()
        .columns(columns())
        .row_key(|r: &Row, _| RowId::from(r.id))
        .pagination(PaginationConfig::new().page_size(0))
        .build();
    assert_eq!(result.unwrap_err(), ConfigError::ZeroPageSize);
}

// ============================================================================
// Callbacks
// ============================================================================

#[test]
fn test_render_callbacks_may_use_the_table() {
    let handle: Arc<OnceLock<DataTable<Row>>> = Arc::new(OnceLock::new());
    let table = {
        let from_key = Arc::clone(&handle);
        let from_cell = Arc::clone(&handle);
        DataTable::builder()
            .columns(vec![Column::render("ID", move |r: &Row, _| {
                if let Some(table) = from_cell.get() {
                    table.change_page(2);
                }
                r.id.to_string()
            })])
            .row_key(move |r: &Row, _| {
                if let Some(table) = from_key.get() {
                    table.change_page(1);
                }
                RowId::from(r.id)
            })
            .rows(make_rows(0..25))
            .build()
            .unwrap()
    };
    assert!(handle.set(table.clone()).is_ok());

    // Keys are computed before cells, so the cell callback's change wins.
    let rendered = table.render();
    let ids: Vec<_> = rendered.rows().iter().map(|row| row.key.clone()).collect();
    assert_eq!(ids, (0..10i64).map(RowId::from).collect::<Vec<_>>());
    assert_eq!(table.page(), 2);

    let keys = table.visible_keys();
    assert_eq!(keys, (10..20i64).map(RowId::from).collect::<Vec<_>>());
    assert_eq!(table.page(), 1);
}
