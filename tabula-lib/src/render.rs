//! Render pipeline: resolved rows and columns to view-ready cells.
//!
//! The output is a plain data model. Views (terminal, HTML, GUI) draw it;
//! nothing here knows about styling.

use serde::Serialize;

use crate::column::Alignment;
use crate::column::Column;
use crate::column::Size;
use crate::error::ErrorKind;
use crate::footer::FooterModel;
use crate::selection::RowId;
use crate::selection::SelectAllState;
use crate::selection::SelectionConfig;
use crate::settings::TableSettings;
use crate::status::TableStatus;

/// Function producing a row's identity from the row and its index.
pub type RowKeyFn<T> = std::sync::Arc<dyn Fn(&T, usize) -> RowId + Send + Sync>;

/// Content of one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "type", content = "value")]
pub enum CellContent {
    Text(String),
    /// Per-row selection toggle with its accessible label.
    Toggle { checked: bool, label: String },
}

/// One rendered cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub content: CellContent,
    pub align: Alignment,
    pub width: Size,
}

impl Cell {
    /// The text of a text cell.
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            CellContent::Text(text) => Some(text),
            CellContent::Toggle { .. } => None,
        }
    }
}

/// One header cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum HeaderCell {
    /// Synthetic selection column header.
    SelectAll { state: SelectAllState, label: String },
    /// A caller column.
    Column {
        key: Option<String>,
        label: String,
        align: Alignment,
        width: Size,
    },
}

/// One rendered data row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedRow {
    /// Stable identity from the caller's row-key function.
    pub key: RowId,
    /// Index within the visible rows.
    pub index: usize,
    /// Selection state, when selection is enabled.
    pub selected: Option<bool>,
    /// Cells, including the selection toggle first when enabled.
    pub cells: Vec<Cell>,
}

/// Error panel shown in place of the rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPanel {
    pub kind: ErrorKind,
    pub title: String,
    pub description: String,
    pub retry_label: String,
}

/// Table body for the current status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Body {
    /// First load: placeholder rows spanning `colspan` columns.
    Skeleton { rows: usize, colspan: usize, label: String },
    /// Background refresh: the current rows stay visible.
    Refreshing { rows: Vec<RenderedRow> },
    /// Load failed.
    Error { panel: ErrorPanel, colspan: usize },
    /// Nothing to show.
    Empty { message: String, colspan: usize },
    /// Rows.
    Rows { rows: Vec<RenderedRow> },
}

/// Complete render output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedTable {
    pub status: TableStatus,
    pub header: Vec<HeaderCell>,
    pub body: Body,
    pub footer: Option<FooterModel>,
}

impl RenderedTable {
    /// Rows currently drawn, if the body draws rows.
    pub fn rows(&self) -> &[RenderedRow] {
        match &self.body {
            Body::Rows { rows } | Body::Refreshing { rows } => rows,
            _ => &[],
        }
    }

    /// The error panel, if shown.
    pub fn error_panel(&self) -> Option<&ErrorPanel> {
        match &self.body {
            Body::Error { panel, .. } => Some(panel),
            _ => None,
        }
    }
}

/// Everything the pipeline needs for one render.
pub(crate) struct RenderInput<'a, T> {
    pub columns: &'a [Column<T>],
    pub rows: &'a [T],
    pub row_key: &'a RowKeyFn<T>,
    pub selection: Option<&'a SelectionConfig>,
    pub status: TableStatus,
    pub footer: Option<FooterModel>,
    pub settings: &'a TableSettings,
}

/// Width of full-row panels: caller columns plus the selection column.
pub fn colspan(column_count: usize, with_selection: bool) -> usize {
    column_count + usize::from(with_selection)
}

/// Compute row identities for `rows`.
pub(crate) fn row_keys<T>(rows: &[T], row_key: &RowKeyFn<T>) -> Vec<RowId> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| row_key(row, index))
        .collect()
}

/// Render one data row.
pub(crate) fn render_row<T>(
    columns: &[Column<T>],
    row: &T,
    index: usize,
    key: RowId,
    selection: Option<&SelectionConfig>,
    toggle_label: &str,
) -> RenderedRow {
    let selected = selection.map(|s| s.is_selected(&key));
    let mut cells = Vec::with_capacity(columns.len() + usize::from(selected.is_some()));
    if let Some(checked) = selected {
        cells.push(Cell {
            content: CellContent::Toggle {
                checked,
                label: toggle_label.to_string(),
            },
            align: Alignment::Center,
            width: Size::Auto,
        });
    }
    cells.extend(columns.iter().map(|column| Cell {
        content: CellContent::Text(column.cell(row, index)),
        align: column.alignment(),
        width: column.size(),
    }));
    RenderedRow {
        key,
        index,
        selected,
        cells,
    }
}

pub(crate) fn render_table<T>(input: RenderInput<'_, T>) -> RenderedTable {
    let keys = row_keys(input.rows, input.row_key);
    let labels = &input.settings.labels;
    let span = colspan(input.columns.len(), input.selection.is_some());

    let mut header = Vec::with_capacity(span);
    if let Some(selection) = input.selection {
        header.push(HeaderCell::SelectAll {
            state: selection.select_all_state(&keys),
            label: labels.select_all.clone(),
        });
    }
    header.extend(input.columns.iter().map(|column| HeaderCell::Column {
        key: column.key_name().map(str::to_string),
        label: column.header().to_string(),
        align: column.alignment(),
        width: column.size(),
    }));

    let rendered_rows = |keys: Vec<RowId>| -> Vec<RenderedRow> {
        input
            .rows
            .iter()
            .zip(keys)
            .enumerate()
            .map(|(index, (row, key))| {
                render_row(input.columns, row, index, key, input.selection, &labels.select_row)
            })
            .collect()
    };

    let body = match input.status {
        TableStatus::Loading { initial: true } => Body::Skeleton {
            rows: input.settings.skeleton_rows,
            colspan: span,
            label: labels.loading.clone(),
        },
        TableStatus::Loading { initial: false } => Body::Refreshing {
            rows: rendered_rows(keys),
        },
        TableStatus::Error { kind } => {
            let text = labels.error_text(kind);
            Body::Error {
                panel: ErrorPanel {
                    kind,
                    title: text.title.clone(),
                    description: text.description.clone(),
                    retry_label: labels.retry.clone(),
                },
                colspan: span,
            }
        }
        TableStatus::Empty => Body::Empty {
            message: labels.empty.clone(),
            colspan: span,
        },
        TableStatus::Populated => Body::Rows {
            rows: rendered_rows(keys),
        },
    };

    RenderedTable {
        status: input.status,
        header,
        body,
        footer: input.footer,
    }
}
