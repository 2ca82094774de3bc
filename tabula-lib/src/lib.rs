//! Generic tabular data engine
//!
//! Turns a collection of records, supplied up front or fetched page by
//! page, into a paginated, selectable table model. Views draw the
//! [`RenderedTable`](render::RenderedTable) it produces; the engine owns
//! pagination mode resolution, the fetch lifecycle, status precedence and
//! selection relaying.

pub mod column;
pub mod error;
pub mod fetch;
pub mod footer;
pub mod http;
pub mod pagination;
pub mod render;
pub mod selection;
pub mod settings;
pub mod status;

mod table;

pub use table::*;

/// Commonly used types.
pub mod prelude {
    pub use crate::column::{Alignment, Column, FieldSource, Size};
    pub use crate::error::{ConfigError, ErrorKind, FetchError};
    pub use crate::fetch::{FetchConfig, FetchParams, FetchResult, Fetcher, RefreshKey, fetcher_fn};
    pub use crate::footer::{FooterModel, PageItem};
    pub use crate::pagination::{ModeHint, PageWindow, PaginationConfig, PaginationMode};
    pub use crate::render::{Body, Cell, CellContent, HeaderCell, RenderedRow, RenderedTable};
    pub use crate::selection::{RowId, SelectAllState, SelectionConfig, SelectionSet};
    pub use crate::settings::{Labels, TableSettings};
    pub use crate::status::{StatusFlags, TableStatus};
    pub use crate::{DataTable, PageChange};
}
