//! View status resolution.
//!
//! The status is derived on every render from the caller's flags and the
//! engine's own fetch state. Precedence is fixed: loading masks error,
//! error masks empty.

use serde::Serialize;

use crate::error::ErrorKind;

/// Which view the table body shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "status")]
pub enum TableStatus {
    /// A load is in progress. `initial` is true until the first fetch
    /// has settled, so views can show skeletons only on first paint.
    Loading { initial: bool },
    /// The last load failed.
    Error { kind: ErrorKind },
    /// Nothing to show.
    Empty,
    /// Rows are available.
    Populated,
}

impl TableStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// Loading and error flags supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusFlags {
    /// Caller-side loading.
    pub loading: bool,
    /// Caller-side error.
    pub has_error: bool,
    /// Classification of the caller-side error, if known.
    pub error_kind: Option<ErrorKind>,
}

/// Engine-side inputs to status resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InternalStatus {
    /// A fetch is in flight.
    pub loading: bool,
    /// The first fetch has settled.
    pub first_load_done: bool,
    /// Classification of the stored fetch error.
    pub error: Option<ErrorKind>,
}

/// Pick the authoritative status.
pub fn resolve_status(
    flags: &StatusFlags,
    internal: &InternalStatus,
    display_rows: usize,
) -> TableStatus {
    if flags.loading || internal.loading {
        return TableStatus::Loading {
            initial: !internal.first_load_done,
        };
    }
    if flags.has_error || internal.error.is_some() {
        let kind = if flags.has_error {
            flags.error_kind.or(internal.error).unwrap_or_default()
        } else {
            internal.error.unwrap_or_default()
        };
        return TableStatus::Error { kind };
    }
    if display_rows == 0 {
        TableStatus::Empty
    } else {
        TableStatus::Populated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn internal(loading: bool, error: Option<ErrorKind>) -> InternalStatus {
        InternalStatus {
            loading,
            first_load_done: true,
            error,
        }
    }

    #[test]
    fn test_error_masks_empty() {
        let status = resolve_status(&StatusFlags::default(), &internal(false, Some(ErrorKind::Network)), 0);
        assert_eq!(status, TableStatus::Error { kind: ErrorKind::Network });
    }

    #[test]
    fn test_loading_masks_error() {
        let flags = StatusFlags {
            loading: true,
            ..Default::default()
        };
        let status = resolve_status(&flags, &internal(false, Some(ErrorKind::Api)), 3);
        assert_eq!(status, TableStatus::Loading { initial: false });

        let status = resolve_status(&StatusFlags::default(), &internal(true, Some(ErrorKind::Api)), 3);
        assert!(status.is_loading());
    }

    #[test]
    fn test_initial_loading() {
        let state = InternalStatus {
            loading: true,
            first_load_done: false,
            error: None,
        };
        assert_eq!(
            resolve_status(&StatusFlags::default(), &state, 0),
            TableStatus::Loading { initial: true }
        );
    }

    #[test]
    fn test_caller_error_kind_wins() {
        let flags = StatusFlags {
            has_error: true,
            error_kind: Some(ErrorKind::Api),
            ..Default::default()
        };
        let status = resolve_status(&flags, &internal(false, Some(ErrorKind::Network)), 1);
        assert_eq!(status, TableStatus::Error { kind: ErrorKind::Api });
    }

    #[test]
    fn test_caller_error_without_kind() {
        let flags = StatusFlags {
            has_error: true,
            ..Default::default()
        };
        assert_eq!(
            resolve_status(&flags, &internal(false, Some(ErrorKind::Network)), 1),
            TableStatus::Error { kind: ErrorKind::Network }
        );
        assert_eq!(
            resolve_status(&flags, &internal(false, None), 1),
            TableStatus::Error { kind: ErrorKind::Generic }
        );
    }

    #[test]
    fn test_empty_and_populated() {
        let flags = StatusFlags::default();
        assert_eq!(resolve_status(&flags, &internal(false, None), 0), TableStatus::Empty);
        assert_eq!(resolve_status(&flags, &internal(false, None), 2), TableStatus::Populated);
    }
}
