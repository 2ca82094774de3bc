//! Column descriptors.
//!
//! A column is a header plus a way to turn a row into cell text. There are
//! three ways to build one:
//!
//! - [`Column::render`] - a callback receiving the row and its index in the
//!   visible window, for computed or composite cells.
//! - [`Column::accessor`] - a typed field accessor, fixed at definition time.
//! - [`Column::key`] - a key looked up through [`FieldSource`], for loosely
//!   typed records such as `serde_json::Value`.
//!
//! # Example
//!
//! ```
//! use tabula_lib::column::{Alignment, Column, Size};
//!
//! struct User {
//!     name: String,
//!     age: u32,
//! }
//!
//! let columns: Vec<Column<User>> = vec![
//!     Column::accessor("name", "Name", |u: &User| u.name.clone()),
//!     Column::accessor("age", "Age", |u: &User| u.age).align(Alignment::Right),
//!     Column::render("#", |_: &User, index| (index + 1).to_string()).width(Size::Fixed(4)),
//! ];
//! assert_eq!(columns[1].cell(&User { name: "Ada".into(), age: 36 }, 0), "36");
//! ```

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// Horizontal alignment for column content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Column width hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Size {
    /// Let the view decide.
    #[default]
    Auto,
    /// Fixed width in view units.
    Fixed(u16),
    /// Share of the remaining width, by weight.
    Flex(u16),
}

/// Callback rendering a cell from a row and its index in the visible window.
pub type RenderFn<T> = Arc<dyn Fn(&T, usize) -> String + Send + Sync>;

/// Typed field accessor generated at column definition time.
pub type AccessorFn<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;

enum CellSource<T> {
    Render(RenderFn<T>),
    Accessor(AccessorFn<T>),
}

impl<T> Clone for CellSource<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Render(f) => Self::Render(Arc::clone(f)),
            Self::Accessor(f) => Self::Accessor(Arc::clone(f)),
        }
    }
}

/// Declarative description of one table column.
pub struct Column<T> {
    key: Option<String>,
    header: String,
    source: CellSource<T>,
    align: Alignment,
    width: Size,
}

impl<T> Column<T> {
    /// Create a column rendered by a callback.
    ///
    /// The callback receives the row and its 0-based index within the rows
    /// currently displayed.
    pub fn render<F>(header: impl Into<String>, render: F) -> Self
    where
        F: Fn(&T, usize) -> String + Send + Sync + 'static,
    {
        Self {
            key: None,
            header: header.into(),
            source: CellSource::Render(Arc::new(render)),
            align: Alignment::Left,
            width: Size::Auto,
        }
    }

    /// Create a column reading one field through a typed accessor.
    pub fn accessor<F, V>(key: impl Into<String>, header: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&T) -> V + Send + Sync + 'static,
        V: Display,
    {
        Self {
            key: Some(key.into()),
            header: header.into(),
            source: CellSource::Accessor(Arc::new(move |row| accessor(row).to_string())),
            align: Alignment::Left,
            width: Size::Auto,
        }
    }

    /// Set the column alignment.
    pub fn align(mut self, align: Alignment) -> Self {
        self.align = align;
        self
    }

    /// Set the column width hint.
    pub fn width(mut self, width: Size) -> Self {
        self.width = width;
        self
    }

    /// Set a key on a render column.
    ///
    /// Keys are informational for render columns; views may use them as
    /// stable column identifiers.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// The field key, if any.
    pub fn key_name(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// The header label.
    pub fn header(&self) -> &str {
        &self.header
    }

    /// The alignment.
    pub fn alignment(&self) -> Alignment {
        self.align
    }

    /// The width hint.
    pub fn size(&self) -> Size {
        self.width
    }

    /// Whether this column uses a render callback.
    pub fn is_custom(&self) -> bool {
        matches!(self.source, CellSource::Render(_))
    }

    /// Render the cell for `row` at `index` in the visible window.
    pub fn cell(&self, row: &T, index: usize) -> String {
        match &self.source {
            CellSource::Render(render) => render(row, index),
            CellSource::Accessor(accessor) => accessor(row),
        }
    }
}

impl<T: FieldSource + 'static> Column<T> {
    /// Create a column reading `key` through [`FieldSource`].
    ///
    /// Missing fields render as empty text.
    pub fn key(key: impl Into<String>, header: impl Into<String>) -> Self {
        let key = key.into();
        let lookup = key.clone();
        Self {
            key: Some(key),
            header: header.into(),
            source: CellSource::Accessor(Arc::new(move |row: &T| {
                row.field(&lookup).unwrap_or_default()
            })),
            align: Alignment::Left,
            width: Size::Auto,
        }
    }
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            header: self.header.clone(),
            source: self.source.clone(),
            align: self.align,
            width: self.width,
        }
    }
}

impl<T> std::fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("key", &self.key)
            .field("header", &self.header)
            .field("custom", &self.is_custom())
            .field("align", &self.align)
            .field("width", &self.width)
            .finish()
    }
}

/// Records whose fields can be read by name.
pub trait FieldSource {
    /// Read a field as display text, or `None` if it does not exist.
    fn field(&self, key: &str) -> Option<String>;
}

/// Format a JSON value as cell text. Strings are unquoted, null is empty.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl FieldSource for Value {
    /// Keys may be dotted paths into nested objects (`owner.name`).
    fn field(&self, key: &str) -> Option<String> {
        let mut current = self;
        for segment in key.split('.') {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(value_text(current))
    }
}

impl FieldSource for serde_json::Map<String, Value> {
    fn field(&self, key: &str) -> Option<String> {
        match key.split_once('.') {
            Some((head, rest)) => self.get(head)?.field(rest),
            None => self.get(key).map(value_text),
        }
    }
}

impl<V: Display> FieldSource for HashMap<String, V> {
    fn field(&self, key: &str) -> Option<String> {
        self.get(key).map(|v| v.to_string())
    }
}

impl<V: Display> FieldSource for BTreeMap<String, V> {
    fn field(&self, key: &str) -> Option<String> {
        self.get(key).map(|v| v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_key_column_reads_json_fields() {
        let row = json!({"name": "Contoso", "revenue": 1200, "owner": {"name": "Ada"}, "note": null});
        assert_eq!(Column::<Value>::key("name", "Name").cell(&row, 0), "Contoso");
        assert_eq!(Column::<Value>::key("revenue", "Revenue").cell(&row, 0), "1200");
        assert_eq!(Column::<Value>::key("owner.name", "Owner").cell(&row, 0), "Ada");
        assert_eq!(Column::<Value>::key("note", "Note").cell(&row, 0), "");
        assert_eq!(Column::<Value>::key("missing", "Missing").cell(&row, 0), "");
    }

    #[test]
    fn test_json_array_paths() {
        let row = json!({"tags": ["a", "b"]});
        assert_eq!(row.field("tags.1"), Some("b".to_string()));
        assert_eq!(row.field("tags.7"), None);
        assert_eq!(row.field("tags.x"), None);
    }

    #[test]
    fn test_render_column_receives_index() {
        let column = Column::render("#", |row: &String, index| format!("{}:{}", index, row));
        assert!(column.is_custom());
        assert_eq!(column.cell(&"x".to_string(), 3), "3:x");
    }

    #[test]
    fn test_builder_methods() {
        let column = Column::accessor("n", "N", |v: &u32| *v)
            .align(Alignment::Center)
            .width(Size::Fixed(8));
        assert_eq!(column.key_name(), Some("n"));
        assert_eq!(column.header(), "N");
        assert_eq!(column.alignment(), Alignment::Center);
        assert_eq!(column.size(), Size::Fixed(8));
        assert!(!column.is_custom());
    }

    #[test]
    fn test_map_field_source() {
        let mut row = HashMap::new();
        row.insert("id".to_string(), 7);
        assert_eq!(row.field("id"), Some("7".to_string()));
        assert_eq!(row.field("nope"), None);
    }
}
