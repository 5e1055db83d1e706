///
/// Tabular Container
///
/// An ordered collection of named columns. Order is the schema order and is
/// preserved end to end; duplicate names are kept as given and name lookups
/// return the first match.
///
/// A table may additionally carry frame metadata (row labels and the frame
/// class tag), which marks it as row/column data rather than a plain named
/// list. Columns are only required to have equal length once framed.
///
/// The table owns its columns until `into_parts` moves them to the host.
///

use crate::column::Column;

/// Class tag stamped on framed tables.
pub const FRAME_CLASS: &str = "data.frame";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Column>,
    row_names: Option<Vec<String>>,
    class: Option<String>,
}

/// Everything a table owned, handed over by value.
#[derive(Debug, Clone, PartialEq)]
pub struct TableParts {
    pub names: Vec<String>,
    pub columns: Vec<Column>,
    pub row_names: Option<Vec<String>>,
    pub class: Option<String>,
}

impl Table {
    pub(crate) fn from_columns(names: Vec<String>, columns: Vec<Column>) -> Self {
        debug_assert_eq!(names.len(), columns.len());
        Self {
            names,
            columns,
            row_names: None,
            class: None,
        }
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Length of the first column, 0 for a table without columns.
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        let idx = self.names.iter().position(|n| n == name)?;
        self.columns.get(idx)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        let idx = self.names.iter().position(|n| n == name)?;
        self.columns.get_mut(idx)
    }

    pub fn column_at(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn column_at_mut(&mut self, index: usize) -> Option<&mut Column> {
        self.columns.get_mut(index)
    }

    pub fn row_names(&self) -> Option<&[String]> {
        self.row_names.as_deref()
    }

    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    pub fn is_frame(&self) -> bool {
        self.class.as_deref() == Some(FRAME_CLASS)
    }

    /// Hand every buffer to the caller. The table is consumed, so nothing on
    /// this side can touch the columns afterwards.
    pub fn into_parts(self) -> TableParts {
        TableParts {
            names: self.names,
            columns: self.columns,
            row_names: self.row_names,
            class: self.class,
        }
    }

    pub(crate) fn named_columns_mut(&mut self) -> impl Iterator<Item = (&str, &mut Column)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter_mut())
    }

    pub(crate) fn stamp_frame(&mut self, row_names: Vec<String>) {
        self.row_names = Some(row_names);
        self.class = Some(FRAME_CLASS.to_string());
    }
}
