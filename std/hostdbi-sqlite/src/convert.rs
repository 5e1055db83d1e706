///
/// SQLite values to column cells.
///
/// SQLite types values, not columns, so a result column's element type is
/// inferred from every buffered value in it:
///
/// - any BLOB makes the column nested, each cell an integer column of bytes
/// - otherwise any TEXT makes it a string column
/// - otherwise any REAL, or an INTEGER that does not fit an i32 cell, makes
///   it a float column (i32::MIN is the integer missing value, so it counts
///   as not fitting)
/// - otherwise any INTEGER makes it an integer column
/// - a column of nothing but NULLs is a string column
///

use hostdbi_core::strings::copy_text;
use hostdbi_core::{Column, ElementType};
use rusqlite::types::Value as SqlValue;

pub(crate) fn infer_element_type<'a>(values: impl IntoIterator<Item = &'a SqlValue>) -> ElementType {
    let mut int = false;
    let mut float = false;
    let mut text = false;
    for value in values {
        match value {
            SqlValue::Blob(_) => return ElementType::Nested,
            SqlValue::Text(_) => text = true,
            SqlValue::Real(_) => float = true,
            SqlValue::Integer(i) => {
                if fits_int_cell(*i) {
                    int = true;
                } else {
                    float = true;
                }
            }
            SqlValue::Null => {}
        }
    }
    if text {
        ElementType::String
    } else if float {
        ElementType::Float
    } else if int {
        ElementType::Int
    } else {
        ElementType::String
    }
}

fn fits_int_cell(i: i64) -> bool {
    i32::try_from(i).is_ok_and(|v| v != i32::MIN)
}

/// Write one value into `row` of a column whose type came from
/// `infer_element_type` over the same values.
pub(crate) fn write_cell(column: &mut Column, row: usize, value: &SqlValue, trim_blanks: bool) {
    match (column, value) {
        (col, SqlValue::Null) => {
            col.set_na(row);
        }
        (Column::Int(v), SqlValue::Integer(i)) => v[row] = *i as i32,
        (Column::Float(v), SqlValue::Integer(i)) => v[row] = *i as f64,
        (Column::Float(v), SqlValue::Real(f)) => v[row] = *f,
        (Column::String(v), SqlValue::Text(s)) => {
            v[row] = copy_text(s, trim_blanks);
        }
        (Column::String(v), SqlValue::Integer(i)) => v[row] = i.to_string(),
        (Column::String(v), SqlValue::Real(f)) => v[row] = f.to_string(),
        (Column::Nested(v), other) => v[row] = Some(nested_cell(other, trim_blanks)),
        (col, _) => {
            col.set_na(row);
        }
    }
}

fn nested_cell(value: &SqlValue, trim_blanks: bool) -> Column {
    match value {
        SqlValue::Blob(bytes) => Column::Int(bytes.iter().map(|&b| i32::from(b)).collect()),
        SqlValue::Integer(i) if fits_int_cell(*i) => Column::Int(vec![*i as i32]),
        SqlValue::Integer(i) => Column::Float(vec![*i as f64]),
        SqlValue::Real(f) => Column::Float(vec![*f]),
        SqlValue::Text(s) => Column::String(vec![copy_text(s, trim_blanks)]),
        SqlValue::Null => Column::String(Vec::new()),
    }
}
