///
/// Tabular Materializer
///
/// Turns a runtime schema into typed column buffers. Result sets rarely know
/// their row count before the fetch loop ends, so output is allocated from an
/// estimate with `allocate` and corrected once with `resize`.
///
/// Every operation either produces a complete table or fails without
/// handing anything back.
///
/// Operations:
/// - `allocate(schema, rows)` - one column per field, all `rows` long
/// - `resize(table, rows)` - truncate or extend every column in place
/// - `create_named(names, types, lengths)` - independently sized columns
/// - `create_from_schema(schema)` - same, lengths taken from the fields
/// - `frame(table)` / `try_frame(table)` - stamp row labels and frame class
///

use tracing::debug;

use crate::column::{Column, ElementType};
use crate::error::DbiError;
use crate::table::Table;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub element_type: ElementType,
    pub length: usize,
}

impl Field {
    pub fn new(name: impl Into<String>, element_type: ElementType, length: usize) -> Self {
        Self {
            name: name.into(),
            element_type,
            length,
        }
    }

    /// Build a field from a host type code.
    pub fn from_code(name: impl Into<String>, code: i32, length: usize) -> Result<Self, DbiError> {
        let name = name.into();
        match ElementType::from_code(code) {
            Some(element_type) => Ok(Self {
                name,
                element_type,
                length,
            }),
            None => Err(DbiError::UnsupportedType { field: name, code }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Build a schema from parallel slices of names, host type codes and
    /// declared lengths.
    pub fn from_codes(names: &[&str], codes: &[i32], lengths: &[usize]) -> Result<Self, DbiError> {
        check_parallel(names.len(), codes.len(), lengths.len())?;
        let fields = names
            .iter()
            .zip(codes)
            .zip(lengths)
            .map(|((name, &code), &len)| Field::from_code(*name, code, len))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { fields })
    }

    pub fn push(&mut self, field: Field) {
        self.fields.push(field);
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

fn check_parallel(names: usize, types: usize, lengths: usize) -> Result<(), DbiError> {
    if names != types || names != lengths {
        return Err(DbiError::SchemaMismatch(format!(
            "{} names, {} types, {} lengths",
            names, types, lengths
        )));
    }
    Ok(())
}

/// Allocate one `rows`-long column per schema field, in schema order.
pub fn allocate(schema: &Schema, rows: usize) -> Result<Table, DbiError> {
    debug!(fields = schema.len(), rows, "allocating output columns");
    let mut names = Vec::with_capacity(schema.len());
    let mut columns = Vec::with_capacity(schema.len());
    for field in schema.fields() {
        columns.push(Column::with_len(field.element_type, rows, &field.name)?);
        names.push(field.name.clone());
    }
    Ok(Table::from_columns(names, columns))
}

/// Set every column to `rows` cells. Cells below the old length survive;
/// cells added by growth are missing. Storage for growth is reserved for all
/// columns before any column changes, so a failure leaves the table as it was.
/// A framed table gets row labels matching its new length.
pub fn resize(table: &mut Table, rows: usize) -> Result<(), DbiError> {
    debug!(columns = table.len(), rows, "resizing output columns");
    for (name, column) in table.named_columns_mut() {
        column.reserve_to(rows, name)?;
    }
    for (name, column) in table.named_columns_mut() {
        column.resize(rows, name)?;
    }
    if table.is_frame() {
        frame(table);
    }
    Ok(())
}

/// Allocate each field at its own declared length.
pub fn create_from_schema(schema: &Schema) -> Result<Table, DbiError> {
    let mut names = Vec::with_capacity(schema.len());
    let mut columns = Vec::with_capacity(schema.len());
    for field in schema.fields() {
        columns.push(Column::with_len(field.element_type, field.length, &field.name)?);
        names.push(field.name.clone());
    }
    Ok(Table::from_columns(names, columns))
}

/// Named list of independently sized columns.
pub fn create_named(
    names: &[&str],
    types: &[ElementType],
    lengths: &[usize],
) -> Result<Table, DbiError> {
    check_parallel(names.len(), types.len(), lengths.len())?;
    let fields = names
        .iter()
        .zip(types)
        .zip(lengths)
        .map(|((name, &ty), &len)| Field::new(*name, ty, len))
        .collect();
    create_from_schema(&Schema::new(fields))
}

/// Stamp row labels "1".."n" (n = length of the first column) and the frame
/// class. Column lengths are not checked; see `try_frame`.
pub fn frame(table: &mut Table) {
    let n = table.row_count();
    let row_names = (1..=n).map(|i| i.to_string()).collect();
    table.stamp_frame(row_names);
}

/// `frame`, after checking that every column has the same length.
pub fn try_frame(table: &mut Table) -> Result<(), DbiError> {
    let expected = table.row_count();
    for (name, column) in table.names().iter().zip(table.columns()) {
        if column.len() != expected {
            return Err(DbiError::RaggedFrame {
                column: name.clone(),
                len: column.len(),
                expected,
            });
        }
    }
    frame(table);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::na::{logical, Missing};
    use crate::table::FRAME_CLASS;

    fn mixed_schema() -> Schema {
        Schema::new(vec![
            Field::new("flag", ElementType::Bool, 0),
            Field::new("id", ElementType::Int, 0),
            Field::new("score", ElementType::Float, 0),
            Field::new("name", ElementType::String, 0),
            Field::new("extra", ElementType::Nested, 0),
        ])
    }

    #[test]
    fn test_allocate_follows_schema_order() {
        let table = allocate(&mixed_schema(), 10).unwrap();
        assert_eq!(table.names(), &["flag", "id", "score", "name", "extra"]);
        let types: Vec<ElementType> = table.columns().iter().map(Column::element_type).collect();
        assert_eq!(
            types,
            vec![
                ElementType::Bool,
                ElementType::Int,
                ElementType::Float,
                ElementType::String,
                ElementType::Nested
            ]
        );
        assert!(table.columns().iter().all(|c| c.len() == 10));
    }

    #[test]
    fn test_resize_truncates_then_extends() {
        let mut table = allocate(&mixed_schema(), 10).unwrap();
        for (i, v) in [3, 1, 4].into_iter().enumerate() {
            table.column_mut("id").unwrap().as_int_mut().unwrap()[i] = v;
            table.column_mut("flag").unwrap().as_bool_mut().unwrap()[i] = logical(v > 2);
            table.column_mut("score").unwrap().as_float_mut().unwrap()[i] = v as f64 / 2.0;
            table.column_mut("name").unwrap().as_string_mut().unwrap()[i] = format!("n{}", v);
            table.column_mut("extra").unwrap().as_nested_mut().unwrap()[i] =
                Some(Column::Int(vec![v]));
        }

        resize(&mut table, 3).unwrap();
        assert!(table.columns().iter().all(|c| c.len() == 3));
        assert_eq!(table.column("id").unwrap().as_int().unwrap(), &[3, 1, 4]);

        resize(&mut table, 7).unwrap();
        assert!(table.columns().iter().all(|c| c.len() == 7));
        assert_eq!(&table.column("id").unwrap().as_int().unwrap()[..3], &[3, 1, 4]);
        assert_eq!(&table.column("flag").unwrap().as_bool().unwrap()[..3], &[1, 0, 1]);
        assert_eq!(
            &table.column("score").unwrap().as_float().unwrap()[..3],
            &[1.5, 0.5, 2.0]
        );
        assert_eq!(
            &table.column("name").unwrap().as_string().unwrap()[..3],
            &["n3", "n1", "n4"]
        );
        assert_eq!(
            table.column("extra").unwrap().as_nested().unwrap()[2],
            Some(Column::Int(vec![4]))
        );
        for column in table.columns() {
            assert_eq!(column.is_na(3), Some(true));
            assert_eq!(column.is_na(6), Some(true));
        }
    }

    #[test]
    fn test_zero_rows_is_legal() {
        let mut table = allocate(&mixed_schema(), 0).unwrap();
        assert!(table.columns().iter().all(Column::is_empty));
        resize(&mut table, 0).unwrap();
        frame(&mut table);
        assert_eq!(table.row_names(), Some(&[][..]));
    }

    #[test]
    fn test_unsupported_type_code_yields_no_table() {
        let result = Schema::from_codes(&["a", "b"], &[ElementType::CODE_INT, 24], &[1, 1])
            .and_then(|schema| allocate(&schema, 5));
        match result {
            Err(DbiError::UnsupportedType { field, code }) => {
                assert_eq!(field, "b");
                assert_eq!(code, 24);
            }
            other => panic!("Expected UnsupportedType, got {:?}", other),
        }
    }

    #[test]
    fn test_from_codes_accepts_every_recognized_code() {
        let schema = Schema::from_codes(
            &["a", "b", "c", "d", "e"],
            &[10, 13, 14, 16, 19],
            &[1, 2, 3, 4, 5],
        )
        .unwrap();
        assert_eq!(schema.names(), vec!["a", "b", "c", "d", "e"]);
        assert_eq!(schema.fields()[4].element_type, ElementType::Nested);
    }

    #[test]
    fn test_create_named_uses_declared_lengths() {
        let table = create_named(
            &["x", "y"],
            &[ElementType::Float, ElementType::String],
            &[2, 5],
        )
        .unwrap();
        assert_eq!(table.column("x").unwrap().len(), 2);
        assert_eq!(table.column("y").unwrap().len(), 5);
        assert!(!table.is_frame());
    }

    #[test]
    fn test_create_named_rejects_mismatched_arguments() {
        let result = create_named(&["x", "y"], &[ElementType::Int], &[1, 1]);
        assert!(matches!(result, Err(DbiError::SchemaMismatch(_))));
    }

    #[test]
    fn test_frame_stamps_positional_row_names() {
        let schema = Schema::new(vec![
            Field::new("a", ElementType::Int, 0),
            Field::new("b", ElementType::Float, 0),
            Field::new("c", ElementType::String, 0),
        ]);
        let mut table = allocate(&schema, 5).unwrap();
        frame(&mut table);

        assert!(table.is_frame());
        assert_eq!(table.class(), Some(FRAME_CLASS));
        assert_eq!(
            table.row_names().unwrap(),
            &["1", "2", "3", "4", "5"].map(String::from)
        );
    }

    #[test]
    fn test_try_frame_rejects_ragged_columns() {
        let mut table =
            create_named(&["x", "y"], &[ElementType::Int, ElementType::Int], &[3, 2]).unwrap();
        match try_frame(&mut table) {
            Err(DbiError::RaggedFrame {
                column,
                len,
                expected,
            }) => {
                assert_eq!(column, "y");
                assert_eq!(len, 2);
                assert_eq!(expected, 3);
            }
            other => panic!("Expected RaggedFrame, got {:?}", other),
        }
        assert!(!table.is_frame());
    }

    #[test]
    fn test_resize_relabels_framed_table() {
        let mut table = allocate(&mixed_schema(), 5).unwrap();
        frame(&mut table);

        resize(&mut table, 2).unwrap();
        assert!(table.is_frame());
        assert_eq!(table.row_names().unwrap(), &["1", "2"]);

        resize(&mut table, 4).unwrap();
        assert_eq!(table.row_names().unwrap(), &["1", "2", "3", "4"]);
        assert!(try_frame(&mut table).is_ok());
    }

    #[test]
    fn test_resize_leaves_plain_table_unframed() {
        let mut table = allocate(&mixed_schema(), 5).unwrap();
        resize(&mut table, 2).unwrap();
        assert!(!table.is_frame());
        assert!(table.row_names().is_none());
    }

    #[test]
    fn test_failed_resize_leaves_table_untouched() {
        let mut table = allocate(&mixed_schema(), 2).unwrap();
        table.column_mut("id").unwrap().as_int_mut().unwrap()[0] = 11;

        let result = resize(&mut table, usize::MAX / 2);
        assert!(matches!(result, Err(DbiError::AllocationFailure { .. })));
        assert!(table.columns().iter().all(|c| c.len() == 2));
        assert_eq!(table.column("id").unwrap().as_int().unwrap()[0], 11);
        assert!(table.column("id").unwrap().as_int().unwrap()[1].is_na());
    }
}
