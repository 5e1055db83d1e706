///
/// Column Buffers
///
/// A column is a contiguous, homogeneously typed, resizable sequence. Its
/// element type is fixed when it is created and resizing only ever changes
/// its length.
///
/// Element types form a closed set. Host type codes (the integer tags the
/// host uses for its own vectors) only enter through `ElementType::from_code`;
/// everything past that point matches exhaustively on the enum.
///
/// New cells, whether from allocation or from growth, start out missing.
///

use crate::error::DbiError;
use crate::na::Missing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Bool,
    Int,
    Float,
    String,
    Nested,
}

impl ElementType {
    pub const CODE_BOOL: i32 = 10;
    pub const CODE_INT: i32 = 13;
    pub const CODE_FLOAT: i32 = 14;
    pub const CODE_STRING: i32 = 16;
    pub const CODE_NESTED: i32 = 19;

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            Self::CODE_BOOL => Some(ElementType::Bool),
            Self::CODE_INT => Some(ElementType::Int),
            Self::CODE_FLOAT => Some(ElementType::Float),
            Self::CODE_STRING => Some(ElementType::String),
            Self::CODE_NESTED => Some(ElementType::Nested),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            ElementType::Bool => Self::CODE_BOOL,
            ElementType::Int => Self::CODE_INT,
            ElementType::Float => Self::CODE_FLOAT,
            ElementType::String => Self::CODE_STRING,
            ElementType::Nested => Self::CODE_NESTED,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ElementType::Bool => "logical",
            ElementType::Int => "integer",
            ElementType::Float => "numeric",
            ElementType::String => "character",
            ElementType::Nested => "list",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Bool(Vec<i32>),
    Int(Vec<i32>),
    Float(Vec<f64>),
    String(Vec<String>),
    Nested(Vec<Option<Column>>),
}

/// A nested cell is missing when it holds nothing at all.
impl Missing for Option<Column> {
    fn na() -> Self {
        None
    }

    fn is_na(&self) -> bool {
        self.is_none()
    }
}

fn reserve_cells<T>(cells: &mut Vec<T>, len: usize, column: &str) -> Result<(), DbiError> {
    if len <= cells.len() {
        return Ok(());
    }
    cells
        .try_reserve_exact(len - cells.len())
        .map_err(|_| DbiError::AllocationFailure {
            column: column.to_string(),
            requested: len,
        })
}

fn resize_cells<T: Missing>(cells: &mut Vec<T>, len: usize, column: &str) -> Result<(), DbiError> {
    if len <= cells.len() {
        cells.truncate(len);
        return Ok(());
    }
    reserve_cells(cells, len, column)?;
    cells.resize_with(len, T::na);
    Ok(())
}

fn alloc_cells<T: Missing>(len: usize, column: &str) -> Result<Vec<T>, DbiError> {
    let mut cells = Vec::new();
    resize_cells(&mut cells, len, column)?;
    Ok(cells)
}

impl Column {
    /// Allocate `len` missing cells of type `ty`. `column` names the buffer
    /// in error messages.
    pub fn with_len(ty: ElementType, len: usize, column: &str) -> Result<Self, DbiError> {
        Ok(match ty {
            ElementType::Bool => Column::Bool(alloc_cells(len, column)?),
            ElementType::Int => Column::Int(alloc_cells(len, column)?),
            ElementType::Float => Column::Float(alloc_cells(len, column)?),
            ElementType::String => Column::String(alloc_cells(len, column)?),
            ElementType::Nested => Column::Nested(alloc_cells(len, column)?),
        })
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            Column::Bool(_) => ElementType::Bool,
            Column::Int(_) => ElementType::Int,
            Column::Float(_) => ElementType::Float,
            Column::String(_) => ElementType::String,
            Column::Nested(_) => ElementType::Nested,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Bool(v) | Column::Int(v) => v.len(),
            Column::Float(v) => v.len(),
            Column::String(v) => v.len(),
            Column::Nested(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Change the length, keeping every cell below `min(old, len)`.
    pub fn resize(&mut self, len: usize, column: &str) -> Result<(), DbiError> {
        match self {
            Column::Bool(v) | Column::Int(v) => resize_cells(v, len, column),
            Column::Float(v) => resize_cells(v, len, column),
            Column::String(v) => resize_cells(v, len, column),
            Column::Nested(v) => resize_cells(v, len, column),
        }
    }

    /// Make room for `len` cells without changing the length.
    pub fn reserve_to(&mut self, len: usize, column: &str) -> Result<(), DbiError> {
        match self {
            Column::Bool(v) | Column::Int(v) => reserve_cells(v, len, column),
            Column::Float(v) => reserve_cells(v, len, column),
            Column::String(v) => reserve_cells(v, len, column),
            Column::Nested(v) => reserve_cells(v, len, column),
        }
    }

    /// Mark a cell missing. Returns false when `index` is out of range.
    pub fn set_na(&mut self, index: usize) -> bool {
        match self {
            Column::Bool(v) | Column::Int(v) => set_cell_na(v, index),
            Column::Float(v) => set_cell_na(v, index),
            Column::String(v) => set_cell_na(v, index),
            Column::Nested(v) => set_cell_na(v, index),
        }
    }

    /// `None` when `index` is out of range.
    pub fn is_na(&self, index: usize) -> Option<bool> {
        match self {
            Column::Bool(v) | Column::Int(v) => v.get(index).map(Missing::is_na),
            Column::Float(v) => v.get(index).map(Missing::is_na),
            Column::String(v) => v.get(index).map(Missing::is_na),
            Column::Nested(v) => v.get(index).map(Missing::is_na),
        }
    }

    pub fn as_bool(&self) -> Option<&[i32]> {
        match self {
            Column::Bool(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn as_bool_mut(&mut self) -> Option<&mut [i32]> {
        match self {
            Column::Bool(v) => Some(v.as_mut_slice()),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<&[i32]> {
        match self {
            Column::Int(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn as_int_mut(&mut self) -> Option<&mut [i32]> {
        match self {
            Column::Int(v) => Some(v.as_mut_slice()),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<&[f64]> {
        match self {
            Column::Float(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn as_float_mut(&mut self) -> Option<&mut [f64]> {
        match self {
            Column::Float(v) => Some(v.as_mut_slice()),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&[String]> {
        match self {
            Column::String(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn as_string_mut(&mut self) -> Option<&mut [String]> {
        match self {
            Column::String(v) => Some(v.as_mut_slice()),
            _ => None,
        }
    }

    pub fn as_nested(&self) -> Option<&[Option<Column>]> {
        match self {
            Column::Nested(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn as_nested_mut(&mut self) -> Option<&mut [Option<Column>]> {
        match self {
            Column::Nested(v) => Some(v.as_mut_slice()),
            _ => None,
        }
    }
}

fn set_cell_na<T: Missing>(cells: &mut [T], index: usize) -> bool {
    match cells.get_mut(index) {
        Some(cell) => {
            cell.set_na();
            true
        }
        None => false,
    }
}
