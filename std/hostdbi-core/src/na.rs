///
/// Null/Sentinel Encoding
///
/// Missing values are stored in-band: each element storage type reserves one
/// bit pattern that means "missing". Setting or testing a cell never needs
/// to look at its neighbours.
///
/// | Storage          | Missing value                                |
/// |------------------|----------------------------------------------|
/// | `i32` (int/bool) | `i32::MIN`                                   |
/// | `f64`            | NaN whose low 32 bits are 1954               |
/// | `String`         | the literal `"NA"`                           |
/// | nested cell      | `None` (see `column.rs`)                     |
///
/// Strings have no spare bit pattern, so a genuine `"NA"` value tests as
/// missing.
///

pub const NA_INTEGER: i32 = i32::MIN;
pub const NA_LOGICAL: i32 = i32::MIN;
pub const NA_REAL_BITS: u64 = 0x7FF0_0000_0000_07A2;
pub const NA_STRING: &str = "NA";

const NA_REAL_LOW_WORD: u64 = 1954;

pub fn na_real() -> f64 {
    f64::from_bits(NA_REAL_BITS)
}

/// Only the designated NaN counts; other NaNs are ordinary values.
pub fn is_na_real(x: f64) -> bool {
    x.is_nan() && (x.to_bits() & 0xFFFF_FFFF) == NA_REAL_LOW_WORD
}

pub fn logical(v: bool) -> i32 {
    if v { 1 } else { 0 }
}

/// Decode a logical cell. `None` when the cell is missing.
pub fn from_logical(v: i32) -> Option<bool> {
    if v == NA_LOGICAL { None } else { Some(v != 0) }
}

/// Element storage that has a designated missing value.
pub trait Missing: Sized {
    fn na() -> Self;

    fn is_na(&self) -> bool;

    fn set_na(&mut self) {
        *self = Self::na();
    }
}

impl Missing for i32 {
    fn na() -> Self {
        NA_INTEGER
    }

    fn is_na(&self) -> bool {
        *self == NA_INTEGER
    }
}

impl Missing for f64 {
    fn na() -> Self {
        na_real()
    }

    fn is_na(&self) -> bool {
        is_na_real(*self)
    }
}

impl Missing for String {
    fn na() -> Self {
        NA_STRING.to_string()
    }

    fn is_na(&self) -> bool {
        self == NA_STRING
    }
}
