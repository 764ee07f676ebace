//! Sentinel-encoded missing values.
//!
//! Attributes that were not set carry a per-kind sentinel instead of a value:
//! `NaN` for floats and the minimum representable integer for the integer kinds.
//! Arrow null slots are treated the same way.

use arrow_array::{
    Array,
    cast::AsArray,
    types::{Float64Type, Int8Type, Int32Type},
};
use arrow_schema::DataType;

use crate::error::DatasetError;

/// The closed set of value kinds that have a missing-value sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// 64-bit float; missing is `NaN`.
    Float64,
    /// 32-bit signed integer; missing is `i32::MIN`.
    Int32,
    /// 8-bit signed integer; missing is `i8::MIN`.
    Int8,
}

impl ValueKind {
    /// Resolve the kind of `data_type`, looking through fixed-size lists.
    ///
    /// # Errors
    /// Returns [`DatasetError::UnsupportedValueKind`] for any other element type.
    pub fn of(data_type: &DataType) -> Result<Self, DatasetError> {
        match data_type {
            DataType::Float64 => Ok(ValueKind::Float64),
            DataType::Int32 => Ok(ValueKind::Int32),
            DataType::Int8 => Ok(ValueKind::Int8),
            DataType::FixedSizeList(item, _) => ValueKind::of(item.data_type()),
            other => Err(DatasetError::UnsupportedValueKind {
                data_type: other.clone(),
            }),
        }
    }

    /// Whether every element of the flat primitive `values` is the sentinel (or null).
    fn all_sentinel(self, values: &dyn Array) -> bool {
        match self {
            ValueKind::Float64 => values
                .as_primitive::<Float64Type>()
                .iter()
                .all(|v| v.is_none_or(f64::is_nan)),
            ValueKind::Int32 => values
                .as_primitive::<Int32Type>()
                .iter()
                .all(|v| v.is_none_or(|v| v == i32::MIN)),
            ValueKind::Int8 => values
                .as_primitive::<Int8Type>()
                .iter()
                .all(|v| v.is_none_or(|v| v == i8::MIN)),
        }
    }
}

/// Whether `value` holds no data: true iff every element is its kind's sentinel.
///
/// `value` can be a single slot or any number of elements, including fixed-size lists
/// (three-phase attributes). Null slots count as missing and an empty value is missing.
///
/// # Errors
/// Returns [`DatasetError::UnsupportedValueKind`] if the element type has no sentinel.
pub fn is_missing(value: &dyn Array) -> Result<bool, DatasetError> {
    let kind = ValueKind::of(value.data_type())?;
    Ok(all_missing(kind, value))
}

fn all_missing(kind: ValueKind, value: &dyn Array) -> bool {
    match value.data_type() {
        DataType::FixedSizeList(_, _) => {
            let list = value.as_fixed_size_list();
            (0..list.len()).all(|i| list.is_null(i) || all_missing(kind, list.value(i).as_ref()))
        }
        _ => kind.all_sentinel(value),
    }
}
