// In: src/bridge/arrow_impl.rs

//! Marshals Arrow arrays into the crate's raw input representation.

use arrow::array::{Array, ArrowPrimitiveType, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type,
    UInt32Type, UInt64Type, UInt8Type,
};
use arrow::record_batch::RecordBatch;

use crate::error::CellcastError;
use crate::types::{RawColumn, RawTable};

fn downcast_error(array: &dyn Array) -> CellcastError {
    CellcastError::InternalError(format!(
        "array reported {} but did not downcast to it",
        array.data_type()
    ))
}

/// Collects a primitive array, widening every native value into `V`.
fn collect_native<T, V>(array: &dyn Array) -> Result<Vec<Option<V>>, CellcastError>
where
    T: ArrowPrimitiveType,
    T::Native: Into<V>,
{
    let typed = array
        .as_primitive_opt::<T>()
        .ok_or_else(|| downcast_error(array))?;
    Ok(typed.iter().map(|v| v.map(Into::into)).collect())
}

fn collect_text(array: &dyn Array) -> Result<Vec<Option<String>>, CellcastError> {
    match array.data_type() {
        DataType::Utf8 => Ok(array
            .as_string_opt::<i32>()
            .ok_or_else(|| downcast_error(array))?
            .iter()
            .map(|v| v.map(str::to_string))
            .collect()),
        DataType::LargeUtf8 => Ok(array
            .as_string_opt::<i64>()
            .ok_or_else(|| downcast_error(array))?
            .iter()
            .map(|v| v.map(str::to_string))
            .collect()),
        _ => {
            let utf8 = cast(array, &DataType::Utf8)?;
            collect_text(utf8.as_ref())
        }
    }
}

/// Converts one Arrow array into a `RawColumn`.
pub(crate) fn array_to_raw_column(array: &dyn Array) -> Result<RawColumn, CellcastError> {
    let column = match array.data_type() {
        DataType::Int8 => RawColumn::Int(collect_native::<Int8Type, i64>(array)?),
        DataType::Int16 => RawColumn::Int(collect_native::<Int16Type, i64>(array)?),
        DataType::Int32 => RawColumn::Int(collect_native::<Int32Type, i64>(array)?),
        DataType::Int64 => RawColumn::Int(collect_native::<Int64Type, i64>(array)?),
        DataType::UInt8 => RawColumn::UInt(collect_native::<UInt8Type, u64>(array)?),
        DataType::UInt16 => RawColumn::UInt(collect_native::<UInt16Type, u64>(array)?),
        DataType::UInt32 => RawColumn::UInt(collect_native::<UInt32Type, u64>(array)?),
        DataType::UInt64 => RawColumn::UInt(collect_native::<UInt64Type, u64>(array)?),
        DataType::Float32 => RawColumn::Float(collect_native::<Float32Type, f64>(array)?),
        DataType::Float64 => RawColumn::Float(collect_native::<Float64Type, f64>(array)?),
        DataType::Float16 => {
            let widened = cast(array, &DataType::Float64)?;
            RawColumn::Float(collect_native::<Float64Type, f64>(widened.as_ref())?)
        }
        // A boolean column with gaps cannot stay boolean, so it is inferred as text.
        DataType::Boolean if array.null_count() == 0 => {
            let bools = array
                .as_boolean_opt()
                .ok_or_else(|| downcast_error(array))?;
            RawColumn::Bool(bools.values().iter().collect())
        }
        DataType::Null => RawColumn::Text(vec![None; array.len()]),
        _ => RawColumn::Text(collect_text(array)?),
    };
    Ok(column)
}

/// Converts a whole record batch, keeping column order and names.
pub fn raw_table_from_batch(batch: &RecordBatch) -> Result<RawTable, CellcastError> {
    let mut table = RawTable::new();
    for (field, array) in batch.schema().fields().iter().zip(batch.columns()) {
        table.push_column(field.name().as_str(), array_to_raw_column(array.as_ref())?)?;
    }
    Ok(table)
}
