use super::*;
use crate::config::CastConfig;
use crate::types::{Dtype, RawColumn, TypedValue};
use arrow::array::{
    ArrayRef, BooleanArray, Date32Array, Float32Array, Int64Array, NullArray, StringArray,
    UInt16Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use std::collections::HashMap;
use std::sync::Arc;

fn create_mixed_test_batch() -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("count", DataType::UInt16, true),
        Field::new("ratio", DataType::Float32, true),
        Field::new("flag", DataType::Boolean, false),
        Field::new("maybe", DataType::Boolean, true),
        Field::new("label", DataType::Utf8, true),
        Field::new("day", DataType::Date32, false),
        Field::new("nothing", DataType::Null, true),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(vec![-1, 0, 70_000])),
        Arc::new(UInt16Array::from(vec![Some(1), None, Some(3)])),
        Arc::new(Float32Array::from(vec![Some(0.5), Some(1.5), Some(2.0)])),
        Arc::new(BooleanArray::from(vec![true, false, true])),
        Arc::new(BooleanArray::from(vec![Some(true), None, Some(false)])),
        Arc::new(StringArray::from(vec![Some("1+2j"), Some("3j"), Some("-1-1j")])),
        // 2021-03-04, 2021-03-05, 2021-03-06
        Arc::new(Date32Array::from(vec![18690, 18691, 18692])),
        Arc::new(NullArray::new(3)),
    ];
    RecordBatch::try_new(schema, columns).unwrap()
}

#[test]
fn test_arrow_arrays_map_to_raw_columns() {
    let table = raw_table_from_batch(&create_mixed_test_batch()).unwrap();
    assert_eq!(table.num_columns(), 8);
    assert_eq!(table.num_rows(), Some(3));
    assert_eq!(
        table.column("id"),
        Some(&RawColumn::Int(vec![Some(-1), Some(0), Some(70_000)]))
    );
    assert_eq!(
        table.column("count"),
        Some(&RawColumn::UInt(vec![Some(1), None, Some(3)]))
    );
    assert_eq!(
        table.column("flag"),
        Some(&RawColumn::Bool(vec![true, false, true]))
    );
    assert!(matches!(table.column("maybe"), Some(RawColumn::Text(_))));
    assert_eq!(
        table.column("day"),
        Some(&RawColumn::text(["2021-03-04", "2021-03-05", "2021-03-06"]))
    );
    assert_eq!(table.column("nothing"), Some(&RawColumn::Text(vec![None, None, None])));
}

#[test]
fn test_ingest_record_batch_infers_each_column() {
    let result = ingest_record_batch(
        "batch",
        &create_mixed_test_batch(),
        &HashMap::new(),
        &CastConfig::default(),
    )
    .unwrap();
    let dtype_of = |name: &str| {
        result
            .columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.dtype)
            .unwrap()
    };

    assert_eq!(dtype_of("id"), Dtype::Int32);
    // One gap is within tolerance, so the column is demoted to float.
    assert_eq!(dtype_of("count"), Dtype::Float32);
    assert_eq!(dtype_of("ratio"), Dtype::Float32);
    assert_eq!(dtype_of("flag"), Dtype::Bool);
    assert_eq!(dtype_of("label"), Dtype::Complex128);
    assert_eq!(dtype_of("day"), Dtype::DateTime);
    assert_eq!(dtype_of("nothing"), Dtype::Text);
}

#[test]
fn test_ingest_record_batch_honours_force_casts() {
    let mut casts = HashMap::new();
    casts.insert("id".to_string(), "int64".to_string());
    casts.insert("label".to_string(), "category".to_string());
    let result = ingest_record_batch(
        "batch",
        &create_mixed_test_batch(),
        &casts,
        &CastConfig::default(),
    )
    .unwrap();
    assert_eq!(result.columns[0].dtype, Dtype::Int64);
    assert_eq!(result.columns[5].dtype, Dtype::Category);
    assert!(result.errors.is_empty());

    let row = crate::pipeline::decode_row(&result.columns, &result.cells, 2).unwrap();
    assert_eq!(row.get("id"), Some(&TypedValue::Int(70_000)));
    assert_eq!(row.get("label"), Some(&TypedValue::Text("-1-1j".into())));
}
