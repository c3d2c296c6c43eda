//! End-to-end tests: raw table -> ingest -> store -> paged decode.

use super::store::MemoryStore;
use super::*;
use crate::types::{Dtype, RawColumn};
use num_complex::Complex64;

fn sample_table() -> RawTable {
    RawTable::new()
        .with_column("score", RawColumn::text(["1", "2", "x", "4", "5"]))
        .unwrap()
        .with_column("delta", RawColumn::text(["-5", "5", "-3", "0", "2"]))
        .unwrap()
        .with_column("name", RawColumn::text(["e", "d", "c", "b", "a"]))
        .unwrap()
        .with_column("z", RawColumn::text(["3+4j", "1+1j", "0j", "2j", "-1-1j"]))
        .unwrap()
}

fn no_casts() -> HashMap<String, String> {
    HashMap::new()
}

#[test]
fn test_ingest_infers_and_encodes_every_column() {
    let result = ingest("src", &sample_table(), &no_casts(), &CastConfig::default()).unwrap();
    let dtypes: Vec<Dtype> = result.columns.iter().map(|c| c.dtype).collect();
    assert!(dtypes[0].is_float());
    assert_eq!(dtypes[1], Dtype::Int8);
    assert_eq!(dtypes[2], Dtype::Text);
    assert_eq!(dtypes[3], Dtype::Complex128);
    assert_eq!(result.cells.len(), 20);
    assert!(result.errors.is_empty());

    for column in &result.columns {
        assert_eq!(column.source_id, "src");
        let rows: Vec<u64> = result
            .cells
            .iter()
            .filter(|cell| cell.column == column.index)
            .map(|cell| cell.row)
            .collect();
        assert_eq!(rows, vec![0, 1, 2, 3, 4], "{}", column.name);
    }
}

#[test]
fn test_exception_becomes_nan_end_to_end() {
    let result = ingest("src", &sample_table(), &no_casts(), &CastConfig::default()).unwrap();
    let row = decode_row(&result.columns, &result.cells, 2).unwrap();
    assert!(matches!(row.get("score"), Some(TypedValue::Float(v)) if v.is_nan()));
    assert_eq!(row.get("name"), Some(&TypedValue::Text("c".into())));
}

#[test]
fn test_failed_force_cast_is_reported_but_column_survives() {
    let table = RawTable::new()
        .with_column("amount", RawColumn::text(["10", "20", "300"]))
        .unwrap()
        .with_column("other", RawColumn::text(["a", "b", "c"]))
        .unwrap();
    let mut casts = HashMap::new();
    casts.insert("amount".to_string(), "int8".to_string());
    casts.insert("missing".to_string(), "float".to_string());

    let result = ingest("src", &table, &casts, &CastConfig::default()).unwrap();
    assert_eq!(result.columns[0].dtype, Dtype::UInt16);
    let message = &result.errors["amount"];
    assert!(message.contains("int8"), "{}", message);
    assert_eq!(result.columns[0].error.as_deref(), Some(message.as_str()));
    assert!(result.columns[1].error.is_none());
    assert_eq!(result.errors.len(), 1);
}

#[test]
fn test_successful_force_cast() {
    let table = RawTable::new()
        .with_column("amount", RawColumn::text(["10", "20", "300"]))
        .unwrap();
    let mut casts = HashMap::new();
    casts.insert("amount".to_string(), "float".to_string());
    let result = ingest("src", &table, &casts, &CastConfig::default()).unwrap();
    assert_eq!(result.columns[0].dtype, Dtype::Float64);
    assert!(result.errors.is_empty());
}

#[test]
fn test_page_sorted_by_signed_column() {
    let result = ingest("src", &sample_table(), &no_casts(), &CastConfig::default()).unwrap();
    let request = PageRequest {
        sort_by: SortBy::Column("delta".into()),
        ascending: true,
        offset: 0,
        limit: 3,
    };
    let page = decode_page(&result.columns, &result.cells, &request).unwrap();
    assert_eq!(page.total_rows, 5);
    let deltas: Vec<&TypedValue> = page.rows.iter().filter_map(|r| r.get("delta")).collect();
    assert_eq!(
        deltas,
        vec![&TypedValue::Int(-5), &TypedValue::Int(-3), &TypedValue::Int(0)]
    );
    assert_eq!(page.rows[0].row_index, 0);
    assert_eq!(page.rows[1].row_index, 2);
}

#[test]
fn test_page_sorted_by_complex_magnitude_descending() {
    let result = ingest("src", &sample_table(), &no_casts(), &CastConfig::default()).unwrap();
    let request = PageRequest {
        sort_by: SortBy::parse("z"),
        ascending: false,
        offset: 0,
        limit: 1,
    };
    let page = decode_page(&result.columns, &result.cells, &request).unwrap();
    assert_eq!(
        page.rows[0].get("z"),
        Some(&TypedValue::Complex(Complex64::new(3.0, 4.0)))
    );
}

#[test]
fn test_row_index_paging() {
    let result = ingest("src", &sample_table(), &no_casts(), &CastConfig::default()).unwrap();
    let request = PageRequest::from_page(2, 2, SortBy::parse("row_index"), true).unwrap();
    let page = decode_page(&result.columns, &result.cells, &request).unwrap();
    let rows: Vec<u64> = page.rows.iter().map(|r| r.row_index).collect();
    assert_eq!(rows, vec![2, 3]);

    let request = PageRequest::from_page(1, 2, SortBy::RowIndex, false).unwrap();
    let page = decode_page(&result.columns, &result.cells, &request).unwrap();
    let rows: Vec<u64> = page.rows.iter().map(|r| r.row_index).collect();
    assert_eq!(rows, vec![4, 3]);

    let request = PageRequest::from_page(9, 2, SortBy::RowIndex, true).unwrap();
    let page = decode_page(&result.columns, &result.cells, &request).unwrap();
    assert!(page.rows.is_empty());
    assert_eq!(page.total_rows, 5);

    assert!(PageRequest::from_page(0, 10, SortBy::RowIndex, true).is_err());
}

#[test]
fn test_unknown_sort_column() {
    let result = ingest("src", &sample_table(), &no_casts(), &CastConfig::default()).unwrap();
    let request = PageRequest {
        sort_by: SortBy::Column("nope".into()),
        ..PageRequest::default()
    };
    let err = decode_page(&result.columns, &result.cells, &request).unwrap_err();
    assert!(matches!(err, CellcastError::UnknownColumn(name) if name == "nope"));
}

#[test]
fn test_decode_detects_gaps() {
    let mut result = ingest("src", &sample_table(), &no_casts(), &CastConfig::default()).unwrap();
    result.cells.remove(1);
    let err = decode_page(&result.columns, &result.cells, &PageRequest::default()).unwrap_err();
    assert!(matches!(err, CellcastError::CodecInvariantViolation(_)));
}

#[test]
fn test_ingest_into_store_then_read_back() {
    let mut store = MemoryStore::new();
    let errors = ingest_into(
        &mut store,
        "src",
        &sample_table(),
        &no_casts(),
        &CastConfig::default(),
    )
    .unwrap();
    assert!(errors.is_empty());

    let stored = store.load("src").unwrap();
    let page = decode_page(&stored.columns, &stored.cells, &PageRequest::default()).unwrap();
    assert_eq!(page.rows.len(), 5);
    assert_eq!(page.rows[4].get("name"), Some(&TypedValue::Text("a".into())));
}

#[test]
fn test_empty_table() {
    let result = ingest("src", &RawTable::new(), &no_casts(), &CastConfig::default()).unwrap();
    assert!(result.columns.is_empty());
    let page = decode_page(&result.columns, &result.cells, &PageRequest::default()).unwrap();
    assert_eq!(page.total_rows, 0);
}

#[test]
fn test_ingest_result_serializes_with_error_map() {
    let result = ingest("src", &sample_table(), &no_casts(), &CastConfig::default()).unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["columns"][1]["dtype"], "int8");
    assert!(json["errors"].as_object().unwrap().is_empty());
    assert!(json["columns"][0].get("error").is_none());
}

#[test]
fn test_json_roundtrip_keeps_nan_cells_decodable() {
    let result = ingest("src", &sample_table(), &no_casts(), &CastConfig::default()).unwrap();
    let json = serde_json::to_string(&result).unwrap();
    let back = IngestResult::from_json(&json).unwrap();
    let row = decode_row(&back.columns, &back.cells, 2).unwrap();
    assert!(matches!(row.get("score"), Some(TypedValue::Float(v)) if v.is_nan()));
}

#[test]
fn test_unknown_stored_dtype_is_unsupported_at_decode() {
    let result = ingest("src", &sample_table(), &no_casts(), &CastConfig::default()).unwrap();
    let json = serde_json::to_string(&result)
        .unwrap()
        .replace("\"dtype\":\"int8\"", "\"dtype\":\"decimal128\"");
    let err = IngestResult::from_json(&json).unwrap_err();
    assert!(matches!(err, CellcastError::UnsupportedDtypeAtDecode(key) if key == "decimal128"));

    assert!(matches!(
        IngestResult::from_json("{not json").unwrap_err(),
        CellcastError::SerdeJson(_)
    ));
}
