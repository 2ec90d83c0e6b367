//! Tests for record export

use super::*;
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn test_flatten_nested_objects() {
    let record = json!({
        "id": "ENSG1",
        "target": {
            "gene_info": {"symbol": "BRAF"},
            "id": "t1"
        },
        "scores": [1, 2]
    });

    let flat = flatten(&record);
    assert_eq!(flat["id"], json!("ENSG1"));
    assert_eq!(flat["target.gene_info.symbol"], json!("BRAF"));
    assert_eq!(flat["target.id"], json!("t1"));
    // Arrays pass through untouched
    assert_eq!(flat["scores"], json!([1, 2]));
}

#[test]
fn test_flatten_non_object_record() {
    let flat = flatten(&json!("plain"));
    assert_eq!(flat["value"], json!("plain"));
}

#[test]
fn test_compress_lists() {
    let record = flatten(&json!({
        "names": ["a", "b", "c"],
        "counts": [1, 2],
        "mixed": [{"k": 1}, "x"],
        "scalar": "unchanged"
    }));

    let compressed = compress_lists(record);
    assert_eq!(compressed["names"], json!("a|b|c"));
    assert_eq!(compressed["counts"], json!("1|2"));
    assert_eq!(compressed["mixed"], json!("{\"k\":1}|x"));
    assert_eq!(compressed["scalar"], json!("unchanged"));
}

#[test]
fn test_write_ndjson() {
    let records = vec![json!({"id": 1}), json!({"id": 2})];
    let mut out = Vec::new();
    let written = write_ndjson(&records, &mut out).unwrap();

    assert_eq!(written, 2);
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines, vec![r#"{"id":1}"#, r#"{"id":2}"#]);
}

#[test]
fn test_write_ndjson_file_plain_and_gzip() {
    let dir = tempfile::tempdir().unwrap();
    let records = vec![json!({"id": 1}), json!({"id": 2}), json!({"id": 3})];

    let plain = dir.path().join("out.ndjson");
    assert_eq!(write_ndjson_file(&records, &plain, false).unwrap(), 3);
    let text = std::fs::read_to_string(&plain).unwrap();
    assert_eq!(text.lines().count(), 3);

    let compressed = dir.path().join("out.ndjson.gz");
    assert_eq!(write_ndjson_file(&records, &compressed, true).unwrap(), 3);

    // Valid gzip starts with 0x1f 0x8b and decodes back to the same lines
    let bytes = std::fs::read(&compressed).unwrap();
    assert_eq!(&bytes[..2], &[0x1f, 0x8b]);

    let mut decoded = String::new();
    let mut decoder = flate2::read::GzDecoder::new(bytes.as_slice());
    std::io::Read::read_to_string(&mut decoder, &mut decoded).unwrap();
    assert_eq!(decoded.lines().count(), 3);
    assert_eq!(decoded.lines().next(), Some(r#"{"id":1}"#));
}

#[test]
fn test_write_csv_flattens_and_compresses() {
    let records = vec![
        json!({"id": 1, "target": {"symbol": "BRAF"}, "tags": ["a", "b"]}),
        json!({"id": 2, "target": {"symbol": "EGFR"}, "tags": ["c"]}),
    ];

    let mut out = Vec::new();
    let written = write_csv(&records, &mut out).unwrap();
    assert_eq!(written, 2);

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    // Columns are sorted by name
    assert_eq!(lines[0], "id,tags,target.symbol");
    assert_eq!(lines[1], "1,a|b,BRAF");
    assert_eq!(lines[2], "2,c,EGFR");
}

#[test]
fn test_infer_schema_widens_types() {
    let records = vec![
        json!({"n": 1, "s": "x", "maybe": null}),
        json!({"n": 0.5, "s": 2, "maybe": true}),
    ];
    let schema = infer_schema(&records).unwrap();

    assert_eq!(
        schema.field_with_name("n").unwrap().data_type(),
        &DataType::Float64
    );
    // Conflicting scalar types widen to strings
    assert_eq!(
        schema.field_with_name("s").unwrap().data_type(),
        &DataType::Utf8
    );
    // Null merges with anything
    assert_eq!(
        schema.field_with_name("maybe").unwrap().data_type(),
        &DataType::Boolean
    );
}

#[test]
fn test_merge_schemas() {
    let first = infer_schema(&[json!({"a": 1})]).unwrap();
    let second = infer_schema(&[json!({"a": 0.5, "b": "x"})]).unwrap();
    let merged = merge_schemas(&first, &second);

    assert_eq!(
        merged.field_with_name("a").unwrap().data_type(),
        &DataType::Float64
    );
    assert!(merged.field_with_name("b").is_ok());
}

#[test]
fn test_json_to_arrow_empty() {
    let batch = json_to_arrow(&[], None).unwrap();
    assert_eq!(batch.num_rows(), 0);
}

#[test]
fn test_json_to_arrow_missing_fields_are_null() {
    let records = vec![json!({"a": 1, "b": "x"}), json!({"a": 2})];
    let batch = json_to_arrow(&records, None).unwrap();

    assert_eq!(batch.num_rows(), 2);
    let b_column = batch.column_by_name("b").unwrap();
    assert!(!b_column.is_null(0));
    assert!(b_column.is_null(1));
}

#[test]
fn test_json_to_arrow_list_column() {
    let records = vec![json!({"tags": ["a", "b"]}), json!({"tags": []})];
    let batch = json_to_arrow(&records, None).unwrap();

    let field = batch.schema().field_with_name("tags").unwrap().clone();
    assert!(matches!(field.data_type(), DataType::List(_)));
}

#[test]
fn test_write_parquet_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.parquet");

    let records = vec![
        json!({"id": 1, "assoc": {"score": 0.9}}),
        json!({"id": 2, "assoc": {"score": 0.1}}),
    ];
    let written = write_parquet_file(&records, &path, None).unwrap();
    assert_eq!(written, 2);

    let file = std::fs::File::open(&path).unwrap();
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .unwrap()
        .build()
        .unwrap();
    let batches: Vec<_> = reader.map(|b| b.unwrap()).collect();

    let rows: usize = batches.iter().map(arrow::record_batch::RecordBatch::num_rows).sum();
    assert_eq!(rows, 2);
    assert!(batches[0].column_by_name("assoc.score").is_some());
}

#[test]
fn test_parquet_options() {
    let options = ParquetOptions::new().uncompressed().with_row_group_size(512);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("opts.parquet");

    let written = write_parquet_file(&[json!({"id": 1})], &path, Some(&options)).unwrap();
    assert_eq!(written, 1);
}
