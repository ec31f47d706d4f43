use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, Int16Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use fletcher_ipc::{CompressionCodec, IpcFileOptions, read_table, write_table};
use fletcher_result::Error;
use fletcher_table::{DictionaryOptions, Table, decode_strings, encode_categoricals};
use tempfile::NamedTempFile;

fn sample_table() -> Table {
    let schema = Arc::new(Schema::new(vec![
        Field::new("zip", DataType::Int16, true),
        Field::new("ratio", DataType::Float64, false),
        Field::new("status", DataType::Utf8, true),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int16Array::from(vec![Some(10003), None, Some(11201)])),
        Arc::new(Float64Array::from(vec![0.1, 0.2, 0.3])),
        Arc::new(StringArray::from(vec![
            Some("Open"),
            Some("Closed"),
            None,
        ])),
    ];
    Table::try_new(schema, columns).expect("build table")
}

fn roundtrip(table: &Table, codec: CompressionCodec) -> Table {
    let tmp = NamedTempFile::new().expect("create tmp");
    write_table(tmp.path(), table, &IpcFileOptions { codec }).expect("write");
    read_table(tmp.path()).expect("read")
}

#[test]
fn uncompressed_roundtrip_preserves_schema_and_values() {
    let table = sample_table();
    let back = roundtrip(&table, CompressionCodec::None);
    assert_eq!(table.schema(), back.schema());
    assert_eq!(
        table.to_record_batch().expect("batch"),
        back.to_record_batch().expect("batch")
    );
}

#[test]
fn compressed_roundtrips_are_lossless() {
    let table = sample_table();
    for codec in [CompressionCodec::Lz4, CompressionCodec::Zstd] {
        let back = roundtrip(&table, codec);
        assert_eq!(table.schema(), back.schema(), "codec {codec}");
        assert_eq!(
            table.to_record_batch().expect("batch"),
            back.to_record_batch().expect("batch"),
            "codec {codec}"
        );
    }
}

#[test]
fn dictionary_columns_survive_the_container() {
    let table = sample_table();
    let encoded = encode_categoricals(&table, &DictionaryOptions::default()).expect("encode");
    let back = roundtrip(&encoded, CompressionCodec::Zstd);

    assert_eq!(encoded.schema(), back.schema());
    assert_eq!(
        back.schema().field(2).data_type(),
        &DataType::Dictionary(Box::new(DataType::Int8), Box::new(DataType::Utf8))
    );

    // Decoding after the round-trip reproduces the exact original strings.
    let decoded = decode_strings(back.column(2)).expect("decode");
    let decoded = decoded
        .as_any()
        .downcast_ref::<StringArray>()
        .expect("strings");
    assert_eq!(decoded.value(0), "Open");
    assert_eq!(decoded.value(1), "Closed");
    assert!(decoded.is_null(2));
}

#[test]
fn unwritable_path_is_an_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("missing").join("out.arrow");
    let err = write_table(&path, &sample_table(), &IpcFileOptions::default())
        .expect_err("create should fail");
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn table_metadata_roundtrips() {
    let table = sample_table()
        .with_metadata("source", "requests.csv")
        .expect("metadata");
    let back = roundtrip(&table, CompressionCodec::None);
    assert_eq!(
        back.schema().metadata().get("source").map(String::as_str),
        Some("requests.csv")
    );
}

#[test]
fn nullability_flags_match_null_presence_after_read() {
    let table = sample_table();
    let back = roundtrip(&table, CompressionCodec::None);
    let schema = back.schema();
    assert!(schema.field(0).is_nullable());
    assert!(!schema.field(1).is_nullable());
    assert!(schema.field(2).is_nullable());
}
