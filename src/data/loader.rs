use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray,
};
use arrow::datatypes::DataType;
use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, info};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{CellValue, Revision, RevisionTable};
use crate::error::LoadError;

/// Unique row key every table must carry.
pub const KEY_COLUMN: &str = "revision_id";
/// Revision timestamp column.
pub const TIMESTAMP_COLUMN: &str = "timestamp";
/// `YYYY-MM-DDTHH:MM:SSZ`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

const CSV_DELIMITER: u8 = b';';
const CSV_QUOTE: u8 = b'|';

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load one table per entity from `data_dir`, in the given order.
///
/// Entity names must be distinct. The first entity that fails aborts the
/// whole load.
pub fn load_tables(data_dir: &Path, entities: &[String]) -> Result<Vec<RevisionTable>, LoadError> {
    let mut seen = BTreeSet::new();
    for entity in entities {
        if !seen.insert(entity.as_str()) {
            return Err(LoadError::data_format(entity, "entity requested more than once"));
        }
    }

    entities
        .iter()
        .map(|entity| load_entity(data_dir, entity))
        .collect()
}

/// Locate and parse the table of a single entity.
pub fn load_entity(data_dir: &Path, entity: &str) -> Result<RevisionTable, LoadError> {
    let path = locate(data_dir, entity).ok_or_else(|| {
        LoadError::data_format(
            entity,
            format!(
                "no {entity}.csv or {entity}.parquet under {}",
                data_dir.display()
            ),
        )
    })?;

    info!("Loading revisions for {entity} from {}", path.display());
    let table = load_file(&path, entity)
        .map_err(|e| LoadError::data_format(entity, format!("{}: {e:#}", path.display())))?;
    info!("Loaded {} revisions for {entity}", table.len());
    Ok(table)
}

/// Parse a revision table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – `;`-delimited, `|`-quoted, with a header row
/// * `.parquet` – same column names; `timestamp` stored as text
pub fn load_file(path: &Path, entity: &str) -> Result<RevisionTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path, entity),
        "parquet" | "pq" => load_parquet(path, entity),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

/// `<entity>.csv` wins over `<entity>.parquet` when both exist.
fn locate(data_dir: &Path, entity: &str) -> Option<PathBuf> {
    ["csv", "parquet"]
        .iter()
        .map(|ext| data_dir.join(format!("{entity}.{ext}")))
        .find(|p| p.is_file())
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let dt = NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT)
        .with_context(|| format!("'{s}' does not match {TIMESTAMP_FORMAT}"))?;
    Ok(dt.and_utc())
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, `;` between fields and `|`
/// around fields that contain the delimiter:
///   `revision_id;page_id;page_title;contributor_id;timestamp`
///   `1;10;|Main; Page|;3;2017-01-04T10:00:00Z`
/// Columns other than the key and timestamp are kept as typed cells.
fn load_csv(path: &Path, entity: &str) -> Result<RevisionTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(CSV_DELIMITER)
        .quote(CSV_QUOTE)
        .from_path(path)
        .context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let key_idx = headers
        .iter()
        .position(|h| h == KEY_COLUMN)
        .with_context(|| format!("CSV missing '{KEY_COLUMN}' column"))?;
    let ts_idx = headers
        .iter()
        .position(|h| h == TIMESTAMP_COLUMN)
        .with_context(|| format!("CSV missing '{TIMESTAMP_COLUMN}' column"))?;

    let mut revisions = Vec::new();

    for result in reader.records() {
        let record = result.context("reading CSV record")?;
        // 1-based file line, header included
        let line = record.position().map_or(0, |p| p.line());

        let key = record.get(key_idx).unwrap_or("").trim();
        let id = key
            .parse::<i64>()
            .with_context(|| format!("CSV line {line}: {KEY_COLUMN} '{key}' is not an integer"))?;
        let timestamp = parse_timestamp(record.get(ts_idx).unwrap_or(""))
            .with_context(|| format!("CSV line {line}"))?;

        let mut fields = BTreeMap::new();
        for (col_idx, value) in record.iter().enumerate() {
            if col_idx == key_idx || col_idx == ts_idx {
                continue;
            }
            if let Some(col_name) = headers.get(col_idx) {
                fields.insert(col_name.clone(), guess_cell_type(value));
            }
        }

        revisions.push(Revision {
            id,
            timestamp,
            fields,
        });
    }

    debug!("{entity}: {} CSV rows, columns {headers:?}", revisions.len());
    RevisionTable::new(entity, revisions, headers)
}

fn guess_cell_type(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet revision table.
///
/// Expected schema:
/// - `revision_id`: Int64 or Int32
/// - `timestamp`: Utf8 / LargeUtf8 in `YYYY-MM-DDTHH:MM:SSZ`
/// - Any other columns are kept as cells (strings, ints, floats, bools)
fn load_parquet(path: &Path, entity: &str) -> Result<RevisionTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let schema = builder.schema().clone();
    let column_names: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();

    // Zero-row files yield no batches, so check the file schema.
    let key_idx = schema
        .index_of(KEY_COLUMN)
        .map_err(|_| anyhow::anyhow!("Parquet file missing '{KEY_COLUMN}' column"))?;
    let ts_idx = schema
        .index_of(TIMESTAMP_COLUMN)
        .map_err(|_| anyhow::anyhow!("Parquet file missing '{TIMESTAMP_COLUMN}' column"))?;
    let other_cols: Vec<(usize, String)> = schema
        .fields()
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != key_idx && *i != ts_idx)
        .map(|(i, f)| (i, f.name().clone()))
        .collect();

    let reader = builder.build().context("building parquet reader")?;
    let mut revisions = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let key_col = batch.column(key_idx);
        let ts_col = batch.column(ts_idx);

        for row in 0..batch.num_rows() {
            let id = extract_key(key_col, row)
                .with_context(|| format!("Row {row}: failed to read '{KEY_COLUMN}'"))?;
            let timestamp = extract_timestamp(ts_col, row)
                .with_context(|| format!("Row {row}: failed to read '{TIMESTAMP_COLUMN}'"))?;

            let mut fields = BTreeMap::new();
            for (col_idx, col_name) in &other_cols {
                fields.insert(col_name.clone(), extract_cell_value(batch.column(*col_idx), row));
            }

            revisions.push(Revision {
                id,
                timestamp,
                fields,
            });
        }
    }

    debug!("{entity}: {} parquet rows", revisions.len());
    RevisionTable::new(entity, revisions, column_names)
}

// -- Parquet / Arrow helpers --

fn extract_key(col: &Arc<dyn Array>, row: usize) -> Result<i64> {
    if col.is_null(row) {
        bail!("null row key");
    }
    if let Some(arr) = col.as_any().downcast_ref::<Int64Array>() {
        Ok(arr.value(row))
    } else if let Some(arr) = col.as_any().downcast_ref::<Int32Array>() {
        Ok(arr.value(row) as i64)
    } else {
        bail!("expected Int64 or Int32 key column, got {:?}", col.data_type())
    }
}

fn extract_timestamp(col: &Arc<dyn Array>, row: usize) -> Result<DateTime<Utc>> {
    if col.is_null(row) {
        bail!("null timestamp");
    }
    let text = match col.data_type() {
        DataType::Utf8 => col.as_string::<i32>().value(row),
        DataType::LargeUtf8 => col.as_string::<i64>().value(row),
        other => bail!("expected Utf8 timestamp column, got {other:?}"),
    };
    parse_timestamp(text)
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell_value(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    let any = col.as_any();
    match col.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map_or(CellValue::Null, |a| CellValue::String(a.value(row).to_string())),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map_or(CellValue::Null, |a| CellValue::Integer(a.value(row) as i64)),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map_or(CellValue::Null, |a| CellValue::Integer(a.value(row))),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map_or(CellValue::Null, |a| CellValue::Float(a.value(row) as f64)),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map_or(CellValue::Null, |a| CellValue::Float(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map_or(CellValue::Null, |a| CellValue::Bool(a.value(row))),
        other => CellValue::String(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    const HEADER: &str = "revision_id;page_id;page_title;contributor_id;timestamp";

    fn write(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn test_load_csv_with_pipe_quotes() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "cocktails.csv",
            &format!(
                "{HEADER}\n\
                 2;10;|Mojito; classic|;5;2017-02-01T08:00:00Z\n\
                 1;10;Mojito;;2017-01-04T10:00:00Z\n"
            ),
        );

        let table = load_entity(dir.path(), "cocktails").unwrap();
        assert_eq!(table.entity, "cocktails");
        assert_eq!(table.len(), 2);
        // sorted by timestamp, not by file order
        assert_eq!(table.revisions[0].id, 1);
        assert_eq!(
            table.revisions[1].fields["page_title"],
            CellValue::String("Mojito; classic".to_string())
        );
        assert_eq!(table.revisions[0].fields["contributor_id"], CellValue::Null);
        assert!(table.has_column("timestamp"));
        assert!(!table.revisions[0].fields.contains_key("timestamp"));
    }

    #[test]
    fn test_missing_timestamp_column_names_entity() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "broken.csv", "revision_id;page_id\n1;2\n");

        let err = load_entity(dir.path(), "broken").unwrap_err();
        match &err {
            LoadError::DataFormat { entity, reason } => {
                assert_eq!(entity, "broken");
                assert!(reason.contains("timestamp"), "{reason}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_bad_timestamp_is_data_format_error() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "w.csv",
            &format!("{HEADER}\n1;1;A;1;2017-01-04 10:00:00\n"),
        );
        let err = load_entity(dir.path(), "w").unwrap_err();
        assert!(matches!(err, LoadError::DataFormat { ref entity, .. } if entity == "w"));
    }

    #[test]
    fn test_bad_row_reports_file_line() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "w.csv",
            &format!("{HEADER}\n1;1;A;1;2017-01-04T10:00:00Z\n2;1;A;1;yesterday\n"),
        );
        let err = load_entity(dir.path(), "w").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("CSV line 3"), "{message}");
    }

    #[test]
    fn test_duplicate_revision_id_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "w.csv",
            &format!(
                "{HEADER}\n1;1;A;1;2017-01-04T10:00:00Z\n1;1;A;1;2017-01-05T10:00:00Z\n"
            ),
        );
        let err = load_entity(dir.path(), "w").unwrap_err();
        assert!(err.to_string().contains("duplicate revision_id 1"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_entity(dir.path(), "nowhere").unwrap_err();
        assert!(err.to_string().contains("nowhere.csv"));
    }

    #[test]
    fn test_load_tables_keeps_order_and_stops_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let row = "1;1;A;1;2017-01-04T10:00:00Z";
        write(dir.path(), "b.csv", &format!("{HEADER}\n{row}\n"));
        write(dir.path(), "a.csv", &format!("{HEADER}\n{row}\n"));

        let names = vec!["b".to_string(), "a".to_string()];
        let tables = load_tables(dir.path(), &names).unwrap();
        let loaded: Vec<&str> = tables.iter().map(|t| t.entity.as_str()).collect();
        assert_eq!(loaded, vec!["b", "a"]);

        let names = vec!["a".to_string(), "missing".to_string()];
        assert!(load_tables(dir.path(), &names).is_err());
    }

    #[test]
    fn test_repeated_entity_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.csv", &format!("{HEADER}\n1;1;A;1;2017-01-04T10:00:00Z\n"));

        let names = vec!["a".to_string(), "a".to_string()];
        match load_tables(dir.path(), &names).unwrap_err() {
            LoadError::DataFormat { entity, reason } => {
                assert_eq!(entity, "a");
                assert!(reason.contains("more than once"), "{reason}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_load_parquet() {
        let dir = tempfile::tempdir().unwrap();
        let schema = Arc::new(Schema::new(vec![
            Field::new("revision_id", DataType::Int64, false),
            Field::new("contributor_id", DataType::Int64, true),
            Field::new("timestamp", DataType::Utf8, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![5, 6])),
                Arc::new(Int64Array::from(vec![Some(1), None])),
                Arc::new(StringArray::from(vec![
                    "2018-06-01T00:00:00Z",
                    "2018-05-01T00:00:00Z",
                ])),
            ],
        )
        .unwrap();
        let file = std::fs::File::create(dir.path().join("pq_wiki.parquet")).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_entity(dir.path(), "pq_wiki").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.revisions[0].id, 6);
        assert_eq!(table.revisions[0].fields["contributor_id"], CellValue::Null);
        assert_eq!(table.revisions[1].fields["contributor_id"], CellValue::Integer(1));
        assert!(table.has_column("contributor_id"));
    }

    #[test]
    fn test_empty_parquet_still_needs_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let schema = Arc::new(Schema::new(vec![
            Field::new("revision_id", DataType::Int64, false),
            Field::new("page_id", DataType::Int64, false),
        ]));
        let file = std::fs::File::create(dir.path().join("hollow.parquet")).unwrap();
        ArrowWriter::try_new(file, schema, None).unwrap().close().unwrap();

        match load_entity(dir.path(), "hollow").unwrap_err() {
            LoadError::DataFormat { entity, reason } => {
                assert_eq!(entity, "hollow");
                assert!(reason.contains("timestamp"), "{reason}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
