//! CSV extracts on disk
//!
//! Typed records go through serde; raw tables are kept as header plus string rows so
//! that the normalizer can forward malformed values byte for byte.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

use super::error::{StagingError, StagingResult};
use crate::normalize::{NormalizedBatch, RecordNormalizer};

/// Header plus string rows of a CSV extract
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    /// Column names
    pub header: Vec<String>,
    /// Data rows, possibly of uneven width
    pub rows: Vec<Vec<String>>,
    /// Positions in `rows` of rows that were not valid UTF-8 and were decoded lossily
    pub lossy_rows: Vec<usize>,
}

impl RawTable {
    /// Table with every row decoded as is
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { header, rows, lossy_rows: Vec::new() }
    }
}

/// Deserialize every row of a CSV stream
///
/// Rows that fail to deserialize are skipped and logged; the number skipped is returned
/// alongside the records.
pub fn read_records<T, R>(reader: R, context: &str) -> StagingResult<(Vec<T>, usize)>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut records = Vec::new();
    let mut skipped = 0;

    for (line, result) in reader.deserialize::<T>().enumerate() {
        match result {
            Ok(record) => records.push(record),
            Err(e) if is_row_error(&e) => {
                warn!(context, row = line + 1, "Skipping unreadable row: {}", e);
                skipped += 1;
            }
            Err(e) => return Err(StagingError::csv(context, e)),
        }
    }

    debug!(context, rows = records.len(), skipped, "Read records");
    Ok((records, skipped))
}

/// Deserialize a CSV file
pub fn read_records_from_path<T: DeserializeOwned>(path: &Path) -> StagingResult<(Vec<T>, usize)> {
    let file = File::open(path).map_err(|e| StagingError::io(path, e))?;
    read_records(file, &path.display().to_string())
}

/// Serialize records with a header row, returning the number written
pub fn write_records<T, W>(writer: W, records: &[T], context: &str) -> StagingResult<usize>
where
    T: Serialize,
    W: Write,
{
    let mut writer = csv::Writer::from_writer(writer);
    for record in records {
        writer.serialize(record).map_err(|e| StagingError::csv(context, e))?;
    }
    writer
        .flush()
        .map_err(|e| StagingError::csv(context, csv::Error::from(e)))?;
    Ok(records.len())
}

/// Serialize records into a CSV file
pub fn write_records_to_path<T: Serialize>(path: &Path, records: &[T]) -> StagingResult<usize> {
    let file = File::create(path).map_err(|e| StagingError::io(path, e))?;
    let written = write_records(file, records, &path.display().to_string())?;
    info!("Wrote {} rows to {}", written, path.display());
    Ok(written)
}

/// Read a CSV stream as raw strings
///
/// A row that is not valid UTF-8 does not fail the stream: it is decoded lossily and its
/// position recorded in [`RawTable::lossy_rows`].
pub fn read_table<R: Read>(reader: R, context: &str) -> StagingResult<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut records = reader.byte_records();

    let header = match records.next() {
        Some(record) => {
            let (header, lossy) = decode_record(&record.map_err(|e| StagingError::csv(context, e))?);
            if lossy {
                warn!(context, "Header is not valid UTF-8, decoding it lossily");
            }
            header
        }
        None => return Err(StagingError::MissingHeader { context: context.to_string() }),
    };

    let mut table = RawTable::new(header, Vec::new());
    for record in records {
        let record = record.map_err(|e| StagingError::csv(context, e))?;
        let (row, lossy) = decode_record(&record);
        if lossy {
            // Line numbers count the header row.
            warn!(context, line = table.rows.len() + 2, "Row is not valid UTF-8, decoding it lossily");
            table.lossy_rows.push(table.rows.len());
        }
        table.rows.push(row);
    }

    Ok(table)
}

/// Decode every field, reporting whether any of them needed replacement characters
fn decode_record(record: &csv::ByteRecord) -> (Vec<String>, bool) {
    let mut lossy = false;
    let fields: Vec<String> = record
        .iter()
        .map(|field| match std::str::from_utf8(field) {
            Ok(text) => text.to_string(),
            Err(_) => {
                lossy = true;
                String::from_utf8_lossy(field).into_owned()
            }
        })
        .collect();
    (fields, lossy)
}

/// Write a raw table, keeping uneven rows as they are
pub fn write_table<W: Write>(writer: W, table: &RawTable, context: &str) -> StagingResult<()> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    writer
        .write_record(&table.header)
        .map_err(|e| StagingError::csv(context, e))?;
    for row in &table.rows {
        writer.write_record(row).map_err(|e| StagingError::csv(context, e))?;
    }
    writer
        .flush()
        .map_err(|e| StagingError::csv(context, csv::Error::from(e)))
}

/// Normalize a CSV file into another one
#[instrument(skip(normalizer), fields(input = %input.display(), output = %output.display()))]
pub fn normalize_file(
    input: &Path,
    output: &Path,
    normalizer: &mut RecordNormalizer,
) -> StagingResult<NormalizedBatch> {
    let file = File::open(input).map_err(|e| StagingError::io(input, e))?;
    let raw = read_table(file, &input.display().to_string())?;

    let batch = normalizer.normalize_lossy(&raw.header, raw.rows, &raw.lossy_rows)?;

    let table = RawTable::new(batch.header.clone(), batch.rows.clone());
    let file = File::create(output).map_err(|e| StagingError::io(output, e))?;
    write_table(file, &table, &output.display().to_string())?;

    Ok(batch)
}

/// Whether a CSV error concerns a single row rather than the whole stream
fn is_row_error(error: &csv::Error) -> bool {
    matches!(error.kind(), csv::ErrorKind::Deserialize { .. } | csv::ErrorKind::Utf8 { .. })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Visit;

    #[test]
    fn test_unreadable_rows_are_skipped() {
        let data = "visit_id,visit_start_time,visit_end_time\n\
                    v1,2024-01-01 09:00:00,2024-01-01 09:30:00\n\
                    v2,not a time,2024-01-01 09:30:00\n";

        let (visits, skipped): (Vec<Visit>, usize) = read_records(data.as_bytes(), "test").unwrap();

        assert_eq!(visits.len(), 1);
        assert_eq!(skipped, 1);
    }

    #[test]
    fn test_raw_table_keeps_uneven_rows() {
        let data = "a,b,c\n1,2,3\n4,5\n";

        let table = read_table(data.as_bytes(), "test").unwrap();
        let mut out = Vec::new();
        write_table(&mut out, &table, "test").unwrap();

        assert_eq!(table.rows[1], vec!["4", "5"]);
        assert_eq!(String::from_utf8(out).unwrap(), data);
    }

    #[test]
    fn test_invalid_utf8_row_is_decoded_lossily() {
        let mut data = b"a,b\n1,2\n".to_vec();
        data.extend_from_slice(b"3,\xFF\xFE\n5,6\n");

        let table = read_table(data.as_slice(), "test").unwrap();

        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.lossy_rows, vec![1]);
        assert_eq!(table.rows[1], vec!["3".to_string(), "\u{FFFD}\u{FFFD}".to_string()]);
        assert_eq!(table.rows[2], vec!["5", "6"]);
    }

    #[test]
    fn test_empty_stream_has_no_header() {
        assert!(matches!(
            read_table("".as_bytes(), "empty"),
            Err(StagingError::MissingHeader { .. })
        ));
    }
}
