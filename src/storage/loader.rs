//! Bulk loading of staged CSV blobs into tables

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, instrument, warn};

use super::blob::BlobStore;
use super::error::{StagingError, StagingResult};
use super::schema::TableSchema;

/// What happens to rows already in the table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Keep existing rows
    Append,
    /// Replace existing rows
    #[default]
    Truncate,
}

/// One bulk load request
#[derive(Debug, Clone)]
pub struct LoadJob {
    /// Target table and its columns
    pub schema: TableSchema,
    /// How existing rows are treated
    pub write_mode: WriteMode,
    /// Malformed rows tolerated before the load is rejected
    pub max_bad_records: usize,
}

/// Result of a successful load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOutcome {
    /// Rows written to the table
    pub rows_loaded: usize,
    /// Malformed rows skipped within tolerance
    pub bad_records: usize,
}

/// Loads CSV bytes into a table
pub trait BulkTableLoader {
    /// Load `data` (a CSV with one header row) according to `job`
    fn load(&mut self, data: &[u8], job: &LoadJob) -> StagingResult<LoadOutcome>;
}

/// In-memory loader that validates every cell against the table schema
///
/// The header row is skipped, columns are matched by position and malformed rows are
/// dropped as long as their number stays within the job's tolerance. A rejected load
/// leaves the table untouched.
#[derive(Debug, Clone, Default)]
pub struct SchemaCheckingLoader {
    tables: HashMap<String, Vec<csv::StringRecord>>,
}

impl SchemaCheckingLoader {
    /// Create an empty loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows currently stored in `table`
    pub fn rows(&self, table: &str) -> &[csv::StringRecord] {
        self.tables.get(table).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl BulkTableLoader for SchemaCheckingLoader {
    #[instrument(skip(self, data, job), fields(table = %job.schema.table, bytes = data.len()))]
    fn load(&mut self, data: &[u8], job: &LoadJob) -> StagingResult<LoadOutcome> {
        let table = &job.schema.table;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(data);

        let mut good = Vec::new();
        let mut bad_records = 0;
        let mut first_error = None;

        for (line, record) in reader.records().enumerate() {
            let checked = record
                .map_err(|e| e.to_string())
                .and_then(|r| job.schema.check_row(&r).map(|()| r));
            match checked {
                Ok(row) => good.push(row),
                Err(reason) => {
                    // Line numbers count the skipped header row.
                    let description = format!("row {}: {}", line + 2, reason);
                    warn!(table = %table, "Bad record, {}", description);
                    first_error.get_or_insert(description);
                    bad_records += 1;
                }
            }
        }

        if bad_records > job.max_bad_records {
            return Err(StagingError::ToleranceExceeded {
                table: table.clone(),
                bad_records,
                max_bad_records: job.max_bad_records,
                first_error: first_error.unwrap_or_default(),
            });
        }

        let rows_loaded = good.len();
        let stored = self.tables.entry(table.clone()).or_default();
        if job.write_mode == WriteMode::Truncate {
            stored.clear();
        }
        stored.extend(good);

        info!("Loaded {} rows into {} ({} bad records skipped)", rows_loaded, table, bad_records);
        Ok(LoadOutcome { rows_loaded, bad_records })
    }
}

/// Upload bytes to the blob store under the table's file name, then load them from there
pub fn stage_bytes(
    data: &[u8],
    store: &dyn BlobStore,
    loader: &mut dyn BulkTableLoader,
    job: &LoadJob,
) -> StagingResult<LoadOutcome> {
    store.put(&job.schema.file_name, data)?;
    let staged = store.get(&job.schema.file_name)?;
    loader.load(&staged, job)
}

/// Upload a local extract to the blob store, then load it from there
pub fn stage_extract(
    path: &Path,
    store: &dyn BlobStore,
    loader: &mut dyn BulkTableLoader,
    job: &LoadJob,
) -> StagingResult<LoadOutcome> {
    let data = std::fs::read(path).map_err(|e| StagingError::io(path, e))?;
    info!("Uploading {} as {}", path.display(), job.schema.file_name);
    stage_bytes(&data, store, loader, job)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::standard_tables;

    fn registrations_job(write_mode: WriteMode, max_bad_records: usize) -> LoadJob {
        LoadJob { schema: standard_tables().remove(0), write_mode, max_bad_records }
    }

    const GOOD: &str = "visit_id,user_id,registered_at\n\
                        v1,u1,2024-01-01 09:05:00\n\
                        v2,u2,2024-01-01 10:05:00\n";

    #[test]
    fn test_header_is_skipped_and_rows_loaded() {
        let mut loader = SchemaCheckingLoader::new();
        let outcome = loader.load(GOOD.as_bytes(), &registrations_job(WriteMode::Truncate, 0)).unwrap();

        assert_eq!(outcome, LoadOutcome { rows_loaded: 2, bad_records: 0 });
        assert_eq!(&loader.rows("registrations")[0][0], "v1");
    }

    #[test]
    fn test_append_and_truncate() {
        let mut loader = SchemaCheckingLoader::new();
        loader.load(GOOD.as_bytes(), &registrations_job(WriteMode::Append, 0)).unwrap();
        loader.load(GOOD.as_bytes(), &registrations_job(WriteMode::Append, 0)).unwrap();
        assert_eq!(loader.rows("registrations").len(), 4);

        loader.load(GOOD.as_bytes(), &registrations_job(WriteMode::Truncate, 0)).unwrap();
        assert_eq!(loader.rows("registrations").len(), 2);
    }

    #[test]
    fn test_tolerance() {
        let data = format!("{}v3,u3,2024-01-01 9:05:00\n", GOOD);
        let mut loader = SchemaCheckingLoader::new();

        let rejected = loader.load(data.as_bytes(), &registrations_job(WriteMode::Truncate, 0));
        assert!(matches!(
            rejected,
            Err(StagingError::ToleranceExceeded { bad_records: 1, max_bad_records: 0, .. })
        ));
        assert!(loader.rows("registrations").is_empty());

        let outcome = loader.load(data.as_bytes(), &registrations_job(WriteMode::Truncate, 1)).unwrap();
        assert_eq!(outcome, LoadOutcome { rows_loaded: 2, bad_records: 1 });
    }

    #[test]
    fn test_stage_extract_round_trips_through_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let extract = dir.path().join("registrations.csv");
        std::fs::write(&extract, GOOD).unwrap();
        let store = crate::storage::LocalBlobStore::open(dir.path().join("bucket")).unwrap();
        let mut loader = SchemaCheckingLoader::new();

        let outcome =
            stage_extract(&extract, &store, &mut loader, &registrations_job(WriteMode::Truncate, 0))
                .unwrap();

        assert_eq!(outcome.rows_loaded, 2);
        assert_eq!(store.list().unwrap(), ["registrations.csv"]);
    }
}
