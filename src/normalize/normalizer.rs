//! Row-level normalization of raw session extracts

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::metadata::coerce_metadata;
use super::repair::FieldRepair;
use super::timestamp::repair_timestamp;

/// Suffix of the column names used by the original session extracts
const LEGACY_SUFFIX: &str = "_et";

/// Errors that abort normalization of a batch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// A timestamp column is not present in the header
    #[error("required column '{column}' not found in header [{}]", header.join(", "))]
    MissingColumn {
        /// Column that was looked up
        column: String,
        /// Header that was searched
        header: Vec<String>,
    },
}

/// Which columns the normalizer touches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Columns holding timestamps; each must be present (a `_et` suffixed name also matches)
    pub timestamp_columns: Vec<String>,
    /// Column holding semi-structured metadata; skipped when absent from the header
    pub metadata_column: Option<String>,
    /// Malformed rows the warehouse loader tolerates
    pub max_bad_records: usize,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            timestamp_columns: vec!["visit_start_time".to_string(), "visit_end_time".to_string()],
            metadata_column: Some("session_metadata".to_string()),
            max_bad_records: 0,
        }
    }
}

/// Column positions resolved against a header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    /// Positions of the timestamp columns
    pub timestamps: Vec<usize>,
    /// Position of the metadata column, if present
    pub metadata: Option<usize>,
    /// Number of header columns
    pub width: usize,
}

impl ColumnLayout {
    /// Resolve configured column names against `header`
    pub fn resolve(config: &NormalizerConfig, header: &[String]) -> Result<Self, NormalizeError> {
        let timestamps = config
            .timestamp_columns
            .iter()
            .map(|column| {
                find_column(header, column).ok_or_else(|| NormalizeError::MissingColumn {
                    column: column.clone(),
                    header: header.to_vec(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let metadata = config.metadata_column.as_deref().and_then(|column| {
            let position = find_column(header, column);
            if position.is_none() {
                debug!("Metadata column '{}' not in header, skipping coercion", column);
            }
            position
        });

        Ok(Self { timestamps, metadata, width: header.len() })
    }
}

fn find_column(header: &[String], column: &str) -> Option<usize> {
    let legacy = format!("{}{}", column, LEGACY_SUFFIX);
    header
        .iter()
        .position(|name| name == column)
        .or_else(|| header.iter().position(|name| *name == legacy))
}

/// Result of normalizing one batch of rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedBatch {
    /// Header, unchanged
    pub header: Vec<String>,
    /// Rows in input order
    pub rows: Vec<Vec<String>>,
    /// Rows still holding at least one malformed value
    pub malformed_count: usize,
    /// Fields rewritten into canonical form
    pub repaired_fields: usize,
}

/// Repairs timestamp and metadata fields of raw session rows
///
/// Bad values never fail a batch: they are logged, forwarded unchanged and counted, so
/// the bulk loader's tolerance decides whether the load succeeds.
#[derive(Debug, Clone, Default)]
pub struct RecordNormalizer {
    config: NormalizerConfig,
    malformed_total: u64,
    repaired_total: u64,
}

impl RecordNormalizer {
    /// Create a normalizer for the configured columns
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config, malformed_total: 0, repaired_total: 0 }
    }

    /// The active configuration
    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Malformed rows seen over the normalizer's lifetime
    pub fn malformed_total(&self) -> u64 {
        self.malformed_total
    }

    /// Repaired fields over the normalizer's lifetime
    pub fn repaired_total(&self) -> u64 {
        self.repaired_total
    }

    /// Normalize a batch of rows sharing `header`
    pub fn normalize(
        &mut self,
        header: &[String],
        rows: Vec<Vec<String>>,
    ) -> Result<NormalizedBatch, NormalizeError> {
        self.normalize_lossy(header, rows, &[])
    }

    /// Normalize a batch where the rows at the sorted positions `lossy_rows` lost bytes while decoding
    ///
    /// Those rows are forwarded as decoded, without repairs, and counted malformed.
    #[instrument(skip_all, fields(rows = rows.len(), lossy = lossy_rows.len()))]
    pub fn normalize_lossy(
        &mut self,
        header: &[String],
        rows: Vec<Vec<String>>,
        lossy_rows: &[usize],
    ) -> Result<NormalizedBatch, NormalizeError> {
        let layout = ColumnLayout::resolve(&self.config, header)?;

        let mut malformed_count = 0;
        let mut repaired_fields = 0;
        let mut normalized = Vec::with_capacity(rows.len());

        for (line, row) in rows.into_iter().enumerate() {
            if lossy_rows.binary_search(&line).is_ok() {
                warn!(row = line, "Row was not valid UTF-8, passing it through");
                malformed_count += 1;
                normalized.push(row);
                continue;
            }
            let (row, repaired, malformed) = self.normalize_row(&layout, line, row);
            repaired_fields += repaired;
            if malformed {
                malformed_count += 1;
            }
            normalized.push(row);
        }

        self.malformed_total += malformed_count as u64;
        self.repaired_total += repaired_fields as u64;

        info!(
            "Normalized {} rows: {} fields repaired, {} rows malformed",
            normalized.len(),
            repaired_fields,
            malformed_count
        );

        Ok(NormalizedBatch {
            header: header.to_vec(),
            rows: normalized,
            malformed_count,
            repaired_fields,
        })
    }

    /// Returns the row, the number of repaired fields and whether it is still malformed
    fn normalize_row(
        &self,
        layout: &ColumnLayout,
        line: usize,
        mut row: Vec<String>,
    ) -> (Vec<String>, usize, bool) {
        if row.len() != layout.width {
            warn!(
                row = line,
                expected = layout.width,
                found = row.len(),
                "Row width does not match header, passing it through"
            );
            return (row, 0, true);
        }

        let mut repaired = 0;
        let mut malformed = false;
        let fields = layout
            .timestamps
            .iter()
            .map(|&i| (i, repair_timestamp as fn(&str) -> FieldRepair))
            .chain(layout.metadata.map(|i| (i, coerce_metadata as fn(&str) -> FieldRepair)));

        for (column, repair) in fields {
            match repair(&row[column]) {
                FieldRepair::Unchanged => {}
                FieldRepair::Repaired(value) => {
                    row[column] = value;
                    repaired += 1;
                }
                FieldRepair::PassThrough { reason } => {
                    warn!(row = line, column, value = %row[column], "{}", reason);
                    malformed = true;
                }
            }
        }

        (row, repaired, malformed)
    }
}
