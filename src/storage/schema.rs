//! Warehouse table schemas
//!
//! Columns are matched by position, the way a CSV bulk load with a skipped header row
//! works. Every column is nullable: an empty cell is always accepted.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cell types understood by the loader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    /// Any text
    String,
    /// `YYYY-MM-DD HH:MM:SS[.ffffff]`
    Timestamp,
    /// Signed 64-bit integer
    Int64,
}

impl ColumnType {
    /// Check a non-empty cell against the type
    pub fn check(&self, cell: &str) -> Result<(), String> {
        let valid = match self {
            ColumnType::String => true,
            ColumnType::Timestamp => is_zero_padded(cell)
                && NaiveDateTime::parse_from_str(cell, "%Y-%m-%d %H:%M:%S%.f").is_ok(),
            ColumnType::Int64 => cell.trim().parse::<i64>().is_ok(),
        };
        if valid {
            Ok(())
        } else {
            Err(format!("'{}' is not a valid {}", cell, self))
        }
    }
}

// chrono accepts single-digit fields; the loader does not.
fn is_zero_padded(cell: &str) -> bool {
    let bytes = cell.as_bytes();
    bytes.len() >= 19
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes[10] == b' '
        && bytes[13] == b':'
        && bytes[16] == b':'
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::String => write!(f, "STRING"),
            ColumnType::Timestamp => write!(f, "TIMESTAMP"),
            ColumnType::Int64 => write!(f, "INT64"),
        }
    }
}

/// A named, typed column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Column name
    pub name: String,
    /// Cell type
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

/// A warehouse table and the CSV extract it is loaded from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name
    pub table: String,
    /// Name of the staged CSV blob
    pub file_name: String,
    /// Columns in load order
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    /// Create a schema from `(name, type)` pairs
    pub fn new(table: &str, file_name: &str, columns: &[(&str, ColumnType)]) -> Self {
        Self {
            table: table.to_string(),
            file_name: file_name.to_string(),
            columns: columns
                .iter()
                .map(|(name, column_type)| ColumnSchema {
                    name: name.to_string(),
                    column_type: *column_type,
                })
                .collect(),
        }
    }

    /// Check one data row, describing the first problem found
    pub fn check_row(&self, row: &csv::StringRecord) -> Result<(), String> {
        if row.len() != self.columns.len() {
            return Err(format!("expected {} columns, found {}", self.columns.len(), row.len()));
        }
        for (cell, column) in row.iter().zip(&self.columns) {
            if cell.is_empty() {
                continue;
            }
            column.column_type.check(cell).map_err(|e| format!("column {}: {}", column.name, e))?;
        }
        Ok(())
    }
}

/// Schemas of the registrations, sessions and transactions tables
pub fn standard_tables() -> Vec<TableSchema> {
    use ColumnType::{Int64, String, Timestamp};

    vec![
        TableSchema::new(
            "registrations",
            "registrations.csv",
            &[("visit_id", String), ("user_id", String), ("registered_at", Timestamp)],
        ),
        TableSchema::new(
            "sessions",
            "sessions.csv",
            &[
                ("visit_id", String),
                ("visit_start_time_et", Timestamp),
                ("visit_end_time_et", Timestamp),
                ("device_type", String),
                ("browser", String),
                ("pageview_count", Int64),
                ("spend_type", String),
                ("attributed_channel", String),
                ("attributed_subchannel", String),
                ("session_metadata", String),
            ],
        ),
        TableSchema::new(
            "transactions",
            "transactions.csv",
            &[
                ("order_id", String),
                ("visit_id", String),
                ("user_id", String),
                ("order_created_at", Timestamp),
                ("location_id", String),
                ("shipping_carrier", String),
                ("shipping_method", String),
                ("estimated_delivery_date", Timestamp),
                ("delivered_at", Timestamp),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_checks() {
        assert!(ColumnType::Timestamp.check("2024-03-05 09:05:07").is_ok());
        assert!(ColumnType::Timestamp.check("2024-03-05 9:05:07").is_err());
        assert!(ColumnType::Int64.check("42").is_ok());
        assert!(ColumnType::Int64.check("4.2").is_err());
        assert!(ColumnType::String.check("anything").is_ok());
    }

    #[test]
    fn test_row_checks_allow_nulls() {
        let tables = standard_tables();
        let registrations = &tables[0];

        let ok = csv::StringRecord::from(vec!["v1", "u1", ""]);
        let bad_time = csv::StringRecord::from(vec!["v1", "u1", "soon"]);
        let short = csv::StringRecord::from(vec!["v1", "u1"]);

        assert!(registrations.check_row(&ok).is_ok());
        assert!(registrations.check_row(&bad_time).unwrap_err().contains("registered_at"));
        assert!(registrations.check_row(&short).is_err());
    }

    #[test]
    fn test_standard_table_names() {
        let names: Vec<_> = standard_tables().into_iter().map(|t| t.table).collect();
        assert_eq!(names, ["registrations", "sessions", "transactions"]);
    }
}
