//! Crate-level error type
//!
//! Per-record problems (a timestamp that cannot be repaired, a bad metadata cell) are not
//! errors: they are logged, counted and passed through. What ends up here aborts a run.

use thiserror::Error;

use crate::normalize::NormalizeError;
use crate::storage::StagingError;
use crate::types::{ConfigError, ConfigValidationError};

/// Errors that can abort a generation, normalization or staging run
#[derive(Debug, Error)]
pub enum DatagenError {
    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Configuration failed validation
    #[error("Configuration validation failed: {0}")]
    Validation(#[from] ConfigValidationError),

    /// A batch could not be normalized
    #[error("Normalization failed: {0}")]
    Normalize(#[from] NormalizeError),

    /// Reading, writing or loading extracts failed
    #[error("Staging failed: {0}")]
    Staging(#[from] StagingError),

    /// The generator could not be set up or produce data
    #[error("Generation failed: {0}")]
    Generation(String),
}

impl DatagenError {
    /// Create a generation error
    pub fn generation_error(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    /// Whether retrying the run with the same configuration may succeed
    ///
    /// I/O failures can be transient; everything else fails again on the same input.
    pub fn is_recoverable(&self) -> bool {
        match self {
            DatagenError::Config(ConfigError::ReadError(_)) => true,
            DatagenError::Config(_) => false,
            DatagenError::Validation(_) => false,
            DatagenError::Normalize(_) => false,
            DatagenError::Staging(StagingError::Io { .. }) => true,
            DatagenError::Staging(_) => false,
            DatagenError::Generation(_) => false,
        }
    }

    /// Get the error category
    pub fn category(&self) -> &'static str {
        match self {
            DatagenError::Config(_) | DatagenError::Validation(_) => "Configuration",
            DatagenError::Normalize(_) => "Normalization",
            DatagenError::Staging(StagingError::ToleranceExceeded { .. }) => "Load",
            DatagenError::Staging(_) => "Staging",
            DatagenError::Generation(_) => "Generation",
        }
    }
}

/// Result type for run operations
pub type DatagenResult<T> = Result<T, DatagenError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_creation() {
        let error = DatagenError::generation_error("empty shipping catalog");
        assert!(matches!(error, DatagenError::Generation(_)));
        assert_eq!(error.to_string(), "Generation failed: empty shipping catalog");
    }

    #[test]
    fn test_conversions() {
        let source = io::Error::new(io::ErrorKind::NotFound, "gone");
        let error: DatagenError = StagingError::io("sessions.csv", source).into();
        assert!(matches!(error, DatagenError::Staging(StagingError::Io { .. })));
        assert!(error.is_recoverable());

        let error: DatagenError = ConfigValidationError::InvalidLocationCount(0).into();
        assert_eq!(
            error.to_string(),
            "Configuration validation failed: Location count must be greater than 0, got 0"
        );
    }

    #[test]
    fn test_recoverability_and_categories() {
        let validation: DatagenError = ConfigValidationError::EmptyShippingCatalog.into();
        assert!(!validation.is_recoverable());
        assert_eq!(validation.category(), "Configuration");

        let io_error = StagingError::io("x.csv", io::Error::new(io::ErrorKind::Other, "busy"));
        let staging: DatagenError = io_error.into();
        assert!(staging.is_recoverable());
        assert_eq!(staging.category(), "Staging");

        let rejected: DatagenError = StagingError::ToleranceExceeded {
            table: "sessions".to_string(),
            bad_records: 3,
            max_bad_records: 0,
            first_error: "row 2".to_string(),
        }
        .into();
        assert!(!rejected.is_recoverable());
        assert_eq!(rejected.category(), "Load");

        let missing: DatagenError = NormalizeError::MissingColumn {
            column: "visit_start_time".to_string(),
            header: vec![],
        }
        .into();
        assert_eq!(missing.category(), "Normalization");
    }
}
