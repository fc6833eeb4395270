//! Where visits come from

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::error::StagingResult;
use super::extract::read_records_from_path;
use crate::types::{Registration, Visit};

/// Supplies the visit table a run is generated from
pub trait SessionSource {
    /// Load every visit
    fn load_visits(&self) -> StagingResult<Vec<Visit>>;

    /// Human readable description for logs
    fn describe(&self) -> String;
}

/// Visits read from a local sessions CSV
#[derive(Debug, Clone)]
pub struct CsvSessionSource {
    path: PathBuf,
}

impl CsvSessionSource {
    /// Read visits from `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the sessions file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionSource for CsvSessionSource {
    fn load_visits(&self) -> StagingResult<Vec<Visit>> {
        let (visits, skipped): (Vec<Visit>, usize) = read_records_from_path(&self.path)?;
        if skipped > 0 {
            warn!("Skipped {} unreadable session rows in {}", skipped, self.path.display());
        }
        info!("Loaded {} visits from {}", visits.len(), self.path.display());
        Ok(visits)
    }

    fn describe(&self) -> String {
        format!("sessions CSV {}", self.path.display())
    }
}

/// Read registrations written by an earlier run
pub fn read_registrations(path: &Path) -> StagingResult<Vec<Registration>> {
    let (registrations, skipped): (Vec<Registration>, usize) = read_records_from_path(path)?;
    if skipped > 0 {
        warn!("Skipped {} unreadable registration rows in {}", skipped, path.display());
    }
    Ok(registrations)
}

/// A fixed set of visits, mostly useful in tests
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionSource {
    visits: Vec<Visit>,
}

impl InMemorySessionSource {
    /// Serve `visits`
    pub fn new(visits: Vec<Visit>) -> Self {
        Self { visits }
    }
}

impl SessionSource for InMemorySessionSource {
    fn load_visits(&self) -> StagingResult<Vec<Visit>> {
        Ok(self.visits.clone())
    }

    fn describe(&self) -> String {
        format!("{} in-memory visits", self.visits.len())
    }
}
