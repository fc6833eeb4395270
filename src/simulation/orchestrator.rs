//! Run orchestration
//!
//! [`RunOrchestrator`] wires the generator, normalizer and staging collaborators together
//! for each command the binary offers. Every run returns its [`RunStatistics`].

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::normalize::RecordNormalizer;
use crate::simulation::{DatasetGenerator, DatagenResult, RunStatistics};
use crate::storage::{
    normalize_file, read_registrations, read_table, stage_bytes, stage_extract, standard_tables,
    write_records_to_path, write_table, BlobStore, BulkTableLoader, LoadJob, RawTable,
    SessionSource, StagingError, TableSchema, WriteMode,
};
use crate::types::GeneratorConfig;

/// File name of the registrations extract
pub const REGISTRATIONS_FILE: &str = "registrations.csv";
/// File name of the orders extract
pub const TRANSACTIONS_FILE: &str = "transactions.csv";

/// Extracts to stage in one run
#[derive(Debug, Clone, Default)]
pub struct StageRequest {
    /// Raw sessions CSV, normalized before upload
    pub sessions: Option<PathBuf>,
    /// Registrations CSV
    pub registrations: Option<PathBuf>,
    /// Orders CSV
    pub transactions: Option<PathBuf>,
    /// How existing table rows are treated
    pub write_mode: WriteMode,
}

impl StageRequest {
    /// Whether nothing was asked for
    pub fn is_empty(&self) -> bool {
        self.sessions.is_none() && self.registrations.is_none() && self.transactions.is_none()
    }
}

/// Runs the binary's commands against one validated configuration
#[derive(Debug, Clone)]
pub struct RunOrchestrator {
    config: GeneratorConfig,
}

impl RunOrchestrator {
    /// Validate `config` and keep it for the runs
    pub fn new(config: GeneratorConfig) -> DatagenResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration runs use
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate registrations and orders into `output_dir`
    #[instrument(skip_all, fields(source = %source.describe(), output_dir = %output_dir.display()))]
    pub fn generate(
        &self,
        source: &dyn SessionSource,
        output_dir: &Path,
    ) -> DatagenResult<RunStatistics> {
        let visits = source.load_visits()?;
        fs::create_dir_all(output_dir).map_err(|e| StagingError::io(output_dir, e))?;

        let mut generator = DatasetGenerator::new(&self.config)?;
        let dataset = generator.generate(&visits);

        write_records_to_path(&output_dir.join(REGISTRATIONS_FILE), &dataset.registrations)?;
        write_records_to_path(&output_dir.join(TRANSACTIONS_FILE), &dataset.orders)?;

        Ok(dataset.statistics)
    }

    /// Generate registrations only
    #[instrument(skip_all, fields(source = %source.describe(), output = %output.display()))]
    pub fn registrations(
        &self,
        source: &dyn SessionSource,
        output: &Path,
    ) -> DatagenResult<RunStatistics> {
        let started = Instant::now();
        let visits = source.load_visits()?;

        let mut generator = DatasetGenerator::new(&self.config)?;
        let registrations = generator.generate_registrations(&visits);
        write_records_to_path(output, &registrations)?;

        Ok(RunStatistics {
            visits_read: visits.len(),
            inverted_visits: visits.iter().filter(|v| !v.is_well_formed()).count(),
            registrations: registrations.len(),
            duration: started.elapsed(),
            ..Default::default()
        })
    }

    /// Generate orders against registrations written by an earlier run
    #[instrument(skip_all, fields(source = %source.describe(), registrations = %registrations.display()))]
    pub fn orders(
        &self,
        source: &dyn SessionSource,
        registrations: &Path,
        output: &Path,
    ) -> DatagenResult<RunStatistics> {
        let started = Instant::now();
        let visits = source.load_visits()?;
        let registrations = read_registrations(registrations)?;
        info!("Read {} existing registrations", registrations.len());

        let mut generator = DatasetGenerator::new(&self.config)?;
        let (orders, mut stats) = generator.generate_orders(&visits, &registrations);
        write_records_to_path(output, &orders)?;

        stats.visits_read = visits.len();
        stats.inverted_visits = visits.iter().filter(|v| !v.is_well_formed()).count();
        stats.duration = started.elapsed();
        Ok(stats)
    }

    /// Normalize a raw extract into `output`
    pub fn normalize(&self, input: &Path, output: &Path) -> DatagenResult<RunStatistics> {
        let started = Instant::now();
        let mut normalizer = RecordNormalizer::new(self.config.normalizer.clone());
        let batch = normalize_file(input, output, &mut normalizer)?;

        if batch.malformed_count > 0 {
            warn!(
                "{} of {} rows in {} still hold malformed values",
                batch.malformed_count,
                batch.rows.len(),
                input.display()
            );
        }

        Ok(RunStatistics {
            normalized_rows: batch.rows.len(),
            repaired_fields: batch.repaired_fields,
            malformed_rows: batch.malformed_count,
            duration: started.elapsed(),
            ..Default::default()
        })
    }

    /// Upload the requested extracts and load them into their tables
    ///
    /// Sessions are normalized in memory first; the loader's tolerance is the configured
    /// `max_bad_records`. The first table that fails aborts the run.
    #[instrument(skip_all, fields(write_mode = ?request.write_mode))]
    pub fn stage(
        &self,
        request: &StageRequest,
        store: &dyn BlobStore,
        loader: &mut dyn BulkTableLoader,
    ) -> DatagenResult<RunStatistics> {
        let started = Instant::now();
        let mut stats = RunStatistics::new();

        if request.is_empty() {
            warn!("Nothing to stage");
        }

        if let Some(path) = &request.sessions {
            let job = self.job("sessions", request.write_mode)?;
            let mut normalizer = RecordNormalizer::new(self.config.normalizer.clone());
            let context = path.display().to_string();

            let file = File::open(path).map_err(|e| StagingError::io(path, e))?;
            let raw = read_table(file, &context)?;
            let batch = normalizer.normalize_lossy(&raw.header, raw.rows, &raw.lossy_rows)?;
            stats.normalized_rows += batch.rows.len();
            stats.repaired_fields += batch.repaired_fields;
            stats.malformed_rows += batch.malformed_count;

            let mut data = Vec::new();
            write_table(&mut data, &RawTable::new(batch.header, batch.rows), &context)?;
            let outcome = stage_bytes(&data, store, loader, &job)?;
            stats.loaded_tables.push((job.schema.table.clone(), outcome.rows_loaded));
        }

        for (table, path) in [
            ("registrations", &request.registrations),
            ("transactions", &request.transactions),
        ] {
            if let Some(path) = path {
                let job = self.job(table, request.write_mode)?;
                let outcome = stage_extract(path, store, loader, &job)?;
                stats.loaded_tables.push((job.schema.table.clone(), outcome.rows_loaded));
            }
        }

        stats.duration = started.elapsed();
        Ok(stats)
    }

    fn job(&self, table: &str, write_mode: WriteMode) -> DatagenResult<LoadJob> {
        let schema: TableSchema = standard_tables()
            .into_iter()
            .find(|schema| schema.table == table)
            .ok_or_else(|| StagingError::UnknownTable { table: table.to_string() })?;
        Ok(LoadJob { schema, write_mode, max_bad_records: self.config.normalizer.max_bad_records })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemorySessionSource, LocalBlobStore, SchemaCheckingLoader};
    use crate::types::{parse_timestamp, Visit, VisitId};
    use chrono::Duration;

    fn source(n: usize) -> InMemorySessionSource {
        let base = parse_timestamp("2024-05-06 08:00:00").unwrap();
        InMemorySessionSource::new(
            (0..n)
                .map(|i| {
                    let start = base + Duration::minutes(i as i64 * 11);
                    Visit::new(VisitId::from(format!("v{}", i)), start, start + Duration::minutes(30))
                })
                .collect(),
        )
    }

    fn orchestrator() -> RunOrchestrator {
        RunOrchestrator::new(GeneratorConfig {
            seed: Some(5),
            registration_count: 50,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = GeneratorConfig { registration_count: 0, ..Default::default() };
        assert!(RunOrchestrator::new(config).is_err());
    }

    #[test]
    fn test_generate_then_stage() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator();

        let generated = orchestrator.generate(&source(200), dir.path()).unwrap();
        assert_eq!(generated.registrations, 50);

        let store = LocalBlobStore::open(dir.path().join("bucket")).unwrap();
        let mut loader = SchemaCheckingLoader::new();
        let request = StageRequest {
            registrations: Some(dir.path().join(REGISTRATIONS_FILE)),
            transactions: Some(dir.path().join(TRANSACTIONS_FILE)),
            ..Default::default()
        };
        let staged = orchestrator.stage(&request, &store, &mut loader).unwrap();

        assert_eq!(
            staged.loaded_tables,
            vec![
                ("registrations".to_string(), 50),
                ("transactions".to_string(), generated.total_orders()),
            ]
        );
        assert_eq!(loader.rows("registrations").len(), 50);
    }

    #[test]
    fn test_stage_normalizes_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("sessions.csv");
        fs::write(
            &raw,
            "visit_id,visit_start_time_et,visit_end_time_et,device_type,browser,pageview_count,\
             spend_type,attributed_channel,attributed_subchannel,session_metadata\n\
             v1,2024-05-06 9:00:00,2024-05-06 9:30:00,mobile,safari,4,free,search,brand,\
             \"{'device': 'mobile'}\"\n",
        )
        .unwrap();

        let store = LocalBlobStore::open(dir.path().join("bucket")).unwrap();
        let mut loader = SchemaCheckingLoader::new();
        let request = StageRequest { sessions: Some(raw), ..Default::default() };
        let stats = orchestrator().stage(&request, &store, &mut loader).unwrap();

        assert_eq!(stats.normalized_rows, 1);
        assert_eq!(stats.repaired_fields, 3);
        assert_eq!(stats.malformed_rows, 0);
        assert_eq!(store.list().unwrap(), ["sessions.csv"]);
    }
}
