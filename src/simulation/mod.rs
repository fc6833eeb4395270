//! Run orchestration and the ambient pieces around it
//!
//! - **RunOrchestrator**: one entry point per command of the binary
//! - **DatasetGenerator**: composes cohorts, shipping and delivery into one batch
//! - **TemporalConstraintSampler**: uniform instants inside visit windows
//! - **RunStatistics**: counters and the end-of-run summary
//! - **DatagenError**: errors that abort a run
//! - **LoggingConfig**: tracing subscriber setup

pub mod batch_generator;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod statistics;
pub mod time_sampler;

pub use batch_generator::*;
pub use error::*;
pub use logging::*;
pub use orchestrator::*;
pub use statistics::*;
pub use time_sampler::*;
