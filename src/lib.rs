//! Storefront Dataset Generator
//!
//! Synthesizes a referentially consistent e-commerce dataset from a table of web
//! sessions: user registrations, orders, shipping assignments and delivery timelines.
//! Also repairs raw session extracts and stages CSVs for bulk loading.
//!
//! # Overview
//!
//! Generation is a single synchronous batch driven by one seedable random stream.
//! Every registration and order falls inside the window of the visit it belongs to,
//! deliveries land in business hours and never on a Sunday.
//!
//! ## Key Features
//!
//! - **Cohort Selection**: registrations sampled from visits, first-time and returning
//!   purchasers sampled at rates drawn once per run
//! - **Shipping Assignment**: locations biased toward a priority subset, options from a
//!   configurable carrier catalog
//! - **Delivery Simulation**: transit days, a variance offset and the Sunday rule
//! - **Record Normalization**: hour padding and dict-literal to JSON coercion with
//!   malformed values passed through and counted
//! - **Staging**: blob store and schema-checking bulk loader behind traits
//!
//! ## Quick Start
//!
//! ```rust
//! use storefront_datagen::*;
//!
//! let start = parse_timestamp("2024-03-08 10:00:00").unwrap();
//! let end = parse_timestamp("2024-03-08 10:45:00").unwrap();
//! let visits = vec![Visit::new(VisitId::from("visit-1"), start, end)];
//!
//! let config = GeneratorConfig { seed: Some(7), registration_count: 1, ..Default::default() };
//! let mut generator = DatasetGenerator::new(&config)?;
//! let dataset = generator.generate(&visits);
//!
//! assert_eq!(dataset.registrations.len(), 1);
//! assert!(dataset.registrations[0].registered_at >= start);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Module Organization
//!
//! - [`types`]: Records, identifiers, timestamps and configuration
//! - [`cohort`]: Registration sampling and purchasing cohorts
//! - [`shipping`]: Location pool and shipping catalog
//! - [`delivery`]: Business hours and delivery timelines
//! - [`normalize`]: Timestamp and metadata repair
//! - [`storage`]: CSV extracts, table schemas, blob store and loader
//! - [`simulation`]: Generator, orchestration, statistics, errors and logging
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │   Types     │    │   Cohort    │    │  Shipping   │
//! │             │◄───┤             │    │             │
//! │ Records     │    │ Registration│    │ Locations   │
//! │ Identifiers │    │ Purchasers  │    │ Catalog     │
//! └─────────────┘    └─────────────┘    └─────────────┘
//!        ▲                  ▲                  ▲
//!        │                  │                  │
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │  Storage    │    │ Simulation  │    │  Delivery   │
//! │             │◄───┤             ├───►│             │
//! │ Extracts    │    │ Generator   │    │ Timelines   │
//! │ Loader      │    │ Orchestrator│    │             │
//! └─────────────┘    └─────────────┘    └─────────────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │  Normalize  │
//! └─────────────┘
//! ```
#![warn(missing_docs, missing_debug_implementations, unreachable_pub)]

pub mod cohort;
pub mod delivery;
pub mod normalize;
pub mod shipping;
pub mod simulation;
pub mod storage;

pub mod types;

// Core types and identifiers
pub use types::{
    format_timestamp,
    parse_timestamp,
    // Configuration
    CliArgs,
    Command,
    ConfigError,
    ConfigValidationError,
    GeneratorConfig,
    // Identifiers
    IdentityGenerator,
    LocationId,
    OrderId,
    // Records
    Order,
    Registration,
    UserId,
    Visit,
    VisitId,
};

// Generation components
pub use cohort::{CohortSelector, PurchaseRates, RateRange, RegistrationIndex};
pub use delivery::{BusinessHours, DeliveryTimeline, DeliveryTimelineSimulator};
pub use shipping::{LocationPool, ShippingAssignment, ShippingAssignmentEngine, ShippingOption};

// Normalization
pub use normalize::{FieldRepair, NormalizeError, NormalizedBatch, NormalizerConfig, RecordNormalizer};

// Staging
pub use storage::{
    BlobStore, BulkTableLoader, CsvSessionSource, LoadJob, LoadOutcome, LocalBlobStore,
    SchemaCheckingLoader, SessionSource, StagingError, TableSchema, WriteMode,
};

// Simulation types and functionality
pub use simulation::{
    DatagenError, DatagenResult, DatasetGenerator, GeneratedDataset, LoggingConfig,
    RunOrchestrator, RunStatistics, StageRequest, TemporalConstraintSampler,
};
