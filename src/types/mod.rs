//! Core records, identifiers and configuration
//!
//! - **Identifiers**: string-backed ids and the [`IdentityGenerator`] minting them
//! - **Records**: [`Visit`], [`Registration`] and [`Order`] rows
//! - **Timestamps**: the canonical `YYYY-MM-DD HH:MM:SS` text form
//! - **Configuration**: [`GeneratorConfig`] with file and command line layering
//!
//! ```rust
//! use storefront_datagen::types::*;
//!
//! let start = parse_timestamp("2024-03-08 10:00:00").unwrap();
//! let end = parse_timestamp("2024-03-08 10:30:00").unwrap();
//! let visit = Visit::new(VisitId::from("visit-1"), start, end);
//! assert!(visit.is_well_formed());
//!
//! let config = GeneratorConfig { registration_count: 100, ..Default::default() };
//! assert!(config.validate().is_ok());
//! ```

pub mod config;
pub mod identifiers;
pub mod records;
pub mod timestamp;

pub use config::*;
pub use identifiers::*;
pub use records::*;
pub use timestamp::*;
