//! Normalization of raw session extracts before loading
//!
//! - **repair_timestamp**: pads one-digit hours in `"<date> H:MM:SS"` values
//! - **coerce_metadata**: rewrites dict-literal metadata as canonical JSON
//! - **RecordNormalizer**: applies both to configured columns of whole batches
//!
//! Every field repair is a [`FieldRepair`]: unchanged, repaired, or passed through as-is
//! for the loader to judge.

pub mod literal;
pub mod metadata;
pub mod normalizer;
pub mod repair;
pub mod timestamp;

pub use literal::{parse_literal, LiteralError};
pub use metadata::*;
pub use normalizer::*;
pub use repair::*;
pub use timestamp::*;
