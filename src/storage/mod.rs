//! Reading, writing and staging CSV extracts
//!
//! - **extract**: typed and raw CSV reading/writing, file normalization
//! - **SessionSource**: supplies visits (local CSV implementation)
//! - **BlobStore**: named byte streams (local directory implementation)
//! - **BulkTableLoader**: loads staged CSVs into tables (in-memory, schema-checking)
//! - **schema**: positional table schemas of the warehouse tables

pub mod blob;
pub mod error;
pub mod extract;
pub mod loader;
pub mod schema;
pub mod source;

pub use blob::*;
pub use error::*;
pub use extract::*;
pub use loader::*;
pub use schema::*;
pub use source::*;
