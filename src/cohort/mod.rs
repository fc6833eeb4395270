//! Registration and purchase cohorts
//!
//! - **RegistrationIndex**: registrations by visit, built once per run
//! - **CohortSelector**: picks registering visits and the two purchasing cohorts

pub mod index;
pub mod selector;

pub use index::*;
pub use selector::*;
