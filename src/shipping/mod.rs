//! Shipping catalog and assignment
//!
//! - **ShippingOption**: carrier, method and transit window from a static catalog
//! - **LocationPool**: fixed pool of delivery locations with a priority subset
//! - **ShippingAssignmentEngine**: draws a location and an option for each order

pub mod assignment;
pub mod catalog;

pub use assignment::*;
pub use catalog::*;
