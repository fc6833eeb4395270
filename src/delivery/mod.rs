//! Delivery timeline simulation
//!
//! - **BusinessHours**: the daily window deliveries happen in
//! - **DeliveryTimelineSimulator**: estimated and actual delivery instants per order

pub mod business_hours;
pub mod timeline;

pub use business_hours::*;
pub use timeline::*;
