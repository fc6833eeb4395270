//! Static shipping option catalog

use serde::{Deserialize, Serialize};
use std::fmt;

/// A carrier/method pair with its promised transit window in days
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingOption {
    /// Carrier identity
    pub carrier: String,
    /// Service level offered by the carrier
    pub method: String,
    /// Fewest days between order and estimated delivery
    pub min_transit_days: u32,
    /// Most days between order and estimated delivery
    pub max_transit_days: u32,
}

impl ShippingOption {
    /// Create a shipping option
    pub fn new(
        carrier: impl Into<String>,
        method: impl Into<String>,
        min_transit_days: u32,
        max_transit_days: u32,
    ) -> Self {
        Self {
            carrier: carrier.into(),
            method: method.into(),
            min_transit_days,
            max_transit_days,
        }
    }

    /// Whether the option is usable: named and `min <= max`
    pub fn is_valid(&self) -> bool {
        !self.carrier.trim().is_empty()
            && !self.method.trim().is_empty()
            && self.min_transit_days <= self.max_transit_days
    }
}

impl fmt::Display for ShippingOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}-{} days)",
            self.carrier, self.method, self.min_transit_days, self.max_transit_days
        )
    }
}

/// The default five-entry catalog across three carriers
pub fn default_shipping_options() -> Vec<ShippingOption> {
    vec![
        ShippingOption::new("carrier_1", "Ground", 5, 7),
        ShippingOption::new("carrier_1", "2-Day", 2, 3),
        ShippingOption::new("carrier_3", "Standard", 4, 6),
        ShippingOption::new("carrier_2", "Priority Mail", 3, 5),
        ShippingOption::new("carrier_3", "Express", 1, 3),
    ]
}
