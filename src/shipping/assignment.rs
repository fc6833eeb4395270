//! Location and shipping option assignment
//!
//! Locations come from a fixed pool minted once per run. A small subset of the pool is
//! marked as priority: half of all draws go to that subset, the other half to the whole
//! pool (priority locations included), which concentrates traffic without excluding
//! anyone from general draws.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use super::catalog::ShippingOption;
use crate::types::{IdentityGenerator, LocationId};

/// Fixed pool of shipping locations with a priority subset
#[derive(Debug, Clone)]
pub struct LocationPool {
    locations: Vec<LocationId>,
    priority: Vec<LocationId>,
}

impl LocationPool {
    /// Mint `size` locations and pick `priority_count` of them as priority
    ///
    /// `priority_count` is capped at `size`.
    pub fn generate<R: Rng + ?Sized>(
        size: usize,
        priority_count: usize,
        identities: &mut IdentityGenerator,
        rng: &mut R,
    ) -> Self {
        let locations: Vec<LocationId> = (0..size).map(|_| identities.location_id(rng)).collect();
        let priority: Vec<LocationId> = locations
            .choose_multiple(rng, priority_count.min(size))
            .cloned()
            .collect();

        debug!("Generated {} locations ({} priority)", locations.len(), priority.len());
        Self { locations, priority }
    }

    /// All locations, priority included
    pub fn locations(&self) -> &[LocationId] {
        &self.locations
    }

    /// The priority subset
    pub fn priority(&self) -> &[LocationId] {
        &self.priority
    }

    /// Whether `location` is in the priority subset
    pub fn is_priority(&self, location: &LocationId) -> bool {
        self.priority.contains(location)
    }
}

/// Location and shipping option picked for one order
#[derive(Debug, Clone, PartialEq)]
pub struct ShippingAssignment {
    /// Delivery location
    pub location_id: LocationId,
    /// Chosen catalog entry
    pub option: ShippingOption,
}

/// Assigns a delivery location and a shipping option to each order
#[derive(Debug, Clone)]
pub struct ShippingAssignmentEngine {
    pool: LocationPool,
    catalog: Vec<ShippingOption>,
    priority_probability: f64,
}

impl ShippingAssignmentEngine {
    /// Create an engine over a location pool and a non-empty catalog
    ///
    /// Returns `None` when the pool or catalog is empty, or the probability is outside `[0, 1]`.
    pub fn new(
        pool: LocationPool,
        catalog: Vec<ShippingOption>,
        priority_probability: f64,
    ) -> Option<Self> {
        if pool.locations.is_empty()
            || catalog.is_empty()
            || !(0.0..=1.0).contains(&priority_probability)
        {
            return None;
        }
        Some(Self { pool, catalog, priority_probability })
    }

    /// The underlying location pool
    pub fn pool(&self) -> &LocationPool {
        &self.pool
    }

    /// The shipping catalog
    pub fn catalog(&self) -> &[ShippingOption] {
        &self.catalog
    }

    /// Draw a delivery location
    pub fn assign_location<R: Rng + ?Sized>(&self, rng: &mut R) -> LocationId {
        let candidates = if !self.pool.priority.is_empty() && rng.gen_bool(self.priority_probability)
        {
            &self.pool.priority
        } else {
            &self.pool.locations
        };

        // Pool and catalog are non-empty by construction.
        candidates[rng.gen_range(0..candidates.len())].clone()
    }

    /// Draw a shipping option uniformly from the catalog
    pub fn choose_option<R: Rng + ?Sized>(&self, rng: &mut R) -> ShippingOption {
        self.catalog[rng.gen_range(0..self.catalog.len())].clone()
    }

    /// Draw both a location and a shipping option
    pub fn assign<R: Rng + ?Sized>(&self, rng: &mut R) -> ShippingAssignment {
        ShippingAssignment { location_id: self.assign_location(rng), option: self.choose_option(rng) }
    }
}
