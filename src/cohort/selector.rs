//! Registration and purchase cohort selection
//!
//! Registrations are built from a uniform sample of visits. Purchases come from two
//! disjoint cohorts:
//!
//! - **first-time**: visits during which the user registered
//! - **returning**: other visits whose visit-level identity belongs to a user registered
//!   before the visit ended
//!
//! Visits with no registered identity never purchase. Each cohort is sampled without
//! replacement at its own rate; the rates are drawn once per run.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

use super::index::RegistrationIndex;
use crate::simulation::TemporalConstraintSampler;
use crate::types::{IdentityGenerator, Registration, Visit, VisitId};

/// Closed range a per-run rate is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateRange {
    /// Lowest rate
    pub min: f64,
    /// Highest rate
    pub max: f64,
}

impl RateRange {
    /// Create a rate range
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether `0 <= min <= max <= 1`
    pub fn is_valid(&self) -> bool {
        (0.0..=1.0).contains(&self.min) && (0.0..=1.0).contains(&self.max) && self.min <= self.max
    }

    /// Draw a rate uniformly from the range
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.max <= self.min {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }
}

/// Purchase rates fixed for the duration of a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PurchaseRates {
    /// Share of first-time visits that purchase
    pub first_time: f64,
    /// Share of returning registered visits that purchase
    pub returning: f64,
}

impl PurchaseRates {
    /// Draw both rates once
    pub fn draw<R: Rng + ?Sized>(first_time: RateRange, returning: RateRange, rng: &mut R) -> Self {
        Self { first_time: first_time.draw(rng), returning: returning.draw(rng) }
    }
}

/// Visits selected to purchase, split by cohort
#[derive(Debug, Clone)]
pub struct PurchaseCohorts<'a> {
    /// Purchasing visits that carry a registration
    pub first_time: Vec<&'a Visit>,
    /// Purchasing visits of already registered users
    pub returning: Vec<&'a Visit>,
}

impl<'a> PurchaseCohorts<'a> {
    /// Union of both cohorts, first-time visits first
    pub fn iter(&self) -> impl Iterator<Item = &'a Visit> + '_ {
        self.first_time.iter().chain(self.returning.iter()).copied()
    }

    /// Total number of purchasing visits
    pub fn len(&self) -> usize {
        self.first_time.len() + self.returning.len()
    }

    /// Whether nobody purchases
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Selects registering and purchasing visits
#[derive(Debug, Clone)]
pub struct CohortSelector {
    sampler: TemporalConstraintSampler,
    rates: PurchaseRates,
}

impl CohortSelector {
    /// Create a selector with rates already drawn for this run
    pub fn new(rates: PurchaseRates) -> Self {
        Self { sampler: TemporalConstraintSampler::new(), rates }
    }

    /// The run's purchase rates
    pub fn rates(&self) -> PurchaseRates {
        self.rates
    }

    /// Register a uniform sample of `count` visits (capped at the number of visits)
    ///
    /// Each selected visit gets a fresh user identity and a registration instant inside
    /// its window. Inverted visit windows register at the visit start.
    #[instrument(skip_all, fields(visits = visits.len(), count))]
    pub fn select_registrations<R: Rng + ?Sized>(
        &self,
        visits: &[Visit],
        count: usize,
        identities: &mut IdentityGenerator,
        rng: &mut R,
    ) -> Vec<Registration> {
        let unique = unique_visits(visits);
        if count > unique.len() {
            warn!(
                "Requested {} registrations but only {} distinct visits are available",
                count,
                unique.len()
            );
        }

        let registrations: Vec<Registration> = unique
            .choose_multiple(rng, count.min(unique.len()))
            .map(|visit| Registration {
                visit_id: visit.visit_id.clone(),
                user_id: identities.user_id(rng),
                registered_at: self.sampler.sample(visit.start_time, visit.end_time, rng),
            })
            .collect();

        info!("Selected {} registrations", registrations.len());
        registrations
    }

    /// Pick the purchasing visits of both cohorts
    #[instrument(skip_all, fields(visits = visits.len(), registrations = index.len()))]
    pub fn select_purchasers<'a, R: Rng + ?Sized>(
        &self,
        visits: &'a [Visit],
        index: &RegistrationIndex,
        rng: &mut R,
    ) -> PurchaseCohorts<'a> {
        let mut first_time_pool = Vec::new();
        let mut returning_pool = Vec::new();
        let mut unregistered = 0usize;
        let mut before_registration = 0usize;

        for visit in unique_visits(visits) {
            if index.for_visit(&visit.visit_id).is_some() {
                first_time_pool.push(visit);
                continue;
            }
            match visit.user_id.as_ref().and_then(|user| index.registered_at(user)) {
                Some(registered_at) if registered_at <= visit.end_time => returning_pool.push(visit),
                Some(_) => before_registration += 1,
                None => unregistered += 1,
            }
        }

        debug!(
            first_time = first_time_pool.len(),
            returning = returning_pool.len(),
            unregistered,
            before_registration,
            "Partitioned visits into cohorts"
        );

        let first_time = sample_fraction(&first_time_pool, self.rates.first_time, rng);
        let returning = sample_fraction(&returning_pool, self.rates.returning, rng);

        info!(
            "Selected {} first-time purchases ({:.1}%) and {} returning purchases ({:.1}%)",
            first_time.len(),
            self.rates.first_time * 100.0,
            returning.len(),
            self.rates.returning * 100.0
        );

        PurchaseCohorts { first_time, returning }
    }
}

/// Sample `round(rate * len)` items without replacement
fn sample_fraction<'a, R: Rng + ?Sized>(
    pool: &[&'a Visit],
    rate: f64,
    rng: &mut R,
) -> Vec<&'a Visit> {
    let amount = ((pool.len() as f64) * rate.clamp(0.0, 1.0)).round() as usize;
    pool.choose_multiple(rng, amount.min(pool.len())).copied().collect()
}

/// Visits with duplicate keys collapse onto their first occurrence
fn unique_visits(visits: &[Visit]) -> Vec<&Visit> {
    let mut seen: HashSet<&VisitId> = HashSet::with_capacity(visits.len());
    let unique: Vec<&Visit> = visits.iter().filter(|v| seen.insert(&v.visit_id)).collect();
    if unique.len() < visits.len() {
        warn!("Ignoring {} visits with duplicate visit_id", visits.len() - unique.len());
    }
    unique
}
