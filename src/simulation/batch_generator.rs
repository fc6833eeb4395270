//! Batch dataset generation
//!
//! [`DatasetGenerator`] owns the run's random stream and composes the components into
//! one batch: registrations from visits, then orders from both purchasing cohorts with
//! a shipping assignment and a simulated delivery timeline each.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::cohort::{CohortSelector, PurchaseRates, RegistrationIndex};
use crate::delivery::DeliveryTimelineSimulator;
use crate::shipping::{LocationPool, ShippingAssignmentEngine};
use crate::simulation::{DatagenError, DatagenResult, RunStatistics, TemporalConstraintSampler};
use crate::types::{GeneratorConfig, IdentityGenerator, Order, Registration, Visit};

/// Registrations and orders produced by one run
#[derive(Debug, Clone)]
pub struct GeneratedDataset {
    /// New registrations
    pub registrations: Vec<Registration>,
    /// New orders, first-time cohort first
    pub orders: Vec<Order>,
    /// Counters of the run
    pub statistics: RunStatistics,
}

/// Generates registrations and orders from a visit table
///
/// All randomness flows from one [`StdRng`], seeded from the configuration when a seed is
/// given: the same seed and input always produce the same output, identifiers included.
#[derive(Debug)]
pub struct DatasetGenerator {
    rng: StdRng,
    identities: IdentityGenerator,
    sampler: TemporalConstraintSampler,
    selector: CohortSelector,
    shipping: ShippingAssignmentEngine,
    delivery: DeliveryTimelineSimulator,
    registration_count: usize,
}

impl DatasetGenerator {
    /// Validate `config` and set up the run
    ///
    /// Purchase rates and the location pool are drawn here, once per run.
    #[instrument(skip(config), fields(seed = ?config.seed))]
    pub fn new(config: &GeneratorConfig) -> DatagenResult<Self> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut identities = IdentityGenerator::new();

        let rates = PurchaseRates::draw(
            config.first_time_purchase_rate,
            config.returning_purchase_rate,
            &mut rng,
        );
        let pool = LocationPool::generate(
            config.location_count,
            config.priority_location_count,
            &mut identities,
            &mut rng,
        );
        let shipping = ShippingAssignmentEngine::new(
            pool,
            config.shipping_options.clone(),
            config.priority_location_probability,
        )
        .ok_or_else(|| DatagenError::generation_error("shipping assignment cannot be set up"))?;

        info!(
            "Generator ready: first-time rate {:.3}, returning rate {:.3}, {} locations",
            rates.first_time,
            rates.returning,
            shipping.pool().locations().len()
        );

        Ok(Self {
            rng,
            identities,
            sampler: TemporalConstraintSampler::new(),
            selector: CohortSelector::new(rates),
            shipping,
            delivery: DeliveryTimelineSimulator::new(config.business_hours),
            registration_count: config.registration_count,
        })
    }

    /// Purchase rates drawn for this run
    pub fn rates(&self) -> PurchaseRates {
        self.selector.rates()
    }

    /// The shipping engine and its location pool
    pub fn shipping(&self) -> &ShippingAssignmentEngine {
        &self.shipping
    }

    /// Register a sample of visits
    pub fn generate_registrations(&mut self, visits: &[Visit]) -> Vec<Registration> {
        warn_inverted(visits);
        self.selector.select_registrations(
            visits,
            self.registration_count,
            &mut self.identities,
            &mut self.rng,
        )
    }

    /// Build orders for the purchasing visits
    #[instrument(skip_all, fields(visits = visits.len(), registrations = registrations.len()))]
    pub fn generate_orders(
        &mut self,
        visits: &[Visit],
        registrations: &[Registration],
    ) -> (Vec<Order>, RunStatistics) {
        let index = RegistrationIndex::build(registrations);
        let cohorts = self.selector.select_purchasers(visits, &index, &mut self.rng);

        let mut stats = RunStatistics {
            first_time_rate: Some(self.selector.rates().first_time),
            returning_rate: Some(self.selector.rates().returning),
            ..Default::default()
        };
        let mut orders = Vec::with_capacity(cohorts.len());

        for visit in cohorts.iter() {
            let registration = index.for_visit(&visit.visit_id);
            let (user_id, lower) = match (registration, &visit.user_id) {
                (Some(registration), _) => (registration.user_id.clone(), registration.registered_at),
                (None, Some(user_id)) => {
                    // The selector only admits visits ending after the registration.
                    let lower = index
                        .registered_at(user_id)
                        .map_or(visit.start_time, |registered_at| registered_at.max(visit.start_time));
                    (user_id.clone(), lower)
                }
                (None, None) => {
                    warn!(visit_id = %visit.visit_id, "Purchasing visit has no identity, skipping");
                    continue;
                }
            };

            let order_created_at = self.sampler.sample(lower, visit.end_time, &mut self.rng);
            let assignment = self.shipping.assign(&mut self.rng);
            let timeline = self.delivery.simulate(order_created_at, &assignment.option, &mut self.rng);

            if timeline.sunday_shift_days > 0 {
                stats.sunday_shifts += 1;
            }
            if timeline.precedes_order(order_created_at) {
                warn!(
                    visit_id = %visit.visit_id,
                    %order_created_at,
                    delivered_at = %timeline.delivered_at,
                    "Delivery precedes order time"
                );
                stats.delivery_underruns += 1;
            }
            if registration.is_some() {
                stats.first_time_orders += 1;
            } else {
                stats.returning_orders += 1;
            }

            orders.push(Order {
                order_id: self.identities.order_id(&mut self.rng),
                visit_id: visit.visit_id.clone(),
                user_id,
                order_created_at,
                location_id: assignment.location_id,
                shipping_carrier: assignment.option.carrier,
                shipping_method: assignment.option.method,
                estimated_delivery_at: timeline.estimated_delivery_at,
                delivered_at: timeline.delivered_at,
            });
        }

        debug!(
            sunday_shifts = stats.sunday_shifts,
            underruns = stats.delivery_underruns,
            "Built {} orders",
            orders.len()
        );
        (orders, stats)
    }

    /// Generate registrations and orders in one pass
    #[instrument(skip_all, fields(visits = visits.len()))]
    pub fn generate(&mut self, visits: &[Visit]) -> GeneratedDataset {
        let started = Instant::now();

        let registrations = self.generate_registrations(visits);
        let (orders, mut statistics) = self.generate_orders(visits, &registrations);

        statistics.visits_read = visits.len();
        statistics.inverted_visits = visits.iter().filter(|v| !v.is_well_formed()).count();
        statistics.registrations = registrations.len();
        statistics.duration = started.elapsed();

        info!("{}", statistics.compact_summary());
        GeneratedDataset { registrations, orders, statistics }
    }
}

fn warn_inverted(visits: &[Visit]) {
    let inverted = visits.iter().filter(|v| !v.is_well_formed()).count();
    if inverted > 0 {
        warn!("{} visits end before they start; their events fall back to the start time", inverted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{parse_timestamp, UserId, VisitId};
    use chrono::{Datelike, Duration, Weekday};
    use std::collections::HashMap;

    fn visits(n: usize) -> Vec<Visit> {
        let base = parse_timestamp("2024-03-01 06:00:00").unwrap();
        (0..n)
            .map(|i| {
                let start = base + Duration::minutes(i as i64 * 37);
                Visit::new(VisitId::from(format!("v{}", i)), start, start + Duration::minutes(45))
            })
            .collect()
    }

    fn config(seed: u64, registration_count: usize) -> GeneratorConfig {
        GeneratorConfig { seed: Some(seed), registration_count, ..Default::default() }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = GeneratorConfig { location_count: 0, ..Default::default() };
        assert!(matches!(DatasetGenerator::new(&config), Err(DatagenError::Validation(_))));
    }

    #[test]
    fn test_orders_respect_windows_and_calendar() {
        let all = visits(2_000);
        let mut generator = DatasetGenerator::new(&config(11, 800)).unwrap();

        let dataset = generator.generate(&all);
        let by_visit: HashMap<_, _> = all.iter().map(|v| (v.visit_id.clone(), v)).collect();
        let registered: HashMap<_, _> =
            dataset.registrations.iter().map(|r| (r.visit_id.clone(), r)).collect();

        assert_eq!(dataset.registrations.len(), 800);
        assert!(!dataset.orders.is_empty());
        for order in &dataset.orders {
            let visit = by_visit[&order.visit_id];
            let registration = registered[&order.visit_id];

            assert_eq!(order.user_id, registration.user_id);
            assert!(registration.registered_at <= order.order_created_at);
            assert!(order.order_created_at <= visit.end_time);
            assert_ne!(order.delivered_at.weekday(), Weekday::Sun);
        }
    }

    #[test]
    fn test_returning_orders_use_visit_identity() {
        let mut all = visits(600);
        let mut generator = DatasetGenerator::new(&GeneratorConfig {
            first_time_purchase_rate: crate::cohort::RateRange::new(0.0, 0.0),
            returning_purchase_rate: crate::cohort::RateRange::new(1.0, 1.0),
            ..config(12, 100)
        })
        .unwrap();

        let registrations = generator.generate_registrations(&all[..300]);
        let registered: Vec<&VisitId> = registrations.iter().map(|r| &r.visit_id).collect();
        for (i, visit) in all[300..].iter_mut().enumerate() {
            visit.user_id = Some(registrations[i % registrations.len()].user_id.clone());
        }
        all[599].user_id = Some(UserId::from("stranger"));

        let (orders, stats) = generator.generate_orders(&all, &registrations);

        assert_eq!(stats.first_time_orders, 0);
        assert_eq!(stats.returning_orders, 299);
        for order in &orders {
            assert!(!registered.contains(&&order.visit_id));
            let visit = all.iter().find(|v| v.visit_id == order.visit_id).unwrap();
            assert_eq!(Some(&order.user_id), visit.user_id.as_ref());
            assert!(visit.start_time <= order.order_created_at);
        }
    }

    #[test]
    fn test_returning_orders_follow_registration() {
        let mut generator = DatasetGenerator::new(&GeneratorConfig {
            first_time_purchase_rate: crate::cohort::RateRange::new(0.0, 0.0),
            returning_purchase_rate: crate::cohort::RateRange::new(1.0, 1.0),
            ..config(13, 1)
        })
        .unwrap();
        let registered_at = parse_timestamp("2024-05-10 12:07:02").unwrap();
        let registrations = vec![Registration {
            visit_id: VisitId::from("reg"),
            user_id: UserId::from("u1"),
            registered_at,
        }];

        let returning = |id: &str, start: &str| {
            let start = parse_timestamp(start).unwrap();
            let mut visit = Visit::new(VisitId::from(id), start, start + Duration::minutes(30));
            visit.user_id = Some(UserId::from("u1"));
            visit
        };
        let all = vec![
            returning("earlier", "2024-05-01 12:00:00"),
            returning("overlapping", "2024-05-10 12:00:00"),
        ];

        for _ in 0..50 {
            let (orders, stats) = generator.generate_orders(&all, &registrations);

            assert_eq!(stats.returning_orders, 1);
            assert_eq!(orders[0].visit_id, VisitId::from("overlapping"));
            assert!(registered_at <= orders[0].order_created_at);
        }
    }

    #[test]
    fn test_seeded_runs_replay() {
        let all = visits(500);

        let first = DatasetGenerator::new(&config(42, 200)).unwrap().generate(&all);
        let second = DatasetGenerator::new(&config(42, 200)).unwrap().generate(&all);
        let other = DatasetGenerator::new(&config(43, 200)).unwrap().generate(&all);

        assert_eq!(first.registrations, second.registrations);
        assert_eq!(first.orders, second.orders);
        assert_ne!(first.registrations, other.registrations);
    }

    #[test]
    fn test_empty_input() {
        let dataset = DatasetGenerator::new(&config(1, 10)).unwrap().generate(&[]);

        assert!(dataset.registrations.is_empty());
        assert!(dataset.orders.is_empty());
        assert_eq!(dataset.statistics.visits_read, 0);
    }
}
