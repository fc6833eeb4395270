//! Delivery timeline simulation
//!
//! Turns an order time and a shipping option into an estimated and an actual delivery
//! instant:
//!
//! 1. transit days drawn uniformly from the option's window
//! 2. estimated date = order date + transit days, at a random business-hours time
//! 3. a day offset drawn from [`DELIVERY_VARIANCE`] applied to the estimated date
//! 4. Sundays roll forward to Monday (Saturdays are kept)
//! 5. a fresh business-hours time gives the delivered instant
//!
//! The delivered instant is not clamped against the order time. With a catalog whose
//! minimum transit is zero days, an early delivery can land before the order was placed;
//! [`DeliveryTimeline::precedes_order`] reports that case so runs can count it.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use rand::Rng;
use tracing::trace;

use super::business_hours::BusinessHours;
use crate::shipping::ShippingOption;

/// Day offsets applied to the estimated delivery date and their probabilities
pub const DELIVERY_VARIANCE: [(i64, f64); 4] = [(-1, 0.20), (0, 0.60), (1, 0.10), (2, 0.10)];

/// Every intermediate value drawn while simulating one delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryTimeline {
    /// Drawn transit days
    pub transit_days: u32,
    /// Promised delivery instant
    pub estimated_delivery_at: NaiveDateTime,
    /// Day offset applied to the estimated date
    pub variance_days: i64,
    /// Days added to move the delivery off a Sunday (0 or 1)
    pub sunday_shift_days: u32,
    /// Actual delivery instant
    pub delivered_at: NaiveDateTime,
}

impl DeliveryTimeline {
    /// Whether delivery happened before the order was placed
    pub fn precedes_order(&self, order_created_at: NaiveDateTime) -> bool {
        self.delivered_at < order_created_at
    }
}

/// Simulates estimated and actual delivery instants for orders
#[derive(Debug, Clone, Default)]
pub struct DeliveryTimelineSimulator {
    business_hours: BusinessHours,
}

impl DeliveryTimelineSimulator {
    /// Create a simulator delivering inside `business_hours`
    pub fn new(business_hours: BusinessHours) -> Self {
        Self { business_hours }
    }

    /// The delivery window in use
    pub fn business_hours(&self) -> BusinessHours {
        self.business_hours
    }

    /// Simulate the delivery of an order placed at `order_created_at`
    pub fn simulate<R: Rng + ?Sized>(
        &self,
        order_created_at: NaiveDateTime,
        option: &ShippingOption,
        rng: &mut R,
    ) -> DeliveryTimeline {
        let transit_days = self.draw_transit_days(option, rng);

        let estimated_date = order_created_at.date() + Duration::days(i64::from(transit_days));
        let estimated_delivery_at = estimated_date.and_time(self.business_hours.random_time(rng));

        let variance_days = draw_variance_days(rng);
        let (delivery_date, sunday_shift_days) =
            skip_sundays(estimated_date + Duration::days(variance_days));
        let delivered_at = delivery_date.and_time(self.business_hours.random_time(rng));

        trace!(
            %order_created_at,
            transit_days,
            variance_days,
            sunday_shift_days,
            %delivered_at,
            "Simulated delivery timeline"
        );

        DeliveryTimeline {
            transit_days,
            estimated_delivery_at,
            variance_days,
            sunday_shift_days,
            delivered_at,
        }
    }

    /// Draw transit days uniformly from the option's `[min, max]` window
    pub fn draw_transit_days<R: Rng + ?Sized>(&self, option: &ShippingOption, rng: &mut R) -> u32 {
        let max = option.max_transit_days.max(option.min_transit_days);
        rng.gen_range(option.min_transit_days..=max)
    }
}

/// Draw a day offset from [`DELIVERY_VARIANCE`]
pub fn draw_variance_days<R: Rng + ?Sized>(rng: &mut R) -> i64 {
    let roll: f64 = rng.gen();
    let mut cumulative = 0.0;
    for (offset, probability) in DELIVERY_VARIANCE {
        cumulative += probability;
        if roll < cumulative {
            return offset;
        }
    }
    // Rounding can leave the cumulative sum a hair under 1.0.
    DELIVERY_VARIANCE[DELIVERY_VARIANCE.len() - 1].0
}

/// Roll a date forward until it is not a Sunday, returning the days added
pub fn skip_sundays(mut date: NaiveDate) -> (NaiveDate, u32) {
    let mut shifted = 0;
    while date.weekday() == Weekday::Sun {
        date += Duration::days(1);
        shifted += 1;
    }
    (date, shifted)
}
