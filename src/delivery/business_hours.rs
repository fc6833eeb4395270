//! Business-hours window for deliveries

use chrono::{NaiveTime, Timelike};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Daily delivery window `[start_hour:00:00, end_hour:00:00)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessHours {
    /// First hour of the window (inclusive)
    pub start_hour: u32,
    /// Hour at which the window closes (exclusive)
    pub end_hour: u32,
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self { start_hour: 9, end_hour: 18 }
    }
}

impl BusinessHours {
    /// Whether the window is non-empty and fits in a day
    pub fn is_valid(&self) -> bool {
        self.start_hour < self.end_hour && self.end_hour <= 24
    }

    /// Check if a time of day falls inside the window
    pub fn contains(&self, time: NaiveTime) -> bool {
        (self.start_hour..self.end_hour).contains(&time.hour())
    }

    /// Draw a uniform time of day inside the window at one-second resolution
    ///
    /// The hour is uniform over the window; minute and second are unconstrained.
    pub fn random_time<R: Rng + ?Sized>(&self, rng: &mut R) -> NaiveTime {
        let hour = rng.gen_range(self.start_hour..self.end_hour.max(self.start_hour + 1));
        let minute = rng.gen_range(0..60);
        let second = rng.gen_range(0..60);
        NaiveTime::from_hms_opt(hour, minute, second).unwrap_or(NaiveTime::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_business_hours_detection() {
        let hours = BusinessHours::default();

        assert!(hours.contains(NaiveTime::from_hms_opt(9, 0, 0).unwrap()));
        assert!(hours.contains(NaiveTime::from_hms_opt(17, 59, 59).unwrap()));
        assert!(!hours.contains(NaiveTime::from_hms_opt(18, 0, 0).unwrap()));
        assert!(!hours.contains(NaiveTime::from_hms_opt(8, 59, 59).unwrap()));
    }

    #[test]
    fn test_random_time_stays_inside_window() {
        let hours = BusinessHours::default();
        let mut rng = StdRng::seed_from_u64(11);
        let mut hours_seen = std::collections::HashSet::new();

        for _ in 0..2_000 {
            let time = hours.random_time(&mut rng);
            assert!(hours.contains(time), "{} outside business hours", time);
            hours_seen.insert(time.hour());
        }

        assert_eq!(hours_seen.len(), 9);
    }

    #[test]
    fn test_validity() {
        assert!(BusinessHours::default().is_valid());
        assert!(!BusinessHours { start_hour: 18, end_hour: 9 }.is_valid());
        assert!(!BusinessHours { start_hour: 9, end_hour: 25 }.is_valid());
    }
}
