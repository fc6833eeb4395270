//! Run statistics and the end-of-run summary

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Counters collected over one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    // Input
    /// Visits read from the session source
    pub visits_read: usize,
    /// Visits whose end precedes their start
    pub inverted_visits: usize,

    // Generation
    /// Registrations written
    pub registrations: usize,
    /// Orders from the first-time cohort
    pub first_time_orders: usize,
    /// Orders from the returning cohort
    pub returning_orders: usize,
    /// Purchase rate drawn for the first-time cohort
    pub first_time_rate: Option<f64>,
    /// Purchase rate drawn for the returning cohort
    pub returning_rate: Option<f64>,
    /// Deliveries moved off a Sunday
    pub sunday_shifts: usize,
    /// Deliveries landing before their order was placed
    pub delivery_underruns: usize,

    // Normalization
    /// Rows passed through the normalizer
    pub normalized_rows: usize,
    /// Fields rewritten into canonical form
    pub repaired_fields: usize,
    /// Rows forwarded with values that could not be repaired
    pub malformed_rows: usize,

    // Staging
    /// Rows loaded per table, in load order
    pub loaded_tables: Vec<(String, usize)>,

    /// Wall-clock time of the run
    pub duration: Duration,
}

impl RunStatistics {
    /// Create empty statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Orders of both cohorts
    pub fn total_orders(&self) -> usize {
        self.first_time_orders + self.returning_orders
    }

    /// Share of registrations that converted into a first-time order
    pub fn first_time_conversion(&self) -> f64 {
        if self.registrations == 0 {
            0.0
        } else {
            (self.first_time_orders as f64 / self.registrations as f64) * 100.0
        }
    }

    /// Share of normalized rows that are still malformed
    pub fn malformed_percentage(&self) -> f64 {
        if self.normalized_rows == 0 {
            0.0
        } else {
            (self.malformed_rows as f64 / self.normalized_rows as f64) * 100.0
        }
    }

    /// One-line summary
    pub fn compact_summary(&self) -> String {
        format!(
            "{} visits | {} registrations | {} orders ({} first-time, {} returning) | {} rows normalized, {} malformed",
            self.visits_read,
            self.registrations,
            self.total_orders(),
            self.first_time_orders,
            self.returning_orders,
            self.normalized_rows,
            self.malformed_rows
        )
    }

    /// Multi-line report printed at the end of a run
    ///
    /// Sections without activity are left out.
    pub fn summary_report(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Run Summary ===\n");
        report.push_str(&format!("Duration: {:.2} seconds\n\n", self.duration.as_secs_f64()));

        if self.visits_read > 0 || self.registrations > 0 || self.total_orders() > 0 {
            report.push_str("Generation:\n");
            report.push_str(&format!("  • Visits Read: {}\n", self.visits_read));
            if self.inverted_visits > 0 {
                report.push_str(&format!("  • Inverted Visit Windows: {}\n", self.inverted_visits));
            }
            report.push_str(&format!("  • Registrations: {}\n", self.registrations));
            report.push_str(&format!("  • Orders: {}\n", self.total_orders()));
            report.push_str(&format!(
                "      first-time: {}{}\n",
                self.first_time_orders,
                rate_suffix(self.first_time_rate)
            ));
            report.push_str(&format!(
                "      returning:  {}{}\n",
                self.returning_orders,
                rate_suffix(self.returning_rate)
            ));
            report.push_str(&format!("  • Sunday Delivery Shifts: {}\n", self.sunday_shifts));
            if self.delivery_underruns > 0 {
                report.push_str(&format!(
                    "  • Deliveries Before Order Time: {}\n",
                    self.delivery_underruns
                ));
            }
            report.push('\n');
        }

        if self.normalized_rows > 0 {
            report.push_str("Normalization:\n");
            report.push_str(&format!("  • Rows: {}\n", self.normalized_rows));
            report.push_str(&format!("  • Repaired Fields: {}\n", self.repaired_fields));
            report.push_str(&format!(
                "  • Malformed Rows Passed Through: {} ({:.1}%)\n\n",
                self.malformed_rows,
                self.malformed_percentage()
            ));
        }

        if !self.loaded_tables.is_empty() {
            report.push_str("Staging:\n");
            for (table, rows) in &self.loaded_tables {
                report.push_str(&format!("  • {}: {} rows loaded\n", table, rows));
            }
            report.push('\n');
        }

        report
    }
}

fn rate_suffix(rate: Option<f64>) -> String {
    rate.map(|r| format!(" (rate {:.1}%)", r * 100.0)).unwrap_or_default()
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.compact_summary())
    }
}
