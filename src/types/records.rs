//! Tabular records flowing through the generator
//!
//! A [`Visit`] is the externally supplied root entity. [`Registration`] and [`Order`] are
//! derived from visits and written out as CSV extracts with the column names the warehouse
//! schemas expect.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::identifiers::{LocationId, OrderId, UserId, VisitId};
use super::timestamp::timestamp_format;

/// A single browsing session read from the session extract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    /// Unique session key
    pub visit_id: VisitId,

    /// When the session started
    #[serde(
        rename = "visit_start_time",
        alias = "visit_start_time_et",
        with = "timestamp_format"
    )]
    pub start_time: NaiveDateTime,

    /// When the session ended
    #[serde(rename = "visit_end_time", alias = "visit_end_time_et", with = "timestamp_format")]
    pub end_time: NaiveDateTime,

    /// Visit-level identity, used when the visit has no registration of its own
    #[serde(default)]
    pub user_id: Option<UserId>,
}

impl Visit {
    /// Create a visit without a visit-level identity
    pub fn new(visit_id: VisitId, start_time: NaiveDateTime, end_time: NaiveDateTime) -> Self {
        Self { visit_id, start_time, end_time, user_id: None }
    }

    /// Attach a visit-level user identity
    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Whether `start_time <= end_time`
    pub fn is_well_formed(&self) -> bool {
        self.start_time <= self.end_time
    }
}

/// A visit converting into a known user identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    /// Visit during which the user registered
    pub visit_id: VisitId,
    /// Freshly minted user identity
    pub user_id: UserId,
    /// Registration instant, inside the visit window
    #[serde(alias = "registered_at_et", with = "timestamp_format")]
    pub registered_at: NaiveDateTime,
}

/// A purchase attached to a visit, with its shipping and delivery timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Freshly minted order identity
    pub order_id: OrderId,
    /// Visit the purchase happened in
    pub visit_id: VisitId,
    /// Purchasing user
    pub user_id: UserId,
    /// Purchase instant
    #[serde(alias = "order_created_at_et", with = "timestamp_format")]
    pub order_created_at: NaiveDateTime,
    /// Delivery location
    pub location_id: LocationId,
    /// Carrier of the chosen shipping option
    pub shipping_carrier: String,
    /// Method of the chosen shipping option
    pub shipping_method: String,
    /// Promised delivery instant
    #[serde(rename = "estimated_delivery_date", with = "timestamp_format")]
    pub estimated_delivery_at: NaiveDateTime,
    /// Actual delivery instant
    #[serde(alias = "delivered_at_et", with = "timestamp_format")]
    pub delivered_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::timestamp::parse_timestamp;

    #[test]
    fn test_visit_deserializes_original_column_names() {
        let data = "visit_id,visit_start_time_et,visit_end_time_et,device_type\n\
                    v1,2024-01-01 09:00:00,2024-01-01 09:30:00,mobile\n";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let visits: Vec<Visit> = reader.deserialize().collect::<Result<_, _>>().unwrap();

        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].visit_id.as_str(), "v1");
        assert_eq!(visits[0].start_time, parse_timestamp("2024-01-01 09:00:00").unwrap());
        assert!(visits[0].user_id.is_none());
        assert!(visits[0].is_well_formed());
    }

    #[test]
    fn test_visit_with_empty_user_column() {
        let data = "visit_id,visit_start_time,visit_end_time,user_id\n\
                    v1,2024-01-01 09:00:00,2024-01-01 09:30:00,\n\
                    v2,2024-01-01 10:00:00,2024-01-01 10:30:00,u-2\n";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let visits: Vec<Visit> = reader.deserialize().collect::<Result<_, _>>().unwrap();

        assert!(visits[0].user_id.is_none());
        assert_eq!(visits[1].user_id, Some(UserId::from("u-2")));
    }

    #[test]
    fn test_registration_serializes_canonical_timestamp() {
        let registration = Registration {
            visit_id: VisitId::from("v1"),
            user_id: UserId::from("u1"),
            registered_at: parse_timestamp("2024-01-01T09:05:00").unwrap(),
        };

        let mut writer = csv::Writer::from_writer(vec![]);
        writer.serialize(&registration).unwrap();
        let output = String::from_utf8(writer.into_inner().unwrap()).unwrap();

        assert_eq!(output, "visit_id,user_id,registered_at\nv1,u1,2024-01-01 09:05:00\n");
    }
}
