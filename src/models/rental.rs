//! Rental model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::enums::{Condition, RentalStatus};

/// Rental row. Status is not stored; see [`Rental::status_at`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Rental {
    pub id: i32,
    pub equipment_id: i32,
    pub customer_id: i32,
    pub issued_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub condition_on_return: Option<Condition>,
    pub notes: Option<String>,
}

/// Status of a rental as of `now`
pub fn derive_status(
    returned_at: Option<DateTime<Utc>>,
    due_date: DateTime<Utc>,
    now: DateTime<Utc>,
) -> RentalStatus {
    match returned_at {
        Some(_) => RentalStatus::Completed,
        None if due_date < now => RentalStatus::Overdue,
        None => RentalStatus::Active,
    }
}

impl Rental {
    pub fn status_at(&self, now: DateTime<Utc>) -> RentalStatus {
        derive_status(self.returned_at, self.due_date, now)
    }

    /// Not yet returned (Active or Overdue)
    pub fn is_open(&self) -> bool {
        self.returned_at.is_none()
    }

    pub fn view(self, now: DateTime<Utc>) -> RentalView {
        let status = self.status_at(now);
        RentalView { rental: self, status }
    }
}

/// Rental with its status computed at read time
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RentalView {
    #[serde(flatten)]
    pub rental: Rental,
    pub status: RentalStatus,
}

/// Row to insert when issuing equipment
#[derive(Debug, Clone)]
pub struct NewRental {
    pub equipment_id: i32,
    pub customer_id: i32,
    pub issued_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Storage-level rental filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RentalFilter {
    pub customer_id: Option<i32>,
    pub equipment_id: Option<i32>,
    /// `Some(true)` for unreturned rentals, `Some(false)` for returned ones
    pub open: Option<bool>,
}

impl RentalFilter {
    pub fn matches(&self, rental: &Rental) -> bool {
        self.customer_id.map_or(true, |id| rental.customer_id == id)
            && self.equipment_id.map_or(true, |id| rental.equipment_id == id)
            && self.open.map_or(true, |open| rental.is_open() == open)
    }
}

/// Parses an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC)
pub fn parse_due_date(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| format!("invalid date `{}`, expected YYYY-MM-DD or RFC 3339", raw))
}

fn deserialize_due_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_due_date(raw.trim()).map_err(serde::de::Error::custom)
}

/// Issue rental request
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueRental {
    pub equipment_id: i32,
    pub customer_id: i32,
    #[serde(deserialize_with = "deserialize_due_date")]
    pub due_date: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Return rental request
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRental {
    pub rental_id: i32,
    pub condition_on_return: Condition,
    pub notes: Option<String>,
}

/// Extend rental request
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtendRental {
    #[serde(deserialize_with = "deserialize_due_date")]
    pub new_due_date: DateTime<Utc>,
}
