use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use shiftledger_application::CreateShiftInput;
use shiftledger_domain::Shift;

/// Incoming payload for shift creation.
#[derive(Debug, Deserialize)]
pub struct CreateShiftRequest {
    pub reference_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<CreateShiftRequest> for CreateShiftInput {
    fn from(value: CreateShiftRequest) -> Self {
        Self {
            reference_date: value.reference_date,
            start_time: value.start_time,
            end_time: value.end_time,
            category: value.category,
            description: value.description,
        }
    }
}

/// API representation of a shift.
#[derive(Debug, Serialize)]
pub struct ShiftResponse {
    pub shift_id: String,
    pub reference_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub duration_minutes: u32,
    pub category: Option<String>,
    pub category_id: Option<i64>,
    pub description: Option<String>,
    pub sync_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Shift> for ShiftResponse {
    fn from(shift: Shift) -> Self {
        Self {
            shift_id: shift.shift_id().to_string(),
            reference_date: shift.reference_date(),
            start_time: shift.start_time(),
            end_time: shift.end_time(),
            duration_minutes: shift.duration_minutes(),
            category: shift.category().map(|category| category.name().to_owned()),
            category_id: shift.category().and_then(|category| category.catalog_id()),
            description: shift.description().map(ToOwned::to_owned),
            sync_token: shift.sync_token().map(ToOwned::to_owned),
            created_at: shift.created_at(),
            updated_at: shift.updated_at(),
        }
    }
}
