mod common;
mod shifts;
mod subscription;

pub use common::HealthResponse;
pub use shifts::{CreateShiftRequest, ShiftResponse};
pub use subscription::SubscriptionResponse;
