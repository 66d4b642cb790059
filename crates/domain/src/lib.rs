//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod quota;
mod shift;
mod subscription;

pub use quota::{QuotaDecision, QuotaPeriod, evaluate_quota};
pub use shift::{
    SHIFT_CATEGORY_MAX_LENGTH, SHIFT_DESCRIPTION_MAX_LENGTH, Shift, ShiftCategory,
    ShiftCategoryAssignment, ShiftDraft, ShiftDraftInput, ShiftId, ShiftInput,
    shift_duration_minutes,
};
pub use subscription::{
    NewSubscription, Subscription, SubscriptionInput, SubscriptionPlan, SubscriptionStatus,
    TRIAL_LENGTH_DAYS,
};
