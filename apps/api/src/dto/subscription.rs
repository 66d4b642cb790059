use chrono::{DateTime, Utc};
use serde::Serialize;
use shiftledger_domain::{Subscription, SubscriptionPlan, SubscriptionStatus};

/// API representation of a tenant subscription.
#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub plan: SubscriptionPlan,
    pub status: SubscriptionStatus,
    /// Whether creations are limited by the free-tier quota.
    pub is_free: bool,
    pub period_start: Option<DateTime<Utc>>,
    pub period_end: Option<DateTime<Utc>>,
    pub billing_reference: Option<String>,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(subscription: Subscription) -> Self {
        Self {
            plan: subscription.plan(),
            status: subscription.status(),
            is_free: subscription.is_free(),
            period_start: subscription.period_start(),
            period_end: subscription.period_end(),
            billing_reference: subscription.billing_reference().map(ToOwned::to_owned),
        }
    }
}
