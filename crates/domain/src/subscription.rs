//! Subscription types and plan entitlement rules.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use shiftledger_core::{AppError, AppResult, TenantId};

/// Length of the trial granted on signup.
pub const TRIAL_LENGTH_DAYS: i64 = 14;

/// Billing plan of a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionPlan {
    /// Quota-limited plan.
    Free,
    /// Unlimited plan.
    Paid,
}

impl SubscriptionPlan {
    /// Returns the stable storage value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Paid => "paid",
        }
    }

    /// Parses a storage value.
    ///
    /// `pro` is accepted as an alias written by the billing integration.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "free" => Ok(Self::Free),
            "paid" | "pro" => Ok(Self::Paid),
            _ => Err(AppError::Validation(format!(
                "unknown subscription plan '{value}'"
            ))),
        }
    }
}

/// Billing status of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Never activated.
    Inactive,
    /// Paid up.
    Active,
    /// Inside the signup trial.
    Trialing,
    /// Canceled by the tenant or the provider.
    Canceled,
    /// Payment failed and is being retried by the provider.
    PastDue,
}

impl SubscriptionStatus {
    /// Returns the stable storage value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Active => "active",
            Self::Trialing => "trialing",
            Self::Canceled => "canceled",
            Self::PastDue => "past_due",
        }
    }

    /// Parses a storage value.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "inactive" => Ok(Self::Inactive),
            "active" => Ok(Self::Active),
            "trialing" | "trial" => Ok(Self::Trialing),
            "canceled" => Ok(Self::Canceled),
            "past_due" => Ok(Self::PastDue),
            _ => Err(AppError::Validation(format!(
                "unknown subscription status '{value}'"
            ))),
        }
    }

    /// Returns whether the status grants the plan's entitlements.
    #[must_use]
    pub fn is_active_like(self) -> bool {
        matches!(self, Self::Active | Self::Trialing)
    }
}

/// Input payload used to build a subscription projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionInput {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Billing plan.
    pub plan: SubscriptionPlan,
    /// Billing status.
    pub status: SubscriptionStatus,
    /// Start of the paid or trial period.
    pub period_start: Option<DateTime<Utc>>,
    /// End of the paid or trial period.
    pub period_end: Option<DateTime<Utc>>,
    /// External billing provider reference.
    pub billing_reference: Option<String>,
    /// Insert timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// The single subscription row of a tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    tenant_id: TenantId,
    plan: SubscriptionPlan,
    status: SubscriptionStatus,
    period_start: Option<DateTime<Utc>>,
    period_end: Option<DateTime<Utc>>,
    billing_reference: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Creates a subscription projection.
    #[must_use]
    pub fn new(input: SubscriptionInput) -> Self {
        Self {
            tenant_id: input.tenant_id,
            plan: input.plan,
            status: input.status,
            period_start: input.period_start,
            period_end: input.period_end,
            billing_reference: input.billing_reference,
            created_at: input.created_at,
            updated_at: input.updated_at,
        }
    }

    /// Returns whether the tenant is limited by the free-tier quota.
    ///
    /// True for the free plan and for any plan whose status is not
    /// active-like (canceled, past due, inactive).
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.plan == SubscriptionPlan::Free || !self.status.is_active_like()
    }

    /// Returns the owning tenant.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the billing plan.
    #[must_use]
    pub fn plan(&self) -> SubscriptionPlan {
        self.plan
    }

    /// Returns the billing status.
    #[must_use]
    pub fn status(&self) -> SubscriptionStatus {
        self.status
    }

    /// Returns the period start.
    #[must_use]
    pub fn period_start(&self) -> Option<DateTime<Utc>> {
        self.period_start
    }

    /// Returns the period end.
    #[must_use]
    pub fn period_end(&self) -> Option<DateTime<Utc>> {
        self.period_end
    }

    /// Returns the external billing reference.
    #[must_use]
    pub fn billing_reference(&self) -> Option<&str> {
        self.billing_reference.as_deref()
    }

    /// Returns the insert timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Subscription row that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubscription {
    tenant_id: TenantId,
    plan: SubscriptionPlan,
    status: SubscriptionStatus,
    period_start: Option<DateTime<Utc>>,
    period_end: Option<DateTime<Utc>>,
    billing_reference: Option<String>,
}

impl NewSubscription {
    /// Default row for tenants that predate subscriptions.
    #[must_use]
    pub fn legacy_free(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            plan: SubscriptionPlan::Free,
            status: SubscriptionStatus::Active,
            period_start: None,
            period_end: None,
            billing_reference: None,
        }
    }

    /// Paid trial granted when a tenant signs up.
    #[must_use]
    pub fn signup_trial(tenant_id: TenantId, now: DateTime<Utc>) -> Self {
        Self {
            tenant_id,
            plan: SubscriptionPlan::Paid,
            status: SubscriptionStatus::Trialing,
            period_start: Some(now),
            period_end: Some(now + Duration::days(TRIAL_LENGTH_DAYS)),
            billing_reference: Some(format!("trial_{tenant_id}")),
        }
    }

    /// Returns the owning tenant.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the billing plan.
    #[must_use]
    pub fn plan(&self) -> SubscriptionPlan {
        self.plan
    }

    /// Returns the billing status.
    #[must_use]
    pub fn status(&self) -> SubscriptionStatus {
        self.status
    }

    /// Returns the period start.
    #[must_use]
    pub fn period_start(&self) -> Option<DateTime<Utc>> {
        self.period_start
    }

    /// Returns the period end.
    #[must_use]
    pub fn period_end(&self) -> Option<DateTime<Utc>> {
        self.period_end
    }

    /// Returns the external billing reference.
    #[must_use]
    pub fn billing_reference(&self) -> Option<&str> {
        self.billing_reference.as_deref()
    }

    /// Builds the stored projection once timestamps are known.
    #[must_use]
    pub fn into_subscription(self, created_at: DateTime<Utc>) -> Subscription {
        Subscription::new(SubscriptionInput {
            tenant_id: self.tenant_id,
            plan: self.plan,
            status: self.status,
            period_start: self.period_start,
            period_end: self.period_end,
            billing_reference: self.billing_reference,
            created_at,
            updated_at: created_at,
        })
    }
}
