//! Subscription lookup and signup trials.

use std::sync::Arc;

use chrono::Utc;
use shiftledger_core::{AppError, AppResult, TenantContext};
use shiftledger_domain::{NewSubscription, Subscription};
use tracing::info;

use crate::UnitOfWorkFactory;

/// Reads and provisions tenant subscriptions.
#[derive(Clone)]
pub struct SubscriptionService {
    unit_of_work_factory: Arc<dyn UnitOfWorkFactory>,
}

impl SubscriptionService {
    /// Creates the service.
    #[must_use]
    pub fn new(unit_of_work_factory: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self {
            unit_of_work_factory,
        }
    }

    /// Returns the tenant's subscription without locking it.
    pub async fn get_subscription(&self, tenant: &TenantContext) -> AppResult<Subscription> {
        let tenant_id = tenant.tenant_id();
        let mut unit_of_work = self.unit_of_work_factory.begin(tenant_id).await?;
        let subscription = unit_of_work
            .subscriptions()
            .get_by_tenant(tenant_id, false)
            .await?;
        unit_of_work.rollback().await?;

        subscription.ok_or_else(|| {
            AppError::NotFound(format!("subscription for tenant '{tenant_id}' not found"))
        })
    }

    /// Starts the signup trial for a tenant that has no subscription yet.
    pub async fn start_trial(&self, tenant: &TenantContext) -> AppResult<Subscription> {
        let tenant_id = tenant.tenant_id();
        let mut unit_of_work = self.unit_of_work_factory.begin(tenant_id).await?;

        if unit_of_work
            .subscriptions()
            .get_by_tenant(tenant_id, true)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "tenant '{tenant_id}' already has a subscription"
            )));
        }

        let trial = NewSubscription::signup_trial(tenant_id, Utc::now());
        let (plan, status) = (trial.plan(), trial.status());
        let stored = unit_of_work.subscriptions().create(trial).await?;
        if stored.plan() != plan || stored.status() != status {
            return Err(AppError::Conflict(format!(
                "tenant '{tenant_id}' already has a subscription"
            )));
        }
        unit_of_work.commit().await?;

        info!(
            tenant_id = %tenant_id,
            period_end = ?stored.period_end(),
            "signup trial started"
        );
        Ok(stored)
    }
}
