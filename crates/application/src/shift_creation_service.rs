//! Quota-enforced shift creation.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use shiftledger_core::{AppResult, NonEmptyString, TenantContext, TenantId};
use shiftledger_domain::{
    NewSubscription, QuotaPeriod, Shift, ShiftCategoryAssignment, ShiftDraft, ShiftDraftInput,
    evaluate_quota,
};
use tracing::{info, warn};

use crate::{ShiftSyncCommand, ShiftSyncQueue, UnitOfWork, UnitOfWorkFactory};

/// Default number of shifts a free tenant may create per calendar month.
pub const DEFAULT_FREE_TIER_MAX_SHIFTS: u32 = 30;

/// Limits applied by [`ShiftCreationService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftCreationConfig {
    /// Shifts a free tenant may create per calendar month.
    pub free_tier_max_shifts: u32,
}

impl Default for ShiftCreationConfig {
    fn default() -> Self {
        Self {
            free_tier_max_shifts: DEFAULT_FREE_TIER_MAX_SHIFTS,
        }
    }
}

/// Caller-supplied fields of a new shift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateShiftInput {
    /// Calendar date the shift belongs to.
    pub reference_date: NaiveDate,
    /// Wall-clock start.
    pub start_time: NaiveTime,
    /// Wall-clock end; at or before start means the next day.
    pub end_time: NaiveTime,
    /// Category name, matched against stored categories.
    pub category: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
}

/// Creates shifts under the tenant's subscription lock.
#[derive(Clone)]
pub struct ShiftCreationService {
    unit_of_work_factory: Arc<dyn UnitOfWorkFactory>,
    sync_queue: Arc<dyn ShiftSyncQueue>,
    config: ShiftCreationConfig,
}

impl ShiftCreationService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        unit_of_work_factory: Arc<dyn UnitOfWorkFactory>,
        sync_queue: Arc<dyn ShiftSyncQueue>,
        config: ShiftCreationConfig,
    ) -> Self {
        Self {
            unit_of_work_factory,
            sync_queue,
            config,
        }
    }

    /// Creates one shift for the tenant.
    ///
    /// The subscription row is locked first, so concurrent creations for the
    /// same tenant run the count-then-insert sequence one at a time. Free
    /// tenants are limited per calendar month of the reference date. Paid
    /// tenants get a calendar sync job scheduled once the insert is committed.
    pub async fn create_shift(
        &self,
        tenant: &TenantContext,
        input: CreateShiftInput,
    ) -> AppResult<Shift> {
        let tenant_id = tenant.tenant_id();
        let mut unit_of_work = self.unit_of_work_factory.begin(tenant_id).await?;

        let subscription = match unit_of_work
            .subscriptions()
            .get_by_tenant(tenant_id, true)
            .await?
        {
            Some(subscription) => subscription,
            None => {
                info!(tenant_id = %tenant_id, "provisioning free subscription");
                unit_of_work
                    .subscriptions()
                    .create(NewSubscription::legacy_free(tenant_id))
                    .await?
            }
        };

        let is_free = subscription.is_free();
        if is_free {
            let period = QuotaPeriod::containing(input.reference_date);
            let current = unit_of_work
                .shifts()
                .count_by_period(tenant_id, period.start(), period.end())
                .await?;

            let limit = self.config.free_tier_max_shifts;
            if let Err(error) = evaluate_quota(&subscription, current, limit).into_result() {
                warn!(
                    tenant_id = %tenant_id,
                    period_start = %period.start(),
                    current,
                    limit,
                    "free tier shift quota exceeded"
                );
                if let Err(rollback_error) = unit_of_work.rollback().await {
                    warn!(tenant_id = %tenant_id, error = %rollback_error, "rollback failed");
                }
                return Err(error);
            }
        }

        let category = resolve_category(unit_of_work.as_mut(), tenant_id, input.category).await?;
        let draft = ShiftDraft::new(ShiftDraftInput {
            tenant_id,
            reference_date: input.reference_date,
            start_time: input.start_time,
            end_time: input.end_time,
            category,
            description: input.description,
        })?;

        let shift = unit_of_work.shifts().create(draft).await?;
        unit_of_work.commit().await?;

        info!(
            tenant_id = %tenant_id,
            shift_id = %shift.shift_id(),
            duration_minutes = shift.duration_minutes(),
            "shift created"
        );

        if !is_free {
            self.sync_queue.enqueue(ShiftSyncCommand {
                tenant_id,
                shift_id: shift.shift_id(),
            });
        }

        Ok(shift)
    }
}

/// Links the name to a stored category when one matches, else keeps it as text.
async fn resolve_category(
    unit_of_work: &mut dyn UnitOfWork,
    tenant_id: TenantId,
    category: Option<String>,
) -> AppResult<Option<ShiftCategoryAssignment>> {
    let Some(name) = category
        .map(|name| name.trim().to_owned())
        .filter(|name| !name.is_empty())
    else {
        return Ok(None);
    };

    let assignment = match unit_of_work
        .shifts()
        .find_category_by_name(tenant_id, &name)
        .await?
    {
        Some(stored) => ShiftCategoryAssignment::Catalog(stored),
        None => ShiftCategoryAssignment::FreeText(NonEmptyString::new(name)?),
    };

    Ok(Some(assignment))
}

#[cfg(test)]
mod tests;
