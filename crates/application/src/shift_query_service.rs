//! Tenant-scoped shift reads and deletion.

use std::sync::Arc;

use chrono::NaiveDate;
use shiftledger_core::{AppError, AppResult, TenantContext};
use shiftledger_domain::{Shift, ShiftId};
use tracing::info;

use crate::UnitOfWorkFactory;

/// Number of shifts returned by [`ShiftQueryService::list_recent_shifts`] by default.
pub const DEFAULT_RECENT_SHIFTS_LIMIT: u32 = 5;

/// Upper bound accepted for recent shift listings.
pub const MAX_RECENT_SHIFTS_LIMIT: u32 = 100;

/// Reads and deletes shifts, one unit of work per call.
#[derive(Clone)]
pub struct ShiftQueryService {
    unit_of_work_factory: Arc<dyn UnitOfWorkFactory>,
}

impl ShiftQueryService {
    /// Creates the service.
    #[must_use]
    pub fn new(unit_of_work_factory: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self {
            unit_of_work_factory,
        }
    }

    /// Returns one shift owned by the tenant.
    pub async fn get_shift(&self, tenant: &TenantContext, shift_id: ShiftId) -> AppResult<Shift> {
        let tenant_id = tenant.tenant_id();
        let mut unit_of_work = self.unit_of_work_factory.begin(tenant_id).await?;
        let shift = unit_of_work.shifts().get(tenant_id, shift_id).await?;
        unit_of_work.rollback().await?;

        shift.ok_or_else(|| AppError::NotFound(format!("shift '{shift_id}' not found")))
    }

    /// Lists shifts with a reference date in `[start, end]`.
    pub async fn list_shifts_for_period(
        &self,
        tenant: &TenantContext,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<Shift>> {
        if start > end {
            return Err(AppError::Validation(format!(
                "period start {start} is after period end {end}"
            )));
        }

        let tenant_id = tenant.tenant_id();
        let mut unit_of_work = self.unit_of_work_factory.begin(tenant_id).await?;
        let shifts = unit_of_work
            .shifts()
            .list_by_period(tenant_id, start, end)
            .await?;
        unit_of_work.rollback().await?;

        Ok(shifts)
    }

    /// Lists the most recently created shifts, newest first.
    ///
    /// `limit` defaults to five and is clamped to `1..=100`.
    pub async fn list_recent_shifts(
        &self,
        tenant: &TenantContext,
        limit: Option<u32>,
    ) -> AppResult<Vec<Shift>> {
        let limit = limit
            .unwrap_or(DEFAULT_RECENT_SHIFTS_LIMIT)
            .clamp(1, MAX_RECENT_SHIFTS_LIMIT);

        let tenant_id = tenant.tenant_id();
        let mut unit_of_work = self.unit_of_work_factory.begin(tenant_id).await?;
        let shifts = unit_of_work.shifts().list_recent(tenant_id, limit).await?;
        unit_of_work.rollback().await?;

        Ok(shifts)
    }

    /// Deletes one shift owned by the tenant.
    pub async fn delete_shift(&self, tenant: &TenantContext, shift_id: ShiftId) -> AppResult<()> {
        let tenant_id = tenant.tenant_id();
        let mut unit_of_work = self.unit_of_work_factory.begin(tenant_id).await?;
        if !unit_of_work.shifts().delete(tenant_id, shift_id).await? {
            return Err(AppError::NotFound(format!("shift '{shift_id}' not found")));
        }
        unit_of_work.commit().await?;

        info!(tenant_id = %tenant_id, shift_id = %shift_id, "shift deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests;
