//! Best-effort calendar synchronization of committed shifts.

use std::sync::Arc;

use chrono::Utc;
use shiftledger_core::AppResult;
use tracing::{error, info, warn};

use crate::{CalendarSyncClient, ShiftSyncCommand, UnitOfWorkFactory};

/// What one sync attempt did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The calendar returned a new token and it was stored.
    Synced {
        /// Stored calendar token.
        sync_token: String,
    },
    /// The calendar returned the token already stored.
    Unchanged,
    /// The shift no longer exists.
    ShiftMissing,
    /// The tenant has no paid subscription.
    NotEligible,
    /// A storage or calendar error was logged and dropped.
    Failed,
}

/// Runs sync jobs outside the request that scheduled them.
#[derive(Clone)]
pub struct ShiftSyncService {
    unit_of_work_factory: Arc<dyn UnitOfWorkFactory>,
    calendar_client: Arc<dyn CalendarSyncClient>,
}

impl ShiftSyncService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        unit_of_work_factory: Arc<dyn UnitOfWorkFactory>,
        calendar_client: Arc<dyn CalendarSyncClient>,
    ) -> Self {
        Self {
            unit_of_work_factory,
            calendar_client,
        }
    }

    /// Pushes one shift to the calendar and stores the returned token.
    ///
    /// Makes exactly one attempt. Failures are logged and reported as
    /// [`SyncOutcome::Failed`]; they never reach the caller as errors.
    pub async fn sync_shift(&self, command: ShiftSyncCommand) -> SyncOutcome {
        match self.try_sync_shift(command).await {
            Ok(outcome) => outcome,
            Err(sync_error) => {
                error!(
                    tenant_id = %command.tenant_id,
                    shift_id = %command.shift_id,
                    error = %sync_error,
                    "calendar sync failed"
                );
                SyncOutcome::Failed
            }
        }
    }

    async fn try_sync_shift(&self, command: ShiftSyncCommand) -> AppResult<SyncOutcome> {
        let ShiftSyncCommand {
            tenant_id,
            shift_id,
        } = command;
        let mut unit_of_work = self.unit_of_work_factory.begin(tenant_id).await?;

        let Some(shift) = unit_of_work.shifts().get(tenant_id, shift_id).await? else {
            warn!(tenant_id = %tenant_id, shift_id = %shift_id, "shift to sync no longer exists");
            return Ok(SyncOutcome::ShiftMissing);
        };

        let subscription = unit_of_work
            .subscriptions()
            .get_by_tenant(tenant_id, false)
            .await?;
        if subscription.is_none_or(|subscription| subscription.is_free()) {
            info!(tenant_id = %tenant_id, shift_id = %shift_id, "skipping sync for free tenant");
            return Ok(SyncOutcome::NotEligible);
        }

        let sync_token = self.calendar_client.sync_shift(&shift).await?;
        if shift.sync_token() == Some(sync_token.as_str()) {
            return Ok(SyncOutcome::Unchanged);
        }

        let synced = shift.with_sync_token(sync_token.clone(), Utc::now());
        unit_of_work.shifts().update(&synced).await?;
        unit_of_work.commit().await?;

        info!(tenant_id = %tenant_id, shift_id = %shift_id, "shift synced to calendar");
        Ok(SyncOutcome::Synced { sync_token })
    }
}
