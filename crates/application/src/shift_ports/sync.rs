use async_trait::async_trait;
use shiftledger_core::{AppResult, TenantId};
use shiftledger_domain::{Shift, ShiftId};

/// Background job that pushes one shift to the external calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftSyncCommand {
    /// Owner of the shift.
    pub tenant_id: TenantId,
    /// Shift to synchronize.
    pub shift_id: ShiftId,
}

/// Fire-and-forget scheduling capability for sync jobs.
///
/// Implementations must not block the caller and must not report failures
/// back; a job that cannot be scheduled is logged and dropped.
pub trait ShiftSyncQueue: Send + Sync {
    /// Schedules one sync job.
    fn enqueue(&self, command: ShiftSyncCommand);
}

/// External calendar client.
#[async_trait]
pub trait CalendarSyncClient: Send + Sync {
    /// Creates or replaces the calendar event for a shift and returns its token.
    ///
    /// An existing token on the shift identifies the event to replace.
    async fn sync_shift(&self, shift: &Shift) -> AppResult<String>;
}
