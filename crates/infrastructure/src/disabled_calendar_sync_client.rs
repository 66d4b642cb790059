//! Calendar client for deployments without a calendar server. Logs instead of syncing.

use async_trait::async_trait;
use shiftledger_application::CalendarSyncClient;
use shiftledger_core::AppResult;
use shiftledger_domain::Shift;
use tracing::info;

/// Calendar client that only logs the event it would have written.
#[derive(Clone)]
pub struct DisabledCalendarSyncClient;

impl DisabledCalendarSyncClient {
    /// Creates a new disabled calendar client.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for DisabledCalendarSyncClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CalendarSyncClient for DisabledCalendarSyncClient {
    async fn sync_shift(&self, shift: &Shift) -> AppResult<String> {
        let sync_token = shift
            .sync_token()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("local-{}", shift.shift_id()));

        info!(
            tenant_id = %shift.tenant_id(),
            shift_id = %shift.shift_id(),
            reference_date = %shift.reference_date(),
            sync_token = %sync_token,
            "calendar sync disabled, keeping local token"
        );

        Ok(sync_token)
    }
}
