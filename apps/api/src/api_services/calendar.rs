use std::sync::Arc;

use shiftledger_application::CalendarSyncClient;
use shiftledger_core::AppError;
use shiftledger_infrastructure::{CalDavCalendarSyncClient, CalDavConfig, DisabledCalendarSyncClient};

use crate::api_config::{ApiConfig, CalendarSyncProviderConfig};

pub(super) fn build_calendar_sync_client(
    config: &ApiConfig,
) -> Result<Arc<dyn CalendarSyncClient>, AppError> {
    let client: Arc<dyn CalendarSyncClient> = match &config.calendar_sync_provider {
        CalendarSyncProviderConfig::Disabled => Arc::new(DisabledCalendarSyncClient::new()),
        CalendarSyncProviderConfig::CalDav(caldav) => {
            let http_client = reqwest::Client::builder()
                .timeout(caldav.timeout)
                .build()
                .map_err(|error| {
                    AppError::Internal(format!("failed to build CalDAV http client: {error}"))
                })?;
            let caldav_config = CalDavConfig {
                calendar_url: caldav.calendar_url.clone(),
                username: caldav.username.clone(),
                password: caldav.password.clone(),
                timezone: caldav.timezone.clone(),
            };
            Arc::new(CalDavCalendarSyncClient::new(http_client, caldav_config)?)
        }
    };

    Ok(client)
}
