//! Application services and ports.

#![forbid(unsafe_code)]

mod shift_creation_service;
mod shift_ports;
mod shift_query_service;
mod shift_sync_service;
mod subscription_service;
mod tenant_resolution;

#[cfg(test)]
mod test_support;

pub use shift_creation_service::{
    CreateShiftInput, DEFAULT_FREE_TIER_MAX_SHIFTS, ShiftCreationConfig, ShiftCreationService,
};
pub use shift_ports::{
    CalendarSyncClient, ShiftRepository, ShiftSyncCommand, ShiftSyncQueue, SubscriptionRepository,
    UnitOfWork, UnitOfWorkFactory, UnitOfWorkState,
};
pub use shift_query_service::{
    DEFAULT_RECENT_SHIFTS_LIMIT, MAX_RECENT_SHIFTS_LIMIT, ShiftQueryService,
};
pub use shift_sync_service::{ShiftSyncService, SyncOutcome};
pub use subscription_service::SubscriptionService;
pub use tenant_resolution::{BearerTokenVerifier, TenantCredentials, TenantResolver};
