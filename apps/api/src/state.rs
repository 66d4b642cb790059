use shiftledger_application::{
    ShiftCreationService, ShiftQueryService, SubscriptionService, TenantResolver,
};
use sqlx::PgPool;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub shift_creation_service: ShiftCreationService,
    pub shift_query_service: ShiftQueryService,
    pub subscription_service: SubscriptionService,
    pub tenant_resolver: TenantResolver,
    pub postgres_pool: PgPool,
}
