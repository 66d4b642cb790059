use std::sync::Arc;

use shiftledger_application::{
    ShiftCreationConfig, ShiftCreationService, ShiftQueryService, ShiftSyncService,
    SubscriptionService, TenantResolver, UnitOfWorkFactory,
};
use shiftledger_core::AppError;
use shiftledger_infrastructure::{
    JwtBearerTokenVerifier, PostgresUnitOfWorkFactory, TokioShiftSyncQueue,
};
use sqlx::PgPool;
use tokio::task::JoinHandle;

use crate::api_config::ApiConfig;
use crate::state::AppState;

use super::calendar::build_calendar_sync_client;

/// Wires services and starts the background sync dispatcher.
///
/// The returned handle finishes once every clone of the state is dropped and
/// the queued sync jobs have run.
pub fn build_app_state(
    pool: PgPool,
    config: &ApiConfig,
) -> Result<(AppState, JoinHandle<()>), AppError> {
    let unit_of_work_factory: Arc<dyn UnitOfWorkFactory> = Arc::new(
        PostgresUnitOfWorkFactory::new(pool.clone(), config.db_lock_timeout),
    );

    let calendar_client = build_calendar_sync_client(config)?;
    let (sync_queue, sync_dispatcher) = TokioShiftSyncQueue::start(
        ShiftSyncService::new(unit_of_work_factory.clone(), calendar_client),
        config.sync_queue_capacity,
        config.sync_workers,
    );

    let tenant_resolver = TenantResolver::new(
        config.internal_api_key.as_str(),
        Arc::new(JwtBearerTokenVerifier::new(config.jwt_secret.as_str())),
    );

    let state = AppState {
        shift_creation_service: ShiftCreationService::new(
            unit_of_work_factory.clone(),
            Arc::new(sync_queue),
            ShiftCreationConfig {
                free_tier_max_shifts: config.free_tier_max_shifts,
            },
        ),
        shift_query_service: ShiftQueryService::new(unit_of_work_factory.clone()),
        subscription_service: SubscriptionService::new(unit_of_work_factory),
        tenant_resolver,
        postgres_pool: pool,
    };

    Ok((state, sync_dispatcher))
}
