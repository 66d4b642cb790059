use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};
use shiftledger_application::{
    CreateShiftInput, ShiftCreationConfig, ShiftCreationService, ShiftSyncCommand, ShiftSyncQueue,
    UnitOfWorkFactory, UnitOfWorkState,
};
use shiftledger_core::{AppError, TenantContext, TenantId};
use shiftledger_domain::{NewSubscription, SubscriptionPlan};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use super::PostgresUnitOfWorkFactory;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

struct DiscardingSyncQueue;

impl ShiftSyncQueue for DiscardingSyncQueue {
    fn enqueue(&self, _command: ShiftSyncCommand) {}
}

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres unit of work tests: {error}");
    }

    Some(pool)
}

fn unique_tenant() -> TenantId {
    let value = i64::try_from(Uuid::new_v4().as_u128() >> 66).unwrap_or(1) + 1;
    TenantId::new(value).unwrap_or_else(|_| unreachable!())
}

fn may_shift(day: u32) -> CreateShiftInput {
    CreateShiftInput {
        reference_date: NaiveDate::from_ymd_opt(2025, 5, day).unwrap_or(NaiveDate::MIN),
        start_time: NaiveTime::from_hms_opt(22, 0, 0).unwrap_or(NaiveTime::MIN),
        end_time: NaiveTime::from_hms_opt(6, 0, 0).unwrap_or(NaiveTime::MIN),
        category: None,
        description: Some("night".to_owned()),
    }
}

fn creation_service(factory: &PostgresUnitOfWorkFactory) -> ShiftCreationService {
    ShiftCreationService::new(
        Arc::new(factory.clone()),
        Arc::new(DiscardingSyncQueue),
        ShiftCreationConfig {
            free_tier_max_shifts: 30,
        },
    )
}

#[tokio::test]
async fn concurrent_free_tier_creations_stop_at_the_limit() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let factory = PostgresUnitOfWorkFactory::new(pool, Duration::from_secs(30));
    let service = creation_service(&factory);
    let context = TenantContext::new(unique_tenant());

    let mut handles = Vec::new();
    for attempt in 0..50_u32 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service.create_shift(&context, may_shift(attempt % 28 + 1)).await
        }));
    }

    let mut created = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await {
            Ok(Ok(_)) => created += 1,
            Ok(Err(AppError::QuotaExceeded { limit: 30, .. })) => rejected += 1,
            Ok(Err(error)) => panic!("unexpected error: {error}"),
            Err(error) => panic!("task failed: {error}"),
        }
    }

    assert_eq!(created, 30);
    assert_eq!(rejected, 20);

    let mut unit_of_work = factory
        .begin(context.tenant_id())
        .await
        .unwrap_or_else(|_| unreachable!());
    let stored = unit_of_work
        .shifts()
        .count_by_period(
            context.tenant_id(),
            NaiveDate::from_ymd_opt(2025, 5, 1).unwrap_or(NaiveDate::MIN),
            NaiveDate::from_ymd_opt(2025, 5, 31).unwrap_or(NaiveDate::MIN),
        )
        .await;
    assert_eq!(stored.ok(), Some(30));
}

#[tokio::test]
async fn racing_first_time_provisioning_creates_one_subscription() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let factory = PostgresUnitOfWorkFactory::new(pool.clone(), Duration::from_secs(30));
    let tenant_id = unique_tenant();

    let mut handles = Vec::new();
    for _ in 0..10 {
        let factory = factory.clone();
        handles.push(tokio::spawn(async move {
            let mut unit_of_work = factory.begin(tenant_id).await?;
            let subscription = unit_of_work
                .subscriptions()
                .create(NewSubscription::legacy_free(tenant_id))
                .await?;
            unit_of_work.commit().await?;
            Ok::<_, AppError>(subscription)
        }));
    }

    for handle in handles {
        let result = handle.await;
        assert!(matches!(result, Ok(Ok(ref subscription)) if subscription.plan() == SubscriptionPlan::Free));
    }

    let mut unit_of_work = factory
        .begin(tenant_id)
        .await
        .unwrap_or_else(|_| unreachable!());
    let stored = unit_of_work
        .subscriptions()
        .get_by_tenant(tenant_id, false)
        .await;
    assert!(matches!(stored, Ok(Some(_))));

    let mut transaction = pool.begin().await.unwrap_or_else(|_| unreachable!());
    let bound = sqlx::query("SELECT set_config('app.current_tenant_id', $1, true)")
        .bind(tenant_id.to_string())
        .execute(&mut *transaction)
        .await;
    assert!(bound.is_ok());
    let rows = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM subscriptions WHERE tenant_id = $1",
    )
    .bind(tenant_id.as_i64())
    .fetch_one(&mut *transaction)
    .await;
    assert_eq!(rows.ok(), Some(1));
}

#[tokio::test]
async fn shifts_of_other_tenants_are_invisible() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let factory = PostgresUnitOfWorkFactory::new(pool, Duration::from_secs(30));
    let service = creation_service(&factory);
    let owner = TenantContext::new(unique_tenant());
    let intruder = unique_tenant();

    let created = service
        .create_shift(&owner, may_shift(3))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(created.duration_minutes(), 480);

    let mut unit_of_work = factory
        .begin(intruder)
        .await
        .unwrap_or_else(|_| unreachable!());
    let seen = unit_of_work.shifts().get(intruder, created.shift_id()).await;
    assert!(matches!(seen, Ok(None)));
    let deleted = unit_of_work.shifts().delete(intruder, created.shift_id()).await;
    assert!(matches!(deleted, Ok(false)));
    assert!(unit_of_work.commit().await.is_ok());

    let mut unit_of_work = factory
        .begin(owner.tenant_id())
        .await
        .unwrap_or_else(|_| unreachable!());
    let seen = unit_of_work
        .shifts()
        .get(owner.tenant_id(), created.shift_id())
        .await;
    assert_eq!(
        seen.ok().flatten().map(|shift| shift.shift_id()),
        Some(created.shift_id())
    );
}

#[tokio::test]
async fn closed_unit_of_work_rejects_further_use() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let factory = PostgresUnitOfWorkFactory::new(pool, Duration::from_secs(30));
    let tenant_id = unique_tenant();
    let mut unit_of_work = factory
        .begin(tenant_id)
        .await
        .unwrap_or_else(|_| unreachable!());

    assert!(unit_of_work.rollback().await.is_ok());
    assert_eq!(unit_of_work.state(), UnitOfWorkState::RolledBack);
    assert!(matches!(
        unit_of_work
            .subscriptions()
            .get_by_tenant(tenant_id, false)
            .await,
        Err(AppError::Persistence(_))
    ));
    assert!(matches!(unit_of_work.commit().await, Err(AppError::Persistence(_))));
}

#[tokio::test]
async fn lock_wait_beyond_timeout_is_a_persistence_error() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let factory = PostgresUnitOfWorkFactory::new(pool, Duration::from_millis(200));
    let tenant_id = unique_tenant();

    let mut provision = factory
        .begin(tenant_id)
        .await
        .unwrap_or_else(|_| unreachable!());
    let created = provision
        .subscriptions()
        .create(NewSubscription::legacy_free(tenant_id))
        .await;
    assert!(created.is_ok());
    assert!(provision.commit().await.is_ok());

    let mut holder = factory
        .begin(tenant_id)
        .await
        .unwrap_or_else(|_| unreachable!());
    let held = holder.subscriptions().get_by_tenant(tenant_id, true).await;
    assert!(matches!(held, Ok(Some(_))));

    let mut waiter = factory
        .begin(tenant_id)
        .await
        .unwrap_or_else(|_| unreachable!());
    let waited = waiter.subscriptions().get_by_tenant(tenant_id, true).await;
    assert!(matches!(waited, Err(AppError::LockTimeout(_))));
}
