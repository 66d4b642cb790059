use std::sync::Arc;

use chrono::Utc;
use shiftledger_core::AppError;
use shiftledger_domain::{NewSubscription, ShiftCategory, SubscriptionPlan, SubscriptionStatus};

use crate::test_support::{
    FakeStore, FakeUnitOfWorkFactory, RecordingSyncQueue, date, tenant, time,
};

use super::{CreateShiftInput, ShiftCreationConfig, ShiftCreationService};

fn build_service(limit: u32) -> (ShiftCreationService, FakeUnitOfWorkFactory, RecordingSyncQueue) {
    let factory = FakeUnitOfWorkFactory::default();
    let queue = RecordingSyncQueue {
        store: factory.store.clone(),
        ..RecordingSyncQueue::default()
    };
    let service = ShiftCreationService::new(
        Arc::new(factory.clone()),
        Arc::new(queue.clone()),
        ShiftCreationConfig {
            free_tier_max_shifts: limit,
        },
    );

    (service, factory, queue)
}

fn input_on(day: u32, month: u32) -> CreateShiftInput {
    CreateShiftInput {
        reference_date: date(2025, month, day),
        start_time: time(9, 0),
        end_time: time(18, 0),
        category: None,
        description: None,
    }
}

async fn seed_subscription(store: &tokio::sync::Mutex<FakeStore>, subscription: NewSubscription) {
    let subscription = subscription.into_subscription(Utc::now());
    store
        .lock()
        .await
        .subscriptions
        .insert(subscription.tenant_id(), subscription);
}

#[tokio::test]
async fn first_creation_provisions_a_free_subscription() {
    let (service, factory, queue) = build_service(30);
    let context = tenant(42);

    let created = service.create_shift(&context, input_on(1, 5)).await;

    assert!(created.is_ok());
    let created = created.unwrap_or_else(|_| unreachable!());
    assert_eq!(created.duration_minutes(), 540);
    assert_eq!(created.tenant_id(), context.tenant_id());

    let store = factory.store.lock().await;
    let subscription = store.subscriptions.get(&context.tenant_id());
    assert_eq!(
        subscription.map(|subscription| (subscription.plan(), subscription.status())),
        Some((SubscriptionPlan::Free, SubscriptionStatus::Active))
    );
    assert_eq!(store.shifts.len(), 1);
    drop(store);
    assert!(queue.commands().is_empty());
}

#[tokio::test]
async fn free_tenant_is_rejected_after_the_monthly_limit() {
    let (service, factory, _queue) = build_service(30);
    let context = tenant(42);

    for day in 1..=30 {
        let created = service.create_shift(&context, input_on(day, 5)).await;
        assert!(created.is_ok(), "creation {day} should be accepted");
    }

    let rejected = service.create_shift(&context, input_on(31, 5)).await;
    assert!(matches!(
        rejected,
        Err(AppError::QuotaExceeded {
            limit: 30,
            current: 30
        })
    ));

    let store = factory.store.lock().await;
    assert_eq!(store.shifts.len(), 30);
    assert_eq!(store.events.last().map(String::as_str), Some("rollback"));
}

#[tokio::test]
async fn next_month_starts_a_fresh_quota() {
    let (service, factory, _queue) = build_service(30);
    let context = tenant(42);

    for day in 1..=30 {
        let created = service.create_shift(&context, input_on(day, 5)).await;
        assert!(created.is_ok());
    }

    let june = service.create_shift(&context, input_on(1, 6)).await;
    assert!(june.is_ok());
    assert_eq!(factory.store.lock().await.shifts.len(), 31);
}

#[tokio::test]
async fn back_dated_shift_counts_against_its_own_month() {
    let (service, _factory, _queue) = build_service(1);
    let context = tenant(42);

    let april = service.create_shift(&context, input_on(15, 4)).await;
    let may = service.create_shift(&context, input_on(15, 5)).await;
    let april_again = service.create_shift(&context, input_on(16, 4)).await;

    assert!(april.is_ok());
    assert!(may.is_ok());
    assert!(matches!(
        april_again,
        Err(AppError::QuotaExceeded {
            limit: 1,
            current: 1
        })
    ));
}

#[tokio::test]
async fn paid_tenant_is_unlimited_and_sync_is_scheduled_after_commit() {
    let (service, factory, queue) = build_service(2);
    let context = tenant(7);
    seed_subscription(
        &factory.store,
        NewSubscription::signup_trial(context.tenant_id(), Utc::now()),
    )
    .await;

    for day in 1..=5 {
        let created = service.create_shift(&context, input_on(day, 5)).await;
        assert!(created.is_ok());
    }

    let commands = queue.commands();
    assert_eq!(commands.len(), 5);
    assert!(
        commands
            .iter()
            .all(|command| command.tenant_id == context.tenant_id())
    );

    let events = factory.store.lock().await.events.clone();
    assert_eq!(events.first().map(String::as_str), Some("commit"));
    assert_eq!(events.get(1).map(String::as_str), Some("enqueue"));
}

#[tokio::test]
async fn lapsed_paid_subscription_falls_back_to_free_tier() {
    let (service, factory, queue) = build_service(1);
    let context = tenant(7);
    let now = Utc::now();
    let lapsed = shiftledger_domain::Subscription::new(shiftledger_domain::SubscriptionInput {
        tenant_id: context.tenant_id(),
        plan: SubscriptionPlan::Paid,
        status: SubscriptionStatus::Canceled,
        period_start: None,
        period_end: None,
        billing_reference: None,
        created_at: now,
        updated_at: now,
    });
    factory
        .store
        .lock()
        .await
        .subscriptions
        .insert(context.tenant_id(), lapsed);

    assert!(service.create_shift(&context, input_on(1, 5)).await.is_ok());
    assert!(matches!(
        service.create_shift(&context, input_on(2, 5)).await,
        Err(AppError::QuotaExceeded { .. })
    ));
    assert!(queue.commands().is_empty());
}

#[tokio::test]
async fn commit_failure_does_not_schedule_sync() {
    let (service, factory, queue) = build_service(30);
    let context = tenant(7);
    seed_subscription(
        &factory.store,
        NewSubscription::signup_trial(context.tenant_id(), Utc::now()),
    )
    .await;
    factory.store.lock().await.fail_commit = true;

    let result = service.create_shift(&context, input_on(1, 5)).await;

    assert!(matches!(result, Err(AppError::Persistence(_))));
    assert!(queue.commands().is_empty());
    assert!(factory.store.lock().await.shifts.is_empty());
}

#[tokio::test]
async fn category_links_to_stored_category_case_insensitively() {
    let (service, factory, _queue) = build_service(30);
    let context = tenant(42);
    let night = ShiftCategory::new(3, "Night").unwrap_or_else(|_| unreachable!());
    factory
        .store
        .lock()
        .await
        .categories
        .push((context.tenant_id(), night));

    let mut linked_input = input_on(1, 5);
    linked_input.category = Some("  night ".to_owned());
    let linked = service.create_shift(&context, linked_input).await;

    let mut free_input = input_on(2, 5);
    free_input.category = Some("Overtime".to_owned());
    let free_text = service.create_shift(&context, free_input).await;

    let linked = linked.unwrap_or_else(|_| unreachable!());
    let free_text = free_text.unwrap_or_else(|_| unreachable!());
    assert_eq!(linked.category().and_then(|category| category.catalog_id()), Some(3));
    assert_eq!(
        free_text.category().and_then(|category| category.free_text()),
        Some("Overtime")
    );
}

#[tokio::test]
async fn other_tenants_categories_are_not_linked() {
    let (service, factory, _queue) = build_service(30);
    let night = ShiftCategory::new(3, "Night").unwrap_or_else(|_| unreachable!());
    factory
        .store
        .lock()
        .await
        .categories
        .push((tenant(1).tenant_id(), night));

    let mut input = input_on(1, 5);
    input.category = Some("Night".to_owned());
    let created = service
        .create_shift(&tenant(2), input)
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(created.category().and_then(|category| category.catalog_id()), None);
}

#[tokio::test]
async fn invalid_description_leaves_nothing_behind() {
    let (service, factory, _queue) = build_service(30);
    let mut input = input_on(1, 5);
    input.description = Some("x".repeat(300));

    let result = service.create_shift(&tenant(42), input).await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    let store = factory.store.lock().await;
    assert!(store.shifts.is_empty());
    assert!(store.subscriptions.is_empty());
}
