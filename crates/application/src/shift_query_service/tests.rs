use std::sync::Arc;

use shiftledger_core::{AppError, TenantContext};
use shiftledger_domain::ShiftId;

use crate::test_support::{FakeUnitOfWorkFactory, RecordingSyncQueue, date, tenant, time};
use crate::{CreateShiftInput, ShiftCreationConfig, ShiftCreationService};

use super::ShiftQueryService;

struct Fixture {
    creation: ShiftCreationService,
    queries: ShiftQueryService,
}

fn fixture() -> Fixture {
    let factory = FakeUnitOfWorkFactory::default();
    Fixture {
        creation: ShiftCreationService::new(
            Arc::new(factory.clone()),
            Arc::new(RecordingSyncQueue::default()),
            ShiftCreationConfig::default(),
        ),
        queries: ShiftQueryService::new(Arc::new(factory)),
    }
}

async fn create(fixture: &Fixture, context: &TenantContext, day: u32, start_hour: u32) -> ShiftId {
    fixture
        .creation
        .create_shift(
            context,
            CreateShiftInput {
                reference_date: date(2025, 5, day),
                start_time: time(start_hour, 0),
                end_time: time(start_hour + 1, 0),
                category: None,
                description: None,
            },
        )
        .await
        .map(|shift| shift.shift_id())
        .unwrap_or_else(|_| unreachable!())
}

#[tokio::test]
async fn period_listing_is_ordered_and_tenant_scoped() {
    let fixture = fixture();
    let owner = tenant(1);
    let other = tenant(2);
    create(&fixture, &owner, 10, 14).await;
    create(&fixture, &owner, 3, 9).await;
    create(&fixture, &owner, 10, 8).await;
    create(&fixture, &other, 5, 9).await;

    let shifts = fixture
        .queries
        .list_shifts_for_period(&owner, date(2025, 5, 1), date(2025, 5, 31))
        .await
        .unwrap_or_default();

    let keys: Vec<_> = shifts
        .iter()
        .map(|shift| (shift.reference_date(), shift.start_time()))
        .collect();
    assert_eq!(
        keys,
        vec![
            (date(2025, 5, 3), time(9, 0)),
            (date(2025, 5, 10), time(8, 0)),
            (date(2025, 5, 10), time(14, 0)),
        ]
    );
}

#[tokio::test]
async fn inverted_period_is_rejected() {
    let fixture = fixture();
    let result = fixture
        .queries
        .list_shifts_for_period(&tenant(1), date(2025, 5, 31), date(2025, 5, 1))
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn recent_listing_defaults_to_five_newest() {
    let fixture = fixture();
    let owner = tenant(1);
    let mut created = Vec::new();
    for day in 1..=7 {
        created.push(create(&fixture, &owner, day, 9).await);
    }

    let recent = fixture
        .queries
        .list_recent_shifts(&owner, None)
        .await
        .unwrap_or_default();

    let recent_ids: Vec<_> = recent.iter().map(|shift| shift.shift_id()).collect();
    let expected: Vec<_> = created.iter().rev().take(5).copied().collect();
    assert_eq!(recent_ids, expected);

    let single = fixture
        .queries
        .list_recent_shifts(&owner, Some(0))
        .await
        .unwrap_or_default();
    assert_eq!(single.len(), 1);
}

#[tokio::test]
async fn foreign_shift_cannot_be_read_or_deleted() {
    let fixture = fixture();
    let owner = tenant(1);
    let intruder = tenant(2);
    let shift_id = create(&fixture, &owner, 1, 9).await;

    assert!(matches!(
        fixture.queries.get_shift(&intruder, shift_id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        fixture.queries.delete_shift(&intruder, shift_id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(fixture.queries.get_shift(&owner, shift_id).await.is_ok());
}

#[tokio::test]
async fn deleted_shift_is_gone() {
    let fixture = fixture();
    let owner = tenant(1);
    let shift_id = create(&fixture, &owner, 1, 9).await;

    assert!(fixture.queries.delete_shift(&owner, shift_id).await.is_ok());
    assert!(matches!(
        fixture.queries.get_shift(&owner, shift_id).await,
        Err(AppError::NotFound(_))
    ));
}
