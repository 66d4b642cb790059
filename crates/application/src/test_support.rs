//! In-process fakes shared by the service tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use shiftledger_core::{AppError, AppResult, TenantContext, TenantId};
use shiftledger_domain::{
    NewSubscription, Shift, ShiftCategory, ShiftDraft, ShiftId, ShiftInput, Subscription,
};
use tokio::sync::Mutex;

use crate::{
    CalendarSyncClient, ShiftRepository, ShiftSyncCommand, ShiftSyncQueue, SubscriptionRepository,
    UnitOfWork, UnitOfWorkFactory, UnitOfWorkState,
};

#[derive(Default)]
pub(crate) struct FakeStore {
    pub shifts: Vec<Shift>,
    pub subscriptions: HashMap<TenantId, Subscription>,
    pub categories: Vec<(TenantId, ShiftCategory)>,
    pub events: Vec<String>,
    pub fail_commit: bool,
}

#[derive(Clone, Default)]
pub(crate) struct FakeUnitOfWorkFactory {
    pub store: Arc<Mutex<FakeStore>>,
}

#[async_trait]
impl UnitOfWorkFactory for FakeUnitOfWorkFactory {
    async fn begin(&self, tenant_id: TenantId) -> AppResult<Box<dyn UnitOfWork>> {
        let store = self.store.lock().await;
        Ok(Box::new(FakeUnitOfWork {
            store: self.store.clone(),
            tenant_id,
            state: UnitOfWorkState::Open,
            shifts: store.shifts.clone(),
            subscriptions: store.subscriptions.clone(),
            categories: store.categories.clone(),
        }))
    }
}

/// Works on a snapshot of the store and publishes it on commit.
struct FakeUnitOfWork {
    store: Arc<Mutex<FakeStore>>,
    tenant_id: TenantId,
    state: UnitOfWorkState,
    shifts: Vec<Shift>,
    subscriptions: HashMap<TenantId, Subscription>,
    categories: Vec<(TenantId, ShiftCategory)>,
}

impl FakeUnitOfWork {
    fn ensure_open(&self) -> AppResult<()> {
        if self.state.is_open() {
            Ok(())
        } else {
            Err(AppError::Persistence("unit of work is closed".to_owned()))
        }
    }
}

#[async_trait]
impl UnitOfWork for FakeUnitOfWork {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    fn state(&self) -> UnitOfWorkState {
        self.state
    }

    fn shifts(&mut self) -> &mut dyn ShiftRepository {
        self
    }

    fn subscriptions(&mut self) -> &mut dyn SubscriptionRepository {
        self
    }

    async fn commit(&mut self) -> AppResult<()> {
        self.ensure_open()?;
        let mut store = self.store.lock().await;
        if store.fail_commit {
            self.state = UnitOfWorkState::RolledBack;
            store.events.push("rollback".to_owned());
            return Err(AppError::Persistence("commit failed".to_owned()));
        }

        store.shifts = std::mem::take(&mut self.shifts);
        store.subscriptions = std::mem::take(&mut self.subscriptions);
        store.events.push("commit".to_owned());
        self.state = UnitOfWorkState::Committed;
        Ok(())
    }

    async fn rollback(&mut self) -> AppResult<()> {
        self.ensure_open()?;
        self.store.lock().await.events.push("rollback".to_owned());
        self.state = UnitOfWorkState::RolledBack;
        Ok(())
    }
}

#[async_trait]
impl ShiftRepository for FakeUnitOfWork {
    async fn create(&mut self, draft: ShiftDraft) -> AppResult<Shift> {
        self.ensure_open()?;
        let now = Utc::now();
        let shift = Shift::new(ShiftInput {
            shift_id: ShiftId::new(),
            draft,
            sync_token: None,
            created_at: now,
            updated_at: now,
        });
        self.shifts.push(shift.clone());
        Ok(shift)
    }

    async fn get(&mut self, tenant_id: TenantId, shift_id: ShiftId) -> AppResult<Option<Shift>> {
        self.ensure_open()?;
        Ok(self
            .shifts
            .iter()
            .find(|shift| shift.tenant_id() == tenant_id && shift.shift_id() == shift_id)
            .cloned())
    }

    async fn list_by_period(
        &mut self,
        tenant_id: TenantId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<Shift>> {
        self.ensure_open()?;
        let mut shifts: Vec<Shift> = self
            .shifts
            .iter()
            .filter(|shift| {
                shift.tenant_id() == tenant_id
                    && shift.reference_date() >= start
                    && shift.reference_date() <= end
            })
            .cloned()
            .collect();
        shifts.sort_by_key(|shift| (shift.reference_date(), shift.start_time()));
        Ok(shifts)
    }

    async fn list_recent(&mut self, tenant_id: TenantId, limit: u32) -> AppResult<Vec<Shift>> {
        self.ensure_open()?;
        Ok(self
            .shifts
            .iter()
            .rev()
            .filter(|shift| shift.tenant_id() == tenant_id)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn update(&mut self, shift: &Shift) -> AppResult<()> {
        self.ensure_open()?;
        // Rows deleted by a committed writer are gone for this update too.
        let committed = self
            .store
            .lock()
            .await
            .shifts
            .iter()
            .any(|stored| stored.shift_id() == shift.shift_id());
        if !committed {
            return Err(AppError::NotFound(format!("shift '{}'", shift.shift_id())));
        }

        let stored = self
            .shifts
            .iter_mut()
            .find(|stored| {
                stored.tenant_id() == shift.tenant_id() && stored.shift_id() == shift.shift_id()
            })
            .ok_or_else(|| AppError::NotFound(format!("shift '{}'", shift.shift_id())))?;
        *stored = shift.clone();
        Ok(())
    }

    async fn delete(&mut self, tenant_id: TenantId, shift_id: ShiftId) -> AppResult<bool> {
        self.ensure_open()?;
        let before = self.shifts.len();
        self.shifts
            .retain(|shift| !(shift.tenant_id() == tenant_id && shift.shift_id() == shift_id));
        Ok(self.shifts.len() != before)
    }

    async fn count_by_period(
        &mut self,
        tenant_id: TenantId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<u32> {
        let shifts = self.list_by_period(tenant_id, start, end).await?;
        Ok(u32::try_from(shifts.len()).unwrap_or(u32::MAX))
    }

    async fn find_category_by_name(
        &mut self,
        tenant_id: TenantId,
        name: &str,
    ) -> AppResult<Option<ShiftCategory>> {
        self.ensure_open()?;
        Ok(self
            .categories
            .iter()
            .find(|(owner, category)| {
                *owner == tenant_id && category.name().eq_ignore_ascii_case(name)
            })
            .map(|(_, category)| category.clone()))
    }
}

#[async_trait]
impl SubscriptionRepository for FakeUnitOfWork {
    async fn get_by_tenant(
        &mut self,
        tenant_id: TenantId,
        _for_update: bool,
    ) -> AppResult<Option<Subscription>> {
        self.ensure_open()?;
        Ok(self.subscriptions.get(&tenant_id).cloned())
    }

    async fn create(&mut self, subscription: NewSubscription) -> AppResult<Subscription> {
        self.ensure_open()?;
        let tenant_id = subscription.tenant_id();
        let stored = self
            .subscriptions
            .entry(tenant_id)
            .or_insert_with(|| subscription.into_subscription(Utc::now()));
        Ok(stored.clone())
    }
}

/// Records scheduled jobs in the shared event log.
#[derive(Clone, Default)]
pub(crate) struct RecordingSyncQueue {
    pub store: Arc<Mutex<FakeStore>>,
    pub commands: Arc<std::sync::Mutex<Vec<ShiftSyncCommand>>>,
}

impl ShiftSyncQueue for RecordingSyncQueue {
    fn enqueue(&self, command: ShiftSyncCommand) {
        if let Ok(mut commands) = self.commands.lock() {
            commands.push(command);
        }
        if let Ok(mut store) = self.store.try_lock() {
            store.events.push("enqueue".to_owned());
        }
    }
}

impl RecordingSyncQueue {
    pub fn commands(&self) -> Vec<ShiftSyncCommand> {
        self.commands
            .lock()
            .map(|commands| commands.clone())
            .unwrap_or_default()
    }
}

/// Calendar client returning a fixed token or a fixed failure.
#[derive(Default)]
pub(crate) struct FakeCalendarSyncClient {
    pub token: Option<String>,
    pub calls: Mutex<u32>,
}

#[async_trait]
impl CalendarSyncClient for FakeCalendarSyncClient {
    async fn sync_shift(&self, shift: &Shift) -> AppResult<String> {
        *self.calls.lock().await += 1;
        match &self.token {
            Some(token) => Ok(token.clone()),
            None => Err(AppError::SyncFailure(format!(
                "calendar rejected shift '{}'",
                shift.shift_id()
            ))),
        }
    }
}

pub(crate) fn tenant(value: i64) -> TenantContext {
    TenantContext::new(TenantId::new(value).unwrap_or_else(|_| unreachable!()))
}

pub(crate) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

pub(crate) fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}
