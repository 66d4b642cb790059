use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use shiftledger_application::{
    ShiftRepository, SubscriptionRepository, UnitOfWork, UnitOfWorkFactory, UnitOfWorkState,
};
use shiftledger_core::{AppError, AppResult, TenantId};
use shiftledger_domain::{
    NewSubscription, Shift, ShiftCategory, ShiftDraft, ShiftId, ShiftInput, Subscription,
};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};


#[derive(Debug, Clone)]
struct StoredShift {
    sequence: u64,
    shift: Shift,
}

#[derive(Debug, Default)]
struct InMemoryStore {
    shifts: RwLock<HashMap<ShiftId, StoredShift>>,
    subscriptions: RwLock<HashMap<TenantId, Subscription>>,
    categories: RwLock<Vec<(TenantId, ShiftCategory)>>,
    tenant_locks: Mutex<HashMap<TenantId, Arc<Mutex<()>>>>,
    next_sequence: AtomicU64,
    next_category_id: AtomicU64,
}

/// In-memory unit of work factory for local runs and tests.
///
/// Writes are staged per unit of work and published on commit. Locking a
/// tenant's subscription takes a per-tenant mutex held until the unit of work
/// ends, whether or not the row exists yet. A tenant's mutex is dropped from
/// the lock table once no unit of work holds or waits for it; an entry can
/// linger when the table is busy at release time, so the table grows at most
/// to the number of tenants seen.
#[derive(Debug, Clone)]
pub struct InMemoryUnitOfWorkFactory {
    store: Arc<InMemoryStore>,
    lock_timeout: Duration,
}

impl InMemoryUnitOfWorkFactory {
    /// Creates an empty store.
    #[must_use]
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            store: Arc::new(InMemoryStore::default()),
            lock_timeout,
        }
    }

    /// Adds a named shift category for a tenant.
    pub async fn add_category(
        &self,
        tenant_id: TenantId,
        name: &str,
    ) -> AppResult<ShiftCategory> {
        let mut categories = self.store.categories.write().await;
        if categories.iter().any(|(owner, category)| {
            *owner == tenant_id && category.name().eq_ignore_ascii_case(name.trim())
        }) {
            return Err(AppError::Conflict(format!(
                "shift category '{name}' already exists for tenant '{tenant_id}'"
            )));
        }

        let id = self.store.next_category_id.fetch_add(1, Ordering::Relaxed) + 1;
        let category = ShiftCategory::new(i64::try_from(id).unwrap_or(i64::MAX), name)?;
        categories.push((tenant_id, category.clone()));
        Ok(category)
    }
}

#[async_trait]
impl UnitOfWorkFactory for InMemoryUnitOfWorkFactory {
    async fn begin(&self, tenant_id: TenantId) -> AppResult<Box<dyn UnitOfWork>> {
        Ok(Box::new(InMemoryUnitOfWork {
            tenant_id,
            state: UnitOfWorkState::Open,
            store: self.store.clone(),
            lock_timeout: self.lock_timeout,
            tenant_lock: None,
            pending_shifts: HashMap::new(),
            pending_subscription: None,
        }))
    }
}

/// Unit of work over [`InMemoryUnitOfWorkFactory`] state.
pub struct InMemoryUnitOfWork {
    tenant_id: TenantId,
    state: UnitOfWorkState,
    store: Arc<InMemoryStore>,
    lock_timeout: Duration,
    tenant_lock: Option<OwnedMutexGuard<()>>,
    // `None` marks a staged delete.
    pending_shifts: HashMap<ShiftId, Option<StoredShift>>,
    pending_subscription: Option<Subscription>,
}

impl InMemoryUnitOfWork {
    fn ensure_open(&self) -> AppResult<()> {
        if self.state.is_open() {
            Ok(())
        } else {
            Err(AppError::Persistence("unit of work is closed".to_owned()))
        }
    }

    /// Rejects writes for a tenant other than the one the unit of work is bound to.
    fn ensure_bound_tenant(&self, tenant_id: TenantId) -> AppResult<()> {
        if tenant_id == self.tenant_id {
            Ok(())
        } else {
            Err(AppError::Persistence(format!(
                "unit of work for tenant '{}' cannot write rows of tenant '{tenant_id}'",
                self.tenant_id
            )))
        }
    }

    async fn lock_tenant(&mut self) -> AppResult<()> {
        if self.tenant_lock.is_some() {
            return Ok(());
        }

        let lock = {
            let mut tenant_locks = self.store.tenant_locks.lock().await;
            tenant_locks
                .entry(self.tenant_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        let guard = tokio::time::timeout(self.lock_timeout, lock.lock_owned())
            .await
            .map_err(|_| {
                AppError::LockTimeout(format!(
                    "gave up locking subscription for tenant '{}'",
                    self.tenant_id
                ))
            })?;
        self.tenant_lock = Some(guard);
        Ok(())
    }

    /// Committed shifts of the tenant with this unit of work's staged writes applied.
    async fn visible_shifts(&self, tenant_id: TenantId) -> Vec<StoredShift> {
        if tenant_id != self.tenant_id {
            return Vec::new();
        }

        let committed = self.store.shifts.read().await;
        let mut visible: HashMap<ShiftId, StoredShift> = committed
            .iter()
            .filter(|(_, stored)| stored.shift.tenant_id() == tenant_id)
            .map(|(shift_id, stored)| (*shift_id, stored.clone()))
            .collect();
        drop(committed);

        for (shift_id, pending) in &self.pending_shifts {
            match pending {
                Some(stored) if stored.shift.tenant_id() == tenant_id => {
                    visible.insert(*shift_id, stored.clone());
                }
                Some(_) => {}
                None => {
                    visible.remove(shift_id);
                }
            }
        }

        visible.into_values().collect()
    }

    fn release(&mut self, state: UnitOfWorkState) {
        self.state = state;
        self.pending_shifts.clear();
        self.pending_subscription = None;
        self.release_tenant_lock();
    }

    fn release_tenant_lock(&mut self) {
        let Some(guard) = self.tenant_lock.take() else {
            return;
        };
        drop(guard);

        // Clones are only taken under the table lock, so a count of one means
        // nobody holds or waits for this tenant.
        if let Ok(mut tenant_locks) = self.store.tenant_locks.try_lock()
            && tenant_locks
                .get(&self.tenant_id)
                .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            tenant_locks.remove(&self.tenant_id);
        }
    }
}

impl Drop for InMemoryUnitOfWork {
    fn drop(&mut self) {
        self.release_tenant_lock();
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
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

        {
            let mut shifts = self.store.shifts.write().await;
            for (shift_id, pending) in self.pending_shifts.drain() {
                match pending {
                    Some(stored) => {
                        shifts.insert(shift_id, stored);
                    }
                    None => {
                        shifts.remove(&shift_id);
                    }
                }
            }
        }

        if let Some(subscription) = self.pending_subscription.take() {
            self.store
                .subscriptions
                .write()
                .await
                .entry(subscription.tenant_id())
                .or_insert(subscription);
        }

        self.release(UnitOfWorkState::Committed);
        Ok(())
    }

    async fn rollback(&mut self) -> AppResult<()> {
        self.ensure_open()?;
        self.release(UnitOfWorkState::RolledBack);
        Ok(())
    }
}

#[async_trait]
impl ShiftRepository for InMemoryUnitOfWork {
    async fn create(&mut self, draft: ShiftDraft) -> AppResult<Shift> {
        self.ensure_open()?;
        self.ensure_bound_tenant(draft.tenant_id())?;
        let now = Utc::now();
        let shift = Shift::new(ShiftInput {
            shift_id: ShiftId::new(),
            draft,
            sync_token: None,
            created_at: now,
            updated_at: now,
        });
        let sequence = self.store.next_sequence.fetch_add(1, Ordering::Relaxed);

        self.pending_shifts.insert(
            shift.shift_id(),
            Some(StoredShift {
                sequence,
                shift: shift.clone(),
            }),
        );
        Ok(shift)
    }

    async fn get(&mut self, tenant_id: TenantId, shift_id: ShiftId) -> AppResult<Option<Shift>> {
        self.ensure_open()?;
        Ok(self
            .visible_shifts(tenant_id)
            .await
            .into_iter()
            .find(|stored| stored.shift.shift_id() == shift_id)
            .map(|stored| stored.shift))
    }

    async fn list_by_period(
        &mut self,
        tenant_id: TenantId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<Shift>> {
        self.ensure_open()?;
        let mut shifts: Vec<Shift> = self
            .visible_shifts(tenant_id)
            .await
            .into_iter()
            .map(|stored| stored.shift)
            .filter(|shift| shift.reference_date() >= start && shift.reference_date() <= end)
            .collect();
        shifts.sort_by_key(|shift| (shift.reference_date(), shift.start_time()));
        Ok(shifts)
    }

    async fn list_recent(&mut self, tenant_id: TenantId, limit: u32) -> AppResult<Vec<Shift>> {
        self.ensure_open()?;
        let mut visible = self.visible_shifts(tenant_id).await;
        visible.sort_by(|left, right| right.sequence.cmp(&left.sequence));
        Ok(visible
            .into_iter()
            .take(limit as usize)
            .map(|stored| stored.shift)
            .collect())
    }

    async fn update(&mut self, shift: &Shift) -> AppResult<()> {
        self.ensure_open()?;
        let tenant_id = shift.tenant_id();
        self.ensure_bound_tenant(tenant_id)?;
        let existing = self
            .visible_shifts(tenant_id)
            .await
            .into_iter()
            .find(|stored| stored.shift.shift_id() == shift.shift_id())
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "shift '{}' not found for tenant '{tenant_id}'",
                    shift.shift_id()
                ))
            })?;

        self.pending_shifts.insert(
            shift.shift_id(),
            Some(StoredShift {
                sequence: existing.sequence,
                shift: shift.clone(),
            }),
        );
        Ok(())
    }

    async fn delete(&mut self, tenant_id: TenantId, shift_id: ShiftId) -> AppResult<bool> {
        if self.get(tenant_id, shift_id).await?.is_none() {
            return Ok(false);
        }

        self.pending_shifts.insert(shift_id, None);
        Ok(true)
    }

    async fn count_by_period(
        &mut self,
        tenant_id: TenantId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<u32> {
        let shifts = self.list_by_period(tenant_id, start, end).await?;
        u32::try_from(shifts.len()).map_err(|error| {
            AppError::Internal(format!("shift count out of range for tenant '{tenant_id}': {error}"))
        })
    }

    async fn find_category_by_name(
        &mut self,
        tenant_id: TenantId,
        name: &str,
    ) -> AppResult<Option<ShiftCategory>> {
        self.ensure_open()?;
        let name = name.trim();
        Ok(self
            .store
            .categories
            .read()
            .await
            .iter()
            .find(|(owner, category)| *owner == tenant_id && category.name().eq_ignore_ascii_case(name))
            .map(|(_, category)| category.clone()))
    }
}

#[async_trait]
impl SubscriptionRepository for InMemoryUnitOfWork {
    async fn get_by_tenant(
        &mut self,
        tenant_id: TenantId,
        for_update: bool,
    ) -> AppResult<Option<Subscription>> {
        self.ensure_open()?;
        if tenant_id != self.tenant_id {
            return Ok(None);
        }
        if for_update {
            self.lock_tenant().await?;
        }

        if let Some(pending) = &self.pending_subscription {
            return Ok(Some(pending.clone()));
        }

        Ok(self.store.subscriptions.read().await.get(&tenant_id).cloned())
    }

    async fn create(&mut self, subscription: NewSubscription) -> AppResult<Subscription> {
        self.ensure_open()?;
        let tenant_id = subscription.tenant_id();
        self.ensure_bound_tenant(tenant_id)?;
        self.lock_tenant().await?;

        if let Some(existing) = self.get_by_tenant(tenant_id, false).await? {
            return Ok(existing);
        }

        let stored = subscription.into_subscription(Utc::now());
        self.pending_subscription = Some(stored.clone());
        Ok(stored)
    }
}
