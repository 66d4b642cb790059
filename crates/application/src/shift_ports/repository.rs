use async_trait::async_trait;
use chrono::NaiveDate;
use shiftledger_core::{AppResult, TenantId};
use shiftledger_domain::{NewSubscription, Shift, ShiftCategory, ShiftDraft, ShiftId, Subscription};

/// Repository port for shifts, bound to one open unit of work.
///
/// Every method is scoped to a tenant. Rows owned by another tenant are
/// invisible, including when the caller supplies their id.
#[async_trait]
pub trait ShiftRepository: Send {
    /// Inserts a validated draft and returns the stored shift.
    async fn create(&mut self, draft: ShiftDraft) -> AppResult<Shift>;

    /// Returns one shift owned by the tenant.
    async fn get(&mut self, tenant_id: TenantId, shift_id: ShiftId) -> AppResult<Option<Shift>>;

    /// Lists shifts with a reference date in `[start, end]`, ordered by date then start time.
    async fn list_by_period(
        &mut self,
        tenant_id: TenantId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<Shift>>;

    /// Lists the most recently created shifts, newest first.
    async fn list_recent(&mut self, tenant_id: TenantId, limit: u32) -> AppResult<Vec<Shift>>;

    /// Persists the mutable fields of an existing shift.
    ///
    /// Returns [`shiftledger_core::AppError::NotFound`] when the shift is
    /// missing or owned by another tenant.
    async fn update(&mut self, shift: &Shift) -> AppResult<()>;

    /// Deletes one shift and reports whether a row was removed.
    async fn delete(&mut self, tenant_id: TenantId, shift_id: ShiftId) -> AppResult<bool>;

    /// Counts shifts with a reference date in `[start, end]`.
    async fn count_by_period(
        &mut self,
        tenant_id: TenantId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<u32>;

    /// Finds a stored category by case-insensitive name.
    async fn find_category_by_name(
        &mut self,
        tenant_id: TenantId,
        name: &str,
    ) -> AppResult<Option<ShiftCategory>>;
}

/// Repository port for subscriptions, bound to one open unit of work.
#[async_trait]
pub trait SubscriptionRepository: Send {
    /// Returns the tenant's subscription.
    ///
    /// With `for_update` the row stays locked until the unit of work ends,
    /// and concurrent lockers for the same tenant wait.
    async fn get_by_tenant(
        &mut self,
        tenant_id: TenantId,
        for_update: bool,
    ) -> AppResult<Option<Subscription>>;

    /// Inserts the tenant's subscription and returns the stored row, locked.
    ///
    /// When a concurrent transaction inserted the row first, this waits for it
    /// and returns that row instead of failing.
    async fn create(&mut self, subscription: NewSubscription) -> AppResult<Subscription>;
}
