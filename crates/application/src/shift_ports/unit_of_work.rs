use async_trait::async_trait;
use shiftledger_core::{AppResult, TenantId};

use super::repository::{ShiftRepository, SubscriptionRepository};

/// Lifecycle of a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOfWorkState {
    /// Accepting reads and writes.
    Open,
    /// Changes are durable.
    Committed,
    /// Changes were discarded.
    RolledBack,
}

impl UnitOfWorkState {
    /// Returns whether the unit of work still accepts operations.
    #[must_use]
    pub fn is_open(self) -> bool {
        self == Self::Open
    }
}

/// One transactional boundary with both repositories bound to it.
///
/// Writes become visible to other units of work only after [`commit`].
/// Dropping an open unit of work rolls it back. Any operation after
/// `commit` or `rollback` fails with a persistence error.
///
/// [`commit`]: UnitOfWork::commit
#[async_trait]
pub trait UnitOfWork: Send {
    /// Returns the tenant the unit of work was opened for.
    fn tenant_id(&self) -> TenantId;

    /// Returns the current lifecycle state.
    fn state(&self) -> UnitOfWorkState;

    /// Returns the shift repository bound to this unit of work.
    fn shifts(&mut self) -> &mut dyn ShiftRepository;

    /// Returns the subscription repository bound to this unit of work.
    fn subscriptions(&mut self) -> &mut dyn SubscriptionRepository;

    /// Makes all writes durable and releases held locks.
    async fn commit(&mut self) -> AppResult<()>;

    /// Discards all writes and releases held locks.
    async fn rollback(&mut self) -> AppResult<()>;
}

/// Opens units of work.
#[async_trait]
pub trait UnitOfWorkFactory: Send + Sync {
    /// Opens a unit of work whose session is bound to the tenant.
    async fn begin(&self, tenant_id: TenantId) -> AppResult<Box<dyn UnitOfWork>>;
}
