use std::time::Duration;

use async_trait::async_trait;
use shiftledger_application::{
    ShiftRepository, SubscriptionRepository, UnitOfWork, UnitOfWorkFactory, UnitOfWorkState,
};
use shiftledger_core::{AppError, AppResult, TenantId};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};

mod shifts;
mod subscriptions;

#[cfg(test)]
mod tests;

/// PostgreSQL error code raised when `lock_timeout` expires.
const LOCK_NOT_AVAILABLE: &str = "55P03";

/// Opens PostgreSQL transactions bound to one tenant.
#[derive(Clone)]
pub struct PostgresUnitOfWorkFactory {
    pool: PgPool,
    lock_timeout: Duration,
}

impl PostgresUnitOfWorkFactory {
    /// Creates a factory with the provided connection pool.
    ///
    /// `lock_timeout` bounds how long a statement waits for a row lock.
    #[must_use]
    pub fn new(pool: PgPool, lock_timeout: Duration) -> Self {
        Self { pool, lock_timeout }
    }
}

#[async_trait]
impl UnitOfWorkFactory for PostgresUnitOfWorkFactory {
    async fn begin(&self, tenant_id: TenantId) -> AppResult<Box<dyn UnitOfWork>> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Persistence(format!(
                "failed to begin transaction for tenant '{tenant_id}': {error}"
            ))
        })?;

        sqlx::query(
            r#"
            SELECT
                set_config('app.current_tenant_id', $1, true),
                set_config('lock_timeout', $2, true)
            "#,
        )
        .bind(tenant_id.to_string())
        .bind(format!("{}ms", self.lock_timeout.as_millis()))
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Persistence(format!(
                "failed to bind session to tenant '{tenant_id}': {error}"
            ))
        })?;

        Ok(Box::new(PostgresUnitOfWork {
            tenant_id,
            state: UnitOfWorkState::Open,
            transaction: Some(transaction),
        }))
    }
}

/// One PostgreSQL transaction serving both repositories.
///
/// The transaction rolls back when the value is dropped without commit.
pub struct PostgresUnitOfWork {
    tenant_id: TenantId,
    state: UnitOfWorkState,
    transaction: Option<Transaction<'static, Postgres>>,
}

impl PostgresUnitOfWork {
    fn connection(&mut self) -> AppResult<&mut PgConnection> {
        self.transaction
            .as_deref_mut()
            .ok_or_else(|| AppError::Persistence("unit of work is closed".to_owned()))
    }

    fn take_transaction(&mut self) -> AppResult<Transaction<'static, Postgres>> {
        self.transaction
            .take()
            .ok_or_else(|| AppError::Persistence("unit of work is closed".to_owned()))
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
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
        let transaction = self.take_transaction()?;
        let tenant_id = self.tenant_id;
        self.state = UnitOfWorkState::RolledBack;

        transaction.commit().await.map_err(|error| {
            AppError::Persistence(format!(
                "failed to commit transaction for tenant '{tenant_id}': {error}"
            ))
        })?;

        self.state = UnitOfWorkState::Committed;
        Ok(())
    }

    async fn rollback(&mut self) -> AppResult<()> {
        let transaction = self.take_transaction()?;
        let tenant_id = self.tenant_id;
        self.state = UnitOfWorkState::RolledBack;

        transaction.rollback().await.map_err(|error| {
            AppError::Persistence(format!(
                "failed to roll back transaction for tenant '{tenant_id}': {error}"
            ))
        })
    }
}

/// Maps a driver error, naming lock timeouts explicitly.
fn persistence_error(action: &str, tenant_id: TenantId, error: sqlx::Error) -> AppError {
    let lock_timed_out = error
        .as_database_error()
        .and_then(|database_error| database_error.code())
        .is_some_and(|code| code == LOCK_NOT_AVAILABLE);

    if lock_timed_out {
        return AppError::LockTimeout(format!(
            "gave up trying to {action} for tenant '{tenant_id}'"
        ));
    }

    AppError::Persistence(format!(
        "failed to {action} for tenant '{tenant_id}': {error}"
    ))
}
