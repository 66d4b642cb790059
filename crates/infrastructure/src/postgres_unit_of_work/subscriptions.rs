use chrono::{DateTime, Utc};
use shiftledger_domain::{
    NewSubscription, Subscription, SubscriptionInput, SubscriptionPlan, SubscriptionStatus,
};
use sqlx::FromRow;

use super::*;

#[derive(Debug, FromRow)]
struct SubscriptionRow {
    tenant_id: i64,
    plan: String,
    status: String,
    period_start: Option<DateTime<Utc>>,
    period_end: Option<DateTime<Utc>>,
    billing_reference: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = AppError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Subscription::new(SubscriptionInput {
            tenant_id: TenantId::new(row.tenant_id)?,
            plan: SubscriptionPlan::parse(row.plan.as_str())?,
            status: SubscriptionStatus::parse(row.status.as_str())?,
            period_start: row.period_start,
            period_end: row.period_end,
            billing_reference: row.billing_reference,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }
}

#[async_trait]
impl SubscriptionRepository for PostgresUnitOfWork {
    async fn get_by_tenant(
        &mut self,
        tenant_id: TenantId,
        for_update: bool,
    ) -> AppResult<Option<Subscription>> {
        let lock_clause = if for_update { "FOR UPDATE" } else { "" };
        let sql = format!(
            "SELECT
                tenant_id,
                plan,
                status,
                period_start,
                period_end,
                billing_reference,
                created_at,
                updated_at
            FROM subscriptions
            WHERE tenant_id = $1
            {lock_clause}"
        );

        let row = sqlx::query_as::<_, SubscriptionRow>(sql.as_str())
            .bind(tenant_id.as_i64())
            .fetch_optional(self.connection()?)
            .await
            .map_err(|error| persistence_error("load subscription", tenant_id, error))?;

        row.map(Subscription::try_from).transpose()
    }

    async fn create(&mut self, subscription: NewSubscription) -> AppResult<Subscription> {
        let tenant_id = subscription.tenant_id();

        // Waits on a concurrent uncommitted insert for the same tenant, then
        // does nothing; the re-select below returns whichever row won.
        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                tenant_id,
                plan,
                status,
                period_start,
                period_end,
                billing_reference
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (tenant_id) DO NOTHING
            "#,
        )
        .bind(tenant_id.as_i64())
        .bind(subscription.plan().as_str())
        .bind(subscription.status().as_str())
        .bind(subscription.period_start())
        .bind(subscription.period_end())
        .bind(subscription.billing_reference())
        .execute(self.connection()?)
        .await
        .map_err(|error| persistence_error("insert subscription", tenant_id, error))?;

        self.get_by_tenant(tenant_id, true).await?.ok_or_else(|| {
            AppError::Internal(format!(
                "subscription for tenant '{tenant_id}' missing after insert"
            ))
        })
    }
}
