use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use shiftledger_core::NonEmptyString;
use shiftledger_domain::{
    Shift, ShiftCategory, ShiftCategoryAssignment, ShiftDraft, ShiftDraftInput, ShiftId, ShiftInput,
};
use sqlx::FromRow;
use uuid::Uuid;

use super::*;

const SELECT_SHIFTS: &str = r#"
    SELECT
        shifts.id,
        shifts.tenant_id,
        shifts.reference_date,
        shifts.start_time,
        shifts.end_time,
        shifts.category_id,
        shift_categories.name AS category_name,
        shifts.category_text,
        shifts.description,
        shifts.sync_token,
        shifts.created_at,
        shifts.updated_at
    FROM shifts
    LEFT JOIN shift_categories
        ON shift_categories.id = shifts.category_id
        AND shift_categories.tenant_id = shifts.tenant_id
"#;

#[derive(Debug, FromRow)]
struct ShiftRow {
    id: Uuid,
    tenant_id: i64,
    reference_date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    category_id: Option<i64>,
    category_name: Option<String>,
    category_text: Option<String>,
    description: Option<String>,
    sync_token: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ShiftRow {
    /// Rebuilds the shift; duration is recomputed instead of read back.
    fn into_shift(self) -> AppResult<Shift> {
        let category = match (self.category_id, self.category_name, self.category_text) {
            (Some(id), Some(name), _) => {
                Some(ShiftCategoryAssignment::Catalog(ShiftCategory::new(id, name)?))
            }
            (_, _, Some(text)) if !text.trim().is_empty() => {
                Some(ShiftCategoryAssignment::FreeText(NonEmptyString::new(text)?))
            }
            _ => None,
        };

        let draft = ShiftDraft::new(ShiftDraftInput {
            tenant_id: TenantId::new(self.tenant_id)?,
            reference_date: self.reference_date,
            start_time: self.start_time,
            end_time: self.end_time,
            category,
            description: self.description,
        })?;

        Ok(Shift::new(ShiftInput {
            shift_id: ShiftId::from_uuid(self.id),
            draft,
            sync_token: self.sync_token,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }))
    }
}

#[derive(Debug, FromRow)]
struct ShiftCategoryRow {
    id: i64,
    name: String,
}

fn category_columns(category: Option<&ShiftCategoryAssignment>) -> (Option<i64>, Option<&str>) {
    match category {
        Some(ShiftCategoryAssignment::Catalog(stored)) => (Some(stored.id()), None),
        Some(ShiftCategoryAssignment::FreeText(text)) => (None, Some(text.as_str())),
        None => (None, None),
    }
}

fn duration_column(minutes: u32) -> i32 {
    i32::try_from(minutes).unwrap_or(i32::MAX)
}

#[async_trait]
impl ShiftRepository for PostgresUnitOfWork {
    async fn create(&mut self, draft: ShiftDraft) -> AppResult<Shift> {
        let tenant_id = draft.tenant_id();
        let shift_id = ShiftId::new();
        let (category_id, category_text) = category_columns(draft.category());

        let (created_at, updated_at) = sqlx::query_as::<_, (DateTime<Utc>, DateTime<Utc>)>(
            r#"
            INSERT INTO shifts (
                id,
                tenant_id,
                reference_date,
                start_time,
                end_time,
                duration_minutes,
                category_id,
                category_text,
                description
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING created_at, updated_at
            "#,
        )
        .bind(shift_id.as_uuid())
        .bind(tenant_id.as_i64())
        .bind(draft.reference_date())
        .bind(draft.start_time())
        .bind(draft.end_time())
        .bind(duration_column(draft.duration_minutes()))
        .bind(category_id)
        .bind(category_text)
        .bind(draft.description())
        .fetch_one(self.connection()?)
        .await
        .map_err(|error| persistence_error("insert shift", tenant_id, error))?;

        Ok(Shift::new(ShiftInput {
            shift_id,
            draft,
            sync_token: None,
            created_at,
            updated_at,
        }))
    }

    async fn get(&mut self, tenant_id: TenantId, shift_id: ShiftId) -> AppResult<Option<Shift>> {
        let sql = format!("{SELECT_SHIFTS} WHERE shifts.tenant_id = $1 AND shifts.id = $2");
        let row = sqlx::query_as::<_, ShiftRow>(sql.as_str())
            .bind(tenant_id.as_i64())
            .bind(shift_id.as_uuid())
            .fetch_optional(self.connection()?)
            .await
            .map_err(|error| persistence_error("load shift", tenant_id, error))?;

        row.map(ShiftRow::into_shift).transpose()
    }

    async fn list_by_period(
        &mut self,
        tenant_id: TenantId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<Shift>> {
        let sql = format!(
            "{SELECT_SHIFTS}
            WHERE shifts.tenant_id = $1
                AND shifts.reference_date BETWEEN $2 AND $3
            ORDER BY shifts.reference_date, shifts.start_time"
        );
        let rows = sqlx::query_as::<_, ShiftRow>(sql.as_str())
            .bind(tenant_id.as_i64())
            .bind(start)
            .bind(end)
            .fetch_all(self.connection()?)
            .await
            .map_err(|error| persistence_error("list shifts for period", tenant_id, error))?;

        rows.into_iter().map(ShiftRow::into_shift).collect()
    }

    async fn list_recent(&mut self, tenant_id: TenantId, limit: u32) -> AppResult<Vec<Shift>> {
        let sql = format!(
            "{SELECT_SHIFTS}
            WHERE shifts.tenant_id = $1
            ORDER BY shifts.created_at DESC
            LIMIT $2"
        );
        let rows = sqlx::query_as::<_, ShiftRow>(sql.as_str())
            .bind(tenant_id.as_i64())
            .bind(i64::from(limit))
            .fetch_all(self.connection()?)
            .await
            .map_err(|error| persistence_error("list recent shifts", tenant_id, error))?;

        rows.into_iter().map(ShiftRow::into_shift).collect()
    }

    async fn update(&mut self, shift: &Shift) -> AppResult<()> {
        let tenant_id = shift.tenant_id();
        let (category_id, category_text) = category_columns(shift.category());

        let result = sqlx::query(
            r#"
            UPDATE shifts
            SET
                reference_date = $3,
                start_time = $4,
                end_time = $5,
                duration_minutes = $6,
                category_id = $7,
                category_text = $8,
                description = $9,
                sync_token = $10,
                updated_at = $11
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_i64())
        .bind(shift.shift_id().as_uuid())
        .bind(shift.reference_date())
        .bind(shift.start_time())
        .bind(shift.end_time())
        .bind(duration_column(shift.duration_minutes()))
        .bind(category_id)
        .bind(category_text)
        .bind(shift.description())
        .bind(shift.sync_token())
        .bind(shift.updated_at())
        .execute(self.connection()?)
        .await
        .map_err(|error| persistence_error("update shift", tenant_id, error))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "shift '{}' not found for tenant '{tenant_id}'",
                shift.shift_id()
            )));
        }

        Ok(())
    }

    async fn delete(&mut self, tenant_id: TenantId, shift_id: ShiftId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM shifts WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id.as_i64())
            .bind(shift_id.as_uuid())
            .execute(self.connection()?)
            .await
            .map_err(|error| persistence_error("delete shift", tenant_id, error))?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_by_period(
        &mut self,
        tenant_id: TenantId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<u32> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM shifts
            WHERE tenant_id = $1
                AND reference_date BETWEEN $2 AND $3
            "#,
        )
        .bind(tenant_id.as_i64())
        .bind(start)
        .bind(end)
        .fetch_one(self.connection()?)
        .await
        .map_err(|error| persistence_error("count shifts", tenant_id, error))?;

        u32::try_from(count).map_err(|error| {
            AppError::Internal(format!("shift count out of range for tenant '{tenant_id}': {error}"))
        })
    }

    async fn find_category_by_name(
        &mut self,
        tenant_id: TenantId,
        name: &str,
    ) -> AppResult<Option<ShiftCategory>> {
        let row = sqlx::query_as::<_, ShiftCategoryRow>(
            r#"
            SELECT id, name
            FROM shift_categories
            WHERE tenant_id = $1 AND lower(name) = lower($2)
            LIMIT 1
            "#,
        )
        .bind(tenant_id.as_i64())
        .bind(name.trim())
        .fetch_optional(self.connection()?)
        .await
        .map_err(|error| persistence_error("find shift category", tenant_id, error))?;

        row.map(|row| ShiftCategory::new(row.id, row.name)).transpose()
    }
}
