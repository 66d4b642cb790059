//! Shift (usage record) types and the duration rule.

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use shiftledger_core::{AppError, AppResult, NonEmptyString, TenantId};
use uuid::Uuid;

const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

/// Maximum stored length of a free-text category.
pub const SHIFT_CATEGORY_MAX_LENGTH: usize = 50;

/// Maximum stored length of a shift description.
pub const SHIFT_DESCRIPTION_MAX_LENGTH: usize = 255;

/// Unique identifier for a stored shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShiftId(Uuid);

impl ShiftId {
    /// Creates a new random shift identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a shift identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Parses a shift identifier from its string form.
    pub fn parse(value: &str) -> AppResult<Self> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|error| AppError::Validation(format!("invalid shift id '{value}': {error}")))
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ShiftId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ShiftId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Returns the length of a shift in whole minutes.
///
/// Times are expected on whole minutes, which keeps the result in `1..=1440`.
/// An end time at or before the start time means the shift crosses midnight,
/// so one day is added to the end. The reference date does not change the
/// result because shift times are wall-clock values without a time zone.
#[must_use]
pub fn shift_duration_minutes(_reference_date: NaiveDate, start: NaiveTime, end: NaiveTime) -> u32 {
    let start_seconds = start.num_seconds_from_midnight();
    let mut end_seconds = end.num_seconds_from_midnight();
    if end_seconds <= start_seconds {
        end_seconds += SECONDS_PER_DAY;
    }

    (end_seconds - start_seconds) / 60
}

/// Stored category a shift was linked to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftCategory {
    id: i64,
    name: NonEmptyString,
}

impl ShiftCategory {
    /// Creates a category projection.
    pub fn new(id: i64, name: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            id,
            name: NonEmptyString::new(name)?,
        })
    }

    /// Returns the category row id.
    #[must_use]
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Returns the category display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }
}

/// How a shift's category is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShiftCategoryAssignment {
    /// Linked to a category the tenant already has.
    Catalog(ShiftCategory),
    /// Raw text kept when no stored category matched.
    FreeText(NonEmptyString),
}

impl ShiftCategoryAssignment {
    /// Returns the display name regardless of how the category is stored.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Catalog(category) => category.name(),
            Self::FreeText(name) => name.as_str(),
        }
    }

    /// Returns the linked category id, if any.
    #[must_use]
    pub fn catalog_id(&self) -> Option<i64> {
        match self {
            Self::Catalog(category) => Some(category.id()),
            Self::FreeText(_) => None,
        }
    }

    /// Returns the free-text value, if the category is not linked.
    #[must_use]
    pub fn free_text(&self) -> Option<&str> {
        match self {
            Self::Catalog(_) => None,
            Self::FreeText(name) => Some(name.as_str()),
        }
    }
}

/// Input payload used to construct a validated shift draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftDraftInput {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Calendar date the shift belongs to.
    pub reference_date: NaiveDate,
    /// Wall-clock start time.
    pub start_time: NaiveTime,
    /// Wall-clock end time; at or before start means the next day.
    pub end_time: NaiveTime,
    /// Resolved category, if the caller supplied one.
    pub category: Option<ShiftCategoryAssignment>,
    /// Optional free-text description.
    pub description: Option<String>,
}

/// Validated shift that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftDraft {
    tenant_id: TenantId,
    reference_date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    duration_minutes: u32,
    category: Option<ShiftCategoryAssignment>,
    description: Option<String>,
}

impl ShiftDraft {
    /// Creates a validated draft and computes its duration.
    pub fn new(input: ShiftDraftInput) -> AppResult<Self> {
        let ShiftDraftInput {
            tenant_id,
            reference_date,
            start_time,
            end_time,
            category,
            description,
        } = input;

        validate_whole_minute("start", start_time)?;
        validate_whole_minute("end", end_time)?;

        if let Some(ShiftCategoryAssignment::FreeText(name)) = &category {
            validate_category_name(name.as_str())?;
        }

        let description = normalize_description(description)?;

        Ok(Self {
            tenant_id,
            reference_date,
            start_time,
            end_time,
            duration_minutes: shift_duration_minutes(reference_date, start_time, end_time),
            category,
            description,
        })
    }

    /// Returns the owning tenant.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the reference date.
    #[must_use]
    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    /// Returns the start time.
    #[must_use]
    pub fn start_time(&self) -> NaiveTime {
        self.start_time
    }

    /// Returns the end time.
    #[must_use]
    pub fn end_time(&self) -> NaiveTime {
        self.end_time
    }

    /// Returns the computed duration in minutes.
    #[must_use]
    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    /// Returns the category assignment.
    #[must_use]
    pub fn category(&self) -> Option<&ShiftCategoryAssignment> {
        self.category.as_ref()
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// Input payload used to rebuild a persisted shift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftInput {
    /// Server-assigned identifier.
    pub shift_id: ShiftId,
    /// Validated content.
    pub draft: ShiftDraft,
    /// External calendar token, once synced.
    pub sync_token: Option<String>,
    /// Insert timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A persisted shift owned by exactly one tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shift {
    shift_id: ShiftId,
    draft: ShiftDraft,
    sync_token: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Shift {
    /// Creates a persisted shift projection.
    #[must_use]
    pub fn new(input: ShiftInput) -> Self {
        Self {
            shift_id: input.shift_id,
            draft: input.draft,
            sync_token: input.sync_token.filter(|token| !token.trim().is_empty()),
            created_at: input.created_at,
            updated_at: input.updated_at,
        }
    }

    /// Returns a copy carrying a new external sync token.
    ///
    /// Only the token changes; date, times, duration and description are kept.
    #[must_use]
    pub fn with_sync_token(mut self, sync_token: impl Into<String>, updated_at: DateTime<Utc>) -> Self {
        self.sync_token = Some(sync_token.into());
        self.updated_at = updated_at;
        self
    }

    /// Returns the shift identifier.
    #[must_use]
    pub fn shift_id(&self) -> ShiftId {
        self.shift_id
    }

    /// Returns the owning tenant.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.draft.tenant_id()
    }

    /// Returns the reference date.
    #[must_use]
    pub fn reference_date(&self) -> NaiveDate {
        self.draft.reference_date()
    }

    /// Returns the start time.
    #[must_use]
    pub fn start_time(&self) -> NaiveTime {
        self.draft.start_time()
    }

    /// Returns the end time.
    #[must_use]
    pub fn end_time(&self) -> NaiveTime {
        self.draft.end_time()
    }

    /// Returns the duration in minutes, derived from start and end.
    #[must_use]
    pub fn duration_minutes(&self) -> u32 {
        self.draft.duration_minutes()
    }

    /// Returns the category assignment.
    #[must_use]
    pub fn category(&self) -> Option<&ShiftCategoryAssignment> {
        self.draft.category()
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.draft.description()
    }

    /// Returns the external calendar token, if the shift was synced.
    #[must_use]
    pub fn sync_token(&self) -> Option<&str> {
        self.sync_token.as_deref()
    }

    /// Returns the insert timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

fn validate_whole_minute(label: &str, time: NaiveTime) -> AppResult<()> {
    if time.second() != 0 || time.nanosecond() != 0 {
        return Err(AppError::Validation(format!(
            "shift {label} time must be on a whole minute, got {time}"
        )));
    }

    Ok(())
}

fn validate_category_name(name: &str) -> AppResult<()> {
    if name.chars().count() > SHIFT_CATEGORY_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "shift category must not exceed {SHIFT_CATEGORY_MAX_LENGTH} characters"
        )));
    }

    Ok(())
}

fn normalize_description(description: Option<String>) -> AppResult<Option<String>> {
    let Some(description) = description else {
        return Ok(None);
    };

    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    if trimmed.chars().count() > SHIFT_DESCRIPTION_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "shift description must not exceed {SHIFT_DESCRIPTION_MAX_LENGTH} characters"
        )));
    }

    Ok(Some(trimmed.to_owned()))
}
