use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use chrono::NaiveDate;
use serde::Deserialize;
use shiftledger_core::TenantContext;
use shiftledger_domain::ShiftId;

use crate::dto::{CreateShiftRequest, ShiftResponse};
use crate::error::ApiResult;
use crate::state::AppState;


#[derive(Debug, Deserialize)]
pub struct ShiftPeriodQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct RecentShiftsQuery {
    pub limit: Option<u32>,
}

pub async fn create_shift_handler(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    Json(payload): Json<CreateShiftRequest>,
) -> ApiResult<(StatusCode, Json<ShiftResponse>)> {
    let shift = state
        .shift_creation_service
        .create_shift(&tenant, payload.into())
        .await?;

    Ok((StatusCode::CREATED, Json(ShiftResponse::from(shift))))
}

pub async fn list_shifts_handler(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    Query(query): Query<ShiftPeriodQuery>,
) -> ApiResult<Json<Vec<ShiftResponse>>> {
    let shifts = state
        .shift_query_service
        .list_shifts_for_period(&tenant, query.start, query.end)
        .await?
        .into_iter()
        .map(ShiftResponse::from)
        .collect();

    Ok(Json(shifts))
}

pub async fn list_recent_shifts_handler(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    Query(query): Query<RecentShiftsQuery>,
) -> ApiResult<Json<Vec<ShiftResponse>>> {
    let shifts = state
        .shift_query_service
        .list_recent_shifts(&tenant, query.limit)
        .await?
        .into_iter()
        .map(ShiftResponse::from)
        .collect();

    Ok(Json(shifts))
}

pub async fn get_shift_handler(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    Path(shift_id): Path<String>,
) -> ApiResult<Json<ShiftResponse>> {
    let shift_id = ShiftId::parse(shift_id.as_str())?;
    let shift = state.shift_query_service.get_shift(&tenant, shift_id).await?;

    Ok(Json(ShiftResponse::from(shift)))
}

pub async fn delete_shift_handler(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
    Path(shift_id): Path<String>,
) -> ApiResult<StatusCode> {
    let shift_id = ShiftId::parse(shift_id.as_str())?;
    state
        .shift_query_service
        .delete_shift(&tenant, shift_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
