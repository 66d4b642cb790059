use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use shiftledger_core::TenantContext;

use crate::dto::SubscriptionResponse;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn get_subscription_handler(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
) -> ApiResult<Json<SubscriptionResponse>> {
    let subscription = state.subscription_service.get_subscription(&tenant).await?;

    Ok(Json(SubscriptionResponse::from(subscription)))
}

pub async fn start_trial_handler(
    State(state): State<AppState>,
    Extension(tenant): Extension<TenantContext>,
) -> ApiResult<(StatusCode, Json<SubscriptionResponse>)> {
    let subscription = state.subscription_service.start_trial(&tenant).await?;

    Ok((
        StatusCode::CREATED,
        Json(SubscriptionResponse::from(subscription)),
    ))
}
