use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use shiftledger_application::TenantCredentials;

use crate::error::ApiResult;
use crate::state::AppState;

/// Header carrying the shared secret of internal callers.
pub const INTERNAL_SECRET_HEADER: &str = "x-internal-secret";

/// Header naming the tenant an internal caller acts for.
pub const TENANT_HEADER: &str = "x-telegram-user-id";

/// Resolves the calling tenant and stores it as a request extension.
pub async fn require_tenant(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let credentials = tenant_credentials(request.headers());
    let tenant = state.tenant_resolver.resolve(&credentials)?;

    request.extensions_mut().insert(tenant);
    Ok(next.run(request).await)
}

/// Collects every credential the request carries, internal secret first.
pub fn tenant_credentials(headers: &HeaderMap) -> Vec<TenantCredentials> {
    let mut credentials = Vec::with_capacity(2);

    if let Some(presented_secret) = header_value(headers, INTERNAL_SECRET_HEADER) {
        credentials.push(TenantCredentials::InternalSecret {
            presented_secret: presented_secret.to_owned(),
            tenant_header: header_value(headers, TENANT_HEADER).map(ToOwned::to_owned),
        });
    }

    let bearer_token = header_value(headers, header::AUTHORIZATION.as_str())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer_token {
        credentials.push(TenantCredentials::BearerToken(token.to_owned()));
    }

    credentials
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
