use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use crate::db::{AppState, queries};

/// Authenticate the operator-facing provisioning surface by tenant API key.
///
/// The matched [`crate::models::Tenant`] is inserted as a request extension
/// so handlers are tenant-scoped without re-querying.
pub async fn tenant_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let api_key = request
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .ok_or(StatusCode::UNAUTHORIZED)?
        .to_string();

    let conn = state
        .db
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let tenant = queries::get_tenant_by_api_key(&conn, &api_key)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::UNAUTHORIZED)?;
    drop(conn);

    request.extensions_mut().insert(tenant);
    Ok(next.run(request).await)
}
