use axum::{Extension, Json, extract::State, http::HeaderMap};
use serde::{Deserialize, Serialize};

use crate::db::AppState;
use crate::error::AppError;
use crate::models::Tenant;
use crate::provision;
use crate::util;

#[derive(Debug, Deserialize)]
pub struct ProvisionRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProvisionResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pvr_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsc_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Provision a new router for the authenticated tenant.
///
/// Handled failures come back as HTTP 200 with `{ok: false, error}`. The
/// back-office client keys off the body; non-200 is reserved for the auth
/// layer.
pub async fn provision_equipment(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
    headers: HeaderMap,
    Json(request): Json<ProvisionRequest>,
) -> Json<ProvisionResponse> {
    let base_url = util::external_base_url(&headers, &state.config);

    match provision::provision_router(&state, &tenant.slug, request.name, &base_url).await {
        Ok(output) => Json(ProvisionResponse {
            ok: true,
            script: Some(output.script),
            pvr_url: Some(output.provisioning_url),
            rsc_file: Some(output.rsc_file),
            error: None,
        }),
        Err(err) => {
            let message = match &err {
                AppError::DuplicateDevice => err.to_string(),
                AppError::RemoteUnavailable => {
                    "device setup unavailable, retry later".to_string()
                }
                AppError::BadRequest(msg) => msg.clone(),
                _ => {
                    tracing::error!(tenant = %tenant.slug, "provisioning failed: {err}");
                    "could not process the request".to_string()
                }
            };
            Json(ProvisionResponse {
                ok: false,
                script: None,
                pvr_url: None,
                rsc_file: None,
                error: Some(message),
            })
        }
    }
}
