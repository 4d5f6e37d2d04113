use axum::{
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::models::{Equipment, EquipmentStatus};
use crate::scripts::{self, ConfigContext, RouterOsVersion};
use crate::token;
use crate::util;

/// The one failure body device firmware ever sees from the config
/// endpoint. Byte-identical for every failure class so nothing leaks about
/// which check rejected the request.
const CONFIG_FAILURE_SCRIPT: &str =
    ":put \"Error: configuration unavailable. Contact your provider and retry.\";";

fn text_attachment(filename: &str, body: String) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    if let Ok(disposition) =
        HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
    {
        headers.insert(header::CONTENT_DISPOSITION, disposition);
    }
    (headers, body).into_response()
}

/// Serve the install/bootstrap script for an opaque token.
///
/// No validation happens here; the token is only embedded for the later
/// config fetch, which is where it gets checked.
pub async fn install_script(
    State(state): State<AppState>,
    Path(token): Path<String>,
    headers: HeaderMap,
) -> Response {
    let base_url = util::external_base_url(&headers, &state.config);
    let bootstrap = scripts::bootstrap_script(&token, &base_url);
    text_attachment(scripts::RSC_FILE, bootstrap.script)
}

/// Serve a device's certificate bundle by auth code.
pub async fn certificate(
    State(state): State<AppState>,
    Path(auth_code): Path<String>,
) -> Result<Response> {
    let equipment = {
        let conn = state.db.get()?;
        queries::get_equipment_by_auth_code(&conn, &auth_code)?
    }
    .filter(|e| e.status != EquipmentStatus::Retired)
    .ok_or(AppError::DeviceNotFound)?;

    let bundle = state.remote.fetch_certificate(&equipment.identity).await?;
    Ok(text_attachment(
        &format!("{}.crt", equipment.identity),
        bundle,
    ))
}

/// Serve the full VPN/hotspot configuration after token validation.
///
/// Always HTTP 200 with a script body: the calling firmware executes
/// whatever it fetched and cannot interpret status codes, so failures are
/// reported as a script that prints one line.
pub async fn full_config(
    State(state): State<AppState>,
    Path((token, version)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    match build_full_config(&state, &token, &version, &headers).await {
        Ok(script) => text_attachment(scripts::RSC_FILE, script),
        Err(err) => {
            match &err {
                AppError::TemplateFieldMissing(field) => {
                    tracing::error!(field = %field, "config render failed: required field missing");
                }
                AppError::InvalidToken | AppError::DeviceNotFound => {
                    tracing::debug!("config request rejected: {err}");
                }
                _ => tracing::warn!("config request failed: {err}"),
            }
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                CONFIG_FAILURE_SCRIPT,
            )
                .into_response()
        }
    }
}

async fn build_full_config(
    state: &AppState,
    token_str: &str,
    version: &str,
    headers: &HeaderMap,
) -> Result<String> {
    let payload = token::decode_payload(&state.token_key, token_str)?;
    reject_stale(&payload.timestamp, state.config.token_max_age_hours)?;

    let equipment = {
        let conn = state.db.get()?;
        queries::get_equipment_by_id(&conn, payload.mtk)?
    }
    .ok_or(AppError::DeviceNotFound)?;

    // Both halves of the binding must match the same row. Constant-time on
    // the auth code; a mismatch is indistinguishable from a missing row.
    if !bool::from(
        payload
            .auth
            .as_bytes()
            .ct_eq(equipment.auth_code.as_bytes()),
    ) {
        return Err(AppError::DeviceNotFound);
    }
    if equipment.status == EquipmentStatus::Retired {
        return Err(AppError::DeviceNotFound);
    }

    let base_url = util::external_base_url(headers, &state.config);
    let ctx = assemble_context(state, &equipment, &base_url);
    scripts::render_config(&ctx, RouterOsVersion::from_segment(version))
}

fn reject_stale(timestamp: &str, max_age_hours: i64) -> Result<()> {
    let issued = chrono::DateTime::parse_from_rfc3339(timestamp)
        .map_err(|_| AppError::InvalidToken)?;
    let age = chrono::Utc::now().signed_duration_since(issued.with_timezone(&chrono::Utc));
    if age > chrono::Duration::hours(max_age_hours) {
        return Err(AppError::InvalidToken);
    }
    Ok(())
}

fn assemble_context(state: &AppState, equipment: &Equipment, base_url: &str) -> ConfigContext {
    let firewall_ip = state
        .walled_garden_ip
        .clone()
        .unwrap_or_else(|| state.config.public_ip.clone());

    ConfigContext {
        secret: equipment.password.clone(),
        identity: equipment.identity.clone(),
        username: state.config.mgmt_username.clone(),
        cert_url: format!(
            "{base_url}/api/v1/equipments/auth/cert/{}",
            equipment.auth_code
        ),
        login_url: format!("{base_url}/hotspot/{}/login.html", equipment.auth_code),
        relogin_url: format!("{base_url}/hotspot/{}/rlogin.html", equipment.auth_code),
        walled_garden_host: state.config.walled_garden_host.clone(),
        walled_garden_ip: state.walled_garden_ip.clone(),
        connect_to: Some(firewall_ip.clone()),
        vpn_pass: Some(equipment.password.clone()),
        client_cert: Some(format!("{}.crt", equipment.identity)),
        firewall_ip,
    }
}
