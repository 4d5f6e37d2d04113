use axum::{
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::models::EquipmentStatus;
use crate::scripts::{self, HotspotPage};

/// Serve a captive-portal page variant for a device.
///
/// File names map to exactly two known pages; anything else is a plain
/// "file not found" text response, never a server error.
pub async fn page(
    State(state): State<AppState>,
    Path((auth_code, file_name)): Path<(String, String)>,
) -> Result<Response> {
    let conn = state.db.get()?;
    let equipment = queries::get_equipment_by_auth_code(&conn, &auth_code)?
        .filter(|e| e.status != EquipmentStatus::Retired)
        .ok_or(AppError::DeviceNotFound)?;

    let Some(page) = HotspotPage::from_file_name(&file_name) else {
        return Ok((StatusCode::NOT_FOUND, "file not found").into_response());
    };

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        scripts::hotspot_page(page, &equipment.name),
    )
        .into_response())
}
