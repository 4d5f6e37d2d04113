pub mod equipments;
pub mod hotspot;
pub mod provision;

use axum::{
    Json, Router, middleware,
    routing::{get, post},
};
use serde::Serialize;

use crate::db::AppState;
use crate::middleware::tenant_auth;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router(state: AppState) -> Router {
    // Unauthenticated device-facing surface. These endpoints are reachable
    // by hardware that has nothing but the URLs baked into its bootstrap
    // script.
    let device_routes = Router::new()
        .route(
            "/api/v1/equipments/auth/config/{token}",
            get(equipments::install_script),
        )
        .route(
            "/api/v1/equipments/auth/config/{token}/{version}",
            get(equipments::full_config),
        )
        .route(
            "/api/v1/equipments/auth/cert/{auth_code}",
            get(equipments::certificate),
        )
        .route("/hotspot/{auth_code}/{file_name}", get(hotspot::page));

    // Operator-facing surface, tenant-scoped by API key.
    let operator_routes = Router::new()
        .route("/api/v1/equipments/provision", post(provision::provision_equipment))
        .layer(middleware::from_fn_with_state(state.clone(), tenant_auth));

    Router::new()
        .route("/api/v1/health", get(health))
        .merge(device_routes)
        .merge(operator_routes)
        .with_state(state)
}
