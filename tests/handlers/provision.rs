//! Tests for POST /api/v1/equipments/provision.

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use netprov::db::queries;

use crate::common::*;

#[tokio::test]
async fn provision_creates_device_and_returns_bootstrap() {
    let remote = spawn_mock_vpn_server().await;
    let (state, _db) = create_test_state(&remote);
    let tenant = create_test_tenant(&state, "acme");

    let response = app(state.clone())
        .oneshot(provision_request(&tenant.api_key, json!({ "name": "MTK1" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["rsc_file"], "script.rsc");

    let pvr_url = body["pvr_url"].as_str().unwrap();
    assert!(pvr_url.contains("/api/v1/equipments/auth/config/"));
    // No Host header on the request, so URLs fall back to the public IP.
    assert!(pvr_url.starts_with("http://203.0.113.10:8000/"));

    let token = token_from_url(pvr_url);
    assert!(!token.is_empty());

    let script = body["script"].as_str().unwrap();
    assert!(script.contains(pvr_url));

    // The script carries the opaque token, never the credentials or the
    // identity.
    let conn = state.db.get().unwrap();
    let equipment = queries::get_equipment_by_id(&conn, 1).unwrap().unwrap();
    assert_eq!(equipment.identity, "acme_MTK1");
    assert!(!script.contains(&equipment.password));
    assert!(!script.contains(&equipment.auth_code));
    assert!(!script.contains("acme_MTK1"));
}

#[tokio::test]
async fn omitted_name_uses_placeholder() {
    let remote = spawn_mock_vpn_server().await;
    let (state, _db) = create_test_state(&remote);
    let tenant = create_test_tenant(&state, "acme");

    let response = app(state.clone())
        .oneshot(provision_request(&tenant.api_key, json!({})))
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(body["ok"], true);

    let conn = state.db.get().unwrap();
    let equipment = queries::get_equipment_by_id(&conn, 1).unwrap().unwrap();
    assert_eq!(equipment.identity, "acme_Router");
}

#[tokio::test]
async fn duplicate_device_reports_ok_false() {
    let remote = spawn_mock_vpn_server().await;
    let (state, _db) = create_test_state(&remote);
    let tenant = create_test_tenant(&state, "acme");

    let first = app(state.clone())
        .oneshot(provision_request(&tenant.api_key, json!({ "name": "MTK1" })))
        .await
        .unwrap();
    assert_eq!(body_json(first).await["ok"], true);

    let second = app(state.clone())
        .oneshot(provision_request(&tenant.api_key, json!({ "name": "MTK1" })))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    let body = body_json(second).await;
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"], "duplicate device");

    assert_eq!(equipment_count(&state), 1);
}

#[tokio::test]
async fn remote_rejection_creates_no_device() {
    let remote = spawn_mock_vpn_server().await;
    let (state, _db) = create_test_state(&remote);
    let tenant = create_test_tenant(&state, "acme");

    // The mock refuses client names containing "reject".
    let response = app(state.clone())
        .oneshot(provision_request(&tenant.api_key, json!({ "name": "rejectme" })))
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"], "device setup unavailable, retry later");
    assert_eq!(equipment_count(&state), 0);
}

#[tokio::test]
async fn remote_transport_failure_creates_no_device() {
    let (state, _db) = create_test_state(UNREACHABLE_REMOTE);
    let tenant = create_test_tenant(&state, "acme");

    let response = app(state.clone())
        .oneshot(provision_request(&tenant.api_key, json!({ "name": "MTK1" })))
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"], "device setup unavailable, retry later");
    assert_eq!(equipment_count(&state), 0);
}

#[tokio::test]
async fn missing_api_key_is_unauthorized() {
    let remote = spawn_mock_vpn_server().await;
    let (state, _db) = create_test_state(&remote);

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/v1/equipments/provision")
        .header("content-type", "application/json")
        .body(axum::body::Body::from(r#"{"name":"MTK1"}"#))
        .unwrap();

    let response = app(state.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(equipment_count(&state), 0);
}

#[tokio::test]
async fn unknown_api_key_is_unauthorized() {
    let remote = spawn_mock_vpn_server().await;
    let (state, _db) = create_test_state(&remote);
    create_test_tenant(&state, "acme");

    let response = app(state.clone())
        .oneshot(provision_request("not-a-real-key", json!({ "name": "MTK1" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn public_domain_host_shapes_the_bootstrap_url() {
    let remote = spawn_mock_vpn_server().await;
    let (state, _db) = create_test_state(&remote);
    let tenant = create_test_tenant(&state, "acme");

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/v1/equipments/provision")
        .header("content-type", "application/json")
        .header("host", "isp.example.com")
        .header("x-api-key", &tenant.api_key)
        .body(axum::body::Body::from(r#"{"name":"MTK1"}"#))
        .unwrap();

    let response = app(state).oneshot(request).await.unwrap();
    let body = body_json(response).await;
    assert!(
        body["pvr_url"]
            .as_str()
            .unwrap()
            .starts_with("https://isp.example.com/")
    );
}
