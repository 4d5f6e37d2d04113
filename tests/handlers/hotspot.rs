//! Tests for GET /hotspot/{auth_code}/{file_name}.

use axum::http::StatusCode;
use tower::ServiceExt;

use crate::common::*;

#[tokio::test]
async fn login_page_renders_for_a_known_device() {
    let remote = spawn_mock_vpn_server().await;
    let (state, _db) = create_test_state(&remote);
    let equipment = insert_test_equipment(&state, "acme", "MTK1");

    let response = app(state)
        .oneshot(get_request(&format!(
            "/hotspot/{}/login.html",
            equipment.auth_code
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("MTK1"));
    assert!(body.contains("$(link-login-only)"));
}

#[tokio::test]
async fn relogin_page_is_the_second_variant() {
    let remote = spawn_mock_vpn_server().await;
    let (state, _db) = create_test_state(&remote);
    let equipment = insert_test_equipment(&state, "acme", "MTK1");

    let response = app(state)
        .oneshot(get_request(&format!(
            "/hotspot/{}/rlogin.html",
            equipment.auth_code
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("document.relogin.submit()"));
}

#[tokio::test]
async fn unknown_file_name_is_file_not_found() {
    let remote = spawn_mock_vpn_server().await;
    let (state, _db) = create_test_state(&remote);
    let equipment = insert_test_equipment(&state, "acme", "MTK1");

    let response = app(state)
        .oneshot(get_request(&format!(
            "/hotspot/{}/admin.html",
            equipment.auth_code
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_string(response).await, "file not found");
}

#[tokio::test]
async fn unknown_auth_code_is_not_found() {
    let remote = spawn_mock_vpn_server().await;
    let (state, _db) = create_test_state(&remote);

    let response = app(state)
        .oneshot(get_request("/hotspot/NoSuchCode123/login.html"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
