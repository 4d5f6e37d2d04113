//! Key generation, slugging, and external-URL resolution.

use std::collections::HashSet;

use axum::http::HeaderMap;

use netprov::util::{access_mode, external_base_url, generate_key, slug};


#[test]
fn generated_keys_have_exact_length_and_alphabet() {
    for len in [1, 16, 20, 40] {
        let key = generate_key(len);
        assert_eq!(key.len(), len);
        assert!(key.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}

#[test]
fn ten_thousand_keys_do_not_collide() {
    // Probabilistic, not a strict invariant: 62^16 makes a collision in
    // 10k draws vanishingly unlikely, so one here means the generator is
    // broken.
    let keys: HashSet<String> = (0..10_000).map(|_| generate_key(16)).collect();
    assert_eq!(keys.len(), 10_000);
}

#[test]
fn access_mode_follows_scheme() {
    assert_eq!(access_mode("https://portal.example.com/login"), "https");
    assert_eq!(access_mode("http://10.0.0.1/login"), "http");
    assert_eq!(access_mode("ftp://weird"), "http");
}

#[test]
fn slug_preserves_alphanumerics_and_case() {
    assert_eq!(slug("MTK1"), "MTK1");
    assert_eq!(slug("  Branch Office 3 "), "Branch-Office-3");
    assert_eq!(slug("café—router"), "caf-router"); // 'é' is not ASCII alphanumeric
}

#[test]
fn slug_collapses_and_trims_separators() {
    assert_eq!(slug("a//b..c"), "a-b-c");
    assert_eq!(slug("--x--"), "x");
    assert_eq!(slug("!!!"), "");
}

#[test]
fn public_domain_host_is_used_directly() {
    let config = common::test_config("http://127.0.0.1:9");
    let mut headers = HeaderMap::new();
    headers.insert("host", "isp.example.com".parse().unwrap());
    assert_eq!(
        external_base_url(&headers, &config),
        "https://isp.example.com"
    );
}

#[test]
fn forwarded_proto_overrides_default_scheme() {
    let config = common::test_config("http://127.0.0.1:9");
    let mut headers = HeaderMap::new();
    headers.insert("host", "isp.example.com".parse().unwrap());
    headers.insert("x-forwarded-proto", "http".parse().unwrap());
    assert_eq!(
        external_base_url(&headers, &config),
        "http://isp.example.com"
    );
}

#[test]
fn non_domain_host_falls_back_to_public_ip() {
    let config = common::test_config("http://127.0.0.1:9");
    let mut headers = HeaderMap::new();
    headers.insert("host", "localhost:8000".parse().unwrap());
    assert_eq!(
        external_base_url(&headers, &config),
        "http://203.0.113.10:8000"
    );

    assert_eq!(
        external_base_url(&HeaderMap::new(), &config),
        "http://203.0.113.10:8000"
    );
}
