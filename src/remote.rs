//! Client for the remote VPN/certificate service.
//!
//! A thin RPC wrapper over three endpoints on one configured base URL.
//! Transport failures never surface raw: they are logged and collapsed to
//! [`AppError::RemoteUnavailable`]. There is no retry loop; one failed
//! attempt is one failed response.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;

use crate::error::{AppError, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const USER_AGENT: &str = concat!("netprov/", env!("CARGO_PKG_VERSION"));

/// Outcome of a remote `create_client` call. Owned by the call that
/// produced it; never shared across requests.
#[derive(Debug, Clone)]
pub struct RemoteProvisionOutcome {
    pub success: bool,
    pub message: Option<String>,
    pub error: Option<String>,
    pub payload: Option<RemotePayload>,
}

#[derive(Debug, Clone)]
pub struct RemotePayload {
    pub client_name: String,
    pub certificate_created: Option<bool>,
    pub config_file_available: Option<bool>,
    pub created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateClientResponse {
    #[serde(default)]
    success: bool,
    message: Option<String>,
    error: Option<String>,
    client_name: Option<String>,
    certificate_created: Option<bool>,
    config_file_available: Option<bool>,
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServerIpResponse {
    ip: Option<String>,
}

pub struct ProvisioningClient {
    http: reqwest::Client,
    base_url: String,
}

impl ProvisioningClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut key_value = HeaderValue::from_str(api_key)
            .map_err(|_| AppError::Internal("MTK_API_KEY contains invalid characters".into()))?;
        key_value.set_sensitive(true);
        headers.insert("x-api-key", key_value);

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| AppError::Internal(format!("http client setup: {err}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    /// Register a new VPN client under `name`.
    ///
    /// The response body is mapped field-by-field regardless of HTTP
    /// status: the service reports its own failures through
    /// `success`/`error` in the body, sometimes alongside a 5xx.
    pub async fn create_client(&self, name: &str) -> Result<RemoteProvisionOutcome> {
        let response = self
            .http
            .post(self.url("vpn/clients/create"))
            .json(&serde_json::json!({ "client_name": name }))
            .send()
            .await
            .map_err(transport_error)?;

        let body: CreateClientResponse = response.json().await.map_err(transport_error)?;

        Ok(RemoteProvisionOutcome {
            success: body.success,
            message: body.message,
            error: body.error,
            payload: body.client_name.map(|client_name| RemotePayload {
                client_name,
                certificate_created: body.certificate_created,
                config_file_available: body.config_file_available,
                created_at: body.created_at,
            }),
        })
    }

    /// Resolve the VPN server's public IP. Called once at service startup;
    /// an absent `ip` field is `None`, and downstream config generation
    /// degrades instead of crashing.
    pub async fn fetch_server_ip(&self) -> Result<Option<String>> {
        let response = self
            .http
            .get(self.url("vpn/server/ip"))
            .send()
            .await
            .map_err(transport_error)?
            .error_for_status()
            .map_err(transport_error)?;

        let body: ServerIpResponse = response.json().await.map_err(transport_error)?;
        Ok(body.ip)
    }

    /// Fetch a device's certificate bundle as raw text (not JSON).
    pub async fn fetch_certificate(&self, identity: &str) -> Result<String> {
        let response = self
            .http
            .get(self.url(&format!("mikrotik/devices/{identity}/config")))
            .send()
            .await
            .map_err(transport_error)?
            .error_for_status()
            .map_err(transport_error)?;

        response.text().await.map_err(transport_error)
    }
}

fn transport_error(err: reqwest::Error) -> AppError {
    tracing::warn!("remote provisioning transport error: {err}");
    AppError::RemoteUnavailable
}
