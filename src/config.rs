use std::env;

use anyhow::{Context, bail};

/// Process configuration, loaded once at startup.
///
/// Deliberately does not derive `Debug`: `token_key` and `mtk_api_key` are
/// secrets and must never end up in logs.
#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    /// Public IP used to build device-reachable URLs when the request host
    /// is not a public domain name (dev boxes, NATed installs).
    pub public_ip: String,
    /// Hex-encoded 32-byte key material for the provisioning-token codec.
    pub token_key: String,
    /// Tokens older than this are rejected by the config endpoint.
    pub token_max_age_hours: i64,
    /// Base URL of the remote VPN/certificate service.
    pub mtk_base_url: String,
    pub mtk_api_key: String,
    /// Management username pushed into every rendered router config.
    pub mgmt_username: String,
    /// Hostname devices may resolve before hotspot authentication completes.
    pub walled_garden_host: String,
    pub dev_mode: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("NETPROV_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8000);

        let public_ip = env::var("PUBLIC_IP").unwrap_or_else(|_| host.clone());

        let token_key =
            env::var("TOKEN_KEY").context("TOKEN_KEY is required (run `netprov gen-key`)")?;
        if token_key.len() != 64 || hex::decode(&token_key).is_err() {
            bail!("TOKEN_KEY must be 64 hex characters (32 bytes)");
        }

        let token_max_age_hours: i64 = env::var("TOKEN_MAX_AGE_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(48);

        let mtk_base_url =
            env::var("MTK_BASE_URL").context("MTK_BASE_URL is required")?;

        let walled_garden_host =
            env::var("WALLED_GARDEN_HOST").unwrap_or_else(|_| public_ip.clone());

        Ok(Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "netprov.db".to_string()),
            public_ip,
            token_key,
            token_max_age_hours,
            mtk_base_url,
            mtk_api_key: env::var("MTK_API_KEY").unwrap_or_default(),
            mgmt_username: env::var("MGMT_USERNAME").unwrap_or_else(|_| "netadmin".to_string()),
            walled_garden_host,
            dev_mode,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
