use serde::{Deserialize, Serialize};

/// A back-office tenant allowed to provision equipment, identified on the
/// wire by its API key. Minted via the `add-tenant` CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: i64,
    pub slug: String,
    pub api_key: String,
    pub created_at: i64,
}
