use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

/// Equipment lifecycle. Transitions happen in the back-office layer; the
/// provisioning core only reads it to refuse retired hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EquipmentStatus {
    Active,
    Maintenance,
    Faulty,
    Retired,
}

/// A provisioned router. `id` is the integer bound into provisioning
/// tokens; `identity` and `auth_code` are unique across the system and
/// immutable once issued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Equipment {
    pub id: i64,
    pub tenant: String,
    pub name: String,
    pub identity: String,
    pub auth_code: String,
    pub password: String,
    pub ip_address: Option<String>,
    pub status: EquipmentStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Input for the provisioning insert.
#[derive(Debug, Clone)]
pub struct NewEquipment {
    pub tenant: String,
    pub name: String,
    pub identity: String,
    pub auth_code: String,
    pub password: String,
}
