//! Provisioning orchestrator.
//!
//! Drives a single provisioning request through name check, credential
//! generation, remote registration, transactional persistence, and
//! bootstrap issuance. Every failure path maps to one terminal error; no
//! partial state is ever visible to the caller.

use chrono::Utc;

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::models::NewEquipment;
use crate::scripts::{self, BootstrapScript};
use crate::token::{self, TokenPayload};
use crate::util::{generate_key, slug};

/// Display name used when the operator omits one.
const DEFAULT_NAME: &str = "Router";

const PASSWORD_LEN: usize = 16;
const AUTH_CODE_LEN: usize = 20;

#[derive(Debug, Clone)]
pub struct ProvisionOutput {
    pub script: String,
    pub provisioning_url: String,
    pub rsc_file: String,
}

/// Provision a new router for `tenant`.
///
/// Ordering is a correctness requirement: the identity check runs before
/// the remote call so a request that cannot be persisted never creates a
/// remote VPN client. Credentials generated here are discarded on any
/// failure; a retried request always regenerates them.
pub async fn provision_router(
    state: &AppState,
    tenant: &str,
    name: Option<String>,
    base_url: &str,
) -> Result<ProvisionOutput> {
    let name = name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_NAME.to_string());

    let device_slug = slug(&name);
    if device_slug.is_empty() {
        return Err(AppError::BadRequest("device name has no usable characters".into()));
    }
    let identity = format!("{tenant}_{device_slug}");

    {
        let conn = state.db.get()?;
        if queries::equipment_identity_exists(&conn, &identity)? {
            return Err(AppError::DuplicateDevice);
        }
    }

    let password = generate_key(PASSWORD_LEN);
    let auth_code = generate_key(AUTH_CODE_LEN);

    let outcome = state.remote.create_client(&identity).await?;
    if outcome.error.is_some() || !outcome.success {
        tracing::warn!(
            identity = %identity,
            error = outcome.error.as_deref().unwrap_or("unspecified"),
            "remote provisioning rejected client creation"
        );
        return Err(AppError::RemoteUnavailable);
    }
    tracing::info!(
        identity = %identity,
        client = outcome.payload.as_ref().map(|p| p.client_name.as_str()),
        "remote VPN client registered"
    );

    // From here on the remote side already has a client named `identity`.
    // Persistence failure leaves it orphaned; there is no compensating
    // delete, only the reconciliation log line below.
    let mut conn = state.db.get()?;
    let tx = conn
        .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)
        .map_err(|err| orphaned(&identity, err.into()))?;

    let equipment = queries::insert_equipment(
        &tx,
        &NewEquipment {
            tenant: tenant.to_string(),
            name,
            identity: identity.clone(),
            auth_code: auth_code.clone(),
            password,
        },
    )
    .map_err(|err| orphaned(&identity, err))?;

    let payload = TokenPayload {
        mtk: equipment.id,
        auth: auth_code,
        timestamp: Utc::now().to_rfc3339(),
    };
    let encoded = token::encode_payload(&state.token_key, &payload)?;
    let BootstrapScript {
        script,
        url,
        rsc_file,
    } = scripts::bootstrap_script(&encoded, base_url);

    tx.commit().map_err(|err| orphaned(&identity, err.into()))?;

    tracing::info!(identity = %identity, id = equipment.id, "equipment provisioned");

    Ok(ProvisionOutput {
        script,
        provisioning_url: url,
        rsc_file,
    })
}

/// Record that a registered remote client now has no local row. Duplicate
/// losers are expected under concurrency; anything else needs an operator
/// to reconcile the remote side out-of-band.
fn orphaned(identity: &str, err: AppError) -> AppError {
    match &err {
        AppError::DuplicateDevice => {
            tracing::warn!(
                identity = %identity,
                "duplicate insert race lost after remote registration"
            );
        }
        _ => {
            tracing::error!(
                identity = %identity,
                "persistence failed after remote registration; remote VPN client is orphaned: {err}"
            );
        }
    }
    err
}
