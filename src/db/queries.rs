use chrono::Utc;
use rusqlite::{Connection, Row, params};

use crate::error::{AppError, Result};
use crate::models::{Equipment, EquipmentStatus, NewEquipment, Tenant};
use crate::util::generate_key;

const EQUIPMENT_COLS: &str =
    "id, tenant, name, identity, auth_code, password, ip_address, status, created_at, updated_at";

const TENANT_COLS: &str = "id, slug, api_key, created_at";

fn now() -> i64 {
    Utc::now().timestamp()
}

fn equipment_from_row(row: &Row) -> rusqlite::Result<Equipment> {
    let status: String = row.get(7)?;
    let status: EquipmentStatus = status.parse().map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(err))
    })?;
    Ok(Equipment {
        id: row.get(0)?,
        tenant: row.get(1)?,
        name: row.get(2)?,
        identity: row.get(3)?,
        auth_code: row.get(4)?,
        password: row.get(5)?,
        ip_address: row.get(6)?,
        status,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn tenant_from_row(row: &Row) -> rusqlite::Result<Tenant> {
    Ok(Tenant {
        id: row.get(0)?,
        slug: row.get(1)?,
        api_key: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(f, _)
            if f.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

// ============ Tenants ============

/// Create a tenant with a freshly minted API key.
pub fn create_tenant(conn: &Connection, slug: &str) -> Result<Tenant> {
    let api_key = generate_key(40);
    let created_at = now();

    conn.execute(
        "INSERT INTO tenants (slug, api_key, created_at) VALUES (?1, ?2, ?3)",
        params![slug, &api_key, created_at],
    )
    .map_err(|err| {
        if is_constraint_violation(&err) {
            AppError::BadRequest(format!("tenant '{slug}' already exists"))
        } else {
            err.into()
        }
    })?;

    Ok(Tenant {
        id: conn.last_insert_rowid(),
        slug: slug.to_string(),
        api_key,
        created_at,
    })
}

pub fn get_tenant_by_api_key(conn: &Connection, api_key: &str) -> Result<Option<Tenant>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TENANT_COLS} FROM tenants WHERE api_key = ?1"
    ))?;
    let mut rows = stmt.query_map(params![api_key], tenant_from_row)?;
    rows.next().transpose().map_err(Into::into)
}

// ============ Equipment ============

pub fn equipment_identity_exists(conn: &Connection, identity: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM equipments WHERE identity = ?1",
        params![identity],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Insert a freshly provisioned equipment row.
///
/// The UNIQUE constraints on `identity` and `auth_code` resolve the
/// duplicate-name race: two concurrent requests may both pass the
/// fast-path existence check, but the loser surfaces here as the same
/// `DuplicateDevice` the check produces.
pub fn insert_equipment(conn: &Connection, input: &NewEquipment) -> Result<Equipment> {
    let created_at = now();

    conn.execute(
        "INSERT INTO equipments (tenant, name, identity, auth_code, password, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            &input.tenant,
            &input.name,
            &input.identity,
            &input.auth_code,
            &input.password,
            EquipmentStatus::Active.as_ref(),
            created_at,
            created_at,
        ],
    )
    .map_err(|err| {
        if is_constraint_violation(&err) {
            AppError::DuplicateDevice
        } else {
            err.into()
        }
    })?;

    Ok(Equipment {
        id: conn.last_insert_rowid(),
        tenant: input.tenant.clone(),
        name: input.name.clone(),
        identity: input.identity.clone(),
        auth_code: input.auth_code.clone(),
        password: input.password.clone(),
        ip_address: None,
        status: EquipmentStatus::Active,
        created_at,
        updated_at: created_at,
    })
}

pub fn get_equipment_by_id(conn: &Connection, id: i64) -> Result<Option<Equipment>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EQUIPMENT_COLS} FROM equipments WHERE id = ?1"
    ))?;
    let mut rows = stmt.query_map(params![id], equipment_from_row)?;
    rows.next().transpose().map_err(Into::into)
}

pub fn get_equipment_by_auth_code(conn: &Connection, auth_code: &str) -> Result<Option<Equipment>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EQUIPMENT_COLS} FROM equipments WHERE auth_code = ?1"
    ))?;
    let mut rows = stmt.query_map(params![auth_code], equipment_from_row)?;
    rows.next().transpose().map_err(Into::into)
}

pub fn count_equipments(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM equipments", [], |row| row.get(0))
        .map_err(Into::into)
}
