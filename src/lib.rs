//! netprov: router provisioning and configuration delivery for a
//! multi-tenant ISP back office.
//!
//! Registers new routers with a remote VPN/certificate service, hands out
//! one-time bootstrap scripts carrying an encrypted provisioning token,
//! and serves the full VPN/hotspot configuration to unauthenticated
//! devices that present a valid token.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod provision;
pub mod remote;
pub mod scripts;
pub mod token;
pub mod util;
