//! RouterOS script rendering.
//!
//! Pure template expansion over explicit inputs: the one-time bootstrap
//! snippet handed out at provisioning time, the full VPN/hotspot
//! configuration served to a device presenting a valid token, and the two
//! captive-portal page variants.

use crate::error::{AppError, Result};
use crate::util::access_mode;

/// Temp file the bootstrap snippet downloads the full config into.
pub const RSC_FILE: &str = "script.rsc";

#[derive(Debug, Clone)]
pub struct BootstrapScript {
    pub script: String,
    pub url: String,
    pub rsc_file: String,
}

/// Build the install/bootstrap snippet for a provisioning token.
///
/// The script fetches the full config from our own API and imports it. The
/// on-error branch prints a human-readable message and returns control to
/// the device; a failed fetch must never abort the router's own control
/// flow.
pub fn bootstrap_script(token: &str, base_url: &str) -> BootstrapScript {
    let url = format!("{base_url}/api/v1/equipments/auth/config/{token}");
    let script = format!(
        r#":do {{
    :local url "{url}";

    /tool fetch url=$url dst-path={RSC_FILE};
    :delay 2s;
    /import {RSC_FILE};
}} on-error={{
    :put "Error occurred during configuration. Check internet and retry.";
}}"#
    );
    BootstrapScript {
        script,
        url,
        rsc_file: RSC_FILE.to_string(),
    }
}

/// Firmware template variant, keyed by RouterOS major version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterOsVersion {
    /// v6.x: the OpenVPN client needs an imported client certificate and
    /// an explicit endpoint/passphrase.
    Legacy,
    /// v7+, the current firmware family.
    Current,
}

impl RouterOsVersion {
    /// Parse the version path segment reported by device firmware.
    /// Anything that is not clearly a 6.x major is treated as current.
    pub fn from_segment(segment: &str) -> Self {
        match segment.split('.').next().and_then(|s| s.parse::<u32>().ok()) {
            Some(major) if major <= 6 => RouterOsVersion::Legacy,
            _ => RouterOsVersion::Current,
        }
    }
}

/// Assembled inputs for a full config render.
///
/// The always-required fields are plain `String`s, so the compiler enforces
/// their presence. The legacy-only extras stay optional and are checked at
/// render time, since only one of the two variants needs them.
#[derive(Debug, Clone)]
pub struct ConfigContext {
    /// VPN/firewall endpoint the tunnel terminates on.
    pub firewall_ip: String,
    /// Device shared secret.
    pub secret: String,
    pub identity: String,
    /// Management username provisioned on the device.
    pub username: String,
    /// URL the device fetches its certificate bundle from.
    pub cert_url: String,
    pub login_url: String,
    pub relogin_url: String,
    pub walled_garden_host: String,
    /// Walled-garden IP from the boot-time server-ip cache. Falls back to
    /// `firewall_ip` when the cache came up empty.
    pub walled_garden_ip: Option<String>,
    /// Legacy (v6) only: OpenVPN endpoint.
    pub connect_to: Option<String>,
    /// Legacy (v6) only: tunnel passphrase.
    pub vpn_pass: Option<String>,
    /// Legacy (v6) only: imported client certificate name.
    pub client_cert: Option<String>,
}

impl ConfigContext {
    /// Access mode, derived from whether the login URL is secured.
    pub fn mode(&self) -> &'static str {
        access_mode(&self.login_url)
    }
}

fn require<'a>(field: &'a Option<String>, name: &'static str) -> Result<&'a str> {
    field
        .as_deref()
        .ok_or(AppError::TemplateFieldMissing(name))
}

/// Render the full VPN/hotspot configuration script for one device.
///
/// A missing variant-required field is a hard error: an incomplete config
/// imported onto a live device is worse than a rejected request.
pub fn render_config(ctx: &ConfigContext, version: RouterOsVersion) -> Result<String> {
    let walled_garden_ip = ctx.walled_garden_ip.as_deref().unwrap_or(&ctx.firewall_ip);
    let login_by = match ctx.mode() {
        "https" => "https",
        _ => "http-chap,http-pap",
    };

    let vpn_section = match version {
        RouterOsVersion::Current => format!(
            r#"/interface ovpn-client add name=netprov-vpn connect-to={firewall_ip} \
    user="{identity}" password="{secret}" cipher=aes256-gcm \
    use-peer-dns=no add-default-route=no"#,
            firewall_ip = ctx.firewall_ip,
            identity = ctx.identity,
            secret = ctx.secret,
        ),
        RouterOsVersion::Legacy => {
            let connect_to = require(&ctx.connect_to, "connect_to")?;
            let vpn_pass = require(&ctx.vpn_pass, "vpn_pass")?;
            let client_cert = require(&ctx.client_cert, "client_cert")?;
            format!(
                r#"/interface ovpn-client add name=netprov-vpn connect-to={connect_to} \
    user="{identity}" password="{vpn_pass}" certificate={client_cert} \
    cipher=aes256 auth=sha1 add-default-route=no"#,
                identity = ctx.identity,
            )
        }
    };

    Ok(format!(
        r#"# netprov full configuration
:do {{
    /system identity set name="{identity}"

    /tool fetch url="{cert_url}" dst-path=netprov-ca.crt
    :delay 2s
    /certificate import file-name=netprov-ca.crt passphrase=""

    {vpn_section}

    /user add name="{username}" password="{secret}" group=full

    /ip hotspot walled-garden add dst-host="{walled_garden_host}" action=allow
    /ip hotspot walled-garden ip add dst-address={walled_garden_ip} action=accept
    /ip hotspot profile set [find default=yes] login-by={login_by}

    /tool fetch url="{login_url}" dst-path=hotspot/login.html
    /tool fetch url="{relogin_url}" dst-path=hotspot/rlogin.html

    :put "Configuration applied.";
}} on-error={{
    :put "Error occurred during configuration. Check internet and retry.";
}}"#,
        identity = ctx.identity,
        cert_url = ctx.cert_url,
        username = ctx.username,
        secret = ctx.secret,
        walled_garden_host = ctx.walled_garden_host,
        login_url = ctx.login_url,
        relogin_url = ctx.relogin_url,
    ))
}

/// Captive-portal page variants a device may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotspotPage {
    Login,
    Relogin,
}

impl HotspotPage {
    pub fn from_file_name(name: &str) -> Option<Self> {
        match name {
            "login.html" => Some(HotspotPage::Login),
            "rlogin.html" => Some(HotspotPage::Relogin),
            _ => None,
        }
    }
}

/// Render a captive-portal page for one device.
///
/// The `$(...)` placeholders are RouterOS hotspot variables, substituted by
/// the router itself when it serves the page; they are emitted literally.
pub fn hotspot_page(page: HotspotPage, device_name: &str) -> String {
    match page {
        HotspotPage::Login => format!(
            r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{device_name} - Internet Login</title>
</head>
<body>
  $(if error)<p class="error">$(error)</p>$(endif)
  <form name="login" action="$(link-login-only)" method="post">
    <input type="hidden" name="dst" value="$(link-orig)">
    <input type="hidden" name="popup" value="true">
    <label>Username <input type="text" name="username" value="$(username)"></label>
    <label>Password <input type="password" name="password"></label>
    <button type="submit">Connect</button>
  </form>
</body>
</html>"#
        ),
        HotspotPage::Relogin => format!(
            r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>{device_name} - Reconnecting</title>
</head>
<body onload="document.relogin.submit()">
  <form name="relogin" action="$(link-login-only)" method="post">
    <input type="hidden" name="username" value="$(username)">
    <input type="hidden" name="password" value="$(password)">
    <input type="hidden" name="dst" value="$(link-orig)">
  </form>
  <p>Reconnecting, please wait&hellip;</p>
</body>
</html>"#
        ),
    }
}
