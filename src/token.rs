//! Provisioning-token codec.
//!
//! A token is a small JSON payload sealed with AES-256-GCM and encoded as
//! URL-safe unpadded base64, so it can travel as a single path segment in
//! the bootstrap URL handed to a freshly registered router. Tokens are
//! never persisted; they exist only in transit.

use aes_gcm::{
    Aes256Gcm, Key, KeyInit, Nonce,
    aead::{Aead, OsRng, rand_core::RngCore},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use hkdf::Hkdf;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{AppError, Result};

const NONCE_LEN: usize = 12;
const HKDF_INFO: &[u8] = b"netprov-token-v1";

/// Logical contents of a provisioning token.
///
/// `mtk` is the equipment row id; `auth` is the equipment's auth code,
/// carried redundantly so the config endpoint can check both halves of the
/// binding; `timestamp` is the RFC 3339 issuance instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPayload {
    pub mtk: i64,
    pub auth: String,
    pub timestamp: String,
}

/// Process-wide symmetric token key, derived once at startup from
/// configured key material and never rotated at runtime.
pub struct TokenKey {
    cipher: Aes256Gcm,
}

impl TokenKey {
    pub fn from_key_material(material: &[u8; 32]) -> Self {
        let hk = Hkdf::<Sha256>::new(None, material);
        let mut okm = [0u8; 32];
        hk.expand(HKDF_INFO, &mut okm)
            .expect("32 bytes is a valid HKDF-SHA256 output length");
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&okm)),
        }
    }

    /// Parse hex-encoded 32-byte key material (the `TOKEN_KEY` setting).
    pub fn from_hex(hex_material: &str) -> Result<Self> {
        let bytes = hex::decode(hex_material)
            .map_err(|_| AppError::Internal("token key material is not valid hex".into()))?;
        let material: [u8; 32] = bytes
            .try_into()
            .map_err(|_| AppError::Internal("token key material must be 32 bytes".into()))?;
        Ok(Self::from_key_material(&material))
    }

    /// Seal arbitrary plaintext into a URL-safe token string.
    pub fn seal(&self, plaintext: &[u8]) -> String {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .expect("AES-GCM encryption is infallible for in-memory buffers");

        let mut raw = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        raw.extend_from_slice(&nonce_bytes);
        raw.extend_from_slice(&ciphertext);
        URL_SAFE_NO_PAD.encode(raw)
    }

    /// Open a sealed token back into plaintext.
    ///
    /// Every failure mode (bad base64, short input, AEAD rejection) maps to
    /// the same generic `InvalidToken` so decode errors cannot be used as a
    /// padding/format oracle.
    pub fn open(&self, token: &str) -> Result<Vec<u8>> {
        let raw = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| AppError::InvalidToken)?;
        if raw.len() <= NONCE_LEN {
            return Err(AppError::InvalidToken);
        }
        let (nonce_bytes, ciphertext) = raw.split_at(NONCE_LEN);
        self.cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| AppError::InvalidToken)
    }
}

/// Serialize and seal a payload into an opaque token.
pub fn encode_payload(key: &TokenKey, payload: &TokenPayload) -> Result<String> {
    let json = serde_json::to_vec(payload)
        .map_err(|err| AppError::Internal(format!("token payload serialization: {err}")))?;
    Ok(key.seal(&json))
}

/// Open and shape-validate a token.
///
/// The decrypted bytes must be a JSON object carrying exactly an integer
/// `mtk`, a string `auth`, and a string `timestamp`; anything else is
/// rejected as `InvalidToken`. Staleness is the caller's policy, not the
/// codec's; the timestamp is validated for presence and type only.
pub fn decode_payload(key: &TokenKey, token: &str) -> Result<TokenPayload> {
    let plaintext = key.open(token)?;

    let value: serde_json::Value =
        serde_json::from_slice(&plaintext).map_err(|_| AppError::InvalidToken)?;
    let object = value.as_object().ok_or(AppError::InvalidToken)?;

    let mtk = object
        .get("mtk")
        .and_then(|v| v.as_i64())
        .ok_or(AppError::InvalidToken)?;
    let auth = object
        .get("auth")
        .and_then(|v| v.as_str())
        .ok_or(AppError::InvalidToken)?;
    let timestamp = object
        .get("timestamp")
        .and_then(|v| v.as_str())
        .ok_or(AppError::InvalidToken)?;

    Ok(TokenPayload {
        mtk,
        auth: auth.to_string(),
        timestamp: timestamp.to_string(),
    })
}
