use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::digest::md5_hex_concat;
use super::nonce;

/// Length of the nonce attached to every signed cloud request
pub const NONCE_LEN: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum SignError {
    #[error("failed to encode request parameters: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Body of every signed cloud API request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedPayload {
    /// Base64 of the JSON-encoded request parameters
    pub params: String,
    /// Hex MD5 request signature
    #[serde(rename = "sign")]
    pub signature: String,
    /// Milliseconds since the unix epoch
    pub timestamp: i64,
    pub nonce: String,
}

/// Base64 (standard alphabet, padded) of the JSON encoding of `params`
///
/// Keys appear in the order `params` serializes them; the signature is
/// computed over exactly this string, so it must also be what is sent.
pub fn encode_params<T: Serialize + ?Sized>(params: &T) -> Result<String, SignError> {
    let json = serde_json::to_vec(params)?;
    Ok(STANDARD.encode(json))
}

/// Signs cloud API requests with the shared salt
#[derive(Clone)]
pub struct RequestSigner {
    salt: String,
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner")
            .field("salt", &"<redacted>")
            .finish()
    }
}

impl RequestSigner {
    pub fn new(salt: impl Into<String>) -> Self {
        Self { salt: salt.into() }
    }

    /// `md5(salt || timestamp_ms || nonce || encoded_params)` as lowercase hex
    pub fn sign(&self, timestamp_ms: i64, nonce: &str, encoded_params: &str) -> String {
        let timestamp = timestamp_ms.to_string();
        md5_hex_concat([
            self.salt.as_bytes(),
            timestamp.as_bytes(),
            nonce.as_bytes(),
            encoded_params.as_bytes(),
        ])
    }

    /// Build a payload stamped with the current time and a fresh nonce
    pub fn signed_payload<T: Serialize + ?Sized>(
        &self,
        params: &T,
    ) -> Result<SignedPayload, SignError> {
        self.signed_payload_at(params, unix_millis(), nonce::generate(NONCE_LEN))
    }

    /// Build a payload for a fixed timestamp and nonce
    pub fn signed_payload_at<T: Serialize + ?Sized>(
        &self,
        params: &T,
        timestamp_ms: i64,
        nonce: String,
    ) -> Result<SignedPayload, SignError> {
        let params = encode_params(params)?;
        let signature = self.sign(timestamp_ms, &nonce, &params);
        Ok(SignedPayload {
            params,
            signature,
            timestamp: timestamp_ms,
            nonce,
        })
    }
}

fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
