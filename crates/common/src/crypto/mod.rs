//! Hashing and signing primitives for the Meross cloud protocol
//!
//! The vendor protocol is built entirely on MD5 hex digests:
//!
//! - **Request signatures**: every cloud API call carries
//!   `md5(salt || timestamp_ms || nonce || params)` where `params` is the
//!   base64 encoding of the JSON request parameters
//! - **Channel credentials**: the MQTT password and client id are MD5
//!   digests over session and device fields (see [`crate::channel`])
//! - **Envelope signatures**: each command carries
//!   `md5(message_id || key || timestamp_s)` (see [`crate::envelope`])
//!
//! MD5 is not used for secrecy here; it only has to match what the cloud and
//! device firmware compute byte for byte.

mod digest;
pub mod nonce;
mod signer;

pub use digest::{md5_hex, md5_hex_concat};
pub use signer::{encode_params, RequestSigner, SignError, SignedPayload, NONCE_LEN};
