/**
 * Hashing, nonces and request signing.
 *  - MD5 hex digests used throughout the protocol
 *  - Restricted-alphabet nonce generation
 *  - Cloud API request signatures
 */
pub mod crypto;
/**
 * Per-device MQTT credentials and topic names,
 *  derived from the cloud session and a device
 *  descriptor.
 */
pub mod channel;
/**
 * Devices as reported by the cloud device list.
 */
pub mod device;
/**
 * Signed command envelopes published to devices.
 */
pub mod envelope;
/**
 * Cloud login outcome and the typed mapping of
 *  the cloud's free-text `info` field.
 */
pub mod session;

pub mod prelude {
    pub use crate::channel::{BrokerAddress, DeviceChannelSession};
    pub use crate::crypto::{encode_params, md5_hex, nonce, RequestSigner, SignError, SignedPayload};
    pub use crate::device::{Channel, DeviceDescriptor};
    pub use crate::envelope::{Command, CommandEnvelope, EnvelopeHeader};
    pub use crate::session::{AuthError, AuthSession};
}
