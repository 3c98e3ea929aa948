use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::channel::DeviceChannelSession;
use crate::crypto::{md5_hex, md5_hex_concat, nonce};

/// Payload schema version understood by device firmware
pub const PAYLOAD_VERSION: u32 = 1;

/// A control command for a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Switch the device output on or off
    ToggleX { onoff: bool },
}

impl Command {
    pub fn turn_on() -> Self {
        Self::ToggleX { onoff: true }
    }

    pub fn turn_off() -> Self {
        Self::ToggleX { onoff: false }
    }

    pub fn method(&self) -> &'static str {
        match self {
            Self::ToggleX { .. } => "SET",
        }
    }

    pub fn namespace(&self) -> &'static str {
        match self {
            Self::ToggleX { .. } => "Appliance.Control.ToggleX",
        }
    }

    pub fn payload(&self) -> Value {
        match self {
            Self::ToggleX { onoff } => json!({ "togglex": { "onoff": u8::from(*onoff) } }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeHeader {
    /// Topic the device should answer on
    pub from: String,
    pub message_id: String,
    pub method: String,
    pub namespace: String,
    pub payload_version: u32,
    #[serde(rename = "sign")]
    pub signature: String,
    /// Seconds since the unix epoch
    pub timestamp: i64,
}

/// Signed message published on a device's request topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub header: EnvelopeHeader,
    pub payload: Value,
}

impl CommandEnvelope {
    /// Build an envelope for `command`, stamped now with a fresh message id
    pub fn build(channel: &DeviceChannelSession, key: &str, command: Command) -> Self {
        Self::build_at(channel, key, command, unix_seconds(), &mut rand::rng())
    }

    /// Build an envelope for a fixed timestamp, drawing the message id from `rng`
    pub fn build_at<R: Rng + ?Sized>(
        channel: &DeviceChannelSession,
        key: &str,
        command: Command,
        timestamp: i64,
        rng: &mut R,
    ) -> Self {
        let message_id = md5_hex(nonce::generate_with(rng, 16));
        let signature = signature(&message_id, key, timestamp);
        Self {
            header: EnvelopeHeader {
                from: channel.response_topic.clone(),
                message_id,
                method: command.method().to_string(),
                namespace: command.namespace().to_string(),
                payload_version: PAYLOAD_VERSION,
                signature,
                timestamp,
            },
            payload: command.payload(),
        }
    }

    /// Check the header signature against `key`
    ///
    /// Devices sign their replies the same way, so this also applies to
    /// inbound messages.
    pub fn verify(&self, key: &str) -> bool {
        signature(&self.header.message_id, key, self.header.timestamp) == self.header.signature
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// `md5(message_id || key || timestamp)`
fn signature(message_id: &str, key: &str, timestamp: i64) -> String {
    let timestamp = timestamp.to_string();
    md5_hex_concat([message_id, key, timestamp.as_str()])
}

fn unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
