//! Per-device MQTT channel credentials
//!
//! A device is reached through the vendor broker using credentials derived
//! from the cloud session and the device uuid:
//!
//! - password: `md5(user_id || key)`
//! - app id: `md5("API" || uuid)`, used in the client id and response topic
//! - request topic: `/appliance/{uuid}/subscribe`, commands go here
//! - response topic: `/app/{user_id}-{app_id}/subscribe`, placed in the
//!   envelope `from` field so the device knows where to answer
//! - user topic: `/app/{user_id}/subscribe`, subscribed after connecting

use std::fmt;

use crate::crypto::{md5_hex, md5_hex_concat};
use crate::device::DeviceDescriptor;
use crate::session::AuthSession;

/// Broker used when a device does not name its own domain
pub const DEFAULT_DOMAIN: &str = "us-iot.meross.com";
pub const BROKER_SCHEME: &str = "tcps";
pub const BROKER_PORT: u16 = 2001;

/// TLS MQTT endpoint for one device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerAddress {
    pub host: String,
    pub port: u16,
}

impl BrokerAddress {
    /// Broker for `domain`, falling back to [`DEFAULT_DOMAIN`] when empty
    pub fn for_domain(domain: &str) -> Self {
        let host = if domain.trim().is_empty() {
            DEFAULT_DOMAIN
        } else {
            domain.trim()
        };
        Self {
            host: host.to_string(),
            port: BROKER_PORT,
        }
    }
}

impl fmt::Display for BrokerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", BROKER_SCHEME, self.host, self.port)
    }
}

/// Credentials and topics for one device connection
///
/// Derived fresh for every connection attempt and never cached, so a rotated
/// session can't leave stale credentials behind.
#[derive(Clone, PartialEq, Eq)]
pub struct DeviceChannelSession {
    pub client_id: String,
    pub username: String,
    pub password: String,
    pub request_topic: String,
    pub response_topic: String,
    pub user_topic: String,
    pub broker: BrokerAddress,
}

impl fmt::Debug for DeviceChannelSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceChannelSession")
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("request_topic", &self.request_topic)
            .field("response_topic", &self.response_topic)
            .field("user_topic", &self.user_topic)
            .field("broker", &self.broker)
            .finish()
    }
}

impl DeviceChannelSession {
    pub fn derive(session: &AuthSession, device: &DeviceDescriptor) -> Self {
        let user_id = session.user_id();
        let app_id = app_id(&device.uuid);
        Self {
            client_id: format!("app:{}", app_id),
            username: user_id.to_string(),
            password: md5_hex_concat([user_id, session.key()]),
            request_topic: request_topic(&device.uuid),
            response_topic: format!("/app/{}-{}/subscribe", user_id, app_id),
            user_topic: user_topic(user_id),
            broker: BrokerAddress::for_domain(&device.domain),
        }
    }
}

/// `md5("API" || uuid)`
pub fn app_id(uuid: &str) -> String {
    md5_hex(format!("API{}", uuid))
}

pub fn request_topic(uuid: &str) -> String {
    format!("/appliance/{}/subscribe", uuid)
}

pub fn user_topic(user_id: &str) -> String {
    format!("/app/{}/subscribe", user_id)
}

#[cfg(test)]
mod test {
    use super::*;

    fn device(uuid: &str, domain: &str) -> DeviceDescriptor {
        DeviceDescriptor {
            uuid: uuid.to_string(),
            domain: domain.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_topics() {
        let session = AuthSession::new("token", "key", "U");
        let channel = DeviceChannelSession::derive(&session, &device("X", ""));
        assert_eq!(channel.request_topic, "/appliance/X/subscribe");
        assert_eq!(
            channel.response_topic,
            format!("/app/U-{}/subscribe", md5_hex("APIX"))
        );
        assert_eq!(channel.user_topic, "/app/U/subscribe");
    }

    #[test]
    fn test_credentials() {
        let session = AuthSession::new("token", "key", "U");
        let channel = DeviceChannelSession::derive(&session, &device("X", ""));
        assert_eq!(channel.username, "U");
        assert_eq!(channel.password, md5_hex("Ukey"));
        assert_eq!(channel.client_id, format!("app:{}", md5_hex("APIX")));
    }

    #[test]
    fn test_broker_default_and_override() {
        assert_eq!(
            BrokerAddress::for_domain("").to_string(),
            "tcps://us-iot.meross.com:2001"
        );
        assert_eq!(
            BrokerAddress::for_domain("test-domain").to_string(),
            "tcps://test-domain:2001"
        );

        let session = AuthSession::new("token", "key", "U");
        let channel = DeviceChannelSession::derive(&session, &device("X", "eu-iot.meross.com"));
        assert_eq!(channel.broker.host, "eu-iot.meross.com");
        assert_eq!(channel.broker.port, BROKER_PORT);
    }

    #[test]
    fn test_derivation_tracks_session_rotation() {
        let d = device("X", "");
        let first = DeviceChannelSession::derive(&AuthSession::new("t", "k1", "U"), &d);
        let second = DeviceChannelSession::derive(&AuthSession::new("t", "k2", "U"), &d);
        assert_ne!(first.password, second.password);
        assert_eq!(first.client_id, second.client_id);
    }

    #[test]
    fn test_debug_redacts_password() {
        let session = AuthSession::new("token", "key", "U");
        let channel = DeviceChannelSession::derive(&session, &device("X", ""));
        assert!(!format!("{:?}", channel).contains(&channel.password));
    }
}
