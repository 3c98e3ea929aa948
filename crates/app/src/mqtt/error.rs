use std::time::Duration;

use super::connection::ConnectionState;

/// Why a broker connection ended up in [`ConnectionState::Failed`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Failure {
    #[error("broker refused the connection: {0}")]
    Refused(String),
    #[error("TLS failure: {0}")]
    Tls(String),
    #[error("network failure: {0}")]
    Network(String),
}

impl From<&rumqttc::ConnectionError> for Failure {
    fn from(err: &rumqttc::ConnectionError) -> Self {
        match err {
            rumqttc::ConnectionError::ConnectionRefused(code) => Failure::Refused(format!("{:?}", code)),
            rumqttc::ConnectionError::Tls(e) => Failure::Tls(e.to_string()),
            other => Failure::Network(other.to_string()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("connection to {broker} failed: {failure}")]
    Failed { broker: String, failure: Failure },
    #[error("timed out after {timeout:?} connecting to {broker}")]
    ConnectTimeout { broker: String, timeout: Duration },
    #[error("publish was not acknowledged within {0:?}")]
    PublishTimeout(Duration),
    #[error("not connected (state: {0})")]
    NotConnected(ConnectionState),
    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),
    #[error("failed to encode envelope: {0}")]
    Encode(#[from] serde_json::Error),
}
