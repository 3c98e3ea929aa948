use reqwest::StatusCode;

use common::crypto::SignError;
use common::device::DeviceDescriptor;
use common::session::AuthError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("HTTP status {0}: {1}")]
    HttpStatus(StatusCode, String),
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("failed to sign request: {0}")]
    Sign(#[from] SignError),
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),
    /// The device list call was rejected; `devices` holds whatever the cloud
    /// returned alongside the rejection and must not be trusted.
    #[error("login required: {cause}")]
    LoginRequired {
        cause: AuthError,
        devices: Vec<DeviceDescriptor>,
    },
    #[error("not logged in")]
    NotLoggedIn,
    #[error("login response is missing `{0}`")]
    MissingSessionField(&'static str),
}

impl ApiError {
    /// True for failures that another login attempt could fix
    pub fn is_authentication(&self) -> bool {
        matches!(
            self,
            ApiError::Auth(_)
                | ApiError::LoginRequired { .. }
                | ApiError::NotLoggedIn
                | ApiError::MissingSessionField(_)
        )
    }
}
