use std::fmt;

use serde::{Deserialize, Serialize};

use common::device::DeviceDescriptor;
use common::session::LoginData;

use super::client::Credentials;
use super::ApiRequest;

/// `POST /v1/Auth/Login`
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl From<&Credentials> for LoginRequest {
    fn from(credentials: &Credentials) -> Self {
        Self {
            email: credentials.email.clone(),
            password: credentials.password.clone(),
        }
    }
}

impl ApiRequest for LoginRequest {
    type Data = LoginData;
    const PATH: &'static str = "v1/Auth/Login";
}

/// `POST /v1/Device/devList`
///
/// The cloud re-validates the login credentials on this call rather than
/// trusting the token alone, so it is signed over the same parameters.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct DeviceListRequest(pub LoginRequest);

impl ApiRequest for DeviceListRequest {
    type Data = Vec<DeviceDescriptor>;
    const PATH: &'static str = "v1/Device/devList";
}

/// Envelope shared by every cloud response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub api_status: i64,
    #[serde(default)]
    pub sys_status: i64,
    pub data: Option<T>,
    #[serde(default)]
    pub info: String,
}
