use std::fmt;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use url::Url;

use common::channel::DeviceChannelSession;
use common::crypto::RequestSigner;
use common::device::DeviceDescriptor;
use common::session::{AuthError, AuthSession};

use super::error::ApiError;
use super::requests::{ApiResponse, DeviceListRequest, LoginRequest};
use super::ApiRequest;

pub const DEFAULT_BASE_URL: &str = "https://iot.meross.com";

const VENDOR: &str = "Meross";
const APP_VERSION: &str = "1.3.0";
const APP_LANGUAGE: &str = "EN";
const USER_AGENT: &str = "okhttp/3.6.0";

/// Account credentials sent with every signed request
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Signed client for the cloud API
///
/// Holds at most one [`AuthSession`], populated by [`CloudClient::login`].
/// Everything that derives device credentials goes through
/// [`CloudClient::session`] and fails with [`ApiError::NotLoggedIn`] until
/// then.
#[derive(Debug, Clone)]
pub struct CloudClient {
    base_url: Url,
    http: Client,
    signer: RequestSigner,
    credentials: Credentials,
    session: Option<AuthSession>,
}

impl CloudClient {
    pub fn new(
        base_url: &Url,
        signer: RequestSigner,
        credentials: Credentials,
    ) -> Result<Self, ApiError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert("vender", HeaderValue::from_static(VENDOR));
        default_headers.insert("appversion", HeaderValue::from_static(APP_VERSION));
        default_headers.insert("applanguage", HeaderValue::from_static(APP_LANGUAGE));
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(default_headers)
            .http1_title_case_headers()
            .build()?;

        Ok(Self {
            base_url: base_url.clone(),
            http,
            signer,
            credentials,
            session: None,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The current session, or [`ApiError::NotLoggedIn`]
    pub fn session(&self) -> Result<&AuthSession, ApiError> {
        self.session.as_ref().ok_or(ApiError::NotLoggedIn)
    }

    /// Authenticate and store the resulting session
    pub async fn login(&mut self) -> Result<&AuthSession, ApiError> {
        let request = LoginRequest::from(&self.credentials);
        let response = self.call(&request).await?;

        if let Some(err) = AuthError::from_response(response.api_status, &response.info) {
            tracing::warn!(info = %response.info, "login rejected");
            return Err(err.into());
        }

        let data = response.data.ok_or(ApiError::MissingSessionField("data"))?;
        let session =
            AuthSession::try_from(data).map_err(|missing| ApiError::MissingSessionField(missing.0))?;
        tracing::info!(user_id = session.user_id(), "logged in");

        Ok(self.session.insert(session))
    }

    /// Fetch the account's devices, stamped with the session user id
    pub async fn list_devices(&self) -> Result<Vec<DeviceDescriptor>, ApiError> {
        let request = DeviceListRequest(LoginRequest::from(&self.credentials));
        let response = self.call(&request).await?;
        let devices = response.data.unwrap_or_default();

        if let Some(cause) = AuthError::from_response(response.api_status, &response.info) {
            tracing::warn!(info = %response.info, "device list rejected");
            return Err(ApiError::LoginRequired { cause, devices });
        }

        let user_id = self.session()?.user_id();
        tracing::debug!(count = devices.len(), "listed devices");
        Ok(devices
            .into_iter()
            .map(|device| device.with_user_id(user_id))
            .collect())
    }

    /// Derive MQTT credentials and topics for `device` from the current session
    pub fn channel_session(
        &self,
        device: &DeviceDescriptor,
    ) -> Result<DeviceChannelSession, ApiError> {
        Ok(DeviceChannelSession::derive(self.session()?, device))
    }

    async fn call<T: ApiRequest>(&self, request: &T) -> Result<ApiResponse<T::Data>, ApiError> {
        let url = self.endpoint(T::PATH)?;
        let payload = self.signer.signed_payload(request)?;

        let response = self
            .http
            .post(url)
            .header(AUTHORIZATION, self.authorization())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::HttpStatus(status, body));
        }

        let decoded: ApiResponse<T::Data> = serde_json::from_str(&body)?;
        tracing::debug!(
            path = T::PATH,
            api_status = decoded.api_status,
            sys_status = decoded.sys_status,
            info = %decoded.info,
            "cloud response"
        );
        Ok(decoded)
    }

    fn authorization(&self) -> String {
        match &self.session {
            Some(session) => format!("Basic {}", session.token()),
            None => "Basic".to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{}/{}", base, path))?)
    }
}
