use std::fmt;

use serde::Deserialize;

/// Authentication failures reported by the cloud in the response `info` field
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("no login found")]
    NoLogin,
    #[error("email missing in the request")]
    MissingEmail,
    #[error("password missing in the request")]
    MissingPassword,
    #[error("sign check failed")]
    SignCheckFailed,
    #[error("unknown server error: {0}")]
    Unknown(String),
}

impl AuthError {
    /// Map a raw `info` string; empty means no error
    pub fn from_info(info: &str) -> Option<Self> {
        match info.trim() {
            "" => None,
            "No login" => Some(Self::NoLogin),
            "Lack user" => Some(Self::MissingEmail),
            "Lack password" => Some(Self::MissingPassword),
            "Sign check failed" => Some(Self::SignCheckFailed),
            other => Some(Self::Unknown(other.to_string())),
        }
    }

    /// Map a full response status
    ///
    /// Known `info` strings are always errors. Unrecognized strings only count
    /// as errors when `api_status` is non-zero, since successful responses
    /// carry informational text such as `"Success"`.
    pub fn from_response(api_status: i64, info: &str) -> Option<Self> {
        match Self::from_info(info) {
            Some(Self::Unknown(_)) if api_status == 0 => None,
            mapped => mapped,
        }
    }
}

/// `data` object of a successful login response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginData {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub userid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("login response is missing `{0}`")]
pub struct MissingField(pub &'static str);

/// Outcome of a successful cloud login
///
/// Read-only once built; every per-device derivation reads from it.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthSession {
    token: String,
    key: String,
    user_id: String,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("token", &"<redacted>")
            .field("key", &"<redacted>")
            .field("user_id", &self.user_id)
            .finish()
    }
}

impl AuthSession {
    pub fn new(
        token: impl Into<String>,
        key: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            key: key.into(),
            user_id: user_id.into(),
        }
    }

    /// Opaque bearer token for subsequent cloud calls
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Shared key used for channel passwords and envelope signatures
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

impl TryFrom<LoginData> for AuthSession {
    type Error = MissingField;

    fn try_from(data: LoginData) -> Result<Self, Self::Error> {
        let present = |value: Option<String>, name: &'static str| {
            value
                .filter(|v| !v.is_empty())
                .ok_or(MissingField(name))
        };
        Ok(Self {
            token: present(data.token, "token")?,
            key: present(data.key, "key")?,
            user_id: present(data.userid, "userid")?,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_info_mapping() {
        assert_eq!(AuthError::from_info("No login"), Some(AuthError::NoLogin));
        assert_eq!(
            AuthError::from_info("Sign check failed"),
            Some(AuthError::SignCheckFailed)
        );
        assert_eq!(
            AuthError::from_info("Lack user"),
            Some(AuthError::MissingEmail)
        );
        assert_eq!(
            AuthError::from_info("Lack password"),
            Some(AuthError::MissingPassword)
        );
        assert_eq!(AuthError::from_info(""), None);
        assert_eq!(
            AuthError::from_info("Token expired"),
            Some(AuthError::Unknown("Token expired".to_string()))
        );
    }

    #[test]
    fn test_unknown_info_with_success_status_is_not_an_error() {
        assert_eq!(AuthError::from_response(0, "Success"), None);
        assert_eq!(
            AuthError::from_response(1030, "Something new"),
            Some(AuthError::Unknown("Something new".to_string()))
        );
        // known strings win regardless of status
        assert_eq!(
            AuthError::from_response(0, "No login"),
            Some(AuthError::NoLogin)
        );
    }

    #[test]
    fn test_session_from_login_data() {
        let data: LoginData = serde_json::from_str(
            r#"{"token":"t0k","key":"k3y","userid":"42","email":"a@b.c"}"#,
        )
        .unwrap();
        let session = AuthSession::try_from(data).unwrap();
        assert_eq!(session.token(), "t0k");
        assert_eq!(session.key(), "k3y");
        assert_eq!(session.user_id(), "42");
    }

    #[test]
    fn test_session_requires_every_field() {
        let data: LoginData = serde_json::from_str(r#"{"token":"t0k","userid":"42"}"#).unwrap();
        assert_eq!(AuthSession::try_from(data), Err(MissingField("key")));

        let data = LoginData {
            token: Some("t".into()),
            key: Some("k".into()),
            userid: Some(String::new()),
        };
        assert_eq!(AuthSession::try_from(data), Err(MissingField("userid")));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let session = AuthSession::new("t0k", "k3y", "42");
        let debug = format!("{:?}", session);
        assert!(!debug.contains("t0k"));
        assert!(!debug.contains("k3y"));
        assert!(debug.contains("42"));
    }
}
