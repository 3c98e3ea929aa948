//! Client for the Meross cloud HTTP API
//!
//! Every call is a `POST` whose body is a [`common::crypto::SignedPayload`]
//! built from the request's parameters. Responses share one envelope,
//! [`requests::ApiResponse`], whose `info` field carries authentication
//! failures even when the HTTP status is 200.

mod client;
mod error;
pub mod requests;

use serde::de::DeserializeOwned;
use serde::Serialize;

pub use client::{CloudClient, Credentials, DEFAULT_BASE_URL};
pub use error::ApiError;

/// A cloud endpoint and the parameters it is signed over
pub trait ApiRequest: Serialize + Send + Sync {
    /// Shape of the response `data` field
    type Data: DeserializeOwned;

    /// Path below the base URL, without a leading slash
    const PATH: &'static str;
}
