//! Shared test utilities: an in-process stand-in for the cloud API
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::Router;
use tokio::net::TcpListener;
use url::Url;

use common::crypto::RequestSigner;
use meross::cloud::{CloudClient, Credentials};

pub const SALT: &str = "test-salt";
pub const EMAIL: &str = "user@example.com";
pub const PASSWORD: &str = "hunter2";

/// One request as the mock cloud saw it
#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Recompute the request signature with the shared salt
    pub fn signature_matches(&self, salt: &str) -> bool {
        let field = |name: &str| self.body[name].clone();
        let (Some(params), Some(nonce), Some(timestamp), Some(sign)) = (
            field("params").as_str().map(str::to_string),
            field("nonce").as_str().map(str::to_string),
            field("timestamp").as_i64(),
            field("sign").as_str().map(str::to_string),
        ) else {
            return false;
        };
        RequestSigner::new(salt).sign(timestamp, &nonce, &params) == sign
    }
}

#[derive(Clone, Default)]
pub struct MockCloud {
    responses: Arc<Mutex<HashMap<String, (StatusCode, String)>>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockCloud {
    /// Answer `path` with `status` and a raw body
    pub fn respond(&self, path: &str, status: StatusCode, body: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body.into()));
    }

    /// Answer `path` with 200 and a JSON body
    pub fn respond_json(&self, path: &str, body: serde_json::Value) {
        self.respond(path, StatusCode::OK, body.to_string());
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    /// Serve on an ephemeral local port; returns the base URL
    pub async fn serve(&self) -> Url {
        let app = Router::new().fallback(handle).with_state(self.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{}", addr)).unwrap()
    }
}

async fn handle(
    State(cloud): State<MockCloud>,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let path = uri.path().to_string();
    cloud.requests.lock().unwrap().push(Recorded {
        path: path.clone(),
        headers,
        body: serde_json::from_str(&body).unwrap_or(serde_json::Value::Null),
    });

    cloud
        .responses
        .lock()
        .unwrap()
        .get(&path)
        .cloned()
        .unwrap_or((StatusCode::NOT_FOUND, "not found".to_string()))
}

pub fn client(base_url: &Url) -> CloudClient {
    CloudClient::new(
        base_url,
        RequestSigner::new(SALT),
        Credentials {
            email: EMAIL.to_string(),
            password: PASSWORD.to_string(),
        },
    )
    .unwrap()
}

pub fn login_ok() -> serde_json::Value {
    serde_json::json!({
        "apiStatus": 0,
        "sysStatus": 0,
        "info": "Success",
        "timeStamp": 1_700_000_000,
        "data": {
            "token": "tok-123",
            "key": "device-key",
            "userid": "4242",
            "email": EMAIL
        }
    })
}

pub fn rejected(info: &str) -> serde_json::Value {
    serde_json::json!({
        "apiStatus": 1003,
        "sysStatus": 0,
        "info": info,
        "data": null
    })
}

pub fn device_list() -> serde_json::Value {
    serde_json::json!({
        "apiStatus": 0,
        "sysStatus": 0,
        "info": "Success",
        "data": [
            {
                "uuid": "1806",
                "devName": "lamp",
                "deviceType": "mss110",
                "domain": "eu-iot.meross.com",
                "region": "eu",
                "channels": [{}]
            },
            {
                "uuid": "2207",
                "devName": "fan",
                "deviceType": "mss210",
                "domain": "",
                "region": "us",
                "channels": [{"type": "Switch", "devName": "outlet"}]
            }
        ]
    })
}
