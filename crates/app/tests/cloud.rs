mod common;

use axum::http::StatusCode;

use ::common::crypto::encode_params;
use ::common::session::AuthError;
use meross::cloud::ApiError;

use crate::common::{client, device_list, login_ok, rejected, MockCloud, EMAIL, PASSWORD, SALT};

const LOGIN: &str = "/v1/Auth/Login";
const DEV_LIST: &str = "/v1/Device/devList";

#[tokio::test]
async fn test_login_populates_session() {
    let cloud = MockCloud::default();
    cloud.respond_json(LOGIN, login_ok());
    let base = cloud.serve().await;

    let mut client = client(&base);
    assert!(matches!(client.session(), Err(ApiError::NotLoggedIn)));

    let session = client.login().await.unwrap();
    assert_eq!(session.token(), "tok-123");
    assert_eq!(session.key(), "device-key");
    assert_eq!(session.user_id(), "4242");
    assert_eq!(client.session().unwrap().user_id(), "4242");
}

#[tokio::test]
async fn test_login_request_is_signed() {
    let cloud = MockCloud::default();
    cloud.respond_json(LOGIN, login_ok());
    let base = cloud.serve().await;

    client(&base).login().await.unwrap();

    let requests = cloud.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.path, LOGIN);
    assert_eq!(request.header("authorization"), Some("Basic"));
    assert_eq!(request.header("vender"), Some("Meross"));
    assert_eq!(request.header("appversion"), Some("1.3.0"));
    assert_eq!(request.header("applanguage"), Some("EN"));
    assert_eq!(request.header("user-agent"), Some("okhttp/3.6.0"));
    assert_eq!(request.header("content-type"), Some("application/json"));

    let expected = encode_params(&serde_json::json!({ "email": EMAIL, "password": PASSWORD }))
        .unwrap();
    assert_eq!(request.body["params"], expected);
    assert_eq!(request.body["nonce"].as_str().unwrap().len(), 16);
    assert!(request.signature_matches(SALT));
    assert!(!request.signature_matches("some-other-salt"));
}

#[tokio::test]
async fn test_login_errors() {
    let cases = [
        ("No login", AuthError::NoLogin),
        ("Sign check failed", AuthError::SignCheckFailed),
        ("Lack user", AuthError::MissingEmail),
        ("Lack password", AuthError::MissingPassword),
        ("Account locked", AuthError::Unknown("Account locked".to_string())),
    ];

    for (info, expected) in cases {
        let cloud = MockCloud::default();
        cloud.respond_json(LOGIN, rejected(info));
        let base = cloud.serve().await;

        let mut client = client(&base);
        match client.login().await {
            Err(ApiError::Auth(err)) => assert_eq!(err, expected, "info {:?}", info),
            other => panic!("info {:?}: unexpected {:?}", info, other),
        }
        assert!(client.session().is_err());
    }
}

#[tokio::test]
async fn test_known_info_fails_even_with_zero_status() {
    let cloud = MockCloud::default();
    cloud.respond_json(
        LOGIN,
        serde_json::json!({ "apiStatus": 0, "info": "Sign check failed", "data": null }),
    );
    let base = cloud.serve().await;

    let err = client(&base).login().await.unwrap_err();
    assert!(matches!(err, ApiError::Auth(AuthError::SignCheckFailed)));
    assert!(err.is_authentication());
}

#[tokio::test]
async fn test_login_missing_key() {
    let cloud = MockCloud::default();
    cloud.respond_json(
        LOGIN,
        serde_json::json!({
            "apiStatus": 0,
            "info": "Success",
            "data": { "token": "tok", "userid": "1" }
        }),
    );
    let base = cloud.serve().await;

    let err = client(&base).login().await.unwrap_err();
    assert!(matches!(err, ApiError::MissingSessionField("key")));
}

#[tokio::test]
async fn test_list_devices_after_login() {
    let cloud = MockCloud::default();
    cloud.respond_json(LOGIN, login_ok());
    cloud.respond_json(DEV_LIST, device_list());
    let base = cloud.serve().await;

    let mut client = client(&base);
    client.login().await.unwrap();
    let devices = client.list_devices().await.unwrap();

    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].uuid, "1806");
    assert_eq!(devices[0].name, "lamp");
    assert_eq!(devices[0].domain, "eu-iot.meross.com");
    assert_eq!(devices[1].channels[0].name, "outlet");
    assert!(devices.iter().all(|d| d.user_id == "4242"));

    let requests = cloud.requests();
    let list = requests.iter().find(|r| r.path == DEV_LIST).unwrap();
    assert_eq!(list.header("authorization"), Some("Basic tok-123"));
    assert!(list.signature_matches(SALT));

    let channel = client.channel_session(&devices[0]).unwrap();
    assert_eq!(channel.username, "4242");
    assert_eq!(channel.request_topic, "/appliance/1806/subscribe");
    assert_eq!(channel.user_topic, "/app/4242/subscribe");
    assert_eq!(channel.broker.to_string(), "tcps://eu-iot.meross.com:2001");

    let fallback = client.channel_session(&devices[1]).unwrap();
    assert_eq!(fallback.broker.to_string(), "tcps://us-iot.meross.com:2001");
}

#[tokio::test]
async fn test_list_devices_requires_login() {
    let cloud = MockCloud::default();
    cloud.respond_json(DEV_LIST, rejected("No login"));
    let base = cloud.serve().await;

    match client(&base).list_devices().await {
        Err(ApiError::LoginRequired { cause, devices }) => {
            assert_eq!(cause, AuthError::NoLogin);
            assert!(devices.is_empty());
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_list_devices_without_session() {
    let cloud = MockCloud::default();
    cloud.respond_json(DEV_LIST, device_list());
    let base = cloud.serve().await;

    let err = client(&base).list_devices().await.unwrap_err();
    assert!(matches!(err, ApiError::NotLoggedIn));
}

#[tokio::test]
async fn test_malformed_body() {
    let cloud = MockCloud::default();
    cloud.respond(LOGIN, StatusCode::OK, "{not json");
    let base = cloud.serve().await;

    let err = client(&base).login().await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
    assert!(!err.is_authentication());
}

#[tokio::test]
async fn test_http_error_status() {
    let cloud = MockCloud::default();
    cloud.respond(LOGIN, StatusCode::INTERNAL_SERVER_ERROR, "boom");
    let base = cloud.serve().await;

    match client(&base).login().await {
        Err(ApiError::HttpStatus(status, body)) => {
            assert_eq!(status, reqwest::StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_cloud() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let base = url::Url::parse(&format!("http://{}", addr)).unwrap();
    let err = client(&base).login().await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}
