use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use httpmock::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

use google_oauth_relay::auth::{ClientIdentifier, TokenStore, SCOPES};
use google_oauth_relay::config::settings::{GoogleSettings, ServerSettings, Settings, StorageSettings};
use google_oauth_relay::{build_router, AppState};

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

fn app(token_url: &str, store_dir: &Path) -> Router {
    let settings = Settings {
        server: ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 3000,
        },
        google: GoogleSettings {
            client_id: "google-client-id".to_string(),
            client_secret: "google-client-secret".to_string(),
            redirect_uri: "http://localhost:3000/".to_string(),
            auth_url: AUTH_URL.to_string(),
            token_url: token_url.to_string(),
        },
        storage: StorageSettings {
            directory: store_dir.display().to_string(),
        },
    };

    build_router(Arc::new(AppState::from_settings(settings).unwrap()))
}

fn id_token_with(claims: Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.sig", header, payload)
}

async fn send(app: Router, method: Method, uri: &str) -> (StatusCode, HashMap<String, String>, String) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response
        .headers()
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
        .collect();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();

    (status, headers, String::from_utf8(body.to_vec()).unwrap())
}

async fn mock_code_exchange(server: &MockServer, code: &str, email: &str, refresh_token: &str) {
    let id_token = id_token_with(json!({ "email": email, "sub": "42" }));
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/token")
                .x_www_form_urlencoded_tuple("grant_type", "authorization_code")
                .x_www_form_urlencoded_tuple("code", code);
            then.status(200).json_body(json!({
                "access_token": "ya29.initial",
                "id_token": id_token,
                "refresh_token": refresh_token,
                "expires_in": 3599,
                "token_type": "Bearer"
            }));
        })
        .await;
}

#[tokio::test]
async fn test_authorize_redirects_to_consent_screen() {
    let dir = tempfile::tempdir().unwrap();
    let (status, headers, _) = send(app("http://127.0.0.1:1/token", dir.path()), Method::GET, "/authorize?clientId=client1").await;

    assert_eq!(status, StatusCode::FOUND);

    let location = url::Url::parse(&headers[header::LOCATION.as_str()]).unwrap();
    assert!(location.as_str().starts_with(AUTH_URL));

    let query: HashMap<String, String> = location.query_pairs().into_owned().collect();
    assert_eq!(query["state"], "client1");
    assert_eq!(query["access_type"], "offline");
    let scopes: Vec<&str> = query["scope"].split(' ').collect();
    assert_eq!(scopes, SCOPES.to_vec());
}

#[tokio::test]
async fn test_authorize_without_client_id_is_server_error() {
    let dir = tempfile::tempdir().unwrap();

    for uri in ["/authorize", "/authorize?clientId="] {
        let (status, _, body) = send(app("http://127.0.0.1:1/token", dir.path()), Method::GET, uri).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Internal Server Error");
    }
}

#[tokio::test]
async fn test_authorize_rejects_unsafe_client_id() {
    let dir = tempfile::tempdir().unwrap();
    let (status, _, body) = send(
        app("http://127.0.0.1:1/token", dir.path()),
        Method::GET,
        "/authorize?clientId=..%2F..%2Fetc%2Fpasswd",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Invalid clientId");
}

#[tokio::test]
async fn test_callback_missing_params() {
    let dir = tempfile::tempdir().unwrap();

    for uri in ["/", "/?code=abc", "/?state=client1", "/?code=&state=client1"] {
        let (status, _, body) = send(app("http://127.0.0.1:1/token", dir.path()), Method::GET, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "uri: {}", uri);
        assert_eq!(body, "Auth Code or clientId Missing");
    }
}

#[tokio::test]
async fn test_callback_rejects_unsafe_state() {
    let dir = tempfile::tempdir().unwrap();
    let (status, _, body) = send(app("http://127.0.0.1:1/token", dir.path()), Method::GET, "/?code=C1&state=..%2Fsecret").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Invalid clientId");
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn test_callback_persists_token_and_renders_page() {
    let server = MockServer::start_async().await;
    let dir = tempfile::tempdir().unwrap();
    let store_dir = dir.path().join("RefreshTokens");
    mock_code_exchange(&server, "C1", "a@b.com", "R1").await;

    let (status, headers, body) = send(app(&server.url("/token"), &store_dir), Method::GET, "/?code=C1&state=client1").await;

    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE.as_str()].starts_with("text/html"));
    assert!(body.contains("a@b.com"));
    assert!(body.contains("R1"));

    let raw = std::fs::read_to_string(store_dir.join("client1.json")).unwrap();
    assert_eq!(raw, r#"{"userToken":{"email":"a@b.com","refreshToken":"R1"}}"#);
}

#[tokio::test]
async fn test_second_callback_overwrites_token() {
    let server = MockServer::start_async().await;
    let dir = tempfile::tempdir().unwrap();
    mock_code_exchange(&server, "C1", "a@b.com", "R1").await;
    mock_code_exchange(&server, "C2", "c@d.com", "R2").await;

    let (status, _, _) = send(app(&server.url("/token"), dir.path()), Method::GET, "/?code=C1&state=client1").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = send(app(&server.url("/token"), dir.path()), Method::GET, "/?code=C2&state=client1").await;
    assert_eq!(status, StatusCode::OK);

    let stored = TokenStore::new(dir.path())
        .load(&ClientIdentifier::parse("client1").unwrap())
        .unwrap();
    assert_eq!(stored.user_token.email, "c@d.com");
    assert_eq!(stored.user_token.refresh_token, "R2");
}

#[tokio::test]
async fn test_callback_passes_through_provider_status() {
    let server = MockServer::start_async().await;
    let dir = tempfile::tempdir().unwrap();
    server
        .mock_async(|when, then| {
            when.method(POST).path("/token");
            then.status(400).json_body(json!({ "error": "invalid_grant" }));
        })
        .await;

    let (status, _, body) = send(app(&server.url("/token"), dir.path()), Method::GET, "/?code=bad&state=client1").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Bad Request");
    assert!(!dir.path().join("client1.json").exists());
}

#[tokio::test]
async fn test_callback_without_refresh_token_is_unhandled() {
    let server = MockServer::start_async().await;
    let dir = tempfile::tempdir().unwrap();
    let id_token = id_token_with(json!({ "email": "a@b.com" }));
    server
        .mock_async(|when, then| {
            when.method(POST).path("/token");
            then.status(200).json_body(json!({ "access_token": "A", "id_token": id_token }));
        })
        .await;

    let (status, _, body) = send(app(&server.url("/token"), dir.path()), Method::GET, "/?code=C1&state=client1").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Exhaustive Unhandled Error");
}

#[tokio::test]
async fn test_callback_id_token_without_email() {
    let server = MockServer::start_async().await;
    let dir = tempfile::tempdir().unwrap();
    let id_token = id_token_with(json!({ "sub": "42" }));
    server
        .mock_async(|when, then| {
            when.method(POST).path("/token");
            then.status(200).json_body(json!({ "id_token": id_token, "refresh_token": "R1" }));
        })
        .await;

    let (status, _, body) = send(app(&server.url("/token"), dir.path()), Method::GET, "/?code=C1&state=client1").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "no token or no email");
}

#[tokio::test]
async fn test_callback_without_provider_response() {
    let dir = tempfile::tempdir().unwrap();
    let (status, _, body) = send(app("http://127.0.0.1:1/token", dir.path()), Method::GET, "/?code=C1&state=client1").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "no response from google api.");
}

#[tokio::test]
async fn test_callback_malformed_provider_body() {
    let server = MockServer::start_async().await;
    let dir = tempfile::tempdir().unwrap();
    server
        .mock_async(|when, then| {
            when.method(POST).path("/token");
            then.status(200).body("<html>not json</html>");
        })
        .await;

    let (status, _, body) = send(app(&server.url("/token"), dir.path()), Method::GET, "/?code=C1&state=client1").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "no response from google api.");
}

#[tokio::test]
async fn test_callback_reports_storage_failure() {
    let server = MockServer::start_async().await;
    let dir = tempfile::tempdir().unwrap();
    let blocked = dir.path().join("blocked");
    std::fs::write(&blocked, "not a directory").unwrap();
    mock_code_exchange(&server, "C1", "a@b.com", "R1").await;

    let (status, _, body) = send(app(&server.url("/token"), &blocked), Method::GET, "/?code=C1&state=client1").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Failed to persist token");
}

#[tokio::test]
async fn test_refresh_after_callback() {
    let server = MockServer::start_async().await;
    let dir = tempfile::tempdir().unwrap();
    mock_code_exchange(&server, "C1", "a@b.com", "R1").await;
    let refresh_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/token")
                .x_www_form_urlencoded_tuple("grant_type", "refresh_token")
                .x_www_form_urlencoded_tuple("refresh_token", "R1")
                .x_www_form_urlencoded_tuple("client_id", "google-client-id");
            then.status(200).json_body(json!({ "access_token": "A1", "expires_in": 3599 }));
        })
        .await;

    let (status, _, _) = send(app(&server.url("/token"), dir.path()), Method::GET, "/?code=C1&state=client1").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, body) = send(app(&server.url("/token"), dir.path()), Method::POST, "/refreshToken?clientId=client1").await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json, json!({ "token": "A1", "email": "a@b.com" }));
    refresh_mock.assert_async().await;
}

#[tokio::test]
async fn test_refresh_unknown_client() {
    let dir = tempfile::tempdir().unwrap();
    let (status, _, body) = send(app("http://127.0.0.1:1/token", dir.path()), Method::POST, "/refreshToken?clientId=unknown").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "No token found");
}

#[tokio::test]
async fn test_refresh_requires_client_id() {
    let dir = tempfile::tempdir().unwrap();
    let (status, _, body) = send(app("http://127.0.0.1:1/token", dir.path()), Method::POST, "/refreshToken").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json, json!({ "error": "Client ID is required" }));
}

#[tokio::test]
async fn test_refresh_rejects_unsafe_client_id() {
    let dir = tempfile::tempdir().unwrap();
    let (status, _, body) = send(app("http://127.0.0.1:1/token", dir.path()), Method::POST, "/refreshToken?clientId=..%2Fetc").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json, json!({ "error": "Invalid clientId" }));
}

#[tokio::test]
async fn test_refresh_with_empty_stored_token() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("client1.json"),
        r#"{"userToken":{"email":"a@b.com","refreshToken":""}}"#,
    )
    .unwrap();

    let (status, _, body) = send(app("http://127.0.0.1:1/token", dir.path()), Method::POST, "/refreshToken?clientId=client1").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json, json!({ "error": "no token available" }));
}

#[tokio::test]
async fn test_refresh_passes_through_provider_status() {
    let server = MockServer::start_async().await;
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("client1.json"),
        r#"{"userToken":{"email":"a@b.com","refreshToken":"revoked"}}"#,
    )
    .unwrap();
    server
        .mock_async(|when, then| {
            when.method(POST).path("/token");
            then.status(401).json_body(json!({ "error": "invalid_client" }));
        })
        .await;

    let (status, _, body) = send(app(&server.url("/token"), dir.path()), Method::POST, "/refreshToken?clientId=client1").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Unauthorized");
}

#[tokio::test]
async fn test_refresh_without_access_token_mirrors_ok() {
    let server = MockServer::start_async().await;
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("client1.json"),
        r#"{"userToken":{"email":"a@b.com","refreshToken":"R1"}}"#,
    )
    .unwrap();
    let refresh = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/token")
                .x_www_form_urlencoded_tuple("grant_type", "refresh_token")
                .x_www_form_urlencoded_tuple("refresh_token", "R1");
            then.status(200).json_body(json!({ "expires_in": 3599 }));
        })
        .await;

    let (status, _, body) = send(app(&server.url("/token"), dir.path()), Method::POST, "/refreshToken?clientId=client1").await;

    refresh.assert_async().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn test_refresh_without_provider_response() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("client1.json"),
        r#"{"userToken":{"email":"a@b.com","refreshToken":"R1"}}"#,
    )
    .unwrap();

    let (status, _, body) = send(app("http://127.0.0.1:1/token", dir.path()), Method::POST, "/refreshToken?clientId=client1").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "no response form google api.");
}

#[tokio::test]
async fn test_health_check() {
    let dir = tempfile::tempdir().unwrap();
    let (status, _, body) = send(app("http://127.0.0.1:1/token", dir.path()), Method::GET, "/health").await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "healthy");
}
