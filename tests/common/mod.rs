//! Helpers shared by the HTTP integration tests.

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use cookbook::config::Config;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

pub const BOUNDARY: &str = "cookbook-test-boundary";

/// Defaults pointed at a throwaway database and upload dir, with cheap hashing.
pub fn test_config(prefix: &str) -> Config {
    let id = uuid::Uuid::new_v4();
    let db_path = std::env::temp_dir().join(format!("{prefix}-{id}.db"));
    let uploads = std::env::temp_dir().join(format!("{prefix}-uploads-{id}"));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.general.uploads_path = uploads.display().to_string();
    config.server.persistent_sessions = false;
    config.server.secure_cookies = false;
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config
}

pub async fn spawn_app(prefix: &str) -> Router {
    let state = cookbook::api::create_app_state_from_config(test_config(prefix), None)
        .await
        .expect("Failed to create app state");
    cookbook::api::router(state).await
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub cookie: Option<String>,
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    TestResponse {
        status,
        body,
        cookie,
    }
}

pub fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: &str, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// multipart/form-data body with text fields and an optional image part.
pub fn multipart_request(
    uri: &str,
    cookie: Option<&str>,
    fields: &[(&str, &str)],
    image: Option<(&str, &[u8])>,
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\nContent-Type: {}\r\n\r\n",
                mime::IMAGE_JPEG
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).unwrap()
}

/// Registers an account and logs in, returning the session cookie.
pub async fn register_and_login(app: &Router, name: &str, email: &str) -> String {
    let response = send(
        app,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            &serde_json::json!({
                "name": name,
                "email": email,
                "confirm_email": email,
                "password": "pw1234",
            }),
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK, "register: {:?}", response.body);

    login(app, email, "pw1234").await
}

pub async fn login(app: &Router, email: &str, password: &str) -> String {
    let response = send(
        app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            &serde_json::json!({ "email": email, "password": password }),
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK, "login: {:?}", response.body);
    response.cookie.expect("login sets a session cookie")
}
