#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use configs::{AppConfig, StorageMode};
use serde_json::{json, Value};
use tower::ServiceExt;

/// Router over a fresh local store in a temp directory.
pub async fn build_app() -> anyhow::Result<Router> {
    let dir = std::env::temp_dir().join(format!("umkm-server-{}", uuid::Uuid::new_v4()));
    let mut cfg = AppConfig::default();
    cfg.storage.mode = StorageMode::Local;
    cfg.storage.data_dir = dir.to_string_lossy().into_owned();
    cfg.auth.jwt_secret = "test-secret".into();
    let state = server::startup::build_state(&cfg).await?;
    Ok(server::startup::build_app(state))
}

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> anyhow::Result<Request<Body>> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
        Some(v) => builder.header(header::CONTENT_TYPE, "application/json").body(Body::from(serde_json::to_vec(&v)?))?,
        None => builder.body(Body::empty())?,
    };
    Ok(req)
}

pub async fn send(app: &Router, req: Request<Body>) -> anyhow::Result<Response<Body>> {
    Ok(app.clone().oneshot(req).await?)
}

pub async fn body_json(resp: Response<Body>) -> anyhow::Result<Value> {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await?;
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

pub async fn register(app: &Router, username: &str, password: &str, rw: Option<&str>) -> anyhow::Result<StatusCode> {
    let body = json!({"username": username, "display_name": username, "password": password, "rw": rw});
    Ok(send(app, request("POST", "/auth/register", None, Some(body))?).await?.status())
}

/// Log in and return the bearer token.
pub async fn login(app: &Router, username: &str, password: &str, rw: Option<&str>) -> anyhow::Result<String> {
    let body = json!({"username": username, "password": password, "rw": rw});
    let resp = send(app, request("POST", "/auth/login", None, Some(body))?).await?;
    anyhow::ensure!(resp.status() == StatusCode::OK, "login failed with {}", resp.status());
    let v = body_json(resp).await?;
    v["token"].as_str().map(str::to_string).ok_or_else(|| anyhow::anyhow!("no token in {v}"))
}
