//! In-process client for router tests: an in-memory database, a recording
//! email transport and a cookie jar holding one session cookie.
use axum::{
    body::Body,
    http::{
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
        Request, StatusCode,
    },
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use crate::config::AppConfig;
use crate::notify::testing::{Behaviour, RecordingTransport};
use crate::state::AppState;

pub(crate) struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub request_id: Option<String>,
    pub body: Value,
}

impl TestResponse {
    pub fn flash_messages(&self) -> Vec<String> {
        self.body["flashes"]
            .as_array()
            .map(|flashes| {
                flashes
                    .iter()
                    .filter_map(|f| f["message"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

pub(crate) struct TestApp {
    pub state: AppState,
    pub transport: Arc<RecordingTransport>,
    router: Router,
    cookie: Option<String>,
    last_set_cookie: Option<String>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_behaviour(Behaviour::Deliver).await
    }

    pub async fn with_behaviour(behaviour: Behaviour) -> Self {
        let pool = crate::db::test_pool().await;
        let transport = RecordingTransport::new(behaviour);
        let state = AppState::new(AppConfig::for_tests(), pool, transport.clone());
        let router = crate::create_app(state.clone());

        Self {
            state,
            transport,
            router,
            cookie: None,
            last_set_cookie: None,
        }
    }

    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    pub fn set_cookie(&mut self, cookie: &str) {
        self.cookie = Some(cookie.to_string());
    }

    /// Behave like a client that never sends cookies back.
    pub fn forget_cookie(&mut self) {
        self.cookie = None;
    }

    /// Full `Set-Cookie` value of the most recent response that had one.
    pub fn last_set_cookie(&self) -> Option<&str> {
        self.last_set_cookie.as_deref()
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let request = Request::builder().method("GET").uri(uri);
        self.send(request, Body::empty()).await
    }

    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = serde_urlencoded::to_string(fields).unwrap();
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        self.send(request, Body::from(body)).await
    }

    /// Walk the credential and emailed code steps with the test admin account.
    pub async fn login(&mut self) {
        let res = self
            .post_form(
                "/admin/login",
                &[
                    ("username", "admin"),
                    ("password", "s3cret-pass"),
                    ("email", "admin@example.com"),
                ],
            )
            .await;
        assert_eq!(res.status, StatusCode::OK, "credential step failed");

        let code = self.transport.last_otp().unwrap();
        let res = self
            .post_form("/admin/login", &[("username", "admin"), ("otp", &code)])
            .await;
        assert_eq!(res.status, StatusCode::SEE_OTHER, "code step failed");
    }

    async fn send(&mut self, mut request: axum::http::request::Builder, body: Body) -> TestResponse {
        if let Some(cookie) = &self.cookie {
            request = request.header(COOKIE, cookie.as_str());
        }
        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        if let Some(set_cookie) = response.headers().get(SET_COOKIE) {
            let set_cookie = set_cookie.to_str().unwrap().to_string();
            let pair = set_cookie.split(';').next().unwrap().trim();
            // An emptied value is the server removing the cookie.
            self.cookie = match pair.split_once('=') {
                Some((_, "")) => None,
                _ => Some(pair.to_string()),
            };
            self.last_set_cookie = Some(set_cookie);
        }

        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let request_id = response
            .headers()
            .get("x-request-id")
            .map(|v| v.to_str().unwrap().to_string());

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            location,
            request_id,
            body,
        }
    }
}
