//! Scripted in-memory transport for unit tests.

use reqwest::{Method, StatusCode};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::client::ApiClient;
use super::headers::MemoryTokenStore;
use super::notify::RecordingNotifier;
use super::transport::{ApiRequest, ApiResponse, HttpTransport};
use crate::config::ApiConfig;

pub const API_URL: &str = "http://farm.test/api";
pub const CSRF_URL: &str = "http://farm.test/sanctum/csrf-cookie";

pub fn config() -> ApiConfig {
    ApiConfig::new(API_URL, CSRF_URL)
}

/// Client over `mock` with no token and a recording notifier.
pub fn client(mock: &Arc<MockTransport>) -> (ApiClient<MockTransport>, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let client = ApiClient::with_transport(
        config(),
        Arc::clone(mock),
        Arc::new(MemoryTokenStore::default()),
        notifier.clone(),
    );
    (client, notifier)
}

struct Route {
    method: Method,
    url: String,
    reply: Result<(StatusCode, String), String>,
}

#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<ApiRequest>>,
    cookie: Mutex<Option<String>>,
    latency: Duration,
}

impl MockTransport {
    pub fn new() -> Self {
        let mock = Self::default();
        mock.respond(Method::GET, CSRF_URL, 204, "");
        mock
    }

    pub fn with_latency(latency: Duration) -> Self {
        let mock = Self {
            latency,
            ..Self::default()
        };
        mock.respond(Method::GET, CSRF_URL, 204, "");
        mock
    }

    /// Reply to `method url` (exact, query string ignored). Later routes win.
    pub fn respond(&self, method: Method, url: &str, status: u16, body: &str) {
        let status = StatusCode::from_u16(status).unwrap();
        self.routes.lock().unwrap().push(Route {
            method,
            url: url.to_string(),
            reply: Ok((status, body.to_string())),
        });
    }

    pub fn fail(&self, method: Method, url: &str, message: &str) {
        self.routes.lock().unwrap().push(Route {
            method,
            url: url.to_string(),
            reply: Err(message.to_string()),
        });
    }

    pub fn set_cookie(&self, cookie: &str) {
        *self.cookie.lock().unwrap() = Some(cookie.to_string());
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method, url: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && strip_query(&r.url) == url)
            .count()
    }

    pub fn csrf_count(&self) -> usize {
        self.count(Method::GET, CSRF_URL)
    }

    /// Requests other than CSRF refreshes.
    pub fn api_requests(&self) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url != CSRF_URL)
            .collect()
    }

    fn lookup(&self, request: &ApiRequest) -> Result<(StatusCode, String), String> {
        let url = strip_query(&request.url);
        self.routes
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| r.method == request.method && r.url == url)
            .map(|r| r.reply.clone())
            .unwrap_or_else(|| Ok((StatusCode::NOT_FOUND, r#"{"message":"No route"}"#.to_string())))
    }
}

fn strip_query(url: &str) -> &str {
    url.split_once('?').map(|(path, _)| path).unwrap_or(url)
}

impl HttpTransport for MockTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, String> {
        let reply = self.lookup(&request);
        self.requests.lock().unwrap().push(request);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        reply.map(|(status, body)| ApiResponse { status, body })
    }

    fn cookie_header(&self, _url: &str) -> Option<String> {
        self.cookie.lock().unwrap().clone()
    }
}
