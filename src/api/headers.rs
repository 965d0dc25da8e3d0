use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use std::sync::RwLock;

pub const XSRF_COOKIE: &str = "XSRF-TOKEN";
pub const XSRF_HEADER: HeaderName = HeaderName::from_static("x-xsrf-token");

/// Source of the bearer token attached to every request.
pub trait TokenStore: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// Token held in memory, typically seeded from the keyring at startup.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: RwLock::new(token),
        }
    }

    pub fn set(&self, token: Option<String>) {
        match self.token.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn token(&self) -> Option<String> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Bearer and XSRF headers. Absent or unusable values are left out.
pub fn auth_headers(token: Option<&str>, cookie_header: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();

    if let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) {
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", token)) {
            headers.insert(AUTHORIZATION, value);
        }
    }

    if let Some(xsrf) = cookie_header.and_then(|c| cookie_value(c, XSRF_COOKIE)) {
        if let Ok(value) = HeaderValue::from_str(&xsrf) {
            headers.insert(XSRF_HEADER, value);
        }
    }

    headers
}

pub fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

/// Look up `name` in a `Cookie` header and percent-decode its value.
pub fn cookie_value(cookie_header: &str, name: &str) -> Option<String> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, raw)| {
            let raw = raw.trim().trim_matches('"');
            match urlencoding::decode(raw) {
                Ok(decoded) => decoded.into_owned(),
                Err(_) => raw.to_string(),
            }
        })
        .filter(|v| !v.is_empty())
}
