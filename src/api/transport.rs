use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, StatusCode, Url};
use std::future::Future;
use std::sync::Arc;

/// A fully built request, ready for the wire.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
}

/// Status and raw body of a completed exchange.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

/// The HTTP seam. Errors are network-level only; any status is a response.
pub trait HttpTransport: Send + Sync + 'static {
    fn execute(
        &self,
        request: ApiRequest,
    ) -> impl Future<Output = Result<ApiResponse, String>> + Send;

    /// `Cookie` header value the transport would send to `url`.
    fn cookie_header(&self, url: &str) -> Option<String>;
}

/// reqwest client with a shared cookie jar, so the CSRF cookie set by one
/// endpoint is visible when building headers for the next.
#[derive(Clone)]
pub struct ReqwestTransport {
    http: Client,
    jar: Arc<Jar>,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, String> {
        let jar = Arc::new(Jar::default());
        let http = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {}", e))?;
        Ok(Self { http, jar })
    }
}

impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, String> {
        let ApiRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut req = self.http.request(method.clone(), &url).headers(headers);
        if let Some(body) = &body {
            req = req.json(body);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| format!("{} {} failed: {}", method, url, e))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| format!("Failed to read response from {}: {}", url, e))?;

        Ok(ApiResponse { status, body })
    }

    fn cookie_header(&self, url: &str) -> Option<String> {
        let url = Url::parse(url).ok()?;
        let value = self.jar.cookies(&url)?;
        value.to_str().ok().map(str::to_string)
    }
}
