use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;

use super::csrf::CsrfGate;
use super::envelope;
use super::headers::{TokenStore, auth_headers, json_headers};
use super::notify::{Level, Notifier};
use super::resource::{Resource, ResourceClient};
use super::transport::{ApiRequest, HttpTransport, ReqwestTransport};
use crate::config::ApiConfig;
use crate::error::ApiError;

/// Laravel's "page expired": the CSRF token went stale.
const PAGE_EXPIRED: u16 = 419;

struct Inner<T> {
    config: ApiConfig,
    transport: Arc<T>,
    csrf: CsrfGate<T>,
    tokens: Arc<dyn TokenStore>,
    notifier: Arc<dyn Notifier>,
}

/// Entry point to the REST API. Cheap to clone; clones share the CSRF gate.
pub struct ApiClient<T = ReqwestTransport> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for ApiClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl ApiClient<ReqwestTransport> {
    pub fn new(
        config: ApiConfig,
        tokens: Arc<dyn TokenStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new().map_err(ApiError::transport)?;
        Ok(Self::with_transport(config, Arc::new(transport), tokens, notifier))
    }
}

impl<T: HttpTransport> ApiClient<T> {
    pub fn with_transport(
        config: ApiConfig,
        transport: Arc<T>,
        tokens: Arc<dyn TokenStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let csrf = CsrfGate::new(
            Arc::clone(&transport),
            config.csrf_url.clone(),
            config.csrf_refresh,
        );
        Self {
            inner: Arc::new(Inner {
                config,
                transport,
                csrf,
                tokens,
                notifier,
            }),
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    pub fn csrf(&self) -> &CsrfGate<T> {
        &self.inner.csrf
    }

    /// CRUD view over one resource type.
    pub fn resource<R: Resource>(&self) -> ResourceClient<R, T> {
        ResourceClient::new(self.clone())
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.inner.config.api_url, path.trim_start_matches('/'))
    }

    pub(crate) fn notify(&self, level: Level, message: &str) {
        self.inner.notifier.notify(level, message);
    }

    fn build_request(&self, method: Method, url: String, body: Option<Value>) -> ApiRequest {
        let token = self.inner.tokens.token();
        let cookies = self.inner.transport.cookie_header(&url);
        let mut headers = json_headers();
        headers.extend(auth_headers(token.as_deref(), cookies.as_deref()));
        ApiRequest {
            method,
            url,
            headers,
            body,
        }
    }

    /// Run one request through the CSRF gate and classify the response.
    pub(crate) async fn send(
        &self,
        method: Method,
        url: String,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        self.inner.csrf.ensure().await;

        let request = self.build_request(method.clone(), url.clone(), body);
        log::info!("{} {}", method, url);
        if let Some(body) = &request.body {
            log::debug!("Request body: {}", body);
        }

        let response = self
            .inner
            .transport
            .execute(request)
            .await
            .map_err(ApiError::transport)?;

        log::debug!("{} {} returned {}", method, url, response.status);
        if response.status.as_u16() == PAGE_EXPIRED {
            self.inner.csrf.invalidate();
        }

        envelope::classify(response.status, &response.body)
    }
}
