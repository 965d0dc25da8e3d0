use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;

use super::client::ApiClient;
use super::envelope::{self, Page};
use super::notify::Level;
use super::transport::{HttpTransport, ReqwestTransport};
use crate::error::ApiError;

/// A record type served under one REST collection.
pub trait Resource: Sized + Send + Sync + 'static {
    /// Display name used in notifications ("Note created successfully").
    const NAME: &'static str;
    /// Plural display name ("Notes loaded successfully").
    const PLURAL: &'static str;
    /// Path segment of the collection, e.g. `notes`.
    const COLLECTION: &'static str;
    /// Parent collection for scoped listings and creation, e.g. `animals`.
    const PARENT: Option<&'static str>;
    /// Whether listings are paginated server-side.
    const PAGINATED: bool;

    type Draft: Serialize + Send + Sync;

    fn normalize(raw: &Value) -> Result<Self, ApiError>;

    fn id(&self) -> &str;
}

/// Query parameters for a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub fields: Vec<String>,
    pub filters: Vec<(String, String)>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((key.into(), value.into()));
        self
    }

    pub fn to_query_string(&self) -> String {
        let mut params: Vec<String> = Vec::new();
        if let Some(page) = self.page {
            params.push(format!("page={}", page));
        }
        if let Some(per_page) = self.per_page {
            params.push(format!("per_page={}", per_page));
        }
        if !self.fields.is_empty() {
            params.push(format!("fields={}", urlencoding::encode(&self.fields.join(","))));
        }
        for (key, value) in &self.filters {
            params.push(format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)));
        }
        params.join("&")
    }
}

/// Reject ids a caller passes when it has no real record.
fn check_id<'a>(resource: &'static str, id: &'a str) -> Result<&'a str, ApiError> {
    let trimmed = id.trim();
    if trimmed.is_empty() || trimmed == "undefined" || trimmed == "null" {
        return Err(ApiError::NotFound {
            resource,
            id: id.to_string(),
        });
    }
    Ok(trimmed)
}

/// create / read / update / delete for one [`Resource`].
///
/// Every call notifies exactly once, on success or failure; callers should
/// not report the same outcome again.
pub struct ResourceClient<R, T = ReqwestTransport> {
    client: ApiClient<T>,
    _resource: PhantomData<fn() -> R>,
}

impl<R, T> Clone for ResourceClient<R, T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource, T: HttpTransport> ResourceClient<R, T> {
    pub(crate) fn new(client: ApiClient<T>) -> Self {
        Self {
            client,
            _resource: PhantomData,
        }
    }

    fn collection_url(&self, scope: Option<&str>) -> Result<String, ApiError> {
        match (R::PARENT, scope) {
            (Some(parent), Some(scope)) => {
                let scope = check_id("Parent record", scope)?;
                Ok(self.client.url(&format!(
                    "{}/{}/{}",
                    parent,
                    urlencoding::encode(scope),
                    R::COLLECTION
                )))
            }
            _ => Ok(self.client.url(R::COLLECTION)),
        }
    }

    fn item_url(&self, id: &str) -> Result<String, ApiError> {
        let id = check_id(R::NAME, id)?;
        Ok(self
            .client
            .url(&format!("{}/{}", R::COLLECTION, urlencoding::encode(id))))
    }

    fn encode(draft: &R::Draft) -> Result<Value, ApiError> {
        serde_json::to_value(draft)
            .map_err(|e| ApiError::transport(format!("Failed to encode {}: {}", R::NAME, e)))
    }

    fn finish<V>(
        &self,
        outcome: Result<(V, Option<String>), ApiError>,
        subject: &str,
        verb: &str,
    ) -> Result<V, ApiError> {
        match outcome {
            Ok((value, message)) => {
                let message =
                    message.unwrap_or_else(|| format!("{} {} successfully", subject, verb));
                self.client.notify(Level::Success, &message);
                Ok(value)
            }
            Err(e) => {
                log::error!("{} request failed: {}", R::NAME, e);
                self.client.notify(Level::Error, &e.to_string());
                Err(e)
            }
        }
    }

    pub async fn list(&self, scope: Option<&str>, query: &ListQuery) -> Result<Page<R>, ApiError> {
        let outcome = self.try_list(scope, query).await;
        self.finish(outcome, R::PLURAL, "loaded")
    }

    pub async fn get(&self, id: &str) -> Result<R, ApiError> {
        let outcome = self.try_get(id).await;
        self.finish(outcome, R::NAME, "loaded")
    }

    pub async fn create(&self, scope: Option<&str>, draft: &R::Draft) -> Result<R, ApiError> {
        let outcome = self.try_create(scope, draft).await;
        self.finish(outcome, R::NAME, "created")
    }

    pub async fn update(&self, id: &str, draft: &R::Draft) -> Result<R, ApiError> {
        let outcome = self.try_update(id, draft).await;
        self.finish(outcome, R::NAME, "updated")
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let outcome = self.try_delete(id).await;
        self.finish(outcome, R::NAME, "deleted")
    }

    async fn try_list(
        &self,
        scope: Option<&str>,
        query: &ListQuery,
    ) -> Result<(Page<R>, Option<String>), ApiError> {
        let mut query = query.clone();
        if R::PAGINATED {
            query.page.get_or_insert(1);
            query.per_page.get_or_insert(self.client.config().per_page);
        }

        let mut url = self.collection_url(scope)?;
        let qs = query.to_query_string();
        if !qs.is_empty() {
            url = format!("{}?{}", url, qs);
        }

        let body = self.client.send(Method::GET, url, None).await?;
        let page = envelope::decode_page(&body, R::NAME, R::normalize);
        log::info!(
            "Fetched {} {} (page {}/{}, total {})",
            page.items.len(),
            R::COLLECTION,
            page.current_page,
            page.last_page,
            page.total
        );
        Ok((page, envelope::server_message(&body)))
    }

    async fn try_get(&self, id: &str) -> Result<(R, Option<String>), ApiError> {
        let url = self.item_url(id)?;
        let body = self.client.send(Method::GET, url, None).await?;
        let item = R::normalize(envelope::payload(&body))?;
        Ok((item, envelope::server_message(&body)))
    }

    async fn try_create(
        &self,
        scope: Option<&str>,
        draft: &R::Draft,
    ) -> Result<(R, Option<String>), ApiError> {
        let url = self.collection_url(scope)?;
        let payload = Self::encode(draft)?;
        let body = self.client.send(Method::POST, url, Some(payload)).await?;
        let item = R::normalize(envelope::payload(&body))?;
        log::info!("Created {} {}", R::NAME, item.id());
        Ok((item, envelope::server_message(&body)))
    }

    async fn try_update(&self, id: &str, draft: &R::Draft) -> Result<(R, Option<String>), ApiError> {
        let url = self.item_url(id)?;
        let payload = Self::encode(draft)?;
        let body = self.client.send(Method::PUT, url, Some(payload)).await?;
        let item = R::normalize(envelope::payload(&body))?;
        Ok((item, envelope::server_message(&body)))
    }

    async fn try_delete(&self, id: &str) -> Result<((), Option<String>), ApiError> {
        let url = self.item_url(id)?;
        let body = self.client.send(Method::DELETE, url, None).await?;
        log::info!("Deleted {} {}", R::NAME, id);
        Ok(((), envelope::server_message(&body)))
    }
}
