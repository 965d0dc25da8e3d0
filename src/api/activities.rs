use serde_json::Value;

use super::client::ApiClient;
use super::resource::{ListQuery, Resource, ResourceClient};
use super::transport::HttpTransport;
use crate::core::activity::{Activity, ActivityDraft};
use crate::error::ApiError;

impl Resource for Activity {
    const NAME: &'static str = "Activity";
    const PLURAL: &'static str = "Activities";
    const COLLECTION: &'static str = "activities";
    const PARENT: Option<&'static str> = Some("animals");
    const PAGINATED: bool = false;

    type Draft = ActivityDraft;

    fn normalize(raw: &Value) -> Result<Self, ApiError> {
        Activity::normalize(raw)
    }

    fn id(&self) -> &str {
        &self.activity_id
    }
}

impl<T: HttpTransport> ApiClient<T> {
    pub fn activities(&self) -> ResourceClient<Activity, T> {
        self.resource()
    }

    pub async fn create_activity(
        &self,
        animal_id: &str,
        draft: &ActivityDraft,
    ) -> Result<Activity, ApiError> {
        self.activities().create(Some(animal_id), draft).await
    }

    pub async fn fetch_activities(&self, animal_id: &str) -> Result<Vec<Activity>, ApiError> {
        Ok(self
            .activities()
            .list(Some(animal_id), &ListQuery::new())
            .await?
            .items)
    }

    pub async fn fetch_activity(&self, activity_id: &str) -> Result<Activity, ApiError> {
        self.activities().get(activity_id).await
    }

    pub async fn update_activity(
        &self,
        activity_id: &str,
        draft: &ActivityDraft,
    ) -> Result<Activity, ApiError> {
        self.activities().update(activity_id, draft).await
    }

    pub async fn delete_activity(&self, activity_id: &str) -> Result<(), ApiError> {
        self.activities().delete(activity_id).await
    }
}
