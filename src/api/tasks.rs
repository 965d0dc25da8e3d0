use serde_json::Value;

use super::client::ApiClient;
use super::resource::{ListQuery, Resource, ResourceClient};
use super::transport::HttpTransport;
use crate::core::task::{Task, TaskDraft};
use crate::error::ApiError;

impl Resource for Task {
    const NAME: &'static str = "Task";
    const PLURAL: &'static str = "Tasks";
    const COLLECTION: &'static str = "tasks";
    const PARENT: Option<&'static str> = None;
    const PAGINATED: bool = false;

    type Draft = TaskDraft;

    fn normalize(raw: &Value) -> Result<Self, ApiError> {
        Task::normalize(raw)
    }

    fn id(&self) -> &str {
        &self.task_id
    }
}

impl<T: HttpTransport> ApiClient<T> {
    pub fn tasks(&self) -> ResourceClient<Task, T> {
        self.resource()
    }

    pub async fn create_task(&self, draft: &TaskDraft) -> Result<Task, ApiError> {
        self.tasks().create(None, draft).await
    }

    /// All tasks, or only those of one animal.
    pub async fn fetch_tasks(&self, animal_id: Option<&str>) -> Result<Vec<Task>, ApiError> {
        let query = match animal_id {
            Some(id) => ListQuery::new().filter("animal_id", id),
            None => ListQuery::new(),
        };
        Ok(self.tasks().list(None, &query).await?.items)
    }

    pub async fn fetch_task(&self, task_id: &str) -> Result<Task, ApiError> {
        self.tasks().get(task_id).await
    }

    pub async fn update_task(&self, task_id: &str, draft: &TaskDraft) -> Result<Task, ApiError> {
        self.tasks().update(task_id, draft).await
    }

    pub async fn delete_task(&self, task_id: &str) -> Result<(), ApiError> {
        self.tasks().delete(task_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{self, API_URL, MockTransport};
    use crate::api::notify::Level;
    use crate::core::task::{Repeats, TaskStatus};
    use reqwest::Method;
    use std::sync::Arc;

    #[tokio::test]
    async fn fetch_tasks_filters_by_animal() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(
            Method::GET,
            &format!("{}/tasks", API_URL),
            200,
            r#"[{"task_id":1,"title":"Feed","repeats":"hourly","duration":-5},{"task_id":2,"title":"Water"}]"#,
        );
        let (client, _) = mock::client(&mock);

        let tasks = client.fetch_tasks(Some("12")).await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].repeats, Repeats::Daily);
        assert_eq!(tasks[0].duration, 0);

        let url = &mock.api_requests()[0].url;
        assert_eq!(url, &format!("{}/tasks?animal_id=12", API_URL));
    }

    #[tokio::test]
    async fn create_task_posts_to_collection() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(
            Method::POST,
            &format!("{}/tasks", API_URL),
            201,
            r#"{"message":"Task scheduled","data":{"task_id":"t9","title":"Shear sheep","status":"completed","repeat_frequency":0}}"#,
        );
        let (client, notifier) = mock::client(&mock);

        let mut draft = TaskDraft::new("Shear sheep");
        draft.animal_id = Some("3".to_string());
        let task = client.create_task(&draft).await.unwrap();
        assert_eq!(task.task_id, "t9");
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.repeat_frequency, 1);
        assert_eq!(notifier.entries(), vec![(Level::Success, "Task scheduled".to_string())]);

        let body = mock.api_requests()[0].body.clone().unwrap();
        assert_eq!(body["animal_id"], "3");
        assert_eq!(body["title"], "Shear sheep");
        assert!(body.get("end_repeat_date").is_none());
    }

    #[tokio::test]
    async fn delete_missing_task_reports_server_message() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(
            Method::DELETE,
            &format!("{}/tasks/4", API_URL),
            404,
            r#"{"message":"Task not found."}"#,
        );
        let (client, notifier) = mock::client(&mock);

        let err = client.delete_task("4").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(notifier.entries(), vec![(Level::Error, "Task not found.".to_string())]);
    }
}
