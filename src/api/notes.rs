use serde_json::Value;

use super::client::ApiClient;
use super::envelope::Page;
use super::resource::{ListQuery, Resource, ResourceClient};
use super::transport::HttpTransport;
use crate::core::note::{Note, NoteDraft};
use crate::error::ApiError;

impl Resource for Note {
    const NAME: &'static str = "Note";
    const PLURAL: &'static str = "Notes";
    const COLLECTION: &'static str = "notes";
    const PARENT: Option<&'static str> = Some("animals");
    const PAGINATED: bool = true;

    type Draft = NoteDraft;

    fn normalize(raw: &Value) -> Result<Self, ApiError> {
        Note::normalize(raw)
    }

    fn id(&self) -> &str {
        &self.notes_id
    }
}

impl<T: HttpTransport> ApiClient<T> {
    pub fn notes(&self) -> ResourceClient<Note, T> {
        self.resource()
    }

    pub async fn create_note(&self, animal_id: &str, draft: &NoteDraft) -> Result<Note, ApiError> {
        self.notes().create(Some(animal_id), draft).await
    }

    /// One page of an animal's notes. `page`/`per_page` default to 1 and the configured size.
    pub async fn fetch_notes(&self, animal_id: &str, query: &ListQuery) -> Result<Page<Note>, ApiError> {
        self.notes().list(Some(animal_id), query).await
    }

    pub async fn fetch_note(&self, notes_id: &str) -> Result<Note, ApiError> {
        self.notes().get(notes_id).await
    }

    pub async fn update_note(&self, notes_id: &str, draft: &NoteDraft) -> Result<Note, ApiError> {
        self.notes().update(notes_id, draft).await
    }

    pub async fn delete_note(&self, notes_id: &str) -> Result<(), ApiError> {
        self.notes().delete(notes_id).await
    }
}
