use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::normalize::{self, LenientEnum};
use super::priority::Priority;
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteStatus {
    Pending,
    Completed,
    Archived,
}

impl LenientEnum for NoteStatus {
    const FIELD: &'static str = "note status";
    const ALL: &'static [Self] = &[Self::Pending, Self::Completed, Self::Archived];
    const FALLBACK: Self = Self::Pending;

    fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }
}

impl Default for NoteStatus {
    fn default() -> Self {
        Self::FALLBACK
    }
}

impl fmt::Display for NoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A free-form note attached to an animal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    pub notes_id: String,
    pub animal_id: Option<String>,
    pub content: String,
    pub category: String,
    pub keywords: Vec<String>,
    pub add_to_calendar: bool,
    pub priority: Priority,
    pub status: NoteStatus,
    /// `YYYY-MM-DD`
    pub due_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Note {
    pub const ID_FIELD: &'static str = "notes_id";

    pub fn normalize(raw: &Value) -> Result<Self, ApiError> {
        let obj = normalize::as_record(raw, "note", Self::ID_FIELD)?;
        Ok(Self {
            notes_id: normalize::require_id(obj, "note", Self::ID_FIELD)?,
            animal_id: normalize::optional_id_field(obj, "animal_id"),
            content: normalize::string_field(obj, "content"),
            category: normalize::string_field(obj, "category"),
            keywords: normalize::keywords_field(obj, "keywords"),
            add_to_calendar: normalize::bool_field(obj, "add_to_calendar"),
            priority: Priority::coerce(obj.get("priority")),
            status: NoteStatus::coerce(obj.get("status")),
            due_date: normalize::date_field(obj, "due_date"),
            created_at: normalize::optional_string_field(obj, "created_at"),
            updated_at: normalize::optional_string_field(obj, "updated_at"),
        })
    }
}

/// Request body for creating or replacing a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteDraft {
    pub content: String,
    pub category: String,
    pub keywords: Vec<String>,
    pub add_to_calendar: bool,
    pub priority: Priority,
    pub status: NoteStatus,
    pub due_date: String,
}

impl NoteDraft {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            category: String::new(),
            keywords: Vec::new(),
            add_to_calendar: false,
            priority: Priority::default(),
            status: NoteStatus::default(),
            due_date: normalize::today(),
        }
    }
}

impl From<&Note> for NoteDraft {
    fn from(note: &Note) -> Self {
        Self {
            content: note.content.clone(),
            category: note.category.clone(),
            keywords: note.keywords.clone(),
            add_to_calendar: note.add_to_calendar,
            priority: note.priority,
            status: note.status,
            due_date: note.due_date.clone(),
        }
    }
}
