use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::normalize::{self, LenientEnum};
use super::priority::Priority;
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl LenientEnum for TaskStatus {
    const FIELD: &'static str = "task status";
    const ALL: &'static [Self] = &[Self::Pending, Self::InProgress, Self::Completed];
    const FALLBACK: Self = Self::Pending;

    fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::FALLBACK
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Repeats {
    Daily,
    Weekly,
    Monthly,
}

impl LenientEnum for Repeats {
    const FIELD: &'static str = "repeats";
    const ALL: &'static [Self] = &[Self::Daily, Self::Weekly, Self::Monthly];
    const FALLBACK: Self = Self::Daily;

    fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl Default for Repeats {
    fn default() -> Self {
        Self::FALLBACK
    }
}

impl fmt::Display for Repeats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const DEFAULT_TASK_TYPE: &str = "general";

/// A scheduled piece of work, optionally tied to one animal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub task_id: String,
    pub animal_id: Option<String>,
    pub title: String,
    pub task_type: String,
    pub description: String,
    pub location: String,
    pub start_date: String,
    pub start_time: String,
    pub end_date: String,
    pub end_time: String,
    /// Minutes, never negative.
    pub duration: u32,
    pub priority: Priority,
    pub status: TaskStatus,
    pub is_recurring: bool,
    pub repeats: Repeats,
    /// Every N days/weeks/months, at least 1.
    pub repeat_frequency: u32,
    pub end_repeat_date: Option<String>,
    pub add_to_calendar: bool,
}

impl Task {
    pub const ID_FIELD: &'static str = "task_id";

    pub fn normalize(raw: &Value) -> Result<Self, ApiError> {
        let obj = normalize::as_record(raw, "task", Self::ID_FIELD)?;
        let task_id = normalize::require_id(obj, "task", Self::ID_FIELD)?;

        let start_date = normalize::date_field(obj, "start_date");
        let start_time = normalize::time_field(obj, "start_time");
        // An open-ended task ends where it starts.
        let end_date = match obj.get("end_date") {
            None | Some(Value::Null) => start_date.clone(),
            Some(_) => normalize::date_field(obj, "end_date"),
        };
        let end_time = match obj.get("end_time") {
            None | Some(Value::Null) => start_time.clone(),
            Some(_) => normalize::time_field(obj, "end_time"),
        };

        let task_type = normalize::string_field(obj, "task_type");
        let task_type = if task_type.trim().is_empty() {
            DEFAULT_TASK_TYPE.to_string()
        } else {
            task_type
        };

        Ok(Self {
            task_id,
            animal_id: normalize::optional_id_field(obj, "animal_id"),
            title: normalize::string_field(obj, "title"),
            task_type,
            description: normalize::string_field(obj, "description"),
            location: normalize::string_field(obj, "location"),
            start_date,
            start_time,
            end_date,
            end_time,
            duration: normalize::count_field(obj, "duration"),
            priority: Priority::coerce(obj.get("priority")),
            status: TaskStatus::coerce(obj.get("status")),
            is_recurring: normalize::bool_field(obj, "is_recurring"),
            repeats: Repeats::coerce(obj.get("repeats")),
            repeat_frequency: normalize::count_field(obj, "repeat_frequency").max(1),
            end_repeat_date: normalize::optional_date_field(obj, "end_repeat_date"),
            add_to_calendar: normalize::bool_field(obj, "add_to_calendar"),
        })
    }
}

/// Request body for creating or replacing a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animal_id: Option<String>,
    pub title: String,
    pub task_type: String,
    pub description: String,
    pub location: String,
    pub start_date: String,
    pub start_time: String,
    pub end_date: String,
    pub end_time: String,
    pub duration: u32,
    pub priority: Priority,
    pub status: TaskStatus,
    pub is_recurring: bool,
    pub repeats: Repeats,
    pub repeat_frequency: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_repeat_date: Option<String>,
    pub add_to_calendar: bool,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        let date = normalize::today();
        let time = normalize::now_time();
        Self {
            animal_id: None,
            title: title.into(),
            task_type: DEFAULT_TASK_TYPE.to_string(),
            description: String::new(),
            location: String::new(),
            start_date: date.clone(),
            start_time: time.clone(),
            end_date: date,
            end_time: time,
            duration: 0,
            priority: Priority::default(),
            status: TaskStatus::default(),
            is_recurring: false,
            repeats: Repeats::default(),
            repeat_frequency: 1,
            end_repeat_date: None,
            add_to_calendar: false,
        }
    }
}

impl From<&Task> for TaskDraft {
    fn from(task: &Task) -> Self {
        Self {
            animal_id: task.animal_id.clone(),
            title: task.title.clone(),
            task_type: task.task_type.clone(),
            description: task.description.clone(),
            location: task.location.clone(),
            start_date: task.start_date.clone(),
            start_time: task.start_time.clone(),
            end_date: task.end_date.clone(),
            end_time: task.end_time.clone(),
            duration: task.duration,
            priority: task.priority,
            status: task.status,
            is_recurring: task.is_recurring,
            repeats: task.repeats,
            repeat_frequency: task.repeat_frequency.max(1),
            end_repeat_date: task.end_repeat_date.clone(),
            add_to_calendar: task.add_to_calendar,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalize_recurring_task() {
        let raw = json!({
            "task_id": "t-1",
            "title": "Trim hooves",
            "task_type": "grooming",
            "start_date": "2024-05-01",
            "start_time": "08:30:00",
            "end_date": "2024-05-01",
            "end_time": "09:15:00",
            "duration": "45",
            "priority": "low",
            "status": "in-progress",
            "is_recurring": true,
            "repeats": "Weekly",
            "repeat_frequency": 2,
            "end_repeat_date": "2024-12-31",
        });
        let task = Task::normalize(&raw).unwrap();
        assert_eq!(task.task_id, "t-1");
        assert_eq!(task.start_time, "08:30");
        assert_eq!(task.end_time, "09:15");
        assert_eq!(task.duration, 45);
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.repeats, Repeats::Weekly);
        assert_eq!(task.repeat_frequency, 2);
        assert_eq!(task.end_repeat_date.as_deref(), Some("2024-12-31"));
    }

    #[test]
    fn clamps_duration_and_frequency() {
        let raw = json!({"task_id": 3, "duration": -30, "repeat_frequency": 0});
        let task = Task::normalize(&raw).unwrap();
        assert_eq!(task.duration, 0);
        assert_eq!(task.repeat_frequency, 1);

        let raw = json!({"task_id": 3, "duration": 12.7, "repeat_frequency": "-2"});
        let task = Task::normalize(&raw).unwrap();
        assert_eq!(task.duration, 12);
        assert_eq!(task.repeat_frequency, 1);
    }

    #[test]
    fn invalid_enums_fall_back() {
        let raw = json!({"task_id": "1", "priority": "critical", "status": "blocked", "repeats": "yearly"});
        let task = Task::normalize(&raw).unwrap();
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.repeats, Repeats::Daily);
    }

    #[test]
    fn end_defaults_to_start() {
        let raw = json!({"task_id": "1", "start_date": "2024-02-29", "start_time": "7:00"});
        let task = Task::normalize(&raw).unwrap();
        assert_eq!(task.end_date, "2024-02-29");
        assert_eq!(task.end_time, "07:00");
        assert_eq!(task.task_type, DEFAULT_TASK_TYPE);
        assert_eq!(task.end_repeat_date, None);
    }

    #[test]
    fn missing_id_is_invalid() {
        let err = Task::normalize(&json!({"title": "Feed"})).unwrap_err();
        assert_eq!(err, ApiError::InvalidData { entity: "task", field: "task_id" });
    }
}
