use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::normalize::{self, LenientEnum};
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Feeding,
    Vaccination,
    Deworming,
    HealthCheck,
    Breeding,
    Birthing,
    Weighing,
    Grooming,
    Milking,
    Other,
}

impl LenientEnum for ActivityType {
    const FIELD: &'static str = "activity_type";
    const ALL: &'static [Self] = &[
        Self::Feeding,
        Self::Vaccination,
        Self::Deworming,
        Self::HealthCheck,
        Self::Breeding,
        Self::Birthing,
        Self::Weighing,
        Self::Grooming,
        Self::Milking,
        Self::Other,
    ];
    const FALLBACK: Self = Self::Feeding;

    fn as_str(&self) -> &'static str {
        match self {
            Self::Feeding => "feeding",
            Self::Vaccination => "vaccination",
            Self::Deworming => "deworming",
            Self::HealthCheck => "health_check",
            Self::Breeding => "breeding",
            Self::Birthing => "birthing",
            Self::Weighing => "weighing",
            Self::Grooming => "grooming",
            Self::Milking => "milking",
            Self::Other => "other",
        }
    }
}

impl Default for ActivityType {
    fn default() -> Self {
        Self::FALLBACK
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const BREEDING_KEYS: &[&str] = &[
    "breeding_date",
    "mating_partner",
    "expected_birth_date",
    "gestation_days",
    "offspring_count",
];

/// Extra fields recorded with breeding activities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BreedingDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breeding_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mating_partner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_birth_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gestation_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offspring_count: Option<u32>,
}

/// A dated event in an animal's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Activity {
    pub activity_id: String,
    pub animal_id: Option<String>,
    pub activity_type: ActivityType,
    pub activity_date: String,
    pub description: String,
    pub notes: String,
    #[serde(flatten)]
    pub breeding: Option<BreedingDetails>,
}

impl Activity {
    pub const ID_FIELD: &'static str = "activity_id";

    pub fn normalize(raw: &Value) -> Result<Self, ApiError> {
        let obj = normalize::as_record(raw, "activity", Self::ID_FIELD)?;
        let activity_id = normalize::require_id(obj, "activity", Self::ID_FIELD)?;
        let activity_type = ActivityType::coerce(obj.get("activity_type"));

        let has_breeding = BREEDING_KEYS
            .iter()
            .any(|k| obj.get(*k).is_some_and(|v| !v.is_null()));
        let breeding = if has_breeding {
            Some(BreedingDetails {
                breeding_date: normalize::optional_date_field(obj, "breeding_date"),
                mating_partner: normalize::optional_string_field(obj, "mating_partner")
                    .filter(|s| !s.trim().is_empty()),
                expected_birth_date: normalize::optional_date_field(obj, "expected_birth_date"),
                gestation_days: normalize::optional_count_field(obj, "gestation_days"),
                offspring_count: normalize::optional_count_field(obj, "offspring_count"),
            })
        } else if activity_type == ActivityType::Breeding {
            Some(BreedingDetails::default())
        } else {
            None
        };

        Ok(Self {
            activity_id,
            animal_id: normalize::optional_id_field(obj, "animal_id"),
            activity_type,
            activity_date: normalize::date_field(obj, "activity_date"),
            description: normalize::string_field(obj, "description"),
            notes: normalize::string_field(obj, "notes"),
            breeding,
        })
    }
}

/// Request body for creating or replacing an activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityDraft {
    pub activity_type: ActivityType,
    pub activity_date: String,
    pub description: String,
    pub notes: String,
    #[serde(flatten)]
    pub breeding: Option<BreedingDetails>,
}

impl ActivityDraft {
    pub fn new(activity_type: ActivityType) -> Self {
        Self {
            activity_type,
            activity_date: normalize::today(),
            description: String::new(),
            notes: String::new(),
            breeding: None,
        }
    }
}

impl From<&Activity> for ActivityDraft {
    fn from(activity: &Activity) -> Self {
        Self {
            activity_type: activity.activity_type,
            activity_date: activity.activity_date.clone(),
            description: activity.description.clone(),
            notes: activity.notes.clone(),
            breeding: activity.breeding.clone(),
        }
    }
}
