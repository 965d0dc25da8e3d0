use serde::{Deserialize, Serialize};
use std::fmt;

use super::normalize::LenientEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl LenientEnum for Priority {
    const FIELD: &'static str = "priority";
    const ALL: &'static [Self] = &[Self::Low, Self::Medium, Self::High];
    const FALLBACK: Self = Self::Medium;

    fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::FALLBACK
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
