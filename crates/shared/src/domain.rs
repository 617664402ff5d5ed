use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

id_newtype!(EvaluationId);
id_newtype!(QuestionId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub total_questions: u32,
    pub incorrect_questions: u32,
}

/// One graded sub-question the backend marked as incorrect.
///
/// Every text field except `error_summary` may embed math markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncorrectQuestion {
    pub question_id: QuestionId,
    pub question: String,
    pub error_summary: String,
    pub error_explanation: String,
    pub correct_solution: String,
    pub final_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub evaluation_id: EvaluationId,
    pub summary: EvaluationSummary,
    pub incorrect_questions: Vec<IncorrectQuestion>,
}

impl EvaluationResult {
    pub fn is_all_correct(&self) -> bool {
        self.incorrect_questions.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub evaluation_id: EvaluationId,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    pub total_questions: u32,
    pub incorrect_count: u32,
}

impl HistoryItem {
    pub fn is_all_correct(&self) -> bool {
        self.incorrect_count == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSlot {
    Question,
    Answer,
}

impl ImageSlot {
    pub fn label(self) -> &'static str {
        match self {
            ImageSlot::Question => "Question Paper",
            ImageSlot::Answer => "Answer Sheet",
        }
    }
}

/// An image chosen from the camera or the gallery. Held in memory only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedImage {
    pub uri: String,
    pub base64: Option<String>,
}

impl PickedImage {
    pub fn new(uri: impl Into<String>, base64: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            base64: Some(base64.into()),
        }
    }

    pub fn without_data(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            base64: None,
        }
    }

    pub fn encoded(&self) -> Option<&str> {
        self.base64.as_deref().filter(|data| !data.is_empty())
    }
}

/// ISO-8601 timestamps. Values without an offset are read as UTC.
mod timestamp {
    use super::*;
    use serde::{de::Error as _, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp '{raw}'")))
    }

    pub(super) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(|naive| naive.and_utc())
    }

}
