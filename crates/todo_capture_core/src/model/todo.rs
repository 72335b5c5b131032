//! Todo domain model.
//!
//! # Responsibility
//! - Define the single persisted capture record and its wire shape.
//! - Define the explicit partial-update structure used by the store.
//!
//! # Invariants
//! - `id` is generated once, never edited and never reused.
//! - `text` is trimmed and non-empty for every stored todo.
//! - `created_at` is captured at creation and never changes afterwards.
//!
//! # See also
//! - crate::service::todo_service

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Provenance tag applied when the caller does not supply one.
pub const SOURCE_MANUAL: &str = "manual";
/// Provenance tag for text that arrived through the capture hotkey.
pub const SOURCE_HOTKEY: &str = "hotkey";

/// Opaque identifier of one todo.
///
/// Rendered as 32 lowercase hex characters of a random 128-bit value, which
/// matches files written by earlier releases.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(String);

impl TodoId {
    /// Generates a fresh identifier from OS randomness.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Display for TodoId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TodoId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TodoId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Urgency tag of a todo.
///
/// Older files store "no priority" as an empty string; it loads as `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    #[default]
    #[serde(alias = "")]
    None,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::None => "none",
        }
    }

    /// Next priority in the low -> medium -> high -> low rotation.
    ///
    /// An untagged todo enters the rotation at `Low`.
    pub fn cycle(self) -> Self {
        match self {
            Self::Low => Self::Medium,
            Self::Medium => Self::High,
            Self::High | Self::None => Self::Low,
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = TodoValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "none" | "" => Ok(Self::None),
            other => Err(TodoValidationError::UnknownPriority(other.to_string())),
        }
    }
}

/// Persisted capture record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    #[serde(deserialize_with = "trimmed_text")]
    pub text: String,
    pub completed: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub priority: Priority,
    #[serde(default, deserialize_with = "null_as_default")]
    pub categories: Vec<String>,
    #[serde(with = "rfc3339_millis")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_source", deserialize_with = "null_as_manual")]
    pub source: String,
}

impl Todo {
    /// Creates an open todo with a fresh id and the current time.
    ///
    /// Text is trimmed; tags start empty and the source is `manual`.
    pub fn new(text: impl AsRef<str>) -> Self {
        Self {
            id: TodoId::generate(),
            text: text.as_ref().trim().to_string(),
            completed: false,
            priority: Priority::None,
            categories: Vec::new(),
            created_at: Utc::now().trunc_subsecs(3),
            source: SOURCE_MANUAL.to_string(),
        }
    }

    /// Checks the mandatory-field invariants.
    pub fn validate(&self) -> Result<(), TodoValidationError> {
        if self.id.is_empty() {
            return Err(TodoValidationError::EmptyId);
        }
        if self.text.trim().is_empty() {
            return Err(TodoValidationError::EmptyText);
        }
        Ok(())
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|value| value == category)
    }
}

fn default_source() -> String {
    SOURCE_MANUAL.to_string()
}

// Optional fields written as `null` load like absent ones.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_manual<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_source))
}

fn trimmed_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(String::deserialize(deserializer)?.trim().to_string())
}

/// Invariant violations of a todo record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoValidationError {
    EmptyId,
    EmptyText,
    UnknownPriority(String),
}

impl Display for TodoValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "todo id must not be empty"),
            Self::EmptyText => write!(f, "todo text must not be empty"),
            Self::UnknownPriority(value) => {
                write!(f, "unknown priority `{value}`; expected low|medium|high|none")
            }
        }
    }
}

impl Error for TodoValidationError {}

/// Partial update applied by `TodoStore::update`.
///
/// An absent field leaves the stored value alone; a present field is written
/// even when it equals the default. `id` and `createdAt` have no slot here,
/// so wire payloads that carry them are accepted and the values ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl TodoPatch {
    pub fn completed(value: bool) -> Self {
        Self {
            completed: Some(value),
            ..Self::default()
        }
    }

    pub fn priority(value: Priority) -> Self {
        Self {
            priority: Some(value),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.completed.is_none()
            && self.priority.is_none()
            && self.categories.is_none()
            && self.source.is_none()
    }

    /// Merges present fields onto `todo`, trimming replacement text.
    pub fn apply_to(&self, todo: &mut Todo) {
        if let Some(text) = &self.text {
            todo.text = text.trim().to_string();
        }
        if let Some(completed) = self.completed {
            todo.completed = completed;
        }
        if let Some(priority) = self.priority {
            todo.priority = priority;
        }
        if let Some(categories) = &self.categories {
            todo.categories = categories.clone();
        }
        if let Some(source) = &self.source {
            todo.source = source.clone();
        }
    }
}

/// RFC 3339 timestamps with millisecond precision and a `Z` suffix.
mod rfc3339_millis {
    use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(raw.trim())
            .map(|value| value.with_timezone(&Utc).trunc_subsecs(3))
            .map_err(|err| de::Error::custom(format!("invalid createdAt `{raw}`: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::{Priority, Todo, TodoId, TodoPatch, TodoValidationError};

    #[test]
    fn generated_ids_are_32_hex_chars() {
        let id = TodoId::generate();
        assert_eq!(id.as_str().len(), 32);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, TodoId::generate());
    }

    #[test]
    fn priority_cycle_rotates_and_none_enters_at_low() {
        assert_eq!(Priority::Low.cycle(), Priority::Medium);
        assert_eq!(Priority::Medium.cycle(), Priority::High);
        assert_eq!(Priority::High.cycle(), Priority::Low);
        assert_eq!(Priority::None.cycle(), Priority::Low);
    }

    #[test]
    fn priority_parse_is_case_insensitive() {
        assert_eq!("HIGH".parse::<Priority>().expect("parse"), Priority::High);
        assert_eq!("".parse::<Priority>().expect("parse"), Priority::None);
        assert_eq!(
            "critical".parse::<Priority>().unwrap_err(),
            TodoValidationError::UnknownPriority("critical".to_string())
        );
    }

    #[test]
    fn patch_preserves_absent_fields() {
        let mut todo = Todo::new("  call bob  ");
        todo.priority = Priority::High;
        todo.categories = vec!["Email".to_string()];

        TodoPatch::completed(true).apply_to(&mut todo);

        assert_eq!(todo.text, "call bob");
        assert!(todo.completed);
        assert_eq!(todo.priority, Priority::High);
        assert_eq!(todo.categories, vec!["Email".to_string()]);
    }

    #[test]
    fn load_trims_text_and_defaults_null_tags() {
        let todo: Todo = serde_json::from_str(
            r#"{"id":"a1","text":"  pay rent \n","completed":false,"priority":null,
                "categories":null,"createdAt":"2025-11-02T09:15:30.123456Z","source":null}"#,
        )
        .unwrap();

        assert_eq!(todo.text, "pay rent");
        assert_eq!(todo.priority, Priority::None);
        assert!(todo.categories.is_empty());
        assert_eq!(todo.source, "manual");
        assert_eq!(
            todo.created_at.to_rfc3339(),
            "2025-11-02T09:15:30.123+00:00"
        );
    }

    #[test]
    fn validate_rejects_blank_text() {
        let mut todo = Todo::new("x");
        todo.text = "   ".to_string();
        assert_eq!(todo.validate().unwrap_err(), TodoValidationError::EmptyText);
    }
}
