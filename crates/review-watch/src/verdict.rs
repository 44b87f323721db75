//! Review verdicts and notification text.
//!
//! Maps the review API's status codes to the sentences shown in the chat and
//! renders a single homework record into a notification.

use serde_json::Value;

use crate::error::{json_kind, Result, WatchError};

/// Review status of a homework submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HomeworkStatus {
    /// The reviewer accepted the work.
    Approved,
    /// The reviewer has picked the work up.
    Reviewing,
    /// The reviewer returned the work with remarks.
    Rejected,
}

impl HomeworkStatus {
    /// Every known status, in catalog order.
    pub const ALL: [Self; 3] = [Self::Approved, Self::Reviewing, Self::Rejected];

    /// Looks up a status by its API code.
    ///
    /// # Examples
    ///
    /// ```
    /// use review_watch::HomeworkStatus;
    ///
    /// assert_eq!(HomeworkStatus::from_code("approved"), Some(HomeworkStatus::Approved));
    /// assert_eq!(HomeworkStatus::from_code("lost"), None);
    /// ```
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.code() == code)
    }

    /// Returns the API code for this status.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Reviewing => "reviewing",
            Self::Rejected => "rejected",
        }
    }

    /// Returns the verdict shown to the student.
    #[must_use]
    pub const fn verdict(&self) -> &'static str {
        match self {
            Self::Approved => "Работа проверена: ревьюеру всё понравилось. Ура!",
            Self::Reviewing => "Работа взята на проверку ревьюером.",
            Self::Rejected => "Работа проверена: у ревьюера есть замечания.",
        }
    }
}

impl std::fmt::Display for HomeworkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// The name and status extracted from one homework record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeworkUpdate {
    /// Homework name as reported by the API.
    pub name: String,
    /// Parsed review status.
    pub status: HomeworkStatus,
}

impl HomeworkUpdate {
    /// Extracts the update from a raw homework record.
    ///
    /// # Errors
    ///
    /// Returns `WatchError::MissingKey` when `homework_name` or `status` is
    /// absent, `WatchError::UnexpectedType` when either is not a string, and
    /// `WatchError::UnknownStatus` when the status has no verdict.
    pub fn from_record(record: &Value) -> Result<Self> {
        let name = string_field(record, "homework_name")?;
        let code = string_field(record, "status")?;
        let status =
            HomeworkStatus::from_code(code).ok_or_else(|| WatchError::unknown_status(code))?;

        Ok(Self {
            name: name.to_string(),
            status,
        })
    }

    /// Renders the chat notification for this update.
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "Изменился статус проверки работы \"{}\". {}",
            self.name,
            self.status.verdict()
        )
    }
}

/// Turns one homework record into its notification text.
pub fn parse_status(record: &Value) -> Result<String> {
    HomeworkUpdate::from_record(record).map(|update| update.message())
}

fn string_field<'a>(record: &'a Value, key: &str) -> Result<&'a str> {
    let value = record.get(key).ok_or_else(|| WatchError::missing_key(key))?;
    value
        .as_str()
        .ok_or_else(|| WatchError::unexpected_type(key, "string", json_kind(value)))
}
