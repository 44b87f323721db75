//! Shape checks for review API responses.

use serde_json::Value;

use crate::error::{json_kind, Result, WatchError};

/// Key holding the list of homework records.
pub const HOMEWORKS_KEY: &str = "homeworks";

/// Key holding the server timestamp for the next request.
pub const CURRENT_DATE_KEY: &str = "current_date";

/// Validates a decoded response and returns its homework records.
///
/// The records are returned unchanged, most recent first, and may be empty.
///
/// # Errors
///
/// - `WatchError::UnexpectedType` if the response is not an object or
///   `homeworks` is not an array.
/// - `WatchError::EmptyResponse` if `homeworks` or `current_date` is absent.
pub fn check_response(response: &Value) -> Result<&[Value]> {
    tracing::debug!("Checking review API response");

    let Value::Object(fields) = response else {
        return Err(WatchError::unexpected_type(
            "API response",
            "object",
            json_kind(response),
        ));
    };

    for key in [HOMEWORKS_KEY, CURRENT_DATE_KEY] {
        if !fields.contains_key(key) {
            return Err(WatchError::empty_response(key));
        }
    }

    match &fields[HOMEWORKS_KEY] {
        Value::Array(homeworks) => Ok(homeworks.as_slice()),
        other => Err(WatchError::unexpected_type(
            HOMEWORKS_KEY,
            "array",
            json_kind(other),
        )),
    }
}

/// Reads the server-reported `current_date`, if it is an integer.
#[must_use]
pub fn current_date(response: &Value) -> Option<i64> {
    response.get(CURRENT_DATE_KEY).and_then(Value::as_i64)
}
