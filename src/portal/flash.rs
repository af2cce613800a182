//! Flash messages - The one-line feedback shown after a portal action.

use crate::errors::{Error, Result};
use serde::Serialize;
use std::fmt;
use tracing::{error, warn};

/// How the flash is styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FlashLevel {
    /// The action went through
    Success,
    /// The action was rejected or failed
    Error,
}

/// Feedback for the user after an action, rendered above the next page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flash {
    /// Styling of the message
    pub level: FlashLevel,
    /// Text shown to the user
    pub text: String,
}

impl Flash {
    /// A success message.
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            text: text.into(),
        }
    }

    /// Turns a failure into feedback.
    ///
    /// Store failures are logged in full and shown as a generic warning; request
    /// errors are logged at `warn` and shown as they are.
    #[must_use]
    pub fn from_error(err: &Error) -> Self {
        if err.is_store_failure() {
            error!("Portal action failed: {err:?}");
        } else {
            warn!("Portal action rejected: {err}");
        }
        Self {
            level: FlashLevel::Error,
            text: err.user_message(),
        }
    }

    /// Feedback for the outcome of an action: `on_success` words the success case.
    pub fn from_result<T>(result: &Result<T>, on_success: impl FnOnce(&T) -> String) -> Self {
        match result {
            Ok(value) => Self::success(on_success(value)),
            Err(err) => Self::from_error(err),
        }
    }
}

impl fmt::Display for Flash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.level {
            FlashLevel::Success => "✅",
            FlashLevel::Error => "⚠️",
        };
        write!(f, "{marker} {}", self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::GENERIC_STORE_WARNING;
    use sea_orm::DbErr;

    #[test]
    fn test_store_failure_is_generic() {
        let err = Error::from(DbErr::Custom("database is locked".to_string()));
        let flash = Flash::from_error(&err);
        assert_eq!(flash.level, FlashLevel::Error);
        assert_eq!(flash.text, GENERIC_STORE_WARNING);
    }

    #[test]
    fn test_from_result() {
        let ok: Result<i64> = Ok(4);
        let flash = Flash::from_result(&ok, |id| format!("Enrollment {id} created"));
        assert_eq!(flash, Flash::success("Enrollment 4 created"));
        assert_eq!(flash.to_string(), "✅ Enrollment 4 created");

        let rejected: Result<i64> = Err(Error::AlreadyEnrolled {
            student_id: 1,
            course_id: 2,
        });
        let flash = Flash::from_result(&rejected, |_| unreachable!());
        assert_eq!(flash.level, FlashLevel::Error);
        assert_eq!(flash.text, "Student 1 is already enrolled in course 2");
    }
}
