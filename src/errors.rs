//! Unified error type for the registrar.
//!
//! Store failures are classified once, in `From<DbErr>`, into constraint violations,
//! transient connection problems and everything else. The portal layer turns any
//! variant into a user-visible message through [`Error::user_message`].

use crate::entities::Role;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Text shown to users when the store fails underneath an operation.
pub const GENERIC_STORE_WARNING: &str =
    "Something went wrong while saving your changes. Please try again.";

/// Every failure the registrar can report.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Database error: {0}")]
    Database(DbErr),

    #[error("Database constraint violated: {message}")]
    ConstraintViolation { message: String },

    #[error("Database temporarily unavailable: {message}")]
    TransientStore { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Student {student_id} is already enrolled in course {course_id}")]
    AlreadyEnrolled { student_id: i64, course_id: i64 },

    #[error("Student {student_id} is not enrolled in course {course_id}")]
    NotEnrolled { student_id: i64, course_id: i64 },

    #[error("Student not found: {id}")]
    StudentNotFound { id: i64 },

    #[error("Faculty member not found: {id}")]
    FacultyNotFound { id: i64 },

    #[error("Course not found: {id}")]
    CourseNotFound { id: i64 },

    #[error("User not found: {id}")]
    UserNotFound { id: i64 },

    #[error("Enrollment not found: {id}")]
    EnrollmentNotFound { id: i64 },

    #[error("Assignment not found: {id}")]
    AssignmentNotFound { id: i64 },

    #[error("Message not found: {id}")]
    MessageNotFound { id: i64 },

    #[error("No administrator account exists")]
    NoAdministrator,

    #[error("User {user_id} has no {role} profile")]
    ProfileMissing { user_id: i64, role: Role },

    #[error("An account with email {email} already exists")]
    DuplicateEmail { email: String },

    #[error("A course with code {code} already exists")]
    DuplicateCourseCode { code: String },

    #[error("Invalid grade: {value:?}")]
    InvalidGrade { value: String },

    #[error("Invalid role: {value:?}")]
    InvalidRole { value: String },

    #[error("User {user_id} is a {actual}, not a {expected}")]
    RecipientMismatch {
        user_id: i64,
        expected: Role,
        actual: Role,
    },

    #[error("User {user_id} is not one of your contacts")]
    NotAContact { user_id: i64 },

    #[error("This page requires the {required} role (signed in as {actual})")]
    Forbidden { required: Role, actual: Role },

    #[error("You do not teach course {course_id}")]
    NotInstructor { course_id: i64 },
}

impl From<DbErr> for Error {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(message))
            | Some(SqlErr::ForeignKeyConstraintViolation(message)) => {
                Self::ConstraintViolation { message }
            }
            _ => match err {
                DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => Self::TransientStore {
                    message: err.to_string(),
                },
                other => Self::Database(other),
            },
        }
    }
}

impl Error {
    /// True for failures of the store itself rather than of the request.
    #[must_use]
    pub const fn is_store_failure(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::ConstraintViolation { .. }
                | Self::TransientStore { .. }
                | Self::Io(_)
                | Self::EnvVar(_)
                | Self::Config { .. }
        )
    }

    /// Message safe to show in a portal. Store failures collapse into
    /// [`GENERIC_STORE_WARNING`]; request errors keep their own wording.
    #[must_use]
    pub fn user_message(&self) -> String {
        if self.is_store_failure() {
            GENERIC_STORE_WARNING.to_string()
        } else {
            self.to_string()
        }
    }
}

/// Whether a store error is a unique-index violation.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
