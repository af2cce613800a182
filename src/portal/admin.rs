//! Admin portal - Accounts, catalog, enrollments and broadcasts.
//!
//! Every action checks the actor's role first. Free-form form values (roles, grades)
//! are parsed here, before anything reaches the core.

use super::session::Actor;
use crate::{
    core::{
        catalog::{self, CourseListing, NewCourse},
        dashboard::{self, AdminStats},
        directory::{self, Identity, NewAccount},
        enrollment::{self, CounterDrift, EnrollmentRow},
        messaging::{self, Recipient},
        notification,
    },
    entities::{Role, course, enrollment as enrollment_entity, message, user},
    errors::Result,
};
use sea_orm::DatabaseConnection;
use tracing::info;

/// Headline counts.
pub async fn dashboard(db: &DatabaseConnection, actor: &Actor) -> Result<AdminStats> {
    actor.require(Role::Admin)?;
    dashboard::admin_stats(db).await
}

/// Creates an account with its profile.
pub async fn create_account(
    db: &DatabaseConnection,
    actor: &Actor,
    account: NewAccount,
) -> Result<Identity> {
    actor.require(Role::Admin)?;
    directory::create_account(db, account).await
}

/// Accounts of the role named by `role` (e.g. from a filter dropdown).
///
/// # Errors
/// Returns `Error::InvalidRole` if `role` is not a known role.
pub async fn list_accounts(
    db: &DatabaseConnection,
    actor: &Actor,
    role: &str,
) -> Result<Vec<user::Model>> {
    actor.require(Role::Admin)?;
    let role: Role = role.parse()?;
    directory::list_by_role(db, role).await
}

/// Adds a course to the catalog.
pub async fn create_course(
    db: &DatabaseConnection,
    actor: &Actor,
    new_course: NewCourse,
) -> Result<course::Model> {
    actor.require(Role::Admin)?;
    catalog::create_course(db, new_course).await
}

/// The catalog with instructor names.
pub async fn courses(db: &DatabaseConnection, actor: &Actor) -> Result<Vec<CourseListing>> {
    actor.require(Role::Admin)?;
    catalog::list_courses_with_faculty(db).await
}

/// Sets or clears the instructor of a course.
pub async fn assign_faculty(
    db: &DatabaseConnection,
    actor: &Actor,
    course_id: i64,
    faculty_id: Option<i64>,
) -> Result<course::Model> {
    actor.require(Role::Admin)?;
    catalog::assign_faculty(db, course_id, faculty_id).await
}

/// The manage-enrollments table.
pub async fn enrollments(db: &DatabaseConnection, actor: &Actor) -> Result<Vec<EnrollmentRow>> {
    actor.require(Role::Admin)?;
    enrollment::list_enrollment_rows(db).await
}

/// Enrolls any student in any course.
pub async fn enroll_student(
    db: &DatabaseConnection,
    actor: &Actor,
    student_id: i64,
    course_id: i64,
) -> Result<enrollment_entity::Model> {
    actor.require(Role::Admin)?;
    enrollment::enroll(db, student_id, course_id).await
}

/// Drops an enrollment by id.
pub async fn drop_enrollment(
    db: &DatabaseConnection,
    actor: &Actor,
    enrollment_id: i64,
) -> Result<enrollment_entity::Model> {
    actor.require(Role::Admin)?;
    enrollment::drop_enrollment(db, enrollment_id).await
}

/// Courses whose enrollment counter has drifted from the live rows.
pub async fn audit_counters(db: &DatabaseConnection, actor: &Actor) -> Result<Vec<CounterDrift>> {
    actor.require(Role::Admin)?;
    enrollment::audit_enrolled_counts(db).await
}

/// Sends a notification to every account of the role named by `target_role`.
///
/// # Errors
/// Returns `Error::InvalidRole` if `target_role` is not a known role.
pub async fn broadcast(
    db: &DatabaseConnection,
    actor: &Actor,
    target_role: &str,
    text: &str,
) -> Result<u64> {
    actor.require(Role::Admin)?;
    let role: Role = target_role.parse()?;
    let count = notification::broadcast(db, role, text).await?;
    info!("Admin {} broadcast to {count} {role} accounts", actor.user_id());
    Ok(count)
}

/// Administrators may write to any account.
pub async fn send_message(
    db: &DatabaseConnection,
    actor: &Actor,
    recipient: Recipient,
    subject: &str,
    body: &str,
) -> Result<message::Model> {
    actor.require(Role::Admin)?;
    messaging::send_message(db, actor.identity(), recipient, subject, body).await
}
