//! Shared test utilities for the registrar.
//!
//! This module provides common helper functions for setting up test databases
//! and creating accounts and courses with sensible defaults.

use crate::{
    core::{
        catalog::{self, NewCourse},
        directory::{self, Identity, NewAccount},
    },
    entities::{Role, course},
    errors::Result,
};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Account input with a fixed test credential and no profile details.
#[must_use]
pub fn new_account(name: &str, email: &str, role: Role) -> NewAccount {
    NewAccount {
        name: name.to_string(),
        email: email.to_string(),
        password_hash: "test-hash".to_string(),
        role,
        department: None,
        program: None,
        enrollment_year: None,
    }
}

fn email_for(name: &str) -> String {
    format!("{}@uni.test", name.to_lowercase().replace(' ', "."))
}

/// Creates a student account; the email is derived from the name.
pub async fn create_test_student(db: &DatabaseConnection, name: &str) -> Result<Identity> {
    let mut account = new_account(name, &email_for(name), Role::Student);
    account.program = Some("BS Computer Science".to_string());
    account.enrollment_year = Some(2024);
    directory::create_account(db, account).await
}

/// Creates a faculty account; the email is derived from the name.
pub async fn create_test_faculty(db: &DatabaseConnection, name: &str) -> Result<Identity> {
    let mut account = new_account(name, &email_for(name), Role::Faculty);
    account.department = Some("Computer Science".to_string());
    directory::create_account(db, account).await
}

/// Creates an admin account; the email is derived from the name.
pub async fn create_test_admin(db: &DatabaseConnection, name: &str) -> Result<Identity> {
    directory::create_account(db, new_account(name, &email_for(name), Role::Admin)).await
}

/// Creates a course with sensible defaults.
///
/// # Defaults
/// * `name`: "Course <code>"
/// * `credits`: 3
/// * `capacity`: 30
pub async fn create_test_course(
    db: &DatabaseConnection,
    code: &str,
    faculty_id: Option<i64>,
) -> Result<course::Model> {
    catalog::create_course(
        db,
        NewCourse {
            code: code.to_string(),
            name: format!("Course {code}"),
            credits: 3,
            room: None,
            capacity: course::DEFAULT_CAPACITY,
            faculty_id,
        },
    )
    .await
}

/// Sets up a database with one student and one unassigned course.
/// Returns (db, `student_id`, course) for ledger tests.
pub async fn setup_with_student_and_course() -> Result<(DatabaseConnection, i64, course::Model)>
{
    let db = setup_test_db().await?;
    let student = create_test_student(&db, "Test Student").await?;
    let course = create_test_course(&db, "CS101", None).await?;
    let student_id = student.profile_id.ok_or(crate::errors::Error::ProfileMissing {
        user_id: student.user_id,
        role: Role::Student,
    })?;
    Ok((db, student_id, course))
}

/// Sets up a database with an administrator and a student.
/// Returns (db, admin, student).
pub async fn setup_admin_and_student() -> Result<(DatabaseConnection, Identity, Identity)> {
    let db = setup_test_db().await?;
    let admin = create_test_admin(&db, "Registrar").await?;
    let student = create_test_student(&db, "Test Student").await?;
    Ok((db, admin, student))
}
