//! Database configuration module for the registrar.
//!
//! This module handles `SQLite` connection setup and schema creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs. Composite uniqueness (one enrollment per
//! student and course, one attendance mark per session, one submission per student and
//! assignment) cannot be expressed on a single column and is added as explicit indexes.

use crate::entities::{
    Assignment, Attendance, Course, Enrollment, Faculty, Message, Notification, Student,
    Submission, User, attendance, enrollment, submission,
};
use crate::errors::Result;
use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::Path;
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/registrar.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable, falling back
/// to a local `SQLite` file.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Directory a file-backed `SQLite` URL keeps its database in.
fn sqlite_parent_dir(database_url: &str) -> Option<&Path> {
    let path = database_url.strip_prefix("sqlite://")?;
    let path = path.split('?').next()?;
    Path::new(path).parent().filter(|p| !p.as_os_str().is_empty())
}

/// Establishes a connection to the configured database, creating the directory of a
/// file-backed `SQLite` database first.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    if let Some(dir) = sqlite_parent_dir(&database_url) {
        std::fs::create_dir_all(dir)?;
    }
    debug!("Connecting to database at {database_url}");
    Database::connect(&database_url).await.map_err(Into::into)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

fn unique_pair_indexes() -> [IndexCreateStatement; 3] {
    [
        Index::create()
            .if_not_exists()
            .name("idx_enrollments_student_course")
            .table(Enrollment)
            .col(enrollment::Column::StudentId)
            .col(enrollment::Column::CourseId)
            .unique()
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_attendance_enrollment_date")
            .table(Attendance)
            .col(attendance::Column::EnrollmentId)
            .col(attendance::Column::SessionDate)
            .unique()
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_submissions_assignment_student")
            .table(Submission)
            .col(submission::Column::AssignmentId)
            .col(submission::Column::StudentId)
            .unique()
            .to_owned(),
    ]
}

/// Creates every table and unique index that does not exist yet.
///
/// Parents are created before children so foreign keys resolve on backends that check
/// them at creation time.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    create_table(db, &schema, User).await?;
    create_table(db, &schema, Student).await?;
    create_table(db, &schema, Faculty).await?;
    create_table(db, &schema, Course).await?;
    create_table(db, &schema, Enrollment).await?;
    create_table(db, &schema, Attendance).await?;
    create_table(db, &schema, Assignment).await?;
    create_table(db, &schema, Submission).await?;
    create_table(db, &schema, Message).await?;
    create_table(db, &schema, Notification).await?;

    for index in unique_pair_indexes() {
        db.execute(builder.build(&index)).await?;
    }

    info!("Database tables and unique indexes ensured.");
    Ok(())
}
