//! Student portal - Self-enrollment, coursework, grades and mail.
//!
//! Students may write only to faculty who teach them and to the administration.

use super::session::Actor;
use crate::{
    core::{
        catalog::{self, CourseListing},
        coursework,
        dashboard::{self, CourseProgress, StudentDashboard},
        enrollment, grading,
        messaging::{self, Contact, Recipient},
        notification,
    },
    entities::{Role, enrollment as enrollment_entity, message, notification as notification_entity, submission},
    errors::{Error, Result},
};
use sea_orm::{DatabaseConnection, prelude::Date};

/// The landing page after sign-in.
pub async fn dashboard(
    db: &DatabaseConnection,
    actor: &Actor,
    today: Date,
) -> Result<StudentDashboard> {
    actor.require(Role::Student)?;
    dashboard::student_dashboard(db, actor.identity(), today).await
}

/// The actor's courses with grades, attendance and coursework.
pub async fn my_courses(db: &DatabaseConnection, actor: &Actor) -> Result<Vec<CourseProgress>> {
    let student_id = actor.student_id()?;
    dashboard::student_courses(db, student_id).await
}

/// The catalog to pick courses from.
pub async fn catalog(db: &DatabaseConnection, actor: &Actor) -> Result<Vec<CourseListing>> {
    actor.require(Role::Student)?;
    catalog::list_courses_with_faculty(db).await
}

/// Enrolls the actor in a course.
pub async fn enroll(
    db: &DatabaseConnection,
    actor: &Actor,
    course_id: i64,
) -> Result<enrollment_entity::Model> {
    let student_id = actor.student_id()?;
    enrollment::enroll(db, student_id, course_id).await
}

/// Drops the actor from a course.
pub async fn drop_course(
    db: &DatabaseConnection,
    actor: &Actor,
    course_id: i64,
) -> Result<enrollment_entity::Model> {
    let student_id = actor.student_id()?;
    enrollment::drop_pair(db, student_id, course_id).await
}

/// The actor's GPA.
pub async fn gpa(db: &DatabaseConnection, actor: &Actor) -> Result<f64> {
    let student_id = actor.student_id()?;
    grading::compute_gpa(db, student_id).await
}

/// Hands in (or replaces) the actor's work for an assignment.
pub async fn submit(
    db: &DatabaseConnection,
    actor: &Actor,
    assignment_id: i64,
    file_path: &str,
) -> Result<submission::Model> {
    let student_id = actor.student_id()?;
    coursework::submit(db, assignment_id, student_id, file_path).await
}

/// Faculty the actor may write to.
pub async fn contacts(db: &DatabaseConnection, actor: &Actor) -> Result<Vec<Contact>> {
    let student_id = actor.student_id()?;
    messaging::faculty_contacts_for_student(db, student_id).await
}

/// Writes to a faculty member who teaches one of the actor's courses.
///
/// # Errors
/// Returns `Error::NotAContact` for any other account.
pub async fn message_faculty(
    db: &DatabaseConnection,
    actor: &Actor,
    faculty_user_id: i64,
    subject: &str,
    body: &str,
) -> Result<message::Model> {
    let allowed = contacts(db, actor).await?;
    if !allowed.iter().any(|c| c.user_id == faculty_user_id) {
        return Err(Error::NotAContact {
            user_id: faculty_user_id,
        });
    }
    messaging::send_message(
        db,
        actor.identity(),
        Recipient {
            role: Role::Faculty,
            user_id: faculty_user_id,
        },
        subject,
        body,
    )
    .await
}

/// Writes to the administration.
pub async fn message_administration(
    db: &DatabaseConnection,
    actor: &Actor,
    subject: &str,
    body: &str,
) -> Result<message::Model> {
    actor.require(Role::Student)?;
    messaging::send_to_administration(db, actor.identity(), subject, body).await
}

/// The notifications page. Opening it marks everything as read.
pub async fn notifications(
    db: &DatabaseConnection,
    actor: &Actor,
) -> Result<Vec<notification_entity::Model>> {
    actor.require(Role::Student)?;
    let list = notification::notifications_for_user(db, actor.user_id()).await?;
    notification::mark_all_read(db, actor.user_id()).await?;
    Ok(list)
}
