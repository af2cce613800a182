//! Assignments and submissions.
//!
//! Only file paths are stored; uploads are kept by the caller.

use crate::{
    entities::{Assignment, Course, Enrollment, Student, Submission, assignment, enrollment, submission},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*};
use std::collections::HashSet;
use tracing::info;

/// Input for [`create_assignment`].
#[derive(Debug, Clone, Default)]
pub struct NewAssignment {
    /// Course the assignment belongs to
    pub course_id: i64,
    /// Title, must not be empty
    pub title: String,
    /// Instructions
    pub description: Option<String>,
    /// Deadline
    pub due_date: Option<Date>,
    /// Stored path of an attached file
    pub attachment_path: Option<String>,
}

/// Posts an assignment to a course.
///
/// # Errors
/// * `Error::InvalidInput` for an empty title
/// * `Error::CourseNotFound` if the course does not exist
pub async fn create_assignment(
    db: &DatabaseConnection,
    new_assignment: NewAssignment,
) -> Result<assignment::Model> {
    let title = new_assignment.title.trim();
    if title.is_empty() {
        return Err(Error::InvalidInput {
            message: "Assignment title cannot be empty".to_string(),
        });
    }

    Course::find_by_id(new_assignment.course_id)
        .one(db)
        .await?
        .ok_or(Error::CourseNotFound {
            id: new_assignment.course_id,
        })?;

    let assignment = assignment::ActiveModel {
        course_id: Set(new_assignment.course_id),
        title: Set(title.to_string()),
        description: Set(new_assignment.description),
        due_date: Set(new_assignment.due_date),
        attachment_path: Set(new_assignment.attachment_path),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        "Posted assignment {} to course {}",
        assignment.id, assignment.course_id
    );
    Ok(assignment)
}

/// Gets an assignment by id.
pub async fn get_assignment(
    db: &DatabaseConnection,
    assignment_id: i64,
) -> Result<Option<assignment::Model>> {
    Assignment::find_by_id(assignment_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Assignments of a course, soonest deadline first. Undated ones come last.
pub async fn assignments_for_course(
    db: &DatabaseConnection,
    course_id: i64,
) -> Result<Vec<assignment::Model>> {
    let mut assignments = Assignment::find()
        .filter(assignment::Column::CourseId.eq(course_id))
        .order_by_asc(assignment::Column::Id)
        .all(db)
        .await?;
    sort_by_deadline(&mut assignments);
    Ok(assignments)
}

/// Assignments across every course the student is enrolled in, soonest deadline first.
pub async fn assignments_for_student(
    db: &DatabaseConnection,
    student_id: i64,
) -> Result<Vec<assignment::Model>> {
    let course_ids = enrolled_course_ids(db, student_id).await?;
    if course_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut assignments = Assignment::find()
        .filter(assignment::Column::CourseId.is_in(course_ids))
        .order_by_asc(assignment::Column::Id)
        .all(db)
        .await?;
    sort_by_deadline(&mut assignments);
    Ok(assignments)
}

fn sort_by_deadline(assignments: &mut [assignment::Model]) {
    assignments.sort_by_key(|a| (a.due_date.is_none(), a.due_date, a.id));
}

async fn enrolled_course_ids(db: &DatabaseConnection, student_id: i64) -> Result<Vec<i64>> {
    Enrollment::find()
        .select_only()
        .column(enrollment::Column::CourseId)
        .filter(enrollment::Column::StudentId.eq(student_id))
        .into_tuple()
        .all(db)
        .await
        .map_err(Into::into)
}

/// Records a student's hand-in. A resubmission replaces the earlier file and time.
///
/// # Errors
/// * `Error::AssignmentNotFound` / `Error::StudentNotFound` for unknown ids
/// * `Error::InvalidInput` for an empty file path
/// * `Error::NotEnrolled` if the student does not take the assignment's course
pub async fn submit(
    db: &DatabaseConnection,
    assignment_id: i64,
    student_id: i64,
    file_path: &str,
) -> Result<submission::Model> {
    if file_path.trim().is_empty() {
        return Err(Error::InvalidInput {
            message: "Submission file path cannot be empty".to_string(),
        });
    }

    let assignment = get_assignment(db, assignment_id)
        .await?
        .ok_or(Error::AssignmentNotFound { id: assignment_id })?;
    Student::find_by_id(student_id)
        .one(db)
        .await?
        .ok_or(Error::StudentNotFound { id: student_id })?;

    let enrolled = Enrollment::find()
        .filter(enrollment::Column::StudentId.eq(student_id))
        .filter(enrollment::Column::CourseId.eq(assignment.course_id))
        .count(db)
        .await?;
    if enrolled == 0 {
        return Err(Error::NotEnrolled {
            student_id,
            course_id: assignment.course_id,
        });
    }

    let saved = match submission_for(db, assignment_id, student_id).await? {
        Some(existing) => {
            let mut active: submission::ActiveModel = existing.into();
            active.file_path = Set(file_path.to_string());
            active.submitted_at = Set(chrono::Utc::now());
            active.update(db).await?
        }
        None => {
            submission::ActiveModel {
                assignment_id: Set(assignment_id),
                student_id: Set(student_id),
                file_path: Set(file_path.to_string()),
                submitted_at: Set(chrono::Utc::now()),
                ..Default::default()
            }
            .insert(db)
            .await?
        }
    };

    info!("Student {student_id} submitted assignment {assignment_id}");
    Ok(saved)
}

/// The submission of a student for an assignment, if any.
pub async fn submission_for(
    db: &DatabaseConnection,
    assignment_id: i64,
    student_id: i64,
) -> Result<Option<submission::Model>> {
    Submission::find()
        .filter(submission::Column::AssignmentId.eq(assignment_id))
        .filter(submission::Column::StudentId.eq(student_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// All hand-ins for an assignment, most recent first.
pub async fn submissions_for_assignment(
    db: &DatabaseConnection,
    assignment_id: i64,
) -> Result<Vec<submission::Model>> {
    Submission::find()
        .filter(submission::Column::AssignmentId.eq(assignment_id))
        .order_by_desc(submission::Column::SubmittedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Ids of the assignments a student has handed in.
pub async fn submitted_assignment_ids(
    db: &DatabaseConnection,
    student_id: i64,
) -> Result<HashSet<i64>> {
    let ids: Vec<i64> = Submission::find()
        .select_only()
        .column(submission::Column::AssignmentId)
        .filter(submission::Column::StudentId.eq(student_id))
        .into_tuple()
        .all(db)
        .await?;
    Ok(ids.into_iter().collect())
}

/// Assignments still to do: in the student's courses, due `today` or later (or
/// undated), and not yet submitted.
pub async fn assignments_due_count(
    db: &DatabaseConnection,
    student_id: i64,
    today: Date,
) -> Result<usize> {
    let submitted = submitted_assignment_ids(db, student_id).await?;
    Ok(assignments_for_student(db, student_id)
        .await?
        .iter()
        .filter(|a| a.due_date.is_none_or(|due| due >= today))
        .filter(|a| !submitted.contains(&a.id))
        .count())
}
