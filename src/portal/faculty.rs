//! Faculty portal - Rosters, grading, attendance and coursework.
//!
//! Faculty may only act on courses they teach; anything else is `NotInstructor`.

use super::session::Actor;
use crate::{
    core::{
        attendance::{self, AttendanceSummary},
        catalog,
        coursework::{self, NewAssignment},
        dashboard::{self, CourseRoster},
        enrollment::{self, GradeUpdate},
        messaging::{self, Contact, Recipient},
    },
    entities::{Grade, Role, assignment, message, submission},
    errors::{Error, Result},
};
use sea_orm::{DatabaseConnection, prelude::Date};

/// Checks that the actor teaches `course_id`.
async fn ensure_teaches(db: &DatabaseConnection, actor: &Actor, course_id: i64) -> Result<()> {
    let faculty_id = actor.faculty_id()?;
    let course = catalog::get_course(db, course_id)
        .await?
        .ok_or(Error::CourseNotFound { id: course_id })?;
    if course.faculty_id == Some(faculty_id) {
        Ok(())
    } else {
        Err(Error::NotInstructor { course_id })
    }
}

/// Rosters of the actor's courses.
pub async fn rosters(db: &DatabaseConnection, actor: &Actor) -> Result<Vec<CourseRoster>> {
    let faculty_id = actor.faculty_id()?;
    dashboard::faculty_rosters(db, faculty_id).await
}

/// Records a grade submitted from the grading form.
///
/// # Errors
/// * `Error::InvalidGrade` if `grade` is not a letter grade
/// * `Error::NotInstructor` if the actor does not teach the course
pub async fn record_grade(
    db: &DatabaseConnection,
    actor: &Actor,
    student_id: i64,
    course_id: i64,
    grade: &str,
) -> Result<GradeUpdate> {
    let grade: Grade = grade.parse()?;
    ensure_teaches(db, actor, course_id).await?;
    enrollment::record_grade(db, student_id, course_id, grade).await
}

/// Marks a student present or absent for one session of a course the actor teaches.
pub async fn mark_attendance(
    db: &DatabaseConnection,
    actor: &Actor,
    enrollment_id: i64,
    session_date: Date,
    present: bool,
) -> Result<AttendanceSummary> {
    let enrollment = enrollment::get_enrollment(db, enrollment_id)
        .await?
        .ok_or(Error::EnrollmentNotFound { id: enrollment_id })?;
    ensure_teaches(db, actor, enrollment.course_id).await?;
    attendance::mark_attendance(db, enrollment_id, session_date, present).await
}

/// Posts an assignment to a course the actor teaches.
pub async fn post_assignment(
    db: &DatabaseConnection,
    actor: &Actor,
    new_assignment: NewAssignment,
) -> Result<assignment::Model> {
    ensure_teaches(db, actor, new_assignment.course_id).await?;
    coursework::create_assignment(db, new_assignment).await
}

/// Hand-ins for an assignment in one of the actor's courses.
pub async fn submissions(
    db: &DatabaseConnection,
    actor: &Actor,
    assignment_id: i64,
) -> Result<Vec<submission::Model>> {
    let assignment = coursework::get_assignment(db, assignment_id)
        .await?
        .ok_or(Error::AssignmentNotFound { id: assignment_id })?;
    ensure_teaches(db, actor, assignment.course_id).await?;
    coursework::submissions_for_assignment(db, assignment_id).await
}

/// Students the actor may write to.
pub async fn contacts(db: &DatabaseConnection, actor: &Actor) -> Result<Vec<Contact>> {
    let faculty_id = actor.faculty_id()?;
    messaging::student_contacts_for_faculty(db, faculty_id).await
}

/// Writes to a student enrolled in one of the actor's courses.
///
/// # Errors
/// Returns `Error::NotAContact` for any other account.
pub async fn message_student(
    db: &DatabaseConnection,
    actor: &Actor,
    student_user_id: i64,
    subject: &str,
    body: &str,
) -> Result<message::Model> {
    let allowed = contacts(db, actor).await?;
    if !allowed.iter().any(|c| c.user_id == student_user_id) {
        return Err(Error::NotAContact {
            user_id: student_user_id,
        });
    }
    messaging::send_message(
        db,
        actor.identity(),
        Recipient {
            role: Role::Student,
            user_id: student_user_id,
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
    actor.require(Role::Faculty)?;
    messaging::send_to_administration(db, actor.identity(), subject, body).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::enrollment::{enroll, get_enrollment_for_pair};
    use crate::test_utils::*;
    use chrono::NaiveDate;

    struct Fixture {
        db: DatabaseConnection,
        teacher: Actor,
        other_teacher: Actor,
        student: crate::core::directory::Identity,
        course_id: i64,
    }

    async fn fixture() -> Result<Fixture> {
        let db = setup_test_db().await?;
        let teacher = create_test_faculty(&db, "Ali").await?;
        let other_teacher = create_test_faculty(&db, "Hina").await?;
        let student = create_test_student(&db, "Sara").await?;
        let course = create_test_course(&db, "CS101", teacher.profile_id).await?;
        enroll(&db, student.profile_id.unwrap(), course.id).await?;
        Ok(Fixture {
            db,
            teacher: Actor::from_identity(teacher),
            other_teacher: Actor::from_identity(other_teacher),
            student,
            course_id: course.id,
        })
    }

    #[tokio::test]
    async fn test_grading_own_course() -> Result<()> {
        let f = fixture().await?;
        let student_id = f.student.profile_id.unwrap();

        let outcome = record_grade(&f.db, &f.teacher, student_id, f.course_id, "b").await?;
        assert_eq!(outcome, GradeUpdate::Updated);
        let stored = get_enrollment_for_pair(&f.db, student_id, f.course_id)
            .await?
            .unwrap();
        assert_eq!(stored.grade, Some(Grade::B));

        let result = record_grade(&f.db, &f.teacher, student_id, f.course_id, "B+").await;
        assert!(matches!(result, Err(Error::InvalidGrade { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_other_courses_rejected() -> Result<()> {
        let f = fixture().await?;
        let student_id = f.student.profile_id.unwrap();

        let result = record_grade(&f.db, &f.other_teacher, student_id, f.course_id, "A").await;
        assert!(matches!(result, Err(Error::NotInstructor { course_id }) if course_id == f.course_id));

        let enrollment = get_enrollment_for_pair(&f.db, student_id, f.course_id)
            .await?
            .unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let result = mark_attendance(&f.db, &f.other_teacher, enrollment.id, date, true).await;
        assert!(matches!(result, Err(Error::NotInstructor { .. })));

        let result = post_assignment(
            &f.db,
            &f.other_teacher,
            NewAssignment {
                course_id: f.course_id,
                title: "Lab 1".to_string(),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result, Err(Error::NotInstructor { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_attendance_and_rosters() -> Result<()> {
        let f = fixture().await?;
        let student_id = f.student.profile_id.unwrap();
        let enrollment = get_enrollment_for_pair(&f.db, student_id, f.course_id)
            .await?
            .unwrap();

        let date = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let summary = mark_attendance(&f.db, &f.teacher, enrollment.id, date, false).await?;
        assert!(summary.percentage.abs() < f64::EPSILON);

        let taught = rosters(&f.db, &f.teacher).await?;
        assert_eq!(taught.len(), 1);
        assert_eq!(taught[0].students[0].attendance_percentage, Some(0.0));
        assert!(rosters(&f.db, &f.other_teacher).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_message_only_own_students() -> Result<()> {
        let f = fixture().await?;
        let stranger = create_test_student(&f.db, "Omar").await?;

        let sent = message_student(&f.db, &f.teacher, f.student.user_id, "Lab", "Room moved").await?;
        assert_eq!(sent.receiver_id, f.student.user_id);

        let result = message_student(&f.db, &f.teacher, stranger.user_id, "Hi", "").await;
        assert!(matches!(result, Err(Error::NotAContact { user_id }) if user_id == stranger.user_id));
        let result = message_student(&f.db, &f.other_teacher, f.student.user_id, "Hi", "").await;
        assert!(matches!(result, Err(Error::NotAContact { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_submissions_of_own_assignment() -> Result<()> {
        let f = fixture().await?;
        let assignment = post_assignment(
            &f.db,
            &f.teacher,
            NewAssignment {
                course_id: f.course_id,
                title: "Lab 1".to_string(),
                ..Default::default()
            },
        )
        .await?;
        coursework::submit(
            &f.db,
            assignment.id,
            f.student.profile_id.unwrap(),
            "uploads/lab1.pdf",
        )
        .await?;

        assert_eq!(submissions(&f.db, &f.teacher, assignment.id).await?.len(), 1);
        let result = submissions(&f.db, &f.other_teacher, assignment.id).await;
        assert!(matches!(result, Err(Error::NotInstructor { .. })));
        Ok(())
    }
}
