//! Enrollment ledger - Enroll, drop and grade.
//!
//! The ledger owns the `enrollments` table and the `enrolled_count` counter on each
//! course. Every write that touches both runs inside one database transaction:
//! inserting a row always increments the counter and deleting a row always
//! decrements it, so the counter only drifts if rows are changed behind the
//! ledger's back (see [`audit_enrolled_counts`]).
//!
//! Uniqueness of the (student, course) pair is checked up front for a friendly
//! error, and backed by a unique index for callers that race past the check.

use crate::{
    core::directory,
    entities::{Attendance, Course, Enrollment, Grade, Student, attendance, course, enrollment},
    errors::{Error, Result, is_unique_violation},
};
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

/// Result of [`record_grade`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeUpdate {
    /// The enrollment now carries the new grade
    Updated,
    /// No enrollment exists for the pair; nothing was written
    NoEnrollment,
}

/// One row of the admin manage-enrollments table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrollmentRow {
    /// Enrollment id, used by the drop action
    pub enrollment_id: i64,
    /// Student profile id
    pub student_id: i64,
    /// Student display name
    pub student_name: String,
    /// Student email
    pub student_email: String,
    /// Course id
    pub course_id: i64,
    /// Course catalog code
    pub course_code: String,
    /// Course title
    pub course_name: String,
    /// Recorded grade, if any
    pub grade: Option<Grade>,
}

/// A course whose counter disagrees with its live enrollment rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterDrift {
    /// Course id
    pub course_id: i64,
    /// Course catalog code
    pub course_code: String,
    /// Value of `enrolled_count`
    pub recorded: i32,
    /// Number of enrollment rows
    pub actual: u64,
}

async fn find_pair<C: ConnectionTrait>(
    db: &C,
    student_id: i64,
    course_id: i64,
) -> Result<Option<enrollment::Model>> {
    Enrollment::find()
        .filter(enrollment::Column::StudentId.eq(student_id))
        .filter(enrollment::Column::CourseId.eq(course_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Moves a course's `enrolled_count` by `delta` with a single UPDATE.
///
/// Decrements only apply while the counter can absorb them, so the counter never
/// goes below zero.
async fn adjust_enrolled_count<C: ConnectionTrait>(
    db: &C,
    course_id: i64,
    delta: i32,
) -> Result<()> {
    let mut update = Course::update_many()
        .col_expr(
            course::Column::EnrolledCount,
            Expr::col(course::Column::EnrolledCount).add(delta),
        )
        .filter(course::Column::Id.eq(course_id));
    if delta < 0 {
        update = update.filter(course::Column::EnrolledCount.gte(-delta));
    }

    let result = update.exec(db).await?;
    if result.rows_affected == 0 {
        warn!("Enrolled counter for course {course_id} not adjusted by {delta}");
    }
    Ok(())
}

/// Enrolls a student in a course and increments the course counter.
///
/// The insert and the counter update commit together. A concurrent enroll of the
/// same pair that slips past the existence check is stopped by the unique index and
/// reported as `AlreadyEnrolled` as well.
///
/// Capacity is not checked; see [`crate::core::catalog::seats_remaining`].
///
/// # Errors
/// * `Error::StudentNotFound` / `Error::CourseNotFound` for unknown ids
/// * `Error::AlreadyEnrolled` if the pair already has an enrollment
#[instrument(skip(db))]
pub async fn enroll(
    db: &DatabaseConnection,
    student_id: i64,
    course_id: i64,
) -> Result<enrollment::Model> {
    Student::find_by_id(student_id)
        .one(db)
        .await?
        .ok_or(Error::StudentNotFound { id: student_id })?;
    Course::find_by_id(course_id)
        .one(db)
        .await?
        .ok_or(Error::CourseNotFound { id: course_id })?;

    if find_pair(db, student_id, course_id).await?.is_some() {
        debug!("Student {student_id} already enrolled in course {course_id}");
        return Err(Error::AlreadyEnrolled {
            student_id,
            course_id,
        });
    }

    let txn = db.begin().await?;

    let enrollment = enrollment::ActiveModel {
        student_id: Set(student_id),
        course_id: Set(course_id),
        grade: Set(None),
        attendance_percentage: Set(None),
        enrolled_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            Error::AlreadyEnrolled {
                student_id,
                course_id,
            }
        } else {
            e.into()
        }
    })?;

    adjust_enrolled_count(&txn, course_id, 1).await?;
    txn.commit().await?;

    info!(
        "Enrolled student {student_id} in course {course_id} (enrollment {})",
        enrollment.id
    );
    Ok(enrollment)
}

async fn delete_enrollment<C: ConnectionTrait>(db: &C, enrollment: &enrollment::Model) -> Result<()> {
    Attendance::delete_many()
        .filter(attendance::Column::EnrollmentId.eq(enrollment.id))
        .exec(db)
        .await?;

    let deleted = Enrollment::delete_by_id(enrollment.id).exec(db).await?;
    if deleted.rows_affected == 0 {
        return Err(Error::EnrollmentNotFound { id: enrollment.id });
    }

    adjust_enrolled_count(db, enrollment.course_id, -1).await
}

/// Drops an enrollment by id and decrements the course counter.
///
/// Returns the removed row. Attendance marks of the enrollment go with it.
///
/// # Errors
/// Returns `Error::EnrollmentNotFound` if the enrollment does not exist, including
/// when another caller dropped it first.
#[instrument(skip(db))]
pub async fn drop_enrollment(
    db: &DatabaseConnection,
    enrollment_id: i64,
) -> Result<enrollment::Model> {
    let txn = db.begin().await?;

    let enrollment = Enrollment::find_by_id(enrollment_id)
        .one(&txn)
        .await?
        .ok_or(Error::EnrollmentNotFound { id: enrollment_id })?;
    delete_enrollment(&txn, &enrollment).await?;

    txn.commit().await?;
    info!(
        "Dropped enrollment {enrollment_id} (student {}, course {})",
        enrollment.student_id, enrollment.course_id
    );
    Ok(enrollment)
}

/// Drops the enrollment of a student in a course.
///
/// # Errors
/// Returns `Error::NotEnrolled` if the student is not enrolled in the course.
#[instrument(skip(db))]
pub async fn drop_pair(
    db: &DatabaseConnection,
    student_id: i64,
    course_id: i64,
) -> Result<enrollment::Model> {
    let txn = db.begin().await?;

    let enrollment = find_pair(&txn, student_id, course_id)
        .await?
        .ok_or(Error::NotEnrolled {
            student_id,
            course_id,
        })?;
    delete_enrollment(&txn, &enrollment).await?;

    txn.commit().await?;
    info!("Dropped student {student_id} from course {course_id}");
    Ok(enrollment)
}

/// Records a grade for a student in a course, replacing any earlier grade.
///
/// A pair without an enrollment is not an error: nothing is written and
/// `GradeUpdate::NoEnrollment` is returned.
#[instrument(skip(db))]
pub async fn record_grade(
    db: &DatabaseConnection,
    student_id: i64,
    course_id: i64,
    grade: Grade,
) -> Result<GradeUpdate> {
    set_grade(db, student_id, course_id, Some(grade)).await
}

/// Removes the grade of a student in a course.
pub async fn clear_grade(
    db: &DatabaseConnection,
    student_id: i64,
    course_id: i64,
) -> Result<GradeUpdate> {
    set_grade(db, student_id, course_id, None).await
}

async fn set_grade(
    db: &DatabaseConnection,
    student_id: i64,
    course_id: i64,
    grade: Option<Grade>,
) -> Result<GradeUpdate> {
    let result = Enrollment::update_many()
        .set(enrollment::ActiveModel {
            grade: Set(grade),
            ..Default::default()
        })
        .filter(enrollment::Column::StudentId.eq(student_id))
        .filter(enrollment::Column::CourseId.eq(course_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        warn!("No enrollment for student {student_id} in course {course_id}; grade not recorded");
        Ok(GradeUpdate::NoEnrollment)
    } else {
        Ok(GradeUpdate::Updated)
    }
}

/// Gets an enrollment by id.
pub async fn get_enrollment(
    db: &DatabaseConnection,
    enrollment_id: i64,
) -> Result<Option<enrollment::Model>> {
    Enrollment::find_by_id(enrollment_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Gets the enrollment of a student in a course.
pub async fn get_enrollment_for_pair(
    db: &DatabaseConnection,
    student_id: i64,
    course_id: i64,
) -> Result<Option<enrollment::Model>> {
    find_pair(db, student_id, course_id).await
}

/// All enrollments of a student, oldest first.
pub async fn enrollments_for_student(
    db: &DatabaseConnection,
    student_id: i64,
) -> Result<Vec<enrollment::Model>> {
    Enrollment::find()
        .filter(enrollment::Column::StudentId.eq(student_id))
        .order_by_asc(enrollment::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// All enrollments in a course, oldest first.
pub async fn enrollments_for_course(
    db: &DatabaseConnection,
    course_id: i64,
) -> Result<Vec<enrollment::Model>> {
    Enrollment::find()
        .filter(enrollment::Column::CourseId.eq(course_id))
        .order_by_asc(enrollment::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Number of enrollment rows in the whole ledger.
pub async fn count_enrollments(db: &DatabaseConnection) -> Result<u64> {
    Enrollment::find().count(db).await.map_err(Into::into)
}

/// Every enrollment joined with its student account and course, ordered by
/// course code and then student name.
pub async fn list_enrollment_rows(db: &DatabaseConnection) -> Result<Vec<EnrollmentRow>> {
    let enrollments = Enrollment::find()
        .order_by_asc(enrollment::Column::Id)
        .all(db)
        .await?;

    let courses: HashMap<i64, course::Model> = Course::find()
        .filter(course::Column::Id.is_in(enrollments.iter().map(|e| e.course_id)))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();
    let students =
        directory::student_accounts(db, enrollments.iter().map(|e| e.student_id).collect())
            .await?;

    let mut rows: Vec<EnrollmentRow> = enrollments
        .into_iter()
        .filter_map(|e| {
            let course = courses.get(&e.course_id)?;
            let student = students.get(&e.student_id)?;
            Some(EnrollmentRow {
                enrollment_id: e.id,
                student_id: e.student_id,
                student_name: student.name.clone(),
                student_email: student.email.clone(),
                course_id: course.id,
                course_code: course.code.clone(),
                course_name: course.name.clone(),
                grade: e.grade,
            })
        })
        .collect();
    rows.sort_by(|a, b| {
        a.course_code
            .cmp(&b.course_code)
            .then_with(|| a.student_name.cmp(&b.student_name))
            .then_with(|| a.enrollment_id.cmp(&b.enrollment_id))
    });
    Ok(rows)
}

/// Compares every course counter with its live enrollment rows. Read-only.
pub async fn audit_enrolled_counts(db: &DatabaseConnection) -> Result<Vec<CounterDrift>> {
    let live: HashMap<i64, u64> = Enrollment::find()
        .select_only()
        .column(enrollment::Column::CourseId)
        .column_as(Expr::col(enrollment::Column::Id).count(), "live")
        .group_by(enrollment::Column::CourseId)
        .into_tuple::<(i64, i64)>()
        .all(db)
        .await?
        .into_iter()
        .map(|(course_id, count)| (course_id, u64::try_from(count).unwrap_or_default()))
        .collect();

    let courses = Course::find()
        .order_by_asc(course::Column::Code)
        .all(db)
        .await?;

    let mut drifts = Vec::new();
    for course in courses {
        let actual = live.get(&course.id).copied().unwrap_or_default();
        if u64::try_from(course.enrolled_count).ok() != Some(actual) {
            warn!(
                "Course {} counter is {} but has {actual} enrollments",
                course.code, course.enrolled_count
            );
            drifts.push(CounterDrift {
                course_id: course.id,
                course_code: course.code,
                recorded: course.enrolled_count,
                actual,
            });
        }
    }
    Ok(drifts)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::catalog;
    use crate::test_utils::*;

    async fn counter(db: &DatabaseConnection, course_id: i64) -> Result<i32> {
        Ok(catalog::get_course(db, course_id)
            .await?
            .unwrap()
            .enrolled_count)
    }

    #[tokio::test]
    async fn test_enroll_twice_rejected() -> Result<()> {
        let (db, student, course) = setup_with_student_and_course().await?;

        let enrollment = enroll(&db, student, course.id).await?;
        assert_eq!(enrollment.student_id, student);
        assert!(enrollment.grade.is_none());

        let second = enroll(&db, student, course.id).await;
        assert!(matches!(
            second,
            Err(Error::AlreadyEnrolled { student_id, course_id })
                if student_id == student && course_id == course.id
        ));

        assert_eq!(enrollments_for_course(&db, course.id).await?.len(), 1);
        assert_eq!(counter(&db, course.id).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_enroll_unknown_student_or_course() -> Result<()> {
        let (db, student, course) = setup_with_student_and_course().await?;

        let result = enroll(&db, 999, course.id).await;
        assert!(matches!(result, Err(Error::StudentNotFound { id: 999 })));

        let result = enroll(&db, student, 999).await;
        assert!(matches!(result, Err(Error::CourseNotFound { id: 999 })));

        assert_eq!(counter(&db, course.id).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_drop_restores_previous_state() -> Result<()> {
        let (db, student, course) = setup_with_student_and_course().await?;
        let before_rows = enrollments_for_course(&db, course.id).await?;
        let before_count = counter(&db, course.id).await?;

        let enrollment = enroll(&db, student, course.id).await?;
        let dropped = drop_enrollment(&db, enrollment.id).await?;
        assert_eq!(dropped.id, enrollment.id);

        assert_eq!(enrollments_for_course(&db, course.id).await?, before_rows);
        assert_eq!(counter(&db, course.id).await?, before_count);
        Ok(())
    }

    #[tokio::test]
    async fn test_drop_twice_reports_not_found() -> Result<()> {
        let (db, student, course) = setup_with_student_and_course().await?;
        let enrollment = enroll(&db, student, course.id).await?;

        drop_enrollment(&db, enrollment.id).await?;
        let second = drop_enrollment(&db, enrollment.id).await;
        assert!(matches!(second, Err(Error::EnrollmentNotFound { id }) if id == enrollment.id));
        assert_eq!(counter(&db, course.id).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_drop_pair() -> Result<()> {
        let (db, student, course) = setup_with_student_and_course().await?;

        let result = drop_pair(&db, student, course.id).await;
        assert!(matches!(result, Err(Error::NotEnrolled { .. })));

        enroll(&db, student, course.id).await?;
        drop_pair(&db, student, course.id).await?;
        assert!(get_enrollment_for_pair(&db, student, course.id).await?.is_none());
        assert_eq!(counter(&db, course.id).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_counter_never_goes_negative() -> Result<()> {
        let (db, student, course) = setup_with_student_and_course().await?;
        let enrollment = enroll(&db, student, course.id).await?;

        // Counter reset behind the ledger's back
        let mut active: course::ActiveModel = catalog::get_course(&db, course.id)
            .await?
            .unwrap()
            .into();
        active.enrolled_count = Set(0);
        active.update(&db).await?;

        drop_enrollment(&db, enrollment.id).await?;
        assert_eq!(counter(&db, course.id).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_enroll_yields_single_row() -> Result<()> {
        let (db, student, course) = setup_with_student_and_course().await?;

        let (first, second) = tokio::join!(
            enroll(&db, student, course.id),
            enroll(&db, student, course.id)
        );

        let successes = [first.is_ok(), second.is_ok()]
            .iter()
            .filter(|ok| **ok)
            .count();
        assert_eq!(successes, 1);
        let failure = if first.is_err() { first } else { second };
        assert!(matches!(failure, Err(Error::AlreadyEnrolled { .. })));

        assert_eq!(enrollments_for_course(&db, course.id).await?.len(), 1);
        assert_eq!(counter(&db, course.id).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_record_grade() -> Result<()> {
        let (db, student, course) = setup_with_student_and_course().await?;
        enroll(&db, student, course.id).await?;

        assert_eq!(
            record_grade(&db, student, course.id, Grade::B).await?,
            GradeUpdate::Updated
        );
        assert_eq!(
            record_grade(&db, student, course.id, Grade::A).await?,
            GradeUpdate::Updated
        );
        let enrollment = get_enrollment_for_pair(&db, student, course.id).await?.unwrap();
        assert_eq!(enrollment.grade, Some(Grade::A));

        assert_eq!(
            clear_grade(&db, student, course.id).await?,
            GradeUpdate::Updated
        );
        let enrollment = get_enrollment_for_pair(&db, student, course.id).await?.unwrap();
        assert!(enrollment.grade.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_record_grade_without_enrollment_is_noop() -> Result<()> {
        let (db, student, course) = setup_with_student_and_course().await?;
        let outcome = record_grade(&db, student, course.id, Grade::A).await?;
        assert_eq!(outcome, GradeUpdate::NoEnrollment);
        assert!(enrollments_for_student(&db, student).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_list_enrollment_rows() -> Result<()> {
        let db = setup_test_db().await?;
        let zara = create_test_student(&db, "Zara").await?.profile_id.unwrap();
        let bilal = create_test_student(&db, "Bilal").await?.profile_id.unwrap();
        let ma = create_test_course(&db, "MA101", None).await?;
        let cs = create_test_course(&db, "CS101", None).await?;

        enroll(&db, zara, ma.id).await?;
        enroll(&db, zara, cs.id).await?;
        enroll(&db, bilal, cs.id).await?;

        let rows = list_enrollment_rows(&db).await?;
        let summary: Vec<(&str, &str)> = rows
            .iter()
            .map(|r| (r.course_code.as_str(), r.student_name.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![("CS101", "Bilal"), ("CS101", "Zara"), ("MA101", "Zara")]
        );
        assert_eq!(count_enrollments(&db).await?, 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_audit_detects_drift() -> Result<()> {
        let (db, student, course) = setup_with_student_and_course().await?;
        enroll(&db, student, course.id).await?;
        assert!(audit_enrolled_counts(&db).await?.is_empty());

        // Row removed without going through the ledger
        Enrollment::delete_many()
            .filter(enrollment::Column::CourseId.eq(course.id))
            .exec(&db)
            .await?;

        let drifts = audit_enrolled_counts(&db).await?;
        assert_eq!(
            drifts,
            vec![CounterDrift {
                course_id: course.id,
                course_code: course.code.clone(),
                recorded: 1,
                actual: 0,
            }]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_audit_counts_each_course_separately() -> Result<()> {
        let (db, student, cs101) = setup_with_student_and_course().await?;
        let other = create_test_student(&db, "Omar").await?.profile_id.unwrap();
        let ma101 = create_test_course(&db, "MA101", None).await?;
        enroll(&db, student, cs101.id).await?;
        enroll(&db, other, cs101.id).await?;
        enroll(&db, student, ma101.id).await?;

        // Counter bumped without a matching row
        Course::update_many()
            .col_expr(course::Column::EnrolledCount, Expr::value(4))
            .filter(course::Column::Id.eq(ma101.id))
            .exec(&db)
            .await?;

        let drifts = audit_enrolled_counts(&db).await?;
        assert_eq!(drifts.len(), 1);
        assert_eq!(drifts[0].course_id, ma101.id);
        assert_eq!(drifts[0].recorded, 4);
        assert_eq!(drifts[0].actual, 1);
        Ok(())
    }
}
