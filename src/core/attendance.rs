//! Attendance marks and the derived attendance percentage on each enrollment.

use crate::{
    core::grading::round_two_decimals,
    entities::{Attendance, Enrollment, attendance, enrollment},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use tracing::{debug, instrument};

/// Marks of one enrollment after an attendance update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceSummary {
    /// Enrollment the marks belong to
    pub enrollment_id: i64,
    /// Sessions marked present
    pub present: u64,
    /// Sessions marked in total
    pub total: u64,
    /// `present / total * 100`, two decimals
    pub percentage: f64,
}

/// Records whether the student attended the session on `session_date`, replacing any
/// earlier mark for that date, and recomputes the enrollment's attendance percentage.
///
/// # Errors
/// Returns `Error::EnrollmentNotFound` if the enrollment does not exist.
#[instrument(skip(db))]
pub async fn mark_attendance(
    db: &DatabaseConnection,
    enrollment_id: i64,
    session_date: Date,
    present: bool,
) -> Result<AttendanceSummary> {
    let txn = db.begin().await?;

    let enrollment = Enrollment::find_by_id(enrollment_id)
        .one(&txn)
        .await?
        .ok_or(Error::EnrollmentNotFound { id: enrollment_id })?;

    let existing = Attendance::find()
        .filter(attendance::Column::EnrollmentId.eq(enrollment_id))
        .filter(attendance::Column::SessionDate.eq(session_date))
        .one(&txn)
        .await?;
    match existing {
        Some(mark) => {
            let mut active: attendance::ActiveModel = mark.into();
            active.present = Set(present);
            active.update(&txn).await?;
        }
        None => {
            attendance::ActiveModel {
                enrollment_id: Set(enrollment_id),
                session_date: Set(session_date),
                present: Set(present),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }
    }

    let marks = Attendance::find().filter(attendance::Column::EnrollmentId.eq(enrollment_id));
    let total = marks.clone().count(&txn).await?;
    let attended = marks
        .filter(attendance::Column::Present.eq(true))
        .count(&txn)
        .await?;
    #[allow(clippy::cast_precision_loss)]
    let percentage = if total == 0 {
        0.0
    } else {
        round_two_decimals(attended as f64 / total as f64 * 100.0)
    };

    let mut active: enrollment::ActiveModel = enrollment.into();
    active.attendance_percentage = Set(Some(percentage));
    active.update(&txn).await?;

    txn.commit().await?;
    debug!("Enrollment {enrollment_id} attendance now {percentage}% ({attended}/{total})");

    Ok(AttendanceSummary {
        enrollment_id,
        present: attended,
        total,
        percentage,
    })
}

/// All marks of an enrollment, by session date.
pub async fn attendance_for_enrollment(
    db: &DatabaseConnection,
    enrollment_id: i64,
) -> Result<Vec<attendance::Model>> {
    Attendance::find()
        .filter(attendance::Column::EnrollmentId.eq(enrollment_id))
        .order_by_asc(attendance::Column::SessionDate)
        .all(db)
        .await
        .map_err(Into::into)
}
