//! GPA calculation over recorded letter grades.

use crate::{
    entities::{Enrollment, Grade, enrollment},
    errors::Result,
};
use sea_orm::{QuerySelect, prelude::*};

/// Grade points for a letter grade.
///
/// The scale has three buckets: A is 4.0, B is 3.0 and every other grade is 2.0.
#[must_use]
pub const fn grade_points(grade: Grade) -> f64 {
    match grade {
        Grade::A => 4.0,
        Grade::B => 3.0,
        Grade::C | Grade::D | Grade::F => 2.0,
    }
}

/// Mean grade points of the graded entries, rounded to two decimals.
///
/// Ungraded entries count toward neither the sum nor the count; with no graded
/// entries the GPA is 0.0.
#[must_use]
pub fn gpa_from_grades(grades: &[Option<Grade>]) -> f64 {
    let points: Vec<f64> = grades.iter().flatten().map(|g| grade_points(*g)).collect();
    if points.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let mean = points.iter().sum::<f64>() / points.len() as f64;
    round_two_decimals(mean)
}

pub(crate) fn round_two_decimals(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// GPA of a student over all of their enrollments.
pub async fn compute_gpa(db: &DatabaseConnection, student_id: i64) -> Result<f64> {
    let grades: Vec<Option<Grade>> = Enrollment::find()
        .select_only()
        .column(enrollment::Column::Grade)
        .filter(enrollment::Column::StudentId.eq(student_id))
        .into_tuple()
        .all(db)
        .await?;
    Ok(gpa_from_grades(&grades))
}
