//! Course catalog business logic.
//!
//! Courses are created by administrators and optionally assigned to a faculty
//! member. The enrollment counter on each course belongs to the ledger in
//! [`crate::core::enrollment`]; nothing in this module writes it.

use crate::{
    core::directory,
    entities::{Course, Faculty, course},
    errors::{Error, Result, is_unique_violation},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Serialize;
use tracing::info;

/// Input for [`create_course`].
#[derive(Debug, Clone)]
pub struct NewCourse {
    /// Catalog code, e.g. "CS101"
    pub code: String,
    /// Course title
    pub name: String,
    /// Credit hours, must be positive
    pub credits: i32,
    /// Meeting room
    pub room: Option<String>,
    /// Seats offered, must not be negative
    pub capacity: i32,
    /// Faculty profile teaching the course
    pub faculty_id: Option<i64>,
}

/// A course with the name of whoever teaches it, as shown in catalog listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseListing {
    /// The course row
    pub course: course::Model,
    /// Instructor display name, if a faculty member is assigned
    pub faculty_name: Option<String>,
}

/// Creates a course, validating the input and the assigned faculty member.
///
/// Codes are trimmed and uppercased before storage.
///
/// # Errors
/// * `Error::InvalidInput` for an empty code or name, non-positive credits or negative capacity
/// * `Error::FacultyNotFound` if `faculty_id` names no faculty profile
/// * `Error::DuplicateCourseCode` if the code is taken
pub async fn create_course(db: &DatabaseConnection, new_course: NewCourse) -> Result<course::Model> {
    let code = new_course.code.trim().to_uppercase();
    if code.is_empty() {
        return Err(Error::InvalidInput {
            message: "Course code cannot be empty".to_string(),
        });
    }
    if new_course.name.trim().is_empty() {
        return Err(Error::InvalidInput {
            message: "Course name cannot be empty".to_string(),
        });
    }
    if new_course.credits <= 0 {
        return Err(Error::InvalidInput {
            message: format!("Credits must be positive, got {}", new_course.credits),
        });
    }
    if new_course.capacity < 0 {
        return Err(Error::InvalidInput {
            message: format!("Capacity cannot be negative, got {}", new_course.capacity),
        });
    }

    if let Some(faculty_id) = new_course.faculty_id {
        directory::get_faculty(db, faculty_id)
            .await?
            .ok_or(Error::FacultyNotFound { id: faculty_id })?;
    }

    if get_course_by_code(db, &code).await?.is_some() {
        return Err(Error::DuplicateCourseCode { code });
    }

    let course = course::ActiveModel {
        code: Set(code.clone()),
        name: Set(new_course.name.trim().to_string()),
        credits: Set(new_course.credits),
        room: Set(new_course
            .room
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())),
        capacity: Set(new_course.capacity),
        enrolled_count: Set(0),
        faculty_id: Set(new_course.faculty_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            Error::DuplicateCourseCode { code: code.clone() }
        } else {
            e.into()
        }
    })?;

    info!("Created course {} ({})", course.code, course.id);
    Ok(course)
}

/// Gets a course by id.
pub async fn get_course(db: &DatabaseConnection, course_id: i64) -> Result<Option<course::Model>> {
    Course::find_by_id(course_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Gets a course by its catalog code (case-insensitive).
pub async fn get_course_by_code(
    db: &DatabaseConnection,
    code: &str,
) -> Result<Option<course::Model>> {
    Course::find()
        .filter(course::Column::Code.eq(code.trim().to_uppercase()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// All courses ordered by code.
pub async fn list_courses(db: &DatabaseConnection) -> Result<Vec<course::Model>> {
    Course::find()
        .order_by_asc(course::Column::Code)
        .all(db)
        .await
        .map_err(Into::into)
}

/// All courses with their instructor names, ordered by code.
pub async fn list_courses_with_faculty(db: &DatabaseConnection) -> Result<Vec<CourseListing>> {
    let courses = list_courses(db).await?;
    let faculty_ids = courses.iter().filter_map(|c| c.faculty_id).collect();
    let instructors = directory::faculty_accounts(db, faculty_ids).await?;

    Ok(courses
        .into_iter()
        .map(|course| {
            let faculty_name = course
                .faculty_id
                .and_then(|id| instructors.get(&id))
                .map(|u| u.name.clone());
            CourseListing {
                course,
                faculty_name,
            }
        })
        .collect())
}

/// Courses taught by a faculty member, ordered by code.
pub async fn courses_for_faculty(
    db: &DatabaseConnection,
    faculty_id: i64,
) -> Result<Vec<course::Model>> {
    Course::find()
        .filter(course::Column::FacultyId.eq(faculty_id))
        .order_by_asc(course::Column::Code)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Assigns (or with `None`, unassigns) the instructor of a course.
pub async fn assign_faculty(
    db: &DatabaseConnection,
    course_id: i64,
    faculty_id: Option<i64>,
) -> Result<course::Model> {
    let course = get_course(db, course_id)
        .await?
        .ok_or(Error::CourseNotFound { id: course_id })?;

    if let Some(id) = faculty_id {
        Faculty::find_by_id(id)
            .one(db)
            .await?
            .ok_or(Error::FacultyNotFound { id })?;
    }

    let mut active: course::ActiveModel = course.into();
    active.faculty_id = Set(faculty_id);
    active.update(db).await.map_err(Into::into)
}

/// Number of courses in the catalog.
pub async fn count_courses(db: &DatabaseConnection) -> Result<u64> {
    Course::find().count(db).await.map_err(Into::into)
}

/// Seats still open according to the enrollment counter. Never negative.
///
/// Capacity is informational: enrolling is not refused when this reaches zero.
#[must_use]
pub fn seats_remaining(course: &course::Model) -> i32 {
    (course.capacity - course.enrolled_count).max(0)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn course_input(code: &str) -> NewCourse {
        NewCourse {
            code: code.to_string(),
            name: "Data Structures".to_string(),
            credits: 3,
            room: Some("Lab 2".to_string()),
            capacity: 30,
            faculty_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_course_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_course(&db, course_input("  ")).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));

        let mut input = course_input("CS201");
        input.credits = 0;
        let result = create_course(&db, input).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));

        let mut input = course_input("CS201");
        input.capacity = -1;
        let result = create_course(&db, input).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_course_normalizes_code() -> Result<()> {
        let db = setup_test_db().await?;
        let course = create_course(&db, course_input(" cs201 ")).await?;
        assert_eq!(course.code, "CS201");
        assert_eq!(course.enrolled_count, 0);
        assert!(get_course_by_code(&db, "cs201").await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_course_code() -> Result<()> {
        let db = setup_test_db().await?;
        create_course(&db, course_input("CS201")).await?;
        let result = create_course(&db, course_input("cs201")).await;
        assert!(matches!(result, Err(Error::DuplicateCourseCode { code }) if code == "CS201"));
        assert_eq!(count_courses(&db).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_course_unknown_faculty() -> Result<()> {
        let db = setup_test_db().await?;
        let mut input = course_input("CS201");
        input.faculty_id = Some(99);
        let result = create_course(&db, input).await;
        assert!(matches!(result, Err(Error::FacultyNotFound { id: 99 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_listing_includes_faculty_name() -> Result<()> {
        let db = setup_test_db().await?;
        let teacher = create_test_faculty(&db, "Ali Raza").await?;
        let taught = create_test_course(&db, "CS101", teacher.profile_id).await?;
        create_test_course(&db, "MA101", None).await?;

        let listings = list_courses_with_faculty(&db).await?;
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].course.id, taught.id);
        assert_eq!(listings[0].faculty_name.as_deref(), Some("Ali Raza"));
        assert!(listings[1].faculty_name.is_none());

        let mine = courses_for_faculty(&db, teacher.profile_id.unwrap()).await?;
        assert_eq!(mine, vec![taught]);
        Ok(())
    }

    #[tokio::test]
    async fn test_assign_faculty() -> Result<()> {
        let db = setup_test_db().await?;
        let teacher = create_test_faculty(&db, "Ali Raza").await?;
        let course = create_test_course(&db, "CS101", None).await?;

        let updated = assign_faculty(&db, course.id, teacher.profile_id).await?;
        assert_eq!(updated.faculty_id, teacher.profile_id);

        let cleared = assign_faculty(&db, course.id, None).await?;
        assert!(cleared.faculty_id.is_none());

        let result = assign_faculty(&db, course.id, Some(1234)).await;
        assert!(matches!(result, Err(Error::FacultyNotFound { id: 1234 })));
        Ok(())
    }

    #[test]
    fn test_seats_remaining_never_negative() {
        let mut course = course::Model {
            id: 1,
            code: "CS101".to_string(),
            name: "Intro".to_string(),
            credits: 3,
            room: None,
            capacity: 2,
            enrolled_count: 1,
            faculty_id: None,
        };
        assert_eq!(seats_remaining(&course), 1);
        course.enrolled_count = 5;
        assert_eq!(seats_remaining(&course), 0);
    }
}
