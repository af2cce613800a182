//! Dashboard aggregation - Read-only summaries for the three portals.

use crate::{
    core::{
        catalog, coursework,
        directory::{self, Identity},
        enrollment, grading, messaging, notification,
    },
    entities::{Grade, Role, assignment, course, notification as notification_entity},
    errors::{Error, Result},
};
use sea_orm::{DatabaseConnection, prelude::Date};
use serde::Serialize;
use std::collections::HashMap;

/// Headline counts on the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdminStats {
    /// Student accounts
    pub students: u64,
    /// Faculty accounts
    pub faculty: u64,
    /// Courses in the catalog
    pub courses: u64,
    /// Enrollment rows across all courses
    pub enrollments: u64,
}

/// What a student sees after signing in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentDashboard {
    /// Courses the student is enrolled in
    pub enrolled_courses: usize,
    /// Upcoming assignments not handed in yet
    pub assignments_due: usize,
    /// See [`crate::core::grading::compute_gpa`]
    pub gpa: f64,
    /// Unread messages in the inbox
    pub unread_messages: u64,
    /// Latest notifications, newest first
    pub announcements: Vec<notification_entity::Model>,
}

/// One student on a course roster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterEntry {
    /// Enrollment the entry was built from
    pub enrollment_id: i64,
    /// Student profile id
    pub student_id: i64,
    /// Student's display name
    pub name: String,
    /// Student's email
    pub email: String,
    /// Recorded grade, if any
    pub grade: Option<Grade>,
    /// Attendance so far, if any session was marked
    pub attendance_percentage: Option<f64>,
}

/// A course taught by a faculty member with everyone enrolled in it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseRoster {
    /// The course
    pub course: course::Model,
    /// Ordered by student name
    pub students: Vec<RosterEntry>,
}

/// An assignment and whether the student has handed it in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentStatus {
    /// The assignment
    pub assignment: assignment::Model,
    /// Whether a submission exists
    pub submitted: bool,
}

/// A student's standing in one course.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseProgress {
    /// The course
    pub course: course::Model,
    /// Name of the assigned faculty member
    pub instructor: Option<String>,
    /// Recorded grade, if any
    pub grade: Option<Grade>,
    /// Attendance so far, if any session was marked
    pub attendance_percentage: Option<f64>,
    /// Coursework ordered by deadline
    pub assignments: Vec<AssignmentStatus>,
}

const ANNOUNCEMENT_COUNT: u64 = 3;

/// Counts for the admin dashboard.
pub async fn admin_stats(db: &DatabaseConnection) -> Result<AdminStats> {
    Ok(AdminStats {
        students: directory::count_by_role(db, Role::Student).await?,
        faculty: directory::count_by_role(db, Role::Faculty).await?,
        courses: catalog::count_courses(db).await?,
        enrollments: enrollment::count_enrollments(db).await?,
    })
}

/// Builds the student dashboard for a signed-in student.
///
/// # Errors
/// Returns `Error::ProfileMissing` if the account has no student profile.
pub async fn student_dashboard(
    db: &DatabaseConnection,
    student: &Identity,
    today: Date,
) -> Result<StudentDashboard> {
    let student_id = match (student.role, student.profile_id) {
        (Role::Student, Some(id)) => id,
        _ => {
            return Err(Error::ProfileMissing {
                user_id: student.user_id,
                role: Role::Student,
            });
        }
    };

    Ok(StudentDashboard {
        enrolled_courses: enrollment::enrollments_for_student(db, student_id)
            .await?
            .len(),
        assignments_due: coursework::assignments_due_count(db, student_id, today).await?,
        gpa: grading::compute_gpa(db, student_id).await?,
        unread_messages: messaging::unread_count(db, student).await?,
        announcements: notification::latest_notifications(
            db,
            student.user_id,
            ANNOUNCEMENT_COUNT,
        )
        .await?,
    })
}

/// Rosters of every course a faculty member teaches, ordered by course code.
pub async fn faculty_rosters(db: &DatabaseConnection, faculty_id: i64) -> Result<Vec<CourseRoster>> {
    let courses = catalog::courses_for_faculty(db, faculty_id).await?;

    let mut rosters = Vec::with_capacity(courses.len());
    for course in courses {
        let enrollments = enrollment::enrollments_for_course(db, course.id).await?;
        let accounts =
            directory::student_accounts(db, enrollments.iter().map(|e| e.student_id).collect())
                .await?;

        let mut students: Vec<RosterEntry> = enrollments
            .into_iter()
            .filter_map(|e| {
                let account = accounts.get(&e.student_id)?;
                Some(RosterEntry {
                    enrollment_id: e.id,
                    student_id: e.student_id,
                    name: account.name.clone(),
                    email: account.email.clone(),
                    grade: e.grade,
                    attendance_percentage: e.attendance_percentage,
                })
            })
            .collect();
        students.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.student_id.cmp(&b.student_id)));

        rosters.push(CourseRoster { course, students });
    }
    Ok(rosters)
}

/// Every course a student is enrolled in with grade, attendance, instructor and
/// coursework status, ordered by course code.
pub async fn student_courses(db: &DatabaseConnection, student_id: i64) -> Result<Vec<CourseProgress>> {
    let enrollments = enrollment::enrollments_for_student(db, student_id).await?;
    let listings: HashMap<i64, catalog::CourseListing> = catalog::list_courses_with_faculty(db)
        .await?
        .into_iter()
        .map(|l| (l.course.id, l))
        .collect();
    let submitted = coursework::submitted_assignment_ids(db, student_id).await?;

    let mut progress = Vec::with_capacity(enrollments.len());
    for enrollment in enrollments {
        let Some(listing) = listings.get(&enrollment.course_id) else {
            continue;
        };
        let assignments = coursework::assignments_for_course(db, enrollment.course_id)
            .await?
            .into_iter()
            .map(|assignment| AssignmentStatus {
                submitted: submitted.contains(&assignment.id),
                assignment,
            })
            .collect();

        progress.push(CourseProgress {
            course: listing.course.clone(),
            instructor: listing.faculty_name.clone(),
            grade: enrollment.grade,
            attendance_percentage: enrollment.attendance_percentage,
            assignments,
        });
    }
    progress.sort_by(|a, b| a.course.code.cmp(&b.course.code));
    Ok(progress)
}
