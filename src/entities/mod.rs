//! Entity module - Contains all SeaORM entity definitions for the database.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod assignment;
pub mod attendance;
pub mod course;
pub mod enrollment;
pub mod faculty;
pub mod message;
pub mod notification;
pub mod student;
pub mod submission;
pub mod user;

// Re-export specific types to avoid conflicts
pub use assignment::{Column as AssignmentColumn, Entity as Assignment, Model as AssignmentModel};
pub use attendance::{Column as AttendanceColumn, Entity as Attendance, Model as AttendanceModel};
pub use course::{Column as CourseColumn, Entity as Course, Model as CourseModel};
pub use enrollment::{
    Column as EnrollmentColumn, Entity as Enrollment, Grade, Model as EnrollmentModel,
};
pub use faculty::{Column as FacultyColumn, Entity as Faculty, Model as FacultyModel};
pub use message::{Column as MessageColumn, Entity as Message, Model as MessageModel};
pub use notification::{
    Column as NotificationColumn, Entity as Notification, Model as NotificationModel,
};
pub use student::{Column as StudentColumn, Entity as Student, Model as StudentModel};
pub use submission::{Column as SubmissionColumn, Entity as Submission, Model as SubmissionModel};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel, Role};
