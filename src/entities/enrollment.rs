//! Enrollment entity - One row per (student, course) pair.
//!
//! The pair is unique; `config::database::create_tables` backs this with a composite
//! unique index so concurrent enroll calls cannot produce duplicates.

use crate::errors::Error;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Letter grade recorded by faculty for an enrollment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(2))")]
pub enum Grade {
    /// Excellent
    #[sea_orm(string_value = "A")]
    A,
    /// Good
    #[sea_orm(string_value = "B")]
    B,
    /// Satisfactory
    #[sea_orm(string_value = "C")]
    C,
    /// Passing
    #[sea_orm(string_value = "D")]
    D,
    /// Failing
    #[sea_orm(string_value = "F")]
    F,
}

impl Grade {
    /// Letter as stored and displayed.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Grade {
    type Err = Error;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            "F" => Ok(Self::F),
            _ => Err(Error::InvalidGrade {
                value: value.to_string(),
            }),
        }
    }
}

/// Enrollment database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "enrollments")]
pub struct Model {
    /// Unique identifier for the enrollment
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Student profile id
    pub student_id: i64,
    /// Course id
    pub course_id: i64,
    /// Grade, once faculty has recorded one
    pub grade: Option<Grade>,
    /// Share of marked sessions attended, 0-100
    pub attendance_percentage: Option<f64>,
    /// When the student was enrolled
    pub enrolled_at: DateTimeUtc,
}

/// Defines relationships for Enrollment
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each enrollment belongs to one student
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id"
    )]
    Student,
    /// Each enrollment belongs to one course
    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id"
    )]
    Course,
    /// Attendance marks for this enrollment
    #[sea_orm(has_many = "super::attendance::Entity")]
    Attendance,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl Related<super::attendance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attendance.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
