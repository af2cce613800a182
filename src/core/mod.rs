//! Core business logic, independent of any user interface.
//!
//! Every operation takes the database connection explicitly and returns
//! [`crate::errors::Result`]. The portal layer decides who may call what.

pub mod attendance;
pub mod catalog;
pub mod coursework;
pub mod dashboard;
pub mod directory;
pub mod enrollment;
pub mod grading;
pub mod messaging;
pub mod notification;
