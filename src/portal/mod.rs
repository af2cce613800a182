//! Portal layer - Role-gated operations behind the Admin, Faculty and Student pages.
//!
//! Routing, templates and session cookies live outside this crate. A request handler
//! resolves the signed-in account into an [`Actor`], calls one operation here and
//! turns the outcome into a [`Flash`] for the next page.

/// Admin operations
pub mod admin;
/// Faculty operations
pub mod faculty;
/// Feedback messages
pub mod flash;
/// Mailbox operations for every role
pub mod mailbox;
/// Signed-in identity
pub mod session;
/// Student operations
pub mod student;

pub use flash::{Flash, FlashLevel};
pub use session::Actor;
