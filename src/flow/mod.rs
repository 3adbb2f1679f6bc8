//! Request/response cycles driven by the UI.
//!
//! Each coordinator is Idle until a submission passes validation, Busy while
//! its request is in flight, and Idle again once the completion event is
//! applied, whatever the outcome. Coordinators never talk to each other; they
//! read and write the [`Session`](crate::session::Session) lent to them.

pub mod ask;
pub mod status;
pub mod upload;

pub use ask::QuestionCoordinator;
pub use status::StatusBootstrapper;
pub use upload::UploadCoordinator;

fn error_text(error: Option<String>, fallback: &str) -> String {
    let error = error
        .filter(|error| !error.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string());
    format!("Error: {error}")
}
