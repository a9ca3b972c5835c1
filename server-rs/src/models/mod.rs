pub mod draft;
pub mod league;
pub mod notification;
pub mod organization;
pub mod pagination;
pub mod sport;
pub mod submission;
pub mod user;
pub mod venue;

pub use draft::*;
pub use league::*;
pub use notification::*;
pub use organization::*;
pub use pagination::*;
pub use sport::*;
pub use submission::*;
pub use user::*;
pub use venue::*;

/// Raised when a stored enum column holds an unknown value.
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} value {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}
