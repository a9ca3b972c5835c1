pub mod admin;
pub mod auth;

pub use admin::*;
pub use auth::*;
