pub mod auth;
pub mod health;
pub mod leagues;
pub mod notifications;
pub mod organizations;
pub mod sports;
pub mod venues;
