pub mod access;
pub mod broadcast;
pub mod clerk_service;
pub mod drafts;
pub mod leagues;
pub mod notifications;
pub mod organizations;
pub mod review;
pub mod sports;
pub mod users;
pub mod venues;
