pub mod auth;
pub mod dashboard;
pub mod insights;
pub mod notifications;
pub mod reports;
pub mod submissions;
pub mod users;
