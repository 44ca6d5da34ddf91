//! Free-text questions answered by the model over recent reports.

pub mod dtos;
pub mod handlers;
pub mod routes;
pub mod services;

pub use routes::routes;
pub use services::InsightService;
