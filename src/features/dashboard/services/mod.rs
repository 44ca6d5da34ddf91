mod dashboard_service;

pub use dashboard_service::{CategoryCounts, DashboardService, StatusCounts};
