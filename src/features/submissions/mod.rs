//! Citizen submissions: photo drafts, keyword fingerprints and duplicate
//! adjudication.

pub mod adjudication;
pub mod dtos;
pub mod fingerprint;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use services::SubmissionService;
