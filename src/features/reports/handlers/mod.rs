pub mod authority_handler;
pub mod report_handler;
