mod insight_handler;

pub use insight_handler::*;
