pub mod geocoding;
pub mod llm;
pub mod storage;
