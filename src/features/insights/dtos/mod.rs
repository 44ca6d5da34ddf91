mod insight_dto;

pub use insight_dto::{InsightQueryDto, InsightResponseDto};
