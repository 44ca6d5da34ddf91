mod report_dto;

pub use report_dto::{
    DuplicateSubmissionResponseDto, ReportFilterQuery, ReportResponseDto,
    StatusUpdateResponseDto, UpdateReportStatusDto,
};
