pub mod application_dto;
pub mod assignment_dto;
pub mod auth_dto;
pub mod job_dto;
