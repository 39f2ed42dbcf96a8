pub mod application_service;
pub mod assignment_service;
pub mod auth_service;
pub mod interview_service;
pub mod job_service;
pub mod question_source;
