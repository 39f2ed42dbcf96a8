pub mod application;
pub mod assignment;
pub mod interview;
pub mod job;
pub mod question;
pub mod user;
