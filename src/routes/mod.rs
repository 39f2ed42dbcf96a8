pub mod applications;
pub mod assignments;
pub mod auth;
pub mod events;
pub mod health;
pub mod interviews;
pub mod jobs;
