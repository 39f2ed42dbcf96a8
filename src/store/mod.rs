pub mod backend;
pub mod client;
pub mod memory;
pub mod subscription;

/// Logical top-level collections in the external store.
pub mod collections {
    pub const USERS: &str = "users";
    pub const JOBS: &str = "jobs";
    pub const APPLICATIONS: &str = "applications";
    pub const INTERVIEWS: &str = "interviews";
    pub const ASSIGNMENTS: &str = "assignments";

    pub const ALL: [&str; 5] = [USERS, JOBS, APPLICATIONS, INTERVIEWS, ASSIGNMENTS];

    pub fn is_known(name: &str) -> bool {
        ALL.contains(&name)
    }
}
