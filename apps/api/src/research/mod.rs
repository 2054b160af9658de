pub mod company;
pub mod coordinator;
pub mod cv_profile;
pub mod job_info;
pub mod prompts;
pub mod task;
