//! Recruiting marketplace core: job postings, job search, and the application review pipeline.

pub mod accounts;
pub mod api;
pub mod applications;
pub mod error;
pub mod jobs;
pub mod service;

#[cfg(test)]
mod tests;

pub use accounts::{Account, AccountRepository, CompanyProfile, NewAccount, Role, UserId};
pub use api::lifecycle_router;
pub use applications::{
    Application, ApplicationId, ApplicationRepository, ApplicationStatus, StatusChangeEvent,
    StatusNotifier, StatusUpdate, TransitionPolicy,
};
pub use error::RepositoryError;
pub use jobs::{
    Job, JobChanges, JobId, JobPage, JobRepository, JobSearch, JobSearchParams, JobStatus,
    JobType, NewJob, Salary, SalaryInput,
};
pub use service::LifecycleService;
