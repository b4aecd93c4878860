//! Job postings: ownership-guarded CRUD and filtered, paginated search.

pub mod domain;
pub mod repository;
pub mod search;

pub use domain::{
    CompanySummary, Job, JobChanges, JobDeletion, JobId, JobStatus, JobType, NewJob, Salary,
    SalaryInput, SalaryUnit,
};
pub use repository::JobRepository;
pub use search::{JobFilters, JobPage, JobSearch, JobSearchParams, SalaryBucket, SortKey};
