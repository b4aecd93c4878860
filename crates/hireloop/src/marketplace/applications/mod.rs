//! Student applications and the recruiter-driven review pipeline.

pub mod domain;
pub mod repository;

pub use domain::{
    Application, ApplicationId, ApplicationStatus, StatusUpdate, StatusUpdateOutcome,
    TransitionPolicy,
};
pub use repository::{ApplicationRepository, NotifyError, StatusChangeEvent, StatusNotifier};
