use std::sync::Arc;

use tracing::warn;

use super::accounts::UserId;
use super::applications::{
    Application, ApplicationId, ApplicationRepository, StatusChangeEvent, StatusNotifier,
    StatusUpdateOutcome, TransitionPolicy,
};
use super::error::RepositoryError;
use super::jobs::{
    Job, JobChanges, JobDeletion, JobId, JobPage, JobRepository, JobSearch, NewJob,
};
use crate::persistence::Database;

/// Facade composing both repositories with the post-commit status notifier.
pub struct LifecycleService<N> {
    jobs: JobRepository,
    applications: ApplicationRepository,
    notifier: Arc<N>,
}

impl<N> LifecycleService<N>
where
    N: StatusNotifier + 'static,
{
    pub fn new(db: Database, policy: TransitionPolicy, notifier: Arc<N>) -> Self {
        Self {
            jobs: JobRepository::new(db.clone()),
            applications: ApplicationRepository::new(db, policy),
            notifier,
        }
    }

    pub fn jobs(&self) -> &JobRepository {
        &self.jobs
    }

    pub fn applications(&self) -> &ApplicationRepository {
        &self.applications
    }

    pub async fn search_jobs(&self, search: &JobSearch) -> Result<JobPage, RepositoryError> {
        self.jobs.search(search).await
    }

    pub async fn job(&self, id: JobId) -> Result<Job, RepositoryError> {
        self.jobs.get_by_id(id).await
    }

    pub async fn recruiter_jobs(&self, recruiter_id: UserId) -> Result<Vec<Job>, RepositoryError> {
        self.jobs.list_by_recruiter(recruiter_id).await
    }

    pub async fn create_job(
        &self,
        recruiter_id: UserId,
        payload: NewJob,
    ) -> Result<Job, RepositoryError> {
        self.jobs.create(recruiter_id, payload).await
    }

    pub async fn update_job(
        &self,
        id: JobId,
        recruiter_id: UserId,
        changes: JobChanges,
    ) -> Result<Job, RepositoryError> {
        self.jobs.update(id, recruiter_id, changes).await
    }

    pub async fn change_job_status(
        &self,
        id: JobId,
        recruiter_id: UserId,
        new_status: &str,
    ) -> Result<Job, RepositoryError> {
        self.jobs.change_status(id, recruiter_id, new_status).await
    }

    pub async fn delete_job(
        &self,
        id: JobId,
        recruiter_id: UserId,
    ) -> Result<JobDeletion, RepositoryError> {
        self.jobs.delete(id, recruiter_id).await
    }

    pub async fn apply(
        &self,
        job_id: JobId,
        student_id: UserId,
        cover_letter: Option<String>,
    ) -> Result<Application, RepositoryError> {
        self.applications
            .create(job_id, student_id, cover_letter)
            .await
    }

    /// Runs the transactional status change, then notifies the student. The notifier only
    /// sees committed, real changes; its failures are logged and never undo the change.
    pub async fn update_application_status(
        &self,
        application_id: ApplicationId,
        recruiter_id: UserId,
        new_status: &str,
        notes: Option<String>,
    ) -> Result<StatusUpdateOutcome, RepositoryError> {
        let outcome = self
            .applications
            .update_status(application_id, recruiter_id, new_status, notes)
            .await?;

        if outcome.changed() {
            let event = StatusChangeEvent::from_outcome(&outcome, recruiter_id);
            if let Err(err) = self.notifier.publish(event) {
                warn!(
                    application_id = %application_id,
                    error = %err,
                    "status change committed but notification failed"
                );
            }
        }

        Ok(outcome)
    }

    pub async fn job_applications(
        &self,
        job_id: JobId,
        recruiter_id: UserId,
    ) -> Result<Vec<Application>, RepositoryError> {
        self.applications.list_for_job(job_id, recruiter_id).await
    }

    pub async fn student_applications(
        &self,
        student_id: UserId,
    ) -> Result<Vec<Application>, RepositoryError> {
        self.applications.list_for_student(student_id).await
    }
}
