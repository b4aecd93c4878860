use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqliteConnection;
use tracing::{debug, info};

use super::domain::{
    Application, ApplicationId, ApplicationStatus, StatusUpdateOutcome, TransitionPolicy,
};
use crate::marketplace::accounts::UserId;
use crate::marketplace::error::RepositoryError;
use crate::marketplace::jobs::repository::authorize;
use crate::marketplace::jobs::{JobId, JobRepository, JobStatus};
use crate::persistence::Database;

const APPLICATION_COLUMNS: &str = "id, job_id, student_id, cover_letter, status, \
     status_changed_at, changed_by_user_id, recruiter_notes, applied_at";

const MAX_COVER_LETTER_CHARS: usize = 10_000;

/// Owns the application state machine and the one-application-per-(student, job) rule.
#[derive(Debug, Clone)]
pub struct ApplicationRepository {
    db: Database,
    policy: TransitionPolicy,
}

impl ApplicationRepository {
    pub fn new(db: Database, policy: TransitionPolicy) -> Self {
        Self { db, policy }
    }

    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    /// Records a new application in `Pending`. Duplicates are rejected by the store's
    /// `UNIQUE (job_id, student_id)` constraint, not by a prior lookup.
    pub async fn create(
        &self,
        job_id: JobId,
        student_id: UserId,
        cover_letter: Option<String>,
    ) -> Result<Application, RepositoryError> {
        let cover_letter = cover_letter
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        if cover_letter
            .as_ref()
            .is_some_and(|text| text.chars().count() > MAX_COVER_LETTER_CHARS)
        {
            return Err(RepositoryError::invalid(format!(
                "coverLetter must be at most {MAX_COVER_LETTER_CHARS} characters"
            )));
        }

        let mut tx = self.db.begin_write().await?;
        let job_status = sqlx::query_scalar::<_, JobStatus>("SELECT status FROM jobs WHERE id = ?")
            .bind(job_id)
            .fetch_optional(&mut *tx)
            .await?;
        match job_status {
            None => return Err(RepositoryError::NotFound),
            Some(JobStatus::Active) => {}
            Some(other) => {
                return Err(RepositoryError::invalid(format!(
                    "job is {} and no longer accepts applications",
                    other.label()
                )))
            }
        }

        let now = Utc::now();
        let inserted = sqlx::query_as::<_, Application>(&format!(
            "INSERT INTO applications (job_id, student_id, cover_letter, status, status_changed_at, applied_at) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING {APPLICATION_COLUMNS}"
        ))
        .bind(job_id)
        .bind(student_id)
        .bind(&cover_letter)
        .bind(ApplicationStatus::Pending)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await;

        let application = match inserted {
            Ok(application) => application,
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                debug!(job_id = %job_id, student_id = %student_id, "duplicate application rejected");
                return Err(RepositoryError::Conflict(
                    "already applied to this job".to_string(),
                ));
            }
            Err(sqlx::Error::Database(err)) if err.is_foreign_key_violation() => {
                return Err(RepositoryError::invalid("unknown student account"));
            }
            Err(other) => return Err(other.into()),
        };
        tx.commit().await?;

        info!(
            application_id = %application.id,
            job_id = %job_id,
            student_id = %student_id,
            "application submitted"
        );
        Ok(application)
    }

    /// Moves an application to `new_status` on behalf of the job's owner.
    ///
    /// Load, ownership check, validation and write share one transaction. Re-sending the
    /// current status is a no-op that leaves `status_changed_at` untouched.
    pub async fn update_status(
        &self,
        application_id: ApplicationId,
        recruiter_id: UserId,
        new_status: &str,
        notes: Option<String>,
    ) -> Result<StatusUpdateOutcome, RepositoryError> {
        let mut tx = self.db.begin_write().await?;

        let (job_id, current) = sqlx::query_as::<_, (JobId, ApplicationStatus)>(
            "SELECT job_id, status FROM applications WHERE id = ?",
        )
        .bind(application_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if !JobRepository::check_ownership(&mut tx, job_id, recruiter_id).await? {
            debug!(
                application_id = %application_id,
                recruiter_id = %recruiter_id,
                "status change by non-owner rejected"
            );
            return Err(RepositoryError::Forbidden);
        }

        let target = new_status.parse::<ApplicationStatus>()?;
        if target == current {
            let application = fetch(&mut tx, application_id)
                .await?
                .ok_or(RepositoryError::NotFound)?;
            tx.commit().await?;
            debug!(application_id = %application_id, status = %current, "status unchanged");
            return Ok(StatusUpdateOutcome {
                application,
                previous_status: current,
            });
        }

        if !self.policy.permits(current, target) {
            return Err(RepositoryError::invalid(format!(
                "cannot move an application from {current} to {target}"
            )));
        }

        let notes = notes
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        let application = sqlx::query_as::<_, Application>(&format!(
            "UPDATE applications SET status = ?, status_changed_at = ?, changed_by_user_id = ?, \
             recruiter_notes = COALESCE(?, recruiter_notes) WHERE id = ? RETURNING {APPLICATION_COLUMNS}"
        ))
        .bind(target)
        .bind(Utc::now())
        .bind(recruiter_id)
        .bind(notes)
        .bind(application_id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        info!(
            application_id = %application_id,
            from = %current,
            to = %target,
            recruiter_id = %recruiter_id,
            "application status changed"
        );
        Ok(StatusUpdateOutcome {
            application,
            previous_status: current,
        })
    }

    pub async fn get(&self, application_id: ApplicationId) -> Result<Application, RepositoryError> {
        let mut conn = self.db.acquire().await?;
        fetch(&mut conn, application_id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Applicants for one posting; only its owner may look.
    pub async fn list_for_job(
        &self,
        job_id: JobId,
        recruiter_id: UserId,
    ) -> Result<Vec<Application>, RepositoryError> {
        let mut conn = self.db.acquire().await?;
        authorize(&mut conn, job_id, recruiter_id).await?;
        let applications = sqlx::query_as::<_, Application>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE job_id = ? \
             ORDER BY applied_at DESC, id DESC"
        ))
        .bind(job_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(applications)
    }

    pub async fn list_for_student(
        &self,
        student_id: UserId,
    ) -> Result<Vec<Application>, RepositoryError> {
        let mut conn = self.db.acquire().await?;
        let applications = sqlx::query_as::<_, Application>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE student_id = ? \
             ORDER BY applied_at DESC, id DESC"
        ))
        .bind(student_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(applications)
    }
}

async fn fetch(
    conn: &mut SqliteConnection,
    application_id: ApplicationId,
) -> Result<Option<Application>, sqlx::Error> {
    sqlx::query_as::<_, Application>(&format!(
        "SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = ?"
    ))
    .bind(application_id)
    .fetch_optional(&mut *conn)
    .await
}

/// Outbound hook informed after a status change has been committed.
pub trait StatusNotifier: Send + Sync {
    fn publish(&self, event: StatusChangeEvent) -> Result<(), NotifyError>;
}

/// What the affected student is told about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeEvent {
    pub application_id: ApplicationId,
    pub job_id: JobId,
    pub student_id: UserId,
    pub previous_status: ApplicationStatus,
    pub status: ApplicationStatus,
    pub changed_by: UserId,
    pub changed_at: DateTime<Utc>,
}

impl StatusChangeEvent {
    pub fn from_outcome(outcome: &StatusUpdateOutcome, changed_by: UserId) -> Self {
        let application = &outcome.application;
        Self {
            application_id: application.id,
            job_id: application.job_id,
            student_id: application.student_id,
            previous_status: outcome.previous_status,
            status: application.status,
            changed_by,
            changed_at: application.status_changed_at,
        }
    }
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
