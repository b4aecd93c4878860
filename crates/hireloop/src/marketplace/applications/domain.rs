use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::marketplace::accounts::UserId;
use crate::marketplace::error::UnknownVariant;
use crate::marketplace::jobs::JobId;

/// Identifier wrapper for submitted applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct ApplicationId(pub i64);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Review pipeline status. The seven values are a closed set shared with the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
pub enum ApplicationStatus {
    Pending,
    Reviewed,
    Interviewing,
    Offered,
    Rejected,
    Hired,
    Withdrawn,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 7] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Reviewed,
        ApplicationStatus::Interviewing,
        ApplicationStatus::Offered,
        ApplicationStatus::Rejected,
        ApplicationStatus::Hired,
        ApplicationStatus::Withdrawn,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "Pending",
            ApplicationStatus::Reviewed => "Reviewed",
            ApplicationStatus::Interviewing => "Interviewing",
            ApplicationStatus::Offered => "Offered",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::Hired => "Hired",
            ApplicationStatus::Withdrawn => "Withdrawn",
        }
    }

    /// Successors in the documented review graph.
    pub const fn successors(self) -> &'static [ApplicationStatus] {
        use ApplicationStatus::*;
        match self {
            Pending => &[Reviewed, Interviewing, Rejected, Withdrawn],
            Reviewed => &[Interviewing, Rejected],
            Interviewing => &[Offered, Rejected],
            Offered => &[Hired, Rejected, Withdrawn],
            Rejected | Hired | Withdrawn => &[],
        }
    }

    pub fn is_terminal(self) -> bool {
        self.successors().is_empty()
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ApplicationStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownVariant {
                field: "status",
                value: value.to_string(),
                allowed: "Pending, Reviewed, Interviewing, Offered, Rejected, Hired, Withdrawn",
            })
    }
}

/// How strictly status changes follow the review graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    /// Any enumerated status is an acceptable target.
    #[default]
    Permissive,
    /// Only edges of [`ApplicationStatus::successors`] are accepted.
    Strict,
}

impl TransitionPolicy {
    pub fn permits(self, from: ApplicationStatus, to: ApplicationStatus) -> bool {
        match self {
            TransitionPolicy::Permissive => true,
            TransitionPolicy::Strict => from.successors().contains(&to),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: ApplicationId,
    pub job_id: JobId,
    pub student_id: UserId,
    pub cover_letter: Option<String>,
    pub status: ApplicationStatus,
    pub status_changed_at: DateTime<Utc>,
    pub changed_by_user_id: Option<UserId>,
    pub recruiter_notes: Option<String>,
    pub applied_at: DateTime<Utc>,
}

/// Body of a status change request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    #[serde(alias = "status")]
    pub new_status: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Result of `update_status`: the stored record plus the status it had before the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdateOutcome {
    pub application: Application,
    pub previous_status: ApplicationStatus,
}

impl StatusUpdateOutcome {
    pub fn changed(&self) -> bool {
        self.previous_status != self.application.status
    }
}
