use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::marketplace::accounts::UserId;
use crate::marketplace::error::{RepositoryError, UnknownVariant};

const MAX_TITLE_LEN: usize = 200;
const MAX_SKILLS: usize = 50;

/// Identifier wrapper for job postings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct JobId(pub i64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
pub enum JobType {
    #[serde(rename = "Full-time")]
    #[sqlx(rename = "Full-time")]
    FullTime,
    #[serde(rename = "Part-time")]
    #[sqlx(rename = "Part-time")]
    PartTime,
    Internship,
    Remote,
}

impl JobType {
    pub const ALL: [JobType; 4] = [
        JobType::FullTime,
        JobType::PartTime,
        JobType::Internship,
        JobType::Remote,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            JobType::FullTime => "Full-time",
            JobType::PartTime => "Part-time",
            JobType::Internship => "Internship",
            JobType::Remote => "Remote",
        }
    }
}

impl FromStr for JobType {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        JobType::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownVariant {
                field: "jobType",
                value: value.to_string(),
                allowed: "Full-time, Part-time, Internship, Remote",
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
pub enum JobStatus {
    Active,
    Inactive,
    Expired,
}

impl JobStatus {
    pub const ALL: [JobStatus; 3] = [JobStatus::Active, JobStatus::Inactive, JobStatus::Expired];

    pub const fn label(self) -> &'static str {
        match self {
            JobStatus::Active => "Active",
            JobStatus::Inactive => "Inactive",
            JobStatus::Expired => "Expired",
        }
    }
}

impl FromStr for JobStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        JobStatus::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownVariant {
                field: "status",
                value: value.to_string(),
                allowed: "Active, Inactive, Expired",
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum SalaryUnit {
    Hour,
    Month,
    Year,
}

/// Compensation as published: free text, a structured range, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Salary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<SalaryUnit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl Salary {
    fn is_empty(&self) -> bool {
        self.text.is_none() && self.min.is_none() && self.max.is_none()
    }
}

/// Salary as accepted on the wire: `"80k DOE"` or `{"min": 80000, "max": 95000, ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SalaryInput {
    Text(String),
    Structured {
        #[serde(default)]
        min: Option<i64>,
        #[serde(default)]
        max: Option<i64>,
        #[serde(default)]
        unit: Option<SalaryUnit>,
        #[serde(default)]
        currency: Option<String>,
    },
}

impl SalaryInput {
    /// Normalizes the input; `None` means "no salary published".
    pub(crate) fn into_salary(self) -> Result<Option<Salary>, RepositoryError> {
        let salary = match self {
            SalaryInput::Text(text) => Salary {
                text: non_blank(Some(text)),
                ..Salary::default()
            },
            SalaryInput::Structured {
                min,
                max,
                unit,
                currency,
            } => {
                if min.is_some_and(|value| value < 0) || max.is_some_and(|value| value < 0) {
                    return Err(RepositoryError::invalid("salary bounds must not be negative"));
                }
                let currency = non_blank(currency);
                if min.is_none() && max.is_none() && (unit.is_some() || currency.is_some()) {
                    return Err(RepositoryError::invalid(
                        "salary unit and currency require a min or max bound",
                    ));
                }
                if let (Some(min), Some(max)) = (min, max) {
                    if min > max {
                        return Err(RepositoryError::invalid(
                            "salary min must not exceed salary max",
                        ));
                    }
                }
                Salary {
                    text: None,
                    min,
                    max,
                    unit,
                    currency: currency.map(|code| code.to_ascii_uppercase()),
                }
            }
        };

        Ok((!salary.is_empty()).then_some(salary))
    }
}

/// Posting as returned to callers, with its skills and the owner's public company card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub recruiter_id: UserId,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub salary: Option<Salary>,
    pub job_type: JobType,
    pub status: JobStatus,
    pub skills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<CompanySummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySummary {
    pub name: String,
    pub logo_url: Option<String>,
}

/// Flat row produced by the job read query (job columns plus the joined company card).
#[derive(Debug, FromRow)]
pub(crate) struct JobRow {
    pub id: JobId,
    pub recruiter_id: UserId,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub salary_text: Option<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub salary_unit: Option<SalaryUnit>,
    pub salary_currency: Option<String>,
    pub job_type: JobType,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub company_name: Option<String>,
    pub company_logo_url: Option<String>,
}

impl JobRow {
    pub(crate) fn into_job(self, skills: Vec<String>) -> Job {
        let salary = Salary {
            text: self.salary_text,
            min: self.salary_min,
            max: self.salary_max,
            unit: self.salary_unit,
            currency: self.salary_currency,
        };
        let company = self.company_name.map(|name| CompanySummary {
            name,
            logo_url: self.company_logo_url,
        });

        Job {
            id: self.id,
            recruiter_id: self.recruiter_id,
            title: self.title,
            description: self.description,
            location: self.location,
            salary: (!salary.is_empty()).then_some(salary),
            job_type: self.job_type,
            status: self.status,
            skills,
            company,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Create payload. Enumerated fields stay textual until validation so that out-of-range
/// values surface as `InvalidInput` rather than as a decoding failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub salary: Option<SalaryInput>,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Debug)]
pub(crate) struct JobDraft {
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub salary: Option<Salary>,
    pub job_type: JobType,
    pub status: JobStatus,
    pub skills: Vec<String>,
}

impl NewJob {
    pub(crate) fn validate(self) -> Result<JobDraft, RepositoryError> {
        let title = required_text("title", self.title)?;
        let description = required_text("description", self.description)?;
        let job_type = self
            .job_type
            .as_deref()
            .map(str::parse::<JobType>)
            .transpose()?
            .unwrap_or(JobType::FullTime);
        let status = self
            .status
            .as_deref()
            .map(str::parse::<JobStatus>)
            .transpose()?
            .unwrap_or(JobStatus::Active);
        let salary = match self.salary {
            Some(input) => input.into_salary()?,
            None => None,
        };

        Ok(JobDraft {
            title,
            description,
            location: non_blank(self.location),
            salary,
            job_type,
            status,
            skills: normalize_skills(self.skills)?,
        })
    }
}

/// Field mask for partial updates: only `Some` fields reach the generated `UPDATE`.
///
/// `location: Some("")` clears the location and `salary: Some("")` clears the salary.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobChanges {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub salary: Option<SalaryInput>,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub skills: Option<Vec<String>>,
}

#[derive(Debug, Default)]
pub(crate) struct ValidatedChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<Option<String>>,
    pub salary: Option<Option<Salary>>,
    pub job_type: Option<JobType>,
    pub status: Option<JobStatus>,
    pub skills: Option<Vec<String>>,
}

impl ValidatedChanges {
    pub(crate) fn touches_row(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.location.is_some()
            || self.salary.is_some()
            || self.job_type.is_some()
            || self.status.is_some()
    }

    pub(crate) fn is_empty(&self) -> bool {
        !self.touches_row() && self.skills.is_none()
    }
}

impl JobChanges {
    pub(crate) fn validate(self) -> Result<ValidatedChanges, RepositoryError> {
        Ok(ValidatedChanges {
            title: self
                .title
                .map(|title| required_text("title", title))
                .transpose()?,
            description: self
                .description
                .map(|description| required_text("description", description))
                .transpose()?,
            location: self.location.map(|location| non_blank(Some(location))),
            salary: self.salary.map(SalaryInput::into_salary).transpose()?,
            job_type: self
                .job_type
                .as_deref()
                .map(str::parse::<JobType>)
                .transpose()?,
            status: self
                .status
                .as_deref()
                .map(str::parse::<JobStatus>)
                .transpose()?,
            skills: self.skills.map(normalize_skills).transpose()?,
        })
    }
}

/// Result of a hard delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDeletion {
    pub success: bool,
    pub removed_applications: u64,
}

fn required_text(field: &str, value: String) -> Result<String, RepositoryError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RepositoryError::invalid(format!("{field} must not be empty")));
    }
    if field == "title" && trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(RepositoryError::invalid(format!(
            "title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

/// Trims, drops blanks, and de-duplicates case-insensitively keeping first spelling.
fn normalize_skills(skills: Vec<String>) -> Result<Vec<String>, RepositoryError> {
    let mut normalized: Vec<String> = Vec::with_capacity(skills.len());
    for skill in skills {
        let trimmed = skill.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !normalized
            .iter()
            .any(|existing| existing.eq_ignore_ascii_case(trimmed))
        {
            normalized.push(trimmed.to_string());
        }
    }

    if normalized.len() > MAX_SKILLS {
        return Err(RepositoryError::invalid(format!(
            "at most {MAX_SKILLS} skills may be attached to a job"
        )));
    }
    Ok(normalized)
}
