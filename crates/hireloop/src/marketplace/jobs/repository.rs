use std::collections::HashMap;

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::{debug, info};

use super::domain::{
    Job, JobChanges, JobDeletion, JobId, JobRow, JobStatus, NewJob, Salary,
};
use super::search::{push_filters, total_pages, JobPage, JobSearch};
use crate::marketplace::accounts::{Role, UserId};
use crate::marketplace::error::RepositoryError;
use crate::persistence::Database;

const JOB_SELECT: &str = "SELECT j.id, j.recruiter_id, j.title, j.description, j.location, \
     j.salary_text, j.salary_min, j.salary_max, j.salary_unit, j.salary_currency, \
     j.job_type, j.status, j.created_at, j.updated_at, \
     c.name AS company_name, c.logo_url AS company_logo_url \
     FROM jobs j LEFT JOIN company_profiles c ON c.user_id = j.recruiter_id";

/// Sole gateway to job rows. Only the owning recruiter may mutate a posting.
#[derive(Debug, Clone)]
pub struct JobRepository {
    db: Database,
}

impl JobRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn search(&self, search: &JobSearch) -> Result<JobPage, RepositoryError> {
        let mut conn = self.db.acquire().await?;

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM jobs j");
        push_filters(&mut count, &search.filters);
        let total_count: i64 = count
            .build_query_scalar()
            .fetch_one(&mut *conn)
            .await?;

        let mut select = QueryBuilder::<Sqlite>::new(JOB_SELECT);
        push_filters(&mut select, &search.filters);
        select
            .push(search.sort.order_clause())
            .push(" LIMIT ")
            .push_bind(i64::from(search.limit))
            .push(" OFFSET ")
            .push_bind(search.offset());
        let rows: Vec<JobRow> = select.build_query_as().fetch_all(&mut *conn).await?;

        let ids: Vec<JobId> = rows.iter().map(|row| row.id).collect();
        let mut skills = skills_for(&mut conn, &ids).await?;
        let items = rows
            .into_iter()
            .map(|row| {
                let job_skills = skills.remove(&row.id).unwrap_or_default();
                row.into_job(job_skills)
            })
            .collect::<Vec<_>>();

        let total_count = u64::try_from(total_count).unwrap_or_default();
        debug!(
            page = search.page,
            limit = search.limit,
            total_count,
            returned = items.len(),
            "job search executed"
        );

        Ok(JobPage {
            items,
            total_count,
            total_pages: total_pages(total_count, search.limit),
            page: search.page,
        })
    }

    pub async fn get_by_id(&self, id: JobId) -> Result<Job, RepositoryError> {
        let mut conn = self.db.acquire().await?;
        load(&mut conn, id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Postings owned by one recruiter, newest first.
    pub async fn list_by_recruiter(&self, recruiter_id: UserId) -> Result<Vec<Job>, RepositoryError> {
        let mut conn = self.db.acquire().await?;
        let mut select = QueryBuilder::<Sqlite>::new(JOB_SELECT);
        select
            .push(" WHERE j.recruiter_id = ")
            .push_bind(recruiter_id)
            .push(" ORDER BY j.created_at DESC, j.id DESC");
        let rows: Vec<JobRow> = select.build_query_as().fetch_all(&mut *conn).await?;

        let ids: Vec<JobId> = rows.iter().map(|row| row.id).collect();
        let mut skills = skills_for(&mut conn, &ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let job_skills = skills.remove(&row.id).unwrap_or_default();
                row.into_job(job_skills)
            })
            .collect())
    }

    pub async fn create(&self, recruiter_id: UserId, payload: NewJob) -> Result<Job, RepositoryError> {
        let mut tx = self.db.begin_write().await?;

        let role = sqlx::query_scalar::<_, Role>("SELECT role FROM users WHERE id = ?")
            .bind(recruiter_id)
            .fetch_optional(&mut *tx)
            .await?;
        if role != Some(Role::Recruiter) {
            return Err(RepositoryError::InvalidOwner);
        }

        let draft = payload.validate()?;
        let salary = draft.salary.unwrap_or_default();
        let now = Utc::now();
        let id = sqlx::query_scalar::<_, JobId>(
            "INSERT INTO jobs (recruiter_id, title, description, location, salary_text, salary_min, \
             salary_max, salary_unit, salary_currency, job_type, status, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(recruiter_id)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(&draft.location)
        .bind(&salary.text)
        .bind(salary.min)
        .bind(salary.max)
        .bind(salary.unit)
        .bind(&salary.currency)
        .bind(draft.job_type)
        .bind(draft.status)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        replace_skills(&mut tx, id, &draft.skills).await?;
        let job = load(&mut tx, id).await?.ok_or(RepositoryError::NotFound)?;
        tx.commit().await?;

        info!(job_id = %id, recruiter_id = %recruiter_id, "job created");
        Ok(job)
    }

    /// Applies only the supplied fields. An empty mask performs no write.
    pub async fn update(
        &self,
        id: JobId,
        recruiter_id: UserId,
        changes: JobChanges,
    ) -> Result<Job, RepositoryError> {
        let mut tx = self.db.begin_write().await?;
        authorize(&mut tx, id, recruiter_id).await?;
        let changes = changes.validate()?;

        if changes.is_empty() {
            let job = load(&mut tx, id).await?.ok_or(RepositoryError::NotFound)?;
            return Ok(job);
        }

        let mut update = QueryBuilder::<Sqlite>::new("UPDATE jobs SET updated_at = ");
        update.push_bind(Utc::now());
        if let Some(title) = changes.title {
            update.push(", title = ").push_bind(title);
        }
        if let Some(description) = changes.description {
            update.push(", description = ").push_bind(description);
        }
        if let Some(location) = changes.location {
            update.push(", location = ").push_bind(location);
        }
        if let Some(salary) = changes.salary {
            let Salary {
                text,
                min,
                max,
                unit,
                currency,
            } = salary.unwrap_or_default();
            update
                .push(", salary_text = ")
                .push_bind(text)
                .push(", salary_min = ")
                .push_bind(min)
                .push(", salary_max = ")
                .push_bind(max)
                .push(", salary_unit = ")
                .push_bind(unit)
                .push(", salary_currency = ")
                .push_bind(currency);
        }
        if let Some(job_type) = changes.job_type {
            update.push(", job_type = ").push_bind(job_type);
        }
        if let Some(status) = changes.status {
            update.push(", status = ").push_bind(status);
        }
        update.push(" WHERE id = ").push_bind(id);
        update.build().execute(&mut *tx).await?;

        if let Some(skills) = &changes.skills {
            replace_skills(&mut tx, id, skills).await?;
        }

        let job = load(&mut tx, id).await?.ok_or(RepositoryError::NotFound)?;
        tx.commit().await?;

        info!(job_id = %id, recruiter_id = %recruiter_id, "job updated");
        Ok(job)
    }

    pub async fn change_status(
        &self,
        id: JobId,
        recruiter_id: UserId,
        new_status: &str,
    ) -> Result<Job, RepositoryError> {
        let mut tx = self.db.begin_write().await?;
        authorize(&mut tx, id, recruiter_id).await?;
        let status = new_status.parse::<JobStatus>()?;

        sqlx::query("UPDATE jobs SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status)
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let job = load(&mut tx, id).await?.ok_or(RepositoryError::NotFound)?;
        tx.commit().await?;

        info!(job_id = %id, status = status.label(), "job status changed");
        Ok(job)
    }

    /// Hard delete. Applications referencing the job are removed in the same transaction.
    pub async fn delete(&self, id: JobId, recruiter_id: UserId) -> Result<JobDeletion, RepositoryError> {
        let mut tx = self.db.begin_write().await?;
        authorize(&mut tx, id, recruiter_id).await?;

        let removed_applications = sqlx::query("DELETE FROM applications WHERE job_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        sqlx::query("DELETE FROM job_skills WHERE job_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM jobs WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(job_id = %id, removed_applications, "job deleted");
        Ok(JobDeletion {
            success: true,
            removed_applications,
        })
    }

    /// Ownership predicate evaluated on the caller's unit of work, so a check and the write
    /// that depends on it observe the same snapshot.
    pub async fn check_ownership(
        conn: &mut SqliteConnection,
        job_id: JobId,
        recruiter_id: UserId,
    ) -> Result<bool, RepositoryError> {
        Ok(owner_of(conn, job_id).await? == Some(recruiter_id))
    }
}

/// NotFound when the job is absent, Forbidden when someone else owns it.
pub(crate) async fn authorize(
    conn: &mut SqliteConnection,
    job_id: JobId,
    recruiter_id: UserId,
) -> Result<(), RepositoryError> {
    match owner_of(conn, job_id).await? {
        None => Err(RepositoryError::NotFound),
        Some(owner) if owner != recruiter_id => {
            debug!(job_id = %job_id, recruiter_id = %recruiter_id, "ownership check failed");
            Err(RepositoryError::Forbidden)
        }
        Some(_) => Ok(()),
    }
}

async fn owner_of(conn: &mut SqliteConnection, job_id: JobId) -> Result<Option<UserId>, sqlx::Error> {
    sqlx::query_scalar::<_, UserId>("SELECT recruiter_id FROM jobs WHERE id = ?")
        .bind(job_id)
        .fetch_optional(&mut *conn)
        .await
}

async fn load(conn: &mut SqliteConnection, id: JobId) -> Result<Option<Job>, RepositoryError> {
    let mut select = QueryBuilder::<Sqlite>::new(JOB_SELECT);
    select.push(" WHERE j.id = ").push_bind(id);
    let Some(row) = select
        .build_query_as::<JobRow>()
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };

    let mut skills = skills_for(conn, &[id]).await?;
    Ok(Some(row.into_job(skills.remove(&id).unwrap_or_default())))
}

async fn skills_for(
    conn: &mut SqliteConnection,
    ids: &[JobId],
) -> Result<HashMap<JobId, Vec<String>>, sqlx::Error> {
    let mut grouped: HashMap<JobId, Vec<String>> = HashMap::new();
    if ids.is_empty() {
        return Ok(grouped);
    }

    let mut query = QueryBuilder::<Sqlite>::new(
        "SELECT js.job_id, s.name FROM job_skills js JOIN skills s ON s.id = js.skill_id \
         WHERE js.job_id IN (",
    );
    {
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
    }
    query.push(") ORDER BY s.name COLLATE NOCASE");

    let rows: Vec<(JobId, String)> = query.build_query_as().fetch_all(&mut *conn).await?;
    for (job_id, name) in rows {
        grouped.entry(job_id).or_default().push(name);
    }
    Ok(grouped)
}

async fn replace_skills(
    conn: &mut SqliteConnection,
    job_id: JobId,
    skills: &[String],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM job_skills WHERE job_id = ?")
        .bind(job_id)
        .execute(&mut *conn)
        .await?;

    for name in skills {
        sqlx::query("INSERT INTO skills (name) VALUES (?) ON CONFLICT (name) DO NOTHING")
            .bind(name)
            .execute(&mut *conn)
            .await?;
        sqlx::query(
            "INSERT INTO job_skills (job_id, skill_id) SELECT ?, id FROM skills WHERE name = ? \
             ON CONFLICT (job_id, skill_id) DO NOTHING",
        )
        .bind(job_id)
        .bind(name)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}
