use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::info;

use super::error::{RepositoryError, UnknownVariant};
use crate::persistence::Database;

/// Identifier of a marketplace user (student or recruiter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Student,
    Recruiter,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Recruiter => "recruiter",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "recruiter" => Ok(Role::Recruiter),
            _ => Err(UnknownVariant {
                field: "role",
                value: value.to_string(),
                allowed: "student, recruiter",
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Public company fields shown next to a recruiter's postings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    pub user_id: UserId,
    pub name: String,
    pub logo_url: Option<String>,
}

/// Seeding access to the accounts owned by the authentication service.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: Database,
}

impl AccountRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn register(&self, account: NewAccount) -> Result<Account, RepositoryError> {
        let name = account.name.trim();
        let email = account.email.trim().to_ascii_lowercase();
        if name.is_empty() {
            return Err(RepositoryError::invalid("name must not be empty"));
        }
        if !email.contains('@') {
            return Err(RepositoryError::invalid("email must be an address"));
        }

        let mut conn = self.db.acquire().await?;
        let inserted = sqlx::query_as::<_, Account>(
            "INSERT INTO users (name, email, role, created_at) VALUES (?, ?, ?, ?) \
             RETURNING id, name, email, role, created_at",
        )
        .bind(name)
        .bind(&email)
        .bind(account.role)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await;

        match inserted {
            Ok(account) => {
                info!(user_id = %account.id, role = account.role.label(), "account registered");
                Ok(account)
            }
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => Err(
                RepositoryError::Conflict(format!("email {email} is already registered")),
            ),
            Err(other) => Err(other.into()),
        }
    }

    pub async fn get(&self, id: UserId) -> Result<Account, RepositoryError> {
        let mut conn = self.db.acquire().await?;
        sqlx::query_as::<_, Account>(
            "SELECT id, name, email, role, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Creates or replaces the company card of a recruiter.
    pub async fn upsert_company(
        &self,
        user_id: UserId,
        name: &str,
        logo_url: Option<&str>,
    ) -> Result<CompanyProfile, RepositoryError> {
        if name.trim().is_empty() {
            return Err(RepositoryError::invalid("company name must not be empty"));
        }

        let mut tx = self.db.begin_write().await?;
        let role = sqlx::query_scalar::<_, Role>("SELECT role FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
        if role != Some(Role::Recruiter) {
            return Err(RepositoryError::InvalidOwner);
        }

        let profile = sqlx::query_as::<_, CompanyProfile>(
            "INSERT INTO company_profiles (user_id, name, logo_url) VALUES (?, ?, ?) \
             ON CONFLICT (user_id) DO UPDATE SET name = excluded.name, logo_url = excluded.logo_url \
             RETURNING user_id, name, logo_url",
        )
        .bind(user_id)
        .bind(name.trim())
        .bind(logo_url)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(profile)
    }
}
