//! Job search parameters and their translation into bound SQL predicates.
//!
//! Every supplied filter contributes exactly one predicate; absent or blank filters contribute
//! nothing. User text only ever reaches the database through `push_bind`.

use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite};

use super::domain::{Job, JobStatus, JobType};
use crate::marketplace::error::RepositoryError;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Raw query string as received from `GET /jobs`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSearchParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub keyword: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub salary_range: Option<String>,
    pub status: Option<String>,
    pub sort_by: Option<String>,
}

/// Validated search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSearch {
    pub page: u32,
    pub limit: u32,
    pub filters: JobFilters,
    pub sort: SortKey,
}

impl Default for JobSearch {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            filters: JobFilters::default(),
            sort: SortKey::Newest,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilters {
    pub keyword: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<JobType>,
    pub salary: Option<SalaryBucket>,
    pub status: Option<JobStatus>,
}

/// Inclusive salary band; `max: None` is open ended (`"100000+"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalaryBucket {
    pub min: i64,
    pub max: Option<i64>,
}

impl SalaryBucket {
    pub fn parse(raw: &str) -> Result<Self, RepositoryError> {
        let invalid = || {
            RepositoryError::invalid(format!(
                "salaryRange must look like 'min-max' or 'min+', got '{raw}'"
            ))
        };
        let compact: String = raw.chars().filter(|c| !c.is_whitespace() && *c != ',').collect();

        if let Some(min) = compact.strip_suffix('+') {
            let min = min.parse::<i64>().map_err(|_| invalid())?;
            if min < 0 {
                return Err(invalid());
            }
            return Ok(Self { min, max: None });
        }

        let (min, max) = compact.split_once('-').ok_or_else(invalid)?;
        let min = min.parse::<i64>().map_err(|_| invalid())?;
        let max = max.parse::<i64>().map_err(|_| invalid())?;
        if min < 0 || max < min {
            return Err(invalid());
        }
        Ok(Self {
            min,
            max: Some(max),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Newest,
    Oldest,
    Title,
    SalaryHigh,
    SalaryLow,
}

impl SortKey {
    pub fn parse(raw: &str) -> Result<Self, RepositoryError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "newest" | "date" | "created_at" => Ok(SortKey::Newest),
            "oldest" => Ok(SortKey::Oldest),
            "title" => Ok(SortKey::Title),
            "salary_high" | "salary" => Ok(SortKey::SalaryHigh),
            "salary_low" => Ok(SortKey::SalaryLow),
            _ => Err(RepositoryError::invalid(format!(
                "sortBy must be one of newest, oldest, title, salary_high, salary_low, got '{raw}'"
            ))),
        }
    }

    /// Fixed ORDER BY fragments; `id` breaks ties so pages never overlap.
    pub(crate) const fn order_clause(self) -> &'static str {
        match self {
            SortKey::Newest => " ORDER BY j.created_at DESC, j.id DESC",
            SortKey::Oldest => " ORDER BY j.created_at ASC, j.id ASC",
            SortKey::Title => " ORDER BY j.title COLLATE NOCASE ASC, j.id DESC",
            SortKey::SalaryHigh => {
                " ORDER BY COALESCE(j.salary_max, j.salary_min) IS NULL, \
                 COALESCE(j.salary_max, j.salary_min) DESC, j.id DESC"
            }
            SortKey::SalaryLow => {
                " ORDER BY COALESCE(j.salary_min, j.salary_max) IS NULL, \
                 COALESCE(j.salary_min, j.salary_max) ASC, j.id DESC"
            }
        }
    }
}

impl TryFrom<JobSearchParams> for JobSearch {
    type Error = RepositoryError;

    fn try_from(params: JobSearchParams) -> Result<Self, Self::Error> {
        let page = parse_positive("page", params.page.as_deref())?.unwrap_or(1);
        let limit = parse_positive("limit", params.limit.as_deref())?
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE);

        let filters = JobFilters {
            keyword: present(params.keyword),
            location: present(params.location),
            job_type: present(params.job_type)
                .map(|raw| raw.parse::<JobType>())
                .transpose()?,
            salary: present(params.salary_range)
                .map(|raw| SalaryBucket::parse(&raw))
                .transpose()?,
            status: present(params.status)
                .map(|raw| raw.parse::<JobStatus>())
                .transpose()?,
        };
        let sort = match present(params.sort_by) {
            Some(raw) => SortKey::parse(&raw)?,
            None => SortKey::Newest,
        };

        Ok(Self {
            page,
            limit,
            filters,
            sort,
        })
    }
}

impl JobSearch {
    pub(crate) fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.limit)
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPage {
    pub items: Vec<Job>,
    pub total_count: u64,
    pub total_pages: u32,
    pub page: u32,
}

pub(crate) fn total_pages(total_count: u64, limit: u32) -> u32 {
    if limit == 0 {
        return 0;
    }
    let pages = total_count.div_ceil(u64::from(limit));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Appends ` WHERE ... AND ...` for every supplied filter.
pub(crate) fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filters: &JobFilters) {
    let mut clause = WhereClause::default();

    if let Some(keyword) = &filters.keyword {
        let pattern = like_pattern(keyword);
        clause.next(builder);
        builder
            .push("(j.title LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR j.description LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
    if let Some(location) = &filters.location {
        clause.next(builder);
        builder
            .push("j.location LIKE ")
            .push_bind(like_pattern(location))
            .push(" ESCAPE '\\'");
    }
    if let Some(job_type) = filters.job_type {
        clause.next(builder);
        builder.push("j.job_type = ").push_bind(job_type);
    }
    if let Some(bucket) = filters.salary {
        clause.next(builder);
        builder
            .push("COALESCE(j.salary_max, j.salary_min) >= ")
            .push_bind(bucket.min);
        if let Some(max) = bucket.max {
            builder
                .push(" AND COALESCE(j.salary_min, j.salary_max) <= ")
                .push_bind(max);
        }
    }
    if let Some(status) = filters.status {
        clause.next(builder);
        builder.push("j.status = ").push_bind(status);
    }
}

#[derive(Default)]
struct WhereClause {
    started: bool,
}

impl WhereClause {
    fn next(&mut self, builder: &mut QueryBuilder<'_, Sqlite>) {
        builder.push(if self.started { " AND " } else { " WHERE " });
        self.started = true;
    }
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

fn parse_positive(field: &str, raw: Option<&str>) -> Result<Option<u32>, RepositoryError> {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    let value = raw
        .parse::<i64>()
        .map_err(|_| RepositoryError::invalid(format!("{field} must be an integer, got '{raw}'")))?;
    Ok(Some(value.clamp(1, i64::from(u32::MAX)) as u32))
}

/// `%term%` with LIKE metacharacters escaped.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
