use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::parse_id;
use super::principal::Principal;
use crate::marketplace::accounts::Role;
use crate::marketplace::applications::StatusNotifier;
use crate::marketplace::jobs::{Job, JobChanges, JobDeletion, JobId, JobSearch, JobSearchParams, NewJob};
use crate::marketplace::service::LifecycleService;

type Service<N> = State<Arc<LifecycleService<N>>>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JobSearchResponse {
    pub(crate) jobs: Vec<Job>,
    pub(crate) total_pages: u32,
    pub(crate) current_page: u32,
    pub(crate) total_jobs: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JobStatusRequest {
    #[serde(alias = "status")]
    pub(crate) new_status: String,
}

pub(crate) async fn search<N>(
    State(service): Service<N>,
    query: Result<Query<JobSearchParams>, QueryRejection>,
) -> Result<Json<JobSearchResponse>, ApiError>
where
    N: StatusNotifier + 'static,
{
    let Query(params) = query?;
    let search = JobSearch::try_from(params)?;
    let page = service.search_jobs(&search).await?;

    Ok(Json(JobSearchResponse {
        jobs: page.items,
        total_pages: page.total_pages,
        current_page: page.page,
        total_jobs: page.total_count,
    }))
}

pub(crate) async fn detail<N>(
    State(service): Service<N>,
    Path(raw_id): Path<String>,
) -> Result<Json<Job>, ApiError>
where
    N: StatusNotifier + 'static,
{
    let id = parse_id(&raw_id, JobId)?;
    Ok(Json(service.job(id).await?))
}

pub(crate) async fn create<N>(
    State(service): Service<N>,
    principal: Principal,
    body: Result<Json<NewJob>, JsonRejection>,
) -> Result<(StatusCode, Json<Job>), ApiError>
where
    N: StatusNotifier + 'static,
{
    let recruiter = principal.require(Role::Recruiter)?;
    let Json(payload) = body?;
    let job = service.create_job(recruiter.user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

pub(crate) async fn update<N>(
    State(service): Service<N>,
    principal: Principal,
    Path(raw_id): Path<String>,
    body: Result<Json<JobChanges>, JsonRejection>,
) -> Result<Json<Job>, ApiError>
where
    N: StatusNotifier + 'static,
{
    let recruiter = principal.require(Role::Recruiter)?;
    let id = parse_id(&raw_id, JobId)?;
    let Json(changes) = body?;
    Ok(Json(service.update_job(id, recruiter.user_id, changes).await?))
}

pub(crate) async fn change_status<N>(
    State(service): Service<N>,
    principal: Principal,
    Path(raw_id): Path<String>,
    body: Result<Json<JobStatusRequest>, JsonRejection>,
) -> Result<Json<Job>, ApiError>
where
    N: StatusNotifier + 'static,
{
    let recruiter = principal.require(Role::Recruiter)?;
    let id = parse_id(&raw_id, JobId)?;
    let Json(request) = body?;
    let job = service
        .change_job_status(id, recruiter.user_id, &request.new_status)
        .await?;
    Ok(Json(job))
}

pub(crate) async fn delete<N>(
    State(service): Service<N>,
    principal: Principal,
    Path(raw_id): Path<String>,
) -> Result<Json<JobDeletion>, ApiError>
where
    N: StatusNotifier + 'static,
{
    let recruiter = principal.require(Role::Recruiter)?;
    let id = parse_id(&raw_id, JobId)?;
    Ok(Json(service.delete_job(id, recruiter.user_id).await?))
}

pub(crate) async fn recruiter_jobs<N>(
    State(service): Service<N>,
    principal: Principal,
) -> Result<Json<Vec<Job>>, ApiError>
where
    N: StatusNotifier + 'static,
{
    let recruiter = principal.require(Role::Recruiter)?;
    Ok(Json(service.recruiter_jobs(recruiter.user_id).await?))
}
