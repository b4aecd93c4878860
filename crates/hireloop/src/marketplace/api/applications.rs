use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::error::ApiError;
use super::parse_id;
use super::principal::Principal;
use crate::marketplace::accounts::Role;
use crate::marketplace::applications::{Application, ApplicationId, StatusNotifier, StatusUpdate};
use crate::marketplace::jobs::JobId;
use crate::marketplace::service::LifecycleService;

type Service<N> = State<Arc<LifecycleService<N>>>;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApplyRequest {
    #[serde(default)]
    pub(crate) cover_letter: Option<String>,
}

/// `POST /jobs/:id/apply`. The body is optional; an empty body applies without a cover letter.
pub(crate) async fn apply<N>(
    State(service): Service<N>,
    principal: Principal,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<Application>), ApiError>
where
    N: StatusNotifier + 'static,
{
    let student = principal.require(Role::Student)?;
    let job_id = parse_id(&raw_id, JobId)?;
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        ApplyRequest::default()
    } else {
        serde_json::from_slice::<ApplyRequest>(&body)
            .map_err(|err| ApiError::InvalidInput(format!("invalid apply body: {err}")))?
    };

    let application = service
        .apply(job_id, student.user_id, request.cover_letter)
        .await?;
    Ok((StatusCode::CREATED, Json(application)))
}

pub(crate) async fn update_status<N>(
    State(service): Service<N>,
    principal: Principal,
    Path(raw_id): Path<String>,
    body: Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<Json<Application>, ApiError>
where
    N: StatusNotifier + 'static,
{
    let recruiter = principal.require(Role::Recruiter)?;
    let application_id = parse_id(&raw_id, ApplicationId)?;
    let Json(update) = body?;
    let outcome = service
        .update_application_status(
            application_id,
            recruiter.user_id,
            &update.new_status,
            update.notes,
        )
        .await?;
    Ok(Json(outcome.application))
}

pub(crate) async fn for_job<N>(
    State(service): Service<N>,
    principal: Principal,
    Path(raw_id): Path<String>,
) -> Result<Json<Vec<Application>>, ApiError>
where
    N: StatusNotifier + 'static,
{
    let recruiter = principal.require(Role::Recruiter)?;
    let job_id = parse_id(&raw_id, JobId)?;
    Ok(Json(
        service.job_applications(job_id, recruiter.user_id).await?,
    ))
}

pub(crate) async fn mine<N>(
    State(service): Service<N>,
    principal: Principal,
) -> Result<Json<Vec<Application>>, ApiError>
where
    N: StatusNotifier + 'static,
{
    let student = principal.require(Role::Student)?;
    Ok(Json(service.student_applications(student.user_id).await?))
}
