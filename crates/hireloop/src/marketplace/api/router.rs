use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;

use super::{applications, jobs};
use crate::marketplace::applications::StatusNotifier;
use crate::marketplace::service::LifecycleService;

/// Router builder exposing the job and application lifecycle endpoints.
pub fn lifecycle_router<N>(service: Arc<LifecycleService<N>>) -> Router
where
    N: StatusNotifier + 'static,
{
    Router::new()
        .route("/jobs", get(jobs::search::<N>).post(jobs::create::<N>))
        .route(
            "/jobs/:id",
            get(jobs::detail::<N>)
                .put(jobs::update::<N>)
                .delete(jobs::delete::<N>),
        )
        .route("/jobs/:id/status", patch(jobs::change_status::<N>))
        .route("/jobs/:id/apply", post(applications::apply::<N>))
        .route("/jobs/:id/applications", get(applications::for_job::<N>))
        .route("/recruiter/jobs", get(jobs::recruiter_jobs::<N>))
        .route("/applications/mine", get(applications::mine::<N>))
        .route(
            "/applications/:id/status",
            patch(applications::update_status::<N>),
        )
        .with_state(service)
}
