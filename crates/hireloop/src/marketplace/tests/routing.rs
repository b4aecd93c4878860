use super::common::*;
use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::marketplace::accounts::Role;
use crate::marketplace::api::lifecycle_router;

#[tokio::test]
async fn search_route_returns_paging_envelope() {
    let fx = fixture().await;
    for n in 0..3 {
        fx.post_job(&format!("Remote gig {n}")).await;
    }
    let router = lifecycle_router(fx.service.clone());

    let response = router
        .oneshot(request(
            Method::GET,
            "/jobs?page=2&limit=2&jobType=Remote",
            None,
            None,
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["totalJobs"], 3);
    assert_eq!(payload["totalPages"], 2);
    assert_eq!(payload["currentPage"], 2);
    assert_eq!(payload["jobs"].as_array().map(Vec::len), Some(1));
    assert_eq!(payload["jobs"][0]["jobType"], "Remote");
}

#[tokio::test]
async fn malformed_search_parameters_are_invalid_input() {
    let fx = fixture().await;
    let router = lifecycle_router(fx.service.clone());

    let response = router
        .oneshot(request(Method::GET, "/jobs?salaryRange=lots", None, None))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], "InvalidInput");
}

#[tokio::test]
async fn detail_route_maps_missing_and_malformed_ids() {
    let fx = fixture().await;
    let router = lifecycle_router(fx.service.clone());

    let missing = router
        .clone()
        .oneshot(request(Method::GET, "/jobs/42", None, None))
        .await
        .expect("route executes");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_json_body(missing).await["error"], "NotFound");

    let malformed = router
        .oneshot(request(Method::GET, "/jobs/abc", None, None))
        .await
        .expect("route executes");
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_route_requires_an_authenticated_recruiter() {
    let fx = fixture().await;
    let router = lifecycle_router(fx.service.clone());
    let body = json!({"title": "Data Intern", "description": "Dashboards", "jobType": "Internship"});

    let anonymous = router
        .clone()
        .oneshot(request(Method::POST, "/jobs", None, Some(body.clone())))
        .await
        .expect("route executes");
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_json_body(anonymous).await["error"], "Unauthenticated");

    let student = router
        .clone()
        .oneshot(request(
            Method::POST,
            "/jobs",
            Some((fx.student, Role::Student)),
            Some(body.clone()),
        ))
        .await
        .expect("route executes");
    assert_eq!(student.status(), StatusCode::FORBIDDEN);

    let created = router
        .oneshot(request(
            Method::POST,
            "/jobs",
            Some((fx.recruiter, Role::Recruiter)),
            Some(body),
        ))
        .await
        .expect("route executes");
    assert_eq!(created.status(), StatusCode::CREATED);
    let payload = read_json_body(created).await;
    assert_eq!(payload["status"], "Active");
    assert_eq!(payload["jobType"], "Internship");
    assert_eq!(payload["recruiterId"], fx.recruiter.0);
}

#[tokio::test]
async fn invalid_job_body_is_rejected_before_the_store() {
    let fx = fixture().await;
    let router = lifecycle_router(fx.service.clone());

    let response = router
        .oneshot(request(
            Method::POST,
            "/jobs",
            Some((fx.recruiter, Role::Recruiter)),
            Some(json!({"title": "No description"})),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn foreign_update_is_forbidden_over_http() {
    let fx = fixture().await;
    let job = fx.post_job("Store Clerk").await;
    let router = lifecycle_router(fx.service.clone());

    let response = router
        .oneshot(request(
            Method::PUT,
            &format!("/jobs/{}", job.id),
            Some((fx.rival_recruiter, Role::Recruiter)),
            Some(json!({"title": "Mine now"})),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(read_json_body(response).await["error"], "Forbidden");
    assert_eq!(
        fx.service.job(job.id).await.expect("job present").title,
        "Store Clerk"
    );
}

#[tokio::test]
async fn job_status_and_delete_routes() {
    let fx = fixture().await;
    let job = fx.post_job("Driver").await;
    let router = lifecycle_router(fx.service.clone());
    let owner = Some((fx.recruiter, Role::Recruiter));

    let status = router
        .clone()
        .oneshot(request(
            Method::PATCH,
            &format!("/jobs/{}/status", job.id),
            owner,
            Some(json!({"newStatus": "Inactive"})),
        ))
        .await
        .expect("route executes");
    assert_eq!(status.status(), StatusCode::OK);
    assert_eq!(read_json_body(status).await["status"], "Inactive");

    let deleted = router
        .oneshot(request(
            Method::DELETE,
            &format!("/jobs/{}", job.id),
            owner,
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(deleted.status(), StatusCode::OK);
    assert_eq!(read_json_body(deleted).await["success"], true);
}

#[tokio::test]
async fn apply_route_accepts_empty_body_and_conflicts_on_repeat() {
    let fx = fixture().await;
    let job = fx.post_job("Courier").await;
    let router = lifecycle_router(fx.service.clone());
    let student = Some((fx.student, Role::Student));
    let uri = format!("/jobs/{}/apply", job.id);

    let first = router
        .clone()
        .oneshot(request(Method::POST, &uri, student, None))
        .await
        .expect("route executes");
    assert_eq!(first.status(), StatusCode::CREATED);
    let payload = read_json_body(first).await;
    assert_eq!(payload["status"], "Pending");
    assert_eq!(payload["coverLetter"], serde_json::Value::Null);

    let repeat = router
        .clone()
        .oneshot(request(
            Method::POST,
            &uri,
            student,
            Some(json!({"coverLetter": "Please"})),
        ))
        .await
        .expect("route executes");
    assert_eq!(repeat.status(), StatusCode::CONFLICT);
    assert_eq!(read_json_body(repeat).await["error"], "Conflict");

    let recruiter = router
        .oneshot(request(
            Method::POST,
            &uri,
            Some((fx.recruiter, Role::Recruiter)),
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(recruiter.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn application_status_route_updates_and_lists() {
    let fx = fixture().await;
    let job = fx.post_job("Lifeguard").await;
    let application = fx
        .service
        .apply(job.id, fx.student, None)
        .await
        .expect("application created");
    let router = lifecycle_router(fx.service.clone());
    let owner = Some((fx.recruiter, Role::Recruiter));

    let updated = router
        .clone()
        .oneshot(request(
            Method::PATCH,
            &format!("/applications/{}/status", application.id),
            owner,
            Some(json!({"newStatus": "Offered", "notes": "Certified"})),
        ))
        .await
        .expect("route executes");
    assert_eq!(updated.status(), StatusCode::OK);
    let payload = read_json_body(updated).await;
    assert_eq!(payload["status"], "Offered");
    assert_eq!(payload["recruiterNotes"], "Certified");

    let unknown = router
        .clone()
        .oneshot(request(
            Method::PATCH,
            &format!("/applications/{}/status", application.id),
            owner,
            Some(json!({"newStatus": "Maybe"})),
        ))
        .await
        .expect("route executes");
    assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);

    let listed = router
        .clone()
        .oneshot(request(
            Method::GET,
            &format!("/jobs/{}/applications", job.id),
            owner,
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(listed.status(), StatusCode::OK);
    assert_eq!(read_json_body(listed).await.as_array().map(Vec::len), Some(1));

    let mine = router
        .oneshot(request(
            Method::GET,
            "/applications/mine",
            Some((fx.student, Role::Student)),
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(mine.status(), StatusCode::OK);
    assert_eq!(read_json_body(mine).await[0]["status"], "Offered");
}

#[tokio::test]
async fn recruiter_jobs_route_lists_own_postings() {
    let fx = fixture().await;
    fx.post_job("Analyst").await;
    let router = lifecycle_router(fx.service.clone());

    let response = router
        .oneshot(request(
            Method::GET,
            "/recruiter/jobs",
            Some((fx.rival_recruiter, Role::Recruiter)),
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await, json!([]));
}
