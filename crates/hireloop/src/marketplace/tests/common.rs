use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use serde_json::Value;

use crate::marketplace::accounts::{AccountRepository, NewAccount, Role, UserId};
use crate::marketplace::api::{ROLE_HEADER, USER_ID_HEADER};
use crate::marketplace::applications::{
    NotifyError, StatusChangeEvent, StatusNotifier, TransitionPolicy,
};
use crate::marketplace::jobs::{Job, NewJob};
use crate::marketplace::service::LifecycleService;
use crate::persistence::Database;

pub(super) struct Fixture<N = MemoryNotifier> {
    pub(super) db: Database,
    pub(super) service: Arc<LifecycleService<N>>,
    pub(super) notifier: Arc<N>,
    pub(super) recruiter: UserId,
    pub(super) rival_recruiter: UserId,
    pub(super) student: UserId,
    pub(super) second_student: UserId,
}

pub(super) async fn fixture() -> Fixture {
    fixture_with(TransitionPolicy::Permissive, MemoryNotifier::default()).await
}

pub(super) async fn fixture_with<N>(policy: TransitionPolicy, notifier: N) -> Fixture<N>
where
    N: StatusNotifier + 'static,
{
    let db = Database::in_memory().await.expect("in-memory database");
    let accounts = AccountRepository::new(db.clone());
    let recruiter = register(&accounts, "Rae Recruiter", "rae@acme.test", Role::Recruiter).await;
    let rival_recruiter =
        register(&accounts, "Rob Rival", "rob@globex.test", Role::Recruiter).await;
    let student = register(&accounts, "Sam Student", "sam@uni.test", Role::Student).await;
    let second_student = register(&accounts, "Sky Student", "sky@uni.test", Role::Student).await;

    let notifier = Arc::new(notifier);
    let service = Arc::new(LifecycleService::new(db.clone(), policy, notifier.clone()));
    Fixture {
        db,
        service,
        notifier,
        recruiter,
        rival_recruiter,
        student,
        second_student,
    }
}

async fn register(accounts: &AccountRepository, name: &str, email: &str, role: Role) -> UserId {
    accounts
        .register(NewAccount {
            name: name.to_string(),
            email: email.to_string(),
            role,
        })
        .await
        .expect("account registered")
        .id
}

pub(super) fn new_job(title: &str) -> NewJob {
    NewJob {
        title: title.to_string(),
        description: format!("{title} working on the campus marketplace"),
        location: Some("Berlin".to_string()),
        job_type: Some("Remote".to_string()),
        ..NewJob::default()
    }
}

impl<N> Fixture<N>
where
    N: StatusNotifier + 'static,
{
    pub(super) async fn post_job(&self, title: &str) -> Job {
        self.service
            .create_job(self.recruiter, new_job(title))
            .await
            .expect("job created")
    }
}

/// Records every published event.
#[derive(Default)]
pub(super) struct MemoryNotifier {
    events: Mutex<Vec<StatusChangeEvent>>,
}

impl MemoryNotifier {
    pub(super) fn events(&self) -> Vec<StatusChangeEvent> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

impl StatusNotifier for MemoryNotifier {
    fn publish(&self, event: StatusChangeEvent) -> Result<(), NotifyError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(event);
        Ok(())
    }
}

pub(super) struct FailingNotifier;

impl StatusNotifier for FailingNotifier {
    fn publish(&self, _event: StatusChangeEvent) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("mail relay offline".to_string()))
    }
}

pub(super) fn request(
    method: Method,
    uri: &str,
    caller: Option<(UserId, Role)>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((user_id, role)) = caller {
        builder = builder
            .header(USER_ID_HEADER, user_id.0.to_string())
            .header(ROLE_HEADER, role.label());
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&json).expect("serialize body"))
        }
        None => Body::empty(),
    };
    builder.body(body).expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
