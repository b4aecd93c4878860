use clap::Args;
use hireloop::error::AppError;
use hireloop::marketplace::applications::NotifyError;
use hireloop::marketplace::{
    AccountRepository, Job, JobChanges, JobSearch, JobSearchParams, LifecycleService, NewAccount,
    NewJob, RepositoryError, Role, SalaryInput, StatusChangeEvent, StatusNotifier,
    TransitionPolicy, UserId,
};
use hireloop::persistence::Database;
use std::sync::{Arc, Mutex};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Only accept status changes along the review graph.
    #[arg(long)]
    pub(crate) strict: bool,
    /// Number of extra remote postings seeded to show pagination.
    #[arg(long, default_value_t = 12)]
    pub(crate) filler_jobs: u32,
}

#[derive(Default)]
struct RecordingNotifier {
    events: Mutex<Vec<StatusChangeEvent>>,
}

impl RecordingNotifier {
    fn drain(&self) -> Vec<StatusChangeEvent> {
        match self.events.lock() {
            Ok(mut guard) => guard.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl StatusNotifier for RecordingNotifier {
    fn publish(&self, event: StatusChangeEvent) -> Result<(), NotifyError> {
        self.events
            .lock()
            .map_err(|_| NotifyError::Transport("demo inbox poisoned".to_string()))?
            .push(event);
        Ok(())
    }
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let policy = if args.strict {
        TransitionPolicy::Strict
    } else {
        TransitionPolicy::Permissive
    };

    println!("Job lifecycle demo ({policy:?} transitions, in-memory store)");
    let database = Database::in_memory().await?;
    let notifier = Arc::new(RecordingNotifier::default());
    let service = LifecycleService::new(database.clone(), policy, notifier.clone());

    let Some(cast) = seed_accounts(&database).await else {
        return Ok(());
    };

    println!("\nPosting jobs");
    let job = match service.create_job(cast.recruiter, flagship_job()).await {
        Ok(job) => job,
        Err(err) => {
            println!("  Posting rejected: {err}");
            return Ok(());
        }
    };
    print_job("created", &job);
    for n in 0..args.filler_jobs {
        let filler = NewJob {
            title: format!("Remote support shift #{}", n + 1),
            description: "Answer student questions over chat".to_string(),
            job_type: Some("Remote".to_string()),
            ..NewJob::default()
        };
        if let Err(err) = service.create_job(cast.recruiter, filler).await {
            println!("  Filler posting rejected: {err}");
        }
    }
    println!("  + {} remote filler postings", args.filler_jobs);

    let denied = service.create_job(cast.student, flagship_job()).await;
    report_expected("student posting a job", denied.map(|_| ()));

    println!("\nSearching");
    let params = JobSearchParams {
        job_type: Some("Remote".to_string()),
        page: Some("2".to_string()),
        limit: Some("10".to_string()),
        ..JobSearchParams::default()
    };
    match JobSearch::try_from(params) {
        Ok(search) => match service.search_jobs(&search).await {
            Ok(page) => {
                println!(
                    "- Remote jobs page {}/{}: {} of {} total",
                    page.page,
                    page.total_pages,
                    page.items.len(),
                    page.total_count
                );
                for item in page.items.iter().take(3) {
                    println!("  - #{} {}", item.id, item.title);
                }
            }
            Err(err) => println!("  Search failed: {err}"),
        },
        Err(err) => println!("  Search rejected: {err}"),
    }

    println!("\nEditing the flagship posting");
    let changes = JobChanges {
        salary: Some(SalaryInput::Structured {
            min: Some(52_000),
            max: Some(60_000),
            unit: None,
            currency: Some("eur".to_string()),
        }),
        skills: Some(vec!["Rust".to_string(), "PostgreSQL".to_string(), "Tokio".to_string()]),
        ..JobChanges::default()
    };
    match service.update_job(job.id, cast.recruiter, changes).await {
        Ok(updated) => print_job("updated", &updated),
        Err(err) => println!("  Update rejected: {err}"),
    }
    let hijack = service
        .change_job_status(job.id, cast.rival, "Inactive")
        .await;
    report_expected("rival recruiter closing the posting", hijack.map(|_| ()));

    println!("\nApplying");
    let application = match service
        .apply(
            job.id,
            cast.student,
            Some("I maintain two crates and love databases.".to_string()),
        )
        .await
    {
        Ok(application) => application,
        Err(err) => {
            println!("  Application rejected: {err}");
            return Ok(());
        }
    };
    println!(
        "- Application #{} from student {} -> {}",
        application.id, application.student_id, application.status
    );
    let duplicate = service.apply(job.id, cast.student, None).await;
    report_expected("applying twice", duplicate.map(|_| ()));

    println!("\nReviewing");
    for (target, notes) in [
        ("Reviewed", None),
        ("Interviewing", Some("Great systems answers")),
        ("Interviewing", None),
        ("Offered", None),
        ("Hired", Some("Starts in March")),
    ] {
        match service
            .update_application_status(
                application.id,
                cast.recruiter,
                target,
                notes.map(str::to_string),
            )
            .await
        {
            Ok(outcome) if outcome.changed() => println!(
                "- {} -> {} at {}",
                outcome.previous_status,
                outcome.application.status,
                outcome.application.status_changed_at.format("%H:%M:%S%.3f")
            ),
            Ok(outcome) => println!("- {} unchanged (no-op)", outcome.application.status),
            Err(err) => println!("- {target} rejected: {err}"),
        }
    }
    let foreign = service
        .update_application_status(application.id, cast.rival, "Rejected", None)
        .await;
    report_expected("rival recruiter reviewing", foreign.map(|_| ()));

    let events = notifier.drain();
    println!("\nStudent notifications ({})", events.len());
    for event in &events {
        println!(
            "  - application #{}: {} -> {}",
            event.application_id, event.previous_status, event.status
        );
    }

    println!("\nClosing out");
    match service.delete_job(job.id, cast.recruiter).await {
        Ok(deletion) => println!(
            "- Deleted job #{} along with {} application(s)",
            job.id, deletion.removed_applications
        ),
        Err(err) => println!("  Delete rejected: {err}"),
    }

    database.close().await;
    Ok(())
}

struct Cast {
    recruiter: UserId,
    rival: UserId,
    student: UserId,
}

async fn seed_accounts(database: &Database) -> Option<Cast> {
    let accounts = AccountRepository::new(database.clone());
    let people = [
        ("Rae Recruiter", "rae@acme.test", Role::Recruiter),
        ("Rob Rival", "rob@globex.test", Role::Recruiter),
        ("Sam Student", "sam@uni.test", Role::Student),
    ];

    let mut ids = Vec::with_capacity(people.len());
    for (name, email, role) in people {
        let account = NewAccount {
            name: name.to_string(),
            email: email.to_string(),
            role,
        };
        match accounts.register(account).await {
            Ok(account) => ids.push(account.id),
            Err(err) => {
                println!("  Seeding {email} failed: {err}");
                return None;
            }
        }
    }
    if let Err(err) = accounts
        .upsert_company(ids[0], "Acme Robotics", Some("https://acme.test/logo.svg"))
        .await
    {
        println!("  Company card skipped: {err}");
    }

    Some(Cast {
        recruiter: ids[0],
        rival: ids[1],
        student: ids[2],
    })
}

fn flagship_job() -> NewJob {
    NewJob {
        title: "Junior Backend Engineer".to_string(),
        description: "Build the services behind our campus hiring marketplace".to_string(),
        location: Some("Berlin".to_string()),
        salary: Some(SalaryInput::Text("Competitive, DOE".to_string())),
        job_type: Some("Full-time".to_string()),
        skills: vec!["Rust".to_string(), "SQL".to_string()],
        ..NewJob::default()
    }
}

fn print_job(verb: &str, job: &Job) {
    let company = job
        .company
        .as_ref()
        .map(|company| company.name.as_str())
        .unwrap_or("independent recruiter");
    println!(
        "- {verb} #{} {} at {} [{} / {}]",
        job.id,
        job.title,
        company,
        job.job_type.label(),
        job.status.label()
    );
    if !job.skills.is_empty() {
        println!("  Skills: {}", job.skills.join(", "));
    }
    if let Some(salary) = &job.salary {
        match (&salary.text, salary.min, salary.max) {
            (Some(text), _, _) => println!("  Salary: {text}"),
            (None, min, max) => println!(
                "  Salary: {}-{} {}",
                min.map(|value| value.to_string()).unwrap_or_default(),
                max.map(|value| value.to_string()).unwrap_or_default(),
                salary.currency.as_deref().unwrap_or("")
            ),
        }
    }
}

fn report_expected(action: &str, result: Result<(), RepositoryError>) {
    match result {
        Ok(()) => println!("  ! {action} unexpectedly succeeded"),
        Err(err) => println!("  {action}: refused ({err})"),
    }
}
