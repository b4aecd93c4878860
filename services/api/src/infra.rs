use chrono::SecondsFormat;
use hireloop::marketplace::applications::NotifyError;
use hireloop::marketplace::{StatusChangeEvent, StatusNotifier};
use hireloop::persistence::Database;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) database: Database,
}

/// Delivers status changes to the service log until a mail relay is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct LoggingNotifier;

impl StatusNotifier for LoggingNotifier {
    fn publish(&self, event: StatusChangeEvent) -> Result<(), NotifyError> {
        info!(
            application_id = %event.application_id,
            job_id = %event.job_id,
            student_id = %event.student_id,
            from = %event.previous_status,
            to = %event.status,
            changed_at = %event.changed_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            "student notified of application status change"
        );
        Ok(())
    }
}
