//! Setup-job readiness poller
//!
//! The cluster deploys a batch job that provisions realms, clients and users
//! before any flow can pass. This module blocks the test bootstrap until that
//! job reaches a terminal state: it re-fetches the job's `Complete`/`Failed`
//! conditions on a fixed interval, tolerates transient query errors, and
//! surfaces failure or timeout with enough diagnostics to act on.
//!
//! The orchestrator is reached through the [`JobQuery`] trait so tests can
//! script the condition sequences; [`KubectlQuery`] is the production
//! implementation shelling out to `kubectl`.

use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{info, warn};

use crate::error::{E2eError, E2eResult};

/// Name the setup chart gives the provisioning job
pub const DEFAULT_JOB_NAME: &str = "setup-job";

const LOG_TAIL_LINES: u32 = 50;
const LOGS_UNAVAILABLE: &str = "could not retrieve logs";
const TRUE_STATUS: &str = "True";

/// Condition types reported on a batch job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobCondition {
    Complete,
    Failed,
}

impl JobCondition {
    /// jsonpath selecting this condition's status string
    pub fn jsonpath(&self) -> &'static str {
        match self {
            JobCondition::Complete => r#"{.status.conditions[?(@.type=="Complete")].status}"#,
            JobCondition::Failed => r#"{.status.conditions[?(@.type=="Failed")].status}"#,
        }
    }
}

/// Snapshot of the job's reported state, re-fetched on every poll tick
#[derive(Debug, Clone, Default)]
pub struct JobStatus {
    pub exists: bool,
    pub complete: bool,
    pub failed: bool,
    /// Raw condition text, kept for progress lines and error reporting
    pub raw: String,
}

/// Read-only orchestrator interface for a named batch job
#[async_trait]
pub trait JobQuery: Send + Sync {
    /// Status string of one condition type; empty when the condition (or the
    /// job's status) is absent.
    async fn condition_status(
        &self,
        job: &str,
        namespace: &str,
        condition: JobCondition,
    ) -> E2eResult<String>;

    /// Whole `.status` payload, used only for diagnostics.
    async fn raw_status(&self, job: &str, namespace: &str) -> E2eResult<String>;

    /// Whether the job resource is present in the namespace.
    async fn exists(&self, job: &str, namespace: &str) -> E2eResult<bool>;

    /// Trailing log lines from the pods labelled with the job's name.
    async fn recent_logs(&self, job: &str, namespace: &str, tail: u32) -> E2eResult<String>;
}

/// `kubectl`-backed [`JobQuery`] implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct KubectlQuery;

impl KubectlQuery {
    async fn kubectl(args: &[&str]) -> E2eResult<String> {
        let output = Command::new("kubectl").args(args).output().await?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            Err(E2eError::Orchestrator(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ))
        }
    }
}

#[async_trait]
impl JobQuery for KubectlQuery {
    async fn condition_status(
        &self,
        job: &str,
        namespace: &str,
        condition: JobCondition,
    ) -> E2eResult<String> {
        let jsonpath = format!("-o=jsonpath={}", condition.jsonpath());
        Self::kubectl(&["get", "job", job, "-n", namespace, &jsonpath]).await
    }

    async fn raw_status(&self, job: &str, namespace: &str) -> E2eResult<String> {
        Self::kubectl(&["get", "job", job, "-n", namespace, "-o=jsonpath={.status}"]).await
    }

    async fn exists(&self, job: &str, namespace: &str) -> E2eResult<bool> {
        match Self::kubectl(&["get", "job", job, "-n", namespace]).await {
            Ok(_) => Ok(true),
            Err(E2eError::Orchestrator(message)) if is_not_found(&message) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn recent_logs(&self, job: &str, namespace: &str, tail: u32) -> E2eResult<String> {
        let selector = format!("job-name={job}");
        let tail = format!("--tail={tail}");
        Self::kubectl(&["logs", "-n", namespace, "-l", &selector, &tail]).await
    }
}

/// Messages kubectl emits when the resource is genuinely absent, as opposed
/// to a transient API hiccup.
fn is_not_found(message: &str) -> bool {
    message.contains("not found")
        || message.contains("NotFound")
        || message.contains("No resources found")
}

/// Bounds of one wait call
#[derive(Debug, Clone, Copy)]
pub struct WaitOptions {
    pub max_wait: Duration,
    pub poll_interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            max_wait: Duration::from_secs(900),
            poll_interval: Duration::from_secs(5),
        }
    }
}

/// Polls a named batch job until it reaches a terminal state
pub struct JobWaiter<Q> {
    query: Q,
    options: WaitOptions,
}

impl<Q: JobQuery> JobWaiter<Q> {
    pub fn new(query: Q) -> Self {
        Self::with_options(query, WaitOptions::default())
    }

    pub fn with_options(query: Q, options: WaitOptions) -> Self {
        Self { query, options }
    }

    /// Whether the job resource is present. Never errors: any query failure
    /// reads as "absent".
    pub async fn job_exists(&self, job: &str, namespace: &str) -> bool {
        self.query.exists(job, namespace).await.unwrap_or(false)
    }

    /// True only when the Complete condition reads exactly `"True"`. A query
    /// error reads as "not yet complete", not as a hard failure.
    pub async fn is_job_complete(&self, job: &str, namespace: &str) -> bool {
        self.query
            .condition_status(job, namespace, JobCondition::Complete)
            .await
            .map(|status| status == TRUE_STATUS)
            .unwrap_or(false)
    }

    /// One poll tick. The Failed condition is only queried once Complete
    /// reads true; failure takes precedence when both are reported.
    async fn snapshot(&self, job: &str, namespace: &str) -> E2eResult<JobStatus> {
        let raw = self
            .query
            .condition_status(job, namespace, JobCondition::Complete)
            .await?;
        let complete = raw == TRUE_STATUS;
        let failed = complete
            && self
                .query
                .condition_status(job, namespace, JobCondition::Failed)
                .await?
                == TRUE_STATUS;

        Ok(JobStatus {
            exists: true,
            complete,
            failed,
            raw,
        })
    }

    /// Block until the job completes successfully.
    ///
    /// Returns [`E2eError::JobFailed`] (with trailing pod logs) when the job
    /// reports a Failed condition, and [`E2eError::JobTimeout`] (with elapsed
    /// seconds and the last known status payload) when `max_wait` elapses
    /// first. Transient query errors are logged at warn level and retried on
    /// the next tick.
    pub async fn wait_for_complete(&self, job: &str, namespace: &str) -> E2eResult<()> {
        let start = Instant::now();
        let mut last_logged = String::new();

        info!(job, namespace, "waiting for setup job to complete");

        while start.elapsed() < self.options.max_wait {
            match self.snapshot(job, namespace).await {
                Ok(status) if status.failed => {
                    let logs = self
                        .query
                        .recent_logs(job, namespace, LOG_TAIL_LINES)
                        .await
                        .unwrap_or_else(|_| LOGS_UNAVAILABLE.to_string());
                    return Err(E2eError::JobFailed { logs });
                }
                Ok(status) if status.complete => {
                    info!(
                        job,
                        elapsed_secs = start.elapsed().as_secs(),
                        "setup job completed successfully"
                    );
                    return Ok(());
                }
                Ok(status) => {
                    let display = if status.raw.is_empty() {
                        "Pending"
                    } else {
                        status.raw.as_str()
                    };
                    if let Some(line) = progress_line(&mut last_logged, display, start.elapsed()) {
                        info!(job, "{line}");
                    }
                }
                Err(err) => {
                    // The job may simply not be scheduled yet; anything else
                    // transient keeps the wait alive.
                    if !is_not_found(&err.to_string()) {
                        warn!(job, error = %err, "transient error checking setup job");
                    }
                }
            }

            tokio::time::sleep(self.options.poll_interval).await;
        }

        let last_status = self
            .query
            .raw_status(job, namespace)
            .await
            .unwrap_or_else(|err| format!("unavailable: {err}"));
        Err(E2eError::JobTimeout {
            elapsed_secs: start.elapsed().as_secs(),
            last_status,
        })
    }
}

/// Progress line for a status value, emitted only when the status changed
/// since the previous line. Keeps a 15-minute wait from logging the same
/// "Pending" 180 times.
fn progress_line(last: &mut String, status: &str, elapsed: Duration) -> Option<String> {
    if status == last {
        return None;
    }
    *last = status.to_string();
    Some(format!("status: {status} ({}s elapsed)", elapsed.as_secs()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted [`JobQuery`]: each call pops the next entry of the relevant
    /// sequence; the last entry repeats once the sequence is exhausted.
    #[derive(Default)]
    struct ScriptedQuery {
        complete: Mutex<Vec<Result<String, String>>>,
        failed: Mutex<Vec<Result<String, String>>>,
        exists: Option<Result<bool, String>>,
        logs: Option<String>,
        status_payload: String,
        log_fetches: AtomicUsize,
        complete_polls: AtomicUsize,
    }

    fn take(seq: &Mutex<Vec<Result<String, String>>>) -> Result<String, String> {
        let mut seq = seq.lock().unwrap();
        if seq.len() > 1 {
            seq.remove(0)
        } else {
            seq.first().cloned().unwrap_or(Ok(String::new()))
        }
    }

    fn oks(values: &[&str]) -> Vec<Result<String, String>> {
        values.iter().map(|v| Ok(v.to_string())).collect()
    }

    #[async_trait]
    impl JobQuery for ScriptedQuery {
        async fn condition_status(
            &self,
            _job: &str,
            _namespace: &str,
            condition: JobCondition,
        ) -> E2eResult<String> {
            let result = match condition {
                JobCondition::Complete => {
                    self.complete_polls.fetch_add(1, Ordering::SeqCst);
                    take(&self.complete)
                }
                JobCondition::Failed => take(&self.failed),
            };
            result.map_err(E2eError::Orchestrator)
        }

        async fn raw_status(&self, _job: &str, _namespace: &str) -> E2eResult<String> {
            Ok(self.status_payload.clone())
        }

        async fn exists(&self, _job: &str, _namespace: &str) -> E2eResult<bool> {
            match self.exists.clone() {
                Some(Ok(v)) => Ok(v),
                Some(Err(msg)) => Err(E2eError::Orchestrator(msg)),
                None => Ok(true),
            }
        }

        async fn recent_logs(&self, _job: &str, _namespace: &str, _tail: u32) -> E2eResult<String> {
            self.log_fetches.fetch_add(1, Ordering::SeqCst);
            self.logs
                .clone()
                .ok_or_else(|| E2eError::Orchestrator("pods not found".into()))
        }
    }

    fn fast_options() -> WaitOptions {
        WaitOptions {
            max_wait: Duration::from_millis(500),
            poll_interval: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn completes_without_fetching_logs() {
        let query = ScriptedQuery {
            complete: Mutex::new(oks(&["", "", "True"])),
            failed: Mutex::new(oks(&["False", "False", "False"])),
            ..Default::default()
        };
        let waiter = JobWaiter::with_options(query, fast_options());

        waiter
            .wait_for_complete("setup-job", "opnc-integration")
            .await
            .unwrap();

        assert_eq!(waiter.query.complete_polls.load(Ordering::SeqCst), 3);
        assert_eq!(waiter.query.log_fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_condition_embeds_job_logs() {
        let query = ScriptedQuery {
            complete: Mutex::new(oks(&["True"])),
            failed: Mutex::new(oks(&["True"])),
            logs: Some("realm import crashed: duplicate client id".into()),
            ..Default::default()
        };
        let waiter = JobWaiter::with_options(query, fast_options());

        let err = waiter
            .wait_for_complete("setup-job", "opnc-integration")
            .await
            .unwrap_err();

        assert!(matches!(err, E2eError::JobFailed { .. }));
        assert!(err.to_string().contains("duplicate client id"));
    }

    #[tokio::test]
    async fn failed_logs_fall_back_to_placeholder() {
        let query = ScriptedQuery {
            complete: Mutex::new(oks(&["True"])),
            failed: Mutex::new(oks(&["True"])),
            logs: None,
            ..Default::default()
        };
        let waiter = JobWaiter::with_options(query, fast_options());

        let err = waiter
            .wait_for_complete("setup-job", "opnc-integration")
            .await
            .unwrap_err();

        assert!(err.to_string().contains(LOGS_UNAVAILABLE));
    }

    #[tokio::test]
    async fn times_out_with_elapsed_and_last_status() {
        let query = ScriptedQuery {
            complete: Mutex::new(oks(&[""])),
            status_payload: r#"{"active":1}"#.into(),
            ..Default::default()
        };
        let options = WaitOptions {
            max_wait: Duration::from_millis(50),
            poll_interval: Duration::from_millis(10),
        };
        let waiter = JobWaiter::with_options(query, options);

        let start = Instant::now();
        let err = waiter
            .wait_for_complete("setup-job", "opnc-integration")
            .await
            .unwrap_err();

        assert!(start.elapsed() < Duration::from_millis(200));
        match &err {
            E2eError::JobTimeout { last_status, .. } => {
                assert_eq!(last_status, r#"{"active":1}"#);
            }
            other => panic!("expected JobTimeout, got {other:?}"),
        }
        // The message carries the elapsed seconds for the report.
        assert!(err.to_string().contains("did not complete within 0s"));
    }

    #[tokio::test]
    async fn transient_errors_keep_the_wait_alive() {
        let query = ScriptedQuery {
            complete: Mutex::new(vec![
                Err("connection refused".into()),
                Err("etcdserver: request timed out".into()),
                Ok("True".into()),
            ]),
            failed: Mutex::new(oks(&["False"])),
            ..Default::default()
        };
        let waiter = JobWaiter::with_options(query, fast_options());

        waiter
            .wait_for_complete("setup-job", "opnc-integration")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn job_exists_never_errors() {
        let broken = ScriptedQuery {
            exists: Some(Err("jobs.batch \"setup-job\" not found".into())),
            ..Default::default()
        };
        let waiter = JobWaiter::with_options(broken, fast_options());
        assert!(!waiter.job_exists("setup-job", "opnc-integration").await);

        let present = ScriptedQuery {
            exists: Some(Ok(true)),
            ..Default::default()
        };
        let waiter = JobWaiter::with_options(present, fast_options());
        assert!(waiter.job_exists("setup-job", "opnc-integration").await);
    }

    #[tokio::test]
    async fn is_job_complete_requires_exact_true() {
        for (status, expected) in [("True", true), ("true", false), ("False", false), ("", false)]
        {
            let query = ScriptedQuery {
                complete: Mutex::new(oks(&[status])),
                ..Default::default()
            };
            let waiter = JobWaiter::with_options(query, fast_options());
            assert_eq!(
                waiter.is_job_complete("setup-job", "opnc-integration").await,
                expected,
                "status {status:?}"
            );
        }

        let erroring = ScriptedQuery {
            complete: Mutex::new(vec![Err("connection refused".into())]),
            ..Default::default()
        };
        let waiter = JobWaiter::with_options(erroring, fast_options());
        assert!(!waiter.is_job_complete("setup-job", "opnc-integration").await);
    }

    #[test]
    fn progress_line_is_idempotent_per_status() {
        let mut last = String::new();
        let tick = Duration::from_secs(5);

        assert!(progress_line(&mut last, "Pending", tick).is_some());
        assert!(progress_line(&mut last, "Pending", tick).is_none());
        assert!(progress_line(&mut last, "Pending", tick * 2).is_none());
        assert!(progress_line(&mut last, "False", tick * 3).is_some());
        assert!(progress_line(&mut last, "False", tick * 4).is_none());
    }

    #[test]
    fn not_found_detection() {
        assert!(is_not_found("Error from server (NotFound): jobs.batch \"setup-job\" not found"));
        assert!(is_not_found("No resources found in opnc-integration namespace."));
        assert!(!is_not_found("Unable to connect to the server: dial tcp: i/o timeout"));
    }
}
