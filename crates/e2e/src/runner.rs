//! Suite runner
//!
//! Selects the flows matching the configured setup method, drives each one
//! through the Playwright driver, and writes a JSON results file. Also owns
//! the setup-job gate that blocks the suite until the cluster is provisioned.

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use tracing::{error, info, warn};

use opnc_common::TestConfig;

use crate::error::E2eResult;
use crate::flows::{self, Flow};
use crate::playwright::PlaywrightDriver;
use crate::setup::{JobQuery, JobWaiter, DEFAULT_JOB_NAME};

/// Outcome of one flow
#[derive(Debug, Clone, Serialize)]
pub struct FlowResult {
    pub name: String,
    pub success: bool,
    pub skipped: bool,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of a whole run, written to the results file
#[derive(Debug, Serialize)]
pub struct SuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub setup_method: String,
    pub generated_at: String,
    pub results: Vec<FlowResult>,
}

impl SuiteResult {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

pub struct TestRunner {
    config: TestConfig,
    driver: PlaywrightDriver,
    output_dir: PathBuf,
}

impl TestRunner {
    pub fn new(config: TestConfig, driver: PlaywrightDriver, output_dir: &Path) -> Self {
        Self {
            config,
            driver,
            output_dir: output_dir.to_path_buf(),
        }
    }

    /// Run one flow against the browser. Flows for other setup methods are
    /// reported as skipped, not failed.
    pub async fn run_flow(&self, flow: &Flow) -> FlowResult {
        if flow.method != self.config.setup_method {
            return FlowResult {
                name: flow.name.to_string(),
                success: true,
                skipped: true,
                duration_ms: 0,
                error: None,
            };
        }

        info!(flow = flow.name, "running: {}", flow.description);
        let started = Instant::now();
        let outcome = self.driver.run(&flow.steps).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(()) => {
                info!(flow = flow.name, duration_ms, "✓ passed");
                FlowResult {
                    name: flow.name.to_string(),
                    success: true,
                    skipped: false,
                    duration_ms,
                    error: None,
                }
            }
            Err(err) => {
                error!(flow = flow.name, duration_ms, "✗ failed: {err}");
                FlowResult {
                    name: flow.name.to_string(),
                    success: false,
                    skipped: false,
                    duration_ms,
                    error: Some(err.to_string()),
                }
            }
        }
    }

    /// Run every known flow, optionally filtered by name substring.
    pub async fn run_all(&self, name_filter: Option<&str>) -> E2eResult<SuiteResult> {
        let flows: Vec<Flow> = flows::all(&self.config)
            .into_iter()
            .filter(|f| name_filter.map_or(true, |needle| f.name.contains(needle)))
            .collect();

        if flows.is_empty() {
            warn!("no flows matched the filter");
        }
        info!(
            method = %self.config.setup_method,
            count = flows.len(),
            "starting integration suite"
        );

        let started = Instant::now();
        let mut results = Vec::with_capacity(flows.len());
        for flow in &flows {
            results.push(self.run_flow(flow).await);
        }

        let skipped = results.iter().filter(|r| r.skipped).count();
        let passed = results.iter().filter(|r| r.success && !r.skipped).count();
        let failed = results.iter().filter(|r| !r.success).count();
        let suite = SuiteResult {
            total: results.len(),
            passed,
            failed,
            skipped,
            duration_ms: started.elapsed().as_millis() as u64,
            setup_method: self.config.setup_method.to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            results,
        };

        info!(
            passed = suite.passed,
            failed = suite.failed,
            skipped = suite.skipped,
            duration_ms = suite.duration_ms,
            "suite finished"
        );
        Ok(suite)
    }

    /// Persist the suite result as JSON under the output directory.
    pub fn write_results(&self, suite: &SuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join("results.json");
        std::fs::write(&path, serde_json::to_string_pretty(suite)?)?;
        info!(path = %path.display(), "wrote results");
        Ok(path)
    }
}

/// Gate the suite on the cluster's setup job.
///
/// An absent job is only a warning: environments provisioned by other means
/// have no setup job to wait for. A present job must reach the Complete
/// condition before tests may run.
pub async fn ensure_setup_ready<Q: JobQuery>(
    config: &TestConfig,
    waiter: &JobWaiter<Q>,
) -> E2eResult<()> {
    if config.skip_setup_check {
        info!("setup job check skipped by configuration");
        return Ok(());
    }

    let job = DEFAULT_JOB_NAME;
    let namespace = &config.namespace;

    if !waiter.job_exists(job, namespace).await {
        warn!(job, namespace, "setup job not found; assuming environment is pre-provisioned");
        return Ok(());
    }
    if waiter.is_job_complete(job, namespace).await {
        info!(job, namespace, "setup job already complete");
        return Ok(());
    }

    info!(job, namespace, "waiting for setup job to complete");
    waiter.wait_for_complete(job, namespace).await
}
