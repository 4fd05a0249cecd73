//! OPNC E2E Integration Suite
//!
//! Drives a real browser through the SSO/OAuth2 login and configuration
//! flows of the three applications (Keycloak, Nextcloud, OpenProject) and
//! gates test execution on the cluster's setup job.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Test Runner (Rust)                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │  TestRunner                                                  │
//! │    ├── ensure_setup_ready()  -> JobWaiter (kubectl polling)  │
//! │    ├── run_flow(flow)        -> PlaywrightDriver (node)      │
//! │    └── write_results()       -> test-results/results.json    │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Flow (one canonical flow per scenario)                      │
//! │    └── steps: Vec<Step>, built by page objects               │
//! │          Step::Goto / Fill / Click / WaitVisible / Expect*   │
//! │          Locator: closed descriptor enum -> Playwright expr  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Page objects never touch the browser: they are pure step builders, and a
//! whole flow is compiled into one Playwright script so session state (SSO
//! cookies, redirects) survives across steps.

pub mod api;
pub mod error;
pub mod flows;
pub mod locator;
pub mod pages;
pub mod playwright;
pub mod runner;
pub mod setup;
pub mod step;

pub use error::{E2eError, E2eResult};
pub use flows::Flow;
pub use locator::Locator;
pub use playwright::{PlaywrightConfig, PlaywrightDriver};
pub use runner::TestRunner;
pub use setup::{JobQuery, JobWaiter, KubectlQuery, WaitOptions};
pub use step::Step;
