//! OPNC Common Library
//!
//! Shared configuration and test-fixture types for the OPNC integration
//! suite (OpenProject + Nextcloud + Keycloak).

pub mod config;
pub mod users;

pub use config::{ConfigError, SetupMethod, TestConfig};
pub use users::{TestUser, ADMIN_USER, ALICE_USER, BRIAN_USER};

/// Suite version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
