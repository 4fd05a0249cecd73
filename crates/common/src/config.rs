//! Suite configuration
//!
//! Loaded once at process start from the environment's `config.yaml` and
//! passed by reference to every consumer. Environment variables override the
//! file so CI can pin versions and point the suite at pre-deployed hosts.

use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

/// Result type alias for configuration loading
pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("unknown setup method '{0}' (expected oauth2, sso-nextcloud or sso-external)")]
    SetupMethod(String),
}

/// How the three applications were wired together by the setup job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupMethod {
    OAuth2,
    SsoNextcloud,
    SsoExternal,
}

impl SetupMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetupMethod::OAuth2 => "oauth2",
            SetupMethod::SsoNextcloud => "sso-nextcloud",
            SetupMethod::SsoExternal => "sso-external",
        }
    }
}

impl fmt::Display for SetupMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SetupMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "oauth2" => Ok(SetupMethod::OAuth2),
            "sso-nextcloud" => Ok(SetupMethod::SsoNextcloud),
            "sso-external" => Ok(SetupMethod::SsoExternal),
            other => Err(ConfigError::SetupMethod(other.to_string())),
        }
    }
}

/// Version and host of one application under test
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub version: String,
    pub host: String,
}

/// Nextcloud additionally carries the integration app version
#[derive(Debug, Clone)]
pub struct NextcloudConfig {
    pub version: String,
    pub host: String,
    pub integration_app_version: String,
}

/// Resolved suite configuration
#[derive(Debug, Clone)]
pub struct TestConfig {
    pub setup_method: SetupMethod,
    pub openproject: ServiceConfig,
    pub nextcloud: NextcloudConfig,
    pub keycloak: ServiceConfig,
    /// Namespace the setup job runs in
    pub namespace: String,
    /// Skip the setup-job readiness gate entirely
    pub skip_setup_check: bool,
    openproject_url: String,
    nextcloud_url: String,
    keycloak_url: String,
}

// Raw shape of environments/default/config.yaml. Every field is optional;
// the loader supplies defaults for anything the file leaves out.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    integration: Option<RawIntegration>,
    openproject: Option<RawService>,
    nextcloud: Option<RawNextcloud>,
    keycloak: Option<RawService>,
}

#[derive(Debug, Deserialize)]
struct RawIntegration {
    #[serde(rename = "setupMethod")]
    setup_method: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawService {
    version: Option<String>,
    host: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawNextcloud {
    version: Option<String>,
    host: Option<String>,
    #[serde(rename = "enableApps", default)]
    enable_apps: Vec<RawApp>,
}

#[derive(Debug, Deserialize)]
struct RawApp {
    name: String,
    version: Option<String>,
}

const DEFAULT_NAMESPACE: &str = "opnc-integration";
const INTEGRATION_APP_NAME: &str = "integration_openproject";

impl TestConfig {
    /// Read the config file and resolve it against the process environment.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_yaml_with_env(&content, &|key| std::env::var(key).ok())?;

        info!(
            method = %config.setup_method,
            openproject = %config.openproject.version,
            nextcloud = %config.nextcloud.version,
            keycloak = %config.keycloak.version,
            namespace = %config.namespace,
            "test configuration resolved"
        );

        Ok(config)
    }

    /// Resolve a config from YAML text with an injected environment lookup.
    ///
    /// Precedence per value: environment variable, then the YAML file, then
    /// the suite default.
    pub fn from_yaml_with_env(
        yaml: &str,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let raw: RawConfig = if yaml.trim().is_empty() {
            RawConfig::default()
        } else {
            serde_yaml::from_str(yaml)?
        };

        let setup_method = env("SETUP_METHOD")
            .or_else(|| raw.integration.as_ref().and_then(|i| i.setup_method.clone()))
            .unwrap_or_else(|| "oauth2".to_string())
            .parse::<SetupMethod>()?;

        let openproject_version = env("OPENPROJECT_VERSION")
            .or_else(|| raw.openproject.as_ref().and_then(|s| s.version.clone()))
            .unwrap_or_else(|| "16".to_string());
        let openproject_host = raw
            .openproject
            .as_ref()
            .and_then(|s| s.host.clone())
            .unwrap_or_else(|| "openproject.test".to_string());

        let nextcloud_version = env("NEXTCLOUD_VERSION")
            .or_else(|| raw.nextcloud.as_ref().and_then(|s| s.version.clone()))
            .unwrap_or_else(|| "32".to_string());
        let nextcloud_host = raw
            .nextcloud
            .as_ref()
            .and_then(|s| s.host.clone())
            .unwrap_or_else(|| "nextcloud.test".to_string());
        let integration_app_version = env("INTEGRATION_APP_VERSION")
            .or_else(|| {
                raw.nextcloud.as_ref().and_then(|n| {
                    n.enable_apps
                        .iter()
                        .find(|app| app.name == INTEGRATION_APP_NAME)
                        .and_then(|app| app.version.clone())
                })
            })
            .unwrap_or_default();

        let keycloak_version = env("KEYCLOAK_VERSION")
            .or_else(|| raw.keycloak.as_ref().and_then(|s| s.version.clone()))
            .unwrap_or_else(|| "26.2.5".to_string());
        let keycloak_host = raw
            .keycloak
            .as_ref()
            .and_then(|s| s.host.clone())
            .unwrap_or_else(|| "keycloak.test".to_string());

        let openproject_url =
            env("OPENPROJECT_URL").unwrap_or_else(|| format!("https://{openproject_host}"));
        let nextcloud_url =
            env("NEXTCLOUD_URL").unwrap_or_else(|| format!("https://{nextcloud_host}"));
        let keycloak_url =
            env("KEYCLOAK_URL").unwrap_or_else(|| format!("https://{keycloak_host}"));

        let namespace =
            env("KUBERNETES_NAMESPACE").unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
        let skip_setup_check =
            env("SKIP_SETUP_JOB_CHECK").map(|v| v == "true").unwrap_or(false);

        Ok(TestConfig {
            setup_method,
            openproject: ServiceConfig {
                version: openproject_version,
                host: openproject_host,
            },
            nextcloud: NextcloudConfig {
                version: nextcloud_version,
                host: nextcloud_host,
                integration_app_version,
            },
            keycloak: ServiceConfig {
                version: keycloak_version,
                host: keycloak_host,
            },
            namespace,
            skip_setup_check,
            openproject_url,
            nextcloud_url,
            keycloak_url,
        })
    }

    pub fn openproject_base_url(&self) -> &str {
        &self.openproject_url
    }

    pub fn nextcloud_base_url(&self) -> &str {
        &self.nextcloud_url
    }

    pub fn keycloak_base_url(&self) -> &str {
        &self.keycloak_url
    }
}
