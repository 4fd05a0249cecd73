//! Nextcloud pages

use opnc_common::{TestConfig, TestUser};

use super::Page;
use crate::locator::Locator;
use crate::step::Step;

const DASHBOARD_URL: &str = r".*/apps/dashboard.*";

/// Login form
pub struct LoginPage {
    base_url: String,
}

impl LoginPage {
    pub fn new(config: &TestConfig) -> Self {
        Self {
            base_url: config.nextcloud_base_url().to_string(),
        }
    }

    /// Navigate, authenticate, land on the dashboard.
    pub fn login(&self, user: &TestUser) -> Vec<Step> {
        let mut steps = self.open();
        steps.extend([
            Step::fill(Locator::css("#user"), user.username),
            Step::fill(Locator::css("#password"), user.password),
            Step::click(Locator::role("button", "Log in")),
            Step::wait_for_url(DASHBOARD_URL),
        ]);
        steps
    }
}

impl Page for LoginPage {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn ready_marker(&self) -> Locator {
        Locator::text("Log in to Nextcloud")
    }
}

/// Dashboard after login
pub struct DashboardPage {
    base_url: String,
}

impl DashboardPage {
    pub fn new(config: &TestConfig) -> Self {
        Self {
            base_url: config.nextcloud_base_url().to_string(),
        }
    }

    /// Assert an authenticated session: dashboard URL plus the user menu in
    /// the header.
    pub fn verify_logged_in(&self) -> Vec<Step> {
        vec![
            Step::wait_for_url(DASHBOARD_URL),
            Step::ExpectVisible {
                locator: Locator::css("#user-menu"),
            },
        ]
    }
}

impl Page for DashboardPage {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn ready_marker(&self) -> Locator {
        Locator::css("#user-menu")
    }
}

/// Admin settings → OpenID Connect provider list (user_oidc app)
pub struct OidcSettingsPage {
    base_url: String,
    keycloak_host: String,
    nextcloud_host: String,
}

impl OidcSettingsPage {
    pub fn new(config: &TestConfig) -> Self {
        Self {
            base_url: config.nextcloud_base_url().to_string(),
            keycloak_host: config.keycloak.host.clone(),
            nextcloud_host: config.nextcloud.host.clone(),
        }
    }

    /// Assert the registered Keycloak provider carries the wiring the setup
    /// job is supposed to write: client id, discovery endpoint, backchannel
    /// logout URL and redirect URI.
    pub fn verify_keycloak_provider(&self, realm: &str) -> Vec<Step> {
        let details = Locator::css("div.provider-details");
        vec![
            Step::ExpectVisible {
                locator: details.clone(),
            },
            Step::ExpectText {
                locator: Locator::css("div.provider-details h3"),
                text: "keycloak".to_string(),
            },
            Step::ExpectTextContains {
                locator: details.clone(),
                text: "nextcloud".to_string(),
            },
            Step::ExpectTextContains {
                locator: details.clone(),
                text: format!(
                    "{}/realms/{realm}/.well-known/openid-configuration",
                    self.keycloak_host
                ),
            },
            Step::ExpectTextContains {
                locator: details.clone(),
                text: format!(
                    "{}/apps/user_oidc/backchannel-logout/keycloak",
                    self.nextcloud_host
                ),
            },
            Step::ExpectTextContains {
                locator: details,
                text: format!("{}/apps/user_oidc/code", self.nextcloud_host),
            },
        ]
    }
}

impl Page for OidcSettingsPage {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn path(&self) -> &str {
        "/settings/admin/user_oidc"
    }

    fn ready_marker(&self) -> Locator {
        Locator::text("Registered Providers")
    }
}

/// Settings → active apps list
pub struct ActiveAppsPage {
    base_url: String,
    expected_app_version: String,
}

impl ActiveAppsPage {
    const APP_ROW: &'static str = "li[data-app-id='integration_openproject']";

    pub fn new(config: &TestConfig) -> Self {
        Self {
            base_url: config.nextcloud_base_url().to_string(),
            expected_app_version: config.nextcloud.integration_app_version.clone(),
        }
    }

    /// Assert the OpenProject integration app is listed, enabled (disable
    /// button offered) and carries a version. When the config pins a version
    /// the check is exact; otherwise any dotted version string passes.
    pub fn verify_integration_app(&self) -> Vec<Step> {
        let version_cell = Locator::css(&format!("{} .app-version", Self::APP_ROW));
        let version_check = if self.expected_app_version.is_empty() {
            Step::ExpectTextMatches {
                locator: version_cell,
                pattern: r"\d+\.\d+".to_string(),
            }
        } else {
            Step::ExpectText {
                locator: version_cell,
                text: self.expected_app_version.clone(),
            }
        };

        vec![
            Step::ExpectVisible {
                locator: Locator::role("link", "OpenProject Integration"),
            },
            version_check,
            Step::ExpectVisible {
                locator: Locator::css(&format!("{} button:has-text(\"Disable\")", Self::APP_ROW)),
            },
        ]
    }
}

impl Page for ActiveAppsPage {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn path(&self) -> &str {
        "/settings/apps/enabled"
    }

    fn ready_marker(&self) -> Locator {
        Locator::text("Active apps")
    }
}

/// The OpenProject integration app itself
pub struct IntegrationAppPage {
    base_url: String,
}

impl IntegrationAppPage {
    pub fn new(config: &TestConfig) -> Self {
        Self {
            base_url: config.nextcloud_base_url().to_string(),
        }
    }

    /// Assert the app page is reachable for the logged-in user.
    pub fn verify_reachable(&self) -> Vec<Step> {
        let mut steps = self.open();
        steps.push(Step::ExpectUrlContains {
            fragment: "integration_openproject".to_string(),
        });
        steps
    }
}

impl Page for IntegrationAppPage {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn path(&self) -> &str {
        "/index.php/apps/integration_openproject"
    }

    fn ready_marker(&self) -> Locator {
        Locator::css("#content")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opnc_common::ADMIN_USER;

    fn config() -> TestConfig {
        TestConfig::from_yaml_with_env("", &|_| None).unwrap()
    }

    #[test]
    fn login_waits_for_dashboard() {
        let steps = LoginPage::new(&config()).login(&ADMIN_USER);
        assert!(matches!(
            steps.last(),
            Some(Step::WaitForUrl { pattern, .. }) if pattern == DASHBOARD_URL
        ));
    }

    #[test]
    fn provider_check_pins_discovery_endpoint() {
        let steps = OidcSettingsPage::new(&config()).verify_keycloak_provider("opnc");
        assert!(steps.iter().any(|s| matches!(
            s,
            Step::ExpectTextContains { text, .. }
                if text == "keycloak.test/realms/opnc/.well-known/openid-configuration"
        )));
    }

    #[test]
    fn app_version_check_is_exact_when_pinned() {
        let yaml = r#"
nextcloud:
  enableApps:
    - name: integration_openproject
      version: "2.9.2"
"#;
        let cfg = TestConfig::from_yaml_with_env(yaml, &|_| None).unwrap();
        let steps = ActiveAppsPage::new(&cfg).verify_integration_app();
        assert!(steps
            .iter()
            .any(|s| matches!(s, Step::ExpectText { text, .. } if text == "2.9.2")));

        let unpinned = ActiveAppsPage::new(&config()).verify_integration_app();
        assert!(unpinned
            .iter()
            .any(|s| matches!(s, Step::ExpectTextMatches { .. })));
    }
}
