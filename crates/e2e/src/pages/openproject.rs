//! OpenProject pages

use opnc_common::{TestConfig, TestUser};

use super::{host_pattern, Page};
use crate::locator::Locator;
use crate::step::Step;

fn profile_button() -> Locator {
    // The header widget moved between major versions; the comma list covers
    // the variants the suite runs against.
    Locator::css(".op-top-menu-user, #openproject-user-menu")
}

/// Login form
pub struct LoginPage {
    base_url: String,
    host: String,
}

impl LoginPage {
    pub fn new(config: &TestConfig) -> Self {
        Self {
            base_url: config.openproject_base_url().to_string(),
            host: config.openproject.host.clone(),
        }
    }

    /// Form login with local credentials.
    pub fn login(&self, user: &TestUser) -> Vec<Step> {
        let mut steps = self.open();
        steps.extend([
            Step::fill(Locator::css("#username"), user.username),
            Step::fill(Locator::css("#password"), user.password),
            Step::click(Locator::role("button", "Sign in")),
            Step::wait_for_url(host_pattern(&self.host)),
        ]);
        steps
    }

    /// Hand authentication off to Keycloak via the provider button. The
    /// Keycloak login page takes over from here.
    pub fn keycloak_handoff(&self, keycloak_url_pattern: &str) -> Vec<Step> {
        let mut steps = self.open();
        steps.extend([
            Step::click(Locator::css("a[href*='/auth/keycloak']")),
            Step::wait_for_url(keycloak_url_pattern),
        ]);
        steps
    }

    /// URL regex matching this deployment's OpenProject host.
    pub fn host_url_pattern(&self) -> String {
        host_pattern(&self.host)
    }
}

impl Page for LoginPage {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn path(&self) -> &str {
        "/login"
    }

    fn ready_marker(&self) -> Locator {
        Locator::text("Sign in")
    }
}

/// Landing page of an authenticated session
pub struct HomePage {
    base_url: String,
    host: String,
}

impl HomePage {
    pub fn new(config: &TestConfig) -> Self {
        Self {
            base_url: config.openproject_base_url().to_string(),
            host: config.openproject.host.clone(),
        }
    }

    /// Assert the session landed back on OpenProject, off the login form.
    pub fn verify_logged_in(&self) -> Vec<Step> {
        vec![
            Step::wait_for_url(host_pattern(&self.host)),
            Step::ExpectVisible {
                locator: profile_button(),
            },
        ]
    }

    /// Open the profile menu and assert the displayed account name.
    pub fn verify_user(&self, display_name: &str) -> Vec<Step> {
        vec![
            Step::click(profile_button()),
            Step::ExpectTextContains {
                locator: Locator::css(".op-menu--container, #user-menu"),
                text: display_name.to_string(),
            },
        ]
    }
}

impl Page for HomePage {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn ready_marker(&self) -> Locator {
        profile_button()
    }
}
