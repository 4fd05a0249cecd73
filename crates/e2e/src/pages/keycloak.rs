//! Keycloak admin console pages

use opnc_common::{TestConfig, TestUser};

use super::{host_pattern, Page};
use crate::locator::Locator;
use crate::step::Step;

const ADMIN_CONSOLE_URL: &str = r".*/admin/.*/console.*";
const REALMS_URL: &str = r".*/admin/.*/console/#/.*/realms";
const CLIENTS_URL: &str = r".*/admin/.*/console/#/.*/clients";

fn username_input() -> Locator {
    Locator::css("#username")
}

fn password_input() -> Locator {
    Locator::css("#password")
}

fn sign_in_button() -> Locator {
    Locator::role("button", "Sign In")
}

/// Admin console login form
pub struct LoginPage {
    base_url: String,
    host: String,
}

impl LoginPage {
    pub fn new(config: &TestConfig) -> Self {
        Self {
            base_url: config.keycloak_base_url().to_string(),
            host: config.keycloak.host.clone(),
        }
    }

    /// Full admin login: navigate, authenticate, land in the console.
    pub fn login(&self, user: &TestUser) -> Vec<Step> {
        let mut steps = self.open();
        steps.extend([
            Step::fill(username_input(), user.username),
            Step::fill(password_input(), user.password),
            Step::click(sign_in_button()),
            Step::wait_for_url(ADMIN_CONSOLE_URL),
        ]);
        steps
    }

    /// Authenticate on a Keycloak form another application redirected to.
    /// The caller owns the redirect: it must wait for the target URL after
    /// these steps.
    pub fn login_as_user(&self, user: &TestUser) -> Vec<Step> {
        vec![
            Step::wait_visible(username_input()),
            Step::fill(username_input(), user.username),
            Step::fill(password_input(), user.password),
            Step::click(sign_in_button()),
        ]
    }

    /// URL regex matching this deployment's Keycloak host.
    pub fn host_url_pattern(&self) -> String {
        host_pattern(&self.host)
    }
}

impl Page for LoginPage {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn ready_marker(&self) -> Locator {
        Locator::text("Sign in to your account")
    }
}

/// Console landing page after admin login
pub struct HomePage {
    base_url: String,
}

impl HomePage {
    pub fn new(config: &TestConfig) -> Self {
        Self {
            base_url: config.keycloak_base_url().to_string(),
        }
    }

    /// Assert the admin session landed in the console.
    pub fn verify_logged_in(&self) -> Vec<Step> {
        vec![
            Step::wait_for_url(ADMIN_CONSOLE_URL),
            Step::ExpectVisible {
                locator: Locator::test_id("nav-item-realms"),
            },
        ]
    }

    /// Open the realm list via the side navigation.
    pub fn manage_realms(&self) -> Vec<Step> {
        vec![
            Step::click(Locator::test_id("nav-item-realms")),
            Step::wait_for_url(REALMS_URL),
        ]
    }
}

impl Page for HomePage {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn ready_marker(&self) -> Locator {
        Locator::test_id("nav-item-realms")
    }
}

/// "Manage realms" table
pub struct RealmsPage {
    base_url: String,
}

impl RealmsPage {
    pub fn new(config: &TestConfig) -> Self {
        Self {
            base_url: config.keycloak_base_url().to_string(),
        }
    }

    /// Switch the console to a realm by clicking its row link.
    pub fn select_realm(&self, realm: &str) -> Vec<Step> {
        vec![
            Step::wait_visible(Self::realm_link(realm)),
            Step::click(Self::realm_link(realm)),
            // Realm switch re-renders the console shell; the badge check in
            // verify_current_realm is the real signal.
            Step::Sleep { ms: 1000 },
        ]
    }

    /// Assert the "Current realm" badge sits next to the realm's name.
    pub fn verify_current_realm(&self, realm: &str) -> Vec<Step> {
        vec![Step::ExpectVisible {
            locator: Locator::css(&format!(
                "td.pf-v5-c-table__td:has-text(\"{realm}\") span.pf-v5-c-badge:has-text(\"Current realm\")"
            )),
        }]
    }

    /// Open the clients list of the selected realm.
    pub fn open_clients(&self) -> Vec<Step> {
        vec![
            Step::click(Locator::role("link", "Clients")),
            Step::wait_for_url(CLIENTS_URL),
        ]
    }

    fn realm_link(realm: &str) -> Locator {
        Locator::css(&format!("a[href='#/{realm}']"))
    }
}

impl Page for RealmsPage {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn ready_marker(&self) -> Locator {
        Locator::text_exact("Manage realms")
    }
}

/// Realm clients table
pub struct ClientsPage {
    base_url: String,
}

impl ClientsPage {
    pub fn new(config: &TestConfig) -> Self {
        Self {
            base_url: config.keycloak_base_url().to_string(),
        }
    }

    /// Assert each expected OAuth2/OIDC client is registered in the realm,
    /// with its client id rendered exactly.
    pub fn verify_clients_present(&self, client_ids: &[&str]) -> Vec<Step> {
        client_ids
            .iter()
            .flat_map(|id| {
                let link = Locator::role("link", id);
                [
                    Step::ExpectVisible {
                        locator: link.clone(),
                    },
                    Step::ExpectText {
                        locator: link,
                        text: id.to_string(),
                    },
                ]
            })
            .collect()
    }
}

impl Page for ClientsPage {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn ready_marker(&self) -> Locator {
        Locator::role("link", "nextcloud")
    }
}
