//! Canonical scenario flows
//!
//! One flow per scenario, assembled from the page objects. The runner filters
//! them by the configured setup method; flows for other methods are reported
//! as skipped rather than failed.

use opnc_common::{SetupMethod, TestConfig, ADMIN_USER, ALICE_USER};
use serde::Serialize;

use crate::pages::keycloak;
use crate::pages::nextcloud;
use crate::pages::openproject;
use crate::pages::Page;
use crate::step::Step;

/// Realm the setup job provisions for the external SSO wiring
pub const REALM: &str = "opnc";

/// OAuth2/OIDC clients registered in that realm
pub const REALM_CLIENTS: [&str; 2] = ["nextcloud", "openproject"];

/// A named, self-contained browser scenario
#[derive(Debug, Clone, Serialize)]
pub struct Flow {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(serialize_with = "serialize_method")]
    pub method: SetupMethod,
    pub steps: Vec<Step>,
}

fn serialize_method<S: serde::Serializer>(
    method: &SetupMethod,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(method.as_str())
}

/// Every flow the suite knows, across all setup methods.
pub fn all(config: &TestConfig) -> Vec<Flow> {
    vec![
        nextcloud_login(config, SetupMethod::OAuth2, "nextcloud-login"),
        openproject_login(config),
        integration_app_reachable(config, SetupMethod::OAuth2, "nextcloud-integration-app"),
        nextcloud_login(config, SetupMethod::SsoNextcloud, "nextcloud-sso-login"),
        integration_app_reachable(
            config,
            SetupMethod::SsoNextcloud,
            "integration-app-via-dashboard",
        ),
        keycloak_realm_clients(config),
        nextcloud_oidc_provider(config),
        nextcloud_integration_app_version(config),
        openproject_keycloak_login(config),
    ]
}

/// Log in to Nextcloud with the admin account and verify the session.
fn nextcloud_login(config: &TestConfig, method: SetupMethod, name: &'static str) -> Flow {
    let login = nextcloud::LoginPage::new(config);
    let dashboard = nextcloud::DashboardPage::new(config);

    let mut steps = login.login(&ADMIN_USER);
    steps.extend(dashboard.verify_logged_in());

    Flow {
        name,
        description: "Nextcloud form login lands on an authenticated dashboard",
        method,
        steps,
    }
}

/// Log in to OpenProject with the admin account.
fn openproject_login(config: &TestConfig) -> Flow {
    let login = openproject::LoginPage::new(config);
    let home = openproject::HomePage::new(config);

    let mut steps = login.login(&ADMIN_USER);
    steps.extend(home.verify_logged_in());

    Flow {
        name: "openproject-login",
        description: "OpenProject form login lands on an authenticated session",
        method: SetupMethod::OAuth2,
        steps,
    }
}

/// Log in to Nextcloud and reach the OpenProject integration app.
fn integration_app_reachable(
    config: &TestConfig,
    method: SetupMethod,
    name: &'static str,
) -> Flow {
    let login = nextcloud::LoginPage::new(config);
    let dashboard = nextcloud::DashboardPage::new(config);
    let app = nextcloud::IntegrationAppPage::new(config);

    let mut steps = login.login(&ADMIN_USER);
    steps.extend(dashboard.verify_logged_in());
    steps.extend(app.verify_reachable());

    Flow {
        name,
        description: "OpenProject integration app is reachable from Nextcloud",
        method,
        steps,
    }
}

/// Log in to the Keycloak console, select the integration realm and verify
/// both application clients are registered.
fn keycloak_realm_clients(config: &TestConfig) -> Flow {
    let login = keycloak::LoginPage::new(config);
    let home = keycloak::HomePage::new(config);
    let realms = keycloak::RealmsPage::new(config);
    let clients = keycloak::ClientsPage::new(config);

    let mut steps = login.login(&ADMIN_USER);
    steps.extend(home.verify_logged_in());
    steps.extend(home.manage_realms());
    steps.push(Step::wait_visible(realms.ready_marker()));
    steps.extend(realms.select_realm(REALM));
    steps.extend(realms.verify_current_realm(REALM));
    steps.extend(realms.open_clients());
    steps.extend(clients.verify_clients_present(&REALM_CLIENTS));

    Flow {
        name: "keycloak-realm-clients",
        description: "Keycloak realm carries the nextcloud and openproject clients",
        method: SetupMethod::SsoExternal,
        steps,
    }
}

/// Verify the Keycloak provider wiring in Nextcloud's OIDC admin settings.
fn nextcloud_oidc_provider(config: &TestConfig) -> Flow {
    let login = nextcloud::LoginPage::new(config);
    let dashboard = nextcloud::DashboardPage::new(config);
    let oidc = nextcloud::OidcSettingsPage::new(config);

    let mut steps = login.login(&ADMIN_USER);
    steps.extend(dashboard.verify_logged_in());
    steps.extend(oidc.open());
    steps.extend(oidc.verify_keycloak_provider(REALM));

    Flow {
        name: "nextcloud-oidc-provider",
        description: "Nextcloud's registered Keycloak provider points at the realm",
        method: SetupMethod::SsoExternal,
        steps,
    }
}

/// Verify the OpenProject integration app is enabled and versioned.
fn nextcloud_integration_app_version(config: &TestConfig) -> Flow {
    let login = nextcloud::LoginPage::new(config);
    let dashboard = nextcloud::DashboardPage::new(config);
    let apps = nextcloud::ActiveAppsPage::new(config);

    let mut steps = login.login(&ADMIN_USER);
    steps.extend(dashboard.verify_logged_in());
    steps.extend(apps.open());
    steps.extend(apps.verify_integration_app());

    Flow {
        name: "nextcloud-integration-app-version",
        description: "OpenProject integration app is enabled with a version",
        method: SetupMethod::SsoExternal,
        steps,
    }
}

/// Authenticate against OpenProject through the Keycloak handoff as a realm
/// user and verify the resulting account.
fn openproject_keycloak_login(config: &TestConfig) -> Flow {
    let op_login = openproject::LoginPage::new(config);
    let kc_login = keycloak::LoginPage::new(config);
    let home = openproject::HomePage::new(config);

    let mut steps = op_login.keycloak_handoff(&kc_login.host_url_pattern());
    steps.extend(kc_login.login_as_user(&ALICE_USER));
    steps.push(Step::wait_for_url(op_login.host_url_pattern()));
    steps.extend(home.verify_logged_in());
    steps.extend(home.verify_user(&ALICE_USER.display_name()));

    Flow {
        name: "openproject-keycloak-login",
        description: "OpenProject accepts a Keycloak realm user via SSO",
        method: SetupMethod::SsoExternal,
        steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::Locator;

    fn config() -> TestConfig {
        TestConfig::from_yaml_with_env("", &|_| None).unwrap()
    }

    #[test]
    fn every_method_has_flows() {
        let flows = all(&config());
        for method in [
            SetupMethod::OAuth2,
            SetupMethod::SsoNextcloud,
            SetupMethod::SsoExternal,
        ] {
            assert!(
                flows.iter().any(|f| f.method == method),
                "no flows for {method}"
            );
        }
        assert_eq!(flows.len(), 9);
    }

    #[test]
    fn flow_names_are_unique() {
        let flows = all(&config());
        let mut names: Vec<_> = flows.iter().map(|f| f.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), flows.len());
    }

    #[test]
    fn realm_clients_flow_checks_both_clients() {
        let flows = all(&config());
        let flow = flows
            .iter()
            .find(|f| f.name == "keycloak-realm-clients")
            .unwrap();

        for client in REALM_CLIENTS {
            assert!(
                flow.steps.iter().any(|s| matches!(
                    s,
                    Step::ExpectText { text, .. } if text == client
                )),
                "missing client check for {client}"
            );
        }
        // Realm selection happens before the clients check.
        let select = flow
            .steps
            .iter()
            .position(|s| matches!(s, Step::Click { locator: Locator::Css(sel) } if sel.contains("#/opnc")))
            .unwrap();
        let clients = flow
            .steps
            .iter()
            .position(|s| matches!(s, Step::ExpectText { text, .. } if text == "nextcloud"))
            .unwrap();
        assert!(select < clients);
    }

    #[test]
    fn sso_login_crosses_from_openproject_to_keycloak_and_back() {
        let flows = all(&config());
        let flow = flows
            .iter()
            .find(|f| f.name == "openproject-keycloak-login")
            .unwrap();

        let waits: Vec<_> = flow
            .steps
            .iter()
            .filter_map(|s| match s {
                Step::WaitForUrl { pattern, .. } => Some(pattern.as_str()),
                _ => None,
            })
            .collect();
        assert!(waits.iter().any(|p| p.contains("keycloak")));
        assert!(waits.iter().any(|p| p.contains("openproject")));

        assert!(flow.steps.iter().any(|s| matches!(
            s,
            Step::ExpectTextContains { text, .. } if text == "Alice Hansen"
        )));
    }
}
