//! Test user catalogue
//!
//! These accounts are provisioned by the setup job (the SSO users live in the
//! Keycloak realm; `admin` is the built-in admin of each application).

/// Credentials and profile of a provisioned test account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestUser {
    pub username: &'static str,
    pub password: &'static str,
    pub first_name: Option<&'static str>,
    pub last_name: Option<&'static str>,
    pub email: Option<&'static str>,
}

impl TestUser {
    /// "First Last" as the applications render it, falling back to the login.
    pub fn display_name(&self) -> String {
        match (self.first_name, self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            _ => self.username.to_string(),
        }
    }
}

/// Built-in admin account (admin consoles of all three applications)
pub const ADMIN_USER: TestUser = TestUser {
    username: "admin",
    password: "admin",
    first_name: None,
    last_name: None,
    email: None,
};

/// Realm user provisioned for the sso-external setup method
pub const ALICE_USER: TestUser = TestUser {
    username: "alice",
    password: "1234",
    first_name: Some("Alice"),
    last_name: Some("Hansen"),
    email: Some("alice@example.com"),
};

/// Realm user provisioned for the sso-external setup method
pub const BRIAN_USER: TestUser = TestUser {
    username: "brian",
    password: "1234",
    first_name: Some("Brian"),
    last_name: Some("Murphy"),
    email: Some("brian@example.com"),
};

/// Users available for Keycloak-backed SSO logins
pub fn sso_external_users() -> &'static [TestUser] {
    &[ALICE_USER, BRIAN_USER]
}

pub fn by_username(username: &str) -> Option<TestUser> {
    [ADMIN_USER, ALICE_USER, BRIAN_USER]
        .into_iter()
        .find(|user| user.username == username)
}
