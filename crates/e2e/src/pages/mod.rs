//! Page objects
//!
//! Each page is a small struct implementing the [`Page`] capability trait
//! (base URL, path, ready marker) plus action methods that build step
//! sequences. Pages never touch the browser; flows concatenate their steps
//! and hand the result to the driver.

pub mod keycloak;
pub mod nextcloud;
pub mod openproject;

use crate::locator::Locator;
use crate::step::Step;

/// Minimal capability every page provides
pub trait Page {
    /// Application base URL (already resolved against env overrides)
    fn base_url(&self) -> &str;

    /// Path of this page under the base URL
    fn path(&self) -> &str {
        ""
    }

    /// Element whose visibility marks the page as ready
    fn ready_marker(&self) -> Locator;

    fn url(&self) -> String {
        format!("{}{}", self.base_url(), self.path())
    }

    /// Navigate to the page and wait until it is ready.
    fn open(&self) -> Vec<Step> {
        vec![
            Step::goto(self.url()),
            Step::wait_visible(self.ready_marker()),
        ]
    }
}

/// URL regex fragment matching a host anywhere in the page URL.
pub(crate) fn host_pattern(host: &str) -> String {
    format!(".*{}.*", host.replace('.', "\\."))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy;

    impl Page for Dummy {
        fn base_url(&self) -> &str {
            "https://nextcloud.test"
        }

        fn path(&self) -> &str {
            "/settings/apps/enabled"
        }

        fn ready_marker(&self) -> Locator {
            Locator::text("Active apps")
        }
    }

    #[test]
    fn open_navigates_then_waits() {
        let steps = Dummy.open();
        assert_eq!(
            steps[0],
            Step::goto("https://nextcloud.test/settings/apps/enabled")
        );
        assert!(matches!(&steps[1], Step::WaitVisible { locator, .. } if *locator == Locator::text("Active apps")));
    }

    #[test]
    fn host_pattern_escapes_dots() {
        assert_eq!(host_pattern("keycloak.test"), ".*keycloak\\.test.*");
    }
}
