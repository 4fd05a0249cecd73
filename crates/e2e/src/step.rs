//! Declarative browser step model
//!
//! A flow is a sequence of steps; the Playwright driver compiles them into a
//! single script so one browser context carries session state through the
//! whole flow. Assertions are explicit `Expect*` steps whose failure is a
//! typed error, not a swallowed probe.

use serde::{Deserialize, Serialize};

use crate::locator::Locator;

pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// A single browser action or assertion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Navigate to an absolute URL
    Goto { url: String },

    /// Fill an input field
    Fill { locator: Locator, value: String },

    /// Click an element
    Click { locator: Locator },

    /// Press a key on the focused element
    Press { key: String },

    /// Wait for an element to become visible
    WaitVisible {
        locator: Locator,
        #[serde(default = "default_timeout")]
        timeout_ms: u64,
    },

    /// Wait for the page URL to match a regular expression
    WaitForUrl {
        pattern: String,
        #[serde(default = "default_timeout")]
        timeout_ms: u64,
    },

    /// Fixed delay; use sparingly, for UI transitions with no better signal
    Sleep { ms: u64 },

    /// Assert an element is visible
    ExpectVisible { locator: Locator },

    /// Assert exact (trimmed) text content
    ExpectText { locator: Locator, text: String },

    /// Assert text content contains a fragment
    ExpectTextContains { locator: Locator, text: String },

    /// Assert text content matches a regular expression
    ExpectTextMatches { locator: Locator, pattern: String },

    /// Assert the current URL contains a fragment
    ExpectUrlContains { fragment: String },

    /// Capture a screenshot
    Screenshot { name: String, full_page: bool },

    /// Emit a marker line into the script output
    Log { message: String },
}

impl Step {
    pub fn goto(url: impl Into<String>) -> Self {
        Step::Goto { url: url.into() }
    }

    pub fn fill(locator: Locator, value: impl Into<String>) -> Self {
        Step::Fill {
            locator,
            value: value.into(),
        }
    }

    pub fn click(locator: Locator) -> Self {
        Step::Click { locator }
    }

    pub fn wait_visible(locator: Locator) -> Self {
        Step::WaitVisible {
            locator,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn wait_for_url(pattern: impl Into<String>) -> Self {
        Step::WaitForUrl {
            pattern: pattern.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Short label used in progress logs and failure reports
    pub fn describe(&self) -> String {
        match self {
            Step::Goto { url } => format!("goto:{url}"),
            Step::Fill { locator, .. } => format!("fill:{locator}"),
            Step::Click { locator } => format!("click:{locator}"),
            Step::Press { key } => format!("press:{key}"),
            Step::WaitVisible { locator, .. } => format!("wait_visible:{locator}"),
            Step::WaitForUrl { pattern, .. } => format!("wait_for_url:{pattern}"),
            Step::Sleep { ms } => format!("sleep:{ms}ms"),
            Step::ExpectVisible { locator } => format!("expect_visible:{locator}"),
            Step::ExpectText { locator, .. } => format!("expect_text:{locator}"),
            Step::ExpectTextContains { locator, .. } => format!("expect_text_contains:{locator}"),
            Step::ExpectTextMatches { locator, .. } => format!("expect_text_matches:{locator}"),
            Step::ExpectUrlContains { fragment } => format!("expect_url_contains:{fragment}"),
            Step::Screenshot { name, .. } => format!("screenshot:{name}"),
            Step::Log { message } => {
                let prefix: String = message.chars().take(30).collect();
                format!("log:{prefix}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_uses_action_tags() {
        let step = Step::fill(Locator::css("#username"), "admin");
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["action"], "fill");
        assert_eq!(json["locator"]["by"], "locator");

        let parsed: Step = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, step);
    }

    #[test]
    fn describe_is_compact() {
        let step = Step::click(Locator::role("button", "Sign In"));
        assert_eq!(step.describe(), "click:role=button[Sign In]");
    }

    #[test]
    fn describe_truncates_log_messages_on_char_boundaries() {
        let short = Step::Log {
            message: "realm selected".into(),
        };
        assert_eq!(short.describe(), "log:realm selected");

        // A multibyte character straddling the cut must not split.
        let long = Step::Log {
            message: format!("{}é plus trailing detail", "a".repeat(29)),
        };
        assert_eq!(long.describe(), format!("log:{}é", "a".repeat(29)));
    }
}
