//! Declarative locator descriptors
//!
//! A [`Locator`] describes how to find a UI element without holding a live
//! handle; the resolver turns it into the corresponding Playwright locator
//! expression when a flow is compiled to a script. The variant set is closed:
//! adding a strategy forces the resolver match to be extended.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How to find one UI element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", content = "value")]
pub enum Locator {
    /// ARIA role, optionally narrowed by accessible name
    #[serde(rename = "getByRole")]
    Role {
        role: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },

    /// Form-field label
    #[serde(rename = "getByLabel")]
    Label { text: String },

    /// Visible text content
    #[serde(rename = "getByText")]
    Text { text: String, exact: bool },

    /// Input placeholder
    #[serde(rename = "getByPlaceholder")]
    Placeholder { text: String },

    /// `title` attribute
    #[serde(rename = "getByTitle")]
    Title { text: String },

    /// Image alt text
    #[serde(rename = "getByAltText")]
    AltText { text: String },

    /// `data-testid` attribute
    #[serde(rename = "getByTestId")]
    TestId(String),

    /// Raw CSS selector, the fallback when no semantic handle exists
    #[serde(rename = "locator")]
    Css(String),
}

impl Locator {
    pub fn role(role: &str, name: &str) -> Self {
        Locator::Role {
            role: role.to_string(),
            name: Some(name.to_string()),
        }
    }

    pub fn label(text: &str) -> Self {
        Locator::Label {
            text: text.to_string(),
        }
    }

    pub fn text(text: &str) -> Self {
        Locator::Text {
            text: text.to_string(),
            exact: false,
        }
    }

    pub fn text_exact(text: &str) -> Self {
        Locator::Text {
            text: text.to_string(),
            exact: true,
        }
    }

    pub fn test_id(id: &str) -> Self {
        Locator::TestId(id.to_string())
    }

    pub fn css(selector: &str) -> Self {
        Locator::Css(selector.to_string())
    }

    /// Resolve the descriptor to a Playwright locator expression rooted at
    /// `page`.
    pub fn to_playwright(&self) -> String {
        match self {
            Locator::Role { role, name } => match name {
                Some(name) => format!(
                    "page.getByRole({}, {{ name: {} }})",
                    js_str(role),
                    js_str(name)
                ),
                None => format!("page.getByRole({})", js_str(role)),
            },
            Locator::Label { text } => {
                format!("page.getByLabel({}, {{ exact: false }})", js_str(text))
            }
            Locator::Text { text, exact } => {
                format!("page.getByText({}, {{ exact: {exact} }})", js_str(text))
            }
            Locator::Placeholder { text } => format!("page.getByPlaceholder({})", js_str(text)),
            Locator::Title { text } => format!("page.getByTitle({})", js_str(text)),
            Locator::AltText { text } => format!("page.getByAltText({})", js_str(text)),
            Locator::TestId(id) => format!("page.getByTestId({})", js_str(id)),
            Locator::Css(selector) => format!("page.locator({})", js_str(selector)),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Role { role, name: Some(name) } => write!(f, "role={role}[{name}]"),
            Locator::Role { role, name: None } => write!(f, "role={role}"),
            Locator::Label { text } => write!(f, "label={text}"),
            Locator::Text { text, .. } => write!(f, "text={text}"),
            Locator::Placeholder { text } => write!(f, "placeholder={text}"),
            Locator::Title { text } => write!(f, "title={text}"),
            Locator::AltText { text } => write!(f, "alt={text}"),
            Locator::TestId(id) => write!(f, "testid={id}"),
            Locator::Css(selector) => write!(f, "css={selector}"),
        }
    }
}

/// Quote a Rust string as a single-quoted JS string literal.
pub(crate) fn js_str(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Locator::role("button", "Sign In"), "page.getByRole('button', { name: 'Sign In' })"; "role with name")]
    #[test_case(Locator::Role { role: "navigation".into(), name: None }, "page.getByRole('navigation')"; "bare role")]
    #[test_case(Locator::label("Username"), "page.getByLabel('Username', { exact: false })"; "label")]
    #[test_case(Locator::text("Manage realms"), "page.getByText('Manage realms', { exact: false })"; "text")]
    #[test_case(Locator::text_exact("nextcloud"), "page.getByText('nextcloud', { exact: true })"; "exact text")]
    #[test_case(Locator::Placeholder { text: "Enter email".into() }, "page.getByPlaceholder('Enter email')"; "placeholder")]
    #[test_case(Locator::test_id("nav-item-realms"), "page.getByTestId('nav-item-realms')"; "test id")]
    #[test_case(Locator::css("#username"), "page.locator('#username')"; "css")]
    fn resolves_to_playwright_expression(locator: Locator, expected: &str) {
        assert_eq!(locator.to_playwright(), expected);
    }

    #[test]
    fn js_str_escapes_quotes_and_backslashes() {
        assert_eq!(js_str("a'b"), r"'a\'b'");
        assert_eq!(js_str(r"a\d"), r"'a\\d'");
        assert_eq!(js_str("line\nbreak"), r"'line\nbreak'");
    }

    #[test]
    fn serde_shape_matches_descriptor_files() {
        let json = serde_json::to_value(Locator::test_id("nav-item-realms")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "by": "getByTestId", "value": "nav-item-realms" })
        );

        let parsed: Locator = serde_json::from_value(serde_json::json!({
            "by": "getByText",
            "value": { "text": "Active apps", "exact": false }
        }))
        .unwrap();
        assert_eq!(parsed, Locator::text("Active apps"));
    }
}
