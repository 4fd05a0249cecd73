//! Playwright browser driver
//!
//! Compiles a flow's steps into one self-contained Playwright script and runs
//! it with `node`. A single browser context executes the whole flow, so SSO
//! cookies and cross-application redirects behave exactly as they do for a
//! user. The script's last stdout line is a JSON verdict that maps back to a
//! typed error on failure.

use serde::Deserialize;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tokio::process::Command as TokioCommand;
use tracing::debug;

use crate::error::{E2eError, E2eResult};
use crate::locator::js_str;
use crate::step::Step;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl std::str::FromStr for Browser {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chromium" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" => Ok(Browser::Webkit),
            other => Err(format!("unknown browser: {other}")),
        }
    }
}

/// Driver configuration
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub browser: Browser,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub screenshot_dir: PathBuf,
    /// The test environments serve self-signed certificates for the `*.test`
    /// hosts.
    pub ignore_https_errors: bool,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            browser: Browser::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            screenshot_dir: PathBuf::from("test-results/screenshots"),
            ignore_https_errors: true,
        }
    }
}

/// Verdict object printed as the script's last stdout line
#[derive(Debug, Deserialize)]
struct Verdict {
    success: bool,
    #[serde(default)]
    step: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

pub struct PlaywrightDriver {
    config: PlaywrightConfig,
}

impl PlaywrightDriver {
    pub fn new(config: PlaywrightConfig) -> E2eResult<Self> {
        Self::check_installed()?;
        std::fs::create_dir_all(&config.screenshot_dir)?;
        Ok(Self { config })
    }

    /// Probe for a usable Playwright installation.
    pub fn check_installed() -> E2eResult<()> {
        let status = Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    /// Compile steps into one Playwright program.
    pub fn build_script(&self, steps: &[Step]) -> String {
        let mut script = String::new();

        script.push_str(&format!(
            r#"const {{ chromium, firefox, webkit }} = require('playwright');

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }},
    ignoreHTTPSErrors: {ignore_https},
  }});
  const page = await context.newPage();
  let currentStep = '';

  try {{
"#,
            browser = self.config.browser.as_str(),
            headless = self.config.headless,
            width = self.config.viewport_width,
            height = self.config.viewport_height,
            ignore_https = self.config.ignore_https_errors,
        ));

        for (i, step) in steps.iter().enumerate() {
            script.push_str(&format!(
                "\n    // Step {}: {}\n    currentStep = {};\n",
                i + 1,
                step.describe(),
                js_str(&step.describe())
            ));
            script.push_str(&self.step_to_js(step));
            script.push('\n');
        }

        script.push_str(
            r#"
    console.log(JSON.stringify({ success: true }));
  } catch (error) {
    console.log(JSON.stringify({ success: false, step: currentStep, error: error.message }));
    process.exitCode = 1;
  } finally {
    await browser.close();
  }
})();
"#,
        );

        script
    }

    fn step_to_js(&self, step: &Step) -> String {
        match step {
            Step::Goto { url } => format!(
                "    await page.goto({}, {{ waitUntil: 'domcontentloaded' }});",
                js_str(url)
            ),
            Step::Fill { locator, value } => format!(
                "    await {}.first().fill({});",
                locator.to_playwright(),
                js_str(value)
            ),
            Step::Click { locator } => {
                format!("    await {}.first().click();", locator.to_playwright())
            }
            Step::Press { key } => format!("    await page.keyboard.press({});", js_str(key)),
            Step::WaitVisible { locator, timeout_ms } => format!(
                "    await {}.first().waitFor({{ state: 'visible', timeout: {timeout_ms} }});",
                locator.to_playwright()
            ),
            Step::WaitForUrl { pattern, timeout_ms } => format!(
                "    await page.waitForURL(new RegExp({}), {{ timeout: {timeout_ms} }});",
                js_str(pattern)
            ),
            Step::Sleep { ms } => format!("    await page.waitForTimeout({ms});"),
            Step::ExpectVisible { locator } => format!(
                "    await {}.first().waitFor({{ state: 'visible', timeout: {} }});",
                locator.to_playwright(),
                crate::step::DEFAULT_TIMEOUT_MS
            ),
            Step::ExpectText { locator, text } => format!(
                r#"    {{
      const el = {loc}.first();
      await el.waitFor({{ state: 'visible', timeout: {timeout} }});
      const text = ((await el.textContent()) || '').trim();
      if (text !== {expected}) throw new Error(`expected text ${{JSON.stringify({expected})}}, got ${{JSON.stringify(text)}}`);
    }}"#,
                loc = locator.to_playwright(),
                timeout = crate::step::DEFAULT_TIMEOUT_MS,
                expected = js_str(text),
            ),
            Step::ExpectTextContains { locator, text } => format!(
                r#"    {{
      const el = {loc}.first();
      await el.waitFor({{ state: 'visible', timeout: {timeout} }});
      const text = ((await el.textContent()) || '').trim();
      if (!text.includes({expected})) throw new Error(`expected text containing ${{JSON.stringify({expected})}}, got ${{JSON.stringify(text)}}`);
    }}"#,
                loc = locator.to_playwright(),
                timeout = crate::step::DEFAULT_TIMEOUT_MS,
                expected = js_str(text),
            ),
            Step::ExpectTextMatches { locator, pattern } => format!(
                r#"    {{
      const el = {loc}.first();
      await el.waitFor({{ state: 'visible', timeout: {timeout} }});
      const text = ((await el.textContent()) || '').trim();
      if (!new RegExp({pat}).test(text)) throw new Error(`expected text matching ${{JSON.stringify({pat})}}, got ${{JSON.stringify(text)}}`);
    }}"#,
                loc = locator.to_playwright(),
                timeout = crate::step::DEFAULT_TIMEOUT_MS,
                pat = js_str(pattern),
            ),
            Step::ExpectUrlContains { fragment } => format!(
                "    if (!page.url().includes({frag})) throw new Error(`url ${{page.url()}} does not contain ${{JSON.stringify({frag})}}`);",
                frag = js_str(fragment)
            ),
            Step::Screenshot { name, full_page } => {
                let path = self.config.screenshot_dir.join(format!("{name}.png"));
                format!(
                    "    await page.screenshot({{ path: {}, fullPage: {full_page} }});",
                    js_str(&path.to_string_lossy())
                )
            }
            Step::Log { message } => format!("    console.log('[TEST] ' + {});", js_str(message)),
        }
    }

    /// Execute a flow's steps and map the verdict back to a typed result.
    pub async fn run(&self, steps: &[Step]) -> E2eResult<()> {
        let script = self.build_script(steps);

        let temp_dir = tempfile::tempdir()?;
        let script_path = temp_dir.path().join("flow.js");
        std::fs::write(&script_path, &script)?;

        debug!("running Playwright script: {}", script_path.display());

        let output = TokioCommand::new("node")
            .arg(&script_path)
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let verdict = stdout
            .lines()
            .rev()
            .find_map(|line| serde_json::from_str::<Verdict>(line).ok());

        match verdict {
            Some(v) if v.success => Ok(()),
            Some(v) => Err(E2eError::StepFailed {
                step: v.step.unwrap_or_else(|| "unknown".to_string()),
                reason: v.error.unwrap_or_else(|| "unknown error".to_string()),
            }),
            None => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(E2eError::Browser(format!(
                    "script produced no verdict\nstdout: {stdout}\nstderr: {stderr}"
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::Locator;

    fn driver() -> PlaywrightDriver {
        // Bypass new() so tests never require a Playwright installation.
        PlaywrightDriver {
            config: PlaywrightConfig::default(),
        }
    }

    #[test]
    fn browser_names_parse_strictly() {
        assert_eq!("firefox".parse::<Browser>().unwrap(), Browser::Firefox);
        assert_eq!("webkit".parse::<Browser>().unwrap(), Browser::Webkit);

        // A typo must surface, not silently fall back to Chromium.
        let err = "firfox".parse::<Browser>().unwrap_err();
        assert!(err.contains("firfox"));
    }

    #[test]
    fn script_runs_one_context_per_flow() {
        let steps = vec![
            Step::goto("https://keycloak.test"),
            Step::fill(Locator::css("#username"), "admin"),
            Step::click(Locator::role("button", "Sign In")),
        ];
        let script = driver().build_script(&steps);

        assert_eq!(script.matches("newContext").count(), 1);
        assert_eq!(script.matches("newPage").count(), 1);
        assert!(script.contains("ignoreHTTPSErrors: true"));
        assert!(script.contains("await page.goto('https://keycloak.test'"));
        assert!(script.contains("page.locator('#username').first().fill('admin')"));
        assert!(script.contains("page.getByRole('button', { name: 'Sign In' }).first().click()"));
        assert!(script.trim_end().ends_with("})();"));
    }

    #[test]
    fn assertions_throw_instead_of_swallowing() {
        let steps = vec![Step::ExpectText {
            locator: Locator::test_id("view-header"),
            text: "Manage realms".into(),
        }];
        let script = driver().build_script(&steps);

        assert!(script.contains("page.getByTestId('view-header')"));
        assert!(script.contains("throw new Error"));
        assert!(!script.contains("catch { return false }"));
    }

    #[test]
    fn verdict_footer_and_step_markers_present() {
        let steps = vec![Step::wait_for_url(r".*/apps/dashboard.*")];
        let script = driver().build_script(&steps);

        assert!(script.contains("currentStep = 'wait_for_url:.*/apps/dashboard.*'"));
        assert!(script.contains(r"JSON.stringify({ success: true })"));
        assert!(script.contains(r"JSON.stringify({ success: false, step: currentStep"));
    }

    #[test]
    fn regex_patterns_survive_js_quoting() {
        let steps = vec![Step::ExpectTextMatches {
            locator: Locator::css(".app-version"),
            pattern: r"\d+\.\d+".into(),
        }];
        let script = driver().build_script(&steps);

        // One JS-level escape per backslash: RegExp('\\d+\\.\\d+')
        assert!(script.contains(r"new RegExp('\\d+\\.\\d+')"));
    }
}
