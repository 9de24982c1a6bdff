//! Release notes: changelog rendering and platform version hints.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use log::warn;
use markdown::{CompileOptions, Options};
use regex::Regex;
use serde::{Deserialize, Serialize};

static REQUIRES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)requires:[ \t\n\x0B\f\r]([0-9.]+)").expect("valid regex"));
static TESTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)tested:[ \t\n\x0B\f\r]([0-9.]+)").expect("valid regex"));

/// How much the release notes author is trusted when rendering HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChangelogPolicy {
    /// Raw HTML and any link protocol pass through untouched.
    #[default]
    Trusted,
    /// Raw HTML is escaped and dangerous link protocols are dropped.
    Escape,
}

impl fmt::Display for ChangelogPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangelogPolicy::Trusted => write!(f, "trusted"),
            ChangelogPolicy::Escape => write!(f, "escape"),
        }
    }
}

impl FromStr for ChangelogPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trusted" => Ok(ChangelogPolicy::Trusted),
            "escape" => Ok(ChangelogPolicy::Escape),
            _ => anyhow::bail!("Unknown changelog policy: {}. Expected trusted or escape.", s),
        }
    }
}

/// Render Markdown release notes as an HTML changelog.
pub fn render_changelog(body: &str, policy: ChangelogPolicy) -> String {
    match policy {
        ChangelogPolicy::Escape => markdown::to_html(body),
        ChangelogPolicy::Trusted => {
            let options = Options {
                compile: CompileOptions {
                    allow_dangerous_html: true,
                    allow_dangerous_protocol: true,
                    ..CompileOptions::default()
                },
                ..Options::default()
            };
            match markdown::to_html_with_options(body, &options) {
                Ok(html) => html,
                Err(err) => {
                    warn!("Failed to render release notes, escaping raw HTML: {}", err);
                    markdown::to_html(body)
                }
            }
        }
    }
}

/// Minimum platform version announced by a `Requires: x.y` line.
pub fn min_required_version(body: &str) -> Option<String> {
    first_capture(&REQUIRES_RE, body)
}

/// Highest platform version announced by a `Tested: x.y` line.
pub fn tested_up_to(body: &str) -> Option<String> {
    first_capture(&TESTED_RE, body)
}

fn first_capture(re: &Regex, body: &str) -> Option<String> {
    re.captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
