//! Jira connection settings.
//!
//! Read from a JSON file shaped like:
//!
//! ```json
//! { "jira": { "server": "https://acme.atlassian.net", "email": "me@acme.io",
//!             "api_token": "…", "project": "OPS" } }
//! ```
//!
//! Each field can be overridden by `JIRA_SERVER`, `JIRA_EMAIL`,
//! `JIRA_API_TOKEN` or `JIRA_PROJECT`.

use crate::error::{Result, TicketsError};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const ENV_SERVER: &str = "JIRA_SERVER";
pub const ENV_EMAIL: &str = "JIRA_EMAIL";
pub const ENV_API_TOKEN: &str = "JIRA_API_TOKEN";
pub const ENV_PROJECT: &str = "JIRA_PROJECT";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SecretsFile {
    #[serde(default)]
    jira: PartialSecrets,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PartialSecrets {
    #[serde(default)]
    server: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    api_token: Option<String>,
    #[serde(default)]
    project: Option<String>,
}

/// Fully resolved Jira credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct JiraSecrets {
    pub server: String,
    pub email: String,
    pub api_token: String,
    pub project: String,
}

impl std::fmt::Debug for JiraSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraSecrets")
            .field("server", &self.server)
            .field("email", &self.email)
            .field("api_token", &"<redacted>")
            .field("project", &self.project)
            .finish()
    }
}

impl JiraSecrets {
    /// Load from `path` and the process environment.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Load from `path`, consulting `env` for overrides. A missing file is
    /// fine as long as `env` supplies every field.
    pub fn load_with(path: &Path, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let file = if path.exists() {
            let data = std::fs::read_to_string(path)?;
            serde_json::from_str::<SecretsFile>(&data)?
        } else {
            SecretsFile::default()
        };
        let found_file = path.exists();
        let partial = file.jira;

        let pick = |from_file: Option<String>, key: &str, name: &str| -> Result<String> {
            env(key)
                .filter(|v| !v.trim().is_empty())
                .or(from_file.filter(|v| !v.trim().is_empty()))
                .ok_or_else(|| {
                    if found_file {
                        TicketsError::MissingSecret(name.to_string())
                    } else {
                        TicketsError::SecretsNotFound(path.display().to_string())
                    }
                })
        };

        Ok(Self {
            server: pick(partial.server, ENV_SERVER, "server")?
                .trim_end_matches('/')
                .to_string(),
            email: pick(partial.email, ENV_EMAIL, "email")?,
            api_token: pick(partial.api_token, ENV_API_TOKEN, "api_token")?,
            project: pick(partial.project, ENV_PROJECT, "project")?,
        })
    }

    /// A secrets file skeleton for `tickets init`.
    pub fn template() -> String {
        let value = serde_json::json!({
            "jira": {
                "server": "https://your-domain.atlassian.net",
                "email": "you@example.com",
                "api_token": "",
                "project": "KEY",
            }
        });
        // serde_json::Value always serializes.
        serde_json::to_string_pretty(&value).unwrap_or_default() + "\n"
    }
}
