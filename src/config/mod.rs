use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod validator;

use crate::cli::Cli;

pub const DEFAULT_API_BASE_URL: &str = "https://api.hubapi.com";
pub const DEFAULT_SUBMIT_BASE_URL: &str = "https://api.hsforms.com";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub hubspot: HubSpotSettings,
    #[serde(default)]
    pub submissions: SubmissionSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Which HubSpot operation receives relayed submissions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionMode {
    /// Forms submission API (records a form submission against the portal)
    #[default]
    Forms,
    /// CRM contacts API (creates a contact from the field values)
    Contact,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HubSpotSettings {
    /// Private app access token, never logged or exposed over the API
    #[serde(default, skip_serializing)]
    pub access_token: String,
    #[serde(default)]
    pub portal_id: String,
    /// Form rendered when no form id is given
    #[serde(default)]
    pub default_form_id: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_submit_base_url")]
    pub submit_base_url: String,
    #[serde(default)]
    pub submission_mode: SubmissionMode,
}

impl Default for HubSpotSettings {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            portal_id: String::new(),
            default_form_id: String::new(),
            api_base_url: default_api_base_url(),
            submit_base_url: default_submit_base_url(),
            submission_mode: SubmissionMode::default(),
        }
    }
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_submit_base_url() -> String {
    DEFAULT_SUBMIT_BASE_URL.to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubmissionSettings {
    /// Number of recent submissions kept in memory for `/api/submissions`
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for SubmissionSettings {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
        }
    }
}

fn default_history_limit() -> usize {
    50
}

impl Settings {
    pub fn new() -> Result<Self, anyhow::Error> {
        Self::from_root(".")
    }

    /// Create settings from CLI arguments (includes config file and CLI overrides)
    pub fn new_with_cli(cli: &Cli) -> Result<Self, anyhow::Error> {
        let s = Self::builder(cli.config.clone())?;

        let mut settings: Settings = s.try_deserialize()?;

        // CLI > env vars > config file
        settings.apply_cli_overrides(cli);

        settings.validated()
    }

    pub fn from_root(root: &str) -> Result<Self, anyhow::Error> {
        let config_path = std::path::Path::new(root).join("formrelay");
        let s = Self::builder(config_path)?;

        let settings: Settings = s.try_deserialize()?;
        settings.validated()
    }

    fn builder(config_path: PathBuf) -> Result<Config, anyhow::Error> {
        let config = Config::builder()
            .add_source(File::from(config_path).required(false))
            .add_source(
                Environment::with_prefix("FORMRELAY")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .build()?;
        Ok(config)
    }

    /// Apply CLI argument overrides to settings
    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let Some(host) = &cli.host {
            self.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.server.port = port;
        }

        if cli.has_hubspot_overrides() {
            if let Some(token) = &cli.access_token {
                self.hubspot.access_token = token.clone();
            }
            if let Some(portal_id) = &cli.portal_id {
                self.hubspot.portal_id = portal_id.clone();
            }
            if let Some(form_id) = &cli.form_id {
                self.hubspot.default_form_id = form_id.clone();
            }
        }
    }

    /// Fail fast on anything the server cannot run without.
    pub fn validated(self) -> Result<Self, anyhow::Error> {
        validator::ConfigValidator::validate(&self).map_err(|errors| {
            let error_messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::anyhow!(
                "Configuration validation failed:\n{}",
                error_messages.join("\n")
            )
        })?;
        Ok(self)
    }
}
