use clap::Parser;
use std::path::PathBuf;

/// Renders HubSpot marketing forms and relays their submissions
#[derive(Parser, Debug, Clone)]
#[command(name = "formrelay", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "FORMRELAY_CONFIG", default_value = "formrelay.toml")]
    pub config: PathBuf,

    /// Server host address
    #[arg(long, env = "FORMRELAY_HOST")]
    pub host: Option<String>,

    /// Server port
    #[arg(long, env = "FORMRELAY_PORT")]
    pub port: Option<u16>,

    /// HubSpot private app access token
    #[arg(long, env = "HUBSPOT_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// HubSpot portal (account) id
    #[arg(long, env = "HUBSPOT_PORTAL_ID")]
    pub portal_id: Option<String>,

    /// Form rendered at `/`
    #[arg(long, env = "HUBSPOT_FORM_ID")]
    pub form_id: Option<String>,
}

impl Cli {
    /// Check if any HubSpot setting is provided via CLI or environment
    pub fn has_hubspot_overrides(&self) -> bool {
        self.access_token.is_some() || self.portal_id.is_some() || self.form_id.is_some()
    }
}
