use std::collections::HashMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Deserialize;

use crate::domain::EntityType;
use crate::kinds::DiffPolicy;

pub const DEFAULT_FIXTURE: &str = "fixtures/townhall.json";
pub const DEFAULT_PORT: u16 = 8000;

#[derive(Parser, Debug)]
#[command(
    name = "townhall-activity",
    about = "Activity feed reconstruction for Townhall revision logs"
)]
pub struct Cli {
    /// Revision log fixture (JSON) to read history from
    #[arg(long, env = "TOWNHALL_FIXTURE")]
    pub fixture: Option<PathBuf>,

    /// Log file path
    #[arg(long, env = "TOWNHALL_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print one user's activity feed as JSON
    Feed {
        /// User whose activity to render
        #[arg(long)]
        user_id: String,
    },
    /// Serve GET /activities/ over HTTP
    Serve {
        /// Port to listen on
        #[arg(long, env = "TOWNHALL_PORT")]
        port: Option<u16>,

        /// Require `Authorization: Bearer <key>` on every route but /health
        #[arg(long, env = "TOWNHALL_API_KEY")]
        api_key: Option<String>,
    },
}

#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub fixture: Option<PathBuf>,
    pub port: Option<u16>,
    pub api_key: Option<String>,
    /// Extra diff ignore-lists, keyed by model name.
    #[serde(default)]
    pub ignore_fields: HashMap<String, Vec<String>>,
}

impl ConfigFile {
    pub fn load() -> Option<Self> {
        let config_dir = dirs::config_dir()?;
        let config_path = config_dir.join("townhall-activity").join("config.toml");
        let content = std::fs::read_to_string(config_path).ok()?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Option<Self> {
        match toml::from_str(content) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!("ignoring malformed config file: {}", e);
                None
            }
        }
    }

    /// Registry defaults extended with the configured ignore-lists.
    pub fn diff_policy(&self) -> DiffPolicy {
        let mut policy = DiffPolicy::new();
        for (model, fields) in &self.ignore_fields {
            match EntityType::from_model_name(model) {
                Some(kind) => policy = policy.ignore(kind, fields.iter().cloned()),
                None => tracing::warn!("ignore_fields names unknown model '{}'", model),
            }
        }
        policy
    }
}

/// Settings after layering CLI flags and env vars over the config file.
#[derive(Debug, Clone)]
pub struct Settings {
    pub fixture: PathBuf,
    pub port: u16,
    pub api_key: Option<String>,
}

impl Settings {
    pub fn resolve(cli: &Cli, file: &ConfigFile) -> Self {
        let (port, api_key) = match &cli.command {
            Command::Serve { port, api_key } => (*port, api_key.clone()),
            Command::Feed { .. } => (None, None),
        };
        Self {
            fixture: cli
                .fixture
                .clone()
                .or_else(|| file.fixture.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FIXTURE)),
            port: port.or(file.port).unwrap_or(DEFAULT_PORT),
            api_key: api_key
                .or_else(|| file.api_key.clone())
                .filter(|k| !k.is_empty()),
        }
    }
}
