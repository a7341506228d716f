use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Config {
    /// Default index queried when neither the caller nor the entity names one
    #[serde(default = "default_index")]
    pub index: String,

    /// Version of the target engine, drives document URL layout
    #[serde(default = "default_engine_version")]
    pub elasticsearch_version: String,

    /// Connection settings
    #[serde(default)]
    #[validate(nested)]
    pub connection: ConnectionConfig,

    /// Hit discriminator to entity kind
    #[serde(default)]
    pub mappings: HashMap<String, String>,

    /// Pagination defaults
    #[serde(default)]
    pub pagination: PaginationConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("MYSTICQUENT_CONFIG")
            .unwrap_or_else(|_| "config/mysticquent.toml".to_string());
        Self::load_from(&config_path)
    }

    /// Load configuration layering the given file over the embedded defaults
    pub fn load_from(config_path: &str) -> Result<Self> {
        let config: Config = config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(config_path).required(false))
            // Override with environment variables (prefix: MYSTICQUENT_)
            .add_source(
                config::Environment::with_prefix("MYSTICQUENT")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("connection.hosts")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Major version of the configured engine
    pub fn engine_major_version(&self) -> u32 {
        self.elasticsearch_version
            .split('.')
            .next()
            .and_then(|major| major.trim().parse().ok())
            .unwrap_or(7)
    }

    /// Engines before 7.x address documents by mapping type
    pub fn uses_mapping_types(&self) -> bool {
        self.engine_major_version() < 7
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index: default_index(),
            elasticsearch_version: default_engine_version(),
            connection: ConnectionConfig::default(),
            mappings: HashMap::new(),
            pagination: PaginationConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConnectionConfig {
    /// Engine nodes, `host:port` or full URLs
    #[serde(default = "default_hosts")]
    #[validate(length(min = 1))]
    pub hosts: Vec<String>,

    /// Request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    #[validate(range(min = 1, max = 600))]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            hosts: default_hosts(),
            timeout_secs: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            per_page: default_per_page(),
        }
    }
}

fn default_index() -> String {
    "_all".to_string()
}

fn default_engine_version() -> String {
    "5.3.5".to_string()
}

fn default_hosts() -> Vec<String> {
    vec!["127.0.0.1:9200".to_string()]
}

fn default_request_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("mysticquent/{}", env!("CARGO_PKG_VERSION"))
}

fn default_per_page() -> u64 {
    30
}
