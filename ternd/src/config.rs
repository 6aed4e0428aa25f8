use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CNI_ENDPOINT: &str = "/var/run/tern/cni.sock";
pub const DEFAULT_VROUTER_ENDPOINT: &str = "http://localhost:50052";
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_vrouter_endpoint")]
    pub vrouter_endpoint: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            vrouter_endpoint: default_vrouter_endpoint(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl Config {
    pub fn load(file: &str) -> Result<Config, ConfigError> {
        let contents = std::fs::read_to_string(file)?;
        let config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }
}

fn default_endpoint() -> String {
    DEFAULT_CNI_ENDPOINT.to_string()
}

fn default_vrouter_endpoint() -> String {
    DEFAULT_VROUTER_ENDPOINT.to_string()
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}
