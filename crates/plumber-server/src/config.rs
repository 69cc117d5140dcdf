use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Environment variable holding the number of stages.
pub const ENV_STAGES: &str = "STAGES_QTY";
pub const ENV_BIND: &str = "PLUMBER_BIND";
pub const ENV_LOG: &str = "PLUMBER_LOG";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Stages are numbered `1..=stages`. Zero rejects every stage request.
    pub stages: u32,
    pub max_body_bytes: usize,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 80)),
            stages: 0,
            max_body_bytes: 16 * 1024 * 1024,
            log_level: "info".into(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(raw: &str) -> ServerResult<Self> {
        toml::from_str(raw).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> ServerResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn to_toml_string(&self) -> ServerResult<String> {
        toml::to_string_pretty(self).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Override fields from environment variables. Unrelated variables are
    /// ignored; a malformed value for a known variable is an error.
    pub fn apply_env<I>(mut self, vars: I) -> ServerResult<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            match key.as_str() {
                ENV_STAGES => {
                    self.stages = value
                        .trim()
                        .parse()
                        .map_err(|_| ServerError::Config(format!("{ENV_STAGES}={value:?} is not a stage count")))?;
                }
                ENV_BIND => {
                    self.bind_addr = value
                        .trim()
                        .parse()
                        .map_err(|_| ServerError::Config(format!("{ENV_BIND}={value:?} is not a socket address")))?;
                }
                ENV_LOG => self.log_level = value,
                _ => {}
            }
        }
        Ok(self)
    }

    pub fn validate(&self) -> ServerResult<()> {
        if self.max_body_bytes == 0 {
            return Err(ServerError::Config("max_body_bytes must be positive".into()));
        }
        if self.stages == 0 {
            tracing::warn!("no stages configured; every stage request will be rejected");
        }
        Ok(())
    }
}
