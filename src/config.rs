//! CLI settings.
//!
//! ```json
//! { "transport": { "kind": "http", "baseUrl": "https://host/drive/items", "tokenEnv": "MY_TOKEN" } }
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Result, XlrelayError};
use crate::transport::{FsTransport, Transport};

/// Environment variable holding the bearer token unless overridden.
pub const DEFAULT_TOKEN_ENV: &str = "XLRELAY_TOKEN";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub transport: TransportSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TransportSettings {
    Fs {
        #[serde(default = "default_root")]
        root: PathBuf,
    },
    #[serde(rename_all = "camelCase")]
    Http {
        base_url: String,
        #[serde(default = "default_token_env")]
        token_env: String,
    },
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self::Fs {
            root: default_root(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_token_env() -> String {
    DEFAULT_TOKEN_ENV.to_string()
}

impl Settings {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| XlrelayError::validation(format!("Invalid settings: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let settings = Self::from_json_str(&text)?;
        log::debug!("loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Build the configured transport.
    ///
    /// The HTTP token is read from the environment here, so a missing
    /// variable fails before any request is made.
    pub fn build_transport(&self) -> Result<Box<dyn Transport>> {
        match &self.transport {
            TransportSettings::Fs { root } => Ok(Box::new(FsTransport::new(root.clone()))),
            TransportSettings::Http {
                base_url,
                token_env,
            } => build_http(base_url, token_env),
        }
    }
}

#[cfg(feature = "http")]
fn build_http(base_url: &str, token_env: &str) -> Result<Box<dyn Transport>> {
    let token = std::env::var(token_env).map_err(|_| {
        XlrelayError::validation(format!("Environment variable {token_env} is not set"))
    })?;
    Ok(Box::new(crate::transport::HttpTransport::new(
        base_url, token,
    )?))
}

#[cfg(not(feature = "http"))]
fn build_http(_base_url: &str, _token_env: &str) -> Result<Box<dyn Transport>> {
    Err(XlrelayError::validation(
        "HTTP transport requires the \"http\" feature",
    ))
}
