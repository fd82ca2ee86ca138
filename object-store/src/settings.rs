//! Configuration for the standalone object-store binary (§4.8, §6.4).

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// Filesystem root under which every bucket directory is created.
    pub storage_root: String,
    /// Shared secret the backend presents as `X-API-Key` on every request.
    pub api_key: String,
    /// The same master secret the backend's `SECRET_KEY` holds; the ticket
    /// signing secret is re-derived from it (§3 Ticket) so browser clients
    /// hitting `download`/`view`/`upload-direct` directly can be
    /// authenticated without a round trip through the backend.
    pub secret_key: String,
    pub human_logs: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            host: "0.0.0.0".to_string(),
            port: 8081,
            storage_root: "./storage-data".to_string(),
            api_key: String::new(),
            secret_key: String::new(),
            human_logs: false,
        }
    }
}

impl Settings {
    pub fn with_env_and_config_file(filename: Option<&str>) -> Result<Self, ConfigError> {
        let mut s = Config::default();

        if let Some(config_filename) = filename {
            s.merge(File::with_name(config_filename))?;
        }

        s.merge(Environment::with_prefix("OBJECT_STORE").separator("__"))?;

        s.try_into()
    }

    pub fn banner(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Must derive byte-for-byte identically to the backend's own
    /// `Secrets::new` (same HKDF info string) or verification will fail
    /// for every ticket the backend issues.
    pub fn signing_secret_bytes(&self) -> [u8; 32] {
        selfdb_common::hkdf_expand_32(b"selfdb/tickets/v1/signing", None, self.secret_key.as_bytes())
            .unwrap_or([0u8; 32])
    }
}
