//! Application settings, loaded from environment variables (prefix `SELFDB`)
//! and an optional config file, mirroring syncserver-settings' loading
//! strategy.

#[macro_use]
extern crate slog_scope;

use std::env::{self, VarError};

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Deserializer};

static PREFIX: &str = "selfdb";

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PostgresSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub pool_max_size: u32,
    pub pool_connection_timeout_secs: u32,
}

impl Default for PostgresSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5432,
            user: "selfdb".to_string(),
            password: String::new(),
            dbname: "selfdb".to_string(),
            pool_max_size: 10,
            pool_connection_timeout_secs: 30,
        }
    }
}

impl PostgresSettings {
    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.dbname
        )
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub host: String,
    pub port: u16,

    pub postgres: PostgresSettings,

    /// Derives the HMAC signing secret for tickets (§3 Ticket).
    pub secret_key: Secrets,
    /// Shared secret granting anonymous, read-only access to public
    /// resources (§3 Principal).
    pub anon_key: String,

    pub storage_service_url: String,
    pub storage_service_external_url: String,
    /// Shared secret the backend presents to the storage service.
    pub storage_service_api_key: String,

    pub access_token_expire_minutes: i64,
    pub refresh_token_expire_days: i64,
    /// TTL handed to the storage service for direct-upload URLs (§4.7).
    pub upload_url_ttl_secs: u64,

    pub cors_allowed_origins: Option<Vec<String>>,
    /// Policy Cache bounded-staleness window, in seconds (§4.1).
    pub cors_cache_ttl_secs: u64,

    pub human_logs: bool,
    pub statsd_host: Option<String>,
    pub statsd_port: u16,
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            host: "0.0.0.0".to_string(),
            port: 8080,
            postgres: PostgresSettings::default(),
            secret_key: Secrets::default(),
            anon_key: String::new(),
            storage_service_url: "http://localhost:8001".to_string(),
            storage_service_external_url: "http://localhost:8001".to_string(),
            storage_service_api_key: String::new(),
            access_token_expire_minutes: 30,
            refresh_token_expire_days: 30,
            upload_url_ttl_secs: 3600,
            cors_allowed_origins: None,
            cors_cache_ttl_secs: 300,
            human_logs: false,
            statsd_host: Some("localhost".to_owned()),
            statsd_port: 8125,
        }
    }
}

impl Settings {
    /// Load settings from an optional config file, then env var overrides.
    ///
    /// `SELFDB_FOO__BAR="gorp"` maps to `foo.bar = "gorp"`.
    pub fn with_env_and_config_file(filename: Option<&str>) -> Result<Self, ConfigError> {
        let mut s = Config::default();

        if let Some(config_filename) = filename {
            s.merge(File::with_name(config_filename))?;
        }

        s.merge(Environment::with_prefix(&PREFIX.to_uppercase()).separator("__"))?;

        match s.try_into::<Self>() {
            Ok(settings) => {
                if matches!(env::var("ACTIX_THREADPOOL"), Err(VarError::NotPresent)) {
                    env::set_var(
                        "ACTIX_THREADPOOL",
                        (settings.postgres.pool_max_size as usize)
                            .max(num_cpus::get() * 5)
                            .to_string(),
                    );
                }
                Ok(settings)
            }
            Err(ConfigError::Message(v)) => {
                error!("Configuration error: value undefined {:?}", &v);
                println!("Bad configuration: {:?}", &v);
                println!("Please set in config file or use environment variable.");
                println!(
                    "For example to set `postgres.host` use env var `{}_POSTGRES__HOST`\n",
                    PREFIX.to_uppercase()
                );
                Err(ConfigError::NotFound(v))
            }
            Err(e) => {
                error!("Configuration error: {:?}", &e);
                Err(e)
            }
        }
    }

    #[cfg(debug_assertions)]
    pub fn test_settings() -> Self {
        let mut settings = Self::default();
        settings.secret_key = Secrets::new("test-secret-key-not-for-production").unwrap();
        settings.anon_key = "test-anon-key".to_string();
        settings.postgres.pool_max_size = 1;
        settings
    }

    pub fn banner(&self) -> String {
        format!(
            "http://{}:{} (postgres@{}) anon_key={}",
            self.host,
            self.port,
            self.postgres.host,
            if self.anon_key.is_empty() {
                "<unset>"
            } else {
                "<set>"
            }
        )
    }
}

/// Secrets derived from the configured `secret_key`.
#[derive(Clone, Debug)]
pub struct Secrets {
    pub master_secret: Vec<u8>,
    pub signing_secret: [u8; 32],
}

impl Secrets {
    pub fn new(master_secret: &str) -> Result<Self, String> {
        let master_secret = master_secret.as_bytes().to_vec();
        let signing_secret = selfdb_common::hkdf_expand_32(
            b"selfdb/tickets/v1/signing",
            None,
            &master_secret,
        )?;
        Ok(Self {
            master_secret,
            signing_secret,
        })
    }
}

impl Default for Secrets {
    fn default() -> Self {
        Self {
            master_secret: vec![],
            signing_secret: [0u8; 32],
        }
    }
}

impl<'d> Deserialize<'d> for Secrets {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'d>,
    {
        let master_secret: String = Deserialize::deserialize(deserializer)?;
        Secrets::new(&master_secret).map_err(|e| serde::de::Error::custom(format!("error: {:?}", e)))
    }
}

#[cfg(test)]
mod test {
    use std::env;

    use super::*;

    #[test]
    fn test_environment_variable_prefix() {
        env::set_var("SELFDB_PORT", "9999");
        let settings = Settings::with_env_and_config_file(None).unwrap();
        assert_eq!(settings.port, 9999);
        env::remove_var("SELFDB_PORT");

        env::set_var("SELF__PORT", "1234");
        let settings = Settings::with_env_and_config_file(None).unwrap();
        assert_ne!(settings.port, 1234);
        env::remove_var("SELF__PORT");
    }

    #[test]
    fn test_postgres_nested_override() {
        env::set_var("SELFDB_POSTGRES__HOST", "db.internal");
        let settings = Settings::with_env_and_config_file(None).unwrap();
        assert_eq!(settings.postgres.host, "db.internal");
        env::remove_var("SELFDB_POSTGRES__HOST");
    }
}
