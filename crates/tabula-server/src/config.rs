//! Runtime server configuration.
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file, then the process environment. Environment keys are unprefixed
//! (`PORT`, `CORS`, `OPENAI_API_KEY`, …) and matched case-insensitively.

use std::{path::PathBuf, time::Duration};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                       String,
  pub port:                       u16,
  /// Allowed CORS origin; `*` allows any.
  pub cors:                       String,
  pub database_path:              PathBuf,
  pub openai_api_key:             String,
  pub openai_base_url:            String,
  pub rate_limit_ai_window_ms:    u64,
  pub rate_limit_ai_requests_max: u32,
  pub auth_jwt_secret:            String,
  pub auth_audience:              Option<String>,
  pub auth_issuer:                Option<String>,
}

impl ServerConfig {
  /// Load configuration from `file` (if it exists) and `env`.
  pub fn load(
    file: Option<PathBuf>,
    env: Environment,
  ) -> Result<Self, ConfigError> {
    let mut builder = Config::builder()
      .set_default("host", "0.0.0.0")?
      .set_default("port", 8000)?
      .set_default("cors", "*")?
      .set_default("database_path", "tabula.db")?
      .set_default("openai_api_key", "")?
      .set_default("openai_base_url", "https://api.openai.com/v1")?
      .set_default("rate_limit_ai_window_ms", 3 * 60 * 60 * 1000)?
      .set_default("rate_limit_ai_requests_max", 25)?;

    if let Some(path) = file {
      builder = builder.add_source(File::from(path).required(false));
    }

    builder.add_source(env).build()?.try_deserialize()
  }

  pub fn rate_limit_window(&self) -> Duration {
    Duration::from_millis(self.rate_limit_ai_window_ms)
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

#[cfg(test)]
mod tests {
  use super::*;

  /// An environment source no real variable will match.
  fn quiet_env() -> Environment {
    Environment::with_prefix("TABULA_CONFIG_TEST_UNSET")
  }

  fn write_toml(name: &str, body: &str) -> PathBuf {
    let path = std::env::temp_dir()
      .join(format!("tabula-{name}-{}.toml", std::process::id()));
    std::fs::write(&path, body).unwrap();
    path
  }

  #[test]
  fn defaults_apply_when_file_is_sparse() {
    let path = write_toml("sparse", "auth_jwt_secret = \"s3cret\"\n");
    let cfg = ServerConfig::load(Some(path.clone()), quiet_env()).unwrap();
    std::fs::remove_file(path).unwrap();

    assert_eq!(cfg.port, 8000);
    assert_eq!(cfg.cors, "*");
    assert_eq!(cfg.rate_limit_ai_requests_max, 25);
    assert_eq!(cfg.rate_limit_window(), Duration::from_secs(3 * 60 * 60));
    assert_eq!(cfg.auth_jwt_secret, "s3cret");
    assert!(cfg.auth_audience.is_none());
    assert_eq!(cfg.address(), "0.0.0.0:8000");
  }

  #[test]
  fn file_values_override_defaults() {
    let path = write_toml(
      "override",
      "auth_jwt_secret = \"x\"\nport = 9100\ncors = \"https://app.example.com\"\n\
       rate_limit_ai_requests_max = 5\nauth_audience = \"tabula\"\n",
    );
    let cfg = ServerConfig::load(Some(path.clone()), quiet_env()).unwrap();
    std::fs::remove_file(path).unwrap();

    assert_eq!(cfg.port, 9100);
    assert_eq!(cfg.cors, "https://app.example.com");
    assert_eq!(cfg.rate_limit_ai_requests_max, 5);
    assert_eq!(cfg.auth_audience.as_deref(), Some("tabula"));
  }

  #[test]
  fn missing_secret_is_an_error() {
    let path = write_toml("nosecret", "port = 1\n");
    let result = ServerConfig::load(Some(path.clone()), quiet_env());
    std::fs::remove_file(path).unwrap();
    assert!(result.is_err());
  }
}
