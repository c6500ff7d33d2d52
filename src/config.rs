use std::{fmt, str::FromStr, time::Duration};

use crate::error::{ChurnError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SslMode {
    Disable,
    #[default]
    Prefer,
    Require,
}

impl FromStr for SslMode {
    type Err = ChurnError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "disable" => Ok(SslMode::Disable),
            "prefer" => Ok(SslMode::Prefer),
            "require" => Ok(SslMode::Require),
            other => Err(ChurnError::Config(format!(
                "unsupported sslmode {other:?} (expected disable, prefer or require)"
            ))),
        }
    }
}

impl From<SslMode> for deadpool_postgres::SslMode {
    fn from(mode: SslMode) -> Self {
        match mode {
            SslMode::Disable => deadpool_postgres::SslMode::Disable,
            SslMode::Prefer => deadpool_postgres::SslMode::Prefer,
            SslMode::Require => deadpool_postgres::SslMode::Require,
        }
    }
}

/// Connection parameters for the source database.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
    pub ssl_mode: SslMode,
    /// Schema holding the `ActiveUsers` and `RefreshTokens` relations
    pub schema: String,
    pub connect_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            port: 5432,
            dbname: "postgres".to_owned(),
            user: "postgres".to_owned(),
            password: String::new(),
            ssl_mode: SslMode::Prefer,
            schema: "public".to_owned(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

// password stays out of logs
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &"***")
            .field("ssl_mode", &self.ssl_mode)
            .field("schema", &self.schema)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

fn env(env_key: &str, default: &str) -> String {
    std::env::var(env_key).unwrap_or_else(|_| default.to_owned())
}

fn env_parsed<T: FromStr>(env_key: &str, default: T) -> Result<T> {
    match std::env::var(env_key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ChurnError::Config(format!("{env_key}={value:?} is not a valid value"))),
        Err(_) => Ok(default),
    }
}

impl DatabaseConfig {
    /// Reads `DB_HOST`, `DB_PORT`, `DB_NAME`, `DB_USER`, `DB_PASSWORD`,
    /// `DB_SSLMODE`, `DB_SCHEMA` and `DB_CONNECT_TIMEOUT` (seconds).
    pub fn from_env() -> Result<DatabaseConfig> {
        let defaults = DatabaseConfig::default();

        let ssl_mode = match std::env::var("DB_SSLMODE") {
            Ok(value) => value.trim().parse()?,
            Err(_) => defaults.ssl_mode,
        };

        let connect_timeout = env_parsed("DB_CONNECT_TIMEOUT", defaults.connect_timeout.as_secs())?;

        Ok(DatabaseConfig {
            host: env("DB_HOST", &defaults.host),
            port: env_parsed("DB_PORT", defaults.port)?,
            dbname: env("DB_NAME", &defaults.dbname),
            user: env("DB_USER", &defaults.user),
            password: env("DB_PASSWORD", &defaults.password),
            ssl_mode,
            schema: env("DB_SCHEMA", &defaults.schema),
            connect_timeout: Duration::from_secs(connect_timeout),
        })
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    /// A single-connection pool configuration; one run never needs more.
    pub fn pool_config(&self) -> deadpool_postgres::Config {
        deadpool_postgres::Config {
            dbname: Some(self.dbname.clone()),
            host: Some(self.host.clone()),
            port: Some(self.port),
            user: Some(self.user.clone()),
            password: Some(self.password.clone()),
            ssl_mode: Some(self.ssl_mode.into()),
            connect_timeout: Some(self.connect_timeout),
            application_name: Some(env!("CARGO_PKG_NAME").to_owned()),
            manager: Some(deadpool_postgres::ManagerConfig {
                recycling_method: deadpool_postgres::RecyclingMethod::Fast,
            }),
            pool: Some(deadpool_postgres::PoolConfig::new(1)),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 8] = [
        "DB_HOST",
        "DB_PORT",
        "DB_NAME",
        "DB_USER",
        "DB_PASSWORD",
        "DB_SSLMODE",
        "DB_SCHEMA",
        "DB_CONNECT_TIMEOUT",
    ];

    fn unset_all() -> Vec<(&'static str, Option<&'static str>)> {
        VARS.iter().map(|key| (*key, None)).collect()
    }

    #[test]
    fn test_defaults_without_env() {
        temp_env::with_vars(unset_all(), || {
            let config = DatabaseConfig::from_env().unwrap();
            assert_eq!(config, DatabaseConfig::default());
        });
    }

    #[test]
    fn test_env_overrides() {
        temp_env::with_vars(
            [
                ("DB_HOST", Some("db.internal")),
                ("DB_PORT", Some("6432")),
                ("DB_NAME", Some("identity")),
                ("DB_USER", Some("analyst")),
                ("DB_PASSWORD", Some("hunter2")),
                ("DB_SSLMODE", Some("Require")),
                ("DB_SCHEMA", Some("auth")),
                ("DB_CONNECT_TIMEOUT", Some("3")),
            ],
            || {
                let config = DatabaseConfig::from_env().unwrap();
                assert_eq!(config.host, "db.internal");
                assert_eq!(config.port, 6432);
                assert_eq!(config.dbname, "identity");
                assert_eq!(config.user, "analyst");
                assert_eq!(config.password, "hunter2");
                assert_eq!(config.ssl_mode, SslMode::Require);
                assert_eq!(config.schema, "auth");
                assert_eq!(config.connect_timeout, Duration::from_secs(3));
            },
        );
    }

    #[test]
    fn test_malformed_port_is_error() {
        temp_env::with_var("DB_PORT", Some("not-a-port"), || {
            let err = DatabaseConfig::from_env().unwrap_err();
            assert!(matches!(err, ChurnError::Config(_)));
            assert!(err.to_string().contains("DB_PORT"));
        });
    }

    #[test]
    fn test_unknown_sslmode_is_error() {
        temp_env::with_var("DB_SSLMODE", Some("verify-full"), || {
            assert!(matches!(DatabaseConfig::from_env(), Err(ChurnError::Config(_))));
        });
    }

    #[test]
    fn test_debug_hides_password() {
        let config = DatabaseConfig {
            password: "hunter2".to_owned(),
            ..Default::default()
        };

        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn test_pool_config_single_connection() {
        let config = DatabaseConfig::default().with_schema("auth");
        let pool = config.pool_config();

        assert_eq!(pool.host.as_deref(), Some("localhost"));
        assert_eq!(pool.port, Some(5432));
        assert_eq!(pool.pool.map(|p| p.max_size), Some(1));
        assert_eq!(config.schema, "auth");
    }
}
