//! Server configuration loaded from environment variables.

use std::path::PathBuf;

pub const ENV_BIND: &str = "SNIPSHELL_BIND";
pub const ENV_DB: &str = "SNIPSHELL_DB";
pub const ENV_CORS_ORIGINS: &str = "SNIPSHELL_CORS_ORIGINS";
pub const ENV_URL: &str = "SNIPSHELL_URL";

const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Address to bind (from SNIPSHELL_BIND)
    pub bind: String,
    pub port: u16,
    /// Preferences database file (from SNIPSHELL_DB). `None` uses the
    /// platform data directory.
    pub database_path: Option<PathBuf>,
    /// Allowed CORS origins (from SNIPSHELL_CORS_ORIGINS, comma-separated).
    /// `None` allows any origin.
    pub cors_origins: Option<Vec<String>>,
}

impl ServerConfig {
    pub fn from_env(port: u16) -> Self {
        let bind = std::env::var(ENV_BIND).unwrap_or_else(|_| DEFAULT_BIND.to_string());
        let database_path = std::env::var(ENV_DB).ok().map(PathBuf::from);
        let cors_origins = std::env::var(ENV_CORS_ORIGINS).ok().map(|s| parse_origins(&s));

        Self {
            bind,
            port,
            database_path,
            cors_origins,
        }
    }

    /// Local defaults with permissive CORS (for development and tests).
    pub fn local() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
            database_path: None,
            cors_origins: None,
        }
    }

    /// Restricts CORS to the given origins.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_env(DEFAULT_PORT)
    }
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_config_allows_any_origin() {
        let config = ServerConfig::local();
        assert!(config.cors_origins.is_none());
        assert_eq!(config.address(), "127.0.0.1:3000");
    }

    #[test]
    fn origins_are_trimmed_and_split() {
        assert_eq!(
            parse_origins(" http://a.test, http://b.test ,"),
            vec!["http://a.test", "http://b.test"]
        );
    }

    #[test]
    fn with_cors_origins_restricts() {
        let config = ServerConfig::local().with_cors_origins(vec!["http://a.test".into()]);
        assert_eq!(config.cors_origins, Some(vec!["http://a.test".to_string()]));
    }
}
