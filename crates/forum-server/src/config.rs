use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;

const DEFAULT_BODY_LIMIT: usize = 20 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    /// Sign-ups presenting this token become Admin. Unset disables elevation.
    pub admin_token: Option<String>,
    /// CORS origin allowed to send credentials. Unset means permissive CORS.
    pub client_origin: Option<String>,
    pub body_limit: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let port = match non_empty("FORUM_PORT") {
            Some(v) => v.parse().with_context(|| format!("FORUM_PORT is not a port: {}", v))?,
            None => 8081,
        };
        let body_limit = match non_empty("FORUM_BODY_LIMIT_BYTES") {
            Some(v) => v
                .parse()
                .with_context(|| format!("FORUM_BODY_LIMIT_BYTES is not a byte count: {}", v))?,
            None => DEFAULT_BODY_LIMIT,
        };

        Ok(Self {
            host: non_empty("FORUM_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            db_path: non_empty("FORUM_DB_PATH").unwrap_or_else(|| "forum.db".into()).into(),
            admin_token: non_empty("FORUM_ADMIN_TOKEN"),
            client_origin: non_empty("FORUM_CLIENT_ORIGIN"),
            body_limit,
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().with_context(|| format!("invalid listen address {}", addr))
    }
}
