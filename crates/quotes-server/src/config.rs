use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "secret",
];

const MAX_DB_READERS: usize = 64;

pub struct Config {
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub db_path: PathBuf,
    pub db_readers: usize,
    pub addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = get("QUOTES_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("QUOTES_JWT_SECRET is unset or still a placeholder");
        }

        let ttl_hours: i64 = parse_or(&get, "QUOTES_TOKEN_TTL_HOURS", 72)?;
        if ttl_hours <= 0 {
            bail!("QUOTES_TOKEN_TTL_HOURS must be positive");
        }

        let db_readers: usize = parse_or(&get, "QUOTES_DB_READERS", quotes_db::DEFAULT_READER_POOL_SIZE)?;
        if db_readers == 0 || db_readers > MAX_DB_READERS {
            bail!("QUOTES_DB_READERS must be between 1 and {}", MAX_DB_READERS);
        }

        let host = get("QUOTES_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = parse_or(&get, "QUOTES_PORT", 8080)?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", host, port))?;

        Ok(Self {
            jwt_secret,
            token_ttl: chrono::Duration::hours(ttl_hours),
            db_path: get("QUOTES_DB_PATH")
                .unwrap_or_else(|| "quotes.db".into())
                .into(),
            db_readers,
            addr,
        })
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{} has invalid value '{}'", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let cfg = config(&[("QUOTES_JWT_SECRET", "a-real-secret")]).unwrap();
        assert_eq!(cfg.addr.port(), 8080);
        assert_eq!(cfg.db_path, PathBuf::from("quotes.db"));
        assert_eq!(cfg.db_readers, quotes_db::DEFAULT_READER_POOL_SIZE);
        assert_eq!(cfg.token_ttl, chrono::Duration::hours(72));
    }

    #[test]
    fn placeholder_secret_is_rejected() {
        assert!(config(&[]).is_err());
        assert!(config(&[("QUOTES_JWT_SECRET", "dev-secret-change-me")]).is_err());
    }

    #[test]
    fn bad_numbers_are_reported() {
        let err = config(&[("QUOTES_JWT_SECRET", "s3cr3t!"), ("QUOTES_PORT", "eighty")])
            .err()
            .unwrap();
        assert!(err.to_string().contains("QUOTES_PORT"));

        assert!(config(&[("QUOTES_JWT_SECRET", "s3cr3t!"), ("QUOTES_DB_READERS", "0")]).is_err());
    }
}
