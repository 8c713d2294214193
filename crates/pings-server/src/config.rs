use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use rand::Rng;
use tracing::{info, warn};
use url::Url;

use pings_api::ApiConfig;
use pings_api::state::{DEFAULT_URL_EXPIRY, MAX_URL_EXPIRY};

/// Everything the server reads from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub storage_dir: PathBuf,
    pub public_url: Url,
    pub signing_secret: Vec<u8>,
    pub url_expiry: Duration,
    pub family_topic: Option<String>,
    pub relay_url: Option<String>,
    pub auth_secret: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port: u16 = parse_or(&var, "PINGS_PORT", 3000)?;
        let expiry_secs: u64 = parse_or(&var, "PINGS_URL_EXPIRY_SECS", DEFAULT_URL_EXPIRY.as_secs())?;
        if expiry_secs == 0 || expiry_secs > MAX_URL_EXPIRY.as_secs() {
            bail!(
                "Invalid PINGS_URL_EXPIRY_SECS value: {expiry_secs} (must be between 1 and {})",
                MAX_URL_EXPIRY.as_secs()
            );
        }

        let public_url = var("PINGS_PUBLIC_URL").unwrap_or_else(|| format!("http://localhost:{}", port));
        let public_url = Url::parse(&public_url).with_context(|| format!("Invalid PINGS_PUBLIC_URL value: {public_url}"))?;

        let signing_secret = match var("PINGS_SIGNING_SECRET") {
            Some(secret) => secret.into_bytes(),
            None => {
                warn!("PINGS_SIGNING_SECRET not set, signed URLs will not survive a restart");
                let mut secret = vec![0u8; 32];
                rand::rng().fill(&mut secret[..]);
                secret
            }
        };

        Ok(Self {
            host: var("PINGS_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            db_path: var("PINGS_DB_PATH").unwrap_or_else(|| "pings.db".into()).into(),
            storage_dir: var("PINGS_STORAGE_DIR").unwrap_or_else(|| "./photo-storage".into()).into(),
            public_url,
            signing_secret,
            url_expiry: Duration::from_secs(expiry_secs),
            family_topic: var("PINGS_FAMILY_TOPIC"),
            relay_url: var("PINGS_RELAY_URL"),
            auth_secret: var("PINGS_AUTH_SECRET"),
        })
    }

    pub fn api(&self) -> ApiConfig {
        ApiConfig {
            family_topic: self.family_topic.clone(),
            url_expiry: self.url_expiry,
            auth_secret: self.auth_secret.clone(),
        }
    }
}

fn parse_or<T>(var: impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr + Display,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {key} value: {raw}")),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}
