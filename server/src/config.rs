use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use chrono::Duration;
use tracing::{info, warn};

/// Runtime configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub media_root: PathBuf,
    pub max_upload_bytes: usize,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
}

impl Config {
    pub fn load() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            bind_addr: try_load("BIND_ADDR", "0.0.0.0:3000"),
            media_root: try_load("MEDIA_ROOT", "./media"),
            max_upload_bytes: try_load("MAX_UPLOAD_BYTES", "52428800"),
            access_token_ttl: Duration::minutes(try_load("ACCESS_TOKEN_TTL_MINUTES", "60")),
            refresh_token_ttl: Duration::days(try_load("REFRESH_TOKEN_TTL_DAYS", "30")),
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}
