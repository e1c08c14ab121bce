// config.rs
use std::{env, fmt::Display, str::FromStr};

use tracing::info;

pub struct Config {
    pub port: u16,
    pub database_url: Option<String>,
    /// Disabled for serverless-style deployments where a persistent
    /// connection cannot be maintained.
    pub live_updates: bool,
    pub broadcast_capacity: usize,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("PORT", "3030"),
            database_url: env::var("DATABASE_URL").ok(),
            live_updates: try_load("LIVE_UPDATES", "true"),
            broadcast_capacity: try_load("BROADCAST_CAPACITY", "64"),
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
        .unwrap_or_else(|e| panic!("invalid {key} value: {e}"))
}
