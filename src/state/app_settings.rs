use log::warn;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const BIND_VAR: &str = "FUT_BIND";
pub const TICK_VAR: &str = "FUT_TICK_MS";
pub const CATALOG_VAR: &str = "FUT_CATALOG_JSON";
pub const LOG_VAR: &str = "FUT_LOG";
pub const SEED_VAR: &str = "FUT_SEED";

pub const DEFAULT_BIND: &str = "0.0.0.0:5000";
pub const DEFAULT_TICK_MS: u64 = 1000;
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSettings {
    pub bind_addr: String,
    /// Real time per simulated minute.
    pub tick: Duration,
    pub catalog_path: Option<PathBuf>,
    pub seed: Option<u64>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND.to_string(),
            tick: Duration::from_millis(DEFAULT_TICK_MS),
            catalog_path: None,
            seed: None,
        }
    }
}

impl AppSettings {
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Log filter, read on its own so logging can start before the rest of
    /// the settings are parsed.
    pub fn log_filter() -> String {
        env::var(LOG_VAR)
            .ok()
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let tick = match value(TICK_VAR).map(|raw| (raw.parse::<u64>(), raw)) {
            Some((Ok(ms), _)) if ms > 0 => Duration::from_millis(ms),
            Some((_, raw)) => {
                warn!("ignoring {TICK_VAR}={raw}, using {DEFAULT_TICK_MS}ms");
                defaults.tick
            }
            None => defaults.tick,
        };

        let seed = value(SEED_VAR).and_then(|raw| match raw.parse::<u64>() {
            Ok(seed) => Some(seed),
            Err(_) => {
                warn!("ignoring {SEED_VAR}={raw}, seeding from entropy");
                None
            }
        });

        Self {
            bind_addr: value(BIND_VAR).unwrap_or(defaults.bind_addr),
            tick,
            catalog_path: value(CATALOG_VAR).map(PathBuf::from),
            seed,
        }
    }
}
