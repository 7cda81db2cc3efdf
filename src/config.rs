// Environment-driven configuration for the binaries

use std::env;
use std::fmt::Display;
use std::str::FromStr;

use tracing::{info, warn};

pub struct Config {
    pub db_path: String,
    pub port: u16,
}

impl Config {
    pub fn load() -> Self {
        Self {
            db_path: try_load("ROLLCALL_DB", "rollcall.db"),
            port: try_load("ROLLCALL_PORT", "3000"),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_env_unset() {
        env::remove_var("ROLLCALL_DB");
        env::remove_var("ROLLCALL_PORT");

        let config = Config::load();
        assert_eq!(config.db_path, "rollcall.db");
        assert_eq!(config.port, 3000);
    }
}
