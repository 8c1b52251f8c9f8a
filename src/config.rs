use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};
use dotenvy::dotenv;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    /// Seconds between clock-out sweeps; 0 disables the task.
    pub clock_out_sweep_interval_secs: u64,

    pub log_dir: String,
    pub log_level: tracing::Level,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn parsed<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: parsed("ACCESS_TOKEN_TTL", 900)?, // 15 min
            refresh_token_ttl: parsed("REFRESH_TOKEN_TTL", 604_800)?, // 7 days

            rate_login_per_min: parsed("RATE_LOGIN_PER_MIN", 60)?,
            rate_refresh_per_min: parsed("RATE_REFRESH_PER_MIN", 30)?,
            rate_protected_per_min: parsed("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            clock_out_sweep_interval_secs: parsed("CLOCK_OUT_SWEEP_INTERVAL_SECS", 0)?,

            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            log_level: parsed("LOG_LEVEL", tracing::Level::DEBUG)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_default_and_reports_bad_values() {
        // Keys unique to this test; no other test touches them.
        unsafe {
            env::remove_var("OFFICEFLOW_TEST_UNSET");
            env::set_var("OFFICEFLOW_TEST_BAD", "ten");
            env::set_var("OFFICEFLOW_TEST_GOOD", " 42 ");
        }

        assert_eq!(parsed::<u64>("OFFICEFLOW_TEST_UNSET", 7).unwrap(), 7);
        assert_eq!(parsed::<u64>("OFFICEFLOW_TEST_GOOD", 7).unwrap(), 42);

        let err = parsed::<u64>("OFFICEFLOW_TEST_BAD", 7).unwrap_err();
        assert!(err.to_string().contains("OFFICEFLOW_TEST_BAD"));
    }

    #[test]
    fn log_level_names_parse() {
        assert_eq!("info".parse::<tracing::Level>().unwrap(), tracing::Level::INFO);
    }
}
