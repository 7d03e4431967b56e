use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    /// Lifetime of issued bearer tokens, in seconds.
    pub token_ttl_secs: i64,
    pub uploads_dir: String,
    pub auth_rps: u32,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            token_ttl_secs: get_env_parse("TOKEN_TTL_SECS")?,
            uploads_dir: env::var("UPLOADS_DIR").unwrap_or_else(|_| "uploads".to_string()),
            auth_rps: get_env_parse("AUTH_RPS")?,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse<T>(name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get_env(name)?;
    raw.parse()
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_env_values() {
        env::set_var("TEST_TTL_VALUE", "3600");
        let parsed: i64 = get_env_parse("TEST_TTL_VALUE").unwrap();
        assert_eq!(parsed, 3600);

        env::set_var("TEST_TTL_VALUE", "not-a-number");
        assert!(get_env_parse::<i64>("TEST_TTL_VALUE").is_err());
    }

    #[test]
    fn missing_variable_is_a_config_error() {
        assert!(get_env("DEFINITELY_NOT_SET_ANYWHERE").is_err());
    }
}
