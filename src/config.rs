use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    /// Base URL of the external realtime store, e.g.
    /// `https://hiregenius-default-rtdb.firebaseio.com`. Empty selects the
    /// in-memory backend (local development and tests).
    pub store_base_url: String,
    /// Optional auth query token appended to store requests.
    pub store_auth_token: Option<String>,
    /// Base URL of the identity provider REST API.
    pub identity_base_url: String,
    pub identity_api_key: String,
    /// Generative-text endpoint and key for question generation.
    pub generation_base_url: String,
    pub generation_api_key: String,
    pub jwt_secret: String,
    pub api_rps: u32,
    pub public_rps: u32,
    pub uploads_dir: String,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            store_base_url: env::var("STORE_BASE_URL").unwrap_or_default(),
            store_auth_token: env::var("STORE_AUTH_TOKEN").ok(),
            identity_base_url: env::var("IDENTITY_BASE_URL")
                .unwrap_or_else(|_| "https://identitytoolkit.googleapis.com/v1".to_string()),
            identity_api_key: get_env("IDENTITY_API_KEY")?,
            generation_base_url: env::var("GENERATION_BASE_URL").unwrap_or_else(|_| {
                "https://generativelanguage.googleapis.com/v1beta".to_string()
            }),
            generation_api_key: get_env("GENERATION_API_KEY")?,
            jwt_secret: get_env("JWT_SECRET")?,
            api_rps: get_env_parse("API_RPS")?,
            public_rps: get_env_parse("PUBLIC_RPS")?,
            uploads_dir: env::var("UPLOADS_DIR").unwrap_or_else(|_| "uploads".to_string()),
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
