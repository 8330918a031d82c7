use std::{
    fs::{create_dir_all, write},
    net::SocketAddr,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use jsonwebtoken::{DecodingKey, EncodingKey};
use log::{debug, info};
use serde::{Deserialize, Deserializer};

/// Prefix of the environment variables that overwrite the config file
const ENV_PREFIX: &str = "SAFE_SPOTTER_SERVER_";

/// Environment variable pointing to the config file
const CONFIG_PATH_VAR: &str = "SAFE_SPOTTER_SERVER_CONFIG";

const JWT_SECRET_VAR: &str = "SAFE_SPOTTER_SERVER_JWT_SECRET";

const SAMPLE_CONFIG: &str = include_str!("../other/config.sample");

#[derive(Deserialize, Clone)]
pub struct Config {
    /// The address the http server binds to
    pub listen: SocketAddr,
    /// Either a postgres connection string or ``memory://``
    pub db_uri: String,
    /// Keys derived from the secret used to sign and verify bearer tokens.
    /// Deliberately without a default.
    #[serde(deserialize_with = "deserialize_jwt_secret")]
    pub jwt_secret: JwtKeys,
    #[serde(default)]
    pub vote_policy: VotePolicy,
    /// How often the owner-list write after a new review is attempted
    #[serde(default = "default_link_attempts")]
    pub link_attempts: u32,
    /// Seconds between two consistency sweeps, 0 turns the periodic sweep off
    #[serde(default = "default_sweep_secs")]
    pub consistency_sweep_secs: u64,
}

/// The pair of keys derived from the configured ``jwt_secret``
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
}

impl JwtKeys {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// Who may vote how often on a review
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum VotePolicy {
    /// Any authenticated user may vote any number of times
    #[default]
    Unlimited,
    /// One vote (up or down) per user and review
    OncePerUser,
}

fn default_link_attempts() -> u32 {
    3
}

fn default_sweep_secs() -> u64 {
    600
}

impl Config {
    /// Load the configuration
    ///
    /// The path is read from ``SAFE_SPOTTER_SERVER_CONFIG`` or defaults to
    /// ``config.toml`` in the platform's config directory. A sample config is
    /// written there if the file does not exist yet.
    pub fn load() -> anyhow::Result<Self> {
        let path = config_path()?;

        // write the sample config to the file only if it does not exist
        if !path.exists() {
            if let Some(parent) = path.parent() {
                create_dir_all(parent)?;
            }
            info!("Creating config with default options at {}", path.display());
            write(&path, SAMPLE_CONFIG)?;
        }

        info!("Reading config from {}", path.display());
        let config = Self::figment(&path).extract().map_err(|e| {
            anyhow::anyhow!(
                "invalid configuration in {} (or {}* env vars): {}",
                path.display(),
                ENV_PREFIX,
                e
            )
        })?;
        Ok(config)
    }

    fn figment(path: &Path) -> Figment {
        let figment = Figment::new()
            // first read the config file
            .merge(Toml::file(path))
            // and then let the env overwrite options
            .merge(Env::prefixed(ENV_PREFIX));

        // Env parses values like ``0123`` into numbers, the secret has to
        // stay exactly as it was given
        match std::env::var(JWT_SECRET_VAR) {
            Ok(secret) => figment.merge(Serialized::default("jwt_secret", secret)),
            Err(_) => figment,
        }
    }
}

fn config_path() -> anyhow::Result<PathBuf> {
    match std::env::var(CONFIG_PATH_VAR) {
        Ok(path) => Ok(path.into()),
        Err(e) => {
            debug!("Cannot read env var for config path: {}", e);
            let dirs = ProjectDirs::from("app", "safespotter", env!("CARGO_CRATE_NAME"))
                .ok_or_else(|| anyhow::anyhow!("cannot determine the config directory"))?;
            Ok(dirs.config_dir().join("config.toml"))
        }
    }
}

/// A secret written without quotes in the config file
#[derive(Deserialize)]
#[serde(untagged)]
enum Secret {
    Text(String),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Bool(bool),
}

impl From<Secret> for String {
    fn from(secret: Secret) -> Self {
        match secret {
            Secret::Text(secret) => secret,
            Secret::Integer(n) => n.to_string(),
            Secret::Unsigned(n) => n.to_string(),
            Secret::Float(n) => n.to_string(),
            Secret::Bool(b) => b.to_string(),
        }
    }
}

fn deserialize_jwt_secret<'de, D>(secret: D) -> Result<JwtKeys, D::Error>
where
    D: Deserializer<'de>,
{
    let secret = String::from(Secret::deserialize(secret)?);
    if secret.trim().is_empty() {
        return Err(<D::Error as serde::de::Error>::custom(
            "jwt_secret must not be empty",
        ));
    }
    Ok(JwtKeys::from_secret(secret.as_bytes()))
}
