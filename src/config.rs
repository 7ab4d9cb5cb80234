use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub server_host: String,
    pub server_port: u16,
    pub data_dir: PathBuf,
    pub upstream_base_url: String,
    pub upstream_api_key: String,
    pub upstream_timeout_secs: u64,
    pub chat_model: String,
    pub image_model: String,
    pub token_secret: String,
    pub token_ttl_secs: u64,
    pub log_level: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 3000,
            data_dir: PathBuf::from("data/gateway"),
            upstream_base_url: "https://api.openai.com".to_string(),
            upstream_api_key: String::new(),
            upstream_timeout_secs: 30,
            chat_model: "gpt-4o-mini".to_string(),
            image_model: "gpt-image-1".to_string(),
            token_secret: String::new(),
            token_ttl_secs: 86_400,
            log_level: "info".to_string(),
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();

        if let Ok(host) = env::var("GATEWAY_HOST") {
            cfg.server_host = host;
        }
        if let Ok(port) = env::var("GATEWAY_PORT") {
            cfg.server_port = port.parse().context("GATEWAY_PORT must be a valid u16")?;
        }
        if let Ok(dir) = env::var("GATEWAY_DATA_DIR") {
            cfg.data_dir = PathBuf::from(dir);
        }
        if let Ok(url) = env::var("UPSTREAM_BASE_URL") {
            cfg.upstream_base_url = url;
        }
        if let Ok(key) = env::var("UPSTREAM_API_KEY") {
            cfg.upstream_api_key = key;
        }
        if let Ok(timeout) = env::var("UPSTREAM_TIMEOUT_SECS") {
            cfg.upstream_timeout_secs = timeout
                .parse()
                .context("UPSTREAM_TIMEOUT_SECS must be a positive integer")?;
        }
        if let Ok(model) = env::var("CHAT_MODEL") {
            cfg.chat_model = model;
        }
        if let Ok(model) = env::var("IMAGE_MODEL") {
            cfg.image_model = model;
        }
        if let Ok(secret) = env::var("TOKEN_SECRET") {
            cfg.token_secret = secret;
        }
        if let Ok(ttl) = env::var("TOKEN_TTL_SECS") {
            cfg.token_ttl_secs = ttl
                .parse()
                .context("TOKEN_TTL_SECS must be a positive integer")?;
        }
        if let Ok(level) = env::var("LOG_LEVEL") {
            cfg.log_level = level;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        ensure_directory(&self.data_dir)?;

        if self.upstream_base_url.trim().is_empty() {
            anyhow::bail!("UPSTREAM_BASE_URL must not be empty");
        }
        if self.upstream_timeout_secs == 0 {
            anyhow::bail!("UPSTREAM_TIMEOUT_SECS must be greater than zero");
        }
        if self.token_secret.len() < 32 {
            anyhow::bail!("TOKEN_SECRET must be at least 32 bytes");
        }
        if self.token_ttl_secs == 0 {
            anyhow::bail!("TOKEN_TTL_SECS must be greater than zero");
        }

        Ok(())
    }
}

fn ensure_directory(path: &Path) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            anyhow::bail!("{} exists but is not a directory", path.display());
        }
    } else {
        fs::create_dir_all(path)
            .with_context(|| format!("unable to create data directory {}", path.display()))?;
    }
    Ok(())
}
