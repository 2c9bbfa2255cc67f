//! Configuration module
//!
//! Configuration is loaded once at process startup from environment variables
//! (with `.env` support via dotenvy) and never renegotiated at runtime.

use std::env;
use std::path::PathBuf;

use crate::validation::{UploadPolicy, DEFAULT_ALLOWED_CONTENT_TYPES, DEFAULT_MAX_UPLOAD_BYTES};

const DEFAULT_PORT: u16 = 4000;
const DEFAULT_UPLOADS_DIR: &str = "uploads";
const DEFAULT_UPLOADS_BASE_URL: &str = "/uploads";
const DEFAULT_HTTP_CONCURRENCY_LIMIT: usize = 10_000;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub uploads_dir: PathBuf,
    pub uploads_base_url: String,
    pub max_upload_bytes: u64,
    pub allowed_content_types: Vec<String>,
    pub cors_origins: Vec<String>,
    pub http_concurrency_limit: usize,
    pub environment: String,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins: Vec<String> = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let default_max_mb = DEFAULT_MAX_UPLOAD_BYTES / 1024 / 1024;
        let max_upload_size_mb = env::var("MAX_UPLOAD_SIZE_MB")
            .unwrap_or_else(|_| default_max_mb.to_string())
            .parse::<u64>()
            .map_err(|_| anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be a valid number"))?;

        let http_concurrency_limit = env::var("HTTP_CONCURRENCY_LIMIT")
            .unwrap_or_else(|_| DEFAULT_HTTP_CONCURRENCY_LIMIT.to_string())
            .parse::<usize>()
            .map_err(|_| anyhow::anyhow!("HTTP_CONCURRENCY_LIMIT must be a valid number"))?;

        let allowed_content_types: Vec<String> = match env::var("ALLOWED_CONTENT_TYPES") {
            Ok(raw) => raw
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            Err(_) => DEFAULT_ALLOWED_CONTENT_TYPES
                .iter()
                .map(|ct| ct.to_string())
                .collect(),
        };

        Ok(Config {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            uploads_dir: env::var("UPLOADS_DIR")
                .unwrap_or_else(|_| DEFAULT_UPLOADS_DIR.to_string())
                .into(),
            uploads_base_url: env::var("UPLOADS_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_UPLOADS_BASE_URL.to_string()),
            max_upload_bytes: max_upload_size_mb * 1024 * 1024,
            allowed_content_types,
            cors_origins,
            http_concurrency_limit,
            environment,
        })
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Validate configuration - called at startup to fail fast on misconfiguration.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.is_production() && self.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        if !self.uploads_base_url.starts_with('/')
            || self.uploads_base_url.trim_end_matches('/').is_empty()
        {
            return Err(anyhow::anyhow!(
                "UPLOADS_BASE_URL must be an absolute path like '/uploads'"
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be greater than 0"));
        }
        if self.allowed_content_types.is_empty() {
            return Err(anyhow::anyhow!("ALLOWED_CONTENT_TYPES cannot be empty"));
        }
        if self.http_concurrency_limit == 0 {
            return Err(anyhow::anyhow!(
                "HTTP_CONCURRENCY_LIMIT must be greater than 0"
            ));
        }
        Ok(())
    }

    /// Build the upload policy from the configured allow-list and ceiling.
    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy::new(self.max_upload_bytes, self.allowed_content_types.clone())
    }

    pub fn max_upload_mb(&self) -> u64 {
        self.max_upload_bytes / 1024 / 1024
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            server_port: 4000,
            uploads_dir: "uploads".into(),
            uploads_base_url: "/uploads".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_content_types: vec!["image/png".to_string()],
            cors_origins: vec!["*".to_string()],
            http_concurrency_limit: 10_000,
            environment: "development".to_string(),
        }
    }

    #[test]
    fn development_config_validates() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn production_refuses_wildcard_cors() {
        let mut config = base_config();
        config.environment = "production".to_string();
        assert!(config.validate().is_err());

        config.cors_origins = vec!["https://app.example.com".to_string()];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn base_url_must_be_absolute() {
        let mut config = base_config();
        config.uploads_base_url = "uploads".to_string();
        assert!(config.validate().is_err());

        config.uploads_base_url = "/".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_concurrency_limit_fails_validation() {
        let mut config = base_config();
        config.http_concurrency_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn from_env_rejects_garbage_numbers() {
        std::env::set_var("MAX_UPLOAD_SIZE_MB", "lots");
        assert!(Config::from_env().is_err());
        std::env::remove_var("MAX_UPLOAD_SIZE_MB");

        std::env::set_var("HTTP_CONCURRENCY_LIMIT", "many");
        assert!(Config::from_env().is_err());
        std::env::remove_var("HTTP_CONCURRENCY_LIMIT");
    }

    #[test]
    fn upload_policy_reflects_config() {
        let config = base_config();
        let policy = config.upload_policy();
        assert_eq!(policy.max_upload_bytes(), DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(policy.allowed_content_types(), ["image/png"]);
    }
}
