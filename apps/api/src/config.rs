use anyhow::{Context, Result};

use crate::inference::DEFAULT_INFERENCE_URL;

const DEFAULT_MODEL: &str = "google/flan-t5-large";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub s3_endpoint: String,
    pub s3_bucket: String,
    pub s3_public_url: String,
    pub s3_region: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub hf_api_key: String,
    pub hf_inference_url: String,
    pub extract_model: String,
    pub qa_model: String,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("Required environment variable '{key}' is not set"))
        };
        let optional = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let s3_endpoint = require("S3_ENDPOINT")?;

        Ok(Config {
            database_url: require("DATABASE_URL")?,
            s3_bucket: optional("S3_BUCKET", "resumes"),
            s3_public_url: optional("S3_PUBLIC_URL", &s3_endpoint),
            s3_region: optional("S3_REGION", "us-east-1"),
            s3_endpoint,
            aws_access_key_id: require("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require("AWS_SECRET_ACCESS_KEY")?,
            hf_api_key: require("HF_API_KEY")?,
            hf_inference_url: optional("HF_INFERENCE_URL", DEFAULT_INFERENCE_URL),
            extract_model: optional("HF_EXTRACT_MODEL", DEFAULT_MODEL),
            qa_model: optional("HF_QA_MODEL", DEFAULT_MODEL),
            max_upload_bytes: optional("MAX_UPLOAD_BYTES", &DEFAULT_MAX_UPLOAD_BYTES.to_string())
                .parse::<usize>()
                .context("MAX_UPLOAD_BYTES must be a byte count")?,
            port: optional("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional("RUST_LOG", "info"),
        })
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/vitae_test".to_string(),
        s3_endpoint: "http://localhost:9000".to_string(),
        s3_bucket: "resumes".to_string(),
        s3_public_url: "http://localhost:9000".to_string(),
        s3_region: "us-east-1".to_string(),
        aws_access_key_id: "minio".to_string(),
        aws_secret_access_key: "minio123".to_string(),
        hf_api_key: "hf_test".to_string(),
        hf_inference_url: DEFAULT_INFERENCE_URL.to_string(),
        extract_model: "extract-model".to_string(),
        qa_model: "qa-model".to_string(),
        max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        port: 8080,
        rust_log: "debug".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn required() -> HashMap<String, String> {
        env(&[
            ("DATABASE_URL", "postgres://localhost/vitae"),
            ("S3_ENDPOINT", "http://minio:9000"),
            ("AWS_ACCESS_KEY_ID", "key"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
            ("HF_API_KEY", "hf_abc"),
        ])
    }

    #[test]
    fn test_defaults_applied() {
        let vars = required();
        let config = Config::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.s3_bucket, "resumes");
        assert_eq!(config.s3_public_url, "http://minio:9000");
        assert_eq!(config.extract_model, "google/flan-t5-large");
        assert_eq!(config.qa_model, "google/flan-t5-large");
        assert_eq!(config.hf_inference_url, DEFAULT_INFERENCE_URL);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_overrides_applied() {
        let mut vars = required();
        vars.insert("HF_QA_MODEL".to_string(), "mistralai/Mistral-7B-Instruct".to_string());
        vars.insert("S3_PUBLIC_URL".to_string(), "https://cdn.example.com".to_string());
        vars.insert("PORT".to_string(), "3000".to_string());
        let config = Config::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.qa_model, "mistralai/Mistral-7B-Instruct");
        assert_eq!(config.s3_public_url, "https://cdn.example.com");
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_missing_required_variable_is_named() {
        for key in [
            "DATABASE_URL",
            "S3_ENDPOINT",
            "AWS_ACCESS_KEY_ID",
            "AWS_SECRET_ACCESS_KEY",
            "HF_API_KEY",
        ] {
            let mut vars = required();
            vars.remove(key);
            let err = Config::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
            assert!(err.to_string().contains(key), "error should name {key}: {err}");
        }
    }

    #[test]
    fn test_blank_required_variable_is_rejected() {
        let mut vars = required();
        vars.insert("HF_API_KEY".to_string(), "  ".to_string());
        assert!(Config::from_lookup(|k| vars.get(k).cloned()).is_err());
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let mut vars = required();
        vars.insert("PORT".to_string(), "http".to_string());
        assert!(Config::from_lookup(|k| vars.get(k).cloned()).is_err());
    }
}
