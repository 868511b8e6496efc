use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use crate::models::upload::{DEFAULT_MAX_FILE_BYTES, DEFAULT_MAX_FILES, UploadLimits};
use crate::storage::{HttpObjectStore, LocalStore, ObjectStore};

pub const APP_NAME: &str = "AI Readiness Survey";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Local { root: PathBuf },
    Http {
        endpoint: String,
        bucket: String,
        token: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: String,
    pub storage: StorageConfig,
    pub questions_dir: Option<PathBuf>,
    pub limits: UploadLimits,
    pub allowed_origin: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub variable: &'static str,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.variable, self.message)
    }
}

impl std::error::Error for ConfigError {}

fn parse_number<T: FromStr>(
    variable: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(default),
        Some(s) => s.parse().map_err(|_| ConfigError {
            variable,
            message: format!("expected a number, got '{s}'"),
        }),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let storage = match get("SURVEY_STORAGE").as_deref().map(str::trim).unwrap_or("local") {
            "local" => StorageConfig::Local {
                root: get("SURVEY_STORAGE_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("data/bucket")),
            },
            "http" => StorageConfig::Http {
                endpoint: get("SURVEY_STORAGE_ENDPOINT").ok_or_else(|| ConfigError {
                    variable: "SURVEY_STORAGE_ENDPOINT",
                    message: "required when SURVEY_STORAGE=http".to_string(),
                })?,
                bucket: get("SURVEY_BUCKET").unwrap_or_else(|| "survey-data".to_string()),
                token: get("SURVEY_STORAGE_TOKEN"),
            },
            other => {
                return Err(ConfigError {
                    variable: "SURVEY_STORAGE",
                    message: format!("expected 'local' or 'http', got '{other}'"),
                });
            }
        };

        let limits = UploadLimits {
            max_file_bytes: parse_number(
                "SURVEY_MAX_FILE_BYTES",
                get("SURVEY_MAX_FILE_BYTES"),
                DEFAULT_MAX_FILE_BYTES,
            )?,
            max_files: parse_number("SURVEY_MAX_FILES", get("SURVEY_MAX_FILES"), DEFAULT_MAX_FILES)?,
        };

        Ok(AppConfig {
            bind_addr: get("SURVEY_BIND_ADDR").unwrap_or_else(|| "127.0.0.1:8080".to_string()),
            storage,
            questions_dir: get("SURVEY_QUESTIONS_DIR").map(PathBuf::from),
            limits,
            allowed_origin: get("SURVEY_ALLOWED_ORIGIN").unwrap_or_else(|| "*".to_string()),
        })
    }

    /// Largest JSON body a save request may need: every file at the limit,
    /// base64-inflated, plus room for the answers.
    pub fn json_body_limit(&self) -> usize {
        let files = self.limits.max_file_bytes.saturating_mul(self.limits.max_files as u64);
        let encoded = files / 3 * 4 + 4 * self.limits.max_files as u64;
        usize::try_from(encoded).unwrap_or(usize::MAX).saturating_add(1024 * 1024)
    }

    pub fn build_store(&self) -> Arc<dyn ObjectStore> {
        match &self.storage {
            StorageConfig::Local { root } => Arc::new(LocalStore::new(root.clone())),
            StorageConfig::Http { endpoint, bucket, token } => Arc::new(
                HttpObjectStore::new(endpoint.clone(), bucket.clone()).with_bearer_token(token.clone()),
            ),
        }
    }
}
