use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use super::paths::AppPaths;
use super::validation::validate_settings;
use super::ConfigError;
use crate::rag::embedding::HASHING_MODEL_ID;

const REDACT_PLACEHOLDER: &str = "****";

pub const DEFAULT_PORT: u16 = 8003;
pub const DEFAULT_COMPLETION_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_HASHING_DIMENSIONS: usize = 384;
pub const DEFAULT_REMOTE_DIMENSIONS: usize = 1536;

/// Runtime configuration, read once at startup.
///
/// Sources in increasing precedence: built-in defaults, the YAML config file
/// (`RAG_CONFIG_PATH` or `<data_dir>/config.yml`), then environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub rag: RagSettings,
    pub llm: LlmSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            request_timeout_secs: 60,
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    pub persist_dir: Option<PathBuf>,
    pub embedding_model: String,
    pub embedding_dimensions: Option<usize>,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            persist_dir: None,
            embedding_model: HASHING_MODEL_ID.to_string(),
            embedding_dimensions: None,
        }
    }
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub completion_model: String,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            completion_model: DEFAULT_COMPLETION_MODEL.to_string(),
            temperature: None,
            max_tokens: None,
        }
    }
}

impl LlmSettings {
    /// The configured credential, trimmed; `None` when unset or blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

impl fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| REDACT_PLACEHOLDER))
            .field("base_url", &self.base_url)
            .field("completion_model", &self.completion_model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Settings {
    pub fn load(paths: &AppPaths) -> Result<Self, ConfigError> {
        Self::load_with(paths, |key| env::var(key).ok())
    }

    /// Same as [`Settings::load`] with an injectable variable lookup.
    pub fn load_with<F>(paths: &AppPaths, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config_path = lookup("RAG_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| paths.default_config_path.clone());

        let mut settings = load_yaml_file(&config_path)?;
        settings.apply_env(&lookup)?;
        validate_settings(&settings)?;
        Ok(settings)
    }

    fn apply_env<F>(&mut self, lookup: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(host) = non_empty("RAG_BIND_HOST") {
            self.server.host = host;
        }
        if let Some(port) = non_empty("PORT") {
            self.server.port = parse_env("PORT", &port)?;
        }
        if let Some(timeout) = non_empty("RAG_REQUEST_TIMEOUT_SECS") {
            self.server.request_timeout_secs = parse_env("RAG_REQUEST_TIMEOUT_SECS", &timeout)?;
        }
        if let Some(dir) = non_empty("RAG_PERSIST_DIR") {
            self.rag.persist_dir = Some(PathBuf::from(dir));
        }
        if let Some(model) = non_empty("RAG_EMBEDDING_MODEL") {
            self.rag.embedding_model = model;
        }
        if let Some(dims) = non_empty("RAG_EMBEDDING_DIMENSIONS") {
            self.rag.embedding_dimensions = Some(parse_env("RAG_EMBEDDING_DIMENSIONS", &dims)?);
        }
        if let Some(key) = non_empty("OPENAI_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(url) = non_empty("OPENAI_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(model) = non_empty("RAG_COMPLETION_MODEL") {
            self.llm.completion_model = model;
        }

        Ok(())
    }

    pub fn persist_dir(&self, paths: &AppPaths) -> PathBuf {
        self.rag
            .persist_dir
            .clone()
            .unwrap_or_else(|| paths.default_persist_dir.clone())
    }

    pub fn embedding_dimensions(&self) -> usize {
        self.rag.embedding_dimensions.unwrap_or(
            if self.rag.embedding_model == HASHING_MODEL_ID {
                DEFAULT_HASHING_DIMENSIONS
            } else {
                DEFAULT_REMOTE_DIMENSIONS
            },
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

}

fn load_yaml_file(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        return Ok(Settings::default());
    }

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    if contents.trim().is_empty() {
        return Ok(Settings::default());
    }

    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

fn parse_env<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim().parse::<T>().map_err(|err| ConfigError::Env {
        key: key.to_string(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_file_or_env() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AppPaths::from_data_dir(tmp.path());

        let settings = Settings::load_with(&paths, lookup_from(&[])).unwrap();

        assert_eq!(settings.server.port, DEFAULT_PORT);
        assert_eq!(settings.rag.embedding_model, HASHING_MODEL_ID);
        assert_eq!(settings.embedding_dimensions(), DEFAULT_HASHING_DIMENSIONS);
        assert_eq!(settings.llm.completion_model, DEFAULT_COMPLETION_MODEL);
        assert_eq!(settings.persist_dir(&paths), paths.default_persist_dir);
        assert!(settings.llm.api_key().is_none());
    }

    #[test]
    fn env_overrides_yaml_file() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AppPaths::from_data_dir(tmp.path());
        fs::write(
            &paths.default_config_path,
            "server:\n  port: 9000\nrag:\n  embedding_model: text-embedding-3-small\n",
        )
        .unwrap();

        let settings = Settings::load_with(
            &paths,
            lookup_from(&[
                ("PORT", "9100"),
                ("OPENAI_API_KEY", "sk-test"),
                ("RAG_PERSIST_DIR", "/tmp/rag-store"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.rag.embedding_model, "text-embedding-3-small");
        assert_eq!(settings.embedding_dimensions(), DEFAULT_REMOTE_DIMENSIONS);
        assert_eq!(settings.llm.api_key(), Some("sk-test"));
        assert_eq!(settings.persist_dir(&paths), PathBuf::from("/tmp/rag-store"));
    }

    #[test]
    fn malformed_env_number_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AppPaths::from_data_dir(tmp.path());

        let err = Settings::load_with(&paths, lookup_from(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { ref key, .. } if key == "PORT"));
    }

    #[test]
    fn blank_api_key_counts_as_unset() {
        let mut llm = LlmSettings {
            api_key: Some("   ".to_string()),
            ..LlmSettings::default()
        };
        assert!(llm.api_key().is_none());

        llm.api_key = Some("  sk-padded \n".to_string());
        assert_eq!(llm.api_key(), Some("sk-padded"));
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let settings = LlmSettings {
            api_key: Some("sk-very-secret".to_string()),
            ..LlmSettings::default()
        };

        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("sk-very-secret"));
        assert!(rendered.contains(REDACT_PLACEHOLDER));
    }
}
