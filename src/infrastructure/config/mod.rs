use serde::Deserialize;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub log_format: LogFormat,
    // Audio cache
    pub cache_database_url: String,
    pub cache_max_entries: usize,
    pub cache_quota_bytes: usize,
    pub max_text_chars: usize,
    pub session_timeout_secs: u64,
    // Synthesis
    pub synthesis_provider: SynthesisProvider,
    pub synthesis_timeout_secs: u64,
    pub watson_base_url: Option<String>,
    pub watson_api_key: Option<String>,
    pub watson_voice: Option<String>,
    pub aws_region: String,
    pub polly_voice: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_voice: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisProvider {
    Watson,
    Polly,
    OpenAi,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// `CACHE_DATABASE_URL` value selecting the in-memory backend
pub const MEMORY_DATABASE_URL: &str = "memory";

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let synthesis_provider = match var_or("SYNTHESIS_PROVIDER", "watson").to_lowercase().as_str() {
            "watson" => SynthesisProvider::Watson,
            "polly" => SynthesisProvider::Polly,
            "openai" => SynthesisProvider::OpenAi,
            other => {
                return Err(ConfigError::Invalid {
                    name: "SYNTHESIS_PROVIDER",
                    value: other.to_string(),
                })
            }
        };

        let config = Config {
            host: var_or("HOST", "127.0.0.1"),
            port: parse_var("PORT", 8080)?,
            environment: match var_or("ENVIRONMENT", "development").as_str() {
                "production" => Environment::Production,
                _ => Environment::Development,
            },
            log_format: match var_or("LOG_FORMAT", "pretty").as_str() {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            cache_database_url: var_or("CACHE_DATABASE_URL", "sqlite://talkback.db"),
            cache_max_entries: parse_var("CACHE_MAX_ENTRIES", 15)?,
            cache_quota_bytes: parse_var("CACHE_QUOTA_BYTES", 5 * 1024 * 1024)?,
            max_text_chars: parse_var("MAX_TEXT_CHARS", 50)?,
            session_timeout_secs: parse_var("SESSION_TIMEOUT_SECS", 300)?,
            synthesis_provider,
            synthesis_timeout_secs: parse_var("SYNTHESIS_TIMEOUT_SECS", 30)?,
            watson_base_url: optional_var("WATSON_BASE_URL"),
            watson_api_key: optional_var("WATSON_API_KEY"),
            watson_voice: optional_var("WATSON_VOICE"),
            aws_region: var_or("AWS_REGION", "eu-west-1"),
            polly_voice: var_or("POLLY_VOICE", "Joanna"),
            openai_api_key: optional_var("OPENAI_API_KEY"),
            openai_model: var_or("OPENAI_MODEL", "tts-1"),
            openai_voice: var_or("OPENAI_VOICE", "alloy"),
        };

        config.validate()?;
        Ok(config)
    }

    /// Provider credentials are only required for the selected provider
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.synthesis_provider {
            SynthesisProvider::Watson => {
                if self.watson_base_url.is_none() {
                    return Err(ConfigError::Missing("WATSON_BASE_URL"));
                }
                if self.watson_api_key.is_none() {
                    return Err(ConfigError::Missing("WATSON_API_KEY"));
                }
            }
            SynthesisProvider::OpenAi => {
                if self.openai_api_key.is_none() {
                    return Err(ConfigError::Missing("OPENAI_API_KEY"));
                }
            }
            SynthesisProvider::Polly => {}
        }

        if self.cache_max_entries == 0 {
            return Err(ConfigError::Invalid {
                name: "CACHE_MAX_ENTRIES",
                value: "0".to_string(),
            });
        }

        Ok(())
    }

    pub fn uses_memory_storage(&self) -> bool {
        self.cache_database_url == MEMORY_DATABASE_URL
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}
