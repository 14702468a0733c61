use kidplan_core::llm_client::Provider;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub catalog_path: PathBuf,
    pub history_path: Option<PathBuf>,
    pub provider: Provider,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub chat_model: String,
    pub llm_timeout: Duration,
    pub log_level: Level,
    pub prompts_path: PathBuf,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let catalog_path = std::env::var("CATALOG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/topics.json"));
        let history_path = std::env::var("HISTORY_PATH").ok().map(PathBuf::from);

        let provider_str = std::env::var("LLM_PROVIDER").unwrap_or_else(|_| "openai".to_string());
        let provider = Provider::parse(&provider_str);

        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        let gemini_api_key = std::env::var("GEMINI_API_KEY").ok();

        let chat_model = std::env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());

        let timeout_str = std::env::var("LLM_TIMEOUT_SECS").unwrap_or_else(|_| "20".to_string());
        let llm_timeout = timeout_str
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "LLM_TIMEOUT_SECS".to_string(),
                    format!("'{}' is not a positive number of seconds", timeout_str),
                )
            })?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let prompts_path = std::env::var("PROMPTS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./prompts"));

        match provider {
            Provider::OpenAI => {
                if openai_api_key.is_none() {
                    return Err(ConfigError::MissingVar(
                        "OPENAI_API_KEY must be set for 'openai' provider".to_string(),
                    ));
                }
            }
            Provider::Gemini => {
                if gemini_api_key.is_none() {
                    return Err(ConfigError::MissingVar(
                        "GEMINI_API_KEY must be set for 'gemini' provider".to_string(),
                    ));
                }
            }
            Provider::Disabled => {}
        }

        Ok(Self {
            bind_address,
            catalog_path,
            history_path,
            provider,
            openai_api_key,
            gemini_api_key,
            chat_model,
            llm_timeout,
            log_level,
            prompts_path,
        })
    }

    /// The API key belonging to the configured provider.
    pub fn api_key(&self) -> Option<&str> {
        match self.provider {
            Provider::OpenAI => self.openai_api_key.as_deref(),
            Provider::Gemini => self.gemini_api_key.as_deref(),
            Provider::Disabled => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clear_env_vars() {
        unsafe {
            env::remove_var("BIND_ADDRESS");
            env::remove_var("CATALOG_PATH");
            env::remove_var("HISTORY_PATH");
            env::remove_var("LLM_PROVIDER");
            env::remove_var("OPENAI_API_KEY");
            env::remove_var("GEMINI_API_KEY");
            env::remove_var("CHAT_MODEL");
            env::remove_var("LLM_TIMEOUT_SECS");
            env::remove_var("RUST_LOG");
            env::remove_var("PROMPTS_PATH");
        }
    }

    #[test]
    fn test_config_error_display() {
        let missing_var = ConfigError::MissingVar("TEST_VAR".to_string());
        assert_eq!(
            format!("{}", missing_var),
            "Missing environment variable: TEST_VAR"
        );

        let invalid_value =
            ConfigError::InvalidValue("TEST_VAR".to_string(), "bad_value".to_string());
        assert_eq!(
            format!("{}", invalid_value),
            "Invalid value for environment variable TEST_VAR: bad_value"
        );
    }

    #[test]
    #[serial]
    fn test_config_from_env_minimal_openai() {
        clear_env_vars();
        unsafe {
            env::set_var("OPENAI_API_KEY", "test-openai-key");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "0.0.0.0:3000");
        assert_eq!(config.catalog_path, PathBuf::from("./data/topics.json"));
        assert_eq!(config.history_path, None);
        assert_eq!(config.provider, Provider::OpenAI);
        assert_eq!(config.api_key(), Some("test-openai-key"));
        assert_eq!(config.chat_model, "gpt-4o");
        assert_eq!(config.llm_timeout, Duration::from_secs(20));
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.prompts_path, PathBuf::from("./prompts"));
    }

    #[test]
    #[serial]
    fn test_config_disabled_provider_needs_no_key() {
        clear_env_vars();
        unsafe {
            env::set_var("LLM_PROVIDER", "disabled");
        }

        let config = Config::from_env().expect("Config should load successfully");
        assert_eq!(config.provider, Provider::Disabled);
        assert_eq!(config.api_key(), None);
    }

    #[test]
    #[serial]
    fn test_config_from_env_custom_values() {
        clear_env_vars();
        unsafe {
            env::set_var("BIND_ADDRESS", "127.0.0.1:8080");
            env::set_var("CATALOG_PATH", "/srv/catalog.json");
            env::set_var("HISTORY_PATH", "/srv/history.json");
            env::set_var("LLM_PROVIDER", "gemini");
            env::set_var("GEMINI_API_KEY", "custom-gemini-key");
            env::set_var("CHAT_MODEL", "gemini-2.0-flash");
            env::set_var("LLM_TIMEOUT_SECS", "5");
            env::set_var("RUST_LOG", "debug");
            env::set_var("PROMPTS_PATH", "/custom/prompts");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "127.0.0.1:8080");
        assert_eq!(config.catalog_path, PathBuf::from("/srv/catalog.json"));
        assert_eq!(config.history_path, Some(PathBuf::from("/srv/history.json")));
        assert_eq!(config.provider, Provider::Gemini);
        assert_eq!(config.api_key(), Some("custom-gemini-key"));
        assert_eq!(config.chat_model, "gemini-2.0-flash");
        assert_eq!(config.llm_timeout, Duration::from_secs(5));
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.prompts_path, PathBuf::from("/custom/prompts"));
    }

    #[test]
    #[serial]
    fn test_config_invalid_bind_address() {
        clear_env_vars();
        unsafe {
            env::set_var("BIND_ADDRESS", "not-a-valid-address");
            env::set_var("OPENAI_API_KEY", "test-openai-key");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "BIND_ADDRESS"),
            _ => panic!("Expected InvalidValue for BIND_ADDRESS"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_timeout() {
        clear_env_vars();
        unsafe {
            env::set_var("LLM_PROVIDER", "disabled");
            env::set_var("LLM_TIMEOUT_SECS", "0");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "LLM_TIMEOUT_SECS"),
            _ => panic!("Expected InvalidValue for LLM_TIMEOUT_SECS"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_log_level() {
        clear_env_vars();
        unsafe {
            env::set_var("OPENAI_API_KEY", "test-openai-key");
            env::set_var("RUST_LOG", "not-a-level");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "RUST_LOG"),
            _ => panic!("Expected InvalidValue for RUST_LOG"),
        }
    }

    #[test]
    #[serial]
    fn test_config_missing_provider_keys() {
        clear_env_vars();
        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::MissingVar(msg) => assert!(msg.contains("OPENAI_API_KEY")),
            _ => panic!("Expected MissingVar for OPENAI_API_KEY"),
        }

        unsafe {
            env::set_var("LLM_PROVIDER", "gemini");
        }
        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::MissingVar(msg) => assert!(msg.contains("GEMINI_API_KEY")),
            _ => panic!("Expected MissingVar for GEMINI_API_KEY"),
        }
    }
}
