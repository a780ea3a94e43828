//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honored for local development.

use std::env;
use std::str::FromStr;

/// Which pair of identity provider and document store to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Firebase Auth plus Firestore (or their emulators)
    Firebase,
    /// In-process stores; nothing survives a restart
    Memory,
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firebase" => Ok(Backend::Firebase),
            "memory" => Ok(Backend::Memory),
            _ => Err(ConfigError::Invalid("EVENTBOARD_BACKEND", s.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Firebase / GCP project ID
    pub firebase_project_id: String,
    /// Web API key for the Identity Toolkit REST API
    pub firebase_api_key: String,
    /// Frontend URL, allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    pub backend: Backend,
    /// `host:port` of the Firebase Auth emulator, if in use
    pub auth_emulator_host: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let backend = match env::var("EVENTBOARD_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => Backend::Firebase,
        };

        let auth_emulator_host = env::var("FIREBASE_AUTH_EMULATOR_HOST")
            .ok()
            .filter(|h| !h.is_empty());

        let firebase_api_key = match (backend, env::var("FIREBASE_API_KEY")) {
            (_, Ok(key)) => key.trim().to_string(),
            // The emulator accepts any key
            (Backend::Firebase, Err(_)) if auth_emulator_host.is_some() => "emulator".to_string(),
            (Backend::Firebase, Err(_)) => return Err(ConfigError::Missing("FIREBASE_API_KEY")),
            (Backend::Memory, Err(_)) => String::new(),
        };

        Ok(Self {
            firebase_project_id: env::var("FIREBASE_PROJECT_ID")
                .unwrap_or_else(|_| "local-dev".to_string()),
            firebase_api_key,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            backend,
            auth_emulator_host,
        })
    }

    /// Config for tests: in-memory backends, localhost frontend.
    pub fn test_default() -> Self {
        Self {
            firebase_project_id: "test-project".to_string(),
            firebase_api_key: "test-api-key".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            backend: Backend::Memory,
            auth_emulator_host: None,
        }
    }

    /// Whether cookies may omit `Secure` (plain-HTTP local development).
    pub fn is_local(&self) -> bool {
        self.frontend_url.starts_with("http://localhost")
            || self.frontend_url.starts_with("http://127.0.0.1")
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parse() {
        assert_eq!("memory".parse::<Backend>().unwrap(), Backend::Memory);
        assert_eq!(" Firebase ".parse::<Backend>().unwrap(), Backend::Firebase);
        assert!(matches!(
            "postgres".parse::<Backend>(),
            Err(ConfigError::Invalid("EVENTBOARD_BACKEND", _))
        ));
    }

    #[test]
    fn test_is_local() {
        let mut config = Config::test_default();
        assert!(config.is_local());

        config.frontend_url = "https://events.example.com".to_string();
        assert!(!config.is_local());
    }
}
