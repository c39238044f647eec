//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use crate::config::schema::{Environment, Settings};
use crate::config::validation::{validate_config, ValidationError};

/// Connection string for the document database.
pub const ENV_DATABASE_URI: &str = "MONGO_DB";
/// Session-signing secret.
pub const ENV_SESSION_SECRET: &str = "SESSION_SECRET";
/// Deployment mode (`production` or anything else).
pub const ENV_ENVIRONMENT: &str = "APP_ENV";
/// Listener bind address.
pub const ENV_BIND_ADDRESS: &str = "BIND_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Validation(_) => None,
        }
    }
}

/// Load a TOML file, apply environment overrides, then validate.
pub fn load_config(path: &Path) -> Result<Settings, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content, |key| std::env::var(key).ok())
}

/// Defaults plus environment overrides, for deployments without a config file.
pub fn load_from_env() -> Result<Settings, ConfigError> {
    parse_config("", |key| std::env::var(key).ok())
}

/// Parse `content` and apply overrides resolved through `lookup`.
pub fn parse_config<F>(content: &str, lookup: F) -> Result<Settings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut settings: Settings = toml::from_str(content).map_err(ConfigError::Parse)?;
    apply_env_overrides(&mut settings, lookup);

    validate_config(&settings).map_err(ConfigError::Validation)?;

    Ok(settings)
}

/// Overlay environment values on top of file values. Empty values are ignored.
pub fn apply_env_overrides<F>(settings: &mut Settings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).filter(|value| !value.is_empty());

    if let Some(uri) = var(ENV_DATABASE_URI) {
        settings.database.uri = Some(uri);
    }
    if let Some(secret) = var(ENV_SESSION_SECRET) {
        settings.session.secret = secret;
    }
    if let Some(mode) = var(ENV_ENVIRONMENT) {
        settings.environment = Environment::from_name(&mode);
    }
    if let Some(address) = var(ENV_BIND_ADDRESS) {
        settings.listener.bind_address = address;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_environment_overrides_file() {
        let content = r#"
            environment = "development"

            [database]
            uri = "mongodb://file-host:27017"

            [listener]
            bind_address = "127.0.0.1:4000"
        "#;
        let settings = parse_config(
            content,
            env(&[
                ("MONGO_DB", "mongodb://env-host:27017"),
                ("SESSION_SECRET", "from-env"),
                ("APP_ENV", "production"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.database.uri.as_deref(), Some("mongodb://env-host:27017"));
        assert_eq!(settings.session.secret, "from-env");
        assert!(settings.environment.is_production());
        assert_eq!(settings.listener.bind_address, "127.0.0.1:4000");
    }

    #[test]
    fn test_empty_values_are_ignored() {
        let settings = parse_config("", env(&[("MONGO_DB", ""), ("SESSION_SECRET", "")])).unwrap();
        assert!(settings.database.uri.is_none());
        assert!(settings.session.uses_default_secret());
    }

    #[test]
    fn test_parse_error() {
        let result = parse_config("[database\nuri = 1", env(&[]));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validation_runs_after_overrides() {
        let result = parse_config("", env(&[("BIND_ADDRESS", "localhost")]));
        match result {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 1),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file() {
        let result = load_config(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
