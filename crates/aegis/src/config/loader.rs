use std::path::Path;

use crate::config::schema::{Config, CONFIG_VERSION};
use crate::error::ConfigError;
use crate::logging;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != CONFIG_VERSION {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if let Some(path) = &config.database.path {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Validation {
                message: "database.path must not be empty".to_string(),
            });
        }
    }

    logging::build_filter(&config.logging.level)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LogFormat;

    #[test]
    fn test_load_minimal_config() {
        let config = load_config_from_str(r#"{ "version": "1.0" }"#).unwrap();
        assert!(config.database.path.is_none());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.database.resolved_path().is_some());
    }

    #[test]
    fn test_load_full_config() {
        let config_json = r#"
        {
            "version": "1.0",
            "database": { "path": "/var/lib/aegis/aegis.db" },
            "logging": { "level": "aegis=debug,warn", "format": "json" }
        }
        "#;

        let config = load_config_from_str(config_json).unwrap();
        assert_eq!(
            config.database.resolved_path().unwrap(),
            std::path::PathBuf::from("/var/lib/aegis/aegis.db")
        );
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_version() {
        let result = load_config_from_str(r#"{ "version": "2.0" }"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_invalid_json() {
        let result = load_config_from_str("{ version: 1.0 ");
        assert!(matches!(result, Err(ConfigError::ParseJson(_))));
    }

    #[test]
    fn test_unknown_log_format() {
        let result =
            load_config_from_str(r#"{ "version": "1.0", "logging": { "format": "xml" } }"#);
        assert!(matches!(result, Err(ConfigError::ParseJson(_))));
    }

    #[test]
    fn test_invalid_log_filter() {
        let result =
            load_config_from_str(r#"{ "version": "1.0", "logging": { "level": "aegis=loud" } }"#);
        assert!(matches!(result, Err(ConfigError::Logging(_))));
    }

    #[test]
    fn test_empty_database_path() {
        let result =
            load_config_from_str(r#"{ "version": "1.0", "database": { "path": "" } }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("data").join("aegis.db");
        let config_path = dir.path().join("aegis.json");
        std::fs::write(
            &config_path,
            format!(
                r#"{{ "version": "1.0", "database": {{ "path": {} }} }}"#,
                serde_json::to_string(&db_path).unwrap()
            ),
        )
        .unwrap();

        let config = load_config(&config_path).unwrap();
        config.open_database().unwrap();
        assert!(db_path.exists());
    }

    #[test]
    fn test_missing_file() {
        let result = load_config("/no/such/aegis.json");
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }
}
