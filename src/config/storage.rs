use std::fs;
use std::path::{Path, PathBuf};

use crate::config::settings::AppConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config directory not found")]
    DirNotFound,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// 获取配置文件路径
fn get_config_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir().ok_or(ConfigError::DirNotFound)?;
    let app_dir = config_dir.join("com.vocalink.app");
    fs::create_dir_all(&app_dir)?;
    Ok(app_dir.join("config.json"))
}

/// 加载配置
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let path = get_config_path()?;
    load_from(&path)
}

/// 保存配置
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    let path = get_config_path()?;
    save_to(&path, config)
}

fn load_from(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;

    Ok(config)
}

fn save_to(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    tracing::info!("Saving config to: {:?}", path);
    let content = serde_json::to_string_pretty(config)?;
    fs::write(path, &content)?;
    tracing::info!("Config saved successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = load_from(&path).unwrap();
        assert_eq!(config.speech.provider, "Mock");
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = AppConfig::default();
        config.speech.source_language = "fr-FR".to_string();
        config.token.region = Some("westeurope".to_string());
        save_to(&path, &config).unwrap();

        let loaded = load_from(&path).unwrap();
        assert_eq!(loaded.speech.source_language, "fr-FR");
        assert_eq!(loaded.token.region.as_deref(), Some("westeurope"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(load_from(&path), Err(ConfigError::Json(_))));
    }
}
