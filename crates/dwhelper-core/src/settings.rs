use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::loader::KnowledgeSource;
use crate::{data_dir, write_atomic};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("could not write settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not encode settings: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Local knowledge base document, overriding the bundled one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_base_path: Option<PathBuf>,
    /// Remote knowledge base document, takes precedence over the path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_base_url: Option<String>,
    #[serde(default = "default_offline_cache")]
    pub offline_cache: bool,
}

fn default_offline_cache() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            knowledge_base_path: None,
            knowledge_base_url: None,
            offline_cache: default_offline_cache(),
        }
    }
}

impl Settings {
    /// Read settings from `path`. Missing or corrupt files give defaults.
    pub fn read_from(path: &Path) -> Settings {
        if !path.exists() {
            return Settings::default();
        }
        match fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
        {
            Some(settings) => settings,
            None => {
                warn!(path = %path.display(), "settings unreadable, using defaults");
                Settings::default()
            }
        }
    }

    pub fn write_to(&self, path: &Path) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        write_atomic(path, &json)?;
        Ok(())
    }

    /// Knowledge base location: configured URL, then configured path, then `bundled`.
    pub fn knowledge_source(&self, bundled: PathBuf) -> KnowledgeSource {
        if let Some(url) = self.knowledge_base_url.as_ref().filter(|u| !u.trim().is_empty()) {
            return KnowledgeSource::Remote(url.trim().to_string());
        }
        KnowledgeSource::File(self.knowledge_base_path.clone().unwrap_or(bundled))
    }
}

pub fn settings_path() -> PathBuf {
    data_dir().join("settings.json")
}

pub fn read_settings() -> Settings {
    Settings::read_from(&settings_path())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::read_from(&dir.path().join("settings.json"));
        assert_eq!(settings, Settings::default());
        assert!(settings.offline_cache);
    }

    #[test]
    fn corrupt_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "offlineCache = false").unwrap();
        assert_eq!(Settings::read_from(&path), Settings::default());
    }

    #[test]
    fn round_trips_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            knowledge_base_path: None,
            knowledge_base_url: Some("https://example.com/app_data.json".to_string()),
            offline_cache: false,
        };
        settings.write_to(&path).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"knowledgeBaseUrl\""));
        assert!(raw.contains("\"offlineCache\": false"));
        assert_eq!(Settings::read_from(&path), settings);
    }

    #[test]
    fn source_precedence() {
        let bundled = PathBuf::from("/opt/dw/app_data.json");
        let mut settings = Settings::default();
        assert_eq!(
            settings.knowledge_source(bundled.clone()),
            KnowledgeSource::File(bundled.clone())
        );

        settings.knowledge_base_path = Some(PathBuf::from("/srv/kb.json"));
        assert_eq!(
            settings.knowledge_source(bundled.clone()),
            KnowledgeSource::File(PathBuf::from("/srv/kb.json"))
        );

        settings.knowledge_base_url = Some("  ".to_string());
        assert!(matches!(settings.knowledge_source(bundled.clone()), KnowledgeSource::File(_)));

        settings.knowledge_base_url = Some("https://example.com/kb.json".to_string());
        assert_eq!(
            settings.knowledge_source(bundled),
            KnowledgeSource::Remote("https://example.com/kb.json".to_string())
        );
    }
}
