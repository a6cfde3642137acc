use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::warn;

use crate::error::Result;
use crate::models::Theme;

pub const DEFAULT_NEWS_URL: &str =
    "https://raw.githubusercontent.com/Tears-of-Mandrake/web/main/README.md";

pub const DEFAULT_UPTIME_URLS: &[&str] = &[
    "https://abf.openmandriva.org",
    "https://openmandriva.org",
    "https://forum.openmandriva.org",
    "https://abf-downloads.openmandriva.org",
    "https://github.com/OpenMandrivaAssociation",
];

pub const DEFAULT_PING_HOSTS: &[&str] = &["www.google.com", "www.wikipedia.com", "www.internet.gov.pl"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub theme: Theme,
    pub hide_console: bool,
    pub sidebar_collapsed: bool,
    pub confirm_privileged: bool,
    pub news_url: String,
    pub uptime_urls: Vec<String>,
    pub ping_hosts: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::System,
            hide_console: true,
            sidebar_collapsed: false,
            confirm_privileged: true,
            news_url: DEFAULT_NEWS_URL.to_string(),
            uptime_urls: DEFAULT_UPTIME_URLS.iter().map(|s| s.to_string()).collect(),
            ping_hosts: DEFAULT_PING_HOSTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Settings {
    pub async fn load(path: &Path) -> Self {
        match fs::read_to_string(path).await {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "ignoring unreadable settings");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_then_load_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings {
            theme: Theme::Dark,
            hide_console: false,
            ping_hosts: vec!["example.org".into()],
            ..Settings::default()
        };
        settings.save(&path).await.unwrap();
        assert_eq!(Settings::load(&path).await, settings);
    }

    #[tokio::test]
    async fn corrupt_or_partial_files_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load(&path).await, Settings::default());

        std::fs::write(&path, r#"{ "theme": "Light" }"#).unwrap();
        let loaded = Settings::load(&path).await;
        assert_eq!(loaded.theme, Theme::Light);
        assert_eq!(loaded.news_url, DEFAULT_NEWS_URL);
        assert!(loaded.confirm_privileged);
    }

    #[tokio::test]
    async fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Settings::load(&dir.path().join("absent.json")).await;
        assert_eq!(loaded, Settings::default());
    }
}
