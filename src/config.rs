// config.rs - Paths used by the control center

use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::fs;

pub const APP_DIR_NAME: &str = "tears-of-mandrake";
pub const AUTOMATIC_CONF: &str = "/etc/dnf/automatic.conf";
pub const OPENMANDRIVA_RELEASE: &str = "/etc/openmandriva-release";
pub const YUM_REPOS_DIR: &str = "/etc/yum.repos.d";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub config_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl AppConfig {
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir().context("Could not determine the home directory")?;
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| home.join(".config"))
            .join(APP_DIR_NAME);
        let documents_dir = dirs::document_dir().unwrap_or_else(|| home.join("Documents"));

        Ok(Self {
            logs_dir: documents_dir.join("system_logs"),
            config_dir,
        })
    }

    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }

    pub async fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.config_dir).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_live_under_the_app_and_documents_dirs() {
        let config = AppConfig::new().unwrap();
        assert!(config.config_dir.ends_with(APP_DIR_NAME));
        assert_eq!(config.settings_path(), config.config_dir.join("settings.json"));
        assert!(config.logs_dir.ends_with("system_logs"));
    }
}
