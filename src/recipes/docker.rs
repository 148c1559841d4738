use crate::error::Result;
use crate::recipes::required_url;
use crate::traits::Recipe;
use crate::types::SourceInfo;
use crate::utils;
use async_trait::async_trait;
use directories::BaseDirs;
use serde_json::Value;
use std::path::PathBuf;
use tokio::fs;

#[derive(Debug)]
pub struct DockerRecipe {
    custom_path: Option<PathBuf>,
}

impl DockerRecipe {
    pub fn new() -> Self {
        Self { custom_path: None }
    }

    #[cfg(test)]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            custom_path: Some(path),
        }
    }
}

#[async_trait]
impl Recipe for DockerRecipe {
    fn name(&self) -> &'static str {
        "docker"
    }

    fn requires_sudo(&self) -> bool {
        true
    }

    fn config_path(&self) -> PathBuf {
        if let Some(ref path) = self.custom_path {
            return path.clone();
        }

        if cfg!(target_os = "windows") {
            PathBuf::from(r"C:\ProgramData\docker\config\daemon.json")
        } else if cfg!(target_os = "macos") {
            // Docker Desktop for Mac 的用户级配置
            BaseDirs::new()
                .map(|dirs| dirs.home_dir().join(".docker").join("daemon.json"))
                .unwrap_or_else(|| PathBuf::from(".").join(".docker").join("daemon.json"))
        } else {
            PathBuf::from("/etc/docker/daemon.json")
        }
    }

    async fn current_url(&self) -> Result<Option<String>> {
        let path = self.config_path();
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).await?;
        let v: Value = serde_json::from_str(&content)?;

        // registry-mirrors 数组的第一个元素即当前源
        if let Some(mirrors) = v.get("registry-mirrors").and_then(|v| v.as_array()) {
            if let Some(first) = mirrors.first().and_then(|v| v.as_str()) {
                return Ok(Some(first.to_string()));
            }
        }

        Ok(None)
    }

    async fn apply(&self, source: &SourceInfo<'_>) -> Result<()> {
        let url = required_url(source)?;
        let path = self.config_path();

        let mut config: Value = if fs::try_exists(&path).await.unwrap_or(false) {
            let content = fs::read_to_string(&path).await?;
            serde_json::from_str(&content).unwrap_or(serde_json::json!({}))
        } else {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).await?;
            }
            serde_json::json!({})
        };

        utils::backup_file(&path).await?;

        // daemon 支持多个 mirror, 这里把选中的设为唯一一个
        config["registry-mirrors"] = serde_json::json!([url]);

        let new_content = serde_json::to_string_pretty(&config)?;
        fs::write(&path, new_content).await?;

        Ok(())
    }
}
