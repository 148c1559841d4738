use crate::error::{Error, Result};
use crate::recipes::required_url;
use crate::traits::Recipe;
use crate::types::SourceInfo;
use crate::utils;
use async_trait::async_trait;
use directories::BaseDirs;
use std::path::PathBuf;
use tokio::fs;

#[derive(Debug)]
pub struct CargoRecipe {
    custom_path: Option<PathBuf>,
}

impl CargoRecipe {
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
impl Recipe for CargoRecipe {
    fn name(&self) -> &'static str {
        "cargo"
    }

    fn requires_sudo(&self) -> bool {
        false
    }

    fn config_path(&self) -> PathBuf {
        if let Some(ref path) = self.custom_path {
            return path.clone();
        }
        BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".cargo").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(".").join(".cargo").join("config.toml"))
    }

    async fn current_url(&self) -> Result<Option<String>> {
        let path = self.config_path();
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).await?;
        let config: toml::Value =
            toml::from_str(&content).unwrap_or(toml::Value::Table(toml::map::Map::new()));

        // [source.crates-io] replace-with 指向的表中读取 registry
        if let Some(replace_with) = config
            .get("source")
            .and_then(|s| s.get("crates-io"))
            .and_then(|c| c.get("replace-with"))
            .and_then(|v| v.as_str())
        {
            if let Some(registry) = config
                .get("source")
                .and_then(|s| s.get(replace_with))
                .and_then(|m| m.get("registry"))
                .and_then(|r| r.as_str())
            {
                return Ok(Some(registry.to_string()));
            }
        }

        Ok(None)
    }

    async fn apply(&self, source: &SourceInfo<'_>) -> Result<()> {
        let url = required_url(source)?;
        let path = self.config_path();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = if fs::try_exists(&path).await.unwrap_or(false) {
            fs::read_to_string(&path).await?
        } else {
            String::new()
        };

        if !content.is_empty() {
            utils::backup_file(&path).await?;
        }

        let mut config: toml::Value =
            toml::from_str(&content).unwrap_or(toml::Value::Table(toml::map::Map::new()));

        let root = config
            .as_table_mut()
            .ok_or_else(|| Error::Other(anyhow::anyhow!("Invalid config.toml format")))?;

        let source_table = root
            .entry("source")
            .or_insert(toml::Value::Table(toml::map::Map::new()))
            .as_table_mut()
            .ok_or_else(|| Error::Other(anyhow::anyhow!("Invalid [source] section")))?;

        if source.is_upstream() {
            // 重置: 去掉 crates-io 的 replace-with 指向, 回到官方源
            source_table.remove("mirror");
            if let Some(crates_io) = source_table
                .get_mut("crates-io")
                .and_then(|v| v.as_table_mut())
            {
                crates_io.remove("replace-with");
            }
        } else {
            // [source.crates-io] replace-with = 'mirror'
            let crates_io = source_table
                .entry("crates-io")
                .or_insert(toml::Value::Table(toml::map::Map::new()))
                .as_table_mut()
                .ok_or_else(|| Error::Other(anyhow::anyhow!("Invalid [source.crates-io] section")))?;
            crates_io.insert(
                "replace-with".to_string(),
                toml::Value::String("mirror".to_string()),
            );

            // [source.mirror] registry = "..."
            let mirror_table = source_table
                .entry("mirror")
                .or_insert(toml::Value::Table(toml::map::Map::new()))
                .as_table_mut()
                .ok_or_else(|| Error::Other(anyhow::anyhow!("Invalid [source.mirror] section")))?;
            mirror_table.insert("registry".to_string(), toml::Value::String(url.to_string()));
        }

        let new_content = toml::to_string_pretty(&config)?;
        fs::write(&path, new_content).await?;

        Ok(())
    }
}
