use crate::error::Result;
use crate::recipes::required_url;
use crate::traits::Recipe;
use crate::types::SourceInfo;
use crate::utils;
use async_trait::async_trait;
use directories::BaseDirs;
use regex::Regex;
use std::path::PathBuf;
use tokio::fs;

#[derive(Debug)]
pub struct NpmRecipe {
    custom_path: Option<PathBuf>,
}

impl NpmRecipe {
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
impl Recipe for NpmRecipe {
    fn name(&self) -> &'static str {
        "npm"
    }

    fn requires_sudo(&self) -> bool {
        false
    }

    fn config_path(&self) -> PathBuf {
        if let Some(ref path) = self.custom_path {
            return path.clone();
        }
        BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".npmrc"))
            .unwrap_or_else(|| PathBuf::from(".").join(".npmrc"))
    }

    async fn current_url(&self) -> Result<Option<String>> {
        let path = self.config_path();
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).await?;

        // Match "registry=https://..."
        let re = Regex::new(r"(?m)^registry\s*=\s*(.+)$")?;
        Ok(re
            .captures(&content)
            .map(|caps| caps[1].trim().to_string()))
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

        let new_line = format!("registry={}", url);
        let re = Regex::new(r"(?m)^registry\s*=\s*.*$")?;

        let new_content = if re.is_match(&content) {
            re.replace(&content, new_line.as_str()).to_string()
        } else {
            let prefix = if content.is_empty() || content.ends_with('\n') {
                ""
            } else {
                "\n"
            };
            format!("{}{}{}\n", content, prefix, new_line)
        };

        fs::write(&path, new_content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MirrorDescriptor;
    use tempfile::tempdir;

    fn mirror(code: &str) -> MirrorDescriptor {
        MirrorDescriptor {
            code: code.to_string(),
            name: code.to_string(),
            abbr: code.to_string(),
            site: String::new(),
            bigfile_url: None,
        }
    }

    #[tokio::test]
    async fn writes_and_replaces_registry() -> Result<()> {
        let dir = tempdir()?;
        let config_path = dir.path().join(".npmrc");
        let recipe = NpmRecipe::with_path(config_path.clone());
        let m = mirror("npmmirror");

        assert!(recipe.current_url().await?.is_none());

        recipe
            .apply(&SourceInfo {
                mirror: &m,
                url: Some("https://registry.npmmirror.com".to_string()),
            })
            .await?;
        assert_eq!(
            recipe.current_url().await?.as_deref(),
            Some("https://registry.npmmirror.com")
        );

        // 已有 registry 行时就地替换
        recipe
            .apply(&SourceInfo {
                mirror: &m,
                url: Some("https://mirrors.cloud.tencent.com/npm/".to_string()),
            })
            .await?;
        let content = fs::read_to_string(&config_path).await?;
        assert_eq!(content.matches("registry=").count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn appends_to_existing_npmrc_without_clobbering() -> Result<()> {
        let dir = tempdir()?;
        let config_path = dir.path().join(".npmrc");
        fs::write(&config_path, "save-exact=true").await?;

        let recipe = NpmRecipe::with_path(config_path.clone());
        let m = mirror("huawei");
        recipe
            .apply(&SourceInfo {
                mirror: &m,
                url: Some("https://repo.huaweicloud.com/repository/npm/".to_string()),
            })
            .await?;

        let content = fs::read_to_string(&config_path).await?;
        assert!(content.contains("save-exact=true"));
        assert!(content.contains("registry=https://repo.huaweicloud.com/repository/npm/"));
        Ok(())
    }
}
