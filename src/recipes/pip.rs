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
pub struct PipRecipe {
    custom_path: Option<PathBuf>,
}

impl PipRecipe {
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
impl Recipe for PipRecipe {
    fn name(&self) -> &'static str {
        "pip"
    }

    fn requires_sudo(&self) -> bool {
        false
    }

    fn config_path(&self) -> PathBuf {
        if let Some(ref path) = self.custom_path {
            return path.clone();
        }

        if let Some(base_dirs) = BaseDirs::new() {
            let config_dir = base_dirs.config_dir();
            if cfg!(target_os = "windows") {
                // Windows: %APPDATA%\pip\pip.ini
                config_dir.join("pip").join("pip.ini")
            } else {
                // Linux/macOS: ~/.config/pip/pip.conf (XDG)
                config_dir.join("pip").join("pip.conf")
            }
        } else {
            PathBuf::from(".").join("pip.conf")
        }
    }

    async fn current_url(&self) -> Result<Option<String>> {
        let path = self.config_path();
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).await?;

        // 支持 index-url = https://... 或 index-url=https://...
        let re = Regex::new(r"(?m)^index-url\s*=\s*(.+)$")?;
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

        // 用正则替换而不是整体覆盖, 保留用户的其他配置项
        let new_line = format!("index-url = {}", url);
        let re = Regex::new(r"(?m)^index-url\s*=\s*.*$")?;

        let new_content = if re.is_match(&content) {
            re.replace(&content, new_line.as_str()).to_string()
        } else if content.contains("[global]") {
            content.replace("[global]", &format!("[global]\n{}", new_line))
        } else {
            let prefix = if content.is_empty() { "" } else { "\n" };
            format!("{}{}[global]\n{}\n", content, prefix, new_line)
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

    fn source<'a>(mirror: &'a MirrorDescriptor, url: &str) -> SourceInfo<'a> {
        SourceInfo {
            mirror,
            url: Some(url.to_string()),
        }
    }

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
    async fn writes_and_replaces_index_url() -> Result<()> {
        let dir = tempdir()?;
        let config_path = dir.path().join("pip.conf");
        let recipe = PipRecipe::with_path(config_path.clone());
        let m = mirror("tsinghua");

        // 1. Initial state: None
        assert!(recipe.current_url().await?.is_none());

        // 2. Apply a mirror
        recipe
            .apply(&source(&m, "https://pypi.tuna.tsinghua.edu.cn/simple"))
            .await?;
        assert_eq!(
            recipe.current_url().await?.as_deref(),
            Some("https://pypi.tuna.tsinghua.edu.cn/simple")
        );

        let content = fs::read_to_string(&config_path).await?;
        assert!(content.contains("[global]"));

        // 3. Apply another mirror; the existing line is replaced, not duplicated
        recipe
            .apply(&source(&m, "https://mirrors.bfsu.edu.cn/pypi/web/simple"))
            .await?;
        let content = fs::read_to_string(&config_path).await?;
        assert_eq!(content.matches("index-url").count(), 1);
        assert_eq!(
            recipe.current_url().await?.as_deref(),
            Some("https://mirrors.bfsu.edu.cn/pypi/web/simple")
        );

        Ok(())
    }

    #[tokio::test]
    async fn keeps_unrelated_settings() -> Result<()> {
        let dir = tempdir()?;
        let config_path = dir.path().join("pip.conf");
        fs::write(
            &config_path,
            "[global]\ntimeout = 60\n",
        )
        .await?;

        let recipe = PipRecipe::with_path(config_path.clone());
        let m = mirror("aliyun");
        recipe
            .apply(&source(&m, "https://mirrors.aliyun.com/pypi/simple/"))
            .await?;

        let content = fs::read_to_string(&config_path).await?;
        assert!(content.contains("timeout = 60"));
        assert!(content.contains("index-url = https://mirrors.aliyun.com/pypi/simple/"));
        Ok(())
    }

    #[tokio::test]
    async fn reset_writes_the_upstream_url() -> Result<()> {
        let dir = tempdir()?;
        let config_path = dir.path().join("pip.conf");
        let recipe = PipRecipe::with_path(config_path.clone());

        let upstream = mirror("upstream");
        recipe
            .apply(&source(&upstream, "https://pypi.org/simple"))
            .await?;
        assert_eq!(
            recipe.current_url().await?.as_deref(),
            Some("https://pypi.org/simple")
        );
        Ok(())
    }

    #[tokio::test]
    async fn missing_url_is_an_internal_bug() {
        let dir = tempdir().unwrap();
        let recipe = PipRecipe::with_path(dir.path().join("pip.conf"));
        let m = mirror("tsinghua");
        let bad = SourceInfo {
            mirror: &m,
            url: None,
        };
        let err = recipe.apply(&bad).await.unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }
}
