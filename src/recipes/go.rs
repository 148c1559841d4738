use crate::error::Result;
use crate::recipes::required_url;
use crate::traits::Recipe;
use crate::types::SourceInfo;
use anyhow::anyhow;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;

/// Go 的代理配置由 `go env -w` 托管, 不直接碰配置文件
#[derive(Debug)]
pub struct GoRecipe;

impl GoRecipe {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Recipe for GoRecipe {
    fn name(&self) -> &'static str {
        "go"
    }

    fn requires_sudo(&self) -> bool {
        false
    }

    fn config_path(&self) -> PathBuf {
        // 实际写入位置由 go 自行决定 (如 ~/.config/go/env)
        PathBuf::from("go env GOPROXY")
    }

    async fn current_url(&self) -> Result<Option<String>> {
        let output = Command::new("go").args(["env", "GOPROXY"]).output().await;

        match output {
            Ok(o) if o.status.success() => {
                let stdout = String::from_utf8_lossy(&o.stdout).trim().to_string();
                if stdout.is_empty() {
                    Ok(None)
                } else {
                    // 通常形如 "https://proxy.golang.org,direct", 取第一段
                    let first = stdout.split(',').next().unwrap_or(&stdout).to_string();
                    Ok(Some(first))
                }
            }
            // go 未安装或执行失败, 视为未配置
            _ => Ok(None),
        }
    }

    async fn apply(&self, source: &SourceInfo<'_>) -> Result<()> {
        if source.is_upstream() {
            // 重置: 直接清掉 GOPROXY, 回到 go 自身的默认值
            let status = Command::new("go")
                .args(["env", "-u", "GOPROXY"])
                .status()
                .await?;
            if !status.success() {
                return Err(anyhow!("Failed to unset GOPROXY via 'go env -u'").into());
            }
            return Ok(());
        }

        // 追加 ",direct" 保证私有模块可以回退直连
        let url = required_url(source)?;
        let status = Command::new("go")
            .args(["env", "-w", &format!("GOPROXY={},direct", url)])
            .status()
            .await?;

        if !status.success() {
            return Err(anyhow!("Failed to set GOPROXY via 'go env -w'").into());
        }

        Ok(())
    }
}
