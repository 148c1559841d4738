use crate::error::Result;
use crate::types::SourceInfo;
use async_trait::async_trait;
use std::path::PathBuf;

/// Recipe: 每个目标生态的换源配方必须实现的接口
///
/// 选择引擎只负责产出一个确认过的 SourceInfo, 怎样把它写进具体
/// 配置文件 (或命令) 完全由各配方自理
#[async_trait]
pub trait Recipe: Sync + Send + std::fmt::Debug {
    /// 目标名称 (如 "pip", "docker")
    fn name(&self) -> &'static str;

    /// 是否需要 Root 权限 (如 docker 需要 sudo)
    fn requires_sudo(&self) -> bool;

    /// 配置文件的路径 (用于展示)
    fn config_path(&self) -> PathBuf;

    /// 当前正在使用的源 URL
    /// 返回 Option: 如果未配置或无法解析, 则返回 None (视为上游默认)
    async fn current_url(&self) -> Result<Option<String>>;

    /// 把确认后的源写入该生态的配置
    /// 实现中必须包含:
    /// 1. 备份原配置文件
    /// 2. 写入新配置
    async fn apply(&self, source: &SourceInfo<'_>) -> Result<()>;
}
