use crate::error::Result;
use colored::Colorize;
use std::fmt::Display;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;

const APP: &str = "mirrorpick";

/// 不带任何前缀修饰的输出
pub fn say(msg: impl Display) {
    println!("{}", msg);
}

pub fn log(msg: impl Display) {
    println!("[{}] {}", APP.blue(), msg);
}

pub fn succ(msg: impl Display) {
    println!("[{}] {}", APP.green(), format!("{}", msg).green());
}

pub fn warn(msg: impl Display) {
    eprintln!("[{}] {}", APP.yellow(), format!("{}", msg).yellow());
}

pub fn error(msg: impl Display) {
    eprintln!("[{}] {}", APP.red(), format!("{}", msg).red());
}

/// 黄色 [提示] 前缀, 用于非致命但值得注意的信息
pub fn note(msg: impl Display) {
    println!(
        "[{}] [{}] {}",
        APP.yellow(),
        "提示".bold().yellow(),
        format!("{}", msg).yellow()
    );
}

/// 决策阶段与写配置阶段之间的分隔线
pub fn separator() {
    println!("--------------------------------");
}

pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// 备份文件 (如果有)
/// 文件名格式: original.ext -> original.ext.bak.TIMESTAMP
pub async fn backup_file(path: &Path) -> Result<()> {
    if fs::try_exists(path).await.unwrap_or(false) {
        let timestamp = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        let file_name = path.file_name().unwrap_or_default().to_string_lossy();
        let backup_name = format!("{}.bak.{}", file_name, timestamp);
        let backup_path = path.with_file_name(backup_name);

        fs::copy(path, &backup_path).await?;
        note(format!("备份文件名为 {:?}", backup_path));
    }
    Ok(())
}
