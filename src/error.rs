use thiserror::Error;

/// 所有失败都终止本次执行, 不做内部重试; 按类别映射为不同退出码
#[derive(Error, Debug)]
pub enum Error {
    /// 用户可自行修正: 输错 code、目标不支持自定义 URL、缺少依赖等
    #[error("{0}")]
    UserCause(String),

    /// 功能对该目标尚未实现
    #[error("{0}")]
    Unsupported(String),

    /// 源目录数据存在维护缺口 (为空或只剩上游)
    #[error("{0}")]
    MaintainerIssue(String),

    /// 内部不变量被破坏, 属于本工具自身的 bug
    #[error("{0}")]
    FatalBug(String),

    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("System time error: {0}")]
    SystemTime(#[from] std::time::SystemTimeError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::UserCause(_) => 1,
            Error::Unsupported(_) => 2,
            Error::MaintainerIssue(_) => 3,
            Error::FatalBug(_) => 4,
            _ => 5,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_by_class() {
        assert_eq!(Error::UserCause(String::new()).exit_code(), 1);
        assert_eq!(Error::Unsupported(String::new()).exit_code(), 2);
        assert_eq!(Error::MaintainerIssue(String::new()).exit_code(), 3);
        assert_eq!(Error::FatalBug(String::new()).exit_code(), 4);
        assert_eq!(
            Error::Other(anyhow::anyhow!("boom")).exit_code(),
            5
        );
    }
}
