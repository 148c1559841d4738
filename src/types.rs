use std::sync::OnceLock;

/// 保留 code: 目录中第一项固定为上游默认源
pub const CODE_UPSTREAM: &str = "upstream";
/// 保留 code: 用户通过 URL 自定义的源
pub const CODE_USER: &str = "user";

/// 镜像站定义
///
/// 展示信息 + 可选的测速链接。同一个镜像站可被多个目标的目录引用。
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorDescriptor {
    pub code: String, // 例如: "tsinghua"
    pub name: String, // 例如: "清华大学开源软件镜像站"
    pub abbr: String, // 例如: "清华大学"
    pub site: String, // 例如: "https://mirrors.tuna.tsinghua.edu.cn"
    /// 测速用的大文件链接; 未提供时该站点无法测速
    pub bigfile_url: Option<String>,
}

/// 目录中的一行: 镜像站 + 它为该目标提供的具体源 URL
#[derive(Debug, Clone)]
pub struct SourceEntry {
    pub mirror: MirrorDescriptor,
    pub url: Option<String>,
}

impl SourceEntry {
    pub fn to_source(&self) -> SourceInfo<'_> {
        SourceInfo {
            mirror: &self.mirror,
            url: self.url.clone(),
        }
    }
}

/// 一次换源决策的最终结果, 每次命令执行重新构建
#[derive(Debug, Clone)]
pub struct SourceInfo<'a> {
    pub mirror: &'a MirrorDescriptor,
    pub url: Option<String>,
}

impl SourceInfo<'_> {
    pub fn is_upstream(&self) -> bool {
        self.mirror.code == CODE_UPSTREAM
    }

    pub fn is_user_defined(&self) -> bool {
        self.mirror.code == CODE_USER
    }
}

/// 用户直接给出 URL 时使用的哨兵镜像站
pub fn user_defined() -> &'static MirrorDescriptor {
    static USER: OnceLock<MirrorDescriptor> = OnceLock::new();
    USER.get_or_init(|| MirrorDescriptor {
        code: CODE_USER.to_string(),
        name: "用户自定义".to_string(),
        abbr: "用户自定义".to_string(),
        site: String::new(),
        bigfile_url: None,
    })
}

/// 运行期选项, 由命令行旗标构建一次, 之后只读
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    pub dry_run: bool,
    pub ipv6: bool,
    pub english: bool,
}

impl Options {
    /// 按语言挑选文案
    pub fn text<'a>(&self, cn: &'a str, en: &'a str) -> &'a str {
        if self.english {
            en
        } else {
            cn
        }
    }
}
