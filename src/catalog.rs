use crate::error::{Error, Result};
use crate::types::{MirrorDescriptor, SourceEntry, CODE_UPSTREAM};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;

// Include the JSON file at compile time
const CATALOGS_JSON: &str = include_str!("../assets/catalogs.json");

// Global registry, parsed once and read-only afterwards
static REGISTRY: OnceLock<HashMap<String, Ecosystem>> = OnceLock::new();

/// 一个目标生态 (包管理器) 的完整源目录
///
/// 不变量: entries[0] 恒为上游默认源, 其余按配置顺序排列
#[derive(Debug, Clone)]
pub struct Ecosystem {
    pub name: String,
    /// 该目标是否接受用户直接给出的 URL 作为源
    pub accepts_user_url: bool,
    pub entries: Vec<SourceEntry>,
}

#[derive(Deserialize)]
struct RawData {
    mirrors: HashMap<String, RawMirror>,
    ecosystems: HashMap<String, RawEcosystem>,
}

#[derive(Deserialize)]
struct RawMirror {
    name: String,
    abbr: String,
    site: String,
    #[serde(default)]
    bigfile_url: Option<String>,
}

#[derive(Deserialize)]
struct RawEcosystem {
    upstream: RawUpstream,
    /// 缺失表示该目标尚未实现重置
    #[serde(default)]
    upstream_url: Option<String>,
    #[serde(default)]
    accepts_user_url: bool,
    sources: Vec<RawSource>,
}

#[derive(Deserialize)]
struct RawUpstream {
    name: String,
    abbr: String,
    site: String,
}

#[derive(Deserialize)]
struct RawSource {
    mirror: String,
    url: Option<String>,
}

fn build_registry() -> HashMap<String, Ecosystem> {
    let raw: RawData = serde_json::from_str(CATALOGS_JSON)
        .expect("Failed to parse assets/catalogs.json. This is a packaging error.");

    let mut out = HashMap::new();
    for (name, eco) in raw.ecosystems {
        let mut entries = Vec::with_capacity(eco.sources.len() + 1);

        // 上游默认源固定占据第一位, 永不测速
        entries.push(SourceEntry {
            mirror: MirrorDescriptor {
                code: CODE_UPSTREAM.to_string(),
                name: eco.upstream.name,
                abbr: eco.upstream.abbr,
                site: eco.upstream.site,
                bigfile_url: None,
            },
            url: eco.upstream_url,
        });

        for src in eco.sources {
            let mirror = raw.mirrors.get(&src.mirror).unwrap_or_else(|| {
                panic!(
                    "assets/catalogs.json: ecosystem '{}' references unknown mirror '{}'",
                    name, src.mirror
                )
            });
            entries.push(SourceEntry {
                mirror: MirrorDescriptor {
                    code: src.mirror.clone(),
                    name: mirror.name.clone(),
                    abbr: mirror.abbr.clone(),
                    site: mirror.site.clone(),
                    bigfile_url: mirror.bigfile_url.clone(),
                },
                url: src.url,
            });
        }

        out.insert(
            name.clone(),
            Ecosystem {
                name,
                accepts_user_url: eco.accepts_user_url,
                entries,
            },
        );
    }
    out
}

fn registry() -> &'static HashMap<String, Ecosystem> {
    REGISTRY.get_or_init(build_registry)
}

/// 按目标名查找目录
pub fn ecosystem(target: &str) -> Result<&'static Ecosystem> {
    registry().get(&target.to_lowercase()).ok_or_else(|| {
        Error::UserCause(format!(
            "不支持的目标: '{}', 可用目标: {}",
            target,
            targets().join(", ")
        ))
    })
}

/// 全部受支持的目标名, 排序后返回
pub fn targets() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = registry().keys().map(|s| s.as_str()).collect();
    names.sort_unstable();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn registry_covers_expected_targets() {
        let names = targets();
        for expected in ["pip", "npm", "cargo", "go", "docker"] {
            assert!(names.contains(&expected), "missing target: {}", expected);
        }
    }

    #[test]
    fn upstream_is_always_first() {
        for name in targets() {
            let eco = ecosystem(name).unwrap();
            assert!(
                eco.entries.len() >= 2,
                "{}: a catalog with only the upstream entry is unusable",
                name
            );
            assert_eq!(eco.entries[0].mirror.code, CODE_UPSTREAM);
            assert!(eco.entries[0].mirror.bigfile_url.is_none());
        }
    }

    #[test]
    fn codes_are_unique_within_each_catalog() {
        for name in targets() {
            let eco = ecosystem(name).unwrap();
            let mut seen = HashSet::new();
            for entry in &eco.entries {
                assert!(
                    seen.insert(entry.mirror.code.as_str()),
                    "{}: duplicate mirror code {}",
                    name,
                    entry.mirror.code
                );
            }
        }
    }

    #[test]
    fn real_mirrors_carry_urls() {
        // 上游可以没有 URL (表示重置未实现), 但真实镜像行必须有
        for name in targets() {
            let eco = ecosystem(name).unwrap();
            for entry in &eco.entries[1..] {
                assert!(
                    entry.url.is_some(),
                    "{}: mirror {} has no source URL",
                    name,
                    entry.mirror.code
                );
            }
        }
    }

    #[test]
    fn unknown_target_is_a_user_error() {
        let err = ecosystem("nix").unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }
}
