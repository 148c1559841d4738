pub mod cargo;
pub mod docker;
pub mod go;
pub mod npm;
pub mod pip;

use crate::error::{Error, Result};
use crate::traits::Recipe;
use crate::types::SourceInfo;

pub const SUPPORTED_TARGETS: &[&str] = &["pip", "npm", "cargo", "go", "docker"];

pub fn get_recipe(name: &str) -> Result<Box<dyn Recipe>> {
    match name.to_lowercase().as_str() {
        "pip" => Ok(Box::new(pip::PipRecipe::new())),
        "npm" => Ok(Box::new(npm::NpmRecipe::new())),
        "cargo" => Ok(Box::new(cargo::CargoRecipe::new())),
        "go" => Ok(Box::new(go::GoRecipe::new())),
        "docker" => Ok(Box::new(docker::DockerRecipe::new())),
        _ => Err(Error::UserCause(format!(
            "不支持的目标: '{}', 可用目标: {}",
            name,
            SUPPORTED_TARGETS.join(", ")
        ))),
    }
}

/// 配方只接受确认过的源; URL 缺失意味着确认步骤被绕过了
pub(crate) fn required_url<'a>(source: &'a SourceInfo<'_>) -> Result<&'a str> {
    source
        .url
        .as_deref()
        .ok_or_else(|| Error::FatalBug("该源URL不存在，请向开发团队提交bug".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_supported_target_has_a_recipe() {
        for target in SUPPORTED_TARGETS {
            let recipe = get_recipe(target).unwrap();
            assert_eq!(recipe.name(), *target);
        }
    }

    #[test]
    fn unknown_target_is_rejected() {
        let err = get_recipe("apt-get").unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }
}
