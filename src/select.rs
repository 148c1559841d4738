use crate::catalog::Ecosystem;
use crate::error::{Error, Result};
use crate::speed::{self, Prober};
use crate::types::{user_defined, Options, SourceInfo};
use crate::utils;
use colored::Colorize;

/// 把用户请求解析为一个具体源
///
/// 用户只可能通过三种方式换源, 无论哪一种都会得到一个 SourceInfo:
/// 1. 指定镜像站 code (或 "reset" / "first" 关键字)
/// 2. 什么都不指定, 自动测速选择最快镜像
/// 3. 直接给出一个 URL
pub async fn resolve<'a>(
    eco: &'a Ecosystem,
    input: Option<&str>,
    opts: &Options,
    prober: &dyn Prober,
) -> Result<SourceInfo<'a>> {
    ensure_usable(eco, opts)?;

    if eco.entries.len() == 2 {
        utils::succ(format!(
            "{}{}{}{}",
            eco.entries[1].mirror.name,
            opts.text(" 是 ", " is "),
            eco.name,
            opts.text(
                " 目前唯一可用镜像站，感谢他们的慷慨支持",
                " the ONLY mirror available currently, thanks for their generous support"
            ),
        ));
    }

    let Some(input) = input else {
        let idx = auto_select(eco, opts, prober).await?;
        return Ok(eco.entries[idx].to_source());
    };

    if utils::is_url(input) {
        if !eco.accepts_user_url {
            return Err(Error::UserCause(
                opts.text(
                    "暂不支持对该目标使用用户自定义源，请联系开发者询问原因或请求支持",
                    "User-defined source is not supported for this target yet, please contact the dev team",
                )
                .to_string(),
            ));
        }
        return Ok(SourceInfo {
            mirror: user_defined(),
            url: Some(input.to_string()),
        });
    }

    if input == "reset" {
        utils::say(opts.text(
            "将重置为上游默认源",
            "Will reset to the upstream default source",
        ));
        return Ok(eco.entries[0].to_source());
    }

    if input == "first" {
        utils::say(opts.text(
            "将使用维护团队测速第一的源",
            "Will use the source ranked first by the maintain team",
        ));
        return Ok(eco.entries[1].to_source());
    }

    match eco.entries.iter().find(|e| e.mirror.code == input) {
        Some(entry) => Ok(entry.to_source()),
        None => {
            utils::error(format!(
                "{}{}{}",
                opts.text("镜像站 ", "Mirror site "),
                input,
                opts.text(" 不存在", " doesn't exist"),
            ));
            Err(Error::UserCause(format!(
                "{}mirrorpick ls {}",
                opts.text("查看可使用源，请使用 ", "To view available sources, use "),
                eco.name,
            )))
        }
    }
}

/// 只剩上游占位的目录无法换源, 属于维护缺口
pub fn ensure_usable(eco: &Ecosystem, opts: &Options) -> Result<()> {
    if eco.entries.len() <= 1 {
        return Err(Error::MaintainerIssue(format!(
            "{}{}{}",
            opts.text("当前 ", "Currently "),
            eco.name,
            opts.text(
                " 无任何可用源，请联系维护者",
                " has no available source, please contact maintainers"
            ),
        )));
    }
    Ok(())
}

/// 自动测速选择, 返回目录下标
///
/// 上游 (下标 0) 不参与; Dry Run 跳过一切网络活动, 固定返回 1
async fn auto_select(eco: &Ecosystem, opts: &Options, prober: &dyn Prober) -> Result<usize> {
    if opts.dry_run {
        return Ok(1);
    }

    let rates = speed::measure_all(&eco.entries, prober, opts).await;
    let fastest = speed::fastest_index(&rates[1..]) + 1;

    if eco.entries.len() > 2 {
        utils::say(format!(
            "{}{}",
            opts.text("最快镜像站: ", "FASTEST mirror site: "),
            eco.entries[fastest].mirror.name.green(),
        ));
    }
    Ok(fastest)
}

/// 对选中的源做最终校验, 并向用户报告
///
/// 上游默认源放在目录第一位只是为了寻址规整, 有的目标并没有真正实现重置;
/// 用户可能摸索着执行 set <target> upstream 绕进来, 在这里拦住
pub fn confirm(source: &SourceInfo<'_>, opts: &Options) -> Result<()> {
    if source.is_upstream() && source.url.is_none() {
        return Err(Error::Unsupported(
            opts.text("暂未对该目标实现重置", "Not implement RESET for the target yet")
                .to_string(),
        ));
    }
    if source.url.is_none() {
        return Err(Error::FatalBug(
            opts.text(
                "该源URL不存在，请向开发团队提交bug",
                "URL of the source doesn't exist, please report a bug to the dev team",
            )
            .to_string(),
        ));
    }

    utils::say(format!(
        "{}{} ({})",
        opts.text("选中镜像站: ", "SELECT  mirror site: "),
        source.mirror.abbr.green(),
        source.mirror.code.green(),
    ));
    utils::separator();
    Ok(())
}

/// 换源完成后的收尾提示
pub fn conclude(source: &SourceInfo<'_>, opts: &Options) {
    utils::separator();
    if source.is_upstream() {
        utils::log(
            opts.text("已重置为上游默认源", "Has been reset to the upstream default source")
                .purple(),
        );
    } else if source.is_user_defined() {
        utils::log(opts.text(
            "全自动换源完成, 若您指定的URL为公有服务，邀您参与贡献",
            "Fully-Auto changed source. If the URL you specify is a public service, you are invited to contribute it",
        ));
    } else {
        utils::log(format!(
            "{}{}",
            opts.text(
                "全自动换源完成, 感谢镜像提供方: ",
                "Fully-Auto changed source. Thanks to the mirror site: "
            ),
            source.mirror.name.purple(),
        ));
    }
}
