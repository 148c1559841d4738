mod catalog;
mod error;
mod recipes;
mod select;
mod speed;
mod traits;
mod types;
mod utils;

use clap::{Parser, Subcommand};
use colored::Colorize;
use error::Result;
use recipes::get_recipe;
use speed::HttpProber;
use types::Options;

#[derive(Parser)]
#[command(name = "mirrorpick")]
#[command(version)]
#[command(about = "Pick and switch to the fastest mirror for common package managers", long_about = None)]
struct Cli {
    /// 测速只走 IPv6
    #[arg(long, global = true)]
    ipv6: bool,

    /// 只演练: 不访问网络, 也不写任何配置
    #[arg(long, global = true)]
    dry_run: bool,

    /// Use English output
    #[arg(long, global = true)]
    en: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported targets, or the mirrors of one target (e.g., mirrorpick ls pip)
    Ls {
        /// The target name (pip, npm, ...). If omitted, lists all targets.
        target: Option<String>,
    },
    /// Show the source a target is currently configured to use
    Get {
        /// The target name
        target: String,
    },
    /// Select a source and write it into the target's config (e.g., mirrorpick set pip tsinghua)
    Set {
        /// The target name
        target: String,

        /// Mirror code, "first", "reset", or a full URL. Omit to auto-select by speed
        mirror: Option<String>,
    },
    /// Reset a target to its upstream default source
    Reset {
        /// The target name
        target: String,
    },
    /// Measure the download speed of every mirror of a target, without applying anything
    Measure {
        /// The target name
        target: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let opts = Options {
        dry_run: cli.dry_run,
        ipv6: cli.ipv6,
        english: cli.en,
    };

    let outcome = match cli.command {
        Commands::Ls { ref target } => handle_ls(target.as_deref()),
        Commands::Get { ref target } => handle_get(target, &opts).await,
        Commands::Set {
            ref target,
            ref mirror,
        } => handle_set(target, mirror.as_deref(), &opts).await,
        Commands::Reset { ref target } => handle_set(target, Some("reset"), &opts).await,
        Commands::Measure { ref target } => handle_measure(target, &opts).await,
    };

    if let Err(e) = outcome {
        utils::error(&e);
        std::process::exit(e.exit_code());
    }
}

// --- Handlers ---

fn handle_ls(target: Option<&str>) -> Result<()> {
    match target {
        None => {
            println!("{:<10} {:<8} CONFIG", "TARGET", "MIRRORS");
            println!("{}", "-".repeat(60));
            for name in catalog::targets() {
                let eco = catalog::ecosystem(name)?;
                let recipe = get_recipe(name)?;
                println!(
                    "{:<10} {:<8} {}",
                    name,
                    eco.entries.len() - 1,
                    recipe.config_path().display(),
                );
            }
        }
        Some(name) => {
            let eco = catalog::ecosystem(name)?;
            println!("{:<12} {:<24} URL", "CODE", "NAME");
            println!("{}", "-".repeat(70));
            for entry in &eco.entries {
                println!(
                    "{:<12} {:<24} {}",
                    entry.mirror.code,
                    entry.mirror.name,
                    entry.url.as_deref().unwrap_or("-"),
                );
            }
        }
    }
    Ok(())
}

async fn handle_get(target: &str, opts: &Options) -> Result<()> {
    let eco = catalog::ecosystem(target)?;
    let recipe = get_recipe(target)?;

    match recipe.current_url().await? {
        Some(url) => {
            // 尝试匹配已知镜像, 便于用户一眼认出
            let known = eco
                .entries
                .iter()
                .find(|e| {
                    e.url.as_deref().map(|u| u.trim_end_matches('/'))
                        == Some(url.trim_end_matches('/'))
                })
                .map(|e| e.mirror.name.as_str())
                .unwrap_or("Custom");
            utils::say(format!("{} [{}]", url, known));
        }
        None => utils::say(opts.text(
            "未配置, 正在使用上游默认源",
            "Not configured, using the upstream default source",
        )),
    }
    Ok(())
}

async fn handle_set(target: &str, input: Option<&str>, opts: &Options) -> Result<()> {
    let eco = catalog::ecosystem(target)?;
    let prober = HttpProber::new(opts)?;

    let source = select::resolve(eco, input, opts, &prober).await?;
    select::confirm(&source, opts)?;

    let recipe = get_recipe(target)?;
    if recipe.requires_sudo() {
        utils::note(format!(
            "{}{}",
            opts.text(
                "修改该配置通常需要 sudo/root 权限: ",
                "Modifying this config usually requires sudo/root: "
            ),
            recipe.config_path().display(),
        ));
    }

    if opts.dry_run {
        utils::log(opts.text("Dry Run, 跳过写入配置", "Dry run, skip writing the config"));
    } else {
        recipe.apply(&source).await?;
    }

    select::conclude(&source, opts);
    Ok(())
}

async fn handle_measure(target: &str, opts: &Options) -> Result<()> {
    let eco = catalog::ecosystem(target)?;
    select::ensure_usable(eco, opts)?;

    if opts.dry_run {
        utils::note(opts.text("Dry Run, 跳过测速", "Dry run, skip speed measurement"));
        return Ok(());
    }

    let prober = HttpProber::new(opts)?;
    let rates = speed::measure_all(&eco.entries, &prober, opts).await;
    let fastest = speed::fastest_index(&rates[1..]) + 1;

    println!("{}", "-".repeat(40));
    utils::say(format!(
        "{}{} ({})",
        opts.text("最快镜像站: ", "FASTEST mirror site: "),
        eco.entries[fastest].mirror.name.green(),
        speed::human_speed(rates[fastest]),
    ));
    Ok(())
}
