use crate::error::{Error, Result};
use crate::types::{Options, SourceEntry};
use crate::utils;
use async_trait::async_trait;
use colored::{ColoredString, Colorize};
use indicatif::ProgressBar;
use reqwest::redirect::Policy;
use reqwest::Client;
use std::net::{IpAddr, Ipv6Addr};
use std::time::{Duration, Instant};

/// 单个镜像站的测速时间上限 (秒)
pub const PROBE_TIMEOUT_SECS: u64 = 6;

const SCALE: [&str; 5] = ["Byte/s", "KByte/s", "MByte/s", "GByte/s", "TByte/s"];

/// 单次测速的结果
///
/// 连接失败与"确实很慢"被区分开, 但选择算法仍只比较速率
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbeOutcome {
    /// HTTP 200, 测得下载速率 (Byte/s)
    Success { rate: f64 },
    /// 连接成功但响应非 200; 已传输的速率照常记录, 不剔除该候选
    HttpError { status: u16, rate: f64 },
    /// 完全无法建立连接
    Unreachable,
}

impl ProbeOutcome {
    /// 参与选择的速率, 连接失败折算为 0
    pub fn rate(&self) -> f64 {
        match *self {
            ProbeOutcome::Success { rate } => rate,
            ProbeOutcome::HttpError { rate, .. } => rate,
            ProbeOutcome::Unreachable => 0.0,
        }
    }
}

/// 测速能力接口
///
/// 生产实现走真实 HTTP; 测试注入假实现即可完全脱离网络
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, url: &str) -> ProbeOutcome;
}

/// 真实测速: 一次有时限的 GET, 跟随跳转, 丢弃响应体, 只统计字节数
pub struct HttpProber {
    client: Client,
    window: Duration,
}

impl HttpProber {
    pub fn new(opts: &Options) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(concat!("mirrorpick/", env!("CARGO_PKG_VERSION")))
            // Ruby China、npmmirror 等源会跳转, 必须跟随
            .redirect(Policy::limited(10))
            .timeout(Duration::from_secs(PROBE_TIMEOUT_SECS));

        if opts.ipv6 {
            // 绑定到 IPv6 通配地址, 强制只走 IPv6
            builder = builder.local_address(IpAddr::V6(Ipv6Addr::UNSPECIFIED));
        }

        let client = builder.build().map_err(|e| {
            Error::UserCause(format!(
                "{}: {}",
                opts.text("无法构建 HTTP 客户端，无法测速", "Cannot build the HTTP client, unable to measure speed"),
                e
            ))
        })?;

        Ok(Self {
            client,
            window: Duration::from_secs(PROBE_TIMEOUT_SECS),
        })
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        let start = Instant::now();

        let mut resp = match self.client.get(url).send().await {
            Ok(resp) => resp,
            Err(_) => return ProbeOutcome::Unreachable,
        };
        let status = resp.status().as_u16();

        // 在时间窗内持续读取响应体, 只计字节数
        let mut bytes: u64 = 0;
        loop {
            if start.elapsed() >= self.window {
                break;
            }
            match resp.chunk().await {
                Ok(Some(chunk)) => bytes += chunk.len() as u64,
                Ok(None) => break,
                // 整体超时或传输中断, 已读到的字节仍然计入速率
                Err(_) => break,
            }
        }

        let secs = start.elapsed().as_secs_f64().max(f64::EPSILON);
        let rate = bytes as f64 / secs;

        if status == 200 {
            ProbeOutcome::Success { rate }
        } else {
            ProbeOutcome::HttpError { status, rate }
        }
    }
}

/// 逐个测速 entries[1..], 返回与目录下标对齐的速率表
///
/// 上游 (下标 0) 永不测速, 速率恒为 0; 测速严格串行, 避免多连接互相挤占带宽
pub async fn measure_all(entries: &[SourceEntry], prober: &dyn Prober, opts: &Options) -> Vec<f64> {
    let mut rates = vec![0.0; entries.len()];

    for (i, entry) in entries.iter().enumerate().skip(1) {
        let Some(url) = entry.mirror.bigfile_url.as_deref() else {
            utils::warn(format!(
                "{}{}{}",
                opts.text("开发者未提供 ", "Dev team doesn't offer "),
                entry.mirror.code,
                opts.text(
                    " 镜像站测速链接，跳过该站点",
                    " mirror site's speed measurement link, so skip it"
                ),
            ));
            continue;
        };

        let label = format!(
            "{}{} ... ",
            opts.text("测速 ", "Measure speed> "),
            entry.mirror.site
        );

        let spinner = ProgressBar::new_spinner();
        spinner.set_message(label.clone());
        spinner.enable_steady_tick(Duration::from_millis(100));
        let outcome = prober.probe(url).await;
        spinner.finish_and_clear();

        match outcome {
            ProbeOutcome::Success { rate } => {
                utils::say(format!("{}{}", label, render_speed(rate)));
            }
            ProbeOutcome::HttpError { status, rate } => {
                let code = format!("{}{}", opts.text("HTTP码 ", "HTTP code "), status);
                utils::say(format!("{}{} | {}", label, render_speed(rate), code.yellow()));
            }
            ProbeOutcome::Unreachable => {
                utils::say(format!(
                    "{}{}",
                    label,
                    opts.text("无法连接", "unreachable").red()
                ));
            }
        }

        rates[i] = outcome.rate();
    }

    rates
}

/// 从左到右找最大值, 平手取先出现者
///
/// 调用方保证切片非空
pub fn fastest_index(rates: &[f64]) -> usize {
    let mut max_idx = 0;
    let mut max_val = rates[0];
    for (i, &rate) in rates.iter().enumerate().skip(1) {
        if rate > max_val {
            max_val = rate;
            max_idx = i;
        }
    }
    max_idx
}

fn scaled(mut speed: f64) -> (f64, usize) {
    let mut tier = 0;
    while speed > 1024.0 && tier < SCALE.len() - 1 {
        speed /= 1024.0;
        tier += 1;
    }
    (speed, tier)
}

/// Byte/s 速率转为人类可读形式, 两位小数
pub fn human_speed(speed: f64) -> String {
    let (value, tier) = scaled(speed);
    format!("{:.2} {}", value, SCALE[tier])
}

/// 带颜色的速率文本; 颜色只作观感分级, 不参与任何选择
pub fn render_speed(speed: f64) -> ColoredString {
    let (value, tier) = scaled(speed);
    let text = format!("{:.2} {}", value, SCALE[tier]);
    if tier <= 1 {
        text.red()
    } else if tier == 2 && value < 2.0 {
        text.yellow()
    } else {
        text.green()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MirrorDescriptor;
    use std::collections::HashMap;

    struct FakeProber {
        outcomes: HashMap<String, ProbeOutcome>,
    }

    #[async_trait]
    impl Prober for FakeProber {
        async fn probe(&self, url: &str) -> ProbeOutcome {
            self.outcomes
                .get(url)
                .copied()
                .unwrap_or(ProbeOutcome::Unreachable)
        }
    }

    fn entry(code: &str, bigfile: Option<&str>) -> SourceEntry {
        SourceEntry {
            mirror: MirrorDescriptor {
                code: code.to_string(),
                name: code.to_string(),
                abbr: code.to_string(),
                site: format!("https://{}.example.com", code),
                bigfile_url: bigfile.map(str::to_string),
            },
            url: Some(format!("https://{}.example.com/repo", code)),
        }
    }

    #[test]
    fn human_speed_units() {
        assert_eq!(human_speed(900.0), "900.00 Byte/s");
        assert_eq!(human_speed(2048.0), "2.00 KByte/s");
        assert_eq!(human_speed(5.0 * 1024.0 * 1024.0 * 1024.0), "5.00 GByte/s");
        assert_eq!(human_speed(0.0), "0.00 Byte/s");
    }

    #[test]
    fn fastest_index_prefers_first_on_tie() {
        assert_eq!(fastest_index(&[1.0, 3.0, 3.0, 2.0]), 1);
        assert_eq!(fastest_index(&[0.0, 0.0]), 0);
        assert_eq!(fastest_index(&[5.0]), 0);
    }

    #[test]
    fn failed_probe_counts_as_zero_rate() {
        assert_eq!(ProbeOutcome::Unreachable.rate(), 0.0);
        assert_eq!(
            ProbeOutcome::HttpError {
                status: 404,
                rate: 120.0
            }
            .rate(),
            120.0
        );
    }

    #[tokio::test]
    async fn measure_all_skips_upstream_and_unmeasurable_mirrors() {
        let entries = vec![
            entry("upstream", None),
            entry("a", Some("https://a.example.com/big")),
            entry("b", None),
            entry("c", Some("https://c.example.com/big")),
        ];
        let prober = FakeProber {
            outcomes: HashMap::from([
                (
                    "https://a.example.com/big".to_string(),
                    ProbeOutcome::Success { rate: 1000.0 },
                ),
                (
                    "https://c.example.com/big".to_string(),
                    ProbeOutcome::HttpError {
                        status: 404,
                        rate: 300.0,
                    },
                ),
            ]),
        };

        let rates = measure_all(&entries, &prober, &Options::default()).await;
        assert_eq!(rates, vec![0.0, 1000.0, 0.0, 300.0]);
    }
}
