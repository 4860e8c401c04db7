//! Generates the RISC-V LLVM CI status page.
//!
//! Fetches the two most recent builds of each tracked buildbot from the
//! coordinator API, derives a status per bot, and renders the dashboard
//! template to stdout or a file.

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;
use lino::{Engine, Error, Scope};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::{fs, path::PathBuf, time::Duration};

#[derive(Parser)]
#[command(name = "ci-status", about = "Generate the RISC-V LLVM CI status page", version)]
struct Cli {
    /// Write the page to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Seconds to wait for each coordinator response.
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

/// The buildbot coordinator a bot reports to.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
enum Environment {
    Staging,
    Production,
}

impl Environment {
    fn base_url(self) -> &'static str {
        match self {
            Environment::Staging => "https://lab.llvm.org/staging",
            Environment::Production => "https://lab.llvm.org/buildbot",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct Bot {
    id: u32,
    name: &'static str,
    environment: Environment,
    description: &'static str,
    url: String,
}

impl Bot {
    fn new(
        id: u32,
        name: &'static str,
        environment: Environment,
        description: &'static str,
    ) -> Self {
        let url = format!("{}/#/builders/{}", environment.base_url(), id);
        Self {
            id,
            name,
            environment,
            description,
            url,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
enum BuildResult {
    Pass,
    Fail,
    InProgress,
    Other,
}

#[derive(Debug, Serialize)]
struct Build {
    id: u64,
    url: String,
    started_at: i64,
    finished_at: Option<i64>,
    result: BuildResult,
    /// Seconds since the build started.
    elapsed: i64,
}

#[derive(Debug, Serialize)]
struct BotStatus {
    bot: Bot,
    in_progress_build: Option<Build>,
    last_completed_build: Option<Build>,
}

/// One build as returned by the coordinator API.
#[derive(Debug, Deserialize)]
struct RawBuild {
    number: u64,
    started_at: Option<f64>,
    complete_at: Option<f64>,
    /// See <https://buildbot.readthedocs.io/en/latest/developer/results.html>
    results: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct BuildsResponse {
    builds: Vec<RawBuild>,
}

fn tracked_bots() -> Vec<Bot> {
    use Environment::{Production, Staging};

    vec![
        Bot::new(210, "clang-riscv-gauntlet", Staging, "Rapidly tests a range of configs (rva20, rva22, rva23, rva23-evl, rva23-mrvv-vec-bits), relying on other bots for more detailed tests"),
        Bot::new(87, "clang-riscv-rva20-2stage", Production, "Cross-compiled Clang, from x86_64 host to RVA20, with check-all and llvm-test-suite running under qemu-system"),
        Bot::new(26, "clang-riscv-rva23-2stage", Staging, "RVA23 clang two-stage bootstrap and check-all running fully in qemu-system"),
        Bot::new(213, "clang-riscv-rva23-zvl512b-2stage", Staging, "Cross-compiled Clang, from x86_64 host to rva23u64_zvl512b, with check-all and llvm-test-suite running under qemu-system"),
        Bot::new(212, "clang-riscv-rva23-zvl1024b-2stage", Staging, "Cross-compiled Clang, from x86_64 host to rva23u64_zvl1024b, with check-all and llvm-test-suite running under qemu-system"),
        Bot::new(215, "clang-riscv-x60-mrvv-vec-bits-2stage", Staging, "Cross-compiled Clang, from x86_64 host to -mcpu=spacemit-x60 -mrvv-vec-bits=zvl, with check-all and llvm-test-suite running under qemu-system"),
        Bot::new(132, "clang-riscv-rva23-evl-vec-2stage", Production, "Cross-compiled Clang, from x86_64 host to RVA23 (with evl tail folding force enabled), with check-all and llvm-test-suite running under qemu-system"),
        Bot::new(188, "libc-riscv64-debian-dbg", Production, "LLVM libc RV64 build and tests running on physical hardware"),
        Bot::new(183, "libc-riscv64-debian-fullbuild-dbg", Production, "LLVM libc RV64 build and tests running on physical hardware"),
        Bot::new(196, "libc-riscv32-qemu-yocto-fullbuild-dbg", Production, "LLVM libc RV32 build and tests running by transferring each test to a Yocto build on qemu-system emulating RV32"),
    ]
}

fn fetch_builds(client: &reqwest::blocking::Client, bot: &Bot) -> anyhow::Result<Vec<RawBuild>> {
    let url = format!(
        "{}/api/v2/builders/{}/builds?limit=2&order=-number",
        bot.environment.base_url(),
        bot.name
    );
    let response: BuildsResponse = client
        .get(&url)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.json())
        .with_context(|| format!("fetching {url}"))?;

    Ok(response.builds)
}

fn to_build(bot: &Bot, raw: &RawBuild, now: i64) -> Build {
    let result = match raw.results {
        None => BuildResult::InProgress,
        Some(0) | Some(1) => BuildResult::Pass,
        Some(2) => BuildResult::Fail,
        Some(_) => BuildResult::Other,
    };
    let started_at = raw.started_at.unwrap_or(0.0) as i64;

    Build {
        id: raw.number,
        url: format!("{}/builds/{}", bot.url, raw.number),
        started_at,
        finished_at: raw.complete_at.map(|at| at as i64),
        result,
        elapsed: now - started_at,
    }
}

/// Derive the status of a bot from its most recent builds, newest first.
///
/// A build in progress is shown beside the build that completed before
/// it; otherwise only the most recent completed build is shown.
fn bot_status(bot: Bot, builds: &[RawBuild], now: i64) -> BotStatus {
    match builds {
        [] => BotStatus {
            bot,
            in_progress_build: None,
            last_completed_build: None,
        },
        [newest] => {
            let newest = to_build(&bot, newest, now);
            if newest.result == BuildResult::InProgress {
                BotStatus {
                    bot,
                    in_progress_build: Some(newest),
                    last_completed_build: None,
                }
            } else {
                BotStatus {
                    bot,
                    in_progress_build: None,
                    last_completed_build: Some(newest),
                }
            }
        }
        [newest, previous, ..] => {
            let first = to_build(&bot, newest, now);
            if first.result == BuildResult::InProgress {
                let previous = to_build(&bot, previous, now);
                BotStatus {
                    bot,
                    in_progress_build: Some(first),
                    last_completed_build: Some(previous),
                }
            } else {
                BotStatus {
                    bot,
                    in_progress_build: None,
                    last_completed_build: Some(first),
                }
            }
        }
    }
}

/// Format a duration in seconds as `42s`, `5m` or `1h5m`.
fn ago(args: &[Value]) -> Result<Value, Error> {
    let seconds = match args {
        [value] => value.as_i64(),
        _ => None,
    };
    let Some(seconds) = seconds else {
        return Err(Error::build("function `ago` requires one integer argument"));
    };

    let seconds = seconds.max(0);
    if seconds < 60 {
        return Ok(json!(format!("{seconds}s")));
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return Ok(json!(format!("{minutes}m")));
    }

    Ok(json!(format!("{}h{}m", minutes / 60, minutes % 60)))
}

/// Format a unix timestamp as `%Y-%m-%d %H:%M`, in UTC.
fn utc(args: &[Value]) -> Result<Value, Error> {
    let timestamp = match args {
        [value] => value.as_i64(),
        _ => None,
    };
    let Some(timestamp) = timestamp else {
        return Err(Error::build("function `utc` requires one integer argument"));
    };

    let Some(moment) = DateTime::<Utc>::from_timestamp(timestamp, 0) else {
        return Err(Error::build("function `utc` received an out of range timestamp"));
    };

    Ok(json!(moment.format("%Y-%m-%d %H:%M").to_string()))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(cli.timeout))
        .build()
        .context("building http client")?;
    let now = Utc::now().timestamp();

    let mut statuses = Vec::new();
    for bot in tracked_bots() {
        let status = match fetch_builds(&client, &bot) {
            Ok(builds) => bot_status(bot, &builds, now),
            Err(error) => {
                tracing::warn!("error fetching data: {error:#}");
                bot_status(bot, &[], now)
            }
        };
        statuses.push(status);
    }

    let engine = Engine::default()
        .with_function_must("ago", ago)
        .with_function_must("utc", utc);
    let template = engine
        .compile_named("status.html", include_str!("../../templates/status.html"))
        .map_err(|error| anyhow::anyhow!("{error:#}"))?;
    let scope = Scope::new()
        .with_must("bot_statuses", &statuses)
        .with_must("generated_at", now);
    let page = engine
        .render(&template, &scope)
        .map_err(|error| anyhow::anyhow!("{error:#}"))?;

    match cli.output {
        Some(path) => {
            fs::write(&path, &page).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!("wrote {}", path.display());
        }
        None => print!("{page}"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ago, bot_status, to_build, utc, Bot, BuildResult, Environment, RawBuild};
    use serde_json::json;

    fn raw(number: u64, results: Option<i64>) -> RawBuild {
        RawBuild {
            number,
            started_at: Some(1_700_000_000.0),
            complete_at: results.map(|_| 1_700_003_600.0),
            results,
        }
    }

    fn bot() -> Bot {
        Bot::new(26, "clang-riscv-rva23-2stage", Environment::Staging, "test bot")
    }

    #[test]
    fn test_bot_url() {
        assert_eq!(bot().url, "https://lab.llvm.org/staging/#/builders/26");
    }

    #[test]
    fn test_result_mapping() {
        let now = 1_700_000_100;
        assert_eq!(to_build(&bot(), &raw(1, None), now).result, BuildResult::InProgress);
        assert_eq!(to_build(&bot(), &raw(1, Some(0)), now).result, BuildResult::Pass);
        assert_eq!(to_build(&bot(), &raw(1, Some(1)), now).result, BuildResult::Pass);
        assert_eq!(to_build(&bot(), &raw(1, Some(2)), now).result, BuildResult::Fail);
        assert_eq!(to_build(&bot(), &raw(1, Some(5)), now).result, BuildResult::Other);
    }

    #[test]
    fn test_build_url_and_elapsed() {
        let build = to_build(&bot(), &raw(42, None), 1_700_000_100);

        assert_eq!(build.url, "https://lab.llvm.org/staging/#/builders/26/builds/42");
        assert_eq!(build.elapsed, 100);
    }

    #[test]
    fn test_status_no_builds() {
        let status = bot_status(bot(), &[], 0);

        assert!(status.in_progress_build.is_none());
        assert!(status.last_completed_build.is_none());
    }

    #[test]
    fn test_status_in_progress_with_previous() {
        let status = bot_status(bot(), &[raw(8, None), raw(7, Some(0))], 1_700_000_100);

        assert_eq!(status.in_progress_build.unwrap().id, 8);
        assert_eq!(status.last_completed_build.unwrap().id, 7);
    }

    #[test]
    fn test_status_completed_hides_older() {
        let status = bot_status(bot(), &[raw(8, Some(2)), raw(7, Some(0))], 1_700_000_100);

        assert!(status.in_progress_build.is_none());
        assert_eq!(status.last_completed_build.unwrap().id, 8);
    }

    #[test]
    fn test_status_single_in_progress() {
        let status = bot_status(bot(), &[raw(1, None)], 1_700_000_100);

        assert_eq!(status.in_progress_build.unwrap().id, 1);
        assert!(status.last_completed_build.is_none());
    }

    #[test]
    fn test_ago() {
        assert_eq!(ago(&[json!(42)]).unwrap(), json!("42s"));
        assert_eq!(ago(&[json!(300)]).unwrap(), json!("5m"));
        assert_eq!(ago(&[json!(3900)]).unwrap(), json!("1h5m"));
        assert_eq!(ago(&[json!(-5)]).unwrap(), json!("0s"));
        assert!(ago(&[json!("nope")]).is_err());
    }

    #[test]
    fn test_utc() {
        assert_eq!(utc(&[json!(0)]).unwrap(), json!("1970-01-01 00:00"));
        assert!(utc(&[]).is_err());
    }

    #[test]
    fn test_page_renders() {
        use lino::{Engine, Scope};

        let engine = Engine::default()
            .with_function_must("ago", ago)
            .with_function_must("utc", utc);
        let template = engine
            .compile_named("status.html", include_str!("../../templates/status.html"))
            .unwrap();
        let statuses = vec![
            bot_status(bot(), &[raw(8, None), raw(7, Some(0))], 1_700_000_100),
            bot_status(bot(), &[], 0),
        ];
        let scope = Scope::new()
            .with_must("bot_statuses", &statuses)
            .with_must("generated_at", 1_700_000_100);

        let page = engine.render(&template, &scope).unwrap();
        assert!(page.contains("clang-riscv-rva23-2stage"));
        assert!(page.contains("status-pass"));
        assert!(page.contains("#8"));
        assert!(page.contains("2023-11-14"));
    }
}
