//! Detection Cache Probe
//!
//! Checks that an image server's remote detector stores its results in
//! Redis: scans detector key patterns, requests smart-cropped images, and
//! compares timings of a cold and a warm request.

mod checks;
mod fetch;
mod report;
mod service;

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use crate::config::Config;
use crate::store::{KeyStore, RedisStore};

pub use checks::{compare_timings, describe_ttl, truncate_key, CLEANUP_PATTERNS, KEY_PATTERNS};
pub use fetch::{HttpFetcher, ImageFetcher};
pub use report::{Console, Tone};
pub use service::{ServiceMonitor, Supervisorctl};

const FACES_IMAGE: &str =
    "https://upload.wikimedia.org/wikipedia/commons/thumb/3/33/Cscr-featured.png/240px-Cscr-featured.png";
const LANDSCAPE_IMAGE: &str = "https://upload.wikimedia.org/wikipedia/commons/thumb/5/5e/Domestic_cat_in_the_grass.jpg/800px-Domestic_cat_in_the_grass.jpg";

/// Command line of `cache_probe`.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "cache_probe",
    version,
    about = "Checks that the image server's detector caches its results in Redis"
)]
pub struct ProbeArgs {
    #[arg(long, env = "REDIS_SERVER_HOST", default_value = "localhost")]
    pub redis_host: String,

    #[arg(long, env = "REDIS_SERVER_PORT", default_value_t = 6379)]
    pub redis_port: u16,

    #[arg(long, env = "REDIS_SERVER_DB", default_value_t = 0)]
    pub redis_db: i64,

    /// Base URL of the image server
    #[arg(long, env = "IMAGE_SERVER_URL", default_value = "http://localhost:8080")]
    pub image_server: String,

    /// Image used to trigger face detection
    #[arg(long, default_value = FACES_IMAGE)]
    pub faces_image: String,

    /// Image used for the cold/warm timing comparison
    #[arg(long, default_value = LANDSCAPE_IMAGE)]
    pub landscape_image: String,

    /// Seconds to wait for the detector after the first request
    #[arg(long, default_value_t = 3)]
    pub detection_wait_secs: u64,

    /// Seconds between the cold and the warm request
    #[arg(long, default_value_t = 1)]
    pub settle_wait_secs: u64,

    #[arg(long, default_value_t = 10)]
    pub request_timeout_secs: u64,

    /// Supervisor program name of the detector
    #[arg(long, default_value = "remotecv")]
    pub service: String,
}

impl ProbeArgs {
    /// Redis settings in the form the store expects.
    pub fn redis_config(&self) -> Config {
        Config {
            redis_host: self.redis_host.clone(),
            redis_port: self.redis_port,
            redis_db: self.redis_db,
            pool_size: 2,
            ..Config::default()
        }
    }

    /// `{server}/unsafe/{size}/smart/{image}`
    pub fn smart_crop_url(&self, size: &str, image: &str) -> String {
        format!(
            "{}/unsafe/{size}/smart/{image}",
            self.image_server.trim_end_matches('/')
        )
    }
}

// == Outcomes ==
/// Result of one scored check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed,
    /// Could not decide either way; never fails the run
    Inconclusive,
}

/// The scored checks, in run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    RedisConnection,
    DetectionStorage,
    DetectionKeys,
    Caching,
    DetectorService,
}

impl Check {
    pub fn label(&self) -> &'static str {
        match self {
            Check::RedisConnection => "redis_connection",
            Check::DetectionStorage => "detection_storage",
            Check::DetectionKeys => "detection_keys",
            Check::Caching => "caching",
            Check::DetectorService => "detector_service",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckResult {
    pub check: Check,
    pub outcome: Outcome,
}

/// Outcomes of a probe run.
#[derive(Debug, Clone, Default)]
pub struct ProbeReport {
    pub results: Vec<CheckResult>,
}

impl ProbeReport {
    pub fn record(&mut self, check: Check, outcome: Outcome) {
        self.results.push(CheckResult { check, outcome });
    }

    pub fn outcome(&self, check: Check) -> Option<Outcome> {
        self.results
            .iter()
            .find(|r| r.check == check)
            .map(|r| r.outcome)
    }

    /// Every check passed outright.
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.outcome == Outcome::Passed)
    }

    pub fn any_passed(&self) -> bool {
        self.results.iter().any(|r| r.outcome == Outcome::Passed)
    }

    /// 0 when no check failed, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.results.iter().any(|r| r.outcome == Outcome::Failed) {
            1
        } else {
            0
        }
    }
}

// == Probe ==
/// One diagnostic run against a store, an image server and a supervisor.
pub struct Probe<W: Write> {
    args: ProbeArgs,
    store: Arc<dyn KeyStore>,
    fetcher: Box<dyn ImageFetcher>,
    services: Box<dyn ServiceMonitor>,
    console: Console<W>,
}

impl<W: Write> Probe<W> {
    pub fn new(
        args: ProbeArgs,
        store: Arc<dyn KeyStore>,
        fetcher: Box<dyn ImageFetcher>,
        services: Box<dyn ServiceMonitor>,
        out: W,
    ) -> Self {
        Self {
            args,
            store,
            fetcher,
            services,
            console: Console::new(out),
        }
    }

    /// Runs every check in order and prints the summary.
    ///
    /// Stops right after the connection check when Redis is unreachable.
    pub async fn run(&mut self) -> anyhow::Result<ProbeReport> {
        let rule = "=".repeat(50);
        self.console.line(Tone::Banner, &format!("\n{rule}"))?;
        self.console
            .line(Tone::Banner, "Detection Cache Redis Integration Probe")?;
        self.console.line(Tone::Banner, &rule)?;

        let mut report = ProbeReport::default();

        let connected = self.check_connection().await?;
        report.record(Check::RedisConnection, connected);
        if connected != Outcome::Passed {
            self.console
                .line(Tone::Fail, "\n❌ Cannot continue without Redis connection")?;
            return Ok(report);
        }

        self.clear_detection_data().await?;
        let outcome = self.check_detection_storage().await?;
        report.record(Check::DetectionStorage, outcome);
        let outcome = self.analyze_detection_keys().await?;
        report.record(Check::DetectionKeys, outcome);
        let outcome = self.check_caching().await?;
        report.record(Check::Caching, outcome);
        let outcome = self.check_service().await?;
        report.record(Check::DetectorService, outcome);
        self.show_redis_stats().await?;

        report::print_summary(&mut self.console, &report, &self.args)?;
        Ok(report)
    }

    /// Consumes the probe, returning the output sink.
    pub fn into_output(self) -> W {
        self.console.into_inner()
    }
}

/// Runs the probe against the real services described by `args`, printing
/// to stdout.
pub async fn run(args: ProbeArgs) -> anyhow::Result<ProbeReport> {
    let store = RedisStore::connect(&args.redis_config())
        .context("Failed to create Redis connection")?;
    let fetcher = HttpFetcher::new(Duration::from_secs(args.request_timeout_secs))?;
    let services = Supervisorctl::new(Duration::from_secs(5));

    let mut probe = Probe::new(
        args,
        Arc::new(store),
        Box::new(fetcher),
        Box::new(services),
        std::io::stdout(),
    );
    probe.run().await
}

/// How a probe run ended.
#[derive(Debug)]
pub enum RunEnd {
    Completed(anyhow::Result<ProbeReport>),
    Interrupted,
}

/// Drives `run` until it completes or `interrupt` resolves with `Ok`.
///
/// An interrupt source that fails (no signal handler could be installed)
/// is ignored and the run goes on.
pub async fn run_until_interrupted<R, I>(run: R, interrupt: I) -> RunEnd
where
    R: std::future::Future<Output = anyhow::Result<ProbeReport>>,
    I: std::future::Future<Output = std::io::Result<()>>,
{
    tokio::select! {
        result = run => RunEnd::Completed(result),
        Ok(()) = interrupt => RunEnd::Interrupted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = ProbeArgs::parse_from(["cache_probe", "--image-server", "http://img:8080/"]);
        assert_eq!(args.detection_wait_secs, 3);
        assert_eq!(args.settle_wait_secs, 1);
        assert_eq!(args.service, "remotecv");
        assert_eq!(
            args.smart_crop_url("300x300", "http://x/a.png"),
            "http://img:8080/unsafe/300x300/smart/http://x/a.png"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_interrupt_source_does_not_end_run() {
        let run = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(ProbeReport::default())
        };
        let interrupt = async { Err(std::io::Error::other("no signal handler")) };

        let end = run_until_interrupted(run, interrupt).await;
        assert!(matches!(end, RunEnd::Completed(Ok(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_ends_run() {
        let run = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(ProbeReport::default())
        };
        let interrupt = async { Ok(()) };

        let end = run_until_interrupted(run, interrupt).await;
        assert!(matches!(end, RunEnd::Interrupted));
    }

    #[test]
    fn test_report_exit_code_ignores_inconclusive() {
        let mut report = ProbeReport::default();
        report.record(Check::RedisConnection, Outcome::Passed);
        report.record(Check::Caching, Outcome::Inconclusive);
        assert_eq!(report.exit_code(), 0);
        assert!(!report.all_passed());
        assert!(report.any_passed());

        report.record(Check::DetectorService, Outcome::Failed);
        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.outcome(Check::Caching), Some(Outcome::Inconclusive));
        assert_eq!(report.outcome(Check::DetectionKeys), None);
    }
}
