//! The individual probe checks.

use std::io::Write;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use super::{Outcome, Probe, Tone};
use crate::error::AdminError;
use crate::store::scan_keys;

/// Patterns wiped before the storage check
pub const CLEANUP_PATTERNS: [&str; 5] = [
    "*detector*",
    "*remotecv*",
    "*detection*",
    "*face*",
    "*feature*",
];

/// Named patterns searched by the key analysis
pub const KEY_PATTERNS: [(&str, &str); 7] = [
    ("Detector", "thumbor:*detector*"),
    ("RemoteCV", "*remotecv*"),
    ("Detection", "*detection*"),
    ("Face", "*face*"),
    ("Feature", "*feature*"),
    ("Queue", "queued*"),
    ("Storage", "*storage*detector*"),
];

const SAMPLES_PER_PATTERN: usize = 2;
const KEY_DISPLAY_WIDTH: usize = 50;

/// Warm request must take less than this share of the cold one
const CACHE_SPEEDUP_RATIO: f64 = 0.7;

/// Human form of a TTL reply.
pub fn describe_ttl(ttl: i64) -> String {
    match ttl {
        t if t > 0 => format!("TTL: {t}s"),
        -1 => "No TTL".to_string(),
        _ => "Expired".to_string(),
    }
}

/// First 50 characters of `key`.
pub fn truncate_key(key: &str) -> String {
    key.chars().take(KEY_DISPLAY_WIDTH).collect()
}

/// Percent speedup of `second` over `first`, or `None` when the second
/// request was not fast enough to count as served from cache.
pub fn compare_timings(first: Duration, second: Duration) -> Option<f64> {
    let first = first.as_secs_f64();
    let second = second.as_secs_f64();
    if second < first * CACHE_SPEEDUP_RATIO {
        Some((1.0 - second / first) * 100.0)
    } else {
        None
    }
}

impl<W: Write> Probe<W> {
    pub(super) async fn check_connection(&mut self) -> anyhow::Result<Outcome> {
        self.console.line(Tone::Heading, "\n1. Testing Redis connection...")?;

        match self.store.ping().await {
            Ok(()) => {
                self.console.line(Tone::Pass, "   ✓ Redis connected")?;
                Ok(Outcome::Passed)
            }
            Err(err) => {
                self.console
                    .line(Tone::Fail, &format!("   ✗ Redis connection failed: {err}"))?;
                Ok(Outcome::Failed)
            }
        }
    }

    pub(super) async fn clear_detection_data(&mut self) -> anyhow::Result<()> {
        self.console
            .line(Tone::Heading, "\n2. Clearing existing detection data...")?;

        let mut removed = 0;
        for pattern in CLEANUP_PATTERNS {
            let keys = scan_keys(self.store.as_ref(), pattern, None).await?;
            if !keys.is_empty() {
                removed += self.store.del(&keys).await?;
            }
        }
        tracing::debug!(removed, "detection data cleared");

        self.console
            .line(Tone::Pass, &format!("   ✓ Cleared {removed} detection keys"))?;
        Ok(())
    }

    pub(super) async fn check_detection_storage(&mut self) -> anyhow::Result<Outcome> {
        self.console
            .line(Tone::Heading, "\n3. Testing detection storage...")?;

        let initial = self.store.dbsize().await?;
        self.console
            .line(Tone::Info, &format!("   Initial keys in Redis: {initial}"))?;

        let url = self.args.smart_crop_url("300x300", &self.args.faces_image);
        self.console
            .line(Tone::Info, "   Requesting image with smart cropping...")?;

        match self.fetcher.fetch(&url).await {
            Ok(200) => {}
            Ok(status) => {
                self.console
                    .line(Tone::Fail, &format!("   ✗ Request failed with status {status}"))?;
                return Ok(Outcome::Failed);
            }
            Err(err) => {
                self.console
                    .line(Tone::Fail, &format!("   ✗ Request failed: {err}"))?;
                return Ok(Outcome::Failed);
            }
        }

        self.console.line(Tone::Info, "   Waiting for detection...")?;
        sleep(Duration::from_secs(self.args.detection_wait_secs)).await;

        let after = self.store.dbsize().await?;
        self.console
            .line(Tone::Info, &format!("   Keys after detection: {after}"))?;

        if after > initial {
            self.console.line(
                Tone::Pass,
                &format!("   ✓ Detection created {} new keys", after - initial),
            )?;
            Ok(Outcome::Passed)
        } else {
            self.console.line(
                Tone::Fail,
                "   ✗ No new keys created - detector may not be using Redis",
            )?;
            Ok(Outcome::Failed)
        }
    }

    pub(super) async fn analyze_detection_keys(&mut self) -> anyhow::Result<Outcome> {
        self.console
            .line(Tone::Heading, "\n4. Analyzing detection keys...")?;

        let mut found_any = false;
        for (name, pattern) in KEY_PATTERNS {
            let keys = scan_keys(self.store.as_ref(), pattern, None).await?;
            if keys.is_empty() {
                self.console
                    .line(Tone::Info, &format!("   ○ {name}: No keys found"))?;
                continue;
            }

            found_any = true;
            self.console
                .line(Tone::Pass, &format!("   ✓ {name}: Found {} keys", keys.len()))?;
            for key in keys.iter().take(SAMPLES_PER_PATTERN) {
                let key_type = self.store.key_type(key).await?;
                let ttl = self.store.ttl(key).await?;
                self.console.line(
                    Tone::Info,
                    &format!(
                        "      - {}... (Type: {key_type}, {})",
                        truncate_key(key),
                        describe_ttl(ttl)
                    ),
                )?;
            }
        }

        Ok(if found_any {
            Outcome::Passed
        } else {
            Outcome::Failed
        })
    }

    /// Times one request; `None` when it did not answer 200.
    async fn timed_fetch(&mut self, url: &str, label: &str) -> anyhow::Result<Option<Duration>> {
        let start = Instant::now();
        let result = self.fetcher.fetch(url).await;
        let elapsed = start.elapsed();

        match result {
            Ok(200) => Ok(Some(elapsed)),
            Ok(status) => {
                self.console.line(
                    Tone::Fail,
                    &format!("   ✗ {label} request failed with status {status}"),
                )?;
                Ok(None)
            }
            Err(err) => {
                self.console
                    .line(Tone::Fail, &format!("   ✗ {label} request failed: {err}"))?;
                Ok(None)
            }
        }
    }

    pub(super) async fn check_caching(&mut self) -> anyhow::Result<Outcome> {
        self.console
            .line(Tone::Heading, "\n5. Testing detection caching...")?;

        let url = self
            .args
            .smart_crop_url("400x400", &self.args.landscape_image);

        self.console
            .line(Tone::Info, "   First request (detection should occur)...")?;
        let Some(first) = self.timed_fetch(&url, "First").await? else {
            return Ok(Outcome::Failed);
        };

        sleep(Duration::from_secs(self.args.settle_wait_secs)).await;

        self.console
            .line(Tone::Info, "   Second request (should use cache)...")?;
        let Some(second) = self.timed_fetch(&url, "Second").await? else {
            return Ok(Outcome::Failed);
        };

        self.console.line(
            Tone::Info,
            &format!("   First request: {:.3}s", first.as_secs_f64()),
        )?;
        self.console.line(
            Tone::Info,
            &format!("   Second request: {:.3}s", second.as_secs_f64()),
        )?;

        match compare_timings(first, second) {
            Some(speedup) => {
                self.console.line(
                    Tone::Pass,
                    &format!("   ✓ Caching working ({speedup:.0}% faster)"),
                )?;
                Ok(Outcome::Passed)
            }
            None => {
                self.console.line(
                    Tone::Warn,
                    "   ⚠ Similar request times (caching may not be effective)",
                )?;
                Ok(Outcome::Inconclusive)
            }
        }
    }

    pub(super) async fn check_service(&mut self) -> anyhow::Result<Outcome> {
        self.console
            .line(Tone::Heading, "\n6. Checking detector service...")?;

        let service = self.args.service.clone();
        match self.services.status(&service).await {
            Ok(status) if status.contains("RUNNING") => {
                self.console
                    .line(Tone::Pass, &format!("   ✓ {service} service is running"))?;
                Ok(Outcome::Passed)
            }
            Ok(status) => {
                self.console
                    .line(Tone::Fail, &format!("   ✗ {service} service is not running"))?;
                self.console
                    .line(Tone::Info, &format!("   Status: {}", status.trim()))?;
                Ok(Outcome::Failed)
            }
            Err(err) => {
                self.console.line(
                    Tone::Warn,
                    &format!("   ⚠ Could not check service status: {err}"),
                )?;
                Ok(Outcome::Inconclusive)
            }
        }
    }

    pub(super) async fn show_redis_stats(&mut self) -> anyhow::Result<()> {
        self.console.line(Tone::Heading, "\n7. Redis statistics...")?;

        let store = self.store.clone();
        let sections = async {
            let memory = store.info(Some("memory")).await?;
            let stats = store.info(Some("stats")).await?;
            Ok::<_, AdminError>((memory, stats))
        }
        .await;

        let (memory, stats) = match sections {
            Ok(sections) => sections,
            Err(err) => {
                self.console
                    .line(Tone::Fail, &format!("   ✗ Could not get Redis stats: {err}"))?;
                return Ok(());
            }
        };

        let field = |value: Option<&str>, fallback: &'static str| value.unwrap_or(fallback).to_string();
        let lines = [
            format!("   Memory used: {}", field(memory.get("used_memory_human"), "N/A")),
            format!("   Memory peak: {}", field(memory.get("used_memory_peak_human"), "N/A")),
            format!(
                "   Memory fragmentation ratio: {}",
                field(memory.get("mem_fragmentation_ratio"), "N/A")
            ),
            format!(
                "   Total connections: {}",
                field(stats.get("total_connections_received"), "0")
            ),
            format!(
                "   Commands processed: {}",
                field(stats.get("total_commands_processed"), "0")
            ),
            format!("   Keys evicted: {}", field(stats.get("evicted_keys"), "0")),
        ];
        for line in &lines {
            self.console.line(Tone::Info, line)?;
        }
        Ok(())
    }
}
