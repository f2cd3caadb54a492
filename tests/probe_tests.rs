//! Integration Tests for the Detection Cache Probe
//!
//! Drives full probe runs over an in-memory keyspace with a scripted image
//! server and supervisor.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;
use redis_admin::probe::{Check, ImageFetcher, Outcome, Probe, ProbeArgs, ServiceMonitor};
use redis_admin::{Config, KeyStore, MemoryStore, RedisStore};

// == Test Doubles ==

/// Image server whose detector writes one key per request.
struct FakeImageServer {
    store: MemoryStore,
    status: u16,
    writes_detections: bool,
    latencies: Mutex<VecDeque<Duration>>,
    requests: AtomicUsize,
}

impl FakeImageServer {
    fn new(store: MemoryStore, status: u16, writes_detections: bool, latencies: &[u64]) -> Self {
        Self {
            store,
            status,
            writes_detections,
            latencies: Mutex::new(latencies.iter().map(|ms| Duration::from_millis(*ms)).collect()),
            requests: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ImageFetcher for FakeImageServer {
    async fn fetch(&self, url: &str) -> anyhow::Result<u16> {
        assert!(url.contains("/unsafe/") && url.contains("/smart/"));
        let n = self.requests.fetch_add(1, Ordering::SeqCst);
        let latency = self
            .latencies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Duration::from_millis(50));
        tokio::time::sleep(latency).await;

        if self.writes_detections && self.status == 200 {
            self.store
                .set(&format!("thumbor:detector:{n}"), "[[10,20,30,40]]")
                .await?;
        }
        Ok(self.status)
    }
}

struct FakeSupervisor {
    reply: Option<&'static str>,
}

#[async_trait]
impl ServiceMonitor for FakeSupervisor {
    async fn status(&self, _service: &str) -> anyhow::Result<String> {
        match self.reply {
            Some(line) => Ok(line.to_string()),
            None => anyhow::bail!("supervisorctl: command not found"),
        }
    }
}

// == Helper Functions ==

fn probe_args() -> ProbeArgs {
    ProbeArgs::parse_from(["cache_probe", "--image-server", "http://images.test"])
}

fn running() -> FakeSupervisor {
    FakeSupervisor {
        reply: Some("remotecv                         RUNNING   pid 42, uptime 1:02:03\n"),
    }
}

fn output_text(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).unwrap()
}

// == Probe Run Tests ==

#[tokio::test(start_paused = true)]
async fn test_probe_all_checks_pass() {
    let store = MemoryStore::new();
    store.set("remotecv:stale", "old").await.unwrap();
    store.set("unrelated", "kept").await.unwrap();

    let server = FakeImageServer::new(store.clone(), 200, true, &[50, 1000, 200]);
    let mut probe = Probe::new(
        probe_args(),
        Arc::new(store.clone()),
        Box::new(server),
        Box::new(running()),
        Vec::new(),
    );

    let report = probe.run().await.unwrap();
    let text = output_text(probe.into_output());

    assert_eq!(report.outcome(Check::RedisConnection), Some(Outcome::Passed));
    assert_eq!(report.outcome(Check::DetectionStorage), Some(Outcome::Passed));
    assert_eq!(report.outcome(Check::DetectionKeys), Some(Outcome::Passed));
    assert_eq!(report.outcome(Check::Caching), Some(Outcome::Passed));
    assert_eq!(report.outcome(Check::DetectorService), Some(Outcome::Passed));
    assert!(report.all_passed());
    assert_eq!(report.exit_code(), 0);

    assert!(text.contains("Cleared 1 detection keys"));
    assert!(text.contains("Detector: Found 1 keys"));
    assert!(text.contains("No TTL"));
    assert!(text.contains("80% faster"));
    assert!(text.contains("TEST SUMMARY"));
    assert!(text.contains("properly using Redis"));

    assert_eq!(store.get("unrelated").await.unwrap().as_deref(), Some("kept"));
    assert_eq!(store.get("remotecv:stale").await.unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn test_probe_similar_timings_are_inconclusive() {
    let store = MemoryStore::new();
    let server = FakeImageServer::new(store.clone(), 200, true, &[50, 500, 450]);
    let mut probe = Probe::new(
        probe_args(),
        Arc::new(store),
        Box::new(server),
        Box::new(FakeSupervisor { reply: None }),
        Vec::new(),
    );

    let report = probe.run().await.unwrap();
    let text = output_text(probe.into_output());

    assert_eq!(report.outcome(Check::Caching), Some(Outcome::Inconclusive));
    assert_eq!(report.outcome(Check::DetectorService), Some(Outcome::Inconclusive));
    assert_eq!(report.exit_code(), 0);
    assert!(text.contains("Similar request times"));
    assert!(text.contains("Could not check service status"));
    assert!(text.contains("partially working"));
}

#[tokio::test(start_paused = true)]
async fn test_probe_failing_image_server() {
    let store = MemoryStore::new();
    let server = FakeImageServer::new(store.clone(), 500, true, &[]);
    let mut probe = Probe::new(
        probe_args(),
        Arc::new(store.clone()),
        Box::new(server),
        Box::new(FakeSupervisor {
            reply: Some("remotecv                         STOPPED   Not started\n"),
        }),
        Vec::new(),
    );

    let report = probe.run().await.unwrap();
    let text = output_text(probe.into_output());

    assert_eq!(report.outcome(Check::RedisConnection), Some(Outcome::Passed));
    assert_eq!(report.outcome(Check::DetectionStorage), Some(Outcome::Failed));
    assert_eq!(report.outcome(Check::DetectionKeys), Some(Outcome::Failed));
    assert_eq!(report.outcome(Check::Caching), Some(Outcome::Failed));
    assert_eq!(report.outcome(Check::DetectorService), Some(Outcome::Failed));
    assert_eq!(report.exit_code(), 1);

    assert!(text.contains("Request failed with status 500"));
    assert!(text.contains("Status: remotecv"));
    assert!(text.contains("partially working"));
    assert!(text.contains("detection_storage: failed"));
    assert_eq!(store.dbsize().await.unwrap(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_probe_detector_not_writing() {
    let store = MemoryStore::new();
    let server = FakeImageServer::new(store.clone(), 200, false, &[50, 800, 100]);
    let mut probe = Probe::new(
        probe_args(),
        Arc::new(store),
        Box::new(server),
        Box::new(running()),
        Vec::new(),
    );

    let report = probe.run().await.unwrap();
    let text = output_text(probe.into_output());

    assert_eq!(report.outcome(Check::DetectionStorage), Some(Outcome::Failed));
    assert_eq!(report.outcome(Check::DetectionKeys), Some(Outcome::Failed));
    assert_eq!(report.outcome(Check::Caching), Some(Outcome::Passed));
    assert!(text.contains("No new keys created"));
    assert!(text.contains("Detector: No keys found"));
    assert_eq!(report.exit_code(), 1);
}

#[tokio::test]
async fn test_probe_stops_without_redis() {
    let config = Config {
        redis_port: 1,
        pool_size: 1,
        ..Config::default()
    };
    let store = RedisStore::connect(&config).unwrap();
    let server = FakeImageServer::new(MemoryStore::new(), 200, true, &[]);
    let mut probe = Probe::new(
        probe_args(),
        Arc::new(store),
        Box::new(server),
        Box::new(running()),
        Vec::new(),
    );

    let report = probe.run().await.unwrap();
    let text = output_text(probe.into_output());

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.outcome(Check::RedisConnection), Some(Outcome::Failed));
    assert_eq!(report.exit_code(), 1);
    assert!(text.contains("Redis connection failed"));
    assert!(text.contains("Cannot continue without Redis connection"));
    assert!(!text.contains("TEST SUMMARY"));
}
