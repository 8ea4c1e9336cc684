// Local metric acquisition via sysinfo, plus a TCP connect latency probe.

use crate::models::MetricSample;
use std::sync::Arc;
use std::time::{Duration, Instant};
use sysinfo::{Disks, System};
use thiserror::Error;
use tokio::net::TcpStream;
use tracing::instrument;

/// Floor for the pause between the two CPU refreshes; below this sysinfo
/// cannot produce a meaningful usage delta.
const CPU_SAMPLE_PAUSE: Duration = Duration::from_millis(250);

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("collector task join: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("system clock: {0}")]
    Clock(#[from] std::time::SystemTimeError),
    #[error("sysinfo lock poisoned")]
    LockPoisoned,
}

pub struct Collector {
    sys: Arc<std::sync::Mutex<System>>,
    disks: Arc<std::sync::Mutex<Disks>>,
    ping_host: String,
    ping_port: u16,
    ping_timeout: Duration,
}

struct HostFigures {
    cpu_percent: f64,
    memory_percent: f64,
    memory_used_bytes: u64,
    memory_total_bytes: u64,
    disk_percent: f64,
    disk_used_bytes: u64,
    disk_total_bytes: u64,
    uptime_seconds: u64,
}

impl Collector {
    pub fn new(ping_host: String, ping_port: u16, ping_timeout: Duration) -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();
        let disks = Disks::new_with_refreshed_list();
        Self {
            sys: Arc::new(std::sync::Mutex::new(sys)),
            disks: Arc::new(std::sync::Mutex::new(disks)),
            ping_host,
            ping_port,
            ping_timeout,
        }
    }

    /// One full measurement cycle. A failed latency probe yields
    /// `network_latency_ms = None`, never an error.
    #[instrument(skip(self), fields(repo = "collector", operation = "sample"))]
    pub async fn sample(&self) -> Result<MetricSample, CollectError> {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)?
            .as_millis() as i64;

        let sys = self.sys.clone();
        let disks = self.disks.clone();
        let figures = tokio::task::spawn_blocking(move || gather_host_figures(&sys, &disks))
            .await??;

        let network_latency_ms = self.probe_latency().await;

        Ok(MetricSample {
            timestamp,
            cpu_percent: figures.cpu_percent,
            memory_percent: figures.memory_percent,
            memory_used_bytes: figures.memory_used_bytes,
            memory_total_bytes: figures.memory_total_bytes,
            disk_percent: figures.disk_percent,
            disk_used_bytes: figures.disk_used_bytes,
            disk_total_bytes: figures.disk_total_bytes,
            uptime_seconds: figures.uptime_seconds,
            network_latency_ms,
        })
    }

    /// TCP connect round-trip to the configured host, in milliseconds.
    /// Timeout is internal to the probe and capped by `ping_timeout`.
    async fn probe_latency(&self) -> Option<f64> {
        let addr = format!("{}:{}", self.ping_host, self.ping_port);
        let start = Instant::now();
        match tokio::time::timeout(self.ping_timeout, TcpStream::connect(&addr)).await {
            Ok(Ok(_stream)) => Some(start.elapsed().as_secs_f64() * 1000.0),
            Ok(Err(err)) => {
                tracing::debug!(address = %addr, error = %err, "latency probe failed");
                None
            }
            Err(_elapsed) => {
                tracing::debug!(address = %addr, "latency probe timeout");
                None
            }
        }
    }
}

fn gather_host_figures(
    sys: &std::sync::Mutex<System>,
    disks: &std::sync::Mutex<Disks>,
) -> Result<HostFigures, CollectError> {
    let mut sys = sys.lock().map_err(|_| CollectError::LockPoisoned)?;

    // Two refreshes with a pause in between; the usage delta between them
    // is the reading (the refresh-once value is always zero).
    sys.refresh_cpu_all();
    std::thread::sleep(CPU_SAMPLE_PAUSE.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL));
    sys.refresh_cpu_all();
    let cpu_percent = (sys.global_cpu_usage() as f64).clamp(0.0, 100.0);

    sys.refresh_memory();
    let memory_total_bytes = sys.total_memory();
    let available = sys.available_memory();
    let memory_used_bytes = memory_total_bytes.saturating_sub(available);
    let memory_percent = if memory_total_bytes > 0 {
        (memory_used_bytes as f64 / memory_total_bytes as f64) * 100.0
    } else {
        0.0
    };

    let mut disks_guard = disks.lock().map_err(|_| CollectError::LockPoisoned)?;
    disks_guard.refresh(false);
    // The root partition when present, otherwise the largest one.
    let target = disks_guard
        .list()
        .iter()
        .find(|d| d.mount_point() == std::path::Path::new("/"))
        .or_else(|| disks_guard.list().iter().max_by_key(|d| d.total_space()));
    let (disk_total_bytes, disk_used_bytes) = match target {
        Some(d) => {
            let total = d.total_space();
            (total, total.saturating_sub(d.available_space()))
        }
        None => (0, 0),
    };
    let disk_percent = if disk_total_bytes > 0 {
        (disk_used_bytes as f64 / disk_total_bytes as f64) * 100.0
    } else {
        0.0
    };

    Ok(HostFigures {
        cpu_percent,
        memory_percent,
        memory_used_bytes,
        memory_total_bytes,
        disk_percent,
        disk_used_bytes,
        disk_total_bytes,
        uptime_seconds: System::uptime(),
    })
}
