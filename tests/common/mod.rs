// Shared test helpers

use syspulse::models::MetricSample;

/// A valid sample at `timestamp` (epoch ms) with the given cpu reading.
pub fn sample_at(timestamp: i64, cpu_percent: f64) -> MetricSample {
    MetricSample {
        timestamp,
        cpu_percent,
        memory_percent: 50.0,
        memory_used_bytes: 8 * 1024 * 1024 * 1024,
        memory_total_bytes: 16 * 1024 * 1024 * 1024,
        disk_percent: 75.0,
        disk_used_bytes: 150 * 1024 * 1024 * 1024,
        disk_total_bytes: 200 * 1024 * 1024 * 1024,
        uptime_seconds: 86_400,
        network_latency_ms: Some(15.5),
    }
}

/// Same sample shape with no latency reading.
#[allow(dead_code)]
pub fn sample_without_latency(timestamp: i64, cpu_percent: f64) -> MetricSample {
    MetricSample {
        network_latency_ms: None,
        ..sample_at(timestamp, cpu_percent)
    }
}

#[allow(dead_code)]
pub fn now_epoch_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64
}
