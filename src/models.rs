// Domain models: one measurement row plus the derived per-metric aggregates.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One measurement cycle. Immutable once persisted; rows are only ever
/// appended and bulk-deleted by timestamp range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    /// Epoch milliseconds at collection time.
    pub timestamp: i64,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub memory_used_bytes: u64,
    pub memory_total_bytes: u64,
    pub disk_percent: f64,
    pub disk_used_bytes: u64,
    pub disk_total_bytes: u64,
    pub uptime_seconds: u64,
    /// `None` = the probe failed or timed out; distinct from zero latency.
    pub network_latency_ms: Option<f64>,
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("timestamp must be positive, got {0}")]
    Timestamp(i64),
    #[error("{field} must be a finite value in 0..=100, got {value}")]
    PercentOutOfRange { field: &'static str, value: f64 },
    #[error("{field}: used ({used}) exceeds total ({total})")]
    UsedExceedsTotal {
        field: &'static str,
        used: u64,
        total: u64,
    },
    #[error("network_latency_ms must be a finite non-negative value, got {0}")]
    NegativeLatency(f64),
}

impl MetricSample {
    /// Range checks on an assembled sample. Callers validate before insert;
    /// the store itself only guards schema shape.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timestamp <= 0 {
            return Err(ValidationError::Timestamp(self.timestamp));
        }
        for (field, value) in [
            ("cpu_percent", self.cpu_percent),
            ("memory_percent", self.memory_percent),
            ("disk_percent", self.disk_percent),
        ] {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(ValidationError::PercentOutOfRange { field, value });
            }
        }
        if self.memory_used_bytes > self.memory_total_bytes {
            return Err(ValidationError::UsedExceedsTotal {
                field: "memory",
                used: self.memory_used_bytes,
                total: self.memory_total_bytes,
            });
        }
        if self.disk_used_bytes > self.disk_total_bytes {
            return Err(ValidationError::UsedExceedsTotal {
                field: "disk",
                used: self.disk_used_bytes,
                total: self.disk_total_bytes,
            });
        }
        if let Some(latency) = self.network_latency_ms {
            if !latency.is_finite() || latency < 0.0 {
                return Err(ValidationError::NegativeLatency(latency));
            }
        }
        Ok(())
    }
}

/// avg/min/max over one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricStat {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

/// avg/min/max over network latency. All fields are `None` when no sample
/// in the set carried a latency value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyStat {
    pub avg: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Derived aggregates over a sample set. Never persisted; recomputed from
/// the given samples on every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub cpu: MetricStat,
    pub memory: MetricStat,
    pub disk: MetricStat,
    pub network: LatencyStat,
}
