// Pure aggregation over a sample set. Arithmetic is left unrounded here;
// two-decimal rounding is applied where values are rendered.

use crate::models::{LatencyStat, MetricSample, MetricStat, Summary};

/// avg/min/max per metric over `samples`. Empty input yields zeroed stats
/// for cpu/memory/disk and an all-None network stat; latency values that
/// are absent are excluded from the network aggregate.
pub fn summarize(samples: &[MetricSample]) -> Summary {
    let cpu: Vec<f64> = samples.iter().map(|s| s.cpu_percent).collect();
    let memory: Vec<f64> = samples.iter().map(|s| s.memory_percent).collect();
    let disk: Vec<f64> = samples.iter().map(|s| s.disk_percent).collect();
    let latency: Vec<f64> = samples.iter().filter_map(|s| s.network_latency_ms).collect();

    Summary {
        cpu: stat_of(&cpu),
        memory: stat_of(&memory),
        disk: stat_of(&disk),
        network: latency_stat_of(&latency),
    }
}

fn stat_of(values: &[f64]) -> MetricStat {
    if values.is_empty() {
        return MetricStat {
            avg: 0.0,
            min: 0.0,
            max: 0.0,
        };
    }
    MetricStat {
        avg: mean_f64(values),
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    }
}

fn latency_stat_of(values: &[f64]) -> LatencyStat {
    if values.is_empty() {
        return LatencyStat::default();
    }
    LatencyStat {
        avg: Some(mean_f64(values)),
        min: Some(values.iter().copied().fold(f64::INFINITY, f64::min)),
        max: Some(values.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
    }
}

fn mean_f64(v: &[f64]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    v.iter().sum::<f64>() / (v.len() as f64)
}
