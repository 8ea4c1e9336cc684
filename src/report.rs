// Report rendering: a sample set plus its summary into json, csv or text.
// Presentation rounding (2 decimals) happens here, not in the aggregation.

use crate::models::{MetricSample, Summary};
use chrono::Local;
use serde_json::json;

const BANNER_WIDTH: usize = 70;
const RECENT_RECORDS: usize = 10;
const BYTES_PER_GB: f64 = 1_073_741_824.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    Json,
    Csv,
    Text,
}

/// Renders `samples` (newest first) and their `summary` in the requested
/// format. The empty-input cases are owned here: csv/text degrade to a
/// "No data available" line, json stays a valid zero-record document.
pub fn render(
    samples: &[MetricSample],
    summary: &Summary,
    format: ReportFormat,
) -> anyhow::Result<String> {
    match format {
        ReportFormat::Json => render_json(samples, summary),
        ReportFormat::Csv => Ok(render_csv(samples)),
        ReportFormat::Text => Ok(render_text(samples, summary)),
    }
}

fn render_json(samples: &[MetricSample], summary: &Summary) -> anyhow::Result<String> {
    let mut report = json!({
        "generated_at": Local::now().to_rfc3339(),
        "total_records": samples.len(),
        "statistics": samples,
    });
    if !samples.is_empty() {
        report["summary"] = summary_json(summary);
    }
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Rounded summary block, shared with the webhook digest payload.
pub(crate) fn summary_json(summary: &Summary) -> serde_json::Value {
    json!({
        "cpu": {
            "avg": round2(summary.cpu.avg),
            "min": round2(summary.cpu.min),
            "max": round2(summary.cpu.max),
        },
        "memory": {
            "avg": round2(summary.memory.avg),
            "min": round2(summary.memory.min),
            "max": round2(summary.memory.max),
        },
        "disk": {
            "avg": round2(summary.disk.avg),
            "min": round2(summary.disk.min),
            "max": round2(summary.disk.max),
        },
        "network": {
            "avg": summary.network.avg.map(round2),
            "min": summary.network.min.map(round2),
            "max": summary.network.max.map(round2),
        },
    })
}

fn render_csv(samples: &[MetricSample]) -> String {
    if samples.is_empty() {
        return "No data available".into();
    }
    let mut out = String::from(
        "timestamp,cpu_percent,memory_percent,memory_used_bytes,memory_total_bytes,\
         disk_percent,disk_used_bytes,disk_total_bytes,uptime_seconds,network_latency_ms\n",
    );
    for s in samples {
        let latency = s
            .network_latency_ms
            .map(|v| v.to_string())
            .unwrap_or_default();
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{}\n",
            s.timestamp,
            s.cpu_percent,
            s.memory_percent,
            s.memory_used_bytes,
            s.memory_total_bytes,
            s.disk_percent,
            s.disk_used_bytes,
            s.disk_total_bytes,
            s.uptime_seconds,
            latency,
        ));
    }
    out
}

fn render_text(samples: &[MetricSample], summary: &Summary) -> String {
    if samples.is_empty() {
        return "No data available".into();
    }

    let mut lines: Vec<String> = Vec::new();
    lines.push("=".repeat(BANNER_WIDTH));
    lines.push("SYSPULSE SYSTEM STATISTICS REPORT".into());
    lines.push("=".repeat(BANNER_WIDTH));
    lines.push(format!(
        "Generated: {}",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    lines.push(format!("Total Records: {}", samples.len()));
    lines.push(String::new());

    lines.push("SUMMARY (All Records)".into());
    lines.push("-".repeat(BANNER_WIDTH));
    lines.push(format!(
        "CPU Usage:        Avg: {:.2}%  Min: {:.2}%  Max: {:.2}%",
        summary.cpu.avg, summary.cpu.min, summary.cpu.max
    ));
    lines.push(format!(
        "Memory Usage:     Avg: {:.2}%  Min: {:.2}%  Max: {:.2}%",
        summary.memory.avg, summary.memory.min, summary.memory.max
    ));
    lines.push(format!(
        "Disk Usage:       Avg: {:.2}%  Min: {:.2}%  Max: {:.2}%",
        summary.disk.avg, summary.disk.min, summary.disk.max
    ));
    if let (Some(avg), Some(min), Some(max)) =
        (summary.network.avg, summary.network.min, summary.network.max)
    {
        lines.push(format!(
            "Network Latency:  Avg: {:.2}ms  Min: {:.2}ms  Max: {:.2}ms",
            avg, min, max
        ));
    }
    lines.push(String::new());

    lines.push(format!("RECENT RECORDS (Last {})", RECENT_RECORDS));
    lines.push("-".repeat(BANNER_WIDTH));
    for s in samples.iter().take(RECENT_RECORDS) {
        lines.push(String::new());
        lines.push(format!("Timestamp: {}", format_timestamp(s.timestamp)));
        lines.push(format!("  CPU:     {:.2}%", s.cpu_percent));
        lines.push(format!(
            "  Memory:  {:.2}% ({:.2}GB / {:.2}GB)",
            s.memory_percent,
            s.memory_used_bytes as f64 / BYTES_PER_GB,
            s.memory_total_bytes as f64 / BYTES_PER_GB,
        ));
        lines.push(format!(
            "  Disk:    {:.2}% ({:.2}GB / {:.2}GB)",
            s.disk_percent,
            s.disk_used_bytes as f64 / BYTES_PER_GB,
            s.disk_total_bytes as f64 / BYTES_PER_GB,
        ));
        lines.push(format!("  Uptime:  {}", format_uptime(s.uptime_seconds)));
        match s.network_latency_ms {
            Some(latency) => lines.push(format!("  Network: {:.2}ms", latency)),
            None => lines.push("  Network: N/A".into()),
        }
    }

    lines.push(String::new());
    lines.push("=".repeat(BANNER_WIDTH));
    lines.join("\n")
}

/// Days/hours/minutes by integer division; zero-valued units are omitted
/// and seconds are never shown. All components zero renders "0m".
pub fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    if parts.is_empty() {
        "0m".into()
    } else {
        parts.join(" ")
    }
}

/// Half-up rounding to two decimal digits, for rendered aggregates.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn format_timestamp(epoch_ms: i64) -> String {
    match chrono::DateTime::from_timestamp_millis(epoch_ms) {
        Some(dt) => dt
            .with_timezone(&Local)
            .format("%Y-%m-%dT%H:%M:%S")
            .to_string(),
        None => epoch_ms.to_string(),
    }
}
