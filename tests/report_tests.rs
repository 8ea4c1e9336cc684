// Reporter tests: json round-trip, csv shape, text layout, uptime formatting

mod common;

use common::{sample_at, sample_without_latency};
use syspulse::models::MetricSample;
use syspulse::report::{ReportFormat, format_uptime, render, round2};
use syspulse::summary::summarize;

#[test]
fn json_report_round_trips_samples() {
    let samples = vec![
        sample_at(3_000, 30.0),
        sample_at(2_000, 20.0),
        sample_without_latency(1_000, 10.0),
    ];
    let summary = summarize(&samples);
    let rendered = render(&samples, &summary, ReportFormat::Json).unwrap();

    let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(value["total_records"], 3);
    assert!(value["generated_at"].is_string());

    let back: Vec<MetricSample> =
        serde_json::from_value(value["statistics"].clone()).unwrap();
    assert_eq!(back, samples);

    // Rounded summary block present for non-empty input; the latency
    // average covers only the two samples that carried a reading
    assert_eq!(value["summary"]["cpu"]["avg"], 20.0);
    assert_eq!(value["summary"]["network"]["avg"], 15.5);
}

#[test]
fn json_report_empty_has_no_summary_key() {
    let summary = summarize(&[]);
    let rendered = render(&[], &summary, ReportFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(value["total_records"], 0);
    assert!(value.get("summary").is_none());
    assert_eq!(value["statistics"].as_array().unwrap().len(), 0);
}

#[test]
fn json_summary_network_is_null_object_when_no_latency() {
    let samples = vec![sample_without_latency(1_000, 10.0)];
    let summary = summarize(&samples);
    let rendered = render(&samples, &summary, ReportFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    assert!(value["summary"]["network"].is_object());
    assert!(value["summary"]["network"]["avg"].is_null());
    assert!(value["summary"]["network"]["max"].is_null());
}

#[test]
fn csv_has_header_row_and_one_line_per_sample() {
    let samples = vec![sample_at(2_000, 20.0), sample_at(1_000, 10.0)];
    let summary = summarize(&samples);
    let rendered = render(&samples, &summary, ReportFormat::Csv).unwrap();

    let lines: Vec<&str> = rendered.trim_end().lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        "timestamp,cpu_percent,memory_percent,memory_used_bytes,memory_total_bytes,disk_percent,disk_used_bytes,disk_total_bytes,uptime_seconds,network_latency_ms"
    );
    assert!(lines[1].starts_with("2000,20,"));
    assert!(lines[1].ends_with(",15.5"));
}

#[test]
fn csv_null_latency_is_an_empty_trailing_cell() {
    let samples = vec![sample_without_latency(1_000, 10.0)];
    let summary = summarize(&samples);
    let rendered = render(&samples, &summary, ReportFormat::Csv).unwrap();

    let lines: Vec<&str> = rendered.trim_end().lines().collect();
    assert!(lines[0].ends_with(",network_latency_ms"));
    assert!(lines[1].ends_with(','), "row should keep the empty cell: {}", lines[1]);
    assert_eq!(lines[1].matches(',').count(), lines[0].matches(',').count());
}

#[test]
fn csv_empty_input_degrades_to_no_data_line() {
    let summary = summarize(&[]);
    let rendered = render(&[], &summary, ReportFormat::Csv).unwrap();
    assert_eq!(rendered, "No data available");
}

#[test]
fn text_report_has_banner_summary_and_records() {
    let samples = vec![sample_at(2_000, 20.0), sample_without_latency(1_000, 10.0)];
    let summary = summarize(&samples);
    let rendered = render(&samples, &summary, ReportFormat::Text).unwrap();

    assert!(rendered.contains("SYSPULSE SYSTEM STATISTICS REPORT"));
    assert!(rendered.contains("Total Records: 2"));
    assert!(rendered.contains("CPU Usage:        Avg: 15.00%  Min: 10.00%  Max: 20.00%"));
    // Latency came from a single sample in this set
    assert!(rendered.contains("Network Latency:  Avg: 15.50ms  Min: 15.50ms  Max: 15.50ms"));
    assert!(rendered.contains("  Network: 15.50ms"));
    assert!(rendered.contains("  Network: N/A"));
    assert!(rendered.contains("  Memory:  50.00% (8.00GB / 16.00GB)"));
    assert!(rendered.contains("  Uptime:  1d"));
}

#[test]
fn text_report_skips_network_summary_line_when_null() {
    let samples = vec![sample_without_latency(1_000, 10.0)];
    let summary = summarize(&samples);
    let rendered = render(&samples, &summary, ReportFormat::Text).unwrap();
    assert!(!rendered.contains("Network Latency:"));
    assert!(rendered.contains("  Network: N/A"));
}

#[test]
fn text_report_shows_at_most_ten_records() {
    let samples: Vec<MetricSample> = (0..15).map(|i| sample_at(1_000 + i, 10.0)).collect();
    let summary = summarize(&samples);
    let rendered = render(&samples, &summary, ReportFormat::Text).unwrap();
    assert!(rendered.contains("RECENT RECORDS (Last 10)"));
    assert_eq!(rendered.matches("Timestamp: ").count(), 10);
}

#[test]
fn text_report_empty_input_degrades_to_no_data_line() {
    let summary = summarize(&[]);
    let rendered = render(&[], &summary, ReportFormat::Text).unwrap();
    assert_eq!(rendered, "No data available");
}

#[test]
fn uptime_formatting_drops_zero_units() {
    assert_eq!(format_uptime(86_400), "1d");
    assert_eq!(format_uptime(3_661), "1h 1m");
    assert_eq!(format_uptime(45), "0m");
    assert_eq!(format_uptime(90_000), "1d 1h");
    assert_eq!(format_uptime(0), "0m");
    // Seconds are never shown; minutes come from integer division
    assert_eq!(format_uptime(86_400 + 300), "1d 5m");
    assert_eq!(format_uptime(59), "0m");
}

#[test]
fn round2_is_half_up_to_two_decimals() {
    assert_eq!(round2(1.005_001), 1.01);
    assert_eq!(round2(33.333_333), 33.33);
    assert_eq!(round2(15.5), 15.5);
}
