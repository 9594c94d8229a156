//! Evaluation pass benchmarks.
//!
//! Measures a full `evaluate_batch` over a realistic log window and the
//! cost of parsing raw lines into entries.
//!
//! Run with: `cargo bench --bench evaluation`

#![allow(clippy::expect_used)] // Acceptable in benchmark code

use std::hint::black_box;

use chrono::{DateTime, Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use logalert::alerting::evaluate_batch;
use logalert::ingest::parse_logs;
use logalert::models::{
    AlertRule, ErrorPatternConfig, ErrorRateConfig, FunctionHealthConfig, LogEntry, LogLevel,
    RuleConfig, Severity,
};
use uuid::Uuid;

const FUNCTIONS: [&str; 5] = ["api", "billing", "checkout", "search", "worker"];

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Every seventh entry is an error, spread over the last half hour
fn generate_logs(count: usize, now: DateTime<Utc>) -> Vec<LogEntry> {
    (0..count)
        .map(|i| {
            let level = if i % 7 == 0 { LogLevel::Error } else { LogLevel::Info };
            let message = if i % 7 == 0 {
                format!("upstream connection refused (attempt {i})")
            } else {
                format!("request {i} served")
            };
            let offset = i64::try_from(i % 1800).expect("offset fits");
            LogEntry::new(
                now - Duration::seconds(offset),
                level,
                FUNCTIONS[i % FUNCTIONS.len()],
                message,
            )
        })
        .collect()
}

fn rule(name: &str, config: RuleConfig) -> AlertRule {
    AlertRule {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: None,
        config,
        target_functions: None,
        severity: Severity::Warning,
        cooldown_minutes: 15,
        is_enabled: true,
    }
}

fn generate_rules() -> Vec<AlertRule> {
    vec![
        rule(
            "error burst",
            RuleConfig::ErrorRate(ErrorRateConfig {
                threshold: 10,
                window_minutes: 15,
                error_pattern: None,
            }),
        ),
        rule(
            "refused connections",
            RuleConfig::ErrorRate(ErrorRateConfig {
                threshold: 5,
                window_minutes: 30,
                error_pattern: Some("connection refused".to_string()),
            }),
        ),
        rule(
            "timeouts",
            RuleConfig::ErrorPattern(ErrorPatternConfig {
                pattern: "timeout|timed out".to_string(),
                case_sensitive: false,
            }),
        ),
        rule(
            "flapping functions",
            RuleConfig::FunctionHealth(FunctionHealthConfig {
                consecutive_failures: 3,
            }),
        ),
    ]
}

fn bench_evaluate_batch(c: &mut Criterion) {
    let now = fixed_now();
    let rules = generate_rules();
    let mut group = c.benchmark_group("evaluate_batch");

    for size in [100usize, 500, 2000] {
        let logs = generate_logs(size, now);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &logs, |b, logs| {
            b.iter(|| evaluate_batch(black_box(&rules), black_box(logs), &[], &[], now))
        });
    }

    group.finish();
}

fn bench_parse_logs(c: &mut Criterion) {
    let now = fixed_now();
    let lines: Vec<String> = (0..500)
        .map(|i| match i % 3 {
            0 => format!(
                r#"{{"timestamp":"2024-06-01T11:59:{:02}Z","level":"error","message":"failure {i}","function_name":"api"}}"#,
                i % 60
            ),
            1 => format!("[2024-06-01 11:58:{:02}] [WARN] [billing] retrying charge {i}", i % 60),
            _ => format!("plain line {i} without structure"),
        })
        .collect();

    let mut group = c.benchmark_group("parse_logs");
    group.throughput(Throughput::Elements(lines.len() as u64));
    group.bench_function("mixed_500", |b| {
        b.iter(|| parse_logs(black_box(lines.iter()), now))
    });
    group.finish();
}

criterion_group!(benches, bench_evaluate_batch, bench_parse_logs);
criterion_main!(benches);
