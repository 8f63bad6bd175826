//! Rendering for scenario reports: colored console lines plus a JSON dump
//! for anything that wants to consume the results downstream.

use colored::Colorize;
use serde::Serialize;

use crate::harness::{ScenarioReport, SuiteSummary};

/// One console line per scenario, failure details indented beneath it.
pub fn format_scenario(report: &ScenarioReport) -> String {
    let verdict = if report.passed {
        "PASS".green().bold()
    } else {
        "FAIL".red().bold()
    };
    let mut rendered = format!(
        "{} {:<30} expected {:>6}  value {:>6}  history {:>6}  in {:?}",
        verdict,
        report.name,
        report.expected,
        report.observed_value,
        report.observed_history,
        report.duration
    );
    for failure in &report.failures {
        rendered.push('\n');
        rendered.push_str(&format!("       {} {}", "✗".red(), failure));
    }
    rendered
}

/// Closing block with suite totals and an overall verdict.
pub fn format_summary(summary: &SuiteSummary) -> String {
    let verdict = if summary.failed == 0 {
        "all scenarios passed".green().bold()
    } else if summary.failed == 1 {
        "1 scenario failed".red().bold()
    } else {
        format!("{} scenarios failed", summary.failed).red().bold()
    };
    format!(
        "{} run, {} passed, {} failed: {}",
        summary.total, summary.passed, summary.failed, verdict
    )
}

#[derive(Serialize)]
struct SuiteDump<'a> {
    summary: &'a SuiteSummary,
    scenarios: &'a [ScenarioReport],
}

/// The whole suite as one JSON document, summary first.
pub fn suite_json(
    summary: &SuiteSummary,
    reports: &[ScenarioReport],
) -> serde_json::Result<String> {
    serde_json::to_string(&SuiteDump {
        summary,
        scenarios: reports,
    })
}
