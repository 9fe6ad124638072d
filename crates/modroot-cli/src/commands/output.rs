//! Text and JSON rendering of pass reports and summaries

use anyhow::Result;
use modroot_resolve::{ExecutionSummary, Pass, PassReport};

pub fn print_report_text(report: &PassReport) {
    println!("{} ({} naming)", report.summary(), report.naming);

    if report.pass == Pass::Materials && !report.has_prefabs {
        println!("  No Prefabs folder; nothing to scan.");
    }
    for skipped in &report.walk.skipped {
        println!("  [skipped] {}: {}", skipped.path, skipped.error);
    }
    if report.walk.cancelled {
        println!("  Scan was cancelled; report is partial.");
    }

    for group in &report.groups {
        let marker = if group.included { " " } else { "x" };
        println!(
            "  [{}] #{} {} {} -> {} ({}, {} reference(s))",
            marker,
            group.index,
            group.reason,
            group.source,
            group.dest,
            group.action,
            group.members
        );
        if !group.example.is_empty() {
            println!("        e.g. {}", group.example);
        }
    }
}

pub fn print_summary_text(summary: &ExecutionSummary) {
    println!("{}", summary.summary());

    for failure in &summary.failures {
        println!(
            "  [FAILED] {} -> {}: {}",
            failure.source, failure.dest, failure.reason
        );
    }
    for group in &summary.incomplete {
        println!(
            "  [INCOMPLETE] {} -> {} copied, not fully retargeted:",
            group.source, group.dest
        );
        for missing in &group.missing {
            println!("      {} in {}: {}", missing.site, missing.document, missing.detail);
        }
    }
}

pub fn print_json(reports: &[PassReport], summaries: &[ExecutionSummary]) -> Result<()> {
    let conflicts: usize = reports.iter().map(|r| r.conflict_count()).sum();
    let failed = summaries.iter().any(|s| s.has_failures());

    let output = serde_json::json!({
        "conflicts": conflicts,
        "failed": failed,
        "reports": reports,
        "summaries": summaries,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
