//! Relocate outside assets into their mods

use super::{output, target_mods, ProjectArgs};
use anyhow::{Context, Result};
use modroot_resolve::{NamingMode, PassReport};
use std::io::{self, BufRead, Write};

pub struct FixArgs {
    pub name: Option<String>,
    pub all: bool,
    pub yes: bool,
    pub exclude: Vec<String>,
    pub format: String,
    pub material_naming: Option<NamingMode>,
    pub texture_naming: Option<NamingMode>,
}

pub fn run(project: &ProjectArgs, args: FixArgs) -> Result<()> {
    let mut session = project.session(args.material_naming, args.texture_naming)?;
    let names = target_mods(session.catalog(), args.name.as_deref(), args.all)?;
    let excludes: Vec<String> = args.exclude.iter().map(|e| e.to_lowercase()).collect();
    let json = args.format == "json";

    let mut reports = Vec::new();
    let mut summaries = Vec::new();

    'mods: for name in &names {
        let mut next = session.begin(name)?;
        if next.is_none() {
            eprintln!("{}: scan cancelled.", name);
            break;
        }

        while next.is_some() {
            if !excludes.is_empty() {
                session.set_included_where(
                    |plan| {
                        let source = plan.source.as_str().to_lowercase();
                        excludes.iter().any(|e| source.contains(e))
                    },
                    false,
                );
            }
            let Some(report) = session.report() else {
                break;
            };

            if !json {
                output::print_report_text(&report);
            }
            let proceed = report.included_count() == 0 || args.yes || ask(&report)?;
            reports.push(report);
            if !proceed {
                session.abort()?;
                if !json {
                    println!("Skipped {}.", name);
                }
                continue 'mods;
            }

            let result = session.confirm()?;
            if !json {
                output::print_summary_text(&result.summary);
            }
            let cancelled = result.summary.cancelled;
            summaries.push(result.summary);
            if cancelled {
                break 'mods;
            }
            next = result.next;
        }
    }

    if json {
        output::print_json(&reports, &summaries)?;
    }

    if summaries.iter().any(|s| s.has_failures()) {
        std::process::exit(1);
    }
    Ok(())
}

/// Ask on stdin whether to apply a pass
fn ask(report: &PassReport) -> Result<bool> {
    let mut stderr = io::stderr();
    write!(
        stderr,
        "Apply {} group(s) for {} {}? [y/N] ",
        report.included_count(),
        report.mod_name,
        report.pass
    )?;
    stderr.flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read confirmation")?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}
