//! Read-only conflict scan

use super::{output, target_mods, ProjectArgs};
use anyhow::Result;
use modroot_resolve::NamingMode;

pub struct ScanArgs {
    pub name: Option<String>,
    pub all: bool,
    pub format: String,
    pub material_naming: Option<NamingMode>,
    pub texture_naming: Option<NamingMode>,
}

pub fn run(project: &ProjectArgs, args: ScanArgs) -> Result<()> {
    let mut session = project.session(args.material_naming, args.texture_naming)?;
    let names = target_mods(session.catalog(), args.name.as_deref(), args.all)?;

    let mut reports = Vec::new();
    for name in &names {
        reports.extend(session.preview(name)?);
    }

    if args.format == "json" {
        return output::print_json(&reports, &[]);
    }

    if reports.is_empty() {
        println!("No mods found in {}", session.catalog().mods_root());
        return Ok(());
    }
    for report in &reports {
        output::print_report_text(report);
    }
    Ok(())
}
