//! Modroot CLI - Keep every mod's materials and textures inside the mod

mod commands;
mod logging;

use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand};
use commands::{fix, folders, mods, scan, ProjectArgs};
use modroot_resolve::NamingMode;

#[derive(Parser)]
#[command(name = "modroot")]
#[command(about = "Relocate mod assets that live outside their mod folder", long_about = None)]
#[command(version)]
struct Cli {
    /// Project directory
    #[arg(long, global = true, default_value = ".")]
    project: String,

    /// Mods root, relative to the project (overrides config)
    #[arg(long, global = true)]
    mods_root: Option<String>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// A single mod, or every mod under the mods root
#[derive(Args)]
struct Target {
    /// Mod name
    #[arg(required_unless_present = "all")]
    name: Option<String>,

    /// Process every mod
    #[arg(long, conflicts_with = "name")]
    all: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List mods and their asset folders
    Mods {
        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = parse_format)]
        format: String,
    },

    /// Show a mod's folder overview and create missing folders
    Folders {
        /// Mod name
        name: String,

        /// Create a folder (repeatable)
        #[arg(long = "create")]
        create: Vec<String>,

        /// Create every missing conventional folder
        #[arg(long)]
        create_missing: bool,
    },

    /// Report references that point outside the mod (read-only)
    Scan {
        #[command(flatten)]
        target: Target,

        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = parse_format)]
        format: String,

        /// Naming of relocated materials (keep_original or owner_derived)
        #[arg(long, value_parser = parse_naming)]
        material_naming: Option<NamingMode>,

        /// Naming of relocated textures (keep_original or owner_derived)
        #[arg(long, value_parser = parse_naming)]
        texture_naming: Option<NamingMode>,
    },

    /// Copy outside assets into the mod and repoint references
    Fix {
        #[command(flatten)]
        target: Target,

        /// Apply without asking
        #[arg(short, long)]
        yes: bool,

        /// Leave groups whose source path contains this text (repeatable)
        #[arg(long = "exclude")]
        exclude: Vec<String>,

        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = parse_format)]
        format: String,

        /// Naming of relocated materials (keep_original or owner_derived)
        #[arg(long, value_parser = parse_naming)]
        material_naming: Option<NamingMode>,

        /// Naming of relocated textures (keep_original or owner_derived)
        #[arg(long, value_parser = parse_naming)]
        texture_naming: Option<NamingMode>,
    },
}

fn parse_format(s: &str) -> Result<String, String> {
    match s {
        "text" | "json" => Ok(s.to_string()),
        _ => Err(format!("unknown format '{}'; valid values: text, json", s)),
    }
}

fn parse_naming(s: &str) -> Result<NamingMode, String> {
    s.parse::<NamingMode>().map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let project = ProjectArgs {
        project: cli.project,
        mods_root: cli.mods_root,
    };

    match cli.command {
        Commands::Mods { format } => mods::run(&project, &format),
        Commands::Folders {
            name,
            create,
            create_missing,
        } => folders::run(
            &project,
            folders::FoldersArgs {
                name,
                create,
                create_missing,
            },
        ),
        Commands::Scan {
            target,
            format,
            material_naming,
            texture_naming,
        } => scan::run(
            &project,
            scan::ScanArgs {
                name: target.name,
                all: target.all,
                format,
                material_naming,
                texture_naming,
            },
        ),
        Commands::Fix {
            target,
            yes,
            exclude,
            format,
            material_naming,
            texture_naming,
        } => fix::run(
            &project,
            fix::FixArgs {
                name: target.name,
                all: target.all,
                yes,
                exclude,
                format,
                material_naming,
                texture_naming,
            },
        ),
    }
}
