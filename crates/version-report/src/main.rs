//! `version-report` - append to and inspect version report logs.
//!
//! ## Commands
//!
//! - `add`: append one report to the primary log
//! - `add-target`: append one structured target record to the secondary log
//! - `merge`: print the reduced primary log
//! - `targets`: print the secondary log
//! - `capture`: run a command inside a capture scope and print what it reported

use std::ffi::OsString;
use std::io::Read;
use std::path::PathBuf;
use std::process::Command;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, Level};

use version_report::{
    with_capture, BumpType, ReportContext, TargetReport, VersionReport, LOCATION_ENV_VAR,
};

#[derive(Parser)]
#[command(name = "version-report")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Append-only version report log", long_about = None)]
struct Cli {
    /// Primary log file
    #[arg(long, global = true, env = LOCATION_ENV_VAR)]
    location: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Append a version report to the primary log
    Add {
        /// Dedup key; the last report per key wins
        #[arg(short, long)]
        key: String,

        /// Higher priorities sort first
        #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
        priority: i64,

        /// Bump classification
        #[arg(short, long, value_enum, default_value_t = BumpArg::None)]
        bump: BumpArg,

        /// Target version
        #[arg(long)]
        new_version: Option<String>,

        /// Mark the run as requiring regeneration
        #[arg(long)]
        must_generate: bool,

        /// Pull request summary fragment
        #[arg(long)]
        pr_report: Option<String>,

        /// Commit message fragment
        #[arg(long)]
        commit_report: Option<String>,
    },

    /// Append a structured target record (JSON) to the secondary log
    AddTarget {
        /// JSON file holding one target record (default: stdin)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Print the reduced primary log
    Merge {
        /// Print a markdown section instead of JSON
        #[arg(long, value_enum)]
        markdown: Option<MarkdownArg>,
    },

    /// Print the secondary log as JSON
    Targets,

    /// Run a command inside a capture scope and print the combined result
    Capture {
        /// Program and arguments to run
        #[arg(trailing_var_arg = true, required = true)]
        command: Vec<OsString>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum BumpArg {
    None,
    Patch,
    Minor,
    Major,
    Graduate,
    Prerelease,
    Custom,
}

impl From<BumpArg> for BumpType {
    fn from(arg: BumpArg) -> Self {
        match arg {
            BumpArg::None => BumpType::None,
            BumpArg::Patch => BumpType::Patch,
            BumpArg::Minor => BumpType::Minor,
            BumpArg::Major => BumpType::Major,
            BumpArg::Graduate => BumpType::Graduate,
            BumpArg::Prerelease => BumpType::Prerelease,
            BumpArg::Custom => BumpType::Custom,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum MarkdownArg {
    Pr,
    Commit,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    version_report::init_tracing(cli.json, level);

    let ctx = ReportContext::from_value(cli.location);

    match cli.command {
        Commands::Add {
            key,
            priority,
            bump,
            new_version,
            must_generate,
            pr_report,
            commit_report,
        } => {
            let report = VersionReport {
                key,
                priority,
                bump_type: bump.into(),
                new_version,
                must_generate,
                pr_report,
                commit_report,
            };
            cmd_add(&ctx, &report)
        }
        Commands::AddTarget { file } => cmd_add_target(&ctx, file),
        Commands::Merge { markdown } => cmd_merge(&ctx, markdown),
        Commands::Targets => cmd_targets(&ctx),
        Commands::Capture { command } => cmd_capture(&ctx, command),
    }
}

fn cmd_add(ctx: &ReportContext, report: &VersionReport) -> Result<()> {
    ctx.append_report(report)
        .with_context(|| format!("failed to append report {:?}", report.key))
}

fn cmd_add_target(ctx: &ReportContext, file: Option<PathBuf>) -> Result<()> {
    let raw = match file {
        Some(path) => {
            std::fs::read_to_string(&path).with_context(|| format!("read {:?}", path))?
        }
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("read target record from stdin")?;
            buf
        }
    };
    let target: TargetReport = serde_json::from_str(&raw).context("parse target record")?;

    if !ctx.is_configured() {
        info!("{} is not set; skipping target record", LOCATION_ENV_VAR);
    }
    ctx.append_target(&target)
        .with_context(|| format!("failed to append target {:?}", target.target_name))
}

fn cmd_merge(ctx: &ReportContext, markdown: Option<MarkdownArg>) -> Result<()> {
    let merged = ctx.reduce().context("failed to reduce version reports")?;
    match markdown {
        Some(MarkdownArg::Pr) => print!("{}", merged.pr_markdown()),
        Some(MarkdownArg::Commit) => print!("{}", merged.commit_markdown()),
        None => println!("{}", serde_json::to_string_pretty(&merged)?),
    }
    Ok(())
}

fn cmd_targets(ctx: &ReportContext) -> Result<()> {
    let targets = ctx
        .read_targets()
        .context("failed to read structured reports")?
        .unwrap_or_default();
    println!("{}", serde_json::to_string_pretty(&targets)?);
    Ok(())
}

fn cmd_capture(ctx: &ReportContext, command: Vec<OsString>) -> Result<()> {
    let Some((program, args)) = command.split_first() else {
        bail!("no command given");
    };

    let (capture, ()) = with_capture(ctx, |scoped| -> Result<()> {
        let status = scoped
            .apply_to(&mut Command::new(program))
            .args(args)
            .status()
            .with_context(|| format!("failed to spawn {:?}", program))?;
        if !status.success() {
            bail!("{:?} exited with {}", program, status);
        }
        Ok(())
    })?;

    println!("{}", serde_json::to_string_pretty(&capture)?);
    Ok(())
}
