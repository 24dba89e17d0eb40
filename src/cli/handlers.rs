//! Subcommand handlers.
//!
//! Each handler wires CLI arguments to the staging library, renders the
//! result through [`OutputFormatter`], and maps failures to a process exit
//! code. Errors are logged rather than propagated so `main` stays a thin
//! dispatcher.

use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error};

use super::commands::{DetectArgs, LaunchArgs, OutputFormatArg, PlanArgs, ResolveArgs};
use super::output::OutputFormatter;
use crate::buildlog::{BuildLog, ConsoleLog, MemoryLog, NoOpLog};
use crate::config::StageConfig;
use crate::launch;
use crate::staging::{self, Stager};
use crate::version::{Catalog, Constraint, Resolver, VersionRequest};

/// Handles the `detect` subcommand.
pub async fn handle_detect(args: &DetectArgs) -> i32 {
    match run_detect(args) {
        Ok(()) => 0,
        Err(err) => {
            error!("{:#}", err);
            1
        }
    }
}

/// Handles the `plan` subcommand.
pub async fn handle_plan(args: &PlanArgs) -> i32 {
    match run_plan(args) {
        Ok(()) => 0,
        Err(err) => {
            error!("{:#}", err);
            1
        }
    }
}

/// Handles the `resolve` subcommand.
pub async fn handle_resolve(args: &ResolveArgs) -> i32 {
    match run_resolve(args) {
        Ok(()) => 0,
        Err(err) => {
            error!("{:#}", err);
            1
        }
    }
}

/// Handles the `launch` subcommand. Returns the application's own exit code
/// once it stops.
pub async fn handle_launch(args: &LaunchArgs) -> i32 {
    match run_launch(args).await {
        Ok(code) => code,
        Err(err) => {
            error!("{:#}", err);
            1
        }
    }
}

fn run_detect(args: &DetectArgs) -> Result<()> {
    let app_dir = resolve_app_dir(args.app_dir.clone())?;
    let detection = staging::detect_app(&app_dir)?;

    let formatter = OutputFormatter::new(args.format.into());
    let output = formatter.format_detection(&detection, &app_dir)?;
    print!("{}", ensure_trailing_newline(output));
    Ok(())
}

fn run_plan(args: &PlanArgs) -> Result<()> {
    let config = load_config()?;
    let app_dir = resolve_app_dir(args.app_dir.clone())?;
    let catalog = load_catalog(&config, args.manifest.as_ref(), args.stack.as_deref())?;

    // Human output narrates as it goes; machine formats buffer the narration
    // so stdout carries nothing but the document.
    let console = ConsoleLog;
    let memory = MemoryLog::new();
    let human = matches!(args.format, OutputFormatArg::Human);
    let log: &dyn BuildLog = if human { &console } else { &memory };

    let stager = Stager::new(&catalog, log);
    let plan = stager.stage(&app_dir)?;

    if !human {
        for line in memory.lines() {
            debug!("{}", line);
        }
    }

    let formatter = OutputFormatter::new(args.format.into());
    let output = formatter.format_plan(&plan)?;

    match &args.output {
        Some(path) => {
            fs::write(path, &output)
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            debug!("Wrote staging plan to {}", path.display());
        }
        None => print!("{}", ensure_trailing_newline(output)),
    }
    Ok(())
}

fn run_resolve(args: &ResolveArgs) -> Result<()> {
    let config = load_config()?;
    let catalog = load_catalog(&config, args.manifest.as_ref(), args.stack.as_deref())?;

    let constraint = args
        .constraint
        .as_deref()
        .map(Constraint::from_str)
        .transpose()
        .context("Invalid version constraint")?;

    // A direct query has no manifest behind it, so misses may widen to the
    // enclosing release lines just as an unpinned app would.
    let request = VersionRequest {
        component: args.component,
        constraint,
        source: None,
    };
    let resolver = Resolver::new(&catalog, &NoOpLog);
    let resolution = resolver.resolve_request(&request)?;

    let formatter = OutputFormatter::new(args.format.into());
    let output = formatter.format_resolution(&resolution)?;
    print!("{}", ensure_trailing_newline(output));
    Ok(())
}

async fn run_launch(args: &LaunchArgs) -> Result<i32> {
    let config = load_config()?;
    let app_dir = resolve_app_dir(args.app_dir.clone())?;
    let catalog = load_catalog(&config, args.manifest.as_ref(), args.stack.as_deref())?;

    // Staging already narrated once; keep the replanning quiet and only
    // surface it at debug level.
    let memory = MemoryLog::new();
    let stager = Stager::new(&catalog, &memory);
    let plan = stager.stage(&app_dir)?;
    for line in memory.lines() {
        debug!("{}", line);
    }

    let grace = Duration::from_secs(args.grace_seconds.unwrap_or(config.grace_seconds));
    let code = launch::supervise(&plan.launch, &app_dir, grace).await?;
    Ok(code)
}

fn load_config() -> Result<StageConfig> {
    let config = StageConfig::default();
    config.validate()?;
    Ok(config)
}

fn resolve_app_dir(arg: Option<PathBuf>) -> Result<PathBuf> {
    match arg {
        Some(dir) => Ok(dir),
        None => env::current_dir().context("Failed to determine current directory"),
    }
}

fn load_catalog(
    config: &StageConfig,
    manifest: Option<&PathBuf>,
    stack: Option<&str>,
) -> Result<Catalog> {
    let path = manifest.unwrap_or(&config.manifest_path);
    let catalog = Catalog::load(path)?;

    let stack = stack.or(config.stack.as_deref());
    let catalog = match stack {
        Some(stack) => {
            debug!("Filtering manifest entries to stack {}", stack);
            catalog.supporting_stack(stack)
        }
        None => catalog,
    };
    Ok(catalog)
}

fn ensure_trailing_newline(mut output: String) -> String {
    if !output.ends_with('\n') {
        output.push('\n');
    }
    output
}
