//! changelog-lint CLI
//!
//! Entry point for the command-line tool.
//!
//! Exit codes:
//! - 0: No violations
//! - 1: One or more violations
//! - 2: Tool error (config error, malformed rule or exclusion file, I/O error, etc.)

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use changelog_lint::discover::collect_changelogs;
use changelog_lint::output::OutputFormat;
use changelog_lint::rules::parse_rule_name;
use changelog_lint::{Config, ExclusionIndex, RuleName, RuleRegistry, Validator};

#[derive(Parser, Debug)]
#[command(name = "changelog-lint")]
#[command(version, about = "Rule-based validator for Liquibase changelogs", long_about = None)]
struct Args {
    /// Changelog files or directories (overrides [changelogs] paths)
    paths: Vec<PathBuf>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Rule-definition file (overrides [rules] file)
    #[arg(long, env = "CHANGELOG_LINT_RULES")]
    rules: Option<PathBuf>,

    /// Exclusion-definition file (overrides [exclusions] file)
    #[arg(long)]
    exclusions: Option<PathBuf>,

    /// Override output format (text, json)
    #[arg(long)]
    format: Option<String>,

    /// Explain a specific rule (e.g., --explain attr-ends-with)
    #[arg(long)]
    explain: Option<String>,

    /// List every rule token with its description
    #[arg(long)]
    list_rules: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if args.verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(args) {
        Ok(has_violations) => {
            if has_violations {
                std::process::exit(1);
            }
        }
        Err(err) => {
            eprintln!("Error: {:#}", err);
            std::process::exit(2);
        }
    }
}

/// Run validation.
///
/// Returns `Ok(true)` if violations were found, `Ok(false)` if the run was
/// clean, or `Err` on tool errors.
fn run(args: Args) -> Result<bool> {
    if let Some(token) = args.explain {
        explain_rule(&token)?;
        return Ok(false);
    }
    if args.list_rules {
        list_rules();
        return Ok(false);
    }

    let mut config =
        Config::discover(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(rules) = args.rules {
        config.rules.file = Some(rules);
    }
    if let Some(exclusions) = args.exclusions {
        config.exclusions.file = Some(exclusions);
    }
    if let Some(format) = args.format {
        config.output.format = format;
    }
    if !args.paths.is_empty() {
        config.changelogs.paths = args.paths;
    }
    config.validate().context("Invalid configuration")?;
    let format: OutputFormat = config.output_format()?;

    let rules_file = config.rules_file()?.to_path_buf();
    let rules = RuleRegistry::with_defaults()
        .load(&rules_file)
        .with_context(|| format!("Failed to load rules from {}", rules_file.display()))?;
    let exclusions = ExclusionIndex::load(config.exclusions.file.as_deref())
        .context("Failed to load exclusions")?;

    if config.changelogs.paths.is_empty() {
        anyhow::bail!("No changelog paths given: pass them as arguments or set [changelogs] paths");
    }
    let mut skip = vec![rules_file];
    skip.extend(config.exclusions.file.clone());
    let files = collect_changelogs(&config.changelogs.paths, &skip)
        .context("Failed to collect changelogs")?;

    let validator = Validator::new(rules, exclusions, config.model.structural_tags);
    let report = validator.validate(&files);

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    format
        .reporter()
        .emit(&report, &mut handle)
        .context("Failed to write report")?;
    handle.flush()?;

    Ok(!report.is_clean())
}

fn explain_rule(token: &str) -> Result<()> {
    let name = parse_rule_name(token).map_err(|t| anyhow::anyhow!("Unknown rule: {}", t))?;
    println!("Rule: {}", name);
    println!("Role: {}", name.role());
    println!("Description: {}", name.description());
    println!();
    println!("{}", name.explain());
    Ok(())
}

fn list_rules() {
    for name in RuleName::all() {
        println!(
            "{:<30} {:<16} {}",
            name.as_str(),
            name.role().to_string(),
            name.description()
        );
    }
}
