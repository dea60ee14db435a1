use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use regex::RegexBuilder;

use jamf_interrogator::{
    audit_empty_groups, build_inventory, diff, fetch_tagged, multiline_changes, format_text_diff, render,
    AuditOptions, AuditReport, Document, InterrogatorError, MembershipResolver, OutputFormat, Payload,
    ResourceClient, ResourceId, ResourceKind, SnapshotClient,
};
use jamf_interrogator::audit::DEFAULT_CONCURRENCY;
use jamf_interrogator::render::persist;

#[derive(Parser)]
#[command(name = "jamf-interrogator")]
#[command(about = "Poke around a device-management inventory: list, search, compare and audit resources")]
#[command(version)]
#[command(after_help = "examples:
  jamf-interrogator list policies
  jamf-interrogator --format csv list computers
  jamf-interrogator search scripts cleanup
  jamf-interrogator details policy 42 --save out/policy-42.json
  jamf-interrogator compare policy 10 11
  jamf-interrogator audit empty-groups")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Snapshot directory to read resources from (defaults to ~/.jamf_interrogator/snapshot)
    #[arg(short, long, global = true, env = "JAMF_INTERROGATOR_SOURCE")]
    source: Option<PathBuf>,

    /// Output format: table, json or csv
    #[arg(short, long, global = true, default_value = "table")]
    format: String,

    /// Diagnostic verbosity; diagnostics always go to stderr
    #[arg(long, global = true, value_enum, default_value = "warning")]
    log_level: LogLevel,

    /// Maximum membership lookups in flight during audits
    #[arg(long, global = true, env = "JAMF_INTERROGATOR_CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// List every resource of a kind
    List {
        /// policies, computers, scripts, packages or groups
        kind: String,
    },

    /// Search a kind by name (case-insensitive)
    Search {
        kind: String,

        /// Substring to look for, or a pattern with --regex
        term: String,

        /// Treat the term as a regular expression
        #[arg(long)]
        regex: bool,
    },

    /// Show the full record of one resource
    Details {
        kind: String,

        id: String,

        /// Save the JSON rendering to this path instead of printing
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Compare two resources of the same kind
    Compare {
        kind: String,

        id1: String,

        id2: String,

        /// Show line diffs for changed multi-line text (table format only)
        #[arg(long)]
        text: bool,
    },

    /// Run audit checks
    Audit {
        #[command(subcommand)]
        check: AuditCheck,
    },

    /// Generate summary reports
    Report {
        #[command(subcommand)]
        report: ReportKind,
    },

    /// Export every kind's listing as JSON into a directory
    Export {
        dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum AuditCheck {
    /// Find groups with no members
    EmptyGroups {
        /// Give up on unresolved groups after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
}

#[derive(Subcommand)]
enum ReportKind {
    /// Record counts for every resource kind
    Inventory {
        /// Save the JSON rendering to this path instead of printing
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    fn directive(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error | LogLevel::Critical => "error",
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(cli.log_level.directive()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run(cli).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(e);
            ExitCode::FAILURE
        }
    }
}

fn print_error(err: Box<dyn std::error::Error>) {
    eprintln!("{} {}", "✗ Error:".red(), err);
}

fn default_source() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".jamf_interrogator").join("snapshot"))
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let format: OutputFormat = cli.format.parse()?;

    let source = cli
        .source
        .or_else(default_source)
        .ok_or("No snapshot directory (--source or JAMF_INTERROGATOR_SOURCE)")?;
    if !source.is_dir() {
        warn!("snapshot directory {} does not exist", source.display());
    }
    let client = Arc::new(SnapshotClient::new(source));
    info!("reading resources from {}", client.root().display());

    match cli.command {
        Commands::List { kind } => {
            cmd_list(client.as_ref(), kind.parse()?, format).await?;
        }

        Commands::Search { kind, term, regex } => {
            cmd_search(client.as_ref(), kind.parse()?, &term, regex, format).await?;
        }

        Commands::Details { kind, id, save } => {
            cmd_details(client.as_ref(), kind.parse()?, ResourceId::parse(&id), save, format).await?;
        }

        Commands::Compare { kind, id1, id2, text } => {
            cmd_compare(
                client.as_ref(),
                kind.parse()?,
                ResourceId::parse(&id1),
                ResourceId::parse(&id2),
                text,
                format,
            )
            .await?;
        }

        Commands::Audit { check } => match check {
            AuditCheck::EmptyGroups { timeout } => {
                let mut options = AuditOptions::new(cli.concurrency);
                if let Some(secs) = timeout {
                    options = options.with_deadline(Duration::from_secs(secs));
                }
                cmd_audit_empty_groups(client, options, format).await?;
            }
        },

        Commands::Report { report } => match report {
            ReportKind::Inventory { save } => {
                cmd_report_inventory(client.as_ref(), save, format).await?;
            }
        },

        Commands::Export { dir } => {
            cmd_export(client.as_ref(), &dir).await?;
        }
    }

    Ok(())
}

async fn cmd_list(client: &dyn ResourceClient, kind: ResourceKind, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    info!("fetching {}", kind);

    let documents = client.list(kind).await?;
    info!("received {} {}", documents.len(), kind);

    let output = render(format, Payload::Documents { kind, documents: &documents })?;
    print!("{}", output);

    Ok(())
}

async fn cmd_search(
    client: &dyn ResourceClient,
    kind: ResourceKind,
    term: &str,
    use_regex: bool,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("searching {} for '{}'", kind, term);

    let pattern = if use_regex {
        let re = RegexBuilder::new(term)
            .case_insensitive(true)
            .build()
            .map_err(|e| InterrogatorError::InvalidPattern(e.to_string()))?;
        Some(re)
    } else {
        None
    };
    let needle = term.to_lowercase();

    let documents = client.list(kind).await?;
    info!("searching through {} {}", documents.len(), kind);

    let matches: Vec<Document> = documents
        .into_iter()
        .filter(|doc| {
            let name = doc.name().unwrap_or_default();
            match &pattern {
                Some(re) => re.is_match(&name),
                None => name.to_lowercase().contains(&needle),
            }
        })
        .collect();

    info!("found {} matches", matches.len());

    let output = render(format, Payload::Documents { kind, documents: &matches })?;
    print!("{}", output);

    Ok(())
}

async fn cmd_details(
    client: &dyn ResourceClient,
    kind: ResourceKind,
    id: ResourceId,
    save: Option<PathBuf>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("fetching {} {}", kind.spec().singular, id);

    let document = client.fetch(kind, &id).await?;
    let payload = Payload::Document { kind, document: &document };

    match save {
        Some(path) => save_json(payload, &path)?,
        None => print!("{}", render(format, payload)?),
    }

    Ok(())
}

async fn cmd_compare(
    client: &dyn ResourceClient,
    kind: ResourceKind,
    id1: ResourceId,
    id2: ResourceId,
    show_text: bool,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("comparing {} {} vs {}", kind, id1, id2);

    let (left, right) = tokio::try_join!(
        fetch_tagged(client, kind, id1),
        fetch_tagged(client, kind, id2),
    )?;

    let result = diff(&left, &right)?;
    let summary = result.summary();
    info!(
        "found {} differences ({} added, {} removed, {} changed)",
        summary.total(),
        summary.added,
        summary.removed,
        summary.changed
    );

    let output = render(format, Payload::Diff(&result))?;
    print!("{}", output);

    if show_text && format == OutputFormat::Table {
        for (path, old, new) in multiline_changes(&result) {
            println!();
            print!("{}", format_text_diff(path, old, new));
        }
    }

    Ok(())
}

async fn cmd_audit_empty_groups(
    client: Arc<SnapshotClient>,
    options: AuditOptions,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("starting empty groups audit");

    let groups = client.list(ResourceKind::Groups).await?;
    let resolver: Arc<dyn MembershipResolver> = client.clone();
    let report = audit_empty_groups(&groups, resolver, options).await;

    let output = render(format, Payload::Audit(&report))?;
    print!("{}", output);

    print_skipped(&report);

    Ok(())
}

fn print_skipped(report: &AuditReport) {
    if report.is_complete() {
        return;
    }

    eprintln!(
        "{} {} of {} groups could not be checked:",
        "⚠".yellow(),
        report.skipped.len(),
        report.scanned
    );
    for skip in &report.skipped {
        let id = skip.id.as_ref().map(|id| id.to_string()).unwrap_or_else(|| "?".to_string());
        eprintln!("  [{}] {}: {}", id, skip.name, skip.reason);
    }
}

async fn cmd_report_inventory(
    client: &dyn ResourceClient,
    save: Option<PathBuf>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("generating inventory report");

    let kinds: Vec<ResourceKind> = ResourceKind::all().collect();
    let report = build_inventory(client, &kinds).await;
    let payload = Payload::Inventory(&report);

    match save {
        Some(path) => save_json(payload, &path)?,
        None => print!("{}", render(format, payload)?),
    }

    let failed = report.failed_kinds();
    if !failed.is_empty() {
        let names: Vec<String> = failed.iter().map(|k| k.to_string()).collect();
        return Err(format!("could not list: {}", names.join(", ")).into());
    }

    Ok(())
}

async fn cmd_export(client: &dyn ResourceClient, dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    info!("exporting listings to {}", dir.display());

    let mut failed = Vec::new();

    for kind in ResourceKind::all() {
        match client.list(kind).await {
            Ok(documents) => {
                let path = dir.join(format!("{}.json", kind.spec().collection));
                let json = render(OutputFormat::Json, Payload::Documents { kind, documents: &documents })?;
                persist(&path, &json)?;
                println!("exported {} {} to {}", documents.len(), kind, path.display());
            }
            Err(e) => {
                warn!("could not export {}: {}", kind, e);
                failed.push(kind.to_string());
            }
        }
    }

    if !failed.is_empty() {
        return Err(format!("could not export: {}", failed.join(", ")).into());
    }

    Ok(())
}

fn save_json(payload: Payload<'_>, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let json = render(OutputFormat::Json, payload)?;
    persist(path, &json)?;
    info!("saved to {}", path.display());
    println!("saved to {}", path.display());
    Ok(())
}
