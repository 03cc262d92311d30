//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use proposalkit_core::stages::{
    self, CLEANED_FILE, DUPLICATES_FILE, INVENTORY_FILE, ORGANIZATIONS_FILE, ProgressReporter,
    RESOURCES_FILE,
};
use proposalkit_dedup::{DetectOptions, DuplicateReport};
use proposalkit_shared::{
    AppConfig, ResourceSummary, Status, init_config, load_config, load_config_from,
};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// ProposalKit: inventory, deduplicate and catalog exchange-program proposals.
#[derive(Parser)]
#[command(
    name = "proposalkit",
    version,
    about = "Turn a tree of proposal documents into a deduplicated resource catalog.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.proposalkit/proposalkit.toml.
    #[arg(long, global = true, env = "PROPOSALKIT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Scan a proposal tree and write the proposal inventory.
    Inventory {
        /// Root directory containing the proposal documents.
        root: PathBuf,

        /// Output file (defaults to <output.dir>/proposals_inventory.json).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Extract host organizations listed inside the proposals.
    Organizations {
        /// Root directory containing the proposal documents.
        root: PathBuf,

        /// Output file (defaults to <output.dir>/organizations.json).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Format the inventory into database resources (JSON and CSV).
    Prepare {
        /// Inventory file (defaults to <output.dir>/proposals_inventory.json).
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory (defaults to <output.dir>).
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Report exact, similar, multi-year and filename duplicates.
    Duplicates {
        /// Resources file (defaults to <output.dir>/database_resources.json).
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Report file (defaults to <output.dir>/duplicates_report.json).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Similarity threshold for near-duplicate titles, in [0, 1).
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Remove exact-title duplicates, keeping the newest fiscal year.
    Clean {
        /// Resources file (defaults to <output.dir>/database_resources.json).
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Cleaned file (defaults to <output.dir>/database_resources_cleaned.json).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Load a resources file into the local catalog database.
    Import {
        /// Resources file (defaults to <output.dir>/database_resources_cleaned.json).
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Catalog database path (defaults to catalog.db_path).
        #[arg(long)]
        db: Option<PathBuf>,

        /// Import only current and upcoming proposals.
        #[arg(long)]
        active_only: bool,

        /// Rows written per transaction.
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Run inventory, prepare, duplicates and clean in one go.
    Run {
        /// Root directory containing the proposal documents.
        root: PathBuf,

        /// Output directory (defaults to <output.dir>).
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "proposalkit=info",
        1 => "proposalkit=debug",
        _ => "proposalkit=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    match cli.command {
        Command::Inventory { root, out } => cmd_inventory(&config, &root, out),
        Command::Organizations { root, out } => cmd_organizations(&config, &root, out),
        Command::Prepare { input, out_dir } => cmd_prepare(&config, input, out_dir),
        Command::Duplicates {
            input,
            out,
            threshold,
        } => cmd_duplicates(&config, input, out, threshold),
        Command::Clean { input, out } => cmd_clean(&config, input, out),
        Command::Import {
            input,
            db,
            active_only,
            batch_size,
        } => cmd_import(config, input, db, active_only, batch_size).await,
        Command::Run { root, out_dir } => cmd_run(&config, &root, out_dir),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&config),
        },
    }
}

/// `explicit`, or `name` inside the configured output directory.
fn output_path(config: &AppConfig, explicit: Option<PathBuf>, name: &str) -> PathBuf {
    explicit.unwrap_or_else(|| Path::new(&config.output.dir).join(name))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_inventory(config: &AppConfig, root: &Path, out: Option<PathBuf>) -> Result<()> {
    let out = output_path(config, out, INVENTORY_FILE);
    info!(root = %root.display(), out = %out.display(), "building inventory");

    let reporter = CliProgress::new();
    let result = stages::run_inventory(root, &out, config, &reporter)?;
    reporter.done();

    println!();
    println!("  Inventory written to {}", out.display());
    println!("  Documents: {}", result.documents);
    println!("  Proposals: {}", result.proposals.len());
    println!("  Skipped:   {}", result.skipped.len());
    for path in &result.skipped {
        println!("    - {}", path.display());
    }
    println!();
    Ok(())
}

fn cmd_organizations(config: &AppConfig, root: &Path, out: Option<PathBuf>) -> Result<()> {
    let out = output_path(config, out, ORGANIZATIONS_FILE);
    info!(root = %root.display(), out = %out.display(), "extracting organizations");

    let reporter = CliProgress::new();
    let result = stages::run_organizations(root, &out, config, &reporter)?;
    reporter.done();

    let stats = result.stats;
    println!();
    println!("  Organizations written to {}", out.display());
    println!("  Files:              {}", stats.total_files);
    println!("  Organizations:      {}", stats.total_organizations);
    println!(
        "  With URL:           {} ({:.1}%)",
        stats.with_url,
        stats.percent(stats.with_url)
    );
    println!(
        "  With description:   {} ({:.1}%)",
        stats.with_description,
        stats.percent(stats.with_description)
    );
    println!(
        "  With meeting focus: {} ({:.1}%)",
        stats.with_meeting_focus,
        stats.percent(stats.with_meeting_focus)
    );
    println!();
    Ok(())
}

fn cmd_prepare(config: &AppConfig, input: Option<PathBuf>, out_dir: Option<PathBuf>) -> Result<()> {
    let input = output_path(config, input, INVENTORY_FILE);
    let out_dir = out_dir.unwrap_or_else(|| PathBuf::from(&config.output.dir));
    info!(input = %input.display(), out_dir = %out_dir.display(), "preparing resources");

    let result = stages::run_prepare(&input, &out_dir, &input.display().to_string(), Utc::now())?;

    println!();
    println!("  Resources written to {}", result.json_path.display());
    println!("  CSV export:          {}", result.csv_path.display());
    print_summary(&result.file.summary);
    Ok(())
}

fn cmd_duplicates(
    config: &AppConfig,
    input: Option<PathBuf>,
    out: Option<PathBuf>,
    threshold: Option<f64>,
) -> Result<()> {
    let input = output_path(config, input, RESOURCES_FILE);
    let out = output_path(config, out, DUPLICATES_FILE);

    let mut options = DetectOptions::from(&config.dedup);
    if let Some(t) = threshold {
        if !(0.0..1.0).contains(&t) {
            return Err(eyre!("invalid threshold {t}: expected a value in [0, 1)"));
        }
        options.similarity_threshold = t;
    }

    let report = stages::run_duplicates(&input, &out, &options)?;

    println!();
    println!("  Duplicate report written to {}", out.display());
    print_duplicates(&report);
    Ok(())
}

fn cmd_clean(config: &AppConfig, input: Option<PathBuf>, out: Option<PathBuf>) -> Result<()> {
    let input = output_path(config, input, RESOURCES_FILE);
    let out = output_path(config, out, CLEANED_FILE);

    let result = stages::run_clean(&input, &out, Utc::now())?;

    println!();
    println!("  Cleaned resources written to {}", out.display());
    println!("  Removed duplicates: {}", result.file.removed_duplicates);
    for group in &result.groups {
        println!(
            "    - kept {} over {}",
            group.kept_id,
            group.removed_ids.join(", ")
        );
    }
    print_summary(&result.file.summary);
    Ok(())
}

async fn cmd_import(
    mut config: AppConfig,
    input: Option<PathBuf>,
    db: Option<PathBuf>,
    active_only: bool,
    batch_size: Option<usize>,
) -> Result<()> {
    let input = output_path(&config, input, CLEANED_FILE);
    let db = db.unwrap_or_else(|| PathBuf::from(&config.catalog.db_path));

    config.catalog.active_only |= active_only;
    if let Some(size) = batch_size {
        if size == 0 {
            return Err(eyre!("batch size must be at least 1"));
        }
        config.catalog.batch_size = size;
    }

    let reporter = CliProgress::new();
    let result = stages::run_import(&input, &db, &config.catalog, &reporter).await?;
    reporter.done();

    println!();
    println!("  Catalog: {}", db.display());
    println!("  Run:      {}", result.run_id);
    println!("  Selected: {}", result.counts.total);
    println!("  Imported: {}", result.counts.imported);
    println!("  Failed:   {}", result.counts.failed);
    if config.catalog.active_only {
        println!("  Skipped (inactive): {}", result.skipped_inactive);
    }
    for id in result.failed_ids.iter().take(10) {
        println!("    - {id}");
    }
    if result.failed_ids.len() > 10 {
        println!("    ... and {} more", result.failed_ids.len() - 10);
    }
    println!();
    Ok(())
}

fn cmd_run(config: &AppConfig, root: &Path, out_dir: Option<PathBuf>) -> Result<()> {
    let out_dir = out_dir.unwrap_or_else(|| PathBuf::from(&config.output.dir));
    info!(root = %root.display(), out_dir = %out_dir.display(), "running full pipeline");

    let reporter = CliProgress::new();
    let result = stages::run_pipeline(root, &out_dir, config, &reporter, Utc::now())?;
    reporter.done();

    println!();
    println!("  Proposals: {} ({} skipped)", result.inventory.proposals.len(), result.inventory.skipped.len());
    print_duplicates(&result.duplicates);
    println!("  Removed duplicates: {}", result.cleaned.file.removed_duplicates);
    print_summary(&result.cleaned.file.summary);
    println!("  Output: {}", out_dir.display());
    println!();
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Output helpers
// ---------------------------------------------------------------------------

fn print_summary(summary: &ResourceSummary) {
    println!("  Total:    {}", summary.total_resources);
    println!("  Active:   {}", summary.active_count);
    println!("  Archived: {}", summary.archived_count);
    for status in [Status::Upcoming, Status::Current, Status::Archived, Status::Unknown] {
        println!("    {:<9} {}", status.as_str(), summary.status_count(status));
    }
    println!("  By fiscal year:");
    for (fy, count) in &summary.by_fiscal_year {
        println!("    {fy:<9} {count}");
    }
    println!("  By theme:");
    for (theme, count) in &summary.by_theme {
        println!("    {theme:<16} {count}");
    }
    println!("  By region:");
    for (region, count) in &summary.by_region {
        println!("    {region:<16} {count}");
    }
    println!();
}

fn print_duplicates(report: &DuplicateReport) {
    println!("  Resources analyzed:   {}", report.total_resources);
    println!("  Exact title groups:   {}", report.exact_duplicates);
    println!("  Similar title pairs:  {}", report.similar_titles);
    println!("  Multi-year topics:    {}", report.multi_year_topics);
    println!("  Duplicate filenames:  {}", report.duplicate_filenames);
    for rec in &report.recommendations {
        println!("    [{:?}] {}", rec.level, rec.message);
    }
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn document_read(&self, path: &Path, current: usize, total: usize) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.spinner
            .set_message(format!("Reading [{current}/{total}] {name}"));
    }

    fn done(&self) {
        self.spinner.finish_and_clear();
    }
}
