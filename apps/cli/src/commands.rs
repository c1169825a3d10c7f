//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use jaarverslag_collectors::{PairsFileCollector, SourceCollector, VlaanderenCollector};
use jaarverslag_core::{
    DEFAULT_MERGED_FILE, ProgressReporter, RunConfig, RunResult, merge_tables, run_source,
    table_file_name,
};
use jaarverslag_fetcher::{DocumentFetcher, LeadText};
use jaarverslag_normalize::NameNormalizer;
use jaarverslag_shared::{AppConfig, FetchOptions, FetchStatus, init_config, load_config};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// jaarverslag: collect annual reports into a tabular dataset.
#[derive(Parser)]
#[command(
    name = "jaarverslag",
    version,
    about = "Collect public-sector annual reports, normalize organisation names, and extract their lead text.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

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
    /// Collect one source and write its table.
    Run {
        #[command(subcommand)]
        source: RunSource,
    },

    /// Concatenate per-source tables into one with a fresh index.
    Merge {
        /// Tables to merge. Defaults to the vlaanderen and govsr tables in the output directory.
        inputs: Vec<PathBuf>,

        /// Combined table path (defaults to <output_dir>/govsr+vlaanderen.csv).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show how organisation names normalize.
    Normalize {
        /// Raw organisation names.
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Fetch one document and print its lead text.
    Fetch {
        /// Document URL.
        url: String,

        /// Leading pages to keep.
        #[arg(long)]
        max_pages: Option<usize>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Sources for `run`.
#[derive(Subcommand)]
pub(crate) enum RunSource {
    /// Annual reports published on vlaanderen.be.
    Vlaanderen {
        /// Listing pages to walk (overrides config).
        #[arg(long)]
        listing_pages: Option<u32>,

        #[command(flatten)]
        args: RunArgs,
    },

    /// Pairs from a CSV file with `name,url` headers.
    Pairs {
        /// CSV file with the pairs.
        #[arg(short, long)]
        file: PathBuf,

        /// Source name, used for the output file `<source>_data.csv`.
        #[arg(short, long)]
        source: String,

        #[command(flatten)]
        args: RunArgs,
    },
}

/// Flags shared by every `run` source. Each overrides the config file.
#[derive(Args)]
pub(crate) struct RunArgs {
    /// Output directory.
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Leading pages to keep per document.
    #[arg(long)]
    max_pages: Option<usize>,

    /// Maximum concurrent downloads.
    #[arg(long)]
    concurrency: Option<usize>,

    /// Add a `Fetch Status` column to the table.
    #[arg(long)]
    with_status: bool,
}

impl RunArgs {
    fn apply(self, mut config: RunConfig) -> RunConfig {
        if let Some(out) = self.out {
            config.output_dir = out;
        }
        if let Some(max_pages) = self.max_pages {
            config.max_pages = max_pages;
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if self.with_status {
            config.include_status_column = true;
        }
        config
    }
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
        0 => "jaarverslag=info",
        1 => "jaarverslag=debug",
        _ => "jaarverslag=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    // stdout carries command output (lead text, normalized names).
    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
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
    match cli.command {
        Command::Run { source } => cmd_run(source).await,
        Command::Merge { inputs, output } => cmd_merge(inputs, output).await,
        Command::Normalize { names } => cmd_normalize(&names).await,
        Command::Fetch { url, max_pages } => cmd_fetch(&url, max_pages).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(source: RunSource) -> Result<()> {
    let mut config = load_config()?;

    match source {
        RunSource::Vlaanderen {
            listing_pages,
            args,
        } => {
            if let Some(pages) = listing_pages {
                config.vlaanderen.listing_pages = pages;
            }
            let run_config = args.apply(RunConfig::from(&config));
            let collector = VlaanderenCollector::new(&config.vlaanderen, &run_config.fetch)?;
            run_collector(&collector, &run_config).await
        }
        RunSource::Pairs { file, source, args } => {
            if source.trim().is_empty() || source.contains(['/', '\\']) {
                return Err(eyre!("invalid source name '{source}': must be a plain file-name stem"));
            }
            let collector = PairsFileCollector::new(source, file);
            if !collector.path().is_file() {
                return Err(eyre!("pairs file '{}' not found", collector.path().display()));
            }
            let run_config = args.apply(RunConfig::from(&config));
            run_collector(&collector, &run_config).await
        }
    }
}

async fn run_collector<C: SourceCollector>(collector: &C, config: &RunConfig) -> Result<()> {
    info!(
        source = collector.name(),
        output_dir = %config.output_dir.display(),
        max_pages = config.max_pages,
        concurrency = config.concurrency,
        "running source"
    );

    let reporter = CliProgress::new();
    let result = match run_source(collector, config, &reporter).await {
        Ok(result) => result,
        Err(e) => {
            reporter.spinner.finish_and_clear();
            return Err(e.into());
        }
    };

    println!();
    println!("  Source {} collected.", result.source);
    println!("  Pairs:   {}", result.pairs);
    println!("  Rows:    {}", result.records);
    println!("  Text:    {}", result.summary.text);
    println!("  Empty:   {}", result.summary.empty);
    println!("  Failed:  {}", result.summary.failed);
    println!("  Table:   {}", result.path.display());
    println!("  Time:    {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_merge(inputs: Vec<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let config = load_config()?;
    let output_dir = PathBuf::from(&config.defaults.output_dir);

    let inputs = if inputs.is_empty() {
        vec![
            output_dir.join(table_file_name("vlaanderen")),
            output_dir.join(table_file_name("govsr")),
        ]
    } else {
        inputs
    };
    let output = output.unwrap_or_else(|| output_dir.join(DEFAULT_MERGED_FILE));

    info!(inputs = inputs.len(), output = %output.display(), "merging tables");
    let result = merge_tables(&inputs, &output)?;

    println!();
    for (path, rows) in &result.per_input {
        println!("  {:>6} rows  {}", rows, path.display());
    }
    println!("  {:>6} rows  {} (merged)", result.rows, result.path.display());
    println!();

    Ok(())
}

async fn cmd_normalize(names: &[String]) -> Result<()> {
    let config = load_config()?;
    let normalizer = NameNormalizer::from_config(&config.normalize)?;

    for raw in names {
        let normalized = normalizer.normalize(raw);
        match normalized.extended() {
            Some(extended) => println!("{}\t{extended}", normalized.display_name),
            None => println!("{}", normalized.display_name),
        }
    }

    Ok(())
}

async fn cmd_fetch(url: &str, max_pages: Option<usize>) -> Result<()> {
    let config = load_config()?;
    let fetcher = DocumentFetcher::new(&FetchOptions::from(&config))?;
    let max_pages = max_pages.unwrap_or(config.defaults.max_pages);

    info!(url, max_pages, "fetching document");
    match fetcher.fetch_lead_text(url, max_pages).await? {
        LeadText::Text(text) => {
            println!("{text}");
            Ok(())
        }
        LeadText::Empty => {
            eprintln!("document has no pages");
            Ok(())
        }
        LeadText::Failed(err) => Err(eyre!("{} failure: {err}", err.status())),
    }
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
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
                .expect("valid spinner template")
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

    fn document_fetched(&self, url: &str, completed: usize, total: usize, status: FetchStatus) {
        if status.is_failure() {
            self.spinner
                .println(format!("  ✗ {url} ({status})"));
        }
        self.spinner
            .set_message(format!("Fetching [{completed}/{total}] {url}"));
    }

    fn done(&self, _result: &RunResult) {
        self.spinner.finish_and_clear();
    }
}
