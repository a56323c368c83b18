//! CLI definitions for qcscan
//!
//! This module contains the clap CLI structure definitions, separated from main.rs
//! so they can be accessed by xtask for documentation generation (man pages, markdown).

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell as CompletionShell;
use std::path::PathBuf;
use std::sync::OnceLock;

use crate::pipeline::PoolKind;

/// Build clap styles.
///
/// - Green: headers, usage, command names
/// - White: placeholders and valid values
pub fn build_cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Green.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::White.on_default())
        .valid(AnsiColor::White.on_default())
        .invalid(AnsiColor::Red.on_default())
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
}

/// Package version, with the short git SHA for non-release builds.
pub fn version() -> &'static str {
    static VERSION: OnceLock<String> = OnceLock::new();
    VERSION.get_or_init(|| match option_env!("VERGEN_GIT_SHA") {
        Some(sha) if !sha.is_empty() && sha != "unknown" => format!(
            "{} ({})",
            env!("CARGO_PKG_VERSION"),
            &sha[..sha.len().min(7)]
        ),
        _ => env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Parser)]
#[command(name = "qcscan")]
#[command(about = "Scan a sequencing QC archive: explain missing QC reports and extract QC metrics")]
#[command(long_about = "qcscan walks a partitioned analysis archive for large batches of file
identifiers. For each identifier it either explains why no QC report was
produced (by scanning the job error logs) or extracts a small set of QC
metrics from the reports that do exist.

QUICK START:
    qcscan classify --file ids.txt --output errors.txt
    qcscan extract --file ids.txt --output metrics.csv --include-crypt
    qcscan extract --id EGAF00001234567 --output one.csv

The archive root comes from --root or [archive] root in
~/.config/qcscan/config.toml.")]
#[command(version = version())]
#[command(styles = build_cli_styles())]
pub struct Cli {
    /// Configuration file (default: ~/.config/qcscan/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where identifiers come from.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
#[group(required = true, multiple = false)]
pub struct InputArgs {
    /// Analyze a single identifier
    #[arg(long, value_name = "ID")]
    pub id: Option<String>,

    /// Newline-delimited identifier list ("-" reads stdin)
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
}

/// Scheduling flags shared by the analysis commands.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct RunArgs {
    /// Archive root directory
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Concurrent workers (0 runs serially)
    #[arg(long, short = 'w', value_name = "N")]
    pub workers: Option<usize>,

    /// Upper bound on workers
    #[arg(long, value_name = "N")]
    pub max_workers: Option<usize>,

    /// Identifiers per batch
    #[arg(long, value_name = "N")]
    pub batch_size: Option<usize>,

    /// Worker substrate
    #[arg(long, value_enum)]
    pub pool: Option<PoolKind>,

    /// Suppress the progress line
    #[arg(long, short)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Explain missing QC reports from job error logs
    #[command(long_about = "Classify identifiers whose QC report is missing.

Identifiers with a QC artifact are skipped. For the rest, every job log
(*.e<N>, *.o<N>) in the execution log directory is scanned for known
failure signatures (bwa, samtools, picard, GATK, FastQC, Java, scheduler
kills). Matching lines are written per identifier to --output; identifiers
without any error evidence are listed in --missing-output.

EXAMPLES:
    qcscan classify --file ids.txt --output errors.txt
    qcscan classify --file ids.txt --output errors.txt --missing-output silent.txt
    qcscan classify --id EGAF00001234567 --output one.txt -v")]
    Classify {
        #[command(flatten)]
        input: InputArgs,

        /// Excerpt file for identifiers with error evidence
        #[arg(long, short, value_name = "PATH")]
        output: PathBuf,

        /// Identifier list for missing QC without error evidence
        /// (default: <output stem>.no_error.txt)
        #[arg(long, value_name = "PATH")]
        missing_output: Option<PathBuf>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Extract QC metrics into a delimited table
    #[command(long_about = "Extract QC metrics for each identifier.

BAM/CRAM reports yield insert_size, unaligned, mapq and duplicate_reads
(plus gc_content with --include-crypt). VCF reports yield tstv_ratio and
avg_qual. FastQC archives yield gc_content, duplicate_reads and
quality_reads. Identifiers without QC, or whose analysis failed, produce a
single __error__ row.

EXAMPLES:
    qcscan extract --file ids.txt --output metrics.csv
    qcscan extract --file ids.txt --output metrics.tsv --delimiter '\\t'
    qcscan extract --file ids.txt --output metrics.csv --pool threads -w 16")]
    Extract {
        #[command(flatten)]
        input: InputArgs,

        /// Metric table
        #[arg(long, short, value_name = "PATH")]
        output: PathBuf,

        /// Decrypt statistics artifacts for gc_content
        #[arg(long)]
        include_crypt: bool,

        /// Single-character column delimiter
        #[arg(long, value_name = "CHAR")]
        delimiter: Option<String>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Serve analysis requests over stdin/stdout (used by the process pool)
    #[command(hide = true)]
    Worker {
        /// Analyzer settings as JSON
        #[arg(long)]
        settings: String,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(long, value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration as TOML
    #[command(long_about = "Display the effective configuration in TOML format.

Fields left at their defaults that are not serialized are shown as
commented-out templates.

EXAMPLE:
    qcscan config show
    qcscan --config ./site.toml config show")]
    Show,
}
