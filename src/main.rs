// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::fs::File;
use std::io::BufReader;
use std::io::Write;
use std::path::{Path, PathBuf};

use beadalign::app_config::{self, Config, EmbeddingProviderKind, TieBreak};
use beadalign::app_controller::Controller;

/// CLI Wrapper for EmbeddingProviderKind to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliEmbeddingProvider {
    Ollama,
    Hashing,
}

impl From<CliEmbeddingProvider> for EmbeddingProviderKind {
    fn from(cli_provider: CliEmbeddingProvider) -> Self {
        match cli_provider {
            CliEmbeddingProvider::Ollama => EmbeddingProviderKind::Ollama,
            CliEmbeddingProvider::Hashing => EmbeddingProviderKind::Hashing,
        }
    }
}

/// CLI Wrapper for TieBreak to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTieBreak {
    CatalogOrder,
    LargerSpan,
}

impl From<CliTieBreak> for TieBreak {
    fn from(cli_tie_break: CliTieBreak) -> Self {
        match cli_tie_break {
            CliTieBreak::CatalogOrder => TieBreak::CatalogOrder,
            CliTieBreak::LargerSpan => TieBreak::LargerSpan,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Align every document of a sentence corpus
    Align(AlignArgs),

    /// Merge pairwise alignments in a directory into multi-way groups
    Merge(MergeArgs),

    /// Generate shell completions for beadalign
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Options shared by every command that loads the configuration
#[derive(Parser, Debug)]
struct CommonArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "beadalign.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(Parser, Debug)]
struct AlignArgs {
    /// JSON corpus: {document: {language: [sentence, ...]}}
    #[arg(value_name = "SENTENCES_JSON")]
    input_file: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Also write the multi-way merge outputs
    #[arg(long)]
    merge: bool,

    /// Source language code (e.g., 'en', 'de', 'zh')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language codes; defaults to every other language of the corpus
    #[arg(short, long, value_delimiter = ',')]
    target_languages: Option<Vec<String>>,

    /// Embedding provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliEmbeddingProvider>,

    /// Embedding model name
    #[arg(short, long)]
    model: Option<String>,

    /// Maximum number of sentences on one side of a bead
    #[arg(long)]
    max_align: Option<usize>,

    /// Window radius of the second pass
    #[arg(long)]
    win: Option<usize>,

    /// Rule for equal-cost alignment types
    #[arg(long, value_enum)]
    tie_break: Option<CliTieBreak>,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Parser, Debug)]
struct MergeArgs {
    /// Directory holding <lang>_sentences/_alignments/_scores.json files
    #[arg(value_name = "DIR")]
    dir: PathBuf,

    /// Source language shared by the pairwise alignments
    #[arg(short, long)]
    source: Option<String>,

    /// Minimum group confidence for the sentence export
    #[arg(long)]
    min_confidence: Option<f32>,

    /// Export groups of any shape, not only one sentence per language
    #[arg(long)]
    all_shapes: bool,

    #[command(flatten)]
    common: CommonArgs,
}

/// beadalign - multilingual sentence aligner
///
/// Aligns sentence-split translations with a two-pass dynamic program over
/// cross-lingual span embeddings, then merges pairwise alignments into
/// multi-parallel groups.
#[derive(Parser, Debug)]
#[command(name = "beadalign")]
#[command(version)]
#[command(about = "Multilingual sentence aligner built on cross-lingual span embeddings")]
#[command(long_about = "beadalign aligns sentences across translations and merges the results into multi-parallel groups.

EXAMPLES:
    beadalign align corpus.json -o out/                 # Align with the default config
    beadalign align corpus.json -o out/ -s en -t de,fr  # Pick source and targets
    beadalign align corpus.json -o out/ --merge         # Also write multi-way outputs
    beadalign align corpus.json -p hashing              # Offline, no embedding server
    beadalign merge out/ --source en                    # Merge existing pairwise files
    beadalign completions bash > beadalign.bash         # Generate bash completions

CONFIGURATION:
    Configuration is stored in beadalign.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI colour for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌", "1;31"),
            Level::Warn => ("🚧", "1;33"),
            Level::Info => (" ", "1;32"),
            Level::Debug => ("🔍", "1;36"),
            Level::Trace => ("📋", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (emoji, colour) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", colour, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Trace is the ceiling; the effective level is set once the config is loaded
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "beadalign", &mut std::io::stdout());
            Ok(())
        }
        Commands::Align(args) => run_align(args).await,
        Commands::Merge(args) => run_merge(args),
    }
}

/// Load the configuration file, or write a default one when it is missing
fn load_config(common: &CommonArgs) -> Result<Config> {
    if let Some(cmd_log_level) = &common.log_level {
        log::set_max_level(level_filter(&cmd_log_level.clone().into()));
    }

    let config_path = &common.config_path;
    let mut config = if Path::new(config_path).exists() {
        let file = File::open(config_path).context(format!("Failed to open config file: {}", config_path))?;

        let reader = BufReader::new(file);
        serde_json::from_reader(reader).context(format!("Failed to parse config file: {}", config_path))?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);

        let config = Config::default();
        let config_json =
            serde_json::to_string_pretty(&config).context("Failed to serialize default config to JSON")?;

        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;

        config
    };

    if let Some(log_level) = &common.log_level {
        config.log_level = log_level.clone().into();
    } else {
        log::set_max_level(level_filter(&config.log_level));
    }

    Ok(config)
}

async fn run_align(options: AlignArgs) -> Result<()> {
    let mut config = load_config(&options.common)?;

    // Override config with CLI options if provided
    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }
    if let Some(targets) = &options.target_languages {
        config.target_languages = targets.clone();
    }
    if let Some(provider) = &options.provider {
        config.embedding.provider = provider.clone().into();
    }
    if let Some(model) = &options.model {
        config.embedding.model = model.clone();
    }
    if let Some(max_align) = options.max_align {
        config.aligner.max_align = max_align;
    }
    if let Some(win) = options.win {
        config.aligner.win = win;
    }
    if let Some(tie_break) = &options.tie_break {
        config.aligner.tie_break = tie_break.clone().into();
    }

    config.validate().context("Configuration validation failed")?;

    let controller = Controller::with_config(config)?;
    let summary = controller
        .run(options.input_file, options.output_dir, options.merge)
        .await?;

    if summary.failed > 0 {
        warn!("{} of {} documents could not be aligned", summary.failed, summary.documents);
    }
    Ok(())
}

fn run_merge(options: MergeArgs) -> Result<()> {
    let mut config = load_config(&options.common)?;

    if let Some(source) = &options.source {
        config.source_language = source.clone();
    }
    if options.min_confidence.is_some() {
        config.merge.min_confidence = options.min_confidence;
    }
    if options.all_shapes {
        config.merge.one_to_one_only = false;
    }

    config.validate().context("Configuration validation failed")?;

    let controller = Controller::with_config(config.clone())?;
    let summary = controller.run_merge(&options.dir, &config.source_language)?;
    info!(
        "Wrote {} multi-way groups for {} documents to {}",
        summary.groups,
        summary.documents,
        options.dir.display()
    );
    Ok(())
}
