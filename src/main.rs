use tokenbench::benchmark::BenchmarkTokenizers;
use tokenbench::config::{Configuration, ResourcePaths};
use tokenbench::env::EnvironmentVariables;
use tokenbench::{corpus, database, metrics, tokenizer};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber, filter::LevelFilter};

#[derive(Parser, Debug)]
#[command(name = "tokenbench")]
#[command(about = "Benchmark text tokenizers over a document corpus and store the results in DuckDB", long_about = None)]
struct Cli {
    #[command(flatten)]
    globals: Globals,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct Globals {
    /// Project root holding `resources/`, `settings/` and `setup/`
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    /// Configuration file [default: <root>/settings/configurations.json]
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Environment file with the access token [default: <root>/setup/variables/.env]
    #[arg(long, value_name = "FILE", global = true)]
    env_file: Option<PathBuf>,

    /// Output database path [default: <root>/resources/database/TOKENEXPLORER.duckdb]
    #[arg(short, long, value_name = "FILE", global = true)]
    database: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute word statistics of the corpus
    Stats {
        /// Corpus: a text file, a .jsonl file or a directory of .txt files
        corpus: PathBuf,
    },

    /// Tokenize the corpus with every configured tokenizer
    Benchmark { corpus: PathBuf },

    /// Compute normalized sequence lengths from stored benchmark results
    Nsl,

    /// Run statistics, benchmarks and NSL in sequence
    Run { corpus: PathBuf },
}

fn init_tracing(verbose: u8) -> Result<()> {
    let default_log_directive = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(default_log_directive.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")
}

fn path_or(path: Option<&Path>, default: &Path) -> PathBuf {
    path.unwrap_or(default).to_path_buf()
}

fn database_path(path: &Path) -> Result<&str> {
    path.to_str()
        .context(format!("Database path {} is not valid UTF-8", path.display()))
}

fn open_benchmark(globals: &Globals, with_tokenizers: bool) -> Result<BenchmarkTokenizers> {
    let paths = ResourcePaths::new(&globals.root);
    paths.ensure_dirs()?;

    let config_path = path_or(globals.config.as_deref(), &paths.config_file);
    let configuration = Configuration::load(&config_path)?;
    debug!(?configuration, "Configuration loaded");

    let tokenizers = if with_tokenizers {
        let env_path = path_or(globals.env_file.as_deref(), &paths.env_file);
        let env = EnvironmentVariables::load(&env_path);
        tokenizer::load_tokenizers(&configuration, &paths, &env)?
    } else {
        Vec::new()
    };

    let db_path = path_or(globals.database.as_deref(), &paths.database_file);
    let db = database::Database::init(database_path(&db_path)?)?;
    info!(path = %db_path.display(), "Database opened");

    Ok(BenchmarkTokenizers::new(
        configuration.benchmarks,
        paths,
        db,
        tokenizers,
    ))
}

fn print_dataset_summary(bench: &BenchmarkTokenizers, documents: &[String]) -> Result<()> {
    let stats = bench.aggregate_dataset_stats(documents)?;
    let total_words: usize = stats.iter().map(|doc| doc.words_count).sum();

    println!("\n=== Dataset ===");
    println!("Documents:    {}", stats.len());
    println!("Words:        {}", total_words);
    println!(
        "Words/doc:    {:.1}",
        metrics::guarded_ratio(total_words, stats.len())
    );
    Ok(())
}

fn print_benchmark_summary(bench: &BenchmarkTokenizers, documents: &[String]) -> Result<()> {
    let start = std::time::Instant::now();
    let merged = bench.run_tokenizer_benchmarks(documents)?;
    let elapsed = start.elapsed();

    println!("\n=== Tokenizers ===");
    println!(
        "{:<40} {:>6} {:>12} {:>12} {:>12}",
        "Tokenizer", "Docs", "Tokens/doc", "Tokens/word", "Chars/token"
    );
    for summary in metrics::summarize(&merged) {
        println!(
            "{:<40} {:>6} {:>12.1} {:>12.3} {:>12.3}",
            summary.tokenizer,
            summary.documents,
            summary.mean_tokens_count,
            summary.mean_tokens_to_words_ratio,
            summary.mean_bytes_per_token
        );
    }
    println!("Time:         {:.2}s", elapsed.as_secs_f64());
    Ok(())
}

fn print_nsl_summary(bench: &BenchmarkTokenizers) -> Result<()> {
    let Some(nsl_rows) = bench.normalized_sequence_length()? else {
        println!("\nNo custom tokenizer results; NSL skipped");
        return Ok(());
    };

    println!("\n=== NSL ===");
    for (name, mean) in metrics::mean_nsl(&nsl_rows) {
        println!("{:<40} {:>8.3}", name, mean);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.globals.verbose)?;

    match &cli.command {
        Command::Stats { corpus } => {
            let documents = corpus::load_documents(corpus)?;
            let bench = open_benchmark(&cli.globals, false)?;
            print_dataset_summary(&bench, &documents)?;
        }
        Command::Benchmark { corpus } => {
            let documents = corpus::load_documents(corpus)?;
            let bench = open_benchmark(&cli.globals, true)?;
            print_benchmark_summary(&bench, &documents)?;
        }
        Command::Nsl => {
            let bench = open_benchmark(&cli.globals, false)?;
            print_nsl_summary(&bench)?;
        }
        Command::Run { corpus } => {
            let documents = corpus::load_documents(corpus)?;
            let bench = open_benchmark(&cli.globals, true)?;
            print_dataset_summary(&bench, &documents)?;
            print_benchmark_summary(&bench, &documents)?;
            print_nsl_summary(&bench)?;
        }
    }

    Ok(())
}
