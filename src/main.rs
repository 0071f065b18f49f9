use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

use rkscan::hash::Method;
use rkscan::search::SearchEngine;
use rkscan::sweep::{self, PatternSource, SweepConfig};
use rkscan::{report, util};

#[derive(Parser)]
#[command(name = "rkscan", about = "Rabin-Karp search with pluggable hash functions")]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the first occurrence of a pattern with each hash function
    Find {
        /// Text file to search
        #[arg(long)]
        text: PathBuf,
        /// Pattern to look for
        #[arg(long, short)]
        pattern: String,
        /// Hash functions to use (default: all, plus direct comparison)
        #[arg(long = "hash", value_delimiter = ',')]
        methods: Vec<Method>,
    },
    /// Measure every hash function across a range of pattern lengths
    Sweep {
        /// Text file, or directory of .txt files
        #[arg(long, env = "RKSCAN_CORPUS")]
        corpus: PathBuf,
        /// Directory for the CSV and summary reports
        #[arg(long, short)]
        output: PathBuf,
        /// Pattern lengths to measure
        #[arg(long, value_delimiter = ',')]
        lengths: Vec<usize>,
        /// Offset in the text where patterns are cut from
        #[arg(long, default_value_t = sweep::DEFAULT_OFFSET)]
        offset: usize,
        /// File with one pattern per line, searched instead of cut-out patterns
        #[arg(long, conflicts_with_all = ["lengths", "offset"])]
        patterns: Option<PathBuf>,
        /// Hash functions to use (default: all, plus direct comparison)
        #[arg(long = "hash", value_delimiter = ',')]
        methods: Vec<Method>,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("rkscan={}", level))),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn or_all(methods: Vec<Method>) -> Vec<Method> {
    if methods.is_empty() {
        Method::ALL.to_vec()
    } else {
        methods
    }
}

fn run_find(pattern: &[char], text: &[char], methods: &[Method]) {
    for &method in methods {
        let mut engine = SearchEngine::new(method);
        let position = engine.find(pattern, text);
        let stats = engine.stats();

        println!("\n{}", method);
        match position {
            Some(pos) => println!("  Found at position: {}", pos),
            None => println!("  Not found"),
        }
        println!("  Collisions: {}", stats.collisions);
        println!("  Checks: {}", stats.checks);
        println!("  Rehashes: {}", stats.rehashes);
        println!("  Time: {:.3} ms", stats.elapsed.as_secs_f64() * 1000.0);
    }
}

/// One pattern per non-empty line.
fn read_patterns(path: &Path) -> Result<Vec<String>> {
    let content = util::load_text(path)?;
    let patterns: Vec<String> = content
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    if patterns.is_empty() {
        bail!("No patterns in {}", path.display());
    }
    Ok(patterns)
}

/// Load every corpus text concurrently, then sweep them one at a time so each
/// sweep has the whole rayon pool. Returns the number of texts measured.
async fn run_sweep(corpus: &Path, output: &Path, config: SweepConfig) -> Result<usize> {
    let corpus_owned = corpus.to_path_buf();
    let files = tokio::task::spawn_blocking(move || util::corpus_files(&corpus_owned)).await??;

    std::fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory: {}", output.display()))?;

    let mut loads = tokio::task::JoinSet::new();
    for (idx, path) in files.into_iter().enumerate() {
        loads.spawn_blocking(move || -> Result<(usize, PathBuf, String)> {
            let text = util::load_text(&path)?;
            Ok((idx, path, text))
        });
    }

    let mut texts = Vec::new();
    while let Some(loaded) = loads.join_next().await {
        texts.push(loaded??);
    }
    texts.sort_by_key(|(idx, _, _)| *idx);

    let count = texts.len();
    for (_, path, text) in texts {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .with_context(|| format!("Non-UTF8 file name: {}", path.display()))?
            .to_string();
        let fingerprint = util::fingerprint(&text);

        let sweep_config = config.clone();
        let (text_len, rows) = tokio::task::spawn_blocking(move || {
            let chars: Vec<char> = text.chars().collect();
            (chars.len(), sweep::sweep(&chars, &sweep_config))
        })
        .await?;

        let csv_path = output.join(format!("{}.csv", stem));
        let summary_path = output.join(format!("{}_summary.txt", stem));
        report::write_csv(&csv_path, &rows)?;
        let summary =
            report::render_summary(&path.display().to_string(), &fingerprint, text_len, &rows);
        report::write_summary(&summary_path, &summary)?;

        info!(
            text = %path.display(),
            rows = rows.len(),
            csv = %csv_path.display(),
            "reports written"
        );
    }

    Ok(count)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Find {
            text,
            pattern,
            methods,
        } => {
            let path = text.clone();
            let loaded = tokio::task::spawn_blocking(move || util::load_text(&path)).await??;
            let chars: Vec<char> = loaded.chars().collect();
            let pattern: Vec<char> = pattern.chars().collect();

            println!("Searching...");
            println!("  Text: {} ({} characters)", text.display(), chars.len());
            println!("  Pattern length: {}", pattern.len());

            run_find(&pattern, &chars, &or_all(methods));
        }
        Commands::Sweep {
            corpus,
            output,
            lengths,
            offset,
            patterns,
            methods,
        } => {
            let patterns = match patterns {
                Some(path) => PatternSource::Fixed(
                    tokio::task::spawn_blocking(move || read_patterns(&path)).await??,
                ),
                None => PatternSource::Slice {
                    offset,
                    lengths: if lengths.is_empty() {
                        sweep::DEFAULT_LENGTHS.to_vec()
                    } else {
                        lengths
                    },
                },
            };
            let config = SweepConfig {
                patterns,
                methods: or_all(methods),
            };

            println!("Running sweep...");
            println!("  Corpus: {}", corpus.display());
            println!("  Output: {}", output.display());

            let start = Instant::now();
            let measured = run_sweep(&corpus, &output, config).await?;

            println!("\nSweep finished!");
            println!("  Texts measured: {}", measured);
            println!("  Time elapsed: {:.3}s", start.elapsed().as_secs_f64());
        }
    }

    Ok(())
}
