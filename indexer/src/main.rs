mod fetch;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, EnvFilter};
use webidx_core::config::PipelineConfig;
use webidx_core::{DuplicatePolicy, IdScheme, IndexStore, MergeReport, Pipeline};

use crate::fetch::Fetcher;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Fold web pages into a term-frequency inverted index", long_about = None)]
struct Cli {
    /// JSON config file; flags below override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Index directory
    #[arg(long, global = true)]
    index: Option<PathBuf>,
    /// Write per-stage text files into this directory
    #[arg(long, global = true)]
    stage_dir: Option<PathBuf>,
    /// Line-delimited stopword list
    #[arg(long, global = true)]
    stopwords: Option<PathBuf>,
    /// How document ids are derived from URLs
    #[arg(long, global = true, value_enum)]
    id_scheme: Option<SchemeArg>,
    /// Append a posting again when a document is re-indexed
    #[arg(long, global = true, default_value_t = false)]
    append_duplicates: bool,
    /// External tagger command line, e.g. "java -cp tagger.jar Tagger"
    #[arg(long, global = true)]
    tagger: Option<String>,
    /// Request timeout seconds
    #[arg(long, global = true, default_value_t = 12)]
    timeout_secs: u64,
    /// User-Agent string used when fetching
    #[arg(long, global = true, default_value = "webidx-bot/0.1")]
    user_agent: String,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum SchemeArg {
    CharSum,
    Sha1,
}

#[derive(Subcommand)]
enum Commands {
    /// Prompt for URLs on stdin and index each one (default)
    Interactive,
    /// Index the given URLs or HTML files in order
    Add {
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Print a summary of the persisted index
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let mut cli = Cli::parse();
    let cfg = load_config(&cli)?;

    let store = IndexStore::open(&cfg.index_dir, cfg.duplicate_policy)?;
    match cli.command.take().unwrap_or(Commands::Interactive) {
        Commands::Stats => print_stats(&store),
        Commands::Add { urls } => {
            let (pipeline, fetcher) = build(&cfg, &cli)?;
            let mut failed = 0usize;
            for url in &urls {
                if !index_url(&pipeline, &fetcher, &store, url).await {
                    failed += 1;
                }
            }
            tracing::info!(total = urls.len(), failed, "done");
            Ok(())
        }
        Commands::Interactive => {
            let (pipeline, fetcher) = build(&cfg, &cli)?;
            interactive(&pipeline, &fetcher, &store).await
        }
    }
}

fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut cfg = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(index) = &cli.index { cfg.index_dir = index.clone(); }
    if let Some(dir) = &cli.stage_dir { cfg.stage_dir = Some(dir.clone()); }
    if let Some(path) = &cli.stopwords { cfg.stopwords = Some(path.clone()); }
    if let Some(scheme) = cli.id_scheme {
        cfg.id_scheme = match scheme {
            SchemeArg::CharSum => IdScheme::CharSum,
            SchemeArg::Sha1 => IdScheme::Sha1,
        };
    }
    if cli.append_duplicates { cfg.duplicate_policy = DuplicatePolicy::Append; }
    if let Some(command) = &cli.tagger {
        cfg.tagger.command = command.split_whitespace().map(String::from).collect();
    }
    Ok(cfg)
}

fn build(cfg: &PipelineConfig, cli: &Cli) -> Result<(Pipeline, Fetcher)> {
    let pipeline = Pipeline::from_config(cfg)?;
    let fetcher = Fetcher::new(&cli.user_agent, Duration::from_secs(cli.timeout_secs))?;
    tracing::info!(index = ?cfg.index_dir, id_scheme = ?cfg.id_scheme, policy = ?cfg.duplicate_policy, "pipeline ready");
    Ok((pipeline, fetcher))
}

async fn interactive(pipeline: &Pipeline, fetcher: &Fetcher, store: &IndexStore) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("Enter URL: ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else { break };
        let url = line.trim();
        if url.is_empty() { continue; }
        if matches!(url, "quit" | "exit") { break; }
        index_url(pipeline, fetcher, store, url).await;
    }
    Ok(())
}

/// Fetch and index one page. Failures are logged and do not stop the run.
async fn index_url(pipeline: &Pipeline, fetcher: &Fetcher, store: &IndexStore, url: &str) -> bool {
    let page = match fetcher.fetch(url).await {
        Ok(page) => page,
        Err(e) => {
            tracing::error!(url, error = %e, "fetch failed");
            return false;
        }
    };
    let doc = pipeline.document(url, &page);
    match pipeline.index(store, &doc) {
        Ok(report) => {
            print_report(url, &report);
            true
        }
        Err(e) => {
            tracing::error!(url, doc_id = doc.id, error = %e, "indexing failed");
            false
        }
    }
}

fn print_report(url: &str, report: &MergeReport) {
    println!(
        "indexed {} as {}: {} new terms, {} postings added, {} already listed, {} terms total{}",
        url,
        report.doc_id,
        report.stats.inserted,
        report.stats.matched,
        report.stats.skipped_duplicates,
        report.num_terms,
        if report.recovered { " (rebuilt malformed index)" } else { "" }
    );
}

fn print_stats(store: &IndexStore) -> Result<()> {
    let index = store.load()?;
    let docs = store.documents()?;
    let postings: usize = index.entries().iter().map(|e| e.postings.len()).sum();
    println!("index: {}", store.paths().index().display());
    println!("terms: {}  documents: {}  postings: {}", index.len(), docs.len(), postings);
    if let Some(meta) = store.meta()? {
        println!("updated: {}  version: {}", meta.updated_at, meta.version);
    }
    for (id, url) in &docs {
        println!("{id:>20}  {url}");
    }
    Ok(())
}
