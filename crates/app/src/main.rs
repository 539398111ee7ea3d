use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use rag_ingest_core::{
    ingest_folder, ingest_folder_best_effort, load_and_split, AppConfig, Document, LoaderRegistry,
    LoaderRequest, Metadata, RecursiveTextSplitter, SplitterConfig, DEFAULT_SEPARATORS,
};
use serde_json::Value;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const PREVIEW_CHARS: usize = 150;

#[derive(Parser)]
#[command(name = "rag-ingest", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a single file and summarize the documents it produces.
    Load {
        /// File to load (.txt, .pdf or .csv).
        path: PathBuf,
        /// Extra metadata as key=value; overrides the base fields.
        #[arg(long = "meta", value_parser = parse_key_value)]
        metadata: Vec<(String, String)>,
    },
    /// Load a single file and split it into chunks.
    Split {
        /// File to load (.txt, .pdf or .csv).
        path: PathBuf,
        /// Extra metadata as key=value; overrides the base fields.
        #[arg(long = "meta", value_parser = parse_key_value)]
        metadata: Vec<(String, String)>,
        #[command(flatten)]
        splitter: SplitterArgs,
        /// Print chunks as a JSON array instead of text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Load and split every supported file under a folder.
    Ingest {
        /// Folder that contains documents recursively.
        #[arg(long)]
        folder: PathBuf,
        /// Skip files that fail to load instead of aborting.
        #[arg(long, default_value_t = false)]
        best_effort: bool,
        #[command(flatten)]
        splitter: SplitterArgs,
    },
    /// Print the resolved configuration as JSON.
    Config,
}

#[derive(Args)]
struct SplitterArgs {
    /// Maximum characters per chunk [default: 1000]
    #[arg(long, env = "RAG_CHUNK_SIZE")]
    chunk_size: Option<usize>,
    /// Characters shared between consecutive chunks [default: 200]
    #[arg(long, env = "RAG_CHUNK_OVERLAP")]
    chunk_overlap: Option<usize>,
    /// Separator in priority order; repeat for more. Defaults to paragraph, line,
    /// sentence, phrase, word, character.
    #[arg(long = "separator")]
    separators: Vec<String>,
    /// Treat separators as regular expressions.
    #[arg(long, default_value_t = false)]
    separator_regex: bool,
    /// Drop separators instead of keeping them at the start of the next chunk piece.
    #[arg(long, default_value_t = false)]
    drop_separator: bool,
    /// Record each chunk's position under `chunk_index`.
    #[arg(long, default_value_t = false)]
    chunk_index: bool,
}

impl SplitterArgs {
    fn build(&self, config: &AppConfig) -> anyhow::Result<RecursiveTextSplitter> {
        let defaults = config.splitter_config();
        let separators: Vec<String> = if self.separators.is_empty() {
            DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect()
        } else {
            self.separators.iter().map(|s| unescape(s)).collect()
        };

        let splitter_config = SplitterConfig::new(
            self.chunk_size.unwrap_or(defaults.chunk_size),
            self.chunk_overlap.unwrap_or(defaults.chunk_overlap),
        )
        .with_separators(separators)
        .with_separator_regex(self.separator_regex)
        .with_keep_separator(!self.drop_separator)
        .with_chunk_index(self.chunk_index);

        RecursiveTextSplitter::new(splitter_config).context("invalid splitter settings")
    }
}

fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");
    let dotenv = dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("failed to read configuration")?;
    info!(
        version = app_version,
        dotenv = ?dotenv,
        vector_store = ?config.vector_store.kind(),
        "rag-ingest boot"
    );

    let registry = LoaderRegistry::new();

    match cli.command {
        Command::Load { path, metadata } => {
            let request = LoaderRequest::new(&path)?.with_metadata(to_metadata(metadata));
            let documents = registry.load(request)?;

            println!("Successfully loaded {} document(s):", documents.len());
            for (index, document) in documents.iter().enumerate() {
                print_summary(index, document);
            }
        }
        Command::Split {
            path,
            metadata,
            splitter,
            json,
        } => {
            let splitter = splitter.build(&config)?;
            let request = LoaderRequest::new(&path)?.with_metadata(to_metadata(metadata));
            let chunks = load_and_split(request, &registry, &splitter)?;
            info!(path = %path.display(), chunk_count = chunks.len(), "split file");

            if json {
                println!("{}", serde_json::to_string_pretty(&chunks)?);
            } else {
                for (index, chunk) in chunks.iter().enumerate() {
                    println!("--- chunk {} ({} chars)", index + 1, chunk.char_len());
                    println!("{}", chunk.content);
                }
            }
        }
        Command::Ingest {
            folder,
            best_effort,
            splitter,
        } => {
            let splitter = splitter.build(&config)?;
            let config = config.initialize()?;
            debug!(data_dir = %config.data_dir.display(), "data directory ready");

            let chunks = if best_effort {
                let report = ingest_folder_best_effort(&folder, &registry, &splitter)?;
                if !report.skipped_files.is_empty() {
                    warn!(
                        "skipped_files={} for folder={}",
                        report.skipped_files.len(),
                        folder.display()
                    );
                    for skipped in &report.skipped_files {
                        warn!(path = %skipped.path.display(), reason = %skipped.reason, "skipped file");
                    }
                }
                if report.loaded_files == 0 {
                    bail!("all files in {} were skipped", folder.display());
                }
                report.chunks
            } else {
                ingest_folder(&folder, &registry, &splitter)?
            };

            info!(folder = %folder.display(), chunk_count = chunks.len(), "ingested folder");
            println!("{} chunks ready for embedding", chunks.len());
        }
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn print_summary(index: usize, document: &Document) {
    debug!(index, metadata = ?document.metadata, "loaded document");
    let preview: String = document.content.chars().take(PREVIEW_CHARS).collect();

    println!("\nDocument {}:", index + 1);
    println!("  Source: {}", document.source().unwrap_or("-"));
    println!("  Type: {}", document.file_type().unwrap_or("-"));
    println!("  Content length: {} characters", document.char_len());
    println!("  Preview: {preview}...");
}

fn to_metadata(pairs: Vec<(String, String)>) -> Metadata {
    pairs
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect()
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got {raw:?}")),
    }
}

/// Lets `--separator '\n\n'` mean two newlines on the command line.
fn unescape(raw: &str) -> String {
    raw.replace("\\n", "\n")
        .replace("\\t", "\t")
        .replace("\\r", "\r")
}
