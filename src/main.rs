use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use jsonvec_schema::{JsonVectorizer, VectorizerConfig, DEFAULT_CHUNK_SIZE};
use jsonvec_storage::{create_output, load_from_path, write_rows, DocumentReader, SnapshotManager};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Schema inference and sparse feature extraction for JSON documents
#[derive(Parser, Debug)]
#[command(name = "jsonvec")]
#[command(about = "Learn a schema from JSON documents and vectorize them", long_about = None)]
struct Cli {
    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Learn and prune a schema, writing its JSON representation
    Learn {
        #[command(flatten)]
        learning: LearningArgs,

        /// Output file for the schema, `-` for stdout
        #[arg(short, long, default_value = "-")]
        output: PathBuf,
    },
    /// Learn, prune and fit a vectorizer, saving it as a snapshot
    Fit {
        #[command(flatten)]
        learning: LearningArgs,

        /// Directory holding snapshots
        #[arg(long, default_value = "./snapshots")]
        snapshot_dir: PathBuf,

        /// Snapshot name, timestamped when omitted
        #[arg(long)]
        name: Option<String>,
    },
    /// Transform documents with a fitted snapshot, one JSON array of hot
    /// columns per line
    Transform {
        /// Snapshot file
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Input JSON-lines file (`.gz` and `.lz4` supported, `-` for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Output file (`.gz` and `.lz4` supported, `-` for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Documents per batch
        #[arg(long, default_value_t = 10_000)]
        batch_size: usize,

        /// Transform each batch on all cores
        #[arg(long)]
        parallel: bool,
    },
    /// Print the feature names of a snapshot
    Inspect {
        /// Snapshot file
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Print the schema representation instead
        #[arg(long)]
        schema: bool,
    },
}

#[derive(Args, Debug)]
struct LearningArgs {
    /// Input JSON-lines files (`.gz` and `.lz4` supported, `-` for stdin)
    #[arg(short, long, required = true, num_args = 1..)]
    input: Vec<PathBuf>,

    /// Vectorizer configuration (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Documents per batch
    #[arg(long, default_value_t = 10_000)]
    batch_size: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Command::Learn { learning, output } => {
            let vectorizer = learn(&learning)?;
            let repr = vectorizer.schema().to_representation();
            let mut out = create_output(&output)?;
            serde_json::to_writer_pretty(&mut out, &repr)?;
            writeln!(out)?;
            out.flush()?;
        }
        Command::Fit {
            learning,
            snapshot_dir,
            name,
        } => {
            let mut vectorizer = learn(&learning)?;
            let n_features = vectorizer.fit(None)?;
            info!("Fitted {} features", n_features);

            let manager = SnapshotManager::new(&snapshot_dir)
                .with_context(|| format!("cannot use snapshot directory {}", snapshot_dir.display()))?;
            let description = match name {
                Some(name) => manager.save(&name, &vectorizer.snapshot())?,
                None => manager.create("jsonvec", &vectorizer.snapshot())?,
            };
            info!(
                "Saved snapshot {} ({} bytes)",
                manager.snapshot_path(&description.name).display(),
                description.size
            );
        }
        Command::Transform {
            snapshot,
            input,
            output,
            batch_size,
            parallel,
        } => {
            let vectorizer = load_vectorizer(&snapshot)?;
            let reader = DocumentReader::open(&input)
                .with_context(|| format!("cannot open {}", input.display()))?;
            let mut out = create_output(&output)?;

            let mut n_documents = 0usize;
            for batch in reader.batches(batch_size) {
                let batch = batch?;
                let matrix = if parallel {
                    vectorizer.par_transform(&batch, DEFAULT_CHUNK_SIZE)?
                } else {
                    vectorizer.transform(&batch)?
                };
                write_rows(&mut out, &matrix)?;
                n_documents += batch.len();
            }
            out.flush()?;
            info!("Transformed {} documents into {} features", n_documents, vectorizer.n_features());
        }
        Command::Inspect { snapshot, schema } => {
            let vectorizer = load_vectorizer(&snapshot)?;
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            if schema {
                serde_json::to_writer_pretty(&mut out, &vectorizer.schema().to_representation())?;
                writeln!(out)?;
            } else {
                for (column, name) in vectorizer.feature_names().iter().enumerate() {
                    writeln!(out, "{}\t{}", column, name)?;
                }
            }
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<VectorizerConfig> {
    let Some(path) = path else {
        return Ok(VectorizerConfig::default());
    };
    let text = fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    VectorizerConfig::from_json_str(&text).with_context(|| format!("invalid configuration {}", path.display()))
}

/// Extend a vectorizer with every input, then prune it as configured
fn learn(args: &LearningArgs) -> Result<JsonVectorizer> {
    let config = load_config(args.config.as_deref())?;
    let mut vectorizer = config.build()?;

    for input in &args.input {
        let reader = DocumentReader::open(input).with_context(|| format!("cannot open {}", input.display()))?;
        for batch in reader.batches(args.batch_size) {
            vectorizer.extend(&batch?)?;
        }
        info!("Learned {} ({} documents so far)", input.display(), vectorizer.n_documents());
    }

    if let Some(spec) = &config.prune {
        let dropped = vectorizer.prune_with(spec)?;
        info!("Pruned {} schema entries", dropped.len());
        for entry in &dropped {
            debug!("dropped {}", entry);
        }
    }
    Ok(vectorizer)
}

fn load_vectorizer(path: &Path) -> Result<JsonVectorizer> {
    let snapshot = load_from_path(path).with_context(|| format!("cannot load snapshot {}", path.display()))?;
    Ok(JsonVectorizer::from_snapshot(&snapshot)?)
}
