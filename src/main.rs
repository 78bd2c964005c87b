use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use studysim::{
    explain_pair, read_matrix, run_abstracts, run_features, CacheUpdater, GeminiClient,
    PipelineConfig, RecordId,
};
use tracing::{info, Level};
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

/// Refresh the feature- and abstract-similarity matrices of a study dataset
#[derive(Parser, Debug)]
#[command(name = "studysim")]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Dataset CSV, overrides the config file
    #[arg(long, global = true)]
    dataset: Option<PathBuf>,

    /// Embedding store CSV, overrides the config file
    #[arg(long, global = true)]
    embedding_store: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Feature matrix, then embedding update and abstract matrix
    Run {
        /// Create an empty embedding store if none exists
        #[arg(long)]
        init_store: bool,
    },
    /// Feature matrix only
    Features,
    /// Embedding update and abstract matrix only
    Abstracts {
        #[arg(long)]
        init_store: bool,
    },
    /// Per-column score breakdown for one pair of records
    Explain {
        #[arg(long)]
        a: u64,
        #[arg(long)]
        b: u64,
    },
    /// Most similar records in a persisted matrix
    Similar {
        #[arg(long)]
        matrix: PathBuf,
        #[arg(long)]
        id: u64,
        #[arg(long, default_value_t = 10)]
        top: usize,
        #[arg(long)]
        threshold: Option<f64>,
    },
}

fn init_logging(level: &str) -> anyhow::Result<()> {
    let level = match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    // RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::default().add_directive(LevelFilter::from_level(level).into())
    });

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

async fn abstracts(config: &PipelineConfig, init_store: bool) -> anyhow::Result<()> {
    let client = GeminiClient::from_env(&config.embedding.provider)
        .context("creating embedding client")?;
    info!(model = client.model(), "Embedding client ready");
    let updater = CacheUpdater::new(client, config.embedding.updater.clone());
    let outcome = run_abstracts(config, &updater, init_store).await?;
    info!(
        embedded = outcome.report.embedded.len(),
        failed = outcome.report.failed.len(),
        records = outcome.similarity.raw.len(),
        "Abstract pipeline finished"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level)?;

    let mut config = PipelineConfig::load(args.config.as_deref())?;
    if let Some(dataset) = args.dataset {
        config.dataset = dataset;
    }
    if let Some(store) = args.embedding_store {
        config.embedding_store = store;
    }

    info!("studysim v{}", env!("CARGO_PKG_VERSION"));

    match args.command {
        Command::Run { init_store } => {
            run_features(&config)?;
            abstracts(&config, init_store).await?;
        }
        Command::Features => {
            let result = run_features(&config)?;
            info!(records = result.raw.len(), "Feature pipeline finished");
        }
        Command::Abstracts { init_store } => abstracts(&config, init_store).await?,
        Command::Explain { a, b } => {
            let explanation = explain_pair(&config, RecordId(a), RecordId(b))?;
            info!(
                score = explanation.score,
                top = ?explanation.top_contributing_column(),
                missing = explanation.missing_count(),
                "Pair explained"
            );
            println!("{}", serde_json::to_string_pretty(&explanation)?);
        }
        Command::Similar {
            matrix,
            id,
            top,
            threshold,
        } => {
            let matrix = read_matrix(&matrix)
                .with_context(|| format!("reading matrix {}", matrix.display()))?;
            let neighbors = matrix.neighbors(RecordId(id), top, threshold)?;
            let json: Vec<_> = neighbors
                .into_iter()
                .map(|(id, score)| serde_json::json!({ "id": id, "score": score }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(())
}
