mod server;

use chrono::Utc;
use clap::{Parser, Subcommand};
use product_qa_core::completion::DEFAULT_API_VERSION;
use product_qa_core::{
    AnswerCache, AzureOpenAiClient, AzureOpenAiConfig, CacheGateway, CatalogIndex, MemoryCache,
    QueryPipeline, RedisCache,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "product-qa", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Folder holding one JSON specification file per product
    #[arg(long, env = "PRODUCTS_DIR", default_value = "Products")]
    products_dir: PathBuf,

    /// Azure OpenAI resource endpoint
    #[arg(long, env = "AZURE_OPENAI_ENDPOINT")]
    openai_endpoint: Option<String>,

    /// Azure OpenAI API key
    #[arg(long, env = "AZURE_OPENAI_KEY", hide_env_values = true)]
    openai_key: Option<String>,

    /// Azure OpenAI chat deployment name
    #[arg(long, env = "AZURE_OPENAI_DEPLOYMENT")]
    openai_deployment: Option<String>,

    /// Azure OpenAI REST API version
    #[arg(long, env = "AZURE_OPENAI_API_VERSION", default_value = DEFAULT_API_VERSION)]
    openai_api_version: String,

    /// Per-request timeout for model calls, in seconds
    #[arg(long, default_value = "60")]
    completion_timeout_secs: u64,

    /// Redis connection string for the answer cache
    #[arg(long, env = "REDIS_CONNECTION", hide_env_values = true)]
    redis_connection: Option<String>,

    /// How long a cached answer stays valid, in seconds
    #[arg(long, env = "ANSWER_CACHE_TTL_SECS", default_value = "600")]
    cache_ttl_secs: u64,

    /// Keep answers in process memory when no Redis connection is given.
    #[arg(long, default_value_t = false)]
    in_process_cache: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Answer a single question and print the reply.
    Ask {
        /// Free-text question, e.g. "What is the bore diameter of 6205?"
        #[arg(long)]
        question: String,
    },
    /// Load the catalog and list the designations it contains.
    Catalog,
    /// Serve the question intake over HTTP.
    Serve {
        /// Address to listen on.
        #[arg(long, default_value = "127.0.0.1:7071")]
        bind: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "product-qa boot"
    );

    match &cli.command {
        Command::Catalog => {
            let (catalog, report) = CatalogIndex::open(&cli.products_dir);
            let snapshot = catalog.snapshot();
            let mut designations = snapshot.designations();
            designations.sort_unstable();

            println!(
                "{} products in {} (loaded at {})",
                designations.len(),
                cli.products_dir.display(),
                snapshot.loaded_at().to_rfc3339()
            );
            for designation in designations {
                println!("  {designation}");
            }
            for skipped in report.skipped {
                println!("  skipped {}: {}", skipped.path.display(), skipped.reason);
            }
        }
        Command::Ask { question } => {
            let pipeline = build_pipeline(&cli).await?;
            let cancel = CancellationToken::new();

            let ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    ctrl_c.cancel();
                }
            });

            let answer = pipeline.answer_text(question, &cancel).await?;
            println!("{answer}");
        }
        Command::Serve { bind } => {
            let pipeline = build_pipeline(&cli).await?;
            server::serve(Arc::new(pipeline), bind).await?;
        }
    }

    Ok(())
}

async fn build_pipeline(cli: &Cli) -> anyhow::Result<QueryPipeline<AzureOpenAiClient>> {
    let (catalog, report) = CatalogIndex::open(&cli.products_dir);
    if !report.skipped.is_empty() {
        warn!(
            "skipped_files={} for folder={}",
            report.skipped.len(),
            cli.products_dir.display()
        );
    }

    let completion = match AzureOpenAiConfig::from_parts(
        cli.openai_endpoint.as_deref(),
        cli.openai_key.as_deref(),
        cli.openai_deployment.as_deref(),
    ) {
        Some(config) => {
            let config = config
                .with_api_version(cli.openai_api_version.clone())
                .with_timeout(Duration::from_secs(cli.completion_timeout_secs));
            info!(deployment = %config.deployment, "chat completion configured");
            Some(AzureOpenAiClient::new(&config)?)
        }
        None => {
            warn!("AZURE_OPENAI_ENDPOINT/AZURE_OPENAI_KEY not set; every question will report the model as unconfigured");
            None
        }
    };

    let cache = build_cache(cli).await;
    Ok(QueryPipeline::new(completion, Arc::new(catalog), cache))
}

async fn build_cache(cli: &Cli) -> CacheGateway {
    let connection = cli
        .redis_connection
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());

    let store: Option<Arc<dyn AnswerCache + Send + Sync>> = match connection {
        Some(connection) => match RedisCache::connect(connection).await {
            Ok(redis) => {
                info!("answer cache: redis");
                Some(Arc::new(redis))
            }
            Err(error) => {
                warn!(%error, "redis unavailable, answer cache disabled");
                None
            }
        },
        None if cli.in_process_cache => {
            info!("answer cache: in-process");
            Some(Arc::new(MemoryCache::new()))
        }
        None => None,
    };

    store
        .map(|store| CacheGateway::new(store).with_ttl(Duration::from_secs(cli.cache_ttl_secs)))
        .unwrap_or_default()
}
