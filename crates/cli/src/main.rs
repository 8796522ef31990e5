use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sqlagent_agent::{AgentConfig, AgentError, AgentSession, Orchestrator};
use sqlagent_embeddings::{EmbeddingClient, EmbeddingProvider};
use sqlagent_llm::CompletionClient;
use sqlagent_retrieval::{ExampleRetriever, ExampleStore};
use sqlagent_sandbox::SqlSandbox;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

mod corpus;
mod render;

#[derive(Parser)]
#[command(name = "sqlagent")]
#[command(about = "Natural-language SQL assistant with sandboxed execution", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer one request and exit.
    Ask {
        /// The natural-language request.
        utterance: String,
    },
    /// Interactive session; Ctrl-C cancels the in-flight request.
    Repl,
    /// Load a JSON corpus of question/SQL pairs into the example store.
    Seed {
        /// Path to the JSON seed file.
        file: PathBuf,
    },
    /// Introspect the sandbox database and print its schema.
    Schema {
        /// Print the LLM-facing prompt rendering instead of JSON.
        #[arg(long)]
        prompt: bool,
    },
}

struct Settings {
    api_key: String,
    api_url: String,
    database_url: String,
    corpus_path: Option<PathBuf>,
}

impl Settings {
    fn from_env() -> Result<Self> {
        let api_key = std::env::var("SQLAGENT_API_KEY")
            .map_err(|_| anyhow::anyhow!("SQLAGENT_API_KEY environment variable must be set"))?;
        let api_url =
            sqlagent_core::env_string_with_default("SQLAGENT_API_URL", "https://api.openai.com");
        let database_url = std::env::var("SQLAGENT_DATABASE_URL").map_err(|_| {
            anyhow::anyhow!(
                "SQLAGENT_DATABASE_URL environment variable must be set (mysql://... DSN of the read-only sandbox)"
            )
        })?;
        let corpus_path = std::env::var("SQLAGENT_CORPUS_PATH").ok().map(PathBuf::from);
        Ok(Self { api_key, api_url, database_url, corpus_path })
    }
}

fn load_store(corpus_path: Option<&PathBuf>) -> Result<ExampleStore> {
    match corpus_path {
        Some(path) => Ok(ExampleStore::load(path)?),
        None => {
            tracing::warn!("SQLAGENT_CORPUS_PATH not set, running without a persistent corpus");
            Ok(ExampleStore::new())
        },
    }
}

fn build_retriever(settings: &Settings) -> Result<ExampleRetriever> {
    let store = Arc::new(load_store(settings.corpus_path.as_ref())?);
    let embeddings: Arc<dyn EmbeddingProvider> =
        Arc::new(EmbeddingClient::new(settings.api_key.clone(), settings.api_url.clone())?);
    Ok(ExampleRetriever::new(store, embeddings))
}

async fn build_orchestrator(settings: &Settings) -> Result<Orchestrator> {
    let completion =
        CompletionClient::new(settings.api_key.clone(), settings.api_url.clone())?;
    let retriever = build_retriever(settings)?;
    let exec_timeout = sqlagent_core::env_parse_with_default(
        "SQLAGENT_EXEC_TIMEOUT_SECS",
        sqlagent_core::DEFAULT_EXEC_TIMEOUT_SECS,
    );
    let sandbox = SqlSandbox::connect(&settings.database_url)
        .await
        .context("connecting to the sandbox database")?
        .with_timeout(std::time::Duration::from_secs(exec_timeout));
    let catalog = sandbox.introspect_catalog().await.context("introspecting sandbox schema")?;
    tracing::info!(tables = catalog.len(), "sandbox schema introspected");

    Ok(Orchestrator::new(
        Arc::new(completion),
        Arc::new(retriever),
        Arc::new(sandbox),
        Arc::new(catalog),
        AgentConfig::from_env(),
    ))
}

/// Cancel the token on the first Ctrl-C. Spawned per request so a stale
/// press never cancels a later one.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            () = trigger.cancelled() => {},
            res = tokio::signal::ctrl_c() => {
                if res.is_ok() {
                    trigger.cancel();
                }
            },
        }
    });
    cancel
}

async fn run_once(
    orchestrator: &Orchestrator,
    session: &mut AgentSession,
    utterance: &str,
) -> Result<()> {
    let cancel = cancel_on_ctrl_c();
    match orchestrator.handle_request(utterance, session, &cancel).await {
        Ok(outcome) => {
            println!("{}", render::render_outcome(&outcome));
            Ok(())
        },
        Err(AgentError::Cancelled) => {
            println!("(cancelled)");
            Ok(())
        },
        Err(e) => Err(e.into()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    match cli.command {
        Commands::Ask { utterance } => {
            let orchestrator = build_orchestrator(&settings).await?;
            let mut session = AgentSession::new();
            run_once(&orchestrator, &mut session, &utterance).await?;
        }
        Commands::Repl => {
            let orchestrator = build_orchestrator(&settings).await?;
            let mut session = AgentSession::new();
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            let mut stdout = tokio::io::stdout();
            loop {
                stdout.write_all(b"sql> ").await?;
                stdout.flush().await?;
                let Some(line) = lines.next_line().await? else {
                    break;
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "exit" || line == "quit" {
                    break;
                }
                run_once(&orchestrator, &mut session, line).await?;
            }
        }
        Commands::Seed { file } => {
            let examples = corpus::load_seed_file(&file)?;
            let retriever = build_retriever(&settings)?;
            let added = retriever.seed(examples).await?;
            println!("Seeded {added} examples into the corpus.");
        }
        Commands::Schema { prompt } => {
            let sandbox = SqlSandbox::connect(&settings.database_url)
                .await
                .context("connecting to the sandbox database")?;
            let catalog = sandbox.introspect_catalog().await?;
            if prompt {
                println!("{}", sqlagent_core::format_schema_for_prompt(catalog.fragments()));
            } else {
                println!("{}", serde_json::to_string_pretty(&catalog)?);
            }
        }
    }

    Ok(())
}
