use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use regimebot::api::{FedspeakClient, SentimentClient, TrumpIndexClient};
use regimebot::config::{HistoryBackend, Settings};
use regimebot::persistence::RedisHistory;
use regimebot::regime::{HistoryStore, InMemoryHistory, RegimeService, SignalNormalizer};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "regimebot", about = "Market regime classification service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve snapshots over HTTP (default)
    Serve {
        /// Override server.bind_addr
        #[arg(long)]
        bind: Option<String>,
    },
    /// Build one snapshot and print it as JSON
    Snapshot,
    /// Forget the stored previous snapshot
    ClearHistory,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let cli = Cli::parse();
    let settings = Settings::load()?;

    match cli.command.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { bind } => {
            let bind_addr = bind.unwrap_or_else(|| settings.server.bind_addr.clone());

            tracing::info!("🚀 regimebot starting");
            tracing::info!("  Sentiment: {}", settings.upstream.sentiment_url);
            tracing::info!("  Policy:    {}", settings.upstream.policy_url);
            tracing::info!("  Fedspeak:  {}", settings.upstream.fedspeak_url);
            tracing::info!("  Cache TTL: {}s", settings.cache.ttl_secs);
            tracing::info!("  History:   {:?}", settings.history.backend);

            let service = build_service(&settings).await?;

            tokio::select! {
                result = regimebot::server::run_server(service, &bind_addr) => {
                    result?;
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received Ctrl+C, shutting down...");
                }
            }
        }
        Command::Snapshot => {
            let service = build_service(&settings).await?;
            let snapshot = service.get_regime_snapshot().await;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Command::ClearHistory => {
            let history = connect_history(&settings).await?;
            history.clear().await?;
            tracing::info!("Previous snapshot cleared");
        }
    }

    Ok(())
}

fn setup_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("regimebot=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn build_service(settings: &Settings) -> Result<RegimeService> {
    let upstream = &settings.upstream;

    let sentiment = SentimentClient::new(upstream.sentiment_url.clone(), upstream)
        .context("Failed to create sentiment client")?;
    let policy = TrumpIndexClient::new(upstream.policy_url.clone(), upstream)
        .context("Failed to create policy client")?;
    let fedspeak = FedspeakClient::new(upstream.fedspeak_url.clone(), upstream)
        .context("Failed to create Fedspeak client")?;

    let normalizer =
        SignalNormalizer::new(Arc::new(sentiment), Arc::new(policy), Arc::new(fedspeak));
    let history = connect_history(settings).await?;

    Ok(RegimeService::new(normalizer, history, &settings.cache))
}

async fn connect_history(settings: &Settings) -> Result<Arc<dyn HistoryStore>> {
    match settings.history.backend {
        HistoryBackend::Memory => Ok(Arc::new(InMemoryHistory::new())),
        HistoryBackend::Redis => {
            let history =
                RedisHistory::new(&settings.history.redis_url, &settings.history.namespace)
                    .await
                    .context("Failed to connect snapshot history to Redis")?;
            Ok(Arc::new(history))
        }
    }
}
