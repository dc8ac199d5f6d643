//! praman daemon — entry point for running the issuance core.

mod config;
mod persistence;

use clap::Parser;
use config::CoreConfig;
use persistence::CoreSnapshot;
use praman_challenge::ChallengeStore;
use praman_credential::CredentialService;
use praman_orchestrator::{FlowOrchestrator, LogNotifier};
use praman_registry::Registry;
use praman_rpc::{AppState, RpcServer};
use praman_store::ProfileStore;
use praman_store_memory::MemoryStore;
use praman_types::Timestamp;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "praman-daemon", about = "praman identity issuance daemon")]
struct Cli {
    /// Address for the HTTP API.
    /// When a config file is provided, defaults to the file's value.
    #[arg(long, env = "PRAMAN_LISTEN_ADDR")]
    listen_addr: Option<String>,

    /// Directory for snapshot persistence.
    #[arg(long, env = "PRAMAN_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Echo challenge codes back in issue responses. Development only.
    #[arg(long, env = "PRAMAN_DEV_REVEAL_CODES")]
    dev_reveal_codes: bool,

    /// Emit JSON logs instead of human-readable ones.
    #[arg(long, env = "PRAMAN_LOG_JSON")]
    log_json: bool,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn load_config(cli: &Cli) -> CoreConfig {
    let mut config = match &cli.config {
        Some(path) => match CoreConfig::from_toml_file(path) {
            Ok(cfg) => {
                tracing::info!("loaded config from {}", path.display());
                cfg
            }
            Err(e) => {
                tracing::warn!("failed to load config file: {e}, using defaults");
                CoreConfig::default()
            }
        },
        None => CoreConfig::default(),
    };
    if let Some(addr) = &cli.listen_addr {
        config.listen_addr = addr.clone();
    }
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if cli.dev_reveal_codes {
        config.dev_reveal_codes = true;
    }
    config
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    praman_utils::init_tracing(cli.log_json);
    let config = load_config(&cli);
    let params = config.params();

    let snapshot_path = config.snapshot_path();
    let restored = CoreSnapshot::load_if_present(&snapshot_path)?;

    let (store, challenges, flows) = match restored {
        Some(snapshot) => {
            tracing::info!(path = %snapshot_path.display(), "restoring from snapshot");
            (
                Arc::new(MemoryStore::restore(snapshot.store)),
                Arc::new(ChallengeStore::restore(snapshot.challenges, &params)),
                Some(snapshot.flows),
            )
        }
        None => (
            Arc::new(MemoryStore::new()),
            Arc::new(ChallengeStore::new(&params)),
            None,
        ),
    };

    tracing::info!(profiles = store.profile_count()?, "profile store ready");

    let registry = Arc::new(Registry::new(
        Arc::clone(&store),
        Arc::clone(&challenges),
        params.clone(),
    ));
    let orchestrator = Arc::new(FlowOrchestrator::new(
        registry,
        Arc::clone(&challenges),
        Arc::new(LogNotifier),
        &params,
    ));
    if let Some(flows) = flows {
        orchestrator.restore_flows(flows);
    }
    let credentials = Arc::new(CredentialService::new(Arc::clone(&store), &params));

    let state = AppState {
        orchestrator: Arc::clone(&orchestrator),
        credentials,
        metrics: Arc::new(praman_rpc::metrics::Metrics::new()),
    };

    // Periodic pruning of expired challenges and finished flows.
    {
        let orchestrator = Arc::clone(&orchestrator);
        let interval = Duration::from_secs(config.prune_interval_secs.max(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let pruned = orchestrator.prune(Timestamp::now());
                if pruned > 0 {
                    tracing::debug!(pruned, "pruned expired challenges");
                }
                for event in orchestrator.drain_events() {
                    tracing::debug!(?event, "flow event");
                }
            }
        });
    }

    // Periodic snapshots.
    if config.snapshot_interval_secs > 0 {
        let store = Arc::clone(&store);
        let challenges = Arc::clone(&challenges);
        let orchestrator = Arc::clone(&orchestrator);
        let path = snapshot_path.clone();
        let interval = Duration::from_secs(config.snapshot_interval_secs);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick fires immediately
            loop {
                ticker.tick().await;
                let snapshot = CoreSnapshot {
                    store: store.snapshot(),
                    challenges: challenges.snapshot(),
                    flows: orchestrator.snapshot(),
                };
                if let Err(e) = snapshot.save_to(&path) {
                    tracing::error!("snapshot failed: {e:#}");
                }
            }
        });
    }

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid listen address {}: {e}", config.listen_addr))?;
    let server = RpcServer::new(state, addr);
    server
        .serve(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;

    // Final snapshot so restarts resume in-flight verifications.
    let snapshot = CoreSnapshot {
        store: store.snapshot(),
        challenges: challenges.snapshot(),
        flows: orchestrator.snapshot(),
    };
    snapshot.save_to(&snapshot_path)?;
    tracing::info!(path = %snapshot_path.display(), "final snapshot written");
    Ok(())
}
