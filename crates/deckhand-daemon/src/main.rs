//! deckhand daemon
//!
//! Main daemon process that serves model endpoint routing and batch
//! prediction jobs.

use anyhow::Context;
use clap::Parser;
use deckhand_api::{create_router, AppState};
use deckhand_core::{DaemonConfig, EnvironmentRegistry, LoggingConfig};
use deckhand_network::EndpointManager;
use deckhand_runtime::{
    BatchExecutor, MemoryMeshClient, MeshClient, PrebuiltImageBuilder, ProcessExecutor,
    ProcessExecutorConfig,
};
use deckhand_scheduler::{JobOrchestrator, JobOutcomeMetrics};
use deckhand_store::MemoryJobStore;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// deckhand daemon - model endpoint routing and batch prediction jobs
#[derive(Parser, Debug)]
#[command(name = "deckhandd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Address to bind the API server, overrides the config file
    #[arg(long)]
    address: Option<String>,

    /// Port for the REST API server, overrides the config file
    #[arg(long)]
    port: Option<u16>,

    /// Log level, overrides the config file
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn load_config(&self) -> anyhow::Result<DaemonConfig> {
        let mut config = match &self.config {
            Some(path) => DaemonConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => DaemonConfig::default(),
        };

        if let Some(address) = &self.address {
            config.api.rest_address = address.clone();
        }
        if let Some(port) = self.port {
            config.api.rest_port = port;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        Ok(config)
    }
}

fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.format.eq_ignore_ascii_case("json") {
        registry.with(fmt::layer().json().with_target(false)).try_init()?;
    } else {
        registry.with(fmt::layer().with_target(false)).try_init()?;
    }
    Ok(())
}

/// Wire the collaborators of every configured environment into the API state
async fn build_state(config: &DaemonConfig) -> anyhow::Result<Arc<AppState>> {
    let deployment = &config.deployment;

    let mut executors: EnvironmentRegistry<dyn BatchExecutor> = EnvironmentRegistry::new();
    let mut mesh_clients: EnvironmentRegistry<dyn MeshClient> = EnvironmentRegistry::new();
    for env in &config.environments {
        let executor = ProcessExecutor::new(ProcessExecutorConfig {
            launcher_path: deployment.launcher_path.clone(),
            extra_args: deployment.launcher_args.clone(),
            cluster: if env.cluster.is_empty() {
                env.name.clone()
            } else {
                env.cluster.clone()
            },
        });
        executors = executors.with(env.name.clone(), Arc::new(executor));
        mesh_clients = mesh_clients.with(env.name.clone(), Arc::new(MemoryMeshClient::new()));
        info!(environment = %env.name, cluster = %env.cluster, "Environment configured");
    }

    let store = match &deployment.job_snapshot_path {
        Some(path) => MemoryJobStore::with_snapshot(path.clone()),
        None => MemoryJobStore::new(),
    };
    store.init().await.context("loading job snapshot")?;

    let metrics = Arc::new(JobOutcomeMetrics::new());
    let orchestrator = JobOrchestrator::new(
        Arc::new(store),
        Arc::new(PrebuiltImageBuilder::new(deployment.image_registry.clone())),
        Arc::new(executors),
        metrics.clone(),
        deployment.environment_label.clone(),
    );
    let endpoint_manager =
        EndpointManager::new(Arc::new(mesh_clients), deployment.environment_label.clone());

    Ok(Arc::new(AppState::new(
        config.catalog.clone(),
        config.environments.clone(),
        endpoint_manager,
        Arc::new(orchestrator),
        metrics,
    )))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = args.load_config()?;

    init_logging(&config.logging)?;

    info!("Starting deckhand daemon v{}", env!("CARGO_PKG_VERSION"));

    let state = build_state(&config).await?;
    let orchestrator = state.orchestrator.clone();
    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.api.rest_address, config.api.rest_port)
        .parse()
        .context("invalid API address")?;

    info!(
        %addr,
        environment = %config.deployment.environment_label,
        environments = config.environments.len(),
        "API server listening"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    orchestrator.drain().await;
    served.context("server error")?;
    info!("deckhand daemon stopped");
    Ok(())
}
