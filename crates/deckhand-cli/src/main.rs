//! deckhand CLI
//!
//! Command-line interface for interacting with the deckhand daemon.

mod commands;

use clap::{Args, Parser, Subcommand};
use deckhand_core::Id;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use uuid::Uuid;

/// deckhand - model endpoint routing and batch prediction jobs
#[derive(Parser, Debug)]
#[command(name = "deckhand")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Daemon API address
    #[arg(long, default_value = "http://localhost:9090", global = true)]
    api: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage prediction jobs
    #[command(subcommand)]
    Jobs(JobCommands),

    /// Manage model endpoints
    #[command(subcommand)]
    Endpoints(EndpointCommands),

    /// Show submission outcome counters
    Metrics,
}

/// Model version a job belongs to
#[derive(Args, Debug)]
struct VersionRef {
    /// Model ID
    #[arg(long)]
    model: Id,

    /// Version ID
    #[arg(long)]
    version: Id,
}

#[derive(Subcommand, Debug)]
enum JobCommands {
    /// List the jobs of a project
    List {
        /// Project ID
        #[arg(long)]
        project: Id,

        /// Only jobs whose name contains this text
        #[arg(long)]
        name: Option<String>,

        /// Only jobs in this status (e.g. running, failed_submission)
        #[arg(long)]
        status: Option<String>,
    },

    /// Show a job
    Get {
        #[command(flatten)]
        version: VersionRef,

        /// Job ID
        job: Uuid,
    },

    /// Create a job
    Create {
        #[command(flatten)]
        version: VersionRef,

        /// Target environment
        #[arg(long)]
        environment: String,

        /// Service account the job runs as
        #[arg(long)]
        service_account: Option<String>,

        /// Driver CPU request (e.g. 500m)
        #[arg(long)]
        driver_cpu: Option<String>,

        /// Driver memory request (e.g. 1Gi)
        #[arg(long)]
        driver_memory: Option<String>,

        /// Executor CPU request
        #[arg(long)]
        executor_cpu: Option<String>,

        /// Executor memory request
        #[arg(long)]
        executor_memory: Option<String>,

        /// Number of executors
        #[arg(long)]
        executors: Option<i32>,

        /// Environment variable passed to the job (KEY=VALUE)
        #[arg(long = "env", value_parser = commands::parse_env_var)]
        env_vars: Vec<deckhand_core::EnvVar>,
    },

    /// Stop a job
    Stop {
        #[command(flatten)]
        version: VersionRef,

        /// Job ID
        job: Uuid,
    },

    /// List the containers of a job
    Containers {
        #[command(flatten)]
        version: VersionRef,

        /// Job ID
        job: Uuid,
    },
}

#[derive(Subcommand, Debug)]
enum EndpointCommands {
    /// List the endpoints of a model
    List {
        /// Model ID
        #[arg(long)]
        model: Id,
    },

    /// Deploy a model endpoint
    Deploy {
        /// Model ID
        #[arg(long)]
        model: Id,

        /// Target environment
        #[arg(long)]
        environment: String,

        /// Destination as VERSION_ENDPOINT_ID=WEIGHT, repeatable
        #[arg(long = "destination", required = true, value_parser = commands::parse_destination)]
        destinations: Vec<commands::DestinationArg>,

        /// Version endpoint receiving mirrored traffic
        #[arg(long)]
        mirror: Option<Uuid>,
    },

    /// Undeploy a model endpoint
    Undeploy {
        /// Model ID
        #[arg(long)]
        model: Id,

        /// Model endpoint ID
        endpoint: Uuid,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let client = commands::ApiClient::new(&cli.api);

    match cli.command {
        Commands::Jobs(JobCommands::List {
            project,
            name,
            status,
        }) => {
            commands::list_jobs(&client, project, name, status).await?;
        }
        Commands::Jobs(JobCommands::Get { version, job }) => {
            commands::get_job(&client, version.model, version.version, job).await?;
        }
        Commands::Jobs(JobCommands::Create {
            version,
            environment,
            service_account,
            driver_cpu,
            driver_memory,
            executor_cpu,
            executor_memory,
            executors,
            env_vars,
        }) => {
            let config = deckhand_core::Config {
                image_ref: String::new(),
                service_account_name: service_account.unwrap_or_default(),
                resource_request: deckhand_core::ResourceRequest {
                    driver_cpu_request: driver_cpu.unwrap_or_default(),
                    driver_memory_request: driver_memory.unwrap_or_default(),
                    executor_cpu_request: executor_cpu.unwrap_or_default(),
                    executor_memory_request: executor_memory.unwrap_or_default(),
                    executor_replica: executors.unwrap_or_default(),
                },
                env_vars,
            };
            commands::create_job(&client, version.model, version.version, environment, config)
                .await?;
        }
        Commands::Jobs(JobCommands::Stop { version, job }) => {
            commands::stop_job(&client, version.model, version.version, job).await?;
        }
        Commands::Jobs(JobCommands::Containers { version, job }) => {
            commands::list_containers(&client, version.model, version.version, job).await?;
        }
        Commands::Endpoints(EndpointCommands::List { model }) => {
            commands::list_endpoints(&client, model).await?;
        }
        Commands::Endpoints(EndpointCommands::Deploy {
            model,
            environment,
            destinations,
            mirror,
        }) => {
            commands::deploy_endpoint(&client, model, environment, destinations, mirror).await?;
        }
        Commands::Endpoints(EndpointCommands::Undeploy { model, endpoint }) => {
            commands::undeploy_endpoint(&client, model, endpoint).await?;
        }
        Commands::Metrics => {
            commands::metrics(&client).await?;
        }
    }

    Ok(())
}
