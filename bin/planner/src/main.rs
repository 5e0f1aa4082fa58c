use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::{Args, Parser, Subcommand, ValueEnum};
use routing::{PlanRequest, ReadOnlyProviders, RoutingCalculator, RoutingConfig};

pub(crate) const SHORT_VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));

#[derive(Parser, Debug)]
#[command(author, version = SHORT_VERSION, long_version = SHORT_VERSION, about = "funding route planner", long_about = None)]
struct Cli {
    /// The command to run
    #[clap(subcommand)]
    command: Commands,
}

/// Commands to be executed
#[derive(Debug, Subcommand)]
enum Commands {
    /// Run http server.
    #[command(name = "server")]
    Server(ServerCommand),
    /// Plan funding routes for a request read from a JSON file.
    #[command(name = "plan")]
    Plan(PlanCommand),
}

#[derive(Debug, Args)]
struct RoutingArgs {
    /// Chain assets are bridged from
    #[clap(long, value_name = "CHAIN_ID", default_value = "1")]
    l1_chain_id: u32,

    /// Chain the shortfall lives on
    #[clap(long, value_name = "CHAIN_ID", default_value = "13371")]
    l2_chain_id: u32,

    /// Upper bound in seconds for each resolver and each balance or allow-list fetch
    #[clap(long, value_name = "SECONDS", default_value = "10")]
    resolver_timeout_secs: u64,
}

impl RoutingArgs {
    fn config(&self) -> RoutingConfig {
        RoutingConfig {
            l1_chain_id: self.l1_chain_id,
            l2_chain_id: self.l2_chain_id,
            resolver_timeout: Duration::from_secs(self.resolver_timeout_secs),
        }
    }
}

#[derive(Debug, Parser)]
struct ServerCommand {
    /// The port to listen on
    #[clap(short, long, value_name = "PORT", default_value = "8080")]
    port: u16,

    /// The request timeout in seconds
    #[clap(short, long, value_name = "TIMEOUT", default_value = "10")]
    req_timeout: u8,

    /// The port to listen on for metrics
    #[clap(short, long, value_name = "METRICS_PORT", default_value = "9090")]
    metrics_port: u16,

    /// Log level
    #[clap(short, long, value_name = "LOG_LEVEL", default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    #[command(flatten)]
    routing: RoutingArgs,
}

#[derive(Debug, Parser)]
struct PlanCommand {
    /// JSON file holding the owner, balance check, options and snapshot
    #[clap(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Log level
    #[clap(short, long, value_name = "LOG_LEVEL", default_value_t = LogLevel::Warn)]
    log_level: LogLevel,

    #[command(flatten)]
    routing: RoutingArgs,
}

#[derive(Debug, Copy, Clone, ValueEnum, Eq, PartialEq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl core::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl ServerCommand {
    fn execute(&self) -> eyre::Result<()> {
        http::run_server(http::ServerConfig {
            port: self.port,
            req_timeout: self.req_timeout,
            metrics_port: self.metrics_port,
            log_level: self.log_level.to_string(),
            routing: self.routing.config(),
        })
    }
}

impl PlanCommand {
    fn execute(&self) -> eyre::Result<()> {
        http::init_tracing(&self.log_level.to_string())?;
        let config = self.routing.config();
        config.validate()?;

        let input = std::fs::read_to_string(&self.input)?;
        let (request, snapshot) = PlanRequest::from_json(&input)?.into_parts();

        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?
            .block_on(async {
                let providers = ReadOnlyProviders::new(&config.chain_ids())?;
                let calculator = RoutingCalculator::from_snapshot(
                    config,
                    Arc::new(providers),
                    Arc::new(snapshot),
                );

                let (updates, mut routes) = tokio::sync::mpsc::unbounded_channel::<routing::FundingRoute>();
                let reporter = tokio::spawn(async move {
                    while let Some(route) = routes.recv().await {
                        tracing::info!(
                            priority = route.priority,
                            steps = route.steps.len(),
                            "route found"
                        );
                    }
                });

                let outcome = calculator.calculate_with_updates(&request, updates).await?;
                reporter.await?;
                println!("{}", serde_json::to_string_pretty(&outcome)?);
                Ok::<_, eyre::Report>(())
            })
    }
}

fn main() {
    let opt = Cli::parse();
    if let Err(err) = match opt.command {
        Commands::Server(command) => command.execute(),
        Commands::Plan(command) => command.execute(),
    } {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}
