//! Routing-topology experiment - main entry point

use clap::{Parser, Subcommand, ValueEnum};
use routebench::completion::{GeminiConfig, GeminiService};
use routebench::config::ExperimentConfig;
use routebench::executor::DispatchExecutor;
use routebench::observability::init_default_logging;
use routebench::registry::{load_query_file, DomainRegistry};
use routebench::report::{self, TopologyRuns};
use routebench::topology::TopologyKind;
use routebench::{eval, topology, HarnessResult};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Query-dispatch topology evaluation harness
#[derive(Parser)]
#[command(name = "routebench")]
#[command(about = "Compare routing accuracy, latency, and hops across dispatch topologies")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the experiment
    Run {
        /// Which topologies to evaluate
        #[arg(long, value_enum, default_value = "compare")]
        mode: Mode,
        /// Number of query fixtures to dispatch (prefix of the fixture file)
        #[arg(long)]
        queries: Option<usize>,
        /// Number of repeated runs per topology
        #[arg(long)]
        runs: Option<usize>,
        /// CSV output path (default: experiment_results_TIMESTAMP.csv)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Validate configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    FlatDomain,
    TwoLevel,
    FlatLeaf,
    Compare,
}

impl Mode {
    fn kinds(self) -> Vec<TopologyKind> {
        match self {
            Mode::FlatDomain => vec![TopologyKind::FlatDomain],
            Mode::TwoLevel => vec![TopologyKind::TwoLevel],
            Mode::FlatLeaf => vec![TopologyKind::FlatLeaf],
            Mode::Compare => TopologyKind::ALL.to_vec(),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging();

    info!("Starting routebench v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Run {
            mode,
            queries,
            runs,
            output,
        } => run_experiment(config, mode.kinds(), queries, runs, output).await,
        Commands::Config { show } => handle_config_command(config, show),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

fn load_configuration(
    config_path: &Option<PathBuf>,
) -> Result<ExperimentConfig, Box<dyn std::error::Error>> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Ok(ExperimentConfig::load_from_file(path)?)
        }
        None => {
            let default_paths = vec!["routebench.toml", "config/routebench.toml"];

            for path_str in default_paths {
                let path = PathBuf::from(path_str);
                if path.exists() {
                    info!("Loading configuration from: {}", path.display());
                    return Ok(ExperimentConfig::load_from_file(&path)?);
                }
            }

            error!(
                "No configuration file found. Please provide one with -c/--config or create routebench.toml"
            );
            process::exit(1);
        }
    }
}

async fn run_experiment(
    mut config: ExperimentConfig,
    kinds: Vec<TopologyKind>,
    queries_override: Option<usize>,
    runs_override: Option<usize>,
    output_override: Option<PathBuf>,
) -> HarnessResult<()> {
    if let Some(queries) = queries_override {
        config.run.queries = queries;
    }
    if let Some(runs) = runs_override {
        config.run.runs = runs;
    }
    if let Some(output) = output_override {
        config.run.output = Some(output);
    }

    let registry = DomainRegistry::load_from_file(&config.registry.path)?;
    let mut queries = load_query_file(&config.registry.queries_path)?;
    queries.truncate(config.run.queries);

    info!(
        domains = registry.len(),
        leaf_handlers = registry.leaf_count(),
        queries = queries.len(),
        runs = config.run.runs,
        "experiment configured"
    );

    let api_key = config.service_api_key()?;
    let service = GeminiService::new(GeminiConfig {
        api_key,
        model: config.service.model.clone(),
        base_url: config
            .service
            .base_url
            .clone()
            .unwrap_or_else(|| GeminiConfig::default().base_url),
        timeout: Duration::from_secs(config.service.request_timeout_secs),
        max_depth: config.service.max_depth,
    })?;
    let executor = DispatchExecutor::new(
        Arc::new(service),
        Duration::from_secs(config.run.query_timeout_secs),
    )
    .with_concurrency(config.run.concurrency);

    let mut per_topology: Vec<TopologyRuns> = kinds
        .iter()
        .map(|kind| TopologyRuns {
            topology: *kind,
            runs: Vec::with_capacity(config.run.runs),
        })
        .collect();

    for run in 1..=config.run.runs {
        for (slot, kind) in kinds.iter().enumerate() {
            info!(run, topology = %kind, "starting run");
            let root = topology::build(&registry, *kind);
            let results = executor.run_batch(&root, &queries).await;

            let failures = results.iter().filter(|r| r.is_failed()).count();
            if failures > 0 {
                warn!(run, topology = %kind, failures, "some queries hard-failed");
            }

            let metrics = eval::summarize(&results);
            info!(
                run,
                topology = %kind,
                accuracy = metrics.accuracy,
                correct = metrics.correct_count,
                total = metrics.total_count,
                avg_latency = metrics.avg_latency,
                avg_hops = metrics.avg_hops,
                "run completed"
            );
            per_topology[slot].runs.push(metrics);
        }
    }

    let report = report::aggregate(per_topology);
    println!("{}", report.render());

    let output_path = config
        .run
        .output
        .clone()
        .unwrap_or_else(report::default_output_path);
    report.export_csv(&queries, &output_path)?;
    info!(path = %output_path.display(), "results saved");
    println!("Results saved to: {}", output_path.display());

    Ok(())
}

fn handle_config_command(config: ExperimentConfig, show: bool) -> HarnessResult<()> {
    if show {
        match toml::to_string_pretty(&config) {
            Ok(rendered) => println!("{rendered}"),
            Err(e) => {
                return Err(routebench::HarnessError::internal(format!(
                    "failed to render configuration: {e}"
                )))
            }
        }
    } else {
        println!("Configuration is valid");
    }
    Ok(())
}
