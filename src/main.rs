use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use crawl_monitor::config::{ConfigLoader, CrawlerConfig};
use crawl_monitor::health::{self, HealthAggregator};
use crawl_monitor::output::{
    self, OutputHandler, console::ConsoleOutput, csv::CsvOutput, json::JsonOutput,
};
use crawl_monitor::{
    HttpPageFetcher, Job, RedisState, Scheduler, SharedState, Shutdown, Worker, store,
};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "crawl-monitor")]
#[command(version = "0.1.0")]
#[command(about = "Queue-driven phrase crawler with heartbeat health checks", long_about = None)]
struct Cli {
    /// Optional configuration file (JSON/YAML/TOML); environment variables take precedence
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enqueue the configured job on a fixed interval
    Scheduler,
    /// Consume jobs from the queue and record their outcome
    Worker {
        /// Show a live counter spinner (stderr)
        #[arg(short, long, default_value_t = false)]
        progress: bool,
    },
    /// Serve /healthz and /metrics
    Health {
        /// Listen address, overrides HEALTH_BIND_ADDR
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Export the crawl_metrics history
    Export {
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Console)]
        format: ExportFormat,

        /// Destination file, required for json and csv
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only the most recent N rows
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Validate the configuration
    Check,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Console,
    Json,
    Csv,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let multi = match &cli.command {
        Commands::Worker { progress: true } => Some(MultiProgress::new()),
        _ => None,
    };
    init_logging(multi.as_ref())?;

    let config = match ConfigLoader::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Config error: {}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Scheduler => run_scheduler(&config).await,
        Commands::Worker { .. } => run_worker(&config, multi).await,
        Commands::Health { bind } => run_health(&config, bind).await,
        Commands::Export {
            format,
            output,
            limit,
        } => run_export(&config, format, output, limit).await,
        Commands::Check => {
            print_config(&config);
            Ok(())
        }
    }
}

fn init_logging(multi: Option<&MultiProgress>) -> anyhow::Result<()> {
    let logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).build();
    let level = logger.filter();

    match multi {
        Some(multi) => {
            indicatif_log_bridge::LogWrapper::new(multi.clone(), logger).try_init()?;
        }
        None => {
            log::set_boxed_logger(Box::new(logger))?;
        }
    }
    log::set_max_level(level);
    Ok(())
}

fn shutdown_on_ctrl_c() -> Shutdown {
    let (trigger, shutdown) = Shutdown::new();
    trigger.on_ctrl_c();
    shutdown
}

async fn connect_state(config: &CrawlerConfig) -> anyhow::Result<Arc<dyn SharedState>> {
    let state = RedisState::connect(&config.redis_url)
        .await
        .with_context(|| format!("connecting to shared state at {}", config.redis_url))?;
    Ok(Arc::new(state))
}

async fn run_scheduler(config: &CrawlerConfig) -> anyhow::Result<()> {
    let state = connect_state(config).await?;
    let job = Job::new(&config.crawl_url, &config.crawl_target);
    let scheduler = Scheduler::new(state, job, config.crawl_delay()?);

    scheduler.run(shutdown_on_ctrl_c()).await?;
    Ok(())
}

async fn run_worker(config: &CrawlerConfig, multi: Option<MultiProgress>) -> anyhow::Result<()> {
    let state = connect_state(config).await?;
    let log_store = store::connect(&config.postgres_dsn)
        .await
        .context("connecting to log store")?;
    log_store
        .ensure_table()
        .await
        .context("creating crawl_metrics table")?;
    log::info!("Connected to log store and shared state.");

    let fetcher = Arc::new(HttpPageFetcher::new(
        config.fetch_timeout()?,
        &config.fetch_user_agent,
    )?);
    let mut worker = Worker::new(state, log_store, fetcher, config.worker_pause());

    if let Some(multi) = multi {
        let pb = multi.add(ProgressBar::new_spinner());
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {pos} jobs {msg}")?,
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        worker = worker.with_progress(pb);
    }

    worker.run(shutdown_on_ctrl_c()).await?;
    Ok(())
}

async fn run_health(config: &CrawlerConfig, bind: Option<String>) -> anyhow::Result<()> {
    let state = connect_state(config).await?;
    let thresholds = config.thresholds()?;
    let app = health::router(HealthAggregator::new(state, thresholds));

    let addr = bind.unwrap_or_else(|| config.health_bind_addr.clone());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    log::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_on_ctrl_c().wait())
        .await
        .context("Server error")?;
    Ok(())
}

async fn run_export(
    config: &CrawlerConfig,
    format: ExportFormat,
    path: Option<PathBuf>,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    if path.is_none() && !matches!(format, ExportFormat::Console) {
        anyhow::bail!("--output is required for json and csv exports");
    }

    let log_store = store::connect(&config.postgres_dsn)
        .await
        .context("connecting to log store")?;
    let written = output::export_log(log_store.as_ref(), limit, || {
        let handler: Box<dyn OutputHandler> = match (format, path) {
            (ExportFormat::Json, Some(path)) => Box::new(JsonOutput::new(path)?),
            (ExportFormat::Csv, Some(path)) => Box::new(CsvOutput::new(path)?),
            _ => Box::new(ConsoleOutput::new()),
        };
        Ok(handler)
    })
    .await?;
    log::info!("Exported {} rows", written);
    Ok(())
}

fn print_config(config: &CrawlerConfig) {
    println!("✅ Config is valid:");
    println!("   Redis: {}", config.display_redis_url());
    println!("   Log store: {}", config.display_postgres_dsn());
    println!("   URL: {}", config.crawl_url);
    println!("   Target: {}", config.crawl_target);
    println!("   Enqueue every: {}s", config.crawl_delay_seconds);
    println!(
        "   Health thresholds: scheduler {}s, worker {}s",
        config.health_enqueue_max_seconds, config.health_worker_max_seconds
    );
    println!("   Health listen: {}", config.health_bind_addr);
    println!("   Fetch timeout: {}s", config.fetch_timeout_seconds);
}
