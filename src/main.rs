use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use syspulse::collector::Collector;
use syspulse::config::AppConfig;
use syspulse::daemon::{self, DaemonConfig, DaemonDeps};
use syspulse::notifier::Notifier;
use syspulse::report::{self, ReportFormat};
use syspulse::sample_repo::SampleRepo;
use syspulse::summary::summarize;
use syspulse::version;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[derive(Parser, Debug)]
#[command(name = "syspulse", version)]
#[command(about = "SysPulse - system monitoring and reporting tool")]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the monitoring daemon
    Start {
        /// Collection interval in seconds (overrides the config value)
        #[arg(long)]
        interval: Option<u64>,
        /// Configuration file path
        #[arg(long, default_value = "config.toml")]
        config: String,
    },
    /// Collect stats once
    Collect {
        /// Configuration file path
        #[arg(long, default_value = "config.toml")]
        config: String,
    },
    /// Generate a report
    Report {
        /// Report format
        #[arg(long, value_enum, default_value = "text")]
        format: ReportFormat,
        /// Report on the last N hours (default: all data)
        #[arg(long)]
        hours: Option<u32>,
        /// Output file (default: stdout)
        #[arg(long)]
        output: Option<std::path::PathBuf>,
        /// Configuration file path
        #[arg(long, default_value = "config.toml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Start { interval, config } => run_start(interval, &config).await,
        Command::Collect { config } => run_collect(&config).await,
        Command::Report {
            format,
            hours,
            output,
            config,
        } => run_report(format, hours, output, &config).await,
    }
}

async fn run_start(interval: Option<u64>, config_path: &str) -> Result<()> {
    let app_config = AppConfig::load(config_path)?;
    let interval_secs = interval.unwrap_or(app_config.monitoring.interval_secs);

    let repo = Arc::new(SampleRepo::connect(&app_config.database.path).await?);
    repo.init().await?;

    let collector = Arc::new(Collector::new(
        app_config.monitoring.ping_host.clone(),
        app_config.monitoring.ping_port,
        Duration::from_secs(app_config.monitoring.ping_timeout_secs),
    ));

    let notifier = if app_config.notifications.enabled {
        let transport = app_config
            .notifications
            .transport
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("notifications enabled without a transport"))?;
        Some(Arc::new(Notifier::from_config(transport)?))
    } else {
        None
    };

    tracing::info!(
        version = version::VERSION,
        interval_secs,
        database = %app_config.database.path,
        notifications = notifier.is_some(),
        "SysPulse daemon started"
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let daemon_handle = daemon::spawn(
        DaemonDeps {
            collector,
            repo,
            notifier,
            shutdown_rx,
        },
        DaemonConfig {
            interval_secs,
            digest_interval_secs: app_config.notifications.digest_interval_hours * 3600,
            retention_days: app_config.database.retention_days,
            prune_interval_secs: app_config.database.prune_interval_secs,
            stats_log_interval_secs: app_config.monitoring.stats_log_interval_secs,
        },
    );

    wait_for_shutdown_signal().await;
    tracing::info!("Received shutdown signal");
    let _ = shutdown_tx.send(());
    let _ = daemon_handle.await;

    Ok(())
}

async fn run_collect(config_path: &str) -> Result<()> {
    let app_config = AppConfig::load(config_path)?;
    let repo = SampleRepo::connect(&app_config.database.path).await?;
    repo.init().await?;

    let collector = Collector::new(
        app_config.monitoring.ping_host.clone(),
        app_config.monitoring.ping_port,
        Duration::from_secs(app_config.monitoring.ping_timeout_secs),
    );
    let sample = collector.sample().await?;
    sample.validate()?;
    repo.insert_sample(&sample).await?;
    tracing::info!(timestamp = sample.timestamp, "stats collected");

    println!("CPU: {:.2}%", sample.cpu_percent);
    println!("Memory: {:.2}%", sample.memory_percent);
    println!("Disk: {:.2}%", sample.disk_percent);
    match sample.network_latency_ms {
        Some(latency) => println!("Network Latency: {:.2}ms", latency),
        None => println!("Network Latency: N/A"),
    }

    Ok(())
}

async fn run_report(
    format: ReportFormat,
    hours: Option<u32>,
    output: Option<std::path::PathBuf>,
    config_path: &str,
) -> Result<()> {
    let app_config = AppConfig::load(config_path)?;
    let repo = SampleRepo::connect(&app_config.database.path).await?;
    repo.init().await?;

    let samples = match hours {
        Some(h) => {
            let now_ms = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)?
                .as_millis() as i64;
            repo.samples_since(now_ms - (h as i64) * 3_600_000).await?
        }
        None => repo.all_samples().await?,
    };
    let summary = summarize(&samples);
    let rendered = report::render(&samples, &summary, format)?;

    match output {
        Some(path) => {
            std::fs::write(&path, &rendered)?;
            tracing::info!(path = %path.display(), "report saved");
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            Ok(s) => s,
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
