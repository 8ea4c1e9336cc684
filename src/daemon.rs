// Sampling daemon: collect -> validate -> insert on a fixed tick, with a
// digest timer and a retention sweep riding the same select loop. A failed
// tick is logged and the loop continues; only shutdown ends it.

use crate::collector::Collector;
use crate::notifier::Notifier;
use crate::sample_repo::SampleRepo;
use crate::summary::summarize;
use std::sync::Arc;
use tokio::time::{Duration, Instant, interval};
use tracing::instrument;

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Repos, transports and shutdown for the daemon.
pub struct DaemonDeps {
    pub collector: Arc<Collector>,
    pub repo: Arc<SampleRepo>,
    pub notifier: Option<Arc<Notifier>>,
    pub shutdown_rx: tokio::sync::oneshot::Receiver<()>,
}

/// Daemon timing config. Digest, pruning and stats logging use real-time
/// intervals, independent of interval_secs.
pub struct DaemonConfig {
    pub interval_secs: u64,
    pub digest_interval_secs: u64,
    pub retention_days: u32,
    pub prune_interval_secs: u64,
    pub stats_log_interval_secs: u64,
}

/// Spawns the daemon loop. Returns a join handle; send on the shutdown
/// channel to stop it between ticks.
pub fn spawn(deps: DaemonDeps, config: DaemonConfig) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        run(deps, config).await;
    })
}

#[instrument(skip(deps, config), fields(interval_secs = config.interval_secs))]
async fn run(deps: DaemonDeps, config: DaemonConfig) {
    let DaemonDeps {
        collector,
        repo,
        notifier,
        mut shutdown_rx,
    } = deps;

    let mut tick = interval(Duration::from_secs(config.interval_secs));
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut prune_tick = interval(Duration::from_secs(config.prune_interval_secs));
    prune_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut stats_log_tick = interval(Duration::from_secs(config.stats_log_interval_secs));
    stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let digest_every = Duration::from_secs(config.digest_interval_secs);
    // Single-writer digest clock, owned by this loop. Not advanced on a
    // failed send, so the digest is retried on the next tick.
    let mut last_digest = Instant::now();

    let mut samples_saved_total: u64 = 0;
    let mut samples_pruned_total: u64 = 0;
    let mut digests_sent_total: u64 = 0;

    loop {
        tokio::select! {
            _ = tick.tick() => {
                match run_sample_tick(&collector, &repo).await {
                    Ok(()) => samples_saved_total += 1,
                    Err(e) => {
                        tracing::warn!(error = %e, operation = "sample_tick", "sample tick failed");
                    }
                }

                if let Some(notifier) = &notifier {
                    if last_digest.elapsed() >= digest_every {
                        match send_digest_once(&repo, notifier, digest_every).await {
                            Ok(records) => {
                                last_digest = Instant::now();
                                digests_sent_total += 1;
                                tracing::info!(records, operation = "send_digest", "digest sent");
                            }
                            Err(e) => {
                                tracing::warn!(
                                    error = %e,
                                    operation = "send_digest",
                                    "digest failed, will retry next tick"
                                );
                            }
                        }
                    }
                }
            }
            _ = &mut shutdown_rx => {
                tracing::debug!("Daemon shutting down");
                break;
            }
            _ = stats_log_tick.tick() => {
                tracing::info!(
                    samples_saved_total,
                    samples_pruned_total,
                    digests_sent_total,
                    "app stats"
                );
            }
            _ = prune_tick.tick() => {
                let cutoff = now_epoch_ms() - (config.retention_days as i64) * MS_PER_DAY;
                match repo.delete_older_than(cutoff).await {
                    Ok(deleted) => {
                        if deleted > 0 {
                            tracing::debug!(deleted, operation = "delete_older_than", "old samples pruned");
                        }
                        samples_pruned_total += deleted;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, operation = "delete_older_than", "prune failed");
                    }
                }
            }
        }
    }
}

async fn run_sample_tick(collector: &Collector, repo: &SampleRepo) -> anyhow::Result<()> {
    let sample = collector.sample().await?;
    sample.validate()?;
    repo.insert_sample(&sample).await?;
    Ok(())
}

/// Queries the digest window, summarizes and hands the result to the
/// notifier. Returns the number of records covered.
pub async fn send_digest_once(
    repo: &SampleRepo,
    notifier: &Notifier,
    window: Duration,
) -> anyhow::Result<usize> {
    let since = now_epoch_ms() - window.as_millis() as i64;
    let samples = repo.samples_since(since).await?;
    let summary = summarize(&samples);
    let label = period_label(window);
    notifier.send_digest(&summary, samples.len(), &label).await?;
    Ok(samples.len())
}

fn period_label(window: Duration) -> String {
    format!("last_{}h", window.as_secs() / 3600)
}

fn now_epoch_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, operation = "get_timestamp", "system time error");
            0
        })
}
