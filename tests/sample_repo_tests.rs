// SampleRepo tests: connect, init, insert, range queries, retention delete

mod common;

use common::{now_epoch_ms, sample_at};
use syspulse::sample_repo::SampleRepo;
use syspulse::summary::summarize;
use tempfile::TempDir;

async fn repo_in(dir: &TempDir) -> SampleRepo {
    let path = dir.path().join("syspulse.db");
    let repo = SampleRepo::connect(path.to_str().unwrap()).await.unwrap();
    repo.init().await.unwrap();
    repo
}

#[tokio::test]
async fn connect_and_init_twice_is_noop() {
    let dir = TempDir::new().unwrap();
    let repo = repo_in(&dir).await;
    // Second init is a no-op (IF NOT EXISTS)
    repo.init().await.unwrap();
    assert_eq!(repo.count().await.unwrap(), 0);
}

#[tokio::test]
async fn insert_and_query_all_newest_first() {
    let dir = TempDir::new().unwrap();
    let repo = repo_in(&dir).await;

    for (ts, cpu) in [(1_000, 10.0), (3_000, 30.0), (2_000, 20.0)] {
        repo.insert_sample(&sample_at(ts, cpu)).await.unwrap();
    }

    let all = repo.all_samples().await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].timestamp, 3_000);
    assert_eq!(all[1].timestamp, 2_000);
    assert_eq!(all[2].timestamp, 1_000);
    assert_eq!(all[0].cpu_percent, 30.0);
    assert_eq!(all[2].network_latency_ms, Some(15.5));
    assert_eq!(repo.count().await.unwrap(), 3);
}

#[tokio::test]
async fn latency_null_round_trips() {
    let dir = TempDir::new().unwrap();
    let repo = repo_in(&dir).await;

    let mut sample = sample_at(1_000, 10.0);
    sample.network_latency_ms = None;
    repo.insert_sample(&sample).await.unwrap();

    let all = repo.all_samples().await.unwrap();
    assert_eq!(all[0].network_latency_ms, None);
    assert_eq!(all[0], sample);
}

#[tokio::test]
async fn samples_since_is_the_descending_suffix_of_all() {
    let dir = TempDir::new().unwrap();
    let repo = repo_in(&dir).await;

    for ts in [1_000, 2_000, 3_000, 4_000] {
        repo.insert_sample(&sample_at(ts, 10.0)).await.unwrap();
    }

    let all = repo.all_samples().await.unwrap();
    let since = repo.samples_since(2_000).await.unwrap();
    assert_eq!(since.len(), 3);
    // Exactly the subset of all_samples with timestamp >= since, same order
    let expected: Vec<_> = all.iter().filter(|s| s.timestamp >= 2_000).cloned().collect();
    assert_eq!(since, expected);
    assert_eq!(since[0].timestamp, 4_000);

    // Boundary is inclusive
    let at_newest = repo.samples_since(4_000).await.unwrap();
    assert_eq!(at_newest.len(), 1);
}

#[tokio::test]
async fn delete_older_than_counts_and_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let repo = repo_in(&dir).await;

    for ts in [1_000, 2_000, 3_000, 4_000] {
        repo.insert_sample(&sample_at(ts, 10.0)).await.unwrap();
    }

    let deleted = repo.delete_older_than(3_000).await.unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(repo.count().await.unwrap(), 2);

    // Second sweep with the same cutoff removes nothing
    let deleted_again = repo.delete_older_than(3_000).await.unwrap();
    assert_eq!(deleted_again, 0);
    assert_eq!(repo.count().await.unwrap(), 2);
}

#[tokio::test]
async fn range_query_and_summary_end_to_end() {
    let dir = TempDir::new().unwrap();
    let repo = repo_in(&dir).await;

    let now = now_epoch_ms();
    let hour = 3_600_000;
    repo.insert_sample(&sample_at(now - 48 * hour, 10.0)).await.unwrap();
    repo.insert_sample(&sample_at(now - 20 * hour, 50.0)).await.unwrap();
    repo.insert_sample(&sample_at(now - hour, 90.0)).await.unwrap();

    let last_day = repo.samples_since(now - 24 * hour).await.unwrap();
    assert_eq!(last_day.len(), 2);
    assert_eq!(last_day[0].cpu_percent, 90.0);
    assert_eq!(last_day[1].cpu_percent, 50.0);

    let summary = summarize(&last_day);
    assert_eq!(summary.cpu.avg, 70.0);
    assert_eq!(summary.cpu.min, 50.0);
    assert_eq!(summary.cpu.max, 90.0);
}
