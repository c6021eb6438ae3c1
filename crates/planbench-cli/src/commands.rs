use std::path::Path;

use anyhow::{Context, bail};
use planbench_client::{Client, RemoteCollection};
use planbench_core::{ResultStore, run_benchmark, run_detection};

use crate::config::Config;
use crate::workload;

/// Run the slow-query detection sweep over the whole workload.
pub async fn detect(config: &Config, threshold_override: Option<u64>) -> anyhow::Result<()> {
    let threshold_ms = threshold_override.unwrap_or(config.bench.threshold_ms);
    let candidates = workload::load_workload(Path::new(&config.bench.workload))?;

    let (client, collection) = connect(config).await?;
    let store = ResultStore::new(&config.bench.results_dir);

    let outcome = run_detection(&collection, &store, &candidates, threshold_ms)
        .await
        .context("detection sweep failed")?;
    client.close().await;

    println!(
        "measured {} candidates against {} (threshold {} ms)",
        outcome.summary.len(),
        config.bench.collection,
        threshold_ms
    );
    for entry in &outcome.summary {
        let marker = if entry.execution_time_millis > threshold_ms {
            "SLOW"
        } else {
            "ok  "
        };
        println!(
            "  {marker} {:>8} ms  {}",
            entry.execution_time_millis, entry.query_name
        );
    }
    println!(
        "benchmarked {} slow queries, results in {}",
        outcome.records.len(),
        store.dir().display()
    );

    Ok(())
}

/// Benchmark a single named candidate from the workload, regardless of
/// how fast it currently runs.
pub async fn bench(config: &Config, name: &str) -> anyhow::Result<()> {
    let candidates = workload::load_workload(Path::new(&config.bench.workload))?;
    let Some(candidate) = candidates.iter().find(|c| c.name == name) else {
        bail!(
            "no candidate named '{name}' in {} (available: {})",
            config.bench.workload,
            candidates
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    };

    let (client, collection) = connect(config).await?;
    let store = ResultStore::new(&config.bench.results_dir);

    let record = run_benchmark(&collection, &store, candidate)
        .await
        .with_context(|| format!("benchmark of '{name}' failed"))?;
    client.close().await;

    let before = record.results.before.execution_time_millis;
    println!("{name}: before {before} ms (index type {})", record.index_type);
    if let Some(after) = &record.results.after {
        println!(
            "{name}: after  {} ms using {}",
            after.execution_time_millis,
            after.index_name.as_deref().unwrap_or("<no index>")
        );
    }

    Ok(())
}

/// Check connectivity and round-trip latency.
pub async fn ping(config: &Config) -> anyhow::Result<()> {
    let addr = config.server.addr();
    let client = Client::connect(&addr)
        .await
        .with_context(|| format!("connecting to {addr}"))?;

    let started = std::time::Instant::now();
    client.ping().await.context("ping failed")?;
    println!("pong from {addr} in {:?}", started.elapsed());

    client.close().await;
    Ok(())
}

async fn connect(config: &Config) -> anyhow::Result<(Client, RemoteCollection)> {
    let addr = config.server.addr();
    let client = Client::connect(&addr)
        .await
        .with_context(|| format!("connecting to {addr}"))?;
    let collection = client.collection(&config.bench.collection);
    Ok((client, collection))
}
