// Replay binary: rebuilds the topic catalog from a controller log and prints
// the resulting accounting as JSON.

use std::io::IsTerminal;
use std::sync::Arc;

use clap::Parser;
use serde::Serialize;
use topo_controller::{
    LogReplayDriver, PartitionAllocator, PartitionBalancerState, PartitionLeadersTable,
    PartitionSummary, ReplayArgs, ReplayStats, Sharded, SlotAllocation, TopicTable,
    TopicUpdatesDispatcher,
};
use topo_model::NodeId;

#[derive(Serialize)]
struct ReplaySummary {
    shards: usize,
    stats: ReplayStats,
    allocations: Vec<SlotAllocation>,
    balancer_replicas_per_node: std::collections::BTreeMap<NodeId, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    partitions: Option<Vec<PartitionSummary>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Enable ANSI colors only when stdout is a terminal and NO_COLOR is unset.
    let ansi = std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
    tracing_subscriber::fmt()
        .with_ansi(ansi)
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = ReplayArgs::parse();
    let shards = args.resolved_shards();
    tracing::info!(log = %args.log.display(), shards, yield_every = args.yield_every, "starting replay");

    let topic_table = Sharded::start(shards, |_| TopicTable::new());
    let leaders = Sharded::start(shards, |_| PartitionLeadersTable::new());
    let allocator = Arc::new(PartitionAllocator::new());
    let balancer = Arc::new(PartitionBalancerState::new());

    let dispatcher = TopicUpdatesDispatcher::new(
        topic_table.clone(),
        allocator.clone(),
        Arc::new(leaders),
        balancer.clone(),
        args.dispatcher_config(),
    );
    let mut driver = LogReplayDriver::new(dispatcher);
    driver.replay_file(&args.log).await?;

    let partitions = if args.dump_state {
        Some(topic_table.invoke_on(0, |table: &mut TopicTable| table.describe()).await?)
    } else {
        None
    };
    let summary = ReplaySummary {
        shards,
        stats: driver.stats().clone(),
        allocations: allocator.snapshot(),
        balancer_replicas_per_node: balancer.replicas_per_node(),
        partitions,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
