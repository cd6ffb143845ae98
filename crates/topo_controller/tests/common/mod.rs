//! Shared helpers for integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use topo_controller::{
    BalancerBookkeeping, DispatcherConfig, LeadershipTable, PlacementAccounting, Sharded,
    TopicTable, TopicUpdatesDispatcher,
};
use topo_model::{
    AllocationDomain, Command, CreateTopicCmd, GroupId, NodeId, Ntp, PartitionAssignment,
    PartitionId, ReplicaSet, ReplicaTarget, Term, TopicConfiguration, TopicNamespace,
    TopicProperties,
};

/// Replica set on core 0 of each of `nodes`.
pub fn rs(nodes: &[NodeId]) -> ReplicaSet {
    nodes.iter().map(|n| ReplicaTarget::new(*n, 0)).collect()
}

pub fn orders() -> TopicNamespace {
    TopicNamespace::new("kafka", "orders")
}

pub fn create_topic(tp_ns: TopicNamespace, partitions: u32, nodes: &[NodeId]) -> Command {
    Command::CreateTopic(CreateTopicCmd {
        topic: tp_ns,
        configuration: TopicConfiguration {
            partition_count: partitions,
            replication_factor: nodes.len() as u16,
            properties: TopicProperties::default(),
        },
        assignments: (0..partitions)
            .map(|id| PartitionAssignment {
                group: u64::from(id) + 1,
                id,
                replicas: rs(nodes),
            })
            .collect(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocatorCall {
    Add(ReplicaSet, AllocationDomain),
    Remove(ReplicaSet, AllocationDomain),
    Register(ReplicaSet, GroupId, AllocationDomain),
}

#[derive(Default)]
pub struct RecordingAllocator {
    pub calls: Mutex<Vec<AllocatorCall>>,
}

impl RecordingAllocator {
    pub fn take(&self) -> Vec<AllocatorCall> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }
}

impl PlacementAccounting for RecordingAllocator {
    fn add_allocations(&self, replicas: &ReplicaSet, domain: AllocationDomain) {
        self.calls
            .lock()
            .unwrap()
            .push(AllocatorCall::Add(replicas.clone(), domain));
    }

    fn remove_allocations(&self, replicas: &ReplicaSet, domain: AllocationDomain) {
        self.calls
            .lock()
            .unwrap()
            .push(AllocatorCall::Remove(replicas.clone(), domain));
    }

    fn update_allocation_state(&self, replicas: &ReplicaSet, group: GroupId, domain: AllocationDomain) {
        self.calls
            .lock()
            .unwrap()
            .push(AllocatorCall::Register(replicas.clone(), group, domain));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalancerCall {
    pub ntp: Ntp,
    pub previous: ReplicaSet,
    pub next: ReplicaSet,
}

#[derive(Default)]
pub struct RecordingBalancer {
    pub calls: Mutex<Vec<BalancerCall>>,
}

impl RecordingBalancer {
    pub fn take(&self) -> Vec<BalancerCall> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }
}

impl BalancerBookkeeping for RecordingBalancer {
    fn handle_ntp_update(
        &self,
        ns: &str,
        topic: &str,
        partition: PartitionId,
        previous: &ReplicaSet,
        next: &ReplicaSet,
    ) {
        self.calls.lock().unwrap().push(BalancerCall {
            ntp: Ntp::new(ns, topic, partition),
            previous: previous.clone(),
            next: next.clone(),
        });
    }
}

#[derive(Default)]
pub struct RecordingLeaders {
    pub calls: Mutex<Vec<(Ntp, Term, NodeId)>>,
    pub fail: bool,
}

impl RecordingLeaders {
    pub fn take(&self) -> Vec<(Ntp, Term, NodeId)> {
        let mut calls = std::mem::take(&mut *self.calls.lock().unwrap());
        calls.sort();
        calls
    }
}

#[async_trait]
impl LeadershipTable for RecordingLeaders {
    async fn update_partition_leader(
        &self,
        ntp: &Ntp,
        term: Term,
        leader: NodeId,
    ) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push((ntp.clone(), term, leader));
        if self.fail {
            anyhow::bail!("leaders table unavailable");
        }
        Ok(())
    }
}

/// Dispatcher over `shards` fresh topic tables with recording collaborators.
pub struct Harness {
    pub dispatcher: TopicUpdatesDispatcher<TopicTable>,
    pub tables: Sharded<TopicTable>,
    pub allocator: Arc<RecordingAllocator>,
    pub balancer: Arc<RecordingBalancer>,
    pub leaders: Arc<RecordingLeaders>,
}

impl Harness {
    pub fn start(shards: usize) -> Self {
        Self::with_leaders(shards, RecordingLeaders::default())
    }

    pub fn with_leaders(shards: usize, leaders: RecordingLeaders) -> Self {
        let tables = Sharded::start(shards, |_| TopicTable::new());
        let allocator = Arc::new(RecordingAllocator::default());
        let balancer = Arc::new(RecordingBalancer::default());
        let leaders = Arc::new(leaders);
        let dispatcher = TopicUpdatesDispatcher::new(
            tables.clone(),
            allocator.clone(),
            leaders.clone(),
            balancer.clone(),
            DispatcherConfig { yield_every: 2 },
        );
        Self {
            dispatcher,
            tables,
            allocator,
            balancer,
            leaders,
        }
    }

    /// Forget the side effects recorded so far.
    pub fn reset(&self) {
        self.allocator.take();
        self.balancer.take();
        self.leaders.take();
    }

    pub async fn shard_tables(&self) -> Vec<TopicTable> {
        self.tables
            .invoke_on_all(|table: &mut TopicTable| table.clone())
            .await
            .expect("read shard tables")
    }
}
