//! Per-shard partition leadership table.

use std::collections::BTreeMap;

use async_trait::async_trait;
use topo_model::{NodeId, Ntp, Term};

use crate::sharded::Sharded;

/// Leadership propagation used by the command applier. Implementations
/// broadcast the update to every shard copy of the table.
#[async_trait]
pub trait LeadershipTable: Send + Sync {
    async fn update_partition_leader(&self, ntp: &Ntp, term: Term, leader: NodeId)
        -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaderTermId {
    pub term: Term,
    pub leader: NodeId,
}

/// Shard-local view of partition leaders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionLeadersTable {
    leaders: BTreeMap<Ntp, LeaderTermId>,
}

impl PartitionLeadersTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `leader` for `ntp` unless a newer term is already known.
    pub fn update_partition_leader(&mut self, ntp: &Ntp, term: Term, leader: NodeId) {
        if let Some(current) = self.leaders.get(ntp) {
            if current.term > term {
                tracing::trace!(%ntp, term, current_term = current.term, "ignoring stale leader update");
                return;
            }
        }
        self.leaders.insert(ntp.clone(), LeaderTermId { term, leader });
    }

    pub fn get_leader(&self, ntp: &Ntp) -> Option<LeaderTermId> {
        self.leaders.get(ntp).copied()
    }

    pub fn len(&self) -> usize {
        self.leaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaders.is_empty()
    }
}

#[async_trait]
impl LeadershipTable for Sharded<PartitionLeadersTable> {
    async fn update_partition_leader(
        &self,
        ntp: &Ntp,
        term: Term,
        leader: NodeId,
    ) -> anyhow::Result<()> {
        let ntp = ntp.clone();
        self.invoke_on_all(move |table: &mut PartitionLeadersTable| {
            table.update_partition_leader(&ntp, term, leader)
        })
        .await?;
        Ok(())
    }
}
