//! Partition balancer bookkeeping.

use std::collections::BTreeMap;
use std::sync::Mutex;

use topo_model::{NodeId, PartitionId, ReplicaSet};

/// Receives every logical replica-set transition. An empty `previous` means
/// the partition was created; an empty `next` means it was deleted.
pub trait BalancerBookkeeping: Send + Sync {
    fn handle_ntp_update(
        &self,
        ns: &str,
        topic: &str,
        partition: PartitionId,
        previous: &ReplicaSet,
        next: &ReplicaSet,
    );
}

#[derive(Debug, Default)]
struct BalancerInner {
    node_replicas: BTreeMap<NodeId, usize>,
    updates: u64,
}

/// Per-node replica counts as seen by the partition balancer.
#[derive(Debug, Default)]
pub struct PartitionBalancerState {
    inner: Mutex<BalancerInner>,
}

impl PartitionBalancerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_replicas(&self, node_id: NodeId) -> usize {
        let inner = self.inner.lock().expect("balancer lock poisoned");
        inner.node_replicas.get(&node_id).copied().unwrap_or(0)
    }

    pub fn replicas_per_node(&self) -> BTreeMap<NodeId, usize> {
        self.inner
            .lock()
            .expect("balancer lock poisoned")
            .node_replicas
            .clone()
    }

    pub fn updates(&self) -> u64 {
        self.inner.lock().expect("balancer lock poisoned").updates
    }
}

impl BalancerBookkeeping for PartitionBalancerState {
    fn handle_ntp_update(
        &self,
        ns: &str,
        topic: &str,
        partition: PartitionId,
        previous: &ReplicaSet,
        next: &ReplicaSet,
    ) {
        let mut guard = self.inner.lock().expect("balancer lock poisoned");
        let inner = &mut *guard;
        for target in previous.iter().filter(|t| !next.contains(t)) {
            let remaining = match inner.node_replicas.get_mut(&target.node_id) {
                Some(count) => {
                    *count -= 1;
                    *count
                }
                None => {
                    tracing::warn!(
                        ns,
                        topic,
                        partition,
                        node_id = target.node_id,
                        "balancer update removes replica from node without replicas"
                    );
                    continue;
                }
            };
            if remaining == 0 {
                inner.node_replicas.remove(&target.node_id);
            }
        }
        for target in next.iter().filter(|t| !previous.contains(t)) {
            *inner.node_replicas.entry(target.node_id).or_insert(0) += 1;
        }
        inner.updates += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use topo_model::ReplicaTarget;

    fn rs(nodes: &[NodeId]) -> ReplicaSet {
        nodes.iter().map(|n| ReplicaTarget::new(*n, 0)).collect()
    }

    #[test]
    fn transitions_move_counts_between_nodes() {
        let state = PartitionBalancerState::new();
        state.handle_ntp_update("kafka", "orders", 0, &ReplicaSet::empty(), &rs(&[1, 2, 3]));
        state.handle_ntp_update("kafka", "orders", 0, &rs(&[1, 2, 3]), &rs(&[1, 2, 4]));
        assert_eq!(state.node_replicas(3), 0);
        assert_eq!(state.node_replicas(4), 1);
        assert_eq!(state.node_replicas(1), 1);

        state.handle_ntp_update("kafka", "orders", 0, &rs(&[1, 2, 4]), &ReplicaSet::empty());
        assert!(state.replicas_per_node().is_empty());
        assert_eq!(state.updates(), 3);
    }
}
