//! Partition placement accounting.
//!
//! The allocator only keeps counters: which (node, core) slots currently host
//! a replica, per allocation domain. Choosing placements happens elsewhere.

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::Serialize;
use topo_model::{AllocationDomain, CoreId, GroupId, NodeId, ReplicaSet, ReplicaTarget};

/// Placement-accounting surface used by the command applier.
pub trait PlacementAccounting: Send + Sync {
    /// Reserve `replicas` (incremental add during a move).
    fn add_allocations(&self, replicas: &ReplicaSet, domain: AllocationDomain);

    /// Release `replicas`.
    fn remove_allocations(&self, replicas: &ReplicaSet, domain: AllocationDomain);

    /// Register a freshly decided placement for replication group `group`.
    fn update_allocation_state(&self, replicas: &ReplicaSet, group: GroupId, domain: AllocationDomain);
}

/// One row of the allocation table, for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotAllocation {
    pub domain: AllocationDomain,
    pub node_id: NodeId,
    pub core: CoreId,
    pub allocated: u32,
}

#[derive(Debug, Default)]
struct AllocationState {
    slots: BTreeMap<(AllocationDomain, ReplicaTarget), u32>,
    highest_group: GroupId,
}

impl AllocationState {
    fn add(&mut self, replicas: &ReplicaSet, domain: AllocationDomain) {
        for target in replicas {
            *self.slots.entry((domain, *target)).or_insert(0) += 1;
        }
    }

    fn remove(&mut self, replicas: &ReplicaSet, domain: AllocationDomain) {
        for target in replicas {
            let key = (domain, *target);
            let remaining = match self.slots.get_mut(&key) {
                Some(count) => {
                    *count -= 1;
                    *count
                }
                None => {
                    tracing::warn!(
                        node_id = target.node_id,
                        core = target.core,
                        ?domain,
                        "releasing allocation that was never registered"
                    );
                    continue;
                }
            };
            if remaining == 0 {
                self.slots.remove(&key);
            }
        }
    }
}

/// In-memory placement accounting shared by the whole controller.
#[derive(Debug, Default)]
pub struct PartitionAllocator {
    state: Mutex<AllocationState>,
}

impl PartitionAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocated(&self, target: ReplicaTarget, domain: AllocationDomain) -> u32 {
        let state = self.state.lock().expect("allocator lock poisoned");
        state.slots.get(&(domain, target)).copied().unwrap_or(0)
    }

    /// Total replicas hosted on `node_id` across cores, in `domain`.
    pub fn node_allocated(&self, node_id: NodeId, domain: AllocationDomain) -> u32 {
        let state = self.state.lock().expect("allocator lock poisoned");
        state
            .slots
            .iter()
            .filter(|((d, t), _)| *d == domain && t.node_id == node_id)
            .map(|(_, count)| *count)
            .sum()
    }

    pub fn total_allocated(&self, domain: AllocationDomain) -> u32 {
        let state = self.state.lock().expect("allocator lock poisoned");
        state
            .slots
            .iter()
            .filter(|((d, _), _)| *d == domain)
            .map(|(_, count)| *count)
            .sum()
    }

    pub fn highest_group(&self) -> GroupId {
        self.state.lock().expect("allocator lock poisoned").highest_group
    }

    pub fn snapshot(&self) -> Vec<SlotAllocation> {
        let state = self.state.lock().expect("allocator lock poisoned");
        state
            .slots
            .iter()
            .map(|((domain, target), allocated)| SlotAllocation {
                domain: *domain,
                node_id: target.node_id,
                core: target.core,
                allocated: *allocated,
            })
            .collect()
    }
}

impl PlacementAccounting for PartitionAllocator {
    fn add_allocations(&self, replicas: &ReplicaSet, domain: AllocationDomain) {
        self.state
            .lock()
            .expect("allocator lock poisoned")
            .add(replicas, domain);
    }

    fn remove_allocations(&self, replicas: &ReplicaSet, domain: AllocationDomain) {
        self.state
            .lock()
            .expect("allocator lock poisoned")
            .remove(replicas, domain);
    }

    fn update_allocation_state(&self, replicas: &ReplicaSet, group: GroupId, domain: AllocationDomain) {
        let mut state = self.state.lock().expect("allocator lock poisoned");
        state.add(replicas, domain);
        state.highest_group = state.highest_group.max(group);
    }
}
