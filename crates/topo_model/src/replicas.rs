//! Replica-set algebra used to derive placement-accounting deltas.
//!
//! All functions are pure and never mutate their inputs.

use crate::types::ReplicaSet;

/// Targets present in `lhs` but not in `rhs`, in `lhs` order.
pub fn subtract_replica_sets(lhs: &ReplicaSet, rhs: &ReplicaSet) -> ReplicaSet {
    lhs.iter().filter(|t| !rhs.contains(t)).copied().collect()
}

/// Distinct targets from both sets; `lhs` targets come first.
pub fn union_replica_sets(lhs: &ReplicaSet, rhs: &ReplicaSet) -> ReplicaSet {
    lhs.iter().chain(rhs.iter()).copied().collect()
}

pub fn are_replica_sets_equal(lhs: &ReplicaSet, rhs: &ReplicaSet) -> bool {
    lhs == rhs
}
