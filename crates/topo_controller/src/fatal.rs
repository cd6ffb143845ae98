//! Fatal consistency violations.
//!
//! A violation means the catalog replicas disagree with each other or with
//! their own movement bookkeeping. Applying further log entries on top of
//! such state is unsafe, so violations never become an `ApplyResult`: they
//! halt the applier.

use topo_model::{ApplyResult, CommandKind, Ntp, Offset, ReplicaSet};

#[derive(Debug, Clone, thiserror::Error)]
pub enum ConsistencyViolation {
    #[error("state inconsistency across shards detected for {command} at offset {offset}: results {results:?}")]
    ShardDivergence {
        command: CommandKind,
        offset: Offset,
        results: Vec<ApplyResult>,
    },

    #[error("catalog shard unavailable while applying {command} at offset {offset}: {reason}")]
    ShardUnavailable {
        command: CommandKind,
        offset: Offset,
        reason: String,
    },

    #[error("{command} for {subject} succeeded at offset {offset} but its assignment was absent before apply")]
    MissingAssignment {
        command: CommandKind,
        subject: String,
        offset: Offset,
    },

    #[error("{command} for {ntp} succeeded at offset {offset} but the {missing} replica set of its move was absent before apply")]
    MissingMovementState {
        command: CommandKind,
        ntp: Ntp,
        offset: Offset,
        missing: &'static str,
    },

    #[error("finish of {ntp} at offset {offset}: command replicas {command_replicas} match neither previous {previous} nor target {target}")]
    UnexpectedFinishReplicas {
        ntp: Ntp,
        offset: Offset,
        command_replicas: ReplicaSet,
        previous: ReplicaSet,
        target: ReplicaSet,
    },
}

/// Stop processing. Release builds abort on panic, so this ends the process.
#[track_caller]
pub fn halt(violation: ConsistencyViolation) -> ! {
    tracing::error!(%violation, "fatal consistency violation, halting controller");
    panic!("fatal consistency violation: {violation}");
}

/// Unwrap pre-state that must exist, halting with `violation` otherwise.
#[track_caller]
pub fn require<T>(value: Option<T>, violation: impl FnOnce() -> ConsistencyViolation) -> T {
    match value {
        Some(value) => value,
        None => halt(violation()),
    }
}
