//! Shared placement types for the topic controller.
//!
//! This crate is kept dependency-light because the types are used by the
//! catalog replicas, the command applier, and the accounting collaborators.
//! `types` holds identifiers and assignment records, `replicas` the replica-set
//! algebra, `commands` the closed set of controller log commands, and `errc`
//! the result codes a catalog apply returns.

pub mod commands;
pub mod errc;
pub mod replicas;
pub mod types;

pub use commands::{
    decode_command, encode_command, CancelMovingPartitionReplicasCmd, Command, CommandKind,
    CreateNonReplicableTopicCmd, CreatePartitionCmd, CreateTopicCmd, DeleteTopicCmd,
    FinishMovingPartitionReplicasCmd, LogEntry, LogRecord, MovePartitionReplicasCmd,
    MoveTopicReplicasCmd, PartitionMove, RevertCancelPartitionMoveCmd, UpdateTopicPropertiesCmd,
};
pub use errc::ApplyResult;
pub use replicas::{are_replica_sets_equal, subtract_replica_sets, union_replica_sets};
pub use types::{
    AllocationDomain, AssignmentsSet, CleanupPolicy, CoreId, GroupId, IncrementalUpdate,
    MovementRecord, MovementState, NodeId, Ntp, Offset, PartitionAssignment, PartitionId,
    ReplicaSet, ReplicaTarget, Term, TopicConfiguration, TopicNamespace, TopicProperties,
    TopicPropertiesUpdate, ESTIMATED_LEADER_TERM,
};
