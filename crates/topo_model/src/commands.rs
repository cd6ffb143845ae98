//! Controller log commands.
//!
//! Each accepted topology decision is one `Command`. Payload structs carry the
//! command key (a topic or a partition) plus the kind-specific value.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{
    Ntp, Offset, PartitionAssignment, PartitionId, ReplicaSet, TopicConfiguration,
    TopicNamespace, TopicPropertiesUpdate,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTopicCmd {
    pub topic: TopicNamespace,
    pub configuration: TopicConfiguration,
    pub assignments: Vec<PartitionAssignment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteTopicCmd {
    pub topic: TopicNamespace,
}

/// Adds partitions to an existing topic. `partition_count` is the new total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePartitionCmd {
    pub topic: TopicNamespace,
    pub partition_count: u32,
    pub assignments: Vec<PartitionAssignment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovePartitionReplicasCmd {
    pub ntp: Ntp,
    pub replicas: ReplicaSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelMovingPartitionReplicasCmd {
    pub ntp: Ntp,
    #[serde(default)]
    pub force: bool,
}

/// Ends a move. `replicas` is the final replica set: the move target for a
/// completed move, the original replicas for a completed cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishMovingPartitionReplicasCmd {
    pub ntp: Ntp,
    pub replicas: ReplicaSet,
}

/// Rewinds a cancellation whose underlying reconfiguration had already
/// finished toward the move target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevertCancelPartitionMoveCmd {
    pub ntp: Ntp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionMove {
    pub partition: PartitionId,
    pub replicas: ReplicaSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveTopicReplicasCmd {
    pub topic: TopicNamespace,
    pub moves: Vec<PartitionMove>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTopicPropertiesCmd {
    pub topic: TopicNamespace,
    pub update: TopicPropertiesUpdate,
}

/// Creates `name` as a non-replicated alias sharing `source`'s placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateNonReplicableTopicCmd {
    pub source: TopicNamespace,
    pub name: TopicNamespace,
}

/// Closed set of commands the controller log carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    CreateTopic(CreateTopicCmd),
    DeleteTopic(DeleteTopicCmd),
    CreatePartition(CreatePartitionCmd),
    MovePartitionReplicas(MovePartitionReplicasCmd),
    CancelMovingPartitionReplicas(CancelMovingPartitionReplicasCmd),
    FinishMovingPartitionReplicas(FinishMovingPartitionReplicasCmd),
    RevertCancelPartitionMove(RevertCancelPartitionMoveCmd),
    MoveTopicReplicas(MoveTopicReplicasCmd),
    UpdateTopicProperties(UpdateTopicPropertiesCmd),
    CreateNonReplicableTopic(CreateNonReplicableTopicCmd),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CommandKind {
    CreateTopic,
    DeleteTopic,
    CreatePartition,
    MovePartitionReplicas,
    CancelMovingPartitionReplicas,
    FinishMovingPartitionReplicas,
    RevertCancelPartitionMove,
    MoveTopicReplicas,
    UpdateTopicProperties,
    CreateNonReplicableTopic,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandKind::CreateTopic => "create_topic",
            CommandKind::DeleteTopic => "delete_topic",
            CommandKind::CreatePartition => "create_partition",
            CommandKind::MovePartitionReplicas => "move_partition_replicas",
            CommandKind::CancelMovingPartitionReplicas => "cancel_moving_partition_replicas",
            CommandKind::FinishMovingPartitionReplicas => "finish_moving_partition_replicas",
            CommandKind::RevertCancelPartitionMove => "revert_cancel_partition_move",
            CommandKind::MoveTopicReplicas => "move_topic_replicas",
            CommandKind::UpdateTopicProperties => "update_topic_properties",
            CommandKind::CreateNonReplicableTopic => "create_non_replicable_topic",
        };
        f.write_str(name)
    }
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::CreateTopic(_) => CommandKind::CreateTopic,
            Command::DeleteTopic(_) => CommandKind::DeleteTopic,
            Command::CreatePartition(_) => CommandKind::CreatePartition,
            Command::MovePartitionReplicas(_) => CommandKind::MovePartitionReplicas,
            Command::CancelMovingPartitionReplicas(_) => CommandKind::CancelMovingPartitionReplicas,
            Command::FinishMovingPartitionReplicas(_) => CommandKind::FinishMovingPartitionReplicas,
            Command::RevertCancelPartitionMove(_) => CommandKind::RevertCancelPartitionMove,
            Command::MoveTopicReplicas(_) => CommandKind::MoveTopicReplicas,
            Command::UpdateTopicProperties(_) => CommandKind::UpdateTopicProperties,
            Command::CreateNonReplicableTopic(_) => CommandKind::CreateNonReplicableTopic,
        }
    }

    /// Human-readable command key (topic or partition) for logs.
    pub fn key(&self) -> String {
        match self {
            Command::CreateTopic(cmd) => cmd.topic.to_string(),
            Command::DeleteTopic(cmd) => cmd.topic.to_string(),
            Command::CreatePartition(cmd) => cmd.topic.to_string(),
            Command::MovePartitionReplicas(cmd) => cmd.ntp.to_string(),
            Command::CancelMovingPartitionReplicas(cmd) => cmd.ntp.to_string(),
            Command::FinishMovingPartitionReplicas(cmd) => cmd.ntp.to_string(),
            Command::RevertCancelPartitionMove(cmd) => cmd.ntp.to_string(),
            Command::MoveTopicReplicas(cmd) => cmd.topic.to_string(),
            Command::UpdateTopicProperties(cmd) => cmd.topic.to_string(),
            Command::CreateNonReplicableTopic(cmd) => cmd.name.to_string(),
        }
    }
}

/// Raw controller log entry: the command payload and the offset it was
/// committed at.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub offset: Offset,
    pub payload: Vec<u8>,
}

/// Decoded controller log entry, one JSON object per line in replay files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub offset: Offset,
    pub command: Command,
}

pub fn encode_command(cmd: &Command) -> anyhow::Result<Vec<u8>> {
    Ok(serde_json::to_vec(cmd)?)
}

pub fn decode_command(data: &[u8]) -> anyhow::Result<Command> {
    Ok(serde_json::from_slice(data)?)
}
