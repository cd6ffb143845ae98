//! Result codes returned by a catalog replica for one controller command.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of applying a command to the catalog.
///
/// Everything other than `Success` is an expected rejection: the log may
/// replay a command against a catalog that already reflects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ApplyResult {
    Success,
    TopicNotExists,
    PartitionNotExists,
    TopicAlreadyExists,
    PartitionAlreadyExists,
    TopicInvalidPartitions,
    UpdateInProgress,
    NoUpdateInProgress,
    InvalidReplicaSet,
    SourceTopicNotExists,
    SourceTopicStillInUse,
    TopicOperationNotSupported,
}

impl ApplyResult {
    pub fn is_success(self) -> bool {
        self == ApplyResult::Success
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ApplyResult::Success => "success",
            ApplyResult::TopicNotExists => "topic_not_exists",
            ApplyResult::PartitionNotExists => "partition_not_exists",
            ApplyResult::TopicAlreadyExists => "topic_already_exists",
            ApplyResult::PartitionAlreadyExists => "partition_already_exists",
            ApplyResult::TopicInvalidPartitions => "topic_invalid_partitions",
            ApplyResult::UpdateInProgress => "update_in_progress",
            ApplyResult::NoUpdateInProgress => "no_update_in_progress",
            ApplyResult::InvalidReplicaSet => "invalid_replica_set",
            ApplyResult::SourceTopicNotExists => "source_topic_not_exists",
            ApplyResult::SourceTopicStillInUse => "source_topic_still_in_use",
            ApplyResult::TopicOperationNotSupported => "topic_operation_not_supported",
        }
    }
}

impl fmt::Display for ApplyResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
