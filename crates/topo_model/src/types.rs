//! Identifiers, assignments, and movement records shared across the controller.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Cluster node identifier.
pub type NodeId = u64;
/// Core (execution shard) index on a node.
pub type CoreId = u32;
/// Partition index within a topic.
pub type PartitionId = u32;
/// Replication group identifier handed to the replication layer.
pub type GroupId = u64;
/// Position of an entry in the controller log.
pub type Offset = u64;
/// Leadership term.
pub type Term = u64;

/// Term attached to leaders published before the replication layer elects one.
pub const ESTIMATED_LEADER_TERM: Term = 1;

const INTERNAL_NAMESPACE: &str = "kafka_internal";
const KAFKA_NAMESPACE: &str = "kafka";
const CONSUMER_OFFSETS_TOPIC: &str = "__consumer_offsets";

/// Topic identity: namespace plus topic name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TopicNamespace {
    pub ns: String,
    pub topic: String,
}

impl TopicNamespace {
    pub fn new(ns: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            ns: ns.into(),
            topic: topic.into(),
        }
    }

    /// Partition identifier for `partition` of this topic.
    pub fn ntp(&self, partition: PartitionId) -> Ntp {
        Ntp {
            ns: self.ns.clone(),
            topic: self.topic.clone(),
            partition,
        }
    }
}

impl fmt::Display for TopicNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.ns, self.topic)
    }
}

/// Globally unique partition identifier (namespace, topic, partition).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ntp {
    pub ns: String,
    pub topic: String,
    pub partition: PartitionId,
}

impl Ntp {
    pub fn new(ns: impl Into<String>, topic: impl Into<String>, partition: PartitionId) -> Self {
        Self {
            ns: ns.into(),
            topic: topic.into(),
            partition,
        }
    }

    pub fn tp_ns(&self) -> TopicNamespace {
        TopicNamespace::new(self.ns.clone(), self.topic.clone())
    }
}

impl fmt::Display for Ntp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.ns, self.topic, self.partition)
    }
}

/// One placement slot: a core on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReplicaTarget {
    pub node_id: NodeId,
    pub core: CoreId,
}

impl ReplicaTarget {
    pub const fn new(node_id: NodeId, core: CoreId) -> Self {
        Self { node_id, core }
    }
}

impl fmt::Display for ReplicaTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.node_id, self.core)
    }
}

/// Distinct placement targets hosting a partition's replicas.
///
/// Insertion order is kept (the first replica is the estimated leader) but
/// equality is set equality.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<ReplicaTarget>", into = "Vec<ReplicaTarget>")]
pub struct ReplicaSet {
    targets: Vec<ReplicaTarget>,
}

impl ReplicaSet {
    pub fn new(targets: impl IntoIterator<Item = ReplicaTarget>) -> Self {
        let mut out = Self::default();
        for target in targets {
            out.insert(target);
        }
        out
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Adds `target` unless it is already present. Returns whether it was added.
    pub fn insert(&mut self, target: ReplicaTarget) -> bool {
        if self.targets.contains(&target) {
            return false;
        }
        self.targets.push(target);
        true
    }

    pub fn contains(&self, target: &ReplicaTarget) -> bool {
        self.targets.contains(target)
    }

    pub fn first(&self) -> Option<&ReplicaTarget> {
        self.targets.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReplicaTarget> {
        self.targets.iter()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn as_slice(&self) -> &[ReplicaTarget] {
        &self.targets
    }
}

impl PartialEq for ReplicaSet {
    fn eq(&self, other: &Self) -> bool {
        self.targets.len() == other.targets.len()
            && self.targets.iter().all(|t| other.targets.contains(t))
    }
}

impl Eq for ReplicaSet {}

impl From<Vec<ReplicaTarget>> for ReplicaSet {
    fn from(targets: Vec<ReplicaTarget>) -> Self {
        Self::new(targets)
    }
}

impl From<ReplicaSet> for Vec<ReplicaTarget> {
    fn from(set: ReplicaSet) -> Self {
        set.targets
    }
}

impl FromIterator<ReplicaTarget> for ReplicaSet {
    fn from_iter<I: IntoIterator<Item = ReplicaTarget>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<'a> IntoIterator for &'a ReplicaSet {
    type Item = &'a ReplicaTarget;
    type IntoIter = std::slice::Iter<'a, ReplicaTarget>;

    fn into_iter(self) -> Self::IntoIter {
        self.targets.iter()
    }
}

impl fmt::Display for ReplicaSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (idx, target) in self.targets.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{target}")?;
        }
        f.write_str("}")
    }
}

/// Current placement of one partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionAssignment {
    pub group: GroupId,
    pub id: PartitionId,
    pub replicas: ReplicaSet,
}

/// Topic assignments keyed by partition id.
pub type AssignmentsSet = BTreeMap<PartitionId, PartitionAssignment>;

/// Progress of a pending replica-set change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementState {
    InProgress,
    Cancelled,
    ForceCancelled,
}

/// Pending replica-set change for one partition.
///
/// `previous` and `target` are fixed when the move begins; cancellation only
/// changes `state`, which flips the direction of data transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRecord {
    pub previous: ReplicaSet,
    pub target: ReplicaSet,
    pub state: MovementState,
}

impl MovementRecord {
    /// Side of the move whose slots are released by a finish that will never
    /// arrive (e.g. the topic is deleted mid-move).
    pub fn abandoned_replicas(&self) -> &ReplicaSet {
        match self.state {
            MovementState::InProgress => &self.previous,
            MovementState::Cancelled | MovementState::ForceCancelled => &self.target,
        }
    }
}

/// Placement-accounting bucket a topic's allocations are tracked under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AllocationDomain {
    Common,
    Internal,
}

impl AllocationDomain {
    pub fn for_topic(tp_ns: &TopicNamespace) -> Self {
        Self::classify(&tp_ns.ns, &tp_ns.topic)
    }

    pub fn for_ntp(ntp: &Ntp) -> Self {
        Self::classify(&ntp.ns, &ntp.topic)
    }

    fn classify(ns: &str, topic: &str) -> Self {
        if ns == INTERNAL_NAMESPACE || (ns == KAFKA_NAMESPACE && topic == CONSUMER_OFFSETS_TOPIC) {
            AllocationDomain::Internal
        } else {
            AllocationDomain::Common
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CleanupPolicy {
    Delete,
    Compact,
    CompactDelete,
}

/// Topic-level property overrides. `None` means the cluster default applies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicProperties {
    #[serde(default)]
    pub retention_ms: Option<u64>,
    #[serde(default)]
    pub retention_bytes: Option<u64>,
    #[serde(default)]
    pub segment_size: Option<u64>,
    #[serde(default)]
    pub cleanup_policy: Option<CleanupPolicy>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicConfiguration {
    pub partition_count: u32,
    pub replication_factor: u16,
    #[serde(default)]
    pub properties: TopicProperties,
}

/// Change to a single property: keep, overwrite, or reset to default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncrementalUpdate<T> {
    None,
    Set(T),
    Remove,
}

impl<T> Default for IncrementalUpdate<T> {
    fn default() -> Self {
        IncrementalUpdate::None
    }
}

impl<T> IncrementalUpdate<T> {
    pub fn apply_to(self, value: &mut Option<T>) {
        match self {
            IncrementalUpdate::None => {}
            IncrementalUpdate::Set(v) => *value = Some(v),
            IncrementalUpdate::Remove => *value = None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicPropertiesUpdate {
    #[serde(default)]
    pub retention_ms: IncrementalUpdate<u64>,
    #[serde(default)]
    pub retention_bytes: IncrementalUpdate<u64>,
    #[serde(default)]
    pub segment_size: IncrementalUpdate<u64>,
    #[serde(default)]
    pub cleanup_policy: IncrementalUpdate<CleanupPolicy>,
}

impl TopicPropertiesUpdate {
    pub fn apply_to(self, properties: &mut TopicProperties) {
        self.retention_ms.apply_to(&mut properties.retention_ms);
        self.retention_bytes.apply_to(&mut properties.retention_bytes);
        self.segment_size.apply_to(&mut properties.segment_size);
        self.cleanup_policy.apply_to(&mut properties.cleanup_policy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rs(nodes: &[NodeId]) -> ReplicaSet {
        nodes.iter().map(|n| ReplicaTarget::new(*n, 0)).collect()
    }

    #[test]
    fn replica_set_equality_ignores_order_and_dedupes() {
        let a = ReplicaSet::new(vec![
            ReplicaTarget::new(1, 0),
            ReplicaTarget::new(2, 0),
            ReplicaTarget::new(1, 0),
        ]);
        assert_eq!(a.len(), 2);
        assert_eq!(a, rs(&[2, 1]));
        assert_ne!(a, rs(&[1, 2, 3]));
        assert_eq!(a.first(), Some(&ReplicaTarget::new(1, 0)));
    }

    #[test]
    fn replica_set_distinguishes_cores() {
        let a = ReplicaSet::new(vec![ReplicaTarget::new(1, 0)]);
        let b = ReplicaSet::new(vec![ReplicaTarget::new(1, 1)]);
        assert_ne!(a, b);
    }

    #[test]
    fn abandoned_side_follows_movement_state() {
        let mut record = MovementRecord {
            previous: rs(&[1, 2, 3]),
            target: rs(&[1, 2, 4]),
            state: MovementState::InProgress,
        };
        assert_eq!(record.abandoned_replicas(), &rs(&[1, 2, 3]));
        record.state = MovementState::Cancelled;
        assert_eq!(record.abandoned_replicas(), &rs(&[1, 2, 4]));
        record.state = MovementState::ForceCancelled;
        assert_eq!(record.abandoned_replicas(), &rs(&[1, 2, 4]));
    }

    #[test]
    fn allocation_domain_for_internal_topics() {
        assert_eq!(
            AllocationDomain::for_topic(&TopicNamespace::new("kafka", "orders")),
            AllocationDomain::Common
        );
        assert_eq!(
            AllocationDomain::for_topic(&TopicNamespace::new("kafka", "__consumer_offsets")),
            AllocationDomain::Internal
        );
        assert_eq!(
            AllocationDomain::for_ntp(&Ntp::new("kafka_internal", "tx", 3)),
            AllocationDomain::Internal
        );
    }

    #[test]
    fn properties_update_sets_and_removes() {
        let mut props = TopicProperties {
            retention_ms: Some(10),
            segment_size: Some(1024),
            ..Default::default()
        };
        TopicPropertiesUpdate {
            retention_ms: IncrementalUpdate::Set(20),
            segment_size: IncrementalUpdate::Remove,
            cleanup_policy: IncrementalUpdate::Set(CleanupPolicy::Compact),
            ..Default::default()
        }
        .apply_to(&mut props);
        assert_eq!(props.retention_ms, Some(20));
        assert_eq!(props.segment_size, None);
        assert_eq!(props.cleanup_policy, Some(CleanupPolicy::Compact));
        assert_eq!(props.retention_bytes, None);
    }

    #[test]
    fn replica_set_serializes_as_list() {
        let set = rs(&[3, 1]);
        let json = serde_json::to_string(&set).expect("serialize");
        assert_eq!(json, r#"[{"node_id":3,"core":0},{"node_id":1,"core":0}]"#);
        let back: ReplicaSet = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.first(), Some(&ReplicaTarget::new(3, 0)));
    }
}
