//! Per-shard topic/partition catalog.
//!
//! One `TopicTable` lives on every shard (see `Sharded`). The table is the
//! authority for topic metadata, current replica assignments, and in-flight
//! replica movements. All maps are ordered so two replicas that applied the
//! same commands compare equal.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use topo_model::{
    ApplyResult, AssignmentsSet, CancelMovingPartitionReplicasCmd, Command,
    CreateNonReplicableTopicCmd, CreatePartitionCmd, CreateTopicCmd, DeleteTopicCmd,
    FinishMovingPartitionReplicasCmd, MovePartitionReplicasCmd, MoveTopicReplicasCmd,
    MovementRecord, MovementState, Ntp, Offset, PartitionAssignment, ReplicaSet,
    RevertCancelPartitionMoveCmd, TopicConfiguration, TopicNamespace, UpdateTopicPropertiesCmd,
};

/// Catalog operations the command applier relies on.
///
/// `apply` must be deterministic: the same command at the same offset yields
/// the same result and the same mutation on every replica.
pub trait CatalogReplica: Send + 'static {
    fn apply(&mut self, cmd: Command, offset: Offset) -> ApplyResult;

    fn topic_assignments(&self, tp_ns: &TopicNamespace) -> Option<AssignmentsSet>;

    fn partition_assignment(&self, ntp: &Ntp) -> Option<PartitionAssignment>;

    /// Replica set the in-flight move of `ntp` started from.
    fn previous_replica_set(&self, ntp: &Ntp) -> Option<ReplicaSet>;

    /// Replica set the in-flight move of `ntp` was requested to reach.
    fn target_replica_set(&self, ntp: &Ntp) -> Option<ReplicaSet>;

    fn updates_in_progress(&self) -> &BTreeMap<Ntp, MovementRecord>;
}

/// Metadata kept for one topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicMetadata {
    pub configuration: TopicConfiguration,
    pub assignments: AssignmentsSet,
    /// Set for non-replicable topics: the topic whose placement is shared.
    pub source_topic: Option<TopicNamespace>,
    /// Offset of the command that created the topic.
    pub revision: Offset,
}

/// Flattened view of one partition for state dumps.
#[derive(Debug, Clone, Serialize)]
pub struct PartitionSummary {
    pub ntp: String,
    pub group: u64,
    pub replicas: ReplicaSet,
    pub movement: Option<MovementRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicTable {
    topics: BTreeMap<TopicNamespace, TopicMetadata>,
    updates_in_progress: BTreeMap<Ntp, MovementRecord>,
    last_applied: Option<Offset>,
}

impl TopicTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn topic(&self, tp_ns: &TopicNamespace) -> Option<&TopicMetadata> {
        self.topics.get(tp_ns)
    }

    pub fn topics(&self) -> impl Iterator<Item = (&TopicNamespace, &TopicMetadata)> {
        self.topics.iter()
    }

    pub fn last_applied(&self) -> Option<Offset> {
        self.last_applied
    }

    pub fn is_update_in_progress(&self, ntp: &Ntp) -> bool {
        self.updates_in_progress.contains_key(ntp)
    }

    pub fn describe(&self) -> Vec<PartitionSummary> {
        let mut out = Vec::new();
        for (tp_ns, md) in &self.topics {
            for p_as in md.assignments.values() {
                let ntp = tp_ns.ntp(p_as.id);
                out.push(PartitionSummary {
                    movement: self.updates_in_progress.get(&ntp).cloned(),
                    ntp: ntp.to_string(),
                    group: p_as.group,
                    replicas: p_as.replicas.clone(),
                });
            }
        }
        out
    }

    fn apply_create_topic(&mut self, cmd: CreateTopicCmd, offset: Offset) -> ApplyResult {
        if self.topics.contains_key(&cmd.topic) {
            return ApplyResult::TopicAlreadyExists;
        }
        if cmd.assignments.is_empty() {
            return ApplyResult::TopicInvalidPartitions;
        }
        let mut assignments = AssignmentsSet::new();
        for p_as in cmd.assignments {
            if assignments.insert(p_as.id, p_as).is_some() {
                return ApplyResult::TopicInvalidPartitions;
            }
        }
        self.topics.insert(
            cmd.topic,
            TopicMetadata {
                configuration: cmd.configuration,
                assignments,
                source_topic: None,
                revision: offset,
            },
        );
        ApplyResult::Success
    }

    fn apply_delete_topic(&mut self, cmd: DeleteTopicCmd) -> ApplyResult {
        if !self.topics.contains_key(&cmd.topic) {
            return ApplyResult::TopicNotExists;
        }
        let aliased = self
            .topics
            .values()
            .any(|md| md.source_topic.as_ref() == Some(&cmd.topic));
        if aliased {
            return ApplyResult::SourceTopicStillInUse;
        }
        self.topics.remove(&cmd.topic);
        self.updates_in_progress
            .retain(|ntp, _| !(ntp.ns == cmd.topic.ns && ntp.topic == cmd.topic.topic));
        ApplyResult::Success
    }

    fn apply_create_partition(&mut self, cmd: CreatePartitionCmd) -> ApplyResult {
        let Some(md) = self.topics.get(&cmd.topic) else {
            return ApplyResult::TopicNotExists;
        };
        if md.source_topic.is_some() {
            return ApplyResult::TopicOperationNotSupported;
        }
        let moving = md
            .assignments
            .keys()
            .any(|id| self.updates_in_progress.contains_key(&cmd.topic.ntp(*id)));
        if moving {
            return ApplyResult::UpdateInProgress;
        }
        let mut added = AssignmentsSet::new();
        for p_as in cmd.assignments {
            if md.assignments.contains_key(&p_as.id) || added.contains_key(&p_as.id) {
                return ApplyResult::PartitionAlreadyExists;
            }
            added.insert(p_as.id, p_as);
        }
        let expected_total = md.assignments.len() + added.len();
        if added.is_empty() || expected_total != cmd.partition_count as usize {
            return ApplyResult::TopicInvalidPartitions;
        }
        let Some(md) = self.topics.get_mut(&cmd.topic) else {
            return ApplyResult::TopicNotExists;
        };
        md.assignments.extend(added);
        md.configuration.partition_count = cmd.partition_count;
        ApplyResult::Success
    }

    /// Resolves the assignment for `ntp`, or the rejection to return.
    fn assignment_mut(&mut self, ntp: &Ntp) -> Result<&mut PartitionAssignment, ApplyResult> {
        lookup_assignment(&mut self.topics, ntp)
    }

    fn apply_move_partition_replicas(&mut self, cmd: MovePartitionReplicasCmd) -> ApplyResult {
        if cmd.replicas.is_empty() {
            return ApplyResult::InvalidReplicaSet;
        }
        let in_progress = self.updates_in_progress.contains_key(&cmd.ntp);
        let p_as = match self.assignment_mut(&cmd.ntp) {
            Ok(p_as) => p_as,
            Err(ec) => return ec,
        };
        if in_progress {
            return ApplyResult::UpdateInProgress;
        }
        if p_as.replicas == cmd.replicas {
            // Nothing to move.
            return ApplyResult::Success;
        }
        let previous = std::mem::replace(&mut p_as.replicas, cmd.replicas.clone());
        self.updates_in_progress.insert(
            cmd.ntp,
            MovementRecord {
                previous,
                target: cmd.replicas,
                state: MovementState::InProgress,
            },
        );
        ApplyResult::Success
    }

    fn apply_cancel_moving(&mut self, cmd: CancelMovingPartitionReplicasCmd) -> ApplyResult {
        let p_as = match lookup_assignment(&mut self.topics, &cmd.ntp) {
            Ok(p_as) => p_as,
            Err(ec) => return ec,
        };
        let Some(record) = self.updates_in_progress.get_mut(&cmd.ntp) else {
            return ApplyResult::NoUpdateInProgress;
        };
        let next_state = match (record.state, cmd.force) {
            (MovementState::InProgress, false) => MovementState::Cancelled,
            (MovementState::InProgress, true) | (MovementState::Cancelled, true) => {
                MovementState::ForceCancelled
            }
            (MovementState::Cancelled, false) | (MovementState::ForceCancelled, _) => {
                return ApplyResult::NoUpdateInProgress;
            }
        };
        record.state = next_state;
        p_as.replicas = record.previous.clone();
        ApplyResult::Success
    }

    fn apply_finish_moving(&mut self, cmd: FinishMovingPartitionReplicasCmd) -> ApplyResult {
        let in_progress = self.updates_in_progress.contains_key(&cmd.ntp);
        let p_as = match self.assignment_mut(&cmd.ntp) {
            Ok(p_as) => p_as,
            Err(ec) => return ec,
        };
        if !in_progress {
            return ApplyResult::NoUpdateInProgress;
        }
        // Current replicas already point at the side the data is moving to.
        if p_as.replicas != cmd.replicas {
            return ApplyResult::InvalidReplicaSet;
        }
        p_as.replicas = cmd.replicas;
        self.updates_in_progress.remove(&cmd.ntp);
        ApplyResult::Success
    }

    fn apply_revert_cancel(&mut self, cmd: RevertCancelPartitionMoveCmd) -> ApplyResult {
        let p_as = match lookup_assignment(&mut self.topics, &cmd.ntp) {
            Ok(p_as) => p_as,
            Err(ec) => return ec,
        };
        match self.updates_in_progress.entry(cmd.ntp) {
            Entry::Occupied(record) if record.get().state != MovementState::InProgress => {
                p_as.replicas = record.remove().target;
                ApplyResult::Success
            }
            _ => ApplyResult::NoUpdateInProgress,
        }
    }

    fn apply_move_topic_replicas(&mut self, cmd: MoveTopicReplicasCmd) -> ApplyResult {
        let Some(md) = self.topics.get(&cmd.topic) else {
            return ApplyResult::TopicNotExists;
        };
        // Validate every partition before mutating any of them.
        let mut named = BTreeSet::new();
        for mv in &cmd.moves {
            if !md.assignments.contains_key(&mv.partition) {
                return ApplyResult::PartitionNotExists;
            }
            // Each partition may be named once.
            if !named.insert(mv.partition) || mv.replicas.is_empty() {
                return ApplyResult::InvalidReplicaSet;
            }
            if self
                .updates_in_progress
                .contains_key(&cmd.topic.ntp(mv.partition))
            {
                return ApplyResult::UpdateInProgress;
            }
        }
        for mv in cmd.moves {
            let ntp = cmd.topic.ntp(mv.partition);
            let ec = self.apply_move_partition_replicas(MovePartitionReplicasCmd {
                ntp,
                replicas: mv.replicas,
            });
            if !ec.is_success() {
                return ec;
            }
        }
        ApplyResult::Success
    }

    fn apply_update_properties(&mut self, cmd: UpdateTopicPropertiesCmd) -> ApplyResult {
        let Some(md) = self.topics.get_mut(&cmd.topic) else {
            return ApplyResult::TopicNotExists;
        };
        cmd.update.apply_to(&mut md.configuration.properties);
        ApplyResult::Success
    }

    fn apply_create_non_replicable(
        &mut self,
        cmd: CreateNonReplicableTopicCmd,
        offset: Offset,
    ) -> ApplyResult {
        let Some(source) = self.topics.get(&cmd.source) else {
            return ApplyResult::SourceTopicNotExists;
        };
        if self.topics.contains_key(&cmd.name) {
            return ApplyResult::TopicAlreadyExists;
        }
        let md = TopicMetadata {
            configuration: source.configuration.clone(),
            assignments: source.assignments.clone(),
            source_topic: Some(cmd.source),
            revision: offset,
        };
        self.topics.insert(cmd.name, md);
        ApplyResult::Success
    }
}

fn lookup_assignment<'a>(
    topics: &'a mut BTreeMap<TopicNamespace, TopicMetadata>,
    ntp: &Ntp,
) -> Result<&'a mut PartitionAssignment, ApplyResult> {
    let md = topics
        .get_mut(&ntp.tp_ns())
        .ok_or(ApplyResult::TopicNotExists)?;
    md.assignments
        .get_mut(&ntp.partition)
        .ok_or(ApplyResult::PartitionNotExists)
}

impl CatalogReplica for TopicTable {
    fn apply(&mut self, cmd: Command, offset: Offset) -> ApplyResult {
        let ec = match cmd {
            Command::CreateTopic(cmd) => self.apply_create_topic(cmd, offset),
            Command::DeleteTopic(cmd) => self.apply_delete_topic(cmd),
            Command::CreatePartition(cmd) => self.apply_create_partition(cmd),
            Command::MovePartitionReplicas(cmd) => self.apply_move_partition_replicas(cmd),
            Command::CancelMovingPartitionReplicas(cmd) => self.apply_cancel_moving(cmd),
            Command::FinishMovingPartitionReplicas(cmd) => self.apply_finish_moving(cmd),
            Command::RevertCancelPartitionMove(cmd) => self.apply_revert_cancel(cmd),
            Command::MoveTopicReplicas(cmd) => self.apply_move_topic_replicas(cmd),
            Command::UpdateTopicProperties(cmd) => self.apply_update_properties(cmd),
            Command::CreateNonReplicableTopic(cmd) => self.apply_create_non_replicable(cmd, offset),
        };
        self.last_applied = Some(offset);
        ec
    }

    fn topic_assignments(&self, tp_ns: &TopicNamespace) -> Option<AssignmentsSet> {
        self.topics.get(tp_ns).map(|md| md.assignments.clone())
    }

    fn partition_assignment(&self, ntp: &Ntp) -> Option<PartitionAssignment> {
        self.topics
            .get(&ntp.tp_ns())?
            .assignments
            .get(&ntp.partition)
            .cloned()
    }

    fn previous_replica_set(&self, ntp: &Ntp) -> Option<ReplicaSet> {
        self.updates_in_progress
            .get(ntp)
            .map(|record| record.previous.clone())
    }

    fn target_replica_set(&self, ntp: &Ntp) -> Option<ReplicaSet> {
        self.updates_in_progress
            .get(ntp)
            .map(|record| record.target.clone())
    }

    fn updates_in_progress(&self) -> &BTreeMap<Ntp, MovementRecord> {
        &self.updates_in_progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use topo_model::{
        IncrementalUpdate, NodeId, PartitionMove, ReplicaTarget, TopicProperties,
        TopicPropertiesUpdate,
    };

    fn rs(nodes: &[NodeId]) -> ReplicaSet {
        nodes.iter().map(|n| ReplicaTarget::new(*n, 0)).collect()
    }

    fn orders() -> TopicNamespace {
        TopicNamespace::new("kafka", "orders")
    }

    fn create_orders(partitions: u32) -> Command {
        Command::CreateTopic(CreateTopicCmd {
            topic: orders(),
            configuration: TopicConfiguration {
                partition_count: partitions,
                replication_factor: 3,
                properties: TopicProperties::default(),
            },
            assignments: (0..partitions)
                .map(|id| PartitionAssignment {
                    group: u64::from(id) + 1,
                    id,
                    replicas: rs(&[1, 2, 3]),
                })
                .collect(),
        })
    }

    fn move_cmd(partition: u32, nodes: &[NodeId]) -> Command {
        Command::MovePartitionReplicas(MovePartitionReplicasCmd {
            ntp: orders().ntp(partition),
            replicas: rs(nodes),
        })
    }

    fn table_with_orders(partitions: u32) -> TopicTable {
        let mut table = TopicTable::new();
        assert_eq!(table.apply(create_orders(partitions), 1), ApplyResult::Success);
        table
    }

    #[test]
    fn create_topic_twice_is_rejected() {
        let mut table = table_with_orders(3);
        assert_eq!(table.apply(create_orders(3), 2), ApplyResult::TopicAlreadyExists);
        assert_eq!(table.topic_assignments(&orders()).map(|a| a.len()), Some(3));
        assert_eq!(table.last_applied(), Some(2));
    }

    #[test]
    fn move_records_previous_and_target() {
        let mut table = table_with_orders(1);
        let ntp = orders().ntp(0);
        assert_eq!(table.apply(move_cmd(0, &[1, 2, 4]), 2), ApplyResult::Success);
        assert_eq!(table.previous_replica_set(&ntp), Some(rs(&[1, 2, 3])));
        assert_eq!(table.target_replica_set(&ntp), Some(rs(&[1, 2, 4])));
        assert_eq!(
            table.partition_assignment(&ntp).map(|p| p.replicas),
            Some(rs(&[1, 2, 4]))
        );
        assert_eq!(table.apply(move_cmd(0, &[1, 2, 5]), 3), ApplyResult::UpdateInProgress);
        assert_eq!(table.apply(move_cmd(7, &[1, 2, 5]), 4), ApplyResult::PartitionNotExists);
    }

    #[test]
    fn move_to_current_replicas_creates_no_record() {
        let mut table = table_with_orders(1);
        assert_eq!(table.apply(move_cmd(0, &[3, 2, 1]), 2), ApplyResult::Success);
        assert!(table.updates_in_progress().is_empty());
    }

    #[test]
    fn cancel_then_finish_restores_previous() {
        let mut table = table_with_orders(1);
        let ntp = orders().ntp(0);
        table.apply(move_cmd(0, &[1, 2, 4]), 2);
        let cancel = Command::CancelMovingPartitionReplicas(CancelMovingPartitionReplicasCmd {
            ntp: ntp.clone(),
            force: false,
        });
        assert_eq!(table.apply(cancel.clone(), 3), ApplyResult::Success);
        assert_eq!(
            table.updates_in_progress().get(&ntp).map(|r| r.state),
            Some(MovementState::Cancelled)
        );
        assert_eq!(table.apply(cancel, 4), ApplyResult::NoUpdateInProgress);

        let finish_wrong = Command::FinishMovingPartitionReplicas(FinishMovingPartitionReplicasCmd {
            ntp: ntp.clone(),
            replicas: rs(&[1, 2, 4]),
        });
        assert_eq!(table.apply(finish_wrong, 5), ApplyResult::InvalidReplicaSet);

        let finish = Command::FinishMovingPartitionReplicas(FinishMovingPartitionReplicasCmd {
            ntp: ntp.clone(),
            replicas: rs(&[1, 2, 3]),
        });
        assert_eq!(table.apply(finish, 6), ApplyResult::Success);
        assert!(!table.is_update_in_progress(&ntp));
        assert_eq!(
            table.partition_assignment(&ntp).map(|p| p.replicas),
            Some(rs(&[1, 2, 3]))
        );
    }

    #[test]
    fn force_cancel_escalates_a_cancelled_move() {
        let mut table = table_with_orders(1);
        let ntp = orders().ntp(0);
        table.apply(move_cmd(0, &[1, 2, 4]), 2);
        let cancel = |force| {
            Command::CancelMovingPartitionReplicas(CancelMovingPartitionReplicasCmd {
                ntp: ntp.clone(),
                force,
            })
        };
        assert_eq!(table.apply(cancel(false), 3), ApplyResult::Success);
        assert_eq!(table.apply(cancel(true), 4), ApplyResult::Success);
        assert_eq!(
            table.updates_in_progress().get(&ntp).map(|r| r.state),
            Some(MovementState::ForceCancelled)
        );
        assert_eq!(table.apply(cancel(true), 5), ApplyResult::NoUpdateInProgress);
    }

    #[test]
    fn revert_cancel_requires_cancelled_move() {
        let mut table = table_with_orders(1);
        let ntp = orders().ntp(0);
        let revert = Command::RevertCancelPartitionMove(RevertCancelPartitionMoveCmd {
            ntp: ntp.clone(),
        });
        assert_eq!(table.apply(revert.clone(), 2), ApplyResult::NoUpdateInProgress);
        table.apply(move_cmd(0, &[1, 2, 4]), 3);
        assert_eq!(table.apply(revert.clone(), 4), ApplyResult::NoUpdateInProgress);
        table.apply(
            Command::CancelMovingPartitionReplicas(CancelMovingPartitionReplicasCmd {
                ntp: ntp.clone(),
                force: false,
            }),
            5,
        );
        assert_eq!(table.apply(revert, 6), ApplyResult::Success);
        assert!(table.updates_in_progress().is_empty());
        assert_eq!(
            table.partition_assignment(&ntp).map(|p| p.replicas),
            Some(rs(&[1, 2, 4]))
        );
    }

    #[test]
    fn delete_topic_drops_in_progress_moves() {
        let mut table = table_with_orders(2);
        table.apply(move_cmd(1, &[4, 5, 6]), 2);
        let delete = Command::DeleteTopic(DeleteTopicCmd { topic: orders() });
        assert_eq!(table.apply(delete.clone(), 3), ApplyResult::Success);
        assert!(table.updates_in_progress().is_empty());
        assert_eq!(table.apply(delete, 4), ApplyResult::TopicNotExists);
    }

    #[test]
    fn delete_source_of_non_replicable_topic_is_rejected() {
        let mut table = table_with_orders(1);
        let alias = TopicNamespace::new("kafka", "orders-archive");
        let create_alias = Command::CreateNonReplicableTopic(CreateNonReplicableTopicCmd {
            source: orders(),
            name: alias.clone(),
        });
        assert_eq!(table.apply(create_alias.clone(), 2), ApplyResult::Success);
        assert_eq!(table.apply(create_alias, 3), ApplyResult::TopicAlreadyExists);
        assert_eq!(
            table.topic(&alias).and_then(|md| md.source_topic.clone()),
            Some(orders())
        );
        let delete = Command::DeleteTopic(DeleteTopicCmd { topic: orders() });
        assert_eq!(table.apply(delete, 4), ApplyResult::SourceTopicStillInUse);

        let missing = Command::CreateNonReplicableTopic(CreateNonReplicableTopicCmd {
            source: TopicNamespace::new("kafka", "missing"),
            name: TopicNamespace::new("kafka", "other"),
        });
        assert_eq!(table.apply(missing, 5), ApplyResult::SourceTopicNotExists);
    }

    #[test]
    fn create_partition_validates_ids_and_total() {
        let mut table = table_with_orders(2);
        let add = |ids: &[u32], total: u32| {
            Command::CreatePartition(CreatePartitionCmd {
                topic: orders(),
                partition_count: total,
                assignments: ids
                    .iter()
                    .map(|id| PartitionAssignment {
                        group: 100 + u64::from(*id),
                        id: *id,
                        replicas: rs(&[2, 3, 4]),
                    })
                    .collect(),
            })
        };
        assert_eq!(table.apply(add(&[1], 3), 2), ApplyResult::PartitionAlreadyExists);
        assert_eq!(table.apply(add(&[2], 4), 3), ApplyResult::TopicInvalidPartitions);
        assert_eq!(table.apply(add(&[2, 3], 4), 4), ApplyResult::Success);
        let md = table.topic(&orders()).expect("topic");
        assert_eq!(md.configuration.partition_count, 4);
        assert_eq!(md.assignments.len(), 4);
    }

    #[test]
    fn move_topic_replicas_is_all_or_nothing() {
        let mut table = table_with_orders(2);
        let cmd = Command::MoveTopicReplicas(MoveTopicReplicasCmd {
            topic: orders(),
            moves: vec![
                PartitionMove {
                    partition: 0,
                    replicas: rs(&[4, 5, 6]),
                },
                PartitionMove {
                    partition: 9,
                    replicas: rs(&[4, 5, 6]),
                },
            ],
        });
        assert_eq!(table.apply(cmd, 2), ApplyResult::PartitionNotExists);
        assert!(table.updates_in_progress().is_empty());
        assert_eq!(
            table.partition_assignment(&orders().ntp(0)).map(|p| p.replicas),
            Some(rs(&[1, 2, 3]))
        );
    }

    #[test]
    fn move_topic_replicas_rejects_repeated_partition() {
        let mut table = table_with_orders(2);
        let before = table.clone();
        let cmd = Command::MoveTopicReplicas(MoveTopicReplicasCmd {
            topic: orders(),
            moves: vec![
                PartitionMove {
                    partition: 0,
                    replicas: rs(&[4, 5, 6]),
                },
                PartitionMove {
                    partition: 0,
                    replicas: rs(&[7, 8, 9]),
                },
            ],
        });
        assert_eq!(table.apply(cmd, 2), ApplyResult::InvalidReplicaSet);
        assert_eq!(table.topics, before.topics);
        assert_eq!(table.updates_in_progress, before.updates_in_progress);
    }

    #[test]
    fn update_properties_changes_only_named_fields() {
        let mut table = table_with_orders(1);
        let cmd = Command::UpdateTopicProperties(UpdateTopicPropertiesCmd {
            topic: orders(),
            update: TopicPropertiesUpdate {
                retention_ms: IncrementalUpdate::Set(60_000),
                ..Default::default()
            },
        });
        assert_eq!(table.apply(cmd, 2), ApplyResult::Success);
        let props = &table.topic(&orders()).expect("topic").configuration.properties;
        assert_eq!(props.retention_ms, Some(60_000));
        assert_eq!(props.retention_bytes, None);
    }
}
