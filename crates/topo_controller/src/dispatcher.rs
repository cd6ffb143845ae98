//! Applies controller log commands to every shard's topic table and keeps the
//! placement accounting, balancer bookkeeping, and leadership estimates in
//! step with the result.
//!
//! Every handler has the same shape:
//! 1. read the pre-state it needs from shard 0's table,
//! 2. apply the command on all shards and check they agree,
//! 3. on success, derive deltas from (pre-state, command) and push them to
//!    the collaborators exactly once.
//!
//! Some commands only carry the new state, so step 1 must happen before the
//! table is mutated.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures_util::future::join_all;
use topo_model::{
    decode_command, subtract_replica_sets, union_replica_sets, AllocationDomain, ApplyResult,
    AssignmentsSet, CancelMovingPartitionReplicasCmd, Command, CommandKind,
    CreateNonReplicableTopicCmd, CreatePartitionCmd, CreateTopicCmd, DeleteTopicCmd,
    FinishMovingPartitionReplicasCmd, LogEntry, MovePartitionReplicasCmd, MoveTopicReplicasCmd,
    MovementRecord, NodeId, Ntp, Offset, PartitionAssignment, PartitionId, ReplicaSet,
    RevertCancelPartitionMoveCmd, TopicNamespace, ESTIMATED_LEADER_TERM,
};

use crate::allocator::PlacementAccounting;
use crate::balancer_state::BalancerBookkeeping;
use crate::fatal::{halt, require, ConsistencyViolation};
use crate::leaders_table::LeadershipTable;
use crate::sharded::Sharded;
use crate::topic_table::{CatalogReplica, TopicTable};

/// Tuning for the applier.
#[derive(Clone, Copy, Debug)]
pub struct DispatcherConfig {
    /// Yield to the scheduler after this many per-partition side effects.
    /// `0` disables yielding.
    pub yield_every: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self { yield_every: 64 }
    }
}

/// Controller command applier.
///
/// `apply` takes `&mut self`: one command is fully processed (fan-out and
/// side effects) before the next may start.
pub struct TopicUpdatesDispatcher<T = TopicTable> {
    topic_table: Sharded<T>,
    allocator: Arc<dyn PlacementAccounting>,
    leaders: Arc<dyn LeadershipTable>,
    balancer: Arc<dyn BalancerBookkeeping>,
    config: DispatcherConfig,
}

impl<T: CatalogReplica> TopicUpdatesDispatcher<T> {
    pub fn new(
        topic_table: Sharded<T>,
        allocator: Arc<dyn PlacementAccounting>,
        leaders: Arc<dyn LeadershipTable>,
        balancer: Arc<dyn BalancerBookkeeping>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            topic_table,
            allocator,
            leaders,
            balancer,
            config,
        }
    }

    pub fn topic_table(&self) -> &Sharded<T> {
        &self.topic_table
    }

    /// Decode a raw log entry and apply it.
    pub async fn apply_update(&mut self, entry: LogEntry) -> anyhow::Result<ApplyResult> {
        let cmd = decode_command(&entry.payload)?;
        Ok(self.apply(cmd, entry.offset).await)
    }

    /// Apply one command committed at `offset`.
    pub async fn apply(&mut self, cmd: Command, offset: Offset) -> ApplyResult {
        tracing::debug!(offset, command = %cmd.kind(), key = %cmd.key(), "applying controller command");
        let ec = match cmd {
            Command::CreateTopic(cmd) => self.apply_create_topic(cmd, offset).await,
            Command::DeleteTopic(cmd) => self.apply_delete_topic(cmd, offset).await,
            Command::CreatePartition(cmd) => self.apply_create_partition(cmd, offset).await,
            Command::MovePartitionReplicas(cmd) => self.apply_move_partition(cmd, offset).await,
            Command::CancelMovingPartitionReplicas(cmd) => self.apply_cancel_move(cmd, offset).await,
            Command::FinishMovingPartitionReplicas(cmd) => self.apply_finish_move(cmd, offset).await,
            Command::RevertCancelPartitionMove(cmd) => self.apply_revert_cancel(cmd, offset).await,
            Command::MoveTopicReplicas(cmd) => self.apply_move_topic(cmd, offset).await,
            Command::UpdateTopicProperties(cmd) => {
                self.dispatch_updates_to_cores(Command::UpdateTopicProperties(cmd), offset)
                    .await
            }
            Command::CreateNonReplicableTopic(cmd) => {
                self.apply_create_non_replicable(cmd, offset).await
            }
        };
        if !ec.is_success() {
            tracing::debug!(offset, result = %ec, "controller command rejected");
        }
        ec
    }

    async fn apply_create_topic(&mut self, cmd: CreateTopicCmd, offset: Offset) -> ApplyResult {
        let tp_ns = cmd.topic.clone();
        let assignments = cmd.assignments.clone();

        let ec = self
            .dispatch_updates_to_cores(Command::CreateTopic(cmd), offset)
            .await;
        if !ec.is_success() {
            return ec;
        }

        self.register_new_partitions(&tp_ns, &assignments).await;
        ApplyResult::Success
    }

    async fn apply_create_partition(
        &mut self,
        cmd: CreatePartitionCmd,
        offset: Offset,
    ) -> ApplyResult {
        let tp_ns = cmd.topic.clone();
        let assignments = cmd.assignments.clone();

        let ec = self
            .dispatch_updates_to_cores(Command::CreatePartition(cmd), offset)
            .await;
        if !ec.is_success() {
            return ec;
        }

        self.register_new_partitions(&tp_ns, &assignments).await;
        ApplyResult::Success
    }

    /// Allocation, balancer, and leader-estimate updates for partitions that
    /// did not exist before.
    async fn register_new_partitions(
        &self,
        tp_ns: &TopicNamespace,
        assignments: &[PartitionAssignment],
    ) {
        let domain = AllocationDomain::for_topic(tp_ns);
        self.update_allocations(assignments, domain).await;

        let mut leaders = Vec::with_capacity(assignments.len());
        for (idx, p_as) in assignments.iter().enumerate() {
            self.balancer.handle_ntp_update(
                &tp_ns.ns,
                &tp_ns.topic,
                p_as.id,
                &ReplicaSet::empty(),
                &p_as.replicas,
            );
            if let Some(first) = p_as.replicas.first() {
                leaders.push((tp_ns.ntp(p_as.id), first.node_id));
            }
            self.maybe_yield(idx).await;
        }
        self.update_leaders_with_estimates(leaders).await;
    }

    async fn apply_delete_topic(&mut self, cmd: DeleteTopicCmd, offset: Offset) -> ApplyResult {
        let tp_ns = cmd.topic.clone();
        let (topic_assignments, in_progress) = self
            .read_local(CommandKind::DeleteTopic, offset, {
                let tp_ns = tp_ns.clone();
                move |table: &mut T| {
                    let assignments = table.topic_assignments(&tp_ns);
                    let in_progress = assignments
                        .as_ref()
                        .map(|a| collect_in_progress(&tp_ns, a, table.updates_in_progress()))
                        .unwrap_or_default();
                    (assignments, in_progress)
                }
            })
            .await;

        let ec = self
            .dispatch_updates_to_cores(Command::DeleteTopic(cmd), offset)
            .await;
        if !ec.is_success() {
            return ec;
        }

        let topic_assignments = require(topic_assignments, || {
            ConsistencyViolation::MissingAssignment {
                command: CommandKind::DeleteTopic,
                subject: tp_ns.to_string(),
                offset,
            }
        });
        tracing::trace!(topic = %tp_ns, in_progress = in_progress.len(), "deallocating topic");
        let domain = AllocationDomain::for_topic(&tp_ns);
        self.deallocate_topic(&tp_ns, &topic_assignments, &in_progress, domain)
            .await;
        for (idx, p_as) in topic_assignments.values().enumerate() {
            self.balancer.handle_ntp_update(
                &tp_ns.ns,
                &tp_ns.topic,
                p_as.id,
                &p_as.replicas,
                &ReplicaSet::empty(),
            );
            self.maybe_yield(idx).await;
        }
        ApplyResult::Success
    }

    async fn apply_move_partition(
        &mut self,
        cmd: MovePartitionReplicasCmd,
        offset: Offset,
    ) -> ApplyResult {
        let ntp = cmd.ntp.clone();
        let new_replicas = cmd.replicas.clone();
        let p_as = self
            .read_local(CommandKind::MovePartitionReplicas, offset, {
                let ntp = ntp.clone();
                move |table: &mut T| table.partition_assignment(&ntp)
            })
            .await;

        let ec = self
            .dispatch_updates_to_cores(Command::MovePartitionReplicas(cmd), offset)
            .await;
        if !ec.is_success() {
            return ec;
        }

        let p_as = require(p_as, || ConsistencyViolation::MissingAssignment {
            command: CommandKind::MovePartitionReplicas,
            subject: ntp.to_string(),
            offset,
        });
        // Old replicas stay reserved until the move finishes.
        let to_add = subtract_replica_sets(&new_replicas, &p_as.replicas);
        self.allocator
            .add_allocations(&to_add, AllocationDomain::for_ntp(&ntp));
        self.balancer.handle_ntp_update(
            &ntp.ns,
            &ntp.topic,
            ntp.partition,
            &p_as.replicas,
            &new_replicas,
        );
        ApplyResult::Success
    }

    async fn apply_cancel_move(
        &mut self,
        cmd: CancelMovingPartitionReplicasCmd,
        offset: Offset,
    ) -> ApplyResult {
        let ntp = cmd.ntp.clone();
        let (current_assignment, new_target_replicas) = self
            .read_local(CommandKind::CancelMovingPartitionReplicas, offset, {
                let ntp = ntp.clone();
                move |table: &mut T| {
                    (
                        table.partition_assignment(&ntp),
                        table.previous_replica_set(&ntp),
                    )
                }
            })
            .await;

        let ec = self
            .dispatch_updates_to_cores(Command::CancelMovingPartitionReplicas(cmd), offset)
            .await;
        if !ec.is_success() {
            return ec;
        }

        let current_assignment = require(current_assignment, || {
            ConsistencyViolation::MissingAssignment {
                command: CommandKind::CancelMovingPartitionReplicas,
                subject: ntp.to_string(),
                offset,
            }
        });
        let new_target_replicas = require(new_target_replicas, || {
            ConsistencyViolation::MissingMovementState {
                command: CommandKind::CancelMovingPartitionReplicas,
                ntp: ntp.clone(),
                offset,
                missing: "previous",
            }
        });
        // Both sides stay allocated while the transfer is reversed.
        self.balancer.handle_ntp_update(
            &ntp.ns,
            &ntp.topic,
            ntp.partition,
            &current_assignment.replicas,
            &new_target_replicas,
        );
        ApplyResult::Success
    }

    async fn apply_finish_move(
        &mut self,
        cmd: FinishMovingPartitionReplicasCmd,
        offset: Offset,
    ) -> ApplyResult {
        let ntp = cmd.ntp.clone();
        let command_replicas = cmd.replicas.clone();
        // `previous` and `target` are fixed when the move starts and survive
        // cancellation. A finished move transfers previous -> target, a
        // finished cancellation target -> previous; the command carries the
        // final replica set of whichever happened.
        let (previous_replicas, target_replicas) = self
            .read_move_sides(&ntp, CommandKind::FinishMovingPartitionReplicas, offset)
            .await;

        let ec = self
            .dispatch_updates_to_cores(Command::FinishMovingPartitionReplicas(cmd), offset)
            .await;
        if !ec.is_success() {
            return ec;
        }

        let (previous_replicas, target_replicas) = require_move_sides(
            previous_replicas,
            target_replicas,
            CommandKind::FinishMovingPartitionReplicas,
            &ntp,
            offset,
        );
        let to_delete = if target_replicas == command_replicas {
            subtract_replica_sets(&previous_replicas, &command_replicas)
        } else if previous_replicas == command_replicas {
            subtract_replica_sets(&target_replicas, &command_replicas)
        } else {
            halt(ConsistencyViolation::UnexpectedFinishReplicas {
                ntp: ntp.clone(),
                offset,
                command_replicas,
                previous: previous_replicas,
                target: target_replicas,
            });
        };
        self.allocator
            .remove_allocations(&to_delete, AllocationDomain::for_ntp(&ntp));
        ApplyResult::Success
    }

    async fn apply_revert_cancel(
        &mut self,
        cmd: RevertCancelPartitionMoveCmd,
        offset: Offset,
    ) -> ApplyResult {
        // The reconfiguration previous -> target finished before the
        // cancellation could take effect, so the table is rewound to target
        // and the slots a completed cancellation would have kept are released.
        let ntp = cmd.ntp.clone();
        let (previous_replicas, target_replicas) = self
            .read_move_sides(&ntp, CommandKind::RevertCancelPartitionMove, offset)
            .await;

        let ec = self
            .dispatch_updates_to_cores(Command::RevertCancelPartitionMove(cmd), offset)
            .await;
        if !ec.is_success() {
            return ec;
        }

        let (previous_replicas, target_replicas) = require_move_sides(
            previous_replicas,
            target_replicas,
            CommandKind::RevertCancelPartitionMove,
            &ntp,
            offset,
        );
        let to_delete = subtract_replica_sets(&previous_replicas, &target_replicas);
        self.allocator
            .remove_allocations(&to_delete, AllocationDomain::for_ntp(&ntp));
        self.balancer.handle_ntp_update(
            &ntp.ns,
            &ntp.topic,
            ntp.partition,
            &previous_replicas,
            &target_replicas,
        );
        ApplyResult::Success
    }

    async fn apply_move_topic(&mut self, cmd: MoveTopicReplicasCmd, offset: Offset) -> ApplyResult {
        let tp_ns = cmd.topic.clone();
        let moves = cmd.moves.clone();
        let assignments = self
            .read_local(CommandKind::MoveTopicReplicas, offset, {
                let tp_ns = tp_ns.clone();
                move |table: &mut T| table.topic_assignments(&tp_ns)
            })
            .await;

        let ec = self
            .dispatch_updates_to_cores(Command::MoveTopicReplicas(cmd), offset)
            .await;
        if !ec.is_success() {
            return ec;
        }

        let Some(assignments) = assignments else {
            return ApplyResult::TopicNotExists;
        };
        // Resolve every partition first so a miss leaves no partial deltas.
        let mut resolved = Vec::with_capacity(moves.len());
        for mv in &moves {
            let Some(p_as) = assignments.get(&mv.partition) else {
                return ApplyResult::PartitionNotExists;
            };
            resolved.push((p_as, &mv.replicas));
        }

        let domain = AllocationDomain::for_topic(&tp_ns);
        for (idx, (p_as, replicas)) in resolved.into_iter().enumerate() {
            let to_add = subtract_replica_sets(replicas, &p_as.replicas);
            self.allocator.add_allocations(&to_add, domain);
            self.balancer.handle_ntp_update(
                &tp_ns.ns,
                &tp_ns.topic,
                p_as.id,
                &p_as.replicas,
                replicas,
            );
            self.maybe_yield(idx).await;
        }
        ApplyResult::Success
    }

    async fn apply_create_non_replicable(
        &mut self,
        cmd: CreateNonReplicableTopicCmd,
        offset: Offset,
    ) -> ApplyResult {
        let source = cmd.source.clone();
        let domain = AllocationDomain::for_topic(&cmd.name);
        let assignments = self
            .read_local(CommandKind::CreateNonReplicableTopic, offset, {
                let source = source.clone();
                move |table: &mut T| table.topic_assignments(&source)
            })
            .await;

        let ec = self
            .dispatch_updates_to_cores(Command::CreateNonReplicableTopic(cmd), offset)
            .await;
        if !ec.is_success() {
            return ec;
        }

        let assignments = require(assignments, || ConsistencyViolation::MissingAssignment {
            command: CommandKind::CreateNonReplicableTopic,
            subject: source.to_string(),
            offset,
        });
        let p_as: Vec<PartitionAssignment> = assignments.into_values().collect();
        self.update_allocations(&p_as, domain).await;
        ApplyResult::Success
    }

    /// Apply `cmd` on every shard and return the common result.
    async fn dispatch_updates_to_cores(&self, cmd: Command, offset: Offset) -> ApplyResult {
        let kind = cmd.kind();
        let results = match self
            .topic_table
            .invoke_on_all(move |table: &mut T| table.apply(cmd.clone(), offset))
            .await
        {
            Ok(results) => results,
            Err(err) => halt(ConsistencyViolation::ShardUnavailable {
                command: kind,
                offset,
                reason: format!("{err:#}"),
            }),
        };

        let Some(first) = results.first().copied() else {
            halt(ConsistencyViolation::ShardUnavailable {
                command: kind,
                offset,
                reason: "no catalog shards".to_string(),
            });
        };
        if results.iter().any(|ec| *ec != first) {
            halt(ConsistencyViolation::ShardDivergence {
                command: kind,
                offset,
                results,
            });
        }
        first
    }

    /// Read pre-state from shard 0's table.
    async fn read_local<R, F>(&self, command: CommandKind, offset: Offset, f: F) -> R
    where
        F: FnOnce(&mut T) -> R + Send + 'static,
        R: Send + 'static,
    {
        match self.topic_table.invoke_on(0, f).await {
            Ok(value) => value,
            Err(err) => halt(ConsistencyViolation::ShardUnavailable {
                command,
                offset,
                reason: format!("{err:#}"),
            }),
        }
    }

    async fn read_move_sides(
        &self,
        ntp: &Ntp,
        command: CommandKind,
        offset: Offset,
    ) -> (Option<ReplicaSet>, Option<ReplicaSet>) {
        let ntp = ntp.clone();
        self.read_local(command, offset, move |table: &mut T| {
            (
                table.previous_replica_set(&ntp),
                table.target_replica_set(&ntp),
            )
        })
        .await
    }

    /// Release every slot of a deleted topic, including the side of an
    /// in-flight move that a finish command will now never release.
    async fn deallocate_topic(
        &self,
        tp_ns: &TopicNamespace,
        topic_assignments: &AssignmentsSet,
        in_progress: &BTreeMap<PartitionId, ReplicaSet>,
        domain: AllocationDomain,
    ) {
        for (idx, p_as) in topic_assignments.values().enumerate() {
            let to_delete = match in_progress.get(&p_as.id) {
                Some(abandoned) => union_replica_sets(abandoned, &p_as.replicas),
                None => p_as.replicas.clone(),
            };
            self.allocator.remove_allocations(&to_delete, domain);
            tracing::trace!(
                ntp = %tp_ns.ntp(p_as.id),
                current = %p_as.replicas,
                %to_delete,
                "deallocated partition"
            );
            self.maybe_yield(idx).await;
        }
    }

    async fn update_allocations(
        &self,
        assignments: &[PartitionAssignment],
        domain: AllocationDomain,
    ) {
        for (idx, p_as) in assignments.iter().enumerate() {
            self.allocator
                .update_allocation_state(&p_as.replicas, p_as.group, domain);
            self.maybe_yield(idx).await;
        }
    }

    /// Publish the first replica of each new partition as its provisional
    /// leader on every shard. Failures only delay routing, so they are logged.
    async fn update_leaders_with_estimates(&self, leaders: Vec<(Ntp, NodeId)>) {
        let updates = leaders.iter().map(|(ntp, leader)| async move {
            tracing::debug!(%ntp, leader, "publishing estimated leader");
            if let Err(err) = self
                .leaders
                .update_partition_leader(ntp, ESTIMATED_LEADER_TERM, *leader)
                .await
            {
                tracing::warn!(%ntp, leader, error = ?err, "estimated leader update failed");
            }
        });
        join_all(updates).await;
    }

    async fn maybe_yield(&self, processed: usize) {
        let every = self.config.yield_every;
        if every > 0 && (processed + 1) % every == 0 {
            tokio::task::yield_now().await;
        }
    }
}

/// For each partition of `tp_ns` with an in-flight move, the replica set
/// whose allocation the eventual finish command would have released.
pub fn collect_in_progress(
    tp_ns: &TopicNamespace,
    assignments: &AssignmentsSet,
    updates_in_progress: &BTreeMap<Ntp, MovementRecord>,
) -> BTreeMap<PartitionId, ReplicaSet> {
    assignments
        .keys()
        .filter_map(|id| {
            updates_in_progress
                .get(&tp_ns.ntp(*id))
                .map(|record| (*id, record.abandoned_replicas().clone()))
        })
        .collect()
}

fn require_move_sides(
    previous: Option<ReplicaSet>,
    target: Option<ReplicaSet>,
    command: CommandKind,
    ntp: &Ntp,
    offset: Offset,
) -> (ReplicaSet, ReplicaSet) {
    let previous = require(previous, || ConsistencyViolation::MissingMovementState {
        command,
        ntp: ntp.clone(),
        offset,
        missing: "previous",
    });
    let target = require(target, || ConsistencyViolation::MissingMovementState {
        command,
        ntp: ntp.clone(),
        offset,
        missing: "target",
    });
    (previous, target)
}
