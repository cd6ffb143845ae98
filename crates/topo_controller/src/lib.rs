//! Topic controller: the command applier that keeps the sharded topic catalog
//! and its placement accounting consistent with the committed controller log.

pub mod allocator;
pub mod balancer_state;
pub mod config;
pub mod dispatcher;
pub mod fatal;
pub mod leaders_table;
pub mod replay;
pub mod sharded;
pub mod topic_table;

pub use allocator::{PartitionAllocator, PlacementAccounting, SlotAllocation};
pub use balancer_state::{BalancerBookkeeping, PartitionBalancerState};
pub use config::ReplayArgs;
pub use dispatcher::{DispatcherConfig, TopicUpdatesDispatcher};
pub use fatal::ConsistencyViolation;
pub use leaders_table::{LeaderTermId, LeadershipTable, PartitionLeadersTable};
pub use replay::{LogReplayDriver, ReplayStats};
pub use sharded::{ShardId, Sharded};
pub use topic_table::{CatalogReplica, PartitionSummary, TopicMetadata, TopicTable};
