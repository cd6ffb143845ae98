//! Command-line and environment configuration for the replay binary.

use std::path::PathBuf;

use clap::Parser;

use crate::dispatcher::DispatcherConfig;

/// Replay a controller log into a fresh topic catalog.
#[derive(Parser, Debug, Clone)]
#[command(name = "topo-replay")]
pub struct ReplayArgs {
    /// Newline-delimited JSON log, one `{"offset":..,"command":..}` per line.
    pub log: PathBuf,

    /// Number of catalog shards. 0 uses the available parallelism.
    #[arg(long, env = "TOPO_SHARDS", default_value_t = 0)]
    pub shards: usize,

    /// Yield to the scheduler after this many per-partition updates (0 = never).
    #[arg(long, env = "TOPO_YIELD_EVERY", default_value_t = 64)]
    pub yield_every: usize,

    /// Include the final partition table in the summary.
    #[arg(long)]
    pub dump_state: bool,
}

impl ReplayArgs {
    pub fn resolved_shards(&self) -> usize {
        if self.shards > 0 {
            return self.shards;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }

    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            yield_every: self.yield_every,
        }
    }
}
