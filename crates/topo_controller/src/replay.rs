//! Feeds committed controller log records to the command applier in offset
//! order and keeps per-result counters.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use topo_model::{ApplyResult, LogRecord, Offset};

use crate::dispatcher::TopicUpdatesDispatcher;
use crate::topic_table::{CatalogReplica, TopicTable};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplayStats {
    pub applied: u64,
    /// Records at or below the last applied offset.
    pub skipped: u64,
    pub rejected: BTreeMap<ApplyResult, u64>,
    pub last_applied: Option<Offset>,
}

pub struct LogReplayDriver<T = TopicTable> {
    dispatcher: TopicUpdatesDispatcher<T>,
    last_applied: Option<Offset>,
    stats: ReplayStats,
}

impl<T: CatalogReplica> LogReplayDriver<T> {
    pub fn new(dispatcher: TopicUpdatesDispatcher<T>) -> Self {
        Self {
            dispatcher,
            last_applied: None,
            stats: ReplayStats::default(),
        }
    }

    pub fn dispatcher(&self) -> &TopicUpdatesDispatcher<T> {
        &self.dispatcher
    }

    pub fn stats(&self) -> &ReplayStats {
        &self.stats
    }

    pub fn last_applied(&self) -> Option<Offset> {
        self.last_applied
    }

    /// Apply one record. Returns `None` when the offset was already applied,
    /// which happens when a log is replayed on top of a partial run.
    pub async fn apply_record(&mut self, record: LogRecord) -> Option<ApplyResult> {
        if self.last_applied.is_some_and(|last| record.offset <= last) {
            tracing::debug!(offset = record.offset, last_applied = ?self.last_applied, "skipping already applied record");
            self.stats.skipped += 1;
            return None;
        }

        let offset = record.offset;
        let ec = self.dispatcher.apply(record.command, offset).await;
        self.last_applied = Some(offset);
        self.stats.last_applied = Some(offset);
        self.stats.applied += 1;
        if !ec.is_success() {
            *self.stats.rejected.entry(ec).or_insert(0) += 1;
        }
        Some(ec)
    }

    /// Replay newline-delimited JSON records from `reader`. Blank lines are
    /// ignored; a malformed line stops the replay.
    pub async fn replay_reader<R>(&mut self, reader: R) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        let mut line_no = 0usize;
        while let Some(line) = lines.next_line().await.context("read controller log")? {
            line_no += 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let record: LogRecord = serde_json::from_str(line)
                .with_context(|| format!("parse controller log line {line_no}"))?;
            self.apply_record(record).await;
        }
        tracing::info!(
            applied = self.stats.applied,
            skipped = self.stats.skipped,
            rejected = self.stats.rejected.values().sum::<u64>(),
            "controller log replayed"
        );
        Ok(())
    }

    pub async fn replay_file(&mut self, path: &Path) -> anyhow::Result<()> {
        let file = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("open controller log {}", path.display()))?;
        self.replay_reader(BufReader::new(file)).await
    }
}
