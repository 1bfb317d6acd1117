//! Runs many episodes concurrently.

use crate::config::constants::defaults;
use crate::core::driver::EpisodeEngine;
use crate::core::episode::EpisodeRecord;
use crate::core::scenario::TestEntry;
use crate::tools::ToolExecutor;
use futures::stream::{self, StreamExt};
use tracing::info;

/// Builds a fresh tool environment for one episode
pub type ToolFactory<'a> = dyn Fn(&TestEntry) -> Box<dyn ToolExecutor> + Sync + 'a;

/// Episode runner with bounded concurrency. Episodes share nothing: each gets
/// its own inference context inside the engine and its own tool environment.
#[derive(Debug, Clone, Copy)]
pub struct EpisodeRunner {
    concurrency: usize,
}

impl Default for EpisodeRunner {
    fn default() -> Self {
        Self::new(defaults::DEFAULT_CONCURRENCY)
    }
}

impl EpisodeRunner {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run all entries; records come back in dataset order
    pub async fn run(
        &self,
        engine: &dyn EpisodeEngine,
        entries: &[TestEntry],
        tools: &ToolFactory<'_>,
    ) -> Vec<EpisodeRecord> {
        self.run_with_progress(engine, entries, tools, |_| {}).await
    }

    /// Like [`run`](Self::run), calling `on_record` as each episode finishes
    pub async fn run_with_progress<F>(
        &self,
        engine: &dyn EpisodeEngine,
        entries: &[TestEntry],
        tools: &ToolFactory<'_>,
        mut on_record: F,
    ) -> Vec<EpisodeRecord>
    where
        F: FnMut(&EpisodeRecord),
    {
        info!(
            episodes = entries.len(),
            concurrency = self.concurrency,
            model = engine.model_id(),
            "starting run"
        );

        let mut finished = stream::iter(entries.iter().enumerate())
            .map(|(index, entry)| async move {
                let environment = tools(entry);
                let record = engine.run_episode(entry, environment.as_ref()).await;
                (index, record)
            })
            .buffer_unordered(self.concurrency);

        let mut slots: Vec<Option<EpisodeRecord>> = vec![None; entries.len()];
        while let Some((index, record)) = finished.next().await {
            on_record(&record);
            slots[index] = Some(record);
        }

        slots.into_iter().flatten().collect()
    }
}
