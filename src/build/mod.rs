//! Build orchestration: the one-shot full build.

use anyhow::Result;

use crate::core::AssetCategory;
use crate::task::{TaskOutcome, TaskSet};

/// Aggregated result of one full build.
#[derive(Debug)]
pub struct BuildSummary {
    pub outcomes: Vec<TaskOutcome>,
}

impl BuildSummary {
    pub fn total_written(&self) -> usize {
        self.outcomes.iter().map(|o| o.written).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.outcomes.iter().map(|o| o.failed).sum()
    }
}

/// Run the full build: markup → style → scripts → images, strictly in
/// that order. Task n+1 starts only after task n's future resolves.
///
/// A contained transform error inside one task is a completed outcome;
/// the next task runs regardless. Only configuration and destination
/// I/O errors abort the build.
pub async fn run_full_build(tasks: &TaskSet) -> Result<BuildSummary> {
    let mut outcomes = Vec::with_capacity(AssetCategory::ORCHESTRATED.len());

    for category in AssetCategory::ORCHESTRATED {
        let outcome = tasks.task(category).run().await?;
        crate::log!(category.name(); "{}", outcome.summary());
        outcomes.push(outcome);
    }

    Ok(BuildSummary { outcomes })
}
