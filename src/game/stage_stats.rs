use chrono::Local;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::game::gameplay::{Run, RunOutcome, RunPhase};
use crate::game::scores::ScoreSnapshot;

/// What the results screen and the score store keep for a finished run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub elapsed_s: f32,
    pub finished_at: String,
    pub snapshot: ScoreSnapshot,
}

impl RunSummary {
    /// `None` until the run has reached a terminal phase.
    pub fn from_run(run: &Run) -> Option<Self> {
        let outcome = match run.phase() {
            RunPhase::Completed => RunOutcome::Completed,
            RunPhase::Failed => RunOutcome::Failed,
            RunPhase::Idle | RunPhase::Running => return None,
        };
        Some(Self {
            outcome,
            elapsed_s: run.elapsed(),
            finished_at: Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
            snapshot: run.snapshot()?.clone(),
        })
    }

    fn file_name(&self) -> String {
        let stamp: String = self
            .finished_at
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
        format!("{stamp}-{}.json", self.snapshot.rank)
    }
}

/// Writes the summary as pretty JSON under `dir` and returns the file path.
pub fn save_summary<P: AsRef<Path>>(
    dir: P,
    summary: &RunSummary,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    let path = dir.join(summary.file_name());
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(&path, json)?;
    info!("Saved run summary to '{}'.", path.display());
    Ok(path)
}

pub fn load_summary<P: AsRef<Path>>(path: P) -> Result<RunSummary, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}
