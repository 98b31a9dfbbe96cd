use super::types::{Perception, PerceptionProvider};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::Frame;

/// Replays recorded perception results, one JSON object per line
///
/// Each line holds `faces` and `hands` (arrays of landmark arrays) and an
/// optional `mask` object with `width`, `height` and `values`. Playback
/// loops once the recording is exhausted.
pub struct ReplayPerception {
    records: Vec<Perception>,
    cursor: usize,
}

impl ReplayPerception {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!("Loading perception recording from {}", path.display());

        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let records = Self::parse(&text)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        tracing::info!("Loaded {} perception records", records.len());
        Ok(Self::from_records(records))
    }

    pub fn from_records(records: Vec<Perception>) -> Self {
        Self { records, cursor: 0 }
    }

    fn parse(text: &str) -> Result<Vec<Perception>> {
        text.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str(line).with_context(|| format!("line {}", n + 1))
            })
            .collect()
    }
}

impl PerceptionProvider for ReplayPerception {
    fn perceive(&mut self, _frame: &Frame) -> Result<Perception> {
        if self.records.is_empty() {
            return Ok(Perception::default());
        }
        let record = self.records[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.records.len();
        Ok(record)
    }
}
