use super::{fit_frame, OutputSink};
use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::Frame;

/// Writes every finished frame as `frame_000001.png`, `frame_000002.png`, ...
pub struct PngSequenceOutput {
    dir: PathBuf,
    width: u32,
    height: u32,
    written: u64,
}

impl PngSequenceOutput {
    pub fn new<P: Into<PathBuf>>(dir: P, width: u32, height: u32) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
        tracing::info!("Writing frames to {} ({}x{})", dir.display(), width, height);

        Ok(Self {
            dir,
            width,
            height,
            written: 0,
        })
    }

    pub fn written(&self) -> u64 {
        self.written
    }
}

impl OutputSink for PngSequenceOutput {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        let frame = fit_frame(frame, self.width, self.height);
        self.written += 1;
        let path = self.dir.join(format!("frame_{:06}.png", self.written));
        frame
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
