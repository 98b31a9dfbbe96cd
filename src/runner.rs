//! The frame loop: take the newest capture, perceive, composite, output.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::capture::{FrameSlot, Taken};
use crate::output::OutputSink;
use crate::perception::{Perception, PerceptionProvider};
use crate::pipeline::Pipeline;
use crate::ui::SelectorStrip;

/// How long the loop waits for a frame before re-checking the stop flag.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

const STATS_EVERY: u64 = 30;

#[derive(Default)]
pub struct LoopOptions {
    /// Upper bound on processed frames per second; 0 disables pacing.
    pub target_fps: u32,
    /// Stop after this many frames.
    pub max_frames: Option<u64>,
    /// Draw the filter selector on every output frame.
    pub selector: Option<SelectorStrip>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Frames composited and written.
    pub frames: u64,
    /// Captures replaced before the loop could take them.
    pub dropped: u64,
}

/// Process frames until the stop flag is raised, the capture stream ends or
/// `max_frames` is reached.
///
/// Perception failures degrade to an empty result for that frame; output
/// failures end the loop with an error.
pub fn run_pipeline<O>(
    slot: &FrameSlot,
    perception: &mut dyn PerceptionProvider,
    pipeline: &Pipeline,
    output: &mut O,
    stop: &AtomicBool,
    options: &LoopOptions,
) -> Result<LoopStats>
where
    O: OutputSink + ?Sized,
{
    let frame_duration = (options.target_fps > 0)
        .then(|| Duration::from_secs_f32(1.0 / options.target_fps as f32));
    let mut frame_count = 0u64;
    let mut total_wait_time = Duration::ZERO;
    let mut total_perceive_time = Duration::ZERO;
    let mut total_composite_time = Duration::ZERO;
    let mut total_output_time = Duration::ZERO;

    tracing::info!("Starting main pipeline loop");

    loop {
        if stop.load(Ordering::Acquire) {
            tracing::info!("Stop requested");
            break;
        }
        if options.max_frames.is_some_and(|max| frame_count >= max) {
            tracing::info!("Reached frame limit");
            break;
        }

        let loop_start = Instant::now();

        // Newest captured frame
        let frame = match slot.take(POLL_INTERVAL) {
            Taken::Frame(frame) => frame,
            Taken::TimedOut => continue,
            Taken::Closed => {
                tracing::info!("Capture stream ended");
                break;
            }
        };
        total_wait_time += loop_start.elapsed();

        // Perception (blocking)
        let perceive_start = Instant::now();
        let perceived = perception.perceive(&frame).unwrap_or_else(|e| {
            tracing::debug!("Perception failed, compositing without landmarks: {:#}", e);
            Perception::default()
        });
        total_perceive_time += perceive_start.elapsed();

        // Compositing
        let composite_start = Instant::now();
        let selection = pipeline.selection().snapshot();
        let mut finished = pipeline.process_with(frame, &perceived, &selection);
        if let Some(selector) = &options.selector {
            selector.draw(&mut finished, selection.filter.as_deref());
        }
        total_composite_time += composite_start.elapsed();

        // Output frame
        let output_start = Instant::now();
        output
            .write_frame(&finished)
            .context("Failed to write frame")?;
        total_output_time += output_start.elapsed();

        frame_count += 1;

        // Log stats every 30 frames
        if frame_count % STATS_EVERY == 0 {
            let per_frame = |total: Duration| total.as_secs_f64() * 1000.0 / frame_count as f64;
            let avg_wait_ms = per_frame(total_wait_time);
            let avg_perceive_ms = per_frame(total_perceive_time);
            let avg_composite_ms = per_frame(total_composite_time);
            let avg_output_ms = per_frame(total_output_time);
            let total_ms = avg_wait_ms + avg_perceive_ms + avg_composite_ms + avg_output_ms;

            tracing::info!(
                "Frame {}: wait={:.1}ms, perceive={:.1}ms, composite={:.1}ms, output={:.1}ms, total={:.1}ms, fps={:.1}, dropped={}",
                frame_count,
                avg_wait_ms,
                avg_perceive_ms,
                avg_composite_ms,
                avg_output_ms,
                total_ms,
                1000.0 / total_ms.max(f64::EPSILON),
                slot.dropped()
            );
        }

        // Frame rate limiting
        if let Some(frame_duration) = frame_duration {
            let elapsed = loop_start.elapsed();
            if elapsed < frame_duration {
                std::thread::sleep(frame_duration - elapsed);
            }
        }
    }

    Ok(LoopStats {
        frames: frame_count,
        dropped: slot.dropped(),
    })
}
