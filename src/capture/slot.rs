use super::CaptureSource;
use anyhow::Result;
use image::imageops;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::Frame;

/// Single-frame mailbox between the capture thread and the frame loop
///
/// Publishing overwrites any frame the loop has not taken yet, so the loop
/// always works on the newest capture and never catches up on stale ones.
#[derive(Default)]
pub struct FrameSlot {
    state: Mutex<SlotState>,
    ready: Condvar,
}

#[derive(Default)]
struct SlotState {
    frame: Option<Frame>,
    closed: bool,
    published: u64,
    dropped: u64,
}

/// Outcome of waiting on the slot
#[derive(Debug)]
pub enum Taken {
    Frame(Frame),
    /// Producer finished and the slot is drained
    Closed,
    TimedOut,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, frame: Frame) {
        let mut state = self.state.lock();
        if state.frame.replace(frame).is_some() {
            state.dropped += 1;
        }
        state.published += 1;
        self.ready.notify_one();
    }

    /// Mark the stream as finished; a pending frame can still be taken.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.ready.notify_all();
    }

    /// Wait up to `timeout` for the newest frame.
    pub fn take(&self, timeout: Duration) -> Taken {
        let mut state = self.state.lock();
        if state.frame.is_none() && !state.closed {
            self.ready.wait_for(&mut state, timeout);
        }
        match state.frame.take() {
            Some(frame) => Taken::Frame(frame),
            None if state.closed => Taken::Closed,
            None => Taken::TimedOut,
        }
    }

    /// Frames overwritten before the loop could take them.
    pub fn dropped(&self) -> u64 {
        self.state.lock().dropped
    }

    pub fn published(&self) -> u64 {
        self.state.lock().published
    }
}

/// Run a capture source on its own thread, publishing into `slot`
///
/// The source is built on the capture thread because camera handles are not
/// always `Send`. The thread exits on `stop`, on stream exhaustion or on a
/// capture error, closing the slot in every case.
pub fn spawn_capture<C, F>(
    open: F,
    slot: Arc<FrameSlot>,
    stop: Arc<AtomicBool>,
    mirror: bool,
) -> std::io::Result<JoinHandle<()>>
where
    C: CaptureSource,
    F: FnOnce() -> Result<C> + Send + 'static,
{
    std::thread::Builder::new()
        .name("camera-capture".to_string())
        .spawn(move || {
            match open() {
                Ok(mut source) => {
                    let (width, height) = source.resolution();
                    tracing::info!("Capture thread started ({}x{})", width, height);

                    while !stop.load(Ordering::Acquire) {
                        match source.capture_frame() {
                            Ok(Some(mut frame)) => {
                                if mirror {
                                    imageops::flip_horizontal_in_place(&mut frame);
                                }
                                slot.publish(frame);
                            }
                            Ok(None) => {
                                tracing::info!("Capture stream exhausted");
                                break;
                            }
                            Err(e) => {
                                tracing::warn!("Capture failed: {:#}", e);
                                break;
                            }
                        }
                    }
                }
                Err(e) => tracing::warn!("Failed to open capture source: {:#}", e),
            }
            slot.close();
            tracing::info!("Capture thread stopped");
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::StillImageSource;
    use image::Rgb;

    fn frame(value: u8) -> Frame {
        Frame::from_pixel(2, 2, Rgb([value, value, value]))
    }

    #[test]
    fn newest_frame_wins() {
        let slot = FrameSlot::new();
        slot.publish(frame(1));
        slot.publish(frame(2));
        slot.publish(frame(3));

        match slot.take(Duration::from_millis(10)) {
            Taken::Frame(f) => assert_eq!(f.get_pixel(0, 0)[0], 3),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(slot.dropped(), 2);
        assert_eq!(slot.published(), 3);
        assert!(matches!(slot.take(Duration::from_millis(1)), Taken::TimedOut));
    }

    #[test]
    fn close_drains_then_reports_closed() {
        let slot = FrameSlot::new();
        slot.publish(frame(7));
        slot.close();
        assert!(matches!(slot.take(Duration::from_millis(1)), Taken::Frame(_)));
        assert!(matches!(slot.take(Duration::from_millis(1)), Taken::Closed));
    }

    #[test]
    fn capture_thread_publishes_and_closes() {
        let slot = Arc::new(FrameSlot::new());
        let stop = Arc::new(AtomicBool::new(false));
        let frames = vec![frame(5)];

        let handle = spawn_capture(
            move || Ok(StillImageSource::from_frames(frames, 2, 2, 1000, false)),
            slot.clone(),
            stop,
            true,
        )
        .unwrap();
        handle.join().unwrap();

        assert!(matches!(slot.take(Duration::from_millis(1)), Taken::Frame(_)));
        assert!(matches!(slot.take(Duration::from_millis(1)), Taken::Closed));
    }
}
