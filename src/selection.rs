//! Active filter and background, shared between the frame loop and the
//! control surface.
//!
//! Writers replace the whole selection under a short lock; the loop takes one
//! snapshot per frame. A change made while a frame is in flight shows up on
//! the next frame.

use std::sync::Arc;

use parking_lot::RwLock;

/// What the next frame should render.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    /// Active filter name, `None` for no filter.
    pub filter: Option<String>,
    /// Active background name, `None` for no replacement.
    pub background: Option<String>,
}

/// Cloneable handle to the process-wide selection.
#[derive(Clone, Debug, Default)]
pub struct SelectionState {
    inner: Arc<RwLock<Selection>>,
}

impl SelectionState {
    pub fn new(initial: Selection) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    /// Consistent copy of both fields.
    pub fn snapshot(&self) -> Selection {
        self.inner.read().clone()
    }

    pub fn set_filter(&self, filter: Option<String>) {
        self.inner.write().filter = filter;
    }

    pub fn set_background(&self, background: Option<String>) {
        self.inner.write().background = background;
    }

    /// Clear both fields, as on returning to the start screen.
    pub fn reset(&self) {
        *self.inner.write() = Selection::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn setters_are_visible_to_clones() {
        let state = SelectionState::default();
        let handle = state.clone();

        handle.set_filter(Some("cat".into()));
        handle.set_background(Some("mint-green".into()));

        let snapshot = state.snapshot();
        assert_eq!(snapshot.filter.as_deref(), Some("cat"));
        assert_eq!(snapshot.background.as_deref(), Some("mint-green"));

        state.reset();
        assert_eq!(handle.snapshot(), Selection::default());
    }

    #[test]
    fn concurrent_writers_last_write_wins() {
        let state = SelectionState::default();
        let writers: Vec<_> = (0..4)
            .map(|i| {
                let state = state.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        state.set_filter(Some(format!("f{i}")));
                        let _ = state.snapshot();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let last = state.snapshot().filter.unwrap();
        assert!(last.starts_with('f'));
        state.set_filter(None);
        assert_eq!(state.snapshot().filter, None);
    }
}
