//! Busy indicator shown while a blocking action runs.
//!
//! [`with_busy_title`] animates a [`SharedTitle`] from a background task and
//! puts the original text back once the action finishes, fails or is
//! dropped. It only ever touches the title.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::trace;

use crate::TRACING_TARGET_NAVIGATOR;

/// Delay between two animation frames.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(150);

/// Spinner frames, one per tick.
pub const SPINNER_FRAMES: [&str; 5] = ["/ ", "| ", "\\ ", "- ", "/ "];

/// Dot frames, advanced once per full spinner cycle.
pub const DOT_FRAMES: [&str; 6] = ["     ", ".    ", "..   ", "...  ", ".... ", "....."];

/// A title that can be rewritten from another task.
#[derive(Debug, Clone, Default)]
pub struct SharedTitle {
    inner: Arc<Mutex<String>>,
}

impl SharedTitle {
    /// Creates a title with the given text.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(title.into())),
        }
    }

    /// Returns the current text.
    pub fn get(&self) -> String {
        self.lock().clone()
    }

    /// Replaces the text.
    pub fn set(&self, title: impl Into<String>) {
        *self.lock() = title.into();
    }

    fn lock(&self) -> MutexGuard<'_, String> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Returns the title shown on the given tick.
///
/// ```
/// use s3nav_core::busy::frame;
///
/// assert_eq!(frame("Creating bucket", 0), "Creating bucket     / ");
/// assert_eq!(frame("Creating bucket", 6), "Creating bucket.    | ");
/// ```
pub fn frame(label: &str, tick: usize) -> String {
    let spinner = SPINNER_FRAMES[tick % SPINNER_FRAMES.len()];
    let dots = DOT_FRAMES[(tick / SPINNER_FRAMES.len()) % DOT_FRAMES.len()];
    format!("{label}{dots}{spinner}")
}

/// Restores the title and stops the animation when dropped.
struct RestoreGuard {
    title: SharedTitle,
    original: String,
    active: Arc<AtomicBool>,
    done: Option<oneshot::Sender<()>>,
}

impl Drop for RestoreGuard {
    fn drop(&mut self) {
        if let Some(done) = self.done.take() {
            let _ = done.send(());
        }

        // Under the title lock so a frame cannot land after the restore.
        let mut title = self.title.lock();
        self.active.store(false, Ordering::SeqCst);
        *title = std::mem::take(&mut self.original);
    }
}

/// Runs `action` while animating `title` with `label`.
///
/// Must be called from within a tokio runtime.
pub async fn with_busy_title<F>(title: &SharedTitle, label: &str, action: F) -> F::Output
where
    F: Future,
{
    let (done_tx, mut done_rx) = oneshot::channel::<()>();
    let active = Arc::new(AtomicBool::new(true));

    let guard = RestoreGuard {
        title: title.clone(),
        original: title.get(),
        active: Arc::clone(&active),
        done: Some(done_tx),
    };

    let animated = title.clone();
    let label = label.to_string();
    tokio::spawn(async move {
        let mut tick = 0usize;
        loop {
            tokio::select! {
                _ = &mut done_rx => break,
                _ = tokio::time::sleep(FRAME_INTERVAL) => {
                    let mut text = animated.lock();
                    if !active.load(Ordering::SeqCst) {
                        break;
                    }
                    *text = frame(&label, tick);
                    tick += 1;
                }
            }
        }
        trace!(target: TRACING_TARGET_NAVIGATOR, ticks = tick, "Busy indicator stopped");
    });

    let output = action.await;
    drop(guard);
    output
}
