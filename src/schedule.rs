//! Frame schedulers that drive the training loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;

/// Work run once per frame.
pub type Frame = Box<dyn FnMut() + Send + 'static>;

/// Calls a frame callback repeatedly until stopped.
pub trait Scheduler {
    /// Starts calling `frame` once per tick, replacing any running callback.
    fn start(&mut self, frame: Frame);

    /// Stops the callback. No new call begins once this returns.
    fn stop(&mut self);

    fn is_running(&self) -> bool;
}

/// Runs frames on a background thread at a fixed interval.
#[derive(Debug)]
pub struct ThreadScheduler {
    interval: Duration,
    running: Option<(Arc<AtomicBool>, JoinHandle<()>)>,
}

impl ThreadScheduler {
    pub fn new(interval: Duration) -> Self {
        ThreadScheduler {
            interval,
            running: None,
        }
    }
}

impl Scheduler for ThreadScheduler {
    fn start(&mut self, mut frame: Frame) {
        self.stop();
        let stop_flag = Arc::new(AtomicBool::new(false));
        let flag = stop_flag.clone();
        let interval = self.interval;
        let handle = thread::spawn(move || {
            while !flag.load(Ordering::Acquire) {
                frame();
                thread::sleep(interval);
            }
        });
        self.running = Some((stop_flag, handle));
    }

    fn stop(&mut self) {
        if let Some((stop_flag, handle)) = self.running.take() {
            stop_flag.store(true, Ordering::Release);
            if handle.join().is_err() {
                log::warn!("frame thread panicked");
            }
        }
    }

    fn is_running(&self) -> bool {
        self.running.is_some()
    }
}

impl Drop for ThreadScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// A scheduler whose frames run only when [`fire`](ManualScheduler::fire)
/// is called. Clones share the same callback slot.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    frame: Arc<Mutex<Option<Frame>>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        ManualScheduler::default()
    }

    /// Runs one frame. Returns false if stopped.
    pub fn fire(&self) -> bool {
        match self.frame.lock().as_mut() {
            Some(frame) => {
                frame();
                true
            }
            None => false,
        }
    }
}

impl Scheduler for ManualScheduler {
    fn start(&mut self, frame: Frame) {
        *self.frame.lock() = Some(frame);
    }

    fn stop(&mut self) {
        self.frame.lock().take();
    }

    fn is_running(&self) -> bool {
        self.frame.lock().is_some()
    }
}
