//! Play, pause, step and reset controls over a shared [`Playground`].

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::Action;
use crate::error::Result;
use crate::playground::Playground;
use crate::schedule::Scheduler;
use crate::trainer::Progress;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoopState {
    Paused,
    Running,
}

/// Drives one training step per scheduler frame.
///
/// Starts paused. `play` and `pause` are idempotent; `step` and `reset`
/// pause first.
pub struct TrainingLoop<S: Scheduler> {
    playground: Arc<Mutex<Playground>>,
    scheduler: S,
    state: LoopState,
}

impl<S: Scheduler> TrainingLoop<S> {
    pub fn new(playground: Playground, scheduler: S) -> Self {
        TrainingLoop {
            playground: Arc::new(Mutex::new(playground)),
            scheduler,
            state: LoopState::Paused,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    /// The shared playground, for reading state between frames.
    pub fn playground(&self) -> &Arc<Mutex<Playground>> {
        &self.playground
    }

    pub fn play(&mut self) {
        if self.state == LoopState::Running {
            return;
        }
        let playground = self.playground.clone();
        self.scheduler.start(Box::new(move || {
            if let Err(e) = playground.lock().train_step() {
                log::warn!("training step failed: {}", e);
            }
        }));
        self.state = LoopState::Running;
        log::info!("training started");
    }

    pub fn pause(&mut self) {
        if self.state == LoopState::Paused {
            return;
        }
        self.scheduler.stop();
        self.state = LoopState::Paused;
        log::info!("training paused at epoch {}", self.playground.lock().epoch());
    }

    /// Pauses, then runs exactly one step.
    pub fn step(&mut self) -> Result<Progress> {
        self.pause();
        self.playground.lock().train_step()
    }

    /// Pauses, then rebuilds the network with fresh weights.
    pub fn reset(&mut self) -> Result<()> {
        self.pause();
        self.playground.lock().reset()
    }

    /// Handles loop controls here and forwards every other action to the
    /// playground.
    pub fn dispatch(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Play => {
                self.play();
                Ok(())
            }
            Action::Pause => {
                self.pause();
                Ok(())
            }
            Action::Step => self.step().map(|_| ()),
            Action::Reset => self.reset(),
            Action::RegenerateData => {
                self.pause();
                self.playground.lock().regenerate_data()
            }
            action => self.playground.lock().dispatch(action),
        }
    }
}

impl<S: Scheduler> Drop for TrainingLoop<S> {
    fn drop(&mut self) {
        self.scheduler.stop();
    }
}
