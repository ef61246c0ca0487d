//! Utilities for training neural networks.
//!
//! A [`Trainer`] owns a [`Network`] together with the train and test points
//! and runs one mini-batch of gradient descent per [`Trainer::step`]. An
//! epoch here is one mini-batch, not a full pass over the training set.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::dataset::{DataPoint, Label};
use crate::error::{Error, Result};
use crate::features::{compute_features, FeatureFlags};
use crate::feed_forward::{Gradients, Network};
use crate::regularization::RegularizationConfig;

/// The learning mode to use for training
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningMode {
    /// Apply weight updates after every example of the mini-batch
    #[default]
    Stochastic,
    /// Apply one update per mini-batch, averaged over its examples
    Averaged,
}

/// Hyperparameters that can change between steps without touching the
/// network's shape.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    pub learning_rate: f64,
    pub regularization: RegularizationConfig,
    pub batch_size: usize,
    pub learning_mode: LearningMode,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            learning_rate: 0.03,
            regularization: RegularizationConfig::default(),
            batch_size: 10,
            learning_mode: LearningMode::default(),
        }
    }
}

/// A partial [`TrainerConfig`]; `None` fields are left unchanged.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TrainerConfigUpdate {
    pub learning_rate: Option<f64>,
    pub regularization: Option<RegularizationConfig>,
    pub batch_size: Option<usize>,
    pub learning_mode: Option<LearningMode>,
}

impl TrainerConfig {
    /// Applies every field set in `update`.
    pub fn merge(&mut self, update: &TrainerConfigUpdate) {
        if let Some(rate) = update.learning_rate {
            self.learning_rate = rate;
        }
        if let Some(regularization) = update.regularization {
            self.regularization = regularization;
        }
        if let Some(size) = update.batch_size {
            self.batch_size = size;
        }
        if let Some(mode) = update.learning_mode {
            self.learning_mode = mode;
        }
    }
}

/// Losses over the full train and test sets.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Loss {
    pub train_loss: f64,
    pub test_loss: f64,
}

/// A snapshot of training progress.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub epoch: usize,
    pub train_loss: f64,
    pub test_loss: f64,
}

impl Progress {
    fn new(epoch: usize, loss: Loss) -> Self {
        Progress {
            epoch,
            train_loss: loss.train_loss,
            test_loss: loss.test_loss,
        }
    }
}

/// Fraction of correctly classified points in each set.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Accuracy {
    pub train: f64,
    pub test: f64,
}

/// Half the mean squared error of `network` over `points`, or 0 for an
/// empty set.
pub fn compute_loss(
    network: &Network,
    points: &[DataPoint],
    features: &FeatureFlags,
) -> Result<f64> {
    if points.is_empty() {
        return Ok(0.0);
    }
    let mut total = 0.0;
    for point in points {
        let output = network.run(&compute_features(point.x, point.y, features))?;
        let error = output - point.label.value();
        total += error * error;
    }
    Ok(total / (2.0 * points.len() as f64))
}

/// [`compute_loss`] plus the regularization penalty over every weight.
pub fn compute_total_loss(
    network: &Network,
    points: &[DataPoint],
    features: &FeatureFlags,
    regularization: &RegularizationConfig,
) -> Result<f64> {
    Ok(compute_loss(network, points, features)? + network.penalty(regularization))
}

/// The fraction of `points` whose predicted class matches their label, or 0
/// for an empty set.
pub fn compute_accuracy(
    network: &Network,
    points: &[DataPoint],
    features: &FeatureFlags,
) -> Result<f64> {
    if points.is_empty() {
        return Ok(0.0);
    }
    let mut correct = 0;
    for point in points {
        let output = network.run(&compute_features(point.x, point.y, features))?;
        if Label::from_output(output) == point.label {
            correct += 1;
        }
    }
    Ok(correct as f64 / points.len() as f64)
}

/// Trains a network by mini-batch gradient descent.
#[derive(Debug)]
pub struct Trainer {
    network: Network,
    train: Arc<[DataPoint]>,
    test: Arc<[DataPoint]>,
    config: TrainerConfig,
    features: FeatureFlags,
    gradients: Gradients,
    epoch: usize,
    last: Progress,
}

impl Trainer {
    /// Creates a new trainer at epoch 0.
    ///
    /// Fails if the enabled feature count differs from the network's input
    /// width.
    pub fn new(
        network: Network,
        train: Arc<[DataPoint]>,
        test: Arc<[DataPoint]>,
        config: TrainerConfig,
        features: FeatureFlags,
    ) -> Result<Self> {
        check_features(&network, &features)?;
        let gradients = network.new_gradients();
        let mut trainer = Trainer {
            network,
            train,
            test,
            config,
            features,
            gradients,
            epoch: 0,
            last: Progress::default(),
        };
        trainer.last = Progress::new(0, trainer.get_loss()?);
        Ok(trainer)
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn features(&self) -> &FeatureFlags {
        &self.features
    }

    pub fn epoch(&self) -> usize {
        self.epoch
    }

    pub fn train_data(&self) -> &Arc<[DataPoint]> {
        &self.train
    }

    pub fn test_data(&self) -> &Arc<[DataPoint]> {
        &self.test
    }

    /// The progress reported by the most recent step.
    pub fn progress(&self) -> Progress {
        self.last
    }

    /// Runs one mini-batch update and reports the new losses.
    ///
    /// The batch holds `min(batch_size, |train|)` distinct points. With an
    /// empty training set nothing changes and the last progress is returned.
    pub fn step(&mut self) -> Result<Progress> {
        if self.train.is_empty() {
            log::trace!("no training points, skipping step");
            return Ok(self.last);
        }
        let batch_size = self.config.batch_size.clamp(1, self.train.len());
        let batch = rand::seq::index::sample(&mut rand::rng(), self.train.len(), batch_size);
        let rate = self.config.learning_rate;
        let regularization = self.config.regularization;
        for i in batch.iter() {
            let point = self.train[i];
            let input = compute_features(point.x, point.y, &self.features);
            self.network
                .accumulate(&input, point.label.value(), &mut self.gradients)?;
            if self.config.learning_mode == LearningMode::Stochastic {
                self.network
                    .apply_gradients(rate, &regularization, &mut self.gradients);
            }
        }
        if self.config.learning_mode == LearningMode::Averaged {
            self.network
                .apply_gradients(rate, &regularization, &mut self.gradients);
        }
        self.epoch += 1;
        self.last = Progress::new(self.epoch, self.get_loss()?);
        log::trace!(
            "epoch {}: train loss {:.4}, test loss {:.4}",
            self.last.epoch,
            self.last.train_loss,
            self.last.test_loss
        );
        Ok(self.last)
    }

    /// Computes the current losses without changing the network or epoch.
    pub fn get_loss(&self) -> Result<Loss> {
        Ok(Loss {
            train_loss: compute_loss(&self.network, &self.train, &self.features)?,
            test_loss: compute_loss(&self.network, &self.test, &self.features)?,
        })
    }

    /// Losses including the regularization penalty.
    pub fn get_total_loss(&self) -> Result<Loss> {
        let regularization = &self.config.regularization;
        Ok(Loss {
            train_loss: compute_total_loss(
                &self.network,
                &self.train,
                &self.features,
                regularization,
            )?,
            test_loss: compute_total_loss(
                &self.network,
                &self.test,
                &self.features,
                regularization,
            )?,
        })
    }

    pub fn accuracy(&self) -> Result<Accuracy> {
        Ok(Accuracy {
            train: compute_accuracy(&self.network, &self.train, &self.features)?,
            test: compute_accuracy(&self.network, &self.test, &self.features)?,
        })
    }

    /// Merges hyperparameter changes, effective from the next step.
    pub fn update_config(&mut self, update: &TrainerConfigUpdate) {
        self.config.merge(update);
        log::debug!("trainer config updated: {:?}", self.config);
    }

    /// Changes which features are fed to the network.
    ///
    /// Rejects flags whose enabled count differs from the network's input
    /// width and keeps the previous flags in that case.
    pub fn update_features(&mut self, features: FeatureFlags) -> Result<()> {
        check_features(&self.network, &features)?;
        self.features = features;
        Ok(())
    }

    /// Replaces the train and test sets and restarts at epoch 0.
    pub fn update_data(&mut self, train: Arc<[DataPoint]>, test: Arc<[DataPoint]>) -> Result<Progress> {
        self.train = train;
        self.test = test;
        self.epoch = 0;
        self.last = Progress::new(0, self.get_loss()?);
        Ok(self.last)
    }

    /// Redraws the network's weights and restarts at epoch 0.
    pub fn reset(&mut self) -> Result<Progress> {
        self.network.reset();
        self.gradients = self.network.new_gradients();
        self.epoch = 0;
        self.last = Progress::new(0, self.get_loss()?);
        Ok(self.last)
    }

    /// Runs enough steps to visit about as many points as the training set
    /// holds.
    pub fn train_epoch(&mut self) -> Result<Progress> {
        let batch_size = self.config.batch_size.max(1);
        let steps = self.train.len().div_ceil(batch_size);
        for _ in 0..steps {
            self.step()?;
        }
        Ok(self.last)
    }

    /// Steps until `stop` holds, reporting according to `logging`.
    ///
    /// A `LossThreshold` that is never reached trains forever.
    pub fn train(&mut self, stop: StopCondition, logging: Logging) -> Result<Progress> {
        let start_time = Instant::now();
        let mut iterations = 0;
        loop {
            let progress = self.step()?;
            iterations += 1;
            logging.iteration(&progress);
            if stop.should_stop(iterations, progress.train_loss, start_time) {
                break;
            }
        }
        logging.completion(iterations, &self.last, start_time);
        Ok(self.last)
    }
}

fn check_features(network: &Network, features: &FeatureFlags) -> Result<()> {
    let enabled = features.count();
    if enabled != network.input_len() {
        return Err(Error::InputSize {
            expected: network.input_len(),
            got: enabled,
        });
    }
    Ok(())
}

/// Logging frequency to use during headless training
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Logging {
    /// Nothing is logged
    Silent,
    /// A summary is logged at completion
    #[default]
    Completion,
    /// A progress line is logged every `n` epochs
    Iterations(usize),
}

impl Logging {
    fn iteration(&self, progress: &Progress) {
        if let Logging::Iterations(freq) = *self {
            if freq > 0 && progress.epoch % freq == 0 {
                log::info!(
                    "epoch {}:\ttrain loss={:.4}\ttest loss={:.4}",
                    progress.epoch,
                    progress.train_loss,
                    progress.test_loss
                );
            }
        }
    }

    fn completion(&self, iterations: usize, progress: &Progress, start_time: Instant) {
        if *self == Logging::Silent {
            return;
        }
        log::info!(
            "ran {} steps in {:.2} seconds, now at epoch {}",
            iterations,
            start_time.elapsed().as_secs_f64(),
            progress.epoch
        );
        log::info!(
            "final loss: train={:.4} test={:.4}",
            progress.train_loss,
            progress.test_loss
        );
    }
}

/// When to stop headless training
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum StopCondition {
    /// Stops after the provided number of steps
    Iterations(usize),
    /// Stops when the training loss drops below the provided threshold
    LossThreshold(f64),
    /// Stops after the provided duration
    Duration(Duration),
}

impl From<Duration> for StopCondition {
    fn from(duration: Duration) -> StopCondition {
        StopCondition::Duration(duration)
    }
}

impl StopCondition {
    /// Returns true if training is complete.
    fn should_stop(&self, iteration: usize, train_loss: f64, start_time: Instant) -> bool {
        match *self {
            StopCondition::Iterations(iterations) => iteration >= iterations,
            StopCondition::LossThreshold(threshold) => train_loss < threshold,
            StopCondition::Duration(duration) => start_time.elapsed() > duration,
        }
    }
}
