//! The playground state machine.
//!
//! A [`Playground`] owns the config, the generated points and a [`Trainer`]
//! (which in turn owns the network). Every [`Action`] goes through
//! [`Playground::apply`], which runs the pure config reducer and pushes
//! shape-preserving changes (hyperparameters, same-width feature swaps)
//! straight into the trainer. Changes to the network shape or to the dataset
//! take effect in [`Playground::reconcile`], which rebuilds what is stale.
//! [`Playground::dispatch`] does both.
//!
//! While the enabled feature count differs from the network's input width,
//! training steps are skipped instead of feeding mis-sized vectors.

use crate::config::{Action, NodeId, PlaygroundConfig};
use crate::dataset::{generate_full_dataset, Dataset};
use crate::error::Result;
use crate::features::compute_features;
use crate::feed_forward::{Network, NetworkState};
use crate::trainer::{Accuracy, Loss, Progress, Trainer, TrainerConfigUpdate};

/// Loss history keeps epoch 0 and every multiple of this.
pub const LOSS_HISTORY_INTERVAL: usize = 10;

#[derive(Debug)]
pub struct Playground {
    config: PlaygroundConfig,
    /// The config the current dataset was drawn from.
    data_config: PlaygroundConfig,
    dataset: Dataset,
    trainer: Trainer,
    loss_history: Vec<Progress>,
    hovered: Option<NodeId>,
}

fn build_trainer(config: &PlaygroundConfig, dataset: &Dataset, network: Network) -> Result<Trainer> {
    Trainer::new(
        network,
        dataset.train.clone(),
        dataset.test.clone(),
        config.trainer_config(),
        config.features,
    )
}

fn build_network(config: &PlaygroundConfig) -> Result<Network> {
    Network::new(
        config.features.count(),
        &config.hidden_layers,
        config.activation,
    )
}

fn draw(config: &PlaygroundConfig) -> Dataset {
    generate_full_dataset(
        config.dataset,
        config.total_points,
        config.noise,
        config.train_ratio,
    )
}

impl Playground {
    /// Validates `config`, draws a dataset and builds an untrained network.
    pub fn new(config: PlaygroundConfig) -> Result<Self> {
        config.validate()?;
        let dataset = draw(&config);
        let trainer = build_trainer(&config, &dataset, build_network(&config)?)?;
        let mut playground = Playground {
            data_config: config.clone(),
            config,
            dataset,
            trainer,
            loss_history: Vec::new(),
            hovered: None,
        };
        playground.restart_history();
        Ok(playground)
    }

    pub fn config(&self) -> &PlaygroundConfig {
        &self.config
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn network(&self) -> &Network {
        self.trainer.network()
    }

    pub fn trainer(&self) -> &Trainer {
        &self.trainer
    }

    pub fn progress(&self) -> Progress {
        self.trainer.progress()
    }

    pub fn epoch(&self) -> usize {
        self.trainer.epoch()
    }

    /// Progress sampled at epoch 0 and every tenth epoch since the last
    /// reset.
    pub fn loss_history(&self) -> &[Progress] {
        &self.loss_history
    }

    pub fn hovered_node(&self) -> Option<NodeId> {
        self.hovered
    }

    pub fn network_state(&self) -> NetworkState {
        self.network().state()
    }

    pub fn get_loss(&self) -> Result<Loss> {
        self.trainer.get_loss()
    }

    pub fn accuracy(&self) -> Result<Accuracy> {
        self.trainer.accuracy()
    }

    /// Whether the enabled features no longer match the network's inputs.
    pub fn is_desynced(&self) -> bool {
        self.config.features.count() != self.network().input_len()
    }

    /// Applies `action` and rebuilds whatever it made stale.
    pub fn dispatch(&mut self, action: Action) -> Result<()> {
        self.apply(action)?;
        self.reconcile()
    }

    /// Applies `action` without rebuilding the network or the dataset.
    ///
    /// `Play` and `Pause` belong to the training loop and are ignored here.
    pub fn apply(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Play | Action::Pause => Ok(()),
            Action::Step => self.train_step().map(|_| ()),
            Action::Reset => self.reset(),
            Action::RegenerateData => self.regenerate_data(),
            Action::SetHoveredNode(node) => {
                self.hovered = node.filter(|&n| self.config.contains_node(n));
                Ok(())
            }
            action => {
                let next = self.config.reduce(&action);
                if next == self.config {
                    return Ok(());
                }
                self.config = next;
                self.push_trainer_settings();
                Ok(())
            }
        }
    }

    /// Forwards every shape-preserving setting to the trainer.
    fn push_trainer_settings(&mut self) {
        let target = self.config.trainer_config();
        if *self.trainer.config() != target {
            self.trainer.update_config(&TrainerConfigUpdate {
                learning_rate: Some(target.learning_rate),
                regularization: Some(target.regularization),
                batch_size: Some(target.batch_size),
                learning_mode: Some(target.learning_mode),
            });
        }
        if *self.trainer.features() != self.config.features {
            if let Err(e) = self.trainer.update_features(self.config.features) {
                log::debug!("features wait for a network rebuild: {}", e);
            }
        }
    }

    /// Rebuilds the dataset, network and trainer where they no longer match
    /// the config.
    pub fn reconcile(&mut self) -> Result<()> {
        let data_stale = self.data_config.data_changed(&self.config);
        let network_stale = self.network().hidden_layers() != self.config.hidden_layers
            || self.network().activator() != self.config.activation
            || self.is_desynced();
        if !data_stale && !network_stale {
            return Ok(());
        }
        if data_stale {
            self.dataset = draw(&self.config);
            self.data_config = self.config.clone();
        }
        if network_stale {
            log::debug!(
                "rebuilding network: {} inputs, hidden {:?}, {}",
                self.config.features.count(),
                self.config.hidden_layers,
                self.config.activation
            );
            let network = build_network(&self.config)?;
            match build_trainer(&self.config, &self.dataset, network) {
                Ok(trainer) => self.trainer = trainer,
                Err(e) => {
                    log::debug!("skipping trainer init: {}", e);
                    return Ok(());
                }
            }
            self.hovered = self.hovered.filter(|&n| self.config.contains_node(n));
        } else {
            self.trainer
                .update_data(self.dataset.train.clone(), self.dataset.test.clone())?;
        }
        self.restart_history();
        Ok(())
    }

    /// Runs one training step, recording sampled progress.
    ///
    /// Skipped while the features and the network disagree.
    pub fn train_step(&mut self) -> Result<Progress> {
        if self.is_desynced() {
            log::debug!(
                "skipping step: {} features for {} inputs",
                self.config.features.count(),
                self.network().input_len()
            );
            return Ok(self.progress());
        }
        let progress = self.trainer.step()?;
        // An empty training set leaves the epoch where it was.
        let recorded = self
            .loss_history
            .last()
            .is_some_and(|last| last.epoch == progress.epoch);
        if progress.epoch % LOSS_HISTORY_INTERVAL == 0 && !recorded {
            self.loss_history.push(progress);
        }
        Ok(progress)
    }

    /// Rebuilds the network with fresh weights from the current config and
    /// restarts at epoch 0.
    pub fn reset(&mut self) -> Result<()> {
        if self.data_config.data_changed(&self.config) {
            self.dataset = draw(&self.config);
            self.data_config = self.config.clone();
        }
        self.trainer = build_trainer(&self.config, &self.dataset, build_network(&self.config)?)?;
        self.hovered = self.hovered.filter(|&n| self.config.contains_node(n));
        self.restart_history();
        log::info!("reset at epoch 0, train loss {:.4}", self.progress().train_loss);
        Ok(())
    }

    /// Draws new points with the current dataset settings, then resets.
    pub fn regenerate_data(&mut self) -> Result<()> {
        self.dataset = draw(&self.config);
        self.data_config = self.config.clone();
        log::info!("regenerated {} dataset", self.config.dataset);
        self.reset()
    }

    fn restart_history(&mut self) {
        self.loss_history.clear();
        self.loss_history.push(self.trainer.progress());
    }

    /// The network's output at `(x, y)`. Side-effect free.
    pub fn compute_output(&self, x: f64, y: f64) -> Result<f64> {
        let input = compute_features(x, y, self.trainer.features());
        self.network().run(&input)
    }

    /// The output of one hidden neuron at `(x, y)`. Side-effect free.
    pub fn compute_intermediate_output(
        &self,
        x: f64,
        y: f64,
        layer: usize,
        neuron: usize,
    ) -> Result<f64> {
        let input = compute_features(x, y, self.trainer.features());
        self.network().forward_to_node(&input, layer, neuron)
    }

    /// The hovered neuron's output at `(x, y)`, if a neuron is hovered.
    pub fn hovered_output(&self, x: f64, y: f64) -> Result<Option<f64>> {
        self.hovered
            .map(|n| self.compute_intermediate_output(x, y, n.layer, n.neuron))
            .transpose()
    }
}
