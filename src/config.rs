//! Playground settings and the actions that change them.
//!
//! [`PlaygroundConfig::reduce`] is a pure transition: it never mutates the
//! current config and returns it unchanged when an action would leave the
//! structural bounds.

use serde::{Deserialize, Serialize};

use crate::activator::Activator;
use crate::dataset::DatasetKind;
use crate::error::{Error, Result};
use crate::features::{Feature, FeatureFlags};
use crate::regularization::{Regularization, RegularizationConfig};
use crate::trainer::{LearningMode, TrainerConfig};

pub const MIN_HIDDEN_LAYERS: usize = 1;
pub const MAX_HIDDEN_LAYERS: usize = 6;
pub const MIN_NEURONS: usize = 1;
pub const MAX_NEURONS: usize = 8;
/// Width of a layer added by [`Action::AddLayer`].
pub const NEW_LAYER_NEURONS: usize = 2;
pub const MAX_NOISE: u32 = 50;
pub const MIN_TRAIN_RATIO: u32 = 10;
pub const MAX_TRAIN_RATIO: u32 = 90;

/// Learning rates offered by the UI.
pub const LEARNING_RATES: [f64; 11] = [
    0.00001, 0.0001, 0.001, 0.003, 0.01, 0.03, 0.1, 0.3, 1.0, 3.0, 10.0,
];

/// Regularization rates offered by the UI.
pub const REGULARIZATION_RATES: [f64; 10] = [0.0, 0.001, 0.003, 0.01, 0.03, 0.1, 0.3, 1.0, 3.0, 10.0];

/// Batch sizes offered by the UI.
pub const BATCH_SIZES: [usize; 4] = [1, 10, 20, 30];

/// Identifies a hidden neuron; `layer` counts hidden layers from zero.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    pub layer: usize,
    pub neuron: usize,
}

impl NodeId {
    pub fn new(layer: usize, neuron: usize) -> Self {
        NodeId { layer, neuron }
    }
}

/// Every user-facing setting of the playground.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaygroundConfig {
    pub hidden_layers: Vec<usize>,
    pub activation: Activator,
    pub learning_rate: f64,
    pub regularization: Regularization,
    pub regularization_rate: f64,
    pub batch_size: usize,
    pub learning_mode: LearningMode,
    pub dataset: DatasetKind,
    /// Percent, `0..=50`.
    pub noise: u32,
    /// Percent of points used for training, `10..=90`.
    pub train_ratio: u32,
    pub total_points: usize,
    pub features: FeatureFlags,
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        PlaygroundConfig {
            hidden_layers: vec![4, 2],
            activation: Activator::TanH,
            learning_rate: 0.03,
            regularization: Regularization::None,
            regularization_rate: 0.0,
            batch_size: 10,
            learning_mode: LearningMode::Stochastic,
            dataset: DatasetKind::Circle,
            noise: 0,
            train_ratio: 50,
            total_points: 200,
            features: FeatureFlags::default(),
        }
    }
}

/// A discrete change requested by the user.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    SetHiddenLayers(Vec<usize>),
    SetActivation(Activator),
    SetLearningRate(f64),
    SetRegularization(Regularization),
    SetRegularizationRate(f64),
    SetBatchSize(usize),
    SetLearningMode(LearningMode),
    SetDataset(DatasetKind),
    SetNoise(u32),
    SetTrainRatio(u32),
    ToggleFeature(Feature),
    AddLayer,
    RemoveLayer,
    /// Adds a neuron to the given hidden layer.
    AddNeuron(usize),
    /// Removes a neuron from the given hidden layer.
    RemoveNeuron(usize),
    SetHoveredNode(Option<NodeId>),
    Play,
    Pause,
    Step,
    Reset,
    RegenerateData,
}

fn layers_in_bounds(layers: &[usize]) -> bool {
    (MIN_HIDDEN_LAYERS..=MAX_HIDDEN_LAYERS).contains(&layers.len())
        && layers
            .iter()
            .all(|n| (MIN_NEURONS..=MAX_NEURONS).contains(n))
}

impl PlaygroundConfig {
    /// Checks every bound; used on configs that did not come from
    /// [`reduce`](Self::reduce).
    pub fn validate(&self) -> Result<()> {
        if !layers_in_bounds(&self.hidden_layers) {
            return Err(Error::InvalidConfig(format!(
                "hidden layers {:?} must have {}..={} layers of {}..={} neurons",
                self.hidden_layers, MIN_HIDDEN_LAYERS, MAX_HIDDEN_LAYERS, MIN_NEURONS, MAX_NEURONS
            )));
        }
        if self.features.count() == 0 {
            return Err(Error::InvalidConfig(
                "at least one feature must be enabled".into(),
            ));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch size must be positive".into()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning rate {} must be positive",
                self.learning_rate
            )));
        }
        if !(self.regularization_rate.is_finite() && self.regularization_rate >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "regularization rate {} must not be negative",
                self.regularization_rate
            )));
        }
        if self.noise > MAX_NOISE {
            return Err(Error::InvalidConfig(format!(
                "noise {}% is above {}%",
                self.noise, MAX_NOISE
            )));
        }
        if !(MIN_TRAIN_RATIO..=MAX_TRAIN_RATIO).contains(&self.train_ratio) {
            return Err(Error::InvalidConfig(format!(
                "train ratio {}% is outside {}..={}%",
                self.train_ratio, MIN_TRAIN_RATIO, MAX_TRAIN_RATIO
            )));
        }
        Ok(())
    }

    pub fn regularization_config(&self) -> RegularizationConfig {
        RegularizationConfig::new(self.regularization, self.regularization_rate)
    }

    pub fn trainer_config(&self) -> TrainerConfig {
        TrainerConfig {
            learning_rate: self.learning_rate,
            regularization: self.regularization_config(),
            batch_size: self.batch_size,
            learning_mode: self.learning_mode,
        }
    }

    /// Whether `node` names a neuron of the configured hidden layers.
    pub fn contains_node(&self, node: NodeId) -> bool {
        self.hidden_layers
            .get(node.layer)
            .map_or(false, |&n| node.neuron < n)
    }

    /// Returns the config that results from `action`.
    ///
    /// Actions that do not change settings, and actions that would break a
    /// bound, return a copy of `self`.
    pub fn reduce(&self, action: &Action) -> PlaygroundConfig {
        let mut next = self.clone();
        let accepted = match *action {
            Action::SetHiddenLayers(ref layers) => {
                next.hidden_layers = layers.clone();
                layers_in_bounds(layers)
            }
            Action::SetActivation(activation) => {
                next.activation = activation;
                true
            }
            Action::SetLearningRate(rate) => {
                next.learning_rate = rate;
                rate.is_finite() && rate > 0.0
            }
            Action::SetRegularization(kind) => {
                next.regularization = kind;
                true
            }
            Action::SetRegularizationRate(rate) => {
                next.regularization_rate = rate;
                rate.is_finite() && rate >= 0.0
            }
            Action::SetBatchSize(size) => {
                next.batch_size = size;
                size >= 1
            }
            Action::SetLearningMode(mode) => {
                next.learning_mode = mode;
                true
            }
            Action::SetDataset(kind) => {
                next.dataset = kind;
                true
            }
            Action::SetNoise(noise) => {
                next.noise = noise;
                noise <= MAX_NOISE
            }
            Action::SetTrainRatio(ratio) => {
                next.train_ratio = ratio;
                (MIN_TRAIN_RATIO..=MAX_TRAIN_RATIO).contains(&ratio)
            }
            Action::ToggleFeature(feature) => {
                next.features.toggle(feature);
                next.features.count() > 0
            }
            Action::AddLayer => {
                next.hidden_layers.push(NEW_LAYER_NEURONS);
                next.hidden_layers.len() <= MAX_HIDDEN_LAYERS
            }
            Action::RemoveLayer => {
                next.hidden_layers.pop();
                next.hidden_layers.len() >= MIN_HIDDEN_LAYERS
            }
            Action::AddNeuron(layer) => match next.hidden_layers.get_mut(layer) {
                Some(n) if *n < MAX_NEURONS => {
                    *n += 1;
                    true
                }
                _ => false,
            },
            Action::RemoveNeuron(layer) => match next.hidden_layers.get_mut(layer) {
                Some(n) if *n > MIN_NEURONS => {
                    *n -= 1;
                    true
                }
                _ => false,
            },
            Action::SetHoveredNode(_)
            | Action::Play
            | Action::Pause
            | Action::Step
            | Action::Reset
            | Action::RegenerateData => return self.clone(),
        };
        if accepted {
            next
        } else {
            log::debug!("rejected {:?}: out of bounds", action);
            self.clone()
        }
    }

    /// Whether new points must be drawn to go from `self` to `other`.
    pub fn data_changed(&self, other: &PlaygroundConfig) -> bool {
        self.dataset != other.dataset
            || self.noise != other.noise
            || self.train_ratio != other.train_ratio
            || self.total_points != other.total_points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = PlaygroundConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.features.count(), 2);
        assert_eq!(config.trainer_config(), TrainerConfig::default());
    }

    #[test]
    fn parse_partial_json() {
        let config: PlaygroundConfig = serde_json::from_str(
            r#"{
                "hidden_layers": [3],
                "activation": "relu",
                "regularization": "l2",
                "dataset": "spiral",
                "features": {"x1": false, "sinX1": true}
            }"#,
        )
        .unwrap();
        assert_eq!(config.hidden_layers, vec![3]);
        assert_eq!(config.activation, Activator::ReLU);
        assert_eq!(config.regularization, Regularization::L2);
        assert_eq!(config.dataset, DatasetKind::Spiral);
        assert_eq!(config.learning_rate, 0.03);
        assert_eq!(
            config.features.enabled().collect::<Vec<_>>(),
            vec![Feature::X2, Feature::SinX1]
        );
    }

    #[test]
    fn validate_rejects_out_of_bounds() {
        let bad = [
            PlaygroundConfig {
                hidden_layers: vec![],
                ..Default::default()
            },
            PlaygroundConfig {
                hidden_layers: vec![9],
                ..Default::default()
            },
            PlaygroundConfig {
                hidden_layers: vec![1; 7],
                ..Default::default()
            },
            PlaygroundConfig {
                features: FeatureFlags::none(),
                ..Default::default()
            },
            PlaygroundConfig {
                batch_size: 0,
                ..Default::default()
            },
            PlaygroundConfig {
                learning_rate: f64::NAN,
                ..Default::default()
            },
            PlaygroundConfig {
                noise: 51,
                ..Default::default()
            },
            PlaygroundConfig {
                train_ratio: 95,
                ..Default::default()
            },
        ];
        for config in &bad {
            assert!(config.validate().is_err(), "{:?}", config);
        }
    }

    #[test]
    fn layer_bounds() {
        let mut config = PlaygroundConfig::default();
        for _ in 0..10 {
            config = config.reduce(&Action::AddLayer);
        }
        assert_eq!(config.hidden_layers, vec![4, 2, 2, 2, 2, 2]);
        for _ in 0..10 {
            config = config.reduce(&Action::RemoveLayer);
        }
        assert_eq!(config.hidden_layers, vec![4]);
    }

    #[test]
    fn neuron_bounds() {
        let mut config = PlaygroundConfig::default();
        for _ in 0..10 {
            config = config.reduce(&Action::AddNeuron(1));
        }
        assert_eq!(config.hidden_layers, vec![4, 8]);
        for _ in 0..10 {
            config = config.reduce(&Action::RemoveNeuron(0));
        }
        assert_eq!(config.hidden_layers, vec![1, 8]);
        assert_eq!(config.reduce(&Action::AddNeuron(5)), config);
    }

    #[test]
    fn last_feature_stays_enabled() {
        let config = PlaygroundConfig::default()
            .reduce(&Action::ToggleFeature(Feature::X1))
            .reduce(&Action::ToggleFeature(Feature::X2));
        assert_eq!(config.features.enabled().collect::<Vec<_>>(), vec![Feature::X2]);
    }

    #[test]
    fn rejected_values_leave_config_unchanged() {
        let config = PlaygroundConfig::default();
        for action in &[
            Action::SetHiddenLayers(vec![0]),
            Action::SetLearningRate(-1.0),
            Action::SetRegularizationRate(f64::INFINITY),
            Action::SetBatchSize(0),
            Action::SetNoise(80),
            Action::SetTrainRatio(5),
            Action::Play,
            Action::SetHoveredNode(Some(NodeId::new(0, 0))),
        ] {
            assert_eq!(config.reduce(action), config);
        }
    }

    #[test]
    fn change_detection() {
        let config = PlaygroundConfig::default();
        let faster = config.reduce(&Action::SetLearningRate(0.3));
        assert!(!config.data_changed(&faster));
        let wider = config.reduce(&Action::AddNeuron(0));
        assert!(!config.data_changed(&wider));
        let noisy = config.reduce(&Action::SetNoise(20));
        assert!(config.data_changed(&noisy));
    }

    #[test]
    fn nodes() {
        let config = PlaygroundConfig::default();
        assert!(config.contains_node(NodeId::new(1, 1)));
        assert!(!config.contains_node(NodeId::new(1, 2)));
        assert!(!config.contains_node(NodeId::new(2, 0)));
    }

    #[test]
    fn presets_are_accepted() {
        let config = PlaygroundConfig::default();
        for &rate in LEARNING_RATES.iter() {
            assert_eq!(config.reduce(&Action::SetLearningRate(rate)).learning_rate, rate);
        }
        for &rate in REGULARIZATION_RATES.iter() {
            let next = config.reduce(&Action::SetRegularizationRate(rate));
            assert_eq!(next.regularization_rate, rate);
        }
        for &size in BATCH_SIZES.iter() {
            assert_eq!(config.reduce(&Action::SetBatchSize(size)).batch_size, size);
        }
    }
}
