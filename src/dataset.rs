//! Synthetic two-class datasets on the `[-5, 5]²` square.
//!
//! Each generator produces exactly the requested number of points, shuffled.
//! [`generate_full_dataset`] then partitions them into disjoint train and
//! test sets. Generated sets are shared behind `Arc<[DataPoint]>`; a new
//! draw always allocates new arrays.

use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::utils::percent_of;

/// Half width of the square that points are drawn from.
pub const EXTENT: f64 = 5.0;

/// Largest coordinate displacement at 100% noise.
const NOISE_SPREAD: f64 = 0.5 * EXTENT;

/// The canonical dataset shapes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    #[default]
    Circle,
    Xor,
    Gaussian,
    Spiral,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 4] = [
        DatasetKind::Circle,
        DatasetKind::Xor,
        DatasetKind::Gaussian,
        DatasetKind::Spiral,
    ];

    pub fn name(&self) -> &'static str {
        match *self {
            DatasetKind::Circle => "Circle",
            DatasetKind::Xor => "XOR",
            DatasetKind::Gaussian => "Gaussian",
            DatasetKind::Spiral => "Spiral",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A class label, `-1` or `+1`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Negative,
    Positive,
}

impl Label {
    /// The regression target used by the loss.
    pub fn value(&self) -> f64 {
        match *self {
            Label::Negative => -1.0,
            Label::Positive => 1.0,
        }
    }

    /// The class predicted by a network output; zero counts as positive.
    pub fn from_output(output: f64) -> Self {
        if output >= 0.0 {
            Label::Positive
        } else {
            Label::Negative
        }
    }
}

/// A labeled point.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub x: f64,
    pub y: f64,
    pub label: Label,
}

impl DataPoint {
    pub fn new(x: f64, y: f64, label: Label) -> Self {
        DataPoint { x, y, label }
    }
}

/// Disjoint train and test sets.
#[derive(Clone, Debug)]
pub struct Dataset {
    pub train: Arc<[DataPoint]>,
    pub test: Arc<[DataPoint]>,
}

impl Default for Dataset {
    fn default() -> Self {
        Dataset {
            train: Arc::from(Vec::new()),
            test: Arc::from(Vec::new()),
        }
    }
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.train.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Moves every point by up to `NOISE_SPREAD * noise / 100` on each axis.
/// Labels are left as drawn.
fn jitter<R: Rng>(rng: &mut R, points: &mut [DataPoint], noise: u32) {
    if noise == 0 {
        return;
    }
    let spread = NOISE_SPREAD * f64::from(noise) / 100.0;
    for p in points {
        p.x += rng.random_range(-1.0..=1.0) * spread;
        p.y += rng.random_range(-1.0..=1.0) * spread;
    }
}

fn random_coord<R: Rng>(rng: &mut R) -> f64 {
    rng.random_range(-EXTENT..EXTENT)
}

const CIRCLE_RADIUS: f64 = 3.0;

/// Noise-free circle points in generation order: inner half first.
fn circle_points<R: Rng>(rng: &mut R, n: usize) -> Vec<DataPoint> {
    let inner = n / 2;
    (0..n)
        .map(|i| {
            let r = if i < inner {
                rng.random::<f64>() * CIRCLE_RADIUS * 0.5
            } else {
                CIRCLE_RADIUS + rng.random::<f64>() * (EXTENT - CIRCLE_RADIUS)
            };
            let angle = rng.random::<f64>() * 2.0 * PI;
            let label = if r < CIRCLE_RADIUS {
                Label::Positive
            } else {
                Label::Negative
            };
            DataPoint::new(r * angle.cos(), r * angle.sin(), label)
        })
        .collect()
}

/// A filled disc labeled positive inside a ring labeled negative.
pub fn generate_circle(n: usize, noise: u32) -> Vec<DataPoint> {
    let mut rng = rand::rng();
    let mut points = circle_points(&mut rng, n);
    jitter(&mut rng, &mut points, noise);
    points.shuffle(&mut rng);
    points
}

/// Quadrants labeled by the sign of `x * y`.
pub fn generate_xor(n: usize, noise: u32) -> Vec<DataPoint> {
    let mut rng = rand::rng();
    let mut points: Vec<DataPoint> = (0..n)
        .map(|_| {
            let x = random_coord(&mut rng);
            let y = random_coord(&mut rng);
            let label = if x * y >= 0.0 {
                Label::Negative
            } else {
                Label::Positive
            };
            DataPoint::new(x, y, label)
        })
        .collect();
    jitter(&mut rng, &mut points, noise);
    points
}

/// Two blobs mirrored through the origin.
pub fn generate_gaussian(n: usize, noise: u32) -> Vec<DataPoint> {
    const CENTER: f64 = 2.0;
    let spread = 1.0 + 2.0 * f64::from(noise) / 100.0;
    let mut rng = rand::rng();
    let positives = n / 2;
    let mut points: Vec<DataPoint> = (0..n)
        .map(|i| {
            let (center, label) = if i < positives {
                (CENTER, Label::Positive)
            } else {
                (-CENTER, Label::Negative)
            };
            let dx: f64 = rng.sample(StandardNormal);
            let dy: f64 = rng.sample(StandardNormal);
            DataPoint::new(center + dx * spread, center + dy * spread, label)
        })
        .collect();
    points.shuffle(&mut rng);
    points
}

/// Two interleaved arms of one and a half turns each.
pub fn generate_spiral(n: usize, noise: u32) -> Vec<DataPoint> {
    const TURNS: f64 = 1.5;
    let mut rng = rand::rng();
    let half = (n / 2).max(1);
    let mut points: Vec<DataPoint> = (0..n)
        .map(|i| {
            let positive = i < n / 2;
            let idx = if positive { i } else { i - n / 2 };
            let t = idx as f64 / half as f64;
            let radius = t * EXTENT;
            let mut angle = t * TURNS * 2.0 * PI;
            let label = if positive {
                Label::Positive
            } else {
                angle += PI;
                Label::Negative
            };
            DataPoint::new(radius * angle.cos(), radius * angle.sin(), label)
        })
        .collect();
    jitter(&mut rng, &mut points, noise);
    points.shuffle(&mut rng);
    points
}

/// Draws `n` points of the given shape.
pub fn generate(kind: DatasetKind, n: usize, noise: u32) -> Vec<DataPoint> {
    match kind {
        DatasetKind::Circle => generate_circle(n, noise),
        DatasetKind::Xor => generate_xor(n, noise),
        DatasetKind::Gaussian => generate_gaussian(n, noise),
        DatasetKind::Spiral => generate_spiral(n, noise),
    }
}

/// Shuffles `points` and puts the first `train_ratio` percent into the
/// training set, the rest into the test set.
pub fn split_data(mut points: Vec<DataPoint>, train_ratio: u32) -> Dataset {
    points.shuffle(&mut rand::rng());
    let train_len = percent_of(points.len(), train_ratio);
    let test = points.split_off(train_len);
    Dataset {
        train: Arc::from(points),
        test: Arc::from(test),
    }
}

/// Generates `total` points and splits them by `train_ratio` percent.
pub fn generate_full_dataset(
    kind: DatasetKind,
    total: usize,
    noise: u32,
    train_ratio: u32,
) -> Dataset {
    let dataset = split_data(generate(kind, total, noise), train_ratio);
    log::debug!(
        "generated {} dataset: {} train / {} test points (noise {}%)",
        kind,
        dataset.train.len(),
        dataset.test.len(),
        noise
    );
    dataset
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn positives(points: &[DataPoint]) -> usize {
        points.iter().filter(|p| p.label == Label::Positive).count()
    }

    fn key(p: &DataPoint) -> (u64, u64) {
        (p.x.to_bits(), p.y.to_bits())
    }

    #[test]
    fn split_is_disjoint_and_complete() {
        for kind in DatasetKind::ALL {
            for ratio in (10..=90).step_by(10) {
                let data = generate_full_dataset(kind, 200, 10, ratio);
                assert_eq!(data.len(), 200);
                assert_eq!(data.train.len(), 2 * ratio as usize);
                let train: HashSet<_> = data.train.iter().map(key).collect();
                assert!(data.test.iter().all(|p| !train.contains(&key(p))));
            }
        }
    }

    #[test]
    fn balanced_shapes() {
        assert_eq!(positives(&generate_circle(200, 0)), 100);
        assert_eq!(positives(&generate_gaussian(200, 0)), 100);
        assert_eq!(positives(&generate_spiral(201, 0)), 100);
        let xor = positives(&generate_xor(2000, 0));
        assert!(xor > 850 && xor < 1150, "xor positives: {}", xor);
    }

    #[test]
    fn circle_labels_follow_radius() {
        for p in generate_circle(300, 0) {
            let r = (p.x * p.x + p.y * p.y).sqrt();
            match p.label {
                Label::Positive => assert!(r <= 1.5 + 1e-9),
                Label::Negative => assert!(r >= 3.0 - 1e-9 && r <= 5.0 + 1e-9),
            }
        }
    }

    #[test]
    fn xor_labels_without_noise() {
        for p in generate_xor(300, 0) {
            assert_eq!(p.label == Label::Positive, p.x * p.y < 0.0);
        }
    }

    #[test]
    fn full_noise_keeps_classes_balanced() {
        assert_eq!(positives(&generate_circle(200, 50)), 100);
        assert_eq!(positives(&generate_gaussian(200, 50)), 100);
        assert_eq!(positives(&generate_spiral(200, 50)), 100);
    }

    #[test]
    fn noisy_circle_labels_follow_clean_radius() {
        let mut rng = rand::rng();
        let clean = circle_points(&mut rng, 200);
        let mut noisy = clean.clone();
        jitter(&mut rng, &mut noisy, 50);
        let max_shift = 0.5 * NOISE_SPREAD;
        let mut moved = 0;
        for (c, p) in clean.iter().zip(&noisy) {
            assert_eq!(c.label, p.label);
            let r = (c.x * c.x + c.y * c.y).sqrt();
            match p.label {
                Label::Positive => assert!(r <= 0.5 * CIRCLE_RADIUS + 1e-9),
                Label::Negative => assert!(r >= CIRCLE_RADIUS - 1e-9),
            }
            assert!((p.x - c.x).abs() <= max_shift + 1e-9);
            assert!((p.y - c.y).abs() <= max_shift + 1e-9);
            if key(c) != key(p) {
                moved += 1;
            }
        }
        assert!(moved > 190, "only {} points moved", moved);
    }

    #[test]
    fn noise_stays_bounded() {
        for p in generate_circle(300, 50) {
            let r = (p.x * p.x + p.y * p.y).sqrt();
            assert!(r <= EXTENT + 0.5 * NOISE_SPREAD * 2f64.sqrt() + 1e-9);
        }
    }

    #[test]
    fn regenerating_draws_new_points() {
        let a = generate_full_dataset(DatasetKind::Spiral, 100, 20, 50);
        let b = generate_full_dataset(DatasetKind::Spiral, 100, 20, 50);
        assert!(!Arc::ptr_eq(&a.train, &b.train));
        assert_ne!(a.train.to_vec(), b.train.to_vec());
    }

    #[test]
    fn degenerate_sizes() {
        assert!(generate_full_dataset(DatasetKind::Circle, 0, 0, 50).is_empty());
        assert_eq!(generate_spiral(1, 0).len(), 1);
        let data = generate_full_dataset(DatasetKind::Gaussian, 3, 0, 50);
        assert_eq!((data.train.len(), data.test.len()), (1, 2));
    }
}
