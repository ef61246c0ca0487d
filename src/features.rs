//! Engineered input features derived from a raw `(x, y)` coordinate.
//!
//! Every function here walks [`Feature::ALL`], so encoded vectors, feature
//! counts and axis labels always agree on the same canonical order no matter
//! how a [`FeatureFlags`] value was built.

use serde::{Deserialize, Serialize};

/// One engineered feature.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Feature {
    X1,
    X2,
    X1Squared,
    X2Squared,
    X1X2,
    SinX1,
    SinX2,
}

impl Feature {
    /// The canonical feature order.
    pub const ALL: [Feature; 7] = [
        Feature::X1,
        Feature::X2,
        Feature::X1Squared,
        Feature::X2Squared,
        Feature::X1X2,
        Feature::SinX1,
        Feature::SinX2,
    ];

    /// Evaluates the feature at `(x, y)`.
    pub fn compute(&self, x: f64, y: f64) -> f64 {
        match *self {
            Feature::X1 => x,
            Feature::X2 => y,
            Feature::X1Squared => x * x,
            Feature::X2Squared => y * y,
            Feature::X1X2 => x * y,
            Feature::SinX1 => x.sin(),
            Feature::SinX2 => y.sin(),
        }
    }

    pub fn label(&self) -> &'static str {
        self.info().label
    }

    pub fn info(&self) -> &'static FeatureInfo {
        // FEATURE_INFO is laid out in the same order as ALL
        &FEATURE_INFO[*self as usize]
    }
}

/// Display metadata for a feature toggle.
#[derive(Debug, PartialEq, Eq)]
pub struct FeatureInfo {
    pub feature: Feature,
    pub label: &'static str,
    pub tooltip: &'static str,
}

pub static FEATURE_INFO: [FeatureInfo; 7] = [
    FeatureInfo {
        feature: Feature::X1,
        label: "X₁",
        tooltip: "Raw X₁ input coordinate",
    },
    FeatureInfo {
        feature: Feature::X2,
        label: "X₂",
        tooltip: "Raw X₂ input coordinate",
    },
    FeatureInfo {
        feature: Feature::X1Squared,
        label: "X₁²",
        tooltip: "X₁ squared (polynomial)",
    },
    FeatureInfo {
        feature: Feature::X2Squared,
        label: "X₂²",
        tooltip: "X₂ squared (polynomial)",
    },
    FeatureInfo {
        feature: Feature::X1X2,
        label: "X₁X₂",
        tooltip: "X₁ times X₂ (interaction)",
    },
    FeatureInfo {
        feature: Feature::SinX1,
        label: "sin(X₁)",
        tooltip: "Sine of X₁ (trigonometric)",
    },
    FeatureInfo {
        feature: Feature::SinX2,
        label: "sin(X₂)",
        tooltip: "Sine of X₂ (trigonometric)",
    },
];

/// Which features are fed to the network.
///
/// Callers keep at least one flag enabled; the encoder itself copes with an
/// empty selection by producing an empty vector.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeatureFlags {
    pub x1: bool,
    pub x2: bool,
    pub x1_squared: bool,
    pub x2_squared: bool,
    pub x1x2: bool,
    pub sin_x1: bool,
    pub sin_x2: bool,
}

impl Default for FeatureFlags {
    /// Only the raw coordinates.
    fn default() -> Self {
        FeatureFlags::none()
            .with(Feature::X1, true)
            .with(Feature::X2, true)
    }
}

impl FeatureFlags {
    /// Every flag disabled.
    pub fn none() -> Self {
        FeatureFlags {
            x1: false,
            x2: false,
            x1_squared: false,
            x2_squared: false,
            x1x2: false,
            sin_x1: false,
            sin_x2: false,
        }
    }

    /// Enables exactly the given features.
    pub fn from_features<I>(features: I) -> Self
    where
        I: IntoIterator<Item = Feature>,
    {
        features
            .into_iter()
            .fold(FeatureFlags::none(), |flags, f| flags.with(f, true))
    }

    fn slot(&mut self, feature: Feature) -> &mut bool {
        match feature {
            Feature::X1 => &mut self.x1,
            Feature::X2 => &mut self.x2,
            Feature::X1Squared => &mut self.x1_squared,
            Feature::X2Squared => &mut self.x2_squared,
            Feature::X1X2 => &mut self.x1x2,
            Feature::SinX1 => &mut self.sin_x1,
            Feature::SinX2 => &mut self.sin_x2,
        }
    }

    pub fn is_enabled(&self, feature: Feature) -> bool {
        match feature {
            Feature::X1 => self.x1,
            Feature::X2 => self.x2,
            Feature::X1Squared => self.x1_squared,
            Feature::X2Squared => self.x2_squared,
            Feature::X1X2 => self.x1x2,
            Feature::SinX1 => self.sin_x1,
            Feature::SinX2 => self.sin_x2,
        }
    }

    pub fn set(&mut self, feature: Feature, enabled: bool) {
        *self.slot(feature) = enabled;
    }

    pub fn with(mut self, feature: Feature, enabled: bool) -> Self {
        self.set(feature, enabled);
        self
    }

    pub fn toggle(&mut self, feature: Feature) {
        let slot = self.slot(feature);
        *slot = !*slot;
    }

    /// Enabled features in canonical order.
    pub fn enabled(&self) -> impl Iterator<Item = Feature> + '_ {
        Feature::ALL.into_iter().filter(move |f| self.is_enabled(*f))
    }

    pub fn count(&self) -> usize {
        self.enabled().count()
    }
}

/// Encodes `(x, y)` as the enabled features, in canonical order.
pub fn compute_features(x: f64, y: f64, flags: &FeatureFlags) -> Vec<f64> {
    flags.enabled().map(|f| f.compute(x, y)).collect()
}

/// The width of the vectors returned by [`compute_features`].
pub fn count_enabled_features(flags: &FeatureFlags) -> usize {
    flags.count()
}

/// Axis labels for the enabled features, in canonical order.
pub fn enabled_feature_names(flags: &FeatureFlags) -> Vec<&'static str> {
    flags.enabled().map(|f| f.label()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_table_matches_order() {
        for (feature, info) in Feature::ALL.iter().zip(FEATURE_INFO.iter()) {
            assert_eq!(*feature, info.feature);
        }
    }

    #[test]
    fn values() {
        let all = FeatureFlags::from_features(Feature::ALL);
        let v = compute_features(2.0, -3.0, &all);
        assert_eq!(v.len(), 7);
        assert_eq!(&v[..5], &[2.0, -3.0, 4.0, 9.0, -6.0]);
        assert_eq!(v[5], 2.0f64.sin());
        assert_eq!(v[6], (-3.0f64).sin());
    }

    #[test]
    fn order_ignores_construction_order() {
        let a = FeatureFlags::from_features(vec![Feature::SinX2, Feature::X1, Feature::X1X2]);
        let mut b = FeatureFlags::none();
        b.toggle(Feature::X1X2);
        b.toggle(Feature::X1);
        b.toggle(Feature::SinX2);
        assert_eq!(a, b);
        let v = compute_features(0.5, 2.0, &a);
        assert_eq!(v, vec![0.5, 1.0, 2.0f64.sin()]);
        assert_eq!(enabled_feature_names(&b), vec!["X₁", "X₁X₂", "sin(X₂)"]);
    }

    #[test]
    fn every_subset_has_matching_length() {
        for mask in 1u32..(1 << 7) {
            let flags = FeatureFlags::from_features(
                Feature::ALL
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| mask & (1 << i) != 0)
                    .map(|(_, f)| *f),
            );
            let v = compute_features(1.5, -0.5, &flags);
            assert_eq!(v.len(), count_enabled_features(&flags));
            assert_eq!(v.len(), mask.count_ones() as usize);
            let expected: Vec<f64> = flags.enabled().map(|f| f.compute(1.5, -0.5)).collect();
            assert_eq!(v, expected);
        }
    }

    #[test]
    fn empty_selection() {
        let flags = FeatureFlags::none();
        assert!(compute_features(1.0, 1.0, &flags).is_empty());
        assert_eq!(count_enabled_features(&flags), 0);
        assert!(enabled_feature_names(&flags).is_empty());
    }

    #[test]
    fn defaults_and_serde() {
        let flags = FeatureFlags::default();
        assert_eq!(count_enabled_features(&flags), 2);
        let parsed: FeatureFlags = serde_json::from_str(r#"{"x1Squared": true}"#).unwrap();
        assert_eq!(
            parsed.enabled().collect::<Vec<_>>(),
            vec![Feature::X1, Feature::X2, Feature::X1Squared]
        );
    }
}
