// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Analyzer configuration: class-id mapping and relation thresholds

use crate::error::{Error, Result};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default stairs/door/sidewalk proximity threshold in native pixels
pub const DEFAULT_THRESHOLD_DISTANCE: f64 = 50.0;

/// Default per-mask sample cap for the distance estimate
pub const DEFAULT_MAX_DISTANCE_SAMPLES: usize = 100;

/// ADE20K ids of the classes the segmentation model is expected to emit
const DEFAULT_CLASSES: &[(&str, u32)] = &[
    ("road", 6),
    ("sidewalk", 11),
    ("building", 1),
    ("stairs", 53),
    ("door", 14),
    ("runway", 54),
    ("stairway", 59),
    ("bench", 69),
    ("dirt_road", 91),
    ("railing", 95),
];

/// Mapping from semantic class name to segmentation class id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassMap(BTreeMap<String, u32>);

impl ClassMap {
    /// Build a class map, rejecting two names that share an id
    pub fn new<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let map: BTreeMap<String, u32> = entries.into_iter().map(|(n, id)| (n.into(), id)).collect();
        let map = Self(map);
        map.validate()?;
        Ok(map)
    }

    pub fn id(&self, name: &str) -> Option<u32> {
        self.0.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Reverse lookup, linear in the number of classes
    pub fn name_of(&self, id: u32) -> Option<&str> {
        self.0
            .iter()
            .find(|(_, &class_id)| class_id == id)
            .map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(name, &id)| (name.as_str(), id))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn validate(&self) -> Result<()> {
        let mut seen = FxHashSet::default();
        for (name, &id) in &self.0 {
            if name.is_empty() {
                return Err(Error::InvalidClassMap("empty class name".into()));
            }
            if !seen.insert(id) {
                return Err(Error::InvalidClassMap(format!(
                    "class id {} is assigned to more than one name (last: {})",
                    id, name
                )));
            }
        }
        Ok(())
    }
}

impl Default for ClassMap {
    fn default() -> Self {
        Self(
            DEFAULT_CLASSES
                .iter()
                .map(|&(name, id)| (name.to_string(), id))
                .collect(),
        )
    }
}

/// Configuration injected into [`crate::AccessibilityAnalyzer`] once
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Class name to segmentation id
    pub class_map: ClassMap,
    /// Proximity threshold in segmentation-map pixels (not normalized to image size)
    pub threshold_distance: f64,
    /// Coordinates sampled from each mask when estimating a distance
    pub max_distance_samples: usize,
    /// `(width, height)` the class map was calibrated for, if fixed
    pub expected_dimensions: Option<(usize, usize)>,
}

impl AnalyzerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.class_map.validate()?;
        if !self.threshold_distance.is_finite() || self.threshold_distance <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "threshold_distance must be a positive number, got {}",
                self.threshold_distance
            )));
        }
        if self.max_distance_samples == 0 {
            return Err(Error::InvalidConfig(
                "max_distance_samples must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            class_map: ClassMap::default(),
            threshold_distance: DEFAULT_THRESHOLD_DISTANCE,
            max_distance_samples: DEFAULT_MAX_DISTANCE_SAMPLES,
            expected_dimensions: None,
        }
    }
}
