use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, VariantNames};

use crate::{
    algorithms::{
        binarize::{DEFAULT_SIGMA, DEFAULT_THRESHOLD},
        classification::{DEFAULT_HIGH_RISK, DEFAULT_MAX_SAFE},
        filtering::DEFAULT_MIN_SIZE,
    },
    error::{Result, TurbidityError},
};

/// Which connected-component algorithm the pipeline uses
#[derive(
    Debug, Clone, Copy, Default,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, VariantNames,
    PartialEq, Eq
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LabelerKind {
    /// Two-pass raster scan with union-find
    #[default]
    UnionFind,
    /// Iterative stack-based flood fill
    FloodFill,
}

/// Tunable parameters of an analysis run
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Binarization threshold; values outside 0..=255 are clamped
    pub threshold: i32,
    /// Minimum pixel count for a region to count as a particle
    pub min_size: usize,
    /// Highest particle count still considered potable
    pub max_safe: usize,
    /// Highest particle count still considered moderate risk
    pub high_risk: usize,
    /// Gaussian smoothing sigma; 0 disables smoothing
    #[schemars(range(min = 0.0))]
    pub sigma: f32,
    pub labeler: LabelerKind,
    /// Reject frames whose width or height exceeds this
    pub max_dimension: Option<u32>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            min_size: DEFAULT_MIN_SIZE,
            max_safe: DEFAULT_MAX_SAFE,
            high_risk: DEFAULT_HIGH_RISK,
            sigma: DEFAULT_SIGMA,
            labeler: LabelerKind::default(),
            max_dimension: None,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_safe > self.high_risk {
            return Err(TurbidityError::InvalidConfig(format!(
                "max_safe ({}) must not exceed high_risk ({})",
                self.max_safe, self.high_risk
            )));
        }
        if !self.sigma.is_finite() || self.sigma < 0.0 {
            return Err(TurbidityError::InvalidConfig(format!(
                "sigma must be a non-negative number, got {}",
                self.sigma
            )));
        }
        if self.max_dimension == Some(0) {
            return Err(TurbidityError::InvalidConfig(
                "max_dimension must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// JSON schema describing the configuration file format
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AnalysisConfig)
    }
}
