//! # Water Turbidity Analysis Library
//!
//! Estimates water turbidity from a grayscale frame by counting dark,
//! particle-like blobs and mapping the count to a contamination risk level
//! and a purification recommendation.
//!
//! ## Pipeline
//!
//! 1. **Binarize**: Gaussian smoothing, then inverse thresholding (darker than
//!    the threshold is foreground)
//! 2. **Label**: 8-connected component labeling (union-find or flood fill)
//! 3. **Filter**: drop regions smaller than `min_size` pixels
//! 4. **Trace**: Moore-neighbor external contour of each surviving region
//! 5. **Classify**: count → potability, risk level, purification method
//!
//! Every call is stateless: nothing is kept between frames.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use image::open;
//!
//! let frame = open("water_sample.png")?.to_luma8();
//! let result = turbidity::analyze_default(&frame, 128)?;
//!
//! println!("Particles: {}", result.object_count);
//! println!("Risk: {}", result.risk_level.description());
//! result.save_overlay(&frame, "water_sample_annotated.png")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Custom Pipeline
//!
//! ```rust,no_run
//! use turbidity::{Pipeline, algorithms::*};
//!
//! let pipeline = Pipeline::builder()
//!     .with_sigma(0.8)
//!     .set_labeler(FloodFillLabeler)
//!     .with_min_size(8)
//!     .with_risk_thresholds(5, 30)
//!     .build();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod types;
pub mod config;
pub mod traits;
pub mod algorithms;
pub mod pipeline;
pub mod io;

pub use error::{TurbidityError, Result};
pub use types::{AnalysisResult, Assessment, BinaryMask, LabelMap, PurificationMethod, Region, RiskLevel};
pub use config::{AnalysisConfig, LabelerKind};
pub use traits::*;
pub use pipeline::{Pipeline, builder::PipelineBuilder};

use image::GrayImage;
use algorithms::{DEFAULT_HIGH_RISK, DEFAULT_MAX_SAFE, DEFAULT_MIN_SIZE};

/// Analyze one grayscale frame.
///
/// `threshold` is clamped to 0..=255. Deterministic for identical inputs.
/// Fails with [`TurbidityError::InvalidInput`] for a zero-area image.
pub fn analyze(
    image: &GrayImage,
    threshold: i32,
    min_size: usize,
    max_safe: usize,
    high_risk: usize,
) -> Result<AnalysisResult> {
    Pipeline::builder()
        .with_min_size(min_size)
        .with_risk_thresholds(max_safe, high_risk)
        .build()
        .process(image, threshold)
}

/// [`analyze`] with `min_size = 5`, `max_safe = 10`, `high_risk = 50`
pub fn analyze_default(image: &GrayImage, threshold: i32) -> Result<AnalysisResult> {
    analyze(image, threshold, DEFAULT_MIN_SIZE, DEFAULT_MAX_SAFE, DEFAULT_HIGH_RISK)
}

/// Wrap a raw row-major 8-bit buffer, rejecting mismatched lengths
pub fn gray_image_from_raw(width: u32, height: u32, pixels: Vec<u8>) -> Result<GrayImage> {
    let len = pixels.len();
    GrayImage::from_raw(width, height, pixels).ok_or_else(|| {
        TurbidityError::InvalidInput(format!(
            "buffer of {len} bytes does not match {width}x{height}"
        ))
    })
}
