pub mod builder;

use image::GrayImage;
use tracing::debug;
use crate::{
    algorithms::{clamp_threshold, Classifier, SizeFilter},
    config::AnalysisConfig,
    error::{Result, TurbidityError},
    traits::{Binarizer, BoundaryTracer, ComponentLabeler},
    types::{AnalysisResult, BinaryMask, Region},
};

/// Per-frame particle analysis: binarize, label, filter, trace, classify.
///
/// A pipeline holds only its stage configuration. Every call allocates its own
/// mask and label map, so one pipeline can serve many threads at once.
pub struct Pipeline {
    binarizer: Box<dyn Binarizer>,
    labeler: Box<dyn ComponentLabeler>,
    tracer: Box<dyn BoundaryTracer>,
    size_filter: SizeFilter,
    classifier: Classifier,
    max_dimension: Option<u32>,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    /// Build a pipeline from a validated configuration
    pub fn from_config(config: &AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(builder::PipelineBuilder::from_config(config).build())
    }

    pub fn new(
        binarizer: Box<dyn Binarizer>,
        labeler: Box<dyn ComponentLabeler>,
        tracer: Box<dyn BoundaryTracer>,
        size_filter: SizeFilter,
        classifier: Classifier,
        max_dimension: Option<u32>,
    ) -> Self {
        Self {
            binarizer,
            labeler,
            tracer,
            size_filter,
            classifier,
            max_dimension,
        }
    }

    /// Analyze one grayscale frame. `threshold` is clamped to 0..=255.
    pub fn process(&self, image: &GrayImage, threshold: i32) -> Result<AnalysisResult> {
        self.validate_image(image)?;

        let threshold = clamp_threshold(threshold);
        let mask = self.binarizer.binarize(image, threshold);
        debug!(threshold, foreground = mask.foreground_count(), "binarized frame");

        Ok(self.process_mask_with_threshold(&mask, threshold))
    }

    /// Run labeling, filtering, tracing and classification on a ready-made mask.
    ///
    /// The reported threshold is 0 since no binarization took place.
    pub fn process_mask(&self, mask: &BinaryMask) -> Result<AnalysisResult> {
        self.check_dimensions(mask.width(), mask.height())?;
        Ok(self.process_mask_with_threshold(mask, 0))
    }

    fn process_mask_with_threshold(&self, mask: &BinaryMask, threshold: u8) -> AnalysisResult {
        let labels = self.labeler.label(mask);
        let surviving = self.size_filter.surviving(&labels);
        debug!(
            labels = labels.label_count(),
            surviving = surviving.len(),
            min_size = self.size_filter.min_size,
            "filtered regions"
        );

        let regions: Vec<Region> = surviving
            .iter()
            .map(|&id| Region {
                id,
                pixel_count: labels.pixel_count(id),
                boundary: self.tracer.trace(&labels, id),
            })
            .collect();

        let assessment = self.classifier.classify(regions.len());
        debug!(
            object_count = regions.len(),
            risk = %assessment.risk_level,
            "classified frame"
        );

        AnalysisResult {
            object_count: regions.len(),
            regions,
            potable: assessment.potable,
            risk_level: assessment.risk_level,
            purification_method: assessment.purification_method,
            threshold,
            image_width: mask.width(),
            image_height: mask.height(),
        }
    }

    fn validate_image(&self, image: &GrayImage) -> Result<()> {
        let (width, height) = image.dimensions();
        self.check_dimensions(width, height)?;
        if image.as_raw().len() < width as usize * height as usize {
            return Err(TurbidityError::InvalidInput(format!(
                "pixel buffer holds {} bytes, expected {}",
                image.as_raw().len(),
                width as usize * height as usize
            )));
        }
        Ok(())
    }

    /// Reject zero-area frames and frames over the dimension limit
    fn check_dimensions(&self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(TurbidityError::InvalidInput(format!(
                "image has zero area ({width}x{height})"
            )));
        }
        if let Some(limit) = self.max_dimension {
            if width > limit || height > limit {
                return Err(TurbidityError::InvalidInput(format!(
                    "image {width}x{height} exceeds the {limit}px dimension limit"
                )));
            }
        }
        Ok(())
    }

    pub fn min_size(&self) -> usize {
        self.size_filter.min_size
    }

    pub fn classifier(&self) -> Classifier {
        self.classifier
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        format!(
            "Pipeline: min_size={}, max_safe={}, high_risk={}, max_dimension={:?}",
            self.size_filter.min_size,
            self.classifier.max_safe,
            self.classifier.high_risk,
            self.max_dimension
        )
    }
}
