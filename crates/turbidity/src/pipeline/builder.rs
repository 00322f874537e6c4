use crate::{
    pipeline::Pipeline,
    config::{AnalysisConfig, LabelerKind},
    traits::{Binarizer, ComponentLabeler},
    algorithms::{
        Classifier,
        FloodFillLabeler,
        GaussianBinarizer,
        MooreBoundaryTracer,
        SizeFilter,
        UnionFindLabeler,
    },
};

/// Builder for creating analysis pipelines with a fluent API
pub struct PipelineBuilder {
    binarizer: Option<Box<dyn Binarizer>>,
    labeler: Option<Box<dyn ComponentLabeler>>,
    size_filter: SizeFilter,
    classifier: Classifier,
    max_dimension: Option<u32>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            binarizer: None,
            labeler: None,
            size_filter: SizeFilter::default(),
            classifier: Classifier::default(),
            max_dimension: None,
        }
    }

    /// Seed a builder from configuration values (not validated here)
    pub fn from_config(config: &AnalysisConfig) -> Self {
        let builder = Self::new()
            .with_sigma(config.sigma)
            .with_min_size(config.min_size)
            .with_risk_thresholds(config.max_safe, config.high_risk);

        let builder = match config.labeler {
            LabelerKind::UnionFind => builder.set_labeler(UnionFindLabeler),
            LabelerKind::FloodFill => builder.set_labeler(FloodFillLabeler),
        };

        match config.max_dimension {
            Some(limit) => builder.with_max_dimension(limit),
            None => builder,
        }
    }

    /// Set the binarizer (replaces any existing one)
    pub fn set_binarizer<B>(mut self, binarizer: B) -> Self
    where
        B: Binarizer + 'static,
    {
        self.binarizer = Some(Box::new(binarizer));
        self
    }

    /// Set the component labeler (replaces any existing one)
    pub fn set_labeler<L>(mut self, labeler: L) -> Self
    where
        L: ComponentLabeler + 'static,
    {
        self.labeler = Some(Box::new(labeler));
        self
    }

    /// Use Gaussian smoothing with the given sigma before thresholding
    pub fn with_sigma(self, sigma: f32) -> Self {
        self.set_binarizer(GaussianBinarizer { sigma })
    }

    pub fn with_min_size(mut self, min_size: usize) -> Self {
        self.size_filter = SizeFilter { min_size };
        self
    }

    pub fn with_risk_thresholds(mut self, max_safe: usize, high_risk: usize) -> Self {
        self.classifier = Classifier::new(max_safe, high_risk);
        self
    }

    pub fn with_max_dimension(mut self, limit: u32) -> Self {
        self.max_dimension = Some(limit);
        self
    }

    /// Build the pipeline with default components if not specified
    pub fn build(self) -> Pipeline {
        let binarizer = self.binarizer
            .unwrap_or_else(|| Box::new(GaussianBinarizer::default()));

        let labeler = self.labeler
            .unwrap_or_else(|| Box::new(UnionFindLabeler));

        Pipeline::new(
            binarizer,
            labeler,
            Box::new(MooreBoundaryTracer),
            self.size_filter,
            self.classifier,
            self.max_dimension,
        )
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
