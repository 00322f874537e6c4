use image::GrayImage;
use crate::{error::Result, types::{BinaryMask, LabelMap}};

/// Trait for turning a grayscale frame into a foreground mask
pub trait Binarizer: Send + Sync {
    /// Smooth `image` and mark pixels darker than `threshold` as foreground
    fn binarize(&self, image: &GrayImage, threshold: u8) -> BinaryMask;
}

/// Trait for connected-component labeling algorithms
pub trait ComponentLabeler: Send + Sync {
    /// Partition the foreground of `mask` into 8-connected regions
    fn label(&self, mask: &BinaryMask) -> LabelMap;
}

/// Trait for boundary-following algorithms
pub trait BoundaryTracer: Send + Sync {
    /// Closed external contour of region `id`, or an empty vec if the label is absent
    fn trace(&self, labels: &LabelMap, id: u32) -> Vec<[u32; 2]>;
}

/// Source of grayscale frames for a live analysis loop
pub trait FrameSource: Send {
    /// Grab the next frame.
    ///
    /// `Ok(None)` means the source has ended; an unavailable device is a
    /// [`TurbidityError::Capture`](crate::TurbidityError::Capture).
    fn capture_frame(&mut self) -> Result<Option<GrayImage>>;

    /// Get a human-readable description of this source
    fn description(&self) -> String;
}
