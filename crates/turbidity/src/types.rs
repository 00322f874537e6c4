use geo_types::{Coord, LineString, Polygon};
use image::{GrayImage, Luma};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Foreground/background mask with the same dimensions as its source image.
///
/// `true` marks a foreground (candidate particle) pixel. Storage is row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    width: u32,
    height: u32,
    data: Vec<bool>,
}

impl BinaryMask {
    /// An all-background mask
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![false; width as usize * height as usize],
        }
    }

    /// Build a mask by evaluating `f(x, y)` for every pixel
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> bool,
    {
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self { width, height, data }
    }

    /// Treat every nonzero pixel of `image` as foreground
    pub fn from_gray_image(image: &GrayImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            data: image.pixels().map(|p| p[0] != 0).collect(),
        }
    }

    pub(crate) fn from_raw(width: u32, height: u32, data: Vec<bool>) -> Self {
        debug_assert_eq!(data.len(), width as usize * height as usize);
        Self { width, height, data }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        self.data[self.index(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, foreground: bool) {
        let index = self.index(x, y);
        self.data[index] = foreground;
    }

    /// Row-major view of the mask
    pub fn as_slice(&self) -> &[bool] {
        &self.data
    }

    pub fn foreground_count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// Render as an 8-bit image: 255 for foreground, 0 for background
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            if self.get(x, y) { Luma([255u8]) } else { Luma([0u8]) }
        })
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// Result of connected-component labeling.
///
/// Label 0 is background; `1..=label_count()` are region ids. Pixel counts are
/// indexed by label id, so `pixel_count(0)` is the number of background pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    width: u32,
    height: u32,
    labels: Vec<u32>,
    pixel_counts: Vec<usize>,
    anchors: Vec<usize>,
}

impl LabelMap {
    /// Wrap final labels (numbered `1..=label_count`) and tally per-label
    /// statistics in a single pass.
    pub(crate) fn from_labels(width: u32, height: u32, labels: Vec<u32>, label_count: u32) -> Self {
        let mut pixel_counts = vec![0usize; label_count as usize + 1];
        let mut anchors = vec![usize::MAX; label_count as usize + 1];

        for (index, &label) in labels.iter().enumerate() {
            let slot = label as usize;
            pixel_counts[slot] += 1;
            if label != 0 && anchors[slot] == usize::MAX {
                anchors[slot] = index;
            }
        }

        Self {
            width,
            height,
            labels,
            pixel_counts,
            anchors,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of regions N
    pub fn label_count(&self) -> u32 {
        (self.pixel_counts.len() - 1) as u32
    }

    pub fn get(&self, x: u32, y: u32) -> u32 {
        self.labels[y as usize * self.width as usize + x as usize]
    }

    /// Bounds-checked membership test; coordinates outside the map belong to no label.
    pub fn is_label(&self, x: i64, y: i64, id: u32) -> bool {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return false;
        }
        self.labels[y as usize * self.width as usize + x as usize] == id
    }

    /// Row-major view of the labels
    pub fn as_slice(&self) -> &[u32] {
        &self.labels
    }

    pub fn pixel_count(&self, id: u32) -> usize {
        self.pixel_counts.get(id as usize).copied().unwrap_or(0)
    }

    /// Pixel counts indexed by label id (index 0 is background)
    pub fn pixel_counts(&self) -> &[usize] {
        &self.pixel_counts
    }

    /// First pixel of a region in raster order
    pub fn anchor(&self, id: u32) -> Option<[u32; 2]> {
        if id == 0 {
            return None;
        }
        let index = *self.anchors.get(id as usize)?;
        if index == usize::MAX {
            return None;
        }
        let width = self.width as usize;
        Some([(index % width) as u32, (index / width) as u32])
    }
}

/// A surviving particle region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Region {
    /// Label id in the frame's label map
    pub id: u32,
    pub pixel_count: usize,
    /// Closed external contour in pixel coordinates; first point equals last
    pub boundary: Vec<[u32; 2]>,
}

impl Region {
    /// Convert the boundary to a geo-types Polygon
    pub fn to_geo_polygon(&self) -> Polygon<f64> {
        let coords: Vec<Coord<f64>> = self
            .boundary
            .iter()
            .map(|&[x, y]| Coord { x: x as f64, y: y as f64 })
            .collect();

        Polygon::new(LineString::new(coords), vec![])
    }

    /// Inclusive pixel bounding box `(min, max)` of the boundary
    pub fn bounding_box(&self) -> Option<([u32; 2], [u32; 2])> {
        use geo::BoundingRect;

        let rect = self.to_geo_polygon().exterior().bounding_rect()?;
        Some((
            [rect.min().x as u32, rect.min().y as u32],
            [rect.max().x as u32, rect.max().y as u32],
        ))
    }

    /// Length of the traced contour
    pub fn perimeter(&self) -> f64 {
        use geo::EuclideanLength;
        self.to_geo_polygon().exterior().euclidean_length()
    }
}

#[derive(
    Debug, Clone, Copy,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString,
    PartialEq, Eq, Hash
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "Low risk",
            Self::Moderate => "Moderate risk",
            Self::High => "High risk",
        }
    }
}

#[derive(
    Debug, Clone, Copy,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString,
    PartialEq, Eq, Hash
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PurificationMethod {
    /// Water is safe as-is
    None,
    BoilOrChlorinate,
    /// Filtration, UV treatment or reverse osmosis
    FilterUvOrRo,
}

impl PurificationMethod {
    pub fn description(&self) -> &'static str {
        match self {
            Self::None => "No purification needed",
            Self::BoilOrChlorinate => "Boiling or Chlorination",
            Self::FilterUvOrRo => "Filtration, UV, or RO",
        }
    }
}

/// Classifier verdict for one particle count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Assessment {
    pub potable: bool,
    pub risk_level: RiskLevel,
    pub purification_method: PurificationMethod,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisResult {
    /// Number of regions that passed the size filter
    pub object_count: usize,
    pub regions: Vec<Region>,
    pub potable: bool,
    pub risk_level: RiskLevel,
    pub purification_method: PurificationMethod,
    /// Threshold actually applied, after clamping
    pub threshold: u8,
    pub image_width: u32,
    pub image_height: u32,
}

impl AnalysisResult {
    /// Pixel counts of the surviving regions, sorted ascending
    pub fn region_pixel_counts(&self) -> Vec<usize> {
        let mut counts: Vec<usize> = self.regions.iter().map(|r| r.pixel_count).collect();
        counts.sort_unstable();
        counts
    }

    /// Human-readable report lines, in the order an overlay shows them
    pub fn status_lines(&self) -> Vec<String> {
        vec![
            format!("Particles: {}", self.object_count),
            format!("Risk: {}", self.risk_level.description()),
            format!("Purification: {}", self.purification_method.description()),
            format!("Threshold: {}", self.threshold),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_roundtrips_through_gray_image() {
        let mask = BinaryMask::from_fn(4, 3, |x, y| (x + y) % 2 == 0);
        let image = mask.to_gray_image();
        assert_eq!(BinaryMask::from_gray_image(&image), mask);
        assert_eq!(mask.foreground_count(), 6);
    }

    #[test]
    fn test_label_map_statistics() {
        // 0 1 1
        // 2 0 1
        let labels = LabelMap::from_labels(3, 2, vec![0, 1, 1, 2, 0, 1], 2);
        assert_eq!(labels.label_count(), 2);
        assert_eq!(labels.pixel_counts(), &[2, 3, 1]);
        assert_eq!(labels.anchor(1), Some([1, 0]));
        assert_eq!(labels.anchor(2), Some([0, 1]));
        assert_eq!(labels.anchor(0), None);
        assert_eq!(labels.anchor(3), None);
        assert!(labels.is_label(2, 1, 1));
        assert!(!labels.is_label(-1, 0, 0));
        assert!(!labels.is_label(3, 0, 1));
    }

    #[test]
    fn test_region_geometry() {
        let region = Region {
            id: 1,
            pixel_count: 4,
            boundary: vec![[2, 3], [3, 3], [3, 4], [2, 4], [2, 3]],
        };
        assert_eq!(region.bounding_box(), Some(([2, 3], [3, 4])));
        assert!((region.perimeter() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_enum_names() {
        assert_eq!(RiskLevel::Moderate.to_string(), "moderate");
        assert_eq!(PurificationMethod::FilterUvOrRo.to_string(), "filter_uv_or_ro");
        assert_eq!("high".parse::<RiskLevel>().ok(), Some(RiskLevel::High));
        assert_eq!(
            serde_json::to_string(&PurificationMethod::BoilOrChlorinate).ok().as_deref(),
            Some("\"boil_or_chlorinate\"")
        );
    }
}
