use image::GrayImage;
use crate::{traits::Binarizer, types::BinaryMask};

pub const DEFAULT_THRESHOLD: i32 = 128;

/// Sigma of the Gaussian a 5x5 kernel implies
pub const DEFAULT_SIGMA: f32 = 1.1;

/// Clamp a caller-supplied threshold into the 8-bit intensity range
pub fn clamp_threshold(threshold: i32) -> u8 {
    threshold.clamp(0, u8::MAX as i32) as u8
}

/// Inverse binarization: a pixel is foreground iff its intensity is strictly
/// below `threshold`. Dark pixels are particulate matter.
pub fn threshold_inverse(image: &GrayImage, threshold: u8) -> BinaryMask {
    let data = image.pixels().map(|p| p[0] < threshold).collect();
    BinaryMask::from_raw(image.width(), image.height(), data)
}

/// Gaussian smoothing followed by inverse thresholding
#[derive(Debug, Clone)]
pub struct GaussianBinarizer {
    /// Non-positive values skip smoothing
    pub sigma: f32,
}

impl Default for GaussianBinarizer {
    fn default() -> Self {
        Self { sigma: DEFAULT_SIGMA }
    }
}

impl GaussianBinarizer {
    pub fn smooth(&self, image: &GrayImage) -> GrayImage {
        if self.sigma > 0.0 {
            imageproc::filter::gaussian_blur_f32(image, self.sigma)
        } else {
            image.clone()
        }
    }
}

impl Binarizer for GaussianBinarizer {
    fn binarize(&self, image: &GrayImage, threshold: u8) -> BinaryMask {
        let smoothed = self.smooth(image);
        threshold_inverse(&smoothed, threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_clamp_threshold() {
        assert_eq!(clamp_threshold(-20), 0);
        assert_eq!(clamp_threshold(0), 0);
        assert_eq!(clamp_threshold(128), 128);
        assert_eq!(clamp_threshold(255), 255);
        assert_eq!(clamp_threshold(1000), 255);
    }

    #[test]
    fn test_threshold_equality_is_background() {
        let image = GrayImage::from_raw(3, 1, vec![99, 100, 101]).expect("Valid buffer");
        let mask = threshold_inverse(&image, 100);
        assert_eq!(mask.as_slice(), &[true, false, false]);
    }

    #[test]
    fn test_zero_threshold_selects_nothing() {
        let image = GrayImage::new(4, 4);
        assert_eq!(threshold_inverse(&image, 0).foreground_count(), 0);
    }

    #[test]
    fn test_smoothing_disabled() {
        let mut image = GrayImage::from_pixel(5, 5, Luma([255u8]));
        image.put_pixel(2, 2, Luma([0u8]));

        let binarizer = GaussianBinarizer { sigma: 0.0 };
        let mask = binarizer.binarize(&image, 128);
        assert_eq!(mask.foreground_count(), 1);
        assert!(mask.get(2, 2));
    }

    #[test]
    fn test_dark_blob_survives_smoothing() {
        let mut image = GrayImage::from_pixel(20, 20, Luma([255u8]));
        for y in 7..13 {
            for x in 7..13 {
                image.put_pixel(x, y, Luma([0u8]));
            }
        }

        let mask = GaussianBinarizer::default().binarize(&image, 128);
        assert!(mask.get(10, 10));
        assert!(!mask.get(0, 0));
        assert!(!mask.get(19, 19));
    }

    #[test]
    fn test_smoothing_suppresses_single_pixel_noise() {
        let mut image = GrayImage::from_pixel(9, 9, Luma([255u8]));
        image.put_pixel(4, 4, Luma([0u8]));

        let mask = GaussianBinarizer::default().binarize(&image, 128);
        assert_eq!(mask.foreground_count(), 0);
    }
}
