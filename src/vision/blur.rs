//! Print quality estimation
//!
//! Uses the variance of the Laplacian over a grayscale image: crisp laser or pad printing
//! produces strong edges and a high variance, smeared or re-marked text does not.

use image::GrayImage;

/// Default variance below which an image is considered blurry
pub const DEFAULT_BLUR_THRESHOLD: f64 = 100.0;

/// Laplacian-variance blur detector
#[derive(Debug, Clone, Copy)]
pub struct BlurDetector {
    threshold: f64,
}

impl Default for BlurDetector {
    fn default() -> Self {
        Self::new(DEFAULT_BLUR_THRESHOLD)
    }
}

impl BlurDetector {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Whether the image is too degraded for reliable inspection
    pub fn is_blurry(&self, image: &GrayImage) -> bool {
        laplacian_variance(image) < self.threshold
    }
}

/// Variance of the 4-neighbour Laplacian over the image interior.
/// Images smaller than 3x3 have no interior and report 0.
pub fn laplacian_variance(image: &GrayImage) -> f64 {
    let (width, height) = image.dimensions();
    if width < 3 || height < 3 {
        return 0.0;
    }

    let px = |x: u32, y: u32| image.get_pixel(x, y).0[0] as f64;

    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    let mut count = 0usize;

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let lap = px(x, y - 1) + px(x - 1, y) + px(x + 1, y) + px(x, y + 1) - 4.0 * px(x, y);
            sum += lap;
            sum_sq += lap * lap;
            count += 1;
        }
    }

    let n = count as f64;
    let mean = sum / n;
    (sum_sq / n - mean * mean).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn checkerboard(size: u32) -> GrayImage {
        GrayImage::from_fn(size, size, |x, y| {
            if (x + y) % 2 == 0 {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        })
    }

    #[test]
    fn test_flat_image_is_blurry() {
        let img = GrayImage::from_pixel(16, 16, Luma([128u8]));
        assert_eq!(laplacian_variance(&img), 0.0);
        assert!(BlurDetector::default().is_blurry(&img));
    }

    #[test]
    fn test_high_frequency_pattern_is_sharp() {
        let img = checkerboard(16);
        assert!(laplacian_variance(&img) > DEFAULT_BLUR_THRESHOLD);
        assert!(!BlurDetector::default().is_blurry(&img));
    }

    #[test]
    fn test_gentle_gradient_is_blurry() {
        let img = GrayImage::from_fn(32, 32, |x, _| Luma([(x * 4) as u8]));
        assert!(BlurDetector::default().is_blurry(&img));
    }

    #[test]
    fn test_tiny_image_has_zero_variance() {
        let img = GrayImage::from_pixel(2, 2, Luma([255u8]));
        assert_eq!(laplacian_variance(&img), 0.0);
    }

    #[test]
    fn test_custom_threshold() {
        let img = checkerboard(8);
        assert!(BlurDetector::new(f64::MAX).is_blurry(&img));
        assert_eq!(BlurDetector::new(5.0).threshold(), 5.0);
    }
}
