//! Ink mask preparation for graphology
//!
//! Converts the scanned page to grayscale and derives an inverted binary mask
//! (ink = 255, paper = 0). The mask keeps the gaps between words and lines
//! intact; it is not meant as OCR binarization.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter::gaussian_blur_f32;
use tracing::{debug, Level};

use crate::config::PreprocessSettings;

/// Mask value marking an ink pixel
pub const INK: u8 = 255;

/// Grayscale page plus the ink mask derived from it
#[derive(Debug, Clone)]
pub struct PreparedImage {
    /// Grayscale conversion of the input (not blurred)
    pub gray: GrayImage,
    /// Inverted binary mask, same dimensions as `gray`
    pub mask: GrayImage,
}

impl PreparedImage {
    /// Number of ink pixels in the mask
    pub fn ink_pixel_count(&self) -> usize {
        self.mask.pixels().filter(|p| p.0[0] == INK).count()
    }
}

/// Produces the grayscale page and ink mask
#[derive(Debug, Clone)]
pub struct ImagePreparer {
    settings: PreprocessSettings,
}

impl ImagePreparer {
    pub fn new(settings: PreprocessSettings) -> Self {
        Self { settings }
    }

    /// Grayscale, blur, then inverted adaptive threshold
    pub fn prepare(&self, image: &DynamicImage) -> PreparedImage {
        let gray = to_grayscale(image);
        let blurred = gaussian_blur(&gray, self.settings.blur_kernel);
        let mask = adaptive_threshold_inv(
            &blurred,
            self.settings.threshold_block_size,
            self.settings.threshold_offset,
        );

        let prepared = PreparedImage { gray, mask };
        if tracing::enabled!(Level::DEBUG) {
            debug!(
                "Prepared {}x{} page, {} ink pixels",
                prepared.gray.width(),
                prepared.gray.height(),
                prepared.ink_pixel_count()
            );
        }
        prepared
    }
}

/// Convert any input image to 8-bit grayscale using BT.601 luminance weights
pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
    let rgb = image.to_rgb8();
    let mut gray = GrayImage::new(rgb.width(), rgb.height());

    for (x, y, pixel) in rgb.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        let value = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        gray.put_pixel(x, y, Luma([value.round().clamp(0.0, 255.0) as u8]));
    }

    gray
}

/// Gaussian sigma matching a square kernel of the given size
///
/// Same relation OpenCV uses when sigma is left at 0.
pub fn sigma_for_kernel(kernel_size: u32) -> f32 {
    0.3 * ((kernel_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Blur with a Gaussian sized for `kernel_size`; sizes of 1 or less are a no-op
pub fn gaussian_blur(image: &GrayImage, kernel_size: u32) -> GrayImage {
    if kernel_size <= 1 || image.width() == 0 || image.height() == 0 {
        return image.clone();
    }
    gaussian_blur_f32(image, sigma_for_kernel(kernel_size))
}

/// Inverted adaptive threshold against a Gaussian-weighted local mean
///
/// A pixel is ink when it is at least `offset` darker than its neighbourhood.
/// Uniform regions therefore never produce ink.
pub fn adaptive_threshold_inv(image: &GrayImage, block_size: u32, offset: f32) -> GrayImage {
    let local_mean = gaussian_blur(image, block_size);
    let mut mask = GrayImage::new(image.width(), image.height());

    for (x, y, pixel) in image.enumerate_pixels() {
        let value = pixel.0[0] as f32;
        let threshold = local_mean.get_pixel(x, y).0[0] as f32 - offset;
        if value <= threshold {
            mask.put_pixel(x, y, Luma([INK]));
        }
    }

    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    fn page_with_block() -> DynamicImage {
        let mut page = RgbImage::from_pixel(80, 60, Rgb([245, 245, 245]));
        draw_filled_rect_mut(&mut page, Rect::at(30, 20).of_size(12, 12), Rgb([20, 20, 20]));
        DynamicImage::ImageRgb8(page)
    }

    #[test]
    fn test_grayscale_weights() {
        let mut rgb = RgbImage::new(3, 1);
        rgb.put_pixel(0, 0, Rgb([255, 0, 0]));
        rgb.put_pixel(1, 0, Rgb([0, 255, 0]));
        rgb.put_pixel(2, 0, Rgb([128, 128, 128]));

        let gray = to_grayscale(&DynamicImage::ImageRgb8(rgb));

        assert_eq!(gray.get_pixel(0, 0).0[0], 76);
        assert_eq!(gray.get_pixel(1, 0).0[0], 150);
        assert_eq!(gray.get_pixel(2, 0).0[0], 128);
    }

    #[test]
    fn test_sigma_for_kernel() {
        assert!((sigma_for_kernel(5) - 1.1).abs() < 1e-5);
        assert!((sigma_for_kernel(11) - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_blank_page_has_no_ink() {
        let page = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 48, Rgb([250, 250, 250])));
        let prepared = ImagePreparer::new(PreprocessSettings::default()).prepare(&page);

        assert_eq!(prepared.gray.dimensions(), (64, 48));
        assert_eq!(prepared.mask.dimensions(), (64, 48));
        assert_eq!(prepared.ink_pixel_count(), 0);
    }

    #[test]
    fn test_dark_block_becomes_ink() {
        let prepared =
            ImagePreparer::new(PreprocessSettings::default()).prepare(&page_with_block());

        // Edge of the block is darker than its neighbourhood
        assert_eq!(prepared.mask.get_pixel(30, 26).0[0], INK);
        // Far-away paper stays background
        assert_eq!(prepared.mask.get_pixel(2, 2).0[0], 0);
        assert_eq!(prepared.mask.get_pixel(75, 55).0[0], 0);
    }

    #[test]
    fn test_gaussian_blur_noop_for_small_kernel() {
        let image = GrayImage::from_raw(2, 1, vec![0, 255]).unwrap();
        let blurred = gaussian_blur(&image, 1);
        assert_eq!(blurred, image);
    }

    #[test]
    fn test_ink_pixel_count() {
        let prepared = PreparedImage {
            gray: GrayImage::new(4, 2),
            mask: GrayImage::from_raw(4, 2, vec![INK, 0, 0, INK, 0, INK, 0, 0]).unwrap(),
        };
        assert_eq!(prepared.ink_pixel_count(), 3);
    }
}
