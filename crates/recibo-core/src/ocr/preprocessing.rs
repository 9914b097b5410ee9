//! Image cleanup applied before text recognition.
//!
//! Scanned receipts arrive as noisy grayscale-ish photos; recognition gets
//! markedly better after a global Otsu binarization and a light median
//! smoothing pass.

use image::{DynamicImage, GrayImage, Luma};
use tracing::debug;

/// Deterministic cleanup pipeline: grayscale, Otsu threshold, median
/// smoothing.
pub struct ImagePreprocessor {
    /// Median window radius; 1 gives the classic 3x3 window.
    median_radius: u32,
}

impl ImagePreprocessor {
    /// Create a preprocessor with default settings.
    pub fn new() -> Self {
        Self { median_radius: 1 }
    }

    /// Set the median smoothing window radius.
    pub fn with_median_radius(mut self, radius: u32) -> Self {
        self.median_radius = radius;
        self
    }

    /// Run the full cleanup pipeline.
    pub fn prepare(&self, image: &DynamicImage) -> DynamicImage {
        let gray = image.to_luma8();
        let threshold = otsu_threshold(&gray);
        debug!("binarizing at Otsu threshold {threshold}");

        let binary = binarize(&gray, threshold);
        let smoothed = median_filter(&binary, self.median_radius);
        DynamicImage::ImageLuma8(smoothed)
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Global threshold maximizing between-class variance over the grayscale
/// histogram.
fn otsu_threshold(image: &GrayImage) -> u8 {
    let mut histogram = [0u32; 256];
    for pixel in image.pixels() {
        histogram[pixel[0] as usize] += 1;
    }

    let total = (image.width() as f64) * (image.height() as f64);
    let weighted_sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(value, &count)| value as f64 * count as f64)
        .sum();

    let mut background_sum = 0.0;
    let mut background_weight = 0.0;
    let mut best_variance = 0.0;
    let mut threshold = 0u8;

    for (value, &count) in histogram.iter().enumerate() {
        background_weight += count as f64;
        if background_weight == 0.0 {
            continue;
        }
        let foreground_weight = total - background_weight;
        if foreground_weight == 0.0 {
            break;
        }

        background_sum += value as f64 * count as f64;
        let background_mean = background_sum / background_weight;
        let foreground_mean = (weighted_sum - background_sum) / foreground_weight;

        let variance =
            background_weight * foreground_weight * (background_mean - foreground_mean).powi(2);
        if variance > best_variance {
            best_variance = variance;
            threshold = value as u8;
        }
    }

    threshold
}

fn binarize(image: &GrayImage, threshold: u8) -> GrayImage {
    let mut result = GrayImage::new(image.width(), image.height());
    for (x, y, pixel) in image.enumerate_pixels() {
        let value = if pixel[0] > threshold { 255 } else { 0 };
        result.put_pixel(x, y, Luma([value]));
    }
    result
}

fn median_filter(image: &GrayImage, radius: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut result = GrayImage::new(width, height);
    let mut window = Vec::with_capacity(((2 * radius + 1) * (2 * radius + 1)) as usize);

    for y in 0..height {
        for x in 0..width {
            window.clear();

            let y_start = y.saturating_sub(radius);
            let y_end = (y + radius + 1).min(height);
            let x_start = x.saturating_sub(radius);
            let x_end = (x + radius + 1).min(width);

            for wy in y_start..y_end {
                for wx in x_start..x_end {
                    window.push(image.get_pixel(wx, wy)[0]);
                }
            }

            window.sort_unstable();
            result.put_pixel(x, y, Luma([window[window.len() / 2]]));
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bimodal_image() -> GrayImage {
        // left half dark, right half bright
        GrayImage::from_fn(16, 8, |x, _| if x < 8 { Luma([40]) } else { Luma([210]) })
    }

    #[test]
    fn test_otsu_separates_modes() {
        let threshold = otsu_threshold(&bimodal_image());
        assert!((40..210).contains(&threshold));
    }

    #[test]
    fn test_binarize_output_is_binary() {
        let gray = bimodal_image();
        let binary = binarize(&gray, otsu_threshold(&gray));
        assert!(binary.pixels().all(|p| p[0] == 0 || p[0] == 255));
        assert_eq!(binary.get_pixel(0, 0)[0], 0);
        assert_eq!(binary.get_pixel(15, 0)[0], 255);
    }

    #[test]
    fn test_median_removes_isolated_noise() {
        let mut image = GrayImage::from_pixel(9, 9, Luma([255]));
        image.put_pixel(4, 4, Luma([0]));

        let smoothed = median_filter(&image, 1);
        assert_eq!(smoothed.get_pixel(4, 4)[0], 255);
    }

    #[test]
    fn test_prepare_yields_luma() {
        let image = DynamicImage::ImageLuma8(bimodal_image());
        let prepared = ImagePreprocessor::new().prepare(&image);
        assert!(prepared.as_luma8().is_some());
    }
}
