//! Graphological feature extraction
//!
//! Seven scalar measurements taken from the ink pixels and the word layout.
//! Each statistic is skipped (left at 0) when there is nothing to measure,
//! so a blank page is a valid input rather than an error.

use image::GrayImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::preprocess::INK;
use super::segmentation::Line;

/// The seven handwriting measurements
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Mean grayscale value of ink pixels (0-255, lower = heavier)
    pub pressure: f64,
    /// Median word box height in pixels
    pub letter_size: f64,
    /// Median word slant in degrees
    pub slant: f64,
    /// Median per-line regression slope of word bottom centres
    pub baseline_slope: f64,
    /// Median horizontal gap between neighbouring words in pixels
    pub word_spacing: f64,
    /// Median vertical distance between consecutive line baselines in pixels
    pub line_spacing: f64,
    /// Median x of the first word on each line in pixels
    pub left_margin: f64,
}

impl FeatureVector {
    /// Flat (name, value) view for display
    pub fn entries(&self) -> [(&'static str, f64); 7] {
        [
            ("pressure", self.pressure),
            ("letter_size", self.letter_size),
            ("slant", self.slant),
            ("baseline_slope", self.baseline_slope),
            ("word_spacing", self.word_spacing),
            ("line_spacing", self.line_spacing),
            ("left_margin", self.left_margin),
        ]
    }

    pub fn is_finite(&self) -> bool {
        self.entries().iter().all(|(_, v)| v.is_finite())
    }
}

/// Per-line samples collected while walking the layout
#[derive(Debug, Default)]
struct LayoutSamples {
    left_margins: Vec<f64>,
    word_gaps: Vec<f64>,
    baseline_slopes: Vec<f64>,
    baseline_positions: Vec<f64>,
}

impl LayoutSamples {
    fn collect(lines: &[Line]) -> Self {
        let mut samples = Self::default();

        for line in lines {
            let Some(first) = line.first() else {
                continue;
            };
            samples.left_margins.push(first.bounds.x as f64);

            for pair in line.words.windows(2) {
                let gap = pair[1].bounds.x as i64 - pair[0].bounds.right() as i64;
                if gap > 0 {
                    samples.word_gaps.push(gap as f64);
                }
            }

            if line.len() < 2 {
                continue;
            }
            let (xs, ys): (Vec<f64>, Vec<f64>) =
                line.words.iter().map(|w| w.bounds.bottom_center()).unzip();
            // A line whose bottom centres share one x has no usable slope
            if let Some(slope) = linear_fit_slope(&xs, &ys) {
                samples.baseline_slopes.push(slope);
                if let Some(position) = median(&ys) {
                    samples.baseline_positions.push(position);
                }
            }
        }

        samples
    }
}

/// Computes the feature vector for one page
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Measure pressure, size, slant, spacing, baseline and margin
    pub fn extract(&self, gray: &GrayImage, mask: &GrayImage, lines: &[Line]) -> FeatureVector {
        let mut features = FeatureVector::default();

        if let Some(pressure) = ink_mean(gray, mask) {
            features.pressure = pressure;
        }

        let heights: Vec<f64> = lines
            .iter()
            .flat_map(|l| l.words.iter())
            .map(|w| w.bounds.height as f64)
            .collect();
        if let Some(size) = median(&heights) {
            features.letter_size = size;
        }

        let angles: Vec<f64> = lines
            .iter()
            .flat_map(|l| l.words.iter())
            .filter_map(|w| w.angle)
            .collect();
        if let Some(slant) = median(&angles) {
            features.slant = slant;
        }

        let samples = LayoutSamples::collect(lines);
        if let Some(margin) = median(&samples.left_margins) {
            features.left_margin = margin;
        }
        if let Some(spacing) = median(&samples.word_gaps) {
            features.word_spacing = spacing;
        }
        if let Some(slope) = median(&samples.baseline_slopes) {
            features.baseline_slope = slope;
        }
        let line_gaps: Vec<f64> = samples
            .baseline_positions
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .collect();
        if let Some(spacing) = median(&line_gaps) {
            features.line_spacing = spacing;
        }

        debug!(
            "Features from {} lines, {} words, {} angles: {:?}",
            lines.len(),
            heights.len(),
            angles.len(),
            features
        );
        debug_assert!(features.is_finite(), "non-finite feature: {:?}", features);
        features
    }
}

/// Mean gray value under the ink mask, `None` when there is no ink
pub fn ink_mean(gray: &GrayImage, mask: &GrayImage) -> Option<f64> {
    let (sum, count) = gray
        .pixels()
        .zip(mask.pixels())
        .filter(|(_, m)| m.0[0] == INK)
        .fold((0u64, 0u64), |(sum, count), (g, _)| (sum + g.0[0] as u64, count + 1));

    (count > 0).then(|| sum as f64 / count as f64)
}

/// Median of finite samples; the two middle values are averaged for even counts
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Slope of the least-squares line y = m*x + b
///
/// `None` for fewer than two points or when every x is the same.
pub fn linear_fit_slope(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }

    let mean_x = xs[..n].iter().sum::<f64>() / n as f64;
    let mean_y = ys[..n].iter().sum::<f64>() / n as f64;

    let mut covariance = 0.0;
    let mut variance = 0.0;
    for (x, y) in xs[..n].iter().zip(&ys[..n]) {
        covariance += (x - mean_x) * (y - mean_y);
        variance += (x - mean_x) * (x - mean_x);
    }

    if variance.abs() < 1e-12 {
        return None;
    }
    let slope = covariance / variance;
    slope.is_finite().then_some(slope)
}
