//! Vision Layer
//!
//! Turns a scanned handwriting page into graphological measurements:
//! - ink mask preparation (`preprocess`)
//! - line crops and word layout (`segmentation`)
//! - the seven scalar features (`features`)
//! - optional line transcription through an external engine (`ocr`)

pub mod features;
pub mod ocr;
pub mod preprocess;
pub mod segmentation;

pub use features::{FeatureExtractor, FeatureVector};
pub use ocr::{transcribe_lines, CommandTranscriber, Transcriber, TranscriptionMode, Transcript};
pub use preprocess::{ImagePreparer, PreparedImage};
pub use segmentation::{BoundingBox, Line, LineImage, LineSegmenter, WordBox, WordLocator};

use image::{DynamicImage, GenericImageView};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

use crate::analysis::{PersonalityScorer, TraitProfile};
use crate::config::AppConfig;
use crate::error::AnalysisError;

/// Everything one analysis run produces
#[derive(Debug)]
pub struct AnalysisResult {
    /// Raw measurements
    pub features: FeatureVector,
    /// Trait scores and descriptions
    pub profile: TraitProfile,
    /// Cropped grayscale lines, top to bottom
    pub line_images: Vec<LineImage>,
    /// Word boxes grouped into lines
    pub word_lines: Vec<Line>,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

impl AnalysisResult {
    pub fn word_count(&self) -> usize {
        self.word_lines.iter().map(Line::len).sum()
    }
}

/// Stateless graphology pipeline
///
/// Every call works on its own buffers, so one pipeline can analyze any
/// number of pages and always returns the same result for the same page.
#[derive(Debug)]
pub struct GraphologyPipeline {
    preparer: ImagePreparer,
    line_segmenter: LineSegmenter,
    word_locator: WordLocator,
    extractor: FeatureExtractor,
    scorer: PersonalityScorer,
}

impl Default for GraphologyPipeline {
    fn default() -> Self {
        Self::new(&AppConfig::default())
    }
}

impl GraphologyPipeline {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            preparer: ImagePreparer::new(config.preprocess.clone()),
            line_segmenter: LineSegmenter::new(config.segmentation.clone()),
            word_locator: WordLocator::new(config.segmentation.clone()),
            extractor: FeatureExtractor::new(),
            scorer: PersonalityScorer::new(&config.scoring),
        }
    }

    /// Decode an image file and analyze it
    pub fn analyze_path(&self, path: &Path) -> Result<AnalysisResult, AnalysisError> {
        let image = image::open(path).map_err(|e| AnalysisError::decode_at(path, e))?;
        info!("Loaded {:?} ({}x{})", path, image.width(), image.height());
        self.analyze(&image)
    }

    /// Run preparation, segmentation, feature extraction and scoring
    pub fn analyze(&self, image: &DynamicImage) -> Result<AnalysisResult, AnalysisError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(AnalysisError::EmptyImage { width, height });
        }

        let start = Instant::now();

        let prepared = self.preparer.prepare(image);
        let line_images = self.line_segmenter.segment(&prepared);
        let word_lines = self.word_locator.find_lines(&prepared.mask);
        let features = self
            .extractor
            .extract(&prepared.gray, &prepared.mask, &word_lines);
        let profile = self.scorer.score(&features);

        let processing_time = start.elapsed();
        debug!(
            "Graphology analysis complete in {:?}: {} line crops, {} word lines",
            processing_time,
            line_images.len(),
            word_lines.len()
        );

        Ok(AnalysisResult {
            features,
            profile,
            line_images,
            word_lines,
            processing_time_ms: processing_time.as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Trait;
    use image::{Rgb, RgbImage};
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    const PAPER: Rgb<u8> = Rgb([240, 240, 240]);
    const INK: Rgb<u8> = Rgb([40, 40, 40]);

    /// Two rows of "words", each word built from thin vertical strokes
    fn handwriting_page() -> DynamicImage {
        let mut page = RgbImage::from_pixel(400, 200, PAPER);
        for &row_y in &[40, 120] {
            for &word_x in &[60, 120, 180] {
                for stroke in 0..5 {
                    let x = word_x + stroke * 6;
                    draw_filled_rect_mut(&mut page, Rect::at(x, row_y).of_size(3, 24), INK);
                }
            }
        }
        DynamicImage::ImageRgb8(page)
    }

    #[test]
    fn test_blank_page() {
        let page = DynamicImage::ImageRgb8(RgbImage::from_pixel(300, 200, PAPER));
        let result = GraphologyPipeline::default().analyze(&page).unwrap();

        assert_eq!(result.features, FeatureVector::default());
        assert!(result.line_images.is_empty());
        assert_eq!(result.word_count(), 0);
        assert!((result.profile.scores.get(Trait::Sociability) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_empty_image_rejected() {
        let page = DynamicImage::ImageRgb8(RgbImage::new(0, 10));
        let result = GraphologyPipeline::default().analyze(&page);
        assert!(matches!(result, Err(AnalysisError::EmptyImage { width: 0, height: 10 })));
    }

    #[test]
    fn test_missing_file_is_decode_error() {
        let result = GraphologyPipeline::default().analyze_path(Path::new("/nonexistent/page.png"));
        assert!(matches!(result, Err(AnalysisError::Decode { .. })));
    }

    #[test]
    fn test_synthetic_page_layout() {
        let result = GraphologyPipeline::default().analyze(&handwriting_page()).unwrap();

        assert_eq!(result.line_images.len(), 2);
        assert_eq!(result.word_lines.len(), 2);
        assert!(result.word_lines.iter().all(|l| l.len() == 3));

        let f = &result.features;
        assert!(f.is_finite());
        assert!(f.pressure > 0.0 && f.pressure < 240.0);
        assert!(f.letter_size > 20.0 && f.letter_size < 40.0);
        assert!(f.word_spacing > 20.0 && f.word_spacing < 40.0);
        assert!(f.left_margin > 50.0 && f.left_margin < 62.0);
        assert!(f.baseline_slope.abs() < 1e-9);
        assert!((f.line_spacing - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_analysis_is_repeatable() {
        let pipeline = GraphologyPipeline::default();
        let page = handwriting_page();

        let first = pipeline.analyze(&page).unwrap();
        let second = pipeline.analyze(&page).unwrap();

        assert_eq!(first.features, second.features);
        assert_eq!(first.profile, second.profile);
        assert_eq!(first.word_lines, second.word_lines);
    }

    #[test]
    fn test_scores_always_bounded() {
        let result = GraphologyPipeline::default().analyze(&handwriting_page()).unwrap();
        for (_, score) in result.profile.scores.iter() {
            assert!((0.1..=1.0).contains(&score));
        }
    }
}
