//! Line and word segmentation
//!
//! Both segmenters work the same way: dilate the ink mask with a rectangular
//! structuring element, take the outermost contours of the merged blobs and
//! keep the bounding boxes that are large enough to be text.
//!
//! - Lines use a wide, thin element so words on a row fuse together.
//! - Words use a small square element so letters fuse but words stay apart.

use image::imageops;
use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::geometry::min_area_rect;
use imageproc::morphology::{grayscale_dilate, Mask};
use imageproc::point::Point;
use serde::Serialize;
use tracing::debug;

use super::preprocess::{PreparedImage, INK};
use crate::config::SegmentationSettings;

/// Axis-aligned box in pixel coordinates, origin top-left
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest box containing every point (inclusive pixel extents)
    pub fn enclosing(points: &[Point<i32>]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self {
            x: min_x.max(0) as u32,
            y: min_y.max(0) as u32,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        })
    }

    /// Right edge (exclusive)
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Midpoint of the bottom edge, used as the baseline sample
    pub fn bottom_center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64,
        )
    }
}

/// A word region with its estimated slant (degrees), when one was measurable
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WordBox {
    #[serde(flatten)]
    pub bounds: BoundingBox,
    pub angle: Option<f64>,
}

impl WordBox {
    pub fn new(bounds: BoundingBox, angle: Option<f64>) -> Self {
        Self { bounds, angle }
    }
}

/// Words sharing a vertical band, ordered left to right
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Line {
    pub words: Vec<WordBox>,
}

impl Line {
    pub fn first(&self) -> Option<&WordBox> {
        self.words.first()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }
}

/// One cropped text line
#[derive(Debug, Clone)]
pub struct LineImage {
    /// Location of the crop in the page
    pub bounds: BoundingBox,
    /// Grayscale pixels of the line
    pub image: GrayImage,
}

/// Largest structuring element side `Mask` accepts
const MAX_KERNEL_SIDE: u32 = 511;

/// Dilate a binary mask with a `kernel_width` x `kernel_height` rectangle
///
/// The anchor sits at the kernel centre, so an even-sized kernel reaches one
/// pixel further to the left/top than to the right/bottom.
pub fn dilate_rect(mask: &GrayImage, kernel_width: u32, kernel_height: u32) -> GrayImage {
    let width = kernel_width.clamp(1, MAX_KERNEL_SIDE);
    let height = kernel_height.clamp(1, MAX_KERNEL_SIDE);
    let element = GrayImage::from_pixel(width, height, Luma([INK]));
    let kernel = Mask::from_image(&element, (width / 2) as u8, (height / 2) as u8);
    grayscale_dilate(mask, &kernel)
}

/// Outermost contours of the ink blobs (holes and nested blobs are skipped)
fn external_contours(mask: &GrayImage) -> Vec<Contour<i32>> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .collect()
}

/// Bring an angle into [-90, 90)
fn normalize_half_turn(degrees: f64) -> f64 {
    (degrees + 90.0).rem_euclid(180.0) - 90.0
}

/// Orientation of the long side of the minimum-area rectangle around `points`
///
/// Returns degrees in [-90, 90) in image coordinates (y grows downward).
/// When both sides are equally long the flatter one wins.
pub fn min_rect_angle(points: &[Point<i32>]) -> Option<f64> {
    if points.len() < 3 {
        return None;
    }

    let corners = min_area_rect(points);
    let edge = |a: Point<i32>, b: Point<i32>| {
        let dx = (b.x - a.x) as f64;
        let dy = (b.y - a.y) as f64;
        (dx.hypot(dy), normalize_half_turn(dy.atan2(dx).to_degrees()))
    };
    let (len_a, angle_a) = edge(corners[0], corners[1]);
    let (len_b, angle_b) = edge(corners[1], corners[2]);

    if len_a == 0.0 && len_b == 0.0 {
        return None;
    }

    let angle = if (len_a - len_b).abs() < f64::EPSILON {
        if angle_a.abs() <= angle_b.abs() { angle_a } else { angle_b }
    } else if len_a > len_b {
        angle_a
    } else {
        angle_b
    };
    angle.is_finite().then_some(angle)
}

/// Slant estimate for a word blob
///
/// Tall boxes are measured against the vertical (+90 degrees), so a word or
/// letter leaning right reads positive. Angles at or beyond `max_degrees` are
/// treated as artifacts.
pub fn word_slant(points: &[Point<i32>], bounds: &BoundingBox, max_degrees: f64) -> Option<f64> {
    let mut angle = min_rect_angle(points)?;
    if bounds.width < bounds.height {
        angle = normalize_half_turn(angle + 90.0);
    }
    (angle.abs() < max_degrees).then_some(angle)
}

/// Greedy single-pass grouping of word boxes into lines
///
/// Boxes are visited in (y, x) order. A box opens a new line when its y
/// differs from the current line's reference y (the y of that line's first
/// box) by more than `break_factor` times the *box's own* height. Each line is
/// then ordered by x. This is a fixed heuristic, not a clustering algorithm.
pub fn group_into_lines(mut boxes: Vec<WordBox>, break_factor: f64) -> Vec<Line> {
    boxes.sort_by_key(|b| (b.bounds.y, b.bounds.x));

    let mut lines = Vec::new();
    let mut iter = boxes.into_iter();
    let Some(first) = iter.next() else {
        return lines;
    };

    let mut reference_y = first.bounds.y;
    let mut current = vec![first];

    for word in iter {
        let dy = (word.bounds.y as f64 - reference_y as f64).abs();
        if dy > word.bounds.height as f64 * break_factor {
            lines.push(finish_line(std::mem::take(&mut current)));
            reference_y = word.bounds.y;
        }
        current.push(word);
    }
    lines.push(finish_line(current));

    lines
}

fn finish_line(mut words: Vec<WordBox>) -> Line {
    words.sort_by_key(|w| w.bounds.x);
    Line { words }
}

/// Splits a page into cropped line images
#[derive(Debug, Clone)]
pub struct LineSegmenter {
    settings: SegmentationSettings,
}

impl LineSegmenter {
    pub fn new(settings: SegmentationSettings) -> Self {
        Self { settings }
    }

    /// Bounding boxes of text lines, top to bottom
    pub fn line_regions(&self, mask: &GrayImage) -> Vec<BoundingBox> {
        let dilated = dilate_rect(
            mask,
            self.settings.line_kernel_width,
            self.settings.line_kernel_height,
        );

        let mut regions: Vec<BoundingBox> = external_contours(&dilated)
            .iter()
            .filter_map(|c| BoundingBox::enclosing(&c.points))
            .filter(|b| {
                b.height > self.settings.min_line_height && b.width > self.settings.min_line_width
            })
            .collect();
        regions.sort_by_key(|b| (b.y, b.x));

        debug!("Found {} line regions", regions.len());
        regions
    }

    /// Crop every detected line out of the grayscale page
    pub fn segment(&self, prepared: &PreparedImage) -> Vec<LineImage> {
        self.line_regions(&prepared.mask)
            .into_iter()
            .map(|bounds| LineImage {
                bounds,
                image: imageops::crop_imm(
                    &prepared.gray,
                    bounds.x,
                    bounds.y,
                    bounds.width,
                    bounds.height,
                )
                .to_image(),
            })
            .collect()
    }
}

/// Finds word boxes and groups them into lines
#[derive(Debug, Clone)]
pub struct WordLocator {
    settings: SegmentationSettings,
}

impl WordLocator {
    pub fn new(settings: SegmentationSettings) -> Self {
        Self { settings }
    }

    /// Word boxes large enough to be text, each with its slant if measurable
    pub fn locate(&self, mask: &GrayImage) -> Vec<WordBox> {
        let kernel = self.settings.word_kernel_size;
        let dilated = dilate_rect(mask, kernel, kernel);

        let words: Vec<WordBox> = external_contours(&dilated)
            .iter()
            .filter_map(|contour| {
                let bounds = BoundingBox::enclosing(&contour.points)?;
                if bounds.width <= self.settings.min_word_width
                    || bounds.height <= self.settings.min_word_height
                {
                    return None;
                }
                let angle = word_slant(&contour.points, &bounds, self.settings.max_slant_degrees);
                Some(WordBox::new(bounds, angle))
            })
            .collect();

        debug!(
            "Found {} word boxes ({} with slant)",
            words.len(),
            words.iter().filter(|w| w.angle.is_some()).count()
        );
        words
    }

    /// Word boxes grouped into lines, top to bottom
    pub fn find_lines(&self, mask: &GrayImage) -> Vec<Line> {
        group_into_lines(self.locate(mask), self.settings.line_break_factor)
    }
}
