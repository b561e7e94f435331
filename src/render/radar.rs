//! Radar (spider) chart drawn with imageproc
//!
//! Axes start at 3 o'clock and run counter-clockwise. The radial scale goes
//! to 1.2 so a full score does not touch the border.
//!
//! The image carries no text, since drawing glyphs would need a bundled font.
//! [`RadarChart::legend`] gives the axis order and ring values to print next
//! to it.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;
use std::f64::consts::TAU;

use super::{ChartData, ChartRenderer};
use crate::error::AnalysisError;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const GRID: Rgb<u8> = Rgb([200, 200, 200]);
const FILL: Rgb<u8> = Rgb([191, 191, 255]);
const OUTLINE: Rgb<u8> = Rgb([0, 0, 255]);

/// Reference rings, innermost first
const RINGS: [(&str, f64); 4] = [("Low", 0.25), ("Mid", 0.5), ("High", 0.75), ("V. High", 1.0)];
/// Radial extent of the plot area in score units
const RADIAL_LIMIT: f64 = 1.2;

/// Square radar chart image
#[derive(Debug, Clone)]
pub struct RadarChart {
    /// Side length in pixels
    pub size: u32,
}

impl Default for RadarChart {
    fn default() -> Self {
        Self { size: 400 }
    }
}

impl RadarChart {
    pub fn new(size: u32) -> Self {
        Self { size }
    }

    fn center(&self) -> (f64, f64) {
        (self.size as f64 / 2.0, self.size as f64 / 2.0)
    }

    /// Pixel radius corresponding to a score
    fn radius_for(&self, value: f64) -> f64 {
        value / RADIAL_LIMIT * (self.size as f64 * 0.45)
    }

    /// Pixel position of `value` on axis `index` of `count`
    pub fn vertex(&self, index: usize, count: usize, value: f64) -> (f64, f64) {
        let (cx, cy) = self.center();
        let angle = TAU * index as f64 / count as f64;
        let r = self.radius_for(value);
        (cx + r * angle.cos(), cy - r * angle.sin())
    }

    /// Text key for the unlabeled image: axis order and ring values
    pub fn legend(&self, data: &ChartData) -> String {
        let axes: Vec<&str> = data.entries().iter().map(|(label, _)| label.as_str()).collect();
        let rings: Vec<String> = RINGS
            .iter()
            .map(|(name, value)| format!("{} {:.2}", name, value))
            .collect();
        format!(
            "Axes (counter-clockwise from 3 o'clock): {}\nRings: {}\n",
            axes.join(", "),
            rings.join(", ")
        )
    }
}

impl ChartRenderer for RadarChart {
    type Output = RgbImage;

    fn render(&self, data: &ChartData) -> Result<RgbImage, AnalysisError> {
        if data.len() < 3 {
            return Err(AnalysisError::Render(format!(
                "radar chart needs at least 3 axes, got {}",
                data.len()
            )));
        }
        if self.size < 16 {
            return Err(AnalysisError::Render(format!(
                "chart size {} is too small",
                self.size
            )));
        }

        let mut canvas = RgbImage::from_pixel(self.size, self.size, BACKGROUND);
        let (cx, cy) = self.center();
        let count = data.len();

        let vertices: Vec<(f64, f64)> = data
            .entries()
            .iter()
            .enumerate()
            .map(|(i, (_, value))| self.vertex(i, count, *value))
            .collect();

        let mut polygon: Vec<Point<i32>> = Vec::with_capacity(count);
        for &(x, y) in &vertices {
            let p = Point::new(x.round() as i32, y.round() as i32);
            if polygon.last() != Some(&p) {
                polygon.push(p);
            }
        }
        while polygon.len() > 1 && polygon.first() == polygon.last() {
            polygon.pop();
        }
        // Collapsed polygons (e.g. every score at zero) only get the outline
        if polygon.len() >= 3 {
            draw_polygon_mut(&mut canvas, &polygon, FILL);
        }

        for (_, ring) in RINGS {
            let r = self.radius_for(ring).round() as i32;
            draw_hollow_circle_mut(&mut canvas, (cx as i32, cy as i32), r, GRID);
        }
        for i in 0..count {
            let (x, y) = self.vertex(i, count, 1.0);
            draw_line_segment_mut(
                &mut canvas,
                (cx as f32, cy as f32),
                (x as f32, y as f32),
                GRID,
            );
        }

        for i in 0..count {
            let (x0, y0) = vertices[i];
            let (x1, y1) = vertices[(i + 1) % count];
            draw_line_segment_mut(
                &mut canvas,
                (x0 as f32, y0 as f32),
                (x1 as f32, y1 as f32),
                OUTLINE,
            );
        }

        Ok(canvas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn six_axes(value: f64) -> ChartData {
        ChartData::new((0..6).map(|i| (format!("t{}", i), value)).collect())
    }

    #[test]
    fn test_vertex_geometry() {
        let chart = RadarChart::new(240);
        // First axis points right
        let (x, y) = chart.vertex(0, 6, 1.2);
        assert!((x - (120.0 + 108.0)).abs() < 1e-9);
        assert!((y - 120.0).abs() < 1e-9);
        // Quarter turn counter-clockwise points up
        let (x, y) = chart.vertex(1, 4, 1.2);
        assert!((x - 120.0).abs() < 1e-9);
        assert!((y - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_render_fills_profile() {
        let chart = RadarChart::new(200);
        let image = chart.render(&six_axes(0.8)).unwrap();

        assert_eq!(image.dimensions(), (200, 200));
        // Inside the polygon, away from grid lines
        assert_eq!(*image.get_pixel(120, 90), FILL);
        // Corner stays background
        assert_eq!(*image.get_pixel(2, 2), BACKGROUND);
    }

    #[test]
    fn test_render_all_zero_does_not_panic() {
        let image = RadarChart::new(100).render(&six_axes(0.0)).unwrap();
        assert_eq!(image.dimensions(), (100, 100));
    }

    #[test]
    fn test_render_rejects_too_few_axes() {
        let data = ChartData::new(vec![("a".to_string(), 0.5), ("b".to_string(), 0.5)]);
        assert!(matches!(RadarChart::default().render(&data), Err(AnalysisError::Render(_))));
    }

    #[test]
    fn test_legend_lists_axes_and_rings() {
        let data = ChartData::new(vec![
            ("Focus".to_string(), 0.5),
            ("Mood".to_string(), 0.2),
            ("Planning".to_string(), 0.9),
        ]);
        let legend = RadarChart::default().legend(&data);
        let rows: Vec<&str> = legend.lines().collect();

        assert_eq!(rows[0], "Axes (counter-clockwise from 3 o'clock): Focus, Mood, Planning");
        assert_eq!(rows[1], "Rings: Low 0.25, Mid 0.50, High 0.75, V. High 1.00");
    }
}
