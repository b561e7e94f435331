//! Profile rendering
//!
//! Renderers consume a plain label -> [0, 1] mapping so they never depend on
//! how the scores were produced.

pub mod bars;
pub mod radar;

pub use bars::TextBarChart;
pub use radar::RadarChart;

use crate::analysis::TraitScores;
use crate::error::AnalysisError;

/// Ordered (label, value) pairs, values within [0, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    entries: Vec<(String, f64)>,
}

impl ChartData {
    /// Values outside [0, 1] (or NaN) are pulled into range
    pub fn new(entries: Vec<(String, f64)>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(label, value)| {
                let value = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
                (label, value)
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[(String, f64)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl From<&TraitScores> for ChartData {
    fn from(scores: &TraitScores) -> Self {
        Self::new(
            scores
                .iter()
                .map(|(t, score)| (t.name().to_string(), score))
                .collect(),
        )
    }
}

/// Draws a chart from trait scores
pub trait ChartRenderer {
    type Output;

    fn render(&self, data: &ChartData) -> Result<Self::Output, AnalysisError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Trait;

    #[test]
    fn test_chart_data_from_scores() {
        let mut scores = TraitScores::default();
        scores.set(Trait::Optimism, 0.8);

        let data = ChartData::from(&scores);

        assert_eq!(data.len(), 6);
        assert_eq!(data.entries()[0].0, "Sociability");
        assert_eq!(data.entries()[3], ("Optimism".to_string(), 0.8));
    }

    #[test]
    fn test_chart_data_clamps() {
        let data = ChartData::new(vec![
            ("a".to_string(), 1.5),
            ("b".to_string(), -0.5),
            ("c".to_string(), f64::NAN),
        ]);
        let values: Vec<f64> = data.entries().iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![1.0, 0.0, 0.0]);
    }
}
