//! Plain-text bar chart for terminal reports

use super::{ChartData, ChartRenderer};
use crate::error::AnalysisError;

/// One row per label: name, bar, value
#[derive(Debug, Clone)]
pub struct TextBarChart {
    /// Characters used by a full (1.0) bar
    pub width: usize,
}

impl Default for TextBarChart {
    fn default() -> Self {
        Self { width: 30 }
    }
}

impl ChartRenderer for TextBarChart {
    type Output = String;

    fn render(&self, data: &ChartData) -> Result<String, AnalysisError> {
        let label_width = data
            .entries()
            .iter()
            .map(|(label, _)| label.chars().count())
            .max()
            .unwrap_or(0);

        let mut out = String::new();
        for (label, value) in data.entries() {
            let filled = (value * self.width as f64).round() as usize;
            out.push_str(&format!(
                "{:<lw$} |{}{}| {:.2}\n",
                label,
                "#".repeat(filled),
                " ".repeat(self.width.saturating_sub(filled)),
                value,
                lw = label_width
            ));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_rows() {
        let data = ChartData::new(vec![
            ("Focus".to_string(), 0.5),
            ("Optimism".to_string(), 1.0),
        ]);
        let chart = TextBarChart { width: 10 }.render(&data).unwrap();
        let rows: Vec<&str> = chart.lines().collect();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], "Focus    |#####     | 0.50");
        assert_eq!(rows[1], "Optimism |##########| 1.00");
    }

    #[test]
    fn test_empty_chart() {
        let chart = TextBarChart::default().render(&ChartData::new(vec![])).unwrap();
        assert!(chart.is_empty());
    }
}
