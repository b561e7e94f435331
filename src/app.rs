//! Analysis Session
//!
//! Runs the pipeline for one page and turns the result into the report,
//! chart and line files the command line asked for.

use anyhow::{Context, Result};
use serde_json::json;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::analysis::DescriptionMap;
use crate::config::AppConfig;
use crate::render::{ChartData, ChartRenderer, RadarChart, TextBarChart};
use crate::vision::{
    transcribe_lines, AnalysisResult, CommandTranscriber, GraphologyPipeline, TranscriptionMode,
    Transcript,
};

/// What to produce besides the analysis itself
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Print JSON instead of the text report
    pub json: bool,
    /// Save the radar chart here
    pub radar_path: Option<PathBuf>,
    /// Save line crops into this directory
    pub lines_dir: Option<PathBuf>,
    /// Transcribe line crops with the configured engine
    pub transcribe: bool,
    /// Engine selection for transcription
    pub mode: TranscriptionMode,
}

/// One configured analysis run
pub struct AnalysisSession {
    config: AppConfig,
    pipeline: GraphologyPipeline,
    options: SessionOptions,
}

impl AnalysisSession {
    pub fn new(config: AppConfig, options: SessionOptions) -> Self {
        let pipeline = GraphologyPipeline::new(&config);
        Self {
            config,
            pipeline,
            options,
        }
    }

    /// Analyze `image_path` and write the report to `out`
    pub fn run(&self, image_path: &Path, out: &mut impl Write) -> Result<AnalysisResult> {
        let result = self
            .pipeline
            .analyze_path(image_path)
            .with_context(|| format!("Failed to analyze {:?}", image_path))?;
        info!(
            "Found {} lines, {} words in {} ms",
            result.word_lines.len(),
            result.word_count(),
            result.processing_time_ms
        );

        if let Some(dir) = &self.options.lines_dir {
            save_line_images(&result, dir)?;
        }

        if let Some(path) = &self.options.radar_path {
            self.save_radar(&result, path)?;
        }

        let transcript = if self.options.transcribe {
            self.transcribe(&result)?
        } else {
            None
        };

        let report = if self.options.json {
            json_report(&result, transcript.as_ref())?
        } else {
            self.text_report(&result, transcript.as_ref())?
        };
        out.write_all(report.as_bytes())?;

        Ok(result)
    }

    fn save_radar(&self, result: &AnalysisResult, path: &Path) -> Result<()> {
        let chart = RadarChart::new(self.config.output.chart_size)
            .render(&ChartData::from(&result.profile.scores))?;
        chart
            .save(path)
            .with_context(|| format!("Failed to save radar chart {:?}", path))?;
        info!("Saved radar chart to {:?}", path);
        Ok(())
    }

    fn transcribe(&self, result: &AnalysisResult) -> Result<Option<Transcript>> {
        let Some(transcriber) =
            CommandTranscriber::from_settings(&self.config.transcription, self.options.mode)
        else {
            return Ok(None);
        };
        if result.line_images.is_empty() {
            warn!("No text lines to transcribe");
            return Ok(Some(Transcript::default()));
        }

        let lines: Vec<_> = result.line_images.iter().map(|l| l.image.clone()).collect();
        let transcript = transcribe_lines(&transcriber, &lines)
            .with_context(|| format!("Transcription with {} failed", transcriber.program()))?;
        info!("Transcribed {} of {} lines", transcript.lines.len(), lines.len());
        Ok(Some(transcript))
    }

    /// Features, bar chart, then descriptions
    fn text_report(
        &self,
        result: &AnalysisResult,
        transcript: Option<&Transcript>,
    ) -> Result<String> {
        let mut report = String::new();

        report.push_str("Handwriting Features\n");
        for (name, value) in result.features.entries() {
            report.push_str(&format!("  {} = {:.3}\n", name, value));
        }

        report.push_str("\nPersonality Traits\n");
        let bars = TextBarChart {
            width: self.config.output.bar_width,
        }
        .render(&ChartData::from(&result.profile.scores))?;
        report.push_str(&bars);

        report.push_str("\nDescriptive Analysis\n");
        for descriptor in result.profile.descriptions() {
            report.push_str(&format!("  {}\n", descriptor));
        }

        if let Some(path) = &self.options.radar_path {
            report.push_str(&format!("\nRadar Chart ({})\n", path.display()));
            let legend = RadarChart::new(self.config.output.chart_size)
                .legend(&ChartData::from(&result.profile.scores));
            report.push_str(&legend);
        }

        if let Some(transcript) = transcript {
            report.push_str("\nTranscript\n");
            if transcript.is_empty() {
                report.push_str("  (no text recognized)\n");
            }
            for line in &transcript.lines {
                report.push_str(&format!("  {}\n", line));
            }
        }

        Ok(report)
    }
}

/// `{features, scores, descriptions, transcript?}`
fn json_report(result: &AnalysisResult, transcript: Option<&Transcript>) -> Result<String> {
    let mut value = json!({
        "features": result.features,
        "scores": result.profile.scores,
        "descriptions": DescriptionMap(result.profile.descriptions()),
    });
    if let Some(transcript) = transcript {
        value["transcript"] = json!(transcript.text());
    }
    let mut text = serde_json::to_string_pretty(&value)?;
    text.push('\n');
    Ok(text)
}

/// Write each line crop as `line_NNN.png`, top to bottom
fn save_line_images(result: &AnalysisResult, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory {:?}", dir))?;

    for (index, line) in result.line_images.iter().enumerate() {
        let path = dir.join(format!("line_{:03}.png", index));
        line.image
            .save(&path)
            .with_context(|| format!("Failed to save line image {:?}", path))?;
    }
    info!("Saved {} line images to {:?}", result.line_images.len(), dir);
    Ok(())
}
