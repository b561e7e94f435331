//! Application Configuration
//!
//! Pipeline tuning and scoring thresholds stored in TOML format.
//! Every section is optional in the file; missing values fall back to defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Grayscale / mask preparation settings
    pub preprocess: PreprocessSettings,
    /// Line and word segmentation settings
    pub segmentation: SegmentationSettings,
    /// Rule thresholds for the trait profile
    pub scoring: ScoringThresholds,
    /// External transcription programs
    pub transcription: TranscriptionSettings,
    /// Report output settings
    pub output: OutputSettings,
}

/// Settings for the ink mask
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessSettings {
    /// Gaussian blur kernel size (odd, pixels)
    pub blur_kernel: u32,
    /// Adaptive threshold neighbourhood size (odd, pixels)
    pub threshold_block_size: u32,
    /// Constant subtracted from the local mean before comparison
    pub threshold_offset: f32,
}

impl Default for PreprocessSettings {
    fn default() -> Self {
        Self {
            blur_kernel: 5,
            threshold_block_size: 11,
            threshold_offset: 2.0,
        }
    }
}

/// Settings for line and word segmentation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationSettings {
    /// Width of the horizontal element that merges words into lines
    pub line_kernel_width: u32,
    /// Height of the horizontal element that merges words into lines
    pub line_kernel_height: u32,
    /// Line regions must be strictly taller than this
    pub min_line_height: u32,
    /// Line regions must be strictly wider than this
    pub min_line_width: u32,
    /// Side of the square element that merges letters into words
    pub word_kernel_size: u32,
    /// Word boxes must be strictly wider than this
    pub min_word_width: u32,
    /// Word boxes must be strictly taller than this
    pub min_word_height: u32,
    /// A box starts a new line when its y differs from the line's by more than
    /// this times its own height
    pub line_break_factor: f64,
    /// Word angles with an absolute value at or above this are discarded
    pub max_slant_degrees: f64,
}

impl Default for SegmentationSettings {
    fn default() -> Self {
        Self {
            line_kernel_width: 40,
            line_kernel_height: 1,
            min_line_height: 10,
            min_line_width: 50,
            word_kernel_size: 5,
            min_word_width: 10,
            min_word_height: 10,
            line_break_factor: 0.7,
            max_slant_degrees: 45.0,
        }
    }
}

/// Thresholds used by the personality rules
///
/// None of these are calibrated against ground truth (or DPI); they are
/// kept configurable so they can be tuned per scanner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringThresholds {
    /// Slant beyond +/- this (degrees) counts as right/left leaning
    pub slant_threshold: f64,
    /// Word spacing below this fraction of letter size counts as narrow
    pub narrow_spacing_ratio: f64,
    /// Letter size above this (pixels) counts as large
    pub large_letter_size: f64,
    /// Letter size below this (pixels) counts as small
    pub small_letter_size: f64,
    /// Mean ink intensity below this counts as heavy pressure
    pub heavy_pressure: f64,
    /// Mean ink intensity above this counts as light pressure
    pub light_pressure: f64,
    /// Baseline slope within +/- this counts as straight
    pub baseline_tolerance: f64,
    /// Left margin above this (pixels) counts as wide
    pub wide_margin: f64,
    /// Left margin below this (pixels) counts as narrow
    pub narrow_margin: f64,
}

impl Default for ScoringThresholds {
    fn default() -> Self {
        Self {
            slant_threshold: 5.0,
            narrow_spacing_ratio: 0.5,
            large_letter_size: 50.0,
            small_letter_size: 25.0,
            heavy_pressure: 120.0,
            light_pressure: 180.0,
            baseline_tolerance: 0.05,
            wide_margin: 40.0,
            narrow_margin: 20.0,
        }
    }
}

/// External programs used to transcribe line crops
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Program used for print / clear handwriting
    pub print_command: Option<String>,
    /// Program used for cursive handwriting
    pub cursive_command: Option<String>,
    /// Arguments passed to the program; `{image}` is replaced by the line image path
    pub args: Vec<String>,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            print_command: None,
            cursive_command: None,
            args: vec![
                "{image}".to_string(),
                "stdout".to_string(),
                "--psm".to_string(),
                "7".to_string(),
            ],
        }
    }
}

/// Report output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Side length of the radar chart image in pixels
    pub chart_size: u32,
    /// Width of the text bar chart in characters
    pub bar_width: usize,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            chart_size: 400,
            bar_width: 30,
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {:?}", path))?;
    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config {:?}", path))?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config {:?}", path))?;
    Ok(())
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "inksight", "InkSight")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    Ok(proj_dirs.config_dir().to_path_buf())
}

/// Default location of the configuration file
pub fn default_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.toml"))
}
