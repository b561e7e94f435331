//! Line transcription
//!
//! Transcription engines live outside this crate. The pipeline only needs
//! "line image in, text out", expressed by the [`Transcriber`] trait. The
//! bundled [`CommandTranscriber`] hands each line to an external program
//! (Tesseract's CLI by default argument layout).

use image::{GrayImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::config::TranscriptionSettings;
use crate::error::AnalysisError;

/// Which kind of handwriting the transcription engine is tuned for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptionMode {
    /// Print or clear handwriting (fast engine)
    #[default]
    Print,
    /// Cursive or complex handwriting (slower, more accurate engine)
    Cursive,
}

/// Turns one cropped line into text
pub trait Transcriber {
    fn transcribe(&self, line: &GrayImage) -> Result<String, AnalysisError>;
}

/// Text recognized for a page, one entry per non-empty line
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Transcript {
    pub lines: Vec<String>,
}

impl Transcript {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Transcribe lines top to bottom, dropping blank results
pub fn transcribe_lines(
    transcriber: &dyn Transcriber,
    lines: &[GrayImage],
) -> Result<Transcript, AnalysisError> {
    let mut transcript = Transcript::default();

    for (index, line) in lines.iter().enumerate() {
        let text = transcriber.transcribe(line)?;
        let text = text.trim();
        if text.is_empty() {
            debug!("Line {} produced no text", index);
            continue;
        }
        transcript.lines.push(text.to_string());
    }

    Ok(transcript)
}

/// Runs an external OCR program once per line image
#[derive(Debug, Clone)]
pub struct CommandTranscriber {
    program: String,
    args: Vec<String>,
}

impl CommandTranscriber {
    /// `{image}` inside `args` is replaced with the path of the line PNG
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build the transcriber configured for `mode`, if any
    pub fn from_settings(
        settings: &TranscriptionSettings,
        mode: TranscriptionMode,
    ) -> Option<Self> {
        let program = match mode {
            TranscriptionMode::Print => settings.print_command.as_ref(),
            TranscriptionMode::Cursive => settings.cursive_command.as_ref(),
        };
        match program {
            Some(program) => Some(Self::new(program.clone(), settings.args.clone())),
            None => {
                warn!("No transcription command configured for {:?} mode", mode);
                None
            }
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run the program on an already written line image
    fn run_on(&self, image_arg: &str) -> Result<String, AnalysisError> {
        let args: Vec<String> = self
            .args
            .iter()
            .map(|a| a.replace("{image}", image_arg))
            .collect();

        debug!("Running {} {:?}", self.program, args);
        let output = Command::new(&self.program).args(&args).output().map_err(|e| {
            AnalysisError::Transcription(format!("failed to run {}: {}", self.program, e))
        })?;
        if !output.status.success() {
            return Err(AnalysisError::Transcription(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Write `line` as PNG into a fresh temporary file, removed when dropped
fn write_line_file(line: &GrayImage) -> Result<NamedTempFile, AnalysisError> {
    let mut file = tempfile::Builder::new()
        .prefix("inksight-line-")
        .suffix(".png")
        .tempfile()?;
    line.write_to(file.as_file_mut(), ImageFormat::Png).map_err(|e| {
        AnalysisError::Transcription(format!("failed to write line image: {}", e))
    })?;
    file.flush()?;
    Ok(file)
}

impl Transcriber for CommandTranscriber {
    fn transcribe(&self, line: &GrayImage) -> Result<String, AnalysisError> {
        let file = write_line_file(line)?;
        self.run_on(&file.path().to_string_lossy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use std::cell::Cell;
    use std::path::Path;

    /// Returns canned text per call
    struct ScriptedTranscriber {
        outputs: Vec<&'static str>,
        calls: Cell<usize>,
    }

    impl Transcriber for ScriptedTranscriber {
        fn transcribe(&self, _line: &GrayImage) -> Result<String, AnalysisError> {
            let i = self.calls.get();
            self.calls.set(i + 1);
            Ok(self.outputs[i].to_string())
        }
    }

    struct FailingTranscriber;

    impl Transcriber for FailingTranscriber {
        fn transcribe(&self, _line: &GrayImage) -> Result<String, AnalysisError> {
            Err(AnalysisError::Transcription("engine offline".to_string()))
        }
    }

    fn blank_line() -> GrayImage {
        GrayImage::from_pixel(60, 15, Luma([255]))
    }

    #[test]
    fn test_transcribe_lines_skips_blank() {
        let transcriber = ScriptedTranscriber {
            outputs: vec!["  Dear diary \n", "   ", "today was long"],
            calls: Cell::new(0),
        };
        let lines = vec![blank_line(), blank_line(), blank_line()];

        let transcript = transcribe_lines(&transcriber, &lines).unwrap();

        assert_eq!(transcriber.calls.get(), 3);
        assert_eq!(transcript.lines, vec!["Dear diary", "today was long"]);
        assert_eq!(transcript.text(), "Dear diary\ntoday was long");
    }

    #[test]
    fn test_transcribe_lines_propagates_failure() {
        let result = transcribe_lines(&FailingTranscriber, &[blank_line()]);
        assert!(matches!(result, Err(AnalysisError::Transcription(_))));
    }

    #[test]
    fn test_transcribe_no_lines() {
        let transcript = transcribe_lines(&FailingTranscriber, &[]).unwrap();
        assert!(transcript.is_empty());
    }

    #[test]
    fn test_from_settings_by_mode() {
        let settings = TranscriptionSettings {
            print_command: Some("tesseract".to_string()),
            cursive_command: None,
            ..Default::default()
        };

        let print = CommandTranscriber::from_settings(&settings, TranscriptionMode::Print);
        assert_eq!(print.map(|t| t.program().to_string()), Some("tesseract".to_string()));
        assert!(CommandTranscriber::from_settings(&settings, TranscriptionMode::Cursive).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_command_transcriber_runs_program() {
        let transcriber =
            CommandTranscriber::new("echo", vec!["hello".to_string(), "world".to_string()]);
        let text = transcriber.transcribe(&blank_line()).unwrap();
        assert_eq!(text.trim(), "hello world");
    }

    #[test]
    fn test_command_transcriber_missing_program() {
        let transcriber = CommandTranscriber::new("inksight-no-such-ocr-program", vec![]);
        let result = transcriber.transcribe(&blank_line());
        assert!(matches!(result, Err(AnalysisError::Transcription(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_line_file_written_before_run() {
        let transcriber = CommandTranscriber::new(
            "sh",
            vec!["-c".to_string(), "test -s {image} && echo written".to_string()],
        );
        let text = transcriber.transcribe(&blank_line()).unwrap();
        assert_eq!(text.trim(), "written");
    }

    #[cfg(unix)]
    #[test]
    fn test_line_file_removed_after_success() {
        let transcriber = CommandTranscriber::new("echo", vec!["{image}".to_string()]);
        let text = transcriber.transcribe(&blank_line()).unwrap();

        let path = Path::new(text.trim());
        assert!(path.to_string_lossy().ends_with(".png"));
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_line_file_removed_after_failure() {
        let transcriber = CommandTranscriber::new(
            "sh",
            vec!["-c".to_string(), "echo {image} >&2; exit 3".to_string()],
        );
        let message = transcriber.transcribe(&blank_line()).unwrap_err().to_string();

        let path = message.rsplit(": ").next().unwrap();
        assert!(path.ends_with(".png"), "{}", message);
        assert!(!Path::new(path).exists());
    }
}
