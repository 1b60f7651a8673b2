use std::io::Write;
use std::path::PathBuf;

use async_trait::async_trait;
use clap::{ArgMatches, Args, Command, FromArgMatches};
use tracing::info;

use super::common::ProcessRequest;
use super::{MediaModule, ModuleName, Operation};
use crate::config::VideoConfig;
use crate::error::{Result, SemanticsError};

#[derive(Args, Debug)]
pub struct VideoArgs {
    /// Input video file
    pub input: PathBuf,

    /// Output folder for results
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Transcribe video audio to text
    #[arg(long)]
    pub transcribe: bool,

    /// Detect objects in video frames
    #[arg(long)]
    pub detect_objects: bool,

    /// Language code for transcription
    #[arg(short, long)]
    pub language: Option<String>,

    /// Model size
    #[arg(short, long)]
    pub model: Option<String>,

    /// Confidence threshold for object detection (0.0 - 1.0)
    #[arg(short, long, value_parser = parse_confidence)]
    pub confidence: Option<f64>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Operations of the video module, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VideoOperation {
    Transcribe,
    DetectObjects,
}

impl From<VideoOperation> for Operation {
    fn from(operation: VideoOperation) -> Self {
        match operation {
            VideoOperation::Transcribe => Operation::Transcribe,
            VideoOperation::DetectObjects => Operation::DetectObjects,
        }
    }
}

impl VideoArgs {
    fn selected(&self) -> Vec<VideoOperation> {
        let mut selected = Vec::new();
        if self.transcribe {
            selected.push(VideoOperation::Transcribe);
        }
        if self.detect_objects {
            selected.push(VideoOperation::DetectObjects);
        }
        selected
    }
}

fn parse_confidence(value: &str) -> std::result::Result<f64, String> {
    let confidence: f64 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if (0.0..=1.0).contains(&confidence) {
        Ok(confidence)
    } else {
        Err(format!("{} is not in the range 0.0 - 1.0", confidence))
    }
}

pub struct VideoModule {
    config: VideoConfig,
}

impl VideoModule {
    pub fn new(config: VideoConfig) -> Self {
        Self { config }
    }

    async fn transcribe(
        &self,
        request: &ProcessRequest,
        language: &str,
        model: &str,
        out: &mut (dyn Write + Send),
    ) -> Result<()> {
        if request.verbose {
            writeln!(out, "[OPTIONS] language={}, model={}", language, model)?;
        }
        request.announce(out, "VIDEO", "Transcribing video audio")?;
        writeln!(out, "[OK] Video transcription complete")?;
        Ok(())
    }

    async fn detect_objects(
        &self,
        request: &ProcessRequest,
        model: &str,
        confidence: f64,
        out: &mut (dyn Write + Send),
    ) -> Result<()> {
        if request.verbose {
            writeln!(out, "[OPTIONS] model={}, confidence={}", model, confidence)?;
        }
        request.announce(out, "DETECT", "Detecting objects in video")?;
        writeln!(out, "[OK] Object detection complete")?;
        Ok(())
    }
}

#[async_trait]
impl MediaModule for VideoModule {
    fn name(&self) -> ModuleName {
        ModuleName::Video
    }

    fn command(&self) -> Command {
        VideoArgs::augment_args(Command::new(ModuleName::Video.as_str()))
            .about("Process video files: transcription and object detection")
            .after_help(
                "Examples:\n  \
                 semantics video video.mp4 -o ./output --transcribe\n  \
                 semantics video video.mp4 -o ./output --detect-objects\n  \
                 semantics video video.mp4 -o ./output --transcribe --detect-objects -c 0.7",
            )
    }

    async fn execute(&self, matches: &ArgMatches, out: &mut (dyn Write + Send)) -> Result<()> {
        let args = VideoArgs::from_arg_matches(matches)
            .map_err(|e| SemanticsError::InvalidArguments(e.to_string()))?;

        let selected = args.selected();
        let operations: Vec<Operation> = selected.iter().copied().map(Operation::from).collect();
        let request = ProcessRequest::prepare(
            ModuleName::Video,
            &args.input,
            args.output.as_deref(),
            &operations,
            args.verbose,
        )
        .await?;

        let language = args.language.as_deref().unwrap_or(&self.config.language);
        let model = args.model.as_deref().unwrap_or(&self.config.model);
        let confidence = args.confidence.unwrap_or(self.config.confidence);

        info!(
            "Running video operations {:?} on {}",
            request.operations,
            request.input.display()
        );
        for operation in selected {
            match operation {
                VideoOperation::Transcribe => {
                    self.transcribe(&request, language, model, out).await?
                }
                VideoOperation::DetectObjects => {
                    self.detect_objects(&request, model, confidence, out).await?
                }
            }
        }
        Ok(())
    }
}
