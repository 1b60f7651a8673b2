use std::io::Write;
use std::path::PathBuf;

use async_trait::async_trait;
use clap::{ArgMatches, Args, Command, FromArgMatches};
use tracing::info;

use super::common::ProcessRequest;
use super::{MediaModule, ModuleName, Operation};
use crate::config::AudioConfig;
use crate::error::{Result, SemanticsError};

const MODELS: [&str; 5] = ["tiny", "base", "small", "medium", "large"];

#[derive(Args, Debug)]
pub struct AudioArgs {
    /// Input audio file
    pub input: PathBuf,

    /// Output folder for results
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Transcribe audio to text
    #[arg(long)]
    pub transcribe: bool,

    /// Extract audio metadata
    #[arg(long)]
    pub extract_metadata: bool,

    /// Language code for transcription
    #[arg(short, long)]
    pub language: Option<String>,

    /// Model size for transcription
    #[arg(short, long, value_parser = MODELS)]
    pub model: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Operations of the audio module, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AudioOperation {
    Transcribe,
    ExtractMetadata,
}

impl From<AudioOperation> for Operation {
    fn from(operation: AudioOperation) -> Self {
        match operation {
            AudioOperation::Transcribe => Operation::Transcribe,
            AudioOperation::ExtractMetadata => Operation::ExtractMetadata,
        }
    }
}

impl AudioArgs {
    fn selected(&self) -> Vec<AudioOperation> {
        let mut selected = Vec::new();
        if self.transcribe {
            selected.push(AudioOperation::Transcribe);
        }
        if self.extract_metadata {
            selected.push(AudioOperation::ExtractMetadata);
        }
        selected
    }
}

pub struct AudioModule {
    config: AudioConfig,
}

impl AudioModule {
    pub fn new(config: AudioConfig) -> Self {
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
        request.announce(out, "AUDIO", "Transcribing audio")?;
        writeln!(out, "[OK] Transcription complete")?;
        Ok(())
    }

    async fn extract_metadata(
        &self,
        request: &ProcessRequest,
        out: &mut (dyn Write + Send),
    ) -> Result<()> {
        if request.verbose {
            writeln!(out, "[OPTIONS] Extracting metadata with verbose output")?;
        }
        request.announce(out, "METADATA", "Extracting metadata from")?;
        writeln!(out, "[OK] Metadata extraction complete")?;
        Ok(())
    }
}

#[async_trait]
impl MediaModule for AudioModule {
    fn name(&self) -> ModuleName {
        ModuleName::Audio
    }

    fn command(&self) -> Command {
        AudioArgs::augment_args(Command::new(ModuleName::Audio.as_str()))
            .about("Process audio files: transcription and metadata extraction")
            .after_help(
                "Examples:\n  \
                 semantics audio input.wav -o ./output --transcribe\n  \
                 semantics audio input.wav -o ./output --transcribe --extract-metadata\n  \
                 semantics audio input.wav -o ./output --transcribe -l es -m small",
            )
    }

    async fn execute(&self, matches: &ArgMatches, out: &mut (dyn Write + Send)) -> Result<()> {
        let args = AudioArgs::from_arg_matches(matches)
            .map_err(|e| SemanticsError::InvalidArguments(e.to_string()))?;

        let selected = args.selected();
        let operations: Vec<Operation> = selected.iter().copied().map(Operation::from).collect();
        let request = ProcessRequest::prepare(
            ModuleName::Audio,
            &args.input,
            args.output.as_deref(),
            &operations,
            args.verbose,
        )
        .await?;

        let language = args.language.as_deref().unwrap_or(&self.config.language);
        let model = args.model.as_deref().unwrap_or(&self.config.model);

        info!(
            "Running audio operations {:?} on {}",
            request.operations,
            request.input.display()
        );
        for operation in selected {
            match operation {
                AudioOperation::Transcribe => {
                    self.transcribe(&request, language, model, out).await?
                }
                AudioOperation::ExtractMetadata => self.extract_metadata(&request, out).await?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selected_operations_cover_module_order() {
        let matches = AudioArgs::augment_args(Command::new("audio"))
            .no_binary_name(true)
            .try_get_matches_from(["in", "--extract-metadata", "--transcribe"])
            .unwrap();
        let args = AudioArgs::from_arg_matches(&matches).unwrap();

        let operations: Vec<Operation> = args.selected().into_iter().map(Operation::from).collect();
        assert_eq!(operations, ModuleName::Audio.operations());
        assert_eq!(args.selected()[0], AudioOperation::Transcribe);
    }

    fn run_args(args: &[&str]) -> ArgMatches {
        AudioModule::new(AudioConfig::default())
            .command()
            .no_binary_name(true)
            .try_get_matches_from(args)
            .unwrap()
    }

    #[tokio::test]
    async fn test_chained_operations_run_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.wav");
        std::fs::write(&input, "dummy audio").unwrap();
        let output = dir.path().join("output");

        let matches = run_args(&[
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--extract-metadata",
            "--transcribe",
        ]);
        let mut out = Vec::new();
        AudioModule::new(AudioConfig::default())
            .execute(&matches, &mut out)
            .await
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        let transcribing = text.find("Transcribing audio: input.wav").unwrap();
        let metadata = text.find("Extracting metadata from: input.wav").unwrap();
        assert!(transcribing < metadata);
        assert!(!text.contains("[OPTIONS]"));
    }

    #[tokio::test]
    async fn test_verbose_reports_config_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.flac");
        std::fs::write(&input, "dummy audio").unwrap();
        let output = dir.path().join("output");

        let config = AudioConfig {
            language: "de".to_string(),
            model: "small".to_string(),
        };
        let matches = run_args(&[
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--transcribe",
            "-v",
        ]);
        let mut out = Vec::new();
        AudioModule::new(config).execute(&matches, &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("[OPTIONS] language=de, model=small"));
    }

    #[test]
    fn test_unknown_model_is_a_usage_error() {
        let result = AudioModule::new(AudioConfig::default())
            .command()
            .no_binary_name(true)
            .try_get_matches_from(["input.wav", "-m", "huge"]);
        assert!(result.is_err());
    }
}
