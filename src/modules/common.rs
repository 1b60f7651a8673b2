use std::io::Write;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use super::{ModuleName, Operation};
use crate::error::{Result, SemanticsError};

/// A validated request shared by all operations of one invocation
#[derive(Debug, Clone)]
pub struct ProcessRequest {
    pub module: ModuleName,
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub operations: Vec<Operation>,
    pub verbose: bool,
}

impl ProcessRequest {
    /// Validate the common arguments and create the output folder.
    ///
    /// Checks run in a fixed order: output option, input file, operations.
    /// `selected` may be in any order; operations run in the module's order.
    pub async fn prepare(
        module: ModuleName,
        input: &Path,
        output: Option<&Path>,
        selected: &[Operation],
        verbose: bool,
    ) -> Result<Self> {
        let output_dir = output
            .ok_or_else(|| SemanticsError::MissingRequiredOption("--output".to_string()))?
            .to_path_buf();

        if !input.is_file() {
            return Err(SemanticsError::FileNotFound(input.display().to_string()));
        }

        let operations: Vec<Operation> = module
            .operations()
            .iter()
            .copied()
            .filter(|op| selected.contains(op))
            .collect();
        if operations.is_empty() {
            return Err(SemanticsError::NoOperationSelected {
                module,
                flags: module.operation_flags(),
            });
        }

        fs::create_dir_all(&output_dir).await?;
        debug!(
            "Prepared {} request for {} -> {}",
            module,
            input.display(),
            output_dir.display()
        );

        Ok(Self {
            module,
            input: input.to_path_buf(),
            output_dir,
            operations,
            verbose,
        })
    }

    /// File name of the input for progress lines
    pub fn input_name(&self) -> String {
        self.input
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.input.display().to_string())
    }

    /// Print the standard progress header for one operation
    pub fn announce(&self, out: &mut (dyn Write + Send), tag: &str, action: &str) -> Result<()> {
        writeln!(out, "[{}] {}: {}", tag, action, self.input_name())?;
        writeln!(out, "   Output folder: {}", self.output_dir.display())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_prepare_requires_output_first() {
        let err = ProcessRequest::prepare(
            ModuleName::Audio,
            Path::new("does-not-exist.wav"),
            None,
            &[],
            false,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SemanticsError::MissingRequiredOption(ref opt) if opt == "--output"));
    }

    #[tokio::test]
    async fn test_prepare_rejects_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProcessRequest::prepare(
            ModuleName::Audio,
            &dir.path().join("missing.wav"),
            Some(dir.path().join("out").as_path()),
            &[Operation::Transcribe],
            false,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SemanticsError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_prepare_requires_operation() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.mp4");
        std::fs::write(&input, "dummy").unwrap();

        let err = ProcessRequest::prepare(
            ModuleName::Video,
            &input,
            Some(dir.path().join("out").as_path()),
            &[Operation::ExtractText],
            false,
        )
        .await
        .unwrap_err();
        match err {
            SemanticsError::NoOperationSelected { module, flags } => {
                assert_eq!(module, ModuleName::Video);
                assert_eq!(flags, "--transcribe or --detect-objects");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_prepare_orders_operations_and_creates_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("song.wav");
        std::fs::write(&input, "dummy").unwrap();
        let output = dir.path().join("nested").join("out");

        let request = ProcessRequest::prepare(
            ModuleName::Audio,
            &input,
            Some(output.as_path()),
            &[Operation::ExtractMetadata, Operation::Transcribe],
            true,
        )
        .await
        .unwrap();

        assert!(output.is_dir());
        assert_eq!(
            request.operations,
            vec![Operation::Transcribe, Operation::ExtractMetadata]
        );
        assert_eq!(request.input_name(), "song.wav");
    }
}
