use std::io::Write;
use std::path::PathBuf;

use async_trait::async_trait;
use clap::{ArgMatches, Args, Command, FromArgMatches};
use tracing::info;

use super::common::ProcessRequest;
use super::{MediaModule, ModuleName, Operation};
use crate::config::DocumentConfig;
use crate::error::{Result, SemanticsError};

#[derive(Args, Debug)]
pub struct DocumentArgs {
    /// Input document or image file
    pub input: PathBuf,

    /// Output folder for results
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Extract text from document
    #[arg(long)]
    pub extract_text: bool,

    /// Output format
    #[arg(short, long, value_parser = ["text", "json"])]
    pub format: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

pub struct DocumentModule {
    config: DocumentConfig,
}

impl DocumentModule {
    pub fn new(config: DocumentConfig) -> Self {
        Self { config }
    }

    async fn extract_text(
        &self,
        request: &ProcessRequest,
        format: &str,
        out: &mut (dyn Write + Send),
    ) -> Result<()> {
        if request.verbose {
            writeln!(out, "[OPTIONS] format={}", format)?;
        }
        request.announce(out, "DOCUMENT", "Extracting text from document")?;
        writeln!(out, "   Format: {}", format)?;
        writeln!(out, "[OK] Text extraction complete")?;
        Ok(())
    }
}

#[async_trait]
impl MediaModule for DocumentModule {
    fn name(&self) -> ModuleName {
        ModuleName::Document
    }

    fn command(&self) -> Command {
        DocumentArgs::augment_args(Command::new(ModuleName::Document.as_str()))
            .about("Process documents and images: text extraction")
            .after_help(
                "Examples:\n  \
                 semantics document document.pdf -o ./output --extract-text\n  \
                 semantics document scan.png -o ./output --extract-text --format json",
            )
    }

    async fn execute(&self, matches: &ArgMatches, out: &mut (dyn Write + Send)) -> Result<()> {
        let args = DocumentArgs::from_arg_matches(matches)
            .map_err(|e| SemanticsError::InvalidArguments(e.to_string()))?;

        let selected: &[Operation] = if args.extract_text {
            &[Operation::ExtractText]
        } else {
            &[]
        };
        let request = ProcessRequest::prepare(
            ModuleName::Document,
            &args.input,
            args.output.as_deref(),
            selected,
            args.verbose,
        )
        .await?;

        let format = args.format.as_deref().unwrap_or(&self.config.format);

        info!("Extracting text from {}", request.input.display());
        self.extract_text(&request, format, out).await
    }
}
