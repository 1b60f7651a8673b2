// Bundled processing modules
//
// Each module is a clap command plus a set of operation handlers:
// - audio: transcription and metadata extraction
// - video: transcription and object detection
// - document: text extraction
//
// Which modules are compiled in is decided by cargo features. The registry
// only ever sees them through the MediaModule trait.

pub mod common;

#[cfg(feature = "audio")]
pub mod audio;
#[cfg(feature = "document")]
pub mod document;
#[cfg(feature = "video")]
pub mod video;

use std::fmt;
use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use clap::{ArgMatches, Command};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Result;

/// Logical name of a processing module
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleName {
    Audio,
    Video,
    Document,
}

impl ModuleName {
    pub const ALL: [ModuleName; 3] = [ModuleName::Audio, ModuleName::Video, ModuleName::Document];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleName::Audio => "audio",
            ModuleName::Video => "video",
            ModuleName::Document => "document",
        }
    }

    /// One-line summary shown in the top-level command list
    pub fn summary(&self) -> &'static str {
        match self {
            ModuleName::Audio => "Transcribe audio and extract audio metadata",
            ModuleName::Video => "Transcribe video audio and detect objects in frames",
            ModuleName::Document => "Extract text from documents and images",
        }
    }

    /// Operations this module offers, in execution order
    pub fn operations(&self) -> &'static [Operation] {
        match self {
            ModuleName::Audio => &[Operation::Transcribe, Operation::ExtractMetadata],
            ModuleName::Video => &[Operation::Transcribe, Operation::DetectObjects],
            ModuleName::Document => &[Operation::ExtractText],
        }
    }

    /// Operation flags joined for diagnostics, e.g. `--transcribe or --extract-metadata`
    pub fn operation_flags(&self) -> String {
        self.operations()
            .iter()
            .map(|op| op.flag())
            .collect::<Vec<_>>()
            .join(" or ")
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleName {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "audio" => Ok(ModuleName::Audio),
            "video" => Ok(ModuleName::Video),
            "document" => Ok(ModuleName::Document),
            other => Err(format!("unknown module '{}'", other)),
        }
    }
}

/// A flag-selected action within a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operation {
    Transcribe,
    ExtractMetadata,
    DetectObjects,
    ExtractText,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Transcribe,
        Operation::ExtractMetadata,
        Operation::DetectObjects,
        Operation::ExtractText,
    ];

    pub fn flag(&self) -> &'static str {
        match self {
            Operation::Transcribe => "--transcribe",
            Operation::ExtractMetadata => "--extract-metadata",
            Operation::DetectObjects => "--detect-objects",
            Operation::ExtractText => "--extract-text",
        }
    }

    pub fn from_flag(flag: &str) -> Option<Operation> {
        Self::ALL.into_iter().find(|op| op.flag() == flag)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.flag().trim_start_matches("--"))
    }
}

/// A processing module that runs inside the current process
#[async_trait]
pub trait MediaModule: Send + Sync {
    fn name(&self) -> ModuleName;

    /// Command-line definition for `<tool> <module> ...`
    fn command(&self) -> Command;

    /// Check that the module can run in this environment
    fn check_availability(&self) -> Result<()> {
        Ok(())
    }

    /// Run the operations selected in `matches`, writing progress to `out`
    async fn execute(&self, matches: &ArgMatches, out: &mut (dyn Write + Send)) -> Result<()>;
}

/// Modules compiled into this build
#[cfg_attr(
    not(any(feature = "audio", feature = "video", feature = "document")),
    allow(unused_variables)
)]
pub fn bundled(config: &Config) -> Vec<Arc<dyn MediaModule>> {
    #[allow(unused_mut)]
    let mut modules: Vec<Arc<dyn MediaModule>> = Vec::new();

    #[cfg(feature = "audio")]
    modules.push(Arc::new(audio::AudioModule::new(config.audio.clone())));
    #[cfg(feature = "video")]
    modules.push(Arc::new(video::VideoModule::new(config.video.clone())));
    #[cfg(feature = "document")]
    modules.push(Arc::new(document::DocumentModule::new(config.document.clone())));

    modules
}
