use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, SemanticsError};
use crate::modules::ModuleName;

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "semantics.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub discovery: DiscoveryConfig,
    pub logging: LoggingConfig,
    pub audio: AudioConfig,
    pub video: VideoConfig,
    pub document: DocumentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Program name; also the prefix of external module executables (`<tool>-<module>`)
    pub tool_name: String,
    /// Overrides the discovery strategy this binary was built with
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<DiscoveryStrategy>,
    /// Directory scanned for module executables (defaults to the executable's directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_dir: Option<PathBuf>,
    /// Modules reported as unavailable regardless of what is discovered
    pub disabled: Vec<ModuleName>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryStrategy {
    /// Modules compiled into this executable
    Bundled,
    /// Sibling `<tool>-<module>` executables, invoked as child processes
    External,
}

impl DiscoveryStrategy {
    /// Strategy selected by the cargo features of this build
    pub fn for_build() -> Self {
        if cfg!(feature = "launcher") {
            DiscoveryStrategy::External
        } else {
            DiscoveryStrategy::Bundled
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level when RUST_LOG does not say otherwise
    pub level: String,
    /// Also write logs to a daily rolling file
    pub file: bool,
    /// Directory for log files
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Language code for transcription
    pub language: String,
    /// Transcription model size
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub language: String,
    pub model: String,
    /// Confidence threshold for object detection (0.0 - 1.0)
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Output format for extracted text: text or json
    pub format: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            tool_name: "semantics".to_string(),
            strategy: None,
            install_dir: None,
            disabled: Vec::new(),
        }
    }
}

impl DiscoveryConfig {
    pub fn effective_strategy(&self) -> DiscoveryStrategy {
        self.strategy.unwrap_or_else(DiscoveryStrategy::for_build)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: false,
            directory: PathBuf::from(".semantics").join("log"),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            model: "base".to_string(),
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            model: "base".to_string(),
            confidence: 0.5,
        }
    }
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SemanticsError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| SemanticsError::Config(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SemanticsError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| SemanticsError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Load from an explicit path, else `semantics.toml` in the working directory, else defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(DEFAULT_CONFIG_FILE)
            }
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        let tool = &self.discovery.tool_name;
        if tool.is_empty() || tool.contains(['/', '\\']) {
            return Err(SemanticsError::Config(format!(
                "Invalid tool_name '{}': must be a bare file name",
                tool
            )));
        }
        if !(0.0..=1.0).contains(&self.video.confidence) {
            return Err(SemanticsError::Config(format!(
                "Invalid video confidence {}: must be between 0.0 and 1.0",
                self.video.confidence
            )));
        }
        if !matches!(self.document.format.as_str(), "text" | "json") {
            return Err(SemanticsError::Config(format!(
                "Invalid document format '{}'. Valid formats: text, json",
                self.document.format
            )));
        }
        Ok(())
    }
}
