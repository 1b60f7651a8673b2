use std::fmt;

use thiserror::Error;

use crate::modules::ModuleName;

#[derive(Error, Debug)]
pub enum SemanticsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported file extension '{extension}'. Available modules: {available}")]
    UnsupportedExtension {
        extension: String,
        available: ModuleList,
    },

    #[error("{}", unavailable_message(.module, .available, .suggestion))]
    ModuleUnavailable {
        module: ModuleName,
        available: ModuleList,
        suggestion: Option<String>,
    },

    #[error("Missing option '{0}'. An output folder is required when processing a file")]
    MissingRequiredOption(String),

    #[error("At least one operation required for the {module} module: {flags}")]
    NoOperationSelected { module: ModuleName, flags: String },

    #[error("Could not execute module '{module}': {source}")]
    DelegationFailure {
        module: ModuleName,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Rendered usage error from the argument parser
    #[error("{0}")]
    InvalidArguments(String),

    #[error("Interrupted")]
    Interrupted,
}

impl SemanticsError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            SemanticsError::Interrupted => 130,
            SemanticsError::InvalidArguments(_) => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, SemanticsError>;

/// Module names rendered for diagnostics, `none` when empty
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleList(pub Vec<ModuleName>);

impl FromIterator<ModuleName> for ModuleList {
    fn from_iter<I: IntoIterator<Item = ModuleName>>(names: I) -> Self {
        Self(names.into_iter().collect())
    }
}

impl fmt::Display for ModuleList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "none");
        }
        let names: Vec<&str> = self.0.iter().map(|m| m.as_str()).collect();
        write!(f, "{}", names.join(", "))
    }
}

fn unavailable_message(
    module: &ModuleName,
    available: &ModuleList,
    suggestion: &Option<String>,
) -> String {
    let mut message = format!(
        "The '{}' module is not available in this installation. Available modules: {}",
        module, available
    );
    if let Some(command) = suggestion {
        message.push_str(&format!("\nTry instead:\n  {}", command));
    }
    message
}
