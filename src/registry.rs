// Module discovery
//
// The registry is built once at startup and only read afterwards. Two
// strategies fill it, one per build:
// - Bundled: modules compiled into this executable (see modules::bundled)
// - External: sibling `<tool>-<module>` executables next to the launcher
//
// Every known module name always has a descriptor, so callers can tell
// "not installed" apart from "never heard of it".

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::{Config, DiscoveryStrategy};
use crate::modules::{self, MediaModule, ModuleName};

/// Name of the executable that bundles every module behind its own subcommands
pub const FULL_MODULE: &str = "full";

/// Modules a `full` executable provides
pub const FULL_BUNDLE: [ModuleName; 3] = ModuleName::ALL;

/// Where a module lives, if anywhere
#[derive(Clone)]
pub enum Availability {
    InProcess(Arc<dyn MediaModule>),
    External(PathBuf),
    Unavailable(String),
}

impl fmt::Debug for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Availability::InProcess(module) => write!(f, "InProcess({})", module.name()),
            Availability::External(path) => write!(f, "External({})", path.display()),
            Availability::Unavailable(reason) => write!(f, "Unavailable({})", reason),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModuleDescriptor {
    pub name: ModuleName,
    pub availability: Availability,
}

impl ModuleDescriptor {
    pub fn is_available(&self) -> bool {
        !matches!(self.availability, Availability::Unavailable(_))
    }
}

/// Parameters for scanning an install directory for module executables
#[derive(Debug, Clone)]
pub struct ExternalScan {
    pub install_dir: PathBuf,
    /// Executable prefix, e.g. `semantics` for `semantics-audio`
    pub tool_name: String,
    /// Platform executable suffix, e.g. `.exe` on Windows
    pub exe_suffix: String,
    /// File name of the running executable, never reported as a module
    pub self_name: Option<String>,
}

impl ExternalScan {
    /// Scan parameters for the running executable
    pub fn for_current_exe(config: &Config) -> Self {
        let current_exe = std::env::current_exe().ok();
        let install_dir = config
            .discovery
            .install_dir
            .clone()
            .or_else(|| current_exe.as_deref().and_then(Path::parent).map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        let self_name = current_exe
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().to_string());

        Self {
            install_dir,
            tool_name: config.discovery.tool_name.clone(),
            exe_suffix: std::env::consts::EXE_SUFFIX.to_string(),
            self_name,
        }
    }

    /// Module name encoded in an executable file name, if it follows `<tool>-<module>[suffix]`
    fn module_name<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        if self.self_name.as_deref() == Some(file_name) {
            return None;
        }
        let rest = file_name.strip_prefix(&self.tool_name)?.strip_prefix('-')?;
        let name = if self.exe_suffix.is_empty() {
            rest
        } else {
            rest.strip_suffix(self.exe_suffix.as_str()).unwrap_or(rest)
        };
        (!name.is_empty()).then_some(name)
    }

    /// Raw `<module> -> executable` entries found in the install directory
    pub fn scan(&self) -> BTreeMap<String, PathBuf> {
        let mut found = BTreeMap::new();

        let entries = WalkDir::new(&self.install_dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!("Skipping unreadable entry in {}: {}", self.install_dir.display(), e);
                    None
                }
            });

        for entry in entries {
            if !entry.file_type().is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy();
            if let Some(name) = self.module_name(&file_name) {
                debug!("Found module executable {}", entry.path().display());
                found.insert(name.to_string(), entry.path().to_path_buf());
            }
        }

        found
    }
}

/// Replace a discovered `full` executable with one entry per bundled module.
///
/// Direct entries win over the ones derived from `full`, and `full` itself is
/// never exposed.
pub fn expand_full(mut discovered: BTreeMap<String, PathBuf>) -> BTreeMap<String, PathBuf> {
    if let Some(full) = discovered.remove(FULL_MODULE) {
        for module in FULL_BUNDLE {
            discovered
                .entry(module.as_str().to_string())
                .or_insert_with(|| full.clone());
        }
    }
    discovered
}

pub struct ModuleRegistry {
    strategy: DiscoveryStrategy,
    descriptors: BTreeMap<ModuleName, ModuleDescriptor>,
}

impl ModuleRegistry {
    /// Discover modules with the strategy configured for this build
    pub fn discover(config: &Config) -> Self {
        let mut registry = match config.discovery.effective_strategy() {
            DiscoveryStrategy::Bundled => Self::from_bundled(modules::bundled(config)),
            DiscoveryStrategy::External => {
                Self::from_install_dir(&ExternalScan::for_current_exe(config))
            }
        };
        for module in &config.discovery.disabled {
            registry.mark_unavailable(*module, "disabled in configuration");
        }

        info!(
            "Discovered modules ({:?}): available [{}]",
            registry.strategy,
            registry
                .available()
                .iter()
                .map(|m| m.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        registry
    }

    /// Registry of in-process modules.
    ///
    /// A module failing its availability check is recorded as unavailable, not fatal.
    pub fn from_bundled(bundled: Vec<Arc<dyn MediaModule>>) -> Self {
        let mut descriptors = Self::unavailable_by_default("not included in this build");

        for module in bundled {
            let name = module.name();
            let availability = match module.check_availability() {
                Ok(()) => Availability::InProcess(module),
                Err(e) => {
                    warn!("Module '{}' failed to load: {}", name, e);
                    Availability::Unavailable(format!("failed to load: {}", e))
                }
            };
            descriptors.insert(name, ModuleDescriptor { name, availability });
        }

        Self {
            strategy: DiscoveryStrategy::Bundled,
            descriptors,
        }
    }

    /// Registry of sibling module executables
    pub fn from_install_dir(scan: &ExternalScan) -> Self {
        let mut descriptors = Self::unavailable_by_default(&format!(
            "no {}-<module> executable in {}",
            scan.tool_name,
            scan.install_dir.display()
        ));

        for (name, path) in expand_full(scan.scan()) {
            match name.parse::<ModuleName>() {
                Ok(module) => {
                    descriptors.insert(
                        module,
                        ModuleDescriptor {
                            name: module,
                            availability: Availability::External(path),
                        },
                    );
                }
                Err(_) => debug!("Ignoring unknown module executable {}", path.display()),
            }
        }

        Self {
            strategy: DiscoveryStrategy::External,
            descriptors,
        }
    }

    fn unavailable_by_default(reason: &str) -> BTreeMap<ModuleName, ModuleDescriptor> {
        ModuleName::ALL
            .into_iter()
            .map(|name| {
                (
                    name,
                    ModuleDescriptor {
                        name,
                        availability: Availability::Unavailable(reason.to_string()),
                    },
                )
            })
            .collect()
    }

    fn mark_unavailable(&mut self, name: ModuleName, reason: &str) {
        self.descriptors.insert(
            name,
            ModuleDescriptor {
                name,
                availability: Availability::Unavailable(reason.to_string()),
            },
        );
    }

    pub fn strategy(&self) -> DiscoveryStrategy {
        self.strategy
    }

    pub fn get(&self, name: ModuleName) -> Option<&ModuleDescriptor> {
        self.descriptors.get(&name)
    }

    pub fn is_available(&self, name: ModuleName) -> bool {
        self.get(name).is_some_and(ModuleDescriptor::is_available)
    }

    pub fn available(&self) -> BTreeSet<ModuleName> {
        self.descriptors
            .values()
            .filter(|d| d.is_available())
            .map(|d| d.name)
            .collect()
    }

    /// Unavailable modules with the reason recorded at discovery
    pub fn unavailable(&self) -> Vec<(ModuleName, &str)> {
        self.descriptors
            .values()
            .filter_map(|d| match &d.availability {
                Availability::Unavailable(reason) => Some((d.name, reason.as_str())),
                _ => None,
            })
            .collect()
    }
}
