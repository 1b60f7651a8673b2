//! Static extension → module table and the compatibility matrix.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::modules::{ModuleName, Operation};

/// Primary owner of each supported extension
pub const EXTENSION_TABLE: &[(&str, ModuleName)] = &[
    (".wav", ModuleName::Audio),
    (".mp3", ModuleName::Audio),
    (".flac", ModuleName::Audio),
    (".ogg", ModuleName::Audio),
    (".m4a", ModuleName::Audio),
    (".aac", ModuleName::Audio),
    (".wma", ModuleName::Audio),
    (".mp4", ModuleName::Video),
    (".avi", ModuleName::Video),
    (".mkv", ModuleName::Video),
    (".mov", ModuleName::Video),
    (".wmv", ModuleName::Video),
    (".webm", ModuleName::Video),
    (".flv", ModuleName::Video),
    (".pdf", ModuleName::Document),
    (".png", ModuleName::Document),
    (".jpg", ModuleName::Document),
    (".jpeg", ModuleName::Document),
    (".tiff", ModuleName::Document),
    (".bmp", ModuleName::Document),
    (".gif", ModuleName::Document),
];

/// Permission for a module to handle an extension it does not own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompatibilityRule {
    pub extension: &'static str,
    pub eligible_module: ModuleName,
    pub allowed_operations: &'static [Operation],
}

const AUDIO_FROM_VIDEO: &[Operation] = &[Operation::Transcribe];

/// The audio module can transcribe the audio track of any video container
pub const COMPATIBILITY_RULES: &[CompatibilityRule] = &[
    audio_from_video(".mp4"),
    audio_from_video(".avi"),
    audio_from_video(".mkv"),
    audio_from_video(".mov"),
    audio_from_video(".wmv"),
    audio_from_video(".webm"),
    audio_from_video(".flv"),
];

const fn audio_from_video(extension: &'static str) -> CompatibilityRule {
    CompatibilityRule {
        extension,
        eligible_module: ModuleName::Audio,
        allowed_operations: AUDIO_FROM_VIDEO,
    }
}

impl CompatibilityRule {
    /// True when every requested operation is explicitly allowed
    pub fn permits(&self, requested: &BTreeSet<Operation>) -> bool {
        requested.iter().all(|op| self.allowed_operations.contains(op))
    }
}

/// Lowercase extension with its leading dot, or an empty string
pub fn extension_of<P: AsRef<Path>>(path: P) -> String {
    path.as_ref()
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

pub fn lookup(extension: &str) -> Option<ModuleName> {
    let extension = extension.to_lowercase();
    EXTENSION_TABLE
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, module)| *module)
}

/// Fallback module for an extension whose owner is unavailable.
///
/// Only consulted after the primary lookup; requires at least one requested
/// operation, all of them allowed by the rule, and the fallback available.
pub fn compatible_module(
    extension: &str,
    requested: &BTreeSet<Operation>,
    available: &BTreeSet<ModuleName>,
) -> Option<ModuleName> {
    if requested.is_empty() {
        return None;
    }
    let extension = extension.to_lowercase();
    COMPATIBILITY_RULES
        .iter()
        .filter(|rule| rule.extension == extension)
        .find(|rule| rule.permits(requested) && available.contains(&rule.eligible_module))
        .map(|rule| rule.eligible_module)
}

/// First compatibility rule for the extension whose module is available
pub fn compatibility_hint(
    extension: &str,
    available: &BTreeSet<ModuleName>,
) -> Option<&'static CompatibilityRule> {
    let extension = extension.to_lowercase();
    COMPATIBILITY_RULES
        .iter()
        .find(|rule| rule.extension == extension && available.contains(&rule.eligible_module))
}

/// Extensions owned by one module, in table order
pub fn extensions_for(module: ModuleName) -> Vec<&'static str> {
    EXTENSION_TABLE
        .iter()
        .filter(|(_, owner)| *owner == module)
        .map(|(ext, _)| *ext)
        .collect()
}

/// The extension table restricted to available modules
pub fn available_extensions(
    available: &BTreeSet<ModuleName>,
) -> BTreeMap<&'static str, ModuleName> {
    EXTENSION_TABLE
        .iter()
        .filter(|(_, module)| available.contains(module))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set<T: Ord + Copy>(items: &[T]) -> BTreeSet<T> {
        items.iter().copied().collect()
    }

    #[test]
    fn test_lookup_documented_extensions() {
        let expected = [
            (ModuleName::Audio, [".wav", ".mp3", ".flac", ".ogg", ".m4a", ".aac", ".wma"]),
            (ModuleName::Video, [".mp4", ".avi", ".mkv", ".mov", ".wmv", ".webm", ".flv"]),
            (ModuleName::Document, [".pdf", ".png", ".jpg", ".jpeg", ".tiff", ".bmp", ".gif"]),
        ];
        for (module, extensions) in expected {
            for ext in extensions {
                assert_eq!(lookup(ext), Some(module), "{ext} should map to {module}");
            }
        }
        assert_eq!(EXTENSION_TABLE.len(), 21);
    }

    #[test]
    fn test_lookup_unknown_and_case() {
        assert_eq!(lookup(".xyz"), None);
        assert_eq!(lookup(""), None);
        assert_eq!(lookup("wav"), None);
        assert_eq!(lookup(".WAV"), Some(ModuleName::Audio));
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("/tmp/Movie.MP4"), ".mp4");
        assert_eq!(extension_of("archive.tar.gz"), ".gz");
        assert_eq!(extension_of("README"), "");
    }

    #[test]
    fn test_primary_table_has_no_duplicates() {
        let unique: BTreeSet<_> = EXTENSION_TABLE.iter().map(|(ext, _)| *ext).collect();
        assert_eq!(unique.len(), EXTENSION_TABLE.len());
    }

    #[test]
    fn test_video_transcription_falls_back_to_audio() {
        let audio_only = set(&[ModuleName::Audio]);
        let transcribe = set(&[Operation::Transcribe]);
        for ext in extensions_for(ModuleName::Video) {
            assert_eq!(
                compatible_module(ext, &transcribe, &audio_only),
                Some(ModuleName::Audio)
            );
        }
    }

    #[test]
    fn test_fallback_requires_every_operation_allowed() {
        let audio_only = set(&[ModuleName::Audio]);
        assert_eq!(
            compatible_module(".mp4", &set(&[Operation::DetectObjects]), &audio_only),
            None
        );
        assert_eq!(
            compatible_module(
                ".mp4",
                &set(&[Operation::Transcribe, Operation::DetectObjects]),
                &audio_only
            ),
            None
        );
        assert_eq!(compatible_module(".mp4", &BTreeSet::new(), &audio_only), None);
    }

    #[test]
    fn test_fallback_requires_available_module() {
        let transcribe = set(&[Operation::Transcribe]);
        assert_eq!(compatible_module(".mp4", &transcribe, &set(&[ModuleName::Document])), None);
        assert_eq!(compatible_module(".pdf", &transcribe, &set(&[ModuleName::Audio])), None);
    }

    #[test]
    fn test_available_extensions_filters_by_module() {
        let audio = available_extensions(&set(&[ModuleName::Audio]));
        assert!(audio.contains_key(".wav"));
        assert!(audio.contains_key(".mp3"));
        assert!(!audio.contains_key(".mp4"));
        assert!(!audio.contains_key(".pdf"));

        let all = available_extensions(&set(&ModuleName::ALL));
        assert_eq!(all.len(), EXTENSION_TABLE.len());
    }
}
