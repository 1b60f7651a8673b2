use std::collections::BTreeSet;

use crate::modules::ModuleName;
use crate::routing::extensions::extensions_for;

const TITLE: &str = "Semantics CLI - Unified interface for media intelligence";
const TAGLINE: &str = "Extract meaning, not just metadata. Composable AI operations designed for developers scaling intelligent workflows";

/// Explicit-subcommand examples per module: (input file, operation flags)
fn module_examples(module: ModuleName) -> &'static [(&'static str, &'static str)] {
    match module {
        ModuleName::Audio => &[
            ("input.wav", "--transcribe"),
            ("input.wav", "--transcribe --extract-metadata"),
        ],
        ModuleName::Video => &[
            ("input.mp4", "--transcribe"),
            ("input.mp4", "--detect-objects"),
        ],
        ModuleName::Document => &[("document.pdf", "--extract-text")],
    }
}

/// Auto-routing example per module
fn auto_route_example(module: ModuleName) -> (&'static str, &'static str) {
    match module {
        ModuleName::Audio => ("input.wav", "--transcribe"),
        ModuleName::Video => ("input.mp4", "--detect-objects"),
        ModuleName::Document => ("document.pdf", "--extract-text"),
    }
}

/// Help text describing only the modules in `available`
pub fn compose(available: &BTreeSet<ModuleName>, tool: &str) -> String {
    let mut lines = vec![TITLE.to_string(), String::new(), TAGLINE.to_string()];

    if available.is_empty() {
        lines.push(String::new());
        lines.push("No modules installed.".to_string());
        return lines.join("\n");
    }

    lines.push(String::new());
    lines.push("Examples:".to_string());
    for module in available {
        for (input, flags) in module_examples(*module) {
            lines.push(format!("  {} {} {} -o ./output {}", tool, module, input, flags));
        }
    }

    lines.push(String::new());
    lines.push("Process files directly with auto-detection based on extension:".to_string());
    for module in available {
        let (input, flags) = auto_route_example(*module);
        lines.push(format!("  {} -i {} -o ./output {}", tool, input, flags));
    }

    lines.push(String::new());
    lines.push("Supported extensions:".to_string());
    for module in available {
        lines.push(format!("  {:<10} {}", module.as_str(), extensions_for(*module).join(" ")));
    }

    lines.push(String::new());
    lines.push(format!(
        "Run '{} <module> --help' for module-specific options.",
        tool
    ));

    lines.join("\n")
}
