use std::collections::BTreeSet;
use std::path::PathBuf;

use clap::{Args, Command};

use crate::help;
use crate::modules::ModuleName;

/// Options accepted before any module subcommand
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Input file; the module is chosen from its extension
    #[arg(short, long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Output folder for results (required when processing a file)
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Top-level command: global options plus one subcommand per available module.
///
/// Module invocations and auto-routing are split off before this command is
/// parsed (see `routing::args`); it handles help, version and usage errors.
pub fn build_command(tool: &str, available: &BTreeSet<ModuleName>) -> Command {
    let mut command = GlobalArgs::augment_args(Command::new(tool.to_string()))
        .version(env!("CARGO_PKG_VERSION"))
        .about(help::compose(available, tool));

    for module in available {
        command = command.subcommand(Command::new(module.as_str()).about(module.summary()));
    }
    command
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_is_well_formed() {
        build_command("semantics", &ModuleName::ALL.into_iter().collect()).debug_assert();
        build_command("semantics", &BTreeSet::new()).debug_assert();
    }

    #[test]
    fn test_runtime_tool_name() {
        let tool = format!("{}-dev", "semantics");
        let mut command = build_command(&tool, &BTreeSet::from([ModuleName::Audio]));
        assert_eq!(command.get_name(), "semantics-dev");
        assert!(command.render_help().to_string().contains("semantics-dev -i input.wav"));
    }

    #[test]
    fn test_subcommands_follow_availability() {
        let available = BTreeSet::from([ModuleName::Audio, ModuleName::Document]);
        let command = build_command("semantics", &available);
        let names: Vec<&str> = command.get_subcommands().map(|c| c.get_name()).collect();
        assert_eq!(names, vec!["audio", "document"]);
    }

    #[test]
    fn test_help_lists_modules_and_options() {
        let mut command = build_command("semantics", &ModuleName::ALL.into_iter().collect());
        let help = command.render_help().to_string();
        assert!(help.contains("Unified interface for media intelligence"));
        assert!(help.contains("audio"));
        assert!(help.contains("video"));
        assert!(help.contains("document"));
        assert!(help.contains("--input"));
    }
}
