//! Command-line grammar used before clap sees the arguments.
//!
//! The top-level command surface is dynamic: module subcommands exist only
//! when the module is available, and auto-routing forwards arbitrary module
//! flags. Splitting argv here keeps that decision strict and predictable:
//!
//! - scanning is left to right and stops at `--` or at `-i`/`--input`;
//! - the value after a value-taking option is never a subcommand;
//! - the first bare token decides: a known module name is the subcommand,
//!   anything else means there is no subcommand.

use std::collections::BTreeSet;

use crate::modules::{ModuleName, Operation};

/// Options whose next token is their value
pub const VALUE_OPTIONS: &[&str] = &[
    "-i",
    "--input",
    "-o",
    "--output",
    "--config",
    "-l",
    "--language",
    "-m",
    "--model",
    "-c",
    "--confidence",
    "-f",
    "--format",
];

/// How the process was asked to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// `<tool> [globals] <module> ...`; args exclude the module token
    Module { module: ModuleName, args: Vec<String> },
    /// `<tool> -i <path> ...`; args exclude the input option
    AutoRoute { input: String, args: Vec<String> },
    /// Anything else: help, version, or a usage error for clap to report
    TopLevel { args: Vec<String> },
}

impl Invocation {
    pub fn parse(args: &[String]) -> Self {
        if let Some(index) = detect_subcommand(args) {
            if let Ok(module) = args[index].parse::<ModuleName>() {
                let mut forwarded = args[..index].to_vec();
                forwarded.extend_from_slice(&args[index + 1..]);
                return Invocation::Module {
                    module,
                    args: forwarded,
                };
            }
        }

        match split_input(args) {
            Some((input, rest)) => Invocation::AutoRoute { input, args: rest },
            None => Invocation::TopLevel {
                args: args.to_vec(),
            },
        }
    }
}

fn is_input_option(token: &str) -> bool {
    token == "-i" || token == "--input" || token.starts_with("--input=")
}

/// Index of the module subcommand token, if any
pub fn detect_subcommand(args: &[String]) -> Option<usize> {
    let mut skip_value = false;
    for (index, token) in args.iter().enumerate() {
        if skip_value {
            skip_value = false;
            continue;
        }
        if token == "--" || is_input_option(token) {
            return None;
        }
        if token.starts_with('-') && token.len() > 1 {
            skip_value = VALUE_OPTIONS.contains(&token.as_str());
            continue;
        }
        return token.parse::<ModuleName>().ok().map(|_| index);
    }
    None
}

/// Remove the global `--config <path>` option, returning its value
pub fn take_config(args: &mut Vec<String>) -> Option<String> {
    let mut index = 0;
    while index < args.len() {
        if args[index] == "--" {
            break;
        }
        if args[index] == "--config" && index + 1 < args.len() {
            let value = args.remove(index + 1);
            args.remove(index);
            return Some(value);
        }
        if let Some(value) = args[index].strip_prefix("--config=") {
            let value = value.to_string();
            args.remove(index);
            return Some(value);
        }
        index += 1;
    }
    None
}

/// Split `-i <path>` out of the arguments; the rest keep their order
pub fn split_input(args: &[String]) -> Option<(String, Vec<String>)> {
    let mut skip_value = false;
    for (index, token) in args.iter().enumerate() {
        if skip_value {
            skip_value = false;
            continue;
        }
        if token == "--" {
            return None;
        }
        if let Some(value) = token.strip_prefix("--input=") {
            let mut rest = args[..index].to_vec();
            rest.extend_from_slice(&args[index + 1..]);
            return Some((value.to_string(), rest));
        }
        if token == "-i" || token == "--input" {
            let value = args.get(index + 1)?;
            let mut rest = args[..index].to_vec();
            rest.extend_from_slice(&args[index + 2..]);
            return Some((value.clone(), rest));
        }
        skip_value = VALUE_OPTIONS.contains(&token.as_str());
    }
    None
}

/// Operation flags present in module-level arguments
pub fn requested_operations(args: &[String]) -> BTreeSet<Operation> {
    let mut skip_value = false;
    let mut requested = BTreeSet::new();
    for token in args {
        if skip_value {
            skip_value = false;
            continue;
        }
        if token == "--" {
            break;
        }
        if let Some(op) = Operation::from_flag(token) {
            requested.insert(op);
        }
        skip_value = VALUE_OPTIONS.contains(&token.as_str());
    }
    requested
}

/// First positional argument of module-level arguments (the input path)
pub fn first_positional(args: &[String]) -> Option<&str> {
    let mut skip_value = false;
    for token in args {
        if skip_value {
            skip_value = false;
            continue;
        }
        if token.starts_with('-') && token.len() > 1 {
            skip_value = VALUE_OPTIONS.contains(&token.as_str());
            continue;
        }
        return Some(token.as_str());
    }
    None
}

/// Value of `-o`/`--output`, if given
pub fn output_value(args: &[String]) -> Option<&str> {
    let mut iter = args.iter();
    while let Some(token) = iter.next() {
        if token == "-o" || token == "--output" {
            return iter.next().map(|s| s.as_str());
        }
        if let Some(value) = token.strip_prefix("--output=") {
            return Some(value);
        }
    }
    None
}

/// True when `-v`/`--verbose` appears before any `--`
pub fn wants_verbose(args: &[String]) -> bool {
    args.iter()
        .take_while(|token| *token != "--")
        .any(|token| token == "-v" || token == "--verbose")
}
