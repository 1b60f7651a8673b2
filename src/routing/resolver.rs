use tracing::{debug, info};

use super::args::{first_positional, output_value, requested_operations};
use super::extensions::{
    available_extensions, compatibility_hint, compatible_module, extension_of, lookup,
};
use crate::error::{ModuleList, Result, SemanticsError};
use crate::modules::ModuleName;
use crate::registry::ModuleRegistry;

/// How the target module was named
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteTarget {
    /// Explicit subcommand
    Module(ModuleName),
    /// Infer from this input path's extension
    Input(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRequest {
    pub target: RouteTarget,
    /// Module-level arguments, excluding the subcommand or `-i <path>`
    pub args: Vec<String>,
}

/// Module chosen for one invocation and the argv handed to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingDecision {
    pub module: ModuleName,
    pub forwarded_args: Vec<String>,
}

pub struct Resolver<'a> {
    registry: &'a ModuleRegistry,
    tool_name: &'a str,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a ModuleRegistry, tool_name: &'a str) -> Self {
        Self {
            registry,
            tool_name,
        }
    }

    pub fn resolve(&self, request: RouteRequest) -> Result<RoutingDecision> {
        let (module, forwarded_args) = match request.target {
            RouteTarget::Module(module) => (module, request.args),
            RouteTarget::Input(input) => {
                let extension = extension_of(&input);
                let module = lookup(&extension).ok_or_else(|| {
                    debug!(
                        "No module for '{}'; routable extensions: {:?}",
                        extension,
                        available_extensions(&self.registry.available()).keys()
                    );
                    SemanticsError::UnsupportedExtension {
                        extension: if extension.is_empty() {
                            "(none)".to_string()
                        } else {
                            extension.clone()
                        },
                        available: self.available_list(),
                    }
                })?;
                debug!("Inferred module '{}' from extension {}", module, extension);

                let mut forwarded = Vec::with_capacity(request.args.len() + 1);
                forwarded.push(input);
                forwarded.extend(request.args);
                (module, forwarded)
            }
        };

        if self.registry.is_available(module) {
            return Ok(RoutingDecision {
                module,
                forwarded_args,
            });
        }

        let input = first_positional(&forwarded_args).map(str::to_string);
        let extension = input.as_deref().map(extension_of).unwrap_or_default();
        let requested = requested_operations(&forwarded_args);
        let available = self.registry.available();

        if let Some(fallback) = compatible_module(&extension, &requested, &available) {
            info!(
                "Module '{}' unavailable; routing {} files to '{}' for {:?}",
                module, extension, fallback, requested
            );
            return Ok(RoutingDecision {
                module: fallback,
                forwarded_args,
            });
        }

        Err(SemanticsError::ModuleUnavailable {
            module,
            available: self.available_list(),
            suggestion: input
                .and_then(|input| self.suggestion(&input, &extension, &forwarded_args)),
        })
    }

    fn available_list(&self) -> ModuleList {
        self.registry.available().into_iter().collect()
    }

    /// Exact command line that would work through a compatibility rule
    fn suggestion(&self, input: &str, extension: &str, args: &[String]) -> Option<String> {
        let rule = compatibility_hint(extension, &self.registry.available())?;
        let flags: Vec<&str> = rule.allowed_operations.iter().map(|op| op.flag()).collect();
        let output = output_value(args).map_or_else(|| "<output>".to_string(), quote_arg);
        Some(format!(
            "{} {} {} -o {} {}",
            self.tool_name,
            rule.eligible_module,
            quote_arg(input),
            output,
            flags.join(" ")
        ))
    }
}

/// Quote an argument so a suggested command line can be pasted into a shell
fn quote_arg(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| !c.is_whitespace() && !"'\"\\$`!*?;&|<>()#~".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', "'\\''"))
    }
}
