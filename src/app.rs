use std::io::Write;

use clap::error::ErrorKind;
use tracing::{debug, info};

use crate::cli;
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::error::{Result, SemanticsError};
use crate::registry::ModuleRegistry;
use crate::routing::{Invocation, Resolver, RouteRequest, RouteTarget};

/// Process-wide context: configuration plus the module registry discovered at startup
pub struct App {
    config: Config,
    registry: ModuleRegistry,
}

impl App {
    /// Run module discovery once and keep the result for the life of the process
    pub fn new(config: Config) -> Self {
        let registry = ModuleRegistry::discover(&config);
        Self { config, registry }
    }

    pub fn with_registry(config: Config, registry: ModuleRegistry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    fn tool_name(&self) -> &str {
        &self.config.discovery.tool_name
    }

    /// Handle one command line (without the program name and `--config`).
    ///
    /// In-process output goes to `out`; delegated modules inherit the real
    /// standard streams. Returns the exit code on success.
    pub async fn run(&self, args: &[String], out: &mut (dyn Write + Send)) -> Result<i32> {
        let request = match Invocation::parse(args) {
            Invocation::Module { module, args } => {
                debug!("Explicit module '{}'", module);
                RouteRequest {
                    target: RouteTarget::Module(module),
                    args,
                }
            }
            Invocation::AutoRoute { input, args } => {
                debug!("Auto-routing {}", input);
                RouteRequest {
                    target: RouteTarget::Input(input),
                    args,
                }
            }
            Invocation::TopLevel { args } => return self.run_top_level(&args, out),
        };

        let decision = Resolver::new(&self.registry, self.tool_name()).resolve(request)?;
        info!("Routing to module '{}'", decision.module);
        Dispatcher::new(&self.registry, self.tool_name())
            .invoke(&decision, out)
            .await
    }

    /// Help, version and usage errors for the top-level command
    fn run_top_level(&self, args: &[String], out: &mut (dyn Write + Send)) -> Result<i32> {
        let mut command = cli::build_command(self.tool_name(), &self.registry.available());
        let argv = std::iter::once(self.tool_name().to_string()).chain(args.iter().cloned());

        match command.try_get_matches_from_mut(argv) {
            Ok(_) => {
                // Nothing to process; show what is available
                write!(out, "{}", command.render_help())?;
                Ok(0)
            }
            Err(e) => match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    write!(out, "{}", e.render())?;
                    Ok(0)
                }
                _ => Err(SemanticsError::InvalidArguments(e.render().to_string())),
            },
        }
    }
}
