use std::io::Write;
use std::path::Path;
use std::process::ExitStatus;
use std::sync::Arc;

use clap::error::ErrorKind;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{Result, SemanticsError};
use crate::modules::{MediaModule, ModuleName};
use crate::registry::{Availability, ModuleRegistry};
use crate::routing::RoutingDecision;

/// Runs a routing decision and reports the process exit code
pub struct Dispatcher<'a> {
    registry: &'a ModuleRegistry,
    tool_name: &'a str,
}

impl<'a> Dispatcher<'a> {
    pub fn new(registry: &'a ModuleRegistry, tool_name: &'a str) -> Self {
        Self {
            registry,
            tool_name,
        }
    }

    pub async fn invoke(
        &self,
        decision: &RoutingDecision,
        out: &mut (dyn Write + Send),
    ) -> Result<i32> {
        let availability = self
            .registry
            .get(decision.module)
            .map(|descriptor| &descriptor.availability);

        match availability {
            Some(Availability::InProcess(module)) => {
                self.run_in_process(module.clone(), &decision.forwarded_args, out)
                    .await
            }
            Some(Availability::External(path)) => {
                self.run_external(decision.module, path, &decision.forwarded_args)
                    .await
            }
            Some(Availability::Unavailable(_)) | None => Err(self.unavailable(decision.module)),
        }
    }

    async fn run_in_process(
        &self,
        module: Arc<dyn MediaModule>,
        args: &[String],
        out: &mut (dyn Write + Send),
    ) -> Result<i32> {
        let command = module
            .command()
            .no_binary_name(true)
            .bin_name(format!("{} {}", self.tool_name, module.name()));

        let matches = match command.try_get_matches_from(args) {
            Ok(matches) => matches,
            Err(e) => match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    write!(out, "{}", e.render())?;
                    return Ok(0);
                }
                _ => return Err(SemanticsError::InvalidArguments(e.render().to_string())),
            },
        };

        info!("Running module '{}' in process", module.name());
        tokio::select! {
            result = module.execute(&matches, out) => result.map(|()| 0),
            _ = tokio::signal::ctrl_c() => Err(SemanticsError::Interrupted),
        }
    }

    async fn run_external(
        &self,
        module: ModuleName,
        executable: &Path,
        args: &[String],
    ) -> Result<i32> {
        debug!("Delegating to {} {} {:?}", executable.display(), module, args);

        let spawned = Command::new(executable)
            .arg(module.as_str())
            .args(args)
            .spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Module executable {} disappeared: {}", executable.display(), e);
                return Err(self.unavailable(module));
            }
            Err(e) => return Err(SemanticsError::DelegationFailure { module, source: e }),
        };

        let finished = tokio::select! {
            status = child.wait() => Some(status),
            _ = tokio::signal::ctrl_c() => None,
        };

        match finished {
            Some(status) => {
                let code = exit_code_of(status?);
                debug!("Module '{}' exited with {}", module, code);
                Ok(code)
            }
            None => {
                if let Err(e) = child.kill().await {
                    debug!("Module '{}' already gone after interrupt: {}", module, e);
                }
                Err(SemanticsError::Interrupted)
            }
        }
    }

    fn unavailable(&self, module: ModuleName) -> SemanticsError {
        SemanticsError::ModuleUnavailable {
            module,
            available: self.registry.available().into_iter().collect(),
            suggestion: None,
        }
    }
}

/// Child exit code; 128 + signal number when the child was killed by a signal
fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    #[cfg(feature = "audio")]
    use crate::config::AudioConfig;
    #[cfg(feature = "audio")]
    use crate::modules::audio::AudioModule;
    use crate::registry::ExternalScan;

    fn argv(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|s| s.to_string()).collect()
    }

    #[cfg(feature = "audio")]
    fn audio_registry() -> ModuleRegistry {
        ModuleRegistry::from_bundled(vec![Arc::new(AudioModule::new(AudioConfig::default()))])
    }

    #[cfg(feature = "audio")]
    #[tokio::test]
    async fn test_in_process_success() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.wav");
        std::fs::write(&input, "dummy").unwrap();
        let output = dir.path().join("out");

        let registry = audio_registry();
        let decision = RoutingDecision {
            module: ModuleName::Audio,
            forwarded_args: argv(&[
                input.to_str().unwrap(),
                "-o",
                output.to_str().unwrap(),
                "--transcribe",
            ]),
        };
        let mut out = Vec::new();
        let code = Dispatcher::new(&registry, "semantics")
            .invoke(&decision, &mut out)
            .await
            .unwrap();

        assert_eq!(code, 0);
        assert!(String::from_utf8(out).unwrap().contains("Transcribing audio"));
    }

    #[cfg(feature = "audio")]
    #[tokio::test]
    async fn test_in_process_help_and_usage_errors() {
        let registry = audio_registry();
        let dispatcher = Dispatcher::new(&registry, "semantics");

        let help = RoutingDecision {
            module: ModuleName::Audio,
            forwarded_args: argv(&["--help"]),
        };
        let mut out = Vec::new();
        assert_eq!(dispatcher.invoke(&help, &mut out).await.unwrap(), 0);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("semantics audio"));
        assert!(text.contains("--extract-metadata"));

        let bad = RoutingDecision {
            module: ModuleName::Audio,
            forwarded_args: argv(&["input.wav", "--bogus"]),
        };
        let err = dispatcher.invoke(&bad, &mut Vec::new()).await.unwrap_err();
        assert!(matches!(err, SemanticsError::InvalidArguments(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[cfg(feature = "audio")]
    #[tokio::test]
    async fn test_unavailable_module() {
        let registry = audio_registry();
        let decision = RoutingDecision {
            module: ModuleName::Document,
            forwarded_args: Vec::new(),
        };
        let err = Dispatcher::new(&registry, "semantics")
            .invoke(&decision, &mut Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SemanticsError::ModuleUnavailable {
                module: ModuleName::Document,
                ..
            }
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_external_exit_code_is_propagated() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("semantics-audio");
        std::fs::write(&exe, "#!/bin/sh\nexit 7\n").unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();

        let registry = ModuleRegistry::from_install_dir(&ExternalScan {
            install_dir: dir.path().to_path_buf(),
            tool_name: "semantics".to_string(),
            exe_suffix: String::new(),
            self_name: None,
        });
        let decision = RoutingDecision {
            module: ModuleName::Audio,
            forwarded_args: argv(&["in.wav", "--transcribe"]),
        };
        let code = Dispatcher::new(&registry, "semantics")
            .invoke(&decision, &mut Vec::new())
            .await
            .unwrap();
        assert_eq!(code, 7);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_external_spawn_failures() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("semantics-audio");
        // Not executable
        std::fs::write(&exe, "#!/bin/sh\nexit 0\n").unwrap();

        let registry = ModuleRegistry::from_install_dir(&ExternalScan {
            install_dir: dir.path().to_path_buf(),
            tool_name: "semantics".to_string(),
            exe_suffix: String::new(),
            self_name: None,
        });
        let dispatcher = Dispatcher::new(&registry, "semantics");
        let decision = RoutingDecision {
            module: ModuleName::Audio,
            forwarded_args: Vec::new(),
        };

        let err = dispatcher.invoke(&decision, &mut Vec::new()).await.unwrap_err();
        assert!(matches!(
            err,
            SemanticsError::DelegationFailure {
                module: ModuleName::Audio,
                ..
            }
        ));

        std::fs::remove_file(&exe).unwrap();
        let err = dispatcher.invoke(&decision, &mut Vec::new()).await.unwrap_err();
        assert!(matches!(err, SemanticsError::ModuleUnavailable { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_signal_exit_code() {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(exit_code_of(ExitStatus::from_raw(9)), 137);
        assert_eq!(exit_code_of(ExitStatus::from_raw(3 << 8)), 3);
    }
}
