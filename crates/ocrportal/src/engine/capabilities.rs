//! Backend availability, probed once per registry.

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::OnceCell;

/// Result of probing an optional backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Available,
    /// The program ran but rejected the probe arguments. Installed, just a
    /// different version than expected.
    VersionSkew,
    Missing,
    /// Present but failing for another reason.
    Broken(String),
}

impl ProbeOutcome {
    pub fn is_available(&self) -> bool {
        matches!(self, ProbeOutcome::Available | ProbeOutcome::VersionSkew)
    }
}

/// Checks whether a backend can be loaded. Must be free of side effects.
#[async_trait]
pub trait BackendProbe: Send + Sync {
    async fn probe(&self) -> ProbeOutcome;
}

/// Probes an external program by running it with `--version`.
#[derive(Debug, Clone)]
pub struct CommandProbe {
    program: String,
    args: Vec<String>,
}

impl CommandProbe {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[async_trait]
impl BackendProbe for CommandProbe {
    async fn probe(&self) -> ProbeOutcome {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => ProbeOutcome::Available,
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr).to_lowercase();
                let rejected_args = output.status.code() == Some(2)
                    && (stderr.contains("no such option") || stderr.contains("unrecognized"));
                if rejected_args {
                    ProbeOutcome::VersionSkew
                } else {
                    ProbeOutcome::Broken(format!(
                        "'{}' exited with {}",
                        self.program, output.status
                    ))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ProbeOutcome::Missing,
            Err(e) => ProbeOutcome::Broken(e.to_string()),
        }
    }
}

/// A probe with a fixed answer, for deployments that pin availability.
#[derive(Debug, Clone)]
pub struct StaticProbe(pub ProbeOutcome);

#[async_trait]
impl BackendProbe for StaticProbe {
    async fn probe(&self) -> ProbeOutcome {
        self.0.clone()
    }
}

/// Process-wide cache of optional backend availability.
///
/// Built once at startup and shared by the settings resolver and the
/// conversion engine. The first query runs the probe; its outcome (including
/// failures) is kept for the registry's lifetime.
pub struct CapabilityRegistry {
    conversion_probe: Arc<dyn BackendProbe>,
    conversion: OnceCell<ProbeOutcome>,
}

impl CapabilityRegistry {
    pub fn new(conversion_probe: Arc<dyn BackendProbe>) -> Self {
        Self {
            conversion_probe,
            conversion: OnceCell::new(),
        }
    }

    pub async fn conversion_outcome(&self) -> ProbeOutcome {
        self.conversion
            .get_or_init(|| async {
                let outcome = self.conversion_probe.probe().await;
                tracing::info!(outcome = ?outcome, "Probed conversion engine");
                outcome
            })
            .await
            .clone()
    }

    pub async fn conversion_available(&self) -> bool {
        self.conversion_outcome().await.is_available()
    }
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("conversion", &self.conversion.get())
            .finish()
    }
}
