//! Administrative rights probe.

use std::process::Command;
use std::time::Duration;

use posture::{run_with_timeout, ElevationProbe};
use tracing::{debug, warn};

use crate::windows_cmd::NET_EXE;

/// `net session` only succeeds for members of the local Administrators
/// group running elevated.
#[derive(Debug, Clone)]
pub struct NetSessionProbe {
    program: String,
    timeout: Duration,
}

impl NetSessionProbe {
    pub fn new(timeout: Duration) -> Self {
        Self {
            program: NET_EXE.to_string(),
            timeout,
        }
    }

    #[cfg(test)]
    fn with_program(program: &str, timeout: Duration) -> Self {
        Self {
            program: program.to_string(),
            timeout,
        }
    }
}

impl ElevationProbe for NetSessionProbe {
    fn is_elevated(&self) -> bool {
        let mut command = Command::new(&self.program);
        command.arg("session");
        match run_with_timeout(&mut command, self.timeout) {
            Ok(Some(output)) => {
                debug!(status = %output.status, "net session finished");
                output.status.success()
            }
            Ok(None) => {
                warn!("net session timed out; assuming no administrative rights");
                false
            }
            Err(err) => {
                warn!(error = %err, "failed to run net session; assuming no administrative rights");
                false
            }
        }
    }
}

/// Fixed answer, for hosts where elevation is already known.
#[derive(Debug, Clone, Copy)]
pub struct StaticElevation(pub bool);

impl ElevationProbe for StaticElevation {
    fn is_elevated(&self) -> bool {
        self.0
    }
}
