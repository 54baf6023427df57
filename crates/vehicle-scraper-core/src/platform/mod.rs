//! Scoped sleep inhibition for long runs.

use log::{info, warn};
use std::process::{Child, Stdio};

// Import platform-specific modules conditionally
#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
use self::macos::inhibitor_command;
#[cfg(target_os = "linux")]
use self::linux::inhibitor_command;

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
use std::process::Command;

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
fn inhibitor_command() -> Option<Command> {
    None
}

/// Keeps the machine awake until dropped.
///
/// Backed by a helper process that holds the inhibitor; dropping the guard
/// kills it. When no helper is available the guard holds nothing.
pub struct KeepAwake {
    child: Option<Child>,
}

impl KeepAwake {
    pub fn acquire() -> Self {
        let Some(mut command) = inhibitor_command() else {
            warn!("Sleep prevention is not supported on this platform");
            return Self::inactive();
        };

        let program = command.get_program().to_string_lossy().into_owned();
        match command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => {
                info!("Sleep prevention on ({}, pid {})", program, child.id());
                Self { child: Some(child) }
            }
            Err(e) => {
                warn!("Could not start {}: {}", program, e);
                Self::inactive()
            }
        }
    }

    /// A guard that holds nothing
    pub fn inactive() -> Self {
        Self { child: None }
    }

    pub fn is_active(&self) -> bool {
        self.child.is_some()
    }
}

impl Drop for KeepAwake {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
            info!("Sleep prevention off");
        }
    }
}
