use anyhow::{Context, Result};
use std::process::{Command, ExitStatus, Stdio};

/// Run a shell command line, inheriting stdout/stderr
///
/// stdin is closed so a unit can never block waiting on the terminal while
/// other units are running.
pub fn run_shell(script: &str) -> Result<ExitStatus> {
    log::trace!("sh -c {script:?}");
    Command::new("sh")
        .arg("-c")
        .arg(script)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .with_context(|| format!("Failed to execute: {script}"))
}
