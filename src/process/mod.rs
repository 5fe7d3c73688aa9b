//! Game process detection
//!
//! Takes a snapshot of running process names so the detector can check
//! whether the game executable is open. `tasklist` on Windows, `ps`
//! everywhere else.

use anyhow::{bail, Context, Result};
use futures_util::future::BoxFuture;
use tracing::debug;

/// Executable name of the game client
pub const DEFAULT_PROCESS_NAME: &str = "RelicCardinal.exe";

/// Linux truncates `comm` to 15 bytes
const COMM_LEN: usize = 15;

/// Source of running process names
pub trait ProcessProbe: Send + Sync + 'static {
    fn running_processes(&self) -> BoxFuture<'static, Result<Vec<String>>>;
}

/// Probe backed by the operating system's process list
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessProbe;

impl ProcessProbe for SystemProcessProbe {
    fn running_processes(&self) -> BoxFuture<'static, Result<Vec<String>>> {
        Box::pin(snapshot())
    }
}

#[cfg(target_os = "windows")]
async fn snapshot() -> Result<Vec<String>> {
    use std::os::windows::process::CommandExt;

    let output = tokio::process::Command::new("tasklist")
        .args(["/FO", "CSV", "/NH"])
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::null())
        .creation_flags(0x08000000) // CREATE_NO_WINDOW
        .output()
        .await
        .context("Failed to spawn tasklist")?;

    if !output.status.success() {
        bail!("tasklist exited with {:?}", output.status.code());
    }

    let names = parse_tasklist_csv(&String::from_utf8_lossy(&output.stdout));
    debug!("tasklist reported {} processes", names.len());
    Ok(names)
}

#[cfg(not(target_os = "windows"))]
async fn snapshot() -> Result<Vec<String>> {
    let output = tokio::process::Command::new("ps")
        .args(["-A", "-o", "comm="])
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::null())
        .output()
        .await
        .context("Failed to spawn ps")?;

    if !output.status.success() {
        bail!("ps exited with {:?}", output.status.code());
    }

    let names = parse_ps_output(&String::from_utf8_lossy(&output.stdout));
    debug!("ps reported {} processes", names.len());
    Ok(names)
}

/// Image names from `tasklist /FO CSV /NH` output
pub fn parse_tasklist_csv(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let rest = line.strip_prefix('"')?;
            let end = rest.find('"')?;
            Some(rest[..end].to_string())
        })
        .filter(|name| !name.is_empty())
        .collect()
}

/// Process names from `ps -A -o comm=` output, without directories
pub fn parse_ps_output(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.rsplit(&['/', '\\'][..])
                .next()
                .unwrap_or(line)
                .to_string()
        })
        .collect()
}

/// Whether a snapshot contains the target executable (case-insensitive)
pub fn snapshot_contains(names: &[String], target: &str) -> bool {
    let target = target.trim().to_lowercase();
    if target.is_empty() {
        return false;
    }

    names.iter().any(|name| {
        let name = name.to_lowercase();
        name == target || (name.len() == COMM_LEN && target.starts_with(&name))
    })
}
