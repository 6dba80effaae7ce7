//! Version probing and one-off setup commands

use crate::error::{HarnessError, HarnessResult};
use crate::tool::{absolute_program, ToolSpec};
use scbench_core::SetupStep;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info};

/// Upper bound on how long a version script may take
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(60);

/// Lines of stderr quoted when a setup step fails
const STDERR_TAIL_LINES: usize = 20;

/// Run the tool's version script and return the first non-empty stdout line
pub async fn probe_version(tool: &ToolSpec, cwd: &Path) -> HarnessResult<String> {
    let fail = |reason: String| HarnessError::VersionProbe {
        tool: tool.name.clone(),
        reason,
    };

    let mut cmd = Command::new(absolute_program(&tool.version_probe));
    cmd.current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = match timeout(PROBE_TIMEOUT, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return Err(fail(format!(
                "cannot run {}: {e}",
                tool.version_probe.display()
            )))
        }
        Err(_) => return Err(fail(format!("timed out after {PROBE_TIMEOUT:?}"))),
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(fail(format!("{} ({})", output.status, stderr.trim())));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let version = stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| fail("printed no version".to_string()))?
        .to_string();
    debug!("{} version: {}", tool.name, version);
    Ok(version)
}

/// Run a build or setup step to completion; a nonzero exit is fatal
pub async fn run_setup(step: &SetupStep, cwd: &Path) -> HarnessResult<()> {
    let command = step.command_line();
    info!("Running {}", command);

    let output = Command::new(absolute_program(&step.program))
        .args(&step.args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| HarnessError::Setup {
            command: command.clone(),
            reason: e.to_string(),
        })?;

    debug!(
        "{} finished: {}\n{}",
        command,
        output.status,
        String::from_utf8_lossy(&output.stdout)
    );

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let lines: Vec<&str> = stderr.lines().collect();
        let tail = lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n");
        return Err(HarnessError::Setup {
            command,
            reason: format!("{}\n{}", output.status, tail),
        });
    }
    Ok(())
}
