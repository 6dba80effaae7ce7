//! Running one (tool, case) pair through the resource-limiting wrapper

use crate::error::{HarnessError, HarnessResult};
use crate::report::{parse_report, WrapperReport};
use crate::tool::{absolute_path, absolute_program, ToolSpec};
use crate::verdict::{classify, parse_verdict};
use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use scbench_core::{reserve, BenchConfig, Case, CaseResult, LimitKind, Verdict, WrapperConfig};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Extra time the wrapper gets beyond the case timeout before we kill it
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(10);

const REPORT_STEM: &str = "wrapper-report";
const REPORT_EXT: &str = "txt";

/// Executes cases for any tool with one fixed set of limits
#[derive(Debug, Clone)]
pub struct Harness {
    wrapper_program: PathBuf,
    wrapper: WrapperConfig,
    project_dir: PathBuf,
    report_dir: PathBuf,
    timeout_secs: u64,
    memory_limit_mb: u64,
    dump_smt: bool,
    grace_period: Duration,
}

impl Harness {
    /// Build a harness from the run configuration
    ///
    /// Fails when the wrapper program cannot be found, so that problem shows
    /// up before any case runs.
    pub fn new(config: &BenchConfig) -> HarnessResult<Self> {
        Ok(Self {
            wrapper_program: resolve_wrapper(config)?,
            wrapper: config.wrapper.clone(),
            project_dir: absolute_path(&config.project_dir),
            report_dir: absolute_path(&config.output_path()),
            timeout_secs: config.timeout_secs(),
            memory_limit_mb: config.memory_limit_mb,
            dump_smt: config.dump_smt,
            grace_period: DEFAULT_GRACE_PERIOD,
        })
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Positional arguments passed to a tool script
    pub fn tool_args(&self, tool: &ToolSpec, case: &Case) -> Vec<String> {
        let flag = |b: bool| String::from(if b { "1" } else { "0" });
        let mut args = vec![
            case.source_file().to_string(),
            case.contract().to_string(),
            case.function().to_string(),
            case.signature.clone(),
            flag(case.legacy_harness),
            self.timeout_secs.to_string(),
            self.memory_limit_mb.to_string(),
            flag(self.dump_smt),
        ];
        args.extend(tool.extra_args.iter().cloned());
        args
    }

    /// Run `tool` against `case` and classify the outcome
    ///
    /// Limits, crashes and missing output all become `Unknown`. Only a
    /// verdict token outside the legal set, or a failure to claim a report
    /// file, is returned as an error.
    pub async fn execute(&self, tool: &ToolSpec, case: &Case) -> HarnessResult<CaseResult> {
        let mut report_file = reserve(&self.report_dir, REPORT_STEM, REPORT_EXT)?;
        // The wrapper writes the report itself
        drop(report_file.take_file());

        let invoke = absolute_program(&tool.invoke);
        let tool_args = self.tool_args(tool, case);
        debug!(
            "To re-run, execute: cd {} && {} {}",
            shell_quote(&self.project_dir.display().to_string()),
            shell_quote(&invoke.display().to_string()),
            tool_args
                .iter()
                .map(|a| shell_quote(a))
                .collect::<Vec<_>>()
                .join(" ")
        );

        let mut cmd = Command::new(&self.wrapper_program);
        cmd.args(
            self.wrapper
                .expand_args(self.timeout_secs, self.memory_limit_mb, report_file.path()),
        )
        .arg(&invoke)
        .args(&tool_args)
        .current_dir(&self.project_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0)
        .kill_on_drop(true);

        let start = Instant::now();
        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(
                    "Failed to spawn wrapper {} for {}: {}",
                    self.wrapper_program.display(),
                    case.id,
                    e
                );
                let raw = format!(
                    "failed to spawn wrapper {}: {e}",
                    self.wrapper_program.display()
                );
                return Ok(self.result(
                    case,
                    Verdict::Unknown,
                    start.elapsed(),
                    WrapperReport::default(),
                    raw,
                ));
            }
        };

        let pgid = child.id();
        let deadline = Duration::from_secs(self.timeout_secs) + self.grace_period;
        // Dropping the wait future on timeout kills the wrapper (kill_on_drop);
        // anything it started is reached through its process group.
        let waited = timeout(deadline, child.wait_with_output()).await;
        let elapsed = start.elapsed();

        let (stdout, stderr, overran) = match waited {
            Ok(Ok(output)) => (
                String::from_utf8_lossy(&output.stdout).into_owned(),
                String::from_utf8_lossy(&output.stderr).into_owned(),
                false,
            ),
            Ok(Err(e)) => (String::new(), format!("failed to wait for wrapper: {e}"), false),
            Err(_) => {
                warn!(
                    "{} on {} overran its limit by more than {:?}; killed",
                    tool.name, case.id, self.grace_period
                );
                if let Some(pgid) = pgid {
                    kill_process_group(pgid);
                }
                (
                    String::new(),
                    format!("killed by harness after {:.1}s", elapsed.as_secs_f64()),
                    true,
                )
            }
        };

        let report_text = tokio::fs::read_to_string(report_file.path())
            .await
            .unwrap_or_default();
        drop(report_file);

        let mut report = parse_report(&report_text);
        if overran {
            report.limit_exceeded = Some(LimitKind::Time);
        }

        let verdict = classify(parse_verdict(&stdout), &report).map_err(|token| {
            HarnessError::UnexpectedVerdict {
                tool: tool.name.clone(),
                case: case.id.to_string(),
                token,
            }
        })?;

        Ok(self.result(
            case,
            verdict,
            elapsed,
            report,
            format!("STDOUT:\n{stdout}\nSTDERR:\n{stderr}"),
        ))
    }

    fn result(
        &self,
        case: &Case,
        verdict: Verdict,
        elapsed: Duration,
        report: WrapperReport,
        raw_output: String,
    ) -> CaseResult {
        CaseResult {
            case: case.clone(),
            verdict,
            elapsed_secs: elapsed.as_secs_f64(),
            peak_memory_mb: report.peak_memory_mb,
            cpu_percent: report.cpu_percent,
            exit_status: report.exit_status,
            limit_exceeded: report.limit_exceeded,
            timeout_secs: self.timeout_secs,
            memory_limit_mb: self.memory_limit_mb,
            raw_output,
        }
    }
}

/// Locate the wrapper: paths resolve against the project, bare names on `PATH`
fn resolve_wrapper(config: &BenchConfig) -> HarnessResult<PathBuf> {
    let program = &config.wrapper.program;
    if program.components().count() < 2 && !program.is_absolute() {
        return which::which(program).map_err(|e| HarnessError::WrapperNotFound {
            program: program.clone(),
            reason: e.to_string(),
        });
    }
    let resolved = absolute_program(&config.resolve(program));
    if resolved.is_file() {
        Ok(resolved)
    } else {
        Err(HarnessError::WrapperNotFound {
            program: resolved,
            reason: "no such file".to_string(),
        })
    }
}

/// SIGKILL every process left in the wrapper's group
fn kill_process_group(pgid: u32) {
    let Ok(raw) = i32::try_from(pgid) else {
        return;
    };
    match killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        Ok(()) => debug!("Killed process group {}", raw),
        // The whole group already exited
        Err(Errno::ESRCH) => {}
        Err(e) => warn!("Failed to kill process group {}: {}", raw, e),
    }
}

/// Quote an argument for a POSIX shell when it needs it
fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
