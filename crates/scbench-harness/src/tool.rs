//! Registry of supported verification tools
//!
//! Each tool is driven by shell scripts in the tools directory:
//! `<name>.sh` runs one case, `<name>_version.sh` prints the version, and an
//! optional `<name>_build.sh` prepares the corpus for that tool.

use crate::error::{HarnessError, HarnessResult};
use scbench_core::{BenchConfig, SetupStep};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Supported verification tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Hevm,
    Halmos,
    Kontrol,
}

impl ToolKind {
    pub const ALL: [ToolKind; 3] = [ToolKind::Hevm, ToolKind::Halmos, ToolKind::Kontrol];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Hevm => "hevm",
            Self::Halmos => "halmos",
            Self::Kontrol => "kontrol",
        }
    }

    /// Whether the tool needs its own build before running cases
    fn has_build_step(&self) -> bool {
        matches!(self, Self::Kontrol)
    }

    /// Resolve the scripts for this tool under `tools_dir`
    pub fn spec(&self, tools_dir: &Path) -> ToolSpec {
        let name = self.name();
        let setup = self
            .has_build_step()
            .then(|| SetupStep::new(tools_dir.join(format!("{name}_build.sh"))));
        ToolSpec {
            name: name.to_string(),
            invoke: tools_dir.join(format!("{name}.sh")),
            version_probe: tools_dir.join(format!("{name}_version.sh")),
            extra_args: Vec::new(),
            setup,
        }
    }

    /// Resolve the scripts using the run configuration, including extra arguments
    pub fn spec_for(&self, config: &BenchConfig) -> ToolSpec {
        let mut spec = self.spec(&config.tools_path());
        spec.extra_args = config.extra_args_for(self.name()).to_vec();
        spec
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ToolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|t| t.name()).collect();
                format!("unknown tool '{s}' (expected one of: {})", known.join(", "))
            })
    }
}

/// Anchor a relative path at the current directory
pub fn absolute_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Like `absolute_path`, but bare names are left alone for `PATH` lookup
///
/// Children run with the project as working directory, where a relative
/// `tools/hevm.sh` would name a different file.
pub fn absolute_program(program: &Path) -> PathBuf {
    if program.components().count() < 2 {
        return program.to_path_buf();
    }
    absolute_path(program)
}

/// Everything the harness needs to run one tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    pub name: String,
    /// Script run once per case
    pub invoke: PathBuf,
    /// Script printing the tool version
    pub version_probe: PathBuf,
    /// Appended after the standard positional arguments
    pub extra_args: Vec<String>,
    /// Runs once per orchestrator invocation before the first case
    pub setup: Option<SetupStep>,
}

impl ToolSpec {
    /// Fail early when a script is missing
    pub fn check_scripts(&self) -> HarnessResult<()> {
        let setup = self.setup.iter().map(|s| s.program.as_path());
        for path in [self.invoke.as_path(), self.version_probe.as_path()]
            .into_iter()
            .chain(setup)
        {
            if !path.is_file() {
                return Err(HarnessError::ToolNotFound {
                    tool: self.name.clone(),
                    path: path.to_path_buf(),
                });
            }
        }
        Ok(())
    }
}
