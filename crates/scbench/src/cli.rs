//! Command-line arguments

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use scbench_core::{BenchConfig, WrapperConfig};
use scbench_harness::ToolKind;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "scbench")]
#[command(about = "Benchmark smart-contract verification tools against a labeled corpus")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging, including the command line of every tool run
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the selected tools over the corpus and persist the results
    Run(RunArgs),
    /// List the cases discovery would produce
    Cases(CorpusArgs),
    /// Summarize a results document
    Summary {
        /// Results document (default: <output-dir>/results-latest.json)
        file: Option<PathBuf>,
        /// Directory holding result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
}

/// Where the corpus lives and which cases to take from it
#[derive(Args, Debug, Clone)]
pub struct CorpusArgs {
    /// Root of the benchmark project
    #[arg(long, default_value = ".", env = "SCBENCH_PROJECT_DIR")]
    pub project_dir: PathBuf,

    /// Compiled artifacts, relative to the project
    #[arg(long, default_value = "out")]
    pub artifacts_dir: PathBuf,

    /// Only run cases whose `source:contract:function` matches this regex
    #[arg(long, default_value = ".*")]
    pub filter: String,

    /// Source prefix that does not hold cases (repeatable; replaces the defaults)
    #[arg(long = "exclude", value_name = "PREFIX")]
    pub exclude: Vec<String>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub corpus: CorpusArgs,

    /// Tool to run (repeatable)
    #[arg(long = "tool", required = true, value_parser = parse_tool)]
    pub tools: Vec<ToolKind>,

    /// Seed for the case order
    #[arg(long, default_value = "1")]
    pub seed: u64,

    /// Per-case timeout in seconds
    #[arg(long, default_value = "25")]
    pub timeout: u64,

    /// Per-case memory ceiling in MB
    #[arg(long, default_value = "16384")]
    pub memory: u64,

    /// Run at most this many cases
    #[arg(long)]
    pub max_cases: Option<usize>,

    /// Skip the corpus build and per-tool setup steps
    #[arg(long)]
    pub no_build: bool,

    /// Ask tools to dump their solver queries
    #[arg(long)]
    pub dump_smt: bool,

    /// Directory holding the tool scripts, relative to the project
    #[arg(long, default_value = "tools")]
    pub tools_dir: PathBuf,

    /// Directory for reports and result files, relative to the project
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Resource-limiting wrapper program
    #[arg(long, default_value = "tools/limit.sh")]
    pub wrapper: PathBuf,

    /// Wrapper argument template with {timeout}, {memory} and {report}
    #[arg(long, default_value = "{timeout} {memory} {report}", allow_hyphen_values = true)]
    pub wrapper_args: String,

    /// Extra argument for one tool, as TOOL=ARG (repeatable)
    #[arg(long = "tool-arg", value_name = "TOOL=ARG")]
    pub tool_args: Vec<String>,
}

fn parse_tool(s: &str) -> Result<ToolKind, String> {
    s.parse()
}

/// Split `TOOL=ARG` pairs into per-tool argument lists, keeping order
fn parse_tool_args(pairs: &[String]) -> anyhow::Result<BTreeMap<String, Vec<String>>> {
    let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for pair in pairs {
        let Some((tool, arg)) = pair.split_once('=') else {
            bail!("--tool-arg expects TOOL=ARG, got '{pair}'");
        };
        let tool: ToolKind = tool.parse().map_err(anyhow::Error::msg)?;
        map.entry(tool.name().to_string())
            .or_default()
            .push(arg.to_string());
    }
    Ok(map)
}

impl CorpusArgs {
    /// Configuration with only the discovery-related fields set
    pub fn into_config(self) -> anyhow::Result<BenchConfig> {
        let project_dir = self
            .project_dir
            .canonicalize()
            .with_context(|| format!("project directory {}", self.project_dir.display()))?;
        let mut config = BenchConfig {
            project_dir,
            artifacts_dir: self.artifacts_dir,
            filter: self.filter,
            ..Default::default()
        };
        if !self.exclude.is_empty() {
            config.excluded_prefixes = self.exclude;
        }
        Ok(config)
    }
}

impl RunArgs {
    pub fn into_config(self) -> anyhow::Result<BenchConfig> {
        let tool_args = parse_tool_args(&self.tool_args)?;
        let base = self.corpus.into_config()?;
        Ok(BenchConfig {
            seed: self.seed,
            timeout: Duration::from_secs(self.timeout),
            memory_limit_mb: self.memory,
            max_cases: self.max_cases,
            skip_build: self.no_build,
            dump_smt: self.dump_smt,
            tools_dir: self.tools_dir,
            output_dir: self.output_dir,
            wrapper: WrapperConfig {
                program: self.wrapper,
                args: self
                    .wrapper_args
                    .split_whitespace()
                    .map(str::to_string)
                    .collect(),
            },
            tool_args,
            ..base
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_defaults() {
        let cli = Cli::try_parse_from(["scbench", "run", "--tool", "hevm"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.tools, vec![ToolKind::Hevm]);
        assert_eq!(args.seed, 1);
        assert_eq!(args.timeout, 25);
        assert_eq!(args.memory, 16384);
        assert_eq!(args.corpus.filter, ".*");
        assert!(!args.no_build);
    }

    #[test]
    fn test_run_requires_tool() {
        assert!(Cli::try_parse_from(["scbench", "run"]).is_err());
        assert!(Cli::try_parse_from(["scbench", "run", "--tool", "mythril"]).is_err());
    }

    #[test]
    fn test_repeatable_tools_and_args() {
        let cli = Cli::try_parse_from([
            "scbench",
            "-v",
            "run",
            "--tool",
            "halmos",
            "--tool",
            "kontrol",
            "--tool-arg",
            "halmos=--loop",
            "--tool-arg",
            "halmos=4",
        ])
        .unwrap();
        assert!(cli.verbose);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.tools, vec![ToolKind::Halmos, ToolKind::Kontrol]);
        let map = parse_tool_args(&args.tool_args).unwrap();
        assert_eq!(map["halmos"], vec!["--loop", "4"]);
    }

    #[test]
    fn test_tool_arg_validation() {
        assert!(parse_tool_args(&["hevm".to_string()]).is_err());
        assert!(parse_tool_args(&["z3=--x".to_string()]).is_err());
        // Only the first '=' separates tool from argument
        let map = parse_tool_args(&["hevm=--max-iterations=5".to_string()]).unwrap();
        assert_eq!(map["hevm"], vec!["--max-iterations=5"]);
    }

    #[test]
    fn test_run_args_into_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let cli = Cli::try_parse_from([
            "scbench",
            "run",
            "--tool",
            "hevm",
            "--project-dir",
            dir.path().to_str().unwrap(),
            "--timeout",
            "3",
            "--max-cases",
            "2",
            "--no-build",
            "--exclude",
            "lib",
            "--wrapper-args",
            "-t {timeout} -o {report}",
        ])
        .unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        let config = args.into_config().unwrap();
        assert!(config.project_dir.is_absolute());
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.max_cases, Some(2));
        assert!(config.skip_build);
        assert_eq!(config.excluded_prefixes, vec!["lib"]);
        assert_eq!(config.wrapper.args, vec!["-t", "{timeout}", "-o", "{report}"]);
    }

    #[test]
    fn test_missing_project_dir() {
        let args = CorpusArgs {
            project_dir: PathBuf::from("/definitely/not/here"),
            artifacts_dir: PathBuf::from("out"),
            filter: ".*".to_string(),
            exclude: vec![],
        };
        assert!(args.into_config().is_err());
    }
}
