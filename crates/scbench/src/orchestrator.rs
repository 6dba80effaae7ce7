//! Sequencing of a benchmark run
//!
//! A run goes through a fixed set of phases:
//!
//! 1. Init: check the tool selection, build the corpus, run per-tool setup
//!    and probe every tool's version
//! 2. Discover the cases and fail if none match
//! 3. Shuffle with the configured seed and truncate to `max_cases`
//! 4. Execute tool-major, case-minor, one subprocess at a time
//! 5. Persist the result set once
//!
//! Everything that touches a subprocess goes through the `Executor` trait.

use crate::error::BenchError;
use async_trait::async_trait;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use scbench_core::{
    discover_cases, BenchConfig, Case, CaseResult, ResultSet, RunId, SetupStep, ToolRun,
};
use scbench_harness::{probe_version, run_setup, Harness, HarnessError, ToolKind, ToolSpec};
use scbench_store::{persist, Manifest};
use std::collections::HashSet;
use tracing::{debug, info};

/// Subprocess-facing operations of a run
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run a build or setup step to completion
    async fn setup(&self, step: &SetupStep) -> Result<(), HarnessError>;

    /// Identify the tool version for the run id
    async fn probe_version(&self, tool: &ToolSpec) -> Result<String, HarnessError>;

    /// Run one tool against one case
    async fn execute(&self, tool: &ToolSpec, case: &Case) -> Result<CaseResult, HarnessError>;
}

#[async_trait]
impl Executor for Harness {
    async fn setup(&self, step: &SetupStep) -> Result<(), HarnessError> {
        run_setup(step, self.project_dir()).await
    }

    async fn probe_version(&self, tool: &ToolSpec) -> Result<String, HarnessError> {
        probe_version(tool, self.project_dir()).await
    }

    async fn execute(&self, tool: &ToolSpec, case: &Case) -> Result<CaseResult, HarnessError> {
        Harness::execute(self, tool, case).await
    }
}

/// Seeded permutation of `items`, truncated to `max` when set
///
/// The same seed and input always give the same output.
pub fn shuffle_and_limit<T>(mut items: Vec<T>, seed: u64, max: Option<usize>) -> Vec<T> {
    let mut rng = StdRng::seed_from_u64(seed);
    items.shuffle(&mut rng);
    if let Some(max) = max {
        items.truncate(max);
    }
    items
}

/// Tool specs for a selection, deduplicated in first-seen order
pub fn tool_specs(tools: &[ToolKind], config: &BenchConfig) -> Vec<ToolSpec> {
    let mut seen = HashSet::new();
    tools
        .iter()
        .filter(|t| seen.insert(**t))
        .map(|t| t.spec_for(config))
        .collect()
}

/// A tool whose version has been established
#[derive(Debug, Clone)]
pub struct PreparedTool {
    pub spec: ToolSpec,
    pub version: String,
}

/// What a completed run produced
#[derive(Debug)]
pub struct RunOutcome {
    pub results: ResultSet,
    pub manifest: Manifest,
}

pub struct Orchestrator<E> {
    config: BenchConfig,
    executor: E,
}

impl Orchestrator<Harness> {
    /// Orchestrator backed by real subprocesses
    pub fn from_config(config: BenchConfig) -> Result<Self, BenchError> {
        let harness = Harness::new(&config)?;
        Ok(Self::new(config, harness))
    }
}

impl<E: Executor> Orchestrator<E> {
    pub fn new(config: BenchConfig, executor: E) -> Self {
        Self { config, executor }
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Build the corpus, run each tool's setup once and probe versions
    pub async fn prepare(&self, tools: &[ToolSpec]) -> Result<Vec<PreparedTool>, BenchError> {
        if tools.is_empty() {
            return Err(BenchError::NoTools);
        }

        if self.config.skip_build {
            info!("Skipping build and setup steps");
        } else {
            if let Some(step) = &self.config.build_step {
                self.executor.setup(step).await?;
            }
            for tool in tools {
                if let Some(step) = &tool.setup {
                    self.executor.setup(step).await?;
                }
            }
        }

        let mut prepared = Vec::with_capacity(tools.len());
        for tool in tools {
            let version = self.executor.probe_version(tool).await?;
            info!("Using {} ({})", tool.name, version);
            prepared.push(PreparedTool {
                spec: tool.clone(),
                version,
            });
        }
        Ok(prepared)
    }

    /// Discover, shuffle and limit the cases for this run
    pub fn select_cases(&self) -> Result<Vec<Case>, BenchError> {
        let cases = discover_cases(&self.config)?;
        if cases.is_empty() {
            return Err(BenchError::NoCases {
                filter: self.config.filter.clone(),
            });
        }
        let discovered = cases.len();
        let cases = shuffle_and_limit(cases, self.config.seed, self.config.max_cases);
        info!(
            "Selected {} of {} cases (seed {})",
            cases.len(),
            discovered,
            self.config.seed
        );
        Ok(cases)
    }

    /// Run every tool over every case, tool-major
    pub async fn execute_all(
        &self,
        tools: &[PreparedTool],
        cases: &[Case],
    ) -> Result<ResultSet, BenchError> {
        let mut set = ResultSet::new();
        for tool in tools {
            let mut run = ToolRun::new(RunId::new(&tool.spec.name, &tool.version, Utc::now()));
            info!("Starting run {} over {} cases", run.run_id, cases.len());

            for (i, case) in cases.iter().enumerate() {
                let result = self.executor.execute(&tool.spec, case).await?;
                println!(
                    "[{}/{}] {}: {}",
                    i + 1,
                    cases.len(),
                    tool.spec.name,
                    result
                );
                run.results.push(result);
            }

            info!(
                "{}: {} of {} solved, {} correct",
                run.run_id,
                run.solved(),
                run.results.len(),
                run.correct()
            );
            set.push(run);
        }
        Ok(set)
    }

    /// Full run: prepare, select, execute and persist
    pub async fn run(&self, tools: &[ToolSpec]) -> Result<RunOutcome, BenchError> {
        debug!("Effective configuration: {:?}", self.config);
        let prepared = self.prepare(tools).await?;
        let cases = self.select_cases()?;
        let results = self.execute_all(&prepared, &cases).await?;
        let manifest = persist(&results, &self.config.output_path())?;
        Ok(RunOutcome { results, manifest })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shuffle_same_seed_same_order() {
        let items: Vec<u32> = (0..50).collect();
        let a = shuffle_and_limit(items.clone(), 1, None);
        let b = shuffle_and_limit(items.clone(), 1, None);
        assert_eq!(a, b);
        assert_ne!(a, items, "50 elements should not stay in order");
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let items: Vec<u32> = (0..20).collect();
        let mut shuffled = shuffle_and_limit(items.clone(), 42, None);
        shuffled.sort_unstable();
        assert_eq!(shuffled, items);
    }

    #[test]
    fn test_limit_truncates_after_shuffle() {
        let items: Vec<u32> = (0..20).collect();
        let full = shuffle_and_limit(items.clone(), 7, None);
        let limited = shuffle_and_limit(items, 7, Some(5));
        assert_eq!(limited, full[..5]);
    }

    #[test]
    fn test_limit_larger_than_input() {
        let limited = shuffle_and_limit(vec![1, 2, 3], 0, Some(10));
        assert_eq!(limited.len(), 3);
    }

    #[test]
    fn test_tool_specs_dedup() {
        let config = BenchConfig::default();
        let specs = tool_specs(
            &[ToolKind::Kontrol, ToolKind::Hevm, ToolKind::Kontrol],
            &config,
        );
        let names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["kontrol", "hevm"]);
    }
}
