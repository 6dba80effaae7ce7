//! Case discovery from compiled build artifacts
//!
//! The compiler writes one directory per source unit under the artifacts
//! directory (`out/Add.sol/AddTest.json`, ...). Each JSON document carries
//! the contract ABI and the path of the file it was compiled from. We parse
//! that output instead of the Solidity sources, which handles files that
//! declare several contracts for free.

use crate::case::{expected_for, legacy_harness_for, Case, CaseId};
use crate::config::BenchConfig;
use crate::error::{DiscoveryError, DiscoveryResult};
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Build metadata directory that sits next to the per-source directories
pub const BUILD_INFO_DIR: &str = "build-info";

/// Function-name prefixes marking a provable property
pub const PROVABLE_PREFIXES: [&str; 2] = ["prove", "check"];

#[derive(Debug, Deserialize)]
struct Artifact {
    #[serde(default)]
    abi: Vec<AbiEntry>,
    #[serde(default)]
    ast: Option<ArtifactAst>,
    #[serde(default)]
    metadata: Option<ArtifactMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArtifactAst {
    absolute_path: String,
}

#[derive(Debug, Deserialize)]
struct ArtifactMetadata {
    settings: MetadataSettings,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetadataSettings {
    #[serde(default)]
    compilation_target: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct AbiEntry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    inputs: Vec<AbiParam>,
}

#[derive(Debug, Deserialize)]
struct AbiParam {
    #[serde(rename = "type")]
    ty: String,
    #[serde(default)]
    components: Vec<AbiParam>,
}

impl Artifact {
    fn source_path(&self) -> Option<&str> {
        if let Some(ast) = &self.ast {
            return Some(ast.absolute_path.as_str());
        }
        self.metadata
            .as_ref()
            .and_then(|m| m.settings.compilation_target.keys().next())
            .map(String::as_str)
    }
}

/// Canonical ABI type of a parameter, expanding tuples to their components
fn canonical_type(param: &AbiParam) -> String {
    match param.ty.strip_prefix("tuple") {
        Some(suffix) => {
            let inner: Vec<String> = param.components.iter().map(canonical_type).collect();
            format!("({}){}", inner.join(","), suffix)
        }
        None => param.ty.clone(),
    }
}

fn signature_of(name: &str, inputs: &[AbiParam]) -> String {
    let types: Vec<String> = inputs.iter().map(canonical_type).collect();
    format!("{}({})", name, types.join(","))
}

/// Whether a function name follows the provable naming convention
pub fn is_provable(name: &str) -> bool {
    PROVABLE_PREFIXES.iter().any(|p| name.starts_with(p))
}

/// Discovers cases from a directory of compiled artifacts
#[derive(Debug, Clone)]
pub struct CaseDiscovery {
    artifacts_dir: PathBuf,
    excluded_prefixes: Vec<String>,
    filter: Regex,
}

impl CaseDiscovery {
    /// Create a discovery pass over `artifacts_dir` with a name filter
    pub fn new(artifacts_dir: impl Into<PathBuf>, filter: &str) -> DiscoveryResult<Self> {
        Ok(Self {
            artifacts_dir: artifacts_dir.into(),
            excluded_prefixes: Vec::new(),
            filter: Regex::new(filter)?,
        })
    }

    /// Create a discovery pass from the run configuration
    pub fn from_config(config: &BenchConfig) -> DiscoveryResult<Self> {
        Ok(Self::new(config.artifacts_path(), &config.filter)?
            .with_excluded_prefixes(config.excluded_prefixes.iter().cloned()))
    }

    /// Skip sources under any of these path prefixes
    pub fn with_excluded_prefixes<I>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.excluded_prefixes.extend(prefixes);
        self
    }

    fn is_excluded(&self, source_file: &str) -> bool {
        let path = Path::new(source_file);
        self.excluded_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix))
    }

    /// Produce the ordered, deduplicated set of cases matching the filter
    pub fn discover(&self) -> DiscoveryResult<Vec<Case>> {
        let mut cases = Vec::new();
        let mut seen: HashSet<CaseId> = HashSet::new();

        for artifact_path in self.artifact_files()? {
            for case in self.cases_in(&artifact_path)? {
                if !self.filter.is_match(&case.id.to_string()) {
                    continue;
                }
                if !seen.insert(case.id.clone()) {
                    warn!(
                        "Skipping duplicate case {} (also found in {})",
                        case.id,
                        artifact_path.display()
                    );
                    continue;
                }
                cases.push(case);
            }
        }

        debug!(
            "Discovered {} cases in {}",
            cases.len(),
            self.artifacts_dir.display()
        );
        Ok(cases)
    }

    /// All artifact JSON files, in sorted directory then file order
    fn artifact_files(&self) -> DiscoveryResult<Vec<PathBuf>> {
        let dirs = sorted_entries(&self.artifacts_dir)?
            .into_iter()
            .filter(|p| p.is_dir())
            .filter(|p| p.file_name().map_or(true, |n| n != BUILD_INFO_DIR));

        let mut files = Vec::new();
        for dir in dirs {
            files.extend(
                sorted_entries(&dir)?
                    .into_iter()
                    .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == "json")),
            );
        }
        Ok(files)
    }

    /// Cases contributed by one artifact
    fn cases_in(&self, path: &Path) -> DiscoveryResult<Vec<Case>> {
        let text = fs::read_to_string(path).map_err(|source| DiscoveryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact: Artifact =
            serde_json::from_str(&text).map_err(|source| DiscoveryError::Artifact {
                path: path.to_path_buf(),
                source,
            })?;

        let source_file = artifact
            .source_path()
            .ok_or_else(|| DiscoveryError::MissingSourcePath(path.to_path_buf()))?;
        if self.is_excluded(source_file) {
            return Ok(Vec::new());
        }

        // Classify before looking at functions: a misplaced file is fatal even
        // when it declares nothing provable.
        expected_for(source_file)?;
        legacy_harness_for(source_file)?;

        let contract = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut cases = Vec::new();
        for entry in &artifact.abi {
            if entry.kind != "function" {
                continue;
            }
            let Some(name) = entry.name.as_deref() else {
                continue;
            };
            if !is_provable(name) {
                continue;
            }
            let signature = signature_of(name, &entry.inputs);
            cases.push(Case::new(source_file, &contract, name, signature)?);
        }
        Ok(cases)
    }
}

fn sorted_entries(dir: &Path) -> DiscoveryResult<Vec<PathBuf>> {
    let read = fs::read_dir(dir).map_err(|source| DiscoveryError::ArtifactsDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut entries = Vec::new();
    for entry in read {
        let entry = entry.map_err(|source| DiscoveryError::ArtifactsDir {
            path: dir.to_path_buf(),
            source,
        })?;
        entries.push(entry.path());
    }
    entries.sort();
    Ok(entries)
}

/// Discover the cases for a run
pub fn discover_cases(config: &BenchConfig) -> DiscoveryResult<Vec<Case>> {
    CaseDiscovery::from_config(config)?.discover()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::Expected;
    use tempfile::TempDir;

    fn param(ty: &str) -> AbiParam {
        AbiParam {
            ty: ty.to_string(),
            components: Vec::new(),
        }
    }

    #[test]
    fn test_is_provable() {
        assert!(is_provable("prove_add"));
        assert!(is_provable("proveAdd"));
        assert!(is_provable("check_overflow"));
        assert!(!is_provable("test_add"));
        assert!(!is_provable("setUp"));
        assert!(!is_provable("improve"));
    }

    #[test]
    fn test_signature_no_inputs() {
        assert_eq!(signature_of("prove_x", &[]), "prove_x()");
    }

    #[test]
    fn test_signature_simple_inputs() {
        let inputs = vec![param("uint256"), param("address"), param("bytes32[]")];
        assert_eq!(
            signature_of("check_it", &inputs),
            "check_it(uint256,address,bytes32[])"
        );
    }

    #[test]
    fn test_signature_tuples() {
        let inner = AbiParam {
            ty: "tuple".to_string(),
            components: vec![param("uint8"), param("bool")],
        };
        let outer = AbiParam {
            ty: "tuple[2]".to_string(),
            components: vec![param("address"), inner],
        };
        assert_eq!(
            signature_of("prove_t", &[outer]),
            "prove_t((address,(uint8,bool))[2])"
        );
    }

    #[test]
    fn test_source_path_prefers_ast() {
        let artifact: Artifact = serde_json::from_str(
            r#"{"abi": [], "ast": {"absolutePath": "src/safe/ds-test/A.sol"},
                "metadata": {"settings": {"compilationTarget": {"src/other.sol": "A"}}}}"#,
        )
        .unwrap();
        assert_eq!(artifact.source_path(), Some("src/safe/ds-test/A.sol"));
    }

    #[test]
    fn test_source_path_falls_back_to_compilation_target() {
        let artifact: Artifact = serde_json::from_str(
            r#"{"abi": [], "metadata": {"settings": {"compilationTarget": {"src/unsafe/ds-test/B.sol": "B"}}}}"#,
        )
        .unwrap();
        assert_eq!(artifact.source_path(), Some("src/unsafe/ds-test/B.sol"));
    }

    #[test]
    fn test_discover_single_artifact() {
        let dir = TempDir::new().unwrap();
        let unit = dir.path().join("Add.sol");
        fs::create_dir_all(&unit).unwrap();
        fs::write(
            unit.join("AddTest.json"),
            r#"{
                "abi": [
                    {"type": "function", "name": "setUp", "inputs": []},
                    {"type": "function", "name": "prove_add", "inputs": [{"name": "x", "type": "uint256"}]},
                    {"type": "event", "name": "log", "inputs": []}
                ],
                "ast": {"absolutePath": "src/safe/ds-test/Add.sol"}
            }"#,
        )
        .unwrap();

        let cases = CaseDiscovery::new(dir.path(), ".*").unwrap().discover().unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].contract(), "AddTest");
        assert_eq!(cases[0].signature, "prove_add(uint256)");
        assert_eq!(cases[0].expected, Expected::Safe);
    }

    #[test]
    fn test_discover_missing_dir_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = CaseDiscovery::new(dir.path().join("missing"), ".*")
            .unwrap()
            .discover()
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::ArtifactsDir { .. }));
    }

    #[test]
    fn test_invalid_filter() {
        let err = CaseDiscovery::new("out", "(unclosed").unwrap_err();
        assert!(matches!(err, DiscoveryError::InvalidFilter(_)));
    }
}
