//! Benchmark cases and their path-derived labels

use crate::error::{DiscoveryError, DiscoveryResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Root of the cases that must verify
pub const SAFE_ROOT: &str = "src/safe";
/// Root of the cases that must be refuted
pub const UNSAFE_ROOT: &str = "src/unsafe";
/// Harness directory for the ds-test calling convention
pub const LEGACY_HARNESS_DIR: &str = "ds-test";
/// Harness directory for the single-transaction abstract convention
pub const ABSTRACT_HARNESS_DIR: &str = "1tx-abstract";

// ============================================================================
// Kani Formal Verification Proofs
// ============================================================================

#[cfg(kani)]
mod kani_proofs {
    use super::*;

    /// Verify a safe-root path is labeled Safe
    #[kani::proof]
    fn proof_expected_safe_root() {
        let result = expected_for("src/safe/ds-test/Add.sol");
        kani::assert(
            matches!(result, Ok(Expected::Safe)),
            "src/safe paths should be Safe",
        );
    }

    /// Verify a path outside both roots is rejected
    #[kani::proof]
    fn proof_expected_rejects_outside_roots() {
        let result = expected_for("test/Add.sol");
        kani::assert(result.is_err(), "paths outside roots should be rejected");
    }
}

/// Ground-truth label of a case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expected {
    /// Every assertion holds
    Safe,
    /// Some assertion can be violated
    Unsafe,
}

impl Expected {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Unsafe => "unsafe",
        }
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive the expected label from the source path's leading components
pub fn expected_for(source_file: &str) -> DiscoveryResult<Expected> {
    let path = Path::new(source_file);
    if path.starts_with(SAFE_ROOT) {
        Ok(Expected::Safe)
    } else if path.starts_with(UNSAFE_ROOT) {
        Ok(Expected::Unsafe)
    } else {
        Err(DiscoveryError::UnlabeledSource(source_file.to_string()))
    }
}

/// Decide whether the source uses the legacy ds-test calling convention
pub fn legacy_harness_for(source_file: &str) -> DiscoveryResult<bool> {
    let path = Path::new(source_file);
    for root in [SAFE_ROOT, UNSAFE_ROOT] {
        let root = Path::new(root);
        if path.starts_with(root.join(LEGACY_HARNESS_DIR)) {
            return Ok(true);
        }
        if path.starts_with(root.join(ABSTRACT_HARNESS_DIR)) {
            return Ok(false);
        }
    }
    Err(DiscoveryError::UnknownHarness(source_file.to_string()))
}

/// Composite key identifying a case within one discovery pass
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CaseId {
    /// Project-relative path of the originating source unit
    pub source_file: String,
    /// Contract declaring the function
    pub contract: String,
    /// Function under test
    pub function: String,
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source_file, self.contract, self.function)
    }
}

/// One verification obligation with a known expected verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    #[serde(flatten)]
    pub id: CaseId,
    /// Canonical ABI signature, e.g. `prove_add(uint256,uint256)`
    pub signature: String,
    /// Tool should use the ds-test calling convention
    pub legacy_harness: bool,
    /// Ground truth, derived from `id.source_file`
    pub expected: Expected,
}

impl Case {
    /// Build a case, deriving its label and harness convention from the path
    pub fn new(
        source_file: impl Into<String>,
        contract: impl Into<String>,
        function: impl Into<String>,
        signature: impl Into<String>,
    ) -> DiscoveryResult<Self> {
        let source_file = source_file.into();
        let expected = expected_for(&source_file)?;
        let legacy_harness = legacy_harness_for(&source_file)?;
        Ok(Self {
            id: CaseId {
                source_file,
                contract: contract.into(),
                function: function.into(),
            },
            signature: signature.into(),
            legacy_harness,
            expected,
        })
    }

    pub fn source_file(&self) -> &str {
        &self.id.source_file
    }

    pub fn contract(&self) -> &str {
        &self.id.contract
    }

    pub fn function(&self) -> &str {
        &self.id.function
    }
}

impl fmt::Display for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] ds={} expected={}",
            self.id, self.signature, self.legacy_harness, self.expected
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_safe() {
        assert_eq!(
            expected_for("src/safe/ds-test/Arith.sol").unwrap(),
            Expected::Safe
        );
    }

    #[test]
    fn test_expected_unsafe() {
        assert_eq!(
            expected_for("src/unsafe/1tx-abstract/Overflow.sol").unwrap(),
            Expected::Unsafe
        );
    }

    #[test]
    fn test_expected_is_component_wise() {
        // "src/safety" shares a string prefix with "src/safe" but not a component
        let err = expected_for("src/safety/ds-test/A.sol").unwrap_err();
        assert!(matches!(err, DiscoveryError::UnlabeledSource(_)));
    }

    #[test]
    fn test_expected_outside_roots() {
        let err = expected_for("test/Counter.t.sol").unwrap_err();
        assert!(err.to_string().contains("test/Counter.t.sol"));
    }

    #[test]
    fn test_legacy_harness_ds_test() {
        assert!(legacy_harness_for("src/safe/ds-test/A.sol").unwrap());
        assert!(legacy_harness_for("src/unsafe/ds-test/nested/B.sol").unwrap());
    }

    #[test]
    fn test_legacy_harness_abstract() {
        assert!(!legacy_harness_for("src/safe/1tx-abstract/A.sol").unwrap());
        assert!(!legacy_harness_for("src/unsafe/1tx-abstract/B.sol").unwrap());
    }

    #[test]
    fn test_legacy_harness_unknown_dir() {
        let err = legacy_harness_for("src/safe/other/A.sol").unwrap_err();
        assert!(matches!(err, DiscoveryError::UnknownHarness(_)));
    }

    #[test]
    fn test_case_new_derives_labels() {
        let case = Case::new(
            "src/unsafe/ds-test/Div.sol",
            "DivTest",
            "prove_div",
            "prove_div(uint256)",
        )
        .unwrap();
        assert_eq!(case.expected, Expected::Unsafe);
        assert!(case.legacy_harness);
        assert_eq!(case.function(), "prove_div");
        assert_eq!(
            case.id.to_string(),
            "src/unsafe/ds-test/Div.sol:DivTest:prove_div"
        );
    }

    #[test]
    fn test_case_new_rejects_unlabeled() {
        let result = Case::new("lib/forge-std/Test.sol", "Test", "check_x", "check_x()");
        assert!(result.is_err());
    }

    #[test]
    fn test_case_serialization_flattens_id() {
        let case = Case::new(
            "src/safe/1tx-abstract/A.sol",
            "A",
            "check_a",
            "check_a()",
        )
        .unwrap();
        let json = serde_json::to_value(&case).unwrap();
        assert_eq!(json["source_file"], "src/safe/1tx-abstract/A.sol");
        assert_eq!(json["contract"], "A");
        assert_eq!(json["expected"], "safe");
        let back: Case = serde_json::from_value(json).unwrap();
        assert_eq!(back, case);
    }

    #[test]
    fn test_case_id_ordering_is_lexicographic() {
        let a = CaseId {
            source_file: "src/safe/a.sol".into(),
            contract: "A".into(),
            function: "prove_z".into(),
        };
        let b = CaseId {
            source_file: "src/safe/b.sol".into(),
            contract: "A".into(),
            function: "prove_a".into(),
        };
        assert!(a < b);
    }
}
