//! Non-fatal join findings.

use serde::Serialize;
use std::fmt;

/// Something the join did not take as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JoinDiagnostic {
    /// Same purl, different name or version; both records were kept
    MergeConflict {
        purl: String,
        existing: String,
        incoming: String,
        source: String,
    },
    /// Discovered package already declared as `name@version`
    SkippedKnownVersion {
        purl: String,
        name_version: String,
        source: String,
    },
    /// Discovered package without a usable version whose name is already known
    SkippedUnknownVersion {
        purl: String,
        name: String,
        version: Option<String>,
        source: String,
    },
}

impl JoinDiagnostic {
    /// Purl of the record the diagnostic is about
    #[must_use]
    pub fn purl(&self) -> &str {
        match self {
            Self::MergeConflict { purl, .. }
            | Self::SkippedKnownVersion { purl, .. }
            | Self::SkippedUnknownVersion { purl, .. } => purl,
        }
    }
}

impl fmt::Display for JoinDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MergeConflict {
                purl,
                existing,
                incoming,
                source,
            } => write!(
                f,
                "cannot merge {incoming} from {source} into {existing} under {purl}; keeping both"
            ),
            Self::SkippedKnownVersion {
                purl,
                name_version,
                source,
            } => write!(
                f,
                "skipping discovered {purl} from {source}: {name_version} already declared"
            ),
            Self::SkippedUnknownVersion {
                purl,
                name,
                version,
                source,
            } => write!(
                f,
                "skipping discovered {purl} from {source}: version {} unknown and {name} already present",
                version.as_deref().unwrap_or("<none>")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_purl() {
        let d = JoinDiagnostic::SkippedUnknownVersion {
            purl: "pkg:generic/foo".to_string(),
            name: "foo".to_string(),
            version: None,
            source: "scan.json".to_string(),
        };
        assert_eq!(d.purl(), "pkg:generic/foo");
        assert!(d.to_string().contains("<none>"));

        let json = serde_json::to_value(&d).expect("serialize");
        assert_eq!(json["kind"], "skipped_unknown_version");
    }
}
