//! Release and bootstrap version ordering
//!
//! Upgrade steps are stamped either with a bootstrap number (the
//! query-serving component's schema migration counter) or a release version.
//! [`UpgradePath`] decides whether a step falls in the half-open range
//! `(source, target]`.

use crate::ModelError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

static RELEASE_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[vV]?(\d+)(?:\.(\d+))?(?:\.(\d+))?").ok());

/// Semantic release version; missing components are zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ReleaseVersion {
    /// Major version
    pub major: u64,
    /// Minor version
    pub minor: u64,
    /// Patch version
    pub patch: u64,
}

impl ReleaseVersion {
    /// Create version
    #[inline]
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl FromStr for ReleaseVersion {
    type Err = ModelError;

    /// Parse `v8.5.0`, `8.5`, `v7.1.0-beta` (pre-release suffix ignored)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = RELEASE_PATTERN
            .as_ref()
            .and_then(|re| re.captures(s.trim()))
            .ok_or_else(|| ModelError::InvalidVersion(s.to_string()))?;
        let part = |idx: usize| -> Result<u64, ModelError> {
            caps.get(idx).map_or(Ok(0), |m| {
                m.as_str()
                    .parse()
                    .map_err(|_| ModelError::InvalidVersion(s.to_string()))
            })
        };
        Ok(Self::new(part(1)?, part(2)?, part(3)?))
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Version stamp of an upgrade step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionMark {
    /// Bootstrap (schema migration) number
    Bootstrap(i64),
    /// Release version
    Release(ReleaseVersion),
    /// Unrecognized stamp, never in range
    Unknown(String),
}

impl VersionMark {
    /// Classify a stamp
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        if let Ok(number) = trimmed.parse::<i64>() {
            return Self::Bootstrap(number);
        }
        trimmed
            .parse::<ReleaseVersion>()
            .map_or_else(|_| Self::Unknown(text.to_string()), Self::Release)
    }
}

impl fmt::Display for VersionMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bootstrap(n) => write!(f, "{n}"),
            Self::Release(v) => write!(f, "{v}"),
            Self::Unknown(raw) => f.write_str(raw),
        }
    }
}

impl Serialize for VersionMark {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionMark {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Number(n) => Ok(n
                .as_i64()
                .map_or_else(|| Self::Unknown(n.to_string()), Self::Bootstrap)),
            serde_json::Value::String(s) => Ok(Self::parse(&s)),
            other => Ok(Self::Unknown(other.to_string())),
        }
    }
}

/// The upgrade being assessed
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpgradePath {
    /// Current release, if parseable
    pub source: Option<ReleaseVersion>,
    /// Target release, if parseable
    pub target: Option<ReleaseVersion>,
    /// Source bootstrap number, if known
    pub source_bootstrap: Option<i64>,
    /// Target bootstrap number, if known
    pub target_bootstrap: Option<i64>,
}

impl UpgradePath {
    /// Build from release strings; unparseable versions become unknown
    #[must_use]
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            source: source.parse().ok(),
            target: target.parse().ok(),
            source_bootstrap: None,
            target_bootstrap: None,
        }
    }

    /// Attach bootstrap numbers; non-positive numbers count as unknown
    #[inline]
    #[must_use]
    pub fn with_bootstrap(mut self, source: Option<i64>, target: Option<i64>) -> Self {
        self.source_bootstrap = source.filter(|n| *n > 0);
        self.target_bootstrap = target.filter(|n| *n > 0);
        self
    }

    /// Whether an upgrade step stamped `mark` runs during this upgrade
    ///
    /// Bootstrap numbers are compared when both ends are known; otherwise the
    /// stamp is read as a release version.
    #[must_use]
    pub fn contains(&self, mark: &VersionMark) -> bool {
        match (mark, self.source_bootstrap, self.target_bootstrap) {
            (VersionMark::Bootstrap(n), Some(from), Some(to)) => from < *n && *n <= to,
            (VersionMark::Bootstrap(n), _, _) => u64::try_from(*n)
                .map(|major| self.release_in_range(ReleaseVersion::new(major, 0, 0)))
                .unwrap_or(false),
            (VersionMark::Release(v), _, _) => self.release_in_range(*v),
            (VersionMark::Unknown(_), _, _) => false,
        }
    }

    fn release_in_range(&self, version: ReleaseVersion) -> bool {
        match (self.source, self.target) {
            (Some(from), Some(to)) => from < version && version <= to,
            _ => false,
        }
    }

    /// Whether the path overlaps `[from, to)`; open ends are unbounded
    ///
    /// With only `from`, the target must reach it. With only `to`, the
    /// source must precede it.
    #[must_use]
    pub fn overlaps(&self, from: Option<ReleaseVersion>, to: Option<ReleaseVersion>) -> bool {
        let reaches_from = |from: ReleaseVersion| self.target.is_some_and(|t| t >= from);
        let before_to = |to: ReleaseVersion| self.source.is_some_and(|s| s < to);
        match (from, to) {
            (None, None) => true,
            (Some(from), None) => reaches_from(from),
            (None, Some(to)) => before_to(to),
            (Some(from), Some(to)) => reaches_from(from) && before_to(to),
        }
    }
}
