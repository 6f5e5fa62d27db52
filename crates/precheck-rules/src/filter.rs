//! Filter policy
//!
//! A static, declarative table of parameters that are deployment-specific
//! (paths, hosts, ports), resource-dependent (auto-tuned from node hardware)
//! or need special comparison (file name only). Adjusting noise filtering
//! means editing the tables below; no rule logic changes.
//!
//! # Matching order
//!
//! 1. Exact deny-list
//! 2. Exceptions (never filtered)
//! 3. Host/network keywords on the last dotted segment
//! 4. Path keywords contained in the last dotted segment

use once_cell::sync::Lazy;
use std::collections::BTreeSet;
use std::fmt;

const EXACT_MATCH: &[&str] = &[
    // network identity
    "host",
    "hostname",
    "port",
    "addr",
    "address",
    "pd.endpoints",
    // files and directories
    "path",
    "socket",
    "temp-dir",
    "tmp-storage-path",
    "log.file.filename",
    "log.slow-query-file",
    "log.file.max-size",
    "log.file.max-days",
    "log.file.max-backups",
    "log-file",
    "log-dir",
    "log_dir",
    "data-dir",
    "data_dir",
    "deploy-dir",
    "deploy_dir",
    "log-backup.temp-path",
    "backup.temp-path",
    "temp-path",
    "temp_path",
    "tmp_path",
    "storage.main.dir",
    "storage.latest.dir",
    "storage.raft.dir",
    // build platform
    "version_compile_machine",
    "version_compile_os",
    // time zone of the host
    "system_time_zone",
    "time_zone",
    "deprecate-integer-display-length",
];

const EXCEPTIONS: &[&str] = &[
    "raftdb.info-log-keep-log-file-num",
    "raftdb.info-log-level",
    "raftdb.info-log-max-size",
    "raftdb.info-log-roll-time",
    "rocksdb.info-log-keep-log-file-num",
    "rocksdb.info-log-level",
    "rocksdb.info-log-max-size",
    "rocksdb.info-log-roll-time",
    "raftstore.raft-log-gc-count-limit",
    "raftstore.raft-log-gc-size-limit",
    "raftstore.raft-log-gc-threshold",
    "raftstore.raft-log-gc-tick-interval",
    "raftstore.raft-log-compact-sync-interval",
    "raftstore.follower-read-max-log-gap",
    "raft-engine.enable-log-recycle",
    "log.level",
    "log.format",
    "log.enable-timestamp",
    "log-backup.enable",
    "log-backup.file-size-limit",
    "log-backup.initial-scan-concurrency",
    "log-backup.initial-scan-pending-memory-quota",
    "log-backup.initial-scan-rate-limit",
    "log-backup.max-flush-interval",
    "log-backup.min-ts-interval",
    "log-backup.num-threads",
    "server.end-point-slow-log-threshold",
    "slow-log-threshold",
    "pd.retry-log-every",
    "security.redact-info-log",
];

const HOST_KEYWORDS: &[&str] = &["host", "hostname", "addr", "address", "port"];

const PATH_KEYWORDS: &[&str] = &[
    "path", "dir", "file", "log", "temp", "tmp", "socket", "home", "deploy",
];

const RESOURCE_KEYWORDS: &[&str] = &[
    "auto-tune",
    "auto_tune",
    "num-threads",
    "num_threads",
    "thread-count",
    "thread_count",
    "threads",
    "concurrency",
    "region-max-size",
    "region-max-keys",
    "region-split-size",
    "region-split-keys",
    "sst-max-size",
    "batch-compression-threshold",
    "blob-file-compression",
];

const FILENAME_ONLY: &[&str] = &["log.file.filename", "log-file", "log.slow-query-file"];

static EXACT_SET: Lazy<BTreeSet<&'static str>> =
    Lazy::new(|| EXACT_MATCH.iter().copied().collect());
static EXCEPTION_SET: Lazy<BTreeSet<&'static str>> =
    Lazy::new(|| EXCEPTIONS.iter().copied().collect());

/// Why a parameter is filtered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterReason {
    /// Listed by name as deployment-specific
    ExactMatch,
    /// Host, address or port of a node
    HostNetwork,
    /// File or directory location
    Path,
}

impl FilterReason {
    /// Human-readable reason recorded on filtered findings
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ExactMatch => "deployment-specific parameter (exact match)",
            Self::HostNetwork => "host/network parameter (deployment-specific)",
            Self::Path => "path parameter (deployment-specific)",
        }
    }
}

impl fmt::Display for FilterReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static filter tables
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterPolicy;

impl FilterPolicy {
    /// Whether a parameter (display name, no `sysvar:` prefix) is filtered
    #[must_use]
    pub fn should_filter(name: &str) -> Option<FilterReason> {
        if EXACT_SET.contains(name) {
            return Some(FilterReason::ExactMatch);
        }
        if EXCEPTION_SET.contains(name) {
            return None;
        }

        let lowered = name.to_ascii_lowercase();
        let segment = lowered.rsplit('.').next().unwrap_or(lowered.as_str());
        let host_like = HOST_KEYWORDS.iter().any(|kw| {
            segment == *kw
                || segment.ends_with(&format!("-{kw}"))
                || segment.ends_with(&format!("_{kw}"))
                || lowered.starts_with(&format!("{kw}."))
        });
        if host_like {
            return Some(FilterReason::HostNetwork);
        }
        if PATH_KEYWORDS.iter().any(|kw| segment.contains(kw)) {
            return Some(FilterReason::Path);
        }
        None
    }

    /// Whether a parameter is tuned from node hardware
    #[must_use]
    pub fn is_resource_dependent(name: &str) -> bool {
        let lowered = name.to_ascii_lowercase();
        RESOURCE_KEYWORDS.iter().any(|kw| lowered.contains(kw))
    }

    /// Whether a parameter compares by file name, ignoring directories
    #[must_use]
    pub fn is_filename_only(name: &str) -> bool {
        FILENAME_ONLY.contains(&name)
    }
}
