// crates/aecp-sandbox/src/permission.rs
// ============================================================================
// Module: Permission Checker
// Description: Answers filesystem, network, resource, capability, and
//              environment-variable permission questions for a sandbox.
// Purpose: Single source of truth for "is this action allowed" within a
//          sandbox's permission envelope.
// Dependencies: aecp-core
// ============================================================================

//! ## Overview
//! Implements `spec.md` §4.4's permission checker. Path rules normalize
//! paths before comparison; denied paths dominate allowed paths even for
//! descendants of an allowed path (`spec.md` §8 property 8). Network rules:
//! the disabled flag wins outright, `allowed_domains` matches exact or
//! `*.`-suffix wildcards case-insensitively, and denied domains dominate.
//!
//! `check_filesystem_read`/`check_filesystem_write` are a declarative,
//! lexical pre-check only: they answer "does policy allow this path"
//! without ever touching disk, which is all a dry-run or a non-filesystem
//! caller needs, but it cannot see a symlink planted inside an allowed
//! directory that points outside it. A caller that performs real file I/O
//! must instead go through [`PermissionChecker::open_rooted_read`] /
//! [`PermissionChecker::open_rooted_write`], which open a `cap_std::fs::Dir`
//! rooted at the matching allowed directory and refuse to follow symlinks
//! — the actual enforcement boundary, not just the policy pre-check.

use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use aecp_core::SandboxPermissions;
use cap_primitives::fs::FollowSymlinks;
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use cap_std::fs::File as RootedFile;
use cap_std::fs::OpenOptions;
use thiserror::Error;

/// The answer to a single permission question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionCheckResult {
    /// Whether the request is granted.
    pub granted: bool,
    /// Human-readable reason for the verdict.
    pub reason: String,
    /// Whether a denial here can be escalated (see `spec.md` §4.4:
    /// execution-time limits are hard/non-escalable, others are soft).
    pub can_escalate: bool,
}

impl PermissionCheckResult {
    fn granted(reason: impl Into<String>) -> Self {
        Self {
            granted: true,
            reason: reason.into(),
            can_escalate: false,
        }
    }

    fn denied(reason: impl Into<String>, can_escalate: bool) -> Self {
        Self {
            granted: false,
            reason: reason.into(),
            can_escalate,
        }
    }
}

/// Normalizes a path by resolving `.`/`..` components lexically (no
/// filesystem access), so rule matching is not fooled by `a/../b` forms.
fn normalize(path: &str) -> PathBuf {
    let mut out = PathBuf::new();
    for component in Path::new(path).components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn path_prefix_matches(rule: &str, candidate: &Path) -> bool {
    let rule_path = normalize(rule.trim_end_matches('*'));
    candidate.starts_with(&rule_path) || candidate == rule_path
}

/// Returns the first rule's root directory that `candidate` falls under, or
/// `None` if no rule matches.
fn matching_root<'b>(rules: impl Iterator<Item = &'b str>, candidate: &Path) -> Option<PathBuf> {
    rules
        .map(|rule| normalize(rule.trim_end_matches('*')))
        .find(|root| candidate.starts_with(root) || candidate == root)
}

/// Errors raised while opening a real file through a capability handle
/// rooted at an allowed filesystem path.
#[derive(Debug, Error)]
pub enum RootedOpenError {
    /// The declarative permission check denied the request outright; the
    /// capability handle was never opened.
    #[error("{0}")]
    Denied(String),
    /// The declarative check passed but the handle could not be opened
    /// (missing root directory, symlink in the way, or an underlying I/O
    /// failure).
    #[error("failed to open {path}: {source}")]
    Io {
        /// The path that could not be opened.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// Checks filesystem/network/resource/capability/env-var permissions
/// against a fixed [`SandboxPermissions`] envelope.
pub struct PermissionChecker<'a> {
    permissions: &'a SandboxPermissions,
}

impl<'a> PermissionChecker<'a> {
    /// Creates a checker bound to the given permission envelope.
    #[must_use]
    pub const fn new(permissions: &'a SandboxPermissions) -> Self {
        Self { permissions }
    }

    /// Checks whether `path` may be read.
    #[must_use]
    pub fn check_filesystem_read(&self, path: &str) -> PermissionCheckResult {
        let normalized = normalize(path);
        let fs = &self.permissions.filesystem;

        if fs.denied_paths.iter().any(|rule| path_prefix_matches(rule, &normalized)) {
            return PermissionCheckResult::denied(format!("{path} is under a denied path"), true);
        }
        let readable = fs
            .read_only_paths
            .iter()
            .chain(fs.read_write_paths.iter())
            .any(|rule| path_prefix_matches(rule, &normalized));
        if readable {
            PermissionCheckResult::granted(format!("{path} is within an allowed read path"))
        } else {
            PermissionCheckResult::denied(format!("{path} is not within any allowed read path"), true)
        }
    }

    /// Checks whether `path` may be written.
    #[must_use]
    pub fn check_filesystem_write(&self, path: &str) -> PermissionCheckResult {
        let normalized = normalize(path);
        let fs = &self.permissions.filesystem;

        if fs.denied_paths.iter().any(|rule| path_prefix_matches(rule, &normalized)) {
            return PermissionCheckResult::denied(format!("{path} is under a denied path"), true);
        }
        let writable = fs.read_write_paths.iter().any(|rule| path_prefix_matches(rule, &normalized));
        if writable {
            PermissionCheckResult::granted(format!("{path} is within an allowed read-write path"))
        } else {
            PermissionCheckResult::denied(format!("{path} is not within any allowed read-write path"), true)
        }
    }

    /// Checks network access to an optional domain/ip/port combination.
    #[must_use]
    pub fn check_network_access(&self, domain: Option<&str>, ip: Option<&str>, port: Option<u16>) -> PermissionCheckResult {
        let net = &self.permissions.network;
        if !net.enabled {
            return PermissionCheckResult::denied("network access is disabled for this sandbox", true);
        }

        if let Some(domain) = domain {
            let lower = domain.to_ascii_lowercase();
            if net.denied_domains.iter().any(|d| d.to_ascii_lowercase() == lower) {
                return PermissionCheckResult::denied(format!("{domain} is on the denied domain list"), true);
            }
            let allowed = net.allowed_domains.iter().any(|rule| domain_matches(rule, &lower));
            if !allowed {
                return PermissionCheckResult::denied(format!("{domain} is not on the allowed domain list"), true);
            }
        }

        if let (Some(port), false) = (port, net.allowed_ports.is_empty()) {
            if !net.allowed_ports.contains(&port) {
                return PermissionCheckResult::denied(format!("port {port} is not allowed"), true);
            }
        }

        let _ = ip; // IP range matching is delegated to the concrete provider; checker only enforces domain/port rules here.
        PermissionCheckResult::granted("network access permitted")
    }

    /// Checks whether a resource request of `amount` for `kind` (e.g.
    /// `"cpu"`, `"memory"`, `"execution_time_ms"`, `"process_count"`) would
    /// exceed the sandbox's configured limit.
    #[must_use]
    pub fn check_resource_limit(&self, kind: &str, amount: u64) -> PermissionCheckResult {
        let limits = &self.permissions.resources;
        let (limit, can_escalate) = match kind {
            "cpu" => (limits.max_cpu_units, true),
            "memory" => (limits.max_memory_bytes, true),
            // Execution-time limits are hard per `spec.md` §4.4.
            "execution_time_ms" => (limits.max_execution_time_ms, false),
            "process_count" => (limits.max_process_count, true),
            _ => (None, true),
        };
        match limit {
            Some(limit) if amount > limit => {
                PermissionCheckResult::denied(format!("{kind} request {amount} exceeds limit {limit}"), can_escalate)
            }
            _ => PermissionCheckResult::granted(format!("{kind} request {amount} is within limit")),
        }
    }

    /// Checks whether the sandbox holds a named capability.
    #[must_use]
    pub fn check_capability(&self, name: &str) -> PermissionCheckResult {
        if self.permissions.capabilities.contains(name) {
            PermissionCheckResult::granted(format!("capability {name} granted"))
        } else {
            PermissionCheckResult::denied(format!("capability {name} not granted"), true)
        }
    }

    /// Opens `path` for reading through a capability handle rooted at the
    /// matching allowed directory, refusing to follow symlinks.
    ///
    /// `check_filesystem_read` above is a lexical, non-IO pre-check: it
    /// answers "does policy allow this path" without touching disk, which
    /// is also all a dry-run or simulation provider needs. This method is
    /// the actual enforcement boundary for a provider that performs real
    /// file I/O — it re-runs the declarative check and then opens the file
    /// through a `cap_std::fs::Dir` rooted at the matching allowed
    /// directory, so a symlink planted inside an allowed directory cannot
    /// redirect the open to a path outside it (the lexical check alone
    /// cannot detect that, since it never touches the filesystem).
    ///
    /// # Errors
    /// Returns [`RootedOpenError::Denied`] if the declarative check fails,
    /// or [`RootedOpenError::Io`] if the capability handle cannot be opened.
    pub fn open_rooted_read(&self, path: &str) -> Result<RootedFile, RootedOpenError> {
        let check = self.check_filesystem_read(path);
        if !check.granted {
            return Err(RootedOpenError::Denied(check.reason));
        }
        self.open_rooted(path, false)
    }

    /// Opens `path` for writing through a capability handle rooted at the
    /// matching allowed directory, refusing to follow symlinks. See
    /// [`Self::open_rooted_read`] for the rationale.
    ///
    /// # Errors
    /// Returns [`RootedOpenError::Denied`] if the declarative check fails,
    /// or [`RootedOpenError::Io`] if the capability handle cannot be opened.
    pub fn open_rooted_write(&self, path: &str) -> Result<RootedFile, RootedOpenError> {
        let check = self.check_filesystem_write(path);
        if !check.granted {
            return Err(RootedOpenError::Denied(check.reason));
        }
        self.open_rooted(path, true)
    }

    fn open_rooted(&self, path: &str, for_write: bool) -> Result<RootedFile, RootedOpenError> {
        let normalized = normalize(path);
        let fs = &self.permissions.filesystem;
        let root = if for_write {
            matching_root(fs.read_write_paths.iter().map(String::as_str), &normalized)
        } else {
            matching_root(fs.read_only_paths.iter().chain(fs.read_write_paths.iter()).map(String::as_str), &normalized)
        }
        .ok_or_else(|| RootedOpenError::Denied(format!("{path} is not within any allowed path")))?;

        let relative = normalized.strip_prefix(&root).unwrap_or_else(|_| Path::new(""));
        let dir = Dir::open_ambient_dir(&root, ambient_authority()).map_err(|source| RootedOpenError::Io {
            path: root.display().to_string(),
            source,
        })?;
        let mut options = OpenOptions::new();
        options.read(true);
        if for_write {
            options.write(true);
            options.create(true);
        }
        options._cap_fs_ext_follow(FollowSymlinks::No);
        dir.open_with(relative, &options).map_err(|source| RootedOpenError::Io {
            path: path.to_string(),
            source,
        })
    }

    /// Checks whether the sandbox may read the named environment variable.
    #[must_use]
    pub fn check_env_var(&self, name: &str) -> PermissionCheckResult {
        if self.permissions.allowed_env_vars.contains(name) {
            PermissionCheckResult::granted(format!("env var {name} allowed"))
        } else {
            PermissionCheckResult::denied(format!("env var {name} not allowed"), true)
        }
    }
}

fn domain_matches(rule: &str, candidate_lower: &str) -> bool {
    let rule_lower = rule.to_ascii_lowercase();
    if let Some(suffix) = rule_lower.strip_prefix("*.") {
        candidate_lower == suffix || candidate_lower.ends_with(&format!(".{suffix}"))
    } else {
        candidate_lower == rule_lower
    }
}
