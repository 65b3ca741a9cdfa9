// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Repository identity.
//!
//! Every repository that grove knows about is identified by a __reference__:
//! a validated triple of host, owner, and name. The reference doubles as the
//! relative location of the repository below a root directory, i.e.,
//! `<root>/<host>/<owner>/<name>`. Thus, the validation rules below exist to
//! keep that three-level layout unambiguous on disk.
//!
//! # Validation Order
//!
//! Fields are validated most-significant first: host, then owner, then name.
//! Only the first failing field is reported.

use regex::Regex;
use serde::Serialize;
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
    sync::LazyLock,
};
use url::Url;

static OWNER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]+(?:-[a-zA-Z0-9]+)*$").expect("valid owner pattern"));

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_.\-]+$").expect("valid name pattern"));

/// Validated reference to a repository.
///
/// Immutable once constructed. Compared by value, and rendered in its
/// canonical form `host/owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RepoRef {
    host: String,
    owner: String,
    name: String,
}

impl RepoRef {
    /// Construct new repository reference.
    ///
    /// # Errors
    ///
    /// - Return [`ValidationError`] for the first field that fails
    ///   validation, checked in host, owner, name order.
    pub fn new(
        host: impl Into<String>,
        owner: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self> {
        let host = host.into();
        let owner = owner.into();
        let name = name.into();

        validate_host(&host)?;
        validate_owner(&owner)?;
        validate_name(&name)?;

        Ok(Self { host, owner, name })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Copy of this reference with a different name.
    ///
    /// # Errors
    ///
    /// - Return [`ValidationError`] if new name is invalid.
    pub fn with_name(&self, name: impl Into<String>) -> Result<Self> {
        Self::new(self.host.clone(), self.owner.clone(), name)
    }

    /// Copy of this reference with a different owner and name.
    ///
    /// # Errors
    ///
    /// - Return [`ValidationError`] if new owner or name is invalid.
    pub fn with_owner_name(
        &self,
        owner: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self> {
        Self::new(self.host.clone(), owner, name)
    }

    /// HTTPS clone URL, e.g., `https://github.com/kyoh86/gogh`.
    pub fn https_url(&self) -> String {
        format!("https://{}/{}/{}", self.host, self.owner, self.name)
    }

    /// SSH clone URL in scp form, e.g., `git@github.com:kyoh86/gogh.git`.
    pub fn ssh_url(&self) -> String {
        format!("git@{}:{}/{}.git", self.host, self.owner, self.name)
    }

    /// Clone URL for requested transport.
    pub fn url(&self, ssh: bool) -> String {
        if ssh {
            self.ssh_url()
        } else {
            self.https_url()
        }
    }
}

impl Display for RepoRef {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(fmt, "{}/{}/{}", self.host, self.owner, self.name)
    }
}

/// Parse canonical `host/owner/name` form only.
///
/// Partial references need the defaulting rules of
/// [`Resolver`](crate::resolve::Resolver) instead.
impl FromStr for RepoRef {
    type Err = ValidationError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut parts = data.splitn(3, '/');
        let host = parts.next().unwrap_or_default();
        let owner = parts.next().unwrap_or_default();
        let name = parts.next().unwrap_or_default();
        Self::new(host, owner, name)
    }
}

/// Check that host is usable as the authority of a URL.
///
/// The host may carry a port, but nothing else: user info, paths, queries,
/// and whitespace are all rejected.
///
/// # Errors
///
/// - Return [`ValidationError::EmptyHost`] if host is empty.
/// - Return [`ValidationError::InvalidHost`] if host is not a bare authority.
pub fn validate_host(host: &str) -> Result<()> {
    if host.is_empty() {
        return Err(ValidationError::EmptyHost);
    }

    let invalid = |reason: String| ValidationError::InvalidHost {
        host: host.to_string(),
        reason,
    };

    let parsed = Url::parse(&format!("https://{host}/")).map_err(|err| invalid(err.to_string()))?;
    let authority = match (parsed.host_str(), parsed.port()) {
        (Some(name), Some(port)) => format!("{name}:{port}"),
        (Some(name), None) => name.to_string(),
        (None, _) => return Err(invalid("missing host component".into())),
    };

    // INVARIANT: Host must round-trip through URL parsing untouched.
    if !authority.eq_ignore_ascii_case(host) {
        return Err(invalid("contains characters outside of a host component".into()));
    }

    Ok(())
}

/// Check owner is alphanumeric runs separated by single hyphens.
///
/// # Errors
///
/// - Return [`ValidationError::EmptyOwner`] if owner is empty.
/// - Return [`ValidationError::InvalidOwner`] if owner does not match.
pub fn validate_owner(owner: &str) -> Result<()> {
    if owner.is_empty() {
        return Err(ValidationError::EmptyOwner);
    }

    if !OWNER_PATTERN.is_match(owner) {
        return Err(ValidationError::InvalidOwner {
            owner: owner.to_string(),
            reason: "must be alphanumeric runs separated by single hyphens".into(),
        });
    }

    Ok(())
}

/// Check name is word characters, hyphens, and dots, but not a dot path.
///
/// # Errors
///
/// - Return [`ValidationError::EmptyName`] if name is empty.
/// - Return [`ValidationError::InvalidName`] if name does not match.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }

    if name == "." || name == ".." {
        return Err(ValidationError::InvalidName {
            name: name.to_string(),
            reason: "'.' and '..' are reserved".into(),
        });
    }

    if !NAME_PATTERN.is_match(name) {
        return Err(ValidationError::InvalidName {
            name: name.to_string(),
            reason: "may only contain word characters, '-', and '.'".into(),
        });
    }

    Ok(())
}

/// Repository reference validation failures.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("empty host")]
    EmptyHost,

    #[error("invalid host {host:?}: {reason}")]
    InvalidHost { host: String, reason: String },

    #[error("empty owner")]
    EmptyOwner,

    #[error("invalid owner {owner:?}: {reason}")]
    InvalidOwner { owner: String, reason: String },

    #[error("empty name")]
    EmptyName,

    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },
}

/// Friendly result alias :3
type Result<T, E = ValidationError> = std::result::Result<T, E>;
