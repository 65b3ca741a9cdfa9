// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Local project view.
//!
//! A __project__ is where a repository lives, or would live, on the local
//! file system: a root directory joined with the three parts of a
//! [`RepoRef`]. Projects are never cached. Whether a project exists is
//! checked against the file system every time it is asked for.

use crate::repo::RepoRef;

use std::path::{Path, PathBuf};

/// Name of the directory that marks a directory as a repository.
pub const MARKER_DIR: &str = ".git";

/// Repository location below a root directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Project {
    root: PathBuf,
    reference: RepoRef,
}

impl Project {
    /// Construct new project view.
    pub fn new(root: impl Into<PathBuf>, reference: RepoRef) -> Self {
        Self {
            root: root.into(),
            reference,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn reference(&self) -> &RepoRef {
        &self.reference
    }

    /// Absolute path to project, i.e., `root/host/owner/name`.
    pub fn full_path(&self) -> PathBuf {
        self.root.join(self.rel_path())
    }

    /// Path to project relative to its root.
    pub fn rel_path(&self) -> PathBuf {
        [
            self.reference.host(),
            self.reference.owner(),
            self.reference.name(),
        ]
        .iter()
        .collect()
    }

    /// Relative path with forward slashes regardless of platform.
    pub fn rel_name(&self) -> String {
        self.reference.to_string()
    }

    /// Check if project contains a repository marker directory.
    pub fn exists(&self) -> bool {
        self.full_path().join(MARKER_DIR).is_dir()
    }

    /// Path suffixes ordered from shortest to longest.
    ///
    /// For `github.com/kyoh86/gogh` this is `gogh`, `kyoh86/gogh`, and
    /// `github.com/kyoh86/gogh`.
    pub fn suffixes(&self) -> [String; 3] {
        let name = self.reference.name();
        let owner = self.reference.owner();
        [
            name.to_string(),
            format!("{owner}/{name}"),
            self.reference.to_string(),
        ]
    }

    /// Check if query appears in any of the names of this project.
    ///
    /// Empty query matches every project.
    pub fn matches(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }

        let [name, owner_name, rel] = self.suffixes();
        rel.contains(query)
            || self.reference.owner().contains(query)
            || name.contains(query)
            || owner_name.contains(query)
    }

    /// Clone URL of the repository this project is a view of.
    pub fn url(&self, ssh: bool) -> String {
        self.reference.url(ssh)
    }
}
