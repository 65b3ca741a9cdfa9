// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Project listing formats.
//!
//! The interesting format is the __short__ format. Given a batch of projects,
//! every project is printed as the shortest suffix of its relative path that
//! no other project in the batch shares. So `github.com/kyoh86/gogh` prints as
//! `gogh`, unless some other project is also named `gogh`, in which case it
//! prints as `kyoh86/gogh`, and so on.
//!
//! Short names need to see the whole batch before the first one can be
//! printed, so [`ShortNames`] is fed every project through
//! [`ShortNames::add`] first.

use crate::project::Project;

use serde::Serialize;
use std::{collections::HashSet, str::FromStr};

/// Shortest unique name calculator.
#[derive(Debug, Default, Clone)]
pub struct ShortNames {
    added: HashSet<String>,
    seen: HashSet<String>,
    shared: HashSet<String>,
}

impl ShortNames {
    /// Construct new empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add project to batch.
    ///
    /// Adding the same project twice has no further effect.
    pub fn add(&mut self, project: &Project) {
        let full = full_name(project);
        if !self.added.insert(full) {
            return;
        }

        for suffix in project.suffixes() {
            // INVARIANT: Suffix seen a second time is shared.
            if !self.seen.insert(suffix.clone()) {
                self.shared.insert(suffix);
            }
        }
    }

    /// Shortest suffix of project that no other project shares.
    ///
    /// Falls back to the absolute path of the project when even its relative
    /// path is shared, i.e., the same reference exists in multiple roots.
    pub fn format(&self, project: &Project) -> String {
        project
            .suffixes()
            .into_iter()
            .find(|suffix| !self.shared.contains(suffix))
            .unwrap_or_else(|| full_name(project))
    }
}

fn full_name(project: &Project) -> String {
    project.full_path().display().to_string()
}

/// Output format for project listings.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ProjectFormat {
    /// Shortest unique name within the listing.
    #[default]
    Short,

    /// Absolute path.
    Full,

    /// Path relative to root.
    Rel,

    /// Remote URL.
    Url,

    /// One JSON object per project.
    Json,
}

impl ProjectFormat {
    /// Format every project of a batch.
    ///
    /// # Errors
    ///
    /// - Return [`FormatError::Json`] if JSON serialization fails.
    pub fn format_batch(&self, projects: &[Project], ssh: bool) -> Result<Vec<String>> {
        match self {
            Self::Short => {
                let mut names = ShortNames::new();
                for project in projects {
                    names.add(project);
                }
                Ok(projects.iter().map(|project| names.format(project)).collect())
            }
            Self::Full => Ok(projects.iter().map(full_name).collect()),
            Self::Rel => Ok(projects.iter().map(Project::rel_name).collect()),
            Self::Url => Ok(projects.iter().map(|project| project.url(ssh)).collect()),
            Self::Json => projects
                .iter()
                .map(|project| {
                    serde_json::to_string(&ProjectRecord::new(project, ssh)).map_err(FormatError::Json)
                })
                .collect(),
        }
    }
}

impl FromStr for ProjectFormat {
    type Err = FormatError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        match data {
            "short" => Ok(Self::Short),
            "full" => Ok(Self::Full),
            "rel" => Ok(Self::Rel),
            "url" => Ok(Self::Url),
            "json" => Ok(Self::Json),
            other => Err(FormatError::Unknown(other.to_string())),
        }
    }
}

#[derive(Serialize)]
struct ProjectRecord<'a> {
    root: String,
    host: &'a str,
    owner: &'a str,
    name: &'a str,
    path: String,
    url: String,
}

impl<'a> ProjectRecord<'a> {
    fn new(project: &'a Project, ssh: bool) -> Self {
        let reference = project.reference();
        Self {
            root: project.root().display().to_string(),
            host: reference.host(),
            owner: reference.owner(),
            name: reference.name(),
            path: full_name(project),
            url: project.url(ssh),
        }
    }
}

/// Listing format error types.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("unknown format {0:?}, expected one of: short, full, rel, url, json")]
    Unknown(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Friendly result alias :3
type Result<T, E = FormatError> = std::result::Result<T, E>;
