// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Local project store management.
//!
//! Grove keeps local clones below one or more __root__ directories. Each root
//! is managed by a [`LocalStore`], and all roots together form a
//! [`Workspace`]. The first root of a workspace is its __primary__ root, which
//! is where new projects are created and cloned into.
//!
//! # Root Layout
//!
//! Every project sits exactly three levels below its root, at
//! `<root>/<host>/<owner>/<name>`. A directory is a project if it contains a
//! `.git` marker directory. Projects cannot be nested: once a project is
//! found, nothing below it is looked at. Markers above project depth are
//! walked through as if they were not there. Marked directories at project
//! depth whose path does not form a valid reference, or marked directories
//! below project depth, are stray directories and are skipped without
//! complaint. Entries below root that cannot be read are logged and skipped.

use crate::{
    git::{CloneOptions, Git2, GitAccess, GitError},
    project::{Project, MARKER_DIR},
    repo::RepoRef,
};

use std::{
    fs,
    io::ErrorKind,
    path::{Component, Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

/// What visitor wants after seeing a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkAction {
    /// Keep walking.
    Continue,

    /// Stop the walk early.
    Stop,
}

/// Depth of project directories below root.
const PROJECT_DEPTH: usize = 3;

/// How the walker treats a directory node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Descend,
    Skip,
    Stop,
}

/// Projects below a single root directory.
#[derive(Debug, Clone)]
pub struct LocalStore<G = Git2>
where
    G: GitAccess,
{
    root: PathBuf,
    git: G,
}

impl LocalStore<Git2> {
    /// Open store at root through libgit2.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self::with_git(root, Git2)
    }
}

impl<G> LocalStore<G>
where
    G: GitAccess,
{
    /// Open store at root with custom Git access.
    pub fn with_git(root: impl Into<PathBuf>, git: G) -> Self {
        Self {
            root: root.into(),
            git,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Project view of reference in this root.
    pub fn project(&self, reference: RepoRef) -> Project {
        Project::new(&self.root, reference)
    }

    /// Create new empty project.
    ///
    /// Initializes a repository at the project path, and registers the
    /// reference's URL as its `origin` remote.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::AlreadyExists`] if project already exists.
    /// - Return [`StoreError::Git`] if Git operations fail.
    #[instrument(skip(self, reference), fields(reference = %reference), level = "debug")]
    pub fn create(&self, reference: RepoRef, ssh: bool) -> Result<Project> {
        let project = self.project(reference);
        if project.exists() {
            return Err(StoreError::AlreadyExists(project.full_path()));
        }

        let path = project.full_path();
        info!("create project {}", project.rel_name());
        self.git
            .init(&path)
            .map_err(|source| StoreError::git("init", &path, source))?;
        self.git
            .set_remote_urls(&path, "origin", &[project.url(ssh)])
            .map_err(|source| StoreError::git("set remote", &path, source))?;

        Ok(project)
    }

    /// Clone remote repository into new project.
    ///
    /// Project is placed at the alias if one is given, but is always cloned
    /// from the URL of the reference itself.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::AlreadyExists`] if project already exists.
    /// - Return [`StoreError::Git`] if Git operations fail.
    #[instrument(skip(self, reference, alias, options), fields(reference = %reference), level = "debug")]
    pub fn clone_project(
        &self,
        reference: &RepoRef,
        alias: Option<&RepoRef>,
        ssh: bool,
        options: &CloneOptions,
    ) -> Result<Project> {
        let project = self.project(alias.unwrap_or(reference).clone());
        if project.exists() {
            return Err(StoreError::AlreadyExists(project.full_path()));
        }

        let path = project.full_path();
        let url = reference.url(ssh);
        match self.git.clone_repo(&url, &path, options) {
            Ok(()) => {}
            Err(GitError::AlreadyExists(path)) => return Err(StoreError::AlreadyExists(path)),
            Err(source) => return Err(StoreError::git("clone", &path, source)),
        }

        Ok(project)
    }

    /// Fast-forward existing project from its upstream.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::NotExist`] if project does not exist.
    /// - Return [`StoreError::Git`] if Git operations fail.
    pub fn update(&self, reference: RepoRef) -> Result<Project> {
        let project = self.find(reference)?;
        let path = project.full_path();
        self.git
            .pull(&path)
            .map_err(|source| StoreError::git("pull", &path, source))?;

        Ok(project)
    }

    /// Find existing project by reference.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::NotExist`] if project does not exist.
    pub fn find(&self, reference: RepoRef) -> Result<Project> {
        let project = self.project(reference);
        if !project.exists() {
            return Err(StoreError::NotExist(project.full_path()));
        }

        Ok(project)
    }

    /// Walk root depth-first, visiting every project matching query.
    ///
    /// Empty query matches all projects. Missing root means no projects.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::Walk`] if root cannot be read.
    /// - Return visitor's error as-is.
    pub fn walk<F>(&self, query: &str, mut visit: F) -> Result<WalkAction>
    where
        F: FnMut(Project) -> Result<WalkAction>,
    {
        if !self.root.is_dir() {
            debug!("root {:?} does not exist", self.root.display());
            return Ok(WalkAction::Continue);
        }

        let mut entries = WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = entries.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(source) if source.depth() == 0 => {
                    return Err(StoreError::Walk {
                        root: self.root.clone(),
                        source,
                    });
                }
                Err(err) => {
                    warn!("skip unreadable entry: {err}");
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();
            // INVARIANT: Never walk marker internals.
            let step = if entry.file_name() == MARKER_DIR {
                Step::Skip
            } else if !path.join(MARKER_DIR).is_dir() {
                Step::Descend
            } else {
                match entry.depth() {
                    // INVARIANT: Markers above project depth are pass-through.
                    depth if depth < PROJECT_DEPTH => Step::Descend,
                    PROJECT_DEPTH => match self.project_at(path) {
                        Some(project) if project.matches(query) => match visit(project)? {
                            WalkAction::Continue => Step::Skip,
                            WalkAction::Stop => Step::Stop,
                        },
                        Some(_) => Step::Skip,
                        None => {
                            debug!("skip invalid project path {:?}", path.display());
                            Step::Skip
                        }
                    },
                    _ => {
                        debug!("skip nested repository at {:?}", path.display());
                        Step::Skip
                    }
                }
            };

            match step {
                Step::Descend => {}
                Step::Skip => entries.skip_current_dir(),
                Step::Stop => return Ok(WalkAction::Stop),
            }
        }

        Ok(WalkAction::Continue)
    }

    /// List all projects matching query.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::Walk`] if root cannot be read.
    pub fn list(&self, query: &str) -> Result<Vec<Project>> {
        let mut projects = Vec::new();
        self.walk(query, |project| {
            projects.push(project);
            Ok(WalkAction::Continue)
        })?;

        Ok(projects)
    }

    /// Delete project directory recursively.
    ///
    /// Empty owner and host directories left behind are removed as well.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::NotExist`] if project path does not exist.
    /// - Return [`StoreError::NotADirectory`] if project path is not a
    ///   directory.
    /// - Return [`StoreError::Remove`] if removal fails.
    #[instrument(skip(self, reference), fields(reference = %reference), level = "debug")]
    pub fn delete(&self, reference: RepoRef) -> Result<()> {
        let project = self.project(reference);
        let path = project.full_path();
        let metadata = match fs::symlink_metadata(&path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotExist(path));
            }
            Err(source) => return Err(StoreError::Remove { path, source }),
        };

        if !metadata.is_dir() {
            return Err(StoreError::NotADirectory(path));
        }

        info!("delete project {}", project.rel_name());
        fs::remove_dir_all(&path).map_err(|source| StoreError::Remove {
            path: path.clone(),
            source,
        })?;

        // INVARIANT: Never remove root itself.
        for parent in path.ancestors().skip(1).take(2) {
            if parent == self.root || fs::remove_dir(parent).is_err() {
                break;
            }
            debug!("removed empty directory {:?}", parent.display());
        }

        Ok(())
    }

    /// Find project containing a path below this root.
    pub fn project_containing(&self, path: &Path) -> Option<Project> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let mut parts = rel.components().filter_map(|component| match component {
            Component::Normal(part) => part.to_str(),
            _ => None,
        });
        let reference = RepoRef::new(parts.next()?, parts.next()?, parts.next()?).ok()?;
        let project = self.project(reference);

        project.exists().then_some(project)
    }

    /// List URLs of a project's remote.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::NotExist`] if project does not exist.
    /// - Return [`StoreError::Git`] if Git operations fail.
    pub fn remote_urls(&self, reference: RepoRef, remote: &str) -> Result<Vec<String>> {
        let path = self.find(reference)?.full_path();
        self.git
            .remote_urls(&path, remote)
            .map_err(|source| StoreError::git("get remote", &path, source))
    }

    /// Replace URLs of a project's remote.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::NotExist`] if project does not exist.
    /// - Return [`StoreError::Git`] if Git operations fail.
    pub fn set_remote_urls(&self, reference: RepoRef, remote: &str, urls: &[String]) -> Result<()> {
        let path = self.find(reference)?.full_path();
        self.git
            .set_remote_urls(&path, remote, urls)
            .map_err(|source| StoreError::git("set remote", &path, source))
    }

    fn project_at(&self, path: &Path) -> Option<Project> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let parts = rel
            .components()
            .map(|component| match component {
                Component::Normal(part) => part.to_str(),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()?;

        match parts.as_slice() {
            [host, owner, name] => RepoRef::new(*host, *owner, *name)
                .ok()
                .map(|reference| self.project(reference)),
            _ => None,
        }
    }
}

/// All roots known to grove, primary root first.
#[derive(Debug, Clone)]
pub struct Workspace<G = Git2>
where
    G: GitAccess,
{
    stores: Vec<LocalStore<G>>,
}

impl Workspace<Git2> {
    /// Open workspace over roots through libgit2.
    pub fn open(roots: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self::with_git(roots, Git2)
    }
}

impl<G> Workspace<G>
where
    G: GitAccess + Clone,
{
    /// Open workspace over roots with custom Git access.
    pub fn with_git(roots: impl IntoIterator<Item = impl Into<PathBuf>>, git: G) -> Self {
        let stores = roots
            .into_iter()
            .map(|root| LocalStore::with_git(root, git.clone()))
            .collect();

        Self { stores }
    }
}

impl<G> Workspace<G>
where
    G: GitAccess,
{
    /// Store of primary root.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::NoRoot`] if workspace has no roots.
    pub fn primary(&self) -> Result<&LocalStore<G>> {
        self.stores.first().ok_or(StoreError::NoRoot)
    }

    pub fn stores(&self) -> &[LocalStore<G>] {
        &self.stores
    }

    /// List projects matching query across roots.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::Walk`] if root cannot be read.
    pub fn list(&self, query: &str, primary_only: bool) -> Result<Vec<Project>> {
        let take = if primary_only { 1 } else { self.stores.len() };
        let mut projects = Vec::new();
        for store in self.stores.iter().take(take) {
            projects.extend(store.list(query)?);
        }

        Ok(projects)
    }

    /// Find existing project by reference in first root that has it.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::NotExist`] if no root has the project.
    pub fn find(&self, reference: &RepoRef) -> Result<Project> {
        self.stores
            .iter()
            .find_map(|store| store.find(reference.clone()).ok())
            .ok_or_else(|| StoreError::NotExist(PathBuf::from(reference.to_string())))
    }

    /// Project view of reference in first root that has it, else in primary
    /// root.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::NoRoot`] if workspace has no roots.
    pub fn locate(&self, reference: &RepoRef) -> Result<Project> {
        Ok(self.store_of(reference)?.project(reference.clone()))
    }

    /// Delete project from first root that has it, else from primary root.
    ///
    /// Leftover paths without a marker are still deleted from the primary
    /// root, so long as they are directories.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::NoRoot`] if workspace has no roots.
    /// - Return same errors as [`LocalStore::delete`].
    pub fn delete(&self, reference: &RepoRef) -> Result<()> {
        self.store_of(reference)?.delete(reference.clone())
    }

    fn store_of(&self, reference: &RepoRef) -> Result<&LocalStore<G>> {
        match self
            .stores
            .iter()
            .find(|store| store.project(reference.clone()).exists())
        {
            Some(store) => Ok(store),
            None => self.primary(),
        }
    }

    /// Find the one project matching query across roots.
    ///
    /// A project whose name, `owner/name`, or relative path equals query is
    /// preferred over projects that merely contain it.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::NotExist`] if nothing matches.
    /// - Return [`StoreError::MultipleMatches`] if query is ambiguous.
    pub fn find_one(&self, query: &str) -> Result<Project> {
        let mut matches = self.list(query, false)?;
        let exact = matches
            .iter()
            .filter(|project| project.suffixes().iter().any(|suffix| suffix == query))
            .cloned()
            .collect::<Vec<_>>();
        if !exact.is_empty() {
            matches = exact;
        }

        match matches.len() {
            0 => Err(StoreError::NotExist(PathBuf::from(query))),
            1 => Ok(matches.remove(0)),
            _ => Err(StoreError::MultipleMatches {
                query: query.to_string(),
                candidates: matches
                    .iter()
                    .map(|project| project.full_path().display().to_string())
                    .collect(),
            }),
        }
    }

    /// Find project containing a path in any root.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::NotExist`] if path is not inside a project.
    pub fn find_by_path(&self, path: &Path) -> Result<Project> {
        self.stores
            .iter()
            .find_map(|store| store.project_containing(path))
            .ok_or_else(|| StoreError::NotExist(path.to_path_buf()))
    }
}

/// All possible error types for project store interaction.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Project is already present. Usually not fatal.
    #[error("project already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("project {0:?} does not exist")]
    NotExist(PathBuf),

    #[error("project path {0:?} is not a directory")]
    NotADirectory(PathBuf),

    #[error("{query:?} matches multiple projects:\n  {}", candidates.join("\n  "))]
    MultipleMatches {
        query: String,
        candidates: Vec<String>,
    },

    #[error("no root directory configured")]
    NoRoot,

    #[error("failed to walk root {root:?}")]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to remove {path:?}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("git {operation} failed at {path:?}")]
    Git {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: GitError,
    },
}

impl StoreError {
    fn git(operation: &'static str, path: &Path, source: GitError) -> Self {
        Self::Git {
            operation,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Project was already present.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }
}

/// Friendly result alias :3
type Result<T, E = StoreError> = std::result::Result<T, E>;
