// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Git plumbing.
//!
//! Grove never implements Git itself. Instead, everything that touches a
//! repository goes through the narrow [`GitAccess`] interface: initialize,
//! clone, pull, and manage remotes. The default implementation, [`Git2`],
//! sits on top of libgit2, and only shells out to the Git binary for pulls.
//!
//! # Remote URLs
//!
//! A remote may carry more than one URL. Git stores these as repeated
//! `remote.<name>.url` entries in the repository's local configuration file,
//! so [`GitAccess::remote_urls`] and [`GitAccess::set_remote_urls`] read and
//! write that multivar directly.

use crate::server::Server;

use auth_git2::{GitAuthenticator, Prompter};
use git2::{
    build::RepoBuilder, Config, ConfigLevel, ErrorCode, FetchOptions, RemoteCallbacks, Repository,
};
use indicatif::{ProgressBar, ProgressStyle};
use inquire::{Password, Text};
use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    process::Command,
    time,
};
use tracing::{debug, info, instrument};

/// Options for cloning a repository.
#[derive(Debug, Default, Clone)]
pub struct CloneOptions {
    /// Server whose token should be offered for authentication.
    pub credentials: Option<Server>,

    /// Only fetch the latest commit.
    pub shallow: bool,
}

/// Layer of indirection for Git access.
pub trait GitAccess {
    /// Initialize new repository at path, creating missing directories.
    fn init(&self, path: &Path) -> Result<()>;

    /// Clone repository from URL into path.
    fn clone_repo(&self, url: &str, path: &Path, options: &CloneOptions) -> Result<()>;

    /// Fast-forward repository at path from its upstream.
    fn pull(&self, path: &Path) -> Result<()>;

    /// List names of all remotes.
    fn remote_names(&self, path: &Path) -> Result<Vec<String>>;

    /// List URLs of a remote.
    fn remote_urls(&self, path: &Path, name: &str) -> Result<Vec<String>>;

    /// Replace URLs of a remote, creating the remote if needed.
    fn set_remote_urls(&self, path: &Path, name: &str, urls: &[String]) -> Result<()>;

    /// Add new remote.
    fn add_remote(&self, path: &Path, name: &str, url: &str) -> Result<()>;

    /// Remove existing remote.
    fn remove_remote(&self, path: &Path, name: &str) -> Result<()>;

    /// Rename existing remote.
    fn rename_remote(&self, path: &Path, old: &str, new: &str) -> Result<()>;
}

/// Git access through libgit2.
#[derive(Debug, Default, Clone, Copy)]
pub struct Git2;

impl Git2 {
    fn open(&self, path: &Path) -> Result<Repository> {
        Ok(Repository::open(path)?)
    }

    fn ensure_remote(&self, repository: &Repository, name: &str) -> Result<()> {
        match repository.find_remote(name) {
            Ok(_) => Ok(()),
            Err(err) if is_not_found(&err) => Err(GitError::RemoteNotFound(name.to_string())),
            Err(err) => Err(err.into()),
        }
    }
}

impl GitAccess for Git2 {
    #[instrument(skip(self), level = "debug")]
    fn init(&self, path: &Path) -> Result<()> {
        info!("initialize new repository: {:?}", path.display());
        create_dir(path)?;
        Repository::init(path)?;

        Ok(())
    }

    /// Clone repository from URL into path.
    ///
    /// The progress of the clone is displayed through a progress bar. If the
    /// options carry an authenticated server, its token is offered first.
    /// Otherwise, or if that fails, the user will be prompted for
    /// credentials. The progress bar will be blocked for user input.
    ///
    /// # Errors
    ///
    /// - Return [`GitError::AlreadyExists`] if path is a non-empty directory.
    /// - Return [`GitError::Git2`] if libgit2 operations fail.
    #[instrument(skip(self, options), level = "debug")]
    fn clone_repo(&self, url: &str, path: &Path, options: &CloneOptions) -> Result<()> {
        info!("clone {url} into {:?}", path.display());
        if let Some(parent) = path.parent() {
            create_dir(parent)?;
        }

        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{elapsed_precise:.green}  {msg:<50}  [{wide_bar:.yellow/blue}]",
        )?
        .progress_chars("-Cco.");
        bar.set_style(style);
        bar.set_message(url.to_string());
        bar.enable_steady_tick(time::Duration::from_millis(100));

        let prompter = IndicatifPrompter::new(bar.clone());
        let mut authenticator = GitAuthenticator::default().set_prompter(prompter);
        if let Some(server) = options.credentials.as_ref().filter(|s| s.is_authenticated()) {
            debug!("offer token of {} for {}", server.user(), server.host());
            authenticator =
                authenticator.add_plaintext_credentials(server.host(), server.user(), server.token());
        }
        let config = Config::open_default()?;

        let mut throttle = time::Instant::now();
        let mut rc = RemoteCallbacks::new();
        rc.credentials(authenticator.credentials(&config));
        rc.transfer_progress(|progress| {
            if throttle.elapsed() > time::Duration::from_millis(10) {
                throttle = time::Instant::now();
                bar.set_length(progress.total_objects() as u64);
                bar.set_position(progress.received_objects() as u64);
            }
            true
        });

        let mut fo = FetchOptions::new();
        fo.remote_callbacks(rc);
        if options.shallow {
            fo.depth(1);
        }

        let result = RepoBuilder::new().fetch_options(fo).clone(url, path);
        bar.finish_and_clear();

        match result {
            Ok(_) => Ok(()),
            Err(err) if err.code() == ErrorCode::Exists => {
                Err(GitError::AlreadyExists(path.to_path_buf()))
            }
            Err(err) => Err(err.into()),
        }
    }

    #[instrument(skip(self), level = "debug")]
    fn pull(&self, path: &Path) -> Result<()> {
        let output = syscall_non_interactive(
            "git",
            [
                OsStr::new("-C"),
                path.as_os_str(),
                OsStr::new("pull"),
                OsStr::new("--ff-only"),
            ],
        )?;
        info!("{output}");

        Ok(())
    }

    fn remote_names(&self, path: &Path) -> Result<Vec<String>> {
        let repository = self.open(path)?;
        let remotes = repository.remotes()?;

        Ok(remotes.iter().flatten().map(ToString::to_string).collect())
    }

    fn remote_urls(&self, path: &Path, name: &str) -> Result<Vec<String>> {
        let repository = self.open(path)?;
        self.ensure_remote(&repository, name)?;

        let config = repository.config()?;
        let mut entries = config.multivar(&format!("remote.{name}.url"), None)?;
        let mut urls = Vec::new();
        while let Some(entry) = entries.next() {
            if let Some(value) = entry?.value() {
                urls.push(value.to_string());
            }
        }

        Ok(urls)
    }

    #[instrument(skip(self), level = "debug")]
    fn set_remote_urls(&self, path: &Path, name: &str, urls: &[String]) -> Result<()> {
        let Some(first) = urls.first() else {
            return Err(GitError::EmptyUrls(name.to_string()));
        };

        let repository = self.open(path)?;
        if let Err(err) = repository.find_remote(name) {
            if !is_not_found(&err) {
                return Err(err.into());
            }
            debug!("create remote {name:?} for {first}");
            repository.remote(name, first)?;
        }

        // INVARIANT: Replace every URL of the remote, not just the first.
        let key = format!("remote.{name}.url");
        let mut config = repository.config()?.open_level(ConfigLevel::Local)?;
        match config.remove_multivar(&key, ".*") {
            Err(err) if !is_not_found(&err) => return Err(err.into()),
            _ => {}
        }
        for url in urls {
            config.set_multivar(&key, "^$", url)?;
        }

        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    fn add_remote(&self, path: &Path, name: &str, url: &str) -> Result<()> {
        let repository = self.open(path)?;
        let result = match repository.remote(name, url) {
            Ok(_) => Ok(()),
            Err(err) if err.code() == ErrorCode::Exists => {
                Err(GitError::RemoteExists(name.to_string()))
            }
            Err(err) => Err(err.into()),
        };
        result
    }

    #[instrument(skip(self), level = "debug")]
    fn remove_remote(&self, path: &Path, name: &str) -> Result<()> {
        let repository = self.open(path)?;
        self.ensure_remote(&repository, name)?;
        repository.remote_delete(name)?;

        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    fn rename_remote(&self, path: &Path, old: &str, new: &str) -> Result<()> {
        let repository = self.open(path)?;
        self.ensure_remote(&repository, old)?;
        let problems = repository.remote_rename(old, new)?;
        for problem in problems.iter().flatten() {
            debug!("refspec of {old:?} not renamed: {problem}");
        }

        Ok(())
    }
}

/// Git2 authentication prompter for progress bar.
#[derive(Debug, Clone)]
pub struct IndicatifPrompter {
    bar: ProgressBar,
}

impl IndicatifPrompter {
    /// Construct new progress bar authenticator.
    pub fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }
}

impl Prompter for IndicatifPrompter {
    #[instrument(skip(self, url, _config), level = "debug")]
    fn prompt_username_password(
        &mut self,
        url: &str,
        _config: &git2::Config,
    ) -> Option<(String, String)> {
        info!("authentication required at {url}");
        self.bar.suspend(|| -> Option<(String, String)> {
            let username = Text::new("username").prompt().ok()?;
            let password = Password::new("password")
                .without_confirmation()
                .prompt()
                .ok()?;
            Some((username, password))
        })
    }

    #[instrument(skip(self, username, url, _config), level = "debug")]
    fn prompt_password(
        &mut self,
        username: &str,
        url: &str,
        _config: &git2::Config,
    ) -> Option<String> {
        info!("authentication required at {url} for user {username}");
        self.bar.suspend(|| -> Option<String> {
            Password::new("password")
                .without_confirmation()
                .prompt()
                .ok()
        })
    }

    #[instrument(skip(self, ssh_key_path, _config), level = "debug")]
    fn prompt_ssh_key_passphrase(
        &mut self,
        ssh_key_path: &Path,
        _config: &git2::Config,
    ) -> Option<String> {
        info!(
            "authentication required with ssh key at {}",
            ssh_key_path.display()
        );
        self.bar.suspend(|| -> Option<String> {
            Password::new("passphrase")
                .without_confirmation()
                .prompt()
                .ok()
        })
    }
}

fn create_dir(path: &Path) -> Result<()> {
    mkdirp::mkdirp(path).map_err(|source| GitError::CreateDir {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(())
}

fn is_not_found(err: &git2::Error) -> bool {
    err.code() == ErrorCode::NotFound
}

fn syscall_non_interactive(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> Result<String> {
    let output = Command::new(cmd.as_ref()).args(args).output()?;
    let stdout = String::from_utf8_lossy(output.stdout.as_slice()).into_owned();
    let stderr = String::from_utf8_lossy(output.stderr.as_slice()).into_owned();
    let mut message = String::new();

    if !stdout.is_empty() {
        message.push_str(format!("stdout: {stdout}").as_str());
    }

    if !stderr.is_empty() {
        message.push_str(format!("stderr: {stderr}").as_str());
    }

    // INVARIANT: Chomp trailing newlines.
    let message = message
        .strip_suffix("\r\n")
        .or(message.strip_suffix('\n'))
        .map(ToString::to_string)
        .unwrap_or(message);

    if !output.status.success() {
        return Err(GitError::Syscall(std::io::Error::other(format!(
            "command {:?} failed:\n{message}",
            cmd.as_ref()
        ))));
    }

    Ok(message)
}

/// Git access error types.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    /// Repository already occupies target path.
    #[error("repository already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("remote {0:?} not found")]
    RemoteNotFound(String),

    #[error("remote {0:?} already exists")]
    RemoteExists(String),

    #[error("no URLs given for remote {0:?}")]
    EmptyUrls(String),

    #[error("cannot create directory {path:?}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Style template cannot be set for progress bars.
    #[error(transparent)]
    IndicatifStyleTemplate(#[from] indicatif::style::TemplateError),

    /// Operations from libgit2 fail.
    #[error(transparent)]
    Git2(#[from] git2::Error),

    /// Git binary fails.
    #[error(transparent)]
    Syscall(#[from] std::io::Error),
}

/// Friendly result alias :3
type Result<T, E = GitError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn init_creates_missing_parents() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let path = root.path().join("github.com").join("kyoh86").join("gogh");
        Git2.init(&path)?;

        assert!(path.join(".git").is_dir());

        Ok(())
    }

    #[test]
    fn manage_remote_urls() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        Git2.init(root.path())?;

        let urls = vec![
            "https://github.com/kyoh86/gogh".to_string(),
            "https://example.com/kyoh86/gogh".to_string(),
        ];
        Git2.set_remote_urls(root.path(), "origin", &urls)?;
        assert_eq!(Git2.remote_urls(root.path(), "origin")?, urls);

        let replaced = vec!["git@github.com:kyoh86/gogh.git".to_string()];
        Git2.set_remote_urls(root.path(), "origin", &replaced)?;
        assert_eq!(Git2.remote_urls(root.path(), "origin")?, replaced);

        Ok(())
    }

    #[test]
    fn reject_empty_remote_urls() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        Git2.init(root.path())?;

        assert!(matches!(
            Git2.set_remote_urls(root.path(), "origin", &[]),
            Err(GitError::EmptyUrls(name)) if name == "origin"
        ));

        Ok(())
    }

    #[test]
    fn add_rename_remove_remote() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        Git2.init(root.path())?;

        Git2.add_remote(root.path(), "upstream", "https://github.com/kyoh86/gogh")?;
        assert!(matches!(
            Git2.add_remote(root.path(), "upstream", "https://github.com/kyoh86/gogh"),
            Err(GitError::RemoteExists(_))
        ));

        Git2.rename_remote(root.path(), "upstream", "origin")?;
        assert_eq!(Git2.remote_names(root.path())?, vec!["origin".to_string()]);

        Git2.remove_remote(root.path(), "origin")?;
        assert!(Git2.remote_names(root.path())?.is_empty());
        assert!(matches!(
            Git2.remote_urls(root.path(), "origin"),
            Err(GitError::RemoteNotFound(_))
        ));

        Ok(())
    }

    #[test]
    fn clone_from_local_repository() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let source = root.path().join("source");
        let repository = Repository::init(&source)?;
        let mut index = repository.index()?;
        let tree = repository.find_tree(index.write_tree()?)?;
        let signature = git2::Signature::now("John Doe", "john@doe.com")?;
        repository.commit(Some("HEAD"), &signature, &signature, "initial", &tree, &[])?;

        let target = root.path().join("target").join("clone");
        let url = source.to_string_lossy().into_owned();
        Git2.clone_repo(&url, &target, &CloneOptions::default())?;
        assert!(target.join(".git").is_dir());

        assert!(matches!(
            Git2.clone_repo(&url, &target, &CloneOptions::default()),
            Err(GitError::AlreadyExists(path)) if path == target
        ));

        Ok(())
    }
}
