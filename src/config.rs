// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Grove keeps two configuration files in its configuration directory:
//!
//! - `settings.toml`: root directories, and general preferences.
//! - `servers.toml`: credential bindings for remote servers.
//!
//! Layouts are plain serde structures that parse through [`FromStr`] and
//! print through [`Display`]. The `load_*` and `save_*` functions wrap them
//! with file I/O, treating a missing file as an empty configuration.

use crate::server::{RegistryError, ServerRegistry};

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs::{read_to_string, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;

/// General settings layout.
///
/// ```toml
/// roots = ["~/Projects", "$WORK/src"]
/// ssh = false
/// ```
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Root directories, primary root first.
    pub roots: RootList,

    /// Prefer SSH URLs over HTTPS URLs for remotes.
    pub ssh: bool,
}

impl FromStr for Settings {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        toml::from_str(data).map_err(ConfigError::Deserialize)
    }
}

impl Display for Settings {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::to_string(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Ordered set of root directories.
///
/// The first root is the __primary__ root. Roots are kept as written, e.g.,
/// `~/Projects`, so saving never bakes in expanded paths. Use
/// [`RootList::expanded`] to get paths that can be walked.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RootList(Vec<PathBuf>);

impl RootList {
    /// Construct new root list.
    pub fn new(roots: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        let mut list = Self::default();
        for root in roots {
            list.add(root);
        }
        list
    }

    /// Primary root, if any.
    pub fn primary(&self) -> Option<&Path> {
        self.0.first().map(PathBuf::as_path)
    }

    /// Append root unless already listed.
    ///
    /// Returns false if root was already listed.
    pub fn add(&mut self, root: impl Into<PathBuf>) -> bool {
        let root = root.into();
        if self.0.iter().any(|listed| same_root(listed, &root)) {
            return false;
        }

        self.0.push(root);
        true
    }

    /// Remove listed root.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::RootNotFound`] if root is not listed.
    pub fn remove(&mut self, root: &Path) -> Result<()> {
        let before = self.0.len();
        self.0.retain(|listed| !same_root(listed, root));
        if self.0.len() == before {
            return Err(ConfigError::RootNotFound(root.to_path_buf()));
        }

        Ok(())
    }

    /// Make root the primary root, adding it if needed.
    pub fn set_primary(&mut self, root: impl Into<PathBuf>) {
        let root = root.into();
        self.0.retain(|listed| !same_root(listed, &root));
        self.0.insert(0, root);
    }

    /// Shell expanded roots, primary root first.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::ShellExpansion`] if a variable is unset.
    pub fn expanded(&self) -> Result<Vec<PathBuf>> {
        self.0.iter().map(|root| expand_root(root)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn expand_root(root: &Path) -> Result<PathBuf> {
    let root = root.to_string_lossy();
    let expanded = shellexpand::full(root.as_ref())?;
    Ok(PathBuf::from(expanded.into_owned()))
}

// INVARIANT: Roots are the same if written the same, or if they expand the same.
fn same_root(listed: &Path, root: &Path) -> bool {
    if listed == root {
        return true;
    }

    match (expand_root(listed), expand_root(root)) {
        (Ok(listed), Ok(root)) => listed == root,
        _ => false,
    }
}

/// Server credentials layout.
///
/// ```toml
/// [[server]]
/// host = "github.com"
/// user = "kyoh86"
/// token = "..."
/// default = true
/// ```
///
/// The server marked as default wins. Otherwise, the first listed server is
/// the default.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct ServersFile {
    #[serde(default, rename = "server")]
    pub servers: Vec<ServerEntry>,
}

/// Single server entry.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct ServerEntry {
    pub host: String,
    pub user: String,

    #[serde(default)]
    pub token: String,

    #[serde(default, skip_serializing_if = "is_false")]
    pub default: bool,
}

fn is_false(value: &bool) -> bool {
    !value
}

impl ServersFile {
    /// Build validated registry from listed servers.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Registry`] if any server is invalid.
    pub fn into_registry(self) -> Result<ServerRegistry> {
        let mut registry = ServerRegistry::new();
        let default = self
            .servers
            .iter()
            .find(|entry| entry.default)
            .map(|entry| entry.host.clone());

        for entry in self.servers {
            registry.set(entry.host, entry.user, entry.token)?;
        }

        if let Some(host) = default {
            registry.set_default(&host)?;
        }

        Ok(registry)
    }

    /// Layout of registry, default server first and marked.
    pub fn from_registry(registry: &ServerRegistry) -> Self {
        let default = registry.default_server().ok().map(|server| server.host());
        let servers = registry
            .list()
            .into_iter()
            .map(|server| ServerEntry {
                host: server.host().to_string(),
                user: server.user().to_string(),
                token: server.token().to_string(),
                default: Some(server.host()) == default,
            })
            .collect();

        Self { servers }
    }
}

impl FromStr for ServersFile {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        toml::from_str(data).map_err(ConfigError::Deserialize)
    }
}

impl Display for ServersFile {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::to_string(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Load settings file, falling back to defaults if it is missing.
///
/// # Errors
///
/// - Return [`ConfigError::Read`] if file cannot be read.
/// - Return [`ConfigError::Deserialize`] if file is malformed.
pub fn load_settings(path: impl AsRef<Path>) -> Result<Settings> {
    match read_optional(path.as_ref())? {
        Some(data) => data.parse(),
        None => Ok(Settings::default()),
    }
}

/// Save settings file.
///
/// # Errors
///
/// - Return [`ConfigError::Write`] if file cannot be written.
pub fn save_settings(path: impl AsRef<Path>, settings: &Settings) -> Result<()> {
    let data = toml::to_string(settings)?;
    write_file(path.as_ref(), data, false)
}

/// Load server registry, falling back to an empty one if file is missing.
///
/// # Errors
///
/// - Return [`ConfigError::Read`] if file cannot be read.
/// - Return [`ConfigError::Deserialize`] if file is malformed.
/// - Return [`ConfigError::Registry`] if a server is invalid.
pub fn load_servers(path: impl AsRef<Path>) -> Result<ServerRegistry> {
    match read_optional(path.as_ref())? {
        Some(data) => data.parse::<ServersFile>()?.into_registry(),
        None => Ok(ServerRegistry::new()),
    }
}

/// Save server registry.
///
/// File is only readable by its owner, because it carries tokens.
///
/// # Errors
///
/// - Return [`ConfigError::Write`] if file cannot be written.
pub fn save_servers(path: impl AsRef<Path>, registry: &ServerRegistry) -> Result<()> {
    let data = toml::to_string(&ServersFile::from_registry(registry))?;
    write_file(path.as_ref(), data, true)
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match read_to_string(path) {
        Ok(data) => Ok(Some(data)),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!("{:?} not found, using defaults", path.display());
            Ok(None)
        }
        Err(source) => Err(ConfigError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn write_file(path: &Path, data: String, private: bool) -> Result<()> {
    let to_error = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        mkdirp::mkdirp(parent).map_err(to_error)?;
    }

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        if private {
            options.mode(0o600);
        }
    }

    let mut file = options.open(path).map_err(to_error)?;

    // INVARIANT: Narrow existing private files before any data lands in them.
    #[cfg(unix)]
    {
        use std::{fs::Permissions, os::unix::fs::PermissionsExt};
        if private {
            file.set_permissions(Permissions::from_mode(0o600))
                .map_err(to_error)?;
        }
    }

    file.write_all(data.as_bytes()).map_err(to_error)
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),

    /// Configured servers are invalid.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("root {0:?} is not configured")]
    RootNotFound(PathBuf),

    #[error("failed to read {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path:?}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
