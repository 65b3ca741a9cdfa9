// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Remote server credentials.
//!
//! A __server__ binds a user and access token to a host. The
//! [`ServerRegistry`] keeps at most one server per host, and marks one of them
//! as the __default__ server. The default server fills in the host and owner
//! of partial repository references, e.g., "gogh" or "kyoh86/gogh".
//!
//! The registry is an explicit value. Whoever needs it gets it handed over
//! through a constructor, and whoever changes it is responsible for saving it
//! back through [`config`](crate::config).

use crate::repo::{validate_host, validate_owner, ValidationError};

use std::{
    collections::HashMap,
    fmt::{Debug, Formatter, Result as FmtResult},
};

/// Credential binding for a single host.
#[derive(Clone, PartialEq, Eq)]
pub struct Server {
    host: String,
    user: String,
    token: String,
}

impl Server {
    /// Construct new server binding.
    ///
    /// Token is opaque, and may be empty for anonymous access.
    ///
    /// # Errors
    ///
    /// - Return [`ValidationError`] if host or user are invalid.
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let host = host.into();
        let user = user.into();
        validate_host(&host)?;
        validate_owner(&user)?;

        Ok(Self {
            host,
            user,
            token: token.into(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Server carries a token to authenticate with.
    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty()
    }
}

// INVARIANT: Never leak token through debug output.
impl Debug for Server {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.debug_struct("Server")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("token", &if self.token.is_empty() { "" } else { "*****" })
            .finish()
    }
}

/// Set of known servers, one of which is the default.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServerRegistry {
    default: Option<String>,
    servers: HashMap<String, Server>,
}

impl ServerRegistry {
    /// Construct new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite server for host.
    ///
    /// The first server ever added to an empty registry becomes the default.
    /// Overwriting the default host keeps it as the default.
    ///
    /// # Errors
    ///
    /// - Return [`RegistryError::Invalid`] if host or user are invalid.
    pub fn set(
        &mut self,
        host: impl Into<String>,
        user: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<()> {
        let server = Server::new(host, user, token)?;
        if self.default.is_none() {
            self.default = Some(server.host.clone());
        }
        self.servers.insert(server.host.clone(), server);

        Ok(())
    }

    /// Find server bound to host.
    ///
    /// # Errors
    ///
    /// - Return [`RegistryError::ServerNotFound`] if host is unknown.
    pub fn find(&self, host: &str) -> Result<&Server> {
        self.servers
            .get(host)
            .ok_or_else(|| RegistryError::ServerNotFound(host.to_string()))
    }

    /// Current default server.
    ///
    /// # Errors
    ///
    /// - Return [`RegistryError::NoServer`] if registry is empty.
    pub fn default_server(&self) -> Result<&Server> {
        self.default
            .as_deref()
            .and_then(|host| self.servers.get(host))
            .ok_or(RegistryError::NoServer)
    }

    /// Switch default to an existing server.
    ///
    /// # Errors
    ///
    /// - Return [`RegistryError::ServerNotFound`] if host is unknown.
    pub fn set_default(&mut self, host: &str) -> Result<()> {
        let server = self.find(host)?;
        self.default = Some(server.host.clone());

        Ok(())
    }

    /// Remove server bound to host.
    ///
    /// The default server can only be removed when it is the last server
    /// left. Otherwise, the default must be switched first.
    ///
    /// # Errors
    ///
    /// - Return [`RegistryError::ServerNotFound`] if host is unknown.
    /// - Return [`RegistryError::Unremovable`] if host is the default server
    ///   and other servers remain.
    pub fn remove(&mut self, host: &str) -> Result<()> {
        if !self.servers.contains_key(host) {
            return Err(RegistryError::ServerNotFound(host.to_string()));
        }

        let is_default = self.default.as_deref() == Some(host);
        if is_default && self.servers.len() > 1 {
            return Err(RegistryError::Unremovable(host.to_string()));
        }

        self.servers.remove(host);
        if self.servers.is_empty() {
            self.default = None;
        }

        Ok(())
    }

    /// List servers with default first.
    ///
    /// Remaining servers follow in host order.
    pub fn list(&self) -> Vec<&Server> {
        let default = self.default_server().ok();
        let mut rest = self
            .servers
            .values()
            .filter(|server| Some(server.host.as_str()) != self.default.as_deref())
            .collect::<Vec<_>>();
        rest.sort_by(|a, b| a.host.cmp(&b.host));

        default.into_iter().chain(rest).collect()
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}

/// Server registry error types.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("no server registered")]
    NoServer,

    #[error("server {0:?} not found")]
    ServerNotFound(String),

    #[error("server {0:?} is the default server, switch default before removing it")]
    Unremovable(String),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Friendly result alias :3
type Result<T, E = RegistryError> = std::result::Result<T, E>;
