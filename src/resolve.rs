// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Reference resolution.
//!
//! Users rarely type full references. Instead, they type whatever is enough
//! to identify a repository given their default server:
//!
//! | Input                     | Host           | Owner          | Name |
//! |---------------------------|----------------|----------------|------|
//! | `gogh`                    | default server | default server | gogh |
//! | `kyoh86/gogh`             | default server | kyoh86        | gogh |
//! | `github.com/kyoh86/gogh`  | github.com     | kyoh86        | gogh |
//!
//! A three-part reference to a host that has no registered server still
//! resolves, but binds to an anonymous server without a token.
//!
//! # Aliases
//!
//! A reference may be followed by `=alias` to place the repository under a
//! different local name. The alias is a sibling of the base reference: a
//! single part replaces the name, two parts replace owner and name. The host
//! never changes.

use crate::{
    repo::{RepoRef, ValidationError},
    server::{RegistryError, Server, ServerRegistry},
};

use tracing::debug;

/// Result of splitting raw input on slashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segments<'a> {
    One(&'a str),
    Two(&'a str, &'a str),
    Three(&'a str, &'a str, &'a str),
    TooMany,
}

impl<'a> Segments<'a> {
    fn split(raw: &'a str) -> Self {
        let parts = raw.split('/').collect::<Vec<_>>();
        match parts.as_slice() {
            [name] => Self::One(name),
            [owner, name] => Self::Two(owner, name),
            [host, owner, name] => Self::Three(host, owner, name),
            _ => Self::TooMany,
        }
    }
}

/// Reference resolved with optional alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Reference of the remote repository.
    pub reference: RepoRef,

    /// Local name to use instead of the reference, if any.
    pub alias: Option<RepoRef>,

    /// Server the reference is bound to.
    pub server: Server,
}

impl Resolved {
    /// Reference to use for the local project.
    pub fn local(&self) -> &RepoRef {
        self.alias.as_ref().unwrap_or(&self.reference)
    }
}

/// Turn partial user input into concrete references.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'reg> {
    registry: &'reg ServerRegistry,
}

impl<'reg> Resolver<'reg> {
    /// Construct new resolver backed by a server registry.
    pub fn new(registry: &'reg ServerRegistry) -> Self {
        Self { registry }
    }

    /// Resolve raw input into reference and its server.
    ///
    /// # Errors
    ///
    /// - Return [`ResolveError::TooManySlashes`] if input has more than three
    ///   slash separated parts.
    /// - Return [`ResolveError::Registry`] if a default server is needed but
    ///   the registry is empty.
    /// - Return [`ResolveError::Invalid`] if any part fails validation.
    pub fn parse(&self, raw: &str) -> Result<(RepoRef, Server)> {
        match Segments::split(raw) {
            Segments::One(name) => {
                let server = self.registry.default_server()?;
                let reference = RepoRef::new(server.host(), server.user(), name)?;
                Ok((reference, server.clone()))
            }
            Segments::Two(owner, name) => {
                let server = self.registry.default_server()?;
                let reference = RepoRef::new(server.host(), owner, name)?;
                Ok((reference, server.clone()))
            }
            Segments::Three(host, owner, name) => {
                let reference = RepoRef::new(host, owner, name)?;
                let server = match self.registry.find(host) {
                    Ok(server) => server.clone(),
                    Err(_) => {
                        debug!("no credentials stored for {host:?}, using anonymous access");
                        Server::new(host, owner, "")?
                    }
                };
                Ok((reference, server))
            }
            Segments::TooMany => Err(ResolveError::TooManySlashes(raw.to_string())),
        }
    }

    /// Resolve raw input with optional `=alias` suffix.
    ///
    /// An alias identical to the base reference counts as no alias at all.
    ///
    /// # Errors
    ///
    /// - Return same errors as [`Resolver::parse`] for base reference.
    /// - Return [`ResolveError::TooManySlashes`] if alias has more than two
    ///   slash separated parts.
    /// - Return [`ResolveError::Invalid`] if alias fails validation.
    pub fn parse_with_alias(&self, raw: &str) -> Result<Resolved> {
        let (base, alias) = match raw.split_once('=') {
            Some((base, alias)) => (base, Some(alias)),
            None => (raw, None),
        };

        let (reference, server) = self.parse(base)?;
        let alias = match alias.map(Segments::split) {
            None => None,
            Some(Segments::One(name)) => Some(reference.with_name(name)?),
            Some(Segments::Two(owner, name)) => Some(reference.with_owner_name(owner, name)?),
            Some(Segments::Three(..) | Segments::TooMany) => {
                return Err(ResolveError::TooManySlashes(raw.to_string()))
            }
        };
        let alias = alias.filter(|alias| alias != &reference);

        Ok(Resolved {
            reference,
            alias,
            server,
        })
    }
}

/// Reference resolution error types.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("too many slashes in {0:?}")]
    TooManySlashes(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Friendly result alias :3
type Result<T, E = ResolveError> = std::result::Result<T, E>;
