// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Local workspace registry for Git repositories.
//!
//! Grove keeps clones of remote repositories in a deterministic layout below
//! one or more root directories: `<root>/<host>/<owner>/<name>`. Short user
//! input like "gogh" or "kyoh86/gogh" is resolved into full references with
//! the help of registered servers, and projects are listed by their shortest
//! unambiguous names.
//!
//! # Modules
//!
//! - [`repo`]: validated repository references.
//! - [`server`]: server credentials and the default server.
//! - [`resolve`]: partial input to full reference resolution.
//! - [`project`]: local project locations.
//! - [`store`]: create, clone, walk, list, and delete projects.
//! - [`format`]: listing formats, including shortest unique names.
//! - [`git`]: Git plumbing behind a narrow interface.
//! - [`config`]: configuration file layouts.
//! - [`path`]: default paths.

pub mod config;
pub mod format;
pub mod git;
pub mod path;
pub mod project;
pub mod repo;
pub mod resolve;
pub mod server;
pub mod store;

pub use crate::{
    format::{ProjectFormat, ShortNames},
    project::Project,
    repo::{RepoRef, ValidationError},
    resolve::{Resolved, Resolver},
    server::{Server, ServerRegistry},
    store::{LocalStore, WalkAction, Workspace},
};
