// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use grove::{
    config::{load_servers, load_settings, save_servers, save_settings, Settings},
    format::ProjectFormat,
    git::CloneOptions,
    path::{default_root_dir, servers_file, settings_file},
    resolve::Resolver,
    server::ServerRegistry,
    store::{LocalStore, Workspace},
};

use anyhow::Result;
use clap::{Parser, Subcommand};
use inquire::{Confirm, Password};
use std::{env, path::PathBuf, process::exit};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "grove [options] <command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        match self.command {
            Command::Create(opts) => run_create(opts),
            Command::Clone(opts) => run_clone(opts),
            Command::List(opts) => run_list(opts),
            Command::Delete(opts) => run_delete(opts),
            Command::Cwd => run_cwd(),
            Command::Remote(opts) => run_remote(opts),
            Command::Roots(opts) => run_roots(opts),
            Command::Servers(opts) => run_servers(opts),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Create new empty project in primary root.
    #[command(override_usage = "grove create [options] <reference>...")]
    Create(CreateOptions),

    /// Clone remote repository into primary root.
    #[command(override_usage = "grove clone [options] <reference[=alias]>...")]
    Clone(CloneCommandOptions),

    /// List local projects.
    #[command(override_usage = "grove list [options] [query]")]
    List(ListOptions),

    /// Delete local project.
    #[command(override_usage = "grove delete [options] <reference>...")]
    Delete(DeleteOptions),

    /// Show project containing current directory.
    Cwd,

    /// Manage remotes of a project.
    #[command(subcommand)]
    Remote(RemoteCommand),

    /// Manage root directories.
    #[command(subcommand)]
    Roots(RootsCommand),

    /// Manage server credentials.
    #[command(subcommand)]
    Servers(ServersCommand),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct CreateOptions {
    /// References of projects to create, e.g., "name", "owner/name".
    #[arg(required = true, value_name = "reference")]
    pub references: Vec<String>,

    /// Use SSH URL for origin remote.
    #[arg(long)]
    pub ssh: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct CloneCommandOptions {
    /// References of repositories to clone, optionally with local alias.
    #[arg(required = true, value_name = "reference[=alias]")]
    pub references: Vec<String>,

    /// Clone through SSH instead of HTTPS.
    #[arg(long)]
    pub ssh: bool,

    /// Only fetch latest commit.
    #[arg(short, long)]
    pub shallow: bool,

    /// Pull project instead if it already exists.
    #[arg(short, long)]
    pub update: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ListOptions {
    /// Only list projects whose names contain query.
    #[arg(value_name = "query")]
    pub query: Option<String>,

    /// Output format: short, full, rel, url, or json.
    #[arg(short, long, default_value = "short", value_name = "format")]
    pub format: ProjectFormat,

    /// Only list projects in primary root.
    #[arg(short, long)]
    pub primary: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct DeleteOptions {
    /// References of projects to delete.
    #[arg(required = true, value_name = "reference")]
    pub references: Vec<String>,

    /// Do not ask for confirmation.
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Debug, Clone, Subcommand)]
enum RemoteCommand {
    /// Show URLs of a remote.
    Get {
        #[arg(value_name = "reference")]
        reference: String,

        #[arg(default_value = "origin", value_name = "remote")]
        remote: String,
    },

    /// Point a remote at other repositories.
    Set {
        #[arg(value_name = "reference")]
        reference: String,

        #[arg(value_name = "remote")]
        remote: String,

        /// References the remote should point at.
        #[arg(required = true, value_name = "target")]
        targets: Vec<String>,

        /// Use SSH URLs.
        #[arg(long)]
        ssh: bool,
    },
}

#[derive(Debug, Clone, Subcommand)]
enum RootsCommand {
    /// List root directories, primary first.
    List,

    /// Add root directory.
    Add {
        #[arg(value_name = "path")]
        path: PathBuf,

        /// Make it the primary root.
        #[arg(short, long)]
        primary: bool,
    },

    /// Remove root directory. Projects inside are left alone.
    Remove {
        #[arg(value_name = "path")]
        path: PathBuf,
    },

    /// Make root directory the primary root.
    SetPrimary {
        #[arg(value_name = "path")]
        path: PathBuf,
    },
}

#[derive(Debug, Clone, Subcommand)]
enum ServersCommand {
    /// List servers, default first.
    List,

    /// Register or update server credentials.
    Set {
        #[arg(value_name = "host")]
        host: String,

        #[arg(value_name = "user")]
        user: String,

        /// Access token. Prompted for if omitted.
        #[arg(short, long, value_name = "token")]
        token: Option<String>,

        /// Make it the default server.
        #[arg(short, long)]
        default: bool,
    },

    /// Remove server credentials.
    Remove {
        #[arg(value_name = "host")]
        host: String,
    },

    /// Make server the default server.
    SetDefault {
        #[arg(value_name = "host")]
        host: String,
    },
}

fn main() {
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .compact()
        .with_target(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}

fn settings() -> Result<Settings> {
    Ok(load_settings(settings_file()?)?)
}

fn registry() -> Result<ServerRegistry> {
    Ok(load_servers(servers_file()?)?)
}

fn workspace(settings: &Settings) -> Result<Workspace> {
    if settings.roots.is_empty() {
        return Ok(Workspace::open([default_root_dir()?]));
    }

    Ok(Workspace::open(settings.roots.expanded()?))
}

fn run_create(opts: CreateOptions) -> Result<()> {
    let settings = settings()?;
    let registry = registry()?;
    let resolver = Resolver::new(&registry);
    let workspace = workspace(&settings)?;
    let store = workspace.primary()?;

    for raw in opts.references {
        let (reference, _) = resolver.parse(&raw)?;
        match store.create(reference, opts.ssh || settings.ssh) {
            Ok(project) => info!("created {}", project.full_path().display()),
            Err(err) if err.is_already_exists() => warn!("{err}"),
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

fn run_clone(opts: CloneCommandOptions) -> Result<()> {
    let settings = settings()?;
    let registry = registry()?;
    let resolver = Resolver::new(&registry);
    let workspace = workspace(&settings)?;
    let store = workspace.primary()?;
    let ssh = opts.ssh || settings.ssh;

    for raw in opts.references {
        let resolved = resolver.parse_with_alias(&raw)?;
        let options = CloneOptions {
            credentials: Some(resolved.server.clone()),
            shallow: opts.shallow,
        };

        match store.clone_project(&resolved.reference, resolved.alias.as_ref(), ssh, &options) {
            Ok(project) => info!("cloned {}", project.full_path().display()),
            Err(err) if err.is_already_exists() && opts.update => {
                let project = store.update(resolved.local().clone())?;
                info!("updated {}", project.full_path().display());
            }
            Err(err) if err.is_already_exists() => warn!("{err}"),
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

fn run_list(opts: ListOptions) -> Result<()> {
    let settings = settings()?;
    let workspace = workspace(&settings)?;
    let query = opts.query.unwrap_or_default();

    let projects = workspace.list(&query, opts.primary)?;
    for line in opts.format.format_batch(&projects, settings.ssh)? {
        println!("{line}");
    }

    Ok(())
}

fn run_delete(opts: DeleteOptions) -> Result<()> {
    let settings = settings()?;
    let registry = registry()?;
    let resolver = Resolver::new(&registry);
    let workspace = workspace(&settings)?;

    for raw in opts.references {
        let (reference, _) = resolver.parse(&raw)?;
        let path = workspace.locate(&reference)?.full_path();

        if !opts.force && path.is_dir() {
            let confirmed = Confirm::new(&format!("delete {}?", path.display()))
                .with_default(false)
                .prompt()?;
            if !confirmed {
                info!("skip {}", path.display());
                continue;
            }
        }

        workspace.delete(&reference)?;
        info!("deleted {}", path.display());
    }

    Ok(())
}

fn run_cwd() -> Result<()> {
    let settings = settings()?;
    let workspace = workspace(&settings)?;
    let project = workspace.find_by_path(&env::current_dir()?)?;
    println!("{}", project.rel_name());

    Ok(())
}

fn run_remote(opts: RemoteCommand) -> Result<()> {
    let settings = settings()?;
    let registry = registry()?;
    let resolver = Resolver::new(&registry);
    let workspace = workspace(&settings)?;

    match opts {
        RemoteCommand::Get { reference, remote } => {
            let (reference, _) = resolver.parse(&reference)?;
            let project = workspace.find(&reference)?;
            for url in LocalStore::open(project.root()).remote_urls(reference, &remote)? {
                println!("{url}");
            }
        }
        RemoteCommand::Set {
            reference,
            remote,
            targets,
            ssh,
        } => {
            let (reference, _) = resolver.parse(&reference)?;
            let project = workspace.find(&reference)?;
            let urls = targets
                .iter()
                .map(|target| {
                    resolver
                        .parse(target)
                        .map(|(target, _)| target.url(ssh || settings.ssh))
                })
                .collect::<Result<Vec<_>, _>>()?;
            LocalStore::open(project.root()).set_remote_urls(reference, &remote, &urls)?;
        }
    }

    Ok(())
}

fn run_roots(opts: RootsCommand) -> Result<()> {
    let path = settings_file()?;
    let mut settings = load_settings(&path)?;

    match opts {
        RootsCommand::List => {
            if settings.roots.is_empty() {
                println!("{}", default_root_dir()?.display());
            }
            for root in settings.roots.iter() {
                println!("{}", root.display());
            }
            return Ok(());
        }
        RootsCommand::Add { path, primary } => {
            if primary {
                settings.roots.set_primary(path);
            } else if !settings.roots.add(&path) {
                warn!("root {:?} already configured", path.display());
            }
        }
        RootsCommand::Remove { path } => settings.roots.remove(&path)?,
        RootsCommand::SetPrimary { path } => settings.roots.set_primary(path),
    }

    save_settings(&path, &settings)?;

    Ok(())
}

fn run_servers(opts: ServersCommand) -> Result<()> {
    let path = servers_file()?;
    let mut registry = load_servers(&path)?;

    match opts {
        ServersCommand::List => {
            for server in registry.list() {
                let auth = if server.is_authenticated() { "" } else { " (anonymous)" };
                println!("{}/{}{auth}", server.host(), server.user());
            }
            return Ok(());
        }
        ServersCommand::Set {
            host,
            user,
            token,
            default,
        } => {
            let token = match token {
                Some(token) => token,
                None => Password::new("token")
                    .without_confirmation()
                    .prompt()?,
            };
            registry.set(&host, user, token)?;
            if default {
                registry.set_default(&host)?;
            }
        }
        ServersCommand::Remove { host } => registry.remove(&host)?,
        ServersCommand::SetDefault { host } => registry.set_default(&host)?,
    }

    save_servers(&path, &registry)?;

    Ok(())
}

