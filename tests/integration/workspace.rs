// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{RecordingGit, RootFixture};

use anyhow::Result;
use grove::{
    store::{StoreError, Workspace},
    RepoRef,
};
use pretty_assertions::assert_eq;
use std::path::PathBuf;

fn workspace(roots: &[&RootFixture]) -> Workspace<RecordingGit> {
    Workspace::with_git(
        roots.iter().map(|root| root.path().to_path_buf()),
        RecordingGit::default(),
    )
}

fn full_paths(projects: &[grove::Project]) -> Vec<PathBuf> {
    projects.iter().map(|project| project.full_path()).collect()
}

#[test]
fn list_across_roots() -> Result<()> {
    let primary = RootFixture::new()?;
    let secondary = RootFixture::new()?;
    let gogh = primary.mark("github.com/kyoh86/gogh")?;
    let fork = secondary.mark("github.com/other/gogh")?;
    secondary.mark("github.com/other/dotfiles")?;
    let workspace = workspace(&[&primary, &secondary]);

    assert_eq!(full_paths(&workspace.list("gogh", false)?), vec![gogh.clone(), fork]);
    assert_eq!(full_paths(&workspace.list("gogh", true)?), vec![gogh]);
    assert_eq!(workspace.list("", false)?.len(), 3);

    Ok(())
}

#[test]
fn primary_is_first_root() -> Result<()> {
    let primary = RootFixture::new()?;
    let secondary = RootFixture::new()?;
    let workspace = workspace(&[&primary, &secondary]);

    assert_eq!(workspace.primary()?.root(), primary.path());
    assert_eq!(workspace.stores().len(), 2);

    Ok(())
}

#[test]
fn empty_workspace_has_no_primary() {
    let workspace = Workspace::with_git(Vec::<PathBuf>::new(), RecordingGit::default());

    assert!(matches!(workspace.primary(), Err(StoreError::NoRoot)));
}

#[test]
fn find_prefers_earlier_root() -> Result<()> {
    let primary = RootFixture::new()?;
    let secondary = RootFixture::new()?;
    let first = primary.mark("github.com/kyoh86/gogh")?;
    secondary.mark("github.com/kyoh86/gogh")?;
    let only_second = secondary.mark("github.com/kyoh86/dotfiles")?;
    let workspace = workspace(&[&primary, &secondary]);

    let gogh = RepoRef::new("github.com", "kyoh86", "gogh")?;
    assert_eq!(workspace.find(&gogh)?.full_path(), first);

    let dotfiles = RepoRef::new("github.com", "kyoh86", "dotfiles")?;
    assert_eq!(workspace.find(&dotfiles)?.full_path(), only_second);

    let missing = RepoRef::new("github.com", "kyoh86", "missing")?;
    assert!(matches!(workspace.find(&missing), Err(StoreError::NotExist(_))));

    Ok(())
}

#[test]
fn find_one_prefers_exact_names() -> Result<()> {
    let root = RootFixture::new()?;
    let gogh = root.mark("github.com/kyoh86/gogh")?;
    root.mark("github.com/kyoh86/gogh.vim")?;
    let workspace = workspace(&[&root]);

    assert_eq!(workspace.find_one("gogh")?.full_path(), gogh);
    assert_eq!(workspace.find_one("kyoh86/gogh")?.full_path(), gogh);
    assert_eq!(
        workspace.find_one("gogh.v")?.rel_name(),
        "github.com/kyoh86/gogh.vim"
    );

    Ok(())
}

#[test]
fn find_one_reports_ambiguity() -> Result<()> {
    let primary = RootFixture::new()?;
    let secondary = RootFixture::new()?;
    let first = primary.mark("github.com/kyoh86/gogh")?;
    let second = secondary.mark("example.com/other/gogh")?;
    let workspace = workspace(&[&primary, &secondary]);

    match workspace.find_one("gogh") {
        Err(StoreError::MultipleMatches { query, candidates }) => {
            assert_eq!(query, "gogh");
            assert_eq!(
                candidates,
                vec![first.display().to_string(), second.display().to_string()]
            );
        }
        other => panic!("expected ambiguity, got {other:?}"),
    }

    assert!(matches!(workspace.find_one("nothing"), Err(StoreError::NotExist(_))));
    assert_eq!(workspace.find_one("other/gogh")?.full_path(), second);

    Ok(())
}

#[test]
fn find_by_path_in_any_root() -> Result<()> {
    let primary = RootFixture::new()?;
    let secondary = RootFixture::new()?;
    primary.mark("github.com/kyoh86/gogh")?;
    let dotfiles = secondary.mark("github.com/kyoh86/dotfiles")?;
    let nested = secondary.dir("github.com/kyoh86/dotfiles/nvim/lua")?;
    let workspace = workspace(&[&primary, &secondary]);

    assert_eq!(workspace.find_by_path(&nested)?.full_path(), dotfiles);
    assert!(matches!(
        workspace.find_by_path(secondary.path()),
        Err(StoreError::NotExist(_))
    ));

    Ok(())
}

#[test]
fn create_lands_in_primary_root() -> Result<()> {
    let primary = RootFixture::new()?;
    let secondary = RootFixture::new()?;
    let workspace = workspace(&[&primary, &secondary]);

    let reference = RepoRef::new("github.com", "kyoh86", "gogh")?;
    let project = workspace.primary()?.create(reference.clone(), false)?;

    assert_eq!(project.full_path(), primary.path().join("github.com/kyoh86/gogh"));
    assert_eq!(workspace.find(&reference)?.root(), primary.path());
    assert!(workspace.list("", false)?.len() == 1);

    Ok(())
}

#[test]
fn locate_falls_back_to_primary() -> Result<()> {
    let primary = RootFixture::new()?;
    let secondary = RootFixture::new()?;
    let dotfiles = secondary.mark("github.com/kyoh86/dotfiles")?;
    let workspace = workspace(&[&primary, &secondary]);

    let found = RepoRef::new("github.com", "kyoh86", "dotfiles")?;
    assert_eq!(workspace.locate(&found)?.full_path(), dotfiles);

    let missing = RepoRef::new("github.com", "kyoh86", "gogh")?;
    assert_eq!(
        workspace.locate(&missing)?.full_path(),
        primary.path().join("github.com/kyoh86/gogh")
    );

    Ok(())
}

#[test]
fn delete_reports_leftovers() -> Result<()> {
    let primary = RootFixture::new()?;
    let workspace = workspace(&[&primary]);

    let missing = RepoRef::new("github.com", "kyoh86", "missing")?;
    assert!(matches!(workspace.delete(&missing), Err(StoreError::NotExist(_))));

    let file = primary.file("github.com/kyoh86/file")?;
    let reference = RepoRef::new("github.com", "kyoh86", "file")?;
    assert!(matches!(
        workspace.delete(&reference),
        Err(StoreError::NotADirectory(_))
    ));
    assert!(file.is_file());

    let leftover = primary.dir("github.com/other/leftover/partial")?;
    workspace.delete(&RepoRef::new("github.com", "other", "leftover")?)?;
    assert!(!leftover.exists());

    Ok(())
}

#[test]
fn delete_from_root_holding_project() -> Result<()> {
    let primary = RootFixture::new()?;
    let secondary = RootFixture::new()?;
    let dotfiles = secondary.mark("github.com/kyoh86/dotfiles")?;
    let workspace = workspace(&[&primary, &secondary]);

    workspace.delete(&RepoRef::new("github.com", "kyoh86", "dotfiles")?)?;
    assert!(!dotfiles.exists());
    assert!(secondary.path().is_dir());

    let empty = Workspace::with_git(Vec::<PathBuf>::new(), RecordingGit::default());
    assert!(matches!(
        empty.delete(&RepoRef::new("github.com", "kyoh86", "dotfiles")?),
        Err(StoreError::NoRoot)
    ));

    Ok(())
}
