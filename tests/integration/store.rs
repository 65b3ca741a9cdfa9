// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{GitCall, RecordingGit, RootFixture};

use anyhow::Result;
use grove::{
    git::CloneOptions,
    store::{LocalStore, StoreError, WalkAction},
    RepoRef,
};
use pretty_assertions::assert_eq;
use std::path::PathBuf;

fn gogh() -> RepoRef {
    RepoRef::new("github.com", "kyoh86", "gogh").unwrap()
}

fn rel_names(store: &LocalStore<impl grove::git::GitAccess>, query: &str) -> Result<Vec<String>> {
    Ok(store
        .list(query)?
        .iter()
        .map(|project| project.rel_name())
        .collect())
}

#[test]
fn create_list_delete_with_libgit2() -> Result<()> {
    let root = RootFixture::new()?;
    let store = LocalStore::open(root.path());

    let project = store.create(gogh(), false)?;
    assert!(project.exists());
    assert_eq!(
        store.remote_urls(gogh(), "origin")?,
        vec!["https://github.com/kyoh86/gogh".to_string()]
    );

    let listed = store.list("gogh")?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].rel_path(), PathBuf::from("github.com/kyoh86/gogh"));

    store.delete(gogh())?;
    assert!(store.list("gogh")?.is_empty());

    Ok(())
}

#[test]
fn create_reports_existing_project() -> Result<()> {
    let root = RootFixture::new()?;
    root.mark("github.com/kyoh86/gogh")?;
    let git = RecordingGit::default();
    let store = LocalStore::with_git(root.path(), git.clone());

    let result = store.create(gogh(), false);
    assert!(matches!(&result, Err(err) if err.is_already_exists()));
    assert!(git.calls().is_empty());

    Ok(())
}

#[test]
fn create_registers_origin() -> Result<()> {
    let root = RootFixture::new()?;
    let git = RecordingGit::default();
    let store = LocalStore::with_git(root.path(), git.clone());

    let project = store.create(gogh(), true)?;
    assert_eq!(
        git.calls(),
        vec![
            GitCall::Init(project.full_path()),
            GitCall::SetRemoteUrls {
                path: project.full_path(),
                name: "origin".into(),
                urls: vec!["git@github.com:kyoh86/gogh.git".into()],
            },
        ]
    );

    Ok(())
}

#[test]
fn clone_into_reference_path() -> Result<()> {
    let root = RootFixture::new()?;
    let git = RecordingGit::default();
    let store = LocalStore::with_git(root.path(), git.clone());
    let options = CloneOptions {
        credentials: None,
        shallow: true,
    };

    let project = store.clone_project(&gogh(), None, false, &options)?;
    assert_eq!(
        git.calls(),
        vec![GitCall::Clone {
            url: "https://github.com/kyoh86/gogh".into(),
            path: root.path().join("github.com/kyoh86/gogh"),
            shallow: true,
        }]
    );
    assert!(project.exists());

    let again = store.clone_project(&gogh(), None, false, &options);
    assert!(matches!(again, Err(StoreError::AlreadyExists(_))));

    Ok(())
}

#[test]
fn clone_into_alias_path() -> Result<()> {
    let root = RootFixture::new()?;
    let git = RecordingGit::default();
    let store = LocalStore::with_git(root.path(), git.clone());
    let alias = gogh().with_owner_name("mine", "gogh-fork")?;

    let project = store.clone_project(&gogh(), Some(&alias), true, &CloneOptions::default())?;
    assert_eq!(project.rel_name(), "github.com/mine/gogh-fork");
    assert_eq!(
        git.calls(),
        vec![GitCall::Clone {
            url: "git@github.com:kyoh86/gogh.git".into(),
            path: root.path().join("github.com/mine/gogh-fork"),
            shallow: false,
        }]
    );

    Ok(())
}

#[test]
fn update_pulls_existing_project() -> Result<()> {
    let root = RootFixture::new()?;
    let git = RecordingGit::default();
    let store = LocalStore::with_git(root.path(), git.clone());

    assert!(matches!(store.update(gogh()), Err(StoreError::NotExist(_))));

    let path = root.mark("github.com/kyoh86/gogh")?;
    store.update(gogh())?;
    assert_eq!(git.calls(), vec![GitCall::Pull(path)]);

    Ok(())
}

#[test]
fn walk_never_descends_into_project() -> Result<()> {
    let root = RootFixture::new()?;
    root.mark("github.com/kyoh86/gogh")?;
    root.mark("github.com/kyoh86/gogh/subdir")?;
    let store = LocalStore::open(root.path());

    let mut visited = Vec::new();
    store.walk("", |project| {
        visited.push(project.full_path());
        Ok(WalkAction::Continue)
    })?;

    assert_eq!(visited, vec![root.path().join("github.com/kyoh86/gogh")]);

    Ok(())
}

#[test]
fn walk_skips_stray_directories() -> Result<()> {
    let root = RootFixture::new()?;
    root.mark("github.com/kyoh86/gogh")?;
    root.mark("github.com/-invalid-/gogh")?;
    root.mark("github.com/shallow")?;
    root.mark("github.com/kyoh86/deep/nested")?;
    root.dir("github.com/kyoh86/empty")?;
    root.file("github.com/kyoh86/file")?;
    root.mark("example.com/kyoh86/dotfiles")?;
    root.mark("example.com")?;
    let store = LocalStore::open(root.path());

    assert_eq!(
        rel_names(&store, "")?,
        vec!["example.com/kyoh86/dotfiles", "github.com/kyoh86/gogh"]
    );

    Ok(())
}

#[test]
fn walk_through_markers_above_projects() -> Result<()> {
    let root = RootFixture::new()?;
    root.mark("github.com")?;
    root.mark("github.com/kyoh86")?;
    root.mark("github.com/kyoh86/gogh")?;
    root.mark("example.com/other")?;
    root.mark("example.com/other/dotfiles")?;
    let store = LocalStore::open(root.path());

    assert_eq!(
        rel_names(&store, "")?,
        vec!["example.com/other/dotfiles", "github.com/kyoh86/gogh"]
    );

    Ok(())
}

#[cfg(unix)]
#[test]
fn walk_skips_unreadable_entries() -> Result<()> {
    use std::os::unix::fs::symlink;

    let root = RootFixture::new()?;
    root.mark("github.com/kyoh86/gogh")?;
    let scratch = root.dir("scratch")?;
    symlink(root.path(), scratch.join("loop"))?;
    symlink(root.path().join("missing"), scratch.join("dangling"))?;
    let store = LocalStore::open(root.path());

    assert_eq!(rel_names(&store, "")?, vec!["github.com/kyoh86/gogh"]);

    Ok(())
}

#[test]
fn walk_stops_on_request() -> Result<()> {
    let root = RootFixture::new()?;
    root.mark("github.com/a/one")?;
    root.mark("github.com/b/two")?;
    let store = LocalStore::open(root.path());

    let mut visited = 0;
    let action = store.walk("", |_| {
        visited += 1;
        Ok(WalkAction::Stop)
    })?;

    assert_eq!(action, WalkAction::Stop);
    assert_eq!(visited, 1);

    Ok(())
}

#[test]
fn walk_missing_root_is_empty() -> Result<()> {
    let root = RootFixture::new()?;
    let store = LocalStore::open(root.path().join("missing"));
    assert!(store.list("")?.is_empty());

    Ok(())
}

#[test]
fn list_filters_by_query() -> Result<()> {
    let root = RootFixture::new()?;
    root.mark("github.com/kyoh86/gogh")?;
    root.mark("github.com/kyoh86/dotfiles")?;
    root.mark("example.com/other/gogh.vim")?;
    let store = LocalStore::open(root.path());

    assert_eq!(
        rel_names(&store, "gogh")?,
        vec!["example.com/other/gogh.vim", "github.com/kyoh86/gogh"]
    );
    assert_eq!(
        rel_names(&store, "kyoh86/dot")?,
        vec!["github.com/kyoh86/dotfiles"]
    );
    assert_eq!(rel_names(&store, "")?.len(), 3);
    assert!(rel_names(&store, "gitlab")?.is_empty());

    Ok(())
}

#[test]
fn delete_missing_project() -> Result<()> {
    let root = RootFixture::new()?;
    let store = LocalStore::open(root.path());

    assert!(matches!(store.delete(gogh()), Err(StoreError::NotExist(_))));

    Ok(())
}

#[test]
fn delete_refuses_plain_file() -> Result<()> {
    let root = RootFixture::new()?;
    let path = root.file("github.com/kyoh86/gogh")?;
    let store = LocalStore::open(root.path());

    assert!(matches!(store.delete(gogh()), Err(StoreError::NotADirectory(_))));
    assert!(path.is_file());

    Ok(())
}

#[test]
fn delete_tidies_empty_parents() -> Result<()> {
    let root = RootFixture::new()?;
    root.mark("github.com/kyoh86/gogh")?;
    root.mark("github.com/other/gogh")?;
    let store = LocalStore::open(root.path());

    store.delete(gogh())?;
    assert!(!root.path().join("github.com/kyoh86").exists());
    assert!(root.path().join("github.com/other/gogh").exists());

    store.delete(RepoRef::new("github.com", "other", "gogh")?)?;
    assert!(!root.path().join("github.com").exists());
    assert!(root.path().is_dir());

    Ok(())
}

#[test]
fn project_containing_nested_path() -> Result<()> {
    let root = RootFixture::new()?;
    root.mark("github.com/kyoh86/gogh")?;
    let nested = root.dir("github.com/kyoh86/gogh/src/deep")?;
    let store = LocalStore::open(root.path());

    let project = store.project_containing(&nested).map(|project| project.rel_name());
    assert_eq!(project, Some("github.com/kyoh86/gogh".to_string()));
    assert_eq!(store.project_containing(&root.path().join("github.com")), None);

    Ok(())
}

#[test]
fn remote_urls_require_project() -> Result<()> {
    let root = RootFixture::new()?;
    let store = LocalStore::with_git(root.path(), RecordingGit::default());

    assert!(matches!(
        store.remote_urls(gogh(), "origin"),
        Err(StoreError::NotExist(_))
    ));
    assert!(matches!(
        store.set_remote_urls(gogh(), "origin", &["https://github.com/kyoh86/gogh".into()]),
        Err(StoreError::NotExist(_))
    ));

    Ok(())
}

#[test]
fn set_remote_urls_with_libgit2() -> Result<()> {
    let root = RootFixture::new()?;
    let store = LocalStore::open(root.path());
    store.create(gogh(), false)?;

    let urls = vec![
        "https://github.com/kyoh86/gogh".to_string(),
        "https://example.com/kyoh86/gogh".to_string(),
    ];
    store.set_remote_urls(gogh(), "upstream", &urls)?;
    assert_eq!(store.remote_urls(gogh(), "upstream")?, urls);

    assert!(matches!(
        store.remote_urls(gogh(), "missing"),
        Err(StoreError::Git { operation: "get remote", .. })
    ));

    Ok(())
}
