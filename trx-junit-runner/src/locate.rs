// Copyright (c) The trx-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Locating TRX reports in a workspace.
//!
//! A report pattern is either an absolute path to a single report, or one or more ANT-style
//! globs relative to the workspace root, separated by commas.

use crate::errors::{DisplayErrorChain, LocateError};
use camino::{Utf8Path, Utf8PathBuf};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Directory names that are never descended into, matching ANT's default excludes.
pub const DEFAULT_EXCLUDES: &[&str] = &[".git", ".svn", ".hg", ".bzr", "CVS", "_darcs"];

/// Resolves a report pattern into the list of report files it names.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReportLocator {
    pattern: String,
}

impl ReportLocator {
    /// Creates a new locator for the given pattern.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    /// Returns the pattern this locator resolves.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns the absolute paths of all files matched by the pattern.
    ///
    /// Returns an empty list if `workspace_root` is `None`. Errors while resolving the pattern are
    /// logged and also result in an empty list: use [`Self::try_locate`] to tell them apart.
    pub fn locate(&self, workspace_root: Option<&Utf8Path>) -> Vec<Utf8PathBuf> {
        match self.try_locate(workspace_root) {
            Ok(paths) => paths,
            Err(error) => {
                warn!(
                    pattern = %self.pattern,
                    "failed to resolve report pattern, treating it as matching nothing: {}",
                    DisplayErrorChain::new(&error),
                );
                Vec::new()
            }
        }
    }

    /// Returns the absolute paths of all files matched by the pattern, or the error that stopped
    /// the scan.
    pub fn try_locate(
        &self,
        workspace_root: Option<&Utf8Path>,
    ) -> Result<Vec<Utf8PathBuf>, LocateError> {
        let Some(workspace_root) = workspace_root else {
            debug!("no workspace root, not locating reports");
            return Ok(Vec::new());
        };

        let literal = Utf8Path::new(&self.pattern);
        if literal.is_absolute() && literal.exists() {
            debug!(path = %literal, "pattern is an existing absolute path");
            return Ok(vec![literal.to_owned()]);
        }

        let includes = Includes::compile(&self.pattern)?;
        let root = make_absolute(workspace_root)?;
        let walk_root = if includes.base.as_str().is_empty() {
            root.clone()
        } else {
            let walk_root = root.join(&includes.base);
            if !walk_root.is_dir() && root.is_dir() {
                debug!(base = %includes.base, "pattern base is not a directory, nothing to locate");
                return Ok(Vec::new());
            }
            walk_root
        };

        let mut paths = Vec::new();
        let walker = WalkDir::new(&walk_root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_default_excluded(entry));
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) if error.depth() == 0 => {
                    return Err(LocateError::Walk {
                        root: walk_root,
                        error,
                    });
                }
                Err(error) => {
                    warn!(
                        "skipping unreadable entry while locating reports: {}",
                        DisplayErrorChain::new(&error),
                    );
                    continue;
                }
            };
            if !is_file(&entry) {
                continue;
            }

            let path = match Utf8PathBuf::try_from(entry.into_path()) {
                Ok(path) => path,
                Err(error) => {
                    warn!(
                        path = %error.as_path().display(),
                        "skipping non-UTF-8 path while locating reports"
                    );
                    continue;
                }
            };
            let Ok(relative) = path.strip_prefix(&root) else {
                continue;
            };
            if includes.glob_set.is_match(slash_separated(relative)) {
                debug!(path = %path, "located report");
                paths.push(path);
            }
        }

        Ok(paths)
    }
}

/// The compiled includes of a report pattern.
#[derive(Debug)]
struct Includes {
    glob_set: GlobSet,

    /// The longest directory, relative to the workspace root, that contains every possible match.
    base: Utf8PathBuf,
}

impl Includes {
    fn compile(pattern: &str) -> Result<Self, LocateError> {
        let mut builder = GlobSetBuilder::new();
        let mut base: Option<Vec<String>> = None;
        for include in pattern.split(',') {
            let include = include.trim();
            if include.is_empty() {
                continue;
            }

            // ANT accepts either separator, and a trailing separator means everything below it.
            let mut glob = include.replace('\\', "/");
            if glob.ends_with('/') {
                glob.push_str("**");
            }

            let prefix = literal_prefix(&glob);
            base = Some(match base {
                None => prefix.into_iter().map(ToOwned::to_owned).collect(),
                Some(current) => current
                    .into_iter()
                    .zip(prefix)
                    .take_while(|(a, b)| a == b)
                    .map(|(a, _)| a)
                    .collect(),
            });

            let glob = GlobBuilder::new(&glob)
                .literal_separator(true)
                .build()
                .map_err(|error| LocateError::InvalidGlob {
                    glob: include.to_owned(),
                    error,
                })?;
            builder.add(glob);
        }

        let glob_set = builder.build().map_err(|error| LocateError::InvalidGlob {
            glob: pattern.to_owned(),
            error,
        })?;
        let base = base.unwrap_or_default().join("/").into();
        Ok(Self { glob_set, base })
    }
}

/// Returns the leading directories of a normalized glob that contain no glob syntax.
fn literal_prefix(glob: &str) -> Vec<&str> {
    let mut components: Vec<&str> = glob.split('/').collect();
    // The last component names files, not a directory to start from.
    components.pop();
    components
        .into_iter()
        .take_while(|component| is_literal_dir(component))
        .collect()
}

fn is_literal_dir(component: &str) -> bool {
    !component.is_empty()
        && !matches!(component, "." | "..")
        && !DEFAULT_EXCLUDES.contains(&component)
        && !component.contains(['*', '?', '[', ']', '{', '}'])
}

fn make_absolute(root: &Utf8Path) -> Result<Utf8PathBuf, LocateError> {
    if root.is_absolute() {
        return Ok(root.to_owned());
    }
    let absolute = std::path::absolute(root).map_err(|error| LocateError::AbsoluteRoot {
        root: root.to_owned(),
        error,
    })?;
    Utf8PathBuf::try_from(absolute).map_err(|error| LocateError::NonUtf8Path {
        root: root.to_owned(),
        error,
    })
}

fn is_default_excluded(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| DEFAULT_EXCLUDES.contains(&name))
}

fn is_file(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    file_type.is_file() || (file_type.is_symlink() && entry.path().is_file())
}

fn slash_separated(relative: &Utf8Path) -> String {
    relative
        .components()
        .map(|component| component.as_str())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::Utf8TempDir;
    use std::collections::BTreeSet;
    use test_case::test_case;

    fn workspace(files: &[&str]) -> Utf8TempDir {
        let dir = camino_tempfile::tempdir().expect("created temp dir");
        for file in files {
            let path = dir.path().join(file);
            std::fs::create_dir_all(path.parent().expect("file has a parent"))
                .expect("created parent dir");
            std::fs::write(&path, "<TestRun/>").expect("wrote file");
        }
        dir
    }

    fn relative_set(root: &Utf8Path, paths: Vec<Utf8PathBuf>) -> BTreeSet<String> {
        paths
            .into_iter()
            .map(|path| {
                assert!(path.is_absolute(), "{path} is absolute");
                slash_separated(path.strip_prefix(root).expect("path is under root"))
            })
            .collect()
    }

    #[test_case("**/*.trx", &["a/1.trx", "a/b/2.trx", "c.trx"] ; "recursive")]
    #[test_case("*.trx", &["c.trx"] ; "top level only")]
    #[test_case("a/*.trx", &["a/1.trx"] ; "single directory")]
    #[test_case("a/**/*.trx", &["a/1.trx", "a/b/2.trx"] ; "recursive under directory")]
    #[test_case("a/", &["a/1.trx", "a/b/2.trx", "a/notes.txt"] ; "trailing slash")]
    #[test_case("c.trx, a/b/*.trx", &["a/b/2.trx", "c.trx"] ; "comma separated")]
    #[test_case("a\\b\\*.trx", &["a/b/2.trx"] ; "backslash separators")]
    #[test_case("**/*.xml", &[] ; "no matches")]
    fn glob_expansion(pattern: &str, expected: &[&str]) {
        let dir = workspace(&["a/1.trx", "a/b/2.trx", "a/notes.txt", "c.trx"]);
        let located = ReportLocator::new(pattern).locate(Some(dir.path()));
        let expected: BTreeSet<String> = expected.iter().map(|s| (*s).to_owned()).collect();
        assert_eq!(relative_set(dir.path(), located), expected);
    }

    #[test]
    fn absolute_path_bypasses_glob() {
        let dir = workspace(&["a/1.trx", "c.trx"]);
        let other = workspace(&["elsewhere.trx"]);
        let report = other.path().join("elsewhere.trx");

        let located = ReportLocator::new(report.as_str()).locate(Some(dir.path()));
        assert_eq!(located, vec![report]);
    }

    #[test]
    fn absolute_path_that_does_not_exist_is_a_glob() {
        let dir = workspace(&["c.trx"]);
        let missing = dir.path().join("missing.trx");

        let located = ReportLocator::new(missing.as_str()).locate(Some(dir.path()));
        assert_eq!(located, Vec::<Utf8PathBuf>::new());
    }

    #[test]
    fn no_workspace_root() {
        let locator = ReportLocator::new("**/*.trx");
        assert_eq!(locator.locate(None), Vec::<Utf8PathBuf>::new());
        assert!(
            locator
                .try_locate(None)
                .expect("no root is not an error")
                .is_empty()
        );
    }

    #[test]
    fn missing_root_is_swallowed() {
        let dir = workspace(&[]);
        let missing = dir.path().join("does-not-exist");
        let locator = ReportLocator::new("**/*.trx");

        assert!(locator.locate(Some(missing.as_path())).is_empty());
        assert!(matches!(
            locator.try_locate(Some(missing.as_path())),
            Err(LocateError::Walk { .. })
        ));
    }

    #[test]
    fn invalid_glob_is_swallowed() {
        let dir = workspace(&["c.trx"]);
        let locator = ReportLocator::new("a/[.trx");

        assert!(locator.locate(Some(dir.path())).is_empty());
        match locator.try_locate(Some(dir.path())) {
            Err(LocateError::InvalidGlob { glob, .. }) => assert_eq!(glob, "a/[.trx"),
            other => panic!("expected InvalidGlob, found {other:?}"),
        }
    }

    #[test_case("**/*.trx", "" ; "recursive from root")]
    #[test_case("*.trx", "" ; "top level")]
    #[test_case("TestResults/*.trx", "TestResults" ; "single directory")]
    #[test_case("a/b/**/*.trx", "a/b" ; "nested directory")]
    #[test_case("a/", "a" ; "trailing slash")]
    #[test_case("a\\b\\*.trx", "a/b" ; "backslash separators")]
    #[test_case("a/b/*.trx, a/c/*.trx", "a" ; "common directory")]
    #[test_case("a/*.trx, c.trx", "" ; "no common directory")]
    #[test_case("a/*/x/*.trx", "a" ; "wildcard directory")]
    #[test_case("../other/*.trx", "" ; "parent directory")]
    #[test_case(".git/*.trx", "" ; "default exclude")]
    fn pattern_base(pattern: &str, expected: &str) {
        let includes = Includes::compile(pattern).expect("pattern compiles");
        assert_eq!(includes.base, expected);
    }

    #[test]
    fn missing_pattern_base_matches_nothing() {
        let dir = workspace(&["a/1.trx"]);
        let located = ReportLocator::new("TestResults/*.trx")
            .try_locate(Some(dir.path()))
            .expect("a missing base directory is not an error");
        assert_eq!(located, Vec::<Utf8PathBuf>::new());
    }

    #[cfg(target_os = "linux")]
    #[test_case("**/*.trx" ; "walk from root")]
    #[test_case("TestResults/*.trx" ; "walk from base")]
    fn non_utf8_sibling_is_skipped(pattern: &str) {
        use std::{ffi::OsStr, os::unix::ffi::OsStrExt};

        let dir = workspace(&["TestResults/run.trx"]);
        let other = dir.path().as_std_path().join("other");
        std::fs::create_dir_all(&other).expect("created other dir");
        std::fs::write(other.join(OsStr::from_bytes(b"caf\xE9.txt")), "").expect("wrote file");
        std::fs::write(other.join(OsStr::from_bytes(b"caf\xE9.trx")), "").expect("wrote file");

        let located = ReportLocator::new(pattern)
            .try_locate(Some(dir.path()))
            .expect("a bad sibling does not fail the scan");
        let expected: BTreeSet<String> = ["TestResults/run.trx".to_owned()].into();
        assert_eq!(relative_set(dir.path(), located), expected);
    }

    #[test]
    fn default_excludes_are_skipped() {
        let dir = workspace(&[".git/results.trx", "sub/CVS/old.trx", "sub/new.trx"]);
        let located = ReportLocator::new("**/*.trx").locate(Some(dir.path()));
        let expected: BTreeSet<String> = ["sub/new.trx".to_owned()].into();
        assert_eq!(relative_set(dir.path(), located), expected);
    }

    #[test]
    fn directories_are_not_reports() {
        let dir = workspace(&["run.trx/inner.txt", "real.trx"]);
        let located = ReportLocator::new("*.trx").locate(Some(dir.path()));
        let expected: BTreeSet<String> = ["real.trx".to_owned()].into();
        assert_eq!(relative_set(dir.path(), located), expected);
    }

    #[test]
    fn results_are_in_walk_order() {
        let dir = workspace(&["b.trx", "a.trx", "c/d.trx"]);
        let located = ReportLocator::new("**/*.trx").locate(Some(dir.path()));
        let relative: Vec<_> = located
            .iter()
            .map(|path| slash_separated(path.strip_prefix(dir.path()).expect("under root")))
            .collect();
        assert_eq!(relative, vec!["a.trx", "b.trx", "c/d.trx"]);
    }
}
