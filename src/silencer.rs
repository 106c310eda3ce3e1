use std::path::{Component, Path};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use regex::{Regex, RegexSet};

use crate::change::EntryKind;
use crate::config::SquashConfig;
use crate::error::WatchError;

/// Decides whether changes to a path should be hidden from the client.
///
/// Called with the path relative to its watched root. Implementations must be
/// side-effect free and fast; the engine calls this once per candidate record.
pub trait Silencer {
    fn is_silenced(&self, relative_path: &Path, kind: EntryKind) -> bool;
}

impl<F> Silencer for F
where
    F: Fn(&Path, EntryKind) -> bool,
{
    fn is_silenced(&self, relative_path: &Path, kind: EntryKind) -> bool {
        self(relative_path, kind)
    }
}

/// Path components that are always noise: VCS metadata and dependency trees.
const DEFAULT_IGNORED_COMPONENTS: &[&str] = &[
    r"\A\.git\z",
    r"\A\.svn\z",
    r"\A\.hg\z",
    r"\A\.bzr\z",
    r"\Anode_modules\z",
    // emacs lock and autosave files
    r"\A\#.+\#\z",
    r"\A\.\#.+\z",
];

/// File names editors and tools write while saving. Matched against the last
/// path component only.
const DEFAULT_IGNORED_FILE_NAMES: &[&str] = &[
    // Kate
    r"\..*\d+\.new\z",
    r"\.kate-swp\z",
    // gedit
    r"\.goutputstream-.{6}\z",
    // JetBrains safe-write
    r"___jb_bak___\z",
    r"___jb_old___\z",
    // Vim swap files and its write probe
    r"\.sw[px]\z",
    r"\.swpx\z",
    r"\A4913\z",
    // sed -i
    r"\Ased[a-zA-Z0-9]{0,6}\z",
    r"\A\.DS_Store\z",
    r"\.tmp\z",
    r"~\z",
];

/// The default silencer: built-in noise rules, user `ignore`/`only` regexes
/// and the watched root's `.gitignore`.
#[derive(Debug)]
pub struct PathSilencer {
    default_components: Option<RegexSet>,
    default_file_names: Option<RegexSet>,
    ignore: RegexSet,
    only: Option<RegexSet>,
    gitignore: Option<Gitignore>,
}

impl PathSilencer {
    pub fn new(root: &Path, config: &SquashConfig) -> Result<Self, WatchError> {
        let (default_components, default_file_names) = if config.default_ignores {
            (
                Some(compile_set(DEFAULT_IGNORED_COMPONENTS)?),
                Some(compile_set(DEFAULT_IGNORED_FILE_NAMES)?),
            )
        } else {
            (None, None)
        };

        let only = if config.only.is_empty() {
            None
        } else {
            Some(compile_set(config.only.as_slice())?)
        };

        let gitignore = config
            .respect_gitignore
            .then(|| build_gitignore_matcher(root));

        Ok(Self {
            default_components,
            default_file_names,
            ignore: compile_set(config.ignore.as_slice())?,
            only,
            gitignore,
        })
    }

    fn matches_defaults(&self, relative_path: &Path) -> bool {
        if let Some(components) = &self.default_components {
            let hit = relative_path.components().any(|c| match c {
                Component::Normal(name) => components.is_match(&name.to_string_lossy()),
                _ => false,
            });
            if hit {
                return true;
            }
        }

        match (&self.default_file_names, relative_path.file_name()) {
            (Some(names), Some(name)) => names.is_match(&name.to_string_lossy()),
            _ => false,
        }
    }

    fn matches_gitignore(&self, relative_path: &Path, kind: EntryKind) -> bool {
        let Some(gitignore) = &self.gitignore else {
            return false;
        };
        if relative_path.has_root() {
            gitignore.matched(relative_path, kind.is_dir()).is_ignore()
        } else {
            gitignore
                .matched_path_or_any_parents(relative_path, kind.is_dir())
                .is_ignore()
        }
    }
}

impl Silencer for PathSilencer {
    fn is_silenced(&self, relative_path: &Path, kind: EntryKind) -> bool {
        let text = relative_path.to_string_lossy();

        if let Some(only) = &self.only
            && kind == EntryKind::File
            && !only.is_match(&text)
        {
            return true;
        }

        self.ignore.is_match(&text)
            || self.matches_defaults(relative_path)
            || self.matches_gitignore(relative_path, kind)
    }
}

/// Compile patterns one by one first so a bad pattern can be named in the error.
fn compile_set<S: AsRef<str>>(patterns: &[S]) -> Result<RegexSet, WatchError> {
    for pattern in patterns {
        Regex::new(pattern.as_ref()).map_err(|source| WatchError::InvalidPattern {
            pattern: pattern.as_ref().to_string(),
            source,
        })?;
    }
    RegexSet::new(patterns).map_err(|source| WatchError::InvalidPattern {
        pattern: patterns
            .iter()
            .map(|p| p.as_ref())
            .collect::<Vec<_>>()
            .join(" | "),
        source,
    })
}

/// Build a Gitignore matcher from the watched root's .gitignore file.
/// If no .gitignore exists, returns an empty matcher that matches nothing.
fn build_gitignore_matcher(root: &Path) -> Gitignore {
    let mut builder = GitignoreBuilder::new(root);
    let gitignore_path = root.join(".gitignore");
    if gitignore_path.exists()
        && let Some(err) = builder.add(&gitignore_path)
    {
        tracing::warn!("partially parsed {}: {err}", gitignore_path.display());
    }
    builder.build().unwrap_or_else(|err| {
        tracing::warn!("ignoring {}: {err}", gitignore_path.display());
        Gitignore::empty()
    })
}
