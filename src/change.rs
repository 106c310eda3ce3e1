use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Whether a raw notification was reported against a directory or a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Directory,
    File,
}

impl EntryKind {
    pub fn is_dir(self) -> bool {
        matches!(self, EntryKind::Directory)
    }
}

/// What the platform watch facility said happened to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeHint {
    /// Metadata (permissions, ownership, timestamps) changed.
    ModifiedAttrib,
    /// A writer closed the file after writing to it.
    ModifiedWrite,
    Created,
    Deleted,
    /// The destination half of a rename.
    MovedTo,
    /// The source half of a rename.
    MovedFrom,
}

/// Opaque value shared by the two halves of one rename.
///
/// inotify calls this the "cookie"; notify exposes it as the event tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationToken(pub u64);

/// One unprocessed observation from the raw event producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawChange {
    pub entry_kind: EntryKind,
    /// The watched root `relative_path` is relative to.
    pub root_dir: PathBuf,
    pub relative_path: PathBuf,
    /// `None` when the producer saw activity it could not classify.
    #[serde(default)]
    pub change: Option<ChangeHint>,
    /// Present only for paired rename notifications.
    #[serde(default)]
    pub cookie: Option<CorrelationToken>,
    /// Set when the raw path bytes are not validly decodable text.
    #[serde(default)]
    pub invalid_encoding: bool,
}

impl RawChange {
    /// A file notification with no correlation token.
    pub fn file(
        root_dir: impl Into<PathBuf>,
        relative_path: impl Into<PathBuf>,
        change: Option<ChangeHint>,
    ) -> Self {
        Self {
            entry_kind: EntryKind::File,
            root_dir: root_dir.into(),
            relative_path: relative_path.into(),
            change,
            cookie: None,
            invalid_encoding: false,
        }
    }

    /// A directory notification with no correlation token.
    pub fn dir(
        root_dir: impl Into<PathBuf>,
        relative_path: impl Into<PathBuf>,
        change: Option<ChangeHint>,
    ) -> Self {
        Self {
            entry_kind: EntryKind::Directory,
            ..Self::file(root_dir, relative_path, change)
        }
    }

    /// A path the producer could not decode.
    ///
    /// The full raw path is carried in `relative_path` with an empty root so
    /// the bytes survive normalization untouched.
    pub fn invalid(raw_path: impl Into<PathBuf>) -> Self {
        Self {
            invalid_encoding: true,
            ..Self::file(PathBuf::new(), raw_path, None)
        }
    }

    pub fn with_cookie(mut self, cookie: CorrelationToken) -> Self {
        self.cookie = Some(cookie);
        self
    }
}

/// The logical action reported to the client for one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Modified,
    Added,
    Removed,
    InvalidFilePath,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Modified => "modified",
            ActionKind::Added => "added",
            ActionKind::Removed => "removed",
            ActionKind::InvalidFilePath => "invalid_file_path",
        }
    }
}

/// Final result of one reconciliation pass.
///
/// Serializes with exactly four keys, empty lists included. Consumers of
/// this shape do not distinguish directories from files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalChangeSet {
    pub modified: Vec<String>,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub invalid_file_path: Vec<String>,
}

impl LogicalChangeSet {
    pub fn paths(&self, kind: ActionKind) -> &[String] {
        match kind {
            ActionKind::Modified => &self.modified,
            ActionKind::Added => &self.added,
            ActionKind::Removed => &self.removed,
            ActionKind::InvalidFilePath => &self.invalid_file_path,
        }
    }

    /// Append `path` to the list for `kind`, preserving discovery order.
    pub fn push(&mut self, kind: ActionKind, path: String) {
        let list = match kind {
            ActionKind::Modified => &mut self.modified,
            ActionKind::Added => &mut self.added,
            ActionKind::Removed => &mut self.removed,
            ActionKind::InvalidFilePath => &mut self.invalid_file_path,
        };
        list.push(path);
    }

    pub fn len(&self) -> usize {
        self.modified.len() + self.added.len() + self.removed.len() + self.invalid_file_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
