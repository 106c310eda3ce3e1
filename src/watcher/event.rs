use std::path::Path;

use notify::Event;
use notify::event::{AccessKind, AccessMode, CreateKind, EventKind, ModifyKind, RemoveKind, RenameMode};

use crate::change::{ChangeHint, CorrelationToken, EntryKind, RawChange};
use crate::reconcile::normalize::EncodingPolicy;

/// Translate one notify event into raw change records for `root`.
///
/// Events on the root itself are dropped, as are directory events that only
/// report activity inside the directory (inotify raises those alongside the
/// file events). Undecodable paths become invalid-encoding records carrying
/// the full raw path.
pub fn translate(event: &Event, root: &Path, encoding: &EncodingPolicy) -> Vec<RawChange> {
    let Some(hint) = classify(&event.kind) else {
        return Vec::new();
    };
    let cookie = event.attrs.tracker().map(|t| CorrelationToken(t as u64));

    let mut changes = Vec::new();
    for path in &event.paths {
        if path == root {
            continue;
        }

        if encoding.is_invalid(path.as_os_str()) {
            changes.push(RawChange::invalid(path.clone()));
            continue;
        }

        let hint = match hint {
            Classified::Known(hint) => Some(hint),
            Classified::Unclassified => None,
            Classified::RenameHalf => Some(if path.exists() {
                ChangeHint::MovedTo
            } else {
                ChangeHint::MovedFrom
            }),
        };

        let entry_kind = entry_kind(&event.kind, path);
        if entry_kind.is_dir() && reports_contents_only(&event.kind) {
            continue;
        }

        let relative = path.strip_prefix(root).unwrap_or(path);
        tracing::trace!(path = %relative.display(), kind = ?event.kind, "raw event");

        let mut change = match entry_kind {
            EntryKind::Directory => RawChange::dir(root, relative, hint),
            EntryKind::File => RawChange::file(root, relative, hint),
        };
        if let Some(cookie) = cookie {
            change = change.with_cookie(cookie);
        }
        changes.push(change);
    }
    changes
}

/// Append creation records for the files already inside every directory
/// that appeared in `changes`.
///
/// A directory created or moved into the tree raises one event for itself;
/// the files below it never raise their own. The walk honours `.gitignore`
/// when `respect_gitignore` is set.
pub fn with_tree_contents(
    mut changes: Vec<RawChange>,
    encoding: &EncodingPolicy,
    respect_gitignore: bool,
) -> Vec<RawChange> {
    let appeared: Vec<usize> = changes
        .iter()
        .enumerate()
        .filter(|(_, c)| {
            c.entry_kind.is_dir()
                && matches!(c.change, Some(ChangeHint::Created | ChangeHint::MovedTo))
        })
        .map(|(i, _)| i)
        .collect();

    for i in appeared {
        let contents = tree_contents(&changes[i], encoding, respect_gitignore);
        changes.extend(contents);
    }
    changes
}

fn tree_contents(
    dir: &RawChange,
    encoding: &EncodingPolicy,
    respect_gitignore: bool,
) -> Vec<RawChange> {
    let walker = ignore::WalkBuilder::new(dir.root_dir.join(&dir.relative_path))
        .standard_filters(respect_gitignore)
        .hidden(false)
        .require_git(false)
        .build();

    let mut files = Vec::new();
    for result in walker {
        let entry = match result {
            Ok(e) => e,
            Err(err) => {
                tracing::debug!("skipping unreadable entry: {err}");
                continue;
            }
        };

        if entry.file_type().map(|ft| ft.is_dir()).unwrap_or(true) {
            continue;
        }

        let path = entry.path();
        if encoding.is_invalid(path.as_os_str()) {
            files.push(RawChange::invalid(path.to_path_buf()));
            continue;
        }
        let relative = path.strip_prefix(&dir.root_dir).unwrap_or(path);
        files.push(RawChange::file(
            dir.root_dir.clone(),
            relative,
            Some(ChangeHint::Created),
        ));
    }

    tracing::debug!(
        dir = %dir.relative_path.display(),
        files = files.len(),
        "listed contents of new directory"
    );
    files
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Classified {
    Known(ChangeHint),
    /// Activity with no usable hint; kept so the path is still probed.
    Unclassified,
    /// A rename whose direction the backend did not report.
    RenameHalf,
}

/// `None` means the event carries nothing worth a record.
fn classify(kind: &EventKind) -> Option<Classified> {
    use Classified::*;

    match kind {
        EventKind::Create(_) => Some(Known(ChangeHint::Created)),
        EventKind::Remove(_) => Some(Known(ChangeHint::Deleted)),
        EventKind::Modify(ModifyKind::Metadata(_)) => Some(Known(ChangeHint::ModifiedAttrib)),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Some(Known(ChangeHint::MovedFrom)),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(Known(ChangeHint::MovedTo)),
        // inotify reports both halves separately before the combined event.
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => None,
        EventKind::Modify(ModifyKind::Name(_)) => Some(RenameHalf),
        EventKind::Modify(_) => Some(content_write()),
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => {
            Some(Known(ChangeHint::ModifiedWrite))
        }
        EventKind::Access(_) | EventKind::Any | EventKind::Other => None,
    }
}

/// inotify follows every write with a close-write, which carries the hint;
/// other backends only ever report the write itself.
#[cfg(target_os = "linux")]
fn content_write() -> Classified {
    Classified::Unclassified
}

#[cfg(not(target_os = "linux"))]
fn content_write() -> Classified {
    Classified::Known(ChangeHint::ModifiedWrite)
}

fn entry_kind(kind: &EventKind, path: &Path) -> EntryKind {
    match kind {
        EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder) => {
            EntryKind::Directory
        }
        EventKind::Create(CreateKind::File) | EventKind::Remove(RemoveKind::File) => {
            EntryKind::File
        }
        _ if path.is_dir() => EntryKind::Directory,
        _ => EntryKind::File,
    }
}

fn reports_contents_only(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any | ModifyKind::Other)
            | EventKind::Access(_)
    )
}
