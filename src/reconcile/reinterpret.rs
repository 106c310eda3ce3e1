use std::path::PathBuf;

use crate::change::{ChangeHint, EntryKind, RawChange};
use crate::silencer::Silencer;

use super::ActionHint;
use super::group::CorrelationGroup;
use super::normalize::EncodingPolicy;

/// A record that survived reinterpretation, still split into root and
/// relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// `None` when the producer gave no usable hint.
    pub action: Option<ActionHint>,
    pub entry_kind: EntryKind,
    pub root_dir: PathBuf,
    pub relative_path: PathBuf,
    pub invalid_encoding: bool,
}

impl Candidate {
    fn from_change(change: &RawChange, action: Option<ActionHint>) -> Self {
        Self {
            action,
            entry_kind: change.entry_kind,
            root_dir: change.root_dir.clone(),
            relative_path: change.relative_path.clone(),
            invalid_encoding: change.invalid_encoding,
        }
    }
}

/// Decide what each correlation group means.
///
/// A qualifying editor save collapses to one `Modified` candidate; every
/// other group is filtered through the silencer and translated record by
/// record.
pub fn reinterpret(
    groups: Vec<CorrelationGroup>,
    silencer: &dyn Silencer,
    encoding: &EncodingPolicy,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for group in groups {
        tracing::trace!(key = ?group.key, size = group.changes.len(), "correlation group");
        let silenced: Vec<bool> = group
            .changes
            .iter()
            .map(|c| silencer.is_silenced(&c.relative_path, c.entry_kind))
            .collect();

        if let Some(target) = editor_save_target(&group.changes, &silenced) {
            tracing::debug!(
                path = %target.relative_path.display(),
                "rename over silenced temp file treated as modification"
            );
            candidates.push(Candidate::from_change(target, Some(ActionHint::Modified)));
            continue;
        }

        for (change, silenced) in group.changes.iter().zip(silenced) {
            let undecodable =
                change.invalid_encoding || encoding.is_invalid(change.relative_path.as_os_str());
            if silenced && !undecodable {
                continue;
            }
            candidates.push(Candidate::from_change(change, translate(change)));
        }
    }

    candidates
}

/// Detect the write-temp-then-rename save pattern used by several editors.
///
/// Qualifies when the group is exactly one `MovedFrom` and one `MovedTo`,
/// the source is silenced and the destination is not. `silenced` holds the
/// silencer's verdict for each record. Returns the destination record.
fn editor_save_target<'a>(changes: &'a [RawChange], silenced: &[bool]) -> Option<&'a RawChange> {
    let ([first, second], &[first_silenced, second_silenced]) = (changes, silenced) else {
        return None;
    };

    let (from_silenced, to, to_silenced) = match (first.change, second.change) {
        (Some(ChangeHint::MovedFrom), Some(ChangeHint::MovedTo)) => {
            (first_silenced, second, second_silenced)
        }
        (Some(ChangeHint::MovedTo), Some(ChangeHint::MovedFrom)) => {
            (second_silenced, first, first_silenced)
        }
        _ => return None,
    };

    (from_silenced && !to_silenced).then_some(to)
}

/// The fixed translation table for records on the default path.
fn translate(change: &RawChange) -> Option<ActionHint> {
    if change.invalid_encoding {
        return Some(ActionHint::InvalidFilePath);
    }
    change.change.map(|hint| match hint {
        ChangeHint::MovedTo => ActionHint::Added,
        ChangeHint::MovedFrom => ActionHint::Removed,
        ChangeHint::ModifiedAttrib
        | ChangeHint::ModifiedWrite
        | ChangeHint::Created
        | ChangeHint::Deleted => ActionHint::Raw(hint),
    })
}
