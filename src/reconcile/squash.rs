use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::change::{ActionKind, LogicalChangeSet};

use super::normalize::NormalizedChange;
use super::{ActionHint, Diagnostics, PathProbe};

/// Collapse normalized changes into one logical action per absolute path.
///
/// Paths keep the order in which they were first seen in the batch.
pub fn squash(
    changes: Vec<NormalizedChange>,
    probe: &dyn PathProbe,
    diagnostics: &dyn Diagnostics,
) -> LogicalChangeSet {
    let mut order: Vec<PathBuf> = Vec::new();
    let mut hints: HashMap<PathBuf, Vec<Option<ActionHint>>> = HashMap::new();

    for change in changes {
        let entry = hints.entry(change.path.clone()).or_insert_with(|| {
            order.push(change.path.clone());
            Vec::new()
        });
        entry.push(change.action);
    }

    let actions: Vec<(Option<ActionKind>, String)> = order
        .iter()
        .map(|path| {
            let action = logical_action(path, &hints[path], probe);
            (action, path.to_string_lossy().into_owned())
        })
        .collect();

    diagnostics.raw_actions(&actions);

    let mut squashed = LogicalChangeSet::default();
    let mut seen: HashSet<String> = HashSet::new();
    for ((action, rendered), path) in actions.into_iter().zip(&order) {
        let Some(kind) = action else { continue };
        // Distinct undecodable byte paths can render to the same lossy string.
        if !seen.insert(rendered.clone()) {
            tracing::debug!(path = %rendered, "dropping duplicate rendering of path");
            diagnostics.invalid_path(path);
            continue;
        }
        squashed.push(kind, rendered);
    }

    diagnostics.final_changes(&squashed);
    squashed
}

/// Derive the logical action for one path from its hints and its current
/// existence on disk.
///
/// Event order is unreliable across producers, so existence is probed live
/// and hint counts only break ties existence cannot.
fn logical_action(
    path: &Path,
    hints: &[Option<ActionHint>],
    probe: &dyn PathProbe,
) -> Option<ActionKind> {
    let settled: Vec<ActionKind> = hints.iter().flatten().map(|h| h.settle()).collect();

    if settled.contains(&ActionKind::InvalidFilePath) {
        return Some(ActionKind::InvalidFilePath);
    }

    let added = settled.iter().filter(|&&k| k == ActionKind::Added).count() as isize;
    let removed = settled.iter().filter(|&&k| k == ActionKind::Removed).count() as isize;
    let diff = added - removed;
    let had_modified = settled.contains(&ActionKind::Modified);

    if probe.exists(path) {
        if diff > 0 {
            Some(ActionKind::Added)
        } else if diff == 0 && added > 0 {
            Some(ActionKind::Modified)
        } else {
            had_modified.then_some(ActionKind::Modified)
        }
    } else {
        (diff < 0).then_some(ActionKind::Removed)
    }
}
