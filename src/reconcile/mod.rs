pub mod group;
pub mod normalize;
pub mod reinterpret;
pub mod squash;

use std::path::Path;

use crate::change::{ActionKind, ChangeHint, LogicalChangeSet, RawChange};
use crate::silencer::Silencer;

use normalize::EncodingPolicy;

/// Intermediate action carried between reinterpretation and squashing.
///
/// Rename halves are translated before squashing; every other producer hint
/// rides along untouched as `Raw` and is settled at the last moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionHint {
    Added,
    Removed,
    Modified,
    InvalidFilePath,
    Raw(ChangeHint),
}

impl ActionHint {
    /// Map onto the client-facing action.
    pub fn settle(self) -> ActionKind {
        match self {
            ActionHint::Added
            | ActionHint::Raw(ChangeHint::MovedTo)
            | ActionHint::Raw(ChangeHint::Created) => ActionKind::Added,
            ActionHint::Removed
            | ActionHint::Raw(ChangeHint::MovedFrom)
            | ActionHint::Raw(ChangeHint::Deleted) => ActionKind::Removed,
            ActionHint::Modified
            | ActionHint::Raw(ChangeHint::ModifiedAttrib)
            | ActionHint::Raw(ChangeHint::ModifiedWrite) => ActionKind::Modified,
            ActionHint::InvalidFilePath => ActionKind::InvalidFilePath,
        }
    }
}

/// Live existence check used while squashing.
pub trait PathProbe {
    fn exists(&self, path: &Path) -> bool;
}

/// Probes the real filesystem. Any error (permissions, a path vanishing
/// mid-check) counts as "does not exist".
#[derive(Debug, Default, Clone, Copy)]
pub struct LiveFilesystem;

impl PathProbe for LiveFilesystem {
    fn exists(&self, path: &Path) -> bool {
        match path.try_exists() {
            Ok(exists) => exists,
            Err(err) => {
                tracing::debug!(path = %path.display(), "existence probe failed: {err}");
                false
            }
        }
    }
}

/// Observational sink for what the engine decided. Never affects results.
pub trait Diagnostics {
    /// One entry per distinct path, `None` where the path resolved to nothing.
    fn raw_actions(&self, actions: &[(Option<ActionKind>, String)]);
    fn final_changes(&self, changes: &LogicalChangeSet);
    fn invalid_path(&self, path: &Path);
}

/// Writes diagnostics as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn raw_actions(&self, actions: &[(Option<ActionKind>, String)]) {
        tracing::debug!(?actions, "raw changes");
    }

    fn final_changes(&self, changes: &LogicalChangeSet) {
        tracing::debug!(
            modified = ?changes.modified,
            added = ?changes.added,
            removed = ?changes.removed,
            invalid_file_path = ?changes.invalid_file_path,
            "final changes"
        );
    }

    fn invalid_path(&self, path: &Path) {
        tracing::error!(path = %path.to_string_lossy(), "path is not valid text");
    }
}

/// Turns one closed batch of raw changes into its logical change set.
///
/// Holds no state between batches. The caller must not run two batches
/// against the same tree concurrently.
pub struct Reconciler<'a> {
    silencer: &'a dyn Silencer,
    probe: &'a dyn PathProbe,
    diagnostics: &'a dyn Diagnostics,
    encoding: EncodingPolicy,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        silencer: &'a dyn Silencer,
        probe: &'a dyn PathProbe,
        diagnostics: &'a dyn Diagnostics,
        encoding: EncodingPolicy,
    ) -> Self {
        Self {
            silencer,
            probe,
            diagnostics,
            encoding,
        }
    }

    pub fn reconcile(&self, batch: Vec<RawChange>) -> LogicalChangeSet {
        let groups = group::group_by_correlation(batch);
        let candidates = reinterpret::reinterpret(groups, self.silencer, &self.encoding);

        let normalized = candidates
            .into_iter()
            .map(|candidate| {
                let change = normalize::normalize(candidate, &self.encoding);
                if change.invalid {
                    self.diagnostics.invalid_path(&change.path);
                }
                change
            })
            .collect();

        squash::squash(normalized, self.probe, self.diagnostics)
    }
}
