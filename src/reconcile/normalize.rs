use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

use super::ActionHint;
use super::reinterpret::Candidate;

/// Which path encodings count as valid text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingPolicy {
    /// Also reject paths that are valid UTF-8 but not 7-bit ASCII.
    pub ascii_only: bool,
}

impl Default for EncodingPolicy {
    fn default() -> Self {
        Self { ascii_only: true }
    }
}

impl EncodingPolicy {
    pub fn is_invalid(&self, path: &OsStr) -> bool {
        match path.to_str() {
            None => true,
            Some(text) => self.ascii_only && !text.is_ascii(),
        }
    }
}

/// A candidate resolved to one absolute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedChange {
    pub action: Option<ActionHint>,
    pub path: PathBuf,
    /// Set when the path failed encoding validation; `action` is then
    /// always `InvalidFilePath`.
    pub invalid: bool,
}

/// Resolve a candidate to one absolute path.
///
/// Valid paths are joined lexically, never canonicalized, so paths that no
/// longer exist still resolve. Undecodable paths are concatenated byte for
/// byte with no separator handling so the raw bytes reach the client.
pub fn normalize(candidate: Candidate, encoding: &EncodingPolicy) -> NormalizedChange {
    let undecodable =
        candidate.invalid_encoding || encoding.is_invalid(candidate.relative_path.as_os_str());

    if undecodable {
        let mut raw: OsString = candidate.root_dir.into_os_string();
        raw.push(candidate.relative_path.as_os_str());
        return NormalizedChange {
            action: Some(ActionHint::InvalidFilePath),
            path: PathBuf::from(raw),
            invalid: true,
        };
    }

    let path = candidate.root_dir.join(&candidate.relative_path);
    tracing::trace!(kind = ?candidate.entry_kind, path = %path.display(), "normalized");
    if encoding.is_invalid(path.as_os_str()) {
        return NormalizedChange {
            action: Some(ActionHint::InvalidFilePath),
            path,
            invalid: true,
        };
    }

    NormalizedChange {
        action: candidate.action,
        path,
        invalid: false,
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::change::{ChangeHint, EntryKind};

    fn candidate(root: &str, rel: &str, action: Option<ActionHint>) -> Candidate {
        Candidate {
            action,
            entry_kind: EntryKind::File,
            root_dir: PathBuf::from(root),
            relative_path: PathBuf::from(rel),
            invalid_encoding: false,
        }
    }

    #[test]
    fn test_valid_path_is_joined_without_touching_the_filesystem() {
        let n = normalize(
            candidate("/nowhere/root", "sub/file.txt", Some(ActionHint::Added)),
            &EncodingPolicy::default(),
        );
        assert_eq!(n.path, Path::new("/nowhere/root/sub/file.txt"));
        assert_eq!(n.action, Some(ActionHint::Added));
        assert!(!n.invalid);
    }

    #[test]
    fn test_non_ascii_path_is_forced_invalid_and_concatenated_verbatim() {
        let n = normalize(
            candidate("/w/", "caf\u{e9}.txt", Some(ActionHint::Raw(ChangeHint::Created))),
            &EncodingPolicy::default(),
        );
        assert!(n.invalid);
        assert_eq!(n.action, Some(ActionHint::InvalidFilePath));
        assert_eq!(n.path.as_os_str(), OsStr::new("/w/caf\u{e9}.txt"));
    }

    #[test]
    fn test_flagged_record_keeps_raw_concatenation() {
        let mut c = candidate("/w", "/w/x", None);
        c.invalid_encoding = true;
        let n = normalize(c, &EncodingPolicy::default());
        assert!(n.invalid);
        assert_eq!(n.path.as_os_str(), OsStr::new("/w/w/x"));
    }

    #[test]
    fn test_non_ascii_root_invalidates_the_joined_path() {
        let n = normalize(
            candidate("/h\u{f6}me", "a.txt", Some(ActionHint::Modified)),
            &EncodingPolicy::default(),
        );
        assert!(n.invalid);
        assert_eq!(n.path, Path::new("/h\u{f6}me/a.txt"));
    }

    #[test]
    fn test_relaxed_policy_accepts_utf8() {
        let policy = EncodingPolicy { ascii_only: false };
        assert!(!policy.is_invalid(OsStr::new("caf\u{e9}")));
        assert!(EncodingPolicy::default().is_invalid(OsStr::new("caf\u{e9}")));
        assert!(!EncodingPolicy::default().is_invalid(OsStr::new("cafe")));
    }

    #[cfg(unix)]
    #[test]
    fn test_undecodable_bytes_are_invalid_under_any_policy() {
        use std::os::unix::ffi::OsStrExt;
        let bytes = OsStr::from_bytes(b"bad\xff.txt");
        assert!(EncodingPolicy { ascii_only: false }.is_invalid(bytes));

        let n = normalize(
            Candidate {
                action: None,
                entry_kind: EntryKind::File,
                root_dir: PathBuf::from("/w/"),
                relative_path: PathBuf::from(bytes),
                invalid_encoding: false,
            },
            &EncodingPolicy { ascii_only: false },
        );
        assert!(n.invalid);
        assert_eq!(n.path.as_os_str().as_bytes(), b"/w/bad\xff.txt");
    }
}
