use std::collections::HashMap;

use crate::change::{CorrelationToken, RawChange};

/// Identity of a correlation group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKey {
    /// Records sharing a rename cookie.
    Token(CorrelationToken),
    /// A record without a cookie; the index is its position in the batch.
    Solo(usize),
}

/// Records that must be interpreted together, in batch order.
#[derive(Debug, Clone)]
pub struct CorrelationGroup {
    pub key: GroupKey,
    pub changes: Vec<RawChange>,
}

/// Partition a batch by correlation token.
///
/// Groups come out in order of first appearance and each group keeps its
/// records in batch order, which later stages rely on to tell the source
/// and destination of a rename apart.
pub fn group_by_correlation(batch: Vec<RawChange>) -> Vec<CorrelationGroup> {
    let mut groups: Vec<CorrelationGroup> = Vec::new();
    let mut by_token: HashMap<CorrelationToken, usize> = HashMap::new();

    for (position, change) in batch.into_iter().enumerate() {
        let Some(token) = change.cookie else {
            groups.push(CorrelationGroup {
                key: GroupKey::Solo(position),
                changes: vec![change],
            });
            continue;
        };

        match by_token.get(&token) {
            Some(&index) => groups[index].changes.push(change),
            None => {
                by_token.insert(token, groups.len());
                groups.push(CorrelationGroup {
                    key: GroupKey::Token(token),
                    changes: vec![change],
                });
            }
        }
    }

    groups
}
