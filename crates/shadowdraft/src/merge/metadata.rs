//! Metadata reconciliation.
//!
//! [`plan`] computes which metadata keys to copy from a source item onto a
//! destination and which destination-only keys to drop. It is a pure
//! computation; [`apply`] writes a plan through the metadata store.

use std::collections::BTreeSet;

use anyhow::Result;

use crate::models::{ItemId, MetaMap};
use crate::store::MetadataStore;

/// Meta key on a draft item holding the id of its published counterpart.
pub const PUBLISHED_ID_KEY: &str = "shadowdraft_published_id";

/// Meta key on a published item holding the id of its draft copy.
pub const DRAFT_ID_KEY: &str = "shadowdraft_draft_id";

/// Result of planning a metadata merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergePlan {
    /// Keys to replace wholesale on the destination, with the source values.
    pub copy: MetaMap,
    /// Destination-only keys to remove entirely.
    pub remove: BTreeSet<String>,
}

impl MergePlan {
    pub fn is_empty(&self) -> bool {
        self.copy.is_empty() && self.remove.is_empty()
    }
}

/// Plan a merge of `source` metadata onto `destination`.
///
/// `copy` holds every source key that is not excluded; `remove` holds every
/// destination key with no source entry. The two link pointer keys are
/// always excluded from both halves, whatever `exclude` contains: a merge
/// must never rewrite the published/draft cross-references.
///
/// Copied keys are replaced wholesale on the destination rather than
/// appended to. Appending would duplicate values every time a draft is
/// published; removal already drops keys wholesale, so copy matches it.
pub fn plan(source: &MetaMap, destination: &MetaMap, exclude: &BTreeSet<String>) -> MergePlan {
    let excluded =
        |key: &str| key == PUBLISHED_ID_KEY || key == DRAFT_ID_KEY || exclude.contains(key);

    let copy: MetaMap = source
        .iter()
        .filter(|(key, _)| !excluded(key))
        .map(|(key, values)| (key.clone(), values.clone()))
        .collect();

    let remove: BTreeSet<String> = destination
        .keys()
        .filter(|key| !copy.contains_key(*key) && !excluded(key))
        .cloned()
        .collect();

    MergePlan { copy, remove }
}

/// Apply a plan to the destination item through the metadata store.
pub async fn apply(store: &dyn MetadataStore, destination: ItemId, plan: &MergePlan) -> Result<()> {
    for (key, values) in &plan.copy {
        store.replace_meta(destination, key, values).await?;
    }

    for key in &plan.remove {
        store.unset_meta(destination, key).await?;
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn meta(entries: &[(&str, &[&str])]) -> MetaMap {
        entries
            .iter()
            .map(|(key, values)| {
                (
                    key.to_string(),
                    values.iter().map(|v| v.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn copies_adds_and_removes() {
        let source = meta(&[("a", &["1", "2"]), ("b", &["3"])]);
        let destination = meta(&[("a", &["9"]), ("c", &["5"])]);

        let plan = plan(&source, &destination, &BTreeSet::new());

        assert_eq!(plan.copy, source);
        assert_eq!(plan.remove, BTreeSet::from(["c".to_string()]));
    }

    #[test]
    fn pointer_keys_are_never_touched() {
        let source = meta(&[
            (PUBLISHED_ID_KEY, &["4"]),
            (DRAFT_ID_KEY, &["7"]),
            ("a", &["1"]),
        ]);
        let destination = meta(&[(PUBLISHED_ID_KEY, &["9"]), (DRAFT_ID_KEY, &["9"])]);

        let plan = plan(&source, &destination, &BTreeSet::new());

        assert!(!plan.copy.contains_key(PUBLISHED_ID_KEY));
        assert!(!plan.copy.contains_key(DRAFT_ID_KEY));
        assert!(!plan.remove.contains(PUBLISHED_ID_KEY));
        assert!(!plan.remove.contains(DRAFT_ID_KEY));
        assert!(plan.copy.contains_key("a"));
    }

    #[test]
    fn caller_exclusions_protect_both_halves() {
        let source = meta(&[("keep", &["1"]), ("a", &["2"])]);
        let destination = meta(&[("keep", &["old"]), ("stale", &["x"])]);
        let exclude = BTreeSet::from(["keep".to_string()]);

        let plan = plan(&source, &destination, &exclude);

        assert!(!plan.copy.contains_key("keep"));
        assert!(!plan.remove.contains("keep"));
        assert!(plan.remove.contains("stale"));
    }

    #[test]
    fn empty_inputs_produce_empty_plan() {
        let plan = plan(&MetaMap::new(), &MetaMap::new(), &BTreeSet::new());
        assert!(plan.is_empty());
    }
}
