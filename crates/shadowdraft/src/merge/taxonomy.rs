//! Taxonomy term reconciliation.

use anyhow::Result;
use tracing::debug;

use crate::models::ItemId;
use crate::store::TermStore;

/// Copy term assignments from one item to another.
///
/// Every taxonomy applicable to the source item's type is copied: the
/// destination's assignment under that taxonomy is replaced with the
/// source's slug set, not unioned with it. Taxonomies that do not apply to
/// the source type are left untouched on the destination.
pub async fn copy_terms(
    store: &dyn TermStore,
    source: ItemId,
    source_type: &str,
    destination: ItemId,
) -> Result<()> {
    for taxonomy in store.applicable_taxonomies(source_type).await? {
        let slugs = store.assigned_terms(source, &taxonomy).await?;
        debug!(
            source = %source,
            destination = %destination,
            taxonomy = %taxonomy,
            terms = slugs.len(),
            "copying term assignments"
        );
        store.set_assigned_terms(destination, &taxonomy, &slugs).await?;
    }

    Ok(())
}
