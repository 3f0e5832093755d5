//! Conflict resolution across the members of a multilingual theme family.

use std::collections::HashSet;

use kbforge_core::{FactStore, ThemeFamily};

use crate::context::ExtractionContext;

/// Merges per-language stores given in language order, most dominant first.
///
/// For every `(subject, relation)` pair only the facts of the first store
/// asserting it are kept, so a dominant language overrides the others
/// instead of adding competing values.
pub fn dominant_facts<'a, I>(stores: I) -> FactStore
where
    I: IntoIterator<Item = &'a FactStore>,
{
    let mut merged = FactStore::new();
    for store in stores {
        let mut claimed: HashSet<(&str, &str)> = HashSet::new();
        for fact in store.iter() {
            let key = (fact.subject(), fact.relation());
            if claimed.contains(&key) || merged.object(key.0, key.1).is_none() {
                claimed.insert(key);
                merged.add(fact.clone());
            }
        }
    }
    merged
}

/// Loads every member of `family` the context may read, in language order,
/// and merges them with [`dominant_facts`].
pub fn merge_family(
    context: &ExtractionContext<'_>,
    family: &ThemeFamily,
) -> kbforge_core::Result<FactStore> {
    let stores = context
        .languages()
        .iter()
        .map(|language| context.store(family.in_language(language).name()))
        .collect::<kbforge_core::Result<Vec<_>>>()?;
    Ok(dominant_facts(stores.iter().map(AsRef::as_ref)))
}
