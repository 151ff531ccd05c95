//! Collapse repeated observations to the newest version of each record.

use indexmap::map::Entry;
use indexmap::IndexMap;

use crate::repository::RecordEntry;

/// Keep exactly one entry per id: the one with the greatest version.
///
/// Ids appear in first-seen order. When two entries share the greatest
/// version, the one seen first wins.
pub fn latest_by_id<T, I>(entries: I) -> IndexMap<String, RecordEntry<T>>
where
    I: IntoIterator<Item = RecordEntry<T>>,
{
    let mut latest: IndexMap<String, RecordEntry<T>> = IndexMap::new();

    for entry in entries {
        match latest.entry(entry.id.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(entry);
            }
            Entry::Occupied(mut slot) => {
                if entry.version > slot.get().version {
                    slot.insert(entry);
                }
            }
        }
    }

    latest
}

/// [`latest_by_id`] flattened back into a list.
pub fn latest<T, I>(entries: I) -> Vec<RecordEntry<T>>
where
    I: IntoIterator<Item = RecordEntry<T>>,
{
    latest_by_id(entries).into_values().collect()
}
