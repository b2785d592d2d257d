//! Conversion between saved relation pairs and the keyed form representation.
//!
//! The business API stores each mapping as a list of `{ local, procare }`
//! pairs, while the form edits it as a map keyed by the local identifier.

use crate::models::{KeyedMapping, OptionItem, RelationEntry};

/// Gender option texts the local system uses, and the Procare value each maps to.
/// Only these three are recognized; any other option maps to nothing.
const GENDER_LOOKUP: [(&str, &str); 3] = [
    ("Boy", "Male"),
    ("Girl", "Female"),
    ("Not specified", "Unknown"),
];

/// Fold saved pairs into a keyed mapping. Later pairs win on duplicate keys.
pub fn to_keyed_mapping(entries: Option<&[RelationEntry]>) -> KeyedMapping {
    let Some(entries) = entries else {
        return KeyedMapping::new();
    };
    entries.iter().fold(KeyedMapping::new(), |mut acc, entry| {
        acc.insert(entry.local.clone(), Some(entry.procare.clone()));
        acc
    })
}

/// Flatten a keyed mapping back into pairs for submission.
///
/// A pair is kept whenever it has a Procare value, even if the local side is
/// empty. Pairs without a Procare value are dropped.
pub fn to_entry_sequence(mapping: &KeyedMapping) -> Vec<RelationEntry> {
    mapping
        .iter()
        .filter_map(|(local, procare)| match procare.as_deref() {
            Some(p) if !p.is_empty() => Some(RelationEntry::new(local.as_str(), p)),
            _ => None,
        })
        .collect()
}

/// Build the gender mapping from the local gender options by display text.
pub fn map_genders(options: &[OptionItem]) -> KeyedMapping {
    options
        .iter()
        .map(|item| {
            let procare = GENDER_LOOKUP
                .iter()
                .find(|(text, _)| *text == item.text)
                .map(|(_, procare)| procare.to_string());
            (item.id.clone(), procare)
        })
        .collect()
}
