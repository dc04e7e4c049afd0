//! Index of the tags each type, and its direct subtypes, can be found under.

use once_cell::sync::Lazy;
use std::collections::{BTreeMap, BTreeSet};

use crate::decode::Decoder;

static CATALOG: Lazy<TagRegistry> = Lazy::new(|| {
    TagRegistry::build(Decoder::ALL.iter().map(|decoder| {
        (
            decoder.name(),
            decoder.parent().map(Decoder::name),
            decoder.tags().to_vec(),
        )
    }))
});

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagRegistry {
    tags: BTreeMap<String, BTreeSet<String>>,
}

impl TagRegistry {
    /// Builds the index from `(type, parent, own tags)` entries.
    ///
    /// A type's set holds its own tags plus the own tags of every direct subtype that
    /// declares some. Tags do not travel further than one level, and a type with no tags
    /// of its own keeps an empty set.
    pub fn build<'a, I, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Option<&'a str>, T)>,
        T: IntoIterator<Item = &'a str>,
    {
        let mut tags: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut declared: Vec<(String, Option<String>, BTreeSet<String>)> = Vec::new();

        for (name, parent, own) in entries {
            let own: BTreeSet<String> = own.into_iter().map(str::to_string).collect();
            tags.insert(name.to_string(), own.clone());
            declared.push((name.to_string(), parent.map(str::to_string), own));
        }

        for (_, parent, own) in &declared {
            if own.is_empty() {
                continue;
            }
            let Some(parent) = parent else { continue };
            if let Some(parent_tags) = tags.get_mut(parent) {
                if !parent_tags.is_empty() {
                    parent_tags.extend(own.iter().cloned());
                }
            }
        }

        Self { tags }
    }

    /// The registry over this crate's decoder catalog.
    pub fn catalog() -> &'static TagRegistry {
        &CATALOG
    }

    pub fn subclass_tags(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.tags.get(name)
    }

    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(String::as_str)
    }
}
