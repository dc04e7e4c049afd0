//! Versioned tag tables mapping fully-qualified GML tags to decoders.

use once_cell::sync::Lazy;
use std::collections::BTreeMap;

use crate::decode::Decoder;
use crate::error::{GmlError, Result};
use crate::namespace::{qualify, unqualify, Namespaces};

pub const GML32_NAMESPACE: &str = "http://www.opengis.net/gml/3.2";
pub const GML33_NAMESPACE: &str = "http://www.opengis.net/gml/3.3";
pub const GML33_RGRID_NAMESPACE: &str = "http://www.opengis.net/gml/3.3/rgrid";

/// Concrete decoders registered by the GML 3.2 profile.
const GML32_DECODERS: &[Decoder] = &[
    Decoder::DomainSet,
    Decoder::Point,
    Decoder::Coordinates,
    Decoder::Grid,
    Decoder::Limits,
    Decoder::RectifiedGrid,
    Decoder::Envelope,
    Decoder::GridEnvelope,
    Decoder::Vector,
    Decoder::PosList,
    Decoder::SequenceRule,
    Decoder::TimePosition,
    Decoder::TimePeriod,
    Decoder::RangeSet,
    Decoder::DataBlock,
    Decoder::TupleList,
];

/// Decoders that gain tags in GML 3.3.
const GML33_DECODERS: &[Decoder] = &[
    Decoder::DomainSet,
    Decoder::Point,
    Decoder::Grid,
    Decoder::RectifiedGrid,
    Decoder::ReferenceableGridByArray,
    Decoder::SequenceRule,
    Decoder::Envelope,
    Decoder::GridEnvelope,
];

pub static GML32: Lazy<Profile> = Lazy::new(|| {
    let namespaces =
        Namespaces::from_pairs(&[("gml", GML32_NAMESPACE), ("gml32", GML32_NAMESPACE)]);
    Profile::from_catalog("GML 3.2", namespaces, GML32_DECODERS)
});

pub static GML33: Lazy<Profile> = Lazy::new(|| {
    let namespaces = Namespaces::from_pairs(&[
        ("gml33", GML33_NAMESPACE),
        ("gml33rgrid", GML33_RGRID_NAMESPACE),
    ]);
    let overrides = catalog_entries(&namespaces, GML33_DECODERS);
    GML32.layered("GML 3.3", &overrides, &namespaces)
});

/// Short tags of `decoders` whose prefix is bound in `namespaces`.
fn catalog_entries(namespaces: &Namespaces, decoders: &[Decoder]) -> Vec<(&'static str, Decoder)> {
    decoders
        .iter()
        .flat_map(|decoder| decoder.tags().iter().map(move |tag| (*tag, *decoder)))
        .filter(|(tag, _)| qualify(tag, namespaces) != *tag)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    name: String,
    namespaces: Namespaces,
    tags: BTreeMap<String, Decoder>,
}

impl Profile {
    /// Builds a profile from explicit `(short tag, decoder)` entries.
    pub fn new(name: &str, namespaces: Namespaces, entries: &[(&str, Decoder)]) -> Self {
        let tags = entries
            .iter()
            .map(|(tag, decoder)| (qualify(tag, &namespaces), *decoder))
            .collect();
        Self {
            name: name.to_string(),
            namespaces,
            tags,
        }
    }

    /// Registers every tag of `decoders` that `namespaces` can qualify.
    pub fn from_catalog(name: &str, namespaces: Namespaces, decoders: &[Decoder]) -> Self {
        let entries = catalog_entries(&namespaces, decoders);
        Self::new(name, namespaces, &entries)
    }

    /// A new profile holding this profile's tags plus `overrides`.
    ///
    /// The namespace table is this profile's table merged with `namespaces`, and the
    /// override tags are qualified against the merged table. `self` is left untouched.
    pub fn layered(
        &self,
        name: &str,
        overrides: &[(&str, Decoder)],
        namespaces: &Namespaces,
    ) -> Profile {
        let namespaces = self.namespaces.merged(namespaces);
        let mut tags = self.tags.clone();
        for (tag, decoder) in overrides {
            tags.insert(qualify(tag, &namespaces), *decoder);
        }
        tracing::debug!(
            "Layered profile {} over {}: {} tags",
            name,
            self.name,
            tags.len()
        );
        Profile {
            name: name.to_string(),
            namespaces,
            tags,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    pub fn expand(&self, tag: &str) -> String {
        qualify(tag, &self.namespaces)
    }

    pub fn contract(&self, tag: &str) -> String {
        unqualify(tag, &self.namespaces)
    }

    pub fn contains(&self, fqn: &str) -> bool {
        self.tags.contains_key(fqn)
    }

    pub fn get(&self, fqn: &str) -> Option<Decoder> {
        self.tags.get(fqn).copied()
    }

    pub fn lookup(&self, fqn: &str) -> Result<Decoder> {
        self.get(fqn)
            .ok_or_else(|| GmlError::UnknownTag(fqn.to_string()))
    }

    /// Registered `(fully-qualified tag, decoder)` pairs in tag order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, Decoder)> {
        self.tags.iter().map(|(tag, decoder)| (tag.as_str(), *decoder))
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// The 3.2 profile on its own.
pub fn gml32_profiles() -> Vec<&'static Profile> {
    vec![&*GML32]
}

/// The 3.3 profile followed by the 3.2 profile it extends.
pub fn gml33_profiles() -> Vec<&'static Profile> {
    vec![&*GML33, &*GML32]
}
