//! Profile-driven dispatch from XML elements to typed GML entities.
//!
//! Every GML concept the crate understands is a [`Decoder`] variant. A decoder knows the
//! short tags it may appear under, the attributes it reads and its place in the GML type
//! hierarchy. Profiles map fully-qualified tags back to decoders, which is how polymorphic
//! slots such as the child of `gml:domainSet` are resolved.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{GmlError, Result};
use crate::gml32::{
    self, Coordinates, DataBlock, Envelope, Grid, GridEnvelope, Point, PosList, RangeSet,
    RectifiedGrid, SequenceRule, TimePeriod, TimePosition, TupleList, Vector,
};
use crate::gml33::ReferenceableGridByArray;
use crate::profile::Profile;
use crate::registry::TagRegistry;
use crate::xml::Element;

/// Attributes read off an element, keyed by their short name (e.g. `gml:id`).
pub type Attributes = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Decoder {
    AbstractGml,
    AbstractGeometry,
    DomainSet,
    Point,
    Coordinates,
    Grid,
    Limits,
    RectifiedGrid,
    AbstractReferenceableGrid,
    ReferenceableGridByArray,
    Envelope,
    GridEnvelope,
    Vector,
    PosList,
    SequenceRule,
    TimePosition,
    TimePeriod,
    RangeSet,
    DataBlock,
    TupleList,
}

impl Decoder {
    pub const ALL: [Decoder; 20] = [
        Decoder::AbstractGml,
        Decoder::AbstractGeometry,
        Decoder::DomainSet,
        Decoder::Point,
        Decoder::Coordinates,
        Decoder::Grid,
        Decoder::Limits,
        Decoder::RectifiedGrid,
        Decoder::AbstractReferenceableGrid,
        Decoder::ReferenceableGridByArray,
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

    pub fn name(self) -> &'static str {
        match self {
            Decoder::AbstractGml => "AbstractGML",
            Decoder::AbstractGeometry => "AbstractGeometry",
            Decoder::DomainSet => "domainSet",
            Decoder::Point => "Point",
            Decoder::Coordinates => "coordinates",
            Decoder::Grid => "Grid",
            Decoder::Limits => "limits",
            Decoder::RectifiedGrid => "RectifiedGrid",
            Decoder::AbstractReferenceableGrid => "AbstractReferenceableGrid",
            Decoder::ReferenceableGridByArray => "ReferenceableGridByArray",
            Decoder::Envelope => "Envelope",
            Decoder::GridEnvelope => "GridEnvelope",
            Decoder::Vector => "Vector",
            Decoder::PosList => "posList",
            Decoder::SequenceRule => "sequenceRule",
            Decoder::TimePosition => "timePosition",
            Decoder::TimePeriod => "TimePeriod",
            Decoder::RangeSet => "rangeSet",
            Decoder::DataBlock => "DataBlock",
            Decoder::TupleList => "tupleList",
        }
    }

    /// The short tags instances of this type can be found under, 3.2 first.
    pub fn tags(self) -> &'static [&'static str] {
        match self {
            Decoder::AbstractGml
            | Decoder::AbstractGeometry
            | Decoder::AbstractReferenceableGrid => &[],
            Decoder::DomainSet => &["gml32:domainSet", "gml33:domainSet"],
            Decoder::Point => &["gml32:Point", "gml33:Point"],
            Decoder::Coordinates => &["gml32:coordinates"],
            Decoder::Grid => &["gml32:Grid", "gml33:Grid"],
            Decoder::Limits => &["gml32:limits"],
            Decoder::RectifiedGrid => &["gml32:RectifiedGrid", "gml33:RectifiedGrid"],
            Decoder::ReferenceableGridByArray => &[
                "gml33:ReferenceableGridByArray",
                "gml33rgrid:ReferenceableGridByArray",
            ],
            Decoder::Envelope => &["gml32:Envelope", "gml33:Envelope"],
            Decoder::GridEnvelope => &["gml32:GridEnvelope", "gml33:GridEnvelope"],
            Decoder::Vector => &["gml32:offsetVector", "gml32:vector"],
            Decoder::PosList => &["gml32:posList"],
            Decoder::SequenceRule => &["gml32:sequenceRule", "gml33rgrid:sequenceRule"],
            Decoder::TimePosition => &["gml32:timePosition"],
            Decoder::TimePeriod => &["gml32:TimePeriod"],
            Decoder::RangeSet => &["gml32:rangeSet"],
            Decoder::DataBlock => &["gml32:DataBlock"],
            Decoder::TupleList => &["gml32:tupleList", "gml:tupleList"],
        }
    }

    pub fn parent(self) -> Option<Decoder> {
        match self {
            Decoder::AbstractGml => None,
            Decoder::Point | Decoder::Grid => Some(Decoder::AbstractGeometry),
            Decoder::RectifiedGrid | Decoder::AbstractReferenceableGrid => Some(Decoder::Grid),
            Decoder::ReferenceableGridByArray => Some(Decoder::AbstractReferenceableGrid),
            _ => Some(Decoder::AbstractGml),
        }
    }

    pub fn is_abstract(self) -> bool {
        self.tags().is_empty()
    }

    fn own_attribute_names(self) -> &'static [&'static str] {
        match self {
            Decoder::AbstractGml => &["gml:id"],
            Decoder::Envelope => &["srsName", "srsDimension", "axisLabels", "uomLabels"],
            _ => &[],
        }
    }

    /// Attribute names read by this type, inherited names first.
    pub fn attribute_names(self) -> Vec<&'static str> {
        let mut chain = vec![self];
        while let Some(parent) = chain[chain.len() - 1].parent() {
            chain.push(parent);
        }
        chain
            .into_iter()
            .rev()
            .flat_map(|decoder| decoder.own_attribute_names().iter().copied())
            .collect()
    }

    /// Tags of this type and of its direct tag-declaring subtypes.
    pub fn subclass_tags(self) -> BTreeSet<String> {
        TagRegistry::catalog()
            .subclass_tags(self.name())
            .cloned()
            .unwrap_or_default()
    }

    /// Reads this type's attributes, taking the first profile whose qualification matches.
    pub fn decode_attrs(self, element: &Element, profiles: &[&Profile]) -> Attributes {
        let mut attrs = Attributes::new();
        for name in self.attribute_names() {
            let value = profiles
                .iter()
                .find_map(|profile| element.get(&profile.expand(name)));
            if let Some(value) = value {
                attrs.insert(name.to_string(), value.to_string());
            }
        }
        attrs
    }

    /// The single child of `parent` found under any of this type's tags.
    ///
    /// Tags are qualified with every profile's namespace table; the profile does not need
    /// to register the tag itself. One match under each of two tags is ambiguous too.
    pub fn find_one<'a>(self, parent: &'a Element, profiles: &[&Profile]) -> Result<&'a Element> {
        let mut checked: Vec<String> = Vec::new();
        let mut found: Vec<&'a Element> = Vec::new();
        for tag in self.tags() {
            for profile in profiles {
                let fqn = profile.expand(tag);
                if checked.contains(&fqn) {
                    continue;
                }
                let matches = parent.find_all(&fqn);
                if matches.len() > 1 {
                    return Err(GmlError::Ambiguous {
                        tag: fqn,
                        count: matches.len(),
                    });
                }
                found.extend(matches);
                checked.push(fqn);
            }
        }

        match found.as_slice() {
            [] => Err(GmlError::NotFound {
                tags: self.tags().join(", "),
            }),
            [one] => Ok(*one),
            many => Err(GmlError::Ambiguous {
                tag: self.tags().join(", "),
                count: many.len(),
            }),
        }
    }

    /// All children of `parent` under this type's tags, in tag declaration order.
    pub fn find_many<'a>(self, parent: &'a Element, profiles: &[&Profile]) -> Vec<&'a Element> {
        self.find_many_resolved(parent, profiles)
            .into_iter()
            .map(|(element, _)| element)
            .collect()
    }

    /// Like [`Decoder::find_many`], paired with the decoder the matching profile registers.
    fn find_many_resolved<'a>(
        self,
        parent: &'a Element,
        profiles: &[&Profile],
    ) -> Vec<(&'a Element, Decoder)> {
        let mut checked: Vec<String> = Vec::new();
        let mut found = Vec::new();
        for tag in self.tags() {
            for profile in profiles {
                let fqn = profile.expand(tag);
                let Some(decoder) = profile.get(&fqn) else {
                    continue;
                };
                if checked.contains(&fqn) {
                    continue;
                }
                let matches = parent.find_all(&fqn);
                checked.push(fqn);
                if !matches.is_empty() {
                    found.extend(matches.into_iter().map(|element| (element, decoder)));
                    break;
                }
            }
        }
        found
    }

    /// Decodes the only child found by [`Decoder::find_many`].
    pub fn decode_one_of_many(self, parent: &Element, profiles: &[&Profile]) -> Result<Gml> {
        let found = self.find_many_resolved(parent, profiles);
        match found.as_slice() {
            [(element, decoder)] => decoder.decode(element, profiles),
            _ => Err(GmlError::ExpectedExactlyOne {
                entity: self.name(),
                found: found.len(),
            }),
        }
    }

    pub fn decode(self, element: &Element, profiles: &[&Profile]) -> Result<Gml> {
        tracing::trace!("Decoding <{}> as {}", element.tag(), self.name());
        match self {
            Decoder::AbstractGml
            | Decoder::AbstractGeometry
            | Decoder::AbstractReferenceableGrid => Err(GmlError::UnsupportedTag(format!(
                "{} is abstract and cannot decode <{}>",
                self.name(),
                element.tag()
            ))),
            Decoder::DomainSet => gml32::decode_domain_set(element, profiles),
            Decoder::Limits => gml32::decode_limits(element, profiles),
            Decoder::Point => Point::decode(element, profiles).map(Gml::Point),
            Decoder::Coordinates => Coordinates::decode(element, profiles).map(Gml::Coordinates),
            Decoder::Grid => Grid::decode(element, profiles).map(Gml::Grid),
            Decoder::RectifiedGrid => {
                RectifiedGrid::decode(element, profiles).map(Gml::RectifiedGrid)
            }
            Decoder::ReferenceableGridByArray => ReferenceableGridByArray::decode(element, profiles)
                .map(Gml::ReferenceableGridByArray),
            Decoder::Envelope => Envelope::decode(element, profiles).map(Gml::Envelope),
            Decoder::GridEnvelope => GridEnvelope::decode(element, profiles).map(Gml::GridEnvelope),
            Decoder::Vector => Vector::decode(element, profiles).map(Gml::Vector),
            Decoder::PosList => PosList::decode(element, profiles).map(Gml::PosList),
            Decoder::SequenceRule => SequenceRule::decode(element, profiles).map(Gml::SequenceRule),
            Decoder::TimePosition => TimePosition::decode(element, profiles).map(Gml::TimePosition),
            Decoder::TimePeriod => TimePeriod::decode(element, profiles).map(Gml::TimePeriod),
            Decoder::RangeSet => RangeSet::decode(element, profiles).map(Gml::RangeSet),
            Decoder::DataBlock => DataBlock::decode(element, profiles).map(Gml::DataBlock),
            Decoder::TupleList => TupleList::decode(element, profiles).map(Gml::TupleList),
        }
    }
}

/// A decoded GML entity of any supported type.
#[derive(Debug, Clone, PartialEq)]
pub enum Gml {
    Point(Point),
    Coordinates(Coordinates),
    Grid(Grid),
    RectifiedGrid(RectifiedGrid),
    ReferenceableGridByArray(ReferenceableGridByArray),
    Envelope(Envelope),
    GridEnvelope(GridEnvelope),
    Vector(Vector),
    PosList(PosList),
    SequenceRule(SequenceRule),
    TimePosition(TimePosition),
    TimePeriod(TimePeriod),
    RangeSet(RangeSet),
    DataBlock(DataBlock),
    TupleList(TupleList),
}

impl Gml {
    pub fn decoder(&self) -> Decoder {
        match self {
            Gml::Point(_) => Decoder::Point,
            Gml::Coordinates(_) => Decoder::Coordinates,
            Gml::Grid(_) => Decoder::Grid,
            Gml::RectifiedGrid(_) => Decoder::RectifiedGrid,
            Gml::ReferenceableGridByArray(_) => Decoder::ReferenceableGridByArray,
            Gml::Envelope(_) => Decoder::Envelope,
            Gml::GridEnvelope(_) => Decoder::GridEnvelope,
            Gml::Vector(_) => Decoder::Vector,
            Gml::PosList(_) => Decoder::PosList,
            Gml::SequenceRule(_) => Decoder::SequenceRule,
            Gml::TimePosition(_) => Decoder::TimePosition,
            Gml::TimePeriod(_) => Decoder::TimePeriod,
            Gml::RangeSet(_) => Decoder::RangeSet,
            Gml::DataBlock(_) => Decoder::DataBlock,
            Gml::TupleList(_) => Decoder::TupleList,
        }
    }

    pub fn attrs(&self) -> &Attributes {
        match self {
            Gml::Point(v) => &v.attrs,
            Gml::Coordinates(v) => &v.attrs,
            Gml::Grid(v) => &v.attrs,
            Gml::RectifiedGrid(v) => &v.grid.attrs,
            Gml::ReferenceableGridByArray(v) => &v.grid.attrs,
            Gml::Envelope(v) => &v.attrs,
            Gml::GridEnvelope(v) => &v.attrs,
            Gml::Vector(v) => &v.attrs,
            Gml::PosList(v) => &v.attrs,
            Gml::SequenceRule(v) => &v.attrs,
            Gml::TimePosition(v) => &v.attrs,
            Gml::TimePeriod(v) => &v.attrs,
            Gml::RangeSet(v) => &v.attrs,
            Gml::DataBlock(v) => &v.attrs,
            Gml::TupleList(v) => &v.attrs,
        }
    }

    /// True for entities that may fill a geometry slot (domainSet, origin).
    pub fn is_geometry(&self) -> bool {
        let mut decoder = Some(self.decoder());
        while let Some(current) = decoder {
            if current == Decoder::AbstractGeometry {
                return true;
            }
            decoder = current.parent();
        }
        false
    }
}

/// A GML entity that can be decoded from an element.
pub trait Decode: Sized {
    const DECODER: Decoder;

    fn decode(element: &Element, profiles: &[&Profile]) -> Result<Self>;

    fn find_one<'a>(parent: &'a Element, profiles: &[&Profile]) -> Result<&'a Element> {
        Self::DECODER.find_one(parent, profiles)
    }

    /// Finds the single child of `parent` for this type and decodes it.
    fn decode_one(parent: &Element, profiles: &[&Profile]) -> Result<Self> {
        let element = Self::find_one(parent, profiles)?;
        Self::decode(element, profiles)
    }

    fn decode_one_of_many(parent: &Element, profiles: &[&Profile]) -> Result<Self> {
        let found = Self::DECODER.find_many(parent, profiles);
        match found.as_slice() {
            [element] => Self::decode(element, profiles),
            _ => Err(GmlError::ExpectedExactlyOne {
                entity: Self::DECODER.name(),
                found: found.len(),
            }),
        }
    }
}

/// Decodes `element` with the decoder the first matching profile registers for its tag.
pub fn resolve_polymorphic(element: &Element, profiles: &[&Profile]) -> Result<Gml> {
    for profile in profiles {
        if let Some(decoder) = profile.get(element.tag()) {
            tracing::debug!(
                "Resolved <{}> to {} via {}",
                element.tag(),
                decoder.name(),
                profile.name()
            );
            return decoder.decode(element, profiles);
        }
    }
    Err(GmlError::UnsupportedTag(element.tag().to_string()))
}

/// Decodes any element a profile recognises.
pub fn decode(element: &Element, profiles: &[&Profile]) -> Result<Gml> {
    resolve_polymorphic(element, profiles)
}

/// First child of `parent` tagged `tag` under any profile's namespaces.
pub(crate) fn find_property<'a>(
    parent: &'a Element,
    tag: &str,
    profiles: &[&Profile],
) -> Option<&'a Element> {
    profiles
        .iter()
        .find_map(|profile| parent.find(&profile.expand(tag)))
}

/// All children tagged `tag`, from the first profile that finds any.
pub(crate) fn find_properties<'a>(
    parent: &'a Element,
    tag: &str,
    profiles: &[&Profile],
) -> Vec<&'a Element> {
    profiles
        .iter()
        .map(|profile| parent.find_all(&profile.expand(tag)))
        .find(|found| !found.is_empty())
        .unwrap_or_default()
}

/// The required child `tag` of an element decoded as `parent`.
pub(crate) fn require_property<'a>(
    parent: &'a Element,
    tag: &str,
    owner: Decoder,
    profiles: &[&Profile],
) -> Result<&'a Element> {
    find_property(parent, tag, profiles).ok_or_else(|| GmlError::MissingRequiredChild {
        parent: owner.name(),
        child: tag.to_string(),
    })
}

/// Resolves the only element child of a wrapper such as `gml:limits` or `gml:origin`.
pub(crate) fn decode_single_child(
    wrapper: &Element,
    owner: Decoder,
    profiles: &[&Profile],
) -> Result<Gml> {
    match wrapper.children() {
        [child] => resolve_polymorphic(child, profiles),
        children => Err(GmlError::ExpectedExactlyOne {
            entity: owner.name(),
            found: children.len(),
        }),
    }
}
