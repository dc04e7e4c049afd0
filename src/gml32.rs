//! A subset of GML 3.2 (OGC 07-036).

use chrono::NaiveDateTime;

use crate::decode::{
    decode_single_child, find_properties, find_property, require_property, Attributes, Decode,
    Decoder, Gml,
};
use crate::error::{GmlError, Result};
use crate::profile::Profile;
use crate::xml::Element;

/// Format of `gml:timePosition`, `gml:beginPosition` and `gml:endPosition` values.
pub const GML_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

fn text_of(element: &Element) -> &str {
    element.text().unwrap_or("")
}

pub(crate) fn parse_floats(text: &str) -> Result<Vec<f64>> {
    text.split_whitespace()
        .map(|value| {
            value
                .parse::<f64>()
                .map_err(|e| GmlError::parse("float", value, e))
        })
        .collect()
}

fn parse_integers(text: &str) -> Result<Vec<i64>> {
    text.split_whitespace()
        .map(|value| {
            value
                .parse::<i64>()
                .map_err(|e| GmlError::parse("integer", value, e))
        })
        .collect()
}

pub fn parse_time(text: &str) -> Result<NaiveDateTime> {
    let text = text.trim();
    NaiveDateTime::parse_from_str(text, GML_TIME_FORMAT)
        .map_err(|e| GmlError::parse("time position", text, e))
}

// 19.3.4 domainSet, DomainSetType
pub(crate) fn decode_domain_set(element: &Element, profiles: &[&Profile]) -> Result<Gml> {
    let geometry = decode_single_child(element, Decoder::DomainSet, profiles)?;
    if !geometry.is_geometry() {
        return Err(GmlError::Construction {
            entity: Decoder::DomainSet.name(),
            fields: format!("{geometry:?}"),
            reason: "domainSet must contain a geometry".to_string(),
        });
    }
    Ok(geometry)
}

pub(crate) fn decode_limits(element: &Element, profiles: &[&Profile]) -> Result<Gml> {
    decode_single_child(element, Decoder::Limits, profiles)
}

// 10.3.1 PointType, Point
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub attrs: Attributes,
    pub coords: Vec<f64>,
}

impl Decode for Point {
    const DECODER: Decoder = Decoder::Point;

    fn decode(element: &Element, profiles: &[&Profile]) -> Result<Self> {
        let attrs = Self::DECODER.decode_attrs(element, profiles);
        let has_pos = find_property(element, "gml32:pos", profiles).is_some();

        let coords = match Coordinates::decode_one(element, profiles) {
            Ok(coordinates) => coordinates.values,
            Err(GmlError::NotFound { .. }) if has_pos => {
                return Err(GmlError::NotImplemented("gml32:pos"))
            }
            Err(e) => return Err(e),
        };
        if coords.is_empty() && has_pos {
            return Err(GmlError::NotImplemented("gml32:pos"));
        }

        Ok(Self { attrs, coords })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Coordinates {
    pub attrs: Attributes,
    pub values: Vec<f64>,
}

impl Decode for Coordinates {
    const DECODER: Decoder = Decoder::Coordinates;

    fn decode(element: &Element, profiles: &[&Profile]) -> Result<Self> {
        Ok(Self {
            attrs: Self::DECODER.decode_attrs(element, profiles),
            values: parse_floats(text_of(element))?,
        })
    }
}

// 19.2.2 Grid
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub attrs: Attributes,
    pub limits: GridEnvelope,
    pub axes: Vec<String>,
    pub dims: usize,
}

impl Decode for Grid {
    const DECODER: Decoder = Decoder::Grid;

    fn decode(element: &Element, profiles: &[&Profile]) -> Result<Self> {
        Self::decode_as(Self::DECODER, element, profiles)
    }
}

impl Grid {
    /// Decodes the grid fields shared by every grid subtype.
    pub(crate) fn decode_as(
        decoder: Decoder,
        element: &Element,
        profiles: &[&Profile],
    ) -> Result<Self> {
        let attrs = decoder.decode_attrs(element, profiles);

        let limits = match Decoder::Limits.find_one(element, profiles) {
            Ok(limits) => decode_limits(limits, profiles)?,
            Err(GmlError::NotFound { .. }) => {
                return Err(GmlError::MissingRequiredChild {
                    parent: decoder.name(),
                    child: "gml32:limits".to_string(),
                })
            }
            Err(e) => return Err(e),
        };
        let limits = match limits {
            Gml::GridEnvelope(envelope) => envelope,
            other => {
                return Err(GmlError::Construction {
                    entity: decoder.name(),
                    fields: format!("limits: {other:?}"),
                    reason: "limits must hold a GridEnvelope".to_string(),
                })
            }
        };

        let mut axes: Vec<String> = find_properties(element, "gml32:axisName", profiles)
            .into_iter()
            .map(|axis| text_of(axis).trim().to_string())
            .collect();
        if axes.is_empty() {
            if let Some(labels) = find_property(element, "gml32:axisLabels", profiles) {
                axes = text_of(labels)
                    .split_whitespace()
                    .map(str::to_string)
                    .collect();
            }
        }

        let dimension = element.get("dimension").unwrap_or("");
        let dims = dimension
            .trim()
            .parse::<usize>()
            .map_err(|e| GmlError::parse("grid dimension", dimension, e))?;

        Ok(Self {
            attrs,
            limits,
            axes,
            dims,
        })
    }
}

// 19.2.3 RectifiedGrid
#[derive(Debug, Clone, PartialEq)]
pub struct RectifiedGrid {
    pub grid: Grid,
    pub origin: Box<Gml>,
    pub offset_vectors: Vec<Vector>,
}

impl Decode for RectifiedGrid {
    const DECODER: Decoder = Decoder::RectifiedGrid;

    fn decode(element: &Element, profiles: &[&Profile]) -> Result<Self> {
        let grid = Grid::decode_as(Self::DECODER, element, profiles)?;

        let origin_element = require_property(element, "gml32:origin", Self::DECODER, profiles)?;
        let origin = decode_single_child(origin_element, Self::DECODER, profiles)?;
        if !origin.is_geometry() {
            return Err(GmlError::Construction {
                entity: Self::DECODER.name(),
                fields: format!("origin: {origin:?}"),
                reason: "origin must be a geometry".to_string(),
            });
        }

        let offset_vectors = find_properties(element, "gml32:offsetVector", profiles)
            .into_iter()
            .map(|vector| Vector::decode(vector, profiles))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            grid,
            origin: Box::new(origin),
            offset_vectors,
        })
    }
}

// 10.1.4.6 EnvelopeType, Envelope
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub attrs: Attributes,
    pub lows: Vec<f64>,
    pub highs: Vec<f64>,
}

impl Decode for Envelope {
    const DECODER: Decoder = Decoder::Envelope;

    fn decode(element: &Element, profiles: &[&Profile]) -> Result<Self> {
        let attrs = Self::DECODER.decode_attrs(element, profiles);
        let lower = require_property(element, "gml32:lowerCorner", Self::DECODER, profiles)?;
        let upper = require_property(element, "gml32:upperCorner", Self::DECODER, profiles)?;

        // Corner lengths are deliberately not compared here.
        Ok(Self {
            attrs,
            lows: parse_floats(text_of(lower))?,
            highs: parse_floats(text_of(upper))?,
        })
    }
}

impl Envelope {
    /// Whether both corners carry the same number of ordinates.
    pub fn is_consistent(&self) -> bool {
        self.lows.len() == self.highs.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridEnvelope {
    pub attrs: Attributes,
    pub lows: Vec<i64>,
    pub highs: Vec<i64>,
}

impl Decode for GridEnvelope {
    const DECODER: Decoder = Decoder::GridEnvelope;

    fn decode(element: &Element, profiles: &[&Profile]) -> Result<Self> {
        let attrs = Self::DECODER.decode_attrs(element, profiles);
        let low = require_property(element, "gml32:low", Self::DECODER, profiles)?;
        let high = require_property(element, "gml32:high", Self::DECODER, profiles)?;

        // Not always two dimensional.
        Ok(Self {
            attrs,
            lows: parse_integers(text_of(low))?,
            highs: parse_integers(text_of(high))?,
        })
    }
}

// 10.1.4.5 VectorType, Vector
#[derive(Debug, Clone, PartialEq)]
pub struct Vector {
    pub attrs: Attributes,
    pub components: Vec<f64>,
}

impl Decode for Vector {
    const DECODER: Decoder = Decoder::Vector;

    fn decode(element: &Element, profiles: &[&Profile]) -> Result<Self> {
        Ok(Self {
            attrs: Self::DECODER.decode_attrs(element, profiles),
            components: parse_floats(text_of(element))?,
        })
    }
}

// 10.1.4.2 DirectPositionListType, posList
#[derive(Debug, Clone, PartialEq)]
pub struct PosList {
    pub attrs: Attributes,
    pub values: Vec<f64>,
}

impl Decode for PosList {
    const DECODER: Decoder = Decoder::PosList;

    fn decode(element: &Element, profiles: &[&Profile]) -> Result<Self> {
        Ok(Self {
            attrs: Self::DECODER.decode_attrs(element, profiles),
            values: parse_floats(text_of(element))?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SequenceRule {
    pub attrs: Attributes,
    pub axis_order: String,
    pub rule: String,
}

impl Decode for SequenceRule {
    const DECODER: Decoder = Decoder::SequenceRule;

    fn decode(element: &Element, profiles: &[&Profile]) -> Result<Self> {
        let axis_order = element
            .get("axisOrder")
            .ok_or(GmlError::MissingAttribute {
                element: Self::DECODER.name(),
                attribute: "axisOrder",
            })?;
        Ok(Self {
            attrs: Self::DECODER.decode_attrs(element, profiles),
            axis_order: axis_order.to_string(),
            rule: text_of(element).trim().to_string(),
        })
    }
}

// 14.2.2.7 TimePositionType, timePosition
#[derive(Debug, Clone, PartialEq)]
pub struct TimePosition {
    pub attrs: Attributes,
    pub datetime: NaiveDateTime,
}

impl Decode for TimePosition {
    const DECODER: Decoder = Decoder::TimePosition;

    fn decode(element: &Element, profiles: &[&Profile]) -> Result<Self> {
        Ok(Self {
            attrs: Self::DECODER.decode_attrs(element, profiles),
            datetime: parse_time(text_of(element))?,
        })
    }
}

// 14.2.2.5 TimePeriod
#[derive(Debug, Clone, PartialEq)]
pub struct TimePeriod {
    pub attrs: Attributes,
    pub begin: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Decode for TimePeriod {
    const DECODER: Decoder = Decoder::TimePeriod;

    fn decode(element: &Element, profiles: &[&Profile]) -> Result<Self> {
        let attrs = Self::DECODER.decode_attrs(element, profiles);
        // gml:begin / gml:end instants are not supported.
        let begin = require_property(element, "gml32:beginPosition", Self::DECODER, profiles)?;
        let end = require_property(element, "gml32:endPosition", Self::DECODER, profiles)?;

        Ok(Self {
            attrs,
            begin: parse_time(text_of(begin))?,
            end: parse_time(text_of(end))?,
        })
    }
}

// 19.3.5 rangeSet, RangeSetType
#[derive(Debug, Clone, PartialEq)]
pub struct RangeSet {
    pub attrs: Attributes,
    pub data: DataBlock,
}

impl Decode for RangeSet {
    const DECODER: Decoder = Decoder::RangeSet;

    fn decode(element: &Element, profiles: &[&Profile]) -> Result<Self> {
        let attrs = Self::DECODER.decode_attrs(element, profiles);
        let block = DataBlock::find_one(element, profiles)?;

        if find_property(element, "gml32:rangeParameters", profiles).is_some()
            || find_property(block, "gml32:rangeParameters", profiles).is_some()
        {
            return Err(GmlError::NotImplemented("gml32:rangeParameters in gml32:rangeSet"));
        }

        Ok(Self {
            attrs,
            data: DataBlock::decode(block, profiles)?,
        })
    }
}

// 19.3.6 DataBlock
#[derive(Debug, Clone, PartialEq)]
pub struct DataBlock {
    pub attrs: Attributes,
    pub values: TupleList,
}

impl Decode for DataBlock {
    const DECODER: Decoder = Decoder::DataBlock;

    fn decode(element: &Element, profiles: &[&Profile]) -> Result<Self> {
        Ok(Self {
            attrs: Self::DECODER.decode_attrs(element, profiles),
            values: TupleList::decode_one_of_many(element, profiles)?,
        })
    }
}

/// Comma separated tuples of whitespace separated tokens, left as strings.
#[derive(Debug, Clone, PartialEq)]
pub struct TupleList {
    pub attrs: Attributes,
    pub tuples: Vec<Vec<String>>,
}

impl Decode for TupleList {
    const DECODER: Decoder = Decoder::TupleList;

    fn decode(element: &Element, profiles: &[&Profile]) -> Result<Self> {
        let tuples = text_of(element)
            .split(',')
            .map(|tuple| tuple.split_whitespace().map(str::to_string).collect())
            .collect();
        Ok(Self {
            attrs: Self::DECODER.decode_attrs(element, profiles),
            tuples,
        })
    }
}
