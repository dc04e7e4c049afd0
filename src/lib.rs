pub mod decode;
pub mod error;
pub mod gml32;
pub mod gml33;
pub mod namespace;
pub mod profile;
pub mod registry;
pub mod xml;

pub use decode::{decode, resolve_polymorphic, Attributes, Decode, Decoder, Gml};
pub use error::{GmlError, Result};
pub use profile::{gml32_profiles, gml33_profiles, Profile, GML32, GML33};
pub use registry::TagRegistry;
pub use xml::Element;
