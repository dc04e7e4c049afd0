use thiserror::Error;

pub type Result<T> = std::result::Result<T, GmlError>;

#[derive(Debug, Error)]
pub enum GmlError {
    #[error("Tag {0} is not registered in the profile")]
    UnknownTag(String),

    #[error("Unsupported tag: {0}")]
    UnsupportedTag(String),

    #[error("Unsupported sequence rule: {0}")]
    UnsupportedSequenceRule(String),

    #[error("{0} not implemented yet")]
    NotImplemented(&'static str),

    #[error("Tags {tags} not found")]
    NotFound { tags: String },

    #[error("{parent} is missing required child {child}")]
    MissingRequiredChild { parent: &'static str, child: String },

    #[error("{element} is missing required attribute {attribute}")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("Expected exactly one element under {tag}, found {count}")]
    Ambiguous { tag: String, count: usize },

    #[error("Expected 1 instance of {entity}, got {found}")]
    ExpectedExactlyOne { entity: &'static str, found: usize },

    #[error("Failed to parse {what} from '{value}': {reason}")]
    Parse {
        what: &'static str,
        value: String,
        reason: String,
    },

    #[error("Failed to construct a {entity} instance from {fields}: {reason}")]
    Construction {
        entity: &'static str,
        fields: String,
        reason: String,
    },

    #[error("Unable to determine the grid array shape: {0}")]
    GridShape(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GmlError {
    pub(crate) fn parse(what: &'static str, value: &str, reason: impl ToString) -> Self {
        GmlError::Parse {
            what,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    /// True for errors raised by schema features this crate recognises but does not decode.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            GmlError::UnsupportedTag(_)
                | GmlError::UnsupportedSequenceRule(_)
                | GmlError::NotImplemented(_)
        )
    }
}
