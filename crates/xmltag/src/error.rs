//! Error types for XML decoding.
//!
//! The hierarchy separates problems with the input document, problems with the
//! destination type's declared schema, root/element name assertions, and text
//! that cannot be coerced into a primitive. Every error propagates unchanged to
//! the top-level caller; the decoder never retries or swallows one.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type returned by every decode operation.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The document could not be parsed.
    #[error(transparent)]
    Input(#[from] InputError),

    /// The destination type cannot be decoded as declared.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A composite asserted a root/element name that the node does not carry.
    #[error("expected element type <{expected}> but have <{found}>")]
    NameMismatch { expected: String, found: String },

    /// Text content could not be converted into the target primitive.
    #[error(transparent)]
    Coercion(#[from] CoercionError),
}

/// Errors raised by the external parser, passed through unchanged.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("invalid UTF-8 in document: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Errors in the destination type's schema, found while building its
/// descriptor or before traversal starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A field tag is syntactically invalid.
    #[error("invalid tag {tag:?} on field {type_name}.{field}: {reason}")]
    InvalidTag {
        type_name: &'static str,
        field: &'static str,
        tag: String,
        reason: String,
    },

    /// The field's target category cannot serve the requested mode.
    #[error("field {type_name}.{field} cannot be decoded: {reason}")]
    UnsupportedField {
        type_name: &'static str,
        field: &'static str,
        reason: String,
    },

    /// A descriptor referenced a slot the composite does not expose.
    #[error("{type_name} has no decodable slot {slot}")]
    UnknownSlot { type_name: &'static str, slot: usize },

    /// The top-level node handed to the decoder is not an element.
    #[error("top-level node must be an element")]
    RootNotElement,

    /// Element nesting went past the configured ceiling.
    #[error("element nesting exceeds the maximum depth of {max_depth}")]
    DepthExceeded { max_depth: usize },

    /// A value of this type cannot be assigned from bare text.
    #[error("{type_name} cannot be decoded from text content")]
    TextUnsupported { type_name: &'static str },
}

/// Text that cannot be converted to the target primitive kind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot decode {text:?} as {kind}: {reason}")]
pub struct CoercionError {
    pub kind: &'static str,
    pub text: String,
    pub reason: String,
}

impl CoercionError {
    pub(crate) fn new(kind: &'static str, text: &str, reason: impl ToString) -> Self {
        Self {
            kind,
            text: text.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl DecodeError {
    /// Returns true if this error came from the input document.
    pub fn is_input(&self) -> bool {
        matches!(self, DecodeError::Input(_))
    }

    /// Returns true if this error describes a schema problem.
    pub fn is_schema(&self) -> bool {
        matches!(self, DecodeError::Schema(_))
    }

    /// Returns true if this error is a failed name assertion.
    pub fn is_name_mismatch(&self) -> bool {
        matches!(self, DecodeError::NameMismatch { .. })
    }

    /// Returns true if this error is a failed text coercion.
    pub fn is_coercion(&self) -> bool {
        matches!(self, DecodeError::Coercion(_))
    }
}

impl From<roxmltree::Error> for DecodeError {
    fn from(err: roxmltree::Error) -> Self {
        DecodeError::Input(InputError::Xml(err))
    }
}

/// Result type alias for decode operations.
pub type Result<T> = std::result::Result<T, DecodeError>;
