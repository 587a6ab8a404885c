//! # xmltag
//!
//! Declarative decoding of XML documents into strongly-typed Rust values.
//!
//! A destination struct describes, field by field, where in the document each
//! value lives. The tag attached to a field can name a child element, a path of
//! nested elements, an attribute, the element's own name, or its text.
//!
//! ## Features
//!
//! - **Path tags**: `"Offers>Offer>Price"` reaches through intermediate
//!   elements without declaring a struct for each level.
//! - **Accumulation**: `Vec<T>` fields collect every matching element, in
//!   document order.
//! - **Attribute and name capture**: `"id,attr"` and `"Feed,name"`, the latter
//!   also asserting the element's local name.
//! - **Shared metadata**: each struct's tags are parsed once into an immutable
//!   descriptor and reused by every later decode, from any thread.
//!
//! ## Type mapping
//!
//! | Rust type | Decoded from |
//! |-----------|--------------|
//! | `String` | text content, verbatim |
//! | `i8`..`i64`, `u8`..`u64` | base-10 text, range checked |
//! | `f32`, `f64` | decimal text |
//! | `bool` | `1 t T TRUE true True` / `0 f F FALSE false False` |
//! | `chrono::DateTime` | RFC 3339 text |
//! | `Vec<u8>` | raw bytes of the text |
//! | `Vec<T>` | one element appended per match |
//! | `Option<T>`, `Box<T>` | allocated on first write |
//! | `#[derive(Decode)]` struct | its own tagged fields |
//! | [`XmlName`] | the element's local name |
//!
//! ## Example
//!
//! ```rust
//! use xmltag::Decode;
//!
//! #[derive(Debug, Default, Decode)]
//! #[xml(root = "Item")]
//! struct Item {
//!     #[xml("ASIN")]
//!     asin: String,
//!     #[xml("Offers>Offer>Price>Amount")]
//!     amounts: Vec<i64>,
//!     #[xml("currency,attr")]
//!     currency: Option<String>,
//! }
//!
//! let item: Item = xmltag::from_str(
//!     r#"<Item currency="USD">
//!          <ASIN>0321344758</ASIN>
//!          <Offers>
//!            <Offer><Price><Amount>2467</Amount></Price></Offer>
//!            <Offer><Price><Amount>2999</Amount></Price></Offer>
//!          </Offers>
//!        </Item>"#,
//! )
//! .unwrap();
//!
//! assert_eq!(item.asin, "0321344758");
//! assert_eq!(item.amounts, [2467, 2999]);
//! assert_eq!(item.currency.as_deref(), Some("USD"));
//! ```

// Lets the derive's `::xmltag::` paths resolve inside this crate's own tests.
extern crate self as xmltag;

pub mod coerce;
pub mod config;
pub mod decode;
pub mod decoder;
pub mod descriptor;
pub mod error;
pub mod name;
pub mod node;

pub use config::DecoderConfig;
pub use decode::{Composite, Context, Decode, decode_composite};
pub use decoder::Decoder;
pub use descriptor::{
    Category, DescriptorCache, FieldDecl, FieldDescriptor, FieldMode, TypeDescriptor,
};
pub use error::{CoercionError, DecodeError, InputError, Result, SchemaError};
pub use name::XmlName;
pub use node::{Node, NodeKind};

#[cfg(feature = "derive")]
pub use xmltag_macro::Decode;

/// Parses `xml` and decodes its root element with default settings.
pub fn from_str<T: Decode + Default>(xml: &str) -> Result<T> {
    Decoder::new().from_str(xml)
}

/// Parses UTF-8 `bytes` and decodes the root element with default settings.
pub fn from_slice<T: Decode + Default>(bytes: &[u8]) -> Result<T> {
    Decoder::new().from_slice(bytes)
}

/// Parses `xml` and decodes its root element into an existing value.
pub fn decode_str<T: Decode>(xml: &str, dest: &mut T) -> Result<()> {
    Decoder::new().decode_str(xml, dest)
}

/// Decodes an already-parsed element into `dest` with default settings.
pub fn decode_node<T: Decode, N: Node>(dest: &mut T, node: N) -> Result<()> {
    Decoder::new().decode(dest, node)
}
