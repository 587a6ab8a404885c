//! Top-level decode entry points.

use std::sync::Arc;

use roxmltree::Document;
use tracing::debug;

use crate::config::DecoderConfig;
use crate::decode::{Context, Decode};
use crate::descriptor::DescriptorCache;
use crate::error::{InputError, Result, SchemaError};
use crate::node::Node;

/// Decodes XML trees into typed destinations.
///
/// A decoder pairs a [`DecoderConfig`] with the [`DescriptorCache`] its
/// composite descriptors are published into. Decoders are cheap to clone and
/// safe to share between threads; concurrent decodes into distinct
/// destinations never interfere.
///
/// # Example
///
/// ```rust
/// use xmltag::{Decode, Decoder};
///
/// #[derive(Debug, Default, Decode)]
/// struct Person {
///     #[xml("name")]
///     name: String,
///     #[xml("id,attr")]
///     id: u32,
/// }
///
/// let person: Person = Decoder::new()
///     .from_str(r#"<person id="7"><name>Ada</name></person>"#)
///     .unwrap();
/// assert_eq!(person.name, "Ada");
/// assert_eq!(person.id, 7);
/// ```
#[derive(Debug, Clone)]
pub struct Decoder {
    config: DecoderConfig,
    cache: Arc<DescriptorCache>,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    /// Creates a decoder with default settings sharing the global cache.
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            config,
            cache: DescriptorCache::global(),
        }
    }

    /// Replaces the descriptor cache this decoder publishes into.
    pub fn with_cache(mut self, cache: Arc<DescriptorCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Creates a decoder with a private, initially empty cache.
    pub fn isolated(config: DecoderConfig) -> Self {
        Self::with_config(config).with_cache(Arc::new(DescriptorCache::new()))
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<DescriptorCache> {
        &self.cache
    }

    /// Decodes an already-parsed element into `dest`.
    ///
    /// Fields without a matching node keep their current value. On error the
    /// destination may be partially written.
    pub fn decode<T: Decode, N: Node>(&self, dest: &mut T, node: N) -> Result<()> {
        if !node.is_element() {
            return Err(SchemaError::RootNotElement.into());
        }
        debug!(
            target_type = std::any::type_name::<T>(),
            root = node.local_name(),
            "decoding element"
        );
        let mut cx = Context::new(&self.cache, self.config.max_depth);
        dest.decode(&mut cx, node)
    }

    /// Parses `xml` and decodes its root element into `dest`.
    pub fn decode_str<T: Decode>(&self, xml: &str, dest: &mut T) -> Result<()> {
        let doc = Document::parse_with_options(xml, self.config.parsing_options())
            .map_err(InputError::from)?;
        self.decode(dest, doc.root_element())
    }

    /// Parses `xml` and decodes its root element into a fresh value.
    pub fn from_str<T: Decode + Default>(&self, xml: &str) -> Result<T> {
        let mut value = T::default();
        self.decode_str(xml, &mut value)?;
        Ok(value)
    }

    /// Like [`Decoder::from_str`] for UTF-8 encoded bytes.
    pub fn from_slice<T: Decode + Default>(&self, bytes: &[u8]) -> Result<T> {
        let xml = std::str::from_utf8(bytes).map_err(InputError::from)?;
        self.from_str(xml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;

    #[test]
    fn test_scalar_root() {
        let value: i32 = Decoder::new().from_str("<n>-12</n>").unwrap();
        assert_eq!(value, -12);
    }

    #[test]
    fn test_malformed_input_passes_through() {
        let err = Decoder::new().from_str::<String>("<a><b></a>").unwrap_err();
        assert!(matches!(err, DecodeError::Input(InputError::Xml(_))));
    }

    #[test]
    fn test_invalid_utf8() {
        let err = Decoder::new()
            .from_slice::<String>(b"<a>\xff</a>")
            .unwrap_err();
        assert!(matches!(err, DecodeError::Input(InputError::Utf8(_))));
    }

    #[test]
    fn test_non_element_root_is_rejected() {
        let doc = Document::parse("<a>text</a>").unwrap();
        let text = doc.root_element().first_child().unwrap();
        let mut dest = String::new();
        let err = Decoder::new().decode(&mut dest, text).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Schema(SchemaError::RootNotElement)
        ));
        assert!(dest.is_empty());
    }

    #[test]
    fn test_dtd_follows_config() {
        let xml = "<!DOCTYPE a><a>1</a>";
        assert!(Decoder::new().from_str::<u8>(xml).unwrap_err().is_input());

        let permissive = Decoder::with_config(DecoderConfig {
            allow_dtd: true,
            ..Default::default()
        });
        assert_eq!(permissive.from_str::<u8>(xml).unwrap(), 1);
    }

    #[test]
    fn test_isolated_cache_is_private() {
        let decoder = Decoder::isolated(DecoderConfig::default());
        assert!(decoder.cache().is_empty());
        assert!(!Arc::ptr_eq(decoder.cache(), &DescriptorCache::global()));
    }
}
