//! Recursive decoder and path matcher.
//!
//! Every destination type implements [`Decode`], whose associated
//! [`Category`] fixes how a node is written into it. Composite types also
//! implement [`Composite`], which exposes their fields as numbered slots; the
//! path matcher uses a [`TypeDescriptor`] to decide which slot, if any, a child
//! element belongs to.

use std::sync::Arc;

use tracing::trace;

use crate::descriptor::{Category, DescriptorCache, FieldMode, TypeDescriptor};
use crate::error::{DecodeError, Result, SchemaError};
use crate::node::Node;

/// A value that can be populated from an XML node.
pub trait Decode {
    /// How values of this type are decoded.
    const CATEGORY: Category;

    /// Category of the innermost value once pointers are looked through.
    const TARGET: Category = Self::CATEGORY;

    #[doc(hidden)]
    const BYTE: bool = false;

    /// Writes `node` into `self`.
    ///
    /// The default reads the node's text content through
    /// [`Decode::decode_text`].
    fn decode<N: Node>(&mut self, cx: &mut Context<'_>, node: N) -> Result<()> {
        let _ = cx;
        self.decode_text(&node.text_content())
    }

    /// Assigns `self` from a bare string (attribute values, element names,
    /// character data).
    fn decode_text(&mut self, text: &str) -> Result<()> {
        let _ = text;
        Err(SchemaError::TextUnsupported {
            type_name: std::any::type_name::<Self>(),
        }
        .into())
    }

    #[doc(hidden)]
    fn assign_bytes(seq: &mut Vec<Self>, text: &str)
    where
        Self: Sized,
    {
        let _ = (seq, text);
    }
}

/// A struct whose fields are bound to elements and attributes by tag.
///
/// Implementations are normally generated by `#[derive(Decode)]`. Slots are
/// the zero-based positions of the entries returned by [`Composite::fields`].
pub trait Composite: Sized + 'static {
    /// Field declarations in struct order.
    fn fields() -> Vec<crate::FieldDecl>;

    /// Local name the governing element must carry, independent of any
    /// name-capture field.
    fn root_name() -> Option<&'static str> {
        None
    }

    /// Decodes `node` into the field at `slot`.
    fn decode_slot<N: Node>(&mut self, slot: usize, cx: &mut Context<'_>, node: N) -> Result<()>;

    /// Assigns the field at `slot` from a bare string.
    fn decode_slot_text(&mut self, slot: usize, text: &str) -> Result<()>;
}

/// State carried through one top-level decode.
#[derive(Debug)]
pub struct Context<'d> {
    cache: &'d DescriptorCache,
    depth: usize,
    max_depth: usize,
}

impl<'d> Context<'d> {
    pub(crate) fn new(cache: &'d DescriptorCache, max_depth: usize) -> Self {
        Self {
            cache,
            depth: 0,
            max_depth,
        }
    }

    /// Resolves the published descriptor of `T`, building it on first use.
    pub fn descriptor<T: Composite>(&self) -> Result<Arc<TypeDescriptor>> {
        Ok(self.cache.get_or_build::<T>()?)
    }

    /// Current element nesting below the top-level node.
    pub fn depth(&self) -> usize {
        self.depth
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= self.max_depth {
            return Err(SchemaError::DepthExceeded {
                max_depth: self.max_depth,
            }
            .into());
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }
}

/// Decodes `node` into a composite destination.
///
/// Checks the asserted root name first; on mismatch nothing is written.
/// Then the name-capture field, attribute fields and text-capture fields are
/// assigned, and finally every element child is run through the path matcher.
pub fn decode_composite<T: Composite, N: Node>(
    dest: &mut T,
    cx: &mut Context<'_>,
    node: N,
) -> Result<()> {
    let descriptor = cx.descriptor::<T>()?;

    if let Some(expected) = descriptor.required_root_name()
        && expected != node.local_name()
    {
        return Err(DecodeError::NameMismatch {
            expected: expected.to_string(),
            found: node.local_name().to_string(),
        });
    }

    if let Some(field) = descriptor.name_field() {
        dest.decode_slot_text(field.slot(), node.local_name())?;
    }

    for field in descriptor.fields() {
        match field.mode() {
            FieldMode::Attribute => {
                if let Some(value) = node.attribute(field.leaf_name()) {
                    dest.decode_slot_text(field.slot(), value)?;
                }
            }
            FieldMode::CharData => {
                dest.decode_slot_text(field.slot(), &node.char_data())?;
            }
            FieldMode::InnerXml => {
                if let Some(raw) = node.inner_xml() {
                    dest.decode_slot_text(field.slot(), raw)?;
                }
            }
            FieldMode::Element | FieldMode::NameCapture => {}
        }
    }

    for child in node.element_children() {
        match_and_descend(&descriptor, dest, cx, &[], child)?;
    }

    Ok(())
}

/// Routes `node` to the field it belongs to, given the element names already
/// walked below the governing element.
///
/// Fields are scanned in declaration order. The first field whose full path
/// ends at `node` receives it; otherwise the first field whose path passes
/// through `node` makes the matcher descend into its element children. A node
/// matching neither is skipped.
fn match_and_descend<T: Composite, N: Node>(
    descriptor: &TypeDescriptor,
    dest: &mut T,
    cx: &mut Context<'_>,
    ancestors: &[String],
    node: N,
) -> Result<()> {
    cx.enter()?;
    let result = match_node(descriptor, dest, cx, ancestors, node);
    cx.leave();
    result
}

fn match_node<T: Composite, N: Node>(
    descriptor: &TypeDescriptor,
    dest: &mut T,
    cx: &mut Context<'_>,
    ancestors: &[String],
    node: N,
) -> Result<()> {
    let name = node.local_name();
    let depth = ancestors.len();

    let mut parents = None;
    for field in descriptor.fields() {
        let path = field.path();
        if field.mode() != FieldMode::Element || path.len() < depth {
            continue;
        }
        if !path.starts_with(ancestors) {
            continue;
        }
        if path.len() == depth && field.leaf_name() == name {
            return dest.decode_slot(field.slot(), cx, node);
        }
        if path.len() > depth && path[depth] == name {
            // Paths sharing this prefix are reached through the same descent,
            // so the first one is enough.
            parents = Some(&path[..=depth]);
            break;
        }
    }

    let Some(parents) = parents else {
        trace!(
            type_name = descriptor.type_name(),
            element = name,
            "skipping unmatched element"
        );
        return Ok(());
    };

    for child in node.element_children() {
        match_and_descend(descriptor, dest, cx, parents, child)?;
    }
    Ok(())
}

impl<T: Decode + Default> Decode for Option<T> {
    const CATEGORY: Category = Category::Pointer;
    const TARGET: Category = T::TARGET;

    fn decode<N: Node>(&mut self, cx: &mut Context<'_>, node: N) -> Result<()> {
        self.get_or_insert_with(T::default).decode(cx, node)
    }

    fn decode_text(&mut self, text: &str) -> Result<()> {
        self.get_or_insert_with(T::default).decode_text(text)
    }
}

impl<T: Decode> Decode for Box<T> {
    const CATEGORY: Category = Category::Pointer;
    const TARGET: Category = T::TARGET;

    fn decode<N: Node>(&mut self, cx: &mut Context<'_>, node: N) -> Result<()> {
        (**self).decode(cx, node)
    }

    fn decode_text(&mut self, text: &str) -> Result<()> {
        (**self).decode_text(text)
    }
}

impl<T: Decode + Default> Decode for Vec<T> {
    const CATEGORY: Category = if T::BYTE {
        Category::Bytes
    } else {
        Category::Sequence
    };

    fn decode<N: Node>(&mut self, cx: &mut Context<'_>, node: N) -> Result<()> {
        if T::BYTE {
            T::assign_bytes(self, &node.text_content());
            return Ok(());
        }
        append_with(self, |slot| slot.decode(cx, node))
    }

    fn decode_text(&mut self, text: &str) -> Result<()> {
        if T::BYTE {
            T::assign_bytes(self, text);
            return Ok(());
        }
        append_with(self, |slot| slot.decode_text(text))
    }
}

/// Appends a default element and fills it; a failed fill is rolled back so
/// no half-decoded element stays in the sequence.
fn append_with<T: Default>(
    seq: &mut Vec<T>,
    fill: impl FnOnce(&mut T) -> Result<()>,
) -> Result<()> {
    let len = seq.len();
    seq.push(T::default());
    if let Err(err) = fill(&mut seq[len]) {
        trace!(len, "rolling back sequence append");
        seq.truncate(len);
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FieldDecl;

    // Hand-written composite, the way a type without the derive would look.
    #[derive(Debug, Default, PartialEq)]
    struct Listing {
        title: String,
        amount: i64,
        currency: Option<String>,
        tags: Vec<String>,
    }

    impl Composite for Listing {
        fn fields() -> Vec<FieldDecl> {
            vec![
                FieldDecl::new::<String>("title", "Title"),
                FieldDecl::new::<i64>("amount", "Price>Amount"),
                FieldDecl::new::<Option<String>>("currency", "currency,attr"),
                FieldDecl::new::<Vec<String>>("tags", "Tags>Tag"),
            ]
        }

        fn decode_slot<N: Node>(
            &mut self,
            slot: usize,
            cx: &mut Context<'_>,
            node: N,
        ) -> Result<()> {
            match slot {
                0 => self.title.decode(cx, node),
                1 => self.amount.decode(cx, node),
                2 => self.currency.decode(cx, node),
                3 => self.tags.decode(cx, node),
                _ => Err(SchemaError::UnknownSlot {
                    type_name: "Listing",
                    slot,
                }
                .into()),
            }
        }

        fn decode_slot_text(&mut self, slot: usize, text: &str) -> Result<()> {
            match slot {
                0 => self.title.decode_text(text),
                1 => self.amount.decode_text(text),
                2 => self.currency.decode_text(text),
                3 => self.tags.decode_text(text),
                _ => Err(SchemaError::UnknownSlot {
                    type_name: "Listing",
                    slot,
                }
                .into()),
            }
        }
    }

    impl Decode for Listing {
        const CATEGORY: Category = Category::Composite;

        fn decode<N: Node>(&mut self, cx: &mut Context<'_>, node: N) -> Result<()> {
            decode_composite(self, cx, node)
        }
    }

    fn decode_listing(xml: &str, max_depth: usize) -> Result<Listing> {
        let cache = DescriptorCache::new();
        let doc = roxmltree::Document::parse(xml).unwrap();
        let mut cx = Context::new(&cache, max_depth);
        let mut listing = Listing::default();
        listing.decode(&mut cx, doc.root_element())?;
        assert_eq!(cx.depth(), 0);
        Ok(listing)
    }

    #[test]
    fn test_manual_composite() {
        let listing = decode_listing(
            r#"<Listing currency="EUR">
                 <Noise><Title>wrong</Title></Noise>
                 <Title>Lamp</Title>
                 <Price><Amount>42</Amount><Other/></Price>
                 <Tags><Tag>a</Tag><Skip>x</Skip><Tag>b</Tag></Tags>
               </Listing>"#,
            16,
        )
        .unwrap();

        assert_eq!(
            listing,
            Listing {
                title: "Lamp".to_string(),
                amount: 42,
                currency: Some("EUR".to_string()),
                tags: vec!["a".to_string(), "b".to_string()],
            }
        );
    }

    #[test]
    fn test_missing_attribute_stays_unset() {
        let listing = decode_listing("<Listing><Title>Lamp</Title></Listing>", 16).unwrap();
        assert_eq!(listing.currency, None);
    }

    #[test]
    fn test_depth_ceiling() {
        let xml = "<Listing><Price><Amount>1</Amount></Price></Listing>";
        assert!(decode_listing(xml, 2).is_ok());

        let err = decode_listing(xml, 1).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Schema(SchemaError::DepthExceeded { max_depth: 1 })
        ));
    }

    #[test]
    fn test_sequence_rollback_on_failure() {
        let doc = roxmltree::Document::parse("<n>not a number</n>").unwrap();
        let cache = DescriptorCache::new();
        let mut cx = Context::new(&cache, 8);
        let mut values = vec![1_i32, 2];
        let err = values.decode(&mut cx, doc.root_element()).unwrap_err();
        assert!(err.is_coercion());
        assert_eq!(values, [1, 2]);
    }

    #[test]
    fn test_bytes_replace_verbatim() {
        let doc = roxmltree::Document::parse("<b> raw &amp; text </b>").unwrap();
        let cache = DescriptorCache::new();
        let mut cx = Context::new(&cache, 8);
        let mut raw = b"old".to_vec();
        raw.decode(&mut cx, doc.root_element()).unwrap();
        assert_eq!(raw, b" raw & text ");
    }

    #[test]
    fn test_option_allocates_on_write() {
        let doc = roxmltree::Document::parse("<n>7</n>").unwrap();
        let cache = DescriptorCache::new();
        let mut cx = Context::new(&cache, 8);
        let mut value: Option<Box<u16>> = None;
        value.decode(&mut cx, doc.root_element()).unwrap();
        assert_eq!(value, Some(Box::new(7)));
    }
}
