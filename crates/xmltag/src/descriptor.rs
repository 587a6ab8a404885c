//! Compiled field-binding metadata for composite destination types.
//!
//! A composite type declares its fields once through [`Composite::fields`]
//! (usually generated by `#[derive(Decode)]`). The first decode of that type
//! parses every field tag into a [`FieldDescriptor`] and publishes the result
//! as an immutable [`TypeDescriptor`] in a [`DescriptorCache`]. Every later
//! decode of the same type shares that descriptor.
//!
//! ## Tag mini-language
//!
//! A tag is a comma-separated list of clauses:
//!
//! | Tag | Meaning |
//! |-----|---------|
//! | `""` | child element named after the field |
//! | `"Price"` | child element `<Price>` |
//! | `"ListPrice>Amount"` | `<Amount>` nested inside `<ListPrice>` |
//! | `">Item"` | `<Item>` nested inside an element named after the field |
//! | `"currency,attr"` / `",attr"` | attribute of the governing element |
//! | `",chardata"` | direct text of the governing element |
//! | `",innerxml"` | raw markup inside the governing element |
//! | `"Feed,name"` / `",name"` | local name of the governing element, optionally asserted |
//! | `"-"` | field is never decoded |
//!
//! `omitempty` only affects encoding and is accepted without effect.

use std::any::TypeId;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::debug;

use crate::decode::{Composite, Decode};
use crate::error::SchemaError;

/// Decoding strategy of a destination value, fixed by its Rust type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// A primitive filled from text.
    Scalar,
    /// Raw bytes of the text content.
    Bytes,
    /// A growable sequence; every match appends one element.
    Sequence,
    /// A struct with its own descriptor.
    Composite,
    /// An optional or boxed slot that is allocated on first write.
    Pointer,
}

impl Category {
    /// Returns true if a value of this category can be assigned from bare text.
    pub fn is_textual(self) -> bool {
        matches!(self, Category::Scalar | Category::Bytes)
    }
}

/// How a field is bound to the governing element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldMode {
    Element,
    Attribute,
    NameCapture,
    CharData,
    InnerXml,
}

impl FieldMode {
    fn flag(self) -> &'static str {
        match self {
            FieldMode::Element => "element",
            FieldMode::Attribute => "attr",
            FieldMode::NameCapture => "name",
            FieldMode::CharData => "chardata",
            FieldMode::InnerXml => "innerxml",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Target {
    category: Category,
    leaf: Category,
}

/// Declaration of one field as supplied by the composite type.
///
/// Declarations are listed in struct order; that order becomes the match
/// priority of the compiled descriptor.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    ident: &'static str,
    name: Cow<'static, str>,
    tag: &'static str,
    target: Option<Target>,
}

impl FieldDecl {
    /// Declares a field of type `F` with the given tag.
    ///
    /// The default XML name is the identifier itself (minus any `r#` prefix);
    /// use [`FieldDecl::named`] to override it.
    pub fn new<F: Decode>(ident: &'static str, tag: &'static str) -> Self {
        Self {
            ident,
            name: Cow::Borrowed(ident.strip_prefix("r#").unwrap_or(ident)),
            tag,
            target: Some(Target {
                category: F::CATEGORY,
                leaf: F::TARGET,
            }),
        }
    }

    /// Declares a field that is excluded from decoding.
    pub fn ignored(ident: &'static str) -> Self {
        Self {
            ident,
            name: Cow::Borrowed(ident),
            tag: "-",
            target: None,
        }
    }

    /// Overrides the default XML name used when the tag names no leaf.
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    pub fn ident(&self) -> &'static str {
        self.ident
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }
}

/// One compiled field binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    slot: usize,
    ident: &'static str,
    path: Vec<String>,
    leaf_name: String,
    mode: FieldMode,
    category: Category,
    is_sequence: bool,
}

impl FieldDescriptor {
    /// Index of the destination slot inside the composite.
    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn ident(&self) -> &'static str {
        self.ident
    }

    /// Element names between the governing element and the leaf.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn leaf_name(&self) -> &str {
        &self.leaf_name
    }

    pub fn mode(&self) -> FieldMode {
        self.mode
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Whether repeated matches accumulate into the slot.
    pub fn is_sequence(&self) -> bool {
        self.is_sequence
    }
}

/// Immutable, shareable metadata for one composite type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    type_name: &'static str,
    required_root_name: Option<String>,
    name_field: Option<FieldDescriptor>,
    fields: Vec<FieldDescriptor>,
}

impl TypeDescriptor {
    /// Compiles the descriptor of `T` from its field declarations.
    pub fn build<T: Composite>() -> Result<Self, SchemaError> {
        Self::from_decls(std::any::type_name::<T>(), T::root_name(), T::fields())
    }

    /// Compiles a descriptor from explicit declarations.
    pub fn from_decls(
        type_name: &'static str,
        root_name: Option<&'static str>,
        decls: Vec<FieldDecl>,
    ) -> Result<Self, SchemaError> {
        let mut descriptor = TypeDescriptor {
            type_name,
            required_root_name: root_name.map(str::to_string),
            name_field: None,
            fields: Vec::with_capacity(decls.len()),
        };

        for (slot, decl) in decls.into_iter().enumerate() {
            let invalid = |reason: &str| SchemaError::InvalidTag {
                type_name,
                field: decl.ident,
                tag: decl.tag.to_string(),
                reason: reason.to_string(),
            };

            let Some(target) = decl.target else {
                continue;
            };
            let Some(parsed) = parse_tag(decl.tag, &decl.name).map_err(|r| invalid(&r))? else {
                continue;
            };

            if parsed.mode != FieldMode::Element && !target.leaf.is_textual() {
                return Err(SchemaError::UnsupportedField {
                    type_name,
                    field: decl.ident,
                    reason: format!(
                        "{} fields must be scalar or bytes, found {:?}",
                        parsed.mode.flag(),
                        target.leaf
                    ),
                });
            }

            let field = FieldDescriptor {
                slot,
                ident: decl.ident,
                path: parsed.path,
                leaf_name: parsed.leaf,
                mode: parsed.mode,
                category: target.category,
                is_sequence: target.leaf == Category::Sequence,
            };

            if field.mode == FieldMode::NameCapture {
                if descriptor.name_field.is_some() {
                    return Err(invalid("type already has a name-capture field"));
                }
                if parsed.asserts_name {
                    if let Some(existing) = descriptor.required_root_name.as_deref()
                        && existing != field.leaf_name
                    {
                        return Err(invalid(&format!(
                            "name conflicts with declared root name {existing:?}"
                        )));
                    }
                    descriptor.required_root_name = Some(field.leaf_name.clone());
                }
                descriptor.name_field = Some(field);
            } else {
                descriptor.fields.push(field);
            }
        }

        Ok(descriptor)
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Local name the governing element must carry, if asserted.
    pub fn required_root_name(&self) -> Option<&str> {
        self.required_root_name.as_deref()
    }

    pub fn name_field(&self) -> Option<&FieldDescriptor> {
        self.name_field.as_ref()
    }

    /// Element, attribute and text-capture fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedTag {
    path: Vec<String>,
    leaf: String,
    mode: FieldMode,
    asserts_name: bool,
}

/// Parses a field tag. Returns `Ok(None)` for ignored fields.
fn parse_tag(tag: &str, default_name: &str) -> Result<Option<ParsedTag>, String> {
    if tag == "-" {
        return Ok(None);
    }

    let mut clauses = tag.split(',');
    let name = clauses.next().unwrap_or_default();

    let mut mode = FieldMode::Element;
    for flag in clauses {
        let flagged = match flag {
            "attr" => FieldMode::Attribute,
            "chardata" => FieldMode::CharData,
            "innerxml" => FieldMode::InnerXml,
            "name" => FieldMode::NameCapture,
            "omitempty" => continue,
            "" => return Err("empty option".to_string()),
            other => return Err(format!("unknown option {other:?}")),
        };
        if mode != FieldMode::Element {
            return Err(format!(
                "options {:?} and {:?} are mutually exclusive",
                mode.flag(),
                flagged.flag()
            ));
        }
        mode = flagged;
    }

    if matches!(mode, FieldMode::CharData | FieldMode::InnerXml) && !name.is_empty() {
        return Err(format!("{:?} fields cannot name an element", mode.flag()));
    }

    if name.is_empty() {
        return Ok(Some(ParsedTag {
            path: Vec::new(),
            leaf: default_name.to_string(),
            mode,
            asserts_name: false,
        }));
    }

    let mut segments: Vec<String> = name.split('>').map(str::to_string).collect();
    if segments.len() > 1 && mode != FieldMode::Element {
        return Err(format!(
            "path chain is not valid with the {:?} option",
            mode.flag()
        ));
    }
    if segments.last().is_some_and(String::is_empty) {
        return Err("trailing '>'".to_string());
    }
    if segments[0].is_empty() {
        segments[0] = default_name.to_string();
    }
    if segments.iter().any(String::is_empty) {
        return Err("empty path segment".to_string());
    }

    let leaf = segments.pop().unwrap_or_default();
    Ok(Some(ParsedTag {
        path: segments,
        leaf,
        mode,
        asserts_name: mode == FieldMode::NameCapture,
    }))
}

static GLOBAL_CACHE: Lazy<Arc<DescriptorCache>> = Lazy::new(|| Arc::new(DescriptorCache::new()));

/// Type-keyed store of published descriptors.
///
/// A descriptor is built at most once per cache: the build runs under the
/// write lock, and a racing caller that loses re-reads the winner's entry.
/// Published descriptors are never mutated. Failed builds are not stored.
#[derive(Debug, Default)]
pub struct DescriptorCache {
    entries: RwLock<HashMap<TypeId, Arc<TypeDescriptor>>>,
}

impl DescriptorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache shared by decoders that were not given one.
    pub fn global() -> Arc<DescriptorCache> {
        Arc::clone(&GLOBAL_CACHE)
    }

    /// Returns the descriptor of `T`, building and publishing it on first use.
    pub fn get_or_build<T: Composite>(&self) -> Result<Arc<TypeDescriptor>, SchemaError> {
        let key = TypeId::of::<T>();
        if let Some(descriptor) = self.entries.read().get(&key) {
            return Ok(Arc::clone(descriptor));
        }

        let mut entries = self.entries.write();
        if let Some(descriptor) = entries.get(&key) {
            return Ok(Arc::clone(descriptor));
        }

        let descriptor = Arc::new(TypeDescriptor::build::<T>()?);
        debug!(
            type_name = descriptor.type_name(),
            fields = descriptor.fields().len(),
            root = ?descriptor.required_root_name(),
            "published type descriptor"
        );
        entries.insert(key, Arc::clone(&descriptor));
        Ok(descriptor)
    }

    /// Returns true if a descriptor for `T` has been published.
    pub fn contains<T: 'static>(&self) -> bool {
        self.entries.read().contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
