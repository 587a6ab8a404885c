//! `#[derive(Decode)]` for xmltag.
//!
//! The derive turns a struct with named fields into an `xmltag::Composite`:
//! it lists one `FieldDecl` per field, in declaration order, and generates the
//! slot dispatch that writes a matched node into the right field.
//!
//! ```ignore
//! #[derive(Default, Decode)]
//! #[xml(rename_all = "PascalCase", root = "Feed")]
//! struct Feed {
//!     title: String,                 // <Title>
//!     #[xml("entry")]
//!     entries: Vec<Entry>,           // every <entry>
//!     #[xml("lang,attr")]
//!     lang: Option<String>,          // lang="..." on <Feed>
//!     #[xml("-")]
//!     cached: u64,                   // never decoded
//! }
//! ```
//!
//! Container attributes:
//!
//! - `rename_all = "..."` converts each field identifier into its default XML
//!   name. Accepted rules: `PascalCase`, `camelCase`, `snake_case`,
//!   `kebab-case`, `SCREAMING_SNAKE_CASE`, `lowercase`, `UPPERCASE`.
//! - `root = "..."` requires the governing element to carry that local name.
//!
//! Field tags are checked when the type is first decoded, not at compile time.

use heck::{ToKebabCase, ToLowerCamelCase, ToPascalCase, ToShoutySnakeCase, ToSnakeCase};
use proc_macro::TokenStream;
use proc_macro2::{Literal, TokenStream as TokenStream2};
use quote::quote;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Fields, LitStr, parse_macro_input};

#[proc_macro_derive(Decode, attributes(xml))]
pub fn derive_decode(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenameRule {
    Pascal,
    Camel,
    Snake,
    Kebab,
    ScreamingSnake,
    Lower,
    Upper,
}

impl RenameRule {
    fn parse(rule: &LitStr) -> syn::Result<Self> {
        Ok(match rule.value().as_str() {
            "PascalCase" => RenameRule::Pascal,
            "camelCase" => RenameRule::Camel,
            "snake_case" => RenameRule::Snake,
            "kebab-case" => RenameRule::Kebab,
            "SCREAMING_SNAKE_CASE" => RenameRule::ScreamingSnake,
            "lowercase" => RenameRule::Lower,
            "UPPERCASE" => RenameRule::Upper,
            other => {
                return Err(syn::Error::new(
                    rule.span(),
                    format!("unknown rename_all rule {other:?}"),
                ));
            }
        })
    }

    fn apply(self, ident: &str) -> String {
        match self {
            RenameRule::Pascal => ident.to_pascal_case(),
            RenameRule::Camel => ident.to_lower_camel_case(),
            RenameRule::Snake => ident.to_snake_case(),
            RenameRule::Kebab => ident.to_kebab_case(),
            RenameRule::ScreamingSnake => ident.to_shouty_snake_case(),
            RenameRule::Lower => ident.to_lowercase(),
            RenameRule::Upper => ident.to_uppercase(),
        }
    }
}

#[derive(Debug, Default)]
struct ContainerAttrs {
    rename_all: Option<RenameRule>,
    root: Option<LitStr>,
}

fn parse_container_attrs(input: &DeriveInput) -> syn::Result<ContainerAttrs> {
    let mut attrs = ContainerAttrs::default();
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("xml")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") {
                attrs.rename_all = Some(RenameRule::parse(&meta.value()?.parse()?)?);
                Ok(())
            } else if meta.path.is_ident("root") {
                attrs.root = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("expected `rename_all` or `root`"))
            }
        })?;
    }
    Ok(attrs)
}

/// Reads the tag from `#[xml("...")]`, defaulting to the empty tag.
fn field_tag(field: &syn::Field) -> syn::Result<LitStr> {
    let mut tag = None;
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("xml")) {
        if tag.is_some() {
            return Err(syn::Error::new_spanned(attr, "duplicate #[xml] attribute"));
        }
        tag = Some(attr.parse_args::<LitStr>()?);
    }
    Ok(tag.unwrap_or_else(|| LitStr::new("", proc_macro2::Span::call_site())))
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "#[derive(Decode)] only supports structs",
        ));
    };
    let Fields::Named(named) = &data.fields else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "#[derive(Decode)] requires named fields",
        ));
    };
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "#[derive(Decode)] does not support generic structs",
        ));
    }

    let container = parse_container_attrs(input)?;
    let name = &input.ident;

    let mut decls = Vec::new();
    let mut node_arms = Vec::new();
    let mut text_arms = Vec::new();

    for (slot, field) in named.named.iter().enumerate() {
        let Some(ident) = &field.ident else {
            continue;
        };
        let ty = &field.ty;
        let ident_str = ident.to_string();
        let tag = field_tag(field)?;

        if tag.value() == "-" {
            decls.push(quote! { ::xmltag::FieldDecl::ignored(#ident_str) });
            continue;
        }

        let unraw = ident.unraw().to_string();
        let xml_name = match container.rename_all {
            Some(rule) => rule.apply(&unraw),
            None => unraw,
        };
        decls.push(quote! {
            ::xmltag::FieldDecl::new::<#ty>(#ident_str, #tag).named(#xml_name)
        });

        let slot = Literal::usize_unsuffixed(slot);
        node_arms.push(quote! {
            #slot => ::xmltag::Decode::decode(&mut self.#ident, cx, node)
        });
        text_arms.push(quote! {
            #slot => ::xmltag::Decode::decode_text(&mut self.#ident, text)
        });
    }

    let root = match &container.root {
        Some(root) => quote! { ::std::option::Option::Some(#root) },
        None => quote! { ::std::option::Option::None },
    };

    let unknown_slot = quote! {
        _ => ::std::result::Result::Err(
            ::xmltag::SchemaError::UnknownSlot {
                type_name: ::std::any::type_name::<Self>(),
                slot,
            }
            .into(),
        )
    };

    Ok(quote! {
        impl ::xmltag::Composite for #name {
            fn fields() -> ::std::vec::Vec<::xmltag::FieldDecl> {
                ::std::vec![#(#decls),*]
            }

            fn root_name() -> ::std::option::Option<&'static str> {
                #root
            }

            #[allow(unused_variables)]
            fn decode_slot<__N: ::xmltag::Node>(
                &mut self,
                slot: usize,
                cx: &mut ::xmltag::Context<'_>,
                node: __N,
            ) -> ::xmltag::Result<()> {
                match slot {
                    #(#node_arms,)*
                    #unknown_slot
                }
            }

            #[allow(unused_variables)]
            fn decode_slot_text(&mut self, slot: usize, text: &str) -> ::xmltag::Result<()> {
                match slot {
                    #(#text_arms,)*
                    #unknown_slot
                }
            }
        }

        impl ::xmltag::Decode for #name {
            const CATEGORY: ::xmltag::Category = ::xmltag::Category::Composite;

            fn decode<__N: ::xmltag::Node>(
                &mut self,
                cx: &mut ::xmltag::Context<'_>,
                node: __N,
            ) -> ::xmltag::Result<()> {
                ::xmltag::decode_composite(self, cx, node)
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_rename_rules() {
        let rule = |s: &str| RenameRule::parse(&LitStr::new(s, proc_macro2::Span::call_site()));
        assert_eq!(rule("PascalCase").unwrap().apply("list_price"), "ListPrice");
        assert_eq!(rule("camelCase").unwrap().apply("list_price"), "listPrice");
        assert_eq!(rule("kebab-case").unwrap().apply("list_price"), "list-price");
        assert_eq!(rule("UPPERCASE").unwrap().apply("asin"), "ASIN");
        assert!(rule("Title Case").is_err());
    }

    #[test]
    fn test_expand_named_struct() {
        let input: DeriveInput = parse_quote! {
            #[xml(rename_all = "PascalCase", root = "Item")]
            struct Item {
                #[xml("ASIN")]
                asin: String,
                list_price: i64,
                #[xml("-")]
                cached: u64,
            }
        };
        let out = expand(&input).unwrap().to_string();
        assert!(out.contains("\"ListPrice\""));
        assert!(out.contains("FieldDecl :: ignored (\"cached\")"));
        assert!(out.contains("Some (\"Item\")"));
    }

    #[test]
    fn test_expand_rejects_unsupported_shapes() {
        let tuple: DeriveInput = parse_quote! { struct Pair(String, String); };
        assert!(expand(&tuple).is_err());

        let generic: DeriveInput = parse_quote! { struct Wrap<T> { inner: T } };
        assert!(expand(&generic).is_err());

        let unknown: DeriveInput = parse_quote! {
            #[xml(flatten)]
            struct Item { a: String }
        };
        assert!(expand(&unknown).is_err());

        let twice: DeriveInput = parse_quote! {
            struct Item {
                #[xml("a")]
                #[xml("b")]
                a: String,
            }
        };
        assert!(expand(&twice).is_err());
    }
}
