//! Read-only view of an already-parsed XML tree.
//!
//! The decoder only ever needs a handful of capabilities from a tree node, so
//! they are collected in the [`Node`] trait. The crate ships an implementation
//! for [`roxmltree::Node`]; other tree providers can plug in by implementing
//! the trait themselves.

use std::borrow::Cow;

/// Coarse classification of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    /// Comments, processing instructions, the document root.
    Other,
}

/// The capability set the decoder reads from a tree node.
///
/// Nodes are cheap handles (`Copy`) into a tree owned by someone else. The
/// decoder never mutates the tree and drops every handle before returning.
pub trait Node: Copy {
    fn kind(&self) -> NodeKind;

    /// Local name of an element, without any namespace prefix. Empty for
    /// non-element nodes.
    fn local_name(&self) -> &str;

    /// Concatenated text of all descendant text nodes.
    fn text_content(&self) -> Cow<'_, str>;

    /// Value of the attribute with the given local name.
    ///
    /// Attributes are unordered; the first attribute whose name matches wins.
    fn attribute(&self, name: &str) -> Option<&str>;

    fn first_child(&self) -> Option<Self>;

    fn next_sibling(&self) -> Option<Self>;

    fn is_element(&self) -> bool {
        self.kind() == NodeKind::Element
    }

    /// Iterates over the direct children in document order.
    fn children(&self) -> Children<Self> {
        Children {
            next: self.first_child(),
        }
    }

    /// Iterates over the direct children that are elements.
    fn element_children(&self) -> std::iter::Filter<Children<Self>, fn(&Self) -> bool> {
        self.children().filter(Self::is_element as fn(&Self) -> bool)
    }

    /// Concatenated text of the direct text children only.
    fn char_data(&self) -> String {
        let mut out = String::new();
        for child in self.children() {
            if child.kind() == NodeKind::Text {
                out.push_str(&child.text_content());
            }
        }
        out
    }

    /// Raw markup between the start and end tags, when the provider keeps the
    /// source text around.
    fn inner_xml(&self) -> Option<&str> {
        None
    }
}

/// Iterator over the direct children of a [`Node`].
#[derive(Debug, Clone)]
pub struct Children<N> {
    next: Option<N>,
}

impl<N: Node> Iterator for Children<N> {
    type Item = N;

    fn next(&mut self) -> Option<N> {
        let current = self.next?;
        self.next = current.next_sibling();
        Some(current)
    }
}

impl<'a, 'input: 'a> Node for roxmltree::Node<'a, 'input> {
    fn kind(&self) -> NodeKind {
        match self.node_type() {
            roxmltree::NodeType::Element => NodeKind::Element,
            roxmltree::NodeType::Text => NodeKind::Text,
            _ => NodeKind::Other,
        }
    }

    fn local_name(&self) -> &str {
        if self.is_element() {
            self.tag_name().name()
        } else {
            ""
        }
    }

    fn text_content(&self) -> Cow<'_, str> {
        let mut texts = self
            .descendants()
            .filter(|n| n.is_text())
            .filter_map(|n| n.text());
        let Some(first) = texts.next() else {
            return Cow::Borrowed("");
        };
        match texts.next() {
            None => Cow::Borrowed(first),
            Some(second) => {
                let mut joined = String::with_capacity(first.len() + second.len());
                joined.push_str(first);
                joined.push_str(second);
                texts.for_each(|t| joined.push_str(t));
                Cow::Owned(joined)
            }
        }
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes()
            .find(|attr| attr.name() == name)
            .map(|attr| attr.value())
    }

    fn first_child(&self) -> Option<Self> {
        roxmltree::Node::first_child(self)
    }

    fn next_sibling(&self) -> Option<Self> {
        roxmltree::Node::next_sibling(self)
    }

    fn inner_xml(&self) -> Option<&str> {
        if !self.is_element() {
            return None;
        }
        let input = self.document().input_text();
        match (
            roxmltree::Node::first_child(self),
            roxmltree::Node::last_child(self),
        ) {
            (Some(first), Some(last)) => input.get(first.range().start..last.range().end),
            _ => Some(""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<root a="1" b="2">head<child>one<![CDATA[two]]></child><!-- c --><other/>tail</root>"#;

    #[test]
    fn test_kind_and_local_name() {
        let doc = roxmltree::Document::parse(DOC).unwrap();
        let root = doc.root_element();
        assert_eq!(Node::kind(&root), NodeKind::Element);
        assert_eq!(Node::local_name(&root), "root");

        let first = Node::first_child(&root).unwrap();
        assert_eq!(Node::kind(&first), NodeKind::Text);
        assert_eq!(Node::local_name(&first), "");
    }

    #[test]
    fn test_text_content_concatenates_descendants() {
        let doc = roxmltree::Document::parse(DOC).unwrap();
        let root = doc.root_element();
        assert_eq!(Node::text_content(&root), "headonetwotail");
    }

    #[test]
    fn test_char_data_only_direct_text() {
        let doc = roxmltree::Document::parse(DOC).unwrap();
        let root = doc.root_element();
        assert_eq!(Node::char_data(&root), "headtail");
    }

    #[test]
    fn test_element_children_skip_text_and_comments() {
        let doc = roxmltree::Document::parse(DOC).unwrap();
        let root = doc.root_element();
        let names: Vec<&str> = Node::element_children(&root)
            .map(|n| n.tag_name().name())
            .collect();
        assert_eq!(names, ["child", "other"]);
    }

    #[test]
    fn test_attribute_lookup() {
        let doc = roxmltree::Document::parse(DOC).unwrap();
        let root = doc.root_element();
        assert_eq!(Node::attribute(&root, "b"), Some("2"));
        assert_eq!(Node::attribute(&root, "missing"), None);
    }

    #[test]
    fn test_inner_xml_is_raw_markup() {
        let doc = roxmltree::Document::parse("<p><name>a&lt;b</name></p>").unwrap();
        let root = doc.root_element();
        assert_eq!(Node::inner_xml(&root), Some("<name>a&lt;b</name>"));

        let doc = roxmltree::Document::parse("<p/>").unwrap();
        assert_eq!(Node::inner_xml(&doc.root_element()), Some(""));
    }
}
