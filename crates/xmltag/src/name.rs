//! Capture of an element's local name.

use crate::decode::{Context, Decode};
use crate::descriptor::Category;
use crate::error::Result;
use crate::node::Node;

/// Local name of an XML element.
///
/// As a `,name` field it records the name of the governing element. As an
/// ordinary element field it records the name of the matched child instead of
/// its text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct XmlName {
    pub local: String,
}

impl XmlName {
    pub fn new(local: impl Into<String>) -> Self {
        Self {
            local: local.into(),
        }
    }
}

impl Decode for XmlName {
    const CATEGORY: Category = Category::Scalar;

    fn decode<N: Node>(&mut self, _cx: &mut Context<'_>, node: N) -> Result<()> {
        self.decode_text(node.local_name())
    }

    fn decode_text(&mut self, text: &str) -> Result<()> {
        self.local.clear();
        self.local.push_str(text);
        Ok(())
    }
}

impl std::fmt::Display for XmlName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.local)
    }
}
