use xmlwriter::XmlWriter;

use crate::{Document, NodeId};

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

impl Document {
    /// Serializes the document back to SVG.
    ///
    /// The output is deterministic: attributes keep their stored order and
    /// namespace declarations are synthesized on the root element only.
    pub fn to_string(&self, opt: xmlwriter::Options) -> String {
        let mut xml = XmlWriter::new(opt);
        let root = self.root_element();
        self.write_node(root, true, &mut xml);
        xml.end_document()
    }

    /// Serializes a single subtree.
    ///
    /// Namespace declarations are omitted; the result is a snippet,
    /// not a standalone document.
    pub fn subtree_to_string(&self, id: NodeId, opt: xmlwriter::Options) -> String {
        let mut xml = XmlWriter::new(opt);
        self.write_node(id, false, &mut xml);
        xml.end_document()
    }

    fn write_node(&self, id: NodeId, is_root: bool, xml: &mut XmlWriter) {
        if let Some(tag) = self.tag_name(id) {
            xml.start_element(tag);
            for attr in self.attributes(id) {
                xml.write_attribute(&attr.name, attr.value.as_str());
            }
            if is_root {
                xml.write_attribute("xmlns", SVG_NS);
                if self.has_xlink() {
                    xml.write_attribute("xmlns:xlink", XLINK_NS);
                }
            }
            for child in self.children(id) {
                self.write_node(child, false, xml);
            }
            xml.end_element();
        } else if let Some(text) = self.text(id) {
            xml.write_text(text);
        }
    }

    fn has_xlink(&self) -> bool {
        self.descendants(self.root()).any(|n| {
            self.attributes(n)
                .iter()
                .any(|a| a.name.starts_with("xlink:"))
        })
    }
}
