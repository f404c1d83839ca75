/*!
Represents an [SVG](https://www.w3.org/TR/SVG11/Overview.html) document as a mutable,
id-addressable tree.

`mutsvgtree` uses [`roxmltree`](https://github.com/RazrFalcon/roxmltree) for parsing,
but instead of exposing a read-only XML view it builds an owned SVG tree whose
attributes can be patched in place and whose subtrees can be extended with
synthesized elements. The tree can be serialized back to SVG at any time and
any subtree can be serialized on its own.

Only elements from the SVG namespace are kept. Comments and processing
instructions are ignored.
*/

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

use std::collections::HashMap;
use std::num::NonZeroU32;

mod parse;
mod write;

pub use parse::ParseError;
pub use roxmltree;
pub use xmlwriter;

/// A mutable SVG tree container.
///
/// Contains only element and text nodes.
#[derive(Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    links: HashMap<String, NodeId>,
}

/// A node identifier.
///
/// Stable for the lifetime of the document: detaching a node never
/// invalidates other identifiers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    #[inline]
    fn new(id: u32) -> Self {
        debug_assert!(id < u32::MAX);

        // We are using `NonZeroU32` to reduce overhead of `Option<NodeId>`.
        NodeId(NonZeroU32::new(id + 1).unwrap())
    }

    #[inline]
    fn get_usize(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

impl From<usize> for NodeId {
    #[inline]
    fn from(id: usize) -> Self {
        // We already checked that `id` is limited by u32::MAX.
        debug_assert!(id <= u32::MAX as usize);
        NodeId::new(id as u32)
    }
}

/// An attribute.
#[derive(Clone, PartialEq)]
pub struct Attribute {
    /// Attribute's name.
    pub name: String,
    /// Attribute's value.
    pub value: String,
}

impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        write!(
            f,
            "Attribute {{ name: {:?}, value: {} }}",
            self.name, self.value
        )
    }
}

#[derive(Clone)]
enum NodeKind {
    Root,
    Element {
        tag: String,
        attributes: Vec<Attribute>,
    },
    Text(String),
}

#[derive(Clone)]
struct NodeData {
    parent: Option<NodeId>,
    next_sibling: Option<NodeId>,
    children: Option<(NodeId, NodeId)>,
    kind: NodeKind,
}

impl Document {
    /// Returns the root node.
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::new(0)
    }

    /// Returns the root `svg` element.
    #[inline]
    pub fn root_element(&self) -> NodeId {
        // `unwrap` is safe, because `Document` is guaranteed to have
        // an `svg` root element after parsing.
        self.first_element_child(self.root()).unwrap()
    }

    /// Returns an element by its `id` attribute.
    ///
    /// Unlike a descendants scan, this is just a HashMap lookup.
    #[inline]
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.links.get(id).copied()
    }

    /// Checks if a node is an element.
    #[inline]
    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.get_usize()].kind, NodeKind::Element { .. })
    }

    /// Checks if a node is a text node.
    #[inline]
    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.get_usize()].kind, NodeKind::Text(_))
    }

    /// Returns an element's tag name, unless the node is not an element.
    #[inline]
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match self.nodes[id.get_usize()].kind {
            NodeKind::Element { ref tag, .. } => Some(tag),
            _ => None,
        }
    }

    /// Returns a text node's content.
    #[inline]
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.nodes[id.get_usize()].kind {
            NodeKind::Text(ref text) => Some(text),
            _ => None,
        }
    }

    /// Returns a list of all element's attributes.
    #[inline]
    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        match self.nodes[id.get_usize()].kind {
            NodeKind::Element { ref attributes, .. } => attributes,
            _ => &[],
        }
    }

    /// Returns an attribute value.
    #[inline]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Checks if an attribute is present.
    #[inline]
    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attributes(id).iter().any(|a| a.name == name)
    }

    /// Sets an attribute value, replacing an existing one in place.
    ///
    /// A new attribute is appended after the existing ones, so repeated
    /// patching never reorders the serialized output.
    ///
    /// Setting `id` also updates the id-lookup index.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        let value = value.into();
        if name == "id" {
            self.links.insert(value.clone(), id);
        }

        if let NodeKind::Element { ref mut attributes, .. } = self.nodes[id.get_usize()].kind {
            match attributes.iter_mut().find(|a| a.name == name) {
                Some(attr) => attr.value = value,
                None => attributes.push(Attribute {
                    name: name.to_string(),
                    value,
                }),
            }
        }
    }

    /// Removes an attribute. Does nothing when it is absent.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        if name == "id" {
            if let Some(value) = self.attribute(id, "id") {
                let value = value.to_string();
                self.links.remove(&value);
            }
        }

        if let NodeKind::Element { ref mut attributes, .. } = self.nodes[id.get_usize()].kind {
            attributes.retain(|a| a.name != name);
        }
    }

    /// Returns a parent node.
    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.get_usize()].parent
    }

    /// Returns the next sibling.
    #[inline]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.get_usize()].next_sibling
    }

    /// Returns the first child.
    #[inline]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.get_usize()].children.map(|(id, _)| id)
    }

    /// Returns the last child.
    #[inline]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.get_usize()].children.map(|(_, id)| id)
    }

    /// Returns the first child that is an element.
    #[inline]
    pub fn first_element_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).find(|&n| self.is_element(n))
    }

    /// Checks if the node has child nodes.
    #[inline]
    pub fn has_children(&self, id: NodeId) -> bool {
        self.nodes[id.get_usize()].children.is_some()
    }

    /// Returns an iterator over children nodes.
    #[inline]
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.first_child(id),
        }
    }

    /// Returns an iterator over a node and its descendants, pre-order.
    #[inline]
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            stack: vec![id],
        }
    }

    /// Appends a new element as the last child of `parent`.
    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        self.append(
            parent,
            NodeKind::Element {
                tag: tag.to_string(),
                attributes: Vec::new(),
            },
        )
    }

    /// Appends a new text node as the last child of `parent`.
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.append(parent, NodeKind::Text(text.to_string()))
    }

    /// Inserts a new element as the first child of `parent`.
    pub fn prepend_element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let new_child_id = NodeId::from(self.nodes.len());
        let old_first = self.first_child(parent);
        self.nodes.push(NodeData {
            parent: Some(parent),
            next_sibling: old_first,
            children: None,
            kind: NodeKind::Element {
                tag: tag.to_string(),
                attributes: Vec::new(),
            },
        });

        self.nodes[parent.get_usize()].children = Some(match old_first {
            Some(_) => {
                let (_, last) = self.nodes[parent.get_usize()].children.unwrap();
                (new_child_id, last)
            }
            None => (new_child_id, new_child_id),
        });

        new_child_id
    }

    /// Detaches a node, and therefore its whole subtree, from the tree.
    ///
    /// The node stays in the backing storage, so existing [`NodeId`]s
    /// remain valid, but it is no longer reachable from the root and will
    /// not be serialized. Its `id` attributes are unlinked from the index.
    pub fn detach(&mut self, id: NodeId) {
        let parent = match self.nodes[id.get_usize()].parent {
            Some(p) => p,
            None => return,
        };

        let next = self.nodes[id.get_usize()].next_sibling;
        let (first, last) = self.nodes[parent.get_usize()].children.unwrap();

        if first == id {
            self.nodes[parent.get_usize()].children = match next {
                Some(next) if last != id => Some((next, last)),
                _ => None,
            };
        } else {
            let mut prev = first;
            while self.nodes[prev.get_usize()].next_sibling != Some(id) {
                // `unwrap` is safe: `id` is known to be a child of `parent`.
                prev = self.nodes[prev.get_usize()].next_sibling.unwrap();
            }
            self.nodes[prev.get_usize()].next_sibling = next;
            if last == id {
                self.nodes[parent.get_usize()].children = Some((first, prev));
            }
        }

        self.nodes[id.get_usize()].parent = None;
        self.nodes[id.get_usize()].next_sibling = None;

        // Drop detached ids from the lookup index.
        let detached: Vec<(String, NodeId)> = self
            .descendants(id)
            .filter_map(|n| self.attribute(n, "id").map(|v| (v.to_string(), n)))
            .collect();
        for (key, n) in detached {
            if self.links.get(&key) == Some(&n) {
                self.links.remove(&key);
            }
        }
    }

    /// Detaches every child of a node.
    pub fn clear_children(&mut self, id: NodeId) {
        while let Some(child) = self.first_child(id) {
            self.detach(child);
        }
    }

    fn append(&mut self, parent_id: NodeId, kind: NodeKind) -> NodeId {
        let new_child_id = NodeId::from(self.nodes.len());
        self.nodes.push(NodeData {
            parent: Some(parent_id),
            next_sibling: None,
            children: None,
            kind,
        });

        let last_child_id = self.nodes[parent_id.get_usize()].children.map(|(_, id)| id);

        if let Some(id) = last_child_id {
            self.nodes[id.get_usize()].next_sibling = Some(new_child_id);
        }

        self.nodes[parent_id.get_usize()].children = Some(
            if let Some((first_child_id, _)) = self.nodes[parent_id.get_usize()].children {
                (first_child_id, new_child_id)
            } else {
                (new_child_id, new_child_id)
            },
        );

        new_child_id
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        if !self.has_children(self.root()) {
            return write!(f, "Document []");
        }

        fn print_children(
            doc: &Document,
            parent: NodeId,
            depth: usize,
            f: &mut std::fmt::Formatter,
        ) -> Result<(), std::fmt::Error> {
            for child in doc.children(parent) {
                for _ in 0..depth {
                    write!(f, "    ")?;
                }

                if doc.is_element(child) {
                    writeln!(
                        f,
                        "Element {{ tag: {:?}, attributes: {:?} }}",
                        doc.tag_name(child).unwrap(),
                        doc.attributes(child)
                    )?;
                    print_children(doc, child, depth + 1, f)?;
                } else {
                    writeln!(f, "Text({:?})", doc.text(child).unwrap_or_default())?;
                }
            }

            Ok(())
        }

        writeln!(f, "Document [")?;
        print_children(self, self.root(), 1, f)?;
        write!(f, "]")
    }
}

/// An iterator over children nodes.
#[derive(Clone, Debug)]
pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next.take();
        self.next = node.and_then(|id| self.doc.next_sibling(id));
        node
    }
}

/// A pre-order iterator over a node and its descendants.
#[derive(Clone, Debug)]
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        let mut children: Vec<NodeId> = self.doc.children(node).collect();
        children.reverse();
        self.stack.extend(children);
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SVG: &str = "<svg xmlns='http://www.w3.org/2000/svg'>\
        <rect id='r1' width='10' height='10'/>\
        <g><circle id='c1' r='5'/></g>\
    </svg>";

    #[test]
    fn id_lookup() {
        let doc = Document::parse_str(SVG).unwrap();
        let rect = doc.element_by_id("r1").unwrap();
        assert_eq!(doc.tag_name(rect), Some("rect"));
        assert_eq!(doc.attribute(rect, "width"), Some("10"));
        assert!(doc.element_by_id("nope").is_none());
    }

    #[test]
    fn attribute_patching() {
        let mut doc = Document::parse_str(SVG).unwrap();
        let rect = doc.element_by_id("r1").unwrap();

        doc.set_attribute(rect, "stroke", "black");
        assert_eq!(doc.attribute(rect, "stroke"), Some("black"));

        doc.set_attribute(rect, "stroke", "red");
        assert_eq!(doc.attribute(rect, "stroke"), Some("red"));

        doc.remove_attribute(rect, "stroke");
        assert!(!doc.has_attribute(rect, "stroke"));
    }

    #[test]
    fn prepend_and_detach() {
        let mut doc = Document::parse_str(SVG).unwrap();
        let svg = doc.root_element();

        let defs = doc.prepend_element(svg, "defs");
        assert_eq!(doc.first_element_child(svg), Some(defs));

        let pattern = doc.append_element(defs, "pattern");
        doc.set_attribute(pattern, "id", "pattern-r1");
        assert_eq!(doc.element_by_id("pattern-r1"), Some(pattern));

        doc.detach(pattern);
        assert!(doc.element_by_id("pattern-r1").is_none());
        assert!(!doc.has_children(defs));
    }

    #[test]
    fn detach_middle_child() {
        let mut doc = Document::parse_str(
            "<svg xmlns='http://www.w3.org/2000/svg'>\
             <rect id='a'/><rect id='b'/><rect id='c'/></svg>",
        )
        .unwrap();
        let b = doc.element_by_id("b").unwrap();
        doc.detach(b);

        let svg = doc.root_element();
        let ids: Vec<_> = doc
            .children(svg)
            .filter_map(|n| doc.attribute(n, "id"))
            .collect();
        assert_eq!(ids, ["a", "c"]);
    }

    #[test]
    fn descendants_are_pre_order() {
        let doc = Document::parse_str(SVG).unwrap();
        let tags: Vec<_> = doc
            .descendants(doc.root())
            .filter_map(|n| doc.tag_name(n))
            .collect();
        assert_eq!(tags, ["svg", "rect", "g", "circle"]);
    }
}
