// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::HashMap;

use mutsvgtree::Document;

/// A decomposed, addressable element.
#[derive(Clone, Debug)]
pub struct ElementInfo {
    /// The element's tag name.
    pub tag: String,
    /// The element's attributes.
    pub attributes: HashMap<String, String>,
    /// The element's markup as captured at parse time.
    pub snippet: String,
}

/// An id-indexed map over a document's addressable elements.
///
/// Elements without an `id` attribute stay in the tree for rendering but
/// are not indexed: they cannot be classified, reported on or edited.
/// Iteration order is the document's pre-order traversal.
#[derive(Clone, Default, Debug)]
pub struct ElementIndex {
    map: HashMap<String, ElementInfo>,
    order: Vec<String>,
}

impl ElementIndex {
    /// Decomposes a parsed document.
    ///
    /// Duplicate ids resolve last-wins: the later element's data replaces
    /// the earlier one's, keeping the earlier position in the order.
    pub fn decompose(doc: &Document) -> ElementIndex {
        let snippet_opt = snippet_options();

        let mut index = ElementIndex::default();
        for node in doc.descendants(doc.root()) {
            if !doc.is_element(node) {
                continue;
            }
            let id = match doc.attribute(node, "id") {
                Some(id) => id.to_string(),
                None => continue,
            };

            let info = ElementInfo {
                // `unwrap` is safe: the node is known to be an element.
                tag: doc.tag_name(node).unwrap().to_string(),
                attributes: doc
                    .attributes(node)
                    .iter()
                    .map(|a| (a.name.clone(), a.value.clone()))
                    .collect(),
                snippet: doc.subtree_to_string(node, snippet_opt),
            };

            if index.map.insert(id.clone(), info).is_some() {
                log::warn!("Duplicate element id: '{}'. Keeping the last occurrence.", id);
            } else {
                index.order.push(id);
            }
        }

        index
    }

    /// Returns an element by id.
    pub fn get(&self, id: &str) -> Option<&ElementInfo> {
        self.map.get(id)
    }

    /// Returns all indexed ids in decomposition order.
    pub fn ids(&self) -> &[String] {
        &self.order
    }

    /// Returns an iterator over `(id, element)` pairs in decomposition order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ElementInfo)> {
        self.order
            .iter()
            .filter_map(move |id| self.map.get(id).map(|info| (id.as_str(), info)))
    }

    /// Returns the number of addressable elements.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Checks if the document has no addressable elements.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Options used for cached element snippets.
///
/// Compact output: the snippet is embedded into prompts, not shown to
/// humans. Must stay fixed so that re-parsing the same text yields
/// byte-identical snippets.
pub(crate) fn snippet_options() -> mutsvgtree::xmlwriter::Options {
    mutsvgtree::xmlwriter::Options {
        indent: mutsvgtree::xmlwriter::Indent::None,
        ..mutsvgtree::xmlwriter::Options::default()
    }
}
