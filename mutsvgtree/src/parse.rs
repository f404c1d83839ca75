use std::collections::HashMap;

use crate::{Attribute, Document, NodeData, NodeId, NodeKind};

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
const XML_NAMESPACE_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// A document parsing error.
#[derive(Debug)]
pub enum ParseError {
    /// The root element is not `svg`.
    NotAnSvg,

    /// We do not allow SVG with more than 1_000_000 elements for security reasons.
    ElementsLimitReached,

    /// Failed to parse an SVG data.
    ParsingFailed(roxmltree::Error),
}

impl From<roxmltree::Error> for ParseError {
    fn from(e: roxmltree::Error) -> Self {
        ParseError::ParsingFailed(e)
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            ParseError::NotAnSvg => {
                write!(f, "the root element is not an SVG element")
            }
            ParseError::ElementsLimitReached => {
                write!(f, "the maximum number of SVG elements has been reached")
            }
            ParseError::ParsingFailed(ref e) => {
                write!(f, "SVG data parsing failed cause {}", e)
            }
        }
    }
}

impl std::error::Error for ParseError {}

const ELEMENTS_LIMIT: usize = 1_000_000;

impl Document {
    /// Parses a [`Document`] from a string.
    ///
    /// Fails on malformed XML and on documents whose root element
    /// is not `svg`. No partial tree is produced on failure.
    pub fn parse_str(text: &str) -> Result<Document, ParseError> {
        let xml = roxmltree::Document::parse(text)?;
        parse(&xml)
    }
}

fn parse(xml: &roxmltree::Document) -> Result<Document, ParseError> {
    let mut doc = Document {
        nodes: Vec::new(),
        links: HashMap::new(),
    };

    // Add a root node.
    doc.nodes.push(NodeData {
        parent: None,
        next_sibling: None,
        children: None,
        kind: NodeKind::Root,
    });

    let root = doc.root();
    for node in xml.root().children() {
        parse_xml_node(node, root, &mut doc)?;
    }

    // Check that the root element is `svg`.
    match doc.first_element_child(doc.root()) {
        Some(child) if doc.tag_name(child) == Some("svg") => {}
        _ => return Err(ParseError::NotAnSvg),
    }

    // Collect all elements with an `id` attribute. Duplicates resolve
    // last-wins, matching the categorization map downstream.
    let mut links = HashMap::new();
    let ids: Vec<(String, NodeId)> = doc
        .descendants(doc.root())
        .filter_map(|n| doc.attribute(n, "id").map(|v| (v.to_string(), n)))
        .collect();
    for (id, node) in ids {
        if links.insert(id.clone(), node).is_some() {
            log::warn!("Duplicate id attribute: '{}'. Keeping the last occurrence.", id);
        }
    }
    doc.links = links;

    Ok(doc)
}

fn parse_xml_node(
    node: roxmltree::Node,
    parent_id: NodeId,
    doc: &mut Document,
) -> Result<(), ParseError> {
    if doc.nodes.len() > ELEMENTS_LIMIT {
        return Err(ParseError::ElementsLimitReached);
    }

    if node.is_text() {
        if let Some(text) = node.text() {
            doc.append(parent_id, NodeKind::Text(text.to_string()));
        }
        return Ok(());
    }

    if !node.is_element() || node.tag_name().namespace() != Some(SVG_NS) {
        return Ok(());
    }

    let mut attributes = Vec::new();
    for attr in node.attributes() {
        let name = match attr.namespace() {
            None => attr.name().to_string(),
            Some(XLINK_NS) => format!("xlink:{}", attr.name()),
            Some(XML_NAMESPACE_NS) => format!("xml:{}", attr.name()),
            // Attributes from foreign namespaces (editor metadata and alike)
            // are not preserved.
            Some(_) => continue,
        };
        attributes.push(Attribute {
            name,
            value: attr.value().to_string(),
        });
    }

    let node_id = doc.append(
        parent_id,
        NodeKind::Element {
            tag: node.tag_name().name().to_string(),
            attributes,
        },
    );

    for child in node.children() {
        parse_xml_node(child, node_id, doc)?;
    }

    Ok(())
}
