// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Non-destructive transformation operations over the working document.
//!
//! Every operation is an independent per-element patch: it locates its
//! target by id and silently does nothing when the id is absent.
//! Reverting operations copy attributes from the original document,
//! never from global defaults.

use std::collections::HashMap;

use mutsvgtree::{Document, NodeId};

/// Tags that take part in outline passes.
///
/// The set of renderable geometry: everything that can carry a stroke.
pub const OUTLINE_TAGS: &[&str] = &[
    "path", "rect", "circle", "ellipse", "polygon", "line", "polyline",
];

/// The class token used to highlight the element under review.
pub const HIGHLIGHT_CLASS: &str = "tactile-highlight";

// Empirical tile-geometry ratios, not normative; see DESIGN.md.
const DOT_RADIUS_DIVISOR: f64 = 10.0;
const STRIPE_HEIGHT_DIVISOR: f64 = 5.0;
const CROSSHATCH_STROKE_WIDTH: f64 = 1.0;

const SECONDARY_DASH: &str = "5,5";
const DOTTED_DASH: &str = "2,2";

/// A synthesized tileable fill.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PatternKind {
    /// A centered dot per tile.
    Dotted,
    /// A horizontal band per tile.
    Stripes,
    /// One quadratic arc per tile.
    Waves,
    /// Two diagonals, corner to corner.
    Crosshatch,
}

impl PatternKind {
    /// Returns the kind's name.
    pub fn to_str(self) -> &'static str {
        match self {
            PatternKind::Dotted => "dotted",
            PatternKind::Stripes => "stripes",
            PatternKind::Waves => "waves",
            PatternKind::Crosshatch => "crosshatch",
        }
    }
}

impl std::str::FromStr for PatternKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dotted" => Ok(PatternKind::Dotted),
            "stripes" => Ok(PatternKind::Stripes),
            "waves" => Ok(PatternKind::Waves),
            "crosshatch" => Ok(PatternKind::Crosshatch),
            _ => Err(format!("invalid pattern kind: '{}'", s)),
        }
    }
}

/// A line restyling preset.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LineStyle {
    /// Restore stroke, dash array and width from the original document.
    Original,
    /// A solid line.
    Primary,
    /// A medium dash pattern.
    Secondary,
    /// A fine dash pattern.
    Dotted,
}

impl std::str::FromStr for LineStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "original" => Ok(LineStyle::Original),
            "primary" => Ok(LineStyle::Primary),
            "secondary" => Ok(LineStyle::Secondary),
            "dotted" => Ok(LineStyle::Dotted),
            _ => Err(format!("invalid line style: '{}'", s)),
        }
    }
}

/// A registered pattern fill for one element.
#[derive(Clone, Copy, Debug)]
pub struct PatternDefinition {
    /// The pattern's kind.
    pub kind: PatternKind,
    /// The pattern's tile size.
    pub tile_size: f64,
    /// The `<pattern>` node inside the working document.
    node: NodeId,
}

/// Per-element pattern registry, keyed by element id.
pub type PatternRegistry = HashMap<String, PatternDefinition>;

/// Outlines every stroke-less geometry element.
///
/// Elements that already carry a usable stroke are untouched, which
/// makes repeated calls idempotent.
pub fn apply_global_outline(doc: &mut Document, thickness: f64) {
    let nodes: Vec<NodeId> = doc.descendants(doc.root()).collect();
    for node in nodes {
        let is_geometry = doc
            .tag_name(node)
            .map(|t| OUTLINE_TAGS.contains(&t))
            .unwrap_or(false);
        if !is_geometry {
            continue;
        }

        let missing = match doc.attribute(node, "stroke") {
            None => true,
            Some(v) => v.is_empty() || v.eq_ignore_ascii_case("none"),
        };
        if missing {
            doc.set_attribute(node, "stroke", "black");
            doc.set_attribute(node, "stroke-width", thickness.to_string());
        }
    }
}

/// Overwrites the stroke width of every visibly stroked geometry element.
///
/// Elements without a stroke, or with stroke `none`, are unaffected.
pub fn set_global_outline_thickness(doc: &mut Document, value: f64) {
    let nodes: Vec<NodeId> = doc.descendants(doc.root()).collect();
    for node in nodes {
        let is_geometry = doc
            .tag_name(node)
            .map(|t| OUTLINE_TAGS.contains(&t))
            .unwrap_or(false);
        if !is_geometry {
            continue;
        }

        let stroked = match doc.attribute(node, "stroke") {
            None => false,
            Some(v) => !v.is_empty() && !v.eq_ignore_ascii_case("none"),
        };
        if stroked {
            doc.set_attribute(node, "stroke-width", value.to_string());
        }
    }
}

/// Overwrites the stroke width of exactly one element.
pub fn set_element_line_thickness(doc: &mut Document, id: &str, value: f64) {
    if let Some(node) = doc.element_by_id(id) {
        doc.set_attribute(node, "stroke-width", value.to_string());
    }
}

/// Restyles one element's line.
pub fn set_element_line_style(
    working: &mut Document,
    original: &Document,
    id: &str,
    style: LineStyle,
    default_thickness: f64,
) {
    let node = match working.element_by_id(id) {
        Some(n) => n,
        None => return,
    };

    match style {
        LineStyle::Original => {
            let orig = match original.element_by_id(id) {
                Some(n) => n,
                None => return,
            };

            let stroke = original.attribute(orig, "stroke").unwrap_or("black").to_string();
            working.set_attribute(node, "stroke", stroke);

            match original.attribute(orig, "stroke-dasharray") {
                Some(dash) => {
                    let dash = dash.to_string();
                    working.set_attribute(node, "stroke-dasharray", dash);
                }
                None => working.remove_attribute(node, "stroke-dasharray"),
            }

            let width = original
                .attribute(orig, "stroke-width")
                .map(str::to_string)
                .unwrap_or_else(|| default_thickness.to_string());
            working.set_attribute(node, "stroke-width", width);
        }
        LineStyle::Primary => {
            working.remove_attribute(node, "stroke-dasharray");
            ensure_stroke_defaults(working, node, default_thickness);
        }
        LineStyle::Secondary => {
            working.set_attribute(node, "stroke-dasharray", SECONDARY_DASH);
            ensure_stroke_defaults(working, node, default_thickness);
        }
        LineStyle::Dotted => {
            working.set_attribute(node, "stroke-dasharray", DOTTED_DASH);
            ensure_stroke_defaults(working, node, default_thickness);
        }
    }
}

fn ensure_stroke_defaults(doc: &mut Document, node: NodeId, default_thickness: f64) {
    let missing = match doc.attribute(node, "stroke") {
        None => true,
        Some(v) => v.is_empty() || v == "none",
    };
    if missing {
        doc.set_attribute(node, "stroke", "black");
    }
    if !doc.has_attribute(node, "stroke-width") {
        doc.set_attribute(node, "stroke-width", default_thickness.to_string());
    }
}

/// Fills one element with a synthesized pattern.
///
/// Any prior pattern for the same id is replaced. The element's fill is
/// pointed at the pattern and its stroke is forced to black at the
/// default thickness so the shape's boundary stays readable.
pub fn apply_pattern_fill(
    working: &mut Document,
    patterns: &mut PatternRegistry,
    id: &str,
    kind: PatternKind,
    tile_size: f64,
    default_thickness: f64,
) {
    let node = match working.element_by_id(id) {
        Some(n) => n,
        None => return,
    };

    if let Some(prev) = patterns.remove(id) {
        working.detach(prev.node);
    }

    let defs = ensure_defs(working);
    let pattern_node = build_pattern(working, defs, id, kind, tile_size);
    patterns.insert(
        id.to_string(),
        PatternDefinition {
            kind,
            tile_size,
            node: pattern_node,
        },
    );

    working.set_attribute(node, "fill", format!("url(#pattern-{})", id));
    working.set_attribute(node, "stroke", "black");
    working.set_attribute(node, "stroke-width", default_thickness.to_string());
}

/// Restores one element's fill from the original document.
///
/// The stroke is untouched. The element's pattern, when any, is
/// unregistered and its `<pattern>` node removed.
pub fn remove_pattern_fill(
    working: &mut Document,
    original: &Document,
    patterns: &mut PatternRegistry,
    id: &str,
) {
    let node = match working.element_by_id(id) {
        Some(n) => n,
        None => return,
    };

    let fill = original
        .element_by_id(id)
        .and_then(|n| original.attribute(n, "fill"))
        .unwrap_or("none")
        .to_string();
    working.set_attribute(node, "fill", fill);

    if let Some(def) = patterns.remove(id) {
        working.detach(def.node);
    }
}

/// Resizes one element's existing pattern. No-op without a pattern.
pub fn set_element_pattern_tile_size(
    working: &mut Document,
    patterns: &mut PatternRegistry,
    id: &str,
    size: f64,
) {
    if let Some(def) = patterns.get_mut(id) {
        def.tile_size = size;
        resize_pattern_node(working, def.node, def.kind, size);
    }
}

/// Resizes every existing pattern to the same tile size.
pub fn set_global_pattern_tile_size(
    working: &mut Document,
    patterns: &mut PatternRegistry,
    size: f64,
) {
    for def in patterns.values_mut() {
        def.tile_size = size;
        resize_pattern_node(working, def.node, def.kind, size);
    }
}

/// Toggles the review highlight on one element.
///
/// Other class tokens on the element are preserved.
pub fn set_highlight(doc: &mut Document, id: &str, on: bool) {
    let node = match doc.element_by_id(id) {
        Some(n) => n,
        None => return,
    };

    let mut classes: Vec<String> = doc
        .attribute(node, "class")
        .map(|v| {
            v.split_whitespace()
                .filter(|c| *c != HIGHLIGHT_CLASS)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    if on {
        classes.push(HIGHLIGHT_CLASS.to_string());
    }

    if classes.is_empty() {
        doc.remove_attribute(node, "class");
    } else {
        doc.set_attribute(node, "class", classes.join(" "));
    }
}

fn ensure_defs(doc: &mut Document) -> NodeId {
    let root = doc.root_element();
    let defs = doc
        .children(root)
        .find(|&n| doc.tag_name(n) == Some("defs"));
    match defs {
        Some(n) => n,
        None => doc.prepend_element(root, "defs"),
    }
}

fn build_pattern(
    doc: &mut Document,
    defs: NodeId,
    id: &str,
    kind: PatternKind,
    size: f64,
) -> NodeId {
    let pattern = doc.append_element(defs, "pattern");
    doc.set_attribute(pattern, "id", format!("pattern-{}", id));
    doc.set_attribute(pattern, "patternUnits", "userSpaceOnUse");
    doc.set_attribute(pattern, "width", size.to_string());
    doc.set_attribute(pattern, "height", size.to_string());
    write_tile_geometry(doc, pattern, kind, size);
    pattern
}

fn resize_pattern_node(doc: &mut Document, pattern: NodeId, kind: PatternKind, size: f64) {
    doc.set_attribute(pattern, "width", size.to_string());
    doc.set_attribute(pattern, "height", size.to_string());
    doc.clear_children(pattern);
    write_tile_geometry(doc, pattern, kind, size);
}

/// Synthesizes one tile's geometry. Pure in the tile size.
fn write_tile_geometry(doc: &mut Document, pattern: NodeId, kind: PatternKind, size: f64) {
    match kind {
        PatternKind::Dotted => {
            let circle = doc.append_element(pattern, "circle");
            doc.set_attribute(circle, "cx", (size / 2.0).to_string());
            doc.set_attribute(circle, "cy", (size / 2.0).to_string());
            doc.set_attribute(circle, "r", (size / DOT_RADIUS_DIVISOR).to_string());
            doc.set_attribute(circle, "fill", "black");
        }
        PatternKind::Stripes => {
            let rect = doc.append_element(pattern, "rect");
            doc.set_attribute(rect, "x", "0");
            doc.set_attribute(rect, "y", "0");
            doc.set_attribute(rect, "width", size.to_string());
            doc.set_attribute(rect, "height", (size / STRIPE_HEIGHT_DIVISOR).to_string());
            doc.set_attribute(rect, "fill", "black");
        }
        PatternKind::Waves => {
            let path = doc.append_element(pattern, "path");
            let half = size / 2.0;
            doc.set_attribute(
                path,
                "d",
                format!(
                    "M0,{half} Q{half},0 {size},{half} L{size},{size} L0,{size} Z",
                    half = half,
                    size = size,
                ),
            );
            doc.set_attribute(path, "fill", "black");
        }
        PatternKind::Crosshatch => {
            let down = doc.append_element(pattern, "line");
            doc.set_attribute(down, "x1", "0");
            doc.set_attribute(down, "y1", "0");
            doc.set_attribute(down, "x2", size.to_string());
            doc.set_attribute(down, "y2", size.to_string());
            doc.set_attribute(down, "stroke", "black");
            doc.set_attribute(down, "stroke-width", CROSSHATCH_STROKE_WIDTH.to_string());

            let up = doc.append_element(pattern, "line");
            doc.set_attribute(up, "x1", size.to_string());
            doc.set_attribute(up, "y1", "0");
            doc.set_attribute(up, "x2", "0");
            doc.set_attribute(up, "y2", size.to_string());
            doc.set_attribute(up, "stroke", "black");
            doc.set_attribute(up, "stroke-width", CROSSHATCH_STROKE_WIDTH.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Document {
        Document::parse_str(text).unwrap()
    }

    const SVG: &str = "<svg xmlns='http://www.w3.org/2000/svg'>\
        <path id='p1' d='M0,0 L10,0 L10,10 Z' fill='none' stroke='black'/>\
        <line id='l1' stroke='none'/>\
        <rect id='r1' width='10' height='10'/>\
    </svg>";

    #[test]
    fn global_outline_skips_stroked_elements() {
        let mut d = doc(SVG);
        apply_global_outline(&mut d, 1.0);

        let p1 = d.element_by_id("p1").unwrap();
        let l1 = d.element_by_id("l1").unwrap();
        let r1 = d.element_by_id("r1").unwrap();
        // `p1` already had a stroke; `l1` had `none`; `r1` had nothing.
        assert!(!d.has_attribute(p1, "stroke-width"));
        assert_eq!(d.attribute(l1, "stroke"), Some("black"));
        assert_eq!(d.attribute(r1, "stroke"), Some("black"));
        assert_eq!(d.attribute(r1, "stroke-width"), Some("1"));
    }

    #[test]
    fn global_outline_is_idempotent() {
        let mut d = doc(SVG);
        apply_global_outline(&mut d, 1.0);
        let opt = mutsvgtree::xmlwriter::Options::default();
        let once = d.to_string(opt);
        apply_global_outline(&mut d, 1.0);
        assert_eq!(d.to_string(opt), once);
    }

    #[test]
    fn global_thickness_only_touches_visible_strokes() {
        let mut d = doc(SVG);
        set_global_outline_thickness(&mut d, 3.0);

        let p1 = d.element_by_id("p1").unwrap();
        let l1 = d.element_by_id("l1").unwrap();
        let r1 = d.element_by_id("r1").unwrap();
        assert_eq!(d.attribute(p1, "stroke-width"), Some("3"));
        assert!(!d.has_attribute(l1, "stroke-width"));
        assert!(!d.has_attribute(r1, "stroke-width"));
    }

    #[test]
    fn pattern_fill_builds_defs_and_references_them() {
        let mut d = doc(SVG);
        let mut patterns = PatternRegistry::new();
        apply_pattern_fill(&mut d, &mut patterns, "p1", PatternKind::Stripes, 20.0, 1.0);

        let p1 = d.element_by_id("p1").unwrap();
        assert_eq!(d.attribute(p1, "fill"), Some("url(#pattern-p1)"));
        assert_eq!(d.attribute(p1, "stroke"), Some("black"));

        let pattern = d.element_by_id("pattern-p1").unwrap();
        assert_eq!(d.attribute(pattern, "width"), Some("20"));
        let stripe = d.first_child(pattern).unwrap();
        assert_eq!(d.tag_name(stripe), Some("rect"));
        assert_eq!(d.attribute(stripe, "height"), Some("4"));

        // defs is prepended before any graphics content.
        let svg = d.root_element();
        assert_eq!(d.tag_name(d.first_element_child(svg).unwrap()), Some("defs"));
    }

    #[test]
    fn pattern_fill_replaces_prior_pattern() {
        let mut d = doc(SVG);
        let mut patterns = PatternRegistry::new();
        apply_pattern_fill(&mut d, &mut patterns, "p1", PatternKind::Dotted, 20.0, 1.0);
        apply_pattern_fill(&mut d, &mut patterns, "p1", PatternKind::Waves, 20.0, 1.0);

        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns.get("p1").unwrap().kind, PatternKind::Waves);

        let defs = d
            .children(d.root_element())
            .find(|&n| d.tag_name(n) == Some("defs"))
            .unwrap();
        assert_eq!(d.children(defs).count(), 1);
    }

    #[test]
    fn remove_pattern_restores_original_fill() {
        let mut d = doc(SVG);
        let original = d.clone();
        let mut patterns = PatternRegistry::new();

        apply_pattern_fill(&mut d, &mut patterns, "p1", PatternKind::Dotted, 20.0, 1.0);
        apply_pattern_fill(&mut d, &mut patterns, "r1", PatternKind::Stripes, 20.0, 1.0);
        remove_pattern_fill(&mut d, &original, &mut patterns, "p1");

        let p1 = d.element_by_id("p1").unwrap();
        assert_eq!(d.attribute(p1, "fill"), Some("none"));
        // The stroke forced by the pattern pass stays.
        assert_eq!(d.attribute(p1, "stroke"), Some("black"));
        assert!(patterns.get("p1").is_none());
        assert!(d.element_by_id("pattern-p1").is_none());

        // `r1` had no fill in the original.
        remove_pattern_fill(&mut d, &original, &mut patterns, "r1");
        let r1 = d.element_by_id("r1").unwrap();
        assert_eq!(d.attribute(r1, "fill"), Some("none"));
    }

    #[test]
    fn global_tile_size_resizes_every_pattern() {
        let mut d = doc(SVG);
        let mut patterns = PatternRegistry::new();
        apply_pattern_fill(&mut d, &mut patterns, "p1", PatternKind::Dotted, 20.0, 1.0);
        apply_pattern_fill(&mut d, &mut patterns, "r1", PatternKind::Crosshatch, 20.0, 1.0);

        set_global_pattern_tile_size(&mut d, &mut patterns, 40.0);

        for id in ["pattern-p1", "pattern-r1"] {
            let node = d.element_by_id(id).unwrap();
            assert_eq!(d.attribute(node, "width"), Some("40"));
            assert_eq!(d.attribute(node, "height"), Some("40"));
        }
        let dot = d.first_child(d.element_by_id("pattern-p1").unwrap()).unwrap();
        assert_eq!(d.attribute(dot, "r"), Some("4"));
    }

    #[test]
    fn element_tile_size_requires_a_pattern() {
        let mut d = doc(SVG);
        let mut patterns = PatternRegistry::new();
        set_element_pattern_tile_size(&mut d, &mut patterns, "p1", 50.0);
        assert!(patterns.is_empty());

        apply_pattern_fill(&mut d, &mut patterns, "p1", PatternKind::Waves, 20.0, 1.0);
        set_element_pattern_tile_size(&mut d, &mut patterns, "p1", 50.0);
        assert_eq!(patterns.get("p1").unwrap().tile_size, 50.0);

        let pattern = d.element_by_id("pattern-p1").unwrap();
        let wave = d.first_child(pattern).unwrap();
        assert_eq!(
            d.attribute(wave, "d"),
            Some("M0,25 Q25,0 50,25 L50,50 L0,50 Z")
        );
    }

    #[test]
    fn line_style_presets_and_revert() {
        let mut d = doc(
            "<svg xmlns='http://www.w3.org/2000/svg'>\
             <line id='l1' stroke='red' stroke-dasharray='4,4' stroke-width='2'/></svg>",
        );
        let original = d.clone();

        set_element_line_style(&mut d, &original, "l1", LineStyle::Primary, 1.0);
        let l1 = d.element_by_id("l1").unwrap();
        assert!(!d.has_attribute(l1, "stroke-dasharray"));
        assert_eq!(d.attribute(l1, "stroke"), Some("red"));

        set_element_line_style(&mut d, &original, "l1", LineStyle::Dotted, 1.0);
        assert_eq!(d.attribute(l1, "stroke-dasharray"), Some("2,2"));

        set_element_line_style(&mut d, &original, "l1", LineStyle::Original, 1.0);
        assert_eq!(d.attribute(l1, "stroke-dasharray"), Some("4,4"));
        assert_eq!(d.attribute(l1, "stroke"), Some("red"));
        assert_eq!(d.attribute(l1, "stroke-width"), Some("2"));
    }

    #[test]
    fn line_style_defaults_for_bare_elements() {
        let mut d = doc("<svg xmlns='http://www.w3.org/2000/svg'><line id='l1'/></svg>");
        let original = d.clone();

        set_element_line_style(&mut d, &original, "l1", LineStyle::Secondary, 2.5);
        let l1 = d.element_by_id("l1").unwrap();
        assert_eq!(d.attribute(l1, "stroke-dasharray"), Some("5,5"));
        assert_eq!(d.attribute(l1, "stroke"), Some("black"));
        assert_eq!(d.attribute(l1, "stroke-width"), Some("2.5"));
    }

    #[test]
    fn unknown_ids_are_silent_noops() {
        let mut d = doc(SVG);
        let original = d.clone();
        let mut patterns = PatternRegistry::new();
        let before = d.to_string(mutsvgtree::xmlwriter::Options::default());

        set_element_line_thickness(&mut d, "ghost", 5.0);
        set_element_line_style(&mut d, &original, "ghost", LineStyle::Dotted, 1.0);
        apply_pattern_fill(&mut d, &mut patterns, "ghost", PatternKind::Dotted, 20.0, 1.0);
        remove_pattern_fill(&mut d, &original, &mut patterns, "ghost");

        assert_eq!(d.to_string(mutsvgtree::xmlwriter::Options::default()), before);
        assert!(patterns.is_empty());
    }

    #[test]
    fn highlight_toggles_and_preserves_classes() {
        let mut d = doc(
            "<svg xmlns='http://www.w3.org/2000/svg'><rect id='r1' class='shape'/></svg>",
        );
        set_highlight(&mut d, "r1", true);
        let r1 = d.element_by_id("r1").unwrap();
        assert_eq!(d.attribute(r1, "class"), Some("shape tactile-highlight"));

        set_highlight(&mut d, "r1", false);
        assert_eq!(d.attribute(r1, "class"), Some("shape"));
    }
}
