// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::HashMap;

use svgtypes::{PathParser, PathSegment};

/// A tactile classification tag.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ClassTag {
    /// A stroked, open geometry.
    Line,
    /// A line carrying a dash pattern.
    DashedLine,
    /// A closed, fillable geometry.
    Shape,
    /// A textual label.
    Label,
}

impl ClassTag {
    /// All tags in their canonical matching order.
    pub const ALL: [ClassTag; 4] = [
        ClassTag::Line,
        ClassTag::DashedLine,
        ClassTag::Shape,
        ClassTag::Label,
    ];

    /// Returns the tag name used in reports.
    pub fn to_str(self) -> &'static str {
        match self {
            ClassTag::Line => "line",
            ClassTag::DashedLine => "dashed_line",
            ClassTag::Shape => "shape",
            ClassTag::Label => "label",
        }
    }
}

/// A set of classification tags.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct TagSet {
    /// The element reads as a line.
    pub line: bool,
    /// The element reads as a dashed line.
    pub dashed_line: bool,
    /// The element reads as a closed shape.
    pub shape: bool,
    /// The element reads as a label.
    pub label: bool,
}

impl TagSet {
    /// Checks if no tag is set.
    pub fn is_empty(&self) -> bool {
        !(self.line || self.dashed_line || self.shape || self.label)
    }

    /// Checks if a tag is present.
    pub fn contains(&self, tag: ClassTag) -> bool {
        match tag {
            ClassTag::Line => self.line,
            ClassTag::DashedLine => self.dashed_line,
            ClassTag::Shape => self.shape,
            ClassTag::Label => self.label,
        }
    }

    /// Returns the present tags in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = ClassTag> + '_ {
        ClassTag::ALL.into_iter().filter(|&t| self.contains(t))
    }
}

impl std::fmt::Display for TagSet {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut first = true;
        for tag in self.iter() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}", tag.to_str())?;
            first = false;
        }
        Ok(())
    }
}

/// Classifies an element by its tag name and attributes.
///
/// Deterministic and order-independent: the result is a pure function of
/// the inputs. Unclassified tag names produce an empty set.
pub fn classify(tag: &str, attributes: &HashMap<String, String>) -> TagSet {
    let mut set = TagSet::default();

    match tag {
        "line" => {
            set.line = true;
            if attributes
                .get("stroke-dasharray")
                .map(|v| !v.trim().is_empty())
                .unwrap_or(false)
            {
                set.dashed_line = true;
            }
        }
        "rect" | "circle" | "polygon" => set.shape = true,
        "text" => set.label = true,
        "path" => {
            let fill = attributes
                .get("fill")
                .map(|v| v.trim().to_ascii_lowercase())
                .unwrap_or_default();
            let has_fill = !fill.is_empty() && fill != "none";

            let d = attributes.get("d").map(String::as_str).unwrap_or("");
            if has_fill || path_is_closed(d) {
                set.shape = true;
            } else if attributes
                .get("stroke")
                .map(|v| !v.is_empty() && v != "none")
                .unwrap_or(false)
            {
                set.line = true;
            } else {
                set.shape = true;
            }
        }
        _ => {}
    }

    set
}

/// Checks whether the last command of a path closes it.
fn path_is_closed(d: &str) -> bool {
    let mut last = None;
    for segment in PathParser::from(d) {
        match segment {
            Ok(s) => last = Some(s),
            Err(_) => break,
        }
    }

    matches!(last, Some(PathSegment::ClosePath { .. }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|&(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn dashed_line() {
        let set = classify("line", &attrs(&[("stroke-dasharray", "4,4")]));
        assert!(set.line && set.dashed_line);
        assert!(!set.shape && !set.label);
    }

    #[test]
    fn blank_dasharray_is_not_dashed() {
        let set = classify("line", &attrs(&[("stroke-dasharray", "  ")]));
        assert!(set.line);
        assert!(!set.dashed_line);
    }

    #[test]
    fn basic_shapes_and_labels() {
        assert!(classify("rect", &attrs(&[])).shape);
        assert!(classify("circle", &attrs(&[])).shape);
        assert!(classify("polygon", &attrs(&[])).shape);
        assert!(classify("text", &attrs(&[])).label);
    }

    #[test]
    fn unknown_tags_are_unclassified() {
        assert!(classify("ellipse", &attrs(&[])).is_empty());
        assert!(classify("g", &attrs(&[])).is_empty());
    }

    #[test]
    fn closed_path_beats_stroke() {
        // A closed path is a shape even when stroked and fill-less.
        let set = classify(
            "path",
            &attrs(&[("d", "M0,0 L10,0 L10,10 Z"), ("fill", "none"), ("stroke", "black")]),
        );
        assert!(set.shape);
        assert!(!set.line);
    }

    #[test]
    fn open_stroked_path_is_a_line() {
        let set = classify(
            "path",
            &attrs(&[("d", "M0,0 L10,0"), ("stroke", "black")]),
        );
        assert!(set.line);
        assert!(!set.shape);
    }

    #[test]
    fn bare_path_defaults_to_shape() {
        let set = classify("path", &attrs(&[("d", "M0,0 L10,0")]));
        assert!(set.shape);
    }

    #[test]
    fn filled_path_is_a_shape() {
        let set = classify("path", &attrs(&[("d", "M0,0 L10,0"), ("fill", " RED ")]));
        assert!(set.shape);
    }

    #[test]
    fn classification_is_deterministic() {
        let a = attrs(&[("d", "M0,0 L5,5 Z"), ("stroke", "red")]);
        assert_eq!(classify("path", &a), classify("path", &a));
    }
}
