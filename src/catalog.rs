// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use serde::Deserialize;

use crate::classify::{ClassTag, TagSet};

/// The default rule catalog bundled with the crate.
const DEFAULT_RULES: &str = include_str!("../data/tactile_rules.json");

/// A single compliance rule.
#[derive(Clone, Deserialize, Debug)]
pub struct RuleEntry {
    /// Human-readable rule text.
    pub rule: String,
}

#[derive(Clone, Default, Deserialize, Debug)]
struct LinesSection {
    #[serde(default)]
    primary_lines: Vec<RuleEntry>,
    #[serde(default)]
    secondary_lines: Vec<RuleEntry>,
}

#[derive(Clone, Default, Deserialize, Debug)]
struct ShapesSection {
    #[serde(default)]
    simple_geometric_shapes: Vec<RuleEntry>,
}

/// A static catalog of tactile compliance rules.
///
/// Read-only after loading. Maps each classification tag to an ordered
/// list of rules; bucket order is part of the catalog and is preserved
/// everywhere downstream.
#[derive(Clone, Default, Deserialize, Debug)]
pub struct RuleCatalog {
    #[serde(default)]
    lines: LinesSection,
    #[serde(default)]
    shapes: ShapesSection,
    #[serde(default)]
    keys_and_labels: Vec<RuleEntry>,
}

impl RuleCatalog {
    /// Parses a catalog from JSON text.
    pub fn from_json(text: &str) -> Result<RuleCatalog, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Returns the catalog bundled with the crate.
    pub fn bundled() -> RuleCatalog {
        // `unwrap` is safe, because the bundled catalog is a compile-time asset.
        serde_json::from_str(DEFAULT_RULES).unwrap()
    }

    /// Returns the rule bucket for a classification tag, in catalog order.
    pub fn bucket(&self, tag: ClassTag) -> &[RuleEntry] {
        match tag {
            ClassTag::Line => &self.lines.primary_lines,
            ClassTag::DashedLine => &self.lines.secondary_lines,
            ClassTag::Shape => &self.shapes.simple_geometric_shapes,
            ClassTag::Label => &self.keys_and_labels,
        }
    }
}

/// Collects the local issues for a tag set.
///
/// For each tag present, in the fixed order `line, dashed_line, shape,
/// label`, appends every rule from the corresponding bucket, preserving
/// catalog order. Nothing is deduplicated here; that happens when local
/// issues are merged with augmented ones.
pub fn match_rules(tags: TagSet, catalog: &RuleCatalog) -> Vec<String> {
    let mut issues = Vec::new();
    for tag in tags.iter() {
        for entry in catalog.bucket(tag) {
            issues.push(entry.rule.clone());
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_catalog() -> RuleCatalog {
        RuleCatalog::from_json(
            r#"{
                "lines": {
                    "primary_lines": [{ "rule": "L1" }, { "rule": "L2" }],
                    "secondary_lines": [{ "rule": "D1" }]
                },
                "shapes": {
                    "simple_geometric_shapes": [{ "rule": "S1" }]
                },
                "keys_and_labels": [{ "rule": "K1" }]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn bundled_catalog_is_valid() {
        let catalog = RuleCatalog::bundled();
        assert!(!catalog.bucket(ClassTag::Line).is_empty());
        assert!(!catalog.bucket(ClassTag::DashedLine).is_empty());
        assert!(!catalog.bucket(ClassTag::Shape).is_empty());
        assert!(!catalog.bucket(ClassTag::Label).is_empty());
    }

    #[test]
    fn buckets_append_in_fixed_tag_order() {
        let catalog = test_catalog();
        let tags = TagSet {
            line: true,
            dashed_line: true,
            ..TagSet::default()
        };
        assert_eq!(match_rules(tags, &catalog), ["L1", "L2", "D1"]);
    }

    #[test]
    fn empty_tag_set_matches_nothing() {
        let catalog = test_catalog();
        assert!(match_rules(TagSet::default(), &catalog).is_empty());
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let catalog = RuleCatalog::from_json("{}").unwrap();
        for tag in ClassTag::ALL {
            assert!(catalog.bucket(tag).is_empty());
        }
    }
}
