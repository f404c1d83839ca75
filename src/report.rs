// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::HashMap;

use crate::classify::TagSet;

/// The evaluation outcome for one addressable element.
#[derive(Clone, Debug)]
pub struct Finding {
    /// The element's classification tags.
    pub tags: TagSet,
    /// Issues from the rule matcher, in catalog order.
    pub local_issues: Vec<String>,
    /// Local and augmented issues combined, deduplicated, local first.
    pub issues: Vec<String>,
    /// Suggestion text from the collaborator, when any.
    pub suggestion: Option<String>,
    /// Set when the collaborator call for this element failed and the
    /// finding degraded to local-only issues.
    pub degraded: bool,
}

impl Finding {
    /// Creates a rule-only finding; combined issues start as the local ones.
    pub fn local(tags: TagSet, local_issues: Vec<String>) -> Finding {
        Finding {
            tags,
            issues: local_issues.clone(),
            local_issues,
            suggestion: None,
            degraded: false,
        }
    }

    /// Checks whether this element belongs to the flagged sequence.
    pub fn is_flagged(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Renders the finding as a human-readable evaluation summary.
    pub fn summary(&self) -> String {
        fn list_or_none(items: &[String]) -> String {
            if items.is_empty() {
                "None".to_string()
            } else {
                items.join(", ")
            }
        }

        let tags = if self.tags.is_empty() {
            "None".to_string()
        } else {
            self.tags.to_string()
        };

        format!(
            "Inferred Properties: {}\n\
             Local Rules Applied: {}\n\
             Combined Issues: {}\n\
             Suggestions: {}",
            tags,
            list_or_none(&self.local_issues),
            list_or_none(&self.issues),
            self.suggestion.as_deref().unwrap_or("None"),
        )
    }
}

/// The per-document evaluation report.
///
/// Holds one finding per addressable element plus the flagged sequence:
/// the ids, in decomposition order, whose combined issue list is
/// non-empty. A cyclic cursor walks the flagged sequence for review.
#[derive(Clone, Default, Debug)]
pub struct Report {
    findings: HashMap<String, Finding>,
    order: Vec<String>,
    flagged: Vec<String>,
    cursor: usize,
}

impl Report {
    /// Builds a report from findings in decomposition order.
    pub fn new(entries: Vec<(String, Finding)>) -> Report {
        let mut report = Report::default();
        for (id, finding) in entries {
            report.order.push(id.clone());
            report.findings.insert(id, finding);
        }
        report.recompute_flagged();
        report
    }

    /// Returns the finding for an element.
    pub fn finding(&self, id: &str) -> Option<&Finding> {
        self.findings.get(id)
    }

    /// Replaces the finding for an element and refreshes the flagged
    /// sequence. The cursor is reset.
    pub fn update_finding(&mut self, id: &str, finding: Finding) {
        if let Some(slot) = self.findings.get_mut(id) {
            *slot = finding;
        }
        self.recompute_flagged();
    }

    /// Returns an iterator over `(id, finding)` pairs in decomposition order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Finding)> {
        self.order
            .iter()
            .filter_map(move |id| self.findings.get(id).map(|f| (id.as_str(), f)))
    }

    /// Returns the flagged element ids in decomposition order.
    pub fn flagged(&self) -> &[String] {
        &self.flagged
    }

    /// Returns the id under the cursor, if the flagged sequence is
    /// non-empty.
    pub fn current(&self) -> Option<&str> {
        self.flagged.get(self.cursor).map(String::as_str)
    }

    /// Moves the cursor forward, wrapping around. No-op when nothing is
    /// flagged.
    pub fn next(&mut self) -> Option<&str> {
        if self.flagged.is_empty() {
            return None;
        }
        self.cursor = (self.cursor + 1) % self.flagged.len();
        self.current()
    }

    /// Moves the cursor backward, wrapping around. No-op when nothing is
    /// flagged.
    pub fn previous(&mut self) -> Option<&str> {
        if self.flagged.is_empty() {
            return None;
        }
        self.cursor = (self.cursor + self.flagged.len() - 1) % self.flagged.len();
        self.current()
    }

    /// Returns the cursor position within the flagged sequence.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn recompute_flagged(&mut self) {
        self.flagged = self
            .order
            .iter()
            .filter(|id| {
                self.findings
                    .get(id.as_str())
                    .map(Finding::is_flagged)
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        self.cursor = 0;
    }
}
