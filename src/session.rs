// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use mutsvgtree::Document;

use crate::augment::{self, AugmentOutcome, AugmentRequest, Augmentor};
use crate::catalog::{match_rules, RuleCatalog};
use crate::classify::classify;
use crate::decompose::ElementIndex;
use crate::error::Error;
use crate::options::Options;
use crate::report::{Finding, Report};
use crate::transform::{self, LineStyle, PatternDefinition, PatternKind, PatternRegistry};

const ZOOM_MIN: f64 = 0.1;
const ZOOM_MAX: f64 = 3.0;
const ZOOM_STEP: f64 = 0.1;

/// Which document the caller is looking at.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ViewMode {
    /// The frozen, as-loaded document.
    Original,
    /// The working document under transformation.
    Transformed,
}

/// Session-scoped presentation state.
///
/// One instance per active document; always owned by the [`Session`],
/// never process-global.
#[derive(Clone, Copy, Debug)]
pub struct StyleState {
    /// The current default outline thickness.
    pub outline_thickness: f64,
    /// The current default pattern tile size.
    pub pattern_tile_size: f64,
    /// The current view mode.
    pub view_mode: ViewMode,
    /// The current zoom scale.
    pub zoom: f64,
}

/// An evaluation and transformation session over one document.
///
/// Owns the original/working document pair, the evaluation report and
/// the per-element pattern registry. All state is replaced atomically by
/// [`Session::reload`]; nothing survives across loads.
///
/// Mutations are single-writer by contract: every operation takes
/// `&mut self` and completes before the next one can be issued.
#[derive(Debug)]
pub struct Session {
    original_text: String,
    original: Document,
    working: Document,
    index: ElementIndex,
    report: Report,
    style: StyleState,
    patterns: PatternRegistry,
    options: Options,
    highlighted: Option<String>,
    load_id: u64,
}

impl Session {
    /// Loads a document and evaluates it against the catalog.
    ///
    /// Parses the text, decomposes it into addressable elements,
    /// classifies them, collects local issues and runs the initial
    /// outline pass over a fresh working copy. Augmentation is a
    /// separate, explicitly driven step; see
    /// [`Session::augmentation_requests`].
    pub fn load(text: &str, catalog: &RuleCatalog, options: &Options) -> Result<Session, Error> {
        Session::load_with_id(text, catalog, options, 1)
    }

    /// Replaces this session with a fresh load of `text`.
    ///
    /// On failure the current session stays untouched. On success the
    /// load id is bumped, so augmentation results belonging to the
    /// superseded document can no longer be applied.
    pub fn reload(
        &mut self,
        text: &str,
        catalog: &RuleCatalog,
        options: &Options,
    ) -> Result<(), Error> {
        *self = Session::load_with_id(text, catalog, options, self.load_id + 1)?;
        Ok(())
    }

    fn load_with_id(
        text: &str,
        catalog: &RuleCatalog,
        options: &Options,
        load_id: u64,
    ) -> Result<Session, Error> {
        let original = Document::parse_str(text)?;
        let index = ElementIndex::decompose(&original);

        let mut entries = Vec::with_capacity(index.len());
        for (id, info) in index.iter() {
            let tags = classify(&info.tag, &info.attributes);
            let local_issues = match_rules(tags, catalog);
            entries.push((id.to_string(), Finding::local(tags, local_issues)));
        }
        let report = Report::new(entries);

        let mut working = original.clone();
        transform::apply_global_outline(&mut working, options.outline_thickness);

        Ok(Session {
            original_text: text.to_string(),
            original,
            working,
            index,
            report,
            style: StyleState {
                outline_thickness: options.outline_thickness,
                pattern_tile_size: options.pattern_tile_size,
                view_mode: ViewMode::Transformed,
                zoom: 1.0,
            },
            patterns: PatternRegistry::new(),
            options: options.clone(),
            highlighted: None,
            load_id,
        })
    }

    // ── Augmentation ──────────────────────────────────────────────────

    /// Returns one request per addressable element, plus the load id the
    /// results must be applied under.
    ///
    /// Every element is requested, even those without local issues.
    pub fn augmentation_requests(&self) -> (u64, Vec<AugmentRequest>) {
        let requests = self
            .index
            .iter()
            .map(|(id, info)| AugmentRequest {
                id: id.to_string(),
                snippet: info.snippet.clone(),
                local_issues: self
                    .report
                    .finding(id)
                    .map(|f| f.local_issues.clone())
                    .unwrap_or_default(),
            })
            .collect();
        (self.load_id, requests)
    }

    /// Merges settled augmentation outcomes into the report.
    ///
    /// Outcomes carrying a stale load id are discarded wholesale: late
    /// replies for a superseded document never reach the current report.
    /// Failed outcomes degrade their element to local-only issues plus
    /// the failure-marker suggestion; other elements are unaffected.
    pub fn apply_augmentation(&mut self, load_id: u64, outcomes: Vec<AugmentOutcome>) {
        if load_id != self.load_id {
            log::warn!("Discarding augmentation results for a superseded document.");
            return;
        }

        for outcome in outcomes {
            let finding = match self.report.finding(&outcome.id) {
                Some(f) => f,
                None => continue,
            };

            let updated = match outcome.result {
                Ok(reply) => Finding {
                    tags: finding.tags,
                    issues: augment::merge_issues(&finding.local_issues, &reply.issues),
                    local_issues: finding.local_issues.clone(),
                    suggestion: reply.suggestion,
                    degraded: false,
                },
                Err(e) => {
                    log::warn!("Augmentation failed for '{}': {}", outcome.id, e);
                    Finding {
                        tags: finding.tags,
                        issues: finding.local_issues.clone(),
                        local_issues: finding.local_issues.clone(),
                        suggestion: Some(augment::FAILURE_SUGGESTION.to_string()),
                        degraded: true,
                    }
                }
            };
            self.report.update_finding(&outcome.id, updated);
        }
    }

    /// Runs the full augmentation round: fan out one concurrent request
    /// per element, join after every request settles, merge the results.
    pub async fn augment(&mut self, augmentor: Arc<dyn Augmentor>) {
        let (load_id, requests) = self.augmentation_requests();
        let outcomes =
            augment::augment_all(requests, augmentor, self.options.augment_concurrency).await;
        self.apply_augmentation(load_id, outcomes);
    }

    // ── Transformation operations ─────────────────────────────────────

    /// Updates the default outline thickness and overwrites the stroke
    /// width of every visibly stroked element.
    pub fn set_global_outline_thickness(&mut self, value: f64) {
        if !self.editable() {
            return;
        }
        self.style.outline_thickness = value;
        transform::set_global_outline_thickness(&mut self.working, value);
    }

    /// Overwrites the stroke width of exactly one element.
    pub fn set_element_line_thickness(&mut self, id: &str, value: f64) {
        if !self.editable() {
            return;
        }
        transform::set_element_line_thickness(&mut self.working, id, value);
    }

    /// Restyles one element's line.
    pub fn set_element_line_style(&mut self, id: &str, style: LineStyle) {
        if !self.editable() {
            return;
        }
        transform::set_element_line_style(
            &mut self.working,
            &self.original,
            id,
            style,
            self.style.outline_thickness,
        );
    }

    /// Fills one element with a synthesized pattern.
    ///
    /// Tile size: the element's existing pattern size when it already
    /// has one, the session default otherwise.
    pub fn apply_pattern_fill(&mut self, id: &str, kind: PatternKind) {
        if !self.editable() {
            return;
        }
        let tile_size = self
            .patterns
            .get(id)
            .map(|def| def.tile_size)
            .unwrap_or(self.style.pattern_tile_size);
        transform::apply_pattern_fill(
            &mut self.working,
            &mut self.patterns,
            id,
            kind,
            tile_size,
            self.style.outline_thickness,
        );
    }

    /// Restores one element's fill from the original document.
    pub fn remove_pattern_fill(&mut self, id: &str) {
        if !self.editable() {
            return;
        }
        transform::remove_pattern_fill(&mut self.working, &self.original, &mut self.patterns, id);
    }

    /// Resizes one element's existing pattern.
    pub fn set_element_pattern_tile_size(&mut self, id: &str, size: f64) {
        if !self.editable() {
            return;
        }
        transform::set_element_pattern_tile_size(&mut self.working, &mut self.patterns, id, size);
    }

    /// Updates the default tile size and resizes every existing pattern.
    pub fn set_global_pattern_tile_size(&mut self, size: f64) {
        if !self.editable() {
            return;
        }
        self.style.pattern_tile_size = size;
        transform::set_global_pattern_tile_size(&mut self.working, &mut self.patterns, size);
    }

    fn editable(&self) -> bool {
        self.style.view_mode == ViewMode::Transformed
    }

    // ── View state ────────────────────────────────────────────────────

    /// Returns the current style state.
    pub fn style(&self) -> &StyleState {
        &self.style
    }

    /// Switches the view mode.
    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.style.view_mode = mode;
    }

    /// Toggles between the original and the transformed view.
    pub fn toggle_view_mode(&mut self) {
        self.style.view_mode = match self.style.view_mode {
            ViewMode::Original => ViewMode::Transformed,
            ViewMode::Transformed => ViewMode::Original,
        };
    }

    /// Sets the zoom scale, clamped to the supported range.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.style.zoom = zoom.clamp(ZOOM_MIN, ZOOM_MAX);
    }

    /// Zooms in by one step.
    pub fn zoom_in(&mut self) {
        self.set_zoom(self.style.zoom + ZOOM_STEP);
    }

    /// Zooms out by one step.
    pub fn zoom_out(&mut self) {
        self.set_zoom(self.style.zoom - ZOOM_STEP);
    }

    // ── Navigation ────────────────────────────────────────────────────

    /// Moves the review cursor to the next flagged element and
    /// re-highlights. No-op when nothing is flagged.
    pub fn next_flagged(&mut self) -> Option<String> {
        self.advance(true)
    }

    /// Moves the review cursor to the previous flagged element and
    /// re-highlights. No-op when nothing is flagged.
    pub fn previous_flagged(&mut self) -> Option<String> {
        self.advance(false)
    }

    fn advance(&mut self, forward: bool) -> Option<String> {
        if self.report.flagged().is_empty() {
            return None;
        }

        let id = if forward {
            self.report.next()
        } else {
            self.report.previous()
        }
        .map(str::to_string);

        // The previous highlight is cleared before the new one lands.
        if let Some(prev) = self.highlighted.take() {
            transform::set_highlight(&mut self.working, &prev, false);
        }
        if let Some(ref id) = id {
            transform::set_highlight(&mut self.working, id, true);
            self.highlighted = Some(id.clone());
        }

        id
    }

    // ── Accessors & export ────────────────────────────────────────────

    /// Returns the evaluation report.
    pub fn report(&self) -> &Report {
        &self.report
    }

    /// Returns the decomposed element index.
    pub fn index(&self) -> &ElementIndex {
        &self.index
    }

    /// Returns the registered pattern for an element, when any.
    pub fn pattern(&self, id: &str) -> Option<&PatternDefinition> {
        self.patterns.get(id)
    }

    /// Returns the document text as loaded.
    pub fn original_svg(&self) -> &str {
        &self.original_text
    }

    /// Serializes the working document.
    pub fn transformed_svg(&self) -> String {
        self.working
            .to_string(mutsvgtree::xmlwriter::Options::default())
    }

    /// Returns the document for the current view mode.
    pub fn displayed_svg(&self) -> String {
        match self.style.view_mode {
            ViewMode::Original => self.original_text.clone(),
            ViewMode::Transformed => self.transformed_svg(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::augment::{AugmentOutcome, AugmentReply};

    const SVG: &str = "<svg xmlns='http://www.w3.org/2000/svg'>\
        <line id='l1' stroke-dasharray='4,4'/>\
        <rect id='r1' width='10' height='10'/>\
    </svg>";

    fn session() -> Session {
        Session::load(SVG, &RuleCatalog::bundled(), &Options::default()).unwrap()
    }

    #[test]
    fn load_runs_the_outline_pass() {
        let s = session();
        assert!(s.transformed_svg().contains("stroke=\"black\""));
        assert!(!s.original_svg().contains("black"));
    }

    #[test]
    fn malformed_documents_do_not_load() {
        assert!(Session::load("<svg", &RuleCatalog::bundled(), &Options::default()).is_err());
    }

    #[test]
    fn reload_failure_keeps_the_session() {
        let mut s = session();
        let before = s.transformed_svg();
        assert!(s
            .reload("not svg", &RuleCatalog::bundled(), &Options::default())
            .is_err());
        assert_eq!(s.transformed_svg(), before);
    }

    #[test]
    fn mutations_are_noops_in_original_view() {
        let mut s = session();
        s.set_view_mode(ViewMode::Original);
        let before = s.transformed_svg();

        s.set_global_outline_thickness(9.0);
        s.apply_pattern_fill("r1", PatternKind::Dotted);
        s.set_element_line_thickness("l1", 9.0);

        assert_eq!(s.transformed_svg(), before);
        assert!(s.pattern("r1").is_none());
    }

    #[test]
    fn stale_augmentation_results_are_discarded() {
        let mut s = session();
        let (load_id, _) = s.augmentation_requests();
        s.reload(SVG, &RuleCatalog::bundled(), &Options::default())
            .unwrap();

        s.apply_augmentation(
            load_id,
            vec![AugmentOutcome {
                id: "l1".to_string(),
                result: Ok(AugmentReply {
                    issues: vec!["stale".to_string()],
                    suggestion: None,
                }),
            }],
        );

        let finding = s.report().finding("l1").unwrap();
        assert!(!finding.issues.contains(&"stale".to_string()));
    }

    #[test]
    fn augmentation_requests_cover_every_element() {
        let s = session();
        let (_, requests) = s.augmentation_requests();
        let ids: Vec<_> = requests.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["l1", "r1"]);
        assert!(requests[0].snippet.starts_with("<line"));
    }

    #[test]
    fn navigation_moves_the_highlight() {
        let mut s = session();
        let first = s.next_flagged().unwrap();
        assert!(s.transformed_svg().contains("tactile-highlight"));

        let second = s.next_flagged().unwrap();
        assert_ne!(first, second);
        // Exactly one element is highlighted at a time.
        assert_eq!(s.transformed_svg().matches("tactile-highlight").count(), 1);

        let back = s.previous_flagged().unwrap();
        assert_eq!(back, first);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut s = session();
        s.set_zoom(10.0);
        assert_eq!(s.style().zoom, 3.0);
        for _ in 0..40 {
            s.zoom_out();
        }
        assert!(s.style().zoom >= 0.1);
    }

    #[test]
    fn displayed_svg_follows_the_view_mode() {
        let mut s = session();
        assert!(s.displayed_svg().contains("stroke"));
        s.toggle_view_mode();
        assert_eq!(s.displayed_svg(), SVG);
    }
}
