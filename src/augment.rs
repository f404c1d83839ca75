// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Augmentation of rule-based findings through an external generation
//! service.
//!
//! One request per addressable element, all running concurrently and
//! joined after every request has settled. A failed request degrades
//! only that element's finding; it never aborts the join.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// The suggestion recorded when the collaborator call fails.
pub const FAILURE_SUGGESTION: &str = "Augmentation request failed.";

/// List of all augmentation errors.
///
/// Always a per-element soft failure; never fatal for the document.
#[derive(Debug)]
pub enum AugmentError {
    /// The request could not be sent or its reply could not be decoded.
    Http(reqwest::Error),

    /// The collaborator replied with a non-success status code.
    Status(u16),
}

impl std::fmt::Display for AugmentError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            AugmentError::Http(ref e) => {
                write!(f, "augmentation request failed cause {}", e)
            }
            AugmentError::Status(code) => {
                write!(f, "augmentation service replied with status {}", code)
            }
        }
    }
}

impl std::error::Error for AugmentError {}

/// A single per-element augmentation request.
#[derive(Clone, Debug)]
pub struct AugmentRequest {
    /// The element's id.
    pub id: String,
    /// The element's markup as captured at parse time.
    pub snippet: String,
    /// Issues already found by the rule matcher.
    pub local_issues: Vec<String>,
}

/// A parsed collaborator reply.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct AugmentReply {
    /// Additional issues, in reply order.
    pub issues: Vec<String>,
    /// Newline-joined suggestion text, when present.
    pub suggestion: Option<String>,
}

/// The settled result of one element's augmentation.
#[derive(Debug)]
pub struct AugmentOutcome {
    /// The element's id.
    pub id: String,
    /// The parsed reply, or the error that degraded this element.
    pub result: Result<AugmentReply, AugmentError>,
}

/// The external generation collaborator seam.
///
/// Implementations return the collaborator's raw free-text reply;
/// parsing stays on this side of the seam so it can be tested without
/// a network.
#[async_trait]
pub trait Augmentor: Send + Sync {
    /// Evaluates one element, returning the collaborator's raw reply text.
    async fn evaluate(&self, request: &AugmentRequest) -> Result<String, AugmentError>;
}

#[derive(Serialize)]
struct WireRequest<'a> {
    snippet: &'a str,
    prompt: String,
}

#[derive(Deserialize)]
struct WireReply {
    text: String,
}

/// An HTTP JSON implementation of [`Augmentor`].
///
/// Request body: `{"snippet": …, "prompt": …}`.
/// Reply body: `{"text": …}`.
#[derive(Clone, Debug)]
pub struct HttpAugmentor {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAugmentor {
    /// Creates a client for the given endpoint.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<HttpAugmentor, AugmentError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AugmentError::Http)?;

        Ok(HttpAugmentor {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl Augmentor for HttpAugmentor {
    async fn evaluate(&self, request: &AugmentRequest) -> Result<String, AugmentError> {
        let wire = WireRequest {
            snippet: &request.snippet,
            prompt: build_prompt(request),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&wire)
            .send()
            .await
            .map_err(AugmentError::Http)?;

        if !response.status().is_success() {
            return Err(AugmentError::Status(response.status().as_u16()));
        }

        let reply: WireReply = response.json().await.map_err(AugmentError::Http)?;
        Ok(reply.text)
    }
}

/// Builds the evaluation prompt for one element.
pub fn build_prompt(request: &AugmentRequest) -> String {
    let local_issues = if request.local_issues.is_empty() {
        "(None)".to_string()
    } else {
        request.local_issues.join("\n")
    };

    format!(
        "You are an expert in tactile graphics and accessibility.\n\
         Below is an SVG snippet with ID: {id}.\n\
         It has the following local issues found by our rule-based system:\n\
         {local_issues}\n\
         \n\
         Evaluate the snippet for any additional issues or improvements\n\
         the user should know about, from a tactile graphics perspective.\n\
         Then list all issues (local + new) under an 'Issues:' header and\n\
         provide suggestions under a 'Suggestions:' header.\n\
         Keep the evaluation short and concise.\n\
         \n\
         {snippet}",
        id = request.id,
        local_issues = local_issues,
        snippet = request.snippet,
    )
}

/// Parses a collaborator's free-text reply.
///
/// A line starting (case-insensitively) with `issues:` switches to
/// issue-reading mode; `suggestions:` switches to suggestion-reading
/// mode. Header lines themselves are not recorded and switching is
/// re-entrant. Text before the first header is ignored.
pub fn parse_reply(text: &str) -> AugmentReply {
    enum Mode {
        Preamble,
        Issues,
        Suggestions,
    }

    let mut mode = Mode::Preamble;
    let mut issues = Vec::new();
    let mut suggestion_lines: Vec<&str> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        let lower = trimmed.to_ascii_lowercase();

        if lower.starts_with("issues:") {
            mode = Mode::Issues;
            continue;
        }
        if lower.starts_with("suggestions:") {
            mode = Mode::Suggestions;
            continue;
        }
        if trimmed.is_empty() {
            continue;
        }

        match mode {
            Mode::Issues => issues.push(trimmed.to_string()),
            Mode::Suggestions => suggestion_lines.push(trimmed),
            Mode::Preamble => {}
        }
    }

    AugmentReply {
        issues,
        suggestion: if suggestion_lines.is_empty() {
            None
        } else {
            Some(suggestion_lines.join("\n"))
        },
    }
}

/// Merges local and parsed issues.
///
/// Deduplicated by exact string equality, order-preserving: local issues
/// first, new parsed issues appended in first-seen order.
pub fn merge_issues(local: &[String], parsed: &[String]) -> Vec<String> {
    let mut combined = Vec::with_capacity(local.len() + parsed.len());
    for issue in local.iter().chain(parsed.iter()) {
        if !combined.contains(issue) {
            combined.push(issue.clone());
        }
    }

    combined
}

/// Runs one augmentation request per element, concurrently.
///
/// Completes only after every request has settled; a failed request
/// produces an `Err` outcome for its element and nothing else. At most
/// `concurrency` requests are in flight at once.
pub async fn augment_all(
    requests: Vec<AugmentRequest>,
    augmentor: Arc<dyn Augmentor>,
    concurrency: usize,
) -> Vec<AugmentOutcome> {
    let sem = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut join_set: JoinSet<AugmentOutcome> = JoinSet::new();

    for request in requests {
        let sem = sem.clone();
        let augmentor = augmentor.clone();

        join_set.spawn(async move {
            let _permit = sem.acquire().await.expect("semaphore closed");
            let result = augmentor
                .evaluate(&request)
                .await
                .map(|text| parse_reply(&text));

            AugmentOutcome {
                id: request.id,
                result,
            }
        });
    }

    let mut outcomes = Vec::new();
    while let Some(res) = join_set.join_next().await {
        match res {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                // A panicked task loses its element; the join itself
                // must still complete for everyone else.
                log::warn!("augmentation task failed: {}", e);
            }
        }
    }

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_issues_and_suggestions() {
        let reply = parse_reply(
            "Here is my evaluation.\n\
             Issues:\n\
             too thin\n\
             \n\
             no texture\n\
             Suggestions:\n\
             thicken the outline\n\
             add a fill pattern\n",
        );
        assert_eq!(reply.issues, ["too thin", "no texture"]);
        assert_eq!(
            reply.suggestion.as_deref(),
            Some("thicken the outline\nadd a fill pattern")
        );
    }

    #[test]
    fn headers_are_case_insensitive() {
        let reply = parse_reply("ISSUES: \nbad contrast\nSUGGESTIONS:\nfix it\n");
        assert_eq!(reply.issues, ["bad contrast"]);
        assert_eq!(reply.suggestion.as_deref(), Some("fix it"));
    }

    #[test]
    fn switching_is_reentrant() {
        let reply = parse_reply(
            "Issues:\none\nSuggestions:\ndo this\nIssues:\ntwo\n",
        );
        assert_eq!(reply.issues, ["one", "two"]);
        assert_eq!(reply.suggestion.as_deref(), Some("do this"));
    }

    #[test]
    fn text_before_first_header_is_ignored() {
        let reply = parse_reply("preamble line\nanother\n");
        assert!(reply.issues.is_empty());
        assert!(reply.suggestion.is_none());
    }

    #[test]
    fn merge_keeps_local_first_and_dedups() {
        let local = vec!["a".to_string(), "b".to_string()];
        let parsed = vec!["b".to_string(), "c".to_string(), "a".to_string()];
        assert_eq!(merge_issues(&local, &parsed), ["a", "b", "c"]);
    }

    #[test]
    fn merge_dedups_within_local() {
        let local = vec!["a".to_string(), "a".to_string()];
        assert_eq!(merge_issues(&local, &[]), ["a"]);
    }

    #[test]
    fn prompt_embeds_id_snippet_and_issues() {
        let request = AugmentRequest {
            id: "l1".to_string(),
            snippet: "<line id=\"l1\"/>".to_string(),
            local_issues: vec!["too thin".to_string()],
        };
        let prompt = build_prompt(&request);
        assert!(prompt.contains("ID: l1"));
        assert!(prompt.contains("<line id=\"l1\"/>"));
        assert!(prompt.contains("too thin"));

        let empty = AugmentRequest {
            local_issues: Vec::new(),
            ..request
        };
        assert!(build_prompt(&empty).contains("(None)"));
    }
}
