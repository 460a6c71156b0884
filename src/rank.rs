//! Link filtering and topic-aware ranking of search results.
//!
//! Every surviving link is scored as
//!
//! ```text
//! score = TERM_MATCH_WEIGHT × (query terms found in the lowercased href)
//!       + Σ rule.delta(href, context)          for each ScoringRule
//!       − LENGTH_PENALTY_PER_CHAR × (characters in href)
//! ```
//!
//! The weights are empirically tuned; changing any of them changes which
//! article gets picked and needs re-checking against the ranking tests.
//!
//! Topic heuristics plug in as [`ScoringRule`]s. [`RepairGuideRule`] is the
//! only built-in rule: it favours iFixit step-by-step guides over device
//! overview pages.

use crate::models::{ArchiveId, Candidate};

/// Bonus per query term found in the href.
pub const TERM_MATCH_WEIGHT: f64 = 10.0;
/// Penalty per href character, favouring short canonical URLs.
pub const LENGTH_PENALTY_PER_CHAR: f64 = 0.1;

/// `repair` bonus for links under a `/Guide/` segment.
pub const REPAIR_GUIDE_BONUS: f64 = 50.0;
/// `repair` bonus for links mentioning `Replacement`.
pub const REPAIR_REPLACEMENT_BONUS: f64 = 20.0;
/// `repair` adjustment for device overview pages.
pub const REPAIR_DEVICE_PENALTY: f64 = -5.0;

/// Marker of the server's own search endpoint (pagination and self links).
pub const SEARCH_ENDPOINT_MARKER: &str = "search?";
/// Path segment of skin/theme assets.
pub const SKIN_ASSET_MARKER: &str = "skin/";
/// Stylesheet extension.
pub const STYLESHEET_EXTENSION: &str = ".css";

/// A topic-specific score adjustment.
///
/// Rules are summed; a rule that does not care about `context` returns 0.
pub trait ScoringRule: Send + Sync {
    fn name(&self) -> &str;

    fn delta(&self, href: &str, context: &str) -> f64;
}

/// Prefer repair guides, especially replacement guides, over device pages.
pub struct RepairGuideRule;

impl ScoringRule for RepairGuideRule {
    fn name(&self) -> &str {
        "repair_guide"
    }

    fn delta(&self, href: &str, context: &str) -> f64 {
        if context != "repair" {
            return 0.0;
        }
        let mut delta = 0.0;
        if href.contains("/Guide/") {
            delta += REPAIR_GUIDE_BONUS;
        }
        if href.contains("Replacement") {
            delta += REPAIR_REPLACEMENT_BONUS;
        }
        if href.contains("/Device/") {
            delta += REPAIR_DEVICE_PENALTY;
        }
        delta
    }
}

/// Whether `href` is a plausible article link inside `archive`.
///
/// Rejects links into other archives, links back to the search endpoint,
/// skin assets, and stylesheets.
pub fn is_article_link(href: &str, archive: &ArchiveId) -> bool {
    if !href.contains(archive.as_str()) {
        return false;
    }
    if href.contains(SEARCH_ENDPOINT_MARKER) || href.contains(SKIN_ASSET_MARKER) {
        return false;
    }
    let path = href.split(['?', '#']).next().unwrap_or(href);
    !path.to_ascii_lowercase().ends_with(STYLESHEET_EXTENSION)
}

/// Lowercased whitespace-separated query terms.
pub fn query_terms(query: &str) -> Vec<String> {
    query.split_whitespace().map(str::to_lowercase).collect()
}

/// Scores and orders candidate links for one sub-query.
pub struct Ranker {
    rules: Vec<Box<dyn ScoringRule>>,
}

impl Ranker {
    /// A ranker with no topic rules: term matches and length only.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Add a topic rule.
    pub fn with_rule(mut self, rule: Box<dyn ScoringRule>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[Box<dyn ScoringRule>] {
        &self.rules
    }

    /// Score one href.
    pub fn score(&self, href: &str, terms: &[String], context: &str) -> f64 {
        let href_lower = href.to_lowercase();
        let matches = terms
            .iter()
            .filter(|t| href_lower.contains(t.as_str()))
            .count();

        let mut score = matches as f64 * TERM_MATCH_WEIGHT;
        for rule in &self.rules {
            score += rule.delta(href, context);
        }
        score - href.chars().count() as f64 * LENGTH_PENALTY_PER_CHAR
    }

    /// Filter, score, and sort `hrefs` (best first).
    ///
    /// Ties keep their original order.
    pub fn rank<'h, I>(&self, hrefs: I, archive: &ArchiveId, query: &str, context: &str) -> Vec<Candidate>
    where
        I: IntoIterator<Item = &'h str>,
    {
        let terms = query_terms(query);
        let mut candidates: Vec<Candidate> = hrefs
            .into_iter()
            .filter(|href| is_article_link(href, archive))
            .map(|href| Candidate {
                score: self.score(href, &terms, context),
                href: href.to_string(),
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates
    }

    /// The best candidate's href, or `None` if nothing usable survives.
    pub fn best<'h, I>(&self, hrefs: I, archive: &ArchiveId, query: &str, context: &str) -> Option<Candidate>
    where
        I: IntoIterator<Item = &'h str>,
    {
        self.rank(hrefs, archive, query, context)
            .into_iter()
            .next()
            .filter(|c| !c.href.is_empty())
    }
}

impl Default for Ranker {
    /// The built-in rule set.
    fn default() -> Self {
        Self::new().with_rule(Box::new(RepairGuideRule))
    }
}
