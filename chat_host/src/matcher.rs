use crate::error::PatternExtractionError;
use crate::patterns::{PatternRegistry, PatternRule};
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use unicode_normalization::UnicodeNormalization;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.6;

/// Invisible format characters (zero-width spaces and joiners, bidi marks,
/// soft hyphens, byte-order marks) that would otherwise split or glue words.
fn is_format_char(c: char) -> bool {
    matches!(
        c,
        '\u{00AD}'
            | '\u{061C}'
            | '\u{180E}'
            | '\u{200B}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{206F}'
            | '\u{FEFF}'
    )
}

/// NFKC-fold compatibility forms (fullwidth letters, ideographic and
/// no-break spaces) and drop format characters, keeping case.
fn fold(utterance: &str) -> String {
    utterance.nfkc().filter(|c| !is_format_char(*c)).collect()
}

/// Fold, collapse whitespace runs to single spaces, trim, and lowercase.
pub fn normalize(utterance: &str) -> String {
    fold(utterance)
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Folded and whitespace-collapsed but case-preserving form, used for
/// parameter extraction so SQL, paths and stored values keep their case.
pub fn canonicalize(utterance: &str) -> String {
    fold(utterance).split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub rule_id: String,
    pub tool: String,
    pub server: String,
    pub parameters: BTreeMap<String, String>,
    pub confidence: f64,
}

/// Everything the matcher learned about one utterance.
#[derive(Debug, Clone, Default)]
pub struct MatchReport {
    pub best: Option<MatchResult>,
    /// Rules that matched structurally but failed extraction.
    pub downgraded: Vec<PatternExtractionError>,
    /// The strongest successful match when it scored under the threshold.
    pub below_threshold: Option<MatchResult>,
}

#[derive(Debug, Clone)]
pub struct Matcher {
    registry: Arc<PatternRegistry>,
    threshold: f64,
}

impl Matcher {
    pub fn new(registry: Arc<PatternRegistry>) -> Self {
        Self::with_threshold(registry, DEFAULT_CONFIDENCE_THRESHOLD)
    }

    pub fn with_threshold(registry: Arc<PatternRegistry>, threshold: f64) -> Self {
        Self {
            registry,
            threshold,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn registry(&self) -> &Arc<PatternRegistry> {
        &self.registry
    }

    /// Best match meeting the threshold, or `None` to route to the fallback.
    pub fn match_utterance(&self, utterance: &str) -> Option<MatchResult> {
        self.evaluate(utterance).best
    }

    /// Scan every rule in registry order. The highest confidence wins and an
    /// earlier rule keeps the win on a tie.
    pub fn evaluate(&self, utterance: &str) -> MatchReport {
        let normalized = normalize(utterance);
        let canonical = canonicalize(utterance);
        let mut report = MatchReport::default();
        if normalized.is_empty() {
            return report;
        }

        let mut strongest: Option<(&PatternRule, BTreeMap<String, String>)> = None;
        for rule in self.registry.all_rules() {
            if !rule.is_structural_match(&normalized) {
                continue;
            }
            match rule.extract(&canonical) {
                Ok(parameters) => {
                    let better = strongest
                        .as_ref()
                        .map_or(true, |(current, _)| rule.confidence > current.confidence);
                    if better {
                        strongest = Some((rule, parameters));
                    }
                }
                Err(err) => {
                    debug!("Pattern downgraded: {}", err);
                    report.downgraded.push(err);
                }
            }
        }

        if let Some((rule, parameters)) = strongest {
            let result = MatchResult {
                rule_id: rule.id.clone(),
                tool: rule.tool.clone(),
                server: rule.server.clone(),
                parameters,
                confidence: rule.confidence,
            };
            if result.confidence >= self.threshold {
                debug!(
                    "Matched rule {} -> {}/{} ({:.2})",
                    result.rule_id, result.server, result.tool, result.confidence
                );
                report.best = Some(result);
            } else {
                debug!(
                    "Best rule {} scored {:.2}, below threshold {:.2}",
                    result.rule_id, result.confidence, self.threshold
                );
                report.below_threshold = Some(result);
            }
        }
        report
    }
}
