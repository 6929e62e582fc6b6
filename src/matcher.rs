//! Scores a single source column name against one target field's patterns.

use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

static REGEX_METACHARACTERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\\^$.*+?()\[\]{}|]").expect("valid metacharacter regex"));

/// Match quality between a column name and a target field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "f64", try_from = "f64")]
pub enum MatchScore {
    None,
    /// The column name contains a pattern's literal keyword.
    Keyword,
    /// A pattern matched part of the column name.
    Partial,
    /// A pattern matched the entire column name.
    Exact,
}

impl MatchScore {
    pub fn value(self) -> f64 {
        match self {
            MatchScore::None => 0.0,
            MatchScore::Keyword => 0.5,
            MatchScore::Partial => 0.8,
            MatchScore::Exact => 1.0,
        }
    }

    pub fn is_match(self) -> bool {
        self != MatchScore::None
    }
}

impl From<MatchScore> for f64 {
    fn from(score: MatchScore) -> Self {
        score.value()
    }
}

impl TryFrom<f64> for MatchScore {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        [
            MatchScore::None,
            MatchScore::Keyword,
            MatchScore::Partial,
            MatchScore::Exact,
        ]
        .into_iter()
        .find(|score| (score.value() - value).abs() < f64::EPSILON)
        .ok_or_else(|| format!("{value} is not a valid match score"))
    }
}

impl fmt::Display for MatchScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.value())
    }
}

pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Scores `column_name` against `patterns`.
///
/// The first pattern that matches decides the score; later patterns are not
/// consulted even if they would match the whole name.
pub fn calculate_match_score(column_name: &str, patterns: &[Regex]) -> MatchScore {
    let normalized = normalize_column_name(column_name);

    for pattern in patterns {
        if let Some(found) = pattern.find(&normalized) {
            return if found.start() == 0 && found.end() == normalized.len() {
                MatchScore::Exact
            } else {
                MatchScore::Partial
            };
        }
    }

    let keyword_hit = patterns
        .iter()
        .map(pattern_literal)
        .any(|literal| !literal.is_empty() && normalized.contains(literal.as_str()));
    if keyword_hit {
        MatchScore::Keyword
    } else {
        MatchScore::None
    }
}

/// Approximates the literal keyword of a pattern by dropping metacharacters.
pub fn pattern_literal(pattern: &Regex) -> String {
    REGEX_METACHARACTERS
        .replace_all(pattern.as_str(), "")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(patterns: &[&str]) -> Vec<Regex> {
        patterns.iter().map(|p| Regex::new(p).unwrap()).collect()
    }

    #[test]
    fn whole_name_match_is_exact() {
        let patterns = compile(&["^date$", "date"]);
        assert_eq!(calculate_match_score("  Date ", &patterns), MatchScore::Exact);
    }

    #[test]
    fn partial_match_scores_point_eight() {
        let patterns = compile(&["date"]);
        assert_eq!(
            calculate_match_score("Posting Date", &patterns),
            MatchScore::Partial
        );
    }

    #[test]
    fn first_matching_pattern_wins() {
        // The unanchored pattern matches first, so the later exact pattern is ignored.
        let patterns = compile(&["amo", "^amount$"]);
        assert_eq!(calculate_match_score("amount", &patterns), MatchScore::Partial);
    }

    #[test]
    fn literal_fallback_scores_half() {
        let patterns = compile(&["^date$"]);
        assert_eq!(
            calculate_match_score("Date of Birth", &patterns),
            MatchScore::Keyword
        );
        assert_eq!(calculate_match_score("Amount", &patterns), MatchScore::None);
    }

    #[test]
    fn empty_literal_never_matches_everything() {
        let patterns = compile(&["^$"]);
        assert_eq!(calculate_match_score("anything", &patterns), MatchScore::None);
    }

    #[test]
    fn pattern_literal_strips_metacharacters() {
        let pattern = Regex::new(r"^notes?$").unwrap();
        assert_eq!(pattern_literal(&pattern), "notes");
    }

    #[test]
    fn scores_round_trip_through_numbers() {
        assert_eq!(MatchScore::try_from(0.8).unwrap(), MatchScore::Partial);
        assert!(MatchScore::try_from(0.3).is_err());
        assert_eq!(serde_json::to_string(&MatchScore::Exact).unwrap(), "1.0");
    }
}
