//! Pattern-based extraction of scores, explanation and suggestions from
//! LLM assessment text.
//!
//! Extraction is best effort. A dimension whose score cannot be found is
//! reported as `None` by [`extract_scores`] and only turned into the neutral
//! score by [`ExtractedScores::with_defaults`].

use std::sync::LazyLock;

use eia_core::{AnalysisFragment, AnalysisScores, Dimension, Score};
use regex::Regex;

pub const MISSING_EXPLANATION: &str = "No detailed explanation was provided for this product.";
pub const MISSING_SUGGESTIONS: &str =
    "No specific suggestions were provided for improving this product.";
pub const UNPARSEABLE_EXPLANATION: &str =
    "Unable to parse detailed analysis. Please try again or provide more product information.";
pub const UNPARSEABLE_SUGGESTIONS: &str =
    "Unable to generate improvement suggestions. Please try again with more specific product details.";

/// Converts raw assessment text into an [`AnalysisFragment`].
///
/// Implementations must be total: every input yields a usable fragment.
pub trait Interpreter: Send + Sync {
    fn interpret(&self, text: &str) -> AnalysisFragment;
}

/// The regex-driven interpreter used for free-form LLM output.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternInterpreter;

impl Interpreter for PatternInterpreter {
    fn interpret(&self, text: &str) -> AnalysisFragment {
        interpret(text)
    }
}

/// The three score patterns for one search token, most specific first.
struct TokenPatterns {
    /// `Carbon Footprint: 8/10`
    out_of_ten: Regex,
    /// `Carbon Footprint Score: 8`
    trailing_number: Regex,
    /// `Carbon: 8`
    single_digit: Regex,
}

impl TokenPatterns {
    fn new(token: &str) -> Self {
        Self {
            out_of_ten: Regex::new(&format!(r"(?i){token}[^0-9]+([0-9]+)\s*/\s*10"))
                .expect("valid out-of-ten regex"),
            trailing_number: Regex::new(&format!(r"(?i){token}[^0-9]+([0-9]+)"))
                .expect("valid trailing-number regex"),
            single_digit: Regex::new(&format!(r"(?i){token}[\s:]+([1-9])"))
                .expect("valid single-digit regex"),
        }
    }

    fn find(&self, text: &str) -> Option<Score> {
        [&self.out_of_ten, &self.trailing_number, &self.single_digit]
            .into_iter()
            .find_map(|re| first_score(re, text))
    }
}

static CARBON: LazyLock<TokenPatterns> = LazyLock::new(|| TokenPatterns::new("carbon"));
static WATER: LazyLock<TokenPatterns> = LazyLock::new(|| TokenPatterns::new("water"));
static RESOURCE: LazyLock<TokenPatterns> = LazyLock::new(|| TokenPatterns::new("resource"));
static OVERALL: LazyLock<TokenPatterns> = LazyLock::new(|| TokenPatterns::new("overall"));
static SUSTAINABILITY: LazyLock<TokenPatterns> =
    LazyLock::new(|| TokenPatterns::new("sustainability"));

static EXPLANATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)explanation:(.+?)(?:suggestions:|$)").expect("valid explanation regex")
});
static SUGGESTIONS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)suggestions:(.+)$").expect("valid suggestions regex"));

/// Only the leftmost match of a pattern is considered. A number outside
/// `1..=10` (or too long to parse) counts as no match for that pattern.
fn first_score(re: &Regex, text: &str) -> Option<Score> {
    let digits = re.captures(text)?.get(1)?.as_str();
    digits.parse::<i64>().ok().and_then(Score::new)
}

/// Per-dimension extraction result before defaults are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExtractedScores {
    pub carbon: Option<Score>,
    pub water: Option<Score>,
    pub resources: Option<Score>,
    pub overall: Option<Score>,
}

impl ExtractedScores {
    /// Dimensions that were not found in the text.
    #[must_use]
    pub fn missing(&self) -> Vec<Dimension> {
        Dimension::ALL
            .into_iter()
            .filter(|d| self.get(*d).is_none())
            .collect()
    }

    #[must_use]
    pub fn get(&self, dimension: Dimension) -> Option<Score> {
        match dimension {
            Dimension::Carbon => self.carbon,
            Dimension::Water => self.water,
            Dimension::Resources => self.resources,
            Dimension::Overall => self.overall,
        }
    }

    /// Substitutes [`Score::NEUTRAL`] for every missing dimension.
    #[must_use]
    pub fn with_defaults(self) -> AnalysisScores {
        AnalysisScores {
            carbon: self.carbon.unwrap_or(Score::NEUTRAL),
            water: self.water.unwrap_or(Score::NEUTRAL),
            resources: self.resources.unwrap_or(Score::NEUTRAL),
            overall: self.overall.unwrap_or(Score::NEUTRAL),
        }
    }
}

/// Finds the score for one dimension. `Overall` falls back to the
/// `sustainability` token when no `overall` score is present.
#[must_use]
pub fn extract_score(text: &str, dimension: Dimension) -> Option<Score> {
    match dimension {
        Dimension::Carbon => CARBON.find(text),
        Dimension::Water => WATER.find(text),
        Dimension::Resources => RESOURCE.find(text),
        Dimension::Overall => OVERALL.find(text).or_else(|| SUSTAINABILITY.find(text)),
    }
}

#[must_use]
pub fn extract_scores(text: &str) -> ExtractedScores {
    ExtractedScores {
        carbon: extract_score(text, Dimension::Carbon),
        water: extract_score(text, Dimension::Water),
        resources: extract_score(text, Dimension::Resources),
        overall: extract_score(text, Dimension::Overall),
    }
}

/// Text after the first `explanation:` marker, up to the next `suggestions:`
/// marker or the end of the text, trimmed.
#[must_use]
pub fn extract_explanation(text: &str) -> Option<String> {
    section(&EXPLANATION, text)
}

/// Text after the first `suggestions:` marker through the end, trimmed.
#[must_use]
pub fn extract_suggestions(text: &str) -> Option<String> {
    section(&SUGGESTIONS, text)
}

fn section(re: &Regex, text: &str) -> Option<String> {
    let body = re.captures(text)?.get(1)?.as_str().trim();
    (!body.is_empty()).then(|| body.to_owned())
}

/// Interprets LLM assessment text.
///
/// Blank text yields [`unparseable`]. Otherwise every missing piece is
/// replaced by its fallback, so the result is always complete.
#[must_use]
pub fn interpret(text: &str) -> AnalysisFragment {
    if text.trim().is_empty() {
        tracing::warn!("analysis text is empty; using neutral analysis");
        return unparseable();
    }

    let extracted = extract_scores(text);
    let missing = extracted.missing();
    if !missing.is_empty() {
        tracing::debug!(?missing, "score dimensions not found; substituting neutral score");
    }

    AnalysisFragment {
        scores: extracted.with_defaults(),
        explanation: extract_explanation(text).unwrap_or_else(|| MISSING_EXPLANATION.to_owned()),
        suggestions: extract_suggestions(text).unwrap_or_else(|| MISSING_SUGGESTIONS.to_owned()),
    }
}

/// The neutral fragment returned when there is nothing to interpret.
#[must_use]
pub fn unparseable() -> AnalysisFragment {
    AnalysisFragment {
        scores: AnalysisScores::neutral(),
        explanation: UNPARSEABLE_EXPLANATION.to_owned(),
        suggestions: UNPARSEABLE_SUGGESTIONS.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(value: u8) -> Option<Score> {
        Score::new(i64::from(value))
    }

    #[test]
    fn scenario_text_is_fully_extracted() {
        let text = "Carbon Footprint: 8/10\nWater Usage Score: 6\nResource: 9\nOverall Score: 7/10\nExplanation: Good use of recycled parts. Suggestions: Reduce packaging.";
        let fragment = interpret(text);

        assert_eq!(fragment.scores.carbon.get(), 8);
        assert_eq!(fragment.scores.water.get(), 6);
        assert_eq!(fragment.scores.resources.get(), 9);
        assert_eq!(fragment.scores.overall.get(), 7);
        assert_eq!(fragment.explanation, "Good use of recycled parts.");
        assert_eq!(fragment.suggestions, "Reduce packaging.");
    }

    #[test]
    fn text_without_keywords_gets_neutral_scores() {
        let fragment = interpret("A lovely product with no numbers at all.");
        assert_eq!(fragment.scores, AnalysisScores::neutral());
        assert_eq!(fragment.explanation, MISSING_EXPLANATION);
        assert_eq!(fragment.suggestions, MISSING_SUGGESTIONS);
    }

    #[test]
    fn out_of_ten_form_wins_over_earlier_loose_match() {
        let text = "Carbon: 3\nCarbon Footprint: 8/10";
        assert_eq!(extract_score(text, Dimension::Carbon), score(8));
    }

    #[test]
    fn loose_match_used_when_no_out_of_ten_form() {
        assert_eq!(
            extract_score("Water Usage Score: 4 overall", Dimension::Water),
            score(4)
        );
    }

    #[test]
    fn out_of_range_number_falls_through_to_single_digit_pattern() {
        // "15" is rejected by the first two patterns; the single-digit
        // pattern then reads its leading "1".
        assert_eq!(extract_score("Carbon: 15", Dimension::Carbon), score(1));
    }

    #[test]
    fn zero_is_never_a_score() {
        assert_eq!(extract_score("Carbon: 0", Dimension::Carbon), None);
        assert_eq!(extract_score("Carbon: 0/10", Dimension::Carbon), None);
    }

    #[test]
    fn ten_is_accepted() {
        assert_eq!(
            extract_score("Overall Environmental Impact Score: 10/10", Dimension::Overall),
            score(10)
        );
    }

    #[test]
    fn huge_numbers_are_ignored() {
        let text = "Resource Consumption Score: 99999999999999999999999";
        assert_eq!(extract_score(text, Dimension::Resources), None);
        let text = "Resource: 99999999999999999999999";
        assert_eq!(extract_score(text, Dimension::Resources), score(9));
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(extract_score("WATER USAGE: 7/10", Dimension::Water), score(7));
    }

    #[test]
    fn resources_matches_singular_token() {
        assert_eq!(
            extract_score("Resource Consumption Score: 6/10", Dimension::Resources),
            score(6)
        );
    }

    #[test]
    fn overall_falls_back_to_sustainability() {
        let text = "Sustainability rating: 9/10";
        assert_eq!(extract_score(text, Dimension::Overall), score(9));
    }

    #[test]
    fn overall_prefers_overall_token() {
        let text = "Sustainability: 3/10\nOverall: 6/10";
        assert_eq!(extract_score(text, Dimension::Overall), score(6));
    }

    #[test]
    fn missing_dimensions_are_reported_before_defaults() {
        let extracted = extract_scores("Carbon: 7/10");
        assert_eq!(extracted.carbon, score(7));
        assert_eq!(
            extracted.missing(),
            vec![Dimension::Water, Dimension::Resources, Dimension::Overall]
        );
        let scores = extracted.with_defaults();
        assert_eq!(scores.water, Score::NEUTRAL);
        assert_eq!(scores.carbon.get(), 7);
    }

    #[test]
    fn explanation_stops_at_suggestions_marker() {
        let text = "Scores...\nExplanation: A.\nSuggestions: B...";
        assert_eq!(extract_explanation(text).as_deref(), Some("A."));
        assert_eq!(extract_suggestions(text).as_deref(), Some("B..."));
    }

    #[test]
    fn explanation_runs_to_end_without_suggestions() {
        let text = "explanation:\n  Line one.\n  Line two.\n";
        assert_eq!(
            extract_explanation(text).as_deref(),
            Some("Line one.\n  Line two.")
        );
        assert_eq!(extract_suggestions(text), None);
    }

    #[test]
    fn markers_are_case_insensitive_and_multiline() {
        let text = "EXPLANATION: first\nsecond\nSUGGESTIONS:\n1. Use less water.\n2. Ship by rail.";
        let fragment = interpret(text);
        assert_eq!(fragment.explanation, "first\nsecond");
        assert_eq!(fragment.suggestions, "1. Use less water.\n2. Ship by rail.");
    }

    #[test]
    fn empty_section_uses_fallback() {
        let fragment = interpret("Explanation:   Suggestions: Reuse it.");
        assert_eq!(fragment.explanation, MISSING_EXPLANATION);
        assert_eq!(fragment.suggestions, "Reuse it.");
    }

    #[test]
    fn blank_text_is_unparseable() {
        assert_eq!(interpret(""), unparseable());
        assert_eq!(interpret("  \n\t "), unparseable());
        assert_eq!(unparseable().explanation, UNPARSEABLE_EXPLANATION);
        assert_eq!(unparseable().suggestions, UNPARSEABLE_SUGGESTIONS);
    }

    #[test]
    fn scores_always_in_range() {
        let inputs = [
            "Carbon: 0 Water: 11/10 Resource: -4 Overall: 100",
            "carbon carbon carbon 12/10 water 10/10",
            "Overall 1",
            "",
            "resource: 999/10",
        ];
        for text in inputs {
            let scores = interpret(text).scores;
            for dimension in Dimension::ALL {
                let value = scores.get(dimension).get();
                assert!((1..=10).contains(&value), "{dimension} = {value} for {text:?}");
            }
        }
    }

    #[test]
    fn interpretation_is_deterministic() {
        let text = "Carbon Footprint: 8/10\nExplanation: Solid.\nSuggestions: None.";
        assert_eq!(interpret(text), interpret(text));
        assert_eq!(PatternInterpreter.interpret(text), interpret(text));
    }
}
