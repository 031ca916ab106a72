//! Sustainability analysis types shared by the interpreter, persistence and API layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 10;
/// Substituted whenever a dimension cannot be extracted from analysis text.
pub const NEUTRAL_SCORE: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("score {0} is outside the range {MIN_SCORE}..={MAX_SCORE}")]
pub struct ScoreOutOfRange(pub i64);

/// A sustainability score in `1..=10`, where 10 is the most sustainable.
///
/// Construction is the only place the range is checked, so every `Score`
/// in the system is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Score(u8);

impl Score {
    pub const NEUTRAL: Score = Score(NEUTRAL_SCORE);

    /// Returns `None` when `value` falls outside `1..=10`.
    #[must_use]
    pub fn new(value: i64) -> Option<Self> {
        u8::try_from(value)
            .ok()
            .filter(|v| (MIN_SCORE..=MAX_SCORE).contains(v))
            .map(Score)
    }

    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Score {
    type Error = ScoreOutOfRange;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Score::new(value).ok_or(ScoreOutOfRange(value))
    }
}

impl TryFrom<i16> for Score {
    type Error = ScoreOutOfRange;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        Score::try_from(i64::from(value))
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl From<Score> for i16 {
    fn from(score: Score) -> Self {
        i16::from(score.0)
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One of the four scored sustainability axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Carbon,
    Water,
    Resources,
    Overall,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Carbon,
        Dimension::Water,
        Dimension::Resources,
        Dimension::Overall,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Dimension::Carbon => "carbon",
            Dimension::Water => "water",
            Dimension::Resources => "resources",
            Dimension::Overall => "overall",
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisScores {
    pub carbon: Score,
    pub water: Score,
    pub resources: Score,
    /// Extracted independently of the other three; never derived from them.
    pub overall: Score,
}

impl AnalysisScores {
    #[must_use]
    pub fn neutral() -> Self {
        Self {
            carbon: Score::NEUTRAL,
            water: Score::NEUTRAL,
            resources: Score::NEUTRAL,
            overall: Score::NEUTRAL,
        }
    }

    #[must_use]
    pub fn get(&self, dimension: Dimension) -> Score {
        match dimension {
            Dimension::Carbon => self.carbon,
            Dimension::Water => self.water,
            Dimension::Resources => self.resources,
            Dimension::Overall => self.overall,
        }
    }
}

/// The structured part of an analysis, as produced by an interpreter from raw LLM text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisFragment {
    pub scores: AnalysisScores,
    pub explanation: String,
    pub suggestions: String,
}

/// Identity of the catalog product an analysis belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    pub id: Uuid,
    pub name: String,
}

/// A persisted analysis. Immutable once written; a newer analysis for the
/// same product supersedes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub id: Uuid,
    /// `None` for ad-hoc text analyses and for analyses whose product was deleted.
    pub product: Option<ProductRef>,
    pub product_description: String,
    pub scores: AnalysisScores,
    pub explanation: String,
    pub suggestions: String,
    pub raw_analysis: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_accepts_bounds() {
        assert_eq!(Score::new(1).map(Score::get), Some(1));
        assert_eq!(Score::new(10).map(Score::get), Some(10));
    }

    #[test]
    fn score_rejects_out_of_range() {
        assert!(Score::new(0).is_none());
        assert!(Score::new(11).is_none());
        assert!(Score::new(-3).is_none());
        assert!(Score::new(i64::MAX).is_none());
    }

    #[test]
    fn score_try_from_i16_reports_value() {
        let err = Score::try_from(42_i16).unwrap_err();
        assert_eq!(err, ScoreOutOfRange(42));
    }

    #[test]
    fn score_serializes_as_plain_number() {
        let json = serde_json::to_string(&Score::NEUTRAL).expect("serialize");
        assert_eq!(json, "5");
    }

    #[test]
    fn score_deserialization_rejects_out_of_range() {
        assert!(serde_json::from_str::<Score>("12").is_err());
        assert_eq!(
            serde_json::from_str::<Score>("7").expect("deserialize").get(),
            7
        );
    }

    #[test]
    fn neutral_scores_are_all_five() {
        let scores = AnalysisScores::neutral();
        for dimension in Dimension::ALL {
            assert_eq!(scores.get(dimension).get(), NEUTRAL_SCORE);
        }
    }

    #[test]
    fn dimension_serializes_lowercase() {
        let json = serde_json::to_string(&Dimension::Resources).expect("serialize");
        assert_eq!(json, "\"resources\"");
        assert_eq!(Dimension::Overall.to_string(), "overall");
    }
}
