//! Best-of and per-dimension averages over a set of analyses.

use eia_core::{Analysis, Score};
use serde::Serialize;
use uuid::Uuid;

/// Name reported for a winning analysis that has no catalog product.
pub const UNNAMED_BEST_PRODUCT: &str = "Most Sustainable Option";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestProduct {
    pub id: Option<Uuid>,
    pub name: String,
    pub score: Score,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AverageScores {
    pub carbon: f64,
    pub water: f64,
    pub resources: f64,
    pub overall: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonSummary {
    pub best_product: BestProduct,
    pub average_scores: AverageScores,
}

/// Summarizes a comparison set.
///
/// The best product is the first analysis with the highest overall score,
/// so ties go to the earliest entry. Averages are unrounded means.
/// Returns `None` for an empty slice.
#[must_use]
pub fn summarize(analyses: &[Analysis]) -> Option<ComparisonSummary> {
    let (first, rest) = analyses.split_first()?;

    let mut best = first;
    for analysis in rest {
        if analysis.scores.overall > best.scores.overall {
            best = analysis;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let count = analyses.len() as f64;
    let mean = |pick: fn(&Analysis) -> Score| -> f64 {
        let total: u32 = analyses.iter().map(|a| u32::from(pick(a).get())).sum();
        f64::from(total) / count
    };

    let best_product = match &best.product {
        Some(product) => BestProduct {
            id: Some(product.id),
            name: product.name.clone(),
            score: best.scores.overall,
        },
        None => BestProduct {
            id: None,
            name: UNNAMED_BEST_PRODUCT.to_owned(),
            score: best.scores.overall,
        },
    };

    Some(ComparisonSummary {
        best_product,
        average_scores: AverageScores {
            carbon: mean(|a| a.scores.carbon),
            water: mean(|a| a.scores.water),
            resources: mean(|a| a.scores.resources),
            overall: mean(|a| a.scores.overall),
        },
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use eia_core::{AnalysisScores, ProductRef};

    use super::*;

    fn analysis(name: &str, carbon: i64, water: i64, resources: i64, overall: i64) -> Analysis {
        let score = |v| Score::new(v).expect("valid score");
        Analysis {
            id: Uuid::new_v4(),
            product: Some(ProductRef {
                id: Uuid::new_v4(),
                name: name.to_string(),
            }),
            product_description: format!("{name} description"),
            scores: AnalysisScores {
                carbon: score(carbon),
                water: score(water),
                resources: score(resources),
                overall: score(overall),
            },
            explanation: String::new(),
            suggestions: String::new(),
            raw_analysis: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_set_has_no_summary() {
        assert!(summarize(&[]).is_none());
    }

    #[test]
    fn highest_overall_wins() {
        let set = [
            analysis("A", 5, 5, 5, 6),
            analysis("B", 5, 5, 5, 8),
            analysis("C", 5, 5, 5, 10),
        ];
        let summary = summarize(&set).expect("summary");
        assert_eq!(summary.best_product.name, "C");
        assert_eq!(summary.best_product.id, set[2].product.as_ref().map(|p| p.id));
        assert_eq!(summary.best_product.score.get(), 10);
        assert!((summary.average_scores.overall - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn tie_goes_to_first_listed() {
        let set = [
            analysis("First", 1, 1, 1, 9),
            analysis("Second", 10, 10, 10, 9),
            analysis("Third", 5, 5, 5, 5),
        ];
        let summary = summarize(&set).expect("summary");
        assert_eq!(summary.best_product.name, "First");
    }

    #[test]
    fn averages_are_unrounded_means() {
        let set = [analysis("A", 8, 7, 9, 8), analysis("B", 9, 6, 8, 7)];
        let summary = summarize(&set).expect("summary");
        let avg = summary.average_scores;
        assert!((avg.carbon - 8.5).abs() < f64::EPSILON);
        assert!((avg.water - 6.5).abs() < f64::EPSILON);
        assert!((avg.resources - 8.5).abs() < f64::EPSILON);
        assert!((avg.overall - 7.5).abs() < f64::EPSILON);
    }

    #[test]
    fn single_analysis_is_its_own_summary() {
        let set = [analysis("Solo", 3, 4, 5, 6)];
        let summary = summarize(&set).expect("summary");
        assert_eq!(summary.best_product.name, "Solo");
        assert!((summary.average_scores.carbon - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unlinked_best_analysis_uses_placeholder_name() {
        let mut adhoc = analysis("ignored", 5, 5, 5, 9);
        adhoc.product = None;
        let set = [analysis("Linked", 5, 5, 5, 4), adhoc];
        let summary = summarize(&set).expect("summary");
        assert_eq!(summary.best_product.id, None);
        assert_eq!(summary.best_product.name, UNNAMED_BEST_PRODUCT);
    }

    #[test]
    fn summary_serializes_snake_case() {
        let set = [analysis("A", 5, 5, 5, 6), analysis("B", 5, 5, 5, 8)];
        let json = serde_json::to_value(summarize(&set).expect("summary")).expect("serialize");
        assert_eq!(json["best_product"]["name"], "B");
        assert_eq!(json["best_product"]["score"], 8);
        assert_eq!(json["average_scores"]["overall"], 7.0);
    }
}
