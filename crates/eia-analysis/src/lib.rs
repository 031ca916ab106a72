//! Turns free-form LLM sustainability assessments into structured analyses
//! and summarizes sets of analyses for side-by-side comparison.
//!
//! Everything in this crate is pure: no I/O, no clocks, no randomness.

pub mod compare;
pub mod interpreter;
pub mod prompt;

pub use compare::{summarize, AverageScores, BestProduct, ComparisonSummary};
pub use interpreter::{
    extract_explanation, extract_score, extract_scores, extract_suggestions, interpret,
    unparseable, ExtractedScores, Interpreter, PatternInterpreter,
};
pub use prompt::{
    comparison_prompt, describe_product, ANALYSIS_SYSTEM_PROMPT, COMPARISON_SYSTEM_PROMPT,
};
