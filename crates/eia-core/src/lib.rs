pub mod analysis;
pub mod app_config;
pub mod catalog;
pub mod config;
pub mod products;
pub mod validation;

pub use analysis::{
    Analysis, AnalysisFragment, AnalysisScores, Dimension, ProductRef, Score, MAX_SCORE,
    MIN_SCORE, NEUTRAL_SCORE,
};
pub use app_config::{AppConfig, Environment, LlmSettings};
pub use catalog::{load_catalog, CatalogFile, CatalogProduct, SampleAnalysis};
pub use config::{load_app_config, load_app_config_from_env};
pub use products::{NewProduct, Product, ProductUpdate, SortField, SortOrder};
pub use validation::ValidationErrors;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read catalog file {path}: {source}")]
    CatalogFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog file: {0}")]
    CatalogFileParse(#[from] serde_yaml::Error),

    #[error("catalog validation failed: {0}")]
    Validation(String),
}
