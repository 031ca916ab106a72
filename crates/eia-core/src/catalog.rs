use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisScores;
use crate::products::NewProduct;
use crate::validation::validate_new_product;
use crate::ConfigError;

/// A pre-written analysis stored alongside a catalog product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleAnalysis {
    pub scores: AnalysisScores,
    pub explanation: String,
    pub suggestions: String,
    pub raw_analysis: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogProduct {
    #[serde(flatten)]
    pub product: NewProduct,
    pub sample_analysis: Option<SampleAnalysis>,
}

#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    pub products: Vec<CatalogProduct>,
}

/// Load and validate the seed catalog from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_catalog(path: &Path) -> Result<CatalogFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CatalogFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_catalog(&content)
}

fn parse_catalog(content: &str) -> Result<CatalogFile, ConfigError> {
    let mut catalog: CatalogFile = serde_yaml::from_str(content)?;
    for entry in &mut catalog.products {
        entry.product = std::mem::take(&mut entry.product).normalized();
    }
    validate_catalog(&catalog)?;
    Ok(catalog)
}

fn validate_catalog(catalog: &CatalogFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();

    for entry in &catalog.products {
        let product = &entry.product;
        if let Err(errors) = validate_new_product(product) {
            return Err(ConfigError::Validation(format!(
                "product '{}' is invalid: {errors}",
                product.name
            )));
        }

        if !seen_names.insert(product.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate product name: '{}'",
                product.name
            )));
        }

        if let Some(sample) = &entry.sample_analysis {
            if sample.explanation.trim().is_empty() || sample.suggestions.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "sample analysis for '{}' needs an explanation and suggestions",
                    product.name
                )));
            }
        }
    }

    Ok(())
}
