//! Request validation rules for products, analysis input and comparisons.
//!
//! Each validator collects every failing field rather than stopping at the
//! first one, so API clients can show all problems at once.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use uuid::Uuid;

use crate::products::{NewProduct, ProductUpdate};

pub const PRODUCT_NAME_MIN_CHARS: usize = 3;
pub const PRODUCT_NAME_MAX_CHARS: usize = 100;
pub const PRODUCT_DESCRIPTION_MIN_CHARS: usize = 10;
pub const ANALYSIS_TEXT_MIN_CHARS: usize = 10;
pub const ANALYSIS_TEXT_MAX_CHARS: usize = 2000;
pub const COMPARISON_MIN_PRODUCTS: usize = 2;
pub const COMPARISON_MAX_PRODUCTS: usize = 3;

/// Field name to human-readable message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.insert(field.to_owned(), message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

/// Validates a product about to be created. Expects [`NewProduct::normalized`] input.
///
/// # Errors
///
/// Returns every failing field.
pub fn validate_new_product(product: &NewProduct) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    check_name(&mut errors, &product.name);
    check_description(&mut errors, &product.description);
    if product.category.is_empty() {
        errors.add("category", "Product category is required");
    }
    if product.materials.is_empty() {
        errors.add("materials", "At least one material must be specified");
    }
    if product.manufacturing_location.is_empty() {
        errors.add(
            "manufacturing_location",
            "Manufacturing location is required",
        );
    }

    errors.into_result()
}

/// Validates the fields present in a sparse update.
///
/// # Errors
///
/// Returns every failing field.
pub fn validate_product_update(update: &ProductUpdate) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    if let Some(name) = &update.name {
        check_name(&mut errors, name);
    }
    if let Some(description) = &update.description {
        check_description(&mut errors, description);
    }

    errors.into_result()
}

/// Validates free text submitted for an ad-hoc analysis.
///
/// # Errors
///
/// Returns a `product_text` error when the text is missing or out of bounds.
pub fn validate_analysis_text(text: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let len = text.trim().chars().count();

    if len == 0 {
        errors.add("product_text", "Product description text is required");
    } else if len < ANALYSIS_TEXT_MIN_CHARS {
        errors.add(
            "product_text",
            format!(
                "Product description must be at least {ANALYSIS_TEXT_MIN_CHARS} characters long"
            ),
        );
    } else if len > ANALYSIS_TEXT_MAX_CHARS {
        errors.add(
            "product_text",
            format!("Product description must be less than {ANALYSIS_TEXT_MAX_CHARS} characters"),
        );
    }

    errors.into_result()
}

/// Validates the product ids of a comparison request.
///
/// # Errors
///
/// Returns a `product_ids` error for too few, too many, or duplicate ids.
pub fn validate_comparison_ids(ids: &[Uuid]) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    if ids.len() < COMPARISON_MIN_PRODUCTS {
        errors.add(
            "product_ids",
            format!("At least {COMPARISON_MIN_PRODUCTS} product IDs are required for comparison"),
        );
    } else if ids.len() > COMPARISON_MAX_PRODUCTS {
        errors.add(
            "product_ids",
            format!("Maximum {COMPARISON_MAX_PRODUCTS} products can be compared at once"),
        );
    } else {
        let unique: HashSet<&Uuid> = ids.iter().collect();
        if unique.len() != ids.len() {
            errors.add("product_ids", "Duplicate product IDs are not allowed");
        }
    }

    errors.into_result()
}

fn check_name(errors: &mut ValidationErrors, name: &str) {
    let len = name.chars().count();
    if len == 0 {
        errors.add("name", "Product name is required");
    } else if len < PRODUCT_NAME_MIN_CHARS {
        errors.add(
            "name",
            format!("Product name must be at least {PRODUCT_NAME_MIN_CHARS} characters long"),
        );
    } else if len > PRODUCT_NAME_MAX_CHARS {
        errors.add(
            "name",
            format!("Product name must be less than {PRODUCT_NAME_MAX_CHARS} characters"),
        );
    }
}

fn check_description(errors: &mut ValidationErrors, description: &str) {
    let len = description.chars().count();
    if len == 0 {
        errors.add("description", "Product description is required");
    } else if len < PRODUCT_DESCRIPTION_MIN_CHARS {
        errors.add(
            "description",
            format!(
                "Product description must be at least {PRODUCT_DESCRIPTION_MIN_CHARS} characters long"
            ),
        );
    }
}
