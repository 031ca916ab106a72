use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog product as exposed by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub category: String,
    /// Material names in the order the product lists them, e.g. `["Bamboo"]`.
    pub materials: Vec<String>,
    pub manufacturing_location: String,
    pub additional_details: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[must_use]
    pub fn materials_list(&self) -> String {
        self.materials.join(", ")
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProduct {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default)]
    pub manufacturing_location: String,
    pub additional_details: Option<String>,
    pub image_url: Option<String>,
}

impl NewProduct {
    /// Trims every text field and drops blank materials and blank optional fields.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_owned(),
            description: self.description.trim().to_owned(),
            category: self.category.trim().to_owned(),
            materials: normalize_materials(self.materials),
            manufacturing_location: self.manufacturing_location.trim().to_owned(),
            additional_details: non_blank(self.additional_details),
            image_url: non_blank(self.image_url),
        }
    }
}

/// Sparse update: `None` keeps the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub materials: Option<Vec<String>>,
    pub manufacturing_location: Option<String>,
    pub additional_details: Option<String>,
    pub image_url: Option<String>,
}

impl ProductUpdate {
    /// Trims provided fields. Blank strings become `None` so they leave the
    /// stored value untouched.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            name: non_blank(self.name),
            description: non_blank(self.description),
            category: non_blank(self.category),
            materials: self
                .materials
                .map(normalize_materials)
                .filter(|m| !m.is_empty()),
            manufacturing_location: non_blank(self.manufacturing_location),
            additional_details: non_blank(self.additional_details),
            image_url: non_blank(self.image_url),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.materials.is_none()
            && self.manufacturing_location.is_none()
            && self.additional_details.is_none()
            && self.image_url.is_none()
    }
}

/// Column a product listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Name,
    Category,
}

impl SortField {
    /// Column name used in `ORDER BY`. Only these fixed values ever reach SQL.
    #[must_use]
    pub fn column(self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::Name => "name",
            SortField::Category => "category",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn normalize_materials(materials: Vec<String>) -> Vec<String> {
    materials
        .into_iter()
        .map(|m| m.trim().to_owned())
        .filter(|m| !m.is_empty())
        .collect()
}
