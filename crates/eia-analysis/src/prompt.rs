//! Prompts sent to the chat-completion model.
//!
//! The analysis prompt asks for labelled `X/10` scores and explicit
//! `Explanation:` / `Suggestions:` sections, which is the layout the
//! interpreter extracts from.

use std::fmt::Write as _;

use eia_core::{Analysis, Product};

pub const ANALYSIS_SYSTEM_PROMPT: &str = "\
You are an environmental impact analyzer specialized in evaluating product sustainability.
Analyze the provided product information and generate an environmental impact assessment with the following components:

1. Scores (scale of 1-10, where 10 is most sustainable):
   - Carbon Footprint Score: [1-10]
   - Water Usage Score: [1-10]
   - Resource Consumption Score: [1-10]
   - Overall Environmental Impact Score: [1-10]

2. Explanation: Provide a detailed explanation of the environmental impact assessment, including the reasoning behind each score and the key factors considered.

3. Suggestions: Offer specific recommendations for improving the product's environmental impact.

Format your response with clear section headings (Scores, Explanation, Suggestions) and ensure all scores are clearly labeled with their numeric values.";

pub const COMPARISON_SYSTEM_PROMPT: &str = "\
You are an environmental impact analyzer specialized in comparing product sustainability.
Based on the environmental analyses of multiple products, provide a concise comparison highlighting:

1. The most environmentally friendly option and why
2. Key differences between products in terms of:
   - Carbon footprint
   - Water usage
   - Resource consumption
3. Summary of trade-offs between the products
4. Recommendations for consumers prioritizing sustainability

Keep your response focused on environmental impact factors and sustainability considerations.";

/// Renders a catalog product as the user message for an analysis request.
/// The rendered text is also stored as the analysis' product description.
#[must_use]
pub fn describe_product(product: &Product) -> String {
    format!(
        "Product Name: {}\nDescription: {}\nCategory: {}\nMaterials: {}\nManufacturing Location: {}\nAdditional Details: {}",
        product.name,
        product.description,
        product.category,
        product.materials_list(),
        product.manufacturing_location,
        product.additional_details.as_deref().unwrap_or("None"),
    )
}

/// Renders the user message asking the model to compare analysed products.
#[must_use]
pub fn comparison_prompt(analyses: &[Analysis]) -> String {
    let mut out = String::from("Compare these products based on their environmental impact:\n");
    for (index, analysis) in analyses.iter().enumerate() {
        let name = analysis
            .product
            .as_ref()
            .map_or("Unnamed Product", |p| p.name.as_str());
        let scores = &analysis.scores;
        let _ = write!(
            out,
            "\nProduct {}: {name}\nCarbon Footprint: {}/10\nWater Usage: {}/10\nResource Consumption: {}/10\nOverall Score: {}/10\nDetails: {}\n",
            index + 1,
            scores.carbon,
            scores.water,
            scores.resources,
            scores.overall,
            analysis.explanation,
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use eia_core::{AnalysisScores, ProductRef, Score};
    use uuid::Uuid;

    use super::*;
    use crate::interpreter::interpret;

    fn product(details: Option<&str>) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4(),
            name: "Bamboo Kitchen Utensils".to_string(),
            description: "Sustainable bamboo kitchen utensils.".to_string(),
            category: "Home Goods".to_string(),
            materials: vec!["Bamboo".to_string(), "Linseed Oil".to_string()],
            manufacturing_location: "Vietnam".to_string(),
            additional_details: details.map(str::to_string),
            image_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn product_description_lists_every_field() {
        let text = describe_product(&product(Some("FSC certified.")));
        assert!(text.starts_with("Product Name: Bamboo Kitchen Utensils\n"));
        assert!(text.contains("Materials: Bamboo, Linseed Oil\n"));
        assert!(text.contains("Manufacturing Location: Vietnam\n"));
        assert!(text.ends_with("Additional Details: FSC certified."));
    }

    #[test]
    fn missing_details_render_as_none() {
        let text = describe_product(&product(None));
        assert!(text.ends_with("Additional Details: None"));
    }

    #[test]
    fn comparison_prompt_numbers_products() {
        let score = |v| Score::new(v).expect("valid score");
        let analysis = |name: Option<&str>, overall| Analysis {
            id: Uuid::new_v4(),
            product: name.map(|n| ProductRef {
                id: Uuid::new_v4(),
                name: n.to_string(),
            }),
            product_description: String::new(),
            scores: AnalysisScores {
                carbon: score(8),
                water: score(7),
                resources: score(9),
                overall: score(overall),
            },
            explanation: "Recycled casing.".to_string(),
            suggestions: String::new(),
            raw_analysis: String::new(),
            created_at: Utc::now(),
        };

        let text = comparison_prompt(&[analysis(Some("Eco Phone"), 8), analysis(None, 6)]);
        assert!(text.contains("Product 1: Eco Phone\nCarbon Footprint: 8/10"));
        assert!(text.contains("Product 2: Unnamed Product\n"));
        assert!(text.contains("Overall Score: 6/10\nDetails: Recycled casing."));
    }

    #[test]
    fn prompt_layout_is_interpretable() {
        let reply = "Scores:\n- Carbon Footprint Score: 7/10\n- Water Usage Score: 5/10\n- Resource Consumption Score: 8/10\n- Overall Environmental Impact Score: 7/10\n\nExplanation: Bamboo regrows quickly.\n\nSuggestions: Ship without plastic.";
        assert!(ANALYSIS_SYSTEM_PROMPT.contains("Explanation:"));
        assert!(ANALYSIS_SYSTEM_PROMPT.contains("Suggestions:"));

        let fragment = interpret(reply);
        assert_eq!(fragment.scores.carbon.get(), 7);
        assert_eq!(fragment.scores.water.get(), 5);
        assert_eq!(fragment.scores.resources.get(), 8);
        assert_eq!(fragment.scores.overall.get(), 7);
        assert_eq!(fragment.explanation, "Bamboo regrows quickly.");
    }
}
