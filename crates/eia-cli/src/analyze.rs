//! Assessment commands: offline interpretation and live LLM analysis.

use std::io::Read;
use std::path::Path;

use anyhow::Context;
use eia_analysis::{Interpreter, PatternInterpreter, ANALYSIS_SYSTEM_PROMPT};
use eia_core::validation::validate_analysis_text;
use eia_llm::ChatClient;

fn read_input(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            Ok(text)
        }
    }
}

/// Prints the interpretation of an assessment text without calling any service.
pub(crate) fn run_interpret(file: Option<&Path>) -> anyhow::Result<()> {
    let text = read_input(file)?;
    let fragment = PatternInterpreter.interpret(&text);
    println!("{}", serde_json::to_string_pretty(&fragment)?);
    Ok(())
}

/// Requests an assessment of `text`, interprets it and optionally stores it.
pub(crate) async fn run_analyze(text: &str, save: bool) -> anyhow::Result<()> {
    validate_analysis_text(text).map_err(|e| anyhow::anyhow!("invalid product text: {e}"))?;
    let text = text.trim();

    let config = eia_core::load_app_config()?;
    let client = ChatClient::new(&config.llm)?;
    tracing::info!(model = client.model(), "requesting assessment");

    let raw = client
        .complete(ANALYSIS_SYSTEM_PROMPT, text)
        .await?
        .unwrap_or_default();
    let fragment = PatternInterpreter.interpret(&raw);

    if !save {
        println!("{}", serde_json::to_string_pretty(&fragment)?);
        return Ok(());
    }

    let pool = eia_db::connect_pool_from_config(&config)
        .await
        .context("failed to connect to database")?;
    let row = eia_db::create_analysis(
        &pool,
        eia_db::NewAnalysis {
            product_id: None,
            product_description: text,
            fragment: &fragment,
            raw_analysis: &raw,
        },
    )
    .await?;
    let analysis = eia_core::Analysis::try_from(row)?;
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}
