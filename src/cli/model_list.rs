//! Model listing for the `models` subcommand.
//!
//! Prints the daemon's installed models to stdout, in daemon order, with a
//! vision tag for the ones the Vision tab would offer.

use std::error::Error;

use crate::api::models::fetch_models;
use crate::api::ModelEntry;
use crate::core::catalog::is_vision_model;
use crate::core::config::Config;

pub async fn list_models(host: Option<String>) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let base_url = config.resolve_host(host.as_deref());

    let client = reqwest::Client::new();
    let models = fetch_models(&client, &base_url, config.request_timeout()).await?;

    if models.is_empty() {
        println!("No models installed. Pull one with `ollama pull <name>`.");
        return Ok(());
    }

    let patterns = config.vision_patterns();
    println!("Models at {base_url}:");
    println!();
    for model in &models {
        println!("{}", format_model_line(model, &patterns));
    }

    Ok(())
}

fn format_model_line(model: &ModelEntry, vision_patterns: &[String]) -> String {
    let mut line = format!("  • {}", model.name);
    if let Some(details) = &model.details {
        if let Some(params) = details.parameter_size.as_deref() {
            line.push_str(&format!(" ({params}"));
            if let Some(quant) = details.quantization_level.as_deref() {
                line.push_str(&format!(", {quant}"));
            }
            line.push(')');
        }
    }
    if model.size > 0 {
        line.push_str(&format!(" — {}", format_size(model.size)));
    }
    if is_vision_model(&model.name, vision_patterns) {
        line.push_str(" [vision]");
    }
    line
}

fn format_size(bytes: u64) -> String {
    const GB: f64 = 1_000_000_000.0;
    const MB: f64 = 1_000_000.0;
    let bytes = bytes as f64;
    if bytes >= GB {
        format!("{:.1} GB", bytes / GB)
    } else {
        format!("{:.0} MB", bytes / MB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ModelDetails;
    use crate::core::constants::DEFAULT_VISION_PATTERNS;

    fn patterns() -> Vec<String> {
        DEFAULT_VISION_PATTERNS
            .iter()
            .map(|p| p.to_string())
            .collect()
    }

    #[test]
    fn formats_plain_model() {
        let model = ModelEntry {
            name: "llama3:latest".to_string(),
            size: 0,
            details: None,
        };
        assert_eq!(format_model_line(&model, &patterns()), "  • llama3:latest");
    }

    #[test]
    fn formats_details_size_and_vision_tag() {
        let model = ModelEntry {
            name: "llava:13b".to_string(),
            size: 8_000_000_000,
            details: Some(ModelDetails {
                parameter_size: Some("13B".to_string()),
                quantization_level: Some("Q4_0".to_string()),
            }),
        };
        assert_eq!(
            format_model_line(&model, &patterns()),
            "  • llava:13b (13B, Q4_0) — 8.0 GB [vision]"
        );
    }

    #[test]
    fn formats_sub_gigabyte_sizes_in_megabytes() {
        assert_eq!(format_size(750_000_000), "750 MB");
        assert_eq!(format_size(4_700_000_000), "4.7 GB");
    }
}
