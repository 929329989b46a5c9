//! TUI-less "ask" command: one prompt, one batched response.
//!
//! Useful for scripting and for checking that the daemon answers at all.
//! Uses the non-streaming chat variant and prints the full response.

use std::error::Error;
use std::path::PathBuf;

use crate::api::chat::send_chat;
use crate::api::models::fetch_models;
use crate::api::build_turn;
use crate::core::catalog::is_vision_model;
use crate::core::config::Config;
use crate::core::constants::DEFAULT_VISION_PROMPT;
use crate::core::transcript::TranscriptLog;
use crate::utils::image::load_image_payload;

pub struct AskArgs {
    pub prompt: Vec<String>,
    pub image: Option<PathBuf>,
    pub model: Option<String>,
    pub host: Option<String>,
    pub system: Option<String>,
    pub log: Option<String>,
}

pub async fn run_ask(args: AskArgs) -> Result<(), Box<dyn Error>> {
    let prompt = args.prompt.join(" ");
    if prompt.is_empty() && args.image.is_none() {
        eprintln!("Usage: ocular ask <prompt> [--image <path>]");
        std::process::exit(1);
    }

    let config = Config::load()?;
    let base_url = config.resolve_host(args.host.as_deref());
    let timeout = config.request_timeout();
    let client = reqwest::Client::new();

    let images = match &args.image {
        Some(path) => Some(vec![load_image_payload(path)?]),
        None => None,
    };
    // Image without prompt text: same fallback the Vision tab uses.
    let prompt = if prompt.is_empty() {
        DEFAULT_VISION_PROMPT.to_string()
    } else {
        prompt
    };

    let model = resolve_model(&args, &config, &client, &base_url).await?;
    let system = args.system.or_else(|| config.system_prompt.clone());
    let messages = build_turn(system.as_deref(), &prompt, images);

    let response = match send_chat(&client, &base_url, &model, messages, timeout).await {
        Ok(response) => response,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    println!("{response}");

    let transcript = TranscriptLog::new(args.log.or_else(|| config.transcript.clone()));
    if let Err(e) = transcript.record_exchange(&model, &prompt, &response) {
        eprintln!("Warning: transcript write failed: {e}");
    }

    Ok(())
}

/// Pick the model to use: explicit flag, then the config default for the
/// relevant tab, then the first suitable model the daemon lists.
async fn resolve_model(
    args: &AskArgs,
    config: &Config,
    client: &reqwest::Client,
    base_url: &str,
) -> Result<String, Box<dyn Error>> {
    if let Some(model) = &args.model {
        return Ok(model.clone());
    }

    let tab = if args.image.is_some() { "vision" } else { "chat" };
    if let Some(model) = config.get_default_model(tab) {
        return Ok(model.clone());
    }

    let models = fetch_models(client, base_url, config.request_timeout()).await?;
    let patterns = config.vision_patterns();
    let picked = models
        .iter()
        .map(|m| m.name.as_str())
        .find(|name| args.image.is_none() || is_vision_model(name, &patterns));

    match picked {
        Some(name) => Ok(name.to_string()),
        None if args.image.is_some() => {
            Err("no vision-capable model installed (try `ollama pull llava`)".into())
        }
        None => Err("no models installed (try `ollama pull llama3`)".into()),
    }
}
