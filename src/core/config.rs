//! Configuration loaded from the platform config directory.
//!
//! All session-wide settings live here: the daemon address, the request
//! timeout, default models per tab, the system prompt, the transcript path,
//! and the vision-model name patterns. The struct is passed explicitly to
//! the components that need it; there are no ambient globals.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::core::constants::{DEFAULT_HOST, DEFAULT_TIMEOUT_SECS, DEFAULT_VISION_PATTERNS};
use crate::utils::url::normalize_host;

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    /// Daemon address, e.g. "localhost:11434" or "http://ollama.lan:11434".
    pub host: Option<String>,
    /// Seconds to wait for a response before giving up.
    pub timeout_secs: Option<u64>,
    /// System prompt resent in full with every request.
    pub system_prompt: Option<String>,
    /// Transcript file; when set, exchanges are appended from startup.
    pub transcript: Option<String>,
    /// Default model per tab ("chat" / "vision").
    #[serde(default)]
    pub default_models: HashMap<String, String>,
    /// Extra name fragments that mark a model as vision-capable, on top of
    /// the built-in list.
    #[serde(default)]
    pub vision_patterns: Vec<String>,
}

impl Config {
    pub fn load() -> Result<Config, Box<dyn std::error::Error>> {
        let config_path = Self::get_config_path();
        Self::load_from_path(&config_path)
    }

    pub fn load_from_path(config_path: &PathBuf) -> Result<Config, Box<dyn std::error::Error>> {
        if config_path.exists() {
            let contents = fs::read_to_string(config_path)?;
            let config: Config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let config_path = Self::get_config_path();
        self.save_to_path(&config_path)
    }

    pub fn save_to_path(&self, config_path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    fn get_config_path() -> PathBuf {
        let proj_dirs = ProjectDirs::from("org", "permacommons", "ocular")
            .expect("Failed to determine config directory");
        proj_dirs.config_dir().join("config.toml")
    }

    /// Resolved daemon base URL, with an optional CLI override taking
    /// precedence over config, which takes precedence over the default.
    pub fn resolve_host(&self, override_host: Option<&str>) -> String {
        let host = override_host
            .or(self.host.as_deref())
            .unwrap_or(DEFAULT_HOST);
        normalize_host(host)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Built-in vision patterns plus any configured additions.
    pub fn vision_patterns(&self) -> Vec<String> {
        let mut patterns: Vec<String> = DEFAULT_VISION_PATTERNS
            .iter()
            .map(|p| p.to_string())
            .collect();
        for extra in &self.vision_patterns {
            let extra = extra.trim().to_ascii_lowercase();
            if !extra.is_empty() && !patterns.contains(&extra) {
                patterns.push(extra);
            }
        }
        patterns
    }

    pub fn get_default_model(&self, tab: &str) -> Option<&String> {
        self.default_models.get(tab)
    }

    pub fn set_default_model(&mut self, tab: String, model: String) {
        self.default_models.insert(tab, model);
    }

    pub fn unset_default_model(&mut self, tab: &str) {
        self.default_models.remove(tab);
    }

    pub fn print_all(&self) {
        println!("Current configuration:");
        match &self.host {
            Some(host) => println!("  host: {host}"),
            None => println!("  host: (unset, using {DEFAULT_HOST})"),
        }
        match self.timeout_secs {
            Some(secs) => println!("  timeout-secs: {secs}"),
            None => println!("  timeout-secs: (unset, using {DEFAULT_TIMEOUT_SECS})"),
        }
        match &self.system_prompt {
            Some(prompt) => println!("  system-prompt: {prompt}"),
            None => println!("  system-prompt: (unset)"),
        }
        match &self.transcript {
            Some(path) => println!("  transcript: {path}"),
            None => println!("  transcript: (unset)"),
        }
        if self.default_models.is_empty() {
            println!("  default-models: (none set)");
        } else {
            println!("  default-models:");
            for (tab, model) in &self.default_models {
                println!("    {tab}: {model}");
            }
        }
        if !self.vision_patterns.is_empty() {
            println!("  vision-patterns: {}", self.vision_patterns.join(", "));
        }
    }
}
