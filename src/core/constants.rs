//! Shared constants used across the application

/// Daemon address used when neither config nor CLI provide one.
pub const DEFAULT_HOST: &str = "http://localhost:11434";

/// Request timeout applied when config does not set one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Prompt submitted on the Vision tab when the user attaches an image
/// without typing anything.
pub const DEFAULT_VISION_PROMPT: &str = "Extract text from this image:";

/// Name fragments that mark a model as vision-capable.
///
/// The daemon's tags listing carries no capability metadata, so the Vision
/// tab filters by name. Extendable via the `vision-patterns` config key.
pub const DEFAULT_VISION_PATTERNS: &[&str] =
    &["llava", "bakllava", "moondream", "minicpm-v", "-vl", "vision"];
