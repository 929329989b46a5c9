//! Application state for the interactive session.
//!
//! Owns the two tab sessions (Chat and Vision), the model catalog, the
//! transcript, and the submission policy: at most one in-flight request per
//! tab, stale stream deliveries discarded by id, cancellation drops partial
//! output without persisting it. The daemon address and timeout are read at
//! startup and passed in explicitly; nothing here is ambient.

use std::path::PathBuf;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::api::{build_turn, ModelEntry};
use crate::core::catalog::{is_vision_model, ModelCatalog};
use crate::core::chat_stream::{StreamMessage, StreamParams};
use crate::core::constants::DEFAULT_VISION_PROMPT;
use crate::core::message::Message;
use crate::core::transcript::TranscriptLog;
use crate::utils::image::{is_supported_image, load_image_payload};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabKind {
    Chat,
    Vision,
}

impl TabKind {
    pub fn title(self) -> &'static str {
        match self {
            TabKind::Chat => "Chat",
            TabKind::Vision => "Vision",
        }
    }

    pub fn other(self) -> TabKind {
        match self {
            TabKind::Chat => TabKind::Vision,
            TabKind::Vision => TabKind::Chat,
        }
    }
}

/// A request currently on the wire for one tab.
pub struct InFlight {
    pub stream_id: u64,
    pub cancel_token: CancellationToken,
    /// Prompt as submitted, kept for the transcript entry.
    pub prompt: String,
}

pub struct TabSession {
    pub messages: Vec<Message>,
    pub model: Option<String>,
    /// Image staged for the next submission (Vision tab only).
    pub attachment: Option<PathBuf>,
    pub in_flight: Option<InFlight>,
    /// Fragments of the response currently streaming in.
    pub response: String,
    pub scroll_offset: u16,
    pub auto_scroll: bool,
}

impl TabSession {
    fn new(model: Option<String>) -> Self {
        TabSession {
            messages: Vec::new(),
            model,
            attachment: None,
            in_flight: None,
            response: String::new(),
            scroll_offset: 0,
            auto_scroll: true,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }
}

/// Startup parameters resolved from config and CLI flags.
pub struct AppInit {
    pub base_url: String,
    pub timeout: Duration,
    pub system_prompt: Option<String>,
    pub transcript_path: Option<String>,
    pub chat_model: Option<String>,
    pub vision_model: Option<String>,
    pub vision_patterns: Vec<String>,
}

pub struct App {
    pub client: reqwest::Client,
    pub base_url: String,
    pub timeout: Duration,
    pub catalog: ModelCatalog,
    pub vision_patterns: Vec<String>,
    pub system_prompt: Option<String>,
    pub transcript: TranscriptLog,
    pub chat_tab: TabSession,
    pub vision_tab: TabSession,
    pub active: TabKind,
    pub daemon_online: bool,
    pub status: Option<String>,
    pub exit_requested: bool,
    next_stream_id: u64,
}

impl App {
    pub fn new(init: AppInit) -> Self {
        App {
            client: reqwest::Client::new(),
            base_url: init.base_url,
            timeout: init.timeout,
            catalog: ModelCatalog::new(),
            vision_patterns: init.vision_patterns,
            system_prompt: init.system_prompt,
            transcript: TranscriptLog::new(init.transcript_path),
            chat_tab: TabSession::new(init.chat_model),
            vision_tab: TabSession::new(init.vision_model),
            active: TabKind::Chat,
            daemon_online: false,
            status: None,
            exit_requested: false,
            next_stream_id: 0,
        }
    }

    pub fn tab(&self, kind: TabKind) -> &TabSession {
        match kind {
            TabKind::Chat => &self.chat_tab,
            TabKind::Vision => &self.vision_tab,
        }
    }

    pub fn tab_mut(&mut self, kind: TabKind) -> &mut TabSession {
        match kind {
            TabKind::Chat => &mut self.chat_tab,
            TabKind::Vision => &mut self.vision_tab,
        }
    }

    pub fn active_tab(&self) -> &TabSession {
        self.tab(self.active)
    }

    pub fn active_tab_mut(&mut self) -> &mut TabSession {
        self.tab_mut(self.active)
    }

    pub fn switch_tab(&mut self) {
        self.active = self.active.other();
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    /// Models the given tab is allowed to offer. The Vision tab filters to
    /// vision-capable names; the Chat tab offers everything.
    pub fn models_for(&self, kind: TabKind) -> Vec<&str> {
        match kind {
            TabKind::Chat => self.catalog.names(),
            TabKind::Vision => self.catalog.vision_names(&self.vision_patterns),
        }
    }

    /// Install a fresh model listing and reconcile each tab's selection:
    /// a selection that vanished (or was never set) falls back to the first
    /// model the tab is allowed to offer.
    pub fn set_catalog(&mut self, entries: Vec<ModelEntry>) {
        self.catalog.replace(entries);
        self.daemon_online = true;
        for kind in [TabKind::Chat, TabKind::Vision] {
            let allowed: Vec<String> = self.models_for(kind).iter().map(|s| s.to_string()).collect();
            let tab = self.tab_mut(kind);
            let keep = tab
                .model
                .as_ref()
                .map(|m| allowed.iter().any(|a| a == m))
                .unwrap_or(false);
            if !keep {
                tab.model = allowed.first().cloned();
            }
        }
    }

    /// Cycle the active tab's model selection through its allowed list.
    pub fn cycle_model(&mut self, forward: bool) {
        let allowed: Vec<String> = self
            .models_for(self.active)
            .iter()
            .map(|s| s.to_string())
            .collect();
        if allowed.is_empty() {
            self.set_status("No models available — is anything pulled?");
            return;
        }
        let tab = self.active_tab_mut();
        let current = tab
            .model
            .as_ref()
            .and_then(|m| allowed.iter().position(|a| a == m))
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % allowed.len()
        } else {
            (current + allowed.len() - 1) % allowed.len()
        };
        tab.model = Some(allowed[next].clone());
    }

    /// Select a model by name on the active tab.
    pub fn select_model(&mut self, name: &str) {
        if !self.catalog.contains(name) {
            self.set_status(format!("Unknown model: {name}"));
            return;
        }
        if self.active == TabKind::Vision && !is_vision_model(name, &self.vision_patterns) {
            self.set_status(format!("{name} does not look vision-capable"));
            return;
        }
        self.active_tab_mut().model = Some(name.to_string());
        self.set_status(format!("Model set to {name}"));
    }

    /// Stage an image for the next Vision submission.
    pub fn set_attachment(&mut self, path: PathBuf) {
        if self.active != TabKind::Vision {
            self.set_status("Images can only be attached on the Vision tab");
            return;
        }
        if !is_supported_image(&path) {
            self.set_status("Only image files (png, jpg, jpeg, gif, bmp, webp) are supported");
            return;
        }
        if !path.exists() {
            self.set_status(format!("No such file: {}", path.display()));
            return;
        }
        self.set_status(format!("Image attached: {}", path.display()));
        self.active_tab_mut().attachment = Some(path);
    }

    pub fn clear_attachment(&mut self) {
        self.active_tab_mut().attachment = None;
        self.set_status("Image cleared");
    }

    /// Clear the active tab's conversation and any staged attachment.
    pub fn clear_active_tab(&mut self) {
        let tab = self.active_tab_mut();
        tab.messages.clear();
        tab.response.clear();
        tab.attachment = None;
        tab.scroll_offset = 0;
        tab.auto_scroll = true;
        self.clear_status();
    }

    /// Validate a submission on the active tab and build the stream
    /// parameters for it. Returns `None` (with a status message) when the
    /// submission is rejected; the caller spawns the stream otherwise.
    pub fn submit(&mut self, input: &str) -> Option<StreamParams> {
        let kind = self.active;
        if self.tab(kind).is_busy() {
            self.set_status("Busy — a request is already in flight on this tab (Esc to cancel)");
            return None;
        }

        let Some(model) = self.tab(kind).model.clone() else {
            self.set_status("No model selected (Ctrl+N to cycle, /models to refresh)");
            return None;
        };

        let trimmed = input.trim();
        let (prompt, images, display) = match kind {
            TabKind::Chat => {
                if trimmed.is_empty() {
                    self.set_status("Type a prompt first");
                    return None;
                }
                (trimmed.to_string(), None, trimmed.to_string())
            }
            TabKind::Vision => {
                let Some(path) = self.tab(kind).attachment.clone() else {
                    self.set_status("Attach an image first (/image <path>)");
                    return None;
                };
                let payload = match load_image_payload(&path) {
                    Ok(payload) => payload,
                    Err(e) => {
                        self.set_status(e.to_string());
                        return None;
                    }
                };
                // An empty prompt with only an image is permitted; fall back
                // to the stock extraction prompt.
                let prompt = if trimmed.is_empty() {
                    DEFAULT_VISION_PROMPT.to_string()
                } else {
                    trimmed.to_string()
                };
                let display = format!(
                    "{prompt} [image: {}]",
                    path.file_name().unwrap_or_default().to_string_lossy()
                );
                (prompt, Some(vec![payload]), display)
            }
        };

        let api_messages = build_turn(self.system_prompt.as_deref(), &prompt, images);

        self.next_stream_id += 1;
        let stream_id = self.next_stream_id;
        let cancel_token = CancellationToken::new();

        let tab = self.tab_mut(kind);
        tab.messages.push(Message::user(display));
        tab.response.clear();
        tab.auto_scroll = true;
        tab.in_flight = Some(InFlight {
            stream_id,
            cancel_token: cancel_token.clone(),
            prompt: prompt.clone(),
        });
        self.clear_status();

        Some(StreamParams {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            model,
            api_messages,
            timeout: self.timeout,
            cancel_token,
            stream_id,
        })
    }

    fn tab_kind_for_stream(&self, stream_id: u64) -> Option<TabKind> {
        for kind in [TabKind::Chat, TabKind::Vision] {
            if self
                .tab(kind)
                .in_flight
                .as_ref()
                .map(|f| f.stream_id == stream_id)
                .unwrap_or(false)
            {
                return Some(kind);
            }
        }
        None
    }

    /// Route one stream delivery to its tab. Deliveries whose id matches no
    /// in-flight request (cancelled or superseded) are dropped.
    pub fn handle_stream(&mut self, message: StreamMessage, stream_id: u64) {
        let Some(kind) = self.tab_kind_for_stream(stream_id) else {
            return;
        };

        match message {
            StreamMessage::Chunk(content) => {
                self.tab_mut(kind).response.push_str(&content);
            }
            StreamMessage::Error(text) => {
                let tab = self.tab_mut(kind);
                tab.response.clear();
                tab.messages.push(Message::app(text.clone()));
                if text.contains("cannot reach") {
                    self.daemon_online = false;
                }
            }
            StreamMessage::End => self.finish_stream(kind),
        }
    }

    /// A completed response becomes a chat entry and, when recording is on,
    /// a transcript exchange. Persistence failures are reported without
    /// touching the displayed response.
    fn finish_stream(&mut self, kind: TabKind) {
        let tab = self.tab_mut(kind);
        let Some(in_flight) = tab.in_flight.take() else {
            return;
        };
        if tab.response.is_empty() {
            return;
        }

        let response = std::mem::take(&mut tab.response);
        let model = tab.model.clone().unwrap_or_default();
        tab.messages.push(Message::assistant(response.clone()));
        self.daemon_online = true;

        if let Err(e) = self
            .transcript
            .record_exchange(&model, &in_flight.prompt, &response)
        {
            self.set_status(format!("Transcript write failed: {e}"));
        }
    }

    /// Cancel the active tab's in-flight request, discarding any partial
    /// output. Nothing is displayed or persisted for a cancelled request.
    pub fn cancel_active(&mut self) {
        let tab = self.active_tab_mut();
        if let Some(in_flight) = tab.in_flight.take() {
            in_flight.cancel_token.cancel();
            tab.response.clear();
            tab.messages.push(Message::app("Request cancelled."));
        }
    }

    /// Cancel everything on shutdown.
    pub fn cancel_all(&mut self) {
        for kind in [TabKind::Chat, TabKind::Vision] {
            let tab = self.tab_mut(kind);
            if let Some(in_flight) = tab.in_flight.take() {
                in_flight.cancel_token.cancel();
                tab.response.clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::DEFAULT_VISION_PATTERNS;
    use std::io::Write;
    use tempfile::TempDir;

    fn entry(name: &str) -> ModelEntry {
        ModelEntry {
            name: name.to_string(),
            size: 0,
            details: None,
        }
    }

    fn test_app() -> App {
        App::new(AppInit {
            base_url: "http://localhost:11434".to_string(),
            timeout: Duration::from_secs(30),
            system_prompt: None,
            transcript_path: None,
            chat_model: None,
            vision_model: None,
            vision_patterns: DEFAULT_VISION_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
        })
    }

    fn write_test_image(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("photo.png");
        let mut file = std::fs::File::create(&path).expect("create");
        file.write_all(&[0x89, 0x50, 0x4e, 0x47]).expect("write");
        path
    }

    #[test]
    fn catalog_reconciles_tab_selections() {
        let mut app = test_app();
        app.set_catalog(vec![entry("llama3"), entry("llava")]);

        assert_eq!(app.chat_tab.model.as_deref(), Some("llama3"));
        assert_eq!(app.vision_tab.model.as_deref(), Some("llava"));
    }

    #[test]
    fn vision_tab_never_offers_text_only_models() {
        let mut app = test_app();
        app.set_catalog(vec![entry("llama3"), entry("mistral")]);

        assert!(app.models_for(TabKind::Vision).is_empty());
        assert_eq!(app.vision_tab.model, None);
        assert_eq!(app.models_for(TabKind::Chat), vec!["llama3", "mistral"]);
    }

    #[test]
    fn refresh_supersedes_a_vanished_selection() {
        let mut app = test_app();
        app.set_catalog(vec![entry("llama3")]);
        assert_eq!(app.chat_tab.model.as_deref(), Some("llama3"));

        app.set_catalog(vec![entry("phi3")]);
        assert_eq!(app.chat_tab.model.as_deref(), Some("phi3"));
    }

    #[test]
    fn submit_requires_a_model() {
        let mut app = test_app();
        assert!(app.submit("Hello").is_none());
        assert!(app.status.as_deref().unwrap().contains("No model"));
    }

    #[test]
    fn submit_rejects_empty_chat_prompt() {
        let mut app = test_app();
        app.set_catalog(vec![entry("llama3")]);
        assert!(app.submit("   ").is_none());
        assert!(app.status.as_deref().unwrap().contains("prompt"));
    }

    #[test]
    fn submit_builds_stream_params_and_marks_busy() {
        let mut app = test_app();
        app.set_catalog(vec![entry("llama3")]);

        let params = app.submit("Hello").expect("params");
        assert_eq!(params.model, "llama3");
        assert_eq!(params.api_messages.len(), 1);
        assert_eq!(params.api_messages[0].content, "Hello");
        assert!(app.chat_tab.is_busy());
        assert_eq!(app.chat_tab.messages.last().unwrap().content, "Hello");
    }

    #[test]
    fn second_submission_while_busy_is_rejected() {
        let mut app = test_app();
        app.set_catalog(vec![entry("llama3")]);

        assert!(app.submit("first").is_some());
        assert!(app.submit("second").is_none());
        assert!(app.status.as_deref().unwrap().contains("Busy"));
    }

    #[test]
    fn tabs_are_independent_for_busy_checks() {
        let dir = TempDir::new().expect("temp dir");
        let image = write_test_image(&dir);

        let mut app = test_app();
        app.set_catalog(vec![entry("llama3"), entry("llava")]);

        assert!(app.submit("chat question").is_some());

        app.switch_tab();
        app.set_attachment(image);
        assert!(app.submit("what is this?").is_some());

        assert!(app.chat_tab.is_busy());
        assert!(app.vision_tab.is_busy());
    }

    #[test]
    fn vision_submit_requires_attachment() {
        let mut app = test_app();
        app.set_catalog(vec![entry("llava")]);
        app.switch_tab();

        assert!(app.submit("what is this?").is_none());
        assert!(app.status.as_deref().unwrap().contains("Attach an image"));
    }

    #[test]
    fn empty_vision_prompt_falls_back_to_default() {
        let dir = TempDir::new().expect("temp dir");
        let image = write_test_image(&dir);

        let mut app = test_app();
        app.set_catalog(vec![entry("llava")]);
        app.switch_tab();
        app.set_attachment(image);

        let params = app.submit("").expect("params");
        let user = params.api_messages.last().unwrap();
        assert_eq!(user.content, DEFAULT_VISION_PROMPT);
        assert!(user.images.is_some());
    }

    #[test]
    fn system_prompt_rides_along_on_every_turn() {
        let mut app = test_app();
        app.system_prompt = Some("Be terse.".to_string());
        app.set_catalog(vec![entry("llama3")]);

        let params = app.submit("Hello").expect("params");
        assert_eq!(params.api_messages.len(), 2);
        assert_eq!(params.api_messages[0].content, "Be terse.");
    }

    #[test]
    fn chunks_accumulate_and_end_appends_assistant_message() {
        let mut app = test_app();
        app.set_catalog(vec![entry("llama3")]);
        let params = app.submit("Hello").expect("params");
        let id = params.stream_id;

        app.handle_stream(StreamMessage::Chunk("Hel".to_string()), id);
        app.handle_stream(StreamMessage::Chunk("lo".to_string()), id);
        assert_eq!(app.chat_tab.response, "Hello");

        app.handle_stream(StreamMessage::End, id);
        assert!(!app.chat_tab.is_busy());
        assert_eq!(app.chat_tab.messages.last().unwrap().content, "Hello");
        assert!(app.chat_tab.response.is_empty());
    }

    #[test]
    fn stale_deliveries_are_dropped() {
        let mut app = test_app();
        app.set_catalog(vec![entry("llama3")]);
        let params = app.submit("Hello").expect("params");
        let id = params.stream_id;

        app.handle_stream(StreamMessage::Chunk("partial".to_string()), id);
        app.cancel_active();

        // Fragments and the end marker for the cancelled request arrive late.
        app.handle_stream(StreamMessage::Chunk(" more".to_string()), id);
        app.handle_stream(StreamMessage::End, id);

        assert!(app.chat_tab.response.is_empty());
        // Only the user message and the cancellation notice are present.
        let contents: Vec<&str> = app
            .chat_tab
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["Hello", "Request cancelled."]);
    }

    #[test]
    fn cancelled_request_writes_no_transcript() {
        let dir = TempDir::new().expect("temp dir");
        let transcript = dir.path().join("transcript.md");

        let mut app = App::new(AppInit {
            base_url: "http://localhost:11434".to_string(),
            timeout: Duration::from_secs(30),
            system_prompt: None,
            transcript_path: Some(transcript.to_string_lossy().into_owned()),
            chat_model: None,
            vision_model: None,
            vision_patterns: Vec::new(),
        });
        app.set_catalog(vec![entry("llama3")]);

        let params = app.submit("secret").expect("params");
        let id = params.stream_id;
        app.handle_stream(StreamMessage::Chunk("partial answer".to_string()), id);
        app.cancel_active();
        app.handle_stream(StreamMessage::End, id);

        assert!(!transcript.exists() || !std::fs::read_to_string(&transcript)
            .expect("read")
            .contains("partial answer"));
    }

    #[test]
    fn completed_exchange_reaches_the_transcript() {
        let dir = TempDir::new().expect("temp dir");
        let transcript = dir.path().join("transcript.md");

        let mut app = App::new(AppInit {
            base_url: "http://localhost:11434".to_string(),
            timeout: Duration::from_secs(30),
            system_prompt: None,
            transcript_path: Some(transcript.to_string_lossy().into_owned()),
            chat_model: None,
            vision_model: None,
            vision_patterns: Vec::new(),
        });
        app.set_catalog(vec![entry("llama3")]);

        let params = app.submit("What is Rust?").expect("params");
        let id = params.stream_id;
        app.handle_stream(StreamMessage::Chunk("A systems language.".to_string()), id);
        app.handle_stream(StreamMessage::End, id);

        let contents = std::fs::read_to_string(&transcript).expect("read");
        assert!(contents.contains("What is Rust?"));
        assert!(contents.contains("A systems language."));
    }

    #[test]
    fn stream_error_replaces_response_with_inline_message() {
        let mut app = test_app();
        app.set_catalog(vec![entry("llama3")]);
        let params = app.submit("Hello").expect("params");
        let id = params.stream_id;

        app.handle_stream(StreamMessage::Chunk("par".to_string()), id);
        app.handle_stream(
            StreamMessage::Error("model 'llama3' rejected the request".to_string()),
            id,
        );
        app.handle_stream(StreamMessage::End, id);

        assert!(!app.chat_tab.is_busy());
        assert!(app
            .chat_tab
            .messages
            .iter()
            .any(|m| m.content.contains("rejected")));
        assert!(app.chat_tab.response.is_empty());
    }

    #[test]
    fn connection_error_flips_daemon_status() {
        let mut app = test_app();
        app.set_catalog(vec![entry("llama3")]);
        assert!(app.daemon_online);

        let params = app.submit("Hello").expect("params");
        let id = params.stream_id;
        app.handle_stream(
            StreamMessage::Error("cannot reach the Ollama daemon: connection refused".to_string()),
            id,
        );

        assert!(!app.daemon_online);
    }

    #[test]
    fn cycle_model_wraps_within_allowed_list() {
        let mut app = test_app();
        app.set_catalog(vec![entry("a"), entry("b"), entry("c")]);

        assert_eq!(app.chat_tab.model.as_deref(), Some("a"));
        app.cycle_model(true);
        assert_eq!(app.chat_tab.model.as_deref(), Some("b"));
        app.cycle_model(false);
        app.cycle_model(false);
        assert_eq!(app.chat_tab.model.as_deref(), Some("c"));
    }

    #[test]
    fn select_model_enforces_vision_policy() {
        let mut app = test_app();
        app.set_catalog(vec![entry("llama3"), entry("llava")]);
        app.switch_tab();

        app.select_model("llama3");
        assert_ne!(app.vision_tab.model.as_deref(), Some("llama3"));

        app.select_model("llava");
        assert_eq!(app.vision_tab.model.as_deref(), Some("llava"));
    }

    #[test]
    fn attachment_rejects_non_images() {
        let mut app = test_app();
        app.switch_tab();
        app.set_attachment(PathBuf::from("notes.txt"));
        assert!(app.vision_tab.attachment.is_none());
        assert!(app.status.as_deref().unwrap().contains("supported"));
    }

    #[test]
    fn clear_tab_resets_conversation_and_attachment() {
        let dir = TempDir::new().expect("temp dir");
        let image = write_test_image(&dir);

        let mut app = test_app();
        app.set_catalog(vec![entry("llava")]);
        app.switch_tab();
        app.set_attachment(image);
        app.vision_tab.messages.push(Message::user("hi"));

        app.clear_active_tab();
        assert!(app.vision_tab.messages.is_empty());
        assert!(app.vision_tab.attachment.is_none());
    }
}
