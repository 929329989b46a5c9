//! Main event loop for the interactive session.
//!
//! The loop owns the terminal, the input textarea, and the app state. Chat
//! requests and model-directory refreshes run on background tasks and report
//! back over channels; the loop drains those channels, handles keyboard
//! input, and redraws. Stream deliveries carry the stream id they belong to,
//! so anything arriving after a cancel is silently dropped by the app.

use std::error::Error;
use std::io;
use std::time::Duration;

use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tui_textarea::TextArea;

use crate::api::models::{fetch_models, probe_daemon};
use crate::api::{ApiError, ModelEntry};
use crate::commands::{process_input, CommandResult};
use crate::core::app::{App, AppInit};
use crate::core::chat_stream::{ChatStreamService, StreamMessage};
use crate::core::config::Config;
use crate::ui::renderer::ui;

/// How often the loop wakes up to drain channels when no input arrives.
const TICK: Duration = Duration::from_millis(50);

/// Background results delivered to the loop outside the chat stream.
enum LoopEvent {
    ModelsLoaded(Result<Vec<ModelEntry>, ApiError>),
}

pub struct ChatArgs {
    pub model: Option<String>,
    pub host: Option<String>,
    pub log: Option<String>,
    pub system: Option<String>,
}

type Term = Terminal<CrosstermBackend<io::Stdout>>;

pub async fn run_chat(args: ChatArgs) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;

    let init = AppInit {
        base_url: config.resolve_host(args.host.as_deref()),
        timeout: config.request_timeout(),
        system_prompt: args.system.or_else(|| config.system_prompt.clone()),
        transcript_path: args.log.or_else(|| config.transcript.clone()),
        chat_model: args
            .model
            .or_else(|| config.get_default_model("chat").cloned()),
        vision_model: config.get_default_model("vision").cloned(),
        vision_patterns: config.vision_patterns(),
    };
    let mut app = App::new(init);

    // Startup reachability check: a stopped daemon becomes a status warning,
    // not a crash.
    app.daemon_online = probe_daemon(&app.client, &app.base_url).await;

    let (stream_service, stream_rx) = ChatStreamService::new();
    let (loop_tx, loop_rx) = mpsc::unbounded_channel();
    spawn_model_loader(&app, loop_tx.clone());

    let mut terminal = setup_terminal()?;
    let result = event_loop(
        &mut terminal,
        &mut app,
        stream_service,
        stream_rx,
        loop_tx,
        loop_rx,
    )
    .await;

    app.cancel_all();
    restore_terminal(&mut terminal)?;
    result
}

async fn event_loop(
    terminal: &mut Term,
    app: &mut App,
    stream_service: ChatStreamService,
    mut stream_rx: mpsc::UnboundedReceiver<(StreamMessage, u64)>,
    loop_tx: mpsc::UnboundedSender<LoopEvent>,
    mut loop_rx: mpsc::UnboundedReceiver<LoopEvent>,
) -> Result<(), Box<dyn Error>> {
    let mut textarea = TextArea::default();

    loop {
        while let Ok((message, stream_id)) = stream_rx.try_recv() {
            app.handle_stream(message, stream_id);
        }
        while let Ok(event) = loop_rx.try_recv() {
            handle_loop_event(app, event);
        }

        terminal.draw(|f| ui(f, app, &textarea))?;

        if app.exit_requested {
            return Ok(());
        }

        if !event::poll(TICK)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        match key.code {
            KeyCode::Char('c') if ctrl => {
                app.exit_requested = true;
            }
            KeyCode::Tab => {
                app.switch_tab();
            }
            KeyCode::Esc => {
                app.cancel_active();
            }
            KeyCode::Enter if alt => {
                textarea.insert_newline();
            }
            KeyCode::Enter => {
                let input = textarea.lines().join("\n");
                if input.trim().is_empty() {
                    continue;
                }
                match process_input(app, &input) {
                    CommandResult::Submit(text) => {
                        if let Some(params) = app.submit(&text) {
                            stream_service.spawn_stream(params);
                            textarea = TextArea::default();
                        }
                    }
                    CommandResult::RefreshModels => {
                        spawn_model_loader(app, loop_tx.clone());
                        app.set_status("Reloading model list…");
                        textarea = TextArea::default();
                    }
                    CommandResult::Quit => {
                        app.exit_requested = true;
                    }
                    CommandResult::Continue => {
                        textarea = TextArea::default();
                    }
                }
            }
            KeyCode::Char('n') if ctrl => {
                app.cycle_model(true);
            }
            KeyCode::Char('p') if ctrl => {
                app.cycle_model(false);
            }
            KeyCode::F(5) => {
                spawn_model_loader(app, loop_tx.clone());
                app.set_status("Reloading model list…");
            }
            KeyCode::PageUp => {
                let tab = app.active_tab_mut();
                tab.auto_scroll = false;
                tab.scroll_offset = tab.scroll_offset.saturating_sub(10);
            }
            KeyCode::PageDown => {
                let tab = app.active_tab_mut();
                tab.scroll_offset = tab.scroll_offset.saturating_add(10);
                // Resume following the stream once the user pages back down.
                tab.auto_scroll = true;
            }
            _ => {
                textarea.input(key);
            }
        }
    }
}

fn handle_loop_event(app: &mut App, event: LoopEvent) {
    match event {
        LoopEvent::ModelsLoaded(Ok(entries)) => {
            app.clear_status();
            if entries.is_empty() {
                app.set_status("The daemon reports no installed models");
            }
            app.set_catalog(entries);
        }
        LoopEvent::ModelsLoaded(Err(e)) => {
            if matches!(e, ApiError::Connection { .. } | ApiError::Timeout { .. }) {
                app.daemon_online = false;
            }
            app.set_status(format!("Could not list models: {e}"));
        }
    }
}

fn spawn_model_loader(app: &App, tx: mpsc::UnboundedSender<LoopEvent>) {
    let client = app.client.clone();
    let base_url = app.base_url.clone();
    let timeout = app.timeout;
    tokio::spawn(async move {
        let result = fetch_models(&client, &base_url, timeout).await;
        let _ = tx.send(LoopEvent::ModelsLoaded(result));
    });
}

fn setup_terminal() -> Result<Term, Box<dyn Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).inspect_err(|_| {
        let _ = disable_raw_mode();
    })?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Term) -> Result<(), Box<dyn Error>> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
