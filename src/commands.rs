//! Slash-command parsing for the chat input.
//!
//! Anything that does not start with `/` is a prompt submission. Commands
//! act on the active tab.

use std::path::PathBuf;

use crate::core::app::App;
use crate::core::message::Message;

pub enum CommandResult {
    /// Command handled in place; nothing else to do.
    Continue,
    /// Not a command: submit as a prompt.
    Submit(String),
    /// Reload the model directory from the daemon.
    RefreshModels,
    /// Leave the application.
    Quit,
}

const HELP_TEXT: &str = "\
Commands:
  /image <path>   Attach an image (Vision tab); /image clears it
  /model <name>   Select a model on this tab
  /models         Reload the model list from the daemon
  /system <text>  Set the system prompt; /system clears it
  /log <file>     Record exchanges to a file; /log toggles pause/resume
  /clear          Clear this tab's conversation
  /quit           Exit
Keys:
  Tab switch tab · Enter send · Alt+Enter newline · Esc cancel request
  Ctrl+N/Ctrl+P cycle model · PgUp/PgDn scroll · Ctrl+C quit";

pub fn process_input(app: &mut App, input: &str) -> CommandResult {
    let trimmed = input.trim();

    if !trimmed.starts_with('/') {
        return CommandResult::Submit(input.to_string());
    }

    let (command, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (trimmed, ""),
    };

    match command {
        "/help" => {
            let tab = app.active_tab_mut();
            tab.messages.push(Message::app(HELP_TEXT));
            CommandResult::Continue
        }
        "/log" => {
            if rest.is_empty() {
                match app.transcript.toggle() {
                    Ok(message) => app.set_status(message),
                    Err(e) => app.set_status(e),
                }
            } else {
                match app.transcript.set_file(rest.to_string()) {
                    Ok(message) => app.set_status(message),
                    Err(e) => app.set_status(format!("Could not open transcript: {e}")),
                }
            }
            CommandResult::Continue
        }
        "/system" => {
            if rest.is_empty() {
                app.system_prompt = None;
                app.set_status("System prompt cleared");
            } else {
                app.system_prompt = Some(rest.to_string());
                app.set_status("System prompt set");
            }
            CommandResult::Continue
        }
        "/image" => {
            if rest.is_empty() {
                app.clear_attachment();
            } else {
                app.set_attachment(PathBuf::from(rest));
            }
            CommandResult::Continue
        }
        "/model" => {
            if rest.is_empty() {
                app.set_status("Usage: /model <name>");
            } else {
                app.select_model(rest);
            }
            CommandResult::Continue
        }
        "/models" => CommandResult::RefreshModels,
        "/clear" => {
            app.clear_active_tab();
            CommandResult::Continue
        }
        "/quit" | "/exit" => CommandResult::Quit,
        _ => {
            app.set_status(format!("Unknown command: {command} (try /help)"));
            CommandResult::Continue
        }
    }
}
