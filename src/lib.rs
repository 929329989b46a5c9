//! Ocular is a terminal-first chat client for models served by a locally
//! running Ollama daemon, including multimodal (vision) models.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`api`] defines the daemon's wire payloads plus the model-directory
//!   and batched-chat clients.
//! - [`core`] owns runtime state: per-tab sessions, the model catalog,
//!   configuration, transcripts, and streaming orchestration.
//! - [`ui`] renders the terminal interface and runs the interactive event
//!   loop that drives user input and display updates.
//! - [`commands`] implements slash-command parsing used by the chat loop.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which dispatches into [`ui::chat_loop`]
//! for interactive sessions.

pub mod api;
pub mod cli;
pub mod commands;
pub mod core;
pub mod ui;
pub mod utils;
