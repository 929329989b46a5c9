//! Command-line interface parsing and dispatch.

pub mod ask;
pub mod model_list;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::ask::{run_ask, AskArgs};
use crate::cli::model_list::list_models;
use crate::core::config::Config;
use crate::ui::chat_loop::{run_chat, ChatArgs};

#[derive(Parser)]
#[command(name = "ocular")]
#[command(about = "A terminal chat interface for local Ollama models, with vision support")]
#[command(
    long_about = "Ocular is a full-screen terminal chat interface for models served by a \
locally running Ollama daemon. It streams responses, supports multimodal (vision) models \
via image attachments, and can record exchanges to a markdown transcript.\n\n\
The daemon address defaults to http://localhost:11434 and can be overridden with --host \
or the `host` config key.\n\n\
Controls:\n\
  Tab               Switch between the Chat and Vision tabs\n\
  Enter             Send the prompt (Alt+Enter for a new line)\n\
  Esc               Cancel the in-flight request\n\
  Ctrl+N / Ctrl+P   Cycle the tab's model\n\
  PgUp / PgDn       Scroll through the conversation\n\
  Ctrl+C            Quit\n\n\
Commands:\n\
  /image <path>     Attach an image on the Vision tab\n\
  /system <text>    Set the system prompt\n\
  /log <file>       Record exchanges to a file\n\
  /help             Show all commands"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to use on the Chat tab
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Daemon address (e.g. localhost:11434)
    #[arg(long, global = true, value_name = "HOST")]
    pub host: Option<String>,

    /// Record exchanges to the given markdown file
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<String>,

    /// System prompt resent with every request
    #[arg(short = 's', long, global = true, value_name = "TEXT")]
    pub system: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// List the models installed on the daemon
    Models,
    /// Ask one question without the TUI and print the response
    Ask {
        /// The prompt to send
        #[arg(trailing_var_arg = true)]
        prompt: Vec<String>,
        /// Image to attach (requires a vision-capable model)
        #[arg(long, value_name = "PATH")]
        image: Option<PathBuf>,
    },
    /// Set configuration values
    Set {
        /// Configuration key (host, timeout-secs, system-prompt, transcript, default-model)
        key: String,
        /// Value to set (for default-model: `<chat|vision> <model>`)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Option<Vec<String>>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
        /// For default-model: which tab (chat or vision)
        value: Option<String>,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()
        .unwrap()
        .block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let command = args.command.unwrap_or(Commands::Chat);

    // Diagnostics go to stderr, which only works outside the TUI.
    if !matches!(command, Commands::Chat) {
        init_tracing();
    }

    match command {
        Commands::Chat => {
            run_chat(ChatArgs {
                model: args.model,
                host: args.host,
                log: args.log,
                system: args.system,
            })
            .await
        }
        Commands::Models => list_models(args.host).await,
        Commands::Ask { prompt, image } => {
            run_ask(AskArgs {
                prompt,
                image,
                model: args.model,
                host: args.host,
                system: args.system,
                log: args.log,
            })
            .await
        }
        Commands::Set { key, value } => handle_set(&key, value),
        Commands::Unset { key, value } => handle_unset(&key, value),
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_set(key: &str, value: Option<Vec<String>>) -> Result<(), Box<dyn Error>> {
    let mut config = Config::load()?;
    let joined = value.unwrap_or_default().join(" ");
    if joined.is_empty() {
        config.print_all();
        return Ok(());
    }

    match key {
        "host" => {
            config.host = Some(joined.clone());
            config.save()?;
            println!("Set host to: {joined}");
        }
        "timeout-secs" => {
            let secs: u64 = joined
                .parse()
                .map_err(|_| format!("timeout-secs must be a number, got '{joined}'"))?;
            config.timeout_secs = Some(secs);
            config.save()?;
            println!("Set timeout-secs to: {secs}");
        }
        "system-prompt" => {
            config.system_prompt = Some(joined.clone());
            config.save()?;
            println!("Set system-prompt to: {joined}");
        }
        "transcript" => {
            config.transcript = Some(joined.clone());
            config.save()?;
            println!("Set transcript to: {joined}");
        }
        "default-model" => {
            let parts: Vec<&str> = joined.splitn(2, ' ').collect();
            if parts.len() == 2 && matches!(parts[0], "chat" | "vision") {
                config.set_default_model(parts[0].to_string(), parts[1].to_string());
                config.save()?;
                println!("Set default-model for the {} tab to: {}", parts[0], parts[1]);
            } else {
                eprintln!("To set a default model, specify the tab and model:");
                eprintln!("Example: ocular set default-model chat llama3");
                std::process::exit(1);
            }
        }
        _ => {
            eprintln!("Unknown config key: {key}");
            std::process::exit(1);
        }
    }
    Ok(())
}

fn handle_unset(key: &str, value: Option<String>) -> Result<(), Box<dyn Error>> {
    let mut config = Config::load()?;
    match key {
        "host" => {
            config.host = None;
            config.save()?;
            println!("Unset host");
        }
        "timeout-secs" => {
            config.timeout_secs = None;
            config.save()?;
            println!("Unset timeout-secs");
        }
        "system-prompt" => {
            config.system_prompt = None;
            config.save()?;
            println!("Unset system-prompt");
        }
        "transcript" => {
            config.transcript = None;
            config.save()?;
            println!("Unset transcript");
        }
        "default-model" => match value.as_deref() {
            Some(tab @ ("chat" | "vision")) => {
                config.unset_default_model(tab);
                config.save()?;
                println!("Unset default-model for the {tab} tab");
            }
            _ => {
                eprintln!("Specify which tab: ocular unset default-model <chat|vision>");
                std::process::exit(1);
            }
        },
        _ => {
            eprintln!("Unknown config key: {key}");
            std::process::exit(1);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults_to_chat_when_no_subcommand() {
        let args = Args::parse_from(["ocular"]);
        assert!(args.command.is_none());
    }

    #[test]
    fn parses_ask_with_image_flag() {
        let args = Args::parse_from(["ocular", "ask", "--image", "cat.png", "what", "is", "this"]);
        match args.command {
            Some(Commands::Ask { prompt, image }) => {
                assert_eq!(prompt, vec!["what", "is", "this"]);
                assert_eq!(image, Some(PathBuf::from("cat.png")));
            }
            _ => panic!("expected ask subcommand"),
        }
    }

    #[test]
    fn global_flags_apply_to_subcommands() {
        let args = Args::parse_from(["ocular", "models", "--host", "ollama.lan:11434"]);
        assert_eq!(args.host.as_deref(), Some("ollama.lan:11434"));
    }
}
