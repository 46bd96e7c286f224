use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{theme::ColorfulTheme, Confirm, Input};
use anyhow::Result;
use std::io::Read;

mod config;
mod logging;
mod terminal;

use config::Config;
use gid_core::controller::{CACHE_CLEARED, CACHE_CLEAR_FAILED};
use gid_core::{AnswerClient, ChatController, FileStore, HttpAnswerClient, Role, SessionStore};
use terminal::TerminalSink;

#[derive(Parser)]
#[command(name = "gid")]
#[command(about = "Chat with an AI travel guide from the terminal")]
struct Cli {
    /// Answering service base URL (overrides config and GID_SERVER_URL)
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start or resume the conversation
    Chat,
    /// Render reply text to HTML (reads stdin when TEXT is omitted)
    Render {
        text: Option<String>,
    },
    /// Show the saved city and transcript
    History,
    /// Delete the saved conversation and city
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Ask the server to drop its weather and recommendation cache
    ClearCache,
    /// Write a config file with default values
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load_or_default();
    logging::init(&config.log_level);

    let server_url = config.server_url(cli.server.as_deref());

    match cli.command {
        Commands::Chat => run_chat(&config, &server_url).await?,
        Commands::Render { text } => render_text(text)?,
        Commands::History => show_history(&config)?,
        Commands::Clear { yes } => clear_session(&config, yes)?,
        Commands::ClearCache => clear_cache(&server_url).await,
        Commands::Init => init_config()?,
    }

    Ok(())
}

fn open_store(config: &Config) -> Result<SessionStore<FileStore>> {
    let path = config.session_path()?;
    tracing::debug!(path = %path.display(), "opening session");
    Ok(SessionStore::new(FileStore::new(path)))
}

fn confirm(prompt: &str) -> Result<bool> {
    Ok(Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}

async fn run_chat(config: &Config, server_url: &str) -> Result<()> {
    let client = HttpAnswerClient::new(server_url);
    let mut chat = ChatController::new(open_store(config)?, client, TerminalSink)
        .with_greeting(config.greeting.clone())
        .with_fallback(config.fallback_message.clone());

    println!("{}", "🧭 gid travel guide".bold().blue());
    println!("{}", "Commands: /clear, /clear-cache, /quit".dimmed());
    chat.start();

    loop {
        let line: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("›")
            .allow_empty(true)
            .report(false)
            .interact_text()?;

        match line.trim() {
            "/quit" | "/exit" => break,
            "/clear" => {
                if confirm("Clear the chat history?")? {
                    chat.clear_chat()?;
                }
            }
            "/clear-cache" => {
                if confirm("Clear the weather and recommendation cache?")? {
                    chat.clear_cache().await;
                }
            }
            _ => {
                if let Err(e) = chat.submit(&line).await {
                    println!("{}: {}", "Could not save the conversation".red(), e);
                }
            }
        }
    }

    Ok(())
}

fn render_text(text: Option<String>) -> Result<()> {
    let text = match text {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    println!("{}", gid_core::render(&text));
    Ok(())
}

fn show_history(config: &Config) -> Result<()> {
    let mut store = open_store(config)?;
    let session = store.restore();

    match &session.current_city {
        Some(city) => println!("{} {}", "📍 City:".dimmed(), city.bold().cyan()),
        None => println!("{}", "📍 No city selected".dimmed()),
    }

    if session.transcript.is_empty() {
        println!("{}", "No saved conversation".yellow());
        return Ok(());
    }

    for message in &session.transcript {
        let label = match message.role {
            Role::User => message.role.as_str().bold().green(),
            Role::Assistant => message.role.as_str().bold().magenta(),
        };
        println!("\n{}: {}", label, message.content);
    }

    Ok(())
}

fn clear_session(config: &Config, yes: bool) -> Result<()> {
    if !yes && !confirm("Clear the chat history?")? {
        return Ok(());
    }

    open_store(config)?.clear()?;
    println!("{}", "Conversation cleared".green());
    Ok(())
}

async fn clear_cache(server_url: &str) {
    let client = HttpAnswerClient::new(server_url);

    match client.clear_cache().await {
        Ok(()) => println!("{}", CACHE_CLEARED.green()),
        Err(e) => {
            tracing::warn!(error = %e, "clear-cache failed");
            println!("{}", CACHE_CLEAR_FAILED.red());
        }
    }
}

fn init_config() -> Result<()> {
    let config = Config::load()?;
    config.save()?;
    println!("{}", "Config written".green());
    Ok(())
}
