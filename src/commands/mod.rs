/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

- `chat`:    Interactive chat session
- `ask`:     One-shot question
- `auth`:    Sign in, sign out, show the current user
- `roles`:   List personas
- `history`: Manage saved conversations

The handlers are thin: they open the local store, build a controller and
print results. Session behaviour lives in [`crate::session`].
*/

use crate::auth::{AuthService, User};
use crate::config::Config;
use crate::error::Result;
use crate::history::ChatHistoryStore;
use crate::providers::create_client;
use crate::roles::Role;
use crate::session::{ChatController, ChatSession, Message, MessageRole, TurnCompletion, TurnOutcome};
use crate::storage::{KeyValueStore, SledStore};
use colored::Colorize;
use std::sync::Arc;

// Special commands parser for the interactive session
pub mod special_commands;

// Chat history commands
pub mod history;

/// Open the durable store configured in `config`
pub fn open_store(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    let store = SledStore::open(config.storage.path.as_deref())?;
    tracing::debug!("Using store at {}", store.path().display());
    Ok(Arc::new(store))
}

/// History store over `store` with the configured cap
pub fn history_store(config: &Config, store: Arc<dyn KeyValueStore>) -> ChatHistoryStore {
    ChatHistoryStore::new(store, config.history.max_records)
}

/// Build a chat controller with the configured model client
///
/// A missing API key does not fail here; sends will report it instead.
pub fn build_controller(
    config: &Config,
    store: Arc<dyn KeyValueStore>,
    role: Role,
) -> Result<ChatController> {
    let client = create_client(&config.provider)?;
    let session = ChatSession::new(role, config.chat.max_message_chars);
    Ok(ChatController::new(
        session,
        history_store(config, store),
        client,
        config.chat.max_attachment_bytes,
    ))
}

/// Print one transcript entry
pub fn print_message(message: &Message) {
    let time = message
        .timestamp
        .with_timezone(&chrono::Local)
        .format("%H:%M");
    match message.role {
        MessageRole::User => {
            println!("{} {}", format!("[{}] You:", time).bold(), message.content);
        }
        MessageRole::Assistant => {
            println!("{}\n{}", format!("[{}] CemtrAS:", time).green().bold(), message.content);
        }
    }
    for file in message.attachments() {
        println!(
            "  {} {} ({}, {} bytes)",
            "📎".dimmed(),
            file.name,
            file.mime_type,
            file.size
        );
    }
    println!();
}

/// Print the result of one turn
fn print_outcome(outcome: &TurnOutcome) {
    match outcome.completion {
        TurnCompletion::Answered => {
            if let Some(reply) = &outcome.reply {
                println!("\n{}\n", reply);
            }
        }
        TurnCompletion::Failed => {
            if let Some(err) = &outcome.error {
                eprintln!("{} {}", "Error:".red().bold(), err);
            }
        }
        TurnCompletion::Stale => {}
    }
    if let Some(warning) = &outcome.storage_warning {
        eprintln!("{} {}", "Warning:".yellow().bold(), warning);
    }
}

// Chat command handler
pub mod chat {
    //! Interactive chat session handler.
    //!
    //! Signs the user in if needed, builds a controller, and runs a
    //! readline-based loop that sends plain text to the model and handles
    //! `/` commands locally.

    use super::*;
    use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
    use crate::error::SessionError;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    /// Start an interactive chat session
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration
    /// * `role` - Persona override; the configured default when `None`
    /// * `resume` - Id or id prefix of a saved conversation to load first
    pub async fn run_chat(config: Config, role: Option<Role>, resume: Option<String>) -> Result<()> {
        let store = open_store(&config)?;
        let auth = AuthService::new(store.clone());
        let mut rl = DefaultEditor::new()?;

        let user = match auth.current_user()? {
            Some(user) => user,
            None => match prompt_for_name(&mut rl, &auth)? {
                Some(user) => user,
                None => {
                    println!("Goodbye!");
                    return Ok(());
                }
            },
        };

        let role = role.unwrap_or(config.chat.default_role);
        let mut controller = build_controller(&config, store, role)?;

        if let Some(id) = resume {
            let record = history::require_record(controller.history(), &id)?;
            controller.load_chat(record);
            report_storage_warning(&mut controller);
            println!("{}", "Resumed conversation:".cyan());
            for message in controller.session().messages() {
                print_message(message);
            }
        }

        print_welcome_banner(&user, &controller);

        loop {
            let prompt = format!(
                "{} >>> ",
                controller.session().selected_role().colored_tag()
            );
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(trimmed);

                    match parse_special_command(trimmed) {
                        Ok(SpecialCommand::None) => send(&mut controller, trimmed).await,
                        Ok(SpecialCommand::Exit) => break,
                        Ok(command) => handle_special(&mut controller, command).await?,
                        Err(e) => eprintln!("{}", e.to_string().red()),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Ask for a display name until a valid one is entered
    ///
    /// Returns `None` if the user leaves the prompt.
    fn prompt_for_name(rl: &mut DefaultEditor, auth: &AuthService) -> Result<Option<User>> {
        println!("{}", "Welcome to CemtrAS AI".bold());
        println!("Please enter your name to get started.\n");
        loop {
            match rl.readline("Name: ") {
                Ok(line) => match auth.authenticate(&line) {
                    Ok(user) => return Ok(Some(user)),
                    Err(e) => eprintln!("{}", e.to_string().red()),
                },
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return Ok(None),
                Err(err) => return Err(err.into()),
            }
        }
    }

    async fn send(controller: &mut ChatController, text: &str) {
        if controller.session().error().is_none() {
            println!("{}", "Thinking...".dimmed());
        }
        match controller.send(text).await {
            Ok(outcome) => print_outcome(&outcome),
            Err(SessionError::Configuration(message)) => {
                eprintln!("{} {}", "Configuration error:".red().bold(), message)
            }
            Err(SessionError::ErrorActive) => {
                if let Some(active) = controller.session().error() {
                    eprintln!("{} {}", "Error:".red().bold(), active);
                }
                eprintln!("{}", SessionError::ErrorActive.to_string().yellow());
            }
            Err(e) => eprintln!("{}", e.to_string().red()),
        }
    }

    async fn handle_special(controller: &mut ChatController, command: SpecialCommand) -> Result<()> {
        match command {
            SpecialCommand::SwitchRole(role) => {
                controller.change_role(role);
                report_storage_warning(controller);
                println!("Switched to {} ({})", role.colored_tag(), role.description());
            }
            SpecialCommand::ListRoles => super::roles::print_roles(),
            SpecialCommand::NewChat => {
                controller.new_chat();
                println!("{}", "Started a new conversation".green());
            }
            SpecialCommand::ListHistory => {
                let records = controller.history().list()?;
                if records.is_empty() {
                    println!("{}", "No conversation history found.".yellow());
                } else {
                    history::build_table(&records).printstd();
                }
            }
            SpecialCommand::LoadChat(id) => match history::require_record(controller.history(), &id) {
                Ok(record) => {
                    let title = record.title.clone();
                    controller.load_chat(record);
                    report_storage_warning(controller);
                    println!("Loaded {}\n", title.bold());
                    for message in controller.session().messages() {
                        print_message(message);
                    }
                }
                Err(e) => eprintln!("{}", e.to_string().red()),
            },
            SpecialCommand::Attach(paths) => {
                let batch = controller.attach_paths(&paths).await;
                for file in &batch.accepted {
                    println!("{} {} ({} bytes)", "Attached".green(), file.name, file.size);
                }
                for rejected in &batch.rejected {
                    eprintln!("{} {}", "Skipped:".yellow(), rejected.reason);
                }
            }
            SpecialCommand::Detach(key) => {
                let id = resolve_pending_file(controller, &key);
                match id {
                    Some(id) if controller.remove_file(&id) => println!("Removed attachment"),
                    _ => eprintln!("{}", format!("No attached file matches '{}'", key).red()),
                }
            }
            SpecialCommand::ListFiles => print_pending_files(controller),
            SpecialCommand::DismissError => {
                controller.dismiss_error();
                if let Some(err) = controller.session().error() {
                    eprintln!("{} {}", "Still active:".red().bold(), err);
                }
            }
            SpecialCommand::ShowStatus => print_status_display(controller),
            SpecialCommand::Help => print_help(),
            SpecialCommand::Exit | SpecialCommand::None => {}
        }
        Ok(())
    }

    /// Map a `/detach` argument (1-based position, id or id prefix) to a file id
    fn resolve_pending_file(controller: &ChatController, key: &str) -> Option<String> {
        let files = controller.session().pending_files();
        if let Ok(n) = key.parse::<usize>() {
            return n
                .checked_sub(1)
                .and_then(|i| files.get(i))
                .map(|f| f.id.clone());
        }
        files
            .iter()
            .find(|f| f.id == key || f.id.starts_with(key))
            .map(|f| f.id.clone())
    }

    fn report_storage_warning(controller: &mut ChatController) {
        if let Some(warning) = controller.take_storage_warning() {
            eprintln!("{} {}", "Warning:".yellow().bold(), warning);
        }
    }

    fn print_pending_files(controller: &ChatController) {
        let files = controller.session().pending_files();
        if files.is_empty() {
            println!("No files attached");
            return;
        }
        for (i, file) in files.iter().enumerate() {
            let note = if file.is_inline_supported() {
                ""
            } else {
                " (kept in transcript only)"
            };
            println!(
                "  {}. {} [{}] {} bytes{}",
                i + 1,
                file.name,
                file.mime_type,
                file.size,
                note.dimmed()
            );
        }
    }

    fn print_welcome_banner(user: &User, controller: &ChatController) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║               CemtrAS AI - Interactive Chat                  ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Welcome, {}!", user.name.bold());
        let role = controller.session().selected_role();
        println!("Persona: {} ({})\n", role.colored_tag(), role.description());
        if !controller.has_client() {
            eprintln!(
                "{} {}\n",
                "Configuration error:".red().bold(),
                crate::error::MISSING_API_KEY_MESSAGE
            );
        }
        println!("Type '/help' for available commands, 'exit' to quit\n");
    }

    fn print_status_display(controller: &ChatController) {
        let session = controller.session();
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                     CemtrAS Session Status                   ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!(
            "Persona:           {} ({})",
            session.selected_role().colored_tag(),
            session.selected_role().label()
        );
        println!("Conversation Size: {} messages", session.messages().len());
        println!(
            "Saved As:          {}",
            session.current_history_id().unwrap_or("(not saved yet)")
        );
        println!("Attached Files:    {}", session.pending_files().len());
        println!(
            "Model:             {}",
            if controller.has_client() {
                "configured".green()
            } else {
                "missing API key".red()
            }
        );
        if let Some(err) = session.error() {
            println!("Last Error:        {}", err.to_string().red());
        }
        println!();
    }
}

// One-shot question handler
pub mod ask {
    //! Ask a single question, print the answer and save the exchange.

    use super::*;
    use std::path::PathBuf;

    /// Ask one question
    ///
    /// # Errors
    ///
    /// Returns error if the question is rejected before sending (missing
    /// key, invalid message) or the model call fails.
    pub async fn run_ask(
        config: Config,
        role: Option<Role>,
        files: Vec<PathBuf>,
        prompt: String,
    ) -> Result<()> {
        let store = open_store(&config)?;
        let role = role.unwrap_or(config.chat.default_role);
        let mut controller = build_controller(&config, store, role)?;

        if !files.is_empty() {
            let batch = controller.attach_paths(&files).await;
            for rejected in &batch.rejected {
                eprintln!("{} {}", "Skipped:".yellow(), rejected.reason);
            }
        }

        let outcome = controller.send(&prompt).await?;
        print_outcome(&outcome);

        match outcome.error {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }
}

// Sign-in command handlers
pub mod auth {
    //! Name-based sign-in commands.

    use super::*;

    /// Sign in as `name`
    pub fn login(config: &Config, name: &str) -> Result<()> {
        let auth = AuthService::new(open_store(config)?);
        let user = auth.authenticate(name)?;
        println!("Signed in as {}", user.name.bold());
        Ok(())
    }

    /// Sign out, keeping saved conversations
    pub fn logout(config: &Config) -> Result<()> {
        let auth = AuthService::new(open_store(config)?);
        auth.logout()?;
        println!("Signed out. Saved conversations were kept.");
        Ok(())
    }

    /// Print the signed-in user
    pub fn whoami(config: &Config) -> Result<()> {
        let auth = AuthService::new(open_store(config)?);
        match auth.current_user()? {
            Some(user) => println!(
                "{} (since {})",
                user.name.bold(),
                user.entry_date
                    .with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M")
            ),
            None => println!("{}", "Not signed in".yellow()),
        }
        Ok(())
    }
}

// Persona listing
pub mod roles {
    //! Persona listing.

    use super::*;

    /// Print every persona with its command-line name
    pub fn print_roles() {
        println!("\nAvailable personas:\n");
        for role in Role::ALL {
            println!("  {:<24} {}", role.slug().cyan(), role.colored_tag());
            println!("  {:<24} {}", "", role.description().dimmed());
        }
        println!();
    }
}
