mod api;
mod app;
mod board;
mod config;
mod input;
mod logging;
mod session;
mod ui;

use std::io::{self, BufRead, Write};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{bail, eyre, WrapErr};
use tokio::runtime::Runtime;
use tracing::{info, warn};

use api::types::{login_error_message, register_error_message, Credentials, NewBoard, NewTask, Registration};
use api::{ApiClient, ApiError};
use board::age::{due_status, format_age, parse_due_input};
use board::{Board, Column, Priority, TaskDraft, UserLite};
use config::{Config, ConfigError};
use session::{SessionError, SessionStore};

#[derive(Parser)]
#[command(name = "taskboard", about = "A keyboard-first client for a shared task board")]
struct Cli {
    /// API base URL (overrides config file and TASKBOARD_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and save the session token
    Login {
        username: String,
        /// Password (prompted for when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Forget the saved session token
    Logout,
    /// Create an account (an admin must approve it)
    Register {
        username: String,
        #[arg(short, long)]
        email: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
        /// Password (prompted for when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// List boards
    Boards,
    /// Create or delete a board
    Board {
        #[command(subcommand)]
        action: BoardAction,
    },
    /// Print a board's columns and tasks
    Show { board_id: u64 },
    /// Add a task to a column (by id or title)
    Add {
        board_id: u64,
        column: String,
        title: String,
        /// Priority (low, medium, high)
        #[arg(short, long, default_value = "medium")]
        priority: Priority,
        /// Due date (YYYY-MM-DD)
        #[arg(short, long)]
        due: Option<String>,
        /// Assignee username
        #[arg(short, long)]
        assign: Option<String>,
    },
    /// Show your profile
    Profile,
}

#[derive(Subcommand)]
enum BoardAction {
    /// Create a board
    New {
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Delete a board and every task in it
    Delete {
        board_id: u64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// What every command needs: the runtime, the gateway, and the token file.
struct Context {
    runtime: Runtime,
    api: ApiClient,
    store: SessionStore,
    config: Config,
}

impl Context {
    fn new(api_url: Option<&str>) -> color_eyre::Result<Self> {
        let config = Config::load(api_url)?;
        if let Err(e) = config.log_path().map_err(color_eyre::Report::from).and_then(|p| logging::init(&p)) {
            // Logging is optional; the client works without it.
            eprintln!("warning: logging disabled: {e:#}");
        }
        let runtime = Runtime::new().wrap_err("failed to start async runtime")?;
        let api = ApiClient::new(&config.api_url)?;
        let store = SessionStore::new(config.token_path()?);
        Ok(Self { runtime, api, store, config })
    }
}

fn main() {
    // Install color_eyre for unexpected panics/errors (developer bugs).
    let _ = color_eyre::install();
    let cli = Cli::parse();

    let result = Context::new(cli.api_url.as_deref()).and_then(|ctx| match cli.command {
        Some(Command::Login { username, password }) => cmd_login(&ctx, username, password),
        Some(Command::Logout) => cmd_logout(&ctx),
        Some(Command::Register { username, email, first_name, last_name, password }) => {
            let registration = Registration { username, email, first_name, last_name, password: String::new() };
            cmd_register(&ctx, registration, password)
        }
        Some(Command::Boards) => cmd_boards(&ctx),
        Some(Command::Board { action: BoardAction::New { name, description } }) => {
            cmd_board_new(&ctx, NewBoard { name, description })
        }
        Some(Command::Board { action: BoardAction::Delete { board_id, yes } }) => {
            cmd_board_delete(&ctx, board_id, yes)
        }
        Some(Command::Show { board_id }) => cmd_show(&ctx, board_id),
        Some(Command::Add { board_id, column, title, priority, due, assign }) => {
            cmd_add(&ctx, board_id, &column, title, priority, due.as_deref(), assign.as_deref())
        }
        Some(Command::Profile) => cmd_profile(&ctx),
        None => cmd_tui(ctx),
    });

    if let Err(e) = result {
        print_user_error(&e);
        std::process::exit(1);
    }
}

/// Print a user-friendly error message, with actionable hints for known error types.
fn print_user_error(error: &color_eyre::Report) {
    if let Some(api_err) = error.downcast_ref::<ApiError>() {
        match api_err {
            ApiError::Unauthorized => {
                eprintln!("error: your session has expired.");
                eprintln!("  Run `taskboard login <username>` to sign in again.");
            }
            ApiError::Status { status, body } => {
                eprintln!("error: the server rejected the request ({status}).");
                if !body.is_empty() {
                    eprintln!("  {body}");
                }
            }
            ApiError::Http(e) => {
                eprintln!("error: could not reach the server.");
                eprintln!("  {e}");
                eprintln!("  Check --api-url or TASKBOARD_API_URL.");
            }
            ApiError::InvalidUrl(url) => {
                eprintln!("error: invalid API url: {url:?}");
                eprintln!("  Expected something like {}", config::DEFAULT_API_URL);
            }
            ApiError::Decode(e) => {
                eprintln!("error: unexpected response from the server.");
                eprintln!("  {e}");
            }
            ApiError::File { path, source } => {
                eprintln!("error: could not read {}.", path.display());
                eprintln!("  {source}");
            }
        }
        return;
    }

    if let Some(session_err) = error.downcast_ref::<SessionError>() {
        match session_err {
            SessionError::NotLoggedIn => {
                eprintln!("error: not logged in.");
                eprintln!("  Run `taskboard login <username>` first.");
            }
            SessionError::Io { path, source } => {
                eprintln!("error: could not access the session file {}.", path.display());
                eprintln!("  {source}");
            }
        }
        return;
    }

    if let Some(config_err) = error.downcast_ref::<ConfigError>() {
        match config_err {
            ConfigError::Toml { path, source } => {
                eprintln!("error: config file {} has invalid TOML syntax.", path.display());
                eprintln!("  {source}");
            }
            other => eprintln!("error: {other}"),
        }
        return;
    }

    // For eyre!() / bail!() messages, print the full error chain.
    eprintln!("error: {e:#}", e = error);
}

/// Prompt on stdout and read one line from stdin.
fn prompt(question: &str) -> color_eyre::Result<String> {
    print!("{question}");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(answer.trim_end_matches(['\r', '\n']).to_string())
}

fn password_or_prompt(password: Option<String>) -> color_eyre::Result<String> {
    match password {
        Some(p) => Ok(p),
        None => prompt("Password: "),
    }
}

fn cmd_login(ctx: &Context, username: String, password: Option<String>) -> color_eyre::Result<()> {
    let password = password_or_prompt(password)?;
    let credentials = Credentials { username, password };
    let session = match ctx.runtime.block_on(ctx.api.login(&credentials)) {
        Ok(session) => session,
        Err(e @ ApiError::Status { .. }) => bail!(login_error_message(e.body())),
        Err(e) => return Err(e.into()),
    };
    ctx.store.save(&session)?;
    info!(username = %credentials.username, "logged in from the command line");
    println!("Logged in as {}.", credentials.username);
    Ok(())
}

fn cmd_logout(ctx: &Context) -> color_eyre::Result<()> {
    ctx.store.clear()?;
    info!("logged out from the command line");
    println!("Logged out.");
    Ok(())
}

fn cmd_register(ctx: &Context, mut registration: Registration, password: Option<String>) -> color_eyre::Result<()> {
    registration.password = password_or_prompt(password)?;
    match ctx.runtime.block_on(ctx.api.register(&registration)) {
        Ok(_) => {
            println!("Account created. Wait for admin approval.");
            Ok(())
        }
        Err(e @ ApiError::Status { .. }) => bail!(register_error_message(e.body())),
        Err(e) => Err(e.into()),
    }
}

fn cmd_boards(ctx: &Context) -> color_eyre::Result<()> {
    let session = ctx.store.require()?;
    let boards = ctx.runtime.block_on(ctx.api.list_boards(&session))?;
    if boards.is_empty() {
        println!("No boards yet. Create one with `taskboard board new <name>`.");
        return Ok(());
    }
    println!("\nBoards");
    println!("{}", "─".repeat(40));
    for board in &boards {
        let owner = board.owner_username.as_deref().map(|o| format!("  @{o}")).unwrap_or_default();
        println!("  {:>4}  {}{}", board.id, board.name, owner);
    }
    println!();
    Ok(())
}

fn cmd_board_new(ctx: &Context, board: NewBoard) -> color_eyre::Result<()> {
    let session = ctx.store.require()?;
    let created = ctx.runtime.block_on(ctx.api.create_board(&session, &board))?;
    println!("Created board {}: {}", created.id, created.name);
    Ok(())
}

fn cmd_board_delete(ctx: &Context, board_id: u64, yes: bool) -> color_eyre::Result<()> {
    let session = ctx.store.require()?;
    if !yes {
        let answer = prompt(&format!("Delete board {board_id}? All tasks inside will be lost. (y/n) "))?;
        if !answer.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(());
        }
    }
    ctx.runtime.block_on(ctx.api.delete_board(&session, board_id))?;
    println!("Deleted board {board_id}.");
    Ok(())
}

/// Find a column by numeric id or, failing that, by case-insensitive title.
fn find_column<'a>(board: &'a Board, query: &str) -> Option<&'a Column> {
    if let Ok(id) = query.parse::<u64>() {
        if let Some(col) = board.column(id) {
            return Some(col);
        }
    }
    board.columns.iter().find(|c| c.title.eq_ignore_ascii_case(query.trim()))
}

fn find_user<'a>(users: &'a [UserLite], username: &str) -> Option<&'a UserLite> {
    users.iter().find(|u| u.username.eq_ignore_ascii_case(username.trim()))
}

fn cmd_show(ctx: &Context, board_id: u64) -> color_eyre::Result<()> {
    let session = ctx.store.require()?;
    let view = ctx.runtime.block_on(ctx.api.load_board_view(&session, board_id))?;
    let now = chrono::Utc::now();
    let today = now.date_naive();

    println!("\n{}", view.board.name);
    if view.board.columns.is_empty() {
        println!("  (no columns)");
    }
    for col in &view.board.columns {
        println!("\n{} [{}] ({})", col.title, col.id, col.tasks.len());
        println!("{}", "─".repeat(40));
        for task in &col.tasks {
            let age = format_age(task.created_at, now);
            let tags = if task.tags.is_empty() {
                String::new()
            } else {
                let names: Vec<&str> = task.tags.iter().map(|t| t.name.as_str()).collect();
                format!(" [{}]", names.join(", "))
            };
            let assignee = task
                .assigned_to_user
                .as_ref()
                .map(|u| format!("  @{}", u.username))
                .unwrap_or_default();
            let due = task.due_date.map(|d| format!("  {}", due_status(d, today).1)).unwrap_or_default();
            println!(
                "  #{:<5} {:>4}  {}{}  {}{}{}",
                task.id, age, task.title, tags, task.priority, due, assignee
            );
        }
    }
    println!();
    Ok(())
}

fn cmd_add(
    ctx: &Context,
    board_id: u64,
    column: &str,
    title: String,
    priority: Priority,
    due: Option<&str>,
    assign: Option<&str>,
) -> color_eyre::Result<()> {
    if title.trim().is_empty() {
        bail!("Title is required.");
    }
    let due_date = parse_due_input(due.unwrap_or("")).map_err(|e| eyre!(e))?;
    let session = ctx.store.require()?;
    let view = ctx.runtime.block_on(ctx.api.load_board_view(&session, board_id))?;

    let col = find_column(&view.board, column)
        .ok_or_else(|| eyre!("Column '{}' not found on board {}", column, board_id))?;
    let assigned_to = match assign {
        Some(username) => Some(
            find_user(&view.users, username)
                .ok_or_else(|| eyre!("User '{}' not found", username))?
                .id,
        ),
        None => None,
    };

    let task = NewTask {
        column: col.id,
        draft: TaskDraft { title, priority, due_date, assigned_to, ..Default::default() },
        order: u32::try_from(col.tasks.len()).unwrap_or(u32::MAX),
    };
    let created = ctx.runtime.block_on(ctx.api.create_task(&session, &task))?;
    println!("Created #{}: {} in {}", created.id, created.title, col.title);
    Ok(())
}

fn cmd_profile(ctx: &Context) -> color_eyre::Result<()> {
    let session = ctx.store.require()?;
    let profile = ctx.runtime.block_on(ctx.api.get_profile(&session))?;
    let name = format!("{} {}", profile.first_name, profile.last_name);
    println!("\n@{}", profile.username);
    println!("{}", "─".repeat(40));
    println!("  Name:      {}", name.trim());
    println!("  Email:     {}", profile.email);
    println!("  Position:  {}", profile.position);
    if let Some(avatar) = &profile.avatar {
        println!("  Avatar:    {}", ctx.api.avatar_url(avatar));
    }
    println!();
    Ok(())
}

fn cmd_tui(ctx: Context) -> color_eyre::Result<()> {
    let Context { runtime, api, store, config } = ctx;
    let mut app = app::App::new(api, store, config.undo_window());
    info!(api_url = %config.api_url, "starting TUI");

    let mut terminal = ratatui::init();
    let result = app::run(&mut terminal, &runtime, &mut app);
    ratatui::restore();
    if let Err(e) = &result {
        warn!(error = %e, "TUI exited with an error");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::tree::tests::test_board;

    #[test]
    fn parse_add_with_options() {
        let cli = Cli::try_parse_from([
            "taskboard", "add", "3", "Todo", "Write docs", "--priority", "high", "--due", "2025-02-01",
            "--assign", "ana",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Add { board_id, column, title, priority, due, assign }) => {
                assert_eq!(board_id, 3);
                assert_eq!(column, "Todo");
                assert_eq!(title, "Write docs");
                assert_eq!(priority, Priority::High);
                assert_eq!(due.as_deref(), Some("2025-02-01"));
                assert_eq!(assign.as_deref(), Some("ana"));
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn parse_add_defaults_to_medium_priority() {
        let cli = Cli::try_parse_from(["taskboard", "add", "1", "10", "t"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Add { priority: Priority::Medium, .. })));
    }

    #[test]
    fn parse_rejects_unknown_priority() {
        assert!(Cli::try_parse_from(["taskboard", "add", "1", "10", "t", "-p", "urgent"]).is_err());
    }

    #[test]
    fn parse_global_api_url_after_subcommand() {
        let cli = Cli::try_parse_from(["taskboard", "boards", "--api-url", "http://h/api"]).unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://h/api"));
        assert!(matches!(cli.command, Some(Command::Boards)));
    }

    #[test]
    fn parse_board_delete_with_yes() {
        let cli = Cli::try_parse_from(["taskboard", "board", "delete", "7", "--yes"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Board { action: BoardAction::Delete { board_id: 7, yes: true } })
        ));
    }

    #[test]
    fn parse_no_subcommand_opens_tui() {
        let cli = Cli::try_parse_from(["taskboard"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn find_column_by_id_or_title() {
        let board = test_board(&[&[1], &[2]]);
        assert_eq!(find_column(&board, "11").map(|c| c.id), Some(11));
        assert_eq!(find_column(&board, "c0").map(|c| c.id), Some(10));
        assert!(find_column(&board, "Done").is_none());
        assert!(find_column(&board, "99").is_none());
    }

    #[test]
    fn find_user_ignores_case() {
        let users = vec![UserLite {
            id: 4,
            username: "Ana".into(),
            first_name: String::new(),
            last_name: String::new(),
        }];
        assert_eq!(find_user(&users, "ana").map(|u| u.id), Some(4));
        assert!(find_user(&users, "bob").is_none());
    }
}
