//! Command-line shell over the todo capture core.
//!
//! # Responsibility
//! - Resolve config, start logging and open the store.
//! - Map subcommands onto command-surface calls.
//! - Host the JSON-lines request loop for attached presentation surfaces.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use log::{info, warn};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use todo_capture_core::{
    filter_and_sort, format_age, init_logging, register_capture_hotkey, unregister_capture_hotkey,
    AddTodoRequest, AppConfig, CaptureError, ChannelTarget, ClipboardSource, CommandSurface,
    Hotkey, HotkeyError, JsonFileTodoRepository, Priority, Todo, TodoEvent, TodoFilter, TodoId,
    TodoPatch, TodoStats, TodoStore, SOURCE_HOTKEY,
};

#[derive(Debug, Parser)]
#[command(name = "todo-capture", version, about = "Capture and manage short todo items")]
struct Cli {
    /// Todo store file (overrides TODO_CAPTURE_STORE_PATH).
    #[arg(long, global = true)]
    store: Option<PathBuf>,
    /// Absolute log directory (overrides TODO_CAPTURE_LOG_DIR).
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    /// trace|debug|info|warn|error (overrides TODO_CAPTURE_LOG_LEVEL).
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List todos, newest first.
    List(ListArgs),
    /// Add a todo.
    Add(AddArgs),
    /// Change fields of a todo.
    Update(UpdateArgs),
    /// Flip the completed flag of a todo.
    Toggle { id: String },
    /// Rotate priority low -> medium -> high.
    Cycle { id: String },
    /// Delete a todo.
    Delete { id: String },
    /// Delete every completed todo.
    ClearCompleted,
    /// Read the clipboard and confirm it as a new todo.
    Capture,
    /// Register the capture hotkey and capture on every press.
    Hotkey,
    /// Serve JSON-line requests on stdin and write responses and pushes to stdout.
    Serve,
    /// Print the store file location.
    Path,
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Case-insensitive text search.
    #[arg(long)]
    query: Option<String>,
    #[arg(long)]
    priority: Option<Priority>,
    #[arg(long)]
    category: Option<String>,
    /// Print raw JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct AddArgs {
    #[arg(required = true)]
    text: Vec<String>,
    #[arg(long)]
    priority: Option<Priority>,
    /// Repeat to set several categories; omit to auto-detect.
    #[arg(long = "category")]
    categories: Vec<String>,
    #[arg(long)]
    source: Option<String>,
}

#[derive(Debug, Args)]
struct UpdateArgs {
    id: String,
    #[arg(long)]
    text: Option<String>,
    #[arg(long)]
    completed: Option<bool>,
    #[arg(long)]
    priority: Option<Priority>,
    #[arg(long = "category")]
    categories: Vec<String>,
    /// Remove all categories.
    #[arg(long, conflicts_with = "categories")]
    clear_categories: bool,
    #[arg(long)]
    source: Option<String>,
}

impl UpdateArgs {
    fn patch(&self) -> TodoPatch {
        let categories = if self.clear_categories {
            Some(Vec::new())
        } else if self.categories.is_empty() {
            None
        } else {
            Some(self.categories.clone())
        };
        TodoPatch {
            text: self.text.clone(),
            completed: self.completed,
            priority: self.priority,
            categories,
            source: self.source.clone(),
        }
    }
}

/// Clipboard backed by the desktop clipboard.
struct SystemClipboard;

impl ClipboardSource for SystemClipboard {
    fn read_text(&self) -> Result<String, CaptureError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|err| CaptureError::Clipboard(err.to_string()))?;
        match clipboard.get_text() {
            Ok(text) => Ok(text),
            Err(arboard::Error::ContentNotAvailable) => Ok(String::new()),
            Err(err) => Err(CaptureError::Clipboard(err.to_string())),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::from_env();
    if let Some(store) = cli.store.clone() {
        config.store_path = store;
    }
    if let Some(log_dir) = cli.log_dir.clone() {
        config.log_dir = log_dir;
    }
    if let Some(level) = cli.log_level.clone() {
        config.log_level = level;
    }

    if let Err(err) = init_logging(&config.log_level, &config.log_dir) {
        eprintln!("warning: logging disabled: {err}");
    }

    let repo = JsonFileTodoRepository::new(&config.store_path);
    let store = TodoStore::open(repo)
        .with_context(|| format!("failed to open store `{}`", config.store_path.display()))?;
    let mut surface = CommandSurface::new(store);

    match cli.command {
        Command::List(args) => list(&surface, &args),
        Command::Add(args) => {
            let request = AddTodoRequest {
                text: args.text.join(" "),
                priority: args.priority,
                categories: (!args.categories.is_empty()).then_some(args.categories),
                source: args.source,
            };
            let todo = surface.add_todo(&request)?;
            print_todo(&todo);
            Ok(())
        }
        Command::Update(args) => {
            let patch = args.patch();
            if patch.is_empty() {
                bail!("nothing to update; pass at least one field flag");
            }
            let todo = surface.update_todo(&TodoId::from(args.id), &patch)?;
            print_todo(&todo);
            Ok(())
        }
        Command::Toggle { id } => {
            let id = TodoId::from(id);
            let completed = find(&surface, &id)?.completed;
            let todo = surface.update_todo(&id, &TodoPatch::completed(!completed))?;
            print_todo(&todo);
            Ok(())
        }
        Command::Cycle { id } => {
            let id = TodoId::from(id);
            let next = find(&surface, &id)?.priority.cycle();
            let todo = surface.update_todo(&id, &TodoPatch::priority(next))?;
            print_todo(&todo);
            Ok(())
        }
        Command::Delete { id } => {
            surface.delete_todo(&TodoId::from(id))?;
            println!("deleted");
            Ok(())
        }
        Command::ClearCompleted => {
            surface.clear_completed()?;
            println!("{}", TodoStats::from_todos(&surface.get_todos()));
            Ok(())
        }
        Command::Capture => capture(&mut surface),
        Command::Hotkey => hotkey(&mut surface, &config),
        Command::Serve => serve(&mut surface),
        Command::Path => {
            println!("{}", surface.store().location());
            Ok(())
        }
    }
}

fn find(surface: &CommandSurface<JsonFileTodoRepository>, id: &TodoId) -> Result<Todo> {
    surface
        .store()
        .get(id)
        .cloned()
        .with_context(|| format!("todo with id {id} not found"))
}

fn list(surface: &CommandSurface<JsonFileTodoRepository>, args: &ListArgs) -> Result<()> {
    let filter = TodoFilter {
        query: args.query.clone(),
        priority: args.priority,
        category: args.category.clone(),
    };
    let all = surface.get_todos();
    let visible = filter_and_sort(&all, &filter);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&visible)?);
        return Ok(());
    }

    let now = Utc::now();
    for todo in &visible {
        let mark = if todo.completed { "x" } else { " " };
        let categories = if todo.categories.is_empty() {
            String::new()
        } else {
            format!(" [{}]", todo.categories.join(", "))
        };
        println!(
            "[{mark}] {id}  {priority:<6} {text}{categories}  ({age})",
            id = todo.id,
            priority = todo.priority,
            text = todo.text,
            age = format_age(todo.created_at, now),
        );
    }
    println!("{}", TodoStats::from_todos(&all));
    Ok(())
}

fn print_todo(todo: &Todo) {
    match serde_json::to_string_pretty(todo) {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("error: cannot render todo {}: {err}", todo.id),
    }
}

/// Reads the clipboard, shows it as a prefill and adds it only on confirmation.
fn capture(surface: &mut CommandSurface<JsonFileTodoRepository>) -> Result<()> {
    let (target, events) = ChannelTarget::new();
    surface.register_presentation(Arc::new(target));

    if let Err(err) = surface.capture_clipboard(&SystemClipboard) {
        let notice = err.notice();
        eprintln!("{}: {}", notice.title, notice.body);
        return Ok(());
    }

    let Some(prefill) = next_prefill(&events) else {
        return Ok(());
    };

    println!("{prefill}");
    eprint!("Enter to add, type a replacement to edit, Ctrl-D to cancel: ");
    io::stderr().flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        eprintln!();
        eprintln!("cancelled");
        return Ok(());
    }
    let edited = line.trim();
    let text = if edited.is_empty() {
        prefill
    } else {
        edited.to_string()
    };

    let request = AddTodoRequest {
        source: Some(SOURCE_HOTKEY.to_string()),
        ..AddTodoRequest::new(text)
    };
    let todo = surface.add_todo(&request)?;
    print_todo(&todo);
    Ok(())
}

fn next_prefill(events: &Receiver<TodoEvent>) -> Option<String> {
    events.try_iter().find_map(|event| match event {
        TodoEvent::PrefillTodo(text) => Some(text),
        TodoEvent::TodoAdded(_) => None,
    })
}

/// Claims the capture chord with the OS and runs `capture` on each press.
///
/// A refused chord is reported as a notice; manual entry keeps working.
fn hotkey(
    surface: &mut CommandSurface<JsonFileTodoRepository>,
    config: &AppConfig,
) -> Result<()> {
    let hotkey: Hotkey = config
        .hotkey
        .parse()
        .with_context(|| format!("bad capture hotkey `{}`", config.hotkey))?;

    let manager = match GlobalHotKeyManager::new() {
        Ok(manager) => manager,
        Err(err) => {
            report_hotkey_failure(&HotkeyError::RegistrationFailed {
                hotkey: hotkey.to_string(),
                reason: err.to_string(),
            });
            return Ok(());
        }
    };
    if let Err(err) = register_capture_hotkey(&manager, &hotkey) {
        report_hotkey_failure(&err);
        return Ok(());
    }

    eprintln!("capture hotkey {hotkey} registered; press it to capture, Ctrl-C to quit");
    let events = GlobalHotKeyEvent::receiver();
    while let Ok(event) = events.recv() {
        if hotkey.matches(event.id) && event.state == HotKeyState::Pressed {
            capture(surface)?;
        }
    }
    unregister_capture_hotkey(&manager, &hotkey);
    Ok(())
}

fn report_hotkey_failure(err: &HotkeyError) {
    warn!("event=hotkey_register module=cli status=error error={}", err);
    eprintln!("Hotkey Registration Failed: {err}");
    eprintln!("Manual entry is still available via `todo-capture add`.");
}

/// Single-threaded request loop: one request at a time, pushes flushed after
/// each response.
fn serve(surface: &mut CommandSurface<JsonFileTodoRepository>) -> Result<()> {
    let (target, events) = ChannelTarget::new();
    surface.register_presentation(Arc::new(target));

    info!(
        "event=serve module=cli status=start location={}",
        surface.store().location()
    );
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read request")?;
        if line.trim().is_empty() {
            continue;
        }
        let response = surface.handle_json(&line);
        writeln!(out, "{}", serde_json::to_string(&response)?)?;
        for event in events.try_iter() {
            writeln!(out, "{}", serde_json::to_string(&event)?)?;
        }
        out.flush()?;
    }
    surface.unregister_presentation();
    info!("event=serve module=cli status=ok reason=stdin_closed");
    Ok(())
}
