//! Core logic for Todo Capture.
//! This crate owns the durable todo collection and every rule applied to it;
//! desktop and CLI shells only call into the command surface.

pub mod capture;
pub mod classify;
pub mod command;
pub mod config;
pub mod hotkey;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod service;
pub mod view;

pub use capture::{
    capture_clipboard, prepare_capture_text, CaptureError, CaptureNotice, CapturedText,
    ClipboardSource, MAX_CAPTURE_CHARS,
};
pub use classify::{detect_categories, detect_priority};
pub use command::{
    AddTodoRequest, CommandErrorBody, CommandOutput, CommandRequest, CommandResponse,
    CommandSurface, SuccessMarker,
};
pub use config::AppConfig;
pub use hotkey::{
    register_capture_hotkey, unregister_capture_hotkey, Hotkey, HotkeyError, HotkeyRegistrar,
    DEFAULT_CAPTURE_HOTKEY,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::todo::{
    Priority, Todo, TodoId, TodoPatch, TodoValidationError, SOURCE_HOTKEY, SOURCE_MANUAL,
};
pub use notify::{ChannelTarget, FanoutTarget, NotificationTarget, TodoEvent};
pub use repo::todo_repo::{JsonFileTodoRepository, RepoError, RepoResult, TodoRepository};
pub use service::todo_service::{AddTodoOptions, StoreError, StoreResult, TodoStore};
pub use view::{
    distinct_categories, filter_and_sort, format_age, merge_pushed, TodoFilter, TodoStats,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
