//! Todo repository contract and JSON file implementation.
//!
//! # Responsibility
//! - Read and write the single `{"todos": [...]}` document.
//! - Apply load-time schema checks to persisted records.
//!
//! # Invariants
//! - A missing file is an empty collection, not an error.
//! - Records missing `id`, `text`, `completed` or `createdAt` are dropped on
//!   load and reported in the log; the rest of the file still loads.
//! - A document that is not a `todos` array is rejected as `InvalidData` so it
//!   is never silently overwritten.
//! - Saves go through a sibling temp file and a rename.

use crate::model::todo::{Todo, TodoId};
use log::{error, info, warn};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

const TODOS_FIELD: &str = "todos";
const TEMP_SUFFIX: &str = ".tmp";

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage-level failure.
#[derive(Debug)]
pub enum RepoError {
    Io { path: PathBuf, source: io::Error },
    Serialization(serde_json::Error),
    InvalidData(String),
}

impl RepoError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "i/o error on `{}`: {source}", path.display()),
            Self::Serialization(err) => write!(f, "todo store serialization failed: {err}"),
            Self::InvalidData(message) => write!(f, "invalid todo store data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Serialization(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Durable collection storage used by `TodoStore`.
pub trait TodoRepository {
    /// Loads the whole collection in stored order.
    fn load_todos(&self) -> RepoResult<Vec<Todo>>;
    /// Replaces the whole collection.
    fn save_todos(&self, todos: &[Todo]) -> RepoResult<()>;
    /// Human-readable location, for diagnostics.
    fn location(&self) -> String;
}

#[derive(Serialize)]
struct TodoDocument<'a> {
    todos: &'a [Todo],
}

/// Repository backed by one local JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileTodoRepository {
    path: PathBuf,
}

impl JsonFileTodoRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|value| value.to_os_string())
            .unwrap_or_else(|| "todos.json".into());
        name.push(TEMP_SUFFIX);
        self.path.with_file_name(name)
    }

    fn write_atomically(&self, bytes: &[u8]) -> RepoResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| RepoError::io(parent, err))?;
            }
        }

        let temp_path = self.temp_path();
        fs::write(&temp_path, bytes).map_err(|err| RepoError::io(&temp_path, err))?;
        if let Err(err) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(RepoError::io(&self.path, err));
        }
        Ok(())
    }
}

impl TodoRepository for JsonFileTodoRepository {
    fn load_todos(&self) -> RepoResult<Vec<Todo>> {
        let started_at = Instant::now();
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!("event=store_load module=repo status=ok file=missing count=0");
                return Ok(Vec::new());
            }
            Err(err) => {
                error!(
                    "event=store_load module=repo status=error error_code=read_failed error={}",
                    err
                );
                return Err(RepoError::io(&self.path, err));
            }
        };

        if raw.trim().is_empty() {
            info!("event=store_load module=repo status=ok file=empty count=0");
            return Ok(Vec::new());
        }

        let document: Value = serde_json::from_str(&raw)?;
        let (todos, dropped) = decode_document(document)?;
        if dropped > 0 {
            warn!(
                "event=store_load module=repo status=degraded dropped={} count={}",
                dropped,
                todos.len()
            );
        }
        info!(
            "event=store_load module=repo status=ok count={} duration_ms={}",
            todos.len(),
            started_at.elapsed().as_millis()
        );
        Ok(todos)
    }

    fn save_todos(&self, todos: &[Todo]) -> RepoResult<()> {
        let started_at = Instant::now();
        let mut bytes = serde_json::to_vec_pretty(&TodoDocument { todos })?;
        bytes.push(b'\n');

        match self.write_atomically(&bytes) {
            Ok(()) => {
                info!(
                    "event=store_save module=repo status=ok count={} bytes={} duration_ms={}",
                    todos.len(),
                    bytes.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=store_save module=repo status=error error_code=write_failed error={}",
                    err
                );
                Err(err)
            }
        }
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Decodes a parsed store document, returning valid todos and a drop count.
fn decode_document(document: Value) -> RepoResult<(Vec<Todo>, usize)> {
    let mut object = match document {
        Value::Object(object) => object,
        other => {
            return Err(RepoError::InvalidData(format!(
                "expected a JSON object at top level, found {}",
                json_kind(&other)
            )));
        }
    };

    let entries = match object.remove(TODOS_FIELD) {
        None | Some(Value::Null) => return Ok((Vec::new(), 0)),
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            return Err(RepoError::InvalidData(format!(
                "`todos` must be an array, found {}",
                json_kind(&other)
            )));
        }
    };

    let mut seen: HashSet<TodoId> = HashSet::with_capacity(entries.len());
    let mut todos = Vec::with_capacity(entries.len());
    let mut dropped = 0;

    for (index, entry) in entries.into_iter().enumerate() {
        let todo = match serde_json::from_value::<Todo>(entry) {
            Ok(todo) => todo,
            Err(err) => {
                warn!(
                    "event=store_load module=repo status=skip index={} reason=schema error={}",
                    index, err
                );
                dropped += 1;
                continue;
            }
        };
        if let Err(err) = todo.validate() {
            warn!(
                "event=store_load module=repo status=skip index={} reason=invalid error={}",
                index, err
            );
            dropped += 1;
            continue;
        }
        if !seen.insert(todo.id.clone()) {
            warn!(
                "event=store_load module=repo status=skip index={} reason=duplicate_id id={}",
                index, todo.id
            );
            dropped += 1;
            continue;
        }
        todos.push(todo);
    }

    Ok((todos, dropped))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
