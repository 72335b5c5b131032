//! Command surface between the store and a presentation layer.
//!
//! # Responsibility
//! - Expose store operations as request/response calls.
//! - Own the push target shared by `todo-added` and `prefill-todo`.
//! - Decode JSON requests and encode stable response envelopes.
//!
//! # Invariants
//! - Requests are handled one at a time; callers hold `&mut self`.
//! - Store errors always reach the caller; nothing is swallowed, reads included.
//!
//! # Wire shape
//! - Request: `{"command": "add-todo", "text": "...", "priority": "high"}`.
//! - Response: `{"ok": true, "result": ...}` or
//!   `{"ok": false, "error": {"code": "...", "message": "..."}}`.

use crate::capture::{capture_clipboard, CaptureError, CapturedText, ClipboardSource};
use crate::model::todo::{Priority, Todo, TodoId, TodoPatch};
use crate::notify::NotificationTarget;
use crate::repo::todo_repo::TodoRepository;
use crate::service::todo_service::{AddTodoOptions, StoreError, StoreResult, TodoStore};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Error code for payloads that do not decode into a request.
pub const INVALID_REQUEST_CODE: &str = "invalid_request";

/// Payload of `add-todo`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTodoRequest {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl AddTodoRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    fn options(&self) -> AddTodoOptions {
        AddTodoOptions {
            priority: self.priority,
            categories: self.categories.clone(),
            source: self.source.clone(),
        }
    }
}

/// Request accepted by `CommandSurface::dispatch`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum CommandRequest {
    GetTodos,
    AddTodo(AddTodoRequest),
    UpdateTodo { id: TodoId, updates: TodoPatch },
    DeleteTodo { id: TodoId },
    ClearCompleted,
}

impl CommandRequest {
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetTodos => "get-todos",
            Self::AddTodo(_) => "add-todo",
            Self::UpdateTodo { .. } => "update-todo",
            Self::DeleteTodo { .. } => "delete-todo",
            Self::ClearCompleted => "clear-completed",
        }
    }
}

/// `{"success": true}` marker returned by delete and clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessMarker {
    pub success: bool,
}

impl SuccessMarker {
    pub const OK: Self = Self { success: true };
}

/// Successful command result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandOutput {
    Todos(Vec<Todo>),
    Todo(Todo),
    Success(SuccessMarker),
}

/// Error body of a failed command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandErrorBody {
    pub code: String,
    pub message: String,
}

/// Response envelope for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<CommandOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<CommandErrorBody>,
}

impl CommandResponse {
    pub fn success(output: CommandOutput) -> Self {
        Self {
            ok: true,
            result: Some(output),
            error: None,
        }
    }

    pub fn failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            result: None,
            error: Some(CommandErrorBody {
                code: code.into(),
                message: message.into(),
            }),
        }
    }

    fn from_store(result: StoreResult<CommandOutput>) -> Self {
        match result {
            Ok(output) => Self::success(output),
            Err(err) => Self::failure(err.code(), err.to_string()),
        }
    }
}

/// Boundary object owning the store and the presentation push target.
pub struct CommandSurface<R: TodoRepository> {
    store: TodoStore<R>,
}

impl<R: TodoRepository> CommandSurface<R> {
    pub fn new(store: TodoStore<R>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &TodoStore<R> {
        &self.store
    }

    /// Installs the presentation surface that receives pushes.
    ///
    /// A later registration replaces the earlier one.
    pub fn register_presentation(&mut self, target: Arc<dyn NotificationTarget>) {
        self.store.register_notification_target(target);
    }

    pub fn unregister_presentation(&mut self) {
        self.store.unregister_notification_target();
    }

    pub fn get_todos(&self) -> Vec<Todo> {
        self.store.list()
    }

    pub fn add_todo(&mut self, request: &AddTodoRequest) -> StoreResult<Todo> {
        self.store.add(&request.text, request.options())
    }

    pub fn update_todo(&mut self, id: &TodoId, updates: &TodoPatch) -> StoreResult<Todo> {
        self.store.update(id, updates)
    }

    pub fn delete_todo(&mut self, id: &TodoId) -> StoreResult<SuccessMarker> {
        self.store.delete(id)?;
        Ok(SuccessMarker::OK)
    }

    pub fn clear_completed(&mut self) -> StoreResult<SuccessMarker> {
        self.store.clear_completed()?;
        Ok(SuccessMarker::OK)
    }

    /// Runs the capture trigger against the registered presentation surface.
    pub fn capture_clipboard(
        &self,
        clipboard: &dyn ClipboardSource,
    ) -> Result<CapturedText, CaptureError> {
        let target = self.store.notification_target();
        capture_clipboard(clipboard, target.as_deref())
    }

    /// Executes one decoded request.
    pub fn dispatch(&mut self, request: CommandRequest) -> CommandResponse {
        let name = request.name();
        debug!("event=command module=command status=start name={}", name);
        let result = match request {
            CommandRequest::GetTodos => Ok(CommandOutput::Todos(self.get_todos())),
            CommandRequest::AddTodo(payload) => self.add_todo(&payload).map(CommandOutput::Todo),
            CommandRequest::UpdateTodo { id, updates } => {
                self.update_todo(&id, &updates).map(CommandOutput::Todo)
            }
            CommandRequest::DeleteTodo { id } => {
                self.delete_todo(&id).map(CommandOutput::Success)
            }
            CommandRequest::ClearCompleted => self.clear_completed().map(CommandOutput::Success),
        };
        if let Err(err) = &result {
            log_command_error(name, err);
        }
        CommandResponse::from_store(result)
    }

    /// Decodes and executes one JSON request line.
    pub fn handle_json(&mut self, line: &str) -> CommandResponse {
        match serde_json::from_str::<CommandRequest>(line) {
            Ok(request) => self.dispatch(request),
            Err(err) => {
                warn!(
                    "event=command module=command status=error error_code={} error={}",
                    INVALID_REQUEST_CODE, err
                );
                CommandResponse::failure(INVALID_REQUEST_CODE, format!("invalid request: {err}"))
            }
        }
    }
}

fn log_command_error(name: &str, err: &StoreError) {
    warn!(
        "event=command module=command status=error name={} error_code={} error={}",
        name,
        err.code(),
        err
    );
}

#[cfg(test)]
mod tests {
    use super::{CommandOutput, CommandRequest, CommandResponse, SuccessMarker};
    use crate::model::todo::{Priority, TodoId};
    use serde_json::json;

    #[test]
    fn requests_decode_from_wire_names() {
        let request: CommandRequest = serde_json::from_value(json!({
            "command": "add-todo",
            "text": "check email",
            "priority": "high",
            "source": "manual"
        }))
        .unwrap();
        match request {
            CommandRequest::AddTodo(payload) => {
                assert_eq!(payload.text, "check email");
                assert_eq!(payload.priority, Some(Priority::High));
                assert_eq!(payload.categories, None);
            }
            other => panic!("unexpected request: {other:?}"),
        }

        let request: CommandRequest = serde_json::from_value(json!({
            "command": "update-todo",
            "id": "abc",
            "updates": {"completed": true, "id": "ignored", "createdAt": "ignored"}
        }))
        .unwrap();
        match request {
            CommandRequest::UpdateTodo { id, updates } => {
                assert_eq!(id, TodoId::from("abc"));
                assert_eq!(updates.completed, Some(true));
                assert_eq!(updates.text, None);
            }
            other => panic!("unexpected request: {other:?}"),
        }

        let request: CommandRequest =
            serde_json::from_value(json!({"command": "clear-completed"})).unwrap();
        assert_eq!(request, CommandRequest::ClearCompleted);
    }

    #[test]
    fn responses_encode_stable_envelopes() {
        let ok = CommandResponse::success(CommandOutput::Success(SuccessMarker::OK));
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"ok": true, "result": {"success": true}})
        );

        let failed = CommandResponse::failure("not_found", "todo with id x not found");
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            json!({
                "ok": false,
                "error": {"code": "not_found", "message": "todo with id x not found"}
            })
        );
    }
}
