//! Todo store: the sole owner of the durable collection.
//!
//! # Responsibility
//! - Provide list/add/update/delete/clear-completed over the whole collection.
//! - Default priority and categories through `classify` on creation.
//! - Push newly created todos to the registered notification target.
//!
//! # Invariants
//! - Every mutation persists the full next collection before committing it in
//!   memory; a failed save leaves the previous state untouched.
//! - `id` and `created_at` never change after creation.
//! - Ids stay unique across the collection.

use crate::classify::{detect_categories, detect_priority};
use crate::model::todo::{Priority, Todo, TodoId, TodoPatch, SOURCE_MANUAL};
use crate::notify::{NotificationTarget, TodoEvent};
use crate::repo::todo_repo::{RepoError, TodoRepository};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store operation failure.
#[derive(Debug)]
pub enum StoreError {
    /// Text was empty after trimming.
    InvalidInput(String),
    /// No todo with the given id.
    NotFound(TodoId),
    /// Durable read or write failed.
    Storage(RepoError),
}

impl StoreError {
    /// Stable machine-readable code for boundary responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::NotFound(_) => "not_found",
            Self::Storage(_) => "storage_error",
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::NotFound(id) => write!(f, "todo with id {id} not found"),
            Self::Storage(err) => write!(f, "storage error: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Storage(value)
    }
}

/// Optional overrides for `TodoStore::add`.
///
/// A supplied value is used as-is, even `Priority::None` or an empty category
/// list. A blank `source` falls back to `manual`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddTodoOptions {
    pub priority: Option<Priority>,
    pub categories: Option<Vec<String>>,
    pub source: Option<String>,
}

impl AddTodoOptions {
    pub fn with_source(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            ..Self::default()
        }
    }
}

/// In-memory view of the durable collection plus its single push target.
pub struct TodoStore<R: TodoRepository> {
    repo: R,
    todos: Vec<Todo>,
    target: Option<Arc<dyn NotificationTarget>>,
}

impl<R: TodoRepository> TodoStore<R> {
    /// Opens the store and loads the current collection.
    ///
    /// # Errors
    /// - `Storage` when the file exists but cannot be read or is malformed.
    pub fn open(repo: R) -> StoreResult<Self> {
        let todos = repo.load_todos().map_err(|err| {
            error!(
                "event=store_open module=store status=error location={} error={}",
                repo.location(),
                err
            );
            err
        })?;
        info!(
            "event=store_open module=store status=ok location={} count={}",
            repo.location(),
            todos.len()
        );
        Ok(Self {
            repo,
            todos,
            target: None,
        })
    }

    /// Returns the full collection in insertion order.
    pub fn list(&self) -> Vec<Todo> {
        self.todos.clone()
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn get(&self, id: &TodoId) -> Option<&Todo> {
        self.todos.iter().find(|todo| &todo.id == id)
    }

    pub fn len(&self) -> usize {
        self.todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    /// Storage location of the backing repository.
    pub fn location(&self) -> String {
        self.repo.location()
    }

    /// Creates, persists and announces a new todo.
    ///
    /// # Errors
    /// - `InvalidInput` when `text` trims to empty; nothing is written.
    /// - `Storage` when the save fails; the new todo is discarded.
    pub fn add(&mut self, text: &str, options: AddTodoOptions) -> StoreResult<Todo> {
        if text.trim().is_empty() {
            return Err(StoreError::InvalidInput(
                "todo text must not be empty".to_string(),
            ));
        }

        let mut todo = Todo::new(text);
        while self.get(&todo.id).is_some() {
            todo.id = TodoId::generate();
        }
        todo.priority = options
            .priority
            .unwrap_or_else(|| detect_priority(&todo.text));
        todo.categories = options
            .categories
            .unwrap_or_else(|| detect_categories(&todo.text));
        todo.source = options
            .source
            .map(|source| source.trim().to_string())
            .filter(|source| !source.is_empty())
            .unwrap_or_else(|| SOURCE_MANUAL.to_string());

        let mut next = self.todos.clone();
        next.push(todo.clone());
        self.commit(next, "todo_add")?;

        info!(
            "event=todo_add module=store status=ok id={} source={} priority={} categories={}",
            todo.id,
            todo.source,
            todo.priority,
            todo.categories.len()
        );

        if let Some(target) = &self.target {
            target.deliver(&TodoEvent::TodoAdded(todo.clone()));
        }
        Ok(todo)
    }

    /// Merges `patch` onto the todo with `id` and persists.
    ///
    /// # Errors
    /// - `NotFound` when `id` is unknown; the collection is unchanged.
    /// - `InvalidInput` when the patch would blank the text.
    /// - `Storage` when the save fails.
    pub fn update(&mut self, id: &TodoId, patch: &TodoPatch) -> StoreResult<Todo> {
        let index = self.index_of(id)?;
        if matches!(&patch.text, Some(text) if text.trim().is_empty()) {
            return Err(StoreError::InvalidInput(
                "todo text must not be empty".to_string(),
            ));
        }

        let mut next = self.todos.clone();
        patch.apply_to(&mut next[index]);
        let updated = next[index].clone();
        self.commit(next, "todo_update")?;

        info!(
            "event=todo_update module=store status=ok id={} completed={} priority={}",
            updated.id, updated.completed, updated.priority
        );
        Ok(updated)
    }

    /// Removes the todo with `id` and persists.
    ///
    /// # Errors
    /// - `NotFound` when `id` is unknown.
    /// - `Storage` when the save fails.
    pub fn delete(&mut self, id: &TodoId) -> StoreResult<()> {
        let index = self.index_of(id)?;
        let mut next = self.todos.clone();
        next.remove(index);
        self.commit(next, "todo_delete")?;

        info!("event=todo_delete module=store status=ok id={}", id);
        Ok(())
    }

    /// Removes every completed todo and persists, even when none matched.
    ///
    /// Returns how many todos were removed. Only a failed save is an error.
    pub fn clear_completed(&mut self) -> StoreResult<usize> {
        let next: Vec<Todo> = self
            .todos
            .iter()
            .filter(|todo| !todo.completed)
            .cloned()
            .collect();
        let removed = self.todos.len() - next.len();
        self.commit(next, "todo_clear_completed")?;

        info!(
            "event=todo_clear_completed module=store status=ok removed={}",
            removed
        );
        Ok(removed)
    }

    /// Installs the single push target, returning the one it replaces.
    pub fn register_notification_target(
        &mut self,
        target: Arc<dyn NotificationTarget>,
    ) -> Option<Arc<dyn NotificationTarget>> {
        let previous = self.target.replace(target);
        if previous.is_some() {
            info!("event=target_register module=store status=ok replaced=true");
        } else {
            info!("event=target_register module=store status=ok replaced=false");
        }
        previous
    }

    pub fn unregister_notification_target(&mut self) -> Option<Arc<dyn NotificationTarget>> {
        self.target.take()
    }

    pub fn notification_target(&self) -> Option<Arc<dyn NotificationTarget>> {
        self.target.clone()
    }

    fn index_of(&self, id: &TodoId) -> StoreResult<usize> {
        self.todos
            .iter()
            .position(|todo| &todo.id == id)
            .ok_or_else(|| {
                warn!("event=todo_lookup module=store status=not_found id={}", id);
                StoreError::NotFound(id.clone())
            })
    }

    fn commit(&mut self, next: Vec<Todo>, event: &str) -> StoreResult<()> {
        if let Err(err) = self.repo.save_todos(&next) {
            error!(
                "event={} module=store status=error error_code=persist_failed error={}",
                event, err
            );
            return Err(err.into());
        }
        self.todos = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{AddTodoOptions, StoreError, TodoStore};
    use crate::model::todo::{Priority, Todo, TodoId, TodoPatch};
    use crate::repo::todo_repo::{RepoError, RepoResult, TodoRepository};
    use std::cell::{Cell, RefCell};

    /// In-memory repository that can be told to fail the next saves.
    #[derive(Default)]
    struct MemoryRepo {
        saved: RefCell<Vec<Todo>>,
        fail_saves: Cell<bool>,
    }

    impl TodoRepository for &MemoryRepo {
        fn load_todos(&self) -> RepoResult<Vec<Todo>> {
            Ok(self.saved.borrow().clone())
        }

        fn save_todos(&self, todos: &[Todo]) -> RepoResult<()> {
            if self.fail_saves.get() {
                return Err(RepoError::InvalidData("disk full".to_string()));
            }
            *self.saved.borrow_mut() = todos.to_vec();
            Ok(())
        }

        fn location(&self) -> String {
            "memory".to_string()
        }
    }

    #[test]
    fn add_applies_classification_defaults() {
        let repo = MemoryRepo::default();
        let mut store = TodoStore::open(&repo).unwrap();

        let todo = store
            .add("  URGENT: answer the email  ", AddTodoOptions::default())
            .unwrap();

        assert_eq!(todo.text, "URGENT: answer the email");
        assert_eq!(todo.priority, Priority::High);
        assert_eq!(todo.categories, vec!["Email".to_string()]);
        assert_eq!(todo.source, "manual");
        assert!(!todo.completed);
        assert_eq!(repo.saved.borrow().len(), 1);
    }

    #[test]
    fn add_keeps_explicit_options() {
        let repo = MemoryRepo::default();
        let mut store = TodoStore::open(&repo).unwrap();

        let todo = store
            .add(
                "urgent slack thread",
                AddTodoOptions {
                    priority: Some(Priority::None),
                    categories: Some(Vec::new()),
                    source: Some("hotkey".to_string()),
                },
            )
            .unwrap();

        assert_eq!(todo.priority, Priority::None);
        assert!(todo.categories.is_empty());
        assert_eq!(todo.source, "hotkey");
    }

    #[test]
    fn failed_save_keeps_previous_state() {
        let repo = MemoryRepo::default();
        let mut store = TodoStore::open(&repo).unwrap();
        let kept = store.add("keep me", AddTodoOptions::default()).unwrap();

        repo.fail_saves.set(true);
        let err = store
            .add("lost", AddTodoOptions::default())
            .expect_err("save failure must surface");
        assert!(matches!(err, StoreError::Storage(_)));
        assert_eq!(err.code(), "storage_error");

        let err = store
            .update(&kept.id, &TodoPatch::completed(true))
            .expect_err("save failure must surface");
        assert!(matches!(err, StoreError::Storage(_)));

        assert_eq!(store.list(), vec![kept.clone()]);
        assert!(!store.get(&kept.id).unwrap().completed);
    }

    #[test]
    fn failed_save_keeps_deleted_and_cleared_todos() {
        let repo = MemoryRepo::default();
        let mut store = TodoStore::open(&repo).unwrap();
        let open = store.add("still open", AddTodoOptions::default()).unwrap();
        let done = store.add("done", AddTodoOptions::default()).unwrap();
        store.update(&done.id, &TodoPatch::completed(true)).unwrap();
        let before = store.list();

        repo.fail_saves.set(true);
        let err = store.delete(&open.id).expect_err("save failure must surface");
        assert_eq!(err.code(), "storage_error");
        assert_eq!(store.list(), before);

        let err = store.clear_completed().expect_err("save failure must surface");
        assert!(matches!(err, StoreError::Storage(_)));
        assert_eq!(store.list(), before);
        assert_eq!(*repo.saved.borrow(), before);
    }

    #[test]
    fn update_rejects_blank_text_without_mutation() {
        let repo = MemoryRepo::default();
        let mut store = TodoStore::open(&repo).unwrap();
        let todo = store.add("original", AddTodoOptions::default()).unwrap();

        let patch = TodoPatch {
            text: Some("  ".to_string()),
            ..TodoPatch::default()
        };
        let err = store.update(&todo.id, &patch).unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));
        assert_eq!(store.get(&todo.id).unwrap().text, "original");
    }

    #[test]
    fn unknown_id_reports_not_found() {
        let repo = MemoryRepo::default();
        let mut store = TodoStore::open(&repo).unwrap();
        let missing = TodoId::from("missing");

        assert!(matches!(
            store.delete(&missing),
            Err(StoreError::NotFound(id)) if id == missing
        ));
    }
}
