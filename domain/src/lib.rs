//! Domain library for the todo lists application.
//!
//! This crate holds the domain types, the storage port (`TodoStore`), and the
//! error definitions shared by every backend. Durable adapters and IO concerns
//! live in their own crates; the only adapter kept here is the session-backed
//! store, which needs nothing beyond the standard library.

use std::error::Error;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Identifier of a todo list. Unique across all lists.
pub type TodoListId = u64;

/// Identifier of a todo. Unique within its owning list.
pub type TodoId = u64;

/// A single todo item owned by exactly one list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: TodoId,
    pub todo_list_id: TodoListId,
    pub title: String,
    #[serde(default)]
    pub done: bool,
}

impl Todo {
    /// A freshly created todo is never done.
    pub fn new(id: TodoId, todo_list_id: TodoListId, title: impl Into<String>) -> Self {
        Self {
            id,
            todo_list_id,
            title: title.into(),
            done: false,
        }
    }
}

/// A titled list composed of todos. Storage order of `todos` carries no
/// meaning; callers get a canonical order through `TodoStore::sorted_todos`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoList {
    pub id: TodoListId,
    pub title: String,
    #[serde(default)]
    pub todos: Vec<Todo>,
}

impl TodoList {
    pub fn new(id: TodoListId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            todos: Vec::new(),
        }
    }

    /// A list is done when it has at least one todo and all of them are done.
    /// An empty list is never done.
    pub fn is_done(&self) -> bool {
        !self.todos.is_empty() && self.todos.iter().all(|todo| todo.done)
    }

    /// Summary counters for rendering a list.
    pub fn info(&self) -> TodoListInfo {
        TodoListInfo {
            count_all: self.todos.len(),
            count_done: self.todos.iter().filter(|todo| todo.done).count(),
            is_done: self.is_done(),
        }
    }
}

/// Counters derived from a loaded list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoListInfo {
    pub count_all: usize,
    pub count_done: usize,
    pub is_done: bool,
}

/// Session-scoped container for the in-memory backend.
///
/// Owned by whatever manages sessions; a `SessionStore` only borrows it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub todo_lists: Vec<TodoList>,
}

/// Storage port for todo lists, todos and credentials.
///
/// Lookups report a missing record as `Ok(None)`, mutations as `Ok(false)`.
/// Errors are reserved for unsupported operations and storage failures.
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// All lists, undone before done, each group by case-insensitive title.
    /// Todos inside each list are left unsorted.
    async fn sorted_todo_lists(&self) -> StoreResult<Vec<TodoList>>;

    /// The todos of `todo_list`, undone before done, each group by title.
    async fn sorted_todos(&self, todo_list: &TodoList) -> StoreResult<Vec<Todo>>;

    /// A list with its (unsorted) todos attached.
    async fn load_todo_list(&self, todo_list_id: TodoListId) -> StoreResult<Option<TodoList>>;

    async fn load_todo(
        &self,
        todo_list_id: TodoListId,
        todo_id: TodoId,
    ) -> StoreResult<Option<Todo>>;

    /// Flip the `done` flag of a todo.
    async fn toggled_todo(&mut self, todo_list_id: TodoListId, todo_id: TodoId)
        -> StoreResult<bool>;

    async fn deleted_todo(&mut self, todo_list_id: TodoListId, todo_id: TodoId)
        -> StoreResult<bool>;

    /// Delete a list together with all of its todos.
    async fn delete_todo_list(&mut self, todo_list_id: TodoListId) -> StoreResult<bool>;

    /// Mark every todo of a list as done. Reports `false` when the call did
    /// not complete anything.
    async fn complete_all_todos(&mut self, todo_list_id: TodoListId) -> StoreResult<bool>;

    async fn create_todo(&mut self, todo_list_id: TodoListId, title: &str) -> StoreResult<bool>;

    /// Create a list. Reports `false` when the title is already taken.
    async fn create_todo_list(&mut self, title: &str) -> StoreResult<bool>;

    async fn set_todo_list_title(
        &mut self,
        todo_list_id: TodoListId,
        title: &str,
    ) -> StoreResult<bool>;

    /// Exact-match check for an existing list title.
    async fn exists_todo_list_title(&self, title: &str) -> StoreResult<bool>;

    /// Check a plaintext password against the stored hash for `username`.
    async fn authenticate(&self, username: &str, password: &str) -> StoreResult<bool>;

    /// Whether `error` is a duplicate-key violation raised by this backend.
    fn is_unique_constraint_violation(&self, error: &StoreError) -> bool;

    fn is_done_todo_list(&self, todo_list: &TodoList) -> bool {
        todo_list.is_done()
    }

    fn is_done_todo(&self, todo: &Todo) -> bool {
        todo.done
    }

    fn todo_list_info(&self, todo_list: &TodoList) -> TodoListInfo {
        todo_list.info()
    }
}

/// Errors surfaced by stores and the helpers around them.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{operation} is not supported by the {backend} backend")]
    Unsupported {
        backend: &'static str,
        operation: &'static str,
    },
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn Error + Send + Sync>),
    #[error("{0}")]
    InvalidTitle(String),
    #[error("no unused {0} ids left")]
    IdsExhausted(&'static str),
}

impl StoreError {
    pub fn unsupported(backend: &'static str, operation: &'static str) -> Self {
        Self::Unsupported { backend, operation }
    }

    /// Wrap a backend-native error, keeping it reachable for classification.
    pub fn storage<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self::Storage(Box::new(error))
    }

    /// The backend-native error behind a `Storage` failure, if it has type `E`.
    pub fn storage_source<E: Error + 'static>(&self) -> Option<&E> {
        match self {
            Self::Storage(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

pub mod adapters;
pub mod identity;
pub mod ordering;
pub mod validate;
