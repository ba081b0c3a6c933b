//! Identifier generation for the session-backed store.
//!
//! Ids are derived from the data currently held, never from a private counter,
//! so a reloaded or replaced session can not hand out an id that is still in
//! use.

use crate::{TodoId, TodoList, TodoListId};

/// Next free list id: one past the largest list id present. `None` once the
/// largest id is `u64::MAX`.
pub fn next_todo_list_id(todo_lists: &[TodoList]) -> Option<TodoListId> {
    todo_lists
        .iter()
        .map(|list| list.id)
        .max()
        .unwrap_or(0)
        .checked_add(1)
}

/// Next free todo id: one past the largest todo id in any list, so todo ids
/// stay unique across the whole session and not just within one list.
pub fn next_todo_id(todo_lists: &[TodoList]) -> Option<TodoId> {
    todo_lists
        .iter()
        .flat_map(|list| list.todos.iter())
        .map(|todo| todo.id)
        .max()
        .unwrap_or(0)
        .checked_add(1)
}
