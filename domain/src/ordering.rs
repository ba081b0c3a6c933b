//! Canonical display order shared by every backend.
//!
//! Entries are split into undone and done groups, undone first; each group is
//! ordered by title compared case-insensitively. Only ASCII letters are
//! folded, the same rule as SQLite's `lower()`, so both backends agree on which
//! titles tie. The sort is stable, so entries whose titles compare equal keep
//! the order they arrived in.

use crate::{Todo, TodoList};

/// Order lists: undone lists first, then done lists, each by title.
pub fn sort_todo_lists(todo_lists: Vec<TodoList>) -> Vec<TodoList> {
    partition_by_title(todo_lists, TodoList::is_done, |list| list.title.as_str())
}

/// Order todos: undone todos first, then done todos, each by title.
pub fn sort_todos(todos: Vec<Todo>) -> Vec<Todo> {
    partition_by_title(todos, |todo| todo.done, |todo| todo.title.as_str())
}

fn partition_by_title<T>(
    mut items: Vec<T>,
    is_done: impl Fn(&T) -> bool,
    title: impl Fn(&T) -> &str,
) -> Vec<T> {
    // `false` sorts before `true`, which puts undone entries first.
    items.sort_by_cached_key(|item| (is_done(item), title(item).to_ascii_lowercase()));
    items
}
