use async_trait::async_trait;
use tracing::debug;

use crate::identity::{next_todo_id, next_todo_list_id};
use crate::ordering::{sort_todo_lists, sort_todos};
use crate::{
    Session, StoreError, StoreResult, Todo, TodoId, TodoList, TodoListId, TodoStore,
};

const BACKEND: &str = "session";

/// Todo store working directly on the lists held in a session.
///
/// Reads hand out owned copies so callers can never reach the session data
/// through a returned record; writes mutate the borrowed lists in place. There
/// is no locking: the session layer guarantees one request per session at a
/// time, and `&mut` access enforces it at compile time.
pub struct SessionStore<'s> {
    todo_lists: &'s mut Vec<TodoList>,
}

impl<'s> SessionStore<'s> {
    pub fn new(session: &'s mut Session) -> Self {
        Self {
            todo_lists: &mut session.todo_lists,
        }
    }

    fn find_todo_list(&self, todo_list_id: TodoListId) -> Option<&TodoList> {
        self.todo_lists.iter().find(|list| list.id == todo_list_id)
    }

    fn find_todo_list_mut(&mut self, todo_list_id: TodoListId) -> Option<&mut TodoList> {
        self.todo_lists.iter_mut().find(|list| list.id == todo_list_id)
    }

    fn find_todo(&self, todo_list_id: TodoListId, todo_id: TodoId) -> Option<&Todo> {
        self.find_todo_list(todo_list_id)?
            .todos
            .iter()
            .find(|todo| todo.id == todo_id)
    }

    fn find_todo_mut(&mut self, todo_list_id: TodoListId, todo_id: TodoId) -> Option<&mut Todo> {
        self.find_todo_list_mut(todo_list_id)?
            .todos
            .iter_mut()
            .find(|todo| todo.id == todo_id)
    }

    fn title_taken(&self, title: &str, except: Option<TodoListId>) -> bool {
        self.todo_lists
            .iter()
            .any(|list| list.title == title && Some(list.id) != except)
    }
}

#[async_trait]
impl TodoStore for SessionStore<'_> {
    async fn sorted_todo_lists(&self) -> StoreResult<Vec<TodoList>> {
        Ok(sort_todo_lists(self.todo_lists.clone()))
    }

    async fn sorted_todos(&self, todo_list: &TodoList) -> StoreResult<Vec<Todo>> {
        Ok(sort_todos(todo_list.todos.clone()))
    }

    async fn load_todo_list(&self, todo_list_id: TodoListId) -> StoreResult<Option<TodoList>> {
        Ok(self.find_todo_list(todo_list_id).cloned())
    }

    async fn load_todo(
        &self,
        todo_list_id: TodoListId,
        todo_id: TodoId,
    ) -> StoreResult<Option<Todo>> {
        Ok(self.find_todo(todo_list_id, todo_id).cloned())
    }

    async fn toggled_todo(
        &mut self,
        todo_list_id: TodoListId,
        todo_id: TodoId,
    ) -> StoreResult<bool> {
        let Some(todo) = self.find_todo_mut(todo_list_id, todo_id) else {
            return Ok(false);
        };
        todo.done = !todo.done;
        debug!(todo_list_id, todo_id, done = todo.done, "toggled todo");
        Ok(true)
    }

    async fn deleted_todo(
        &mut self,
        todo_list_id: TodoListId,
        todo_id: TodoId,
    ) -> StoreResult<bool> {
        let Some(list) = self.find_todo_list_mut(todo_list_id) else {
            return Ok(false);
        };
        let Some(index) = list.todos.iter().position(|todo| todo.id == todo_id) else {
            return Ok(false);
        };
        list.todos.remove(index);
        debug!(todo_list_id, todo_id, "deleted todo");
        Ok(true)
    }

    async fn delete_todo_list(&mut self, todo_list_id: TodoListId) -> StoreResult<bool> {
        let Some(index) = self
            .todo_lists
            .iter()
            .position(|list| list.id == todo_list_id)
        else {
            return Ok(false);
        };
        // Todos go with their list.
        let removed = self.todo_lists.remove(index);
        debug!(todo_list_id, todos = removed.todos.len(), "deleted todo list");
        Ok(true)
    }

    async fn complete_all_todos(&mut self, todo_list_id: TodoListId) -> StoreResult<bool> {
        let Some(list) = self.find_todo_list_mut(todo_list_id) else {
            return Ok(false);
        };
        let mut completed = 0usize;
        for todo in list.todos.iter_mut().filter(|todo| !todo.done) {
            todo.done = true;
            completed += 1;
        }
        debug!(todo_list_id, completed, "completed all todos");
        Ok(completed > 0)
    }

    async fn create_todo(&mut self, todo_list_id: TodoListId, title: &str) -> StoreResult<bool> {
        if self.find_todo_list(todo_list_id).is_none() {
            return Ok(false);
        }
        let id = next_todo_id(self.todo_lists.as_slice())
            .ok_or(StoreError::IdsExhausted("todo"))?;
        let Some(list) = self.find_todo_list_mut(todo_list_id) else {
            return Ok(false);
        };
        list.todos.push(Todo::new(id, todo_list_id, title));
        debug!(todo_list_id, todo_id = id, "created todo");
        Ok(true)
    }

    async fn create_todo_list(&mut self, title: &str) -> StoreResult<bool> {
        if self.title_taken(title, None) {
            debug!(title, "todo list title already taken");
            return Ok(false);
        }
        let id = next_todo_list_id(self.todo_lists.as_slice())
            .ok_or(StoreError::IdsExhausted("todo list"))?;
        self.todo_lists.push(TodoList::new(id, title));
        debug!(todo_list_id = id, "created todo list");
        Ok(true)
    }

    async fn set_todo_list_title(
        &mut self,
        todo_list_id: TodoListId,
        title: &str,
    ) -> StoreResult<bool> {
        if self.title_taken(title, Some(todo_list_id)) {
            debug!(todo_list_id, title, "todo list title already taken");
            return Ok(false);
        }
        let Some(list) = self.find_todo_list_mut(todo_list_id) else {
            return Ok(false);
        };
        list.title = title.to_string();
        Ok(true)
    }

    async fn exists_todo_list_title(&self, title: &str) -> StoreResult<bool> {
        Ok(self.title_taken(title, None))
    }

    async fn authenticate(&self, _username: &str, _password: &str) -> StoreResult<bool> {
        Err(StoreError::unsupported(BACKEND, "authenticate"))
    }

    fn is_unique_constraint_violation(&self, _error: &StoreError) -> bool {
        false
    }
}
