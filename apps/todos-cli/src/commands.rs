//! Command parsing and execution against any `TodoStore`.
//!
//! This is the caller side of the store: ids are parsed and titles validated
//! here, and "not found" answers from the store are turned into errors.

use domain::validate::{validate_title, TitleKind};
use domain::{StoreError, TodoId, TodoListId, TodoStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Lists,
    Show(TodoListId),
    NewList(String),
    Rename(TodoListId, String),
    DeleteList(TodoListId),
    Add(TodoListId, String),
    Toggle(TodoListId, TodoId),
    Delete(TodoListId, TodoId),
    CompleteAll(TodoListId),
    Login { username: String, password: String },
    AddUser { username: String, password: String },
    Help,
}

pub const USAGE: &str = "Usage:
  todos lists
  todos show <list>
  todos new-list <title>
  todos rename <list> <title>
  todos delete-list <list>
  todos add <list> <title>
  todos toggle <list> <todo>
  todos delete <list> <todo>
  todos complete-all <list>
  todos login <username> <password>
  todos add-user <username> <password>   (sqlite only)

Environment: STORAGE_PROVIDER=sqlite|memory, DB_PATH, SESSION_PATH, LOG_FORMAT, BCRYPT_COST";

const NOT_FOUND: &str = "Not found.";

impl Command {
    pub fn parse(args: &[String]) -> Result<Self, String> {
        let Some((cmd, rest)) = args.split_first() else {
            return Ok(Command::Help);
        };
        let command = match (cmd.as_str(), rest) {
            ("lists", []) => Command::Lists,
            ("show", [list]) => Command::Show(parse_id(list)?),
            ("new-list", [title]) => Command::NewList(title.clone()),
            ("rename", [list, title]) => Command::Rename(parse_id(list)?, title.clone()),
            ("delete-list", [list]) => Command::DeleteList(parse_id(list)?),
            ("add", [list, title]) => Command::Add(parse_id(list)?, title.clone()),
            ("toggle", [list, todo]) => Command::Toggle(parse_id(list)?, parse_id(todo)?),
            ("delete", [list, todo]) => Command::Delete(parse_id(list)?, parse_id(todo)?),
            ("complete-all", [list]) => Command::CompleteAll(parse_id(list)?),
            ("login", [username, password]) => Command::Login {
                username: username.clone(),
                password: password.clone(),
            },
            ("add-user", [username, password]) => Command::AddUser {
                username: username.clone(),
                password: password.clone(),
            },
            ("help" | "--help" | "-h", _) => Command::Help,
            (other, _) => return Err(format!("unknown command or wrong arguments: {}", other)),
        };
        Ok(command)
    }
}

fn parse_id(raw: &str) -> Result<u64, String> {
    raw.parse()
        .map_err(|_| format!("expected a numeric id, got '{}'", raw))
}

fn fail(err: StoreError) -> String {
    err.to_string()
}

/// Run a command and return the text to print.
///
/// `AddUser` and `Help` are not store operations and are rejected here.
pub async fn execute(store: &mut dyn TodoStore, command: Command) -> Result<String, String> {
    match command {
        Command::Lists => {
            let todo_lists = store.sorted_todo_lists().await.map_err(fail)?;
            if todo_lists.is_empty() {
                return Ok("No todo lists.".to_string());
            }
            let lines: Vec<String> = todo_lists
                .iter()
                .map(|list| {
                    let info = store.todo_list_info(list);
                    format!(
                        "{:>4}  {}  {}/{}{}",
                        list.id,
                        list.title,
                        info.count_done,
                        info.count_all,
                        if info.is_done { "  (done)" } else { "" }
                    )
                })
                .collect();
            Ok(lines.join("\n"))
        }
        Command::Show(list_id) => {
            let Some(list) = store.load_todo_list(list_id).await.map_err(fail)? else {
                return Err(NOT_FOUND.into());
            };
            let info = store.todo_list_info(&list);
            let mut lines = vec![format!(
                "{} ({}/{} done)",
                list.title, info.count_done, info.count_all
            )];
            for todo in store.sorted_todos(&list).await.map_err(fail)? {
                let mark = if store.is_done_todo(&todo) { "x" } else { " " };
                lines.push(format!("  [{}] {:>4}  {}", mark, todo.id, todo.title));
            }
            Ok(lines.join("\n"))
        }
        Command::NewList(raw) => {
            let title = validate_title(TitleKind::List, &raw).map_err(fail)?;
            if store.exists_todo_list_title(&title).await.map_err(fail)? {
                return Err("List title must be unique.".into());
            }
            if !store.create_todo_list(&title).await.map_err(fail)? {
                return Err("Failed to create todo list.".into());
            }
            Ok("The todo list has been created.".into())
        }
        Command::Rename(list_id, raw) => {
            let title = validate_title(TitleKind::List, &raw).map_err(fail)?;
            if store.load_todo_list(list_id).await.map_err(fail)?.is_none() {
                return Err(NOT_FOUND.into());
            }
            if store.exists_todo_list_title(&title).await.map_err(fail)? {
                return Err("List title must be unique.".into());
            }
            if !store.set_todo_list_title(list_id, &title).await.map_err(fail)? {
                return Err(NOT_FOUND.into());
            }
            Ok("Todo list updated.".into())
        }
        Command::DeleteList(list_id) => {
            if !store.delete_todo_list(list_id).await.map_err(fail)? {
                return Err(NOT_FOUND.into());
            }
            Ok("Todo list deleted.".into())
        }
        Command::Add(list_id, raw) => {
            if store.load_todo_list(list_id).await.map_err(fail)?.is_none() {
                return Err(NOT_FOUND.into());
            }
            let title = validate_title(TitleKind::Todo, &raw).map_err(fail)?;
            if !store.create_todo(list_id, &title).await.map_err(fail)? {
                return Err(NOT_FOUND.into());
            }
            Ok("The todo has been created.".into())
        }
        Command::Toggle(list_id, todo_id) => {
            if !store.toggled_todo(list_id, todo_id).await.map_err(fail)? {
                return Err(NOT_FOUND.into());
            }
            let Some(todo) = store.load_todo(list_id, todo_id).await.map_err(fail)? else {
                return Err(NOT_FOUND.into());
            };
            if todo.done {
                Ok(format!("\"{}\" marked done.", todo.title))
            } else {
                Ok(format!("\"{}\" marked as NOT done!", todo.title))
            }
        }
        Command::Delete(list_id, todo_id) => {
            if !store.deleted_todo(list_id, todo_id).await.map_err(fail)? {
                return Err(NOT_FOUND.into());
            }
            Ok("The todo has been deleted.".into())
        }
        Command::CompleteAll(list_id) => {
            if store.complete_all_todos(list_id).await.map_err(fail)? {
                return Ok("All todos have been marked as done.".into());
            }
            match store.load_todo_list(list_id).await.map_err(fail)? {
                Some(_) => Ok("Nothing left to complete.".into()),
                None => Err(NOT_FOUND.into()),
            }
        }
        Command::Login { username, password } => {
            if store.authenticate(&username, &password).await.map_err(fail)? {
                Ok(format!("Welcome {}!", username))
            } else {
                Err("Invalid credentials.".into())
            }
        }
        Command::AddUser { .. } | Command::Help => {
            Err("not a store operation".into())
        }
    }
}
