//! sqlite-adapter — SQLite implementation of the `TodoStore` port.
//!
//! Purpose
//! - Provide the durable backend: todo lists, todos and user credentials in a
//!   single SQLite file.
//! - Implements the `TodoStore` trait from the `domain` crate.
//! - Exposes `provision_user()` for creating credentials out of band; the port
//!   itself only reads them.
//!
//! Notes
//! - Uses `rusqlite` with the `bundled` feature for portability.
//! - Every operation opens its own connection on the blocking thread pool and
//!   drops it before returning, error or not. Nothing is pooled.
//! - Foreign keys are switched on per connection so deleting a list cascades to
//!   its todos.

use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use domain::ordering::{sort_todo_lists, sort_todos};
use domain::{StoreError, StoreResult, Todo, TodoId, TodoList, TodoListId, TodoStore};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info, warn};

// `lower()` folds ASCII only, like `ordering`; ties fall back to creation order.
const ALL_TODOLISTS: &str = "SELECT id, title FROM todolists ORDER BY lower(title) ASC, id ASC";
const FIND_TODOLIST: &str = "SELECT id, title FROM todolists WHERE id = ?1";
const FIND_TODOS: &str =
    "SELECT id, todolist_id, title, done FROM todos WHERE todolist_id = ?1 ORDER BY id ASC";
const SORTED_TODOS: &str = "SELECT id, todolist_id, title, done FROM todos \
     WHERE todolist_id = ?1 ORDER BY done ASC, lower(title) ASC, id ASC";
const FIND_TODO: &str =
    "SELECT id, todolist_id, title, done FROM todos WHERE todolist_id = ?1 AND id = ?2";
const TOGGLE_DONE: &str = "UPDATE todos SET done = NOT done WHERE todolist_id = ?1 AND id = ?2";
const DELETE_TODO: &str = "DELETE FROM todos WHERE todolist_id = ?1 AND id = ?2";
const DELETE_TODOLIST: &str = "DELETE FROM todolists WHERE id = ?1";
const COMPLETE_TODOS: &str = "UPDATE todos SET done = 1 WHERE todolist_id = ?1 AND NOT done";
// Selecting the list id makes a missing list insert nothing instead of failing
// the foreign key check.
const CREATE_TODO: &str =
    "INSERT INTO todos (title, todolist_id) SELECT ?1, id FROM todolists WHERE id = ?2";
const CREATE_TODOLIST: &str = "INSERT INTO todolists (title) VALUES (?1)";
const UPDATE_TITLE: &str = "UPDATE todolists SET title = ?1 WHERE id = ?2";
const FIND_TODOLIST_TITLE: &str = "SELECT title FROM todolists WHERE title = ?1";
const FIND_HASHED_PASSWORD: &str = "SELECT password_hash FROM users WHERE username = ?1";
const UPSERT_USER: &str = "INSERT INTO users (username, password_hash) VALUES (?1, ?2) \
     ON CONFLICT(username) DO UPDATE SET password_hash = excluded.password_hash";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed todo store.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Open (or create) a SQLite database at the given path and ensure schema.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = connect(&path)?;
        init_schema(&conn)?;
        info!(path = %path.display(), "sqlite schema ready");
        Ok(Self { path })
    }

    /// Like `open`, but creates missing parent directories first.
    pub fn create<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(StoreError::storage)?;
        }
        Self::open(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Store a bcrypt hash of `password` for `username`, replacing any
    /// existing credential. Users are provisioned out of band; the store
    /// itself only ever reads them.
    pub async fn provision_user(&self, username: &str, password: &str, cost: u32) -> StoreResult<()> {
        let password = password.to_string();
        let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(StoreError::storage)?
            .map_err(StoreError::storage)?;
        let username = username.to_string();
        self.with_connection(move |conn| {
            log_query(UPSERT_USER, &username);
            conn.execute(UPSERT_USER, params![username, hash])
                .map_err(map_sqerr)?;
            info!(%username, "provisioned user");
            Ok(())
        })
        .await
    }

    /// Run `f` against a fresh connection on the blocking pool. The connection
    /// is closed when `f` returns.
    async fn with_connection<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = connect(&path)?;
            f(&conn)
        })
        .await
        .map_err(StoreError::storage)?
    }

    /// Run a single-row-count statement and report whether it touched a row.
    async fn affects_rows<P>(&self, statement: &'static str, parameters: P) -> StoreResult<bool>
    where
        P: rusqlite::Params + Debug + Send + 'static,
    {
        self.with_connection(move |conn| {
            log_query(statement, &parameters);
            let changed = conn.execute(statement, parameters).map_err(map_sqerr)?;
            Ok(changed > 0)
        })
        .await
    }

    /// Like `affects_rows`, but a duplicate title turns into `false`.
    async fn affects_rows_unless_duplicate<P>(
        &self,
        statement: &'static str,
        parameters: P,
    ) -> StoreResult<bool>
    where
        P: rusqlite::Params + Debug + Send + 'static,
    {
        match self.affects_rows(statement, parameters).await {
            Err(err) if self.is_unique_constraint_violation(&err) => {
                warn!(error = %err, "todo list title already exists");
                Ok(false)
            }
            other => other,
        }
    }
}

/// Whether a rusqlite error is a UNIQUE constraint failure.
pub fn is_unique_violation(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn connect(path: &Path) -> StoreResult<Connection> {
    let conn = Connection::open(path).map_err(map_sqerr)?;
    conn.busy_timeout(BUSY_TIMEOUT).map_err(map_sqerr)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(map_sqerr)?;
    Ok(conn)
}

fn init_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS todolists (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL UNIQUE
        );
        CREATE TABLE IF NOT EXISTS todos (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            done BOOLEAN NOT NULL DEFAULT 0,
            todolist_id INTEGER NOT NULL
                REFERENCES todolists (id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_todos_todolist_id ON todos(todolist_id);
        CREATE TABLE IF NOT EXISTS users (
            username TEXT PRIMARY KEY,
            password_hash TEXT NOT NULL
        );
        "#,
    )
    .map_err(map_sqerr)
}

fn map_sqerr(e: rusqlite::Error) -> StoreError {
    StoreError::storage(e)
}

fn log_query(statement: &str, parameters: &dyn Debug) {
    debug!(statement, ?parameters, "sqlite query");
}

/// SQLite rowids are signed; an id past `i64::MAX` can not name a stored row.
fn sql_id(id: u64) -> Option<i64> {
    i64::try_from(id).ok()
}

fn id_column(row: &Row, idx: usize) -> rusqlite::Result<u64> {
    let raw: i64 = row.get(idx)?;
    u64::try_from(raw).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(idx, raw))
}

fn row_to_todo_list(row: &Row) -> rusqlite::Result<TodoList> {
    let title: String = row.get(1)?;
    Ok(TodoList::new(id_column(row, 0)?, title))
}

fn row_to_todo(row: &Row) -> rusqlite::Result<Todo> {
    Ok(Todo {
        id: id_column(row, 0)?,
        todo_list_id: id_column(row, 1)?,
        title: row.get(2)?,
        done: row.get(3)?,
    })
}

fn query_todos(conn: &Connection, statement: &str, todo_list_id: i64) -> StoreResult<Vec<Todo>> {
    log_query(statement, &todo_list_id);
    let mut stmt = conn.prepare(statement).map_err(map_sqerr)?;
    let rows = stmt
        .query_map(params![todo_list_id], row_to_todo)
        .map_err(map_sqerr)?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sqerr)
}

#[async_trait]
impl TodoStore for SqliteStore {
    async fn sorted_todo_lists(&self) -> StoreResult<Vec<TodoList>> {
        let todo_lists = self
            .with_connection(|conn| {
                log_query(ALL_TODOLISTS, &());
                let mut stmt = conn.prepare(ALL_TODOLISTS).map_err(map_sqerr)?;
                let mut todo_lists = stmt
                    .query_map([], row_to_todo_list)
                    .map_err(map_sqerr)?
                    .collect::<rusqlite::Result<Vec<_>>>()
                    .map_err(map_sqerr)?;
                for list in &mut todo_lists {
                    // Ids read back from rows always fit.
                    let Some(id) = sql_id(list.id) else { continue };
                    list.todos = query_todos(conn, FIND_TODOS, id)?;
                }
                Ok(todo_lists)
            })
            .await?;
        Ok(sort_todo_lists(todo_lists))
    }

    async fn sorted_todos(&self, todo_list: &TodoList) -> StoreResult<Vec<Todo>> {
        let Some(todo_list_id) = sql_id(todo_list.id) else {
            return Ok(Vec::new());
        };
        let todos = self
            .with_connection(move |conn| query_todos(conn, SORTED_TODOS, todo_list_id))
            .await?;
        Ok(sort_todos(todos))
    }

    async fn load_todo_list(&self, todo_list_id: TodoListId) -> StoreResult<Option<TodoList>> {
        let Some(todo_list_id) = sql_id(todo_list_id) else {
            return Ok(None);
        };
        let find_list = self.with_connection(move |conn| {
            log_query(FIND_TODOLIST, &todo_list_id);
            conn.query_row(FIND_TODOLIST, params![todo_list_id], row_to_todo_list)
                .optional()
                .map_err(map_sqerr)
        });
        let find_todos =
            self.with_connection(move |conn| query_todos(conn, FIND_TODOS, todo_list_id));

        let (list, todos) = tokio::join!(find_list, find_todos);
        let Some(mut list) = list? else {
            return Ok(None);
        };
        list.todos = todos?;
        Ok(Some(list))
    }

    async fn load_todo(
        &self,
        todo_list_id: TodoListId,
        todo_id: TodoId,
    ) -> StoreResult<Option<Todo>> {
        let (Some(todo_list_id), Some(todo_id)) = (sql_id(todo_list_id), sql_id(todo_id)) else {
            return Ok(None);
        };
        self.with_connection(move |conn| {
            log_query(FIND_TODO, &(todo_list_id, todo_id));
            conn.query_row(FIND_TODO, params![todo_list_id, todo_id], row_to_todo)
            .optional()
            .map_err(map_sqerr)
        })
        .await
    }

    async fn toggled_todo(
        &mut self,
        todo_list_id: TodoListId,
        todo_id: TodoId,
    ) -> StoreResult<bool> {
        let (Some(todo_list_id), Some(todo_id)) = (sql_id(todo_list_id), sql_id(todo_id)) else {
            return Ok(false);
        };
        self.affects_rows(TOGGLE_DONE, (todo_list_id, todo_id)).await
    }

    async fn deleted_todo(
        &mut self,
        todo_list_id: TodoListId,
        todo_id: TodoId,
    ) -> StoreResult<bool> {
        let (Some(todo_list_id), Some(todo_id)) = (sql_id(todo_list_id), sql_id(todo_id)) else {
            return Ok(false);
        };
        self.affects_rows(DELETE_TODO, (todo_list_id, todo_id)).await
    }

    async fn delete_todo_list(&mut self, todo_list_id: TodoListId) -> StoreResult<bool> {
        let Some(todo_list_id) = sql_id(todo_list_id) else {
            return Ok(false);
        };
        self.affects_rows(DELETE_TODOLIST, (todo_list_id,)).await
    }

    async fn complete_all_todos(&mut self, todo_list_id: TodoListId) -> StoreResult<bool> {
        let Some(todo_list_id) = sql_id(todo_list_id) else {
            return Ok(false);
        };
        self.affects_rows(COMPLETE_TODOS, (todo_list_id,)).await
    }

    async fn create_todo(&mut self, todo_list_id: TodoListId, title: &str) -> StoreResult<bool> {
        let Some(todo_list_id) = sql_id(todo_list_id) else {
            return Ok(false);
        };
        self.affects_rows(CREATE_TODO, (title.to_string(), todo_list_id))
            .await
    }

    async fn create_todo_list(&mut self, title: &str) -> StoreResult<bool> {
        self.affects_rows_unless_duplicate(CREATE_TODOLIST, (title.to_string(),))
            .await
    }

    async fn set_todo_list_title(
        &mut self,
        todo_list_id: TodoListId,
        title: &str,
    ) -> StoreResult<bool> {
        let Some(todo_list_id) = sql_id(todo_list_id) else {
            return Ok(false);
        };
        self.affects_rows_unless_duplicate(UPDATE_TITLE, (title.to_string(), todo_list_id))
            .await
    }

    async fn exists_todo_list_title(&self, title: &str) -> StoreResult<bool> {
        let title = title.to_string();
        self.with_connection(move |conn| {
            log_query(FIND_TODOLIST_TITLE, &title);
            let mut stmt = conn.prepare(FIND_TODOLIST_TITLE).map_err(map_sqerr)?;
            stmt.exists(params![title]).map_err(map_sqerr)
        })
        .await
    }

    async fn authenticate(&self, username: &str, password: &str) -> StoreResult<bool> {
        let name = username.to_string();
        let hash: Option<String> = self
            .with_connection(move |conn| {
                log_query(FIND_HASHED_PASSWORD, &name);
                conn.query_row(FIND_HASHED_PASSWORD, params![name], |row| row.get(0))
                    .optional()
                    .map_err(map_sqerr)
            })
            .await?;
        let Some(hash) = hash else {
            debug!(username, "unknown user");
            return Ok(false);
        };

        // bcrypt is deliberately slow; keep it off the async workers.
        let password = password.to_string();
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(StoreError::storage)?
            .map_err(StoreError::storage)
    }

    fn is_unique_constraint_violation(&self, error: &StoreError) -> bool {
        error
            .storage_source::<rusqlite::Error>()
            .is_some_and(is_unique_violation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::adapters::session_store::SessionStore;
    use domain::Session;

    const TEST_COST: u32 = 4;

    fn tmp_db() -> (SqliteStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.db");
        let store = SqliteStore::open(path).unwrap();
        (store, dir)
    }

    async fn list_id(store: &SqliteStore, title: &str) -> TodoListId {
        store
            .sorted_todo_lists()
            .await
            .unwrap()
            .into_iter()
            .find(|l| l.title == title)
            .unwrap()
            .id
    }

    async fn todo_id(store: &SqliteStore, list: TodoListId, title: &str) -> TodoId {
        store
            .load_todo_list(list)
            .await
            .unwrap()
            .unwrap()
            .todos
            .into_iter()
            .find(|t| t.title == title)
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn groceries_scenario() {
        let (mut store, _dir) = tmp_db();
        assert!(store.create_todo_list("Groceries").await.unwrap());
        assert!(!store.create_todo_list("Groceries").await.unwrap());

        let list = list_id(&store, "Groceries").await;
        assert!(store.create_todo(list, "Milk").await.unwrap());
        let milk = todo_id(&store, list, "Milk").await;
        assert!(store.toggled_todo(list, milk).await.unwrap());

        let loaded = store.load_todo_list(list).await.unwrap().unwrap();
        let todos = store.sorted_todos(&loaded).await.unwrap();
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].title, "Milk");
        assert!(todos[0].done);

        assert!(store.create_todo(list, "Eggs").await.unwrap());
        let todos = store.sorted_todos(&loaded).await.unwrap();
        let got: Vec<_> = todos.into_iter().map(|t| (t.title, t.done)).collect();
        assert_eq!(
            got,
            vec![("Eggs".to_string(), false), ("Milk".to_string(), true)]
        );
    }

    #[tokio::test]
    async fn load_todo_list_attaches_todos() {
        let (mut store, _dir) = tmp_db();
        assert!(store.create_todo_list("Work").await.unwrap());
        let list = list_id(&store, "Work").await;
        assert!(store.create_todo(list, "report").await.unwrap());
        assert!(store.create_todo(list, "email").await.unwrap());

        let loaded = store.load_todo_list(list).await.unwrap().unwrap();
        assert_eq!(loaded.title, "Work");
        assert_eq!(loaded.todos.len(), 2);
        assert!(loaded.todos.iter().all(|t| t.todo_list_id == list && !t.done));
        assert_eq!(store.todo_list_info(&loaded).count_all, 2);

        assert!(store.load_todo_list(list + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_list_has_no_sorted_todos() {
        let (mut store, _dir) = tmp_db();
        assert!(store.create_todo_list("Empty").await.unwrap());
        let list = list_id(&store, "Empty").await;
        let loaded = store.load_todo_list(list).await.unwrap().unwrap();
        assert!(store.sorted_todos(&loaded).await.unwrap().is_empty());
        assert!(!store.is_done_todo_list(&loaded));
    }

    #[tokio::test]
    async fn toggle_and_delete_report_missing_ids() {
        let (mut store, _dir) = tmp_db();
        assert!(store.create_todo_list("Home").await.unwrap());
        let list = list_id(&store, "Home").await;
        assert!(store.create_todo(list, "dishes").await.unwrap());
        let dishes = todo_id(&store, list, "dishes").await;

        assert!(store.toggled_todo(list, dishes).await.unwrap());
        assert!(store.toggled_todo(list, dishes).await.unwrap());
        assert!(!store.load_todo(list, dishes).await.unwrap().unwrap().done);

        assert!(!store.toggled_todo(list + 1, dishes).await.unwrap());
        assert!(!store.deleted_todo(list, dishes + 1).await.unwrap());
        assert!(store.deleted_todo(list, dishes).await.unwrap());
        assert!(store.load_todo(list, dishes).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn complete_all_reports_whether_anything_changed() {
        let (mut store, _dir) = tmp_db();
        assert!(store.create_todo_list("Chores").await.unwrap());
        let list = list_id(&store, "Chores").await;
        assert!(!store.complete_all_todos(list).await.unwrap());

        assert!(store.create_todo(list, "a").await.unwrap());
        assert!(store.create_todo(list, "b").await.unwrap());
        assert!(store.complete_all_todos(list).await.unwrap());
        let loaded = store.load_todo_list(list).await.unwrap().unwrap();
        assert!(loaded.todos.iter().all(|t| t.done));

        assert!(!store.complete_all_todos(list).await.unwrap());
        assert!(!store.complete_all_todos(list + 100).await.unwrap());
    }

    #[tokio::test]
    async fn deleting_a_list_cascades_to_todos() {
        let (mut store, _dir) = tmp_db();
        assert!(store.create_todo_list("Trip").await.unwrap());
        let list = list_id(&store, "Trip").await;
        assert!(store.create_todo(list, "tickets").await.unwrap());
        let tickets = todo_id(&store, list, "tickets").await;

        assert!(store.delete_todo_list(list).await.unwrap());
        assert!(store.load_todo(list, tickets).await.unwrap().is_none());
        assert!(!store.delete_todo_list(list).await.unwrap());

        let conn = Connection::open(store.path()).unwrap();
        let remaining: i64 = conn
            .query_row("SELECT count(*) FROM todos", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn create_makes_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("todos.db");
        let mut store = SqliteStore::create(&path).unwrap();
        assert!(path.exists());
        assert!(store.create_todo_list("Inbox").await.unwrap());
    }

    #[tokio::test]
    async fn ids_beyond_sqlite_range_are_not_found() {
        let (mut store, _dir) = tmp_db();
        assert!(store.create_todo_list("Home").await.unwrap());
        let list = list_id(&store, "Home").await;
        assert!(store.create_todo(list, "dishes").await.unwrap());
        let huge = u64::MAX;

        assert!(store.load_todo_list(huge).await.unwrap().is_none());
        assert!(store.load_todo(list, huge).await.unwrap().is_none());
        assert!(!store.toggled_todo(huge, 1).await.unwrap());
        assert!(!store.deleted_todo(list, huge).await.unwrap());
        assert!(!store.complete_all_todos(huge).await.unwrap());
        assert!(!store.create_todo(huge, "orphan").await.unwrap());
        assert!(!store.set_todo_list_title(huge, "Elsewhere").await.unwrap());
        assert!(!store.delete_todo_list(huge).await.unwrap());
        assert!(store.sorted_todos(&TodoList::new(huge, "ghost")).await.unwrap().is_empty());

        let loaded = store.load_todo_list(list).await.unwrap().unwrap();
        assert_eq!(loaded.todos.len(), 1);
    }

    #[tokio::test]
    async fn create_todo_needs_an_existing_list() {
        let (mut store, _dir) = tmp_db();
        assert!(!store.create_todo(7, "orphan").await.unwrap());
    }

    #[tokio::test]
    async fn rename_handles_missing_and_duplicate_titles() {
        let (mut store, _dir) = tmp_db();
        assert!(store.create_todo_list("Home").await.unwrap());
        assert!(store.create_todo_list("Work").await.unwrap());
        let work = list_id(&store, "Work").await;

        assert!(!store.set_todo_list_title(work, "Home").await.unwrap());
        assert!(store.set_todo_list_title(work, "Office").await.unwrap());
        assert!(!store.set_todo_list_title(work + 100, "Nowhere").await.unwrap());

        assert!(store.exists_todo_list_title("Office").await.unwrap());
        assert!(!store.exists_todo_list_title("Work").await.unwrap());
        assert!(!store.exists_todo_list_title("office").await.unwrap());
    }

    #[tokio::test]
    async fn classifies_unique_violations() {
        let (store, _dir) = tmp_db();
        let conn = Connection::open(store.path()).unwrap();
        conn.execute(CREATE_TODOLIST, params!["dup"]).unwrap();
        let dup = conn.execute(CREATE_TODOLIST, params!["dup"]).unwrap_err();
        assert!(store.is_unique_constraint_violation(&map_sqerr(dup)));

        let syntax = conn.execute("SELEKT 1", []).unwrap_err();
        assert!(!store.is_unique_constraint_violation(&map_sqerr(syntax)));
        assert!(!store.is_unique_constraint_violation(&StoreError::unsupported("x", "y")));
    }

    #[tokio::test]
    async fn other_storage_failures_propagate() {
        let (mut store, _dir) = tmp_db();
        let conn = Connection::open(store.path()).unwrap();
        conn.execute_batch("DROP TABLE todos; DROP TABLE todolists;")
            .unwrap();

        let err = store.create_todo_list("Anything").await.unwrap_err();
        assert!(matches!(err, StoreError::Storage(_)));
        assert!(!store.is_unique_constraint_violation(&err));
    }

    #[tokio::test]
    async fn authenticate_checks_the_stored_hash() {
        let (store, _dir) = tmp_db();
        store
            .provision_user("alice", "correct horse", TEST_COST)
            .await
            .unwrap();

        assert!(store.authenticate("alice", "correct horse").await.unwrap());
        assert!(!store.authenticate("alice", "wrong-password").await.unwrap());
        assert!(!store.authenticate("nonexistent-user", "anything").await.unwrap());

        let conn = Connection::open(store.path()).unwrap();
        let stored: String = conn
            .query_row(FIND_HASHED_PASSWORD, params!["alice"], |row| row.get(0))
            .unwrap();
        assert_ne!(stored, "correct horse");
    }

    #[tokio::test]
    async fn provisioning_again_replaces_the_password() {
        let (store, _dir) = tmp_db();
        store.provision_user("bob", "first", TEST_COST).await.unwrap();
        store.provision_user("bob", "second", TEST_COST).await.unwrap();
        assert!(!store.authenticate("bob", "first").await.unwrap());
        assert!(store.authenticate("bob", "second").await.unwrap());
    }

    #[tokio::test]
    async fn ordering_matches_the_session_store() {
        let (mut sqlite, _dir) = tmp_db();
        let mut session = Session::default();
        let mut memory = SessionStore::new(&mut session);

        // Same operations against both backends.
        let plan: &[(&str, &[(&str, bool)])] = &[
            ("zoo", &[("lion", true)]),
            ("Bank", &[("deposit", false), ("Audit", true)]),
            ("apple", &[]),
            ("Car", &[("wash", true), ("Oil", true)]),
            ("é", &[("Tie", false), ("tie", false), ("TIE", true)]),
            ("É", &[]),
            ("dog", &[]),
            ("DOG", &[]),
        ];
        for (title, todos) in plan {
            assert!(sqlite.create_todo_list(title).await.unwrap());
            assert!(memory.create_todo_list(title).await.unwrap());
            let sql_list = list_id(&sqlite, title).await;
            let mem_list = memory
                .sorted_todo_lists()
                .await
                .unwrap()
                .into_iter()
                .find(|l| l.title == *title)
                .unwrap()
                .id;
            for (todo, done) in todos.iter() {
                assert!(sqlite.create_todo(sql_list, todo).await.unwrap());
                assert!(memory.create_todo(mem_list, todo).await.unwrap());
                if *done {
                    let id = todo_id(&sqlite, sql_list, todo).await;
                    assert!(sqlite.toggled_todo(sql_list, id).await.unwrap());
                    let id = memory
                        .load_todo_list(mem_list)
                        .await
                        .unwrap()
                        .unwrap()
                        .todos
                        .into_iter()
                        .find(|t| t.title == *todo)
                        .unwrap()
                        .id;
                    assert!(memory.toggled_todo(mem_list, id).await.unwrap());
                }
            }
        }

        let sql_lists = sqlite.sorted_todo_lists().await.unwrap();
        let mem_lists = memory.sorted_todo_lists().await.unwrap();
        let sql_titles: Vec<_> = sql_lists.iter().map(|l| l.title.as_str()).collect();
        let mem_titles: Vec<_> = mem_lists.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(
            sql_titles,
            vec!["apple", "Bank", "dog", "DOG", "É", "é", "Car", "zoo"]
        );
        assert_eq!(sql_titles, mem_titles);

        for (s, m) in sql_lists.iter().zip(mem_lists.iter()) {
            let s_todos: Vec<_> = sqlite
                .sorted_todos(s)
                .await
                .unwrap()
                .into_iter()
                .map(|t| (t.title, t.done))
                .collect();
            let m_todos: Vec<_> = memory
                .sorted_todos(m)
                .await
                .unwrap()
                .into_iter()
                .map(|t| (t.title, t.done))
                .collect();
            assert_eq!(s_todos, m_todos);
        }
    }
}
