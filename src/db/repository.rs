use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite};

use crate::models::{Todo, TodoStatus};

const TODO_COLUMNS: &str = "id, description, status, created_at, done_at, due_at";

pub async fn insert_todo<'e, E>(
    db: E,
    description: &str,
    created_at: DateTime<Utc>,
) -> Result<Todo, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Todo>(&format!(
        "INSERT INTO todos (description, status, created_at, done_at, due_at) \
         VALUES (?1, ?2, ?3, NULL, NULL) RETURNING {TODO_COLUMNS}"
    ))
    .bind(description)
    .bind(TodoStatus::NotDone)
    .bind(created_at)
    .fetch_one(db)
    .await
}

pub async fn find_todo_by_id<'e, E>(db: E, id: i64) -> Result<Option<Todo>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Todo>(&format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = ?"))
        .bind(id)
        .fetch_optional(db)
        .await
}

/// One zero-based page of all todos, ordered by id.
pub async fn fetch_todos_page<'e, E>(db: E, page: i64, size: i64) -> Result<Vec<Todo>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Todo>(&format!(
        "SELECT {TODO_COLUMNS} FROM todos ORDER BY id LIMIT ?1 OFFSET ?2"
    ))
    .bind(size)
    .bind(page * size)
    .fetch_all(db)
    .await
}

pub async fn fetch_todos_page_by_status<'e, E>(
    db: E,
    status: TodoStatus,
    page: i64,
    size: i64,
) -> Result<Vec<Todo>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Todo>(&format!(
        "SELECT {TODO_COLUMNS} FROM todos WHERE status = ?1 ORDER BY id LIMIT ?2 OFFSET ?3"
    ))
    .bind(status)
    .bind(size)
    .bind(page * size)
    .fetch_all(db)
    .await
}

/// Writes every mutable column of `todo`. Returns whether the row existed.
pub async fn update_todo<'e, E>(db: E, todo: &Todo) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE todos
        SET description = ?1,
            status = ?2,
            done_at = ?3,
            due_at = ?4
        WHERE id = ?5
        "#,
    )
    .bind(&todo.description)
    .bind(todo.status)
    .bind(todo.done_at)
    .bind(todo.due_at)
    .bind(todo.id)
    .execute(db)
    .await?
    .rows_affected();

    Ok(result > 0)
}

/// Status-only write used by the past-due listener. Only NOT_DONE rows move,
/// so an item completed in the meantime keeps its DONE status.
pub async fn mark_past_due<'e, E>(db: E, id: i64) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE todos SET status = ?1 WHERE id = ?2 AND status = ?3")
        .bind(TodoStatus::PastDue)
        .bind(id)
        .bind(TodoStatus::NotDone)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}
