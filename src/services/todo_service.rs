use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{error, info, warn};

use crate::db::repository;
use crate::error::{AppError, DESCRIPTION_NOT_PROVIDED_MESSAGE};
use crate::models::todo::DESCRIPTION_MAX_LEN;
use crate::models::{Field, NewTodoRequest, Todo, TodoStatus, UpdateTodoRequest};
use crate::services::past_due::PastDuePublisher;
use crate::services::rules::UpdateRuleSet;

#[derive(Clone)]
pub struct TodoService {
    db: SqlitePool,
    rules: Arc<UpdateRuleSet>,
    past_due: PastDuePublisher,
}

impl TodoService {
    pub fn new(db: SqlitePool, rules: UpdateRuleSet, past_due: PastDuePublisher) -> Self {
        Self {
            db,
            rules: Arc::new(rules),
            past_due,
        }
    }

    pub async fn add_item(&self, req: NewTodoRequest) -> Result<Todo, AppError> {
        self.insert_item(req)
            .await
            .inspect_err(|e| log_failure("add_item", e))
    }

    /// Validates the patch against the rule set and applies it, all inside a
    /// single transaction.
    pub async fn update_item(&self, id: i64, patch: UpdateTodoRequest) -> Result<Todo, AppError> {
        self.apply_update(id, patch)
            .await
            .inspect_err(|e| log_failure("update_item", e))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Todo, AppError> {
        self.fetch_item(id)
            .await
            .inspect_err(|e| log_failure("get_by_id", e))
    }

    /// One zero-based page of todos, optionally restricted to NOT_DONE items.
    pub async fn list_items(
        &self,
        only_not_done: bool,
        page: i64,
        size: i64,
    ) -> Result<Vec<Todo>, AppError> {
        self.fetch_page(only_not_done, page, size)
            .await
            .inspect_err(|e| log_failure("list_items", e))
    }

    async fn insert_item(&self, req: NewTodoRequest) -> Result<Todo, AppError> {
        let description = req
            .description
            .filter(|description| !description.is_empty())
            .ok_or_else(|| AppError::InvalidInput(DESCRIPTION_NOT_PROVIDED_MESSAGE.to_string()))?;
        check_description_len(&description)?;

        let todo = repository::insert_todo(&self.db, &description, Utc::now()).await?;
        info!(todo_id = todo.id, "todo item created");
        Ok(todo)
    }

    async fn apply_update(&self, id: i64, patch: UpdateTodoRequest) -> Result<Todo, AppError> {
        let now = Utc::now();
        // Take the write lock before reading so concurrent updates queue up
        // instead of failing to upgrade a shared lock.
        let mut tx = self.db.begin_with("BEGIN IMMEDIATE").await?;

        let mut todo = repository::find_todo_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound(id))?;

        self.rules.evaluate(&patch, &todo, now)?;
        merge_patch(&mut todo, &patch, now)?;

        if !repository::update_todo(&mut *tx, &todo).await? {
            return Err(AppError::NotFound(id));
        }
        tx.commit().await?;

        info!(todo_id = id, status = ?todo.status, "todo item updated");
        Ok(todo)
    }

    async fn fetch_item(&self, id: i64) -> Result<Todo, AppError> {
        let todo = repository::find_todo_by_id(&self.db, id)
            .await?
            .ok_or(AppError::NotFound(id))?;
        Ok(self.report_past_due(todo, Utc::now()))
    }

    async fn fetch_page(
        &self,
        only_not_done: bool,
        page: i64,
        size: i64,
    ) -> Result<Vec<Todo>, AppError> {
        if page < 0 {
            return Err(AppError::InvalidInput(
                "The page index must be zero or greater".to_string(),
            ));
        }
        if size <= 0 {
            return Err(AppError::InvalidInput(
                "The page size must be greater than zero".to_string(),
            ));
        }
        if page.checked_mul(size).is_none() {
            return Err(AppError::InvalidInput("The page index is too large".to_string()));
        }

        let todos = if only_not_done {
            repository::fetch_todos_page_by_status(&self.db, TodoStatus::NotDone, page, size)
                .await?
        } else {
            repository::fetch_todos_page(&self.db, page, size).await?
        };

        let now = Utc::now();
        Ok(todos
            .into_iter()
            .map(|todo| self.report_past_due(todo, now))
            .collect())
    }

    /// Reports an elapsed NOT_DONE item as PAST_DUE right away and hands the
    /// write to the past-due listener.
    fn report_past_due(&self, mut todo: Todo, now: DateTime<Utc>) -> Todo {
        if todo.is_due_for_transition(now) {
            self.past_due.publish(todo.id);
            todo.status = TodoStatus::PastDue;
        }
        todo
    }
}

fn merge_patch(todo: &mut Todo, patch: &UpdateTodoRequest, now: DateTime<Utc>) -> Result<(), AppError> {
    if let Some(status) = patch.status() {
        todo.status = status;
    }
    if let Some(description) = patch.description() {
        check_description_len(description)?;
        todo.description = description.to_string();
    }
    todo.done_at = (todo.status == TodoStatus::Done).then_some(now);
    match patch.due_at {
        Field::Value(due_at) => todo.due_at = Some(due_at),
        Field::Null => todo.due_at = None,
        Field::Absent => {}
    }
    Ok(())
}

fn check_description_len(description: &str) -> Result<(), AppError> {
    if description.chars().count() > DESCRIPTION_MAX_LEN {
        return Err(AppError::InvalidInput(format!(
            "The Todo description must have at most {DESCRIPTION_MAX_LEN} characters"
        )));
    }
    Ok(())
}

fn log_failure(operation: &str, e: &AppError) {
    if e.status_code().is_server_error() {
        error!(operation, "todo operation failed: {}", e);
    } else {
        warn!(operation, "todo operation failed: {}", e);
    }
}
