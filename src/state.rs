use sqlx::SqlitePool;

use crate::services::TodoService;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub todos: TodoService,
}
