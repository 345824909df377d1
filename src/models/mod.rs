pub mod todo;

pub use todo::{Field, NewTodoRequest, Todo, TodoStatus, UpdateTodoRequest};
