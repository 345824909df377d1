pub mod past_due;
pub mod rules;
pub mod todo_service;

pub use past_due::{PastDueEvent, PastDueListener, PastDuePublisher};
pub use rules::{UpdateRule, UpdateRuleSet};
pub use todo_service::TodoService;
