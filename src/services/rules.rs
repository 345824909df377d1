//! Admission rules for todo patches.
//!
//! Every rule looks at the proposed patch and the stored record and either
//! lets the update through or names the reason it is refused. The set runs
//! its rules in registration order and stops at the first refusal, so when
//! several rules would refuse the same patch the earliest one is reported.

use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::{Todo, TodoStatus, UpdateTodoRequest};

pub trait UpdateRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn evaluate(
        &self,
        patch: &UpdateTodoRequest,
        current: &Todo,
        now: DateTime<Utc>,
    ) -> Result<(), AppError>;
}

/// PAST_DUE can only be requested together with a due date that has elapsed.
pub struct PastDueWithFutureDateRule;

impl UpdateRule for PastDueWithFutureDateRule {
    fn name(&self) -> &'static str {
        "past_due_with_future_date"
    }

    fn evaluate(
        &self,
        patch: &UpdateTodoRequest,
        current: &Todo,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let future_due_at = patch.due_at().is_some_and(|due_at| now < due_at);
        if patch.requests_status(TodoStatus::PastDue) && future_due_at {
            return Err(AppError::PastDueWithFutureDate(current.id));
        }
        Ok(())
    }
}

/// Items whose stored due date has elapsed are frozen, whatever their status.
pub struct PastDueItemFrozenRule;

impl UpdateRule for PastDueItemFrozenRule {
    fn name(&self) -> &'static str {
        "past_due_item_frozen"
    }

    fn evaluate(
        &self,
        _patch: &UpdateTodoRequest,
        current: &Todo,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        if current.due_at.is_some_and(|due_at| now > due_at) {
            return Err(AppError::PastDueItemFrozen(current.id));
        }
        Ok(())
    }
}

/// A DONE item must be moved back to NOT_DONE before anything else changes.
pub struct DoneItemLockedRule;

impl UpdateRule for DoneItemLockedRule {
    fn name(&self) -> &'static str {
        "done_item_locked"
    }

    fn evaluate(
        &self,
        patch: &UpdateTodoRequest,
        current: &Todo,
        _now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        if current.status == TodoStatus::Done && !patch.requests_status(TodoStatus::NotDone) {
            return Err(AppError::DoneItemLocked(current.id));
        }
        Ok(())
    }
}

/// PAST_DUE without a due date, or with one that has not elapsed yet.
pub struct PastDueWithoutElapsedDueAtRule;

impl UpdateRule for PastDueWithoutElapsedDueAtRule {
    fn name(&self) -> &'static str {
        "past_due_without_elapsed_due_at"
    }

    fn evaluate(
        &self,
        patch: &UpdateTodoRequest,
        current: &Todo,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let elapsed = patch.due_at().is_some_and(|due_at| now > due_at);
        if patch.requests_status(TodoStatus::PastDue) && !elapsed {
            return Err(AppError::PastDueWithoutElapsedDueAt(current.id));
        }
        Ok(())
    }
}

/// An elapsed due date in the patch must come with status PAST_DUE.
pub struct ElapsedDueAtWithoutPastDueRule;

impl UpdateRule for ElapsedDueAtWithoutPastDueRule {
    fn name(&self) -> &'static str {
        "elapsed_due_at_without_past_due"
    }

    fn evaluate(
        &self,
        patch: &UpdateTodoRequest,
        current: &Todo,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let elapsed = patch.due_at().is_some_and(|due_at| now > due_at);
        if elapsed && !patch.requests_status(TodoStatus::PastDue) {
            return Err(AppError::ElapsedDueAtWithoutPastDue(current.id));
        }
        Ok(())
    }
}

pub struct UpdateRuleSet {
    rules: Vec<Box<dyn UpdateRule>>,
}

impl UpdateRuleSet {
    pub fn new(rules: Vec<Box<dyn UpdateRule>>) -> Self {
        Self { rules }
    }

    /// Rule names in evaluation order.
    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    pub fn evaluate(
        &self,
        patch: &UpdateTodoRequest,
        current: &Todo,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        for rule in &self.rules {
            if let Err(e) = rule.evaluate(patch, current, now) {
                tracing::debug!(rule = rule.name(), todo_id = current.id, "update rejected");
                return Err(e);
            }
        }
        Ok(())
    }
}

impl Default for UpdateRuleSet {
    /// The frozen-item rule precedes the elapsed-due-date rule, so a patch on
    /// a past-due item is always reported as touching a frozen item.
    fn default() -> Self {
        Self::new(vec![
            Box::new(PastDueWithFutureDateRule),
            Box::new(PastDueItemFrozenRule),
            Box::new(DoneItemLockedRule),
            Box::new(PastDueWithoutElapsedDueAtRule),
            Box::new(ElapsedDueAtWithoutPastDueRule),
        ])
    }
}
