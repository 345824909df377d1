use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

pub const DESCRIPTION_MAX_LEN: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TodoStatus {
    NotDone,
    Done,
    PastDue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: i64,
    pub description: String,
    pub status: TodoStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,
}

impl Todo {
    /// A NOT_DONE item whose due date has elapsed. Such an item is reported
    /// as PAST_DUE even while the stored row still says NOT_DONE.
    pub fn is_due_for_transition(&self, now: DateTime<Utc>) -> bool {
        self.status == TodoStatus::NotDone && self.due_at.is_some_and(|due_at| now > due_at)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTodoRequest {
    #[serde(default)]
    pub description: Option<String>,
}

/// A patch field that tells apart a missing key, an explicit `null` and a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    Absent,
    Null,
    Value(T),
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Absent
    }
}

impl<T> Field<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Field::Value(value) => Some(value),
            Field::Absent | Field::Null => None,
        }
    }
}

impl<'de, T> Deserialize<'de> for Field<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Field::Value(value),
            None => Field::Null,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoRequest {
    #[serde(default)]
    pub description: Field<String>,
    #[serde(default)]
    pub status: Field<TodoStatus>,
    #[serde(default, deserialize_with = "deserialize_timestamp_field")]
    pub due_at: Field<DateTime<Utc>>,
}

/// Parses RFC 3339 timestamps. Timestamps without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| raw.parse::<NaiveDateTime>().map(|naive| naive.and_utc()))
        .ok()
}

fn deserialize_timestamp_field<'de, D>(deserializer: D) -> Result<Field<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_timestamp(&raw).map(Field::Value).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid timestamp: {raw}"))
        }),
        None => Ok(Field::Null),
    }
}

impl UpdateTodoRequest {
    pub fn status(&self) -> Option<TodoStatus> {
        self.status.value().copied()
    }

    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        self.due_at.value().copied()
    }

    /// Empty descriptions count as not supplied.
    pub fn description(&self) -> Option<&str> {
        self.description
            .value()
            .map(String::as_str)
            .filter(|description| !description.is_empty())
    }

    pub fn requests_status(&self, status: TodoStatus) -> bool {
        self.status() == Some(status)
    }
}
