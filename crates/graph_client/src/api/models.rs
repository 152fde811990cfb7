//! Wire models for the To Do endpoints and the record-to-task mapping

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use todo_core::{task_link, Importance, Task, TaskStatus};

/// Collection envelope wrapping every list response.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CollectionEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TodoListRecord {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
}

/// Remote date-time wrapper: a naive timestamp plus an IANA zone name.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DateTimeTimeZone {
    pub date_time: String,
    #[serde(default)]
    pub time_zone: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TodoTaskRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub importance: Importance,
    #[serde(default)]
    pub due_date_time: Option<DateTimeTimeZone>,
    #[serde(default)]
    pub created_date_time: Option<String>,
    #[serde(default)]
    pub last_modified_date_time: Option<String>,
    #[serde(default)]
    pub completed_date_time: Option<DateTimeTimeZone>,
}

/// Parse the remote timestamp formats: RFC 3339, or the naive
/// `yyyy-MM-ddTHH:mm:ss.fffffff` form used inside dateTimeTimeZone.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Map a remote task record into the display model. Pure: identical input
/// always yields an identical task.
pub fn map_task(record: &TodoTaskRecord, list: &TodoListRecord, template: &str) -> Task {
    Task {
        id: record.id.clone(),
        title: record.title.clone(),
        status: record.status,
        importance: record.importance,
        due: record
            .due_date_time
            .as_ref()
            .and_then(|d| parse_timestamp(&d.date_time)),
        created: record.created_date_time.as_deref().and_then(parse_timestamp),
        modified: record
            .last_modified_date_time
            .as_deref()
            .and_then(parse_timestamp),
        completed: record
            .completed_date_time
            .as_ref()
            .and_then(|d| parse_timestamp(&d.date_time)),
        list_id: list.id.clone(),
        list_name: list.display_name.clone(),
        link: task_link(template, &record.id, &list.id),
    }
}
