//! Task - display unit mapped from a remote To Do record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Completion status of a remote task.
///
/// Wire names follow the remote API's camelCase values.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Completed,
    WaitingOnOthers,
    Deferred,
}

impl TaskStatus {
    /// The status a completion toggle moves to from this one.
    pub fn toggled(self) -> TaskStatus {
        if self == TaskStatus::Completed {
            TaskStatus::NotStarted
        } else {
            TaskStatus::Completed
        }
    }

    pub fn is_completed(self) -> bool {
        self == TaskStatus::Completed
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::NotStarted
    }
}

/// Importance of a remote task, ranked high before normal before low.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Importance {
    Low,
    Normal,
    High,
}

impl Importance {
    /// Sort rank: high sorts before normal sorts before low.
    pub fn rank(self) -> u8 {
        match self {
            Importance::High => 0,
            Importance::Normal => 1,
            Importance::Low => 2,
        }
    }
}

impl Default for Importance {
    fn default() -> Self {
        Importance::Normal
    }
}

/// A single task as displayed by the card.
///
/// Derived by mapping a remote record; never persisted beyond the current
/// in-memory collection. `id` is unique within one merged refresh cycle.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    pub importance: Importance,
    pub due: Option<DateTime<Utc>>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub completed: Option<DateTime<Utc>>,
    pub list_id: String,
    pub list_name: String,
    pub link: String,
}
