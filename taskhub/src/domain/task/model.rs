use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound on a task title, counted in characters after trimming.
pub const MAX_TITLE_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub done: bool,
    #[serde(rename = "create_at")]
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            done: false,
            created_at,
        }
    }
}
