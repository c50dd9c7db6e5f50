use std::collections::HashSet;

use serde::{Deserialize, Deserializer};

use crate::model::task::{Priority, Task, TaskId};

/// Persisted shape of a task. Older saves predate priorities, so the field
/// is read leniently and migrated when converting to [`Task`].
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct TaskRecord {
    pub id: TaskId,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, deserialize_with = "lenient_priority")]
    pub priority: Option<Priority>,
}

impl TaskRecord {
    pub fn into_entity(self) -> Task {
        Task {
            id: self.id,
            text: self.text,
            completed: self.completed,
            priority: self.priority.unwrap_or_default(),
        }
    }
}

// null, "", and unknown names all count as missing.
fn lenient_priority<'de, D>(deserializer: D) -> Result<Option<Priority>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| serde_json::from_value(value).ok()))
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedTasks {
    pub tasks: Vec<Task>,
    /// Records that had no usable priority and were set to medium.
    pub migrated: usize,
    /// Records dropped because an earlier record already used their id.
    pub duplicates: usize,
}

pub fn encode_tasks(tasks: &[Task]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(tasks)
}

pub fn decode_tasks(raw: &str) -> serde_json::Result<DecodedTasks> {
    let records: Vec<TaskRecord> = serde_json::from_str(raw)?;

    let mut decoded = DecodedTasks::default();
    let mut seen = HashSet::new();
    for record in records {
        if !seen.insert(record.id) {
            decoded.duplicates += 1;
            continue;
        }
        if record.priority.is_none() {
            decoded.migrated += 1;
        }
        decoded.tasks.push(record.into_entity());
    }
    Ok(decoded)
}
