use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::input::expand_key;

pub type TaskId = u64;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    /// Next level, wrapping from urgent back to low.
    pub fn cycle(self) -> Self {
        match self {
            Priority::Low => Priority::Medium,
            Priority::Medium => Priority::High,
            Priority::High => Priority::Urgent,
            Priority::Urgent => Priority::Low,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid priority '{input}': expected one of low, medium, high, urgent")]
pub struct ParsePriorityError {
    pub input: String,
}

impl FromStr for Priority {
    type Err = ParsePriorityError;

    /// Case-insensitive; any unambiguous prefix is accepted ("u", "hi").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        let names = Priority::ALL.map(Priority::as_str);
        let key = expand_key(&lowered, &names).map_err(|_| ParsePriorityError {
            input: s.to_string(),
        })?;

        Priority::ALL
            .into_iter()
            .find(|p| p.as_str() == key)
            .ok_or(ParsePriorityError {
                input: s.to_string(),
            })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
    pub priority: Priority,
}

impl Task {
    pub fn new(id: TaskId, text: String) -> Self {
        Self {
            id,
            text,
            completed: false,
            priority: Priority::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_task_defaults() {
        let task = Task::new(7, "Write report".to_string());
        assert_eq!(task.id, 7);
        assert!(!task.completed);
        assert_eq!(task.priority, Priority::Medium);
    }

    #[test]
    fn test_parse_priority() {
        assert_eq!("low".parse::<Priority>().unwrap(), Priority::Low);
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!("u".parse::<Priority>().unwrap(), Priority::Urgent);
        assert_eq!("me".parse::<Priority>().unwrap(), Priority::Medium);
        assert_eq!(" medium ".parse::<Priority>().unwrap(), Priority::Medium);

        assert!("".parse::<Priority>().is_err());
        assert!("critical".parse::<Priority>().is_err());
    }

    #[test]
    fn test_priority_cycle_wraps() {
        let mut p = Priority::Low;
        for _ in 0..4 {
            p = p.cycle();
        }
        assert_eq!(p, Priority::Low);
        assert_eq!(Priority::Urgent.cycle(), Priority::Low);
    }

    #[test]
    fn test_priority_serializes_lowercase() {
        let json = serde_json::to_string(&Priority::Urgent).unwrap();
        assert_eq!(json, "\"urgent\"");
    }
}
