use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::input::normalize_submission;
use crate::model::task::{Priority, TaskId};
use crate::repository::Storage;
use crate::service::task_list_store::TaskListStore;

/// A second submit inside this window is treated as a double press.
pub const SUBMIT_DEBOUNCE: Duration = Duration::from_millis(100);

/// A discrete user gesture, already resolved to task ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Submit(String),
    Toggle(TaskId),
    Delete(TaskId),
    ChangePriority(TaskId, Priority),
    Reorder { source: TaskId, target: TaskId },
    EditText(TaskId, String),
}

/// FIFO of pending intents, drained against a store on the UI thread.
#[derive(Debug, Default)]
pub struct Dispatcher {
    queue: VecDeque<Intent>,
    last_submit: Option<Instant>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, intent: Intent) {
        self.queue.push_back(intent);
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Whether a submit arriving at `now` would get past the debounce.
    pub fn accepts_submit(&self, now: Instant) -> bool {
        self.last_submit
            .is_none_or(|last| now.saturating_duration_since(last) >= SUBMIT_DEBOUNCE)
    }

    /// Applies every queued intent in arrival order. Returns how many were
    /// applied; debounced submits are dropped and not counted.
    pub fn run_pending<S: Storage>(&mut self, store: &mut TaskListStore<S>, now: Instant) -> usize {
        let mut applied = 0;
        while let Some(intent) = self.queue.pop_front() {
            if self.apply(store, intent, now) {
                applied += 1;
            }
        }
        applied
    }

    fn apply<S: Storage>(&mut self, store: &mut TaskListStore<S>, intent: Intent, now: Instant) -> bool {
        match intent {
            Intent::Submit(raw) => {
                if !self.accepts_submit(now) {
                    debug!("dropping repeated submit");
                    return false;
                }
                let Some(text) = normalize_submission(&raw) else {
                    return true;
                };
                self.last_submit = Some(now);
                store.add_at(&text, now);
            }
            Intent::Toggle(id) => {
                store.toggle_completed(id);
            }
            Intent::Delete(id) => {
                store.remove(id);
            }
            Intent::ChangePriority(id, priority) => {
                store.set_priority(id, priority);
            }
            Intent::Reorder { source, target } => {
                store.reorder(source, target);
            }
            Intent::EditText(id, text) => {
                store.set_text(id, text);
            }
        }
        true
    }
}
