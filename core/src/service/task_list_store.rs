use std::error::Error as _;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::model::task::{Priority, Task, TaskId};
use crate::repository::{Storage, StorageError};
use crate::service::dto::{decode_tasks, encode_tasks, DecodedTasks};

/// Key the whole list is stored under.
pub const STORAGE_KEY: &str = "focusAiTasks";
pub const MAX_TASKS: usize = 8;
pub const NOTICE_DURATION: Duration = Duration::from_secs(3);
pub const CAPACITY_MESSAGE: &str =
    "Maximum 8 tasks reached. Complete or delete some tasks to add more.";

/// What a listener is told after a mutation has been applied and persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// Membership, order, completion or priority changed. Re-render the list.
    Structural,
    /// Only the text of one task changed while it is being edited. The view
    /// owning the edit field already shows it; re-rendering would steal focus.
    Text { id: TaskId },
}

impl Change {
    pub fn needs_render(self) -> bool {
        matches!(self, Change::Structural)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added(TaskId),
    EmptyText,
    CapacityReached,
}

/// Transient user-facing message, e.g. the capacity warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub expires_at: Instant,
}

impl Notice {
    pub fn is_visible_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

type Listener = Box<dyn FnMut(Change)>;

/// The ordered checklist. Every applied mutation is written through to
/// storage and then announced to listeners. Storage failures are logged and
/// never surface to callers.
pub struct TaskListStore<S: Storage> {
    storage: S,
    tasks: Vec<Task>,
    id_counter: TaskId,
    listeners: Vec<Listener>,
    notice: Option<Notice>,
}

impl<S: Storage> TaskListStore<S> {
    /// An empty store. Call [`restore`](Self::restore) before mutating.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            tasks: Vec::new(),
            id_counter: 0,
            listeners: Vec::new(),
            notice: None,
        }
    }

    /// A store restored from whatever `storage` holds.
    pub fn open(storage: S) -> Self {
        let mut store = Self::new(storage);
        store.restore();
        store
    }

    pub fn subscribe(&mut self, listener: impl FnMut(Change) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn restore(&mut self) {
        match self.load() {
            Ok(None) => {
                info!(key = STORAGE_KEY, "no saved tasks, starting empty");
                self.tasks.clear();
            }
            Ok(Some(decoded)) => {
                if decoded.migrated > 0 {
                    info!(count = decoded.migrated, "set missing priorities to medium");
                }
                if decoded.duplicates > 0 {
                    warn!(count = decoded.duplicates, "dropped tasks with duplicate ids");
                }
                self.tasks = decoded.tasks;
                let max_id = self.tasks.iter().map(|t| t.id).max().unwrap_or(0);
                self.id_counter = self.id_counter.max(max_id);
                info!(tasks = self.tasks.len(), id_counter = self.id_counter, "restored tasks");
            }
            Err(err) => {
                warn!(
                    key = err.key(),
                    error = %err,
                    cause = %cause_of(&err),
                    "failed to load tasks, starting empty"
                );
                self.tasks.clear();
            }
        }
    }

    fn load(&self) -> Result<Option<DecodedTasks>, StorageError> {
        let Some(raw) = self.storage.get_item(STORAGE_KEY)? else {
            return Ok(None);
        };
        decode_tasks(&raw)
            .map(Some)
            .map_err(|e| StorageError::read(STORAGE_KEY, e))
    }

    pub fn persist(&self) {
        if let Err(err) = self.try_persist() {
            error!(
                key = err.key(),
                error = %err,
                cause = %cause_of(&err),
                "failed to save tasks"
            );
        }
    }

    fn try_persist(&self) -> Result<(), StorageError> {
        let raw = encode_tasks(&self.tasks).map_err(|e| StorageError::write(STORAGE_KEY, e))?;
        self.storage.set_item(STORAGE_KEY, &raw)
    }

    fn commit(&mut self, change: Change) {
        self.persist();
        for listener in &mut self.listeners {
            listener(change);
        }
    }

    pub fn add(&mut self, text: &str) -> AddOutcome {
        self.add_at(text, Instant::now())
    }

    /// Like [`add`](Self::add), with `now` anchoring the capacity notice.
    pub fn add_at(&mut self, text: &str, now: Instant) -> AddOutcome {
        if text.trim().is_empty() {
            return AddOutcome::EmptyText;
        }
        if self.is_full() {
            info!(max = MAX_TASKS, "task limit reached, not adding");
            self.notice = Some(Notice {
                message: CAPACITY_MESSAGE.to_string(),
                expires_at: now + NOTICE_DURATION,
            });
            return AddOutcome::CapacityReached;
        }

        self.id_counter += 1;
        let id = self.id_counter;
        self.tasks.push(Task::new(id, text.to_string()));
        debug!(id, "added task");

        self.commit(Change::Structural);
        AddOutcome::Added(id)
    }

    /// Returns whether a task was removed. An unknown id changes nothing, so
    /// nothing is persisted or announced; the same holds for the other mutators.
    pub fn remove(&mut self, id: TaskId) -> bool {
        let Some(pos) = self.position(id) else {
            return false;
        };
        self.tasks.remove(pos);
        debug!(id, "removed task");

        self.commit(Change::Structural);
        true
    }

    pub fn toggle_completed(&mut self, id: TaskId) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        task.completed = !task.completed;
        debug!(id, completed = task.completed, "toggled task");

        self.commit(Change::Structural);
        true
    }

    /// Narrow update: persists but only announces [`Change::Text`].
    pub fn set_text(&mut self, id: TaskId, text: impl Into<String>) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        task.text = text.into();
        debug!(id, "edited task text");

        self.commit(Change::Text { id });
        true
    }

    pub fn set_priority(&mut self, id: TaskId, priority: Priority) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        task.priority = priority;
        debug!(id, %priority, "changed priority");

        self.commit(Change::Structural);
        true
    }

    /// Exchanges the positions of the two tasks; tasks between them stay put.
    pub fn reorder(&mut self, source: TaskId, target: TaskId) -> bool {
        if source == target {
            return false;
        }
        let (Some(from), Some(to)) = (self.position(source), self.position(target)) else {
            debug!(source, target, "reorder ignored, unknown task");
            return false;
        };
        self.tasks.swap(from, to);
        debug!(source, target, "swapped tasks");

        self.commit(Change::Structural);
        true
    }

    fn position(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.tasks.len() >= MAX_TASKS
    }

    pub fn remaining_capacity(&self) -> usize {
        MAX_TASKS.saturating_sub(self.tasks.len())
    }

    /// Highest id handed out so far, including ids of removed tasks.
    pub fn id_counter(&self) -> TaskId {
        self.id_counter
    }

    pub fn active_notice(&self, now: Instant) -> Option<&Notice> {
        self.notice.as_ref().filter(|n| n.is_visible_at(now))
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }
}

fn cause_of(err: &StorageError) -> String {
    err.source()
        .map(|source| source.to_string())
        .unwrap_or_default()
}
