pub mod input;
pub mod model;
pub mod repository;
pub mod service;
pub mod time;
pub mod usecase;

pub use model::task::{ParsePriorityError, Priority, Task, TaskId};
pub use repository::{FileStorage, MemoryStorage, Storage, StorageError};
pub use service::task_list_store::{
    AddOutcome, Change, Notice, TaskListStore, CAPACITY_MESSAGE, MAX_TASKS, STORAGE_KEY,
};
pub use time::{Countdown, CountdownClock, Ticker};
pub use usecase::dispatch::{Dispatcher, Intent};
