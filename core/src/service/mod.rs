pub mod dto;
pub mod task_list_store;

mod task_list_store_test;

pub use task_list_store::{AddOutcome, Change, Notice, TaskListStore};
