#[cfg(test)]
mod tests {
    use crate::model::task::Priority;
    use crate::repository::{MemoryStorage, Storage, StorageError};
    use crate::service::task_list_store::{
        AddOutcome, Change, TaskListStore, MAX_TASKS, NOTICE_DURATION, STORAGE_KEY,
    };
    use std::cell::{Cell, RefCell};
    use std::io;
    use std::rc::Rc;
    use std::time::{Duration, Instant};

    struct BrokenStorage;

    impl Storage for BrokenStorage {
        fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::read(key, io::Error::other("disk on fire")))
        }
        fn set_item(&self, key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::write(key, io::Error::other("disk on fire")))
        }
    }

    /// Counts writes so tests can tell whether an operation persisted.
    #[derive(Default)]
    struct CountingStorage {
        inner: MemoryStorage,
        writes: Cell<usize>,
    }

    impl Storage for CountingStorage {
        fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get_item(key)
        }
        fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.writes.set(self.writes.get() + 1);
            self.inner.set_item(key, value)
        }
    }

    fn recording<S: Storage>(store: &mut TaskListStore<S>) -> Rc<RefCell<Vec<Change>>> {
        let changes = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&changes);
        store.subscribe(move |change| sink.borrow_mut().push(change));
        changes
    }

    fn texts<S: Storage>(store: &TaskListStore<S>) -> Vec<&str> {
        store.tasks().iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_add_two_tasks_in_order() {
        let mut store = TaskListStore::open(MemoryStorage::new());

        assert_eq!(store.add("Write report"), AddOutcome::Added(1));
        assert_eq!(store.add("Call client"), AddOutcome::Added(2));

        assert_eq!(texts(&store), vec!["Write report", "Call client"]);
        let ids: Vec<u64> = store.tasks().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(store.tasks().iter().all(|t| !t.completed && t.priority == Priority::Medium));
    }

    #[test]
    fn test_add_whitespace_is_ignored() {
        let mut store = TaskListStore::open(CountingStorage::default());
        let changes = recording(&mut store);

        assert_eq!(store.add("   \t "), AddOutcome::EmptyText);
        assert_eq!(store.add(""), AddOutcome::EmptyText);

        assert!(store.is_empty());
        assert_eq!(store.storage().writes.get(), 0);
        assert!(changes.borrow().is_empty());
    }

    #[test]
    fn test_ninth_task_raises_notice() {
        let mut store = TaskListStore::open(MemoryStorage::new());
        let now = Instant::now();
        for i in 0..MAX_TASKS {
            store.add_at(&format!("task {i}"), now);
        }
        assert!(store.is_full());
        assert!(store.active_notice(now).is_none());

        assert_eq!(store.add_at("ninth", now), AddOutcome::CapacityReached);

        assert_eq!(store.len(), MAX_TASKS);
        assert!(!texts(&store).contains(&"ninth"));
        let notice = store.active_notice(now).expect("notice should be visible");
        assert!(notice.message.contains("Maximum 8 tasks"));
        assert!(store.active_notice(now + Duration::from_secs(2)).is_some());
        assert!(store.active_notice(now + NOTICE_DURATION).is_none());
    }

    #[test]
    fn test_ids_are_not_reused_after_remove() {
        let mut store = TaskListStore::open(MemoryStorage::new());
        store.add("a");
        store.add("b");
        assert!(store.remove(2));

        assert_eq!(store.add("c"), AddOutcome::Added(3));
        assert_eq!(store.id_counter(), 3);
    }

    #[test]
    fn test_remove_twice_is_noop() {
        let mut store = TaskListStore::open(CountingStorage::default());
        store.add("a");
        store.add("b");
        let writes = store.storage().writes.get();

        assert!(store.remove(1));
        assert!(!store.remove(1));

        assert_eq!(texts(&store), vec!["b"]);
        assert_eq!(store.storage().writes.get(), writes + 1);
    }

    #[test]
    fn test_toggle_flips_completion() {
        let mut store = TaskListStore::open(MemoryStorage::new());
        store.add("a");

        assert!(store.toggle_completed(1));
        assert!(store.get(1).unwrap().completed);
        assert!(store.toggle_completed(1));
        assert!(!store.get(1).unwrap().completed);

        assert!(!store.toggle_completed(42));
    }

    #[test]
    fn test_set_text_is_a_narrow_update() {
        let mut store = TaskListStore::open(CountingStorage::default());
        store.add("Write repor");
        let changes = recording(&mut store);
        let writes = store.storage().writes.get();

        assert!(store.set_text(1, "Write report"));

        assert_eq!(store.get(1).unwrap().text, "Write report");
        assert_eq!(store.storage().writes.get(), writes + 1);
        assert_eq!(*changes.borrow(), vec![Change::Text { id: 1 }]);
        assert!(!changes.borrow()[0].needs_render());
    }

    #[test]
    fn test_set_text_may_clear_text() {
        let mut store = TaskListStore::open(MemoryStorage::new());
        store.add("draft");

        assert!(store.set_text(1, ""));
        assert_eq!(store.get(1).unwrap().text, "");
        assert!(!store.set_text(9, "nope"));
    }

    #[test]
    fn test_structural_changes_are_announced() {
        let mut store = TaskListStore::open(MemoryStorage::new());
        let changes = recording(&mut store);

        store.add("a");
        store.add("b");
        store.toggle_completed(1);
        store.set_priority(2, Priority::Urgent);
        store.reorder(1, 2);
        store.remove(1);

        assert_eq!(changes.borrow().len(), 6);
        assert!(changes.borrow().iter().all(|c| c.needs_render()));
    }

    #[test]
    fn test_set_priority() {
        let mut store = TaskListStore::open(MemoryStorage::new());
        store.add("a");

        assert!(store.set_priority(1, Priority::High));
        assert_eq!(store.get(1).unwrap().priority, Priority::High);
        assert!(!store.set_priority(5, Priority::Low));
    }

    #[test]
    fn test_reorder_swaps_positions() {
        let mut store = TaskListStore::open(MemoryStorage::new());
        store.add("A");
        store.add("B");
        store.add("C");

        assert!(store.reorder(1, 3));
        assert_eq!(texts(&store), vec!["C", "B", "A"]);

        assert!(store.reorder(1, 3));
        assert_eq!(texts(&store), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_reorder_ignores_unknown_and_same_ids() {
        let mut store = TaskListStore::open(CountingStorage::default());
        store.add("A");
        store.add("B");
        let writes = store.storage().writes.get();

        assert!(!store.reorder(1, 1));
        assert!(!store.reorder(1, 99));
        assert!(!store.reorder(99, 2));

        assert_eq!(texts(&store), vec!["A", "B"]);
        assert_eq!(store.storage().writes.get(), writes);
    }

    #[test]
    fn test_persist_restore_round_trip() {
        let mut store = TaskListStore::open(MemoryStorage::new());
        store.add("Write report");
        store.add("Call client");
        store.add("Ship it");
        store.toggle_completed(2);
        store.set_priority(3, Priority::Urgent);
        store.remove(1);
        let before = store.tasks().to_vec();

        let restored = TaskListStore::open(store.into_storage());

        assert_eq!(restored.tasks(), before.as_slice());
        assert_eq!(restored.id_counter(), 3);
    }

    #[test]
    fn test_restore_migrates_missing_priority() {
        let storage = MemoryStorage::new();
        storage
            .set_item(
                STORAGE_KEY,
                r#"[{"id": 4, "text": "old", "completed": true}, {"id": 9, "text": "older", "completed": false}]"#,
            )
            .unwrap();

        let mut store = TaskListStore::open(storage);

        assert_eq!(store.len(), 2);
        assert!(store.tasks().iter().all(|t| t.priority == Priority::Medium));
        assert_eq!(store.id_counter(), 9);
        assert_eq!(store.add("new"), AddOutcome::Added(10));
    }

    #[test]
    fn test_restore_from_corrupt_data_starts_empty() {
        let storage = MemoryStorage::new();
        storage.set_item(STORAGE_KEY, "{{{ definitely not json").unwrap();

        let mut store = TaskListStore::open(storage);

        assert!(store.is_empty());
        assert_eq!(store.add("fresh"), AddOutcome::Added(1));
    }

    #[test]
    fn test_restore_from_unreadable_storage_starts_empty() {
        let store = TaskListStore::open(BrokenStorage);
        assert!(store.is_empty());
        assert_eq!(store.id_counter(), 0);
    }

    #[test]
    fn test_write_failure_keeps_memory_state() {
        let mut store = TaskListStore::open(BrokenStorage);
        let changes = recording(&mut store);

        assert_eq!(store.add("still here"), AddOutcome::Added(1));
        assert!(store.toggle_completed(1));

        assert_eq!(texts(&store), vec!["still here"]);
        assert!(store.get(1).unwrap().completed);
        assert_eq!(changes.borrow().len(), 2);
    }

    #[test]
    fn test_quota_exceeded_is_swallowed() {
        // room for an empty list only
        let mut store = TaskListStore::open(MemoryStorage::with_quota(STORAGE_KEY.len() + 2));
        store.persist();
        assert_eq!(store.storage().get_item(STORAGE_KEY).unwrap().as_deref(), Some("[]"));

        store.add("does not fit");

        assert_eq!(store.len(), 1);
        assert_eq!(store.storage().get_item(STORAGE_KEY).unwrap().as_deref(), Some("[]"));
    }
}
