use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use focus_core::time::Ticker;
use focus_core::{
    Countdown, CountdownClock, Dispatcher, Intent, Notice, Priority, Storage, Task, TaskId,
    TaskListStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// Typing into the trailing new-task row.
    Adding,
    /// Editing the text of an existing task in place.
    Editing(TaskId),
    /// A task has been picked up and is waiting to be dropped on another.
    Moving(TaskId),
}

pub struct App<S: Storage> {
    store: TaskListStore<S>,
    dispatcher: Dispatcher,
    clock: CountdownClock,
    ticker: Ticker,
    /// Set by the store listener when the list needs re-rendering.
    dirty: Rc<Cell<bool>>,
    /// What the list pane shows. Only refreshed on structural changes so an
    /// in-progress edit is not clobbered.
    pub view: Vec<Task>,
    pub countdown: Option<Countdown>,
    pub selected: usize,
    pub input: String,
    pub cursor_position: usize,
    pub input_mode: InputMode,
}

impl<S: Storage> App<S> {
    pub fn new(mut store: TaskListStore<S>) -> Self {
        let dirty = Rc::new(Cell::new(false));
        let flag = Rc::clone(&dirty);
        store.subscribe(move |change| {
            if change.needs_render() {
                flag.set(true);
            }
        });

        let view = store.tasks().to_vec();
        App {
            store,
            dispatcher: Dispatcher::new(),
            clock: CountdownClock::new(),
            ticker: Ticker::default(),
            dirty,
            view,
            countdown: None,
            selected: 0,
            input: String::new(),
            input_mode: InputMode::Normal,
            cursor_position: 0,
        }
    }

    pub fn store(&self) -> &TaskListStore<S> {
        &self.store
    }

    /// Refreshes the countdown when a tick is due. Returns whether it did.
    pub fn on_tick(&mut self, now: Instant) -> bool {
        if self.ticker.poll(now) {
            self.countdown = Some(self.clock.tick());
            true
        } else {
            false
        }
    }

    pub fn tick_timeout(&self, now: Instant) -> std::time::Duration {
        self.ticker.timeout(now)
    }

    pub fn notice(&self, now: Instant) -> Option<&Notice> {
        self.store.active_notice(now)
    }

    fn dispatch(&mut self, intent: Intent) {
        self.dispatch_at(intent, Instant::now());
    }

    fn dispatch_at(&mut self, intent: Intent, now: Instant) {
        self.dispatcher.enqueue(intent);
        self.dispatcher.run_pending(&mut self.store, now);
        if self.dirty.replace(false) {
            self.refresh_view();
        }
    }

    fn refresh_view(&mut self) {
        self.view = self.store.tasks().to_vec();
        let last = self.row_count().saturating_sub(1);
        self.selected = self.selected.min(last);
    }

    /// Task rows plus the trailing new-task row while there is room.
    pub fn row_count(&self) -> usize {
        if self.store.is_full() {
            self.view.len()
        } else {
            self.view.len() + 1
        }
    }

    pub fn is_new_task_row(&self, index: usize) -> bool {
        index == self.view.len() && !self.store.is_full()
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.view.get(self.selected)
    }

    pub fn next(&mut self) {
        let count = self.row_count();
        if count == 0 {
            return;
        }
        self.selected = if self.selected >= count - 1 { 0 } else { self.selected + 1 };
    }

    pub fn previous(&mut self) {
        let count = self.row_count();
        if count == 0 {
            return;
        }
        self.selected = if self.selected == 0 { count - 1 } else { self.selected - 1 };
    }

    pub fn toggle_status(&mut self) {
        if let Some(id) = self.selected_task().map(|t| t.id) {
            self.dispatch(Intent::Toggle(id));
        }
    }

    pub fn delete_task(&mut self) {
        if let Some(id) = self.selected_task().map(|t| t.id) {
            self.dispatch(Intent::Delete(id));
        }
    }

    pub fn cycle_priority(&mut self) {
        if let Some(task) = self.selected_task() {
            let intent = Intent::ChangePriority(task.id, task.priority.cycle());
            self.dispatch(intent);
        }
    }

    pub fn set_priority(&mut self, priority: Priority) {
        if let Some(id) = self.selected_task().map(|t| t.id) {
            self.dispatch(Intent::ChangePriority(id, priority));
        }
    }

    /// Enter on a task toggles it; on the new-task row it starts typing.
    pub fn activate(&mut self) {
        if self.is_new_task_row(self.selected) {
            self.enter_add_mode();
        } else {
            self.toggle_status();
        }
    }

    pub fn enter_add_mode(&mut self) {
        if self.store.is_full() {
            return;
        }
        self.selected = self.view.len();
        self.input_mode = InputMode::Adding;
        self.input.clear();
        self.cursor_position = 0;
    }

    pub fn enter_edit_mode(&mut self) {
        if let Some((id, text)) = self.selected_task().map(|t| (t.id, t.text.clone())) {
            self.input_mode = InputMode::Editing(id);
            self.cursor_position = text.chars().count();
            self.input = text;
        }
    }

    pub fn grab(&mut self) {
        if let Some(id) = self.selected_task().map(|t| t.id) {
            self.input_mode = InputMode::Moving(id);
        }
    }

    /// Drops the grabbed task onto the selected one, swapping them.
    pub fn drop_grabbed(&mut self) {
        if let InputMode::Moving(source) = self.input_mode {
            self.input_mode = InputMode::Normal;
            if let Some(target) = self.selected_task().map(|t| t.id) {
                self.dispatch(Intent::Reorder { source, target });
            }
        }
    }

    pub fn exit_input_mode(&mut self) {
        let was_editing = matches!(self.input_mode, InputMode::Editing(_));
        self.input_mode = InputMode::Normal;
        self.input.clear();
        self.cursor_position = 0;
        if was_editing {
            self.refresh_view();
        }
    }

    pub fn submit(&mut self) {
        self.submit_at(Instant::now());
    }

    pub fn submit_at(&mut self, now: Instant) {
        match self.input_mode {
            InputMode::Adding => {
                // a debounced submit keeps what was typed
                if !self.dispatcher.accepts_submit(now) {
                    return;
                }
                let text = std::mem::take(&mut self.input);
                self.cursor_position = 0;
                self.dispatch_at(Intent::Submit(text), now);
                if self.store.is_full() {
                    self.input_mode = InputMode::Normal;
                } else {
                    self.selected = self.view.len();
                }
            }
            InputMode::Editing(_) => {
                // finishing an edit hands focus to the new-task row
                self.exit_input_mode();
                if !self.store.is_full() {
                    self.enter_add_mode();
                }
            }
            InputMode::Moving(_) => self.drop_grabbed(),
            InputMode::Normal => {}
        }
    }

    fn input_changed(&mut self) {
        if let InputMode::Editing(id) = self.input_mode {
            self.dispatch(Intent::EditText(id, self.input.clone()));
        }
    }

    pub fn input_char(&mut self, c: char) {
        let byte_index = self.input.chars().take(self.cursor_position).map(|c| c.len_utf8()).sum();
        self.input.insert(byte_index, c);
        self.cursor_position += 1;
        self.input_changed();
    }

    pub fn delete_char(&mut self) {
        if self.cursor_position > 0 {
            let byte_index: usize = self.input.chars().take(self.cursor_position - 1).map(|c| c.len_utf8()).sum();
            self.input.remove(byte_index);
            self.cursor_position -= 1;
            self.input_changed();
        }
    }

    pub fn move_cursor_left(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
        }
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor_position < self.input.chars().count() {
            self.cursor_position += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use focus_core::{MemoryStorage, MAX_TASKS};
    use std::time::Duration;

    fn app_with(texts: &[&str]) -> App<MemoryStorage> {
        let mut store = TaskListStore::open(MemoryStorage::new());
        for text in texts {
            store.add(text);
        }
        App::new(store)
    }

    fn type_text<S: Storage>(app: &mut App<S>, text: &str) {
        for c in text.chars() {
            app.input_char(c);
        }
    }

    fn view_texts<S: Storage>(app: &App<S>) -> Vec<&str> {
        app.view.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_adding_keeps_focus_on_new_row() {
        let mut app = app_with(&[]);
        let now = Instant::now();

        app.enter_add_mode();
        type_text(&mut app, "Write report");
        app.submit_at(now);
        type_text(&mut app, "Call client");
        app.submit_at(now + Duration::from_secs(1));

        assert_eq!(view_texts(&app), vec!["Write report", "Call client"]);
        assert_eq!(app.input_mode, InputMode::Adding);
        assert!(app.is_new_task_row(app.selected));
        assert!(app.input.is_empty());
    }

    #[test]
    fn test_rapid_second_submit_keeps_input() {
        let mut app = app_with(&[]);
        let now = Instant::now();

        app.enter_add_mode();
        type_text(&mut app, "first");
        app.submit_at(now);
        type_text(&mut app, "second");
        app.submit_at(now + Duration::from_millis(50));

        assert_eq!(view_texts(&app), vec!["first"]);
        assert_eq!(app.input, "second");
        assert_eq!(app.cursor_position, 6);
        assert_eq!(app.input_mode, InputMode::Adding);

        app.submit_at(now + Duration::from_millis(150));
        assert_eq!(view_texts(&app), vec!["first", "second"]);
        assert!(app.input.is_empty());
    }

    #[test]
    fn test_editing_does_not_refresh_view_until_done() {
        let mut app = app_with(&["Write repor"]);

        app.enter_edit_mode();
        app.input_char('t');

        assert_eq!(app.store().get(1).unwrap().text, "Write report");
        assert_eq!(view_texts(&app), vec!["Write repor"]);

        app.exit_input_mode();
        assert_eq!(view_texts(&app), vec!["Write report"]);
    }

    #[test]
    fn test_enter_after_edit_moves_to_new_row() {
        let mut app = app_with(&["a"]);

        app.enter_edit_mode();
        app.delete_char();
        type_text(&mut app, "b");
        app.submit();

        assert_eq!(view_texts(&app), vec!["b"]);
        assert_eq!(app.input_mode, InputMode::Adding);
        assert_eq!(app.selected, 1);
    }

    #[test]
    fn test_grab_and_drop_swaps() {
        let mut app = app_with(&["A", "B", "C"]);

        app.grab();
        app.next();
        app.next();
        app.drop_grabbed();

        assert_eq!(view_texts(&app), vec!["C", "B", "A"]);
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn test_full_list_has_no_new_row() {
        let texts: Vec<String> = (0..MAX_TASKS).map(|i| format!("task {i}")).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let mut app = app_with(&refs);

        assert_eq!(app.row_count(), MAX_TASKS);
        app.enter_add_mode();

        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(!app.is_new_task_row(app.view.len()));
    }

    #[test]
    fn test_delete_clamps_selection() {
        let mut app = app_with(&["A", "B"]);
        app.selected = 1;

        app.delete_task();
        assert_eq!(view_texts(&app), vec!["A"]);
        assert_eq!(app.selected, 1);
        assert!(app.is_new_task_row(app.selected));
    }

    #[test]
    fn test_priority_keys() {
        let mut app = app_with(&["A"]);

        app.cycle_priority();
        assert_eq!(app.view[0].priority, Priority::High);
        app.set_priority(Priority::Low);
        assert_eq!(app.view[0].priority, Priority::Low);
    }

    #[test]
    fn test_first_tick_is_immediate() {
        let mut app = app_with(&[]);
        let now = Instant::now();

        assert!(app.on_tick(now));
        assert!(app.countdown.is_some());
        assert!(!app.on_tick(now + Duration::from_millis(10)));
    }
}
