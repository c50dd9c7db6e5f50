use std::time::Instant;

use focus_core::{Notice, Priority, Storage, MAX_TASKS};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::tui::app::{App, InputMode};

/// Above this many tasks the list splits into two columns.
const SINGLE_COLUMN_MAX: usize = 4;

const NEW_TASK_PLACEHOLDER: &str = "Type a new task and press Enter...";
const EMPTY_TEXT_PLACEHOLDER: &str = "Enter your task...";

pub fn draw<S: Storage>(f: &mut Frame, app: &App<S>) {
    let size = f.area();

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(4), // Countdown
            Constraint::Min(3),    // Tasks
            Constraint::Length(1), // Notice
            Constraint::Length(1), // Footer/Help
        ])
        .split(size);

    draw_countdown(f, app, main_chunks[0]);
    draw_task_list(f, app, main_chunks[1]);
    draw_notice(f, app.notice(Instant::now()), main_chunks[2]);

    let footer = Paragraph::new(help_text(app.input_mode))
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    f.render_widget(footer, main_chunks[3]);
}

fn help_text(mode: InputMode) -> &'static str {
    match mode {
        InputMode::Normal => {
            "j/k: Move | space: Done | a: Add | e: Edit | p/1-4: Priority | g: Move task | d: Delete | q: Quit"
        }
        InputMode::Adding => "Enter: Add | Esc: Cancel",
        InputMode::Editing(_) => "Enter: Finish | Esc: Done editing",
        InputMode::Moving(_) => "j/k: Pick target | g/Enter: Swap | Esc: Cancel",
    }
}

fn draw_countdown<S: Storage>(f: &mut Frame, app: &App<S>, area: Rect) {
    let (clock, date) = match &app.countdown {
        Some(countdown) => (countdown.to_string(), countdown.date_label.clone()),
        None => ("--:--:--".to_string(), String::new()),
    };

    let text = vec![
        Line::from(Span::styled(
            clock,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(date, Style::default().fg(Color::DarkGray))),
    ];

    let header = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .title(" Time left today ")
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded),
        );
    f.render_widget(header, area);
}

pub fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::Low => Color::Rgb(0x4C, 0xAF, 0x50),
        Priority::Medium => Color::Rgb(0xFF, 0x98, 0x00),
        Priority::High => Color::Rgb(0xF4, 0x43, 0x36),
        Priority::Urgent => Color::Rgb(0x9C, 0x27, 0xB0),
    }
}

/// One rendered row, plus the cursor column if the row holds the active input.
struct RowLine {
    line: Line<'static>,
    cursor_x: Option<u16>,
}

fn text_with_cursor(prefix: &[Span<'static>], input: &str, cursor_position: usize) -> u16 {
    let prefix_width: usize = prefix.iter().map(|s| s.content.width()).sum();
    let before_cursor: String = input.chars().take(cursor_position).collect();
    (prefix_width + before_cursor.width()) as u16
}

fn task_rows<S: Storage>(app: &App<S>) -> Vec<RowLine> {
    let mut rows = Vec::with_capacity(MAX_TASKS + 1);

    for (index, task) in app.view.iter().enumerate() {
        let selected = index == app.selected;
        let marker = match app.input_mode {
            InputMode::Moving(id) if id == task.id => "⇅ ",
            _ if selected => "› ",
            _ => "  ",
        };
        let checkbox = if task.completed { "[x] " } else { "[ ] " };

        let prefix = vec![
            Span::styled(marker, Style::default().fg(Color::Yellow)),
            Span::raw(checkbox),
            Span::styled("● ", Style::default().fg(priority_color(task.priority))),
        ];

        let editing = app.input_mode == InputMode::Editing(task.id);
        let (text, cursor_x) = if editing {
            let x = text_with_cursor(&prefix, &app.input, app.cursor_position);
            (app.input.clone(), Some(x))
        } else {
            (task.text.clone(), None)
        };

        let mut text_style = if task.completed {
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT)
        } else {
            Style::default()
        };
        if selected {
            text_style = text_style.add_modifier(Modifier::BOLD);
        }

        let text_span = if text.is_empty() && !editing {
            Span::styled(EMPTY_TEXT_PLACEHOLDER, Style::default().fg(Color::DarkGray))
        } else {
            Span::styled(text, text_style)
        };

        let mut spans = prefix;
        spans.push(text_span);
        rows.push(RowLine {
            line: Line::from(spans),
            cursor_x,
        });
    }

    if app.store().is_full() {
        rows.push(RowLine {
            line: Line::from(Span::styled(
                format!("🎯 Maximum tasks reached ({MAX_TASKS}/{MAX_TASKS})"),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )),
            cursor_x: None,
        });
        rows.push(RowLine {
            line: Line::from(Span::styled(
                "   Complete or delete some tasks to add more",
                Style::default().fg(Color::DarkGray),
            )),
            cursor_x: None,
        });
    } else {
        let selected = app.is_new_task_row(app.selected);
        let prefix = vec![
            Span::styled(if selected { "› " } else { "  " }, Style::default().fg(Color::Yellow)),
            Span::styled("[ ] ", Style::default().fg(Color::DarkGray)),
        ];
        let (text_span, cursor_x) = if app.input_mode == InputMode::Adding {
            let x = text_with_cursor(&prefix, &app.input, app.cursor_position);
            (Span::raw(app.input.clone()), Some(x))
        } else {
            (
                Span::styled(NEW_TASK_PLACEHOLDER, Style::default().fg(Color::DarkGray)),
                None,
            )
        };
        let mut spans = prefix;
        spans.push(text_span);
        rows.push(RowLine {
            line: Line::from(spans),
            cursor_x,
        });
    }

    rows
}

fn draw_task_list<S: Storage>(f: &mut Frame, app: &App<S>, area: Rect) {
    let block = Block::default()
        .title(format!(" Tasks {}/{} ", app.view.len(), MAX_TASKS))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut rows = task_rows(app);

    let columns: Vec<(Rect, Vec<RowLine>)> = if app.view.len() > SINGLE_COLUMN_MAX {
        let halves = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(inner);
        let right = rows.split_off(rows.len().div_ceil(2));
        vec![(halves[0], rows), (halves[1], right)]
    } else {
        vec![(inner, rows)]
    };

    for (column_area, column_rows) in columns {
        for (offset, row) in column_rows.iter().enumerate() {
            if let Some(x) = row.cursor_x {
                let y = column_area.y + offset as u16;
                let x = (column_area.x + x).min(column_area.right().saturating_sub(1));
                if y < column_area.bottom() {
                    f.set_cursor_position((x, y));
                }
            }
        }
        let lines: Vec<Line> = column_rows.into_iter().map(|row| row.line).collect();
        f.render_widget(Paragraph::new(lines), column_area);
    }
}

fn draw_notice(f: &mut Frame, notice: Option<&Notice>, area: Rect) {
    if let Some(notice) = notice {
        let line = Paragraph::new(format!("⚠ {}", notice.message))
            .style(Style::default().fg(Color::Yellow))
            .alignment(Alignment::Center);
        f.render_widget(line, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use focus_core::{MemoryStorage, TaskListStore};
    use ratatui::{backend::TestBackend, Terminal};

    fn render(app: &App<MemoryStorage>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 16)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn app_with(count: usize) -> App<MemoryStorage> {
        let mut store = TaskListStore::open(MemoryStorage::new());
        for i in 0..count {
            store.add(&format!("task {i}"));
        }
        App::new(store)
    }

    #[test]
    fn test_shows_new_task_row_when_room_left() {
        let screen = render(&app_with(2));

        assert!(screen.contains("task 0"));
        assert!(screen.contains("task 1"));
        assert!(screen.contains(NEW_TASK_PLACEHOLDER));
        assert!(screen.contains("Tasks 2/8"));
    }

    #[test]
    fn test_shows_limit_placeholder_when_full() {
        let screen = render(&app_with(MAX_TASKS));

        assert!(screen.contains("Maximum tasks reached (8/8)"));
        assert!(!screen.contains(NEW_TASK_PLACEHOLDER));
        assert!(screen.contains("task 7"));
    }

    #[test]
    fn test_countdown_header() {
        let mut app = app_with(0);
        assert!(render(&app).contains("--:--:--"));

        app.on_tick(Instant::now());
        let countdown = app.countdown.clone().unwrap();
        assert!(render(&app).contains(&countdown.date_label));
    }
}
