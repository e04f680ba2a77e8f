//! Render model of the to-do screen.
//!
//! Turns a [`TodoState`] into rows the front end draws. Nothing here talks to
//! the store.

use chrono::Datelike;
use std::fmt;

use crate::controller::TodoState;
use crate::model::TaskId;

pub const HEADING: &str = "Todo List";
pub const NEW_TASK_PLACEHOLDER: &str = "Add a new task";

/// Entries of a task's action menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Complete,
    Undo,
    Edit,
    Delete,
}

impl MenuAction {
    pub fn label(&self) -> &'static str {
        match self {
            MenuAction::Complete => "Complete",
            MenuAction::Undo => "Undo",
            MenuAction::Edit => "Edit",
            MenuAction::Delete => "Delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowKind {
    Display {
        title: String,
        completed: bool,
        /// Empty while the menu is closed.
        actions: Vec<MenuAction>,
    },
    Editing {
        pending_title: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: TaskId,
    pub provisional: bool,
    pub kind: RowKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoView {
    pub pending_new_title: String,
    pub rows: Vec<Row>,
    pub loading: bool,
    pub error: Option<String>,
    pub year: i32,
}

impl From<&TodoState> for TodoView {
    fn from(state: &TodoState) -> Self {
        let rows = state
            .tasks
            .iter()
            .map(|task| {
                let kind = if state.is_editing(&task.id) {
                    RowKind::Editing {
                        pending_title: state.pending_edit_title.clone(),
                    }
                } else {
                    let actions = if state.is_menu_open(&task.id) {
                        let toggle = if task.completed {
                            MenuAction::Undo
                        } else {
                            MenuAction::Complete
                        };
                        vec![toggle, MenuAction::Edit, MenuAction::Delete]
                    } else {
                        vec![]
                    };
                    RowKind::Display {
                        title: task.title.clone(),
                        completed: task.completed,
                        actions,
                    }
                };
                Row {
                    id: task.id.clone(),
                    provisional: task.is_provisional(),
                    kind,
                }
            })
            .collect();

        Self {
            pending_new_title: state.pending_new_title.clone(),
            rows,
            loading: state.loading,
            error: state.last_error.clone(),
            year: chrono::Utc::now().year(),
        }
    }
}

impl fmt::Display for TodoView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", HEADING)?;
        if self.pending_new_title.is_empty() {
            writeln!(f, "  > ({})", NEW_TASK_PLACEHOLDER)?;
        } else {
            writeln!(f, "  > {}", self.pending_new_title)?;
        }
        for (idx, row) in self.rows.iter().enumerate() {
            let n = idx + 1;
            match &row.kind {
                RowKind::Editing { pending_title } => {
                    writeln!(f, "{:>3}. [edit] {}  [Save] [Cancel]", n, pending_title)?;
                }
                RowKind::Display {
                    title,
                    completed,
                    actions,
                } => {
                    let mark = if *completed { "x" } else { " " };
                    let pending = if row.provisional { " (saving)" } else { "" };
                    writeln!(f, "{:>3}. [{}] {}{}  \u{22ee}", n, mark, title, pending)?;
                    if !actions.is_empty() {
                        let labels: Vec<String> = actions
                            .iter()
                            .map(|action| format!("[{}]", action.label()))
                            .collect();
                        writeln!(f, "       {}", labels.join(" "))?;
                    }
                }
            }
        }
        if self.loading {
            writeln!(f, "  loading...")?;
        }
        if let Some(error) = &self.error {
            writeln!(f, "  ! {}", error)?;
        }
        write!(f, "\u{a9} {} All rights reserved.", self.year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Task;

    fn state() -> TodoState {
        TodoState {
            tasks: vec![
                Task::new("t1", "Buy milk", false),
                Task::new("t2", "Walk dog", true),
                Task::provisional(9, "Read".to_string()),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_menu_actions_follow_completion() {
        let mut state = state();
        state.toggle_menu(&"t1".into());
        state.toggle_menu(&"t2".into());

        let view = TodoView::from(&state);

        assert_eq!(
            view.rows[0].kind,
            RowKind::Display {
                title: "Buy milk".into(),
                completed: false,
                actions: vec![MenuAction::Complete, MenuAction::Edit, MenuAction::Delete],
            }
        );
        assert_eq!(
            view.rows[1].kind,
            RowKind::Display {
                title: "Walk dog".into(),
                completed: true,
                actions: vec![MenuAction::Undo, MenuAction::Edit, MenuAction::Delete],
            }
        );
        assert!(view.rows[2].provisional);
    }

    #[test]
    fn test_editing_row() {
        let mut state = state();
        state.editing = Some("t2".into());
        state.pending_edit_title = "Walk the dog".into();

        let view = TodoView::from(&state);

        assert_eq!(
            view.rows[1].kind,
            RowKind::Editing {
                pending_title: "Walk the dog".into()
            }
        );
    }

    #[test]
    fn test_text_rendering() {
        let mut state = state();
        state.toggle_menu(&"t1".into());
        state.last_error = Some("Unable to load tasks.".into());

        let text = TodoView::from(&state).to_string();

        assert!(text.starts_with("Todo List\n  > (Add a new task)\n"));
        assert!(text.contains("  1. [ ] Buy milk"));
        assert!(text.contains("       [Complete] [Edit] [Delete]"));
        assert!(text.contains("  2. [x] Walk dog"));
        assert!(text.contains("  3. [ ] Read (saving)"));
        assert!(text.contains("  ! Unable to load tasks."));
        assert!(text.ends_with("All rights reserved."));
    }
}
