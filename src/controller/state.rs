use std::collections::HashMap;

use crate::model::{Task, TaskId};

/// Everything the to-do screen shows. Edit state and open menus are
/// independent of each other and may refer to different tasks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoState {
    /// In the order of the last listing, plus provisional entries appended since.
    pub tasks: Vec<Task>,
    pub pending_new_title: String,
    pub editing: Option<TaskId>,
    pub pending_edit_title: String,
    /// Open/closed action menu per task. Several may be open at once.
    pub menus: HashMap<TaskId, bool>,
    pub loading: bool,
    pub last_error: Option<String>,
}

impl TodoState {
    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == *id)
    }

    pub fn task_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == *id)
    }

    pub fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == *id)
    }

    /// Removes the task, returning where it was.
    pub fn remove(&mut self, id: &TaskId) -> Option<(usize, Task)> {
        let idx = self.position(id)?;
        Some((idx, self.tasks.remove(idx)))
    }

    /// Puts a task back at `idx`, or at the end if the list has shrunk since.
    pub fn restore(&mut self, idx: usize, task: Task) {
        if self.position(&task.id).is_some() {
            return;
        }
        let idx = idx.min(self.tasks.len());
        self.tasks.insert(idx, task);
    }

    pub fn is_editing(&self, id: &TaskId) -> bool {
        self.editing.as_ref() == Some(id)
    }

    pub fn is_menu_open(&self, id: &TaskId) -> bool {
        self.menus.get(id).copied().unwrap_or(false)
    }

    /// Flips one menu and returns its new state.
    pub fn toggle_menu(&mut self, id: &TaskId) -> bool {
        let open = self.menus.entry(id.clone()).or_insert(false);
        *open = !*open;
        *open
    }

    pub fn close_menus(&mut self) {
        self.menus.values_mut().for_each(|open| *open = false);
    }

    pub fn clear_edit(&mut self) {
        self.editing = None;
        self.pending_edit_title.clear();
    }
}
