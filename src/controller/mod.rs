mod state;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info, instrument, warn};

pub use state::TodoState;

use crate::model::{normalize_title, DocumentPatch, Task, TaskId};
use crate::store::{DocumentStore, StoreError};

/// What a controller operation ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing changed and no remote call was made.
    Ignored,
    Done,
    /// The remote call failed and `last_error` was set. The local change is
    /// undone once no other mutation of the same task field is pending.
    Failed,
}

/// Part of a task a mutation writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Field {
    Completed,
    Title,
    Presence,
}

#[derive(Debug, Clone)]
enum Value {
    Completed(bool),
    Title(String),
    /// Position and content of a listed task, `None` once deleted.
    Presence(Option<(usize, Task)>),
}

impl Value {
    fn field(&self) -> Field {
        match self {
            Value::Completed(_) => Field::Completed,
            Value::Title(_) => Field::Title,
            Value::Presence(_) => Field::Presence,
        }
    }
}

/// Unfinished mutations of one field of one task.
struct Pending {
    count: usize,
    /// What the store is known to hold, and the sequence number that wrote it.
    confirmed: (u64, Value),
}

struct Inner {
    state: TodoState,
    next_seq: u64,
    in_flight: HashMap<(TaskId, Field), Pending>,
    latest_refresh: u64,
}

impl Inner {
    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    /// Starts a mutation; `before` is the field's value prior to the local change.
    fn begin(&mut self, id: &TaskId, before: Value) -> u64 {
        let seq = self.next_seq();
        let pending = self
            .in_flight
            .entry((id.clone(), before.field()))
            .or_insert(Pending {
                count: 0,
                confirmed: (0, before),
            });
        pending.count += 1;
        seq
    }

    /// Ends a mutation, `written` being the value it stored if it succeeded.
    /// Once no mutation of the field is pending, the field settles on the
    /// newest value the store accepted.
    fn finish(&mut self, id: &TaskId, field: Field, seq: u64, written: Option<Value>) {
        let key = (id.clone(), field);
        let pending = match self.in_flight.get_mut(&key) {
            Some(pending) => pending,
            None => return,
        };
        if let Some(value) = written {
            if seq > pending.confirmed.0 {
                pending.confirmed = (seq, value);
            }
        }
        pending.count -= 1;
        if pending.count > 0 {
            return;
        }
        if let Some(pending) = self.in_flight.remove(&key) {
            self.settle(id, pending.confirmed.1);
        }
    }

    fn settle(&mut self, id: &TaskId, value: Value) {
        match value {
            Value::Completed(completed) => {
                if let Some(task) = self.state.task_mut(id) {
                    task.completed = completed;
                }
            }
            Value::Title(title) => {
                if let Some(task) = self.state.task_mut(id) {
                    task.title = title;
                }
            }
            Value::Presence(Some((idx, task))) => self.state.restore(idx, task),
            Value::Presence(None) => {
                self.state.menus.remove(id);
            }
        }
    }

    fn fail(&mut self, message: &str, err: &StoreError) {
        error!(reason = %err, "{}", message);
        self.state.last_error = Some(message.to_string());
    }
}

/// Mediates user actions between the local to-do state and the remote store.
///
/// Every mutation is applied to the local state first and then sent to the
/// store. Once every pending mutation of a task field has finished, the field
/// settles on the newest value the store accepted, which undoes failed changes
/// without rolling back over newer successful ones. Clones share state, so operations may
/// overlap; the state lock is never held across a remote call.
pub struct TodoController<S>
where
    S: DocumentStore + ?Sized,
{
    store: Arc<S>,
    inner: Arc<Mutex<Inner>>,
}

impl<S> Clone for TodoController<S>
where
    S: DocumentStore + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            inner: self.inner.clone(),
        }
    }
}

impl<S> TodoController<S>
where
    S: DocumentStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            inner: Arc::new(Mutex::new(Inner {
                state: TodoState::default(),
                next_seq: 0,
                in_flight: HashMap::new(),
                latest_refresh: 0,
            })),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        f(&mut self.inner.lock())
    }

    pub fn snapshot(&self) -> TodoState {
        self.with(|inner| inner.state.clone())
    }

    pub fn set_pending_new_title(&self, text: &str) {
        self.with(|inner| inner.state.pending_new_title = text.to_string());
    }

    pub fn set_pending_edit_title(&self, text: &str) {
        self.with(|inner| inner.state.pending_edit_title = text.to_string());
    }

    pub fn dismiss_error(&self) {
        self.with(|inner| inner.state.last_error = None);
    }

    /// Replaces the local list with the store's. A listing that completes
    /// after a newer refresh was issued is dropped.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Outcome {
        let seq = self.with(|inner| {
            inner.state.loading = true;
            inner.latest_refresh = inner.next_seq();
            inner.latest_refresh
        });

        let result = self.store.list().await;

        self.with(|inner| {
            if inner.latest_refresh != seq {
                debug!(seq, "dropping stale listing");
                return Outcome::Ignored;
            }
            inner.state.loading = false;
            match result {
                Ok(documents) => {
                    info!(count = documents.len(), "tasks loaded");
                    let tasks: Vec<Task> = documents.into_iter().map(Task::from).collect();
                    inner
                        .state
                        .menus
                        .retain(|id, _| tasks.iter().any(|task| &task.id == id));
                    inner.state.tasks = tasks;
                    Outcome::Done
                }
                Err(err) => {
                    inner.fail("Unable to load tasks.", &err);
                    Outcome::Failed
                }
            }
        })
    }

    /// Shows the task right away as a provisional entry, creates it remotely
    /// and then reloads the list to pick up the real id.
    #[instrument(skip(self))]
    pub async fn add(&self, title: &str) -> Outcome {
        let title = match normalize_title(title) {
            Ok(title) => title,
            Err(_) => return Outcome::Ignored,
        };

        let id = self.with(|inner| {
            let key = inner.next_seq();
            let task = Task::provisional(key, title.clone());
            let id = task.id.clone();
            inner.state.tasks.push(task);
            inner.state.pending_new_title.clear();
            inner.state.close_menus();
            id
        });

        match self.store.create(&title, false).await {
            Ok(doc) => {
                debug!(id = %doc.id, "task created");
                self.refresh().await;
                Outcome::Done
            }
            Err(err) => self.with(|inner| {
                inner.state.remove(&id);
                inner.fail("Unable to add the task.", &err);
                Outcome::Failed
            }),
        }
    }

    #[instrument(skip(self, id), fields(id = %id))]
    pub async fn toggle_completion(&self, id: &TaskId) -> Outcome {
        let remote_id = match remote_id(id) {
            Some(remote_id) => remote_id,
            None => return Outcome::Ignored,
        };

        let started = self.with(|inner| {
            let task = inner.state.task_mut(id)?;
            task.completed = !task.completed;
            let completed = task.completed;
            inner.state.close_menus();
            Some((inner.begin(id, Value::Completed(!completed)), completed))
        });
        let (seq, completed) = match started {
            Some(started) => started,
            None => return Outcome::Ignored,
        };

        let result = self
            .store
            .update(&remote_id, &DocumentPatch::completed(completed))
            .await;

        self.with(|inner| match result {
            Ok(_) => {
                inner.finish(id, Field::Completed, seq, Some(Value::Completed(completed)));
                Outcome::Done
            }
            Err(err) => {
                inner.finish(id, Field::Completed, seq, None);
                inner.fail("Unable to update the task.", &err);
                Outcome::Failed
            }
        })
    }

    #[instrument(skip(self, id), fields(id = %id))]
    pub async fn delete(&self, id: &TaskId) -> Outcome {
        let remote_id = match remote_id(id) {
            Some(remote_id) => remote_id,
            None => return Outcome::Ignored,
        };

        let started = self.with(|inner| {
            let (idx, task) = inner.state.remove(id)?;
            if inner.state.is_editing(id) {
                inner.state.clear_edit();
            }
            inner.state.close_menus();
            Some(inner.begin(id, Value::Presence(Some((idx, task)))))
        });
        let seq = match started {
            Some(started) => started,
            None => return Outcome::Ignored,
        };

        let result = self.store.delete(&remote_id).await;

        self.with(|inner| match result {
            Ok(()) => {
                inner.finish(id, Field::Presence, seq, Some(Value::Presence(None)));
                Outcome::Done
            }
            Err(err) => {
                inner.finish(id, Field::Presence, seq, None);
                inner.fail("Unable to delete the task.", &err);
                Outcome::Failed
            }
        })
    }

    /// Starts editing a task with its current title. Returns false when there
    /// is no such task, or it is still provisional.
    pub fn begin_edit(&self, id: &TaskId) -> bool {
        if remote_id(id).is_none() {
            return false;
        }
        self.with(|inner| {
            let title = match inner.state.task(id) {
                Some(task) => task.title.clone(),
                None => return false,
            };
            inner.state.editing = Some(id.clone());
            inner.state.pending_edit_title = title;
            inner.state.close_menus();
            true
        })
    }

    #[instrument(skip(self))]
    pub async fn save_edit(&self) -> Outcome {
        let started = self.with(|inner| {
            let title = normalize_title(&inner.state.pending_edit_title).ok()?;
            let id = inner.state.editing.clone()?;
            let remote_id = remote_id(&id)?;
            let previous = match inner.state.task_mut(&id) {
                Some(task) => std::mem::replace(&mut task.title, title.clone()),
                None => {
                    warn!(id = %id, "edited task is gone");
                    inner.state.clear_edit();
                    return None;
                }
            };
            inner.state.clear_edit();
            inner.state.close_menus();
            Some((inner.begin(&id, Value::Title(previous)), id, remote_id, title))
        });
        let (seq, id, remote_id, title) = match started {
            Some(started) => started,
            None => return Outcome::Ignored,
        };

        let result = self
            .store
            .update(&remote_id, &DocumentPatch::title(title.clone()))
            .await;

        self.with(|inner| match result {
            Ok(_) => {
                inner.finish(&id, Field::Title, seq, Some(Value::Title(title)));
                Outcome::Done
            }
            Err(err) => {
                inner.finish(&id, Field::Title, seq, None);
                inner.fail("Unable to rename the task.", &err);
                Outcome::Failed
            }
        })
    }

    pub fn cancel_edit(&self) {
        self.with(|inner| {
            inner.state.clear_edit();
            inner.state.close_menus();
        });
    }

    /// Flips the action menu of one task, leaving the others alone.
    pub fn toggle_menu(&self, id: &TaskId) -> bool {
        self.with(|inner| inner.state.toggle_menu(id))
    }
}

/// Only confirmed documents can be changed remotely.
fn remote_id(id: &TaskId) -> Option<String> {
    let remote_id = id.remote().map(str::to_string);
    if remote_id.is_none() {
        warn!(id = %id, "task is not confirmed by the store yet");
    }
    remote_id
}
