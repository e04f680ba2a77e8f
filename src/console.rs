//! Line oriented front end. Each command runs as its own task so the screen
//! stays usable while remote calls are in flight.

use std::str::FromStr;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{info, info_span};
use tracing_futures::Instrument;

use crate::controller::{Outcome, TodoController};
use crate::model::TaskId;
use crate::store::DocumentStore;
use crate::view::TodoView;

pub const HELP: &str = "\
commands:
  add [text]    add a task (or the typed new task)
  type <text>   type the new task without adding it
  menu N        open/close the action menu of row N
  toggle N      complete or undo row N
  edit N        start editing row N
  text <text>   replace the text being edited
  save          save the edit
  cancel        cancel the edit
  delete N      delete row N
  refresh       reload the list
  dismiss       hide the error message
  help          show this help
  quit          leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add(Option<String>),
    Type(String),
    Menu(usize),
    Toggle(usize),
    Edit(usize),
    Text(String),
    Save,
    Cancel,
    Delete(usize),
    Refresh,
    Dismiss,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("unknown command {0:?}, try 'help'")]
    Unknown(String),
    #[error("'{0}' expects a row number")]
    MissingRow(&'static str),
    #[error("invalid row number {0:?}")]
    BadRow(String),
    #[error("'{0}' expects some text")]
    MissingText(&'static str),
    #[error("there is no row {0}")]
    NoSuchRow(usize),
}

fn row(name: &'static str, arg: &str) -> Result<usize, ConsoleError> {
    if arg.is_empty() {
        return Err(ConsoleError::MissingRow(name));
    }
    match arg.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConsoleError::BadRow(arg.to_string())),
    }
}

fn text(name: &'static str, arg: &str) -> Result<String, ConsoleError> {
    if arg.is_empty() {
        return Err(ConsoleError::MissingText(name));
    }
    Ok(arg.to_string())
}

impl FromStr for Command {
    type Err = ConsoleError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (name, arg) = match line.find(char::is_whitespace) {
            Some(idx) => (&line[..idx], line[idx..].trim()),
            None => (line, ""),
        };
        match name {
            "add" if arg.is_empty() => Ok(Command::Add(None)),
            "add" => Ok(Command::Add(Some(arg.to_string()))),
            "type" => Ok(Command::Type(arg.to_string())),
            "menu" => row("menu", arg).map(Command::Menu),
            "toggle" => row("toggle", arg).map(Command::Toggle),
            "edit" => row("edit", arg).map(Command::Edit),
            "text" => text("text", arg).map(Command::Text),
            "save" => Ok(Command::Save),
            "cancel" => Ok(Command::Cancel),
            "delete" => row("delete", arg).map(Command::Delete),
            "refresh" => Ok(Command::Refresh),
            "dismiss" => Ok(Command::Dismiss),
            "help" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            _ => Err(ConsoleError::Unknown(line.to_string())),
        }
    }
}

/// Resolves a 1-based row number against the current list.
fn task_at<S>(controller: &TodoController<S>, n: usize) -> Result<TaskId, ConsoleError>
where
    S: DocumentStore + ?Sized,
{
    controller
        .snapshot()
        .tasks
        .get(n.checked_sub(1).ok_or(ConsoleError::NoSuchRow(n))?)
        .map(|task| task.id.clone())
        .ok_or(ConsoleError::NoSuchRow(n))
}

/// Applies one command to the controller.
pub async fn execute<S>(
    controller: &TodoController<S>,
    command: Command,
) -> Result<Outcome, ConsoleError>
where
    S: DocumentStore + ?Sized,
{
    let outcome = match command {
        Command::Add(Some(title)) => {
            controller.set_pending_new_title(&title);
            controller.add(&title).await
        }
        Command::Add(None) => {
            let title = controller.snapshot().pending_new_title;
            controller.add(&title).await
        }
        Command::Type(title) => {
            controller.set_pending_new_title(&title);
            Outcome::Done
        }
        Command::Menu(n) => {
            controller.toggle_menu(&task_at(controller, n)?);
            Outcome::Done
        }
        Command::Toggle(n) => {
            let id = task_at(controller, n)?;
            controller.toggle_completion(&id).await
        }
        Command::Edit(n) => {
            if controller.begin_edit(&task_at(controller, n)?) {
                Outcome::Done
            } else {
                Outcome::Ignored
            }
        }
        Command::Text(title) => {
            controller.set_pending_edit_title(&title);
            Outcome::Done
        }
        Command::Save => controller.save_edit().await,
        Command::Cancel => {
            controller.cancel_edit();
            Outcome::Done
        }
        Command::Delete(n) => {
            let id = task_at(controller, n)?;
            controller.delete(&id).await
        }
        Command::Refresh => controller.refresh().await,
        Command::Dismiss => {
            controller.dismiss_error();
            Outcome::Done
        }
        Command::Help | Command::Quit => Outcome::Ignored,
    };
    Ok(outcome)
}

fn render<S>(controller: &TodoController<S>)
where
    S: DocumentStore + ?Sized,
{
    println!("{}\n", TodoView::from(&controller.snapshot()));
}

fn spawn<S>(controller: &TodoController<S>, command: Command) -> JoinHandle<()>
where
    S: DocumentStore + ?Sized,
{
    let controller = controller.clone();
    let span = info_span!("command", command = ?command);
    tokio::spawn(
        async move {
            match execute(&controller, command).await {
                Ok(Outcome::Ignored) => println!("nothing to do"),
                Ok(_) => render(&controller),
                Err(err) => println!("{}", err),
            }
        }
        .instrument(span),
    )
}

/// Reads commands from stdin until `quit` or end of input.
pub async fn run<S>(controller: TodoController<S>) -> anyhow::Result<()>
where
    S: DocumentStore + ?Sized,
{
    serve(controller, BufReader::new(tokio::io::stdin())).await
}

/// Runs commands read from `input`. Commands still in flight when the input
/// ends are awaited, so their remote calls complete.
async fn serve<S, R>(controller: TodoController<S>, input: R) -> anyhow::Result<()>
where
    S: DocumentStore + ?Sized,
    R: AsyncBufRead + Unpin,
{
    println!("{}\n", HELP);
    let mut running = vec![spawn(&controller, Command::Refresh)];

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<Command>() {
            Ok(Command::Quit) => break,
            Ok(Command::Help) => println!("{}\n", HELP),
            Ok(command) => {
                let handle = spawn(&controller, command);
                // let the command reach its first remote call, then show the
                // optimistic state
                tokio::task::yield_now().await;
                if !handle.is_finished() {
                    render(&controller);
                }
                running.retain(|handle| !handle.is_finished());
                running.push(handle);
            }
            Err(err) => println!("{}", err),
        }
    }

    if !running.is_empty() {
        info!(count = running.len(), "waiting for commands in flight");
    }
    for handle in running {
        handle.await?;
    }
    info!("console closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tokio::sync::oneshot;

    use super::*;
    use crate::model::{Document, DocumentPatch};
    use crate::store::{MemoryDocumentStore, StoreError};

    /// Memory store whose create waits until the test opens the gate.
    struct GatedStore {
        documents: MemoryDocumentStore,
        gate: Mutex<Option<oneshot::Receiver<()>>>,
    }

    #[async_trait]
    impl DocumentStore for GatedStore {
        async fn list(&self) -> Result<Vec<Document>, StoreError> {
            self.documents.list().await
        }

        async fn create(&self, title: &str, completed: bool) -> Result<Document, StoreError> {
            let gate = self.gate.lock().take();
            if let Some(gate) = gate {
                gate.await.ok();
            }
            self.documents.create(title, completed).await
        }

        async fn update(&self, id: &str, patch: &DocumentPatch) -> Result<Document, StoreError> {
            self.documents.update(id, patch).await
        }

        async fn delete(&self, id: &str) -> Result<(), StoreError> {
            self.documents.delete(id).await
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!("add".parse::<Command>(), Ok(Command::Add(None)));
        assert_eq!(
            "add  Buy milk ".parse::<Command>(),
            Ok(Command::Add(Some("Buy milk".to_string())))
        );
        assert_eq!("menu 2".parse::<Command>(), Ok(Command::Menu(2)));
        assert_eq!("toggle 1".parse::<Command>(), Ok(Command::Toggle(1)));
        assert_eq!("text Walk the dog".parse::<Command>(), Ok(Command::Text("Walk the dog".into())));
        assert_eq!("exit".parse::<Command>(), Ok(Command::Quit));
        assert_eq!("type".parse::<Command>(), Ok(Command::Type(String::new())));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("jump".parse::<Command>(), Err(ConsoleError::Unknown("jump".into())));
        assert_eq!("delete".parse::<Command>(), Err(ConsoleError::MissingRow("delete")));
        assert_eq!("edit x".parse::<Command>(), Err(ConsoleError::BadRow("x".into())));
        assert_eq!("menu 0".parse::<Command>(), Err(ConsoleError::BadRow("0".into())));
        assert_eq!("text".parse::<Command>(), Err(ConsoleError::MissingText("text")));
    }

    #[tokio::test]
    async fn test_execute_by_row() {
        // GIVEN
        let store = Arc::new(MemoryDocumentStore::with_documents(vec![
            Document {
                id: "t1".into(),
                title: "Buy milk".into(),
                completed: false,
            },
            Document {
                id: "t2".into(),
                title: "Walk dog".into(),
                completed: false,
            },
        ]));
        let controller = TodoController::new(store.clone());
        execute(&controller, Command::Refresh).await.unwrap();

        // WHEN
        let outcome = execute(&controller, Command::Toggle(2)).await.unwrap();

        // THEN
        assert_eq!(outcome, Outcome::Done);
        assert!(store.documents()[1].completed);
        assert_eq!(
            execute(&controller, Command::Delete(3)).await,
            Err(ConsoleError::NoSuchRow(3))
        );
    }

    #[tokio::test]
    async fn test_execute_typed_add_and_edit() {
        let store = Arc::new(MemoryDocumentStore::new());
        let controller = TodoController::new(store.clone());

        execute(&controller, Command::Type("Buy milk".into())).await.unwrap();
        assert_eq!(controller.snapshot().pending_new_title, "Buy milk");
        execute(&controller, Command::Add(None)).await.unwrap();

        execute(&controller, Command::Edit(1)).await.unwrap();
        execute(&controller, Command::Text("Buy oat milk".into())).await.unwrap();
        let outcome = execute(&controller, Command::Save).await.unwrap();

        assert_eq!(outcome, Outcome::Done);
        let state = controller.snapshot();
        assert!(state.pending_new_title.is_empty());
        assert_eq!(state.tasks.len(), 1);
        assert_eq!(store.documents()[0].title, "Buy oat milk");
    }

    #[tokio::test]
    async fn test_row_zero_is_no_such_row() {
        let controller = TodoController::new(Arc::new(MemoryDocumentStore::new()));

        assert_eq!(
            execute(&controller, Command::Menu(0)).await,
            Err(ConsoleError::NoSuchRow(0))
        );
    }

    #[tokio::test]
    async fn test_end_of_input_waits_for_commands_in_flight() {
        // GIVEN
        let (open, gate) = oneshot::channel();
        let store = Arc::new(GatedStore {
            documents: MemoryDocumentStore::new(),
            gate: Mutex::new(Some(gate)),
        });
        let controller = TodoController::new(store.clone());

        // WHEN
        let serving = tokio::spawn(serve(controller.clone(), &b"add Buy milk\n"[..]));
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        // THEN
        assert!(!serving.is_finished());
        assert!(controller.snapshot().tasks[0].is_provisional());

        // WHEN
        open.send(()).unwrap();
        serving.await.unwrap().unwrap();

        // THEN
        let documents = store.documents.documents();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].title, "Buy milk");
        assert!(!controller.snapshot().tasks[0].is_provisional());
    }
}
