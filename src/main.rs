mod config;
mod console;
mod controller;
mod log;
mod model;
mod store;
mod view;

use std::sync::Arc;

use dotenv::dotenv;
use tokio::runtime::Builder;
use tracing::{event, Level};
use tracing_subscriber::EnvFilter;

use config::{Backend, Config};
use controller::TodoController;
use store::{AppwriteStore, DocumentStore, MemoryDocumentStore};

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let config = Config::load()?;
    let env_filter = EnvFilter::try_from_env(log::LOG_ENV);
    log::setup(env_filter, &config.log);

    event!(Level::INFO, "Starting todolist: {}", env!("CARGO_PKG_VERSION"));

    let store: Arc<dyn DocumentStore> = match config.backend {
        Backend::Appwrite => {
            event!(
                Level::INFO,
                endpoint = %config.appwrite.endpoint,
                project = %config.appwrite.project_id,
                "using Appwrite collection {}/{}",
                config.appwrite.database_id,
                config.appwrite.collection_id
            );
            Arc::new(AppwriteStore::new(&config.appwrite)?)
        }
        Backend::Memory => {
            event!(Level::WARN, "using in-memory store, nothing will be persisted");
            Arc::new(MemoryDocumentStore::new())
        }
    };
    let controller = TodoController::new(store);

    // one thread: commands interleave at remote calls only
    let runtime = Builder::new_current_thread()
        .thread_name("todolist")
        .enable_all()
        .build()?;
    runtime.block_on(console::run(controller))
}

#[cfg(all(test, feature = "e2e"))]
mod e2e_tests;
