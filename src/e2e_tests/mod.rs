#[cfg(test)]
mod tests {

    use std::sync::Arc;

    use dotenv::dotenv;
    use rand::distributions::Alphanumeric;
    use rand::{thread_rng, Rng};

    use crate::config::Config;
    use crate::controller::{Outcome, TodoController};
    use crate::model::TaskId;
    use crate::store::{AppwriteStore, DocumentStore};

    fn store() -> Arc<AppwriteStore> {
        dotenv().ok();
        let config = Config::load().unwrap();
        Arc::new(AppwriteStore::new(&config.appwrite).unwrap())
    }

    fn random_title() -> String {
        let rand_string: String = thread_rng()
            .sample_iter(&Alphanumeric)
            .take(16)
            .map(char::from)
            .collect();
        format!("e2e {}", rand_string)
    }

    #[tokio::test]
    async fn test_e2e_task_lifecycle() {
        let store = store();
        let controller = TodoController::new(store.clone());
        let title = random_title();

        // create
        assert_eq!(controller.add(&title).await, Outcome::Done);
        let state = controller.snapshot();
        let task = state
            .tasks
            .iter()
            .find(|task| task.title == title)
            .expect("created task is listed")
            .clone();
        assert!(matches!(task.id, TaskId::Remote(_)));
        assert!(!task.completed);

        // complete
        assert_eq!(controller.toggle_completion(&task.id).await, Outcome::Done);
        let remote = store.list().await.unwrap();
        let doc = remote
            .iter()
            .find(|doc| Some(doc.id.as_str()) == task.id.remote())
            .unwrap();
        assert!(doc.completed);

        // rename
        assert!(controller.begin_edit(&task.id));
        controller.set_pending_edit_title(&format!("{} renamed", title));
        assert_eq!(controller.save_edit().await, Outcome::Done);

        // delete
        assert_eq!(controller.delete(&task.id).await, Outcome::Done);
        controller.refresh().await;
        assert!(controller.snapshot().task(&task.id).is_none());
    }

    #[tokio::test]
    async fn test_e2e_missing_document() {
        let controller = TodoController::new(store());
        controller.refresh().await;

        // not in local state, so nothing is sent
        assert_eq!(
            controller.delete(&TaskId::from("doesnotexist0000")).await,
            Outcome::Ignored
        );

        let err = store().delete("doesnotexist0000").await.unwrap_err();
        assert!(err.to_string().contains("404"));
    }
}
