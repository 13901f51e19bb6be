//! Locating the task an intent refers to.

use super::intent::TaskRef;
use crate::store::{TaskFilter, TaskStore};
use crate::task::Task;

/// Find the task referenced by `target`.
///
/// An id wins over a title: when `task_id` is set the title is ignored, even
/// if no task carries that id. A title matches case-insensitively as a
/// substring, and the first match in store order (most recently created
/// first) is returned. Several tasks sharing the fragment are not ranked, so
/// "report" may pick a different task than the user meant.
pub async fn resolve(store: &dyn TaskStore, target: &TaskRef) -> Result<Option<Task>, String> {
    if let Some(id) = target.task_id {
        return store.get_task(id).await;
    }

    match target.title {
        Some(ref title) => {
            let filter = TaskFilter::title_contains(title.as_str()).limit(1);
            Ok(store.list_tasks(&filter).await?.into_iter().next())
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryTaskStore, SqliteTaskStore};
    use crate::task::TaskId;

    async fn seeded() -> InMemoryTaskStore {
        let store = InMemoryTaskStore::new();
        store.create_task("Quarterly report", None).await.unwrap();
        store.create_task("Team meeting", None).await.unwrap();
        store.create_task("Report bug in parser", None).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_resolve_by_id() {
        let store = seeded().await;
        let task = resolve(&store, &TaskRef::by_id(TaskId::new(2)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(task.title, "Team meeting");
    }

    #[tokio::test]
    async fn test_missing_id_ignores_title() {
        let store = seeded().await;
        let target = TaskRef {
            task_id: Some(TaskId::new(99)),
            title: Some("meeting".into()),
        };
        assert!(resolve(&store, &target).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_title_is_case_insensitive_substring() {
        let store = seeded().await;
        let task = resolve(&store, &TaskRef::by_title("MEET"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(task.title, "Team meeting");
    }

    #[tokio::test]
    async fn test_ambiguous_title_picks_most_recent() {
        let store = seeded().await;
        let task = resolve(&store, &TaskRef::by_title("report"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(task.title, "Report bug in parser");
    }

    #[tokio::test]
    async fn test_empty_reference() {
        let store = seeded().await;
        assert!(resolve(&store, &TaskRef::default()).await.unwrap().is_none());
        assert!(resolve(&store, &TaskRef::by_title("dentist"))
            .await
            .unwrap()
            .is_none());
    }

    async fn resolves_accented_title(store: &dyn TaskStore) {
        store.create_task("Éclair tasting", None).await.unwrap();
        store.create_task("Team meeting", None).await.unwrap();
        let task = resolve(store, &TaskRef::by_title("éclair"))
            .await
            .unwrap()
            .expect("accented title should resolve");
        assert_eq!(task.title, "Éclair tasting");
    }

    #[tokio::test]
    async fn test_accented_title_in_memory() {
        resolves_accented_title(&InMemoryTaskStore::new()).await;
    }

    #[tokio::test]
    async fn test_accented_title_in_sqlite() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = SqliteTaskStore::new(temp.path().to_path_buf())
            .await
            .expect("Failed to open store");
        resolves_accented_title(&store).await;
    }
}

