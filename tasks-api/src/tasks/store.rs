//! In-memory task storage

use async_trait::async_trait;
use std::collections::BTreeMap;
use tasks_cache::{Outcome, RecordStore};
use tokio::sync::RwLock;
use tracing::debug;

use super::model::{OrderBy, OrderDirection, ResultInfo, Task, TaskFields, TaskPage, TaskQuery};

const NOT_FOUND: &str = "Not Found";

#[derive(Debug, Default)]
struct Inner {
    tasks: BTreeMap<u64, Task>,
    last_id: u64,
}

impl Inner {
    fn slug_taken(&self, slug: &str, except: Option<u64>) -> bool {
        self.tasks
            .values()
            .any(|t| t.slug == slug && Some(t.id) != except)
    }
}

/// Task table kept in process memory
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    inner: RwLock<Inner>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.tasks.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl RecordStore for MemoryTaskStore {
    type Id = u64;
    type Record = Task;
    type Fields = TaskFields;
    type Query = TaskQuery;
    type Page = TaskPage;

    async fn create(&self, fields: TaskFields) -> Outcome<Task> {
        if let Err(message) = fields.validate_new() {
            return Outcome::validation(message);
        }

        let mut inner = self.inner.write().await;
        let slug = fields.slug.clone().unwrap_or_default();
        if inner.slug_taken(&slug, None) {
            return Outcome::conflict(format!("slug '{}' already exists", slug));
        }

        let (Some(name), Some(due_date)) = (fields.name, fields.due_date) else {
            return Outcome::validation("name and due_date are required");
        };

        inner.last_id += 1;
        let task = Task {
            id: inner.last_id,
            name,
            slug,
            description: fields.description,
            completed: fields.completed.unwrap_or(false),
            due_date,
        };
        inner.tasks.insert(task.id, task.clone());
        debug!("Created task {}", task.id);

        Outcome::Success(task)
    }

    async fn read(&self, id: &u64) -> Outcome<Task> {
        match self.inner.read().await.tasks.get(id) {
            Some(task) => Outcome::Success(task.clone()),
            None => Outcome::not_found(NOT_FOUND),
        }
    }

    async fn update(&self, id: &u64, fields: TaskFields) -> Outcome<Task> {
        if let Err(message) = fields.validate_patch() {
            return Outcome::validation(message);
        }

        let mut inner = self.inner.write().await;
        if !inner.tasks.contains_key(id) {
            return Outcome::not_found(NOT_FOUND);
        }
        if let Some(slug) = fields.slug.as_deref() {
            if inner.slug_taken(slug, Some(*id)) {
                return Outcome::conflict(format!("slug '{}' already exists", slug));
            }
        }

        match inner.tasks.get_mut(id) {
            Some(task) => {
                task.apply(fields);
                debug!("Updated task {}", id);
                Outcome::Success(task.clone())
            }
            None => Outcome::not_found(NOT_FOUND),
        }
    }

    async fn delete(&self, id: &u64) -> Outcome<Task> {
        match self.inner.write().await.tasks.remove(id) {
            Some(task) => {
                debug!("Deleted task {}", id);
                Outcome::Success(task)
            }
            None => Outcome::not_found(NOT_FOUND),
        }
    }

    async fn list(&self, query: &TaskQuery) -> Outcome<TaskPage> {
        let inner = self.inner.read().await;
        let needle = query.search_term();

        let mut matching: Vec<&Task> = inner
            .tasks
            .values()
            .filter(|t| query.completed.map_or(true, |c| t.completed == c))
            .filter(|t| needle.as_deref().map_or(true, |n| t.matches(n)))
            .collect();

        matching.sort_by(|a, b| {
            let ordering = match query.order_by {
                OrderBy::Id => a.id.cmp(&b.id),
                OrderBy::Name => a.name.cmp(&b.name).then(a.id.cmp(&b.id)),
                OrderBy::DueDate => a.due_date.cmp(&b.due_date).then(a.id.cmp(&b.id)),
            };
            match query.order_by_direction {
                OrderDirection::Asc => ordering,
                OrderDirection::Desc => ordering.reverse(),
            }
        });

        let page = query.page();
        let per_page = query.per_page();
        let total_count = matching.len();
        let result: Vec<Task> = matching
            .into_iter()
            .skip((page as usize - 1) * per_page as usize)
            .take(per_page as usize)
            .cloned()
            .collect();

        Outcome::Success(TaskPage {
            result_info: ResultInfo {
                page,
                per_page,
                count: result.len(),
                total_count,
            },
            result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tasks_cache::FailureKind;

    fn fields(name: &str, slug: &str) -> TaskFields {
        TaskFields {
            name: Some(name.to_string()),
            slug: Some(slug.to_string()),
            description: None,
            completed: Some(false),
            due_date: Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()),
        }
    }

    fn kind<T>(outcome: &Outcome<T>) -> Option<FailureKind> {
        match outcome {
            Outcome::Failure(f) => Some(f.kind),
            Outcome::Success(_) => None,
        }
    }

    #[tokio::test]
    async fn test_ids_start_at_one_and_increase() {
        let store = MemoryTaskStore::new();
        let a = store.create(fields("A", "a")).await.into_result().unwrap();
        let b = store.create(fields("B", "b")).await.into_result().unwrap();

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);

        // Ids are not reused after deletion.
        store.delete(&2).await;
        let c = store.create(fields("C", "c")).await.into_result().unwrap();
        assert_eq!(c.id, 3);
    }

    #[tokio::test]
    async fn test_duplicate_slug_conflicts() {
        let store = MemoryTaskStore::new();
        store.create(fields("A", "same")).await;

        let dup = store.create(fields("B", "same")).await;
        assert_eq!(kind(&dup), Some(FailureKind::Conflict));

        let other = store.create(fields("C", "other")).await.into_result().unwrap();
        let clash = store
            .update(
                &other.id,
                TaskFields {
                    slug: Some("same".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert_eq!(kind(&clash), Some(FailureKind::Conflict));
    }

    #[tokio::test]
    async fn test_missing_id_is_not_found() {
        let store = MemoryTaskStore::new();

        let read = store.read(&42).await;
        assert_eq!(kind(&read), Some(FailureKind::NotFound));
        assert_eq!(
            read.into_result().unwrap_err().message,
            "Not Found".to_string()
        );
        assert_eq!(
            kind(&store.update(&42, TaskFields::default()).await),
            Some(FailureKind::NotFound)
        );
        assert_eq!(kind(&store.delete(&42).await), Some(FailureKind::NotFound));
    }

    #[tokio::test]
    async fn test_create_validates() {
        let store = MemoryTaskStore::new();
        let outcome = store.create(fields("", "slug")).await;

        assert_eq!(kind(&outcome), Some(FailureKind::Validation));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_list_filters_sorts_and_pages() {
        let store = MemoryTaskStore::new();
        for i in 1..=5 {
            let mut f = fields(&format!("Task {}", i), &format!("task-{}", i));
            f.completed = Some(i % 2 == 0);
            store.create(f).await;
        }

        // Default order is id descending.
        let page = store.list(&TaskQuery::default()).await.into_result().unwrap();
        assert_eq!(page.result[0].id, 5);
        assert_eq!(page.result_info.total_count, 5);

        let query = TaskQuery {
            completed: Some(true),
            order_by_direction: OrderDirection::Asc,
            ..Default::default()
        };
        let page = store.list(&query).await.into_result().unwrap();
        let ids: Vec<u64> = page.result.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 4]);

        let query = TaskQuery {
            page: Some(2),
            per_page: Some(2),
            order_by_direction: OrderDirection::Asc,
            ..Default::default()
        };
        let page = store.list(&query).await.into_result().unwrap();
        let ids: Vec<u64> = page.result.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 4]);
        assert_eq!(page.result_info.count, 2);
        assert_eq!(page.result_info.page, 2);
    }

    #[tokio::test]
    async fn test_list_search() {
        let store = MemoryTaskStore::new();
        store.create(fields("Buy milk", "buy-milk")).await;
        store.create(fields("Walk dog", "walk-dog")).await;

        let query = TaskQuery {
            search: Some("MILK".to_string()),
            ..Default::default()
        };
        let page = store.list(&query).await.into_result().unwrap();
        assert_eq!(page.result.len(), 1);
        assert_eq!(page.result[0].slug, "buy-milk");
    }
}
