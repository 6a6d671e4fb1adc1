//! In-memory repository implementation.
//!
//! Suitable for development and tests. Documents live in a `HashMap`
//! guarded by a tokio `RwLock`; writers are serialized by the lock.

use std::collections::HashMap;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::RwLock;

use crate::domain::{NewTodo, Timestamp, Todo, TodoId, TodoPatch, TodoSchema};
use crate::infrastructure::{RepositoryFuture, SortOrder, TodoRepository};

/// A stored todo with its insertion sequence.
///
/// The sequence breaks ties between todos created within the same clock tick.
#[derive(Debug, Clone)]
struct StoredTodo {
    todo: Todo,
    sequence: u64,
}

#[derive(Debug, Default)]
struct Collection {
    documents: HashMap<TodoId, StoredTodo>,
    next_sequence: u64,
}

/// In-memory implementation of `TodoRepository`.
///
/// # Example
///
/// ```ignore
/// let repository = InMemoryTodoRepository::new();
/// let todo = repository.create(new_todo).await?;
/// let found = repository.find_by_id(&todo.id).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryTodoRepository {
    collection: Arc<RwLock<Collection>>,
}

impl InMemoryTodoRepository {
    /// Creates a new empty in-memory todo repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TodoRepository for InMemoryTodoRepository {
    fn create(&self, new_todo: NewTodo) -> RepositoryFuture<Todo> {
        let collection = Arc::clone(&self.collection);
        async move {
            let fields = TodoSchema::validate_new(new_todo)?;
            let todo = Todo::new(TodoId::generate(), fields, Timestamp::now());

            let mut guard = collection.write().await;
            let sequence = guard.next_sequence;
            guard.next_sequence += 1;
            guard.documents.insert(
                todo.id.clone(),
                StoredTodo {
                    todo: todo.clone(),
                    sequence,
                },
            );
            Ok(todo)
        }
        .boxed()
    }

    fn find_all(&self, order: SortOrder) -> RepositoryFuture<Vec<Todo>> {
        let collection = Arc::clone(&self.collection);
        async move {
            let guard = collection.read().await;
            let mut stored: Vec<&StoredTodo> = guard.documents.values().collect();
            stored.sort_by_key(|entry| (entry.todo.created_at, entry.sequence));
            if order == SortOrder::NewestFirst {
                stored.reverse();
            }
            Ok(stored.into_iter().map(|entry| entry.todo.clone()).collect::<Vec<_>>())
        }
        .boxed()
    }

    fn find_by_id(&self, id: &TodoId) -> RepositoryFuture<Option<Todo>> {
        let collection = Arc::clone(&self.collection);
        let id = id.clone();
        async move {
            let guard = collection.read().await;
            Ok(guard.documents.get(&id).map(|entry| entry.todo.clone()))
        }
        .boxed()
    }

    fn update_by_id(&self, id: &TodoId, patch: TodoPatch) -> RepositoryFuture<Option<Todo>> {
        let collection = Arc::clone(&self.collection);
        let id = id.clone();
        async move {
            let patch = TodoSchema::validate_patch(patch)?;

            let mut guard = collection.write().await;
            let Some(entry) = guard.documents.get_mut(&id) else {
                return Ok(None);
            };
            entry.todo = entry.todo.clone().apply(patch, Timestamp::now());
            Ok(Some(entry.todo.clone()))
        }
        .boxed()
    }

    fn delete_by_id(&self, id: &TodoId) -> RepositoryFuture<Option<Todo>> {
        let collection = Arc::clone(&self.collection);
        let id = id.clone();
        async move {
            let mut guard = collection.write().await;
            Ok(guard.documents.remove(&id).map(|entry| entry.todo))
        }
        .boxed()
    }
}

// =============================================================================
// Tests
// =============================================================================
