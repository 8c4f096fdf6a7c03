//! In-memory backend.
//!
//! A map keyed by location behind one async `RwLock`. The key uniqueness of
//! the map is the at-most-one-tag invariant. Nothing survives a restart.

use std::collections::HashMap;

use placebreak_types::{DisplacementSet, Location, Tag};
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::relocation::RelocationPlan;
use crate::repository::TagRepository;

/// Non-persistent, single-process tag store.
#[derive(Debug, Default)]
pub struct MemoryTagStore {
    tags: RwLock<HashMap<Location, Tag>>,
}

impl MemoryTagStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tagged locations.
    pub async fn len(&self) -> usize {
        self.tags.read().await.len()
    }

    /// Whether no location is tagged.
    pub async fn is_empty(&self) -> bool {
        self.tags.read().await.is_empty()
    }
}

impl TagRepository for MemoryTagStore {
    async fn put(&self, tag: &Tag) -> Result<(), StoreError> {
        self.tags
            .write()
            .await
            .insert(tag.location().clone(), tag.clone());
        Ok(())
    }

    async fn find_by_location(&self, location: &Location) -> Result<Option<Tag>, StoreError> {
        Ok(self.tags.read().await.get(location).cloned())
    }

    async fn delete(&self, location: &Location) -> Result<(), StoreError> {
        self.tags.write().await.remove(location);
        Ok(())
    }

    async fn move_tags(&self, displacements: &DisplacementSet) -> Result<usize, StoreError> {
        let mut plan = RelocationPlan::new("memory", displacements);
        let mut tags = self.tags.write().await;

        for pair in displacements {
            plan.carry(pair, tags.get(pair.old()).cloned());
        }
        for location in plan.cleared() {
            tags.remove(location);
        }
        for tag in plan.carried() {
            tags.insert(tag.location().clone(), tag.clone());
        }
        drop(tags);

        let carried = plan.carried().len();
        tracing::debug!(backend = "memory", pairs = displacements.len(), carried, "Moved tags");
        Ok(carried)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use placebreak_types::DisplacementPair;

    use super::*;

    fn loc(x: i32) -> Location {
        Location::new("world", x, 64, 10)
    }

    #[tokio::test]
    async fn put_replaces_existing_tag() {
        let store = MemoryTagStore::new();
        store.put(&Tag::new(loc(1), true, Utc::now())).await.unwrap();
        let replacement = Tag::new(loc(1), false, Utc::now());
        store.put(&replacement).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(store.find_by_location(&loc(1)).await.unwrap(), Some(replacement));
    }

    #[tokio::test]
    async fn delete_absent_is_noop() {
        let store = MemoryTagStore::new();
        store.put(&Tag::new(loc(1), false, Utc::now())).await.unwrap();
        store.delete(&loc(2)).await.unwrap();
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn chained_move_shifts_row() {
        let store = MemoryTagStore::new();
        let first = Tag::new(loc(0), true, Utc::now());
        let second = Tag::new(loc(1), false, Utc::now());
        store.put(&first).await.unwrap();
        store.put(&second).await.unwrap();

        let set = DisplacementSet::new([
            DisplacementPair::new(loc(0), loc(1)).unwrap(),
            DisplacementPair::new(loc(1), loc(2)).unwrap(),
        ])
        .unwrap();
        assert_eq!(store.move_tags(&set).await.unwrap(), 2);

        assert_eq!(store.find_by_location(&loc(0)).await.unwrap(), None);
        let at_one = store.find_by_location(&loc(1)).await.unwrap().unwrap();
        let at_two = store.find_by_location(&loc(2)).await.unwrap().unwrap();
        assert!(at_one.same_marking(&first.relocated(loc(1))));
        assert!(at_two.same_marking(&second.relocated(loc(2))));
    }

    #[tokio::test]
    async fn lifecycle_calls_are_noops() {
        let store = MemoryTagStore::new();
        store.connect().await.unwrap();
        store.disconnect().await;
        store.put(&Tag::new(loc(3), false, Utc::now())).await.unwrap();
        assert!(!store.is_empty().await);
    }
}
